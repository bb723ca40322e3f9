//! Crawler module for harvesting the trending list
//!
//! This module contains the core harvesting logic, including:
//! - Session building from raw cookie text
//! - The page-rendering capability and its HTTP-backed implementation
//! - Item extraction with sign-in and missing-content detection
//! - The crawl cycle that ties extraction to storage
//! - The recurring scheduler

mod cycle;
mod extractor;
mod http_renderer;
mod renderer;
mod scheduler;
mod session;

pub use cycle::{CrawlCycle, CycleOutcome, CycleSettings};
pub use extractor::{external_id_from_url, Extractor, TrendingItem};
pub use http_renderer::{build_http_client, contains_selector, evaluate_schema, HttpRenderer};
pub use renderer::{
    BrowsingContext, ContextOptions, ExtractionSchema, FieldRule, FieldSource, PageRenderer,
    RawRecord, RenderError, FIELD_EXCERPT, FIELD_HEAT, FIELD_TITLE, FIELD_URL,
};
pub use scheduler::{Scheduler, SchedulerHandle, SchedulerState};
pub use session::{build_session, cookie_header, SessionCookie, DEFAULT_COOKIE_DOMAIN};

use crate::storage::StorageError;
use std::fmt;
use thiserror::Error;

/// Failures of a single crawl cycle
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Session rejected, redirected to {url}; update the cookies")]
    AuthenticationRequired { url: String },

    #[error("Content selector '{selector}' never appeared")]
    ContentNotFound { selector: String },

    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl CrawlError {
    /// Classifies the error for reporting
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AuthenticationRequired { .. } => ErrorKind::AuthenticationRequired,
            Self::ContentNotFound { .. } => ErrorKind::ContentNotFound,
            Self::Transport(_) | Self::Render(_) => ErrorKind::TransportFailure,
            Self::Storage(_) => ErrorKind::StorageFailure,
        }
    }
}

/// Reported category of a failed cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    AuthenticationRequired,
    ContentNotFound,
    TransportFailure,
    StorageFailure,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthenticationRequired => "AuthenticationRequired",
            Self::ContentNotFound => "ContentNotFound",
            Self::TransportFailure => "TransportFailure",
            Self::StorageFailure => "StorageFailure",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_error_kinds() {
        let cases = [
            (
                CrawlError::AuthenticationRequired {
                    url: "https://example.com/signin".to_string(),
                },
                ErrorKind::AuthenticationRequired,
            ),
            (
                CrawlError::ContentNotFound {
                    selector: ".item".to_string(),
                },
                ErrorKind::ContentNotFound,
            ),
            (
                CrawlError::Transport("timeout".to_string()),
                ErrorKind::TransportFailure,
            ),
            (
                CrawlError::from(RenderError::Timeout(Duration::from_secs(1))),
                ErrorKind::TransportFailure,
            ),
            (
                CrawlError::from(StorageError::LockPoisoned),
                ErrorKind::StorageFailure,
            ),
        ];

        for (error, kind) in cases {
            assert_eq!(error.kind(), kind, "{}", error);
        }
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(
            ErrorKind::AuthenticationRequired.to_string(),
            "AuthenticationRequired"
        );
        assert_eq!(ErrorKind::StorageFailure.to_string(), "StorageFailure");
    }
}
