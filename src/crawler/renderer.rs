//! Page-rendering capability
//!
//! The extractor never touches a browser directly. It talks to a
//! [`PageRenderer`], which opens isolated [`BrowsingContext`]s seeded with
//! session cookies, and hands each context a declarative [`ExtractionSchema`]
//! instead of DOM code.

use crate::config::SelectorConfig;
use crate::crawler::session::SessionCookie;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

/// Field name carrying the item link
pub const FIELD_URL: &str = "url";
pub const FIELD_TITLE: &str = "title";
pub const FIELD_EXCERPT: &str = "excerpt";
pub const FIELD_HEAT: &str = "heat";

/// Faults raised by a rendering backend
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    #[error("No page has been loaded in this context")]
    NotLoaded,

    #[error("Browsing context already closed")]
    Closed,

    #[error("Browser error: {0}")]
    Backend(String),
}

/// Options applied to a freshly launched context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextOptions {
    /// Upper bound for every waiting operation in the context
    pub default_timeout: Duration,
}

/// Where a field's value comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSource {
    /// Trimmed text content of the matched element
    Text,
    /// The element's `href`, resolved against the page address
    Href,
}

/// One field of an extracted record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRule {
    pub name: String,
    /// Selector evaluated relative to the container element
    pub selector: String,
    pub source: FieldSource,
    /// Trailing text removed after trimming
    pub strip_suffix: Option<String>,
}

impl FieldRule {
    pub fn new(name: &str, selector: &str, source: FieldSource) -> Self {
        Self {
            name: name.to_string(),
            selector: selector.to_string(),
            source,
            strip_suffix: None,
        }
    }

    pub fn strip_suffix(mut self, suffix: &str) -> Self {
        if !suffix.is_empty() {
            self.strip_suffix = Some(suffix.to_string());
        }
        self
    }

    /// Normalizes a raw value the way every backend must
    pub fn finish(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        match &self.strip_suffix {
            Some(suffix) => trimmed
                .strip_suffix(suffix.as_str())
                .unwrap_or(trimmed)
                .trim_end()
                .to_string(),
            None => trimmed.to_string(),
        }
    }
}

/// Selector-to-field mapping evaluated inside a browsing context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionSchema {
    /// One match per record, in document order
    pub container: String,
    pub fields: Vec<FieldRule>,
}

impl ExtractionSchema {
    /// Builds the trending-item schema from configured selectors
    pub fn from_selectors(selectors: &SelectorConfig) -> Self {
        Self {
            container: selectors.container.clone(),
            fields: vec![
                FieldRule::new(FIELD_URL, &selectors.link, FieldSource::Href),
                FieldRule::new(FIELD_TITLE, &selectors.title, FieldSource::Text),
                FieldRule::new(FIELD_EXCERPT, &selectors.excerpt, FieldSource::Text),
                FieldRule::new(FIELD_HEAT, &selectors.heat, FieldSource::Text)
                    .strip_suffix(&selectors.heat_suffix),
            ],
        }
    }
}

/// Field values of one container; absent keys mean the sub-element was missing
pub type RawRecord = BTreeMap<String, String>;

/// Launches isolated browsing contexts
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Opens a fresh context with `session` applied
    async fn launch(
        &self,
        session: &[SessionCookie],
        options: ContextOptions,
    ) -> Result<Box<dyn BrowsingContext>, RenderError>;
}

/// A single isolated page session
///
/// Callers must invoke [`BrowsingContext::close`] on every exit path.
#[async_trait]
pub trait BrowsingContext: Send {
    /// Loads `url` and returns once the network is idle
    async fn navigate(&mut self, url: &str) -> Result<(), RenderError>;

    /// Address of the loaded page after redirects
    fn current_url(&self) -> Option<String>;

    /// Waits until `selector` matches, returning `false` if it never does within `timeout`
    async fn wait_for_selector(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<bool, RenderError>;

    /// Maps up to `limit` containers, in document order, through `schema`
    async fn query_all(
        &mut self,
        schema: &ExtractionSchema,
        limit: usize,
    ) -> Result<Vec<RawRecord>, RenderError>;

    /// Releases every resource held by the context
    async fn close(&mut self) -> Result<(), RenderError>;
}
