//! Crawl cycle - one session-build, extract, persist pass
//!
//! The cycle never returns an error. Every failure is folded into a
//! [`CycleOutcome`] so a manual trigger can show it and the scheduler can log
//! it and carry on.

use crate::config::Config;
use crate::crawler::extractor::{Extractor, TrendingItem};
use crate::crawler::renderer::{ExtractionSchema, PageRenderer};
use crate::crawler::session::build_session;
use crate::crawler::{CrawlError, ErrorKind};
use crate::storage::{
    SaveResult, SqliteStorage, Storage, StorageError, CONFIG_COOKIES, CONFIG_FETCH_COUNT,
};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Static inputs of a crawl cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleSettings {
    pub page_url: String,
    pub cookie_domain: String,
    /// Used when `fetchCount` is absent, non-numeric or zero
    pub default_fetch_count: usize,
    /// Ceiling for navigation plus content wait
    pub ready_timeout: Duration,
}

impl CycleSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            page_url: config.target.url.clone(),
            cookie_domain: config.target.cookie_domain.clone(),
            default_fetch_count: config.crawler.default_fetch_count,
            ready_timeout: Duration::from_millis(config.crawler.timeout),
        }
    }
}

/// Result of one crawl cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Success {
        /// Items extracted from the page
        item_count: usize,
        /// Items stored for the first time
        inserted_count: usize,
    },
    Failure {
        kind: ErrorKind,
        message: String,
    },
}

impl CycleOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The failure category, if the cycle failed
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { kind, .. } => Some(*kind),
        }
    }
}

impl From<CrawlError> for CycleOutcome {
    fn from(error: CrawlError) -> Self {
        Self::Failure {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

impl fmt::Display for CycleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success {
                item_count,
                inserted_count,
            } => write!(
                f,
                "success: {} items extracted, {} new",
                item_count, inserted_count
            ),
            Self::Failure { kind, message } => write!(f, "failure ({}): {}", kind, message),
        }
    }
}

/// Locks a shared store, turning a poisoned lock into a storage error
pub(crate) fn lock_storage(
    storage: &Mutex<SqliteStorage>,
) -> Result<MutexGuard<'_, SqliteStorage>, StorageError> {
    storage.lock().map_err(|_| StorageError::LockPoisoned)
}

/// Parses a positive integer tunable, falling back to `default`
pub(crate) fn parse_positive<T>(value: Option<&str>, default: T) -> T
where
    T: std::str::FromStr + PartialOrd + Default,
{
    value
        .and_then(|v| v.trim().parse::<T>().ok())
        .filter(|n| *n > T::default())
        .unwrap_or(default)
}

/// Composes session building, extraction and storage into one unit of work
pub struct CrawlCycle {
    storage: Arc<Mutex<SqliteStorage>>,
    extractor: Extractor,
    settings: CycleSettings,
    /// Held for the whole cycle so no two cycles overlap
    gate: tokio::sync::Mutex<()>,
}

impl fmt::Debug for CrawlCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrawlCycle")
            .field("extractor", &self.extractor)
            .field("settings", &self.settings)
            .finish()
    }
}

impl CrawlCycle {
    pub fn new(
        storage: Arc<Mutex<SqliteStorage>>,
        extractor: Extractor,
        settings: CycleSettings,
    ) -> Self {
        Self {
            storage,
            extractor,
            settings,
            gate: tokio::sync::Mutex::new(()),
        }
    }

    /// Wires a cycle from the static configuration
    pub fn from_config(
        config: &Config,
        storage: Arc<Mutex<SqliteStorage>>,
        renderer: Arc<dyn PageRenderer>,
    ) -> Self {
        let extractor = Extractor::new(
            renderer,
            ExtractionSchema::from_selectors(&config.selectors),
            &config.target.signin_marker,
        );
        Self::new(storage, extractor, CycleSettings::from_config(config))
    }

    /// The store this cycle writes to
    pub fn storage(&self) -> &Arc<Mutex<SqliteStorage>> {
        &self.storage
    }

    pub fn settings(&self) -> &CycleSettings {
        &self.settings
    }

    /// Runs one cycle and reports its outcome
    ///
    /// Concurrent callers queue behind the running cycle.
    pub async fn run(&self) -> CycleOutcome {
        let _gate = self.gate.lock().await;
        let started = Instant::now();
        tracing::info!("Starting crawl cycle for {}", self.settings.page_url);

        match self.execute().await {
            Ok((items, saved)) => {
                tracing::info!(
                    "Crawl cycle finished in {:?}: {} items extracted, {} new",
                    started.elapsed(),
                    items,
                    saved.inserted_count
                );
                CycleOutcome::Success {
                    item_count: items,
                    inserted_count: saved.inserted_count,
                }
            }
            Err(e) => {
                tracing::error!("Crawl cycle failed after {:?}: {}", started.elapsed(), e);
                CycleOutcome::from(e)
            }
        }
    }

    async fn execute(&self) -> Result<(usize, SaveResult), CrawlError> {
        let (cookies, fetch_count) = self.read_tunables()?;

        let session = build_session(cookies.as_deref(), &self.settings.cookie_domain);
        if session.is_empty() {
            tracing::warn!("No cookies configured, the page may require a signed-in session");
        }

        let items = self
            .extractor
            .extract(
                &session,
                &self.settings.page_url,
                fetch_count,
                self.settings.ready_timeout,
            )
            .await?;

        let saved = self.persist(&items)?;
        Ok((items.len(), saved))
    }

    fn read_tunables(&self) -> Result<(Option<String>, usize), CrawlError> {
        let storage = lock_storage(&self.storage)?;
        let cookies = storage.get_config(CONFIG_COOKIES)?;
        let fetch_count = parse_positive(
            storage.get_config(CONFIG_FETCH_COUNT)?.as_deref(),
            self.settings.default_fetch_count,
        );
        Ok((cookies, fetch_count))
    }

    fn persist(&self, items: &[TrendingItem]) -> Result<SaveResult, CrawlError> {
        let mut storage = lock_storage(&self.storage)?;
        Ok(storage.save_items(items)?)
    }
}
