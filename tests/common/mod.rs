//! Shared helpers for integration tests
//!
//! Provides a scripted [`PageRenderer`] that records how it was driven, so
//! tests can check context cleanup, item limits and cycle overlap without a
//! real browser or network.

#![allow(dead_code)]

use async_trait::async_trait;
use hotlist::config::Config;
use hotlist::crawler::{
    BrowsingContext, ContextOptions, CrawlCycle, ExtractionSchema, PageRenderer, RawRecord,
    RenderError, SessionCookie, FIELD_EXCERPT, FIELD_HEAT, FIELD_TITLE, FIELD_URL,
};
use hotlist::storage::{ConfigDefaults, SqliteStorage, Storage};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// How the scripted page behaves
#[derive(Debug, Clone)]
pub struct PageScript {
    /// Address reported after navigation; `None` means no redirect happened
    pub final_url: Option<String>,
    /// Whether the container selector ever appears
    pub content_present: bool,
    pub records: Vec<RawRecord>,
    /// Virtual time spent inside `navigate`
    pub navigate_delay: Duration,
    pub navigation_error: Option<String>,
}

impl Default for PageScript {
    fn default() -> Self {
        Self {
            final_url: None,
            content_present: true,
            records: Vec::new(),
            navigate_delay: Duration::ZERO,
            navigation_error: None,
        }
    }
}

/// Counters shared by a renderer and all of its contexts
#[derive(Debug, Default)]
pub struct RenderStats {
    pub launches: AtomicUsize,
    pub closes: AtomicUsize,
    pub query_calls: AtomicUsize,
    pub active: AtomicUsize,
    pub max_active: AtomicUsize,
    pub sessions: Mutex<Vec<Vec<SessionCookie>>>,
    pub limits: Mutex<Vec<usize>>,
}

impl RenderStats {
    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn query_calls(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
    }

    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    pub fn last_session(&self) -> Vec<SessionCookie> {
        self.sessions
            .lock()
            .unwrap()
            .last()
            .cloned()
            .unwrap_or_default()
    }

    pub fn limits(&self) -> Vec<usize> {
        self.limits.lock().unwrap().clone()
    }
}

/// A renderer that plays back a [`PageScript`]
pub struct ScriptedRenderer {
    script: Mutex<PageScript>,
    pub stats: Arc<RenderStats>,
}

impl ScriptedRenderer {
    pub fn new(script: PageScript) -> Self {
        Self {
            script: Mutex::new(script),
            stats: Arc::new(RenderStats::default()),
        }
    }

    /// Replaces the script for contexts launched from now on
    pub fn set_script(&self, script: PageScript) {
        *self.script.lock().unwrap() = script;
    }
}

#[async_trait]
impl PageRenderer for ScriptedRenderer {
    async fn launch(
        &self,
        session: &[SessionCookie],
        _options: ContextOptions,
    ) -> Result<Box<dyn BrowsingContext>, RenderError> {
        let stats = Arc::clone(&self.stats);
        stats.launches.fetch_add(1, Ordering::SeqCst);
        let active = stats.active.fetch_add(1, Ordering::SeqCst) + 1;
        stats.max_active.fetch_max(active, Ordering::SeqCst);
        stats.sessions.lock().unwrap().push(session.to_vec());

        Ok(Box::new(ScriptedContext {
            script: self.script.lock().unwrap().clone(),
            stats,
            current_url: None,
            closed: false,
        }))
    }
}

struct ScriptedContext {
    script: PageScript,
    stats: Arc<RenderStats>,
    current_url: Option<String>,
    closed: bool,
}

#[async_trait]
impl BrowsingContext for ScriptedContext {
    async fn navigate(&mut self, url: &str) -> Result<(), RenderError> {
        if !self.script.navigate_delay.is_zero() {
            tokio::time::sleep(self.script.navigate_delay).await;
        }
        if let Some(message) = &self.script.navigation_error {
            return Err(RenderError::Navigation {
                url: url.to_string(),
                message: message.clone(),
            });
        }
        self.current_url = Some(
            self.script
                .final_url
                .clone()
                .unwrap_or_else(|| url.to_string()),
        );
        Ok(())
    }

    fn current_url(&self) -> Option<String> {
        self.current_url.clone()
    }

    async fn wait_for_selector(
        &mut self,
        _selector: &str,
        timeout: Duration,
    ) -> Result<bool, RenderError> {
        if self.script.content_present {
            Ok(true)
        } else {
            tokio::time::sleep(timeout).await;
            Ok(false)
        }
    }

    async fn query_all(
        &mut self,
        _schema: &ExtractionSchema,
        limit: usize,
    ) -> Result<Vec<RawRecord>, RenderError> {
        self.stats.query_calls.fetch_add(1, Ordering::SeqCst);
        self.stats.limits.lock().unwrap().push(limit);
        Ok(self.script.records.iter().take(limit).cloned().collect())
    }

    async fn close(&mut self) -> Result<(), RenderError> {
        if !self.closed {
            self.closed = true;
            self.stats.closes.fetch_add(1, Ordering::SeqCst);
            self.stats.active.fetch_sub(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

/// A fully populated record for question `id`
pub fn question(id: u32) -> RawRecord {
    let mut record = RawRecord::new();
    record.insert(
        FIELD_URL.to_string(),
        format!("https://www.zhihu.com/question/{}", id),
    );
    record.insert(FIELD_TITLE.to_string(), format!("Question {}", id));
    record.insert(FIELD_EXCERPT.to_string(), format!("Excerpt {}", id));
    record.insert(FIELD_HEAT.to_string(), format!("{} 万热度", id * 100));
    record
}

/// Records for questions `1..=count`
pub fn questions(count: u32) -> Vec<RawRecord> {
    (1..=count).map(question).collect()
}

/// An in-memory store with `pairs` written over the seeded defaults
pub fn store_with(pairs: &[(&str, &str)]) -> Arc<Mutex<SqliteStorage>> {
    let mut storage = SqliteStorage::new_in_memory(&ConfigDefaults::default())
        .expect("Failed to create in-memory storage");
    for (key, value) in pairs {
        assert_eq!(
            storage.update_config(key, value).expect("Failed to update config"),
            1,
            "unknown config key {}",
            key
        );
    }
    Arc::new(Mutex::new(storage))
}

/// A cycle over the default configuration driven by `renderer`
pub fn cycle_with(
    storage: Arc<Mutex<SqliteStorage>>,
    renderer: Arc<ScriptedRenderer>,
) -> CrawlCycle {
    CrawlCycle::from_config(&Config::default(), storage, renderer)
}
