//! Trending-list extraction
//!
//! Drives a [`PageRenderer`] through one page load and turns the rendered
//! containers into ranked [`TrendingItem`]s.

use crate::crawler::renderer::{
    BrowsingContext, ContextOptions, ExtractionSchema, PageRenderer, RawRecord, FIELD_EXCERPT,
    FIELD_HEAT, FIELD_TITLE, FIELD_URL,
};
use crate::crawler::session::SessionCookie;
use crate::crawler::CrawlError;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};
use url::Url;

/// A trending item as extracted from one page snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendingItem {
    /// Last path segment of the item URL
    pub external_id: String,
    pub title: String,
    pub url: String,
    pub excerpt: String,
    /// Free-text heat label, kept as rendered
    pub heat: String,
    /// 1-based position in extraction order
    pub rank: u32,
}

impl TrendingItem {
    /// Builds an item from a raw record; missing fields become empty strings
    pub fn from_record(mut record: RawRecord, rank: u32) -> Self {
        let mut take = |field: &str| record.remove(field).unwrap_or_default();

        let url = take(FIELD_URL);
        let title = take(FIELD_TITLE);
        let excerpt = take(FIELD_EXCERPT);
        let heat = take(FIELD_HEAT);

        Self {
            external_id: external_id_from_url(&url),
            title,
            url,
            excerpt,
            heat,
            rank,
        }
    }
}

/// Derives an item's identity from the final segment of its URL path
///
/// A trailing `/`, query and fragment are ignored. Unparseable input falls
/// back to the text after the last `/`.
pub fn external_id_from_url(raw: &str) -> String {
    if let Ok(url) = Url::parse(raw) {
        return url
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .unwrap_or_default()
            .to_string();
    }

    let without_suffix = raw.split(['?', '#']).next().unwrap_or_default();
    without_suffix
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Loads the trending page and reads its items
pub struct Extractor {
    renderer: Arc<dyn PageRenderer>,
    schema: ExtractionSchema,
    signin_marker: String,
}

impl std::fmt::Debug for Extractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extractor")
            .field("schema", &self.schema)
            .field("signin_marker", &self.signin_marker)
            .finish()
    }
}

impl Extractor {
    /// Creates a new extractor
    ///
    /// # Arguments
    ///
    /// * `renderer` - The rendering capability to drive
    /// * `schema` - How containers map to item fields
    /// * `signin_marker` - Address substring that signals a rejected session
    pub fn new(renderer: Arc<dyn PageRenderer>, schema: ExtractionSchema, signin_marker: &str) -> Self {
        Self {
            renderer,
            schema,
            signin_marker: signin_marker.to_string(),
        }
    }

    /// Performs one fresh fetch of `page_url` and extracts up to `item_limit` items
    ///
    /// # Flow
    ///
    /// 1. Launch an isolated context carrying `session`
    /// 2. Navigate and wait for network idle
    /// 3. Fail with `AuthenticationRequired` if the address is a sign-in page
    /// 4. Wait for the container selector, else fail with `ContentNotFound`
    /// 5. Map the first `item_limit` containers, ranking them from 1
    ///
    /// `ready_timeout` is one ceiling shared by navigation and the element
    /// wait. The context is closed before this returns, whatever the outcome.
    pub async fn extract(
        &self,
        session: &[SessionCookie],
        page_url: &str,
        item_limit: usize,
        ready_timeout: Duration,
    ) -> Result<Vec<TrendingItem>, CrawlError> {
        let options = ContextOptions {
            default_timeout: ready_timeout,
        };
        let mut context = self.renderer.launch(session, options).await?;

        let result = self
            .extract_in(context.as_mut(), page_url, item_limit, ready_timeout)
            .await;

        if let Err(e) = context.close().await {
            tracing::warn!("Failed to close browsing context for {}: {}", page_url, e);
        }

        result
    }

    async fn extract_in(
        &self,
        context: &mut dyn BrowsingContext,
        page_url: &str,
        item_limit: usize,
        ready_timeout: Duration,
    ) -> Result<Vec<TrendingItem>, CrawlError> {
        let deadline = Instant::now() + ready_timeout;

        tracing::debug!("Navigating to {}", page_url);
        match timeout_at(deadline, context.navigate(page_url)).await {
            Ok(navigated) => navigated?,
            Err(_) => {
                return Err(CrawlError::Transport(format!(
                    "navigation to {} timed out after {:?}",
                    page_url, ready_timeout
                )))
            }
        }

        let current_url = context.current_url().unwrap_or_else(|| page_url.to_string());
        if current_url.contains(&self.signin_marker) {
            return Err(CrawlError::AuthenticationRequired { url: current_url });
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        let appeared = match timeout_at(
            deadline,
            context.wait_for_selector(&self.schema.container, remaining),
        )
        .await
        {
            Ok(waited) => waited?,
            Err(_) => false,
        };

        if !appeared {
            return Err(CrawlError::ContentNotFound {
                selector: self.schema.container.clone(),
            });
        }

        let records = context.query_all(&self.schema, item_limit).await?;
        tracing::debug!("Read {} containers from {}", records.len(), current_url);

        Ok(records
            .into_iter()
            .take(item_limit)
            .zip(1u32..)
            .map(|(record, rank)| TrendingItem::from_record(record, rank))
            .collect())
    }
}
