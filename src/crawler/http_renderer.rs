//! Static HTML renderer
//!
//! A [`PageRenderer`] backed by a plain HTTP client. It sends the session as a
//! `Cookie` header, follows redirects, and evaluates extraction schemas over
//! the returned markup with `scraper`. Scripts are not executed, so it only
//! suits pages whose list is present in the server response.

use crate::crawler::renderer::{
    BrowsingContext, ContextOptions, ExtractionSchema, FieldSource, PageRenderer, RawRecord,
    RenderError,
};
use crate::crawler::session::{cookie_header, SessionCookie};
use async_trait::async_trait;
use reqwest::header::COOKIE;
use reqwest::{redirect::Policy, Client};
use scraper::{Html, Selector};
use std::time::Duration;
use url::Url;

/// Builds an HTTP client for page rendering
///
/// No cookie store is attached; each context sends its own session, which
/// keeps contexts isolated while sharing the connection pool.
pub fn build_http_client(user_agent: &str) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Renders pages by fetching their HTML
#[derive(Debug, Clone)]
pub struct HttpRenderer {
    client: Client,
}

impl HttpRenderer {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a renderer with its own client
    pub fn with_user_agent(user_agent: &str) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(user_agent)?))
    }
}

#[async_trait]
impl PageRenderer for HttpRenderer {
    async fn launch(
        &self,
        session: &[SessionCookie],
        options: ContextOptions,
    ) -> Result<Box<dyn BrowsingContext>, RenderError> {
        Ok(Box::new(HttpContext {
            client: self.client.clone(),
            session: session.to_vec(),
            timeout: options.default_timeout,
            page: None,
            closed: false,
        }))
    }
}

/// A loaded document and the address it was served from
#[derive(Debug)]
struct LoadedPage {
    url: Url,
    body: String,
}

/// One isolated HTTP page session
#[derive(Debug)]
pub struct HttpContext {
    client: Client,
    session: Vec<SessionCookie>,
    timeout: Duration,
    page: Option<LoadedPage>,
    closed: bool,
}

impl HttpContext {
    fn ensure_open(&self) -> Result<(), RenderError> {
        if self.closed {
            Err(RenderError::Closed)
        } else {
            Ok(())
        }
    }

    fn loaded(&self) -> Result<&LoadedPage, RenderError> {
        self.ensure_open()?;
        self.page.as_ref().ok_or(RenderError::NotLoaded)
    }
}

#[async_trait]
impl BrowsingContext for HttpContext {
    async fn navigate(&mut self, url: &str) -> Result<(), RenderError> {
        self.ensure_open()?;

        let target = Url::parse(url).map_err(|e| RenderError::Navigation {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        let host = target.host_str().unwrap_or_default().to_string();

        let mut request = self.client.get(target).timeout(self.timeout);
        let header = cookie_header(self.session.iter().filter(|c| c.matches_host(&host)));
        if !header.is_empty() {
            request = request.header(COOKIE, header);
        }

        let response = request.send().await.map_err(|e| classify_error(url, e, self.timeout))?;

        let status = response.status();
        let final_url = response.url().clone();
        if status.is_server_error() {
            return Err(RenderError::Navigation {
                url: url.to_string(),
                message: format!("HTTP {}", status.as_u16()),
            });
        }
        if !status.is_success() {
            tracing::debug!("Rendering {} despite HTTP {}", final_url, status.as_u16());
        }

        let body = response
            .text()
            .await
            .map_err(|e| classify_error(url, e, self.timeout))?;

        tracing::trace!("Loaded {} bytes from {}", body.len(), final_url);
        self.page = Some(LoadedPage {
            url: final_url,
            body,
        });
        Ok(())
    }

    fn current_url(&self) -> Option<String> {
        self.page.as_ref().map(|page| page.url.to_string())
    }

    async fn wait_for_selector(
        &mut self,
        selector: &str,
        _timeout: Duration,
    ) -> Result<bool, RenderError> {
        // A fetched document never changes, so one check settles the wait
        let page = self.loaded()?;
        contains_selector(&page.body, selector)
    }

    async fn query_all(
        &mut self,
        schema: &ExtractionSchema,
        limit: usize,
    ) -> Result<Vec<RawRecord>, RenderError> {
        let page = self.loaded()?;
        evaluate_schema(&page.body, &page.url, schema, limit)
    }

    async fn close(&mut self) -> Result<(), RenderError> {
        self.page = None;
        self.closed = true;
        Ok(())
    }
}

fn classify_error(url: &str, error: reqwest::Error, timeout: Duration) -> RenderError {
    if error.is_timeout() {
        RenderError::Timeout(timeout)
    } else if error.is_connect() {
        RenderError::Navigation {
            url: url.to_string(),
            message: "Connection refused".to_string(),
        }
    } else {
        RenderError::Navigation {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}

fn parse_selector(selector: &str) -> Result<Selector, RenderError> {
    Selector::parse(selector).map_err(|e| RenderError::Selector {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })
}

/// Checks whether `selector` matches anything in `html`
pub fn contains_selector(html: &str, selector: &str) -> Result<bool, RenderError> {
    let selector = parse_selector(selector)?;
    let document = Html::parse_document(html);
    let found = document.select(&selector).next().is_some();
    Ok(found)
}

/// Evaluates `schema` over `html`, reading at most `limit` containers
///
/// Containers beyond `limit` are never mapped. Links are resolved against
/// `base_url`; fields whose selector matches nothing are left out.
pub fn evaluate_schema(
    html: &str,
    base_url: &Url,
    schema: &ExtractionSchema,
    limit: usize,
) -> Result<Vec<RawRecord>, RenderError> {
    let container = parse_selector(&schema.container)?;
    let fields = schema
        .fields
        .iter()
        .map(|rule| Ok((rule, parse_selector(&rule.selector)?)))
        .collect::<Result<Vec<_>, RenderError>>()?;

    let document = Html::parse_document(html);
    let records = document
        .select(&container)
        .take(limit)
        .map(|element| {
            let mut record = RawRecord::new();
            for (rule, selector) in &fields {
                let Some(matched) = element.select(selector).next() else {
                    continue;
                };
                let raw = match rule.source {
                    FieldSource::Text => matched.text().collect::<String>(),
                    FieldSource::Href => matched
                        .value()
                        .attr("href")
                        .and_then(|href| base_url.join(href).ok())
                        .map(|resolved| resolved.to_string())
                        .unwrap_or_default(),
                };
                record.insert(rule.name.clone(), rule.finish(&raw));
            }
            record
        })
        .collect();

    Ok(records)
}
