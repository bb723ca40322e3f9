//! Session building from raw cookie text
//!
//! Sessions are obtained outside this crate and handed over as the text of a
//! `Cookie` header. Parsing never fails: anything that does not look like a
//! pair still becomes a credential.

/// Domain used when no cookie domain is configured
pub const DEFAULT_COOKIE_DOMAIN: &str = ".zhihu.com";

/// One credential applied to a browsing context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
}

impl SessionCookie {
    /// Renders `name=value` for a `Cookie` header
    pub fn header_pair(&self) -> String {
        format!("{}={}", self.name, self.value)
    }

    /// Whether this cookie would be sent to `host`
    pub fn matches_host(&self, host: &str) -> bool {
        let domain = self.domain.trim_start_matches('.');
        host.eq_ignore_ascii_case(domain)
            || host
                .to_ascii_lowercase()
                .ends_with(&format!(".{}", domain.to_ascii_lowercase()))
    }
}

/// Parses raw cookie text into ordered credentials scoped to `domain` and `/`
///
/// Pairs are separated by `;` and split on the first `=`, so values may
/// contain `=`. A segment without `=` keeps its text as the name and gets an
/// empty value. Empty and absent input yield no credentials.
///
/// # Example
///
/// ```
/// use hotlist::crawler::build_session;
///
/// let session = build_session(Some("a=1; token=x=y"), ".example.com");
/// assert_eq!(session.len(), 2);
/// assert_eq!(session[1].value, "x=y");
/// ```
pub fn build_session(raw: Option<&str>, domain: &str) -> Vec<SessionCookie> {
    let Some(raw) = raw else {
        return Vec::new();
    };

    raw.split(';')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let (name, value) = segment.split_once('=').unwrap_or((segment, ""));
            SessionCookie {
                name: name.trim().to_string(),
                value: value.to_string(),
                domain: domain.to_string(),
                path: "/".to_string(),
            }
        })
        .collect()
}

/// Joins credentials into a single `Cookie` header value
pub fn cookie_header<'a>(cookies: impl IntoIterator<Item = &'a SessionCookie>) -> String {
    cookies
        .into_iter()
        .map(SessionCookie::header_pair)
        .collect::<Vec<_>>()
        .join("; ")
}
