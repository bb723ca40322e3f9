use serde::Deserialize;

/// Main configuration structure for Hotlist
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub target: TargetConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// The page being harvested and how its session is scoped
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Address of the trending-list page
    pub url: String,

    /// Domain every session cookie is scoped to
    #[serde(rename = "cookie-domain")]
    pub cookie_domain: String,

    /// Substring of the post-navigation address that signals a sign-in redirect
    #[serde(rename = "signin-marker")]
    pub signin_marker: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            url: "https://www.zhihu.com/hot".to_string(),
            cookie_domain: ".zhihu.com".to_string(),
            signin_marker: "signin".to_string(),
        }
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Ceiling for navigation plus content wait (milliseconds)
    pub timeout: u64,

    /// Items read per cycle when `fetchCount` is unset or unusable
    #[serde(rename = "default-fetch-count")]
    pub default_fetch_count: usize,

    /// Delay between cycles when `fetchInterval` is unset or unusable (milliseconds)
    #[serde(rename = "default-fetch-interval")]
    pub default_fetch_interval: u64,

    /// User agent sent by the HTTP renderer
    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            timeout: 30_000,
            default_fetch_count: 20,
            default_fetch_interval: 3_600_000,
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/124.0 Safari/537.36"
                .to_string(),
        }
    }
}

/// CSS selectors describing one trending item
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// One element per item
    pub container: String,

    /// Anchor carrying the item URL, relative to the container
    pub link: String,

    pub title: String,

    pub excerpt: String,

    pub heat: String,

    /// Trailing label removed from the heat text
    #[serde(rename = "heat-suffix")]
    pub heat_suffix: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            container: ".HotItem-content".to_string(),
            link: "a".to_string(),
            title: ".HotItem-title".to_string(),
            excerpt: ".HotItem-excerpt".to_string(),
            heat: ".HotItem-metrics".to_string(),
            heat_suffix: "分享".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: "./data/hotlist.db".to_string(),
        }
    }
}
