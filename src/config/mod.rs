//! Configuration module for Hotlist
//!
//! This module handles loading, parsing, and validating the static TOML
//! configuration. Values an operator tunes at runtime (cookies, fetch count,
//! fetch interval) live in the database instead; see [`crate::storage`].
//!
//! # Example
//!
//! ```no_run
//! use hotlist::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("hotlist.toml")).unwrap();
//! println!("Harvesting: {}", config.target.url);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, OutputConfig, SelectorConfig, TargetConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
