//! Configuration module for Site-Digest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section has defaults, so a missing file simply means `Config::default()`.
//!
//! # Example
//!
//! ```no_run
//! use site_digest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("digest.toml")).unwrap();
//! println!("Crawler will store at most {} pages", config.crawler.max_pages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{AnalysisConfig, Config, CrawlerConfig, OutputConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::{validate, validate_start_url};
