//! Configuration module for Carfeed
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use carfeed::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("carfeed.toml")).unwrap();
//! println!("Crawl will visit at most {} pages", config.crawler.max_pages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BrandEntry, Config, CrawlerConfig, NormalizeConfig, RateLimitConfig, RendererConfig,
    SelectorConfig, StorageConfig, SyncConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
