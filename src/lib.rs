//! Carfeed: a vehicle-listing harvester
//!
//! This crate crawls a marketplace's search results, extracts structured detail records
//! from rendered listing pages, normalizes their free-text fields into typed values and
//! delivers the normalized records to a downstream ingestion endpoint.

pub mod config;
pub mod crawler;
pub mod models;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod renderer;
pub mod state;
pub mod storage;
pub mod sync;
pub mod url;

use thiserror::Error;

/// Main error type for Carfeed operations
#[derive(Debug, Error)]
pub enum CarfeedError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Renderer error: {0}")]
    Renderer(#[from] RendererError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Ledger error at {path}: {message}")]
    Ledger { path: String, message: String },

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("{stage} stage failed: {message}")]
    Stage { stage: &'static str, message: String },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors reported by a renderer session
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Timed out after {timeout_ms}ms waiting for '{selector}'")]
    Timeout { selector: String, timeout_ms: u64 },

    #[error("No element matches '{0}'")]
    ElementNotFound(String),

    #[error("Invalid CSS selector '{0}'")]
    InvalidSelector(String),

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Renderer session is no longer alive")]
    SessionLost,

    #[error("Operation not supported by this renderer: {0}")]
    Unsupported(&'static str),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("URL has no host: {0}")]
    MissingHost(String),
}

/// Result type alias for Carfeed operations
pub type Result<T> = std::result::Result<T, CarfeedError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for renderer operations
pub type RenderResult<T> = std::result::Result<T, RendererError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use models::{DetailRecord, FuelType, ListingStub, NormalizedRecord, SellerInfo};
pub use pipeline::{run_pipeline_once, Pipeline, RunReport};
pub use renderer::{ElementSnapshot, Renderer, StaticRenderer};
pub use state::RunContext;
