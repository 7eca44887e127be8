pub mod affiliate;
pub mod app_config;
pub mod config;
pub mod products;

use thiserror::Error;

pub use affiliate::{extract_asin, is_valid_asin, ProductLink};
pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use products::{ExtractedProduct, FetchPath, Recommendation, ScrapedProduct};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LinkError {
    #[error("invalid product URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("\"{host}\" is not an Amazon marketplace host")]
    UnsupportedHost { host: String },

    #[error("short link \"{url}\" must be expanded before it can be tagged")]
    ShortLink { url: String },

    #[error("no product identifier (ASIN) found in \"{url}\"")]
    MissingAsin { url: String },

    #[error("invalid affiliate tag \"{0}\"")]
    InvalidTag(String),
}
