//! Shared types and configuration for the promotional widget workspace.
//!
//! Holds the wire shapes every other crate agrees on (content blocks,
//! normalized product records, tracking events) together with the two
//! configuration layers: process-level [`AppConfig`] read from the
//! environment and page-level [`WidgetConfig`] read from embed attributes.

pub mod app_config;
pub mod blocks;
pub mod config;
pub mod lenient;
pub mod products;
pub mod tracking;
pub mod widget_config;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use blocks::{ContentBlock, Hotspot, TextStyle, VideoBlock};
pub use config::{load_app_config, load_app_config_from_env};
pub use products::{discount_percent, parse_amount, PricePresentation, ProductRecord};
pub use tracking::{Device, TrackingEvent, TrackingEventKind};
pub use widget_config::{normalize_csv, split_csv, GridSelector, WidgetConfig};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("missing required embed attribute: {0}")]
    MissingAttribute(String),

    #[error("invalid value for embed attribute {attr}: {reason}")]
    InvalidAttribute { attr: String, reason: String },
}
