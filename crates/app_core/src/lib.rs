//! Log browser core
//!
//! This crate contains:
//! - Configuration
//! - Error types
//! - The browse/view/search façade handed to request handlers

pub mod config;
pub mod error;
pub mod logview;

pub use config::{AppConfig, LogViewConfig, LoggingConfig};
pub use error::{AppError, Result};
pub use logview::{Listing, LogView, ViewOptions, CONTENT_TYPE};
