//! Common utilities and types shared across minielect

pub mod config;
pub mod error;
pub mod paths;

pub use config::ElectionConfig;
pub use error::{Error, Result};
