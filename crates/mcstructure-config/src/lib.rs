//! Configuration for the mcstructure tooling.
//!
//! Settings persist to disk as RON and use serde defaults so that files written by
//! older or newer builds still load.

mod config;
mod error;

pub use config::{CONFIG_FILE_NAME, CodecConfig, Config, LoggingConfig};
pub use error::ConfigError;
