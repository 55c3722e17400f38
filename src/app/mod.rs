//! Application glue module
//!
//! Configuration and logging shared by the binaries.

mod config;
pub mod logging;

pub use config::{default_config_path, Config, ConfigError, FontConfig};
