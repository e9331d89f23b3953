//! Layered configuration.
//!
//! ```text
//! Priority (highest to lowest):
//!
//! ┌──────────────────────────────────────────┐
//! │  1. Environment Variables (WARD_*)       │
//! ├──────────────────────────────────────────┤
//! │  2. Project Config (.ward/config.toml)   │
//! ├──────────────────────────────────────────┤
//! │  3. Global Config (~/.ward/config.toml)  │
//! ├──────────────────────────────────────────┤
//! │  4. Default Values                       │
//! └──────────────────────────────────────────┘
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Config Field | Type |
//! |----------|--------------|------|
//! | `WARD_DEBUG` | `debug` | bool |
//! | `WARD_DATA_PATH` | `data_path` | PathBuf |
//! | `WARD_CONSULTATION_FEE` | `billing.consultation_fee` | f64 |
//!
//! # Example Configuration
//!
//! ```toml
//! debug = false
//! data_path = "~/.ward/ward.json"
//!
//! [billing]
//! consultation_fee = 500.0
//!
//! [audit]
//! default_limit = 50
//!
//! [[rooms]]
//! number = "101"
//! staff = "Dr. Rao"
//!
//! [permissions]
//! IntakeAgent = ["identity_read", "identity_write", "create_visit"]
//! RoomAgent = ["room_read", "room_write"]
//! ```
//!
//! When `[permissions]` is absent the built-in table applies. When present
//! it replaces the built-in table entirely; roles it omits get nothing.

mod error;
mod loader;
mod resolver;
mod types;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use resolver::ConfigResolver;
pub use types::{AuditConfig, AuditLayer, BillingConfig, BillingLayer, ConfigLayer, WardConfig};

use std::path::PathBuf;

/// Default global config directory.
pub fn default_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".ward")
}

/// Default global config file path.
pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.toml")
}

/// Default snapshot location.
pub fn default_data_path() -> PathBuf {
    default_config_dir().join("ward.json")
}

/// Project config directory name.
pub const PROJECT_CONFIG_DIR: &str = ".ward";

/// Project config file name.
pub const PROJECT_CONFIG_FILE: &str = "config.toml";
