//! Configuration types.
//!
//! All types implement [`Default`] for compile-time fallback values.

use crate::pool::{RoomPool, RoomSeed};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use ward_auth::CapabilityRegistry;

use super::{default_data_path, ConfigError};

/// Main configuration structure, after merging all layers.
///
/// # Example
///
/// ```
/// use ward_runtime::config::WardConfig;
///
/// let config = WardConfig::default();
/// assert!(!config.debug);
/// assert_eq!(config.rooms.len(), 5);
/// assert_eq!(config.billing.consultation_fee, 500.0);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WardConfig {
    /// Enable debug logging.
    pub debug: bool,

    /// Snapshot file. `None` means [`default_data_path`].
    pub data_path: Option<PathBuf>,

    pub billing: BillingConfig,

    pub audit: AuditConfig,

    /// Room seed, in allocation order.
    pub rooms: Vec<RoomSeed>,

    /// Agent name → action names. `None` means the built-in table.
    pub permissions: Option<BTreeMap<String, Vec<String>>>,
}

impl Default for WardConfig {
    fn default() -> Self {
        Self {
            debug: false,
            data_path: None,
            billing: BillingConfig::default(),
            audit: AuditConfig::default(),
            rooms: default_rooms(),
            permissions: None,
        }
    }
}

impl WardConfig {
    /// Deserializes from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or has wrong field types.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Serializes to a pretty TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if a value cannot be represented in TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Overlays every setting `layer` mentions, including ones equal to
    /// the default. Settings the layer leaves out keep their current value.
    pub fn apply_layer(&mut self, layer: ConfigLayer) {
        if let Some(debug) = layer.debug {
            self.debug = debug;
        }
        if layer.data_path.is_some() {
            self.data_path = layer.data_path;
        }
        if let Some(fee) = layer.billing.consultation_fee {
            self.billing.consultation_fee = fee;
        }
        if let Some(limit) = layer.audit.default_limit {
            self.audit.default_limit = limit;
        }
        if let Some(rooms) = layer.rooms {
            self.rooms = rooms;
        }
        if layer.permissions.is_some() {
            self.permissions = layer.permissions;
        }
    }

    /// Resolved snapshot path.
    #[must_use]
    pub fn data_path(&self) -> PathBuf {
        self.data_path.clone().unwrap_or_else(default_data_path)
    }

    /// Builds the capability registry this config describes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Permissions`] for unknown agents or actions.
    pub fn registry(&self) -> Result<CapabilityRegistry, ConfigError> {
        match &self.permissions {
            Some(table) => Ok(CapabilityRegistry::from_table(table)?),
            None => Ok(CapabilityRegistry::standard()),
        }
    }

    /// Builds a fresh pool from the room seed.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Rooms`] for blank or duplicate room numbers.
    pub fn room_pool(&self) -> Result<RoomPool, ConfigError> {
        Ok(RoomPool::seed(&self.rooms)?)
    }

    /// Checks values that TOML types alone cannot constrain.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for a negative or non-finite fee.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fee = self.billing.consultation_fee;
        if !fee.is_finite() || fee < 0.0 {
            return Err(ConfigError::invalid_value(
                "billing.consultation_fee",
                format!("expected a non-negative amount, got {fee}"),
            ));
        }
        Ok(())
    }
}

/// Billing defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BillingConfig {
    /// Fee used when the caller does not give one.
    pub consultation_fee: f64,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            consultation_fee: 500.0,
        }
    }
}

/// Audit log listing defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AuditConfig {
    /// Entries returned by `logs` when no limit is given.
    pub default_limit: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self { default_limit: 500 }
    }
}

/// One config file as written: a setting is `Some` only if the file
/// mentions it.
///
/// ```
/// use ward_runtime::config::{ConfigLayer, WardConfig};
///
/// let mut config = WardConfig::from_toml("debug = true")?;
/// config.apply_layer(ConfigLayer::from_toml("debug = false")?);
/// assert!(!config.debug);
/// # Ok::<(), toml::de::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ConfigLayer {
    pub debug: Option<bool>,
    pub data_path: Option<PathBuf>,
    #[serde(default)]
    pub billing: BillingLayer,
    #[serde(default)]
    pub audit: AuditLayer,
    pub rooms: Option<Vec<RoomSeed>>,
    pub permissions: Option<BTreeMap<String, Vec<String>>>,
}

impl ConfigLayer {
    /// Parses one TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or has wrong field types.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }
}

/// `[billing]` as written in one file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BillingLayer {
    pub consultation_fee: Option<f64>,
}

/// `[audit]` as written in one file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AuditLayer {
    pub default_limit: Option<usize>,
}

fn default_rooms() -> Vec<RoomSeed> {
    [
        ("101", "Dr. Mehta"),
        ("102", "Dr. Iyer"),
        ("103", "Dr. Thomas"),
        ("104", "Dr. Banerjee"),
        ("105", "Dr. Fernandes"),
    ]
    .into_iter()
    .map(|(number, staff)| RoomSeed::new(number, staff))
    .collect()
}
