// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the modbus-simulator project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration management for the Modbus simulator
//!
//! This module provides functionality for loading, validating, and applying
//! configuration settings for the simulator. The configuration is backed by
//! a YAML file and validated against a JSON schema for robustness.
//!
//! ## Configuration Structure
//!
//! The configuration is organized as a nested structure with sections:
//! - `server`: Settings for the Modbus TCP server
//! - `dashboard`: Settings for the monitoring dashboard web server
//! - `device`: Shape of the simulated device (bank sizes, seeded registers)
//!
//! ## Usage
//!
//! ```no_run
//! use modbus_simulator::config::Config;
//! use std::path::Path;
//!
//! // Load config from file, creates a default if not found
//! let mut config = Config::from_file(Path::new("config.yaml")).unwrap();
//!
//! // Apply command line overrides if needed
//! config.apply_args(
//!     None,                        // Modbus server enabled
//!     Some("0.0.0.0".to_string()), // Modbus server address
//!     Some(1502),                  // Modbus server port
//!     None,                        // Dashboard enabled
//!     None,                        // Dashboard address
//!     Some(8081),                  // Dashboard port
//! );
//!
//! // Access configuration values
//! println!("Dashboard port: {}", config.dashboard.port);
//! ```

pub mod dashboard;
pub mod device;
pub mod server;
pub mod utils;

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, error};
use serde::{Deserialize, Serialize};

// Re-export all types for public API
pub use dashboard::DashboardConfig;
pub use device::{DeviceConfig, RegisterBank, RegisterSeed};
pub use server::ServerConfig;
pub use utils::{is_valid_ip_address, output_config_schema};

/// Root configuration structure for the Modbus simulator.
///
/// The configuration is designed to be deserialized from and serialized to
/// YAML using the serde framework. The structure is validated against a JSON
/// schema to ensure all required fields are present and have valid values.
///
/// # Default Values
///
/// Each section uses default values when not explicitly specified in the
/// configuration file, allowing for minimal configuration when custom
/// settings are not required.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Settings for the simulated Modbus TCP server.
    ///
    /// These settings control network binding and the unit id the simulated
    /// device answers to. If not specified, default values are used.
    #[serde(default)]
    pub server: ServerConfig,

    /// Settings for the monitoring dashboard web server.
    ///
    /// These settings control network binding, the reported server name and
    /// the auto-refresh interval of the calls page.
    #[serde(default)]
    pub dashboard: DashboardConfig,

    /// Shape of the simulated device.
    ///
    /// This section controls how many addresses each data bank exposes and
    /// which registers start with a non-zero value.
    #[serde(default)]
    pub device: DeviceConfig,
}

impl Config {
    /// Helper method to create a sample config file when validation fails
    fn create_sample_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        debug!("Creating sample configuration file at {:?}", path);
        let sample_path = path.with_extension("sample.yaml");

        // Create parent directories if they don't exist
        if let Some(parent) = sample_path.parent() {
            if !parent.exists() {
                debug!("Creating parent directory: {:?}", parent);
                fs::create_dir_all(parent).with_context(|| {
                    format!(
                        "Failed to create parent directory for sample config at {:?}",
                        parent
                    )
                })?;
            }
        }

        let sample_config = Self::default();
        sample_config
            .save_to_file(&sample_path)
            .with_context(|| format!("Failed to save sample config to {:?}", sample_path))?;

        error!(
            "Sample configuration file created at {:?}\nPlease edit and rename it",
            sample_path
        );
        Ok(())
    }

    /// Load configuration from a file
    ///
    /// A missing file is replaced by the default configuration, which is
    /// also written to `path`. An invalid file fails with context after a
    /// `<name>.sample.yaml` with default values has been written next to it.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(
                "Configuration file not found at {:?}, creating default",
                path
            );
            let default_config = Self::default();
            default_config.save_to_file(path)?;
            return Ok(default_config);
        }

        debug!("Loading configuration from {:?}", path);
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file at {:?}", path))?;

        // First step: convert YAML to a generic Value
        let yaml_value: serde_yml::Value = serde_yml::from_str(&contents)
            .with_context(|| format!("Failed to parse YAML configuration from {:?}", path))?;

        // Convert to JSON Value for validation
        let json_value = serde_json::to_value(&yaml_value).with_context(|| {
            format!("Failed to convert YAML to JSON for validation: {:?}", path)
        })?;

        // Load and validate with the schema
        let schema_str = include_str!("../../resources/config.schema.json");
        let schema: serde_json::Value =
            serde_json::from_str(schema_str).context("Failed to parse JSON schema")?;

        // Create the validator
        let validator = jsonschema::draft202012::options()
            .should_validate_formats(true)
            .build(&schema)?;

        // Validate before deserializing to Config
        debug!("Validating {} configuration against schema", path.display());
        if let Err(error) = validator.validate(&json_value) {
            error!("Configuration validation error before deserialization");
            // We generate a config.sample.yaml file with the default values
            // for the user to edit
            Self::create_sample_config(path)?;
            anyhow::bail!("Configuration validation failed: {}", error);
        }

        // Now that YAML has been validated, deserialize to Config
        debug!("Schema validation passed, deserializing into Config structure");
        let config: Config = match serde_yml::from_str(&contents) {
            Ok(config) => config,
            Err(err) => {
                error!("Configuration deserialization error: {}", err);
                match Self::create_sample_config(path) {
                    Ok(_) => debug!("Successfully created sample config"),
                    Err(e) => error!("Failed to create sample config: {}", e),
                }
                return Err(anyhow::anyhow!(
                    "Failed to deserialize configuration from {}: {}",
                    path.display(),
                    err
                ));
            }
        };

        // Perform additional specific validations
        if let Err(err) = utils::validate_specific_rules(&config) {
            error!("Configuration specific validation error: {}", err);
            Self::create_sample_config(path)?;
            return Err(err);
        }

        Ok(config)
    }

    /// Save the configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml =
            serde_yml::to_string(self).context("Failed to serialize configuration to YAML")?;

        let mut file = File::create(path.as_ref())
            .with_context(|| format!("Failed to create config file at {:?}", path.as_ref()))?;

        file.write_all(yaml.as_bytes())
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Apply command line arguments to override configuration values.
    ///
    /// Only values that are explicitly provided will override the existing
    /// configuration.
    ///
    /// # Parameters
    ///
    /// * `server_enabled` - Optional flag to enable/disable the Modbus server
    /// * `server_address` - Optional network address for the Modbus server
    /// * `server_port` - Optional TCP port for the Modbus server
    /// * `dashboard_enabled` - Optional flag to enable/disable the dashboard
    /// * `dashboard_address` - Optional network address for the dashboard
    /// * `dashboard_port` - Optional TCP port for the dashboard
    pub fn apply_args(
        &mut self,
        server_enabled: Option<bool>,
        server_address: Option<String>,
        server_port: Option<u16>,
        dashboard_enabled: Option<bool>,
        dashboard_address: Option<String>,
        dashboard_port: Option<u16>,
    ) {
        // Only override if command-line arguments are provided
        if let Some(enabled) = server_enabled {
            debug!("Overriding Modbus server enabled from command line: {}", enabled);
            self.server.enabled = enabled;
        }
        if let Some(address) = server_address {
            debug!("Overriding Modbus server address from command line: {}", address);
            self.server.address = address;
        }
        if let Some(port) = server_port {
            debug!("Overriding Modbus server port from command line: {}", port);
            self.server.port = port;
        }

        if let Some(enabled) = dashboard_enabled {
            debug!("Overriding dashboard enabled from command line: {}", enabled);
            self.dashboard.enabled = enabled;
        }
        if let Some(address) = dashboard_address {
            debug!("Overriding dashboard address from command line: {}", address);
            self.dashboard.address = address;
        }
        if let Some(port) = dashboard_port {
            debug!("Overriding dashboard port from command line: {}", port);
            self.dashboard.port = port;
        }
    }
}
