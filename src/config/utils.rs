// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the modbus-simulator project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration utilities
//!
//! This module provides utility functions for working with configuration
//! settings, including validation and schema management.

use anyhow::{Context, Result};
use log::debug;

use super::{Config, RegisterBank};

/// Output the embedded JSON schema to the console.
///
/// This function is called when the `--show-config-schema` flag is provided
/// on the command line. It outputs the full JSON schema for the configuration
/// to stdout, formatted for readability.
///
/// ### Example
///
/// ```bash
/// ./modbus_simulator --show-config-schema > config_schema.json
/// ```
pub fn output_config_schema() -> Result<()> {
    // Load the schema from the embedded string
    let schema_str = include_str!("../../resources/config.schema.json");

    // Parse the schema to a JSON Value to pretty-format it
    let schema: serde_json::Value =
        serde_json::from_str(schema_str).context("Failed to parse JSON schema")?;

    let formatted_schema =
        serde_json::to_string_pretty(&schema).context("Failed to format JSON schema")?;

    println!("{}", formatted_schema);

    Ok(())
}

/// Check if a string is a valid IP address
///
/// Validates that a string represents a valid IPv4 or IPv6 address,
/// or is one of the special values like "localhost" or "0.0.0.0".
pub fn is_valid_ip_address(addr: &str) -> bool {
    if addr.parse::<std::net::IpAddr>().is_ok() {
        return true;
    }

    // Special cases
    matches!(addr, "localhost" | "::" | "::0" | "0.0.0.0")
}

/// Validates the configuration against additional rules that aren't covered
/// by the JSON schema.
///
/// ### Validation Rules
///
/// - **Port Range**: server and dashboard ports must be within 1-65534
/// - **IP Address Format**: bind addresses should be valid IP addresses or
///   special values (only warned about, hostnames are allowed)
/// - **Refresh Interval**: the dashboard refresh interval must be at least
///   one second
/// - **Register Seeds**: every seeded register must fall inside its
///   configured bank
pub fn validate_specific_rules(config: &Config) -> Result<()> {
    debug!("Performing additional validation checks");

    if config.server.port < 1 || config.server.port > 65534 {
        anyhow::bail!("Invalid Modbus server port: {}", config.server.port);
    }
    if config.dashboard.port < 1 || config.dashboard.port > 65534 {
        anyhow::bail!("Invalid dashboard port: {}", config.dashboard.port);
    }

    for addr in [&config.server.address, &config.dashboard.address] {
        if !is_valid_ip_address(addr) {
            debug!("Potentially invalid address format: {}", addr);
            // Just issue a warning but don't block
        }
    }

    if config.dashboard.refresh_secs < 1 {
        anyhow::bail!("Dashboard refresh interval must be at least 1 second");
    }

    for seed in &config.device.register_values {
        let size = match seed.bank {
            RegisterBank::Holding => config.device.holding_registers,
            RegisterBank::Input => config.device.input_registers,
        };
        if seed.address >= size {
            anyhow::bail!(
                "Register seed address {} is outside the configured bank of {} registers",
                seed.address,
                size
            );
        }
    }

    Ok(())
}
