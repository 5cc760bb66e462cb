// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the modbus-simulator project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Modbus TCP server configuration
//!
//! This module defines the structure for configuring the Modbus TCP
//! server component of the simulator.

use serde::{Deserialize, Serialize};

/// Configuration for the simulated Modbus TCP server.
///
/// # Example
///
/// ```
/// use modbus_simulator::config::ServerConfig;
///
/// let server_config = ServerConfig {
///     enabled: true,
///     port: 1502,
///     address: "0.0.0.0".to_string(),
///     unit_id: 1,
/// };
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Flag to enable or disable the Modbus server.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// The TCP port the Modbus server will listen on.
    ///
    /// Valid range is 1-65534. Default value is 5020; the standard Modbus
    /// port 502 requires elevated privileges on most systems.
    #[serde(default = "default_port")]
    pub port: u16,

    /// The network address the Modbus server will bind to.
    ///
    /// Can be an IPv4/IPv6 address or a hostname. Default is "127.0.0.1".
    /// Use "0.0.0.0" to bind to all IPv4 interfaces.
    #[serde(default = "default_address")]
    pub address: String,

    /// Unit id the simulated device answers to.
    ///
    /// 0 accepts any unit id. A nonzero id additionally accepts the Modbus
    /// TCP wildcard ids 0 and 0xFF; requests addressed to other units are
    /// dropped without a response.
    #[serde(default)]
    pub unit_id: u8,
}

fn default_enabled() -> bool {
    true
}

fn default_port() -> u16 {
    5020
}

fn default_address() -> String {
    "127.0.0.1".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            port: default_port(),
            address: default_address(),
            unit_id: 0,
        }
    }
}
