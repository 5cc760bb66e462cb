// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the modbus-simulator project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Web dashboard configuration
//!
//! This module defines the structure for configuring the web-based
//! monitoring dashboard of the simulator.

use serde::{Deserialize, Serialize};

/// Configuration for the monitoring dashboard web server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Enable or disable the dashboard server.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// The TCP port the dashboard will listen on.
    ///
    /// Valid range is 1-65534. Default value is 8080.
    #[serde(default = "default_port")]
    pub port: u16,

    /// The network address the dashboard will bind to.
    ///
    /// Can be an IPv4/IPv6 address or a hostname. Default is "127.0.0.1".
    #[serde(default = "default_address")]
    pub address: String,

    /// The server name reported in HTTP headers and logs.
    #[serde(default = "default_name")]
    pub name: String,

    /// Auto-refresh interval of the calls page while monitoring is active,
    /// in seconds.
    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u16,
}

fn default_enabled() -> bool {
    true
}

fn default_port() -> u16 {
    8080
}

fn default_address() -> String {
    "127.0.0.1".to_string()
}

fn default_name() -> String {
    concat!("ModbusSimulator/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_refresh_secs() -> u16 {
    2
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            port: default_port(),
            address: default_address(),
            name: default_name(),
            refresh_secs: default_refresh_secs(),
        }
    }
}
