// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the modbus-simulator project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Simulated device configuration
//!
//! Defines the shape of the simulated Modbus server device: how many
//! addresses each data bank exposes and which registers start with a
//! non-zero value.

use serde::{Deserialize, Serialize};

/// The register banks a seed value can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegisterBank {
    Holding,
    Input,
}

/// An initial register value applied when the device store is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterSeed {
    pub bank: RegisterBank,
    pub address: u16,
    pub value: u16,
}

/// Shape of the simulated device.
///
/// Each bank exposes addresses `0..n-1`; requests outside that range are
/// answered with an IllegalDataAddress exception.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Number of coils (read/write bits).
    #[serde(default = "default_block_size")]
    pub coils: u16,

    /// Number of discrete inputs (read-only bits).
    #[serde(default = "default_block_size")]
    pub discrete_inputs: u16,

    /// Number of input registers (read-only words).
    ///
    /// The first four carry the device status block (uptime and served
    /// request counters) refreshed once per second.
    #[serde(default = "default_block_size")]
    pub input_registers: u16,

    /// Number of holding registers (read/write words).
    #[serde(default = "default_block_size")]
    pub holding_registers: u16,

    /// Initial register values applied on top of the zeroed banks.
    #[serde(default)]
    pub register_values: Vec<RegisterSeed>,
}

fn default_block_size() -> u16 {
    100
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            coils: default_block_size(),
            discrete_inputs: default_block_size(),
            input_registers: default_block_size(),
            holding_registers: default_block_size(),
            register_values: Vec::new(),
        }
    }
}
