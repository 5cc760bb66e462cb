// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the modbus-simulator project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Modbus TCP server
//!
//! The network-facing half of the simulator: a TCP accept loop decoding
//! Modbus frames, a service layer executing them against the device store,
//! and the hand-off to the response injector for fault injection.

pub mod service;
pub mod tcp;

pub use service::execute;
pub use tcp::{serve_with_shutdown, ModbusServer};
