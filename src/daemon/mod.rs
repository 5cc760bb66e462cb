// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the modbus-simulator project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! # Daemon Module
//!
//! The daemon module provides functionality for running and managing the
//! simulator's background services: the Modbus TCP server, the monitoring
//! dashboard web server, the device status clock and a heartbeat monitor.
//!
//! ## Usage
//!
//! ```no_run
//! use modbus_simulator::{config::Config, daemon::launch_daemon::Daemon};
//! use modbus_simulator::simulator::SimulatorState;
//!
//! async fn run() -> anyhow::Result<()> {
//!     let config = Config::from_file("config.yaml")?;
//!     let state = SimulatorState::new(&config.device);
//!
//!     // Create and launch daemon
//!     let mut daemon = Daemon::new(state);
//!     daemon.launch(&config).await?;
//!
//!     // Wait for shutdown signal (e.g. Ctrl+C)
//!     tokio::signal::ctrl_c().await?;
//!
//!     // Clean shutdown
//!     daemon.shutdown();
//!     daemon.join().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod launch_daemon;

pub use launch_daemon::Daemon;
