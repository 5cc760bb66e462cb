// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the modbus-simulator project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! # Daemon Management Module
//!
//! This module handles the lifecycle of the simulator's background tasks:
//!
//! - Modbus TCP server
//! - Monitoring dashboard web server
//! - Device status clock (uptime and request counters)
//! - System health monitoring (heartbeat)
//!
//! The daemon system uses Tokio's asynchronous runtime to manage concurrent
//! tasks. Each service runs as an independent task, and the main daemon
//! structure tracks and coordinates these tasks.

use anyhow::Result;
use log::{debug, info, warn};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time;

use rocket::config::LogLevel;
use rocket::data::{Limits, ToByteUnit};

use crate::config::Config;
use crate::dashboard::build_rocket;
use crate::server::{serve_with_shutdown, ModbusServer};
use crate::simulator::SimulatorState;

/// Represents a daemon task manager that coordinates the background services
///
/// This structure maintains a collection of asynchronous tasks and provides
/// methods to start, stop, and monitor them.
///
/// # Thread Safety
///
/// The `running` flag is shared between tasks; each task checks it
/// periodically to determine if it should continue running or gracefully
/// terminate. The simulator state is shared with the Modbus server and the
/// dashboard through an `Arc`.
pub struct Daemon {
    tasks: Vec<JoinHandle<Result<()>>>,
    running: Arc<AtomicBool>,
    state: Arc<SimulatorState>,
}

impl Daemon {
    /// Create a new daemon instance around the shared simulator state.
    pub fn new(state: Arc<SimulatorState>) -> Self {
        Daemon {
            tasks: Vec::new(),
            running: Arc::new(AtomicBool::new(true)),
            state,
        }
    }

    /// Get the shared simulator state.
    pub fn state(&self) -> Arc<SimulatorState> {
        self.state.clone()
    }

    /// Launch all configured tasks based on configuration
    ///
    /// Starts the services according to the provided configuration. Only
    /// services that are enabled in the configuration will be started. Each
    /// service runs as a separate asynchronous task.
    ///
    /// # Errors
    ///
    /// This function can fail if any of the services fail to start, such as
    /// the Modbus server or the dashboard failing to bind its port.
    pub async fn launch(&mut self, config: &Config) -> Result<()> {
        if config.server.enabled {
            self.start_modbus_server(config).await?;
        }

        if config.dashboard.enabled {
            self.start_dashboard_server(config)?;
        }

        // Status clock and heartbeat always run
        self.start_device_clock()?;
        self.start_heartbeat()?;

        Ok(())
    }

    /// Launch the Modbus TCP server task.
    ///
    /// The listener is bound here so that port conflicts surface at launch
    /// time instead of inside the spawned task.
    async fn start_modbus_server(&mut self, config: &Config) -> Result<()> {
        info!(
            "Starting Modbus server on {}:{}",
            config.server.address, config.server.port
        );

        let socket_addr: SocketAddr =
            format!("{}:{}", config.server.address, config.server.port).parse()?;
        let listener = TcpListener::bind(socket_addr).await?;

        let server = ModbusServer::new(self.state.clone(), config.server.unit_id);
        let running = self.running.clone();
        let task = tokio::spawn(serve_with_shutdown(server, listener, running));

        self.tasks.push(task);
        info!("Modbus server started");
        Ok(())
    }

    /// Start the Rocket web server for the monitoring dashboard.
    fn start_dashboard_server(&mut self, config: &Config) -> Result<()> {
        info!(
            "Starting dashboard on {}:{}",
            config.dashboard.address, config.dashboard.port
        );

        let figment = rocket::Config::figment()
            .merge(("ident", config.dashboard.name.clone()))
            .merge(("limits", Limits::new().limit("form", 32.kibibytes())))
            .merge(("address", config.dashboard.address.clone()))
            .merge(("port", config.dashboard.port))
            .merge(("log_level", LogLevel::Normal));

        let rocket = build_rocket(figment, self.state.clone(), &config.dashboard);

        let task = tokio::spawn(async move {
            let ignited = rocket.ignite().await?;
            ignited.launch().await?;
            Ok(())
        });

        self.tasks.push(task);
        Ok(())
    }

    /// Start the device status clock.
    ///
    /// Refreshes the status block of the simulated device's input registers
    /// (uptime and served request counters) once per second.
    fn start_device_clock(&mut self) -> Result<()> {
        info!("Starting device status clock");

        let running = self.running.clone();
        let state = self.state.clone();
        let started = Instant::now();
        let task = tokio::spawn(async move {
            while running.load(Ordering::SeqCst) {
                let uptime = started.elapsed().as_secs();
                let served = state.served_requests();
                state.store.lock().unwrap().update_status(uptime, served);
                time::sleep(Duration::from_secs(1)).await;
            }
            Ok(())
        });

        self.tasks.push(task);
        Ok(())
    }

    /// Start a heartbeat task that logs system status periodically
    ///
    /// The heartbeat task runs every 60 seconds and continues until the
    /// daemon's `running` flag is set to `false`. In a production
    /// environment these messages can be monitored by an external system to
    /// detect if the daemon has stopped functioning properly.
    fn start_heartbeat(&mut self) -> Result<()> {
        info!("Starting heartbeat monitor");

        let running = self.running.clone();
        let state = self.state.clone();
        let task = tokio::spawn(async move {
            while running.load(Ordering::SeqCst) {
                debug!(
                    "Daemon heartbeat: running, {} requests served",
                    state.served_requests()
                );
                time::sleep(Duration::from_secs(60)).await;
            }
            Ok(())
        });

        self.tasks.push(task);
        Ok(())
    }

    /// Stop all running tasks gracefully
    ///
    /// Signals all spawned tasks to terminate by setting the shared
    /// `running` flag to `false`. This method only signals the tasks to
    /// stop; call `join()` afterwards to wait for them.
    pub fn shutdown(&self) {
        info!("Shutting down daemon tasks");
        self.running.store(false, Ordering::SeqCst);
        // Tasks should check the running flag and terminate gracefully
    }

    /// Wait for all tasks to complete
    ///
    /// Consumes the daemon and waits for all spawned tasks to finish
    /// execution. Should be called after `shutdown()` for a clean exit.
    /// Task panics are logged but do not fail the join.
    pub async fn join(self) -> Result<()> {
        for task in self.tasks {
            match tokio::time::timeout(Duration::from_secs(5), task).await {
                Ok(result) => {
                    if let Err(e) = result {
                        log::error!("Task panicked: {}", e);
                    }
                }
                Err(_) => {
                    // Task didn't complete within timeout
                    warn!("Task did not complete within timeout period, may be hung");
                }
            }
        }
        Ok(())
    }
}
