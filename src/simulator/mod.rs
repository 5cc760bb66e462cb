// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the modbus-simulator project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! # Simulator Module
//!
//! The shared state of the simulated device: the register/coil data banks,
//! the function call monitor and the response injector. The Modbus TCP
//! server mutates this state while serving clients; the web dashboard reads
//! and reconfigures it.
//!
//! ## Components
//!
//! * **store**: the four Modbus data banks of the simulated device
//! * **monitor**: bounded request/response capture with range and function
//!   filtering
//! * **injection**: response fault injection (error, empty, junk, delays,
//!   split writes, change-rate sampling)

pub mod injection;
pub mod monitor;
pub mod store;

pub use injection::{InjectionConfig, ResponseInjector, ResponseMode, ResponsePlan};
pub use monitor::{CallMonitor, CallRecord, Direction, DisplayMode, MonitorFilter};
pub use store::DeviceStore;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::config::DeviceConfig;

/// All mutable state shared between the Modbus server and the dashboard.
///
/// ### Thread Safety
///
/// Each part is guarded by its own `Mutex` so a slow dashboard render never
/// blocks register access longer than necessary. The served-request counter
/// is atomic because the device clock task samples it every second.
pub struct SimulatorState {
    pub store: Mutex<DeviceStore>,
    pub monitor: Mutex<CallMonitor>,
    pub injector: Mutex<ResponseInjector>,
    served_requests: AtomicU64,
}

impl SimulatorState {
    pub fn new(device: &DeviceConfig) -> Arc<Self> {
        Arc::new(SimulatorState {
            store: Mutex::new(DeviceStore::new(device)),
            monitor: Mutex::new(CallMonitor::new()),
            injector: Mutex::new(ResponseInjector::new()),
            served_requests: AtomicU64::new(0),
        })
    }

    pub fn count_request(&self) {
        self.served_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn served_requests(&self) -> u64 {
        self.served_requests.load(Ordering::Relaxed)
    }
}
