// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the modbus-simulator project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Function call monitoring
//!
//! Captures request/response pairs served by the Modbus server, filtered by
//! address range and function code, for display in the dashboard's call
//! table. The capture buffer is bounded; when it overflows, the oldest rows
//! are dropped and the drop count is reported in the table footer.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use crate::protocol::{Request, Response};

/// Maximum number of rows kept in the capture buffer.
///
/// A request and its response are two rows, so this covers the last 100
/// transactions of a busy device.
pub const CAPTURE_CAPACITY: usize = 200;

/// Whether a captured row is the client's request or the simulator's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Request,
    Response,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Request => "request",
            Direction::Response => "response",
        }
    }
}

/// One captured row of the monitoring table.
#[derive(Debug, Clone)]
pub struct CallRecord {
    pub direction: Direction,
    pub timestamp: DateTime<Utc>,
    pub function: u8,
    pub address: Option<u16>,
    pub count: Option<u16>,
    /// Decoded one-line form of the PDU.
    pub summary: String,
    /// Raw PDU bytes, for the hex display mode.
    pub pdu: Vec<u8>,
}

/// Which traffic the monitor captures.
///
/// Missing bounds leave that side of the address range open; a missing
/// function code matches every function. Requests without an addressed
/// operation (unknown function codes) match any address range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorFilter {
    pub range_start: Option<u16>,
    pub range_stop: Option<u16>,
    pub function: Option<u8>,
}

impl MonitorFilter {
    pub fn matches(&self, request: &Request) -> bool {
        if let Some(function) = self.function {
            if request.function_code() != function {
                return false;
            }
        }
        match request.address() {
            Some(addr) => {
                let last = addr.saturating_add(request.count().unwrap_or(1).saturating_sub(1));
                if let Some(start) = self.range_start {
                    if last < start {
                        return false;
                    }
                }
                if let Some(stop) = self.range_stop {
                    if addr > stop {
                        return false;
                    }
                }
                true
            }
            None => true,
        }
    }
}

/// How captured payloads are rendered in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayMode {
    pub show_hex: bool,
    pub show_decode: bool,
}

impl Default for DisplayMode {
    fn default() -> Self {
        DisplayMode {
            show_hex: false,
            show_decode: true,
        }
    }
}

/// The call capture state shared between the Modbus server and the dashboard.
#[derive(Debug, Default)]
pub struct CallMonitor {
    filter: MonitorFilter,
    mode: DisplayMode,
    active: bool,
    records: VecDeque<CallRecord>,
    dropped: u64,
    total_requests: u64,
}

impl CallMonitor {
    pub fn new() -> Self {
        CallMonitor {
            filter: MonitorFilter::default(),
            mode: DisplayMode::default(),
            active: false,
            records: VecDeque::new(),
            dropped: 0,
            total_requests: 0,
        }
    }

    /// Activate monitoring with a fresh capture buffer ("Monitor").
    pub fn start(&mut self, filter: MonitorFilter, mode: DisplayMode) {
        self.filter = filter;
        self.mode = mode;
        self.active = true;
        self.records.clear();
        self.dropped = 0;
        self.total_requests = 0;
    }

    /// Deactivate monitoring; captured rows stay for inspection ("Stop").
    pub fn stop(&mut self) {
        self.active = false;
    }

    /// Empty the capture buffer without changing activity ("Clear").
    pub fn clear(&mut self) {
        self.records.clear();
        self.dropped = 0;
        self.total_requests = 0;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn filter(&self) -> &MonitorFilter {
        &self.filter
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    pub fn records(&self) -> impl Iterator<Item = &CallRecord> {
        self.records.iter()
    }

    /// Requests seen while monitoring was active, matching or not.
    pub fn total_requests(&self) -> u64 {
        self.total_requests
    }

    /// Rows evicted from the capture buffer since the last start/clear.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Record one served transaction.
    ///
    /// Called by the server for every request; captures the pair only when
    /// monitoring is active and the request matches the filter.
    pub fn observe(&mut self, request: &Request, request_pdu: &[u8], response: &Response) {
        if !self.active {
            return;
        }
        self.total_requests += 1;
        if !self.filter.matches(request) {
            return;
        }
        let timestamp = Utc::now();
        self.push(CallRecord {
            direction: Direction::Request,
            timestamp,
            function: request.function_code(),
            address: request.address(),
            count: request.count(),
            summary: request.summary(),
            pdu: request_pdu.to_vec(),
        });
        self.push(CallRecord {
            direction: Direction::Response,
            timestamp,
            function: response.function_code(),
            address: None,
            count: None,
            summary: response.summary(),
            pdu: response.encode(),
        });
    }

    fn push(&mut self, record: CallRecord) {
        if self.records.len() >= CAPTURE_CAPACITY {
            self.records.pop_front();
            self.dropped += 1;
        }
        self.records.push_back(record);
    }
}
