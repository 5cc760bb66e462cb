// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the modbus-simulator project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Response fault injection
//!
//! Turns an encoded response frame into a write plan: chunks of raw bytes,
//! each preceded by a delay, or no chunks at all for a suppressed response.
//! Operating on raw frames keeps the corruption honest: junk bytes, split
//! writes and silence are exactly what a flaky device puts on the wire.

use std::time::Duration;

use log::debug;
use rand::Rng;

use crate::protocol::frame::encode_adu;
use crate::protocol::{ExceptionCode, MbapHeader};

/// What the injector does to responses. Wire values 0-3 are the dashboard
/// form's `response_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseMode {
    #[default]
    Normal = 0,
    Error = 1,
    Empty = 2,
    Junk = 3,
}

impl ResponseMode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(ResponseMode::Normal),
            1 => Some(ResponseMode::Error),
            2 => Some(ResponseMode::Empty),
            3 => Some(ResponseMode::Junk),
            _ => None,
        }
    }

    pub fn as_u8(&self) -> u8 {
        *self as u8
    }
}

/// The complete injection configuration set by the dashboard form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InjectionConfig {
    pub mode: ResponseMode,
    /// Exception code used in `Error` mode.
    pub error: ExceptionCode,
    /// Delay before the first byte of the response, seconds.
    pub delay_secs: u16,
    /// Send the response in two halves.
    pub split: bool,
    /// Pause between the two halves, seconds.
    pub split_delay_secs: u16,
    /// Only manipulate a percentage of the responses.
    pub change_rate_enabled: bool,
    pub change_rate_pct: u8,
    /// Length of the random payload in `Junk` mode, bytes.
    pub junk_len: u16,
    /// Auto-reset to defaults after this many manipulated responses (0 = never).
    pub clear_after: u32,
}

impl Default for InjectionConfig {
    fn default() -> Self {
        InjectionConfig {
            mode: ResponseMode::Normal,
            error: ExceptionCode::IllegalFunction,
            delay_secs: 0,
            split: false,
            split_delay_secs: 0,
            change_rate_enabled: false,
            change_rate_pct: 0,
            junk_len: 10,
            clear_after: 0,
        }
    }
}

/// One write the connection handler performs, after waiting `delay`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub delay: Duration,
    pub bytes: Vec<u8>,
}

/// The planned on-wire form of one response. No chunks means the response
/// is suppressed and the client is left waiting.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResponsePlan {
    pub chunks: Vec<Chunk>,
}

impl ResponsePlan {
    fn passthrough(frame: Vec<u8>) -> Self {
        ResponsePlan {
            chunks: vec![Chunk {
                delay: Duration::ZERO,
                bytes: frame,
            }],
        }
    }
}

/// Applies the injection configuration to outgoing response frames.
#[derive(Debug, Default)]
pub struct ResponseInjector {
    config: InjectionConfig,
    /// Remaining manipulated responses before auto-reset, when armed.
    remaining: u32,
}

impl ResponseInjector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(&self) -> &InjectionConfig {
        &self.config
    }

    /// Apply a new configuration ("Set"), re-arming the auto-clear counter.
    pub fn set(&mut self, config: InjectionConfig) {
        self.remaining = config.clear_after;
        self.config = config;
    }

    /// Restore the default configuration ("Reset").
    pub fn reset(&mut self) {
        *self = ResponseInjector::default();
    }

    /// Plan the on-wire form of one encoded response frame.
    ///
    /// `request_function` is needed to build the exception response in
    /// `Error` mode. With change-rate enabled, responses that lose the dice
    /// roll pass through untouched, delays and split included.
    pub fn plan(
        &mut self,
        header: &MbapHeader,
        request_function: u8,
        frame: Vec<u8>,
    ) -> ResponsePlan {
        if self.config.change_rate_enabled {
            let roll = rand::rng().random_range(0..100u32);
            if roll >= self.config.change_rate_pct as u32 {
                return ResponsePlan::passthrough(frame);
            }
        }

        let plan = self.manipulate(header, request_function, frame);

        if self.config.clear_after > 0 {
            self.remaining = self.remaining.saturating_sub(1);
            if self.remaining == 0 {
                debug!("injection auto-clear reached, restoring defaults");
                self.reset();
            }
        }

        plan
    }

    fn manipulate(
        &self,
        header: &MbapHeader,
        request_function: u8,
        frame: Vec<u8>,
    ) -> ResponsePlan {
        let payload = match self.config.mode {
            ResponseMode::Normal => frame,
            ResponseMode::Error => {
                let pdu = [request_function | 0x80, self.config.error as u8];
                encode_adu(header, &pdu)
            }
            ResponseMode::Empty => {
                debug!("suppressing response for transaction {}", header.transaction_id);
                return ResponsePlan::default();
            }
            ResponseMode::Junk => {
                let mut junk = vec![0u8; self.config.junk_len as usize];
                rand::rng().fill(&mut junk[..]);
                junk
            }
        };

        let initial_delay = Duration::from_secs(self.config.delay_secs as u64);
        let mut chunks = Vec::with_capacity(2);
        if self.config.split && payload.len() > 1 {
            let mid = payload.len() / 2;
            chunks.push(Chunk {
                delay: initial_delay,
                bytes: payload[..mid].to_vec(),
            });
            chunks.push(Chunk {
                delay: Duration::from_secs(self.config.split_delay_secs as u64),
                bytes: payload[mid..].to_vec(),
            });
        } else {
            chunks.push(Chunk {
                delay: initial_delay,
                bytes: payload,
            });
        }
        ResponsePlan { chunks }
    }
}
