// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the modbus-simulator project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Modbus TCP framing and PDU codec
//!
//! The simulator owns its framing layer because the response injector has to
//! operate on raw frames: junk bytes, suppressed replies and split writes all
//! happen below the level a ready-made Modbus server API exposes.
//!
//! The module is split into:
//! - [`frame`]: the MBAP header (transaction id, protocol id, length, unit id)
//!   and async frame read/write over a TCP stream
//! - [`codec`]: request/response PDU encoding and decoding, exception codes,
//!   and the function-code name table used by the dashboard

pub mod codec;
pub mod frame;

pub use codec::{function_name, ExceptionCode, Request, Response, FUNCTION_NAMES};
pub use frame::{read_frame, MbapHeader};

use thiserror::Error;

/// Errors produced while framing or decoding Modbus TCP traffic.
///
/// `Io` covers transport failures; the remaining variants are protocol
/// violations by the peer. None of them are recoverable for the current
/// frame, but only `Io` terminates the connection.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid MBAP protocol id {0:#06x} (expected 0x0000)")]
    InvalidProtocolId(u16),

    #[error("MBAP length field {0} out of range")]
    InvalidLength(u16),

    #[error("empty PDU")]
    EmptyPdu,

    #[error("truncated PDU for function code {0:#04x}")]
    Truncated(u8),
}
