// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the modbus-simulator project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Request/response PDU codec
//!
//! Decodes the request PDUs the simulated device answers and encodes the
//! matching responses. Unknown function codes are preserved as
//! [`Request::Unknown`] so the call monitor can still display them; the
//! service layer answers them with an IllegalFunction exception.

use super::ProtocolError;

/// Function code / name table.
///
/// Drives the dashboard's function filter selector and the decoded call
/// display. The table intentionally lists a few codes the device itself does
/// not implement; the monitor can filter on them all the same.
pub const FUNCTION_NAMES: &[(u8, &str)] = &[
    (1, "Read Coils"),
    (2, "Read Discrete Inputs"),
    (3, "Read Holding Registers"),
    (4, "Read Input Registers"),
    (5, "Write Single Coil"),
    (6, "Write Single Register"),
    (15, "Write Multiple Coils"),
    (16, "Write Multiple Registers"),
    (22, "Mask Write Register"),
    (23, "Read/Write Multiple Registers"),
    (43, "Encapsulated Interface Transport"),
];

/// Look up the display name for a function code.
pub fn function_name(function: u8) -> &'static str {
    FUNCTION_NAMES
        .iter()
        .find(|(code, _)| *code == function)
        .map(|(_, name)| *name)
        .unwrap_or("Unknown")
}

/// Modbus exception codes the simulator can answer or inject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExceptionCode {
    IllegalFunction = 1,
    IllegalDataAddress = 2,
    IllegalDataValue = 3,
    ServerDeviceFailure = 4,
    Acknowledge = 5,
    ServerDeviceBusy = 6,
    MemoryParityError = 8,
    GatewayPathUnavailable = 10,
    GatewayTargetFailedToRespond = 11,
}

impl ExceptionCode {
    /// All codes, in wire-value order. Drives the dashboard's error selector.
    pub const ALL: &'static [ExceptionCode] = &[
        ExceptionCode::IllegalFunction,
        ExceptionCode::IllegalDataAddress,
        ExceptionCode::IllegalDataValue,
        ExceptionCode::ServerDeviceFailure,
        ExceptionCode::Acknowledge,
        ExceptionCode::ServerDeviceBusy,
        ExceptionCode::MemoryParityError,
        ExceptionCode::GatewayPathUnavailable,
        ExceptionCode::GatewayTargetFailedToRespond,
    ];

    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| *c as u8 == value)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExceptionCode::IllegalFunction => "Illegal Function",
            ExceptionCode::IllegalDataAddress => "Illegal Data Address",
            ExceptionCode::IllegalDataValue => "Illegal Data Value",
            ExceptionCode::ServerDeviceFailure => "Server Device Failure",
            ExceptionCode::Acknowledge => "Acknowledge",
            ExceptionCode::ServerDeviceBusy => "Server Device Busy",
            ExceptionCode::MemoryParityError => "Memory Parity Error",
            ExceptionCode::GatewayPathUnavailable => "Gateway Path Unavailable",
            ExceptionCode::GatewayTargetFailedToRespond => "Gateway Target Failed To Respond",
        }
    }
}

/// A decoded request PDU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    ReadCoils { addr: u16, count: u16 },
    ReadDiscreteInputs { addr: u16, count: u16 },
    ReadHoldingRegisters { addr: u16, count: u16 },
    ReadInputRegisters { addr: u16, count: u16 },
    /// `value` is kept raw; only 0x0000 and 0xFF00 are valid on the wire.
    WriteSingleCoil { addr: u16, value: u16 },
    WriteSingleRegister { addr: u16, value: u16 },
    WriteMultipleCoils { addr: u16, values: Vec<bool> },
    WriteMultipleRegisters { addr: u16, values: Vec<u16> },
    MaskWriteRegister { addr: u16, and_mask: u16, or_mask: u16 },
    ReadWriteMultipleRegisters {
        read_addr: u16,
        read_count: u16,
        write_addr: u16,
        values: Vec<u16>,
    },
    Unknown { function: u8, data: Vec<u8> },
}

fn be16(data: &[u8], index: usize) -> u16 {
    u16::from_be_bytes([data[index], data[index + 1]])
}

fn need(data: &[u8], len: usize, function: u8) -> Result<(), ProtocolError> {
    if data.len() < len {
        Err(ProtocolError::Truncated(function))
    } else {
        Ok(())
    }
}

/// Unpack `count` bits from the LSB-first packed representation.
fn unpack_bits(data: &[u8], count: u16) -> Vec<bool> {
    (0..count as usize)
        .map(|i| data[i / 8] & (1 << (i % 8)) != 0)
        .collect()
}

/// Pack bits into the LSB-first wire representation.
fn pack_bits(bits: &[bool]) -> Vec<u8> {
    let mut bytes = vec![0u8; bits.len().div_ceil(8)];
    for (i, bit) in bits.iter().enumerate() {
        if *bit {
            bytes[i / 8] |= 1 << (i % 8);
        }
    }
    bytes
}

impl Request {
    /// Decode a request PDU (function code byte followed by data).
    pub fn decode(pdu: &[u8]) -> Result<Self, ProtocolError> {
        let (&function, data) = pdu.split_first().ok_or(ProtocolError::EmptyPdu)?;
        let request = match function {
            1 | 2 | 3 | 4 => {
                need(data, 4, function)?;
                let addr = be16(data, 0);
                let count = be16(data, 2);
                match function {
                    1 => Request::ReadCoils { addr, count },
                    2 => Request::ReadDiscreteInputs { addr, count },
                    3 => Request::ReadHoldingRegisters { addr, count },
                    _ => Request::ReadInputRegisters { addr, count },
                }
            }
            5 => {
                need(data, 4, function)?;
                Request::WriteSingleCoil {
                    addr: be16(data, 0),
                    value: be16(data, 2),
                }
            }
            6 => {
                need(data, 4, function)?;
                Request::WriteSingleRegister {
                    addr: be16(data, 0),
                    value: be16(data, 2),
                }
            }
            15 => {
                need(data, 5, function)?;
                let addr = be16(data, 0);
                let count = be16(data, 2);
                let byte_count = data[4] as usize;
                if byte_count != (count as usize).div_ceil(8) {
                    return Err(ProtocolError::Truncated(function));
                }
                need(data, 5 + byte_count, function)?;
                Request::WriteMultipleCoils {
                    addr,
                    values: unpack_bits(&data[5..], count),
                }
            }
            16 => {
                need(data, 5, function)?;
                let addr = be16(data, 0);
                let count = be16(data, 2) as usize;
                let byte_count = data[4] as usize;
                if byte_count != count * 2 {
                    return Err(ProtocolError::Truncated(function));
                }
                need(data, 5 + byte_count, function)?;
                let values = (0..count).map(|i| be16(data, 5 + i * 2)).collect();
                Request::WriteMultipleRegisters { addr, values }
            }
            22 => {
                need(data, 6, function)?;
                Request::MaskWriteRegister {
                    addr: be16(data, 0),
                    and_mask: be16(data, 2),
                    or_mask: be16(data, 4),
                }
            }
            23 => {
                need(data, 9, function)?;
                let read_addr = be16(data, 0);
                let read_count = be16(data, 2);
                let write_addr = be16(data, 4);
                let write_count = be16(data, 6) as usize;
                let byte_count = data[8] as usize;
                if byte_count != write_count * 2 {
                    return Err(ProtocolError::Truncated(function));
                }
                need(data, 9 + byte_count, function)?;
                let values = (0..write_count).map(|i| be16(data, 9 + i * 2)).collect();
                Request::ReadWriteMultipleRegisters {
                    read_addr,
                    read_count,
                    write_addr,
                    values,
                }
            }
            _ => Request::Unknown {
                function,
                data: data.to_vec(),
            },
        };
        Ok(request)
    }

    pub fn function_code(&self) -> u8 {
        match self {
            Request::ReadCoils { .. } => 1,
            Request::ReadDiscreteInputs { .. } => 2,
            Request::ReadHoldingRegisters { .. } => 3,
            Request::ReadInputRegisters { .. } => 4,
            Request::WriteSingleCoil { .. } => 5,
            Request::WriteSingleRegister { .. } => 6,
            Request::WriteMultipleCoils { .. } => 15,
            Request::WriteMultipleRegisters { .. } => 16,
            Request::MaskWriteRegister { .. } => 22,
            Request::ReadWriteMultipleRegisters { .. } => 23,
            Request::Unknown { function, .. } => *function,
        }
    }

    /// Starting address of the addressed operation, if any.
    ///
    /// Used by the call monitor's range filter. Read/write combined requests
    /// report their read address.
    pub fn address(&self) -> Option<u16> {
        match self {
            Request::ReadCoils { addr, .. }
            | Request::ReadDiscreteInputs { addr, .. }
            | Request::ReadHoldingRegisters { addr, .. }
            | Request::ReadInputRegisters { addr, .. }
            | Request::WriteSingleCoil { addr, .. }
            | Request::WriteSingleRegister { addr, .. }
            | Request::WriteMultipleCoils { addr, .. }
            | Request::WriteMultipleRegisters { addr, .. }
            | Request::MaskWriteRegister { addr, .. } => Some(*addr),
            Request::ReadWriteMultipleRegisters { read_addr, .. } => Some(*read_addr),
            Request::Unknown { .. } => None,
        }
    }

    /// Number of addressed items, if the operation has an extent.
    pub fn count(&self) -> Option<u16> {
        match self {
            Request::ReadCoils { count, .. }
            | Request::ReadDiscreteInputs { count, .. }
            | Request::ReadHoldingRegisters { count, .. }
            | Request::ReadInputRegisters { count, .. } => Some(*count),
            Request::WriteSingleCoil { .. }
            | Request::WriteSingleRegister { .. }
            | Request::MaskWriteRegister { .. } => Some(1),
            Request::WriteMultipleCoils { values, .. } => Some(values.len() as u16),
            Request::WriteMultipleRegisters { values, .. } => Some(values.len() as u16),
            Request::ReadWriteMultipleRegisters { read_count, .. } => Some(*read_count),
            Request::Unknown { .. } => None,
        }
    }

    /// Human-readable one-line form for the monitoring table.
    pub fn summary(&self) -> String {
        match self {
            Request::ReadCoils { addr, count }
            | Request::ReadDiscreteInputs { addr, count }
            | Request::ReadHoldingRegisters { addr, count }
            | Request::ReadInputRegisters { addr, count } => {
                format!("read addr={addr} count={count}")
            }
            Request::WriteSingleCoil { addr, value } => {
                format!("write coil addr={addr} value={}", *value == 0xFF00)
            }
            Request::WriteSingleRegister { addr, value } => {
                format!("write addr={addr} value={value}")
            }
            Request::WriteMultipleCoils { addr, values } => {
                format!("write coils addr={addr} count={}", values.len())
            }
            Request::WriteMultipleRegisters { addr, values } => {
                format!("write addr={addr} values={values:?}")
            }
            Request::MaskWriteRegister {
                addr,
                and_mask,
                or_mask,
            } => format!("mask write addr={addr} and={and_mask:#06x} or={or_mask:#06x}"),
            Request::ReadWriteMultipleRegisters {
                read_addr,
                read_count,
                write_addr,
                values,
            } => format!(
                "read addr={read_addr} count={read_count}, write addr={write_addr} values={values:?}"
            ),
            Request::Unknown { function, data } => {
                format!("function {function} with {} data bytes", data.len())
            }
        }
    }
}

/// A response PDU ready to be encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Bit read responses (function codes 1 and 2).
    Bits { function: u8, bits: Vec<bool> },
    /// Register read responses (function codes 3, 4 and 23).
    Registers { function: u8, values: Vec<u16> },
    /// Single write echoes (function codes 5 and 6).
    WriteSingle { function: u8, addr: u16, value: u16 },
    /// Multiple write acknowledgements (function codes 15 and 16).
    WriteMultiple { function: u8, addr: u16, count: u16 },
    /// Mask write echo (function code 22).
    MaskWrite { addr: u16, and_mask: u16, or_mask: u16 },
    Exception { function: u8, code: ExceptionCode },
}

impl Response {
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Response::Bits { function, bits } => {
                let packed = pack_bits(bits);
                let mut pdu = Vec::with_capacity(2 + packed.len());
                pdu.push(*function);
                pdu.push(packed.len() as u8);
                pdu.extend_from_slice(&packed);
                pdu
            }
            Response::Registers { function, values } => {
                let mut pdu = Vec::with_capacity(2 + values.len() * 2);
                pdu.push(*function);
                pdu.push((values.len() * 2) as u8);
                for value in values {
                    pdu.extend_from_slice(&value.to_be_bytes());
                }
                pdu
            }
            Response::WriteSingle {
                function,
                addr,
                value,
            } => {
                let mut pdu = Vec::with_capacity(5);
                pdu.push(*function);
                pdu.extend_from_slice(&addr.to_be_bytes());
                pdu.extend_from_slice(&value.to_be_bytes());
                pdu
            }
            Response::WriteMultiple {
                function,
                addr,
                count,
            } => {
                let mut pdu = Vec::with_capacity(5);
                pdu.push(*function);
                pdu.extend_from_slice(&addr.to_be_bytes());
                pdu.extend_from_slice(&count.to_be_bytes());
                pdu
            }
            Response::MaskWrite {
                addr,
                and_mask,
                or_mask,
            } => {
                let mut pdu = Vec::with_capacity(7);
                pdu.push(22);
                pdu.extend_from_slice(&addr.to_be_bytes());
                pdu.extend_from_slice(&and_mask.to_be_bytes());
                pdu.extend_from_slice(&or_mask.to_be_bytes());
                pdu
            }
            Response::Exception { function, code } => {
                vec![function | 0x80, *code as u8]
            }
        }
    }

    pub fn function_code(&self) -> u8 {
        match self {
            Response::Bits { function, .. }
            | Response::Registers { function, .. }
            | Response::WriteSingle { function, .. }
            | Response::WriteMultiple { function, .. } => *function,
            Response::MaskWrite { .. } => 22,
            Response::Exception { function, .. } => *function,
        }
    }

    pub fn is_exception(&self) -> bool {
        matches!(self, Response::Exception { .. })
    }

    /// Human-readable one-line form for the monitoring table.
    pub fn summary(&self) -> String {
        match self {
            Response::Bits { bits, .. } => {
                let shown: Vec<u8> = bits.iter().map(|b| *b as u8).collect();
                format!("bits={shown:?}")
            }
            Response::Registers { values, .. } => format!("values={values:?}"),
            Response::WriteSingle { addr, value, .. } => {
                format!("wrote addr={addr} value={value}")
            }
            Response::WriteMultiple { addr, count, .. } => {
                format!("wrote addr={addr} count={count}")
            }
            Response::MaskWrite {
                addr,
                and_mask,
                or_mask,
            } => format!("masked addr={addr} and={and_mask:#06x} or={or_mask:#06x}"),
            Response::Exception { code, .. } => {
                format!("exception {} ({})", *code as u8, code.label())
            }
        }
    }
}
