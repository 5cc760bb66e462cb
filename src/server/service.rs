// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the modbus-simulator project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Request execution against the device store
//!
//! Validates quantities per the Modbus specification, dispatches to the
//! device store banks and turns store errors into exception responses. This
//! is the "honest" response; the injector decides afterwards what actually
//! goes on the wire.

use log::debug;

use crate::protocol::{ExceptionCode, Request, Response};
use crate::simulator::DeviceStore;

// Quantity limits from the Modbus application protocol specification
const MAX_READ_BITS: u16 = 0x7D0;
const MAX_READ_REGISTERS: u16 = 0x7D;
const MAX_WRITE_BITS: u16 = 0x7B0;
const MAX_WRITE_REGISTERS: u16 = 0x7B;
const MAX_RW_WRITE_REGISTERS: u16 = 0x79;

/// Execute one decoded request and produce the matching response.
pub fn execute(request: &Request, store: &mut DeviceStore) -> Response {
    let function = request.function_code();
    match run(request, store) {
        Ok(response) => response,
        Err(code) => {
            debug!(
                "answering function {} with exception {} ({})",
                function, code as u8, code.label()
            );
            Response::Exception { function, code }
        }
    }
}

fn check_count(count: u16, max: u16) -> Result<(), ExceptionCode> {
    if count == 0 || count > max {
        Err(ExceptionCode::IllegalDataValue)
    } else {
        Ok(())
    }
}

fn run(request: &Request, store: &mut DeviceStore) -> Result<Response, ExceptionCode> {
    match request {
        Request::ReadCoils { addr, count } => {
            check_count(*count, MAX_READ_BITS)?;
            Ok(Response::Bits {
                function: 1,
                bits: store.read_coils(*addr, *count)?,
            })
        }
        Request::ReadDiscreteInputs { addr, count } => {
            check_count(*count, MAX_READ_BITS)?;
            Ok(Response::Bits {
                function: 2,
                bits: store.read_discrete_inputs(*addr, *count)?,
            })
        }
        Request::ReadHoldingRegisters { addr, count } => {
            check_count(*count, MAX_READ_REGISTERS)?;
            Ok(Response::Registers {
                function: 3,
                values: store.read_holding_registers(*addr, *count)?,
            })
        }
        Request::ReadInputRegisters { addr, count } => {
            check_count(*count, MAX_READ_REGISTERS)?;
            Ok(Response::Registers {
                function: 4,
                values: store.read_input_registers(*addr, *count)?,
            })
        }
        Request::WriteSingleCoil { addr, value } => {
            // Only ON (0xFF00) and OFF (0x0000) are valid coil values
            let state = match *value {
                0xFF00 => true,
                0x0000 => false,
                _ => return Err(ExceptionCode::IllegalDataValue),
            };
            store.write_coil(*addr, state)?;
            Ok(Response::WriteSingle {
                function: 5,
                addr: *addr,
                value: *value,
            })
        }
        Request::WriteSingleRegister { addr, value } => {
            store.write_register(*addr, *value)?;
            Ok(Response::WriteSingle {
                function: 6,
                addr: *addr,
                value: *value,
            })
        }
        Request::WriteMultipleCoils { addr, values } => {
            check_count(values.len() as u16, MAX_WRITE_BITS)?;
            store.write_coils(*addr, values)?;
            Ok(Response::WriteMultiple {
                function: 15,
                addr: *addr,
                count: values.len() as u16,
            })
        }
        Request::WriteMultipleRegisters { addr, values } => {
            check_count(values.len() as u16, MAX_WRITE_REGISTERS)?;
            store.write_registers(*addr, values)?;
            Ok(Response::WriteMultiple {
                function: 16,
                addr: *addr,
                count: values.len() as u16,
            })
        }
        Request::MaskWriteRegister {
            addr,
            and_mask,
            or_mask,
        } => {
            store.mask_write_register(*addr, *and_mask, *or_mask)?;
            Ok(Response::MaskWrite {
                addr: *addr,
                and_mask: *and_mask,
                or_mask: *or_mask,
            })
        }
        Request::ReadWriteMultipleRegisters {
            read_addr,
            read_count,
            write_addr,
            values,
        } => {
            check_count(*read_count, MAX_READ_REGISTERS)?;
            check_count(values.len() as u16, MAX_RW_WRITE_REGISTERS)?;
            // Write first, then read, per the specification
            store.write_registers(*write_addr, values)?;
            Ok(Response::Registers {
                function: 23,
                values: store.read_holding_registers(*read_addr, *read_count)?,
            })
        }
        Request::Unknown { function, .. } => {
            debug!("unimplemented function code in request: {}", function);
            Err(ExceptionCode::IllegalFunction)
        }
    }
}
