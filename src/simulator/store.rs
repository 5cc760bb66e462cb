// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the modbus-simulator project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Simulated device data store
//!
//! The four Modbus data banks of the simulated device. Each bank is a
//! `HashMap` keyed by register/bit address; an address is valid exactly when
//! it has an entry, so reads and writes outside the configured block sizes
//! fail with `IllegalDataAddress` without any extra bookkeeping.
//!
//! ## Status registers
//!
//! When the device is configured with at least four input registers, the
//! daemon refreshes a small status block once per second:
//!
//! | Input Register | Description |
//! |----------------|-------------|
//! | 0 | Uptime (Low Word), seconds |
//! | 1 | Uptime (High Word), seconds |
//! | 2 | Served requests (Low Word) |
//! | 3 | Served requests (High Word) |

use std::collections::HashMap;

use crate::config::{DeviceConfig, RegisterBank};
use crate::protocol::ExceptionCode;

/// The data banks of one simulated Modbus server device.
#[derive(Debug)]
pub struct DeviceStore {
    coils: HashMap<u16, bool>,
    discrete_inputs: HashMap<u16, bool>,
    input_registers: HashMap<u16, u16>,
    holding_registers: HashMap<u16, u16>,
}

impl DeviceStore {
    /// Build the banks from the configured block sizes and register seeds.
    ///
    /// Seed addresses are validated by the configuration layer; a seed
    /// outside its bank never reaches this constructor.
    pub fn new(config: &DeviceConfig) -> Self {
        let mut store = DeviceStore {
            coils: (0..config.coils).map(|a| (a, false)).collect(),
            discrete_inputs: (0..config.discrete_inputs).map(|a| (a, false)).collect(),
            input_registers: (0..config.input_registers).map(|a| (a, 0)).collect(),
            holding_registers: (0..config.holding_registers).map(|a| (a, 0)).collect(),
        };
        for seed in &config.register_values {
            let bank = match seed.bank {
                RegisterBank::Holding => &mut store.holding_registers,
                RegisterBank::Input => &mut store.input_registers,
            };
            if let Some(slot) = bank.get_mut(&seed.address) {
                *slot = seed.value;
            }
        }
        store
    }

    pub fn read_coils(&self, addr: u16, count: u16) -> Result<Vec<bool>, ExceptionCode> {
        bit_read(&self.coils, addr, count)
    }

    pub fn read_discrete_inputs(&self, addr: u16, count: u16) -> Result<Vec<bool>, ExceptionCode> {
        bit_read(&self.discrete_inputs, addr, count)
    }

    pub fn read_holding_registers(&self, addr: u16, count: u16) -> Result<Vec<u16>, ExceptionCode> {
        register_read(&self.holding_registers, addr, count)
    }

    pub fn read_input_registers(&self, addr: u16, count: u16) -> Result<Vec<u16>, ExceptionCode> {
        register_read(&self.input_registers, addr, count)
    }

    pub fn write_coil(&mut self, addr: u16, value: bool) -> Result<(), ExceptionCode> {
        bit_write(&mut self.coils, addr, std::slice::from_ref(&value))
    }

    pub fn write_coils(&mut self, addr: u16, values: &[bool]) -> Result<(), ExceptionCode> {
        bit_write(&mut self.coils, addr, values)
    }

    pub fn write_register(&mut self, addr: u16, value: u16) -> Result<(), ExceptionCode> {
        register_write(&mut self.holding_registers, addr, std::slice::from_ref(&value))
    }

    pub fn write_registers(&mut self, addr: u16, values: &[u16]) -> Result<(), ExceptionCode> {
        register_write(&mut self.holding_registers, addr, values)
    }

    /// Mask write per the Modbus specification:
    /// result = (current AND and_mask) OR (or_mask AND NOT and_mask).
    pub fn mask_write_register(
        &mut self,
        addr: u16,
        and_mask: u16,
        or_mask: u16,
    ) -> Result<(), ExceptionCode> {
        let current = *self
            .holding_registers
            .get(&addr)
            .ok_or(ExceptionCode::IllegalDataAddress)?;
        let result = (current & and_mask) | (or_mask & !and_mask);
        self.holding_registers.insert(addr, result);
        Ok(())
    }

    /// Refresh the status block in the input registers.
    ///
    /// Registers that do not exist (small configured bank) are skipped.
    pub fn update_status(&mut self, uptime_secs: u64, served_requests: u64) {
        let words = [
            (uptime_secs & 0xFFFF) as u16,
            ((uptime_secs >> 16) & 0xFFFF) as u16,
            (served_requests & 0xFFFF) as u16,
            ((served_requests >> 16) & 0xFFFF) as u16,
        ];
        for (addr, word) in words.iter().enumerate() {
            if let Some(slot) = self.input_registers.get_mut(&(addr as u16)) {
                *slot = *word;
            }
        }
    }
}

/// Read a run of bits, failing if any address is missing.
fn bit_read(bank: &HashMap<u16, bool>, addr: u16, count: u16) -> Result<Vec<bool>, ExceptionCode> {
    let mut values = Vec::with_capacity(count as usize);
    for i in 0..count {
        let bit_addr = addr.checked_add(i).ok_or(ExceptionCode::IllegalDataAddress)?;
        match bank.get(&bit_addr) {
            Some(bit) => values.push(*bit),
            None => return Err(ExceptionCode::IllegalDataAddress),
        }
    }
    Ok(values)
}

fn bit_write(
    bank: &mut HashMap<u16, bool>,
    addr: u16,
    values: &[bool],
) -> Result<(), ExceptionCode> {
    // Validate the whole run before mutating anything
    for i in 0..values.len() {
        let bit_addr = addr
            .checked_add(i as u16)
            .ok_or(ExceptionCode::IllegalDataAddress)?;
        if !bank.contains_key(&bit_addr) {
            return Err(ExceptionCode::IllegalDataAddress);
        }
    }
    for (i, value) in values.iter().enumerate() {
        bank.insert(addr + i as u16, *value);
    }
    Ok(())
}

fn register_read(
    bank: &HashMap<u16, u16>,
    addr: u16,
    count: u16,
) -> Result<Vec<u16>, ExceptionCode> {
    let mut values = Vec::with_capacity(count as usize);
    for i in 0..count {
        let reg_addr = addr.checked_add(i).ok_or(ExceptionCode::IllegalDataAddress)?;
        match bank.get(&reg_addr) {
            Some(value) => values.push(*value),
            None => return Err(ExceptionCode::IllegalDataAddress),
        }
    }
    Ok(values)
}

fn register_write(
    bank: &mut HashMap<u16, u16>,
    addr: u16,
    values: &[u16],
) -> Result<(), ExceptionCode> {
    for i in 0..values.len() {
        let reg_addr = addr
            .checked_add(i as u16)
            .ok_or(ExceptionCode::IllegalDataAddress)?;
        if !bank.contains_key(&reg_addr) {
            return Err(ExceptionCode::IllegalDataAddress);
        }
    }
    for (i, value) in values.iter().enumerate() {
        bank.insert(addr + i as u16, *value);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegisterSeed;

    fn small_device() -> DeviceConfig {
        DeviceConfig {
            coils: 8,
            discrete_inputs: 8,
            input_registers: 8,
            holding_registers: 8,
            register_values: vec![RegisterSeed {
                bank: RegisterBank::Holding,
                address: 3,
                value: 1234,
            }],
        }
    }

    #[test]
    fn seeds_are_applied() {
        let store = DeviceStore::new(&small_device());
        assert_eq!(store.read_holding_registers(3, 1).unwrap(), vec![1234]);
        assert_eq!(store.read_holding_registers(0, 1).unwrap(), vec![0]);
    }

    #[test]
    fn out_of_range_read_is_illegal_address() {
        let store = DeviceStore::new(&small_device());
        assert_eq!(
            store.read_holding_registers(6, 4),
            Err(ExceptionCode::IllegalDataAddress)
        );
        assert_eq!(
            store.read_coils(8, 1),
            Err(ExceptionCode::IllegalDataAddress)
        );
    }

    #[test]
    fn partially_invalid_write_leaves_bank_untouched() {
        let mut store = DeviceStore::new(&small_device());
        assert_eq!(
            store.write_registers(6, &[1, 2, 3]),
            Err(ExceptionCode::IllegalDataAddress)
        );
        assert_eq!(store.read_holding_registers(6, 2).unwrap(), vec![0, 0]);
    }

    #[test]
    fn mask_write_follows_spec_formula() {
        let mut store = DeviceStore::new(&small_device());
        store.write_register(0, 0x0012).unwrap();
        store.mask_write_register(0, 0x00F2, 0x0025).unwrap();
        // (0x12 & 0xF2) | (0x25 & !0xF2) = 0x12 | 0x05 = 0x17
        assert_eq!(store.read_holding_registers(0, 1).unwrap(), vec![0x17]);
    }

    #[test]
    fn status_block_skips_missing_registers() {
        let config = DeviceConfig {
            input_registers: 2,
            ..small_device()
        };
        let mut store = DeviceStore::new(&config);
        store.update_status(0x0002_0001, 42);
        assert_eq!(store.read_input_registers(0, 2).unwrap(), vec![1, 2]);
        assert_eq!(
            store.read_input_registers(2, 1),
            Err(ExceptionCode::IllegalDataAddress)
        );
    }
}
