// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the modbus-simulator project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Tests for configuration loading, validation and CLI overrides

use anyhow::Result;
use modbus_simulator::config::Config;
use tempfile::tempdir;

#[test]
fn test_config_load_and_save() -> Result<()> {
    // Create a temporary directory
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("config.yaml");

    // Create a custom config
    let mut config = Config::default();
    config.server.port = 1502;
    config.server.address = "0.0.0.0".to_string();
    config.dashboard.port = 8081;
    config.dashboard.refresh_secs = 10;

    // Save config to file
    config.save_to_file(&config_path)?;

    // Load config from file
    let loaded_config = Config::from_file(&config_path)?;

    // Verify loaded config matches original
    assert_eq!(loaded_config.server.port, 1502);
    assert_eq!(loaded_config.server.address, "0.0.0.0");
    assert_eq!(loaded_config.dashboard.port, 8081);
    assert_eq!(loaded_config.dashboard.refresh_secs, 10);

    Ok(())
}

#[test]
fn test_missing_file_creates_default() -> Result<()> {
    let temp_dir = tempdir()?;
    let non_existent_path = temp_dir.path().join("non_existent.yaml");

    let default_config = Config::from_file(&non_existent_path)?;

    // Verify default config was created and written out
    assert!(non_existent_path.exists());
    assert_eq!(default_config.server.port, 5020);
    assert_eq!(default_config.dashboard.port, 8080);
    assert_eq!(default_config.device.holding_registers, 100);

    Ok(())
}

#[test]
fn test_schema_rejection_creates_sample_file() -> Result<()> {
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("config.yaml");

    // An unknown section violates the schema
    std::fs::write(&config_path, "server:\n  port: 5020\nunknown_section: 1\n")?;

    let result = Config::from_file(&config_path);
    assert!(result.is_err());

    // A sample file with default values was written next to the input
    let sample_path = temp_dir.path().join("config.sample.yaml");
    assert!(sample_path.exists());
    let sample = Config::from_file(&sample_path)?;
    assert_eq!(sample.server.port, 5020);

    Ok(())
}

#[test]
fn test_out_of_range_port_is_rejected() -> Result<()> {
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("config.yaml");

    std::fs::write(&config_path, "server:\n  port: 0\n")?;
    assert!(Config::from_file(&config_path).is_err());

    Ok(())
}

#[test]
fn test_register_seed_outside_bank_is_rejected() -> Result<()> {
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("config.yaml");

    std::fs::write(
        &config_path,
        "device:\n  holding_registers: 10\n  register_values:\n    - bank: holding\n      address: 10\n      value: 1\n",
    )?;
    let err = Config::from_file(&config_path).unwrap_err();
    assert!(err.to_string().contains("outside the configured bank"));

    Ok(())
}

#[test]
fn test_apply_args_overrides() {
    let mut config = Config::default();
    assert_eq!(config.server.port, 5020);
    assert!(config.dashboard.enabled);

    config.apply_args(
        Some(false),
        Some("192.168.0.1".to_string()),
        Some(1502),
        Some(false),
        None,
        Some(9000),
    );

    assert!(!config.server.enabled);
    assert_eq!(config.server.address, "192.168.0.1");
    assert_eq!(config.server.port, 1502);
    assert!(!config.dashboard.enabled);
    assert_eq!(config.dashboard.address, "127.0.0.1");
    assert_eq!(config.dashboard.port, 9000);
}

#[test]
fn test_seeded_registers_reach_the_store() -> Result<()> {
    use modbus_simulator::simulator::DeviceStore;

    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("config.yaml");
    std::fs::write(
        &config_path,
        "device:\n  register_values:\n    - bank: holding\n      address: 5\n      value: 4660\n",
    )?;
    let config = Config::from_file(&config_path)?;

    let store = DeviceStore::new(&config.device);
    assert_eq!(store.read_holding_registers(5, 1).unwrap(), vec![4660]);

    Ok(())
}
