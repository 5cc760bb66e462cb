// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the modbus-simulator project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Tests for the simulated Modbus TCP server
//!
//! These tests validate the server functionality by starting a server
//! instance and connecting to it via a Modbus client. Register operations,
//! exception conditions, call monitoring and response injection are all
//! exercised over a real TCP connection.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::time;
use tokio_modbus::client::{tcp::connect, tcp::connect_slave, Reader, Writer};
use tokio_modbus::prelude::*;

use modbus_simulator::config::DeviceConfig;
use modbus_simulator::server::ModbusServer;
use modbus_simulator::simulator::{
    DisplayMode, InjectionConfig, MonitorFilter, ResponseMode, SimulatorState,
};

/// Test utility function to start a simulator server in the background
async fn start_test_server(
    unit_id: u8,
) -> Result<(SocketAddr, Arc<SimulatorState>), Box<dyn std::error::Error>> {
    let state = SimulatorState::new(&DeviceConfig::default());

    // Use port 0 to let the OS assign an available port
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let socket_addr = listener.local_addr()?;

    let server = ModbusServer::new(state.clone(), unit_id);
    tokio::spawn(async move {
        if let Err(e) = server.serve(listener).await {
            eprintln!("Server error: {}", e);
        }
    });

    // Give the server a moment to start
    time::sleep(Duration::from_millis(100)).await;

    Ok((socket_addr, state))
}

#[tokio::test]
async fn test_register_write_and_read_back() -> Result<(), Box<dyn std::error::Error>> {
    let (socket_addr, _state) = start_test_server(0).await?;
    let mut ctx = connect(socket_addr).await?;

    ctx.write_multiple_registers(10, &[1, 2, 3]).await??;
    let data = ctx.read_holding_registers(10, 3).await??;
    assert_eq!(data, vec![1, 2, 3]);

    ctx.write_single_register(10, 999).await??;
    let data = ctx.read_holding_registers(10, 1).await??;
    assert_eq!(data, vec![999]);

    ctx.disconnect().await?;
    Ok(())
}

#[tokio::test]
async fn test_coils_and_discrete_inputs() -> Result<(), Box<dyn std::error::Error>> {
    let (socket_addr, _state) = start_test_server(0).await?;
    let mut ctx = connect(socket_addr).await?;

    ctx.write_single_coil(3, true).await??;
    ctx.write_multiple_coils(5, &[true, false, true]).await??;

    let coils = ctx.read_coils(0, 8).await??;
    assert_eq!(
        coils,
        vec![false, false, false, true, false, true, false, true]
    );

    // Discrete inputs start all off
    let inputs = ctx.read_discrete_inputs(0, 4).await??;
    assert_eq!(inputs, vec![false; 4]);

    ctx.disconnect().await?;
    Ok(())
}

#[tokio::test]
async fn test_out_of_range_access_yields_exception() -> Result<(), Box<dyn std::error::Error>> {
    let (socket_addr, _state) = start_test_server(0).await?;
    let mut ctx = connect(socket_addr).await?;

    // The default device exposes 100 registers per bank
    let result = ctx.read_holding_registers(98, 4).await?;
    assert_eq!(result, Err(ExceptionCode::IllegalDataAddress));

    let result = ctx.write_single_register(100, 1).await?;
    assert_eq!(result, Err(ExceptionCode::IllegalDataAddress));

    ctx.disconnect().await?;
    Ok(())
}

#[tokio::test]
async fn test_unknown_function_yields_illegal_function() -> Result<(), Box<dyn std::error::Error>>
{
    let (socket_addr, _state) = start_test_server(0).await?;

    // tokio-modbus does not expose function 0x07, so talk raw Modbus TCP
    let mut stream = tokio::net::TcpStream::connect(socket_addr).await?;
    let request = [0x00, 0x01, 0x00, 0x00, 0x00, 0x02, 0xFF, 0x07];
    stream.write_all(&request).await?;

    let mut response = [0u8; 9];
    stream.read_exact(&mut response).await?;
    assert_eq!(&response[0..2], &[0x00, 0x01]); // transaction id echoed
    assert_eq!(&response[4..6], &[0x00, 0x03]); // unit id + 2 byte PDU
    assert_eq!(&response[7..9], &[0x87, 0x01]); // IllegalFunction exception

    Ok(())
}

#[tokio::test]
async fn test_requests_for_other_units_are_dropped() -> Result<(), Box<dyn std::error::Error>> {
    let (socket_addr, _state) = start_test_server(5).await?;

    // The wildcard unit id 0xFF is accepted by the default client
    let mut ctx = connect(socket_addr).await?;
    let data = ctx.read_holding_registers(0, 1).await??;
    assert_eq!(data, vec![0]);
    ctx.disconnect().await?;

    // A mismatching unit id gets no answer at all
    let mut ctx = connect_slave(socket_addr, Slave(9)).await?;
    let result = time::timeout(Duration::from_millis(500), ctx.read_holding_registers(0, 1)).await;
    assert!(result.is_err(), "expected no response for unit 9");

    Ok(())
}

#[tokio::test]
async fn test_monitor_captures_matching_traffic() -> Result<(), Box<dyn std::error::Error>> {
    let (socket_addr, state) = start_test_server(0).await?;

    state.monitor.lock().unwrap().start(
        MonitorFilter {
            range_start: Some(10),
            range_stop: Some(20),
            function: None,
        },
        DisplayMode::default(),
    );

    let mut ctx = connect(socket_addr).await?;
    ctx.read_holding_registers(12, 2).await??; // matches
    ctx.read_holding_registers(50, 2).await??; // outside the range
    ctx.disconnect().await?;

    let monitor = state.monitor.lock().unwrap();
    assert_eq!(monitor.total_requests(), 2);
    let records: Vec<_> = monitor.records().collect();
    assert_eq!(records.len(), 2); // one request row, one response row
    assert_eq!(records[0].function, 3);
    assert_eq!(records[0].address, Some(12));

    Ok(())
}

#[tokio::test]
async fn test_injected_error_reaches_the_client() -> Result<(), Box<dyn std::error::Error>> {
    let (socket_addr, state) = start_test_server(0).await?;

    state.injector.lock().unwrap().set(InjectionConfig {
        mode: ResponseMode::Error,
        error: modbus_simulator::protocol::ExceptionCode::ServerDeviceBusy,
        ..Default::default()
    });

    let mut ctx = connect(socket_addr).await?;
    let result = ctx.read_holding_registers(0, 1).await?;
    assert_eq!(result, Err(ExceptionCode::ServerDeviceBusy));

    // Reset and the same request succeeds again
    state.injector.lock().unwrap().reset();
    let data = ctx.read_holding_registers(0, 1).await??;
    assert_eq!(data, vec![0]);

    ctx.disconnect().await?;
    Ok(())
}

#[tokio::test]
async fn test_empty_mode_leaves_the_client_waiting() -> Result<(), Box<dyn std::error::Error>> {
    let (socket_addr, state) = start_test_server(0).await?;

    state.injector.lock().unwrap().set(InjectionConfig {
        mode: ResponseMode::Empty,
        ..Default::default()
    });

    let mut ctx = connect(socket_addr).await?;
    let result = time::timeout(Duration::from_millis(500), ctx.read_holding_registers(0, 1)).await;
    assert!(result.is_err(), "expected a timeout waiting for a response");

    Ok(())
}

#[tokio::test]
async fn test_clear_after_restores_normal_service() -> Result<(), Box<dyn std::error::Error>> {
    let (socket_addr, state) = start_test_server(0).await?;

    state.injector.lock().unwrap().set(InjectionConfig {
        mode: ResponseMode::Error,
        error: modbus_simulator::protocol::ExceptionCode::ServerDeviceFailure,
        clear_after: 2,
        ..Default::default()
    });

    let mut ctx = connect(socket_addr).await?;
    assert!(ctx.read_holding_registers(0, 1).await?.is_err());
    assert!(ctx.read_holding_registers(0, 1).await?.is_err());

    // The injection configuration auto-cleared after two responses
    let data = ctx.read_holding_registers(0, 1).await??;
    assert_eq!(data, vec![0]);
    assert_eq!(
        state.injector.lock().unwrap().config().mode,
        ResponseMode::Normal
    );

    ctx.disconnect().await?;
    Ok(())
}

#[tokio::test]
async fn test_injected_delay_slows_the_response() -> Result<(), Box<dyn std::error::Error>> {
    let (socket_addr, state) = start_test_server(0).await?;

    state.injector.lock().unwrap().set(InjectionConfig {
        delay_secs: 1,
        ..Default::default()
    });

    let mut ctx = connect(socket_addr).await?;
    let started = std::time::Instant::now();
    let data = ctx.read_holding_registers(0, 1).await??;
    assert_eq!(data, vec![0]);
    assert!(started.elapsed() >= Duration::from_secs(1));

    ctx.disconnect().await?;
    Ok(())
}

#[tokio::test]
async fn test_split_response_still_parses() -> Result<(), Box<dyn std::error::Error>> {
    let (socket_addr, state) = start_test_server(0).await?;

    state.injector.lock().unwrap().set(InjectionConfig {
        split: true,
        split_delay_secs: 1,
        ..Default::default()
    });

    let mut ctx = connect(socket_addr).await?;
    let started = std::time::Instant::now();
    let data = ctx.read_holding_registers(0, 2).await??;
    assert_eq!(data, vec![0, 0]);
    // The second half arrived a split delay later
    assert!(started.elapsed() >= Duration::from_secs(1));

    ctx.disconnect().await?;
    Ok(())
}
