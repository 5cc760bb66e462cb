// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the modbus-simulator project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Simple Modbus client example for the device simulator
//!
//! This example demonstrates how to connect to the simulator and exercise
//! its register banks. It can be used as a smoke test for injection
//! settings configured through the dashboard: switch the response type on
//! the calls page and watch how the client reacts.
//!
//! ## Usage
//!
//! First, start the simulator:
//! ```bash
//! cargo run -- --config config.yaml
//! ```
//!
//! Then run this client example:
//! ```bash
//! cargo run --example modbus_client
//! ```
//!
//! ## Register Map
//!
//! ### Input Registers (Read-Only)
//! - Register 0: Uptime low word (seconds)
//! - Register 1: Uptime high word (seconds)
//! - Register 2: Served requests low word
//! - Register 3: Served requests high word
//!
//! The holding registers, coils and discrete inputs start zeroed unless
//! seeded through the `device.register_values` configuration.

use tokio_modbus::client::{tcp::connect, Client, Reader, Writer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // Simulator address (should match config.yaml)
    let server_address = "127.0.0.1:5020";

    println!("🔌 Modbus Simulator Client");
    println!("=====================================");
    println!("Connecting to Modbus server at {}", server_address);

    let socket_addr: std::net::SocketAddr = server_address.parse()?;

    let mut ctx = match connect(socket_addr).await {
        Ok(ctx) => {
            println!("✅ Successfully connected to Modbus server");
            ctx
        }
        Err(e) => {
            eprintln!("❌ Failed to connect to Modbus server: {}", e);
            eprintln!("💡 Make sure the simulator is running");
            eprintln!("   Example: cargo run -- --config config.yaml");
            return Err(e.into());
        }
    };

    println!("\n📊 Reading the device status block (Input Registers):");
    println!("======================================================");

    match ctx.read_input_registers(0, 4).await {
        Ok(Ok(data)) => {
            let uptime = (data[1] as u32) << 16 | data[0] as u32;
            let served = (data[3] as u32) << 16 | data[2] as u32;
            println!("⏱  Uptime: {} seconds", uptime);
            println!("📨 Served requests: {}", served);
        }
        Ok(Err(exception)) => {
            println!("⚠️  Device answered with exception: {}", exception);
        }
        Err(e) => {
            eprintln!("❌ Failed to read input registers: {}", e);
        }
    }

    println!("\n✏️  Writing and reading back holding registers:");
    println!("===============================================");

    ctx.write_multiple_registers(0, &[11, 22, 33]).await??;
    let data = ctx.read_holding_registers(0, 3).await??;
    println!("Holding registers 0-2: {:?}", data);

    ctx.write_single_coil(0, true).await??;
    let coils = ctx.read_coils(0, 1).await??;
    println!("Coil 0: {:?}", coils[0]);

    // An out-of-range read provokes an IllegalDataAddress exception
    println!("\n🚧 Reading past the configured bank:");
    println!("====================================");
    match ctx.read_holding_registers(60000, 4).await? {
        Ok(data) => println!("Unexpected data: {:?}", data),
        Err(exception) => println!("Expected exception: {}", exception),
    }

    ctx.disconnect().await?;
    println!("\n👋 Done");
    Ok(())
}
