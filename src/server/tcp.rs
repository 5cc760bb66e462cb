// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the modbus-simulator project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Modbus TCP server loop
//!
//! Accepts client connections and serves frames against the shared simulator
//! state. Every transaction flows through three stages: execute against the
//! device store, record in the call monitor, then hand the encoded response
//! to the injector which decides what actually goes on the wire.

use std::sync::Arc;

use anyhow::Result;
use log::{debug, error, info, warn};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::time;

use crate::protocol::frame::encode_adu;
use crate::protocol::{read_frame, ExceptionCode, ProtocolError, Request, Response};
use crate::simulator::SimulatorState;

use super::service::execute;

/// The simulated Modbus TCP server device.
///
/// One instance is shared by all client connections; the Modbus
/// specification expects a single master, but nothing here prevents several
/// clients from talking to the simulator at once.
pub struct ModbusServer {
    state: Arc<SimulatorState>,
    unit_id: u8,
}

impl ModbusServer {
    pub fn new(state: Arc<SimulatorState>, unit_id: u8) -> Self {
        ModbusServer { state, unit_id }
    }

    /// Accept and serve client connections until the listener fails.
    ///
    /// Each connection runs in its own task; a connection error closes only
    /// that connection.
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        let server = Arc::new(self);
        loop {
            let (stream, peer) = listener.accept().await?;
            debug!("Modbus client connected from {}", peer);
            let server = server.clone();
            tokio::spawn(async move {
                match server.handle_connection(stream).await {
                    Ok(()) => debug!("Modbus client {} disconnected", peer),
                    Err(e) => warn!("Modbus connection {} failed: {}", peer, e),
                }
            });
        }
    }

    async fn handle_connection(&self, mut stream: TcpStream) -> Result<(), ProtocolError> {
        loop {
            let Some((header, pdu)) = read_frame(&mut stream).await? else {
                return Ok(());
            };

            // Unit id 0 and 0xFF are wildcards on Modbus TCP; anything else
            // must match the configured id. Mismatches are consumed silently.
            if self.unit_id != 0
                && header.unit_id != 0
                && header.unit_id != 0xFF
                && header.unit_id != self.unit_id
            {
                debug!(
                    "ignoring request for unit {} (serving unit {})",
                    header.unit_id, self.unit_id
                );
                continue;
            }

            let response = match Request::decode(&pdu) {
                Ok(request) => {
                    let response = {
                        let mut store = self.state.store.lock().unwrap();
                        execute(&request, &mut store)
                    };
                    self.state.count_request();
                    self.state
                        .monitor
                        .lock()
                        .unwrap()
                        .observe(&request, &pdu, &response);
                    response
                }
                Err(ProtocolError::EmptyPdu) => return Err(ProtocolError::EmptyPdu),
                Err(e) => {
                    // A malformed but attributable PDU gets an exception
                    // response instead of tearing down the connection
                    warn!("malformed request PDU: {}", e);
                    Response::Exception {
                        function: pdu[0],
                        code: ExceptionCode::IllegalDataValue,
                    }
                }
            };

            let frame = encode_adu(&header, &response.encode());
            let plan = self
                .state
                .injector
                .lock()
                .unwrap()
                .plan(&header, pdu[0], frame);

            for chunk in plan.chunks {
                if !chunk.delay.is_zero() {
                    time::sleep(chunk.delay).await;
                }
                stream.write_all(&chunk.bytes).await?;
            }
            stream.flush().await?;
        }
    }
}

/// Bind the configured address and run the server until shutdown.
///
/// This is the task body the daemon spawns; binding happens in the daemon so
/// port conflicts surface at launch time.
pub async fn serve_with_shutdown(
    server: ModbusServer,
    listener: TcpListener,
    running: Arc<std::sync::atomic::AtomicBool>,
) -> Result<()> {
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    let server_handle = tokio::spawn(async move {
        if let Err(e) = server.serve(listener).await {
            error!("Modbus server error: {}", e);
        }
    });

    // Check every second if we should continue running
    while running.load(Ordering::SeqCst) {
        time::sleep(Duration::from_secs(1)).await;
    }

    info!("Shutting down Modbus server...");
    server_handle.abort();

    match tokio::time::timeout(Duration::from_secs(5), server_handle).await {
        Ok(_) => info!("Modbus server shut down successfully"),
        Err(_) => {
            warn!("Modbus server shutdown timed out, forcing termination");
        }
    }

    Ok(())
}
