// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the modbus-simulator project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! MBAP header handling and frame I/O
//!
//! Modbus TCP prefixes every PDU with a 7 byte MBAP header:
//! Transaction ID (2) + Protocol ID (2) + Length (2) + Unit ID (1).
//! The length field counts the unit id byte plus the PDU.

use tokio::io::{AsyncRead, AsyncReadExt};

use super::ProtocolError;

/// Size of the MBAP header in bytes.
pub const MBAP_HEADER_LEN: usize = 7;

/// Largest PDU a frame may carry (Modbus spec: 253 bytes).
pub const MAX_PDU_LEN: usize = 253;

/// The MBAP header of a Modbus TCP frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MbapHeader {
    /// Transaction identifier, echoed back in the response.
    pub transaction_id: u16,
    /// Protocol identifier, always 0 for Modbus.
    pub protocol_id: u16,
    /// Number of bytes following this field (unit id + PDU).
    pub length: u16,
    /// Addressed unit. 0 and 0xFF are wildcard values on TCP.
    pub unit_id: u8,
}

impl MbapHeader {
    /// Parse a header from the 7 leading bytes of a frame.
    pub fn parse(buf: &[u8; MBAP_HEADER_LEN]) -> Result<Self, ProtocolError> {
        let protocol_id = u16::from_be_bytes([buf[2], buf[3]]);
        if protocol_id != 0 {
            return Err(ProtocolError::InvalidProtocolId(protocol_id));
        }
        let length = u16::from_be_bytes([buf[4], buf[5]]);
        if length == 0 || length as usize > MAX_PDU_LEN + 1 {
            return Err(ProtocolError::InvalidLength(length));
        }
        Ok(MbapHeader {
            transaction_id: u16::from_be_bytes([buf[0], buf[1]]),
            protocol_id,
            length,
            unit_id: buf[6],
        })
    }

    /// Encode a header for a PDU of `pdu_len` bytes, keeping the
    /// transaction and unit ids of `self`.
    pub fn encode_for(&self, pdu_len: usize) -> [u8; MBAP_HEADER_LEN] {
        let mut buf = [0u8; MBAP_HEADER_LEN];
        buf[0..2].copy_from_slice(&self.transaction_id.to_be_bytes());
        // protocol id stays 0
        buf[4..6].copy_from_slice(&((pdu_len as u16 + 1).to_be_bytes()));
        buf[6] = self.unit_id;
        buf
    }
}

/// Read one Modbus TCP frame from the stream.
///
/// Returns `Ok(None)` when the peer closed the connection before sending a
/// new header. A connection closed in the middle of a frame is an error.
pub async fn read_frame<S>(stream: &mut S) -> Result<Option<(MbapHeader, Vec<u8>)>, ProtocolError>
where
    S: AsyncRead + Unpin,
{
    let mut header_buf = [0u8; MBAP_HEADER_LEN];
    match stream.read_exact(&mut header_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let header = MbapHeader::parse(&header_buf)?;
    let mut pdu = vec![0u8; header.length as usize - 1];
    stream.read_exact(&mut pdu).await?;
    Ok(Some((header, pdu)))
}

/// Assemble a complete ADU (header + PDU) ready to be written to the wire.
pub fn encode_adu(header: &MbapHeader, pdu: &[u8]) -> Vec<u8> {
    let mut adu = Vec::with_capacity(MBAP_HEADER_LEN + pdu.len());
    adu.extend_from_slice(&header.encode_for(pdu.len()));
    adu.extend_from_slice(pdu);
    adu
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rejects_nonzero_protocol_id() {
        let buf = [0x00, 0x01, 0x12, 0x34, 0x00, 0x06, 0x01];
        assert!(matches!(
            MbapHeader::parse(&buf),
            Err(ProtocolError::InvalidProtocolId(0x1234))
        ));
    }

    #[test]
    fn parse_rejects_zero_length() {
        let buf = [0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x01];
        assert!(matches!(
            MbapHeader::parse(&buf),
            Err(ProtocolError::InvalidLength(0))
        ));
    }

    #[test]
    fn adu_roundtrip() {
        let header = MbapHeader {
            transaction_id: 0x0102,
            protocol_id: 0,
            length: 6,
            unit_id: 0x11,
        };
        let pdu = [0x03, 0x00, 0x00, 0x00, 0x04];
        let adu = encode_adu(&header, &pdu);
        assert_eq!(adu.len(), MBAP_HEADER_LEN + pdu.len());
        assert_eq!(&adu[0..2], &[0x01, 0x02]);
        assert_eq!(&adu[4..6], &[0x00, 0x06]);
        assert_eq!(adu[6], 0x11);
        assert_eq!(&adu[7..], &pdu);
    }
}
