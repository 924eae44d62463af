//! Protocol codec
//!
//! JSON encoding of request and response envelopes, plus the frame format
//! used by stream transports that must preserve message boundaries.
//!
//! ## Frame Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │Opcode(1) │ Len (4)  │      Payload (JSON)         │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Opcodes
//! - 0x01: TEXT  - Payload: one JSON envelope
//! - 0x08: CLOSE - Payload: empty

use std::io::{Read, Write};

use bytes::Bytes;
use serde_json::{Map, Value};

use crate::error::{DriverError, Result};
use super::{CallId, Payload, RemoteError, Request, ResponseEnvelope};

/// Header size: 1 byte opcode + 4 bytes length
pub const HEADER_SIZE: usize = 5;

/// Default maximum payload size (16 MB)
pub const MAX_PAYLOAD_SIZE: usize = 16 * 1024 * 1024;

// =============================================================================
// Envelope Encoding/Decoding
// =============================================================================

/// Encode a request as one JSON message
///
/// serde_json never HTML-escapes, so `<`, `>` and `&` in query text are
/// sent verbatim.
pub fn encode_request(request: &Request) -> Result<Bytes> {
    Ok(Bytes::from(serde_json::to_vec(request)?))
}

/// Decode a request (used by servers and test peers)
pub fn decode_request(bytes: &[u8]) -> Result<Request> {
    serde_json::from_slice(bytes)
        .map_err(|e| DriverError::Protocol(format!("Invalid request: {}", e)))
}

/// Encode a response envelope
///
/// A `Malformed` payload has no wire form and is rejected.
pub fn encode_response(response: &ResponseEnvelope) -> Result<Bytes> {
    let mut object = Map::new();
    object.insert("id".to_string(), Value::String(response.id.to_string()));

    match &response.payload {
        Payload::Result(value) => {
            object.insert("result".to_string(), value.clone());
        }
        Payload::Error(err) => {
            object.insert("error".to_string(), serde_json::to_value(err)?);
        }
        Payload::Malformed(reason) => {
            return Err(DriverError::Protocol(format!(
                "Cannot encode malformed response: {}",
                reason
            )))
        }
    }

    Ok(Bytes::from(serde_json::to_vec(&Value::Object(object))?))
}

/// Decode one inbound message into a response envelope
///
/// Returns `Err` only when the message cannot be attributed to a call
/// (not JSON, not an object, missing or non-string `id`). A reply with an
/// `id` but an invalid body decodes to [`Payload::Malformed`].
pub fn decode_response(bytes: &[u8]) -> Result<ResponseEnvelope> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| DriverError::Protocol(format!("Response is not valid JSON: {}", e)))?;

    let Value::Object(mut object) = value else {
        return Err(DriverError::Protocol(
            "Response is not a JSON object".to_string(),
        ));
    };

    let id = match object.remove("id") {
        Some(Value::String(id)) => CallId::from(id),
        Some(other) => {
            return Err(DriverError::Protocol(format!(
                "Response id is not a string: {}",
                other
            )))
        }
        None => {
            return Err(DriverError::Protocol(
                "Response is missing an id".to_string(),
            ))
        }
    };

    let payload = match (object.remove("result"), object.remove("error")) {
        (Some(result), None) => Payload::Result(result),
        (None, Some(error)) => match serde_json::from_value::<RemoteError>(error) {
            Ok(err) => Payload::Error(err),
            Err(e) => Payload::Malformed(format!("Unparsable error descriptor: {}", e)),
        },
        (Some(_), Some(_)) => {
            Payload::Malformed("Response carries both result and error".to_string())
        }
        (None, None) => {
            Payload::Malformed("Response carries neither result nor error".to_string())
        }
    };

    Ok(ResponseEnvelope { id, payload })
}

// =============================================================================
// Frame Encoding/Decoding
// =============================================================================

/// Frame opcodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameKind {
    Text = 0x01,
    Close = 0x08,
}

/// Encode a frame to bytes
///
/// Format: opcode (1) + payload_len (4) + payload
pub fn encode_frame(kind: FrameKind, payload: &[u8]) -> Vec<u8> {
    let mut message = Vec::with_capacity(HEADER_SIZE + payload.len());
    message.push(kind as u8);
    message.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    message.extend_from_slice(payload);
    message
}

/// Decode a frame from bytes
pub fn decode_frame(bytes: &[u8], max_payload: usize) -> Result<(FrameKind, Bytes)> {
    if bytes.len() < HEADER_SIZE {
        return Err(DriverError::Protocol(format!(
            "Incomplete header: expected {} bytes, got {}",
            HEADER_SIZE,
            bytes.len()
        )));
    }

    let kind = parse_opcode(bytes[0])?;
    let payload_len = u32::from_be_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]) as usize;

    if payload_len > max_payload {
        return Err(DriverError::FrameTooLarge {
            size: payload_len,
            max: max_payload,
        });
    }

    let total_len = HEADER_SIZE + payload_len;
    if bytes.len() < total_len {
        return Err(DriverError::Protocol(format!(
            "Incomplete payload: expected {} bytes, got {}",
            total_len,
            bytes.len()
        )));
    }

    Ok((kind, Bytes::copy_from_slice(&bytes[HEADER_SIZE..total_len])))
}

fn parse_opcode(byte: u8) -> Result<FrameKind> {
    match byte {
        0x01 => Ok(FrameKind::Text),
        0x08 => Ok(FrameKind::Close),
        _ => Err(DriverError::Protocol(format!(
            "Unknown frame opcode: 0x{:02x}",
            byte
        ))),
    }
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read a complete frame from a stream
///
/// Blocks until a complete frame is received or an error occurs
pub fn read_frame<R: Read>(reader: &mut R, max_payload: usize) -> Result<(FrameKind, Bytes)> {
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;

    let kind = parse_opcode(header[0])?;
    let payload_len = u32::from_be_bytes([header[1], header[2], header[3], header[4]]) as usize;

    if payload_len > max_payload {
        return Err(DriverError::FrameTooLarge {
            size: payload_len,
            max: max_payload,
        });
    }

    let mut payload = vec![0u8; payload_len];
    if payload_len > 0 {
        reader.read_exact(&mut payload)?;
    }

    Ok((kind, Bytes::from(payload)))
}

/// Write a frame to a stream
pub fn write_frame<W: Write>(writer: &mut W, kind: FrameKind, payload: &[u8]) -> Result<()> {
    let bytes = encode_frame(kind, payload);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}
