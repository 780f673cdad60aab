//! Length-prefixed JSON framing
//!
//! Every message on the robot link, TCP or UDP, is framed the same way:
//!
//! ```text
//! ┌──────────────────┬──────────────────────────┐
//! │ Length (4 bytes) │ Payload (JSON)           │
//! │ Big-endian u32   │                          │
//! └──────────────────┴──────────────────────────┘
//! ```
//!
//! - **Length field**: 4-byte big-endian unsigned integer
//! - **Maximum payload size**: 1MB (1,048,576 bytes)
//! - **Byte order**: network byte order (big-endian) for the length prefix
//!
//! Oversized frames are rejected before the body is read. A UDP datagram
//! carries exactly one frame; trailing bytes past the declared length are
//! ignored so senders may pad.

use crate::error::{Error, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::{Read, Write};

/// Maximum accepted payload size (1MB)
pub const MAX_FRAME_SIZE: usize = 1_048_576;

/// Serialize a value and write it as one frame.
pub fn write_frame<W: Write, T: Serialize>(writer: &mut W, value: &T) -> Result<()> {
    let payload = serde_json::to_vec(value).map_err(|e| Error::Serialization(e.to_string()))?;
    let len = payload.len() as u32;

    writer.write_all(&len.to_be_bytes())?;
    writer.write_all(&payload)?;
    writer.flush()?;

    Ok(())
}

/// Read one frame and deserialize its payload.
pub fn read_frame<R: Read, T: DeserializeOwned>(reader: &mut R) -> Result<T> {
    let payload = read_frame_bytes(reader)?;
    serde_json::from_slice(&payload).map_err(|e| Error::Serialization(e.to_string()))
}

/// Read one length-prefixed payload without interpreting it.
pub fn read_frame_bytes<R: Read>(reader: &mut R) -> Result<Vec<u8>> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf)?;

    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_FRAME_SIZE {
        return Err(Error::Protocol(format!(
            "frame of {} bytes exceeds {} byte limit",
            len, MAX_FRAME_SIZE
        )));
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload)?;
    Ok(payload)
}

/// Extract the framed payload from a single datagram.
pub fn frame_from_datagram(buf: &[u8]) -> Result<&[u8]> {
    if buf.len() < 4 {
        return Err(Error::Protocol(
            "datagram shorter than length prefix".into(),
        ));
    }

    let len = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
    if len > MAX_FRAME_SIZE {
        return Err(Error::Protocol(format!(
            "frame of {} bytes exceeds {} byte limit",
            len, MAX_FRAME_SIZE
        )));
    }
    if buf.len() < 4 + len {
        return Err(Error::Protocol(format!(
            "incomplete datagram: {} bytes declared, {} available",
            len,
            buf.len() - 4
        )));
    }

    Ok(&buf[4..4 + len])
}
