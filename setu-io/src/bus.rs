//! Sensor message-bus receiver
//!
//! The bridge on the robot relays firmware ranging data and vision detection
//! results as UDP datagrams, each one a length-prefixed JSON [`BusMessage`].
//! Topics form a closed set; a datagram with an unknown topic or a broken
//! payload surfaces as an error for the caller to log and drop. It never
//! takes the receiver down.

use crate::error::{Error, Result};
use crate::wire;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::net::UdpSocket;

/// Upper sensing limit of the ranging sensors (meters)
pub const SENSING_CEILING: f32 = 2.0;

/// Datagram receive buffer size
const RECV_BUFFER_SIZE: usize = 4096;

/// One set of ranging readings, meters per body-frame direction.
///
/// An absent key means "nothing within range" and defaults to the ceiling.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct RangingFrame {
    #[serde(default = "ceiling")]
    pub front: f32,
    #[serde(default = "ceiling")]
    pub right: f32,
    #[serde(default = "ceiling")]
    pub left: f32,
    #[serde(default = "ceiling")]
    pub back: f32,
    /// Sender timestamp, milliseconds; carried through for diagnostics only
    #[serde(default)]
    pub timestamp: Option<u64>,
}

fn ceiling() -> f32 {
    SENSING_CEILING
}

/// Person/waving booleans from the vision subsystem.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct DetectionFrame {
    #[serde(default)]
    pub person_detected: bool,
    #[serde(default)]
    pub waving_detected: bool,
}

/// Closed set of bus topics.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(tag = "topic", content = "data", rename_all = "snake_case")]
pub enum BusMessage {
    Ultrasonic(RangingFrame),
    Detection(DetectionFrame),
}

/// Non-blocking UDP receiver for bus datagrams.
pub struct BusReceiver {
    socket: UdpSocket,
    buffer: Vec<u8>,
}

impl BusReceiver {
    /// Bind to the given local port.
    pub fn bind(port: u16) -> Result<Self> {
        let socket = UdpSocket::bind(("0.0.0.0", port))?;
        socket.set_nonblocking(true)?;

        Ok(Self {
            socket,
            buffer: vec![0u8; RECV_BUFFER_SIZE],
        })
    }

    /// Receive the next message, if one is queued.
    ///
    /// `Ok(None)` means the socket has nothing to deliver right now.
    pub fn recv(&mut self) -> Result<Option<BusMessage>> {
        match self.socket.recv(&mut self.buffer) {
            Ok(len) => {
                let payload = wire::frame_from_datagram(&self.buffer[..len])?;
                let msg = serde_json::from_slice(payload)
                    .map_err(|e| Error::Serialization(e.to_string()))?;
                Ok(Some(msg))
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(Error::Io(e)),
        }
    }
}
