//! Motion daemon client
//!
//! Commands travel over a single TCP connection as length-prefixed JSON
//! frames. Mode and LED changes are fire-and-forget; movement commands are
//! acknowledged by the daemon once the timed step finishes, so the caller
//! knows the step completed (or why it did not) before issuing the next one.
//! Failed commands are reported, never retried here.

use crate::error::{Error, Result};
use crate::telemetry::{self, FirmwareReport};
use crate::wire;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::net::TcpStream;
use std::time::Duration;

/// Extra time allowed for a move acknowledgement past the move itself
const ACK_MARGIN: Duration = Duration::from_millis(1000);

/// Robot locomotion and gesture modes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Stand,
    Walk,
    Run,
    Climb,
    /// Raised-hand greeting gesture
    StraightHand1,
    StandDown,
}

/// Body-frame movement directions
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum MoveAction {
    Forward,
    Backward,
    Left,
    Right,
}

/// One framed request to the daemon
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
enum Request {
    SetMode { mode: Mode },
    SetLed { r: u8, g: u8, b: u8 },
    Move { action: MoveAction, speed: f32, duration_ms: u32 },
}

/// Daemon acknowledgement for a move command
#[derive(Debug, Serialize, Deserialize)]
struct MoveAck {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// The motion seam the patrol controller drives.
///
/// Speeds are m/s, durations are milliseconds. Each movement call blocks
/// until the daemon reports the timed step done.
pub trait Motion {
    fn set_mode(&mut self, mode: Mode) -> Result<()>;
    fn set_led(&mut self, r: u8, g: u8, b: u8) -> Result<()>;
    fn go_forward(&mut self, speed: f32, duration_ms: u32) -> Result<()>;
    fn go_backward(&mut self, speed: f32, duration_ms: u32) -> Result<()>;
    fn go_left(&mut self, speed: f32, duration_ms: u32) -> Result<()>;
    fn go_right(&mut self, speed: f32, duration_ms: u32) -> Result<()>;

    /// Zero-velocity step; cancels any residual motion.
    fn halt(&mut self, duration_ms: u32) -> Result<()> {
        self.go_forward(0.0, duration_ms)
    }
}

/// TCP client for the motion daemon
pub struct MotionClient {
    stream: TcpStream,
    firmware: FirmwareReport,
}

impl MotionClient {
    /// Connect with timeout, then read the firmware hello frame.
    ///
    /// The daemon sends one framed telemetry packet on accept; decoding it
    /// doubles as a protocol check before any command is issued.
    pub fn connect_timeout(addr: &str, timeout: Duration) -> Result<Self> {
        let sock_addr: std::net::SocketAddr = addr
            .parse()
            .map_err(|e| Error::Protocol(format!("invalid address {}: {}", addr, e)))?;

        let mut stream = TcpStream::connect_timeout(&sock_addr, timeout)?;
        stream.set_read_timeout(Some(timeout))?;

        let hello = wire::read_frame_bytes(&mut stream)?;
        let firmware = telemetry::decode(&hello)?;

        tracing::debug!("Motion daemon handshake complete");

        Ok(Self { stream, firmware })
    }

    /// Telemetry captured during the handshake.
    pub fn firmware(&self) -> &FirmwareReport {
        &self.firmware
    }

    fn send(&mut self, request: &Request) -> Result<()> {
        wire::write_frame(&mut self.stream, request)
    }

    fn send_move(&mut self, action: MoveAction, speed: f32, duration_ms: u32) -> Result<()> {
        self.send(&Request::Move { action, speed, duration_ms })?;

        // The ack arrives after the step completes
        let deadline = Duration::from_millis(u64::from(duration_ms)) + ACK_MARGIN;
        self.stream.set_read_timeout(Some(deadline))?;

        let ack: MoveAck = match wire::read_frame(&mut self.stream) {
            Ok(ack) => ack,
            Err(Error::Io(e)) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                return Err(Error::Timeout);
            }
            Err(e) => return Err(e),
        };

        if ack.ok {
            Ok(())
        } else {
            Err(Error::Command(
                ack.error.unwrap_or_else(|| "unspecified failure".into()),
            ))
        }
    }
}

impl Motion for MotionClient {
    fn set_mode(&mut self, mode: Mode) -> Result<()> {
        self.send(&Request::SetMode { mode })
    }

    fn set_led(&mut self, r: u8, g: u8, b: u8) -> Result<()> {
        self.send(&Request::SetLed { r, g, b })
    }

    fn go_forward(&mut self, speed: f32, duration_ms: u32) -> Result<()> {
        self.send_move(MoveAction::Forward, speed, duration_ms)
    }

    fn go_backward(&mut self, speed: f32, duration_ms: u32) -> Result<()> {
        self.send_move(MoveAction::Backward, speed, duration_ms)
    }

    fn go_left(&mut self, speed: f32, duration_ms: u32) -> Result<()> {
        self.send_move(MoveAction::Left, speed, duration_ms)
    }

    fn go_right(&mut self, speed: f32, duration_ms: u32) -> Result<()> {
        self.send_move(MoveAction::Right, speed, duration_ms)
    }
}
