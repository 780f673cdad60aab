//! SetuIO - Link layer for the Go1 patrol robot
//!
//! Bridges a navigation controller to its external collaborators:
//!
//! - **Motion daemon** (TCP): locomotion modes, LED, timed movement commands
//! - **Sensor message bus** (UDP): ranging and person-detection frames
//! - **Firmware telemetry**: identity/thermal/gait frame decoded at handshake
//!
//! All TCP traffic and every UDP datagram use the same length-prefixed JSON
//! framing, see [`wire`].

pub mod bus;
pub mod error;
pub mod motion;
pub mod telemetry;
pub mod wire;

pub use error::{Error, Result};
pub use motion::{Mode, Motion, MotionClient};
