//! Firmware telemetry decoder
//!
//! The firmware reports identity, temperatures and gait state in one packed
//! binary frame, sent once at handshake time. Navigation never depends on
//! these fields; they are decoded for logging and diagnostics.
//!
//! Frame layout (offsets in bytes):
//!
//! | Offset | Field                          | Present when          |
//! |--------|--------------------------------|-----------------------|
//! | 0      | robot name id                  | len >= 44             |
//! | 1      | robot model id                 | len >= 44             |
//! | 2..6   | serial number parts            | len >= 44, byte2 < 255|
//! | 8..28  | 20 temperature readings (°C)   | always                |
//! | 28     | locomotion mode                | len >= 30             |
//! | 29     | gait type                      | len >= 30             |
//! | 36..39 | hardware version               | len >= 44, byte36 < 255|
//! | 39..42 | software version               | len >= 44             |
//!
//! 255 is the firmware's "not populated" sentinel for the serial and
//! hardware-version fields.

use crate::error::{Error, Result};

/// Number of temperature sensors reported by the firmware
pub const TEMP_COUNT: usize = 20;

/// Shortest decodable frame (through the temperature block)
const MIN_FRAME_LEN: usize = 28;

/// Frame length carrying mode and gait
const GAIT_FRAME_LEN: usize = 30;

/// Frame length carrying identity, serial and versions
const FULL_FRAME_LEN: usize = 44;

/// Robot product line, byte 0
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RobotName {
    Laikago,
    Aliengo,
    A1,
    Go1,
    B1,
}

impl RobotName {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(RobotName::Laikago),
            2 => Some(RobotName::Aliengo),
            3 => Some(RobotName::A1),
            4 => Some(RobotName::Go1),
            5 => Some(RobotName::B1),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RobotName::Laikago => "Laikago",
            RobotName::Aliengo => "Aliengo",
            RobotName::A1 => "A1",
            RobotName::Go1 => "Go1",
            RobotName::B1 => "B1",
        }
    }
}

/// Hardware variant, byte 1
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RobotModel {
    Air,
    Pro,
    Edu,
    Pc,
    Xx,
}

impl RobotModel {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(RobotModel::Air),
            2 => Some(RobotModel::Pro),
            3 => Some(RobotModel::Edu),
            4 => Some(RobotModel::Pc),
            5 => Some(RobotModel::Xx),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RobotModel::Air => "AIR",
            RobotModel::Pro => "PRO",
            RobotModel::Edu => "EDU",
            RobotModel::Pc => "PC",
            RobotModel::Xx => "XX",
        }
    }
}

/// Gait reported while the robot is in locomotion mode (mode 2)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gait {
    Walk,
    Run,
    Climb,
}

impl Gait {
    fn from_mode(mode: u8, gait_type: u8) -> Option<Self> {
        if mode != 2 {
            return None;
        }
        match gait_type {
            1 => Some(Gait::Walk),
            2 => Some(Gait::Run),
            3 => Some(Gait::Climb),
            _ => None,
        }
    }
}

/// Decoded firmware telemetry frame
#[derive(Clone, Debug, Default)]
pub struct FirmwareReport {
    /// Motor/board temperature readings
    pub temps: [u8; TEMP_COUNT],
    /// Raw locomotion mode byte
    pub mode: Option<u8>,
    /// Gait derived from mode and gait type
    pub gait: Option<Gait>,
    /// Product string, e.g. "Go1_EDU"
    pub product: Option<String>,
    /// Serial number, e.g. "1-2-3[4]"
    pub serial: Option<String>,
    pub hardware_version: Option<String>,
    pub software_version: Option<String>,
}

/// Decode one firmware telemetry frame.
///
/// Shorter frames carry fewer fields (see the module table); anything below
/// the temperature block is rejected.
pub fn decode(buf: &[u8]) -> Result<FirmwareReport> {
    if buf.len() < MIN_FRAME_LEN {
        return Err(Error::Protocol(format!(
            "telemetry frame too short: {} bytes, need {}",
            buf.len(),
            MIN_FRAME_LEN
        )));
    }

    let mut report = FirmwareReport::default();
    report.temps.copy_from_slice(&buf[8..8 + TEMP_COUNT]);

    if buf.len() >= GAIT_FRAME_LEN {
        let mode = buf[28];
        report.mode = Some(mode);
        report.gait = Gait::from_mode(mode, buf[29]);
    }

    if buf.len() >= FULL_FRAME_LEN {
        if let Some(name) = RobotName::from_u8(buf[0]) {
            let model = RobotModel::from_u8(buf[1])
                .map(RobotModel::as_str)
                .unwrap_or("unknown");
            report.product = Some(format!("{}_{}", name.as_str(), model));
        }

        if buf[2] < 255 {
            report.serial = Some(format!("{}-{}-{}[{}]", buf[2], buf[3], buf[4], buf[5]));
        }

        if buf[36] < 255 {
            report.hardware_version = Some(format!("{}.{}.{}", buf[36], buf[37], buf[38]));
        }

        report.software_version = Some(format!("{}.{}.{}", buf[39], buf[40], buf[41]));
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_frame() -> Vec<u8> {
        let mut buf = vec![0u8; FULL_FRAME_LEN];
        buf[0] = 4; // Go1
        buf[1] = 3; // EDU
        buf[2] = 1;
        buf[3] = 2;
        buf[4] = 3;
        buf[5] = 4;
        for (i, b) in buf[8..28].iter_mut().enumerate() {
            *b = 20 + i as u8;
        }
        buf[28] = 2; // locomotion
        buf[29] = 1; // walk
        buf[36] = 1;
        buf[37] = 2;
        buf[38] = 3;
        buf[39] = 4;
        buf[40] = 5;
        buf[41] = 6;
        buf
    }

    #[test]
    fn test_decode_full_frame() {
        let report = decode(&full_frame()).unwrap();

        assert_eq!(report.product.as_deref(), Some("Go1_EDU"));
        assert_eq!(report.serial.as_deref(), Some("1-2-3[4]"));
        assert_eq!(report.hardware_version.as_deref(), Some("1.2.3"));
        assert_eq!(report.software_version.as_deref(), Some("4.5.6"));
        assert_eq!(report.mode, Some(2));
        assert_eq!(report.gait, Some(Gait::Walk));
        assert_eq!(report.temps[0], 20);
        assert_eq!(report.temps[19], 39);
    }

    #[test]
    fn test_decode_temps_only_frame() {
        let mut buf = vec![0u8; MIN_FRAME_LEN];
        buf[8] = 33;

        let report = decode(&buf).unwrap();
        assert_eq!(report.temps[0], 33);
        assert_eq!(report.mode, None);
        assert_eq!(report.gait, None);
        assert_eq!(report.product, None);
    }

    #[test]
    fn test_short_frame_rejected() {
        let err = decode(&[0u8; 10]).unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }

    #[test]
    fn test_gait_mapping() {
        let mut buf = full_frame();

        buf[29] = 2;
        assert_eq!(decode(&buf).unwrap().gait, Some(Gait::Run));

        buf[29] = 3;
        assert_eq!(decode(&buf).unwrap().gait, Some(Gait::Climb));

        // Gait only means something in locomotion mode
        buf[28] = 1;
        assert_eq!(decode(&buf).unwrap().gait, None);
    }

    #[test]
    fn test_sentinel_fields_masked() {
        let mut buf = full_frame();
        buf[2] = 255;
        buf[36] = 255;

        let report = decode(&buf).unwrap();
        assert_eq!(report.serial, None);
        assert_eq!(report.hardware_version, None);
        assert!(report.software_version.is_some());
    }

    #[test]
    fn test_unknown_name_leaves_product_unset() {
        let mut buf = full_frame();
        buf[0] = 99;

        let report = decode(&buf).unwrap();
        assert_eq!(report.product, None);
    }
}
