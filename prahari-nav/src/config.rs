//! Configuration loading for PrahariNav

use crate::error::Result;
use crate::filter::DEFAULT_NEAR_THRESHOLD;
use crate::grid::DEFAULT_GRID_SIZE;
use serde::Deserialize;
use std::path::Path;

/// Main configuration structure
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PrahariConfig {
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub motion: MotionConfig,
    #[serde(default)]
    pub sensing: SensingConfig,
    #[serde(default)]
    pub grid: GridConfig,
}

/// Network connection settings
#[derive(Clone, Debug, Deserialize)]
pub struct ConnectionConfig {
    /// Robot IP address (default: the Go1 onboard Pi)
    #[serde(default = "default_robot_ip")]
    pub robot_ip: String,

    /// TCP port of the motion daemon (default: 5801)
    #[serde(default = "default_motion_port")]
    pub motion_port: u16,

    /// Local UDP port for sensor-bus datagrams (default: 5802)
    #[serde(default = "default_bus_port")]
    pub bus_port: u16,

    /// Connect/handshake timeout in milliseconds (default: 5000)
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
}

/// Patrol movement parameters
#[derive(Clone, Debug, Deserialize)]
pub struct MotionConfig {
    /// Step speed in m/s (default: 0.1)
    #[serde(default = "default_move_speed")]
    pub move_speed: f32,

    /// Duration of one timed step in milliseconds (default: 200)
    #[serde(default = "default_move_duration")]
    pub move_duration_ms: u32,

    /// Pause between steps in milliseconds (default: 500)
    #[serde(default = "default_pause")]
    pub pause_ms: u64,

    /// Hold time of the greeting gesture in seconds (default: 5)
    #[serde(default = "default_dwell")]
    pub dwell_secs: u64,
}

/// Ranging classification parameters
#[derive(Clone, Debug, Deserialize)]
pub struct SensingConfig {
    /// Distance below which a direction counts as blocked (default: 0.6)
    #[serde(default = "default_near_threshold")]
    pub near_threshold: f32,
}

/// Occupancy grid parameters
#[derive(Clone, Debug, Deserialize)]
pub struct GridConfig {
    /// Side length in cells (default: 10)
    #[serde(default = "default_grid_size")]
    pub size: usize,
}

// Default value functions
fn default_robot_ip() -> String {
    "192.168.123.161".to_string()
}
fn default_motion_port() -> u16 {
    5801
}
fn default_bus_port() -> u16 {
    5802
}
fn default_timeout() -> u64 {
    5000
}
fn default_move_speed() -> f32 {
    0.1
}
fn default_move_duration() -> u32 {
    200
}
fn default_pause() -> u64 {
    500
}
fn default_dwell() -> u64 {
    5
}
fn default_near_threshold() -> f32 {
    DEFAULT_NEAR_THRESHOLD
}
fn default_grid_size() -> usize {
    DEFAULT_GRID_SIZE
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            robot_ip: default_robot_ip(),
            motion_port: default_motion_port(),
            bus_port: default_bus_port(),
            timeout_ms: default_timeout(),
        }
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            move_speed: default_move_speed(),
            move_duration_ms: default_move_duration(),
            pause_ms: default_pause(),
            dwell_secs: default_dwell(),
        }
    }
}

impl Default for SensingConfig {
    fn default() -> Self {
        Self {
            near_threshold: default_near_threshold(),
        }
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            size: default_grid_size(),
        }
    }
}

impl PrahariConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::error::PrahariError::Config(format!("Failed to read config file: {}", e))
        })?;
        let config: PrahariConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Address of the motion daemon
    pub fn motion_address(&self) -> String {
        format!("{}:{}", self.connection.robot_ip, self.connection.motion_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PrahariConfig::default();

        assert_eq!(config.connection.motion_port, 5801);
        assert_eq!(config.motion.move_speed, 0.1);
        assert_eq!(config.motion.move_duration_ms, 200);
        assert_eq!(config.motion.dwell_secs, 5);
        assert_eq!(config.sensing.near_threshold, 0.6);
        assert_eq!(config.grid.size, 10);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: PrahariConfig = toml::from_str(
            r#"
            [connection]
            robot_ip = "10.0.0.7"

            [motion]
            move_speed = 0.15
            "#,
        )
        .unwrap();

        assert_eq!(config.connection.robot_ip, "10.0.0.7");
        assert_eq!(config.connection.motion_port, 5801);
        assert_eq!(config.motion.move_speed, 0.15);
        assert_eq!(config.motion.pause_ms, 500);
        assert_eq!(config.motion_address(), "10.0.0.7:5801");
    }
}
