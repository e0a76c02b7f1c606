//! Simulator configuration
//!
//! Everything the simulated remote reports about itself, loadable from TOML.

use std::path::Path;

use remotez::ConfigError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Complete simulator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Listen address for the network channel
    #[serde(default = "default_bind")]
    pub bind: String,

    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default)]
    pub location: String,

    #[serde(default)]
    pub identity: IdentityConfig,

    #[serde(default)]
    pub clock: ClockConfig,

    /// Size of the simulated flash in bytes
    #[serde(default = "default_flash_size")]
    pub flash_size: usize,

    /// Bytes returned by an IR capture
    #[serde(default = "default_ir_capture")]
    pub ir_capture: Vec<u8>,
}

fn default_bind() -> String {
    "127.0.0.1:5540".to_string()
}

fn default_name() -> String {
    "RemoteZ Simulator".to_string()
}

fn default_flash_size() -> usize {
    256 * 1024
}

fn default_ir_capture() -> Vec<u8> {
    // Mark/space pairs in 16-bit LE microseconds: a short NEC-style burst
    [9000u16, 4500, 560, 560, 560, 1690, 560, 560, 560, 1690, 560, 40000]
        .iter()
        .flat_map(|v| v.to_le_bytes())
        .collect()
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            name: default_name(),
            location: String::new(),
            identity: IdentityConfig::default(),
            clock: ClockConfig::default(),
            flash_size: default_flash_size(),
            ir_capture: default_ir_capture(),
        }
    }
}

impl SimConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        if config.flash_size == 0 {
            return Err(ConfigError::Invalid("flash_size must be non-zero".to_string()));
        }
        if config.identity.hw_major > 0x0FFF || config.identity.hw_minor > 0x0F {
            return Err(ConfigError::Invalid(
                "hardware version does not fit the packed field".to_string(),
            ));
        }
        Ok(config)
    }
}

/// Identity fields reported by GET_SYSTEM_INFO and GET_GUID
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    #[serde(default = "default_vid")]
    pub usb_vid: u16,
    #[serde(default = "default_pid")]
    pub usb_pid: u16,
    #[serde(default = "default_architecture")]
    pub architecture: u16,
    #[serde(default = "default_fw_major")]
    pub fw_major: u16,
    #[serde(default)]
    pub fw_minor: u16,
    #[serde(default)]
    pub fw_type: u8,
    #[serde(default)]
    pub skin: u16,
    #[serde(default = "default_hw_major")]
    pub hw_major: u16,
    #[serde(default)]
    pub hw_minor: u8,
    #[serde(default = "default_serial")]
    pub serial: Uuid,
}

fn default_vid() -> u16 {
    0x046D
}

fn default_pid() -> u16 {
    0xC11F
}

fn default_architecture() -> u16 {
    14
}

fn default_fw_major() -> u16 {
    4
}

fn default_hw_major() -> u16 {
    2
}

fn default_serial() -> Uuid {
    Uuid::from_u128(0x5A1D_0000_0000_4000_8000_0000_0000_0001)
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            usb_vid: default_vid(),
            usb_pid: default_pid(),
            architecture: default_architecture(),
            fw_major: default_fw_major(),
            fw_minor: 0,
            fw_type: 0,
            skin: 0,
            hw_major: default_hw_major(),
            hw_minor: 0,
            serial: default_serial(),
        }
    }
}

/// Initial clock state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClockConfig {
    /// Minutes east of UTC
    #[serde(default)]
    pub utc_offset: i16,
    #[serde(default)]
    pub timezone: String,
}
