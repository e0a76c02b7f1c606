//! Remote link configuration
//!
//! Transport selection and transfer tuning, loadable from TOML.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::protocol::MAX_PAYLOAD;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Configuration for talking to one remote
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Transport configuration
    #[serde(default)]
    pub transport: TransportConfig,
    /// Segmented transfer tuning
    #[serde(default)]
    pub transfer: TransferConfig,
}

impl RemoteConfig {
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
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let chunk = self.transfer.chunk_size;
        if chunk == 0 || chunk > MAX_PAYLOAD {
            return Err(ConfigError::Invalid(format!(
                "transfer.chunk_size must be 1-{}, got {}",
                MAX_PAYLOAD, chunk
            )));
        }
        if let TransportConfig::Tcp(tcp) = &self.transport {
            if tcp.host.is_empty() {
                return Err(ConfigError::Invalid("transport.host is empty".to_string()));
            }
        }
        Ok(())
    }
}

// =============================================================================
// Transport Configuration
// =============================================================================

/// Transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransportConfig {
    /// Local HID report channel (Linux hidraw)
    Hid(HidConfig),
    /// Network channel over TCP
    Tcp(TcpConfig),
    /// Mock transport for testing
    Mock(MockConfig),
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::Mock(MockConfig::default())
    }
}

/// HID report channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HidConfig {
    /// hidraw node (e.g., "/dev/hidraw3")
    pub device_path: String,
    /// Read timeout in milliseconds (0 waits forever)
    #[serde(default = "default_read_timeout")]
    pub read_timeout_ms: u64,
}

fn default_read_timeout() -> u64 {
    2000
}

/// TCP channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TcpConfig {
    /// Remote IP address or hostname
    pub host: String,
    /// Remote TCP port
    #[serde(default = "default_tcp_port")]
    pub port: u16,
    /// Connection timeout in milliseconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,
    /// Response timeout in milliseconds (0 waits forever)
    #[serde(default = "default_response_timeout")]
    pub response_timeout_ms: u64,
}

impl TcpConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            connect_timeout_ms: default_connect_timeout(),
            response_timeout_ms: default_response_timeout(),
        }
    }
}

fn default_tcp_port() -> u16 {
    5540
}

fn default_connect_timeout() -> u64 {
    5000
}

fn default_response_timeout() -> u64 {
    5000
}

/// Mock transport configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MockConfig {
    /// Simulated latency before each response, in milliseconds
    #[serde(default)]
    pub latency_ms: u64,
}

// =============================================================================
// Transfer Configuration
// =============================================================================

/// Segmented transfer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferConfig {
    /// Bytes per DATA exchange (1-60)
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

fn default_chunk_size() -> usize {
    MAX_PAYLOAD
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_tcp_config_with_defaults() {
        let config = RemoteConfig::from_toml_str(
            r#"
            [transport]
            type = "tcp"
            host = "192.168.1.40"
            "#,
        )
        .unwrap();

        match config.transport {
            TransportConfig::Tcp(tcp) => {
                assert_eq!(tcp.host, "192.168.1.40");
                assert_eq!(tcp.port, 5540);
                assert_eq!(tcp.connect_timeout_ms, 5000);
            }
            other => panic!("Expected tcp transport, got {:?}", other),
        }
        assert_eq!(config.transfer.chunk_size, 60);
    }

    #[test]
    fn test_empty_config_is_mock() {
        let config = RemoteConfig::from_toml_str("").unwrap();
        assert!(matches!(config.transport, TransportConfig::Mock(_)));
    }

    #[test]
    fn test_chunk_size_out_of_range() {
        let err = RemoteConfig::from_toml_str("[transfer]\nchunk_size = 61\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = RemoteConfig::from_toml_str("[transfer]\nchunk_size = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_unknown_transport_type() {
        let err = RemoteConfig::from_toml_str("[transport]\ntype = \"serial\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_hid_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[transport]\ntype = \"hid\"\ndevice_path = \"/dev/hidraw3\"\n\n[transfer]\nchunk_size = 32"
        )
        .unwrap();

        let config = RemoteConfig::load(file.path()).unwrap();
        match config.transport {
            TransportConfig::Hid(hid) => {
                assert_eq!(hid.device_path, "/dev/hidraw3");
                assert_eq!(hid.read_timeout_ms, 2000);
            }
            other => panic!("Expected hid transport, got {:?}", other),
        }
        assert_eq!(config.transfer.chunk_size, 32);
    }

    #[test]
    fn test_missing_file() {
        let err = RemoteConfig::load("/nonexistent/remotez.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
