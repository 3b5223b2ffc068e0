// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Reader and writer configuration.
//!
//! Both configs have builders for code and serde support for TOML files:
//!
//! ```toml
//! [writer]
//! compression = { kind = "zstd", level = 3 }
//! checksum = true
//!
//! [reader]
//! max_payload_bytes = 268435456
//! verify_checksum = true
//! ```

use serde::{Deserialize, Serialize};

use crate::{CodecError, Result};

/// Default zstd level when none is given.
pub const DEFAULT_ZSTD_LEVEL: i32 = 3;

/// Dataset compression in container files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Compression {
    #[default]
    None,
    Zstd {
        #[serde(default = "default_zstd_level")]
        level: i32,
    },
}

fn default_zstd_level() -> i32 {
    DEFAULT_ZSTD_LEVEL
}

/// Configuration for encoders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterConfig {
    /// Compression applied to container datasets
    pub compression: Compression,
    /// Append a CRC-32 of the container body
    pub checksum: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            compression: Compression::None,
            checksum: true,
        }
    }
}

/// Builder for [`WriterConfig`].
#[derive(Debug, Clone, Default)]
pub struct WriterBuilder {
    config: WriterConfig,
}

impl WriterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compress datasets with zstd at the given level (1-22).
    pub fn zstd(mut self, level: i32) -> Self {
        self.config.compression = Compression::Zstd { level };
        self
    }

    pub fn compression(mut self, compression: Compression) -> Self {
        self.config.compression = compression;
        self
    }

    pub fn checksum(mut self, enabled: bool) -> Self {
        self.config.checksum = enabled;
        self
    }

    /// Finish, rejecting out-of-range compression levels.
    pub fn build(self) -> Result<WriterConfig> {
        if let Compression::Zstd { level } = self.config.compression {
            if !(1..=22).contains(&level) {
                return Err(CodecError::malformed(
                    "config",
                    format!("zstd level {level} outside 1..=22"),
                ));
            }
        }
        Ok(self.config)
    }
}

/// Configuration for decoders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Reject inputs (and decompressed datasets) larger than this
    pub max_payload_bytes: Option<u64>,
    /// Fail on a container checksum mismatch
    pub verify_checksum: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            max_payload_bytes: None,
            verify_checksum: true,
        }
    }
}

impl ReaderConfig {
    /// Check a byte count against `max_payload_bytes`.
    pub fn check_size(&self, context: &str, len: u64) -> Result<()> {
        match self.max_payload_bytes {
            Some(max) if len > max => Err(CodecError::malformed(
                context,
                format!("{len} bytes exceeds limit of {max}"),
            )),
            _ => Ok(()),
        }
    }
}

/// Builder for [`ReaderConfig`].
#[derive(Debug, Clone, Default)]
pub struct ReaderBuilder {
    config: ReaderConfig,
}

impl ReaderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_payload_bytes(mut self, max: u64) -> Self {
        self.config.max_payload_bytes = Some(max);
        self
    }

    pub fn verify_checksum(mut self, enabled: bool) -> Self {
        self.config.verify_checksum = enabled;
        self
    }

    pub fn build(self) -> ReaderConfig {
        self.config
    }
}

/// Combined codec configuration, as loaded from a TOML file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    pub writer: WriterConfig,
    pub reader: ReaderConfig,
}

impl CodecConfig {
    /// Parse TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: CodecConfig =
            toml::from_str(text).map_err(|e| CodecError::malformed("config", e.to_string()))?;
        if let Compression::Zstd { level } = config.writer.compression {
            WriterBuilder::new().zstd(level).build()?;
        }
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn from_toml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_default() {
        let config = WriterBuilder::new().build().unwrap();
        assert_eq!(config.compression, Compression::None);
        assert!(config.checksum);
        assert!(ReaderBuilder::new().build().verify_checksum);
    }

    #[test]
    fn test_builder_fluent() {
        let writer = WriterBuilder::new().zstd(9).checksum(false).build().unwrap();
        assert_eq!(writer.compression, Compression::Zstd { level: 9 });
        assert!(!writer.checksum);

        let reader = ReaderBuilder::new().max_payload_bytes(1024).build();
        assert_eq!(reader.max_payload_bytes, Some(1024));
        assert!(reader.check_size("test", 2048).is_err());
        assert!(reader.check_size("test", 512).is_ok());
    }

    #[test]
    fn test_bad_zstd_level() {
        assert!(WriterBuilder::new().zstd(40).build().is_err());
    }

    #[test]
    fn test_from_toml() {
        let config = CodecConfig::from_toml_str(
            r#"
            [writer]
            compression = { kind = "zstd", level = 5 }
            checksum = false

            [reader]
            max_payload_bytes = 4096
            "#,
        )
        .unwrap();
        assert_eq!(config.writer.compression, Compression::Zstd { level: 5 });
        assert!(!config.writer.checksum);
        assert_eq!(config.reader.max_payload_bytes, Some(4096));
        assert!(config.reader.verify_checksum);
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(CodecConfig::from_toml_str("").unwrap(), CodecConfig::default());
    }

    #[test]
    fn test_invalid_toml() {
        let err = CodecConfig::from_toml_str("[writer\nchecksum = ").unwrap_err();
        assert!(matches!(err, CodecError::MalformedPayload { ref context, .. } if context == "config"));
    }
}
