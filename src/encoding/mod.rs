// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Wire codecs for data models.
//!
//! - [`container`] - Hierarchical container of groups, datasets and attributes
//! - [`compact`] - Self-contained binary map for embedding and transport
//! - [`msgpack`] - The MessagePack subset underneath [`compact`]
//!
//! Both model codecs decode through a [`ModelRegistry`](crate::model::ModelRegistry),
//! so anything they return has passed the same validation as a freshly
//! constructed model.

pub mod compact;
pub mod container;
pub mod msgpack;

/// Identifies one of the two wire formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireFormat {
    /// Hierarchical container (`.rdc`)
    Container,
    /// Compact binary map (`.rdm`)
    Compact,
}

impl WireFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            WireFormat::Container => "container",
            WireFormat::Compact => "compact",
        }
    }

    /// Conventional file extension.
    pub fn extension(&self) -> &'static str {
        match self {
            WireFormat::Container => "rdc",
            WireFormat::Compact => "rdm",
        }
    }
}

impl std::str::FromStr for WireFormat {
    type Err = crate::CodecError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "container" | "rdc" => Ok(WireFormat::Container),
            "compact" | "rdm" => Ok(WireFormat::Compact),
            other => Err(crate::CodecError::malformed(
                "format",
                format!("unknown wire format '{other}', expected 'container' or 'compact'"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format_from_str() {
        assert_eq!("container".parse::<WireFormat>().unwrap(), WireFormat::Container);
        assert_eq!("RDM".parse::<WireFormat>().unwrap(), WireFormat::Compact);
        assert!("hdf5".parse::<WireFormat>().is_err());
    }
}
