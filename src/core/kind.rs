// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Model kind discriminator.

use serde::{Deserialize, Serialize};

use super::error::{CodecError, Result};

/// The closed set of data model kinds.
///
/// The wire tag of each kind is its [`as_str`](ModelKind::as_str) name, written
/// as `model_kind` in container files and `kind` in compact payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModelKind {
    /// Correlator output indexed by time, baseline, frequency, polarisation
    Visibility,
    /// Sky image with a world coordinate system
    Image,
    /// Gridded visibilities on a (u, v) plane
    GridData,
    /// A single sky brightness source
    SkyComponent,
    /// Antenna layout of an array
    Configuration,
    /// Per-antenna calibration solutions
    GainTable,
    /// Per-sample flags aligned with a Visibility
    FlagTable,
}

impl ModelKind {
    /// All kinds, in registration order.
    pub const ALL: [ModelKind; 7] = [
        ModelKind::Visibility,
        ModelKind::Image,
        ModelKind::GridData,
        ModelKind::SkyComponent,
        ModelKind::Configuration,
        ModelKind::GainTable,
        ModelKind::FlagTable,
    ];

    /// Wire tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Visibility => "Visibility",
            ModelKind::Image => "Image",
            ModelKind::GridData => "GridData",
            ModelKind::SkyComponent => "SkyComponent",
            ModelKind::Configuration => "Configuration",
            ModelKind::GainTable => "GainTable",
            ModelKind::FlagTable => "FlagTable",
        }
    }

    /// Parse a wire tag, failing with `UnknownModelKind`.
    pub fn parse(tag: &str) -> Result<Self> {
        tag.parse()
    }
}

impl std::str::FromStr for ModelKind {
    type Err = CodecError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ModelKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| CodecError::unknown_model_kind(s))
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
