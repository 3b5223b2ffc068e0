// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Polarisation and receptor frames.
//!
//! A polarisation frame fixes both the set and the order of labels on a
//! `polarisation` axis; a receptor frame does the same for `receptor1` and
//! `receptor2`.

use crate::core::{CodecError, Result};

/// Every label a `polarisation` axis may carry.
pub const POLARISATION_LABELS: &[&str] = &[
    "I", "Q", "U", "V", "XX", "XY", "YX", "YY", "RR", "RL", "LR", "LL",
];

/// Every label a receptor axis may carry.
pub const RECEPTOR_LABELS: &[&str] = &["X", "Y", "R", "L", "I"];

/// Named polarisation frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolarisationFrame {
    Circular,
    CircularNp,
    Linear,
    LinearNp,
    StokesIQUV,
    StokesIV,
    StokesIQ,
    StokesI,
}

impl PolarisationFrame {
    pub const ALL: [PolarisationFrame; 8] = [
        PolarisationFrame::Circular,
        PolarisationFrame::CircularNp,
        PolarisationFrame::Linear,
        PolarisationFrame::LinearNp,
        PolarisationFrame::StokesIQUV,
        PolarisationFrame::StokesIV,
        PolarisationFrame::StokesIQ,
        PolarisationFrame::StokesI,
    ];

    /// Frame name as stored in the `_polarisation_frame` attribute.
    pub fn name(&self) -> &'static str {
        match self {
            PolarisationFrame::Circular => "circular",
            PolarisationFrame::CircularNp => "circularnp",
            PolarisationFrame::Linear => "linear",
            PolarisationFrame::LinearNp => "linearnp",
            PolarisationFrame::StokesIQUV => "stokesIQUV",
            PolarisationFrame::StokesIV => "stokesIV",
            PolarisationFrame::StokesIQ => "stokesIQ",
            PolarisationFrame::StokesI => "stokesI",
        }
    }

    /// Ordered labels of this frame.
    pub fn labels(&self) -> &'static [&'static str] {
        match self {
            PolarisationFrame::Circular => &["RR", "RL", "LR", "LL"],
            PolarisationFrame::CircularNp => &["RR", "LL"],
            PolarisationFrame::Linear => &["XX", "XY", "YX", "YY"],
            PolarisationFrame::LinearNp => &["XX", "YY"],
            PolarisationFrame::StokesIQUV => &["I", "Q", "U", "V"],
            PolarisationFrame::StokesIV => &["I", "V"],
            PolarisationFrame::StokesIQ => &["I", "Q"],
            PolarisationFrame::StokesI => &["I"],
        }
    }

    pub fn npol(&self) -> usize {
        self.labels().len()
    }

    /// Look up a frame by name, failing with `InvalidAxisValue`.
    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.name() == name)
            .ok_or_else(|| {
                CodecError::invalid_axis_value(
                    "polarisation",
                    format!("{name:?}"),
                    "unknown polarisation frame",
                )
            })
    }
}

/// Named receptor frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReceptorFrame {
    Linear,
    Circular,
    StokesI,
}

impl ReceptorFrame {
    pub const ALL: [ReceptorFrame; 3] = [
        ReceptorFrame::Linear,
        ReceptorFrame::Circular,
        ReceptorFrame::StokesI,
    ];

    /// Frame name as stored in the `receptor_frame` attribute.
    pub fn name(&self) -> &'static str {
        match self {
            ReceptorFrame::Linear => "linear",
            ReceptorFrame::Circular => "circular",
            ReceptorFrame::StokesI => "stokesI",
        }
    }

    pub fn labels(&self) -> &'static [&'static str] {
        match self {
            ReceptorFrame::Linear => &["X", "Y"],
            ReceptorFrame::Circular => &["R", "L"],
            ReceptorFrame::StokesI => &["I"],
        }
    }

    pub fn nrec(&self) -> usize {
        self.labels().len()
    }

    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.name() == name)
            .ok_or_else(|| {
                CodecError::invalid_axis_value(
                    "receptor1",
                    format!("{name:?}"),
                    "unknown receptor frame",
                )
            })
    }
}
