// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # Radiocodec
//!
//! Physically-annotated radio-interferometry data models with lossless
//! round-trip serialization.
//!
//! A model is a labeled bundle of N-dimensional arrays: named coordinate
//! axes, data variables over those axes, and a nested attribute mapping
//! (units, frames, phase centres, WCS). Two wire formats carry it:
//! - **Container** (`.rdc`) - hierarchical groups/datasets/attributes, see
//!   [`encoding::container`]
//! - **Compact** (`.rdm`) - a self-describing binary map, see
//!   [`encoding::compact`]
//!
//! ## Architecture
//!
//! - `core/` - Errors, arrays, attribute values, model kinds
//! - `frames/` - Coordinate frame registry (polarisation, receptors, axes)
//! - `model/` - Schema descriptors, validated [`Model`], typed constructors
//! - `encoding/` - Wire codecs
//! - `io/` - File entry points, reader/writer options, format detection
//!
//! ## Example: Round-tripping a visibility
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use radiocodec::frames::PolarisationFrame;
//! use radiocodec::model::constructors::{
//!     configuration, visibility, ConfigurationParams, VisibilityParams,
//! };
//!
//! let config = configuration(&ConfigurationParams::example(4))?;
//! let vis = visibility(VisibilityParams::new(
//!     config,
//!     vec![0.0, 10.0],
//!     vec![1.0e8, 1.1e8],
//!     PolarisationFrame::Linear,
//! ))?;
//!
//! radiocodec::io::export_model("vis.rdc", &vis)?;
//! assert_eq!(radiocodec::io::import_model("vis.rdc")?, vis);
//!
//! let bytes = radiocodec::encoding::compact::encode_model(&vis)?;
//! let back = radiocodec::decode_compact(&bytes)?;
//! assert_eq!(back, vis);
//! # Ok(())
//! # }
//! ```

// Core types
pub mod core;

// Re-export core types for convenience
pub use core::{
    ArrayData, AttrValue, Attributes, CodecError, Complex32, Complex64, DType, ModelKind, Result,
};

// Coordinate frames
pub mod frames;

// Data models
pub mod model;

pub use model::sky::SkyModel;
pub use model::{Coordinate, DataVariable, Model, ModelParts, ModelRegistry, Tolerance};

// Wire codecs
pub mod encoding;

pub use encoding::WireFormat;

// File I/O
pub mod io;

pub use io::options::{CodecConfig, ReaderConfig, WriterConfig};

/// Decode a compact payload with default settings and the standard registry.
pub fn decode_compact(bytes: &[u8]) -> Result<Model> {
    encoding::compact::decode_model(bytes, &ReaderConfig::default(), ModelRegistry::standard())
}

/// Decode a single-model container payload with default settings.
pub fn decode_container(bytes: &[u8]) -> Result<Model> {
    encoding::container::decode_model(bytes, &ReaderConfig::default(), ModelRegistry::standard())
}
