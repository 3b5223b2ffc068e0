// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! File-level entry points.
//!
//! Every export encodes the whole payload in memory first and only then
//! touches the filesystem, so a failed encode never leaves a partial file
//! behind. Imports read the file in one go and decode through a
//! [`ModelRegistry`].
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use radiocodec::io::{export_model, import_model};
//! use radiocodec::model::constructors::{configuration, ConfigurationParams};
//!
//! let config = configuration(&ConfigurationParams::example(4))?;
//! export_model("config.rdc", &config)?;
//! assert_eq!(import_model("config.rdc")?, config);
//! # Ok(())
//! # }
//! ```

pub mod detection;
pub mod options;

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::encoding::{compact, container};
use crate::model::sky::SkyModel;
use crate::model::{Model, ModelRegistry};
use crate::{CodecError, Result};

pub use detection::{detect_bytes, detect_format, DetectedFormat};
pub use options::{
    CodecConfig, Compression, ReaderBuilder, ReaderConfig, WriterBuilder, WriterConfig,
};

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes)?;
    info!(path = %path.display(), bytes = bytes.len(), "Wrote file");
    Ok(())
}

fn read_file(path: &Path, config: &ReaderConfig) -> Result<Vec<u8>> {
    let len = fs::metadata(path)?.len();
    config.check_size(&path.display().to_string(), len)?;
    let bytes = fs::read(path)?;
    debug!(path = %path.display(), bytes = bytes.len(), "Read file");
    Ok(bytes)
}

// ---------------------------------------------------------------------------
// Container files
// ---------------------------------------------------------------------------

/// Write models to a container file with explicit settings.
pub fn export_models_with<P: AsRef<Path>>(
    path: P,
    models: &[Model],
    config: &WriterConfig,
) -> Result<()> {
    let bytes = container::encode_models(models, config)?;
    write_file(path.as_ref(), &bytes)
}

/// Write models to a container file with default settings.
pub fn export_models<P: AsRef<Path>>(path: P, models: &[Model]) -> Result<()> {
    export_models_with(path, models, &WriterConfig::default())
}

/// Write a single model to a container file.
pub fn export_model<P: AsRef<Path>>(path: P, model: &Model) -> Result<()> {
    export_models(path, std::slice::from_ref(model))
}

/// Read every model from a container file with explicit settings.
pub fn import_models_with<P: AsRef<Path>>(
    path: P,
    config: &ReaderConfig,
    registry: &ModelRegistry,
) -> Result<Vec<Model>> {
    let bytes = read_file(path.as_ref(), config)?;
    container::decode_models(&bytes, config, registry)
}

/// Read every model from a container file.
pub fn import_models<P: AsRef<Path>>(path: P) -> Result<Vec<Model>> {
    import_models_with(path, &ReaderConfig::default(), ModelRegistry::standard())
}

/// Read a container file that holds exactly one model.
pub fn import_model<P: AsRef<Path>>(path: P) -> Result<Model> {
    let config = ReaderConfig::default();
    let bytes = read_file(path.as_ref(), &config)?;
    container::decode_model(&bytes, &config, ModelRegistry::standard())
}

/// Write sky models to a container file.
pub fn export_sky_models<P: AsRef<Path>>(
    path: P,
    models: &[SkyModel],
    config: &WriterConfig,
) -> Result<()> {
    let bytes = container::encode_sky_models(models, config)?;
    write_file(path.as_ref(), &bytes)
}

/// Read sky models from a container file.
pub fn import_sky_models<P: AsRef<Path>>(
    path: P,
    config: &ReaderConfig,
    registry: &ModelRegistry,
) -> Result<Vec<SkyModel>> {
    let bytes = read_file(path.as_ref(), config)?;
    container::decode_sky_models(&bytes, config, registry)
}

// ---------------------------------------------------------------------------
// Compact files
// ---------------------------------------------------------------------------

/// Write one model as a compact payload.
pub fn write_compact<P: AsRef<Path>>(path: P, model: &Model) -> Result<()> {
    let bytes = compact::encode_model(model)?;
    write_file(path.as_ref(), &bytes)
}

/// Read one model from a compact payload.
pub fn read_compact<P: AsRef<Path>>(path: P) -> Result<Model> {
    read_compact_with(path, &ReaderConfig::default(), ModelRegistry::standard())
}

pub fn read_compact_with<P: AsRef<Path>>(
    path: P,
    config: &ReaderConfig,
    registry: &ModelRegistry,
) -> Result<Model> {
    let bytes = read_file(path.as_ref(), config)?;
    compact::decode_model(&bytes, config, registry)
}

// ---------------------------------------------------------------------------
// Auto-detection
// ---------------------------------------------------------------------------

/// Read models from a file in either format.
///
/// The format is detected from the content, falling back to the extension.
/// A compact file yields a single model.
pub fn read_any<P: AsRef<Path>>(path: P) -> Result<Vec<Model>> {
    read_any_with(path, &ReaderConfig::default(), ModelRegistry::standard())
}

pub fn read_any_with<P: AsRef<Path>>(
    path: P,
    config: &ReaderConfig,
    registry: &ModelRegistry,
) -> Result<Vec<Model>> {
    let path = path.as_ref();
    let bytes = read_file(path, config)?;
    let detected = match detect_bytes(&bytes) {
        DetectedFormat::Unknown => detection::detect_from_extension(path),
        known => known,
    };
    debug!(path = %path.display(), format = ?detected, "Detected format");
    match detected {
        DetectedFormat::Container => container::decode_models(&bytes, config, registry),
        DetectedFormat::Compact => Ok(vec![compact::decode_model(&bytes, config, registry)?]),
        DetectedFormat::Unknown => Err(CodecError::malformed(
            path.display().to_string(),
            "unrecognised file format",
        )),
    }
}
