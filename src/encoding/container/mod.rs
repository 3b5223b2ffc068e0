// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Hierarchical container format (`.rdc`).
//!
//! A container is a self-describing tree of named groups and datasets, each
//! carrying an attribute set. One file holds any number of models as
//! top-level groups named `<Kind><index>`, counted by the root attribute
//! `number_data_models`.
//!
//! ```text
//! magic  "\x89RDC\r\n\x1a\n"
//! u16 version, u16 flags (bit0 = checksum present)
//! root node
//! [u32 crc32 of everything between magic and here]
//! ```
//!
//! Encoding is all-or-nothing: the whole document is produced in memory
//! before the caller writes it anywhere.

pub mod layout;
pub mod node;
pub mod reader;
pub mod writer;

use tracing::{debug, warn};

use crate::core::{AttrValue, CodecError, Result};
use crate::io::options::{ReaderConfig, WriterConfig};
use crate::model::sky::SkyModel;
use crate::model::{Model, ModelRegistry};

pub use node::{Dataset, Group, Node};
pub use reader::ContainerReader;
pub use writer::ContainerWriter;

/// File signature.
pub const CONTAINER_MAGIC: &[u8; 8] = b"\x89RDC\r\n\x1a\n";

/// Current format version.
pub const CONTAINER_VERSION: u16 = 1;

/// Header flag: a CRC-32 trailer follows the root node.
pub const FLAG_CHECKSUM: u16 = 0x0001;

/// Root attribute counting the top-level models.
pub const NUMBER_DATA_MODELS_ATTR: &str = "number_data_models";

fn root_for(count: usize) -> Group {
    Group::new("").with_attrs(crate::attrs! { NUMBER_DATA_MODELS_ATTR => count as i64 })
}

/// Encode models into a container document.
pub fn encode_models(models: &[Model], config: &WriterConfig) -> Result<Vec<u8>> {
    let mut root = root_for(models.len());
    for (i, model) in models.iter().enumerate() {
        root.push_group(layout::model_to_group(&format!("{}{i}", model.kind()), model));
    }
    let bytes = ContainerWriter::new(config).write_document(&root)?;
    debug!(
        models = models.len(),
        bytes = bytes.len(),
        compression = ?config.compression,
        "Encoded container"
    );
    Ok(bytes)
}

/// Encode a single model.
pub fn encode_model(model: &Model, config: &WriterConfig) -> Result<Vec<u8>> {
    encode_models(std::slice::from_ref(model), config)
}

/// Parse a document and return its top-level groups, checking the count.
fn read_model_groups(bytes: &[u8], config: &ReaderConfig) -> Result<Group> {
    let root = ContainerReader::new(bytes, config)?.read_document()?;
    let declared = root
        .attrs
        .get(NUMBER_DATA_MODELS_ATTR)
        .and_then(AttrValue::as_i64)
        .ok_or_else(|| CodecError::missing_metadata("container root", NUMBER_DATA_MODELS_ATTR))?;
    for key in root.attrs.keys().filter(|k| *k != NUMBER_DATA_MODELS_ATTR) {
        warn!(attribute = %key, "Skipping unknown root attribute");
    }
    let found = root.groups().count();
    if declared < 0 || declared as usize != found {
        return Err(CodecError::malformed(
            "container",
            format!("{NUMBER_DATA_MODELS_ATTR} is {declared} but {found} groups found"),
        ));
    }
    Ok(root)
}

/// Decode every model in a container document.
pub fn decode_models(
    bytes: &[u8],
    config: &ReaderConfig,
    registry: &ModelRegistry,
) -> Result<Vec<Model>> {
    let root = read_model_groups(bytes, config)?;
    let models = root
        .groups()
        .map(|g| layout::group_to_model(g, registry))
        .collect::<Result<Vec<_>>>()?;
    debug!(
        models = models.len(),
        bytes = bytes.len(),
        variables = models.iter().map(|m| m.variables().len()).sum::<usize>(),
        "Decoded container"
    );
    Ok(models)
}

/// Decode a document that must hold exactly one model.
pub fn decode_model(bytes: &[u8], config: &ReaderConfig, registry: &ModelRegistry) -> Result<Model> {
    let mut models = decode_models(bytes, config, registry)?;
    match models.len() {
        1 => Ok(models.remove(0)),
        n => Err(CodecError::malformed(
            "container",
            format!("expected one model, found {n}"),
        )),
    }
}

/// Encode sky models into a container document.
pub fn encode_sky_models(models: &[SkyModel], config: &WriterConfig) -> Result<Vec<u8>> {
    let mut root = root_for(models.len());
    for (i, sky) in models.iter().enumerate() {
        root.push_group(layout::sky_model_to_group(
            &format!("{}{i}", crate::model::sky::SKY_MODEL_TAG),
            sky,
        ));
    }
    let bytes = ContainerWriter::new(config).write_document(&root)?;
    debug!(models = models.len(), bytes = bytes.len(), "Encoded sky model container");
    Ok(bytes)
}

/// Decode every sky model in a container document.
pub fn decode_sky_models(
    bytes: &[u8],
    config: &ReaderConfig,
    registry: &ModelRegistry,
) -> Result<Vec<SkyModel>> {
    let root = read_model_groups(bytes, config)?;
    root.groups()
        .map(|g| layout::group_to_sky_model(g, registry))
        .collect()
}
