// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Compact binary map format.
//!
//! A model is one MessagePack map:
//!
//! ```text
//! {
//!   kind: str,
//!   dims_order: [str],
//!   coordinates:    { <axis>: {dtype, shape, data: bin, attrs: {..}} },
//!   data_variables: { <var>:  {dtype, shape, data: bin, dims: [str], attrs: {..}} },
//!   attributes: {..},
//!   related: { <name>: <model map> }          (optional)
//! }
//! ```
//!
//! Array payloads use the same little-endian packing as container datasets.
//! Inside attribute trees, a map whose `data` entry is `bin` is an array
//! leaf; no other attribute value ever encodes as `bin`.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use super::msgpack::{MsgPackDecoder, MsgPackEncoder, PackValue};
use crate::core::{ArrayData, AttrValue, Attributes, CodecError, DType, ModelKind, Result};
use crate::io::options::ReaderConfig;
use crate::model::sky::{SkyModel, SKY_MODEL_TAG};
use crate::model::{Coordinate, DataVariable, Model, ModelParts, ModelRegistry};

const KIND: &str = "kind";
const DIMS_ORDER: &str = "dims_order";
const COORDINATES: &str = "coordinates";
const DATA_VARIABLES: &str = "data_variables";
const ATTRIBUTES: &str = "attributes";
const RELATED: &str = "related";
const DTYPE: &str = "dtype";
const SHAPE: &str = "shape";
const DATA: &str = "data";
const DIMS: &str = "dims";
const ATTRS: &str = "attrs";
const FIXED: &str = "fixed";
const COMPONENTS: &str = "components";
const SKY_SLOTS: [&str; 3] = ["image", "gaintable", "mask"];

const MODEL_KEYS: [&str; 6] = [KIND, DIMS_ORDER, COORDINATES, DATA_VARIABLES, ATTRIBUTES, RELATED];

fn malformed(message: impl Into<String>) -> CodecError {
    CodecError::malformed("compact", message)
}

fn array_entries(array: &ArrayData) -> Result<Vec<(String, PackValue)>> {
    Ok(vec![
        (DTYPE.to_string(), PackValue::str(array.dtype().as_str())),
        (
            SHAPE.to_string(),
            PackValue::Array(array.shape().iter().map(|&n| PackValue::UInt(n as u64)).collect()),
        ),
        (DATA.to_string(), PackValue::Bin(array.to_le_bytes()?)),
    ])
}

fn str_array(items: impl IntoIterator<Item = impl Into<String>>) -> PackValue {
    PackValue::Array(items.into_iter().map(PackValue::str).collect())
}

pub fn attr_to_pack(value: &AttrValue) -> Result<PackValue> {
    Ok(match value {
        AttrValue::Bool(b) => PackValue::Bool(*b),
        AttrValue::Int(i) => PackValue::Int(*i),
        AttrValue::Float(f) => PackValue::Float(*f),
        AttrValue::String(s) => PackValue::str(s.as_str()),
        AttrValue::Array(a) => PackValue::Map(array_entries(a)?),
        AttrValue::List(items) => PackValue::Array(
            items
                .iter()
                .map(attr_to_pack)
                .collect::<Result<Vec<_>>>()?,
        ),
        AttrValue::Map(map) => attrs_to_pack(map)?,
    })
}

pub fn attrs_to_pack(attrs: &Attributes) -> Result<PackValue> {
    Ok(PackValue::Map(
        attrs
            .iter()
            .map(|(k, v)| Ok::<_, CodecError>((k.clone(), attr_to_pack(v)?)))
            .collect::<Result<Vec<_>>>()?,
    ))
}

fn is_array_leaf(value: &PackValue) -> bool {
    matches!(value.get(DATA), Some(PackValue::Bin(_)))
}

fn pack_to_array(value: &PackValue, owner: &str) -> Result<ArrayData> {
    let dtype = value
        .get(DTYPE)
        .and_then(PackValue::as_str)
        .ok_or_else(|| malformed(format!("{owner}: array leaf has no dtype")))
        .and_then(DType::parse)?;
    let shape = value
        .get(SHAPE)
        .and_then(PackValue::as_array)
        .ok_or_else(|| malformed(format!("{owner}: array leaf has no shape")))?
        .iter()
        .map(|n| {
            n.as_u64()
                .and_then(|n| usize::try_from(n).ok())
                .ok_or_else(|| malformed(format!("{owner}: bad shape entry {n:?}")))
        })
        .collect::<Result<Vec<_>>>()?;
    let data = match value.get(DATA) {
        Some(PackValue::Bin(bytes)) => bytes,
        _ => return Err(malformed(format!("{owner}: array leaf has no bin data"))),
    };
    ArrayData::from_le_bytes(dtype, &shape, data)
}

pub fn pack_to_attr(value: &PackValue) -> Result<AttrValue> {
    Ok(match value {
        PackValue::Bool(b) => AttrValue::Bool(*b),
        PackValue::Int(i) => AttrValue::Int(*i),
        PackValue::UInt(u) => {
            return Err(malformed(format!("integer attribute {u} exceeds i64")));
        }
        PackValue::Float(f) => AttrValue::Float(*f),
        PackValue::Str(s) => AttrValue::String(s.clone()),
        PackValue::Array(items) => AttrValue::List(
            items
                .iter()
                .map(pack_to_attr)
                .collect::<Result<Vec<_>>>()?,
        ),
        PackValue::Map(_) if is_array_leaf(value) => AttrValue::Array(pack_to_array(value, "attribute")?),
        PackValue::Map(_) => AttrValue::Map(pack_to_attrs(value, "attribute")?),
        PackValue::Nil | PackValue::Bin(_) => {
            return Err(malformed(format!(
                "{} has no attribute representation",
                value.type_name()
            )))
        }
    })
}

fn pack_to_attrs(value: &PackValue, owner: &str) -> Result<Attributes> {
    let entries = value
        .as_map()
        .ok_or_else(|| malformed(format!("{owner}: expected map, got {}", value.type_name())))?;
    entries
        .iter()
        .map(|(k, v)| Ok::<_, CodecError>((k.clone(), pack_to_attr(v)?)))
        .collect()
}

/// Convert a model to its map form.
pub fn model_to_pack(model: &Model) -> Result<PackValue> {
    let coordinates = model
        .coordinates()
        .iter()
        .map(|c| {
            let mut entries = array_entries(c.values())?;
            entries.push((ATTRS.to_string(), attrs_to_pack(c.attrs())?));
            Ok::<_, CodecError>((c.name().to_string(), PackValue::Map(entries)))
        })
        .collect::<Result<Vec<_>>>()?;
    let variables = model
        .variables()
        .iter()
        .map(|v| {
            let mut entries = array_entries(v.data())?;
            entries.push((DIMS.to_string(), str_array(v.dims().iter().map(String::as_str))));
            entries.push((ATTRS.to_string(), attrs_to_pack(v.attrs())?));
            Ok::<_, CodecError>((v.name().to_string(), PackValue::Map(entries)))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut entries = vec![
        (KIND.to_string(), PackValue::str(model.kind().as_str())),
        (DIMS_ORDER.to_string(), str_array(model.dims_order())),
        (COORDINATES.to_string(), PackValue::Map(coordinates)),
        (DATA_VARIABLES.to_string(), PackValue::Map(variables)),
        (ATTRIBUTES.to_string(), attrs_to_pack(model.attributes())?),
    ];
    if !model.related_models().is_empty() {
        let related = model
            .related_models()
            .iter()
            .map(|(name, m)| Ok::<_, CodecError>((name.clone(), model_to_pack(m)?)))
            .collect::<Result<Vec<_>>>()?;
        entries.push((RELATED.to_string(), PackValue::Map(related)));
    }
    Ok(PackValue::Map(entries))
}

/// A structural key of the wire layout; its absence is a malformed payload.
fn required<'v>(value: &'v PackValue, key: &str, owner: &str) -> Result<&'v PackValue> {
    value
        .get(key)
        .ok_or_else(|| malformed(format!("{owner}: payload has no '{key}' entry")))
}

fn string_items(value: &PackValue, owner: &str, key: &str) -> Result<Vec<String>> {
    value
        .as_array()
        .ok_or_else(|| malformed(format!("{owner}: '{key}' is not an array")))?
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| malformed(format!("{owner}: '{key}' holds a non-string")))
        })
        .collect()
}

fn optional_attrs(value: &PackValue, owner: &str) -> Result<Attributes> {
    match value.get(ATTRS) {
        Some(attrs) => pack_to_attrs(attrs, owner),
        None => Ok(Attributes::new()),
    }
}

/// Rebuild and validate a model from its map form.
pub fn pack_to_model(value: &PackValue, registry: &ModelRegistry) -> Result<Model> {
    let entries = value
        .as_map()
        .ok_or_else(|| malformed(format!("model must be a map, got {}", value.type_name())))?;
    let tag = value
        .get(KIND)
        .ok_or_else(|| malformed("payload has no 'kind' discriminator"))?
        .as_str()
        .ok_or_else(|| malformed("'kind' is not a string"))?;
    let kind = ModelKind::parse(tag)?;
    registry.resolve(kind)?;
    let owner = kind.as_str();
    for (key, _) in entries.iter().filter(|(k, _)| !MODEL_KEYS.contains(&k.as_str())) {
        warn!(kind = owner, key = %key, "Skipping unknown compact model key");
    }

    let dims_order = value
        .get(DIMS_ORDER)
        .ok_or_else(|| malformed(format!("{owner}: payload has no '{DIMS_ORDER}' list")))?;
    let dims_order = string_items(dims_order, owner, DIMS_ORDER)?;
    let coord_map = required(value, COORDINATES, owner)?;
    let coord_entries = coord_map
        .as_map()
        .ok_or_else(|| malformed("coordinates must be a map"))?;
    if let Some((extra, _)) = coord_entries.iter().find(|(k, _)| !dims_order.contains(k)) {
        return Err(malformed(format!(
            "coordinate '{extra}' is not listed in dims_order"
        )));
    }
    let coordinates = dims_order
        .iter()
        .map(|axis| {
            let entry = coord_map
                .get(axis)
                .ok_or_else(|| malformed(format!("{owner}: dims_order axis '{axis}' has no coordinate")))?;
            let coord_owner = format!("coordinate '{axis}'");
            Ok::<_, CodecError>(
                Coordinate::new(axis.clone(), pack_to_array(entry, &coord_owner)?)
                    .with_attrs(optional_attrs(entry, &coord_owner)?),
            )
        })
        .collect::<Result<Vec<_>>>()?;

    let variables = required(value, DATA_VARIABLES, owner)?
        .as_map()
        .ok_or_else(|| malformed("data_variables must be a map"))?
        .iter()
        .map(|(name, entry)| {
            let var_owner = format!("variable '{name}'");
            let dims = string_items(required(entry, DIMS, &var_owner)?, &var_owner, DIMS)?;
            Ok::<_, CodecError>(DataVariable::from_parts(
                name.clone(),
                dims,
                pack_to_array(entry, &var_owner)?,
                optional_attrs(entry, &var_owner)?,
            ))
        })
        .collect::<Result<Vec<_>>>()?;

    let attributes = match value.get(ATTRIBUTES) {
        Some(attrs) => pack_to_attrs(attrs, owner)?,
        None => Attributes::new(),
    };

    let mut related = BTreeMap::new();
    if let Some(rel) = value.get(RELATED) {
        let rel_entries = rel
            .as_map()
            .ok_or_else(|| malformed("related must be a map"))?;
        for (name, model) in rel_entries {
            related.insert(name.clone(), pack_to_model(model, registry)?);
        }
    }

    registry.build(ModelParts {
        kind,
        coordinates,
        variables,
        attributes,
        related,
    })
}

/// Encode a model as a compact payload.
pub fn encode_model(model: &Model) -> Result<Vec<u8>> {
    let bytes = MsgPackEncoder::encode(&model_to_pack(model)?)?;
    debug!(
        kind = model.kind().as_str(),
        variables = model.variables().len(),
        bytes = bytes.len(),
        "Encoded compact model"
    );
    Ok(bytes)
}

/// Decode and validate a compact payload.
pub fn decode_model(bytes: &[u8], config: &ReaderConfig, registry: &ModelRegistry) -> Result<Model> {
    config.check_size("compact", bytes.len() as u64)?;
    let value = MsgPackDecoder::decode(bytes)?;
    let model = pack_to_model(&value, registry)?;
    debug!(
        kind = model.kind().as_str(),
        variables = model.variables().len(),
        bytes = bytes.len(),
        "Decoded compact model"
    );
    Ok(model)
}

pub fn sky_model_to_pack(sky: &SkyModel) -> Result<PackValue> {
    let components = sky
        .components()
        .iter()
        .map(model_to_pack)
        .collect::<Result<Vec<_>>>()?;
    let mut entries = vec![
        (KIND.to_string(), PackValue::str(SKY_MODEL_TAG)),
        (FIXED.to_string(), PackValue::Bool(sky.is_fixed())),
        (COMPONENTS.to_string(), PackValue::Array(components)),
    ];
    for (slot, model) in SKY_SLOTS.iter().zip([sky.image(), sky.gaintable(), sky.mask()]) {
        if let Some(model) = model {
            entries.push((slot.to_string(), model_to_pack(model)?));
        }
    }
    Ok(PackValue::Map(entries))
}

pub fn pack_to_sky_model(value: &PackValue, registry: &ModelRegistry) -> Result<SkyModel> {
    match value.get(KIND).and_then(PackValue::as_str) {
        Some(SKY_MODEL_TAG) => {}
        Some(other) => return Err(CodecError::unknown_model_kind(other)),
        None => return Err(malformed("payload has no 'kind' discriminator")),
    }
    let components = required(value, COMPONENTS, SKY_MODEL_TAG)?
        .as_array()
        .ok_or_else(|| malformed("components must be an array"))?
        .iter()
        .map(|c| pack_to_model(c, registry))
        .collect::<Result<Vec<_>>>()?;
    let fixed = matches!(value.get(FIXED), Some(PackValue::Bool(true)));
    let slot = |name: &str| value.get(name).map(|m| pack_to_model(m, registry)).transpose();
    SkyModel::new(components, slot("image")?, slot("gaintable")?, slot("mask")?, fixed)
}

pub fn encode_sky_model(sky: &SkyModel) -> Result<Vec<u8>> {
    MsgPackEncoder::encode(&sky_model_to_pack(sky)?)
}

pub fn decode_sky_model(
    bytes: &[u8],
    config: &ReaderConfig,
    registry: &ModelRegistry,
) -> Result<SkyModel> {
    config.check_size("compact", bytes.len() as u64)?;
    pack_to_sky_model(&MsgPackDecoder::decode(bytes)?, registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attrs;
    use crate::model::constructors::{configuration, ConfigurationParams};

    #[test]
    fn test_attr_leaf_detection() {
        let attrs = attrs! {
            "beam" => ArrayData::vector(vec![1.0f64, 2.0]),
            "lookalike" => attrs! { "dtype" => "float64", "shape" => vec![AttrValue::from(2i64)], "data" => "text" },
            "empty" => Attributes::new(),
            "int" => 3i64,
            "float" => 3.0,
        };
        let back = pack_to_attrs(&attrs_to_pack(&attrs).unwrap(), "test").unwrap();
        assert_eq!(back, attrs);
        assert!(matches!(back["lookalike"], AttrValue::Map(_)));
        assert!(matches!(back["float"], AttrValue::Float(_)));
    }

    #[test]
    fn test_first_key_is_kind() {
        let model = configuration(&ConfigurationParams::example(2)).unwrap();
        let bytes = encode_model(&model).unwrap();
        assert_eq!(&bytes[1..6], b"\xa4kind");
    }

    #[test]
    fn test_model_roundtrip() {
        let model = configuration(&ConfigurationParams::example(3)).unwrap();
        let bytes = encode_model(&model).unwrap();
        let back = decode_model(&bytes, &ReaderConfig::default(), ModelRegistry::standard()).unwrap();
        assert_eq!(back, model);
    }

    #[test]
    fn test_unknown_kind() {
        let value = PackValue::map([(KIND, PackValue::str("not_a_real_model"))]);
        let bytes = MsgPackEncoder::encode(&value).unwrap();
        let err = decode_model(&bytes, &ReaderConfig::default(), ModelRegistry::standard()).unwrap_err();
        assert!(matches!(err, CodecError::UnknownModelKind { .. }));
    }

    #[test]
    fn test_missing_discriminator_and_dims_order() {
        let model = configuration(&ConfigurationParams::example(2)).unwrap();
        for key in [KIND, DIMS_ORDER] {
            let PackValue::Map(entries) = model_to_pack(&model).unwrap() else {
                unreachable!()
            };
            let stripped = PackValue::Map(entries.into_iter().filter(|(k, _)| k != key).collect());
            let bytes = MsgPackEncoder::encode(&stripped).unwrap();
            let err = decode_model(&bytes, &ReaderConfig::default(), ModelRegistry::standard())
                .unwrap_err();
            assert!(matches!(err, CodecError::MalformedPayload { .. }), "{key}: {err}");
        }
    }

    #[test]
    fn test_missing_structural_keys_are_malformed() {
        let model = configuration(&ConfigurationParams::example(2)).unwrap();
        for key in [COORDINATES, DATA_VARIABLES] {
            let PackValue::Map(entries) = model_to_pack(&model).unwrap() else {
                unreachable!()
            };
            let stripped = PackValue::Map(entries.into_iter().filter(|(k, _)| k != key).collect());
            let err = pack_to_model(&stripped, ModelRegistry::standard()).unwrap_err();
            assert!(matches!(err, CodecError::MalformedPayload { .. }), "{key}: {err}");
        }

        // A variable entry without its dims list.
        let PackValue::Map(entries) = model_to_pack(&model).unwrap() else {
            unreachable!()
        };
        let entries = entries
            .into_iter()
            .map(|(key, value)| match (key.as_str(), value) {
                (DATA_VARIABLES, PackValue::Map(vars)) => {
                    let vars = vars
                        .into_iter()
                        .map(|(name, var)| match var {
                            PackValue::Map(fields) => (
                                name,
                                PackValue::Map(fields.into_iter().filter(|(k, _)| k != DIMS).collect()),
                            ),
                            other => (name, other),
                        })
                        .collect();
                    (key, PackValue::Map(vars))
                }
                (_, value) => (key, value),
            })
            .collect();
        let err = pack_to_model(&PackValue::Map(entries), ModelRegistry::standard()).unwrap_err();
        assert!(matches!(err, CodecError::MalformedPayload { .. }), "{err}");
    }

    #[test]
    fn test_not_a_map() {
        let bytes = MsgPackEncoder::encode(&PackValue::Int(1)).unwrap();
        let err = decode_model(&bytes, &ReaderConfig::default(), ModelRegistry::standard()).unwrap_err();
        assert!(matches!(err, CodecError::MalformedPayload { .. }));
    }
}
