// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Mapping between models and container node trees.
//!
//! ```text
//! /<Kind><i>                 attrs: model_kind, dims_order
//!   /coordinates/<axis>      dataset, attrs: frame, units?, user attrs
//!   /data_variables/<var>    dataset, attrs: dims, dtype, units?, user attrs
//!   /attributes              scalars, lists and arrays as attrs; mappings as child groups
//!   /related/<name>          nested model group
//! ```

use std::collections::BTreeMap;

use super::node::{Dataset, Group};
use crate::core::{AttrValue, Attributes, CodecError, DType, ModelKind, Result};
use crate::model::sky::{SkyModel, NUMBER_SKYCOMPONENTS_ATTR, SKY_MODEL_TAG};
use crate::model::{Coordinate, DataVariable, Model, ModelParts, ModelRegistry, FRAME_ATTR};

pub const MODEL_KIND_ATTR: &str = "model_kind";
pub const DIMS_ORDER_ATTR: &str = "dims_order";
pub const DIMS_ATTR: &str = "dims";
pub const DTYPE_ATTR: &str = "dtype";
pub const FIXED_ATTR: &str = "fixed";

const COORDINATES: &str = "coordinates";
const DATA_VARIABLES: &str = "data_variables";
const ATTRIBUTES: &str = "attributes";
const RELATED: &str = "related";
const COMPONENTS: &str = "components";
const SKY_SLOTS: [&str; 3] = ["image", "gaintable", "mask"];

fn string_list(items: &[&str]) -> AttrValue {
    AttrValue::List(items.iter().map(|s| AttrValue::from(*s)).collect())
}

fn read_string_list(value: Option<&AttrValue>, owner: &str, key: &str) -> Result<Vec<String>> {
    let items = value
        .ok_or_else(|| CodecError::missing_metadata(owner, key))?
        .as_list()
        .ok_or_else(|| CodecError::malformed("container", format!("{owner}: '{key}' is not a list")))?;
    items
        .iter()
        .map(|item| {
            item.as_str().map(str::to_string).ok_or_else(|| {
                CodecError::malformed("container", format!("{owner}: '{key}' holds a non-string"))
            })
        })
        .collect()
}

/// Nested mappings become child groups, everything else stays an attribute.
pub fn attrs_to_group(name: &str, attrs: &Attributes) -> Group {
    let mut group = Group::new(name);
    for (key, value) in attrs {
        match value {
            AttrValue::Map(inner) => group.push_group(attrs_to_group(key, inner)),
            other => {
                group.attrs.insert(key.clone(), other.clone());
            }
        }
    }
    group
}

pub fn group_to_attrs(group: &Group) -> Result<Attributes> {
    let mut attrs = group.attrs.clone();
    for child in group.groups() {
        if attrs
            .insert(child.name.clone(), AttrValue::Map(group_to_attrs(child)?))
            .is_some()
        {
            return Err(CodecError::malformed(
                "container",
                format!("attribute '{}' stored twice", child.name),
            ));
        }
    }
    if let Some(dataset) = group.datasets().next() {
        return Err(CodecError::malformed(
            "container",
            format!("unexpected dataset '{}' in attribute group", dataset.name),
        ));
    }
    Ok(attrs)
}

/// Encode one model as a group called `name`.
///
/// Coordinate datasets carry the model's coordinate attributes, which
/// always include the axis `frame`.
pub fn model_to_group(name: &str, model: &Model) -> Group {
    let mut group = Group::new(name).with_attrs(crate::attrs! {
        MODEL_KIND_ATTR => model.kind().as_str(),
        DIMS_ORDER_ATTR => string_list(&model.dims_order()),
    });

    let mut coordinates = Group::new(COORDINATES);
    for coord in model.coordinates() {
        coordinates.push_dataset(coord.name(), coord.attrs().clone(), coord.values().clone());
    }
    group.push_group(coordinates);

    let mut variables = Group::new(DATA_VARIABLES);
    for var in model.variables() {
        let mut attrs = var.attrs().clone();
        let dims: Vec<&str> = var.dims().iter().map(String::as_str).collect();
        attrs.insert(DIMS_ATTR.to_string(), string_list(&dims));
        attrs.insert(DTYPE_ATTR.to_string(), var.dtype().as_str().into());
        variables.push_dataset(var.name(), attrs, var.data().clone());
    }
    group.push_group(variables);

    group.push_group(attrs_to_group(ATTRIBUTES, model.attributes()));

    if !model.related_models().is_empty() {
        let mut related = Group::new(RELATED);
        for (rel_name, rel) in model.related_models() {
            related.push_group(model_to_group(rel_name, rel));
        }
        group.push_group(related);
    }
    group
}

fn decode_variable(owner: &str, dataset: &Dataset) -> Result<DataVariable> {
    let var_owner = format!("{owner} variable '{}'", dataset.name);
    let mut attrs = dataset.attrs.clone();
    let dims = read_string_list(attrs.get(DIMS_ATTR), &var_owner, DIMS_ATTR)?;
    let dtype = attrs
        .get(DTYPE_ATTR)
        .and_then(AttrValue::as_str)
        .ok_or_else(|| CodecError::missing_metadata(&var_owner, DTYPE_ATTR))
        .and_then(DType::parse)?;
    if dtype != dataset.data.dtype() {
        return Err(CodecError::malformed(
            "container",
            format!(
                "{var_owner}: declared dtype {dtype} but payload is {}",
                dataset.data.dtype()
            ),
        ));
    }
    attrs.remove(DIMS_ATTR);
    attrs.remove(DTYPE_ATTR);
    Ok(DataVariable::from_parts(
        dataset.name.clone(),
        dims,
        dataset.data.clone(),
        attrs,
    ))
}

/// Decode and validate a model group.
pub fn group_to_model(group: &Group, registry: &ModelRegistry) -> Result<Model> {
    let tag = group
        .str_attr(MODEL_KIND_ATTR)
        .ok_or_else(|| CodecError::unknown_model_kind(format!("<missing in '{}'>", group.name)))?;
    let kind = ModelKind::parse(tag)?;
    registry.resolve(kind)?;
    let owner = kind.as_str();

    let dims_order = read_string_list(group.attrs.get(DIMS_ORDER_ATTR), owner, DIMS_ORDER_ATTR)?;
    let coord_group = group.require_group(COORDINATES)?;
    let mut coordinates = Vec::with_capacity(dims_order.len());
    for axis in &dims_order {
        let dataset = coord_group
            .dataset(axis)
            .ok_or_else(|| CodecError::missing_metadata(owner, format!("coordinate '{axis}'")))?;
        if !dataset.attrs.contains_key(FRAME_ATTR) {
            return Err(CodecError::missing_metadata(
                format!("{owner} coordinate '{axis}'"),
                FRAME_ATTR,
            ));
        }
        coordinates.push(
            Coordinate::new(axis.clone(), dataset.data.clone()).with_attrs(dataset.attrs.clone()),
        );
    }
    if let Some(extra) = coord_group
        .datasets()
        .find(|d| !dims_order.contains(&d.name))
    {
        return Err(CodecError::malformed(
            "container",
            format!("coordinate '{}' is not listed in dims_order", extra.name),
        ));
    }

    let variables = group
        .require_group(DATA_VARIABLES)?
        .datasets()
        .map(|d| decode_variable(owner, d))
        .collect::<Result<Vec<_>>>()?;

    let attributes = match group.group(ATTRIBUTES) {
        Some(g) => group_to_attrs(g)?,
        None => Attributes::new(),
    };

    let mut related = BTreeMap::new();
    if let Some(rel_group) = group.group(RELATED) {
        for child in rel_group.groups() {
            related.insert(child.name.clone(), group_to_model(child, registry)?);
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

/// Encode a sky model as a group called `name`.
pub fn sky_model_to_group(name: &str, sky: &SkyModel) -> Group {
    let mut group = Group::new(name).with_attrs(crate::attrs! {
        MODEL_KIND_ATTR => SKY_MODEL_TAG,
        NUMBER_SKYCOMPONENTS_ATTR => sky.components().len() as i64,
        FIXED_ATTR => sky.is_fixed(),
    });
    let mut components = Group::new(COMPONENTS);
    for (i, component) in sky.components().iter().enumerate() {
        components.push_group(model_to_group(&format!("{}{i}", component.kind()), component));
    }
    group.push_group(components);
    for (slot, model) in SKY_SLOTS.iter().zip([sky.image(), sky.gaintable(), sky.mask()]) {
        if let Some(model) = model {
            group.push_group(model_to_group(slot, model));
        }
    }
    group
}

pub fn group_to_sky_model(group: &Group, registry: &ModelRegistry) -> Result<SkyModel> {
    if group.str_attr(MODEL_KIND_ATTR) != Some(SKY_MODEL_TAG) {
        return Err(CodecError::unknown_model_kind(
            group.str_attr(MODEL_KIND_ATTR).unwrap_or("<missing>"),
        ));
    }
    let count = group
        .attrs
        .get(NUMBER_SKYCOMPONENTS_ATTR)
        .and_then(AttrValue::as_i64)
        .ok_or_else(|| CodecError::missing_metadata(SKY_MODEL_TAG, NUMBER_SKYCOMPONENTS_ATTR))?;
    let components = group
        .require_group(COMPONENTS)?
        .groups()
        .map(|g| group_to_model(g, registry))
        .collect::<Result<Vec<_>>>()?;
    if components.len() as i64 != count {
        return Err(CodecError::malformed(
            "container",
            format!("{NUMBER_SKYCOMPONENTS_ATTR} is {count} but {} found", components.len()),
        ));
    }
    let fixed = group
        .attrs
        .get(FIXED_ATTR)
        .and_then(AttrValue::as_bool)
        .unwrap_or(false);
    let slot = |name: &str| {
        group
            .group(name)
            .map(|g| group_to_model(g, registry))
            .transpose()
    };
    SkyModel::new(components, slot("image")?, slot("gaintable")?, slot("mask")?, fixed)
}
