// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Model-kind registry and schema validation.

use std::collections::HashMap;
use std::sync::OnceLock;

use tracing::debug;

use super::schema::{
    CrossCheck, SchemaDescriptor, FRAME_ATTR, POLARISATION_FRAME_ATTR, RECEPTOR_FRAME_ATTR,
    RESERVED_VARIABLE_KEYS, UNITS_ATTR,
};
use super::{DataVariable, Model, ModelParts};
use crate::core::{AttrValue, Attributes, CodecError, ModelKind, Result};
use crate::frames::{FrameRegistry, PolarisationFrame, ReceptorFrame};

/// Immutable table from [`ModelKind`] to [`SchemaDescriptor`].
///
/// Construct one explicitly with [`ModelRegistry::new`] and
/// [`register`](ModelRegistry::register), or use the process-wide
/// [`ModelRegistry::standard`] instance which knows every built-in kind.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    frames: FrameRegistry,
    schemas: HashMap<ModelKind, SchemaDescriptor>,
}

static STANDARD_MODELS: OnceLock<ModelRegistry> = OnceLock::new();

fn init_standard_registry() -> ModelRegistry {
    ModelKind::ALL.iter().fold(
        ModelRegistry::new(FrameRegistry::standard().clone()),
        |registry, &kind| registry.register(kind, SchemaDescriptor::standard(kind)),
    )
}

impl ModelRegistry {
    /// Create a registry with no kinds registered.
    pub fn new(frames: FrameRegistry) -> Self {
        Self {
            frames,
            schemas: HashMap::new(),
        }
    }

    /// The shared registry with every built-in kind.
    pub fn standard() -> &'static ModelRegistry {
        STANDARD_MODELS.get_or_init(init_standard_registry)
    }

    /// Register (or replace) the schema for a kind.
    pub fn register(mut self, kind: ModelKind, mut descriptor: SchemaDescriptor) -> Self {
        descriptor.kind = kind;
        self.schemas.insert(kind, descriptor);
        self
    }

    /// Schema for a kind, failing with `UnknownModelKind` if unregistered.
    pub fn resolve(&self, kind: ModelKind) -> Result<&SchemaDescriptor> {
        self.schemas
            .get(&kind)
            .ok_or_else(|| CodecError::unknown_model_kind(kind.as_str()))
    }

    /// Resolve a wire tag.
    pub fn resolve_tag(&self, tag: &str) -> Result<&SchemaDescriptor> {
        self.resolve(ModelKind::parse(tag)?)
    }

    pub fn is_registered(&self, kind: ModelKind) -> bool {
        self.schemas.contains_key(&kind)
    }

    pub fn frames(&self) -> &FrameRegistry {
        &self.frames
    }

    /// Validate parts and produce a model.
    ///
    /// Every coordinate of the result carries a `frame` attribute taken from
    /// its axis descriptor.
    pub fn build(&self, mut parts: ModelParts) -> Result<Model> {
        self.validate(&parts)?;
        self.stamp_frames(&mut parts)?;
        Ok(Model::from_validated(parts))
    }

    fn stamp_frames(&self, parts: &mut ModelParts) -> Result<()> {
        for coord in parts.coordinates.iter_mut() {
            let frame = &self.frames.descriptor(&coord.name)?.frame;
            coord
                .attrs
                .entry(FRAME_ATTR.to_string())
                .or_insert_with(|| AttrValue::from(frame.as_str()));
        }
        Ok(())
    }

    /// Check every schema rule without constructing a model.
    pub fn validate(&self, parts: &ModelParts) -> Result<()> {
        let schema = self.resolve(parts.kind)?;
        let owner = parts.kind.as_str();

        self.check_coordinates(schema, parts)?;
        check_variables(schema, parts)?;
        check_attributes(schema, &parts.attributes)?;
        check_frames(parts)?;
        check_relations(schema, parts)?;

        debug!(
            kind = owner,
            coordinates = parts.coordinates.len(),
            variables = parts.variables.len(),
            related = parts.related.len(),
            "Validated model"
        );
        Ok(())
    }

    /// Swap in a variable on an existing model, committing only if the
    /// result still validates.
    pub fn replace_variable(&self, model: &mut Model, variable: DataVariable) -> Result<()> {
        let mut parts = model.to_parts();
        match parts.variables.iter_mut().find(|v| v.name == variable.name) {
            Some(slot) => *slot = variable,
            None => parts.variables.push(variable),
        }
        *model = self.build(parts)?;
        Ok(())
    }

    fn check_coordinates(&self, schema: &SchemaDescriptor, parts: &ModelParts) -> Result<()> {
        for (i, coord) in parts.coordinates.iter().enumerate() {
            if parts.coordinates[..i].iter().any(|c| c.name == coord.name) {
                return Err(CodecError::shape_mismatch(
                    &coord.name,
                    "coordinate declared more than once",
                ));
            }
            let owner = format!("coordinate '{}'", coord.name);
            check_reserved(&coord.attrs, &owner)?;

            let descriptor = self.frames.descriptor(&coord.name)?;
            self.frames.validate_coordinate(&coord.name, &coord.values)?;

            if let Some(expected) = &descriptor.units {
                match coord.attrs.get(UNITS_ATTR) {
                    None => return Err(CodecError::missing_metadata(owner, UNITS_ATTR)),
                    Some(AttrValue::String(units)) if units == expected => {}
                    Some(other) => {
                        return Err(CodecError::invalid_axis_value(
                            &coord.name,
                            format!("units={other:?}"),
                            format!("axis is measured in {expected}"),
                        ))
                    }
                }
            }
            if let Some(frame) = coord.attrs.get(FRAME_ATTR) {
                if frame.as_str() != Some(descriptor.frame.as_str()) {
                    return Err(CodecError::invalid_axis_value(
                        &coord.name,
                        format!("frame={frame:?}"),
                        format!("axis frame is {}", descriptor.frame),
                    ));
                }
            }
        }

        for required in &schema.coordinates {
            if !parts.coordinates.iter().any(|c| &c.name == required) {
                return Err(CodecError::missing_metadata(
                    schema.kind.as_str(),
                    format!("coordinate '{required}'"),
                ));
            }
        }
        Ok(())
    }
}

fn check_reserved(attrs: &Attributes, owner: &str) -> Result<()> {
    match RESERVED_VARIABLE_KEYS.iter().find(|k| attrs.contains_key(**k)) {
        Some(key) => Err(CodecError::reserved_key(*key, owner)),
        None => Ok(()),
    }
}

fn check_variables(schema: &SchemaDescriptor, parts: &ModelParts) -> Result<()> {
    for (i, var) in parts.variables.iter().enumerate() {
        if parts.variables[..i].iter().any(|v| v.name == var.name) {
            return Err(CodecError::shape_mismatch(
                &var.name,
                "variable declared more than once",
            ));
        }
        let owner = format!("variable '{}'", var.name);
        check_reserved(&var.attrs, &owner)?;

        if var.dims.len() != var.data.ndim() {
            return Err(CodecError::shape_mismatch(
                &var.name,
                format!(
                    "{} dims {:?} for {}-D data",
                    var.dims.len(),
                    var.dims,
                    var.data.ndim()
                ),
            ));
        }
        for (axis, (dim, &extent)) in var.dims.iter().zip(var.data.shape()).enumerate() {
            if var.dims[..axis].contains(dim) {
                return Err(CodecError::shape_mismatch(
                    &var.name,
                    format!("dimension '{dim}' repeated"),
                ));
            }
            let coord = parts
                .coordinates
                .iter()
                .find(|c| &c.name == dim)
                .ok_or_else(|| {
                    CodecError::shape_mismatch(
                        &var.name,
                        format!("dimension '{dim}' has no coordinate"),
                    )
                })?;
            if coord.len() != extent {
                return Err(CodecError::shape_mismatch(
                    &var.name,
                    format!(
                        "extent {extent} along '{dim}' but coordinate has length {}",
                        coord.len()
                    ),
                ));
            }
        }

        let Some(spec) = schema.variable_spec(&var.name) else {
            continue;
        };
        if var.dims != spec.dims {
            return Err(CodecError::shape_mismatch(
                &var.name,
                format!("dims {:?}, expected {:?}", var.dims, spec.dims),
            ));
        }
        if !spec.dtype.accepts(var.data.dtype()) {
            return Err(CodecError::shape_mismatch(
                &var.name,
                format!(
                    "dtype {} where {} is required",
                    var.data.dtype(),
                    spec.dtype.describe()
                ),
            ));
        }
        if spec.units.is_some() && !var.attrs.contains_key(UNITS_ATTR) {
            return Err(CodecError::missing_metadata(owner, UNITS_ATTR));
        }
    }

    for spec in schema.variables.iter().filter(|s| s.required) {
        if !parts.variables.iter().any(|v| v.name == spec.name) {
            return Err(CodecError::missing_metadata(
                schema.kind.as_str(),
                format!("variable '{}'", spec.name),
            ));
        }
    }
    Ok(())
}

fn check_attributes(schema: &SchemaDescriptor, attrs: &Attributes) -> Result<()> {
    for spec in &schema.attributes {
        match attrs.get(&spec.name) {
            None if spec.required => {
                return Err(CodecError::missing_metadata(schema.kind.as_str(), &spec.name))
            }
            Some(value) if !spec.kind.accepts(value) => {
                return Err(CodecError::missing_metadata(
                    format!("{} ({:?} attribute, found {})", schema.kind, spec.kind, value.type_name()),
                    &spec.name,
                ))
            }
            _ => {}
        }
    }
    Ok(())
}

/// The frame attributes fix the labels of the axes they govern.
fn check_frames(parts: &ModelParts) -> Result<()> {
    let coord_labels = |axis: &str| {
        parts
            .coordinates
            .iter()
            .find(|c| c.name == axis)
            .and_then(|c| c.labels())
    };

    if let Some(value) = parts.attributes.get(POLARISATION_FRAME_ATTR) {
        let name = value.as_str().ok_or_else(|| {
            CodecError::missing_metadata(parts.kind.as_str(), POLARISATION_FRAME_ATTR)
        })?;
        let frame = PolarisationFrame::from_name(name)?;
        if let Some(labels) = coord_labels("polarisation") {
            if labels != frame.labels() {
                return Err(CodecError::invalid_axis_value(
                    "polarisation",
                    format!("{labels:?}"),
                    format!("frame {name} requires {:?}", frame.labels()),
                ));
            }
        }
    } else if coord_labels("polarisation").is_some() {
        return Err(CodecError::missing_metadata(
            parts.kind.as_str(),
            POLARISATION_FRAME_ATTR,
        ));
    }

    if let Some(value) = parts.attributes.get(RECEPTOR_FRAME_ATTR) {
        let name = value.as_str().ok_or_else(|| {
            CodecError::missing_metadata(parts.kind.as_str(), RECEPTOR_FRAME_ATTR)
        })?;
        let frame = ReceptorFrame::from_name(name)?;
        for axis in ["receptor1", "receptor2"] {
            if let Some(labels) = coord_labels(axis) {
                if labels != frame.labels() {
                    return Err(CodecError::invalid_axis_value(
                        axis,
                        format!("{labels:?}"),
                        format!("receptor frame {name} requires {:?}", frame.labels()),
                    ));
                }
            }
        }
    } else if coord_labels("receptor1").is_some() || coord_labels("receptor2").is_some() {
        return Err(CodecError::missing_metadata(
            parts.kind.as_str(),
            RECEPTOR_FRAME_ATTR,
        ));
    }
    Ok(())
}

fn check_relations(schema: &SchemaDescriptor, parts: &ModelParts) -> Result<()> {
    for (name, related) in &parts.related {
        let spec = schema.relation_spec(name).ok_or_else(|| {
            CodecError::malformed(
                "related",
                format!("{} has no related model named '{name}'", schema.kind),
            )
        })?;
        if related.kind() != spec.kind {
            return Err(CodecError::malformed(
                "related",
                format!("'{name}' must be a {}, got {}", spec.kind, related.kind()),
            ));
        }
    }
    for spec in schema.relations.iter().filter(|r| r.required) {
        if !parts.related.contains_key(&spec.name) {
            return Err(CodecError::missing_metadata(
                schema.kind.as_str(),
                format!("related '{}'", spec.name),
            ));
        }
    }

    for check in &schema.cross_checks {
        match check {
            CrossCheck::IndicesWithin {
                variable,
                relation,
                axis,
            } => {
                let (Some(var), Some(related)) = (
                    parts.variables.iter().find(|v| &v.name == variable),
                    parts.related.get(relation),
                ) else {
                    continue;
                };
                let bound = related.coordinate(axis).map_or(0, |c| c.len()) as i128;
                let indices = var.data.to_i128_vec().unwrap_or_default();
                if let Some(&bad) = indices.iter().find(|&&i| i < 0 || i >= bound) {
                    return Err(CodecError::shape_mismatch(
                        variable,
                        format!("index {bad} outside {relation} with {bound} entries along '{axis}'"),
                    ));
                }
            }
            CrossCheck::AxisLengthMatches {
                axis,
                relation,
                related_axis,
            } => {
                let (Some(coord), Some(related)) = (
                    parts.coordinates.iter().find(|c| &c.name == axis),
                    parts.related.get(relation),
                ) else {
                    continue;
                };
                let expected = related.coordinate(related_axis).map_or(0, |c| c.len());
                if coord.len() != expected {
                    return Err(CodecError::shape_mismatch(
                        axis,
                        format!(
                            "length {} but {relation} has {expected} entries along '{related_axis}'",
                            coord.len()
                        ),
                    ));
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ArrayData;
    use crate::model::constructors::{configuration, ConfigurationParams};
    use crate::model::{Coordinate, DTypeClass};

    fn example_parts() -> ModelParts {
        configuration(&ConfigurationParams::example(3))
            .unwrap()
            .into_parts()
    }

    #[test]
    fn test_standard_resolves_every_kind() {
        let registry = ModelRegistry::standard();
        for kind in ModelKind::ALL {
            assert_eq!(registry.resolve(kind).unwrap().kind, kind);
        }
        assert!(matches!(
            registry.resolve_tag("not_a_real_model"),
            Err(CodecError::UnknownModelKind { .. })
        ));
    }

    #[test]
    fn test_build_records_coordinate_frames() {
        let mut parts = example_parts();
        for coord in parts.coordinates.iter_mut() {
            coord.attrs.remove(FRAME_ATTR);
        }
        let model = ModelRegistry::standard().build(parts).unwrap();
        for coord in model.coordinates() {
            let descriptor = FrameRegistry::standard().descriptor(coord.name()).unwrap();
            assert_eq!(
                coord.attrs().get(FRAME_ATTR).and_then(AttrValue::as_str),
                Some(descriptor.frame.as_str())
            );
        }
    }

    #[test]
    fn test_unregistered_kind() {
        let registry = ModelRegistry::new(FrameRegistry::with_standard_axes());
        let err = registry.build(example_parts()).unwrap_err();
        assert!(matches!(err, CodecError::UnknownModelKind { .. }));
    }

    #[test]
    fn test_custom_descriptor() {
        let relaxed = SchemaDescriptor::new(ModelKind::Configuration)
            .coordinate("id")
            .variable("names", &["id"], DTypeClass::Text, None);
        let registry = ModelRegistry::new(FrameRegistry::with_standard_axes())
            .register(ModelKind::Configuration, relaxed);

        let parts = ModelParts::new(ModelKind::Configuration)
            .coordinate(Coordinate::new("id", ArrayData::vector(vec![0i64, 1])))
            .variable(DataVariable::new(
                "names",
                &["id"],
                ArrayData::strings(&["A0", "A1"]),
            ));
        let model = registry.build(parts.clone()).unwrap();
        assert_eq!(model.dims_order(), vec!["id"]);

        // The standard schema wants much more.
        assert!(parts.build().is_err());
    }

    #[test]
    fn test_reserved_key() {
        let mut parts = example_parts();
        parts.variables[0] = parts.variables[0].clone().with_attr("dims", "oops");
        let err = parts.build().unwrap_err();
        assert!(matches!(err, CodecError::ReservedKey { ref key, .. } if key == "dims"));
    }

    #[test]
    fn test_undeclared_dimension() {
        let parts = example_parts().variable(DataVariable::new(
            "extra",
            &["time"],
            ArrayData::vector(vec![1.0f64]),
        ));
        assert!(matches!(
            parts.build(),
            Err(CodecError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_missing_units() {
        let mut parts = example_parts();
        let xyz = parts.variables.iter().position(|v| v.name == "xyz").unwrap();
        let var = parts.variables.remove(xyz);
        parts.variables.push(DataVariable::new(
            "xyz",
            &["id", "spatial"],
            var.data().clone(),
        ));
        let err = parts.build().unwrap_err();
        assert!(matches!(err, CodecError::MissingMetadata { ref key, .. } if key == "units"));
    }

    #[test]
    fn test_missing_required_attribute() {
        let mut parts = example_parts();
        parts.attributes.remove("location");
        let err = parts.build().unwrap_err();
        assert!(matches!(err, CodecError::MissingMetadata { ref key, .. } if key == "location"));
    }

    #[test]
    fn test_unknown_relation() {
        let config = configuration(&ConfigurationParams::example(2)).unwrap();
        let parts = example_parts().related("station_layout", config);
        assert!(matches!(
            parts.build(),
            Err(CodecError::MalformedPayload { .. })
        ));
    }
}
