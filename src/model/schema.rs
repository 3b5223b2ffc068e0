// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Per-kind schema descriptors.
//!
//! A [`SchemaDescriptor`] lists what an instance of one model kind must
//! declare: coordinates, data variables (with their dimension lists, element
//! type class and units requirement), attributes and related models, plus
//! cross-model consistency checks.

use crate::core::{AttrValue, DType, ModelKind};

/// Accepted element types for a data variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DTypeClass {
    /// `float32` / `float64`
    Real,
    /// `complex64` / `complex128`
    Complex,
    /// Real or complex floating point
    Floating,
    /// Any integer width
    Integer,
    /// Integers or booleans
    FlagLike,
    /// Strings
    Text,
    /// No constraint
    Any,
}

impl DTypeClass {
    pub fn accepts(&self, dtype: DType) -> bool {
        match self {
            DTypeClass::Real => dtype.is_float(),
            DTypeClass::Complex => dtype.is_complex(),
            DTypeClass::Floating => dtype.is_float() || dtype.is_complex(),
            DTypeClass::Integer => dtype.is_integer(),
            DTypeClass::FlagLike => dtype.is_integer() || dtype == DType::Bool,
            DTypeClass::Text => dtype == DType::String,
            DTypeClass::Any => true,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            DTypeClass::Real => "real floating point",
            DTypeClass::Complex => "complex",
            DTypeClass::Floating => "real or complex floating point",
            DTypeClass::Integer => "integer",
            DTypeClass::FlagLike => "integer or bool",
            DTypeClass::Text => "string",
            DTypeClass::Any => "any",
        }
    }
}

/// Expected shape of an attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrKind {
    String,
    Number,
    Bool,
    Map,
    List,
    Array,
    Any,
}

impl AttrKind {
    pub fn accepts(&self, value: &AttrValue) -> bool {
        matches!(
            (self, value),
            (AttrKind::Any, _)
                | (AttrKind::String, AttrValue::String(_))
                | (AttrKind::Number, AttrValue::Int(_) | AttrValue::Float(_))
                | (AttrKind::Bool, AttrValue::Bool(_))
                | (AttrKind::Map, AttrValue::Map(_))
                | (AttrKind::List, AttrValue::List(_))
                | (AttrKind::Array, AttrValue::Array(_))
        )
    }
}

/// A data variable the schema knows about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableSpec {
    pub name: String,
    /// Exact, ordered dimension list
    pub dims: Vec<String>,
    pub dtype: DTypeClass,
    pub required: bool,
    /// Canonical unit; when set the variable must carry a `units` attribute
    pub units: Option<String>,
}

/// A model-level attribute the schema knows about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSpec {
    pub name: String,
    pub kind: AttrKind,
    pub required: bool,
}

/// A related model embedded under a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationSpec {
    pub name: String,
    pub kind: ModelKind,
    pub required: bool,
}

/// Consistency rule spanning a model and one of its related models.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrossCheck {
    /// Every value of an integer variable indexes into an axis of the related model
    IndicesWithin {
        variable: String,
        relation: String,
        axis: String,
    },
    /// An axis has the same length as an axis of the related model
    AxisLengthMatches {
        axis: String,
        relation: String,
        related_axis: String,
    },
}

/// Full schema of one model kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDescriptor {
    pub kind: ModelKind,
    /// Coordinates every instance must declare
    pub coordinates: Vec<String>,
    pub variables: Vec<VariableSpec>,
    pub attributes: Vec<AttributeSpec>,
    pub relations: Vec<RelationSpec>,
    pub cross_checks: Vec<CrossCheck>,
}

impl SchemaDescriptor {
    /// Start an empty descriptor for a kind.
    pub fn new(kind: ModelKind) -> Self {
        Self {
            kind,
            coordinates: Vec::new(),
            variables: Vec::new(),
            attributes: Vec::new(),
            relations: Vec::new(),
            cross_checks: Vec::new(),
        }
    }

    pub fn coordinate(mut self, name: &str) -> Self {
        self.coordinates.push(name.to_string());
        self
    }

    pub fn coordinates(mut self, names: &[&str]) -> Self {
        self.coordinates.extend(names.iter().map(|n| n.to_string()));
        self
    }

    /// Declare a required variable.
    pub fn variable(self, name: &str, dims: &[&str], dtype: DTypeClass, units: Option<&str>) -> Self {
        self.push_variable(name, dims, dtype, units, true)
    }

    /// Declare an optional variable.
    pub fn optional_variable(
        self,
        name: &str,
        dims: &[&str],
        dtype: DTypeClass,
        units: Option<&str>,
    ) -> Self {
        self.push_variable(name, dims, dtype, units, false)
    }

    fn push_variable(
        mut self,
        name: &str,
        dims: &[&str],
        dtype: DTypeClass,
        units: Option<&str>,
        required: bool,
    ) -> Self {
        self.variables.push(VariableSpec {
            name: name.to_string(),
            dims: dims.iter().map(|d| d.to_string()).collect(),
            dtype,
            required,
            units: units.map(str::to_string),
        });
        self
    }

    pub fn attribute(mut self, name: &str, kind: AttrKind, required: bool) -> Self {
        self.attributes.push(AttributeSpec {
            name: name.to_string(),
            kind,
            required,
        });
        self
    }

    pub fn relation(mut self, name: &str, kind: ModelKind, required: bool) -> Self {
        self.relations.push(RelationSpec {
            name: name.to_string(),
            kind,
            required,
        });
        self
    }

    pub fn cross_check(mut self, check: CrossCheck) -> Self {
        self.cross_checks.push(check);
        self
    }

    pub fn variable_spec(&self, name: &str) -> Option<&VariableSpec> {
        self.variables.iter().find(|v| v.name == name)
    }

    pub fn attribute_spec(&self, name: &str) -> Option<&AttributeSpec> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn relation_spec(&self, name: &str) -> Option<&RelationSpec> {
        self.relations.iter().find(|r| r.name == name)
    }

    /// Built-in descriptor for a kind.
    pub fn standard(kind: ModelKind) -> Self {
        use DTypeClass::*;

        const VIS_DIMS: &[&str] = &["time", "baselines", "frequency", "polarisation"];
        const GAIN_DIMS: &[&str] = &["time", "antenna", "frequency", "receptor1", "receptor2"];

        match kind {
            ModelKind::Visibility => Self::new(kind)
                .coordinates(&["time", "baselines", "frequency", "polarisation", "spatial"])
                .variable("vis", VIS_DIMS, Complex, Some("Jy"))
                .variable("weight", VIS_DIMS, Real, None)
                .variable("flags", VIS_DIMS, FlagLike, None)
                .variable("uvw", &["time", "baselines", "spatial"], Real, Some("m"))
                .variable("antenna1", &["baselines"], Integer, None)
                .variable("antenna2", &["baselines"], Integer, None)
                .variable("integration_time", &["time"], Real, Some("s"))
                .variable("channel_bandwidth", &["frequency"], Real, Some("Hz"))
                .attribute(POLARISATION_FRAME_ATTR, AttrKind::String, true)
                .attribute("phasecentre", AttrKind::Map, true)
                .attribute("source", AttrKind::String, false)
                .attribute("meta", AttrKind::Map, false)
                .relation("configuration", ModelKind::Configuration, true)
                .cross_check(CrossCheck::IndicesWithin {
                    variable: "antenna1".into(),
                    relation: "configuration".into(),
                    axis: "id".into(),
                })
                .cross_check(CrossCheck::IndicesWithin {
                    variable: "antenna2".into(),
                    relation: "configuration".into(),
                    axis: "id".into(),
                }),
            ModelKind::Image => Self::new(kind)
                .coordinates(&["frequency", "polarisation", "y", "x"])
                .variable(
                    "pixels",
                    &["frequency", "polarisation", "y", "x"],
                    Real,
                    Some("Jy/beam"),
                )
                .attribute(POLARISATION_FRAME_ATTR, AttrKind::String, true)
                .attribute("wcs", AttrKind::Map, true)
                .attribute("clean_beam", AttrKind::Map, false),
            ModelKind::GridData => Self::new(kind)
                .coordinates(&["frequency", "polarisation", "v", "u"])
                .variable(
                    "pixels",
                    &["frequency", "polarisation", "v", "u"],
                    Floating,
                    Some("Jy"),
                )
                .attribute(POLARISATION_FRAME_ATTR, AttrKind::String, true)
                .attribute("grid_wcs", AttrKind::Map, true),
            ModelKind::SkyComponent => Self::new(kind)
                .coordinates(&["frequency", "polarisation"])
                .variable("flux", &["frequency", "polarisation"], Real, Some("Jy"))
                .attribute(POLARISATION_FRAME_ATTR, AttrKind::String, true)
                .attribute("direction", AttrKind::Map, true)
                .attribute("name", AttrKind::String, true)
                .attribute("shape", AttrKind::String, true)
                .attribute("params", AttrKind::Map, false),
            ModelKind::Configuration => Self::new(kind)
                .coordinates(&["id", "spatial"])
                .variable("names", &["id"], Text, None)
                .variable("xyz", &["id", "spatial"], Real, Some("m"))
                .variable("diameter", &["id"], Real, Some("m"))
                .variable("mount", &["id"], Text, None)
                .optional_variable("offset", &["id", "spatial"], Real, Some("m"))
                .optional_variable("stations", &["id"], Text, None)
                .optional_variable("vp_type", &["id"], Text, None)
                .attribute("name", AttrKind::String, true)
                .attribute("location", AttrKind::Map, true)
                .attribute(RECEPTOR_FRAME_ATTR, AttrKind::String, true)
                .attribute("frame", AttrKind::String, false),
            ModelKind::GainTable => Self::new(kind)
                .coordinates(&["time", "antenna", "frequency", "receptor1", "receptor2"])
                .variable("gain", GAIN_DIMS, Complex, None)
                .variable("weight", GAIN_DIMS, Real, None)
                .variable(
                    "residual",
                    &["time", "frequency", "receptor1", "receptor2"],
                    Real,
                    None,
                )
                .variable("interval", &["time"], Real, Some("s"))
                .attribute(RECEPTOR_FRAME_ATTR, AttrKind::String, true)
                .attribute("phasecentre", AttrKind::Map, true)
                .attribute("jones_type", AttrKind::String, true)
                .relation("configuration", ModelKind::Configuration, false)
                .cross_check(CrossCheck::AxisLengthMatches {
                    axis: "antenna".into(),
                    relation: "configuration".into(),
                    related_axis: "id".into(),
                }),
            ModelKind::FlagTable => Self::new(kind)
                .coordinates(&["time", "baselines", "frequency", "polarisation"])
                .variable("flags", VIS_DIMS, FlagLike, None)
                .variable("integration_time", &["time"], Real, Some("s"))
                .variable("channel_bandwidth", &["frequency"], Real, Some("Hz"))
                .attribute(POLARISATION_FRAME_ATTR, AttrKind::String, true)
                .relation("configuration", ModelKind::Configuration, false),
        }
    }
}

/// Attribute naming the polarisation frame of the `polarisation` axis.
pub const POLARISATION_FRAME_ATTR: &str = "_polarisation_frame";

/// Attribute naming the receptor frame of the `receptor1`/`receptor2` axes.
pub const RECEPTOR_FRAME_ATTR: &str = "receptor_frame";

/// Attribute key holding a coordinate's or variable's unit.
pub const UNITS_ATTR: &str = "units";

/// Attribute key holding a coordinate's reference frame.
pub const FRAME_ATTR: &str = "frame";

/// Keys the encoders write on every variable node; user attributes may not use them.
pub const RESERVED_VARIABLE_KEYS: &[&str] = &["dims", "dtype"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_has_a_descriptor() {
        for kind in ModelKind::ALL {
            let schema = SchemaDescriptor::standard(kind);
            assert_eq!(schema.kind, kind);
            assert!(!schema.coordinates.is_empty());
            for var in &schema.variables {
                for dim in &var.dims {
                    assert!(
                        schema.coordinates.contains(dim),
                        "{kind}: {} uses undeclared dim {dim}",
                        var.name
                    );
                }
            }
        }
    }

    #[test]
    fn test_dtype_classes() {
        assert!(DTypeClass::Complex.accepts(DType::Complex128));
        assert!(!DTypeClass::Complex.accepts(DType::Float64));
        assert!(DTypeClass::FlagLike.accepts(DType::Bool));
        assert!(DTypeClass::Floating.accepts(DType::Complex64));
        assert!(!DTypeClass::Text.accepts(DType::UInt8));
    }

    #[test]
    fn test_attr_kinds() {
        assert!(AttrKind::Number.accepts(&AttrValue::Int(3)));
        assert!(AttrKind::Number.accepts(&AttrValue::Float(3.0)));
        assert!(!AttrKind::Map.accepts(&AttrValue::String("x".into())));
    }

    #[test]
    fn test_visibility_lookup() {
        let schema = SchemaDescriptor::standard(ModelKind::Visibility);
        assert_eq!(schema.variable_spec("vis").unwrap().units.as_deref(), Some("Jy"));
        assert!(schema.relation_spec("configuration").unwrap().required);
        assert!(schema.attribute_spec("phasecentre").unwrap().required);
    }
}
