// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Radio-astronomy data models.
//!
//! A [`Model`] is a kind tag plus named coordinates, named data variables
//! over those coordinates, a free-form attribute tree and optional related
//! models. Instances only come out of [`ModelRegistry::build`] (or the typed
//! constructors in [`constructors`]), so every `Model` in hand satisfies its
//! kind's schema:
//!
//! - every variable dimension names a declared coordinate
//! - every variable's extent along a dimension equals that coordinate's length
//! - coordinate values lie in their frame's domain
//! - required physical metadata (units, frames) is present
//!
//! ```
//! use radiocodec::model::constructors::{configuration, ConfigurationParams};
//!
//! let config = configuration(&ConfigurationParams::example(4))?;
//! assert_eq!(config.shape_of("xyz"), Some(&[4usize, 3][..]));
//! # Ok::<(), radiocodec::CodecError>(())
//! ```

pub mod constructors;
pub mod registry;
pub mod schema;
pub mod sky;

use std::collections::BTreeMap;
use std::fmt;

use crate::core::{ArrayData, AttrValue, Attributes, DType, ModelKind, Result};
use crate::frames::{PolarisationFrame, ReceptorFrame};

pub use registry::ModelRegistry;
pub use schema::{
    AttrKind, AttributeSpec, CrossCheck, DTypeClass, RelationSpec, SchemaDescriptor, VariableSpec,
    FRAME_ATTR, POLARISATION_FRAME_ATTR, RECEPTOR_FRAME_ATTR, RESERVED_VARIABLE_KEYS, UNITS_ATTR,
};
pub use sky::SkyModel;

/// A named one-dimensional axis with its values and attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Coordinate {
    name: String,
    values: ArrayData,
    attrs: Attributes,
}

impl Coordinate {
    pub fn new(name: impl Into<String>, values: ArrayData) -> Self {
        Self {
            name: name.into(),
            values,
            attrs: Attributes::new(),
        }
    }

    /// Set the `units` attribute.
    pub fn with_units(self, units: &str) -> Self {
        self.with_attr(UNITS_ATTR, units)
    }

    pub fn with_attr(mut self, key: &str, value: impl Into<AttrValue>) -> Self {
        self.attrs.insert(key.to_string(), value.into());
        self
    }

    pub fn with_attrs(mut self, attrs: Attributes) -> Self {
        self.attrs.extend(attrs);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &ArrayData {
        &self.values
    }

    pub fn attrs(&self) -> &Attributes {
        &self.attrs
    }

    pub fn units(&self) -> Option<&str> {
        self.attrs.get(UNITS_ATTR).and_then(AttrValue::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// String labels, for label-valued axes.
    pub fn labels(&self) -> Option<Vec<&str>> {
        self.values.as_strs()
    }
}

/// A named N-dimensional array whose axes are named coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct DataVariable {
    name: String,
    dims: Vec<String>,
    data: ArrayData,
    attrs: Attributes,
}

impl DataVariable {
    pub fn new(name: impl Into<String>, dims: &[&str], data: ArrayData) -> Self {
        Self {
            name: name.into(),
            dims: dims.iter().map(|d| d.to_string()).collect(),
            data,
            attrs: Attributes::new(),
        }
    }

    pub fn from_parts(name: String, dims: Vec<String>, data: ArrayData, attrs: Attributes) -> Self {
        Self {
            name,
            dims,
            data,
            attrs,
        }
    }

    pub fn with_units(self, units: &str) -> Self {
        self.with_attr(UNITS_ATTR, units)
    }

    pub fn with_attr(mut self, key: &str, value: impl Into<AttrValue>) -> Self {
        self.attrs.insert(key.to_string(), value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ordered dimension names.
    pub fn dims(&self) -> &[String] {
        &self.dims
    }

    pub fn data(&self) -> &ArrayData {
        &self.data
    }

    pub fn dtype(&self) -> DType {
        self.data.dtype()
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn attrs(&self) -> &Attributes {
        &self.attrs
    }

    pub fn units(&self) -> Option<&str> {
        self.attrs.get(UNITS_ATTR).and_then(AttrValue::as_str)
    }
}

/// Unvalidated model contents.
///
/// Decoders and constructors assemble a `ModelParts` and hand it to
/// [`ModelRegistry::build`], which either returns a complete [`Model`] or an
/// error; nothing is partially applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelParts {
    pub kind: ModelKind,
    /// Coordinates in canonical dimension order
    pub coordinates: Vec<Coordinate>,
    pub variables: Vec<DataVariable>,
    pub attributes: Attributes,
    pub related: BTreeMap<String, Model>,
}

impl ModelParts {
    pub fn new(kind: ModelKind) -> Self {
        Self {
            kind,
            coordinates: Vec::new(),
            variables: Vec::new(),
            attributes: Attributes::new(),
            related: BTreeMap::new(),
        }
    }

    pub fn coordinate(mut self, coordinate: Coordinate) -> Self {
        self.coordinates.push(coordinate);
        self
    }

    pub fn variable(mut self, variable: DataVariable) -> Self {
        self.variables.push(variable);
        self
    }

    pub fn attribute(mut self, key: &str, value: impl Into<AttrValue>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    pub fn attributes(mut self, attrs: Attributes) -> Self {
        self.attributes.extend(attrs);
        self
    }

    pub fn related(mut self, name: &str, model: Model) -> Self {
        self.related.insert(name.to_string(), model);
        self
    }

    /// Validate against the standard registry.
    pub fn build(self) -> Result<Model> {
        ModelRegistry::standard().build(self)
    }
}

/// Float tolerance used by model equality.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    pub rtol: f64,
    pub atol: f64,
}

impl Tolerance {
    /// Bit-exact comparison (NaN still equals NaN).
    pub const EXACT: Tolerance = Tolerance { rtol: 0.0, atol: 0.0 };
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            rtol: 1e-12,
            atol: 1e-15,
        }
    }
}

/// A validated data model instance.
#[derive(Debug, Clone)]
pub struct Model {
    kind: ModelKind,
    coordinates: Vec<Coordinate>,
    variables: Vec<DataVariable>,
    attributes: Attributes,
    related: BTreeMap<String, Model>,
}

impl Model {
    /// Only the registry creates models, after validation.
    pub(crate) fn from_validated(parts: ModelParts) -> Self {
        Self {
            kind: parts.kind,
            coordinates: parts.coordinates,
            variables: parts.variables,
            attributes: parts.attributes,
            related: parts.related,
        }
    }

    /// Build and validate a model against the standard registry.
    pub fn build(
        kind: ModelKind,
        coordinates: Vec<Coordinate>,
        variables: Vec<DataVariable>,
        attributes: Attributes,
    ) -> Result<Model> {
        ModelRegistry::standard().build(ModelParts {
            kind,
            coordinates,
            variables,
            attributes,
            related: BTreeMap::new(),
        })
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    /// Coordinates in canonical dimension order.
    pub fn coordinates(&self) -> &[Coordinate] {
        &self.coordinates
    }

    pub fn coordinate(&self, name: &str) -> Option<&Coordinate> {
        self.coordinates.iter().find(|c| c.name == name)
    }

    pub fn variables(&self) -> &[DataVariable] {
        &self.variables
    }

    pub fn variable(&self, name: &str) -> Option<&DataVariable> {
        self.variables.iter().find(|v| v.name == name)
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Look up an attribute, descending into nested maps with `/`.
    ///
    /// Follows the same rules as [`AttrValue::get_path`]; the empty path
    /// names no attribute.
    pub fn attribute(&self, path: &str) -> Option<&AttrValue> {
        crate::core::lookup_path(&self.attributes, path)
    }

    pub fn related(&self, name: &str) -> Option<&Model> {
        self.related.get(name)
    }

    pub fn related_models(&self) -> &BTreeMap<String, Model> {
        &self.related
    }

    /// Coordinate names in canonical order.
    pub fn dims_order(&self) -> Vec<&str> {
        self.coordinates.iter().map(|c| c.name.as_str()).collect()
    }

    /// Shape of a data variable.
    pub fn shape_of(&self, variable: &str) -> Option<&[usize]> {
        self.variable(variable).map(DataVariable::shape)
    }

    fn axis_len(&self, axis: &str) -> Option<usize> {
        self.coordinate(axis).map(Coordinate::len)
    }

    /// Number of frequency channels.
    pub fn nchan(&self) -> Option<usize> {
        self.axis_len("frequency")
    }

    /// Number of polarisations.
    pub fn npol(&self) -> Option<usize> {
        self.axis_len("polarisation")
    }

    pub fn ntimes(&self) -> Option<usize> {
        self.axis_len("time")
    }

    pub fn nbaselines(&self) -> Option<usize> {
        self.axis_len("baselines")
    }

    /// Number of receptors per antenna.
    pub fn nrec(&self) -> Option<usize> {
        self.axis_len("receptor1")
    }

    /// Number of antennas.
    ///
    /// A `Configuration` counts its `id` axis. Other kinds use their
    /// `antenna` axis, then fall back to the embedded configuration.
    pub fn nants(&self) -> Option<usize> {
        match self.kind {
            ModelKind::Configuration => self.axis_len("id"),
            _ => self
                .axis_len("antenna")
                .or_else(|| self.related("configuration")?.nants()),
        }
    }

    /// The polarisation frame named by `_polarisation_frame`, if any.
    pub fn polarisation_frame(&self) -> Option<PolarisationFrame> {
        self.attributes
            .get(POLARISATION_FRAME_ATTR)
            .and_then(AttrValue::as_str)
            .and_then(|name| PolarisationFrame::from_name(name).ok())
    }

    /// The receptor frame named by `receptor_frame`, if any.
    pub fn receptor_frame(&self) -> Option<ReceptorFrame> {
        self.attributes
            .get(RECEPTOR_FRAME_ATTR)
            .and_then(AttrValue::as_str)
            .and_then(|name| ReceptorFrame::from_name(name).ok())
    }

    /// Replace (or add) a data variable, re-validating the whole model.
    ///
    /// On error the model is left unchanged.
    pub fn replace_variable(&mut self, variable: DataVariable) -> Result<()> {
        ModelRegistry::standard().replace_variable(self, variable)
    }

    /// Give back the unvalidated parts, e.g. to edit and rebuild.
    pub fn into_parts(self) -> ModelParts {
        ModelParts {
            kind: self.kind,
            coordinates: self.coordinates,
            variables: self.variables,
            attributes: self.attributes,
            related: self.related,
        }
    }

    /// Copy of the parts.
    pub fn to_parts(&self) -> ModelParts {
        self.clone().into_parts()
    }

    /// Whether two models are equivalent within a float tolerance.
    pub fn equivalent(&self, other: &Model, tol: Tolerance) -> bool {
        self.first_difference(other, tol).is_none()
    }

    /// Describe the first difference between two models, if any.
    ///
    /// Coordinate order is significant; variable order is not. Coordinate
    /// values and attributes compare exactly; variable data compares within
    /// `tol`.
    pub fn first_difference(&self, other: &Model, tol: Tolerance) -> Option<String> {
        if self.kind != other.kind {
            return Some(format!("kind {} != {}", self.kind, other.kind));
        }
        if self.dims_order() != other.dims_order() {
            return Some(format!(
                "dims_order {:?} != {:?}",
                self.dims_order(),
                other.dims_order()
            ));
        }
        for (a, b) in self.coordinates.iter().zip(&other.coordinates) {
            if !a.values.exact_eq(&b.values) {
                return Some(format!("coordinate '{}' values differ", a.name));
            }
            if a.attrs != b.attrs {
                return Some(format!("coordinate '{}' attributes differ", a.name));
            }
        }

        if self.variables.len() != other.variables.len() {
            return Some(format!(
                "{} variables != {}",
                self.variables.len(),
                other.variables.len()
            ));
        }
        for a in &self.variables {
            let Some(b) = other.variable(&a.name) else {
                return Some(format!("variable '{}' missing", a.name));
            };
            if a.dims != b.dims {
                return Some(format!("variable '{}' dims {:?} != {:?}", a.name, a.dims, b.dims));
            }
            if a.dtype() != b.dtype() {
                return Some(format!("variable '{}' dtype {} != {}", a.name, a.dtype(), b.dtype()));
            }
            if !a.data.approx_eq(&b.data, tol.rtol, tol.atol) {
                return Some(format!("variable '{}' data differs", a.name));
            }
            if a.attrs != b.attrs {
                return Some(format!("variable '{}' attributes differ", a.name));
            }
        }

        if self.attributes != other.attributes {
            return Some("model attributes differ".to_string());
        }

        if self.related.keys().ne(other.related.keys()) {
            return Some(format!(
                "related models {:?} != {:?}",
                self.related.keys().collect::<Vec<_>>(),
                other.related.keys().collect::<Vec<_>>()
            ));
        }
        self.related.iter().find_map(|(name, a)| {
            other
                .related
                .get(name)
                .and_then(|b| a.first_difference(b, tol))
                .map(|diff| format!("related '{name}': {diff}"))
        })
    }
}

impl PartialEq for Model {
    /// Equivalence under the default tolerance.
    fn eq(&self, other: &Self) -> bool {
        self.equivalent(other, Tolerance::default())
    }
}

impl Model {
    fn text_attr(&self, path: &str) -> &str {
        self.attribute(path).and_then(AttrValue::as_str).unwrap_or("")
    }

    fn fmt_sky_component(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let npol = self.npol().unwrap_or(1).max(1);
        let flux = self
            .variable("flux")
            .and_then(|v| v.data().to_f64_vec())
            .unwrap_or_default();
        let flux: Vec<&[f64]> = flux.chunks(npol).collect();
        let frequency = self
            .coordinate("frequency")
            .and_then(|c| c.values().to_f64_vec())
            .unwrap_or_default();
        let angle = |key: &str| {
            self.attribute(&format!("direction/{key}"))
                .and_then(AttrValue::as_f64)
                .unwrap_or(f64::NAN)
        };
        let params = self
            .attribute("params")
            .map_or_else(|| serde_json::Value::Object(Default::default()), AttrValue::to_json);

        writeln!(f, "SkyComponent:")?;
        writeln!(f, "\tName: {}", self.text_attr("name"))?;
        writeln!(f, "\tFlux: {flux:?}")?;
        writeln!(f, "\tFrequency: {frequency:?}")?;
        writeln!(f, "\tDirection: ({:?}, {:?})", angle("ra"), angle("dec"))?;
        writeln!(f, "\tShape: {}", self.text_attr("shape"))?;
        writeln!(f, "\tParams: {params}")?;
        writeln!(
            f,
            "\tPolarisation frame: {}",
            self.polarisation_frame().map_or("", |p| p.name())
        )
    }
}

/// Multi-line summary: kind, axis lengths, variables and frames.
impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.kind == ModelKind::SkyComponent {
            return self.fmt_sky_component(f);
        }
        writeln!(f, "{}:", self.kind)?;
        let dims: Vec<String> = self
            .coordinates
            .iter()
            .map(|c| format!("{}={}", c.name, c.len()))
            .collect();
        writeln!(f, "\tDimensions: {}", dims.join(", "))?;
        for var in &self.variables {
            writeln!(f, "\tVariable: {} {} ({})", var.name, var.dtype(), var.dims.join(", "))?;
        }
        if let Some(frame) = self.polarisation_frame() {
            writeln!(f, "\tPolarisation frame: {}", frame.name())?;
        }
        if let Some(frame) = self.receptor_frame() {
            writeln!(f, "\tReceptor frame: {}", frame.name())?;
        }
        for name in self.related.keys() {
            writeln!(f, "\tRelated: {name}")?;
        }
        Ok(())
    }
}
