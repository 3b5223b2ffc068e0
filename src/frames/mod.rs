// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Coordinate frame registry.
//!
//! Canonical definitions of axis names, units and reference frames for time,
//! frequency, polarisation, spatial/pixel and baseline/antenna axes, plus the
//! vocabulary of polarisation and receptor frames.
//!
//! The registry is an explicitly constructed, immutable lookup table. The
//! process-wide standard instance is available through
//! [`FrameRegistry::standard`]; encoders and decoders take it by reference.
//!
//! ```
//! use radiocodec::frames::FrameRegistry;
//!
//! let frames = FrameRegistry::standard();
//! assert_eq!(frames.descriptor("frequency")?.units.as_deref(), Some("Hz"));
//! assert!(frames.validate_label("polarisation", "XX").is_ok());
//! assert!(frames.validate_label("polarisation", "XYZZY").is_err());
//! # Ok::<(), radiocodec::CodecError>(())
//! ```

pub mod polarisation;

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::core::{ArrayData, CodecError, Result};

pub use polarisation::{PolarisationFrame, ReceptorFrame, POLARISATION_LABELS, RECEPTOR_LABELS};

/// Ordering constraint on an axis' values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Monotonicity {
    /// No ordering constraint
    Any,
    /// Strictly increasing
    Increasing,
    /// Strictly increasing or strictly decreasing
    Strict,
}

/// Legal value domain of an axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AxisDomain {
    /// Real numeric values (integer or floating point)
    Numeric,
    /// Non-negative integer indices
    Index,
    /// Strings drawn from a fixed vocabulary, each at most once
    Labels(&'static [&'static str]),
    /// Free-form strings, each at most once
    Names,
}

/// Unit and reference-frame descriptor for one axis name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisDescriptor {
    /// Axis name as used in coordinates and `dims` lists
    pub name: String,
    /// Physical unit; `None` for dimensionless axes
    pub units: Option<String>,
    /// Reference frame identifier
    pub frame: String,
    /// Legal values
    pub domain: AxisDomain,
    /// Ordering constraint
    pub monotonic: Monotonicity,
}

impl AxisDescriptor {
    /// Create a descriptor.
    pub fn new(
        name: impl Into<String>,
        units: Option<&str>,
        frame: impl Into<String>,
        domain: AxisDomain,
        monotonic: Monotonicity,
    ) -> Self {
        Self {
            name: name.into(),
            units: units.map(str::to_string),
            frame: frame.into(),
            domain,
            monotonic,
        }
    }

    /// Whether coordinates on this axis must carry a `units` attribute.
    pub fn is_dimensioned(&self) -> bool {
        self.units.is_some()
    }
}

/// Immutable lookup table from axis name to [`AxisDescriptor`].
#[derive(Debug, Clone, Default)]
pub struct FrameRegistry {
    axes: HashMap<String, AxisDescriptor>,
}

static STANDARD_FRAMES: OnceLock<FrameRegistry> = OnceLock::new();

impl FrameRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a descriptor, replacing any previous one for the same axis.
    pub fn with_axis(mut self, descriptor: AxisDescriptor) -> Self {
        self.axes.insert(descriptor.name.clone(), descriptor);
        self
    }

    /// The axes used by the built-in model kinds.
    pub fn with_standard_axes() -> Self {
        use AxisDomain::*;
        use Monotonicity::*;

        Self::new()
            .with_axis(AxisDescriptor::new("time", Some("s"), "utc", Numeric, Increasing))
            .with_axis(AxisDescriptor::new("frequency", Some("Hz"), "spectral", Numeric, Strict))
            .with_axis(AxisDescriptor::new(
                "polarisation",
                None,
                "polarisation",
                Labels(POLARISATION_LABELS),
                Any,
            ))
            .with_axis(AxisDescriptor::new(
                "receptor1",
                None,
                "receptor",
                Labels(RECEPTOR_LABELS),
                Any,
            ))
            .with_axis(AxisDescriptor::new(
                "receptor2",
                None,
                "receptor",
                Labels(RECEPTOR_LABELS),
                Any,
            ))
            .with_axis(AxisDescriptor::new("baselines", None, "baseline", Index, Increasing))
            .with_axis(AxisDescriptor::new("antenna", None, "antenna", Index, Increasing))
            .with_axis(AxisDescriptor::new("id", None, "antenna", Index, Increasing))
            .with_axis(AxisDescriptor::new("spatial", None, "cartesian", Names, Any))
            .with_axis(AxisDescriptor::new("x", Some("deg"), "icrs", Numeric, Strict))
            .with_axis(AxisDescriptor::new("y", Some("deg"), "icrs", Numeric, Strict))
            .with_axis(AxisDescriptor::new("u", Some("lambda"), "uv", Numeric, Strict))
            .with_axis(AxisDescriptor::new("v", Some("lambda"), "uv", Numeric, Strict))
    }

    /// The shared, process-wide standard registry.
    pub fn standard() -> &'static FrameRegistry {
        STANDARD_FRAMES.get_or_init(Self::with_standard_axes)
    }

    /// Look up the descriptor for an axis, failing with `UnknownFrame`.
    pub fn descriptor(&self, axis: &str) -> Result<&AxisDescriptor> {
        self.axes
            .get(axis)
            .ok_or_else(|| CodecError::unknown_frame(axis))
    }

    pub fn contains(&self, axis: &str) -> bool {
        self.axes.contains_key(axis)
    }

    /// Registered axis names, sorted.
    pub fn axis_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.axes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Check that a single label is a legal member of an axis' domain.
    pub fn validate_label(&self, axis: &str, value: &str) -> Result<()> {
        let descriptor = self.descriptor(axis)?;
        match &descriptor.domain {
            AxisDomain::Labels(vocab) if !vocab.contains(&value) => {
                Err(CodecError::invalid_axis_value(
                    axis,
                    format!("{value:?}"),
                    format!("not one of {vocab:?}"),
                ))
            }
            AxisDomain::Labels(_) | AxisDomain::Names => Ok(()),
            AxisDomain::Numeric | AxisDomain::Index => Err(CodecError::invalid_axis_value(
                axis,
                format!("{value:?}"),
                "axis takes numeric values",
            )),
        }
    }

    /// Validate a full coordinate array against its axis descriptor.
    ///
    /// Checks that values are one-dimensional, non-empty, of a dtype the domain
    /// accepts, drawn from the vocabulary, and ordered as required.
    pub fn validate_coordinate(&self, axis: &str, values: &ArrayData) -> Result<()> {
        let descriptor = self.descriptor(axis)?;
        if values.ndim() != 1 {
            return Err(CodecError::shape_mismatch(
                axis,
                format!("coordinate must be 1-D, got shape {:?}", values.shape()),
            ));
        }
        if values.is_empty() {
            return Err(CodecError::invalid_axis_value(axis, "[]", "coordinate is empty"));
        }

        match &descriptor.domain {
            AxisDomain::Labels(_) | AxisDomain::Names => {
                let labels = values.as_strs().ok_or_else(|| {
                    CodecError::invalid_axis_value(
                        axis,
                        values.dtype().as_str(),
                        "axis takes string labels",
                    )
                })?;
                for (i, label) in labels.iter().enumerate() {
                    self.validate_label(axis, label)?;
                    if labels[..i].contains(label) {
                        return Err(CodecError::invalid_axis_value(
                            axis,
                            format!("{label:?}"),
                            "label appears more than once",
                        ));
                    }
                }
            }
            AxisDomain::Index => {
                let indices = values.to_i128_vec().ok_or_else(|| {
                    CodecError::invalid_axis_value(
                        axis,
                        values.dtype().as_str(),
                        "axis takes integer indices",
                    )
                })?;
                if let Some(i) = indices.iter().position(|&v| v < 0) {
                    return Err(CodecError::invalid_axis_value(
                        axis,
                        values.element_repr(i),
                        "index is negative",
                    ));
                }
                check_order(axis, values, &to_f64(&indices), descriptor.monotonic)?;
            }
            AxisDomain::Numeric => {
                let numbers = values.to_f64_vec().ok_or_else(|| {
                    CodecError::invalid_axis_value(
                        axis,
                        values.dtype().as_str(),
                        "axis takes real numeric values",
                    )
                })?;
                if let Some(i) = numbers.iter().position(|v| v.is_nan()) {
                    return Err(CodecError::invalid_axis_value(
                        axis,
                        values.element_repr(i),
                        "coordinate value is NaN",
                    ));
                }
                check_order(axis, values, &numbers, descriptor.monotonic)?;
            }
        }
        Ok(())
    }
}

fn to_f64(values: &[i128]) -> Vec<f64> {
    values.iter().map(|&v| v as f64).collect()
}

fn check_order(axis: &str, values: &ArrayData, numbers: &[f64], rule: Monotonicity) -> Result<()> {
    let increasing = numbers.windows(2).all(|w| w[0] < w[1]);
    let ok = match rule {
        Monotonicity::Any => true,
        Monotonicity::Increasing => increasing,
        Monotonicity::Strict => increasing || numbers.windows(2).all(|w| w[0] > w[1]),
    };
    if ok {
        return Ok(());
    }
    let at = numbers
        .windows(2)
        .position(|w| w[0] >= w[1])
        .or_else(|| numbers.windows(2).position(|w| w[0] <= w[1]))
        .map(|i| i + 1)
        .unwrap_or(0);
    Err(CodecError::invalid_axis_value(
        axis,
        values.element_repr(at),
        match rule {
            Monotonicity::Increasing => "values must be strictly increasing",
            _ => "values must be strictly monotonic",
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_descriptors() {
        let frames = FrameRegistry::standard();
        let time = frames.descriptor("time").unwrap();
        assert_eq!(time.units.as_deref(), Some("s"));
        assert_eq!(time.frame, "utc");
        assert!(time.is_dimensioned());
        assert!(!frames.descriptor("polarisation").unwrap().is_dimensioned());
    }

    #[test]
    fn test_unknown_frame() {
        let err = FrameRegistry::standard().descriptor("zenith_angle").unwrap_err();
        assert!(matches!(err, CodecError::UnknownFrame { .. }));
    }

    #[test]
    fn test_polarisation_vocabulary() {
        let frames = FrameRegistry::standard();
        let ok = ArrayData::strings(&["XX", "XY", "YX", "YY"]);
        assert!(frames.validate_coordinate("polarisation", &ok).is_ok());

        let bad = ArrayData::strings(&["XX", "XYZZY"]);
        let err = frames.validate_coordinate("polarisation", &bad).unwrap_err();
        assert!(matches!(err, CodecError::InvalidAxisValue { .. }));

        let dup = ArrayData::strings(&["I", "I"]);
        assert!(frames.validate_coordinate("polarisation", &dup).is_err());
    }

    #[test]
    fn test_monotonic_time_and_frequency() {
        let frames = FrameRegistry::standard();
        let times = ArrayData::vector(vec![1.0f64, 2.0, 2.0]);
        assert!(frames.validate_coordinate("time", &times).is_err());

        let descending = ArrayData::vector(vec![1.4e8f64, 1.3e8, 1.2e8]);
        assert!(frames.validate_coordinate("frequency", &descending).is_ok());
        assert!(frames.validate_coordinate("time", &descending).is_err());

        let zigzag = ArrayData::vector(vec![1.0f64, 3.0, 2.0]);
        assert!(frames.validate_coordinate("frequency", &zigzag).is_err());
    }

    #[test]
    fn test_empty_and_wrong_dtype() {
        let frames = FrameRegistry::standard();
        let empty = ArrayData::vector(Vec::<f64>::new());
        assert!(frames.validate_coordinate("time", &empty).is_err());
        let labels = ArrayData::strings(&["a"]);
        assert!(frames.validate_coordinate("frequency", &labels).is_err());
        let negative = ArrayData::vector(vec![-1i64, 0, 1]);
        assert!(frames.validate_coordinate("antenna", &negative).is_err());
    }

    #[test]
    fn test_custom_registry() {
        let frames = FrameRegistry::new().with_axis(AxisDescriptor::new(
            "lag",
            Some("s"),
            "delay",
            AxisDomain::Numeric,
            Monotonicity::Any,
        ));
        assert!(frames.contains("lag"));
        assert!(!frames.contains("time"));
        assert_eq!(frames.axis_names(), vec!["lag"]);
    }
}
