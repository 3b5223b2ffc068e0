// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core error types for radiocodec.
//!
//! Every failure the library can report falls in one of these categories:
//! - Model validation (shape, axis values, physical metadata)
//! - Registry lookups (frames, model kinds)
//! - Wire payload decoding
//! - Underlying I/O

use std::fmt;

/// Errors that can occur while building, encoding or decoding models.
#[derive(Debug, Clone)]
pub enum CodecError {
    /// A data variable's shape disagrees with its declared dimensions
    ShapeMismatch {
        /// Variable (or coordinate) being validated
        variable: String,
        /// What disagreed
        reason: String,
    },

    /// A coordinate value is outside its frame's domain
    InvalidAxisValue {
        /// Axis name
        axis: String,
        /// Offending value, rendered for display
        value: String,
        /// Why it was rejected
        reason: String,
    },

    /// A required attribute, variable, coordinate or relation is absent
    MissingMetadata {
        /// Where the metadata was expected (model kind, variable, ...)
        owner: String,
        /// Missing key
        key: String,
    },

    /// No frame descriptor registered for an axis name
    UnknownFrame {
        /// Axis name that was not found
        axis: String,
    },

    /// Model kind tag is absent, unrecognized or unregistered
    UnknownModelKind {
        /// The tag as found
        kind: String,
    },

    /// Wire payload is structurally invalid
    MalformedPayload {
        /// Codec or structure being decoded
        context: String,
        /// Error message
        message: String,
    },

    /// A user attribute uses a key reserved by the encoders
    ReservedKey {
        /// The reserved key
        key: String,
        /// Where it appeared
        owner: String,
    },

    /// Underlying read/write failure, surfaced unchanged
    IoFailure {
        /// `std::io::ErrorKind` of the original error
        kind: std::io::ErrorKind,
        /// Error message
        message: String,
    },
}

impl CodecError {
    /// Create a shape mismatch error.
    pub fn shape_mismatch(variable: impl Into<String>, reason: impl Into<String>) -> Self {
        CodecError::ShapeMismatch {
            variable: variable.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid axis value error.
    pub fn invalid_axis_value(
        axis: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        CodecError::InvalidAxisValue {
            axis: axis.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a missing metadata error.
    pub fn missing_metadata(owner: impl Into<String>, key: impl Into<String>) -> Self {
        CodecError::MissingMetadata {
            owner: owner.into(),
            key: key.into(),
        }
    }

    /// Create an unknown frame error.
    pub fn unknown_frame(axis: impl Into<String>) -> Self {
        CodecError::UnknownFrame { axis: axis.into() }
    }

    /// Create an unknown model kind error.
    pub fn unknown_model_kind(kind: impl Into<String>) -> Self {
        CodecError::UnknownModelKind { kind: kind.into() }
    }

    /// Create a malformed payload error.
    pub fn malformed(context: impl Into<String>, message: impl Into<String>) -> Self {
        CodecError::MalformedPayload {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Create a reserved key error.
    pub fn reserved_key(key: impl Into<String>, owner: impl Into<String>) -> Self {
        CodecError::ReservedKey {
            key: key.into(),
            owner: owner.into(),
        }
    }

    /// Stable category name, suitable for metrics labels and log filtering.
    pub fn category(&self) -> &'static str {
        match self {
            CodecError::ShapeMismatch { .. } => "ShapeMismatch",
            CodecError::InvalidAxisValue { .. } => "InvalidAxisValue",
            CodecError::MissingMetadata { .. } => "MissingMetadata",
            CodecError::UnknownFrame { .. } => "UnknownFrame",
            CodecError::UnknownModelKind { .. } => "UnknownModelKind",
            CodecError::MalformedPayload { .. } => "MalformedPayload",
            CodecError::ReservedKey { .. } => "ReservedKey",
            CodecError::IoFailure { .. } => "IOFailure",
        }
    }

    /// Get structured fields for logging.
    pub fn log_fields(&self) -> Vec<(&'static str, String)> {
        match self {
            CodecError::ShapeMismatch { variable, reason } => {
                vec![("variable", variable.clone()), ("reason", reason.clone())]
            }
            CodecError::InvalidAxisValue {
                axis,
                value,
                reason,
            } => vec![
                ("axis", axis.clone()),
                ("value", value.clone()),
                ("reason", reason.clone()),
            ],
            CodecError::MissingMetadata { owner, key } => {
                vec![("owner", owner.clone()), ("key", key.clone())]
            }
            CodecError::UnknownFrame { axis } => vec![("axis", axis.clone())],
            CodecError::UnknownModelKind { kind } => vec![("kind", kind.clone())],
            CodecError::MalformedPayload { context, message } => {
                vec![("context", context.clone()), ("message", message.clone())]
            }
            CodecError::ReservedKey { key, owner } => {
                vec![("key", key.clone()), ("owner", owner.clone())]
            }
            CodecError::IoFailure { kind, message } => {
                vec![("kind", format!("{kind:?}")), ("message", message.clone())]
            }
        }
    }
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::ShapeMismatch { variable, reason } => {
                write!(f, "Shape mismatch in '{variable}': {reason}")
            }
            CodecError::InvalidAxisValue {
                axis,
                value,
                reason,
            } => write!(f, "Invalid value {value} on axis '{axis}': {reason}"),
            CodecError::MissingMetadata { owner, key } => {
                write!(f, "Missing metadata '{key}' on {owner}")
            }
            CodecError::UnknownFrame { axis } => {
                write!(f, "No frame registered for axis '{axis}'")
            }
            CodecError::UnknownModelKind { kind } => {
                write!(f, "Unknown model kind: '{kind}'")
            }
            CodecError::MalformedPayload { context, message } => {
                write!(f, "Malformed payload in {context}: {message}")
            }
            CodecError::ReservedKey { key, owner } => {
                write!(f, "Attribute key '{key}' on {owner} is reserved")
            }
            CodecError::IoFailure { message, .. } => write!(f, "I/O failure: {message}"),
        }
    }
}

impl std::error::Error for CodecError {}

impl From<std::io::Error> for CodecError {
    fn from(err: std::io::Error) -> Self {
        CodecError::IoFailure {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Result type for radiocodec operations.
pub type Result<T> = std::result::Result<T, CodecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_mismatch() {
        let err = CodecError::shape_mismatch("vis", "axis 'time' has length 5, data has 3");
        assert!(matches!(err, CodecError::ShapeMismatch { .. }));
        assert_eq!(
            err.to_string(),
            "Shape mismatch in 'vis': axis 'time' has length 5, data has 3"
        );
        assert_eq!(err.category(), "ShapeMismatch");
    }

    #[test]
    fn test_invalid_axis_value() {
        let err = CodecError::invalid_axis_value("polarisation", "\"XYZZY\"", "not a label");
        assert_eq!(
            err.to_string(),
            "Invalid value \"XYZZY\" on axis 'polarisation': not a label"
        );
        let fields = err.log_fields();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0], ("axis", "polarisation".to_string()));
    }

    #[test]
    fn test_missing_metadata() {
        let err = CodecError::missing_metadata("Image", "wcs");
        assert_eq!(err.to_string(), "Missing metadata 'wcs' on Image");
    }

    #[test]
    fn test_unknown_kinds_and_frames() {
        assert_eq!(
            CodecError::unknown_model_kind("not_a_real_model").to_string(),
            "Unknown model kind: 'not_a_real_model'"
        );
        assert_eq!(
            CodecError::unknown_frame("zenith").to_string(),
            "No frame registered for axis 'zenith'"
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CodecError = io_err.into();
        match &err {
            CodecError::IoFailure { kind, message } => {
                assert_eq!(*kind, std::io::ErrorKind::NotFound);
                assert_eq!(message, "file not found");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(err.category(), "IOFailure");
    }

    #[test]
    fn test_log_fields_malformed() {
        let err = CodecError::malformed("compact", "missing 'kind'");
        let fields = err.log_fields();
        assert_eq!(fields[0].0, "context");
        assert_eq!(fields[0].1, "compact");
        assert_eq!(fields[1].1, "missing 'kind'");
    }

    #[test]
    fn test_reserved_key() {
        let err = CodecError::reserved_key("dims", "variable 'vis'");
        assert_eq!(
            err.to_string(),
            "Attribute key 'dims' on variable 'vis' is reserved"
        );
    }
}
