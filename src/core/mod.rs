// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core types used throughout radiocodec.
//!
//! This module provides the foundational types for the library:
//! - [`CodecError`] - Error taxonomy shared by every component
//! - [`ArrayData`] / [`DType`] - Dense N-dimensional arrays
//! - [`AttrValue`] - Recursive attribute values
//! - [`ModelKind`] - The closed set of data model kinds

pub mod array;
pub mod error;
pub mod kind;
pub mod value;

pub use array::{num_elements, ArrayData, Complex32, Complex64, DType, Element};
pub use error::{CodecError, Result};
pub use kind::ModelKind;
pub use value::{lookup_path, AttrValue, Attributes};
