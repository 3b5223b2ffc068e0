// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Sky model composite: a set of sky components plus an optional image,
//! gain table and mask.

use std::fmt;

use crate::core::{CodecError, ModelKind, Result};

use super::{Model, Tolerance};

/// Group/kind tag used for sky models on the wire.
pub const SKY_MODEL_TAG: &str = "SkyModel";

/// Attribute counting the components of a sky model.
pub const NUMBER_SKYCOMPONENTS_ATTR: &str = "number_skycomponents";

#[derive(Debug, Clone, PartialEq)]
pub struct SkyModel {
    components: Vec<Model>,
    image: Option<Model>,
    gaintable: Option<Model>,
    mask: Option<Model>,
    fixed: bool,
}

fn expect_kind(slot: &str, model: Option<&Model>, kind: ModelKind) -> Result<()> {
    match model {
        Some(m) if m.kind() != kind => Err(CodecError::malformed(
            "skymodel",
            format!("{slot} must be a {kind}, got {}", m.kind()),
        )),
        _ => Ok(()),
    }
}

impl SkyModel {
    /// Assemble a sky model, checking the kind of every part.
    pub fn new(
        components: Vec<Model>,
        image: Option<Model>,
        gaintable: Option<Model>,
        mask: Option<Model>,
        fixed: bool,
    ) -> Result<Self> {
        for (i, component) in components.iter().enumerate() {
            expect_kind(&format!("component {i}"), Some(component), ModelKind::SkyComponent)?;
        }
        expect_kind("image", image.as_ref(), ModelKind::Image)?;
        expect_kind("gaintable", gaintable.as_ref(), ModelKind::GainTable)?;
        expect_kind("mask", mask.as_ref(), ModelKind::Image)?;
        Ok(Self {
            components,
            image,
            gaintable,
            mask,
            fixed,
        })
    }

    pub fn components(&self) -> &[Model] {
        &self.components
    }

    pub fn image(&self) -> Option<&Model> {
        self.image.as_ref()
    }

    pub fn gaintable(&self) -> Option<&Model> {
        self.gaintable.as_ref()
    }

    pub fn mask(&self) -> Option<&Model> {
        self.mask.as_ref()
    }

    /// Whether the model is held fixed during calibration.
    pub fn is_fixed(&self) -> bool {
        self.fixed
    }

    pub fn equivalent(&self, other: &SkyModel, tol: Tolerance) -> bool {
        let same = |a: Option<&Model>, b: Option<&Model>| match (a, b) {
            (Some(a), Some(b)) => a.equivalent(b, tol),
            (None, None) => true,
            _ => false,
        };
        self.fixed == other.fixed
            && self.components.len() == other.components.len()
            && self
                .components
                .iter()
                .zip(&other.components)
                .all(|(a, b)| a.equivalent(b, tol))
            && same(self.image(), other.image())
            && same(self.gaintable(), other.gaintable())
            && same(self.mask(), other.mask())
    }
}

impl fmt::Display for SkyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "SkyModel: fixed: {}", self.fixed)?;
        for component in &self.components {
            write!(f, "{component}")?;
        }
        let parts = [
            ("image", self.image()),
            ("mask", self.mask()),
            ("gaintable", self.gaintable()),
        ];
        for (slot, model) in parts {
            match model {
                Some(model) => write!(f, "{slot}: {model}")?,
                None => writeln!(f, "{slot}: None")?,
            }
        }
        Ok(())
    }
}
