// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Common utilities for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use radiocodec::attrs;
use radiocodec::frames::{PolarisationFrame, ReceptorFrame};
use radiocodec::model::constructors::{
    configuration, direction, flag_table_for, gain_table, grid_data, image, sky_component,
    visibility, ConfigurationParams, GainTableParams, GridDataParams, ImageParams,
    SkyComponentParams, VisibilityParams,
};
use radiocodec::{ArrayData, Complex64, Model, SkyModel};

// ============================================================================
// Temporary Files
// ============================================================================

static NEXT_DIR: AtomicUsize = AtomicUsize::new(0);

/// Get a unique temporary directory for test files
pub fn temp_dir() -> PathBuf {
    let random = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .subsec_nanos();
    std::env::temp_dir().join(format!(
        "radiocodec_test_{}_{}_{}",
        std::process::id(),
        random,
        NEXT_DIR.fetch_add(1, Ordering::Relaxed)
    ))
}

/// Create a temporary file path with cleanup guard
pub fn temp_path(name: &str) -> (PathBuf, CleanupGuard) {
    let root = temp_dir();
    let dir = root.join(name.replace('.', "_"));
    fs::create_dir_all(&dir).ok();
    (dir.join(name), CleanupGuard(root))
}

/// Cleanup guard for test temporary files
pub struct CleanupGuard(PathBuf);

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

// ============================================================================
// Model Fixtures
// ============================================================================

pub fn config_fixture(nant: usize) -> Model {
    let mut params = ConfigurationParams::example(nant);
    params.stations = Some((0..nant).map(|i| format!("S{i:02}")).collect());
    configuration(&params).unwrap()
}

/// Visibility with non-trivial complex data.
pub fn visibility_fixture() -> Model {
    let config = config_fixture(3);
    let mut params = VisibilityParams::new(
        config,
        vec![4.5e9, 4.5e9 + 10.0],
        vec![1.0e8, 1.05e8, 1.1e8],
        PolarisationFrame::Linear,
    );
    // 2 times x 6 baselines x 3 channels x 4 pols
    let n = 2 * 6 * 3 * 4;
    let values: Vec<Complex64> = (0..n)
        .map(|i| Complex64::new(i as f64 * 0.5, -(i as f64) / 3.0))
        .collect();
    params.vis = Some(ArrayData::from_shape_vec(&[2, 6, 3, 4], values).unwrap());
    params.meta = Some(attrs! { "observer" => "test", "nested" => attrs! { "depth" => 2i64 } });
    visibility(params).unwrap()
}

pub fn image_fixture() -> Model {
    let (nchan, npol, ny, nx) = (2, 1, 4, 5);
    let pixels: Vec<f64> = (0..nchan * npol * ny * nx).map(|i| i as f64 * 0.25).collect();
    image(ImageParams {
        frequencies: vec![1.0e8, 1.1e8],
        polarisation_frame: PolarisationFrame::StokesI,
        ny,
        nx,
        cellsize: 0.001,
        phasecentre: (15.0, -45.0),
        pixels: Some(ArrayData::from_shape_vec(&[nchan, npol, ny, nx], pixels).unwrap()),
        clean_beam: Some(attrs! { "bmaj" => 0.1, "bmin" => 0.05, "bpa" => 30.0 }),
    })
    .unwrap()
}

pub fn grid_data_fixture() -> Model {
    grid_data(GridDataParams {
        frequencies: vec![1.0e8],
        polarisation_frame: PolarisationFrame::StokesIQUV,
        nv: 4,
        nu: 4,
        cellsize: 10.0,
        pixels: None,
    })
    .unwrap()
}

pub fn sky_component_fixture(name: &str) -> Model {
    sky_component(SkyComponentParams {
        name: name.to_string(),
        direction: direction(15.0, -45.0),
        frequencies: vec![1.0e8, 1.1e8],
        polarisation_frame: PolarisationFrame::StokesI,
        flux: vec![1.5, 1.25],
        shape: "Point".to_string(),
        params: None,
    })
    .unwrap()
}

pub fn gain_table_fixture() -> Model {
    gain_table(GainTableParams {
        times: vec![0.0, 30.0],
        interval: vec![30.0, 30.0],
        nants: 3,
        frequencies: vec![1.0e8],
        receptor_frame: ReceptorFrame::Linear,
        phasecentre: direction(15.0, -45.0),
        jones_type: "G".to_string(),
        gain: None,
        configuration: Some(config_fixture(3)),
    })
    .unwrap()
}

pub fn flag_table_fixture() -> Model {
    flag_table_for(&visibility_fixture()).unwrap()
}

/// One instance of every model kind.
pub fn all_kinds() -> Vec<Model> {
    vec![
        visibility_fixture(),
        image_fixture(),
        grid_data_fixture(),
        sky_component_fixture("src0"),
        config_fixture(4),
        gain_table_fixture(),
        flag_table_fixture(),
    ]
}

pub fn sky_model_fixture() -> SkyModel {
    SkyModel::new(
        vec![sky_component_fixture("a"), sky_component_fixture("b")],
        Some(image_fixture()),
        Some(gain_table_fixture()),
        None,
        true,
    )
    .unwrap()
}
