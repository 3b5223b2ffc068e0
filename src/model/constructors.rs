// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Typed constructors for each model kind.
//!
//! Each constructor assembles coordinates, variables and attributes from a
//! parameter struct, fills defaults for bulk data that was not supplied, and
//! validates through the standard registry.

use crate::attrs;
use crate::core::{ArrayData, AttrValue, Attributes, Complex64, ModelKind, Result};
use crate::frames::{PolarisationFrame, ReceptorFrame};

use super::schema::{POLARISATION_FRAME_ATTR, RECEPTOR_FRAME_ATTR};
use super::{Coordinate, DataVariable, Model, ModelParts};

/// Antenna index pairs `(antenna1, antenna2)` for `nant` antennas, with
/// autocorrelations, ordered `(0,0), (0,1), .., (1,1), ..`.
pub fn generate_baselines(nant: usize) -> (Vec<i64>, Vec<i64>) {
    let mut ant1 = Vec::with_capacity(nant * (nant + 1) / 2);
    let mut ant2 = Vec::with_capacity(nant * (nant + 1) / 2);
    for a1 in 0..nant as i64 {
        for a2 in a1..nant as i64 {
            ant1.push(a1);
            ant2.push(a2);
        }
    }
    (ant1, ant2)
}

/// Sky direction `{ra, dec, frame}` in degrees.
pub fn direction(ra_deg: f64, dec_deg: f64) -> Attributes {
    attrs! { "ra" => ra_deg, "dec" => dec_deg, "frame" => "icrs", "units" => "deg" }
}

fn index_coordinate(name: &str, len: usize) -> Coordinate {
    Coordinate::new(name, ArrayData::vector((0..len as i64).collect::<Vec<_>>()))
}

fn spatial_coordinate() -> Coordinate {
    Coordinate::new("spatial", ArrayData::strings(&["x", "y", "z"]))
}

fn labels_coordinate(name: &str, labels: &[&str]) -> Coordinate {
    Coordinate::new(name, ArrayData::strings(labels))
}

fn filled<T: crate::core::Element>(shape: &[usize], value: T) -> Result<ArrayData> {
    ArrayData::from_shape_vec(shape, vec![value; shape.iter().product()])
}

/// Parameters of an antenna [`configuration`].
#[derive(Debug, Clone)]
pub struct ConfigurationParams {
    pub name: String,
    /// Array reference position (geocentric, metres)
    pub location: Attributes,
    pub names: Vec<String>,
    pub xyz: Vec<[f64; 3]>,
    pub diameter: Vec<f64>,
    pub mount: Vec<String>,
    pub receptor_frame: ReceptorFrame,
    pub frame: Option<String>,
    pub offset: Option<Vec<[f64; 3]>>,
    pub stations: Option<Vec<String>>,
    pub vp_type: Option<Vec<String>>,
}

impl ConfigurationParams {
    /// A small synthetic east-west array of 25 m dishes spaced 100 m apart.
    pub fn example(nant: usize) -> Self {
        Self {
            name: "EXAMPLE".to_string(),
            location: attrs! { "x" => 5109237.71, "y" => 2006795.66, "z" => -3239109.12, "units" => "m" },
            names: (0..nant).map(|i| format!("ANT{i}")).collect(),
            xyz: (0..nant).map(|i| [100.0 * i as f64, 0.0, 0.0]).collect(),
            diameter: vec![25.0; nant],
            mount: vec!["altaz".to_string(); nant],
            receptor_frame: ReceptorFrame::Linear,
            frame: Some("ITRF".to_string()),
            offset: None,
            stations: None,
            vp_type: None,
        }
    }
}

fn xyz_array(rows: &[[f64; 3]]) -> Result<ArrayData> {
    ArrayData::from_shape_vec(&[rows.len(), 3], rows.iter().flatten().copied().collect())
}

/// Build a `Configuration` model.
pub fn configuration(params: &ConfigurationParams) -> Result<Model> {
    let nant = params.names.len();
    let mut parts = ModelParts::new(ModelKind::Configuration)
        .coordinate(index_coordinate("id", nant))
        .coordinate(spatial_coordinate())
        .variable(DataVariable::new("names", &["id"], ArrayData::strings(&params.names)))
        .variable(DataVariable::new("xyz", &["id", "spatial"], xyz_array(&params.xyz)?).with_units("m"))
        .variable(
            DataVariable::new("diameter", &["id"], ArrayData::vector(params.diameter.clone()))
                .with_units("m"),
        )
        .variable(DataVariable::new("mount", &["id"], ArrayData::strings(&params.mount)))
        .attribute("name", params.name.as_str())
        .attribute("location", params.location.clone())
        .attribute(RECEPTOR_FRAME_ATTR, params.receptor_frame.name());

    if let Some(frame) = &params.frame {
        parts = parts.attribute("frame", frame.as_str());
    }
    if let Some(offset) = &params.offset {
        parts = parts.variable(
            DataVariable::new("offset", &["id", "spatial"], xyz_array(offset)?).with_units("m"),
        );
    }
    if let Some(stations) = &params.stations {
        parts = parts.variable(DataVariable::new("stations", &["id"], ArrayData::strings(stations)));
    }
    if let Some(vp_type) = &params.vp_type {
        parts = parts.variable(DataVariable::new("vp_type", &["id"], ArrayData::strings(vp_type)));
    }
    parts.build()
}

/// Parameters of a [`visibility`] model.
///
/// Baselines come from the configuration via [`generate_baselines`]. Bulk
/// arrays left as `None` default to zero visibilities, unit weights, no
/// flags and zero `uvw`.
#[derive(Debug, Clone)]
pub struct VisibilityParams {
    pub configuration: Model,
    pub times: Vec<f64>,
    pub integration_time: Vec<f64>,
    pub frequencies: Vec<f64>,
    pub channel_bandwidth: Vec<f64>,
    pub polarisation_frame: PolarisationFrame,
    /// Direction of the phase centre, see [`direction`]
    pub phasecentre: Attributes,
    pub source: String,
    pub vis: Option<ArrayData>,
    pub weight: Option<ArrayData>,
    pub flags: Option<ArrayData>,
    pub uvw: Option<ArrayData>,
    pub meta: Option<Attributes>,
}

impl VisibilityParams {
    pub fn new(
        configuration: Model,
        times: Vec<f64>,
        frequencies: Vec<f64>,
        polarisation_frame: PolarisationFrame,
    ) -> Self {
        let ntimes = times.len();
        let nchan = frequencies.len();
        Self {
            configuration,
            times,
            integration_time: vec![1.0; ntimes],
            frequencies,
            channel_bandwidth: vec![1e6; nchan],
            polarisation_frame,
            phasecentre: direction(0.0, -45.0),
            source: "unknown".to_string(),
            vis: None,
            weight: None,
            flags: None,
            uvw: None,
            meta: None,
        }
    }
}

/// Build a `Visibility` model.
pub fn visibility(params: VisibilityParams) -> Result<Model> {
    let nant = params
        .configuration
        .coordinate("id")
        .map_or(0, Coordinate::len);
    let (ant1, ant2) = generate_baselines(nant);
    let nbl = ant1.len();
    let ntimes = params.times.len();
    let nchan = params.frequencies.len();
    let npol = params.polarisation_frame.npol();
    let shape = [ntimes, nbl, nchan, npol];
    let dims = ["time", "baselines", "frequency", "polarisation"];

    let vis = match params.vis {
        Some(vis) => vis,
        None => filled(&shape, Complex64::new(0.0, 0.0))?,
    };
    let weight = match params.weight {
        Some(weight) => weight,
        None => filled(&shape, 1.0f64)?,
    };
    let flags = match params.flags {
        Some(flags) => flags,
        None => filled(&shape, 0i32)?,
    };
    let uvw = match params.uvw {
        Some(uvw) => uvw,
        None => filled(&[ntimes, nbl, 3], 0.0f64)?,
    };

    let mut parts = ModelParts::new(ModelKind::Visibility)
        .coordinate(Coordinate::new("time", ArrayData::vector(params.times)).with_units("s"))
        .coordinate(index_coordinate("baselines", nbl))
        .coordinate(Coordinate::new("frequency", ArrayData::vector(params.frequencies)).with_units("Hz"))
        .coordinate(labels_coordinate("polarisation", params.polarisation_frame.labels()))
        .coordinate(spatial_coordinate())
        .variable(DataVariable::new("vis", &dims, vis).with_units("Jy"))
        .variable(DataVariable::new("weight", &dims, weight))
        .variable(DataVariable::new("flags", &dims, flags))
        .variable(DataVariable::new("uvw", &["time", "baselines", "spatial"], uvw).with_units("m"))
        .variable(DataVariable::new("antenna1", &["baselines"], ArrayData::vector(ant1)))
        .variable(DataVariable::new("antenna2", &["baselines"], ArrayData::vector(ant2)))
        .variable(
            DataVariable::new("integration_time", &["time"], ArrayData::vector(params.integration_time))
                .with_units("s"),
        )
        .variable(
            DataVariable::new("channel_bandwidth", &["frequency"], ArrayData::vector(params.channel_bandwidth))
                .with_units("Hz"),
        )
        .attribute(POLARISATION_FRAME_ATTR, params.polarisation_frame.name())
        .attribute("phasecentre", params.phasecentre)
        .attribute("source", params.source)
        .related("configuration", params.configuration);
    if let Some(meta) = params.meta {
        parts = parts.attribute("meta", meta);
    }
    parts.build()
}

/// Parameters of an [`image`].
#[derive(Debug, Clone)]
pub struct ImageParams {
    pub frequencies: Vec<f64>,
    pub polarisation_frame: PolarisationFrame,
    pub ny: usize,
    pub nx: usize,
    /// Pixel size in degrees
    pub cellsize: f64,
    pub phasecentre: (f64, f64),
    /// `[nchan, npol, ny, nx]` real pixels, zero if `None`
    pub pixels: Option<ArrayData>,
    pub clean_beam: Option<Attributes>,
}

/// Pixel-centre positions of an axis centred on `centre`.
fn axis_positions(centre: f64, cell: f64, n: usize) -> Vec<f64> {
    let reference = (n / 2) as f64;
    (0..n).map(|i| centre + (i as f64 - reference) * cell).collect()
}

/// Build an `Image` model.
pub fn image(params: ImageParams) -> Result<Model> {
    let (ra, dec) = params.phasecentre;
    let nchan = params.frequencies.len();
    let npol = params.polarisation_frame.npol();
    let pixels = match params.pixels {
        Some(pixels) => pixels,
        None => filled(&[nchan, npol, params.ny, params.nx], 0.0f64)?,
    };
    let reference_frequency = params.frequencies.first().copied().unwrap_or_default();
    let wcs = attrs! {
        "ctype" => vec![AttrValue::from("RA---SIN"), "DEC--SIN".into(), "STOKES".into(), "FREQ".into()],
        "crval" => vec![AttrValue::from(ra), dec.into(), 1.0.into(), reference_frequency.into()],
        "cdelt" => vec![AttrValue::from(-params.cellsize), params.cellsize.into(), 1.0.into(), 1.0.into()],
        "crpix" => vec![
            AttrValue::from((params.nx / 2 + 1) as f64),
            ((params.ny / 2 + 1) as f64).into(),
            1.0.into(),
            1.0.into(),
        ],
        "cunit" => vec![AttrValue::from("deg"), "deg".into(), "".into(), "Hz".into()],
        "radesys" => "ICRS",
    };

    let mut parts = ModelParts::new(ModelKind::Image)
        .coordinate(Coordinate::new("frequency", ArrayData::vector(params.frequencies)).with_units("Hz"))
        .coordinate(labels_coordinate("polarisation", params.polarisation_frame.labels()))
        .coordinate(
            Coordinate::new("y", ArrayData::vector(axis_positions(dec, params.cellsize, params.ny)))
                .with_units("deg"),
        )
        .coordinate(
            Coordinate::new("x", ArrayData::vector(axis_positions(ra, params.cellsize, params.nx)))
                .with_units("deg"),
        )
        .variable(
            DataVariable::new("pixels", &["frequency", "polarisation", "y", "x"], pixels)
                .with_units("Jy/beam"),
        )
        .attribute(POLARISATION_FRAME_ATTR, params.polarisation_frame.name())
        .attribute("wcs", wcs);
    if let Some(beam) = params.clean_beam {
        parts = parts.attribute("clean_beam", beam);
    }
    parts.build()
}

/// Parameters of a [`grid_data`] model.
#[derive(Debug, Clone)]
pub struct GridDataParams {
    pub frequencies: Vec<f64>,
    pub polarisation_frame: PolarisationFrame,
    pub nv: usize,
    pub nu: usize,
    /// Cell size in wavelengths
    pub cellsize: f64,
    /// `[nchan, npol, nv, nu]` pixels, complex zeros if `None`
    pub pixels: Option<ArrayData>,
}

/// Build a `GridData` model.
pub fn grid_data(params: GridDataParams) -> Result<Model> {
    let nchan = params.frequencies.len();
    let npol = params.polarisation_frame.npol();
    let pixels = match params.pixels {
        Some(pixels) => pixels,
        None => filled(&[nchan, npol, params.nv, params.nu], Complex64::new(0.0, 0.0))?,
    };
    let grid_wcs = attrs! {
        "ctype" => vec![AttrValue::from("UU"), "VV".into(), "STOKES".into(), "FREQ".into()],
        "cdelt" => vec![AttrValue::from(params.cellsize), params.cellsize.into(), 1.0.into(), 1.0.into()],
        "cunit" => vec![AttrValue::from("lambda"), "lambda".into(), "".into(), "Hz".into()],
    };

    ModelParts::new(ModelKind::GridData)
        .coordinate(Coordinate::new("frequency", ArrayData::vector(params.frequencies)).with_units("Hz"))
        .coordinate(labels_coordinate("polarisation", params.polarisation_frame.labels()))
        .coordinate(
            Coordinate::new("v", ArrayData::vector(axis_positions(0.0, params.cellsize, params.nv)))
                .with_units("lambda"),
        )
        .coordinate(
            Coordinate::new("u", ArrayData::vector(axis_positions(0.0, params.cellsize, params.nu)))
                .with_units("lambda"),
        )
        .variable(
            DataVariable::new("pixels", &["frequency", "polarisation", "v", "u"], pixels)
                .with_units("Jy"),
        )
        .attribute(POLARISATION_FRAME_ATTR, params.polarisation_frame.name())
        .attribute("grid_wcs", grid_wcs)
        .build()
}

/// Parameters of a [`sky_component`].
#[derive(Debug, Clone)]
pub struct SkyComponentParams {
    pub name: String,
    pub direction: Attributes,
    pub frequencies: Vec<f64>,
    pub polarisation_frame: PolarisationFrame,
    /// Row-major `[nchan, npol]` flux in Jy
    pub flux: Vec<f64>,
    /// "Point", "Gaussian", ...
    pub shape: String,
    pub params: Option<Attributes>,
}

/// Build a `SkyComponent` model.
pub fn sky_component(params: SkyComponentParams) -> Result<Model> {
    let shape = [params.frequencies.len(), params.polarisation_frame.npol()];
    let flux = ArrayData::from_shape_vec(&shape, params.flux)?;
    let mut parts = ModelParts::new(ModelKind::SkyComponent)
        .coordinate(Coordinate::new("frequency", ArrayData::vector(params.frequencies)).with_units("Hz"))
        .coordinate(labels_coordinate("polarisation", params.polarisation_frame.labels()))
        .variable(DataVariable::new("flux", &["frequency", "polarisation"], flux).with_units("Jy"))
        .attribute(POLARISATION_FRAME_ATTR, params.polarisation_frame.name())
        .attribute("direction", params.direction)
        .attribute("name", params.name)
        .attribute("shape", params.shape);
    if let Some(extra) = params.params {
        parts = parts.attribute("params", extra);
    }
    parts.build()
}

/// Parameters of a [`gain_table`].
///
/// Gains default to identity Jones matrices with unit weight and zero
/// residual.
#[derive(Debug, Clone)]
pub struct GainTableParams {
    pub times: Vec<f64>,
    pub interval: Vec<f64>,
    pub nants: usize,
    pub frequencies: Vec<f64>,
    pub receptor_frame: ReceptorFrame,
    pub phasecentre: Attributes,
    /// "T", "G", "B", ...
    pub jones_type: String,
    pub gain: Option<ArrayData>,
    pub configuration: Option<Model>,
}

/// Build a `GainTable` model.
pub fn gain_table(params: GainTableParams) -> Result<Model> {
    let ntimes = params.times.len();
    let nchan = params.frequencies.len();
    let nrec = params.receptor_frame.nrec();
    let shape = [ntimes, params.nants, nchan, nrec, nrec];
    let dims = ["time", "antenna", "frequency", "receptor1", "receptor2"];

    let gain = match params.gain {
        Some(gain) => gain,
        None => {
            let identity = (0..shape.iter().product::<usize>()).map(|flat| {
                let r2 = flat % nrec;
                let r1 = (flat / nrec) % nrec;
                Complex64::new(if r1 == r2 { 1.0 } else { 0.0 }, 0.0)
            });
            ArrayData::from_shape_vec(&shape, identity.collect::<Vec<_>>())?
        }
    };
    let labels = params.receptor_frame.labels();

    let mut parts = ModelParts::new(ModelKind::GainTable)
        .coordinate(Coordinate::new("time", ArrayData::vector(params.times)).with_units("s"))
        .coordinate(index_coordinate("antenna", params.nants))
        .coordinate(Coordinate::new("frequency", ArrayData::vector(params.frequencies)).with_units("Hz"))
        .coordinate(labels_coordinate("receptor1", labels))
        .coordinate(labels_coordinate("receptor2", labels))
        .variable(DataVariable::new("gain", &dims, gain))
        .variable(DataVariable::new("weight", &dims, filled(&shape, 1.0f64)?))
        .variable(DataVariable::new(
            "residual",
            &["time", "frequency", "receptor1", "receptor2"],
            filled(&[ntimes, nchan, nrec, nrec], 0.0f64)?,
        ))
        .variable(DataVariable::new("interval", &["time"], ArrayData::vector(params.interval)).with_units("s"))
        .attribute(RECEPTOR_FRAME_ATTR, params.receptor_frame.name())
        .attribute("phasecentre", params.phasecentre)
        .attribute("jones_type", params.jones_type);
    if let Some(config) = params.configuration {
        parts = parts.related("configuration", config);
    }
    parts.build()
}

/// Build a `FlagTable` aligned with a `Visibility`, copying its axes, flags
/// and configuration.
pub fn flag_table_for(vis: &Model) -> Result<Model> {
    let mut parts = ModelParts::new(ModelKind::FlagTable);
    for axis in ["time", "baselines", "frequency", "polarisation"] {
        if let Some(coord) = vis.coordinate(axis) {
            parts = parts.coordinate(coord.clone());
        }
    }
    for name in ["flags", "integration_time", "channel_bandwidth"] {
        if let Some(var) = vis.variable(name) {
            parts = parts.variable(var.clone());
        }
    }
    if let Some(frame) = vis.attribute(POLARISATION_FRAME_ATTR) {
        parts = parts.attribute(POLARISATION_FRAME_ATTR, frame.clone());
    }
    if let Some(config) = vis.related("configuration") {
        parts = parts.related("configuration", config.clone());
    }
    parts.build()
}
