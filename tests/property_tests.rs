// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Property-based round-trip tests over randomly generated valid models.

mod common;

use proptest::prelude::*;

use radiocodec::encoding::{compact, container};
use radiocodec::frames::{PolarisationFrame, ReceptorFrame};
use radiocodec::io::options::WriterBuilder;
use radiocodec::model::constructors::{
    configuration, direction, flag_table_for, gain_table, grid_data, image, sky_component,
    visibility, ConfigurationParams, GainTableParams, GridDataParams, ImageParams,
    SkyComponentParams, VisibilityParams,
};
use radiocodec::model::Tolerance;
use radiocodec::{
    decode_compact, decode_container, ArrayData, AttrValue, Attributes, Complex64, Model,
    WriterConfig,
};

// ============================================================================
// Strategies
// ============================================================================

fn attr_value() -> impl Strategy<Value = AttrValue> {
    let leaf = prop_oneof![
        any::<bool>().prop_map(AttrValue::Bool),
        any::<i64>().prop_map(AttrValue::Int),
        any::<f64>().prop_map(AttrValue::Float),
        "\\PC{0,12}".prop_map(AttrValue::String),
        prop::collection::vec(any::<f64>(), 0..6)
            .prop_map(|v| AttrValue::Array(ArrayData::vector(v))),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(AttrValue::List),
            prop::collection::btree_map("[a-z_]{1,8}", inner, 0..4).prop_map(AttrValue::Map),
        ]
    })
}

/// User attributes, prefixed so they never collide with schema attributes.
fn user_attrs() -> impl Strategy<Value = Attributes> {
    prop::collection::btree_map("[a-z]{1,6}", attr_value(), 0..4).prop_map(|attrs| {
        attrs
            .into_iter()
            .map(|(k, v)| (format!("user_{k}"), v))
            .collect()
    })
}

fn polarisation_frame() -> impl Strategy<Value = PolarisationFrame> {
    prop::sample::select(PolarisationFrame::ALL.to_vec())
}

fn finite() -> impl Strategy<Value = f64> {
    -1e12..1e12f64
}

fn sorted_axis(len: std::ops::Range<usize>, start: f64, step: f64) -> impl Strategy<Value = Vec<f64>> {
    len.prop_map(move |n| (0..n).map(|i| start + step * i as f64).collect())
}

fn with_user_attrs(model: Model, attrs: Attributes) -> Model {
    model.into_parts().attributes(attrs).build().unwrap()
}

fn visibility_model() -> impl Strategy<Value = Model> {
    (
        1usize..4,
        sorted_axis(1..4, 4.5e9, 10.0),
        sorted_axis(1..4, 1.0e8, 1.0e6),
        polarisation_frame(),
    )
        .prop_flat_map(|(nant, times, freqs, frame)| {
            let nbl = nant * (nant + 1) / 2;
            let n = times.len() * nbl * freqs.len() * frame.npol();
            (
                Just((nant, times, freqs, frame)),
                prop::collection::vec((finite(), finite()), n),
                user_attrs(),
            )
        })
        .prop_map(|((nant, times, freqs, frame), values, attrs)| {
            let config = configuration(&ConfigurationParams::example(nant)).unwrap();
            let shape = [times.len(), nant * (nant + 1) / 2, freqs.len(), frame.npol()];
            let mut params = VisibilityParams::new(config, times, freqs, frame);
            let values = values
                .into_iter()
                .map(|(re, im)| Complex64::new(re, im))
                .collect::<Vec<_>>();
            params.vis = Some(ArrayData::from_shape_vec(&shape, values).unwrap());
            with_user_attrs(visibility(params).unwrap(), attrs)
        })
}

fn image_model() -> impl Strategy<Value = Model> {
    (1usize..3, polarisation_frame(), 1usize..6, 1usize..6)
        .prop_flat_map(|(nchan, frame, ny, nx)| {
            let n = nchan * frame.npol() * ny * nx;
            (
                Just((nchan, frame, ny, nx)),
                prop::collection::vec(any::<f64>(), n),
                user_attrs(),
            )
        })
        .prop_map(|((nchan, frame, ny, nx), pixels, attrs)| {
            let model = image(ImageParams {
                frequencies: (0..nchan).map(|i| 1.0e8 + 1.0e6 * i as f64).collect(),
                polarisation_frame: frame,
                ny,
                nx,
                cellsize: 0.001,
                phasecentre: (30.0, -60.0),
                pixels: Some(
                    ArrayData::from_shape_vec(&[nchan, frame.npol(), ny, nx], pixels).unwrap(),
                ),
                clean_beam: None,
            })
            .unwrap();
            with_user_attrs(model, attrs)
        })
}

fn gain_table_model() -> impl Strategy<Value = Model> {
    (
        sorted_axis(1..4, 0.0, 30.0),
        1usize..4,
        prop::sample::select(vec![ReceptorFrame::Linear, ReceptorFrame::Circular]),
        "[A-Z]{1,2}",
    )
        .prop_map(|(times, nants, receptor_frame, jones_type)| {
            gain_table(GainTableParams {
                interval: vec![30.0; times.len()],
                times,
                nants,
                frequencies: vec![1.0e8],
                receptor_frame,
                phasecentre: direction(0.0, -30.0),
                jones_type,
                gain: None,
                configuration: Some(configuration(&ConfigurationParams::example(nants)).unwrap()),
            })
            .unwrap()
        })
}

fn grid_data_model() -> impl Strategy<Value = Model> {
    (1usize..3, polarisation_frame(), 1usize..5, 1usize..5)
        .prop_flat_map(|(nchan, frame, nv, nu)| {
            let n = nchan * frame.npol() * nv * nu;
            (
                Just((nchan, frame, nv, nu)),
                prop::collection::vec((finite(), finite()), n),
                user_attrs(),
            )
        })
        .prop_map(|((nchan, frame, nv, nu), values, attrs)| {
            let pixels = values
                .into_iter()
                .map(|(re, im)| Complex64::new(re, im))
                .collect::<Vec<_>>();
            let model = grid_data(GridDataParams {
                frequencies: (0..nchan).map(|i| 1.0e8 + 1.0e6 * i as f64).collect(),
                polarisation_frame: frame,
                nv,
                nu,
                cellsize: 5.0,
                pixels: Some(
                    ArrayData::from_shape_vec(&[nchan, frame.npol(), nv, nu], pixels).unwrap(),
                ),
            })
            .unwrap();
            with_user_attrs(model, attrs)
        })
}

fn sky_component_model() -> impl Strategy<Value = Model> {
    (
        "\\PC{1,10}",
        0.0..360.0f64,
        -90.0..90.0f64,
        sorted_axis(1..4, 1.0e8, 2.0e6),
        polarisation_frame(),
        prop::sample::select(vec!["Point", "Gaussian", "Disk"]),
        prop::option::of(user_attrs()),
    )
        .prop_flat_map(|(name, ra, dec, freqs, frame, shape, params)| {
            let n = freqs.len() * frame.npol();
            (
                Just((name, ra, dec, freqs, frame, shape, params)),
                prop::collection::vec(any::<f64>(), n),
            )
        })
        .prop_map(|((name, ra, dec, frequencies, frame, shape, params), flux)| {
            sky_component(SkyComponentParams {
                name,
                direction: direction(ra, dec),
                frequencies,
                polarisation_frame: frame,
                flux,
                shape: shape.to_string(),
                params,
            })
            .unwrap()
        })
}

fn configuration_model() -> impl Strategy<Value = Model> {
    (1usize..6)
        .prop_flat_map(|nant| {
            (
                prop::collection::vec("\\PC{0,8}", nant),
                prop::collection::vec((finite(), finite(), finite()), nant),
                prop::collection::vec(1.0..100.0f64, nant),
                prop::option::of(prop::collection::vec("\\PC{0,6}", nant)),
            )
        })
        .prop_map(|(names, xyz, diameter, stations)| {
            let mut params = ConfigurationParams::example(names.len());
            params.xyz = xyz.into_iter().map(|(x, y, z)| [x, y, z]).collect();
            params.names = names;
            params.diameter = diameter;
            params.stations = stations;
            configuration(&params).unwrap()
        })
}

fn flag_table_model() -> impl Strategy<Value = Model> {
    visibility_model().prop_map(|vis| flag_table_for(&vis).unwrap())
}

fn any_model() -> impl Strategy<Value = Model> {
    prop_oneof![
        visibility_model(),
        image_model(),
        grid_data_model(),
        sky_component_model(),
        configuration_model(),
        gain_table_model(),
        flag_table_model(),
    ]
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_container_round_trip(model in any_model()) {
        let bytes = container::encode_model(&model, &WriterConfig::default()).unwrap();
        let decoded = decode_container(&bytes).unwrap();
        prop_assert_eq!(model.first_difference(&decoded, Tolerance::EXACT), None);
    }

    #[test]
    fn prop_container_zstd_round_trip(model in any_model(), level in 1i32..10) {
        let writer = WriterBuilder::new().zstd(level).build().unwrap();
        let bytes = container::encode_model(&model, &writer).unwrap();
        let decoded = decode_container(&bytes).unwrap();
        prop_assert_eq!(model.first_difference(&decoded, Tolerance::EXACT), None);
    }

    #[test]
    fn prop_compact_round_trip(model in any_model()) {
        let bytes = compact::encode_model(&model).unwrap();
        let decoded = decode_compact(&bytes).unwrap();
        prop_assert_eq!(model.first_difference(&decoded, Tolerance::EXACT), None);
        prop_assert_eq!(decoded.dims_order(), model.dims_order());
    }

    #[test]
    fn prop_encoding_is_deterministic(model in any_model()) {
        let first = compact::encode_model(&model).unwrap();
        let second = compact::encode_model(&model.clone()).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_garbage_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let _ = decode_compact(&bytes);
        let _ = decode_container(&bytes);
    }
}
