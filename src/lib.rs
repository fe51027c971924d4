//! mapify: land-cover and land-change product reconstruction
//!
//! Turns per-pixel CCD segment histories and their land-cover classifications
//! into raster products: land cover and confidence on any date, change day and
//! magnitude, segment age, class transitions and synthetic reflectance.

#[cfg(feature = "python")]
use pyo3::prelude::*;

pub mod types;
pub mod calendar;
pub mod io;
pub mod core;

// Re-export main types and functions for easier access
pub use types::{
    ClassCode, GeoTransform, GridShape, MapifyError, MapifyResult, Ordinal, BAND_COUNT, CHIP_SIZE,
    CLASS_COUNT,
};

pub use io::{RawBandModel, RawChangeSegment, RawChip, RawClassRecord, RawPixelResult};
pub use crate::core::{ChipParams, ChipProcessor, Product, ProductParams, Segment};

#[cfg(feature = "python")]
fn to_py_err(e: MapifyError) -> PyErr {
    PyErr::new::<pyo3::exceptions::PyValueError, _>(format!("{}", e))
}

/// Python module definition
#[cfg(feature = "python")]
#[pymodule]
fn _core(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(py_fill_nodata, m)?)?;
    m.add_function(wrap_pyfunction!(py_predict, m)?)?;
    m.add_function(wrap_pyfunction!(py_ordinal_from_date, m)?)?;
    Ok(())
}

/// Fill insufficient-data land cover from an NLCD raster
#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(name = "fill_nodata")]
fn py_fill_nodata<'py>(
    py: Python<'py>,
    landcover: numpy::PyReadonlyArray2<'py, u8>,
    nlcd: numpy::PyReadonlyArray2<'py, u8>,
    crosswalk: Option<std::collections::HashMap<u8, u8>>,
) -> PyResult<&'py numpy::PyArray2<u8>> {
    use numpy::IntoPyArray;

    let crosswalk = crosswalk.unwrap_or_else(crate::core::nlcd_crosswalk);
    let filled = crate::core::fill_nodata(
        landcover.as_array(),
        nlcd.as_array(),
        &crosswalk,
        None,
        &crate::core::NodataFillParams::default(),
    )
    .map_err(to_py_err)?;

    Ok(filled.landcover.into_pyarray(py))
}

/// Evaluate one band's harmonic model on an ordinal date
#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(name = "predict")]
fn py_predict(band: &str, intercept: f64, coefficients: Vec<f64>, ordinal: i64) -> PyResult<f64> {
    let name = crate::core::Band::ALL
        .iter()
        .copied()
        .find(|b| b.name().eq_ignore_ascii_case(band))
        .ok_or_else(|| PyErr::new::<pyo3::exceptions::PyValueError, _>(format!("Invalid band: {}", band)))?;

    let mut padded = [0.0; 7];
    match coefficients.len() {
        7 => padded.copy_from_slice(&coefficients),
        6 => padded[1..].copy_from_slice(&coefficients),
        n => {
            return Err(PyErr::new::<pyo3::exceptions::PyValueError, _>(format!(
                "Expected 6 or 7 coefficients, got {}",
                n
            )))
        }
    }

    let model = crate::core::BandModel {
        name,
        magnitude: 0.0,
        rmse: 0.0,
        intercept,
        coefficients: padded,
    };
    Ok(crate::core::predict(&model, ordinal))
}

/// Ordinal day for an ISO date string
#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(name = "ordinal_from_date")]
fn py_ordinal_from_date(date: &str) -> PyResult<i64> {
    calendar::ordinal_from_iso(date).map_err(to_py_err)
}
