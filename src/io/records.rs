use crate::types::Ordinal;
use serde::{Deserialize, Serialize};

/// Raw per-band curve fit as emitted by CCD
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBandModel {
    pub magnitude: f64,
    pub rmse: f64,
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

/// Raw CCD change segment
///
/// Bands are optional at the decoding layer so that a record with a missing
/// band still decodes; the unifier rejects it with a data-format error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawChangeSegment {
    pub start_day: Ordinal,
    pub end_day: Ordinal,
    #[serde(default)]
    pub break_day: Ordinal,
    pub observation_count: u32,
    pub change_probability: f64,
    pub curve_qa: u32,
    #[serde(default)]
    pub blue: Option<RawBandModel>,
    #[serde(default)]
    pub green: Option<RawBandModel>,
    #[serde(default)]
    pub red: Option<RawBandModel>,
    #[serde(default)]
    pub nir: Option<RawBandModel>,
    #[serde(default)]
    pub swir1: Option<RawBandModel>,
    #[serde(default)]
    pub swir2: Option<RawBandModel>,
    #[serde(default)]
    pub thermal: Option<RawBandModel>,
}

/// Raw land-cover classification record for one time window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawClassRecord {
    pub start_day: Ordinal,
    pub end_day: Ordinal,
    pub class_probs: Vec<f64>,
    pub class_vals: Vec<i64>,
}

/// CCD output for one pixel, keyed by its projected coordinate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPixelResult {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub change_models: Vec<RawChangeSegment>,
}

/// CCD output for a whole chip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawChip {
    /// Chip upper-left x
    pub cx: f64,
    /// Chip upper-left y
    pub cy: f64,
    pub pixels: Vec<RawPixelResult>,
}
