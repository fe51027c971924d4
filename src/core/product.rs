use crate::calendar::SERIES_EPOCH;
use crate::core::harmonic::synthetic_bands;
use crate::core::nodata_fill::NodataFillParams;
use crate::core::products::{
    change_day_of_year, change_magnitude, from_to, land_cover, land_cover_confidence, model_quality,
    segment_length, time_since_last_break, ConfidenceCodes, LandCoverParams,
};
use crate::core::segment::Segment;
use crate::types::{MapifyError, MapifyResult, Ordinal, BAND_COUNT};
use num_traits::{Bounded, NumCast, ToPrimitive};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Raster products derivable from a pixel history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Product {
    ChangeDay,
    ChangeMagnitude,
    Quality,
    SegmentLength,
    LastChange,
    LandCoverPrimary,
    LandCoverSecondary,
    LandCoverPrimaryConfidence,
    LandCoverSecondaryConfidence,
    LandCoverChange,
    Synthetic,
}

/// Output raster data types (GDAL-compatible)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RasterDataType {
    Byte,
    UInt16,
    Float32,
}

/// One pixel's value for one product and date
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProductValue {
    Byte(u8),
    UInt16(u16),
    Float32(f32),
    Bands([u16; BAND_COUNT]),
}

/// Everything product evaluation is parameterised by
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductParams {
    pub landcover: LandCoverParams,
    pub confidence: ConfidenceCodes,
    pub nodata_fill: NodataFillParams,
    /// Start of the observation record, used to bound segment ages
    pub series_epoch: Ordinal,
}

impl Default for ProductParams {
    fn default() -> Self {
        Self {
            landcover: LandCoverParams::default(),
            confidence: ConfidenceCodes::default(),
            nodata_fill: NodataFillParams::default(),
            series_epoch: SERIES_EPOCH,
        }
    }
}

impl Product {
    pub const ALL: [Product; 11] = [
        Product::ChangeDay,
        Product::ChangeMagnitude,
        Product::Quality,
        Product::SegmentLength,
        Product::LastChange,
        Product::LandCoverPrimary,
        Product::LandCoverSecondary,
        Product::LandCoverPrimaryConfidence,
        Product::LandCoverSecondaryConfidence,
        Product::LandCoverChange,
        Product::Synthetic,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Product::ChangeDay => "ChangeMap",
            Product::ChangeMagnitude => "ChangeMagMap",
            Product::Quality => "QAMap",
            Product::SegmentLength => "SegLength",
            Product::LastChange => "LastChange",
            Product::LandCoverPrimary => "Primary-LC",
            Product::LandCoverSecondary => "Secondary-LC",
            Product::LandCoverPrimaryConfidence => "Primary-Conf",
            Product::LandCoverSecondaryConfidence => "Secondary-Conf",
            Product::LandCoverChange => "LC-Change",
            Product::Synthetic => "Synthetic",
        }
    }

    pub fn data_type(self) -> RasterDataType {
        match self {
            Product::ChangeDay | Product::SegmentLength | Product::LastChange | Product::Synthetic => {
                RasterDataType::UInt16
            }
            Product::ChangeMagnitude => RasterDataType::Float32,
            Product::Quality
            | Product::LandCoverPrimary
            | Product::LandCoverSecondary
            | Product::LandCoverPrimaryConfidence
            | Product::LandCoverSecondaryConfidence
            | Product::LandCoverChange => RasterDataType::Byte,
        }
    }

    /// Number of raster bands the product occupies
    pub fn band_count(self) -> usize {
        match self {
            Product::Synthetic => BAND_COUNT,
            _ => 1,
        }
    }

    /// Compute the product for one sorted pixel history and date
    pub fn evaluate(self, models: &[Segment], ordinal: Ordinal, params: &ProductParams) -> MapifyResult<ProductValue> {
        let value = match self {
            Product::ChangeDay => ProductValue::UInt16(change_day_of_year(models, ordinal)),
            Product::ChangeMagnitude => ProductValue::Float32(change_magnitude(models, ordinal)),
            Product::Quality => ProductValue::Byte(model_quality(models, ordinal)),
            Product::SegmentLength => {
                ProductValue::UInt16(saturating_cast(segment_length(models, ordinal, params.series_epoch)))
            }
            Product::LastChange => ProductValue::UInt16(saturating_cast(time_since_last_break(models, ordinal))),
            Product::LandCoverPrimary => ProductValue::Byte(land_cover(models, ordinal, 0, &params.landcover)),
            Product::LandCoverSecondary => ProductValue::Byte(land_cover(models, ordinal, 1, &params.landcover)),
            Product::LandCoverPrimaryConfidence => {
                ProductValue::Byte(land_cover_confidence(models, ordinal, 0, &params.confidence)?)
            }
            Product::LandCoverSecondaryConfidence => {
                ProductValue::Byte(land_cover_confidence(models, ordinal, 1, &params.confidence)?)
            }
            Product::LandCoverChange => ProductValue::Byte(from_to(models, ordinal, &params.landcover)?),
            Product::Synthetic => {
                let bands = synthetic_bands(models, ordinal)?;
                ProductValue::Bands(bands.map(saturating_cast::<f64, u16>))
            }
        };
        Ok(value)
    }
}

impl std::fmt::Display for Product {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Product {
    type Err = MapifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Product::ALL
            .iter()
            .copied()
            .find(|p| p.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| MapifyError::DataFormat(format!("Unknown product: {}", s)))
    }
}

/// Convert to a raster integer type, clamping to its range (NaN becomes zero)
pub fn saturating_cast<S, T>(value: S) -> T
where
    S: ToPrimitive + Copy,
    T: NumCast + Bounded + Copy,
{
    if let Some(v) = <T as NumCast>::from(value) {
        return v;
    }
    match value.to_f64() {
        Some(v) if v.is_nan() => <T as NumCast>::from(0u8).unwrap_or_else(T::min_value),
        Some(v) if v < 0.0 => T::min_value(),
        _ => T::max_value(),
    }
}
