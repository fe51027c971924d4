use crate::core::segment::{Band, BandModel, Segment};
use crate::core::temporal::TemporalPosition;
use crate::types::{MapifyError, MapifyResult, Ordinal, BAND_COUNT};
use std::f64::consts::PI;

/// Days per year used by the CCD harmonic terms
pub const DAYS_PER_YEAR: f64 = 365.2425;

/// Angular frequency of the annual harmonic
pub const OMEGA: f64 = 2.0 * PI / DAYS_PER_YEAR;

/// Evaluate a band's harmonic regression on `ordinal`.
///
/// Thermal is stored as Celsius-offset deci-units and converted back to the
/// raster's Kelvin encoding.
pub fn predict(band: &BandModel, ordinal: Ordinal) -> f64 {
    let t = ordinal as f64;
    let mut value = band.intercept + band.slope() * t;
    for k in 1..=3 {
        let (cos_k, sin_k) = band.harmonic(k);
        let wt = k as f64 * OMEGA * t;
        value += cos_k * wt.cos() + sin_k * wt.sin();
    }

    match band.name {
        Band::Thermal => (value / 10.0 + 27315.0).trunc(),
        _ => value,
    }
}

/// Segment whose curves reconstruct reflectance on `ordinal`.
///
/// Before the first segment the first is used, after the last the last, and
/// inside a gap the upcoming segment.
pub fn synthetic_select(models: &[Segment], ordinal: Ordinal) -> MapifyResult<Option<&Segment>> {
    let position = TemporalPosition::locate_unclassified(models, ordinal);
    if position == TemporalPosition::Indeterminate {
        return Err(MapifyError::UnresolvedTemporalState { ordinal });
    }
    Ok(position.representative(models).map(|i| &models[i]))
}

/// Synthetic reflectance for every band in canonical order; zeros when no
/// segment applies
pub fn synthetic_bands(models: &[Segment], ordinal: Ordinal) -> MapifyResult<[f64; BAND_COUNT]> {
    let mut values = [0.0; BAND_COUNT];
    if let Some(model) = synthetic_select(models, ordinal)? {
        for (value, band) in values.iter_mut().zip(model.bands.iter()) {
            *value = predict(band, ordinal);
        }
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::segment::fixtures::{flat_band, segment};
    use approx::assert_relative_eq;

    #[test]
    fn test_flat_model_predicts_intercept() {
        let band = flat_band(Band::Blue, 1000.0);
        assert_eq!(predict(&band, 730_500), 1000.0);
    }

    #[test]
    fn test_harmonic_terms() {
        let mut band = flat_band(Band::Red, 500.0);
        band.coefficients = [0.0, 120.0, -40.0, 10.0, 5.0, 0.0, 0.0];
        let a = predict(&band, 730_000);
        let t = 730_000.0f64;
        let expected = 500.0 + 120.0 * (OMEGA * t).cos() - 40.0 * (OMEGA * t).sin()
            + 10.0 * (2.0 * OMEGA * t).cos()
            + 5.0 * (2.0 * OMEGA * t).sin();
        assert_relative_eq!(a, expected, epsilon = 1e-9);
    }

    #[test]
    fn test_slope_term() {
        let mut band = flat_band(Band::Nir, 10.0);
        band.coefficients[0] = 0.5;
        assert_relative_eq!(predict(&band, 100), 60.0);
    }

    #[test]
    fn test_thermal_conversion() {
        let band = flat_band(Band::Thermal, 250.0);
        assert_eq!(predict(&band, 730_000), 27340.0);
    }

    #[test]
    fn test_synthetic_select_policy() {
        let models = vec![segment(100, 200, 200, 0, 0.9), segment(210, 300, 0, 3, 0.9)];
        let pick = |o| synthetic_select(&models, o).unwrap().map(|m| m.start_day);
        assert_eq!(pick(50), Some(100));
        assert_eq!(pick(150), Some(100));
        assert_eq!(pick(205), Some(210));
        assert_eq!(pick(999), Some(210));
        assert_eq!(synthetic_select(&[], 150).unwrap(), None);
    }

    #[test]
    fn test_synthetic_unresolved_gap_is_error() {
        let models = vec![segment(100, 200, 0, 0, 0.9), segment(300, 400, 0, 0, 0.9)];
        assert!(synthetic_select(&models, 250).is_err());
    }

    #[test]
    fn test_synthetic_bands_no_models_are_zero() {
        assert_eq!(synthetic_bands(&[], 730_000).unwrap(), [0.0; BAND_COUNT]);
    }
}
