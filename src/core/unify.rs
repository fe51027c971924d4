use crate::core::segment::{
    default_class_vals, sort_models, Band, BandModel, ClassProbs, Classification, Segment,
};
use crate::io::{RawBandModel, RawChangeSegment, RawClassRecord};
use crate::types::{ClassCode, MapifyError, MapifyResult, BAND_COUNT, CLASS_COUNT};

/// Combine one pixel's CCD segments with its classification records.
///
/// Output keeps the order of `change_segments`; use [`unify_sorted`] when the
/// result feeds product functions directly.
pub fn unify(
    change_segments: &[RawChangeSegment],
    class_records: &[RawClassRecord],
) -> MapifyResult<Vec<Segment>> {
    change_segments
        .iter()
        .map(|raw| unify_segment(raw, class_records))
        .collect()
}

/// [`unify`] followed by a sort on segment start
pub fn unify_sorted(
    change_segments: &[RawChangeSegment],
    class_records: &[RawClassRecord],
) -> MapifyResult<Vec<Segment>> {
    let mut models = unify(change_segments, class_records)?;
    sort_models(&mut models);
    Ok(models)
}

fn unify_segment(raw: &RawChangeSegment, class_records: &[RawClassRecord]) -> MapifyResult<Segment> {
    if raw.start_day > raw.end_day {
        return Err(MapifyError::DataFormat(format!(
            "Segment start {} is after its end {}",
            raw.start_day, raw.end_day
        )));
    }

    let bands = build_bands(raw)?;
    let curve_qa = u8::try_from(raw.curve_qa).map_err(|_| {
        MapifyError::DataFormat(format!("curve_qa {} does not fit 8 bits", raw.curve_qa))
    })?;

    let (classification, class_vals) = match match_class_records(raw, class_records) {
        ClassMatch::Exact(record) => {
            let (probs, vals) = class_vectors(record)?;
            (Classification::Single { probs }, vals)
        }
        ClassMatch::Split(first, second) => {
            let (before, vals) = class_vectors(first)?;
            let (after, second_vals) = class_vectors(second)?;
            if vals != second_vals {
                return Err(MapifyError::DataFormat(format!(
                    "Class labels differ across the split of segment {}-{}",
                    raw.start_day, raw.end_day
                )));
            }
            (
                Classification::Split {
                    split_day: second.start_day,
                    before,
                    after,
                },
                vals,
            )
        }
        ClassMatch::None => (Classification::Unclassified, default_class_vals()),
    };

    Ok(Segment {
        start_day: raw.start_day,
        end_day: raw.end_day,
        break_day: raw.break_day,
        obs_count: raw.observation_count,
        change_prob: raw.change_probability,
        curve_qa,
        bands,
        classification,
        class_vals,
    })
}

enum ClassMatch<'a> {
    Exact(&'a RawClassRecord),
    Split(&'a RawClassRecord, &'a RawClassRecord),
    None,
}

fn match_class_records<'a>(raw: &RawChangeSegment, records: &'a [RawClassRecord]) -> ClassMatch<'a> {
    if let Some(exact) = records
        .iter()
        .find(|r| r.start_day == raw.start_day && r.end_day == raw.end_day)
    {
        return ClassMatch::Exact(exact);
    }

    let Some(first) = records
        .iter()
        .find(|r| r.start_day == raw.start_day && r.end_day != raw.end_day)
    else {
        return ClassMatch::None;
    };

    let mut candidates = records
        .iter()
        .filter(|r| r.end_day == raw.end_day && r.start_day != raw.start_day);
    match candidates.next() {
        Some(second) => {
            if candidates.next().is_some() {
                log::debug!(
                    "Segment {}-{} has several closing class windows, using the first",
                    raw.start_day,
                    raw.end_day
                );
            }
            ClassMatch::Split(first, second)
        }
        None => {
            log::warn!(
                "Segment {}-{} opens a class window ending {} with no closing window",
                raw.start_day,
                raw.end_day,
                first.end_day
            );
            ClassMatch::None
        }
    }
}

fn build_bands(raw: &RawChangeSegment) -> MapifyResult<[BandModel; BAND_COUNT]> {
    let sources = [
        &raw.blue,
        &raw.green,
        &raw.red,
        &raw.nir,
        &raw.swir1,
        &raw.swir2,
        &raw.thermal,
    ];

    let mut bands = Vec::with_capacity(BAND_COUNT);
    for (band, source) in Band::ALL.iter().zip(sources) {
        let raw_band = source.as_ref().ok_or_else(|| {
            MapifyError::DataFormat(format!(
                "Segment {}-{} is missing band '{}'",
                raw.start_day, raw.end_day, band
            ))
        })?;
        bands.push(build_band(*band, raw_band)?);
    }

    bands
        .try_into()
        .map_err(|_| MapifyError::DataFormat("Band count mismatch".to_string()))
}

/// Accepts `[slope, c1, s1, c2, s2, c3, s3]` or the three harmonic pairs alone
fn build_band(name: Band, raw: &RawBandModel) -> MapifyResult<BandModel> {
    let coefficients = match raw.coefficients.len() {
        7 => {
            let mut c = [0.0; 7];
            c.copy_from_slice(&raw.coefficients);
            c
        }
        6 => {
            let mut c = [0.0; 7];
            c[1..].copy_from_slice(&raw.coefficients);
            c
        }
        n => {
            return Err(MapifyError::DataFormat(format!(
                "Band '{}' has {} coefficients, expected 6 or 7",
                name, n
            )))
        }
    };

    Ok(BandModel {
        name,
        magnitude: raw.magnitude,
        rmse: raw.rmse,
        intercept: raw.intercept,
        coefficients,
    })
}

fn class_vectors(record: &RawClassRecord) -> MapifyResult<(ClassProbs, [ClassCode; CLASS_COUNT])> {
    if record.class_probs.len() != CLASS_COUNT || record.class_vals.len() != CLASS_COUNT {
        return Err(MapifyError::DataFormat(format!(
            "Class record {}-{} has {} probabilities and {} labels, expected {}",
            record.start_day,
            record.end_day,
            record.class_probs.len(),
            record.class_vals.len(),
            CLASS_COUNT
        )));
    }

    let mut probs = [0.0; CLASS_COUNT];
    probs.copy_from_slice(&record.class_probs);

    let mut vals = [0; CLASS_COUNT];
    for (dst, &src) in vals.iter_mut().zip(&record.class_vals) {
        *dst = ClassCode::try_from(src).map_err(|_| {
            MapifyError::DataFormat(format!("Class label {} does not fit 8 bits", src))
        })?;
    }

    Ok((probs, vals))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_band() -> RawBandModel {
        RawBandModel {
            magnitude: 0.0,
            rmse: 10.0,
            intercept: 500.0,
            coefficients: vec![0.0; 7],
        }
    }

    fn raw_segment(start: i64, end: i64) -> RawChangeSegment {
        RawChangeSegment {
            start_day: start,
            end_day: end,
            break_day: end,
            observation_count: 30,
            change_probability: 1.0,
            curve_qa: 8,
            blue: Some(raw_band()),
            green: Some(raw_band()),
            red: Some(raw_band()),
            nir: Some(raw_band()),
            swir1: Some(raw_band()),
            swir2: Some(raw_band()),
            thermal: Some(raw_band()),
        }
    }

    fn record(start: i64, end: i64, top: usize) -> RawClassRecord {
        let mut probs = vec![0.0; CLASS_COUNT];
        probs[top] = 1.0;
        RawClassRecord {
            start_day: start,
            end_day: end,
            class_probs: probs,
            class_vals: (1..=CLASS_COUNT as i64).collect(),
        }
    }

    #[test]
    fn test_exact_match_beats_partial() {
        let records = vec![record(100, 150, 1), record(100, 200, 2), record(151, 200, 3)];
        let models = unify(&[raw_segment(100, 200)], &records).unwrap();
        assert_eq!(models[0].class_split(), 0);
        assert_eq!(models[0].class_at(120, 0), Some(3));
    }

    #[test]
    fn test_partial_match_builds_split() {
        let records = vec![record(100, 150, 1), record(151, 200, 3)];
        let models = unify(&[raw_segment(100, 200)], &records).unwrap();
        assert_eq!(models[0].class_split(), 151);
        assert_eq!(models[0].class_at(150, 0), Some(2));
        assert_eq!(models[0].class_at(151, 0), Some(4));
    }

    #[test]
    fn test_partial_without_closing_window_is_unclassified() {
        let records = vec![record(100, 150, 1)];
        let models = unify(&[raw_segment(100, 200)], &records).unwrap();
        assert!(!models[0].is_classified());
    }

    #[test]
    fn test_missing_band_is_data_format_error() {
        let mut seg = raw_segment(1, 2);
        seg.nir = None;
        let err = unify(&[seg], &[]).unwrap_err();
        assert!(matches!(err, MapifyError::DataFormat(msg) if msg.contains("nir")));
    }

    #[test]
    fn test_coefficient_length_is_validated() {
        let mut seg = raw_segment(1, 2);
        seg.red.as_mut().unwrap().coefficients = vec![1.0; 4];
        assert!(unify(&[seg.clone()], &[]).is_err());

        seg.red.as_mut().unwrap().coefficients = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let models = unify(&[seg], &[]).unwrap();
        assert_eq!(models[0].band(Band::Red).coefficients, [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_class_vector_length_is_validated() {
        let mut bad = record(1, 2, 0);
        bad.class_probs.pop();
        assert!(unify(&[raw_segment(1, 2)], &[bad]).is_err());
    }

    #[test]
    fn test_unify_sorted_orders_output() {
        let models = unify_sorted(&[raw_segment(300, 400), raw_segment(1, 200)], &[]).unwrap();
        assert_eq!(models[0].start_day, 1);
        assert_eq!(models[1].start_day, 300);
    }
}
