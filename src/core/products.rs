use crate::calendar;
use crate::core::segment::{Band, Segment};
use crate::core::temporal::TemporalPosition;
use crate::types::{ClassCode, MapifyError, MapifyResult, Ordinal};
use serde::{Deserialize, Serialize};

/// Fill policy for land-cover products
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandCoverParams {
    /// Use the first segment's class before the series starts
    pub fill_begin: bool,
    /// Use the last segment's class after the series ends
    pub fill_end: bool,
    /// Fill gaps whose neighbours share a class
    pub fill_samelc: bool,
    /// Fill gaps whose neighbours differ with the later segment's class
    pub fill_difflc: bool,
    /// Value for no models, disabled fills and unclassified segments
    pub nodata: ClassCode,
    /// Value for dates no policy can resolve
    pub unresolved: ClassCode,
}

impl Default for LandCoverParams {
    fn default() -> Self {
        Self {
            fill_begin: true,
            fill_end: true,
            fill_samelc: true,
            fill_difflc: true,
            nodata: 0,
            unresolved: 0,
        }
    }
}

/// Sentinel codes written to confidence rasters where no probability applies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceCodes {
    pub no_model: u8,
    /// Grass/shrub to tree transition within one segment
    pub growth: u8,
    /// Tree to grass/shrub transition within one segment
    pub decline: u8,
    pub before_first: u8,
    pub same_class_gap: u8,
    pub diff_class_gap: u8,
    /// After the last segment, which ended in a break
    pub after_break: u8,
    /// After the last segment, which ran to the end of the series
    pub after_stable: u8,
    pub grass_class: ClassCode,
    pub tree_class: ClassCode,
}

impl Default for ConfidenceCodes {
    fn default() -> Self {
        Self {
            no_model: 0,
            growth: 151,
            decline: 152,
            before_first: 201,
            same_class_gap: 202,
            diff_class_gap: 211,
            after_break: 212,
            after_stable: 213,
            grass_class: 3,
            tree_class: 4,
        }
    }
}

/// Land-cover class ranked `rank` (0 = primary) on `ordinal`
pub fn land_cover(models: &[Segment], ordinal: Ordinal, rank: usize, params: &LandCoverParams) -> ClassCode {
    if ordinal <= 0 || borders_unclassified_gap(models, ordinal) {
        return params.nodata;
    }

    let class = match TemporalPosition::locate(models, ordinal, rank) {
        TemporalPosition::NoModels => None,
        TemporalPosition::Indeterminate => return params.unresolved,
        TemporalPosition::Within(i) => models[i].class_at(ordinal, rank),
        TemporalPosition::Before if params.fill_begin => models[0].class_at(ordinal, rank),
        TemporalPosition::After if params.fill_end => models.last().and_then(|m| m.class_at(ordinal, rank)),
        TemporalPosition::GapSameClass(i) if params.fill_samelc => models[i + 1].class_at(ordinal, rank),
        TemporalPosition::GapDiffClassPreBreak(i) | TemporalPosition::GapDiffClassPostEnd(i)
            if params.fill_difflc =>
        {
            models[i + 1].class_at(ordinal, rank)
        }
        TemporalPosition::Before
        | TemporalPosition::After
        | TemporalPosition::GapSameClass(_)
        | TemporalPosition::GapDiffClassPreBreak(_)
        | TemporalPosition::GapDiffClassPostEnd(_) => None,
    };

    class.unwrap_or(params.nodata)
}

/// Confidence (1..=100) of the class ranked `rank`, or a sentinel code
pub fn land_cover_confidence(
    models: &[Segment],
    ordinal: Ordinal,
    rank: usize,
    codes: &ConfidenceCodes,
) -> MapifyResult<u8> {
    if borders_unclassified_gap(models, ordinal) {
        return Ok(codes.no_model);
    }

    match TemporalPosition::locate(models, ordinal, rank) {
        TemporalPosition::NoModels => Ok(codes.no_model),
        TemporalPosition::Within(i) => Ok(within_confidence(&models[i], ordinal, rank, codes)),
        TemporalPosition::Before => Ok(codes.before_first),
        TemporalPosition::After => match models.last() {
            Some(last) if last.has_break() => Ok(codes.after_break),
            _ => Ok(codes.after_stable),
        },
        TemporalPosition::GapSameClass(_) => Ok(codes.same_class_gap),
        TemporalPosition::GapDiffClassPreBreak(_) | TemporalPosition::GapDiffClassPostEnd(_) => {
            Ok(codes.diff_class_gap)
        }
        TemporalPosition::Indeterminate => Err(MapifyError::UnresolvedTemporalState { ordinal }),
    }
}

/// True when `ordinal` sits in a gap next to a segment without classification
fn borders_unclassified_gap(models: &[Segment], ordinal: Ordinal) -> bool {
    TemporalPosition::enclosing_gap(models, ordinal)
        .map_or(false, |i| !models[i].is_classified() || !models[i + 1].is_classified())
}

fn within_confidence(model: &Segment, ordinal: Ordinal, rank: usize, codes: &ConfidenceCodes) -> u8 {
    // Split segments are labelled by their class before the split
    if model.class_split() > 0 {
        let before = model.argmax_class(&model.class_probs_1());
        if before == codes.grass_class {
            return codes.growth;
        }
        if before == codes.tree_class {
            return codes.decline;
        }
    }

    match model.ranked_class_at(ordinal, rank) {
        Some((_, prob)) => scale_confidence(prob),
        None => codes.no_model,
    }
}

fn scale_confidence(prob: f64) -> u8 {
    (prob * 100.0).round().clamp(1.0, 100.0) as u8
}

/// First segment with a genuine break in the calendar year of `ordinal`
fn break_in_year(models: &[Segment], ordinal: Ordinal) -> Option<&Segment> {
    if ordinal <= 0 {
        return None;
    }
    let year = calendar::year_of(ordinal)?;
    models
        .iter()
        .find(|m| m.has_break() && calendar::year_of(m.break_day) == Some(year))
}

/// Day of year of a break detected in the query's year, 0 when none
pub fn change_day_of_year(models: &[Segment], ordinal: Ordinal) -> u16 {
    break_in_year(models, ordinal)
        .and_then(|m| calendar::day_of_year(m.break_day))
        .unwrap_or(0)
}

/// Spectral magnitude of a break detected in the query's year, 0.0 when none
pub fn change_magnitude(models: &[Segment], ordinal: Ordinal) -> f32 {
    break_in_year(models, ordinal)
        .map(|m| {
            Band::MAGNITUDE
                .iter()
                .map(|&b| m.band(b).magnitude.powi(2))
                .sum::<f64>()
                .sqrt() as f32
        })
        .unwrap_or(0.0)
}

/// Curve QA of the segment containing `ordinal`, 0 when none does
pub fn model_quality(models: &[Segment], ordinal: Ordinal) -> u8 {
    models
        .iter()
        .find(|m| m.contains(ordinal))
        .map(|m| m.curve_qa)
        .unwrap_or(0)
}

/// Days since the nearest segment boundary behind `ordinal`, bounded by the series epoch
pub fn segment_length(models: &[Segment], ordinal: Ordinal, series_epoch: Ordinal) -> i64 {
    models
        .iter()
        .map(|m| {
            if ordinal > m.end_day {
                ordinal.checked_sub(m.end_day)
            } else {
                ordinal.checked_sub(m.start_day)
            }
        })
        .chain(std::iter::once(ordinal.checked_sub(series_epoch)))
        .flatten()
        .filter(|&d| d >= 0)
        .min()
        .unwrap_or(0)
}

/// Days since the most recent genuine break at or before `ordinal`, 0 when none
pub fn time_since_last_break(models: &[Segment], ordinal: Ordinal) -> i64 {
    models
        .iter()
        .filter(|m| m.has_break())
        .filter_map(|m| ordinal.checked_sub(m.break_day))
        .filter(|&d| d >= 0)
        .min()
        .unwrap_or(0)
}

/// Primary class transition over the year ending on `ordinal`.
///
/// Returns the class itself when unchanged, otherwise `previous * 10 + current`.
/// Either side falling back to a sentinel yields `params.nodata`.
pub fn from_to(models: &[Segment], ordinal: Ordinal, params: &LandCoverParams) -> MapifyResult<ClassCode> {
    let current = land_cover(models, ordinal, 0, params);
    let previous = match calendar::one_year_prior(ordinal) {
        Some(prior) => land_cover(models, prior, 0, params),
        None => params.nodata,
    };

    let sentinels = [params.nodata, params.unresolved];
    if sentinels.contains(&previous) || sentinels.contains(&current) {
        return Ok(params.nodata);
    }
    if previous == current {
        return Ok(current);
    }

    previous
        .checked_mul(10)
        .and_then(|p| p.checked_add(current))
        .filter(|_| current < 10)
        .ok_or_else(|| {
            MapifyError::DataFormat(format!(
                "Transition {} -> {} does not fit the two-digit encoding",
                previous, current
            ))
        })
}
