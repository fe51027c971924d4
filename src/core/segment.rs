use crate::types::{ClassCode, Ordinal, BAND_COUNT, CLASS_COUNT};
use serde::{Deserialize, Serialize};

/// Landsat surface-reflectance bands in canonical order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Band {
    Blue,
    Green,
    Red,
    Nir,
    Swir1,
    Swir2,
    Thermal,
}

impl Band {
    /// All bands, in the order models and synthetic outputs use
    pub const ALL: [Band; BAND_COUNT] = [
        Band::Blue,
        Band::Green,
        Band::Red,
        Band::Nir,
        Band::Swir1,
        Band::Swir2,
        Band::Thermal,
    ];

    /// Bands contributing to change magnitude: everything but blue and thermal
    pub const MAGNITUDE: [Band; 5] = [Band::Green, Band::Red, Band::Nir, Band::Swir1, Band::Swir2];

    pub fn index(self) -> usize {
        match self {
            Band::Blue => 0,
            Band::Green => 1,
            Band::Red => 2,
            Band::Nir => 3,
            Band::Swir1 => 4,
            Band::Swir2 => 5,
            Band::Thermal => 6,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Band::Blue => "blue",
            Band::Green => "green",
            Band::Red => "red",
            Band::Nir => "nir",
            Band::Swir1 => "swir1",
            Band::Swir2 => "swir2",
            Band::Thermal => "thermal",
        }
    }
}

impl std::fmt::Display for Band {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One band's harmonic curve fit for a segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandModel {
    pub name: Band,
    /// Spectral change magnitude at the segment's break
    pub magnitude: f64,
    pub rmse: f64,
    pub intercept: f64,
    /// `[slope, cos1, sin1, cos2, sin2, cos3, sin3]`
    pub coefficients: [f64; 7],
}

impl BandModel {
    pub fn slope(&self) -> f64 {
        self.coefficients[0]
    }

    /// Cosine and sine coefficients of the k-th harmonic (k = 1..=3)
    pub fn harmonic(&self, k: usize) -> (f64, f64) {
        (self.coefficients[2 * k - 1], self.coefficients[2 * k])
    }
}

/// Class probability vector
pub type ClassProbs = [f64; CLASS_COUNT];

/// Land-cover classification attached to a segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Classification {
    /// No classification record covered the segment
    Unclassified,
    /// One record covers the whole segment
    Single { probs: ClassProbs },
    /// Probabilities switch from `before` to `after` on `split_day`
    Split {
        split_day: Ordinal,
        before: ClassProbs,
        after: ClassProbs,
    },
}

/// Identity class labels used when no record supplies them
pub fn default_class_vals() -> [ClassCode; CLASS_COUNT] {
    let mut vals = [0; CLASS_COUNT];
    for (i, v) in vals.iter_mut().enumerate() {
        *v = (i + 1) as ClassCode;
    }
    vals
}

/// A CCD segment unified with its land-cover classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start_day: Ordinal,
    pub end_day: Ordinal,
    /// 0 when no break was detected
    pub break_day: Ordinal,
    pub obs_count: u32,
    pub change_prob: f64,
    pub curve_qa: u8,
    pub bands: [BandModel; BAND_COUNT],
    pub classification: Classification,
    pub class_vals: [ClassCode; CLASS_COUNT],
}

impl Segment {
    pub fn contains(&self, ordinal: Ordinal) -> bool {
        self.start_day <= ordinal && ordinal <= self.end_day
    }

    /// True when the segment ended in a genuine spectral break
    pub fn has_break(&self) -> bool {
        self.change_prob == 1.0 && self.break_day > 0
    }

    pub fn band(&self, band: Band) -> &BandModel {
        &self.bands[band.index()]
    }

    /// Pivot day of a split classification, 0 when not split
    pub fn class_split(&self) -> Ordinal {
        match self.classification {
            Classification::Split { split_day, .. } => split_day,
            _ => 0,
        }
    }

    pub fn class_probs_1(&self) -> ClassProbs {
        match &self.classification {
            Classification::Unclassified => [0.0; CLASS_COUNT],
            Classification::Single { probs } => *probs,
            Classification::Split { before, .. } => *before,
        }
    }

    pub fn class_probs_2(&self) -> ClassProbs {
        match &self.classification {
            Classification::Split { after, .. } => *after,
            _ => [0.0; CLASS_COUNT],
        }
    }

    pub fn is_classified(&self) -> bool {
        !matches!(self.classification, Classification::Unclassified)
    }

    /// Probability vector in force on `ordinal`
    pub fn probs_at(&self, ordinal: Ordinal) -> Option<&ClassProbs> {
        match &self.classification {
            Classification::Unclassified => None,
            Classification::Single { probs } => Some(probs),
            Classification::Split {
                split_day,
                before,
                after,
            } => {
                if *split_day <= ordinal {
                    Some(after)
                } else {
                    Some(before)
                }
            }
        }
    }

    /// Class code and probability ranked `rank` (0 = most probable) on `ordinal`
    pub fn ranked_class_at(&self, ordinal: Ordinal, rank: usize) -> Option<(ClassCode, f64)> {
        let probs = self.probs_at(ordinal)?;
        let idx = *ranked_indices(probs).get(rank)?;
        Some((self.class_vals[idx], probs[idx]))
    }

    pub fn class_at(&self, ordinal: Ordinal, rank: usize) -> Option<ClassCode> {
        self.ranked_class_at(ordinal, rank).map(|(class, _)| class)
    }

    /// Primary class of a probability vector
    pub fn argmax_class(&self, probs: &ClassProbs) -> ClassCode {
        self.class_vals[ranked_indices(probs)[0]]
    }
}

/// Indices of a probability vector ordered by descending probability.
/// Ties keep index order.
pub fn ranked_indices(probs: &ClassProbs) -> [usize; CLASS_COUNT] {
    let mut idx = [0usize; CLASS_COUNT];
    for (i, v) in idx.iter_mut().enumerate() {
        *v = i;
    }
    idx.sort_by(|&a, &b| probs[b].total_cmp(&probs[a]));
    idx
}

/// Sort a pixel history by segment start
pub fn sort_models(models: &mut [Segment]) {
    models.sort_by_key(|m| m.start_day);
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_ranked_indices_descending_with_stable_ties() {
        let mut probs = [0.0; CLASS_COUNT];
        probs[4] = 0.5;
        probs[2] = 0.3;
        probs[7] = 0.3;
        let ranked = ranked_indices(&probs);
        assert_eq!(&ranked[..4], &[4, 2, 7, 0]);
    }

    #[test]
    fn test_ranked_indices_orders_nan_consistently() {
        let mut probs = [0.1; CLASS_COUNT];
        probs[1] = f64::NAN;
        probs[6] = 0.7;
        let ranked = ranked_indices(&probs);
        assert_eq!(&ranked[..3], &[1, 6, 0]);
        assert_eq!(ranked_indices(&probs), ranked);
    }

    #[test]
    fn test_split_classification_switches_on_split_day() {
        let mut seg = segment(730_000, 731_000, 731_000, 2, 0.8);
        seg.classification = Classification::Split {
            split_day: 730_500,
            before: one_hot(2, 0.8),
            after: one_hot(3, 0.7),
        };
        assert_eq!(seg.class_at(730_499, 0), Some(3));
        assert_eq!(seg.class_at(730_500, 0), Some(4));
        assert_eq!(seg.class_split(), 730_500);
        assert_eq!(seg.class_probs_2()[3], 0.7);
    }

    #[test]
    fn test_unclassified_exposes_zero_vectors() {
        let mut seg = segment(1, 10, 0, 0, 0.9);
        seg.classification = Classification::Unclassified;
        assert_eq!(seg.class_split(), 0);
        assert_eq!(seg.class_probs_1(), [0.0; CLASS_COUNT]);
        assert_eq!(seg.class_probs_2(), [0.0; CLASS_COUNT]);
        assert_eq!(seg.class_at(5, 0), None);
    }

    #[test]
    fn test_sort_models_orders_by_start() {
        let mut models = vec![segment(200, 300, 0, 0, 0.9), segment(1, 100, 100, 0, 0.9)];
        sort_models(&mut models);
        assert_eq!(models[0].start_day, 1);
    }
}
