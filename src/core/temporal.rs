use crate::core::segment::Segment;
use crate::types::Ordinal;

/// Where a query date falls relative to a sorted pixel history.
///
/// Gap variants carry the index of the segment preceding the gap; the
/// upcoming segment is `index + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalPosition {
    NoModels,
    Before,
    Within(usize),
    /// Both neighbours are classified and agree on the query date
    GapSameClass(usize),
    /// Classes differ and the preceding segment's genuine break is at or before the date
    GapDiffClassPreBreak(usize),
    /// Classes differ and the date sits between the segment end and a later break
    GapDiffClassPostEnd(usize),
    After,
    Indeterminate,
}

impl TemporalPosition {
    /// Classify `ordinal` against `models`, comparing gap neighbours at class `rank`
    pub fn locate(models: &[Segment], ordinal: Ordinal, rank: usize) -> Self {
        Self::locate_with(models, ordinal, Some(rank))
    }

    /// Classify `ordinal` using only the change-detection structure; gaps
    /// resolve through the preceding segment's break alone
    pub fn locate_unclassified(models: &[Segment], ordinal: Ordinal) -> Self {
        Self::locate_with(models, ordinal, None)
    }

    fn locate_with(models: &[Segment], ordinal: Ordinal, rank: Option<usize>) -> Self {
        let (first, last) = match (models.first(), models.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return TemporalPosition::NoModels,
        };

        if ordinal < first.start_day {
            return TemporalPosition::Before;
        }

        if let Some(i) = models.iter().position(|m| m.contains(ordinal)) {
            return TemporalPosition::Within(i);
        }

        if ordinal > last.end_day {
            return TemporalPosition::After;
        }

        let Some(i) = Self::enclosing_gap(models, ordinal) else {
            return TemporalPosition::Indeterminate;
        };
        let (prev, next) = (&models[i], &models[i + 1]);
        if let Some(rank) = rank {
            if let (Some(a), Some(b)) = (prev.class_at(ordinal, rank), next.class_at(ordinal, rank)) {
                if a == b {
                    return TemporalPosition::GapSameClass(i);
                }
            }
        }
        if prev.has_break() && ordinal >= prev.break_day {
            return TemporalPosition::GapDiffClassPreBreak(i);
        }
        if ordinal < prev.break_day {
            return TemporalPosition::GapDiffClassPostEnd(i);
        }
        TemporalPosition::Indeterminate
    }

    /// Index of the segment preceding the gap that holds `ordinal`
    pub fn enclosing_gap(models: &[Segment], ordinal: Ordinal) -> Option<usize> {
        models
            .windows(2)
            .position(|pair| pair[0].end_day < ordinal && ordinal < pair[1].start_day)
    }

    /// Index of the segment whose model stands in for the date, ignoring class
    /// policy: the containing segment, the first before the series, the last
    /// after it, and the upcoming one inside a gap
    pub fn representative(self, models: &[Segment]) -> Option<usize> {
        match self {
            TemporalPosition::NoModels | TemporalPosition::Indeterminate => None,
            TemporalPosition::Before => Some(0),
            TemporalPosition::Within(i) => Some(i),
            TemporalPosition::GapSameClass(i)
            | TemporalPosition::GapDiffClassPreBreak(i)
            | TemporalPosition::GapDiffClassPostEnd(i) => Some(i + 1),
            TemporalPosition::After => models.len().checked_sub(1),
        }
    }

    pub fn is_gap(self) -> bool {
        matches!(
            self,
            TemporalPosition::GapSameClass(_)
                | TemporalPosition::GapDiffClassPreBreak(_)
                | TemporalPosition::GapDiffClassPostEnd(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::segment::fixtures::segment;
    use crate::core::segment::Classification;

    #[test]
    fn test_locate_basic_positions() {
        let models = vec![segment(100, 200, 200, 0, 0.9), segment(210, 300, 0, 0, 0.9)];
        assert_eq!(TemporalPosition::locate(&[], 150, 0), TemporalPosition::NoModels);
        assert_eq!(TemporalPosition::locate(&models, 50, 0), TemporalPosition::Before);
        assert_eq!(TemporalPosition::locate(&models, 100, 0), TemporalPosition::Within(0));
        assert_eq!(TemporalPosition::locate(&models, 300, 0), TemporalPosition::Within(1));
        assert_eq!(TemporalPosition::locate(&models, 301, 0), TemporalPosition::After);
        assert_eq!(TemporalPosition::locate(&models, 205, 0), TemporalPosition::GapSameClass(0));
    }

    #[test]
    fn test_locate_different_class_gaps() {
        let models = vec![segment(100, 200, 204, 0, 0.9), segment(210, 300, 0, 3, 0.9)];
        assert_eq!(
            TemporalPosition::locate(&models, 202, 0),
            TemporalPosition::GapDiffClassPostEnd(0)
        );
        assert_eq!(
            TemporalPosition::locate(&models, 204, 0),
            TemporalPosition::GapDiffClassPreBreak(0)
        );
        assert_eq!(TemporalPosition::locate(&models, 204, 0).representative(&models), Some(1));
    }

    #[test]
    fn test_gap_without_break_is_indeterminate() {
        // Differing classes across a gap the preceding segment never broke into.
        let models = vec![segment(100, 200, 0, 0, 0.9), segment(300, 400, 0, 3, 0.9)];
        assert_eq!(TemporalPosition::locate(&models, 250, 0), TemporalPosition::Indeterminate);
        assert_eq!(TemporalPosition::locate(&models, 250, 0).representative(&models), None);
    }

    #[test]
    fn test_unclassified_locate_ignores_classes() {
        let models = vec![segment(100, 200, 200, 0, 0.9), segment(210, 300, 0, 0, 0.9)];
        assert_eq!(
            TemporalPosition::locate_unclassified(&models, 205),
            TemporalPosition::GapDiffClassPreBreak(0)
        );
        let unbroken = vec![segment(100, 200, 0, 0, 0.9), segment(210, 300, 0, 0, 0.9)];
        assert_eq!(
            TemporalPosition::locate_unclassified(&unbroken, 205),
            TemporalPosition::Indeterminate
        );
    }

    #[test]
    fn test_unclassified_neighbours_never_share_a_class() {
        let mut models = vec![segment(100, 200, 200, 0, 0.9), segment(210, 300, 0, 0, 0.9)];
        for m in models.iter_mut() {
            m.classification = Classification::Unclassified;
        }
        assert_eq!(
            TemporalPosition::locate(&models, 205, 0),
            TemporalPosition::GapDiffClassPreBreak(0)
        );
        assert_eq!(TemporalPosition::enclosing_gap(&models, 205), Some(0));
        assert_eq!(TemporalPosition::enclosing_gap(&models, 150), None);
    }
}
