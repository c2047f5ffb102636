//! SessionReport - Session Orchestrator output
//!
//! What each learner did at the end of a session.

use serde::Serialize;

use crate::ParameterKey;

/// The four learners run at session end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LearnerKind {
    Sinusoid,
    Quintic,
    SafeDistance,
    TargetSpeed,
}

impl LearnerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LearnerKind::Sinusoid => "sinusoid",
            LearnerKind::Quintic => "quintic",
            LearnerKind::SafeDistance => "safe_distance",
            LearnerKind::TargetSpeed => "target_speed",
        }
    }

    /// Parameter written by this learner
    pub fn parameter(&self) -> ParameterKey {
        match self {
            LearnerKind::Sinusoid => ParameterKey::SinParam,
            LearnerKind::Quintic => ParameterKey::PolyParam,
            LearnerKind::SafeDistance => ParameterKey::SafeDistance,
            LearnerKind::TargetSpeed => ParameterKey::TargetSpeed,
        }
    }
}

/// Result of a single learner run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FitOutcome {
    /// Parameters were blended and stored
    Updated { changes: Vec<ScalarChange> },
    /// Nothing changed
    Skipped { reason: SkipReason },
}

impl FitOutcome {
    pub fn skipped(reason: SkipReason) -> Self {
        Self::Skipped { reason }
    }

    pub fn is_updated(&self) -> bool {
        matches!(self, FitOutcome::Updated { .. })
    }

    /// Change record for a named field, if updated
    pub fn change(&self, field: &str) -> Option<&ScalarChange> {
        match self {
            FitOutcome::Updated { changes } => changes.iter().find(|c| c.field == field),
            FitOutcome::Skipped { .. } => None,
        }
    }
}

/// One blended scalar
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScalarChange {
    pub field: &'static str,
    pub previous: f64,
    pub observed: f64,
    pub blended: f64,
}

/// Why a learner did not update
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// Not enough buffered samples
    InsufficientSamples { have: usize, need: usize },
    /// Lane-change segment too short (or absent)
    SegmentTooShort { have: usize, need: usize },
    /// Segment produced a non-positive or non-finite duration
    DegenerateSegment { dt: f64 },
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::InsufficientSamples { .. } => "insufficient_samples",
            SkipReason::SegmentTooShort { .. } => "segment_too_short",
            SkipReason::DegenerateSegment { .. } => "degenerate_segment",
        }
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::InsufficientSamples { have, need } => {
                write!(f, "insufficient samples ({have} < {need})")
            }
            SkipReason::SegmentTooShort { have, need } => {
                write!(f, "lane-change segment too short ({have} < {need})")
            }
            SkipReason::DegenerateSegment { dt } => write!(f, "degenerate segment (dt={dt})"),
        }
    }
}

/// Outcome of one learner within a session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LearnerOutcome {
    pub learner: LearnerKind,
    pub outcome: FitOutcome,
}

/// Session summary
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionReport {
    /// Outcomes of the enabled learners, in run order
    pub outcomes: Vec<LearnerOutcome>,

    /// Rows appended to the lane-change dataset
    pub dataset_rows_written: usize,
}

impl SessionReport {
    pub fn outcome(&self, learner: LearnerKind) -> Option<&FitOutcome> {
        self.outcomes
            .iter()
            .find(|o| o.learner == learner)
            .map(|o| &o.outcome)
    }

    pub fn updated_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.outcome.is_updated())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_lookup() {
        let report = SessionReport {
            outcomes: vec![
                LearnerOutcome {
                    learner: LearnerKind::SafeDistance,
                    outcome: FitOutcome::Updated {
                        changes: vec![ScalarChange {
                            field: "safe_distance",
                            previous: 10.0,
                            observed: 4.0,
                            blended: 9.0,
                        }],
                    },
                },
                LearnerOutcome {
                    learner: LearnerKind::TargetSpeed,
                    outcome: FitOutcome::skipped(SkipReason::InsufficientSamples {
                        have: 3,
                        need: 11,
                    }),
                },
            ],
            dataset_rows_written: 0,
        };

        assert_eq!(report.updated_count(), 1);
        let change = report
            .outcome(LearnerKind::SafeDistance)
            .and_then(|o| o.change("safe_distance"))
            .unwrap();
        assert_eq!(change.blended, 9.0);
        assert!(report.outcome(LearnerKind::Quintic).is_none());
    }

    #[test]
    fn test_report_serializes() {
        let outcome = FitOutcome::skipped(SkipReason::SegmentTooShort { have: 0, need: 10 });
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains("\"status\":\"skipped\""));
        assert!(json.contains("segment_too_short"));
    }
}
