//! Lane-change segment extraction
//!
//! Poses are expressed in the frame of the first sample; every sample whose
//! lateral coordinate drops by more than the threshold since the previous
//! sample is kept. The kept points are re-zeroed against the first of them.

use contracts::PoseSample;
use nalgebra::{Isometry2, Point2, Vector2};

/// Lane-change portion of a trajectory, in the reference pose's frame
///
/// `xs`, `ys` in meters, `ts` in seconds; all re-zeroed so the first point is
/// `(0, 0, 0)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaneChangeSegment {
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
    pub ts: Vec<f64>,
    /// Input index of the first kept sample
    pub start_index: Option<usize>,
}

impl LaneChangeSegment {
    pub fn len(&self) -> usize {
        self.ts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ts.is_empty()
    }

    /// `t_end - t_start` (s)
    pub fn duration(&self) -> f64 {
        span(&self.ts)
    }

    /// `x_end - x_start` (m)
    pub fn longitudinal_displacement(&self) -> f64 {
        span(&self.xs)
    }

    /// `y_end - y_start` (m)
    pub fn lateral_displacement(&self) -> f64 {
        span(&self.ys)
    }
}

fn span(values: &[f64]) -> f64 {
    match (values.first(), values.last()) {
        (Some(first), Some(last)) => last - first,
        _ => 0.0,
    }
}

/// Frame of a reference pose (translation plus yaw in degrees)
fn reference_frame(pose: &PoseSample) -> Isometry2<f64> {
    Isometry2::new(Vector2::new(pose.x, pose.y), pose.yaw.to_radians())
}

/// Extract the lane-change segment from `poses`
///
/// A sample `i >= 1` qualifies when `y_local[i] - y_local[i - 1] < threshold`.
/// Fewer than two poses, or no qualifying sample, yields an empty segment.
pub fn extract_lane_change(poses: &[PoseSample], threshold: f64) -> LaneChangeSegment {
    let Some(reference) = poses.first() else {
        return LaneChangeSegment::default();
    };
    if poses.len() < 2 {
        return LaneChangeSegment::default();
    }

    let frame = reference_frame(reference);
    let local: Vec<Point2<f64>> = poses
        .iter()
        .map(|p| frame.inverse_transform_point(&Point2::new(p.x, p.y)))
        .collect();

    let kept: Vec<usize> = (1..poses.len())
        .filter(|&i| local[i].y - local[i - 1].y < threshold)
        .collect();

    let Some(&first) = kept.first() else {
        return LaneChangeSegment::default();
    };

    let origin = local[first];
    let t0 = poses[first].timestamp_ms / 1000.0;

    let mut segment = LaneChangeSegment {
        start_index: Some(first),
        ..Default::default()
    };
    for &i in &kept {
        segment.xs.push(local[i].x - origin.x);
        segment.ys.push(local[i].y - origin.y);
        segment.ts.push(poses[i].timestamp_ms / 1000.0 - t0);
    }
    segment
}
