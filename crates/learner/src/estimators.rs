//! Safe-distance and target-speed estimators
//!
//! Both average a percentile slice of the buffered samples and blend the
//! result into the stored scalar.

use contracts::{
    ContractError, FitOutcome, LearnerKind, SafeDistanceConfig, SkipReason, TargetSpeedConfig,
    Vector3,
};
use tracing::info;

use crate::blend::blend_field;
use crate::session::{Learner, LearningContext};

/// Number of samples averaged out of `total`
fn selected_count(percentile: f64, total: usize) -> usize {
    (percentile * total as f64).floor() as usize
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Mean of the smallest `floor(percentile · n)` finite distances
///
/// Non-finite readings are ignored.
pub fn estimate_safe_distance(
    distances: &[f64],
    config: &SafeDistanceConfig,
) -> Result<f64, SkipReason> {
    let mut sorted: Vec<f64> = distances.iter().copied().filter(|d| d.is_finite()).collect();
    let count = selected_count(config.percentile, sorted.len());
    if count <= config.min_selected {
        return Err(SkipReason::InsufficientSamples {
            have: count,
            need: config.min_selected + 1,
        });
    }

    sorted.sort_by(f64::total_cmp);
    Ok(mean(&sorted[..count]))
}

/// Scaled longitudinal speed of a straight-driving sample
///
/// `|v_x|` must exceed the minimum speed and `|v_x| / |v_y|` the straightness
/// ratio. A sample with `v_y == 0` is excluded.
pub fn straight_driving_speed(velocity: &Vector3, config: &TargetSpeedConfig) -> Option<f64> {
    let vx = velocity.x.abs();
    let vy = velocity.y.abs();
    if !vx.is_finite() || !vy.is_finite() || vy == 0.0 {
        return None;
    }
    (vx > config.min_longitudinal_speed && vx / vy > config.min_straightness_ratio)
        .then(|| vx * config.speed_scale)
}

/// Mean of the top `floor(percentile · n)` straight-driving speeds
pub fn estimate_target_speed(
    velocities: &[Vector3],
    config: &TargetSpeedConfig,
) -> Result<f64, SkipReason> {
    let mut speeds: Vec<f64> = velocities
        .iter()
        .filter_map(|v| straight_driving_speed(v, config))
        .collect();
    let count = selected_count(config.percentile, speeds.len());
    if count <= config.min_selected {
        return Err(SkipReason::InsufficientSamples {
            have: count,
            need: config.min_selected + 1,
        });
    }

    speeds.sort_by(|a, b| b.total_cmp(a));
    Ok(mean(&speeds[..count]))
}

/// Learns `safe_distance` from the distance buffer
#[derive(Debug, Clone, Copy, Default)]
pub struct SafeDistanceEstimator;

impl Learner for SafeDistanceEstimator {
    fn kind(&self) -> LearnerKind {
        LearnerKind::SafeDistance
    }

    fn learn(&self, ctx: &mut LearningContext) -> Result<FitOutcome, ContractError> {
        let estimate = estimate_safe_distance(ctx.buffers.distances(), &ctx.config.safe_distance);
        let observed = match estimate {
            Ok(value) => value,
            Err(reason) => return Ok(FitOutcome::skipped(reason)),
        };

        let change = blend_field(
            "safe_distance",
            ctx.store.safe_distance(),
            observed,
            ctx.config.max_change_rate,
        );
        ctx.store.set_safe_distance(change.blended)?;
        ctx.buffers.clear_distances();

        info!(
            parameter = "safe_distance",
            old = change.previous,
            observed,
            new = change.blended,
            "Safe distance updated"
        );
        Ok(FitOutcome::Updated {
            changes: vec![change],
        })
    }
}

/// Learns `target_speed` from the velocity buffer
#[derive(Debug, Clone, Copy, Default)]
pub struct TargetSpeedEstimator;

impl Learner for TargetSpeedEstimator {
    fn kind(&self) -> LearnerKind {
        LearnerKind::TargetSpeed
    }

    fn learn(&self, ctx: &mut LearningContext) -> Result<FitOutcome, ContractError> {
        let estimate = estimate_target_speed(ctx.buffers.velocities(), &ctx.config.target_speed);
        let observed = match estimate {
            Ok(value) => value,
            Err(reason) => return Ok(FitOutcome::skipped(reason)),
        };

        let change = blend_field(
            "target_speed",
            ctx.store.target_speed(),
            observed,
            ctx.config.max_change_rate,
        );
        ctx.store.set_target_speed(change.blended)?;
        ctx.buffers.clear_velocities();

        info!(
            parameter = "target_speed",
            old = change.previous,
            observed,
            new = change.blended,
            "Target speed updated"
        );
        Ok(FitOutcome::Updated {
            changes: vec![change],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn distances_scenario() -> Vec<f64> {
        // lowest 6 of 30 average to 4.0
        let mut d = vec![3.0, 4.0, 5.0, 3.0, 4.0, 5.0];
        d.extend(vec![20.0; 24]);
        d
    }

    #[test]
    fn test_safe_distance_lowest_fifth() {
        let value = estimate_safe_distance(&distances_scenario(), &SafeDistanceConfig::default());
        assert_eq!(value, Ok(4.0));
    }

    #[test]
    fn test_safe_distance_needs_more_than_five_selected() {
        // 29 samples -> floor(5.8) = 5, not enough
        let distances = vec![10.0; 29];
        let err = estimate_safe_distance(&distances, &SafeDistanceConfig::default()).unwrap_err();
        assert_eq!(err, SkipReason::InsufficientSamples { have: 5, need: 6 });
    }

    #[test]
    fn test_safe_distance_ignores_non_finite() {
        let mut distances = distances_scenario();
        distances.push(f64::NAN);
        distances.push(f64::INFINITY);
        assert_eq!(
            estimate_safe_distance(&distances, &SafeDistanceConfig::default()),
            Ok(4.0)
        );
    }

    #[test]
    fn test_straight_driving_filter() {
        let config = TargetSpeedConfig::default();

        assert_eq!(
            straight_driving_speed(&Vector3::new(10.0, 0.1, 0.0), &config),
            Some(36.0)
        );
        // too slow
        assert_eq!(straight_driving_speed(&Vector3::new(3.9, 0.01, 0.0), &config), None);
        // turning
        assert_eq!(straight_driving_speed(&Vector3::new(10.0, 1.0, 0.0), &config), None);
        // v_y == 0 is excluded
        assert_eq!(straight_driving_speed(&Vector3::new(10.0, 0.0, 0.0), &config), None);
        // reversing counts by magnitude
        assert_eq!(
            straight_driving_speed(&Vector3::new(-10.0, 0.1, 0.0), &config),
            Some(36.0)
        );
    }

    #[test]
    fn test_target_speed_top_fifth() {
        // 55 straight samples: 11 at 10 m/s, 44 at 5 m/s
        let mut velocities = vec![Vector3::new(10.0, 0.1, 0.0); 11];
        velocities.extend(vec![Vector3::new(5.0, 0.1, 0.0); 44]);
        // filtered out
        velocities.extend(vec![Vector3::new(10.0, 2.0, 0.0); 20]);

        let value = estimate_target_speed(&velocities, &TargetSpeedConfig::default()).unwrap();
        assert!((value - 36.0).abs() < 1e-12, "got: {value}");
    }

    #[test]
    fn test_target_speed_insufficient() {
        let velocities = vec![Vector3::new(10.0, 0.1, 0.0); 54];
        let err = estimate_target_speed(&velocities, &TargetSpeedConfig::default()).unwrap_err();
        assert_eq!(err, SkipReason::InsufficientSamples { have: 10, need: 11 });
    }
}
