//! Quintic lane-change trajectory
//!
//! Each axis follows `p(t) = c0 + c1 t + c2 t^2 + c3 t^3 + c4 t^4 + c5 t^5`
//! with the coefficients fixed by position, velocity and acceleration at
//! `t = 0` and `t = dt`.

use contracts::{
    ContractError, FitOutcome, LearnerKind, PolyParam, SkipReason, QUINTIC_COEFFS,
};
use nalgebra::{Matrix6, Vector6};
use tracing::{debug, info};

use crate::blend::blend_field;
use crate::buffer::poses;
use crate::segment::extract_lane_change;
use crate::session::{Learner, LearningContext};

/// Boundary conditions of one axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisBoundary {
    pub start_position: f64,
    pub start_velocity: f64,
    pub start_acceleration: f64,
    pub end_position: f64,
    pub end_velocity: f64,
    pub end_acceleration: f64,
}

impl AxisBoundary {
    /// Rest-to-rest lateral move by `displacement`
    pub fn lateral(displacement: f64) -> Self {
        Self {
            start_position: 0.0,
            start_velocity: 0.0,
            start_acceleration: 0.0,
            end_position: displacement,
            end_velocity: 0.0,
            end_acceleration: 0.0,
        }
    }

    /// Constant-speed longitudinal move by `displacement`
    pub fn longitudinal(displacement: f64, speed: f64) -> Self {
        Self {
            start_position: 0.0,
            start_velocity: speed,
            start_acceleration: 0.0,
            end_position: displacement,
            end_velocity: speed,
            end_acceleration: 0.0,
        }
    }

    fn to_vector(self) -> Vector6<f64> {
        Vector6::new(
            self.start_position,
            self.start_velocity,
            self.start_acceleration,
            self.end_position,
            self.end_velocity,
            self.end_acceleration,
        )
    }
}

/// Value, first and second derivative rows of `[1, t, .., t^5]` at 0 and `dt`
pub fn boundary_matrix(dt: f64) -> Matrix6<f64> {
    let t = dt;
    let t2 = t * t;
    let t3 = t2 * t;
    let t4 = t3 * t;
    let t5 = t4 * t;

    #[rustfmt::skip]
    let rows = [
        1.0, 0.0, 0.0, 0.0,      0.0,       0.0,
        0.0, 1.0, 0.0, 0.0,      0.0,       0.0,
        0.0, 0.0, 2.0, 0.0,      0.0,       0.0,
        1.0, t,   t2,  t3,       t4,        t5,
        0.0, 1.0, 2.0 * t, 3.0 * t2, 4.0 * t3,  5.0 * t4,
        0.0, 0.0, 2.0, 6.0 * t,  12.0 * t2, 20.0 * t3,
    ];
    Matrix6::from_row_slice(&rows)
}

/// Solve the boundary system of one axis
///
/// Returns `None` for a non-positive or non-finite `dt`, or when the system
/// is singular.
pub fn solve_quintic(dt: f64, boundary: AxisBoundary) -> Option<[f64; QUINTIC_COEFFS]> {
    if !dt.is_finite() || dt <= 0.0 {
        return None;
    }

    let coeffs = boundary_matrix(dt).lu().solve(&boundary.to_vector())?;
    if coeffs.iter().any(|c| !c.is_finite()) {
        return None;
    }

    let mut out = [0.0; QUINTIC_COEFFS];
    out.copy_from_slice(coeffs.as_slice());
    Some(out)
}

fn eval(coeffs: &[f64; QUINTIC_COEFFS], t: f64) -> f64 {
    coeffs.iter().rev().fold(0.0, |acc, c| acc * t + c)
}

fn eval_velocity(c: &[f64; QUINTIC_COEFFS], t: f64) -> f64 {
    c[1] + t * (2.0 * c[2] + t * (3.0 * c[3] + t * (4.0 * c[4] + t * 5.0 * c[5])))
}

fn eval_acceleration(c: &[f64; QUINTIC_COEFFS], t: f64) -> f64 {
    2.0 * c[2] + t * (6.0 * c[3] + t * (12.0 * c[4] + t * 20.0 * c[5]))
}

/// Planned lane-change path from a stored `PolyParam`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuinticTrajectory {
    pub lon: [f64; QUINTIC_COEFFS],
    pub lat: [f64; QUINTIC_COEFFS],
    pub dt: f64,
}

/// One sampled point of a planned path
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectoryPoint {
    pub t: f64,
    pub x: f64,
    pub y: f64,
}

impl QuinticTrajectory {
    pub fn from_param(param: &PolyParam) -> Self {
        Self {
            lon: param.lon_param,
            lat: param.lat_param,
            dt: param.dt,
        }
    }

    /// `(x, y)` at time `t`
    pub fn position(&self, t: f64) -> (f64, f64) {
        (eval(&self.lon, t), eval(&self.lat, t))
    }

    pub fn velocity(&self, t: f64) -> (f64, f64) {
        (eval_velocity(&self.lon, t), eval_velocity(&self.lat, t))
    }

    pub fn acceleration(&self, t: f64) -> (f64, f64) {
        (eval_acceleration(&self.lon, t), eval_acceleration(&self.lat, t))
    }

    /// `steps + 1` evenly spaced points over `[0, dt]`
    pub fn sample(&self, steps: usize) -> Vec<TrajectoryPoint> {
        let steps = steps.max(1);
        (0..=steps)
            .map(|i| {
                let t = self.dt * i as f64 / steps as f64;
                let (x, y) = self.position(t);
                TrajectoryPoint { t, x, y }
            })
            .collect()
    }
}

/// Fits `poly_param` to the most recent lane change
#[derive(Debug, Clone, Copy, Default)]
pub struct QuinticLearner;

impl Learner for QuinticLearner {
    fn kind(&self) -> LearnerKind {
        LearnerKind::Quintic
    }

    fn learn(&self, ctx: &mut LearningContext) -> Result<FitOutcome, ContractError> {
        let cfg = &ctx.config.trajectory;
        let track = ctx.buffers.quintic_track();
        if track.len() < cfg.quintic_min_samples {
            return Ok(FitOutcome::skipped(SkipReason::InsufficientSamples {
                have: track.len(),
                need: cfg.quintic_min_samples,
            }));
        }

        let segment = extract_lane_change(&poses(track), cfg.lateral_threshold);
        if segment.len() < cfg.min_segment_points {
            debug!(points = segment.len(), "No usable lane change for quintic fit");
            return Ok(FitOutcome::skipped(SkipReason::SegmentTooShort {
                have: segment.len(),
                need: cfg.min_segment_points,
            }));
        }

        let observed_dt = segment.duration();
        if !observed_dt.is_finite() || observed_dt <= 0.0 {
            return Ok(FitOutcome::skipped(SkipReason::DegenerateSegment { dt: observed_dt }));
        }

        let rate = ctx.config.max_change_rate;
        let current = ctx.store.poly_param();
        let dt = blend_field("dt", current.dt, observed_dt, rate);
        let lon = blend_field("lon_dis", current.lon_dis, segment.longitudinal_displacement(), rate);
        let lat = blend_field("lat_dis", current.lat_dis, segment.lateral_displacement(), rate);

        let speed = lon.blended / dt.blended;
        let (Some(lon_param), Some(lat_param)) = (
            solve_quintic(dt.blended, AxisBoundary::longitudinal(lon.blended, speed)),
            solve_quintic(dt.blended, AxisBoundary::lateral(lat.blended)),
        ) else {
            return Ok(FitOutcome::skipped(SkipReason::DegenerateSegment { dt: dt.blended }));
        };

        ctx.store.set_poly_param(PolyParam {
            lon_dis: lon.blended,
            lat_dis: lat.blended,
            dt: dt.blended,
            lon_param,
            lat_param,
        })?;
        ctx.buffers.clear_quintic_track();

        info!(
            parameter = "poly_param",
            dt = dt.blended,
            lon_dis = lon.blended,
            lat_dis = lat.blended,
            segment_points = segment.len(),
            "Quintic trajectory updated"
        );

        Ok(FitOutcome::Updated {
            changes: vec![dt, lon, lat],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn check_boundary(c: &[f64; QUINTIC_COEFFS], dt: f64, b: AxisBoundary) {
        let traj = QuinticTrajectory { lon: *c, lat: *c, dt };
        let checks = [
            (eval(c, 0.0), b.start_position),
            (traj.velocity(0.0).0, b.start_velocity),
            (traj.acceleration(0.0).0, b.start_acceleration),
            (eval(c, dt), b.end_position),
            (traj.velocity(dt).0, b.end_velocity),
            (traj.acceleration(dt).0, b.end_acceleration),
        ];
        for (i, (actual, expected)) in checks.iter().enumerate() {
            assert!(
                (actual - expected).abs() < 1e-9,
                "condition {i}: {actual} vs {expected} (dt={dt}, {b:?})"
            );
        }
    }

    #[test]
    fn test_default_coefficients_reproduced() {
        let lon = solve_quintic(4.0, AxisBoundary::longitudinal(30.0, 7.0)).unwrap();
        let lat = solve_quintic(4.0, AxisBoundary::lateral(-3.5)).unwrap();

        let defaults = PolyParam::default();
        for (a, e) in lon.iter().zip(defaults.lon_param.iter()) {
            assert!((a - e).abs() < 1e-4, "lon: {lon:?}");
        }
        for (a, e) in lat.iter().zip(defaults.lat_param.iter()) {
            assert!((a - e).abs() < 1e-4, "lat: {lat:?}");
        }
    }

    #[test]
    fn test_boundary_conditions_hold_for_random_inputs() {
        let mut rng = rand::rng();
        for _ in 0..500 {
            let dt: f64 = rng.random_range(0.5..8.0);
            let boundary = AxisBoundary {
                start_position: rng.random_range(-50.0..50.0),
                start_velocity: rng.random_range(-20.0..20.0),
                start_acceleration: rng.random_range(-3.0..3.0),
                end_position: rng.random_range(-50.0..50.0),
                end_velocity: rng.random_range(-20.0..20.0),
                end_acceleration: rng.random_range(-3.0..3.0),
            };

            let coeffs = solve_quintic(dt, boundary).unwrap();
            check_boundary(&coeffs, dt, boundary);
        }
    }

    #[test]
    fn test_invalid_duration_rejected() {
        let b = AxisBoundary::lateral(-3.5);
        assert!(solve_quintic(0.0, b).is_none());
        assert!(solve_quintic(-1.0, b).is_none());
        assert!(solve_quintic(f64::NAN, b).is_none());
    }

    #[test]
    fn test_trajectory_sampling() {
        let traj = QuinticTrajectory::from_param(&PolyParam::default());
        let points = traj.sample(8);

        assert_eq!(points.len(), 9);
        assert_eq!(points[0].t, 0.0);
        assert!((points[8].t - 4.0).abs() < 1e-12);
        // defaults are rounded to four decimals
        assert!((points[8].y - (-3.5)).abs() < 5e-2);
        assert!(points.windows(2).all(|w| w[1].x > w[0].x));
    }
}
