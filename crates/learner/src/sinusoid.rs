//! Sinusoidal lane-change trajectory and GMM training-row export

use std::f64::consts::TAU;

use contracts::{ContractError, FitOutcome, LearnerKind, SinParam, SkipReason};
use param_store::DatasetRow;
use tracing::{debug, info, warn};

use crate::blend::blend_field;
use crate::buffer::poses;
use crate::segment::extract_lane_change;
use crate::session::{Learner, LearningContext};

/// `y(t) = -H/(2π)·sin(2πt/dt) + H·t/dt`, `x(t) = lon_dis·t/dt`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SinusoidalTrajectory {
    pub lon_dis: f64,
    pub lat_dis: f64,
    pub dt: f64,
}

impl SinusoidalTrajectory {
    pub fn from_param(param: &SinParam) -> Self {
        Self {
            lon_dis: param.lon_dis,
            lat_dis: param.lat_dis,
            dt: param.dt,
        }
    }

    pub fn lateral(&self, t: f64) -> f64 {
        let phase = t / self.dt;
        -self.lat_dis / TAU * (TAU * phase).sin() + self.lat_dis * phase
    }

    pub fn longitudinal(&self, t: f64) -> f64 {
        self.lon_dis * t / self.dt
    }

    pub fn position(&self, t: f64) -> (f64, f64) {
        (self.longitudinal(t), self.lateral(t))
    }

    /// Lateral velocity; zero at both ends
    pub fn lateral_velocity(&self, t: f64) -> f64 {
        self.lat_dis / self.dt * (1.0 - (TAU * t / self.dt).cos())
    }
}

/// Fits `sin_param` and exports one dataset row per lane change
#[derive(Debug, Clone, Copy, Default)]
pub struct SinusoidLearner;

impl Learner for SinusoidLearner {
    fn kind(&self) -> LearnerKind {
        LearnerKind::Sinusoid
    }

    fn learn(&self, ctx: &mut LearningContext) -> Result<FitOutcome, ContractError> {
        let cfg = &ctx.config.trajectory;
        let track = ctx.buffers.sinusoid_track();
        if track.len() < cfg.sinusoid_min_samples {
            return Ok(FitOutcome::skipped(SkipReason::InsufficientSamples {
                have: track.len(),
                need: cfg.sinusoid_min_samples,
            }));
        }

        let segment = extract_lane_change(&poses(track), cfg.lateral_threshold);
        if segment.len() < cfg.min_segment_points {
            debug!(points = segment.len(), "No usable lane change for sinusoid fit");
            return Ok(FitOutcome::skipped(SkipReason::SegmentTooShort {
                have: segment.len(),
                need: cfg.min_segment_points,
            }));
        }

        let observed_dt = segment.duration();
        if !observed_dt.is_finite() || observed_dt <= 0.0 {
            return Ok(FitOutcome::skipped(SkipReason::DegenerateSegment { dt: observed_dt }));
        }
        let observed_lon = segment.longitudinal_displacement();
        let observed_lat = segment.lateral_displacement();

        // start_index is always set for a non-empty segment
        let start = segment.start_index.and_then(|i| track.get(i)).copied();
        let row = start.and_then(|sample| {
            let velocity = sample.velocity?;
            let gaps = sample.gaps.unwrap_or_default();
            Some(DatasetRow {
                speed: velocity.x,
                lateral_displacement: observed_lat,
                leading_gap: gaps
                    .front_left
                    .map_or(cfg.leading_gap_sentinel, |g| g.distance),
                following_gap: gaps
                    .rear_left
                    .map_or(cfg.following_gap_sentinel, |g| g.distance),
                duration: observed_dt,
            })
        });

        match row {
            Some(row) => {
                let total = ctx.dataset.append(row)?;
                ctx.dataset_rows_written += 1;
                observability::record_dataset_row(total);
                debug!(?row, total, "Lane-change row exported");
            }
            None => warn!(
                start_index = ?segment.start_index,
                "No velocity at lane-change start, dataset row not written"
            ),
        }

        let rate = ctx.config.max_change_rate;
        let current = ctx.store.sin_param();
        let dt = blend_field("dt", current.dt, observed_dt, rate);
        let lon = blend_field("lon_dis", current.lon_dis, observed_lon, rate);
        let lat = blend_field("lat_dis", current.lat_dis, observed_lat, rate);

        ctx.store.set_sin_param(SinParam {
            lon_dis: lon.blended,
            lat_dis: lat.blended,
            dt: dt.blended,
        })?;
        ctx.buffers.clear_sinusoid_track();

        info!(
            parameter = "sin_param",
            dt = dt.blended,
            lon_dis = lon.blended,
            lat_dis = lat.blended,
            segment_points = segment.len(),
            "Sinusoidal trajectory updated"
        );

        Ok(FitOutcome::Updated {
            changes: vec![dt, lon, lat],
        })
    }
}
