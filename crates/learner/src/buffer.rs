//! Per-session sample buffers.
//!
//! Trajectory points are stored as `TrackSample`s carrying the velocity and
//! gap snapshot observed on the same tick, so a lane-change start index can
//! be mapped back to that tick without relying on parallel lists staying
//! aligned. Each trajectory fitter owns its own track and clears only that.

use contracts::{GapSnapshot, Observation, PoseSample, Vector3};
use serde::Serialize;

/// One trajectory point plus the rest of its tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackSample {
    pub pose: PoseSample,
    pub velocity: Option<Vector3>,
    pub gaps: Option<GapSnapshot>,
}

/// Buffer depths (for diagnostics)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BufferStats {
    pub velocities: usize,
    pub distances: usize,
    pub quintic_track: usize,
    pub sinusoid_track: usize,
    /// Observations recorded since the session started
    pub recorded_ticks: u64,
}

/// Sample buffers for one learning session
#[derive(Debug, Clone, Default)]
pub struct SampleBuffers {
    velocities: Vec<Vector3>,
    distances: Vec<f64>,
    quintic_track: Vec<TrackSample>,
    sinusoid_track: Vec<TrackSample>,
    recorded_ticks: u64,
}

impl SampleBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append every present field of `observation`; absent fields are skipped
    pub fn record(&mut self, observation: &Observation) {
        self.recorded_ticks += 1;

        if let Some(velocity) = observation.velocity {
            self.velocities.push(velocity);
        }
        if let Some(distance) = observation.distance {
            self.distances.push(distance);
        }
        if let Some(pose) = observation.pose {
            let sample = TrackSample {
                pose,
                velocity: observation.velocity,
                gaps: observation.gaps,
            };
            self.quintic_track.push(sample);
            self.sinusoid_track.push(sample);
        }
    }

    pub fn velocities(&self) -> &[Vector3] {
        &self.velocities
    }

    pub fn distances(&self) -> &[f64] {
        &self.distances
    }

    pub fn quintic_track(&self) -> &[TrackSample] {
        &self.quintic_track
    }

    pub fn sinusoid_track(&self) -> &[TrackSample] {
        &self.sinusoid_track
    }

    pub fn clear_velocities(&mut self) {
        self.velocities.clear();
    }

    pub fn clear_distances(&mut self) {
        self.distances.clear();
    }

    pub fn clear_quintic_track(&mut self) {
        self.quintic_track.clear();
    }

    pub fn clear_sinusoid_track(&mut self) {
        self.sinusoid_track.clear();
    }

    /// Drop everything, including the tick counter
    pub fn clear_all(&mut self) {
        *self = Self::default();
    }

    pub fn stats(&self) -> BufferStats {
        BufferStats {
            velocities: self.velocities.len(),
            distances: self.distances.len(),
            quintic_track: self.quintic_track.len(),
            sinusoid_track: self.sinusoid_track.len(),
            recorded_ticks: self.recorded_ticks,
        }
    }
}

/// Poses of a track, in order
pub(crate) fn poses(track: &[TrackSample]) -> Vec<PoseSample> {
    track.iter().map(|s| s.pose).collect()
}
