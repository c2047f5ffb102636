//! LearningSession - Session Orchestrator
//!
//! Owns the learning context (parameter store, sample buffers, dataset and
//! config). Observations are recorded per tick; `end_session` runs the
//! enabled learners and persists the model.

use contracts::{
    ContractError, EnabledLearners, FitOutcome, LearnerConfig, LearnerKind, LearnerOutcome,
    Observation, SessionReport,
};
use param_store::{LaneChangeDataset, ParameterStore};
use tracing::{error, info, instrument, trace};

use crate::buffer::SampleBuffers;
use crate::estimators::{SafeDistanceEstimator, TargetSpeedEstimator};
use crate::quintic::QuinticLearner;
use crate::sinusoid::SinusoidLearner;

/// Run order of the learners at session end
pub const LEARNER_ORDER: [LearnerKind; 4] = [
    LearnerKind::Sinusoid,
    LearnerKind::Quintic,
    LearnerKind::SafeDistance,
    LearnerKind::TargetSpeed,
];

/// State shared by the learners of one session
#[derive(Debug)]
pub struct LearningContext {
    pub store: ParameterStore,
    pub buffers: SampleBuffers,
    pub dataset: LaneChangeDataset,
    pub config: LearnerConfig,
    /// Dataset rows appended during the current `end_session`
    pub dataset_rows_written: usize,
}

/// One parameter estimator / trajectory fitter
///
/// `learn` either updates its parameter and clears the buffer it consumed,
/// or returns `Skipped` and leaves the context untouched.
pub trait Learner: Send + Sync {
    fn kind(&self) -> LearnerKind;

    fn learn(&self, ctx: &mut LearningContext) -> Result<FitOutcome, ContractError>;
}

/// Learner implementing `kind`
pub fn learner_for(kind: LearnerKind) -> Box<dyn Learner> {
    match kind {
        LearnerKind::Sinusoid => Box::new(SinusoidLearner),
        LearnerKind::Quintic => Box::new(QuinticLearner),
        LearnerKind::SafeDistance => Box::new(SafeDistanceEstimator),
        LearnerKind::TargetSpeed => Box::new(TargetSpeedEstimator),
    }
}

fn is_enabled(enabled: &EnabledLearners, kind: LearnerKind) -> bool {
    match kind {
        LearnerKind::Sinusoid => enabled.sinusoid,
        LearnerKind::Quintic => enabled.quintic,
        LearnerKind::SafeDistance => enabled.safe_distance,
        LearnerKind::TargetSpeed => enabled.target_speed,
    }
}

/// Online learning session
#[derive(Debug)]
pub struct LearningSession {
    ctx: LearningContext,
}

impl LearningSession {
    /// Open the store and dataset named by `config.storage`
    pub fn open(config: LearnerConfig) -> Result<Self, ContractError> {
        let store = ParameterStore::load(&config.storage.model_path)?;
        Ok(Self::with_store(store, config))
    }

    /// Use an already loaded store
    pub fn with_store(store: ParameterStore, config: LearnerConfig) -> Self {
        let dataset = LaneChangeDataset::new(&config.storage.dataset_path);
        info!(
            model = %store.path().display(),
            dataset = %dataset.path().display(),
            enabled = ?config.enabled,
            "Learning session opened"
        );
        Self {
            ctx: LearningContext {
                store,
                buffers: SampleBuffers::new(),
                dataset,
                config,
                dataset_rows_written: 0,
            },
        }
    }

    /// Buffer one tick of observations
    pub fn record(&mut self, observation: &Observation) {
        trace!(?observation, "Observation recorded");
        self.ctx.buffers.record(observation);
        observability::record_observation(observation);
    }

    /// Current parameters (read side of the store)
    pub fn parameters(&self) -> &ParameterStore {
        &self.ctx.store
    }

    pub fn buffers(&self) -> &SampleBuffers {
        &self.ctx.buffers
    }

    pub fn config(&self) -> &LearnerConfig {
        &self.ctx.config
    }

    pub fn dataset(&self) -> &LaneChangeDataset {
        &self.ctx.dataset
    }

    /// Run a single learner now, without saving the store
    pub fn run_learner(&mut self, kind: LearnerKind) -> Result<FitOutcome, ContractError> {
        learner_for(kind).learn(&mut self.ctx)
    }

    /// Run the enabled learners, then persist the model
    ///
    /// Learners run in `LEARNER_ORDER`. A failing learner does not stop the
    /// others; the store is saved regardless and the first learner error is
    /// returned afterwards.
    #[instrument(name = "end_session", skip(self), fields(model = %self.ctx.store.path().display()))]
    pub fn end_session(&mut self) -> Result<SessionReport, ContractError> {
        self.ctx.dataset_rows_written = 0;
        let enabled = self.ctx.config.enabled;

        let mut report = SessionReport::default();
        let mut first_error = None;

        for kind in LEARNER_ORDER {
            if !is_enabled(&enabled, kind) {
                continue;
            }
            match learner_for(kind).learn(&mut self.ctx) {
                Ok(outcome) => {
                    if let FitOutcome::Skipped { reason } = &outcome {
                        info!(learner = kind.as_str(), %reason, "Learner skipped");
                    }
                    report.outcomes.push(LearnerOutcome {
                        learner: kind,
                        outcome,
                    });
                }
                Err(e) => {
                    error!(learner = kind.as_str(), error = %e, "Learner failed");
                    first_error.get_or_insert(e);
                }
            }
        }
        report.dataset_rows_written = self.ctx.dataset_rows_written;

        self.ctx.store.save()?;

        observability::record_session_report(&report);
        let stats = self.ctx.buffers.stats();
        observability::record_buffer_depth("velocities", stats.velocities);
        observability::record_buffer_depth("distances", stats.distances);
        observability::record_buffer_depth("quintic_track", stats.quintic_track);
        observability::record_buffer_depth("sinusoid_track", stats.sinusoid_track);

        if let Some(e) = first_error {
            return Err(e);
        }

        info!(
            updated = report.updated_count(),
            dataset_rows = report.dataset_rows_written,
            "Learning session ended"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{GapReading, GapSnapshot, PoseSample, SkipReason, Vector3};
    use tempfile::{tempdir, TempDir};

    use crate::quintic::QuinticTrajectory;

    const TICK_MS: f64 = 200.0;
    const X_STEP: f64 = 28.0 / 15.0;
    const Y_STEP: f64 = 3.2 / 15.0;

    /// Lane change over ticks 20..=35: 16 kept points, 3.0 s, 28 m, -3.2 m
    fn lane_change_pose(i: usize) -> PoseSample {
        let steps = i.clamp(19, 35) - 19;
        PoseSample::new(
            i as f64 * X_STEP,
            -(steps as f64) * Y_STEP,
            0.0,
            0.0,
            i as f64 * TICK_MS,
        )
    }

    fn drive(session: &mut LearningSession, ticks: usize, with_velocity: bool) {
        let gaps = GapSnapshot {
            front_left: Some(GapReading::new(25.0)),
            ..Default::default()
        };
        for i in 0..ticks {
            let mut obs = Observation::new().with_pose(lane_change_pose(i)).with_gaps(gaps);
            if with_velocity {
                obs = obs.with_velocity(Vector3::new(X_STEP * 5.0, 0.05, 0.0));
            }
            session.record(&obs);
        }
    }

    fn open(dir: &TempDir, enabled: EnabledLearners) -> LearningSession {
        let mut config = LearnerConfig::default();
        config.storage.model_path = dir.path().join("model.json");
        config.storage.dataset_path = dir.path().join("gmm.csv");
        config.enabled = enabled;
        LearningSession::open(config).unwrap()
    }

    fn only(kind: LearnerKind) -> EnabledLearners {
        let mut enabled = EnabledLearners::default();
        match kind {
            LearnerKind::Sinusoid => enabled.sinusoid = true,
            LearnerKind::Quintic => enabled.quintic = true,
            LearnerKind::SafeDistance => enabled.safe_distance = true,
            LearnerKind::TargetSpeed => enabled.target_speed = true,
        }
        enabled
    }

    #[test]
    fn test_quintic_lane_change_scenario() {
        let dir = tempdir().unwrap();
        let mut session = open(&dir, only(LearnerKind::Quintic));
        drive(&mut session, 60, true);

        let report = session.end_session().unwrap();
        assert!(report.outcome(LearnerKind::Quintic).unwrap().is_updated());

        let poly = session.parameters().poly_param().clone();
        assert!((poly.dt - 3.6).abs() < 1e-9, "dt: {}", poly.dt);
        assert!((poly.lon_dis - 28.0).abs() < 1e-9, "lon: {}", poly.lon_dis);
        assert!((poly.lat_dis - (-3.2)).abs() < 1e-9, "lat: {}", poly.lat_dis);
        assert!(session.buffers().quintic_track().is_empty());
        // the other track is not consumed by this fitter
        assert_eq!(session.buffers().sinusoid_track().len(), 60);

        let traj = QuinticTrajectory::from_param(&poly);
        let (x, y) = traj.position(poly.dt);
        assert!((x - 28.0).abs() < 1e-6);
        assert!((y - (-3.2)).abs() < 1e-6);
        let (vx, vy) = traj.velocity(0.0);
        assert!((vx - 28.0 / 3.6).abs() < 1e-6);
        assert!(vy.abs() < 1e-9);

        // Re-running immediately is a no-op
        let again = session.run_learner(LearnerKind::Quintic).unwrap();
        assert_eq!(
            again,
            FitOutcome::skipped(SkipReason::InsufficientSamples { have: 0, need: 50 })
        );
        assert_eq!(session.parameters().poly_param(), &poly);
    }

    #[test]
    fn test_quintic_needs_fifty_samples() {
        let dir = tempdir().unwrap();
        let mut session = open(&dir, only(LearnerKind::Quintic));
        drive(&mut session, 49, true);

        let report = session.end_session().unwrap();
        assert!(!report.outcome(LearnerKind::Quintic).unwrap().is_updated());
        assert_eq!(session.parameters().poly_param().dt, 4.0);
        assert_eq!(session.buffers().quintic_track().len(), 49);
    }

    #[test]
    fn test_sinusoid_exports_dataset_row() {
        let dir = tempdir().unwrap();
        let mut session = open(&dir, only(LearnerKind::Sinusoid));
        drive(&mut session, 40, true);

        let report = session.end_session().unwrap();
        assert_eq!(report.dataset_rows_written, 1);

        let sin = session.parameters().sin_param();
        assert!((sin.dt - 3.6).abs() < 1e-9);
        assert!((sin.lon_dis - 28.0).abs() < 1e-9);
        assert!((sin.lat_dis - (-3.2)).abs() < 1e-9);
        assert!(session.buffers().sinusoid_track().is_empty());

        let rows = session.dataset().read_rows().unwrap();
        assert_eq!(rows.len(), 1);
        let row = rows[0];
        assert!((row.speed - X_STEP * 5.0).abs() < 1e-12);
        assert!((row.lateral_displacement - (-3.2)).abs() < 1e-9);
        assert_eq!(row.leading_gap, 25.0);
        assert_eq!(row.following_gap, -100.0);
        assert!((row.duration - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_sinusoid_row_without_gaps_uses_sentinels() {
        let dir = tempdir().unwrap();
        let mut session = open(&dir, only(LearnerKind::Sinusoid));
        for i in 0..40 {
            let obs = Observation::new()
                .with_pose(lane_change_pose(i))
                .with_velocity(Vector3::new(9.0, 0.05, 0.0));
            session.record(&obs);
        }

        let report = session.end_session().unwrap();
        assert_eq!(report.dataset_rows_written, 1);

        let rows = session.dataset().read_rows().unwrap();
        assert_eq!(rows.len(), 1);
        let [speed, lateral, leading, following, duration] = rows[0].to_array();
        assert_eq!(speed, 9.0);
        assert!((lateral - (-3.2)).abs() < 1e-9, "lateral: {lateral}");
        assert_eq!(leading, 100.0);
        assert_eq!(following, -100.0);
        assert!((duration - 3.0).abs() < 1e-9, "duration: {duration}");
    }

    #[test]
    fn test_zero_duration_lane_change_is_skipped() {
        let dir = tempdir().unwrap();
        let enabled = EnabledLearners {
            sinusoid: true,
            quintic: true,
            ..Default::default()
        };
        let mut session = open(&dir, enabled);
        for i in 0..60 {
            let pose = lane_change_pose(i);
            // frozen clock
            let pose = PoseSample::new(pose.x, pose.y, pose.z, pose.yaw, 0.0);
            session.record(&Observation::new().with_pose(pose));
        }

        let report = session.end_session().unwrap();
        for kind in [LearnerKind::Sinusoid, LearnerKind::Quintic] {
            let outcome = report.outcome(kind).unwrap();
            assert!(
                matches!(
                    outcome,
                    FitOutcome::Skipped {
                        reason: SkipReason::DegenerateSegment { .. }
                    }
                ),
                "{kind:?}: {outcome:?}"
            );
        }
        assert_eq!(session.parameters().poly_param().dt, 4.0);
        assert_eq!(session.parameters().sin_param().dt, 4.0);
        assert_eq!(session.buffers().quintic_track().len(), 60);
        assert_eq!(session.buffers().sinusoid_track().len(), 60);
    }

    #[test]
    fn test_sinusoid_without_velocity_still_updates() {
        let dir = tempdir().unwrap();
        let mut session = open(&dir, only(LearnerKind::Sinusoid));
        drive(&mut session, 40, false);

        let report = session.end_session().unwrap();
        assert_eq!(report.dataset_rows_written, 0);
        assert!(report.outcome(LearnerKind::Sinusoid).unwrap().is_updated());
        assert!(session.dataset().read_rows().unwrap().is_empty());
    }

    #[test]
    fn test_safe_distance_scenario_persisted() {
        let dir = tempdir().unwrap();
        let mut session = open(&dir, only(LearnerKind::SafeDistance));
        for d in [3.0, 4.0, 5.0, 3.0, 4.0, 5.0].into_iter().chain([20.0; 24]) {
            session.record(&Observation::new().with_distance(d));
        }

        let report = session.end_session().unwrap();
        let change = report
            .outcome(LearnerKind::SafeDistance)
            .and_then(|o| o.change("safe_distance"))
            .copied()
            .unwrap();
        assert_eq!(change.observed, 4.0);
        assert_eq!(change.blended, 9.0);
        assert!(session.buffers().distances().is_empty());

        let reloaded = ParameterStore::load(dir.path().join("model.json")).unwrap();
        assert_eq!(reloaded.safe_distance(), 9.0);
    }

    #[test]
    fn test_default_config_runs_nothing() {
        let dir = tempdir().unwrap();
        let mut session = open(&dir, EnabledLearners::default());
        drive(&mut session, 60, true);

        let report = session.end_session().unwrap();
        assert!(report.outcomes.is_empty());
        assert_eq!(session.buffers().quintic_track().len(), 60);
        assert!(dir.path().join("model.json").exists());
    }

    #[test]
    fn test_report_follows_run_order() {
        let dir = tempdir().unwrap();
        let mut session = open(&dir, EnabledLearners::all());
        drive(&mut session, 10, true);

        let report = session.end_session().unwrap();
        let order: Vec<_> = report.outcomes.iter().map(|o| o.learner).collect();
        assert_eq!(order, LEARNER_ORDER.to_vec());
        assert_eq!(report.updated_count(), 0);
    }

    #[test]
    fn test_learner_error_does_not_block_save() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("gmm.csv"), "1,2,3\n").unwrap();

        let mut session = open(&dir, EnabledLearners::all());
        drive(&mut session, 40, true);
        for _ in 0..30 {
            session.record(&Observation::new().with_distance(4.0));
        }

        let err = session.end_session().unwrap_err();
        assert!(matches!(err, ContractError::DatasetMalformed { .. }));

        // sinusoid failed before touching its parameters; safe distance still saved
        let reloaded = ParameterStore::load(dir.path().join("model.json")).unwrap();
        assert_eq!(reloaded.sin_param().dt, 4.0);
        assert_eq!(reloaded.safe_distance(), 9.0);
        assert_eq!(session.buffers().sinusoid_track().len(), 40);
    }
}
