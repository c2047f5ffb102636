//! Synthetic Learning Session Demo
//!
//! Feeds several simulated drives (cruise, left lane change, cruise) into a
//! learning session and prints how the personalized parameters move.
//! Runs without CARLA.
//!
//! Run with: cargo run -p learning_demos --bin synthetic_session -- [config.toml] [sessions]
//!
//! `LOG_FORMAT` selects `json`, `pretty` or `compact` output (default: compact).

use std::path::Path;

use anyhow::{Context, Result};
use config_loader::ConfigLoader;
use contracts::{GapReading, GapSnapshot, Observation, PoseSample, Vector3};
use learner::{EnabledLearners, LearnerConfig, LearningSession, QuinticTrajectory};
use observability::{LearningMetricsAggregator, LogFormat, ObservabilityConfig};

const TICK_MS: f64 = 100.0;

/// One drive of `ticks` ticks at `speed` m/s with a lane change of `width`
/// meters lasting `duration_s`, starting at `start_tick`
struct DriveProfile {
    ticks: usize,
    speed: f64,
    width: f64,
    duration_s: f64,
    start_tick: usize,
}

impl DriveProfile {
    fn observations(&self) -> Vec<Observation> {
        let change_ticks = (self.duration_s * 1000.0 / TICK_MS).round() as usize;
        let step_x = self.speed * TICK_MS / 1000.0;

        (0..self.ticks)
            .map(|i| {
                let t = i as f64 * TICK_MS;
                let progress = i
                    .saturating_sub(self.start_tick)
                    .min(change_ticks) as f64
                    / change_ticks as f64;
                let pose = PoseSample::new(i as f64 * step_x, -self.width * progress, 0.0, 0.0, t);

                // small deterministic wobble on lateral velocity
                let vy = 0.05 + 0.02 * (i as f64 * 0.3).sin();
                let gaps = GapSnapshot {
                    front: Some(GapReading::new(30.0 + (i % 7) as f64)),
                    front_left: (i % 3 != 0).then(|| GapReading::new(45.0)),
                    rear_left: Some(GapReading::new(-20.0)),
                    ..Default::default()
                };

                Observation::new()
                    .with_pose(pose)
                    .with_velocity(Vector3::new(self.speed, vy, 0.0))
                    .with_distance(12.0 + (i % 10) as f64)
                    .with_gaps(gaps)
            })
            .collect()
    }
}

fn load_config(path: Option<&str>) -> Result<LearnerConfig> {
    match path {
        Some(path) => {
            tracing::info!(path = %path, "Loading learner config");
            ConfigLoader::load_from_path(Path::new(path))
                .with_context(|| format!("Failed to load config '{path}'"))
        }
        None => {
            let dir = std::env::temp_dir().join("driver_learning_demo");
            let mut config = LearnerConfig::default();
            config.storage.model_path = dir.join("model.json");
            config.storage.dataset_path = dir.join("GMM_train_data.csv");
            config.enabled = EnabledLearners::all();
            Ok(config)
        }
    }
}

fn log_format() -> Result<LogFormat> {
    match std::env::var("LOG_FORMAT") {
        Ok(value) => LogFormat::parse(&value)
            .with_context(|| format!("LOG_FORMAT must be json, pretty or compact, got '{value}'")),
        Err(_) => Ok(LogFormat::Compact),
    }
}

fn main() -> Result<()> {
    observability::init_with_config(ObservabilityConfig {
        log_format: log_format()?,
        ..Default::default()
    })?;

    let args: Vec<String> = std::env::args().collect();
    let config = load_config(args.get(1).map(String::as_str))?;
    let sessions: usize = match args.get(2) {
        Some(n) => n.parse().context("sessions must be a positive integer")?,
        None => 5,
    };

    tracing::info!(
        model = %config.storage.model_path.display(),
        sessions,
        "Starting synthetic learning demo"
    );

    let profile = DriveProfile {
        ticks: 120,
        speed: 11.0,
        width: 3.4,
        duration_s: 3.2,
        start_tick: 40,
    };

    let mut aggregator = LearningMetricsAggregator::new();
    for n in 1..=sessions {
        let mut session = LearningSession::open(config.clone())?;
        for obs in profile.observations() {
            session.record(&obs);
        }

        let report = session.end_session()?;
        aggregator.update(&report);

        let params = session.parameters();
        tracing::info!(
            session = n,
            safe_distance = params.safe_distance(),
            target_speed = params.target_speed(),
            lane_change_dt = params.poly_param().dt,
            "Session finished"
        );
        println!("session {n}: {}", serde_json::to_string(&report)?);
    }

    let session = LearningSession::open(config)?;
    let params = session.parameters();
    println!("{}", serde_json::to_string_pretty(params.model())?);

    println!("Planned lane change:");
    for point in QuinticTrajectory::from_param(params.poly_param()).sample(8) {
        println!("  t={:5.2}s  x={:6.2}m  y={:6.2}m", point.t, point.x, point.y);
    }

    println!("{}", aggregator.summary());
    Ok(())
}
