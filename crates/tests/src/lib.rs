//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 合成驾驶数据的 e2e 测试 (配置 -> 会话 -> 持久化 -> 重新加载)

#[cfg(test)]
mod contract_tests {
    use contracts::{FitOutcome, ParameterKey, ParameterModel, SkipReason};

    #[test]
    fn test_default_model_snapshot() {
        let model = ParameterModel::default();
        assert_eq!(model.safe_distance, 10.0);
        assert_eq!(model.target_speed, 28.0);
        assert_eq!(model.poly_param.lon_param, [0.0, 7.0, 0.0, 0.3125, -0.1172, 0.0117]);
        assert_eq!(model.sin_param.dt, 4.0);
    }

    #[test]
    fn test_parameter_keys_parse() {
        for key in ParameterKey::ALL {
            let parsed: ParameterKey = key.as_str().parse().unwrap();
            assert_eq!(parsed, key);
        }
        assert!("speed_limit".parse::<ParameterKey>().is_err());
    }

    #[test]
    fn test_outcome_json_shape() {
        let outcome = FitOutcome::skipped(SkipReason::InsufficientSamples { have: 3, need: 50 });
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "skipped");
        assert_eq!(json["reason"]["kind"], "insufficient_samples");
        assert_eq!(json["reason"]["need"], 50);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::path::Path;

    use config_loader::ConfigLoader;
    use contracts::{
        ContractError, GapReading, GapSnapshot, LearnerKind, Observation, PoseSample, Vector3,
    };
    use learner::{LearnerConfig, LearningSession};
    use observability::LearningMetricsAggregator;
    use param_store::{LaneChangeDataset, ParameterStore};
    use tempfile::tempdir;

    const TICKS: usize = 60;
    const TICK_MS: f64 = 200.0;
    /// 9.33 m/s cruise, 28 m covered during the 3 s lane change
    const X_STEP: f64 = 28.0 / 15.0;
    const Y_STEP: f64 = 3.2 / 15.0;

    /// Synthetic drive: straight, left lane change over ticks 20..=35, straight
    ///
    /// Every fifth tick sees an obstacle at 4 m, the others at 20 m.
    fn synthetic_drive() -> Vec<Observation> {
        (0..TICKS)
            .map(|i| {
                let steps = i.clamp(19, 35) - 19;
                let pose = PoseSample::new(
                    i as f64 * X_STEP,
                    -(steps as f64) * Y_STEP,
                    0.5,
                    0.0,
                    i as f64 * TICK_MS,
                );
                let gaps = GapSnapshot {
                    front: Some(GapReading::new(35.0)),
                    front_left: Some(GapReading {
                        distance: 42.0,
                        actor_id: Some(17),
                    }),
                    rear_left: Some(GapReading::new(-18.0)),
                    ..Default::default()
                };
                Observation::new()
                    .with_pose(pose)
                    .with_velocity(Vector3::new(X_STEP * 5.0, 0.05, 0.0))
                    .with_distance(if i % 5 == 0 { 4.0 } else { 20.0 })
                    .with_gaps(gaps)
            })
            .collect()
    }

    fn write_config(dir: &Path, model_file: &str, enabled: &str) -> LearnerConfig {
        let toml = format!(
            r#"
max_change_rate = 0.1

[storage]
model_path = "{model}"
dataset_path = "{dataset}"

[enabled]
{enabled}

[trajectory]
min_segment_points = 10
"#,
            model = dir.join(model_file).display(),
            dataset = dir.join("gmm_train.csv").display(),
        );
        let path = dir.join("learner.toml");
        std::fs::write(&path, toml).unwrap();
        ConfigLoader::load_from_path(&path).unwrap()
    }

    fn run_session(config: &LearnerConfig) -> contracts::SessionReport {
        let mut session = LearningSession::open(config.clone()).unwrap();
        for obs in synthetic_drive() {
            session.record(&obs);
        }
        session.end_session().unwrap()
    }

    /// End-to-end: TOML config -> session -> all learners -> persisted model + dataset
    #[test]
    fn test_e2e_config_driven_session() {
        let dir = tempdir().unwrap();
        let config = write_config(
            dir.path(),
            "model.json",
            "sinusoid = true\nquintic = true\nsafe_distance = true\ntarget_speed = true",
        );

        let report = run_session(&config);
        assert_eq!(report.updated_count(), 4, "report: {report:?}");
        assert_eq!(report.dataset_rows_written, 1);

        let store = ParameterStore::load(&config.storage.model_path).unwrap();
        assert_eq!(store.safe_distance(), 9.0);
        // 9.33 m/s = 33.6 km/h, capped at +10% of 28
        assert!((store.target_speed() - 30.8).abs() < 1e-9, "{}", store.target_speed());
        assert!((store.poly_param().dt - 3.6).abs() < 1e-9);
        assert!((store.sin_param().lat_dis - (-3.2)).abs() < 1e-9);

        let rows = LaneChangeDataset::new(&config.storage.dataset_path)
            .read_rows()
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].leading_gap, 42.0);
        assert_eq!(rows[0].following_gap, -18.0);
    }

    /// Repeated sessions move parameters by at most 10% each and accumulate dataset rows
    #[test]
    fn test_e2e_sessions_converge_gradually() {
        let dir = tempdir().unwrap();
        let config = write_config(
            dir.path(),
            "model.json",
            "sinusoid = true\nsafe_distance = true",
        );

        let mut previous = ParameterStore::load(&config.storage.model_path)
            .unwrap()
            .safe_distance();
        for _ in 0..5 {
            run_session(&config);
            let current = ParameterStore::load(&config.storage.model_path)
                .unwrap()
                .safe_distance();
            assert!(current < previous && current > 4.0, "{previous} -> {current}");
            assert!(previous - current <= 0.1 * previous + 1e-12);
            previous = current;
        }

        let store = ParameterStore::load(&config.storage.model_path).unwrap();
        // 4.0 -> 3.6 -> 3.24 -> 3.0, then stays
        assert!((store.sin_param().dt - 3.0).abs() < 1e-9, "{}", store.sin_param().dt);

        let rows = LaneChangeDataset::new(&config.storage.dataset_path)
            .read_rows()
            .unwrap();
        assert_eq!(rows.len(), 5);
    }

    #[test]
    fn test_e2e_bincode_model() {
        let dir = tempdir().unwrap();
        let config = write_config(dir.path(), "model.bin", "safe_distance = true");

        run_session(&config);

        let store = ParameterStore::load(dir.path().join("model.bin")).unwrap();
        assert_eq!(store.safe_distance(), 9.0);
        assert_eq!(store.target_speed(), 28.0);
    }

    #[test]
    fn test_e2e_corrupted_model_is_surfaced() {
        let dir = tempdir().unwrap();
        let config = write_config(dir.path(), "model.json", "safe_distance = true");
        std::fs::write(&config.storage.model_path, "not a model").unwrap();

        let err = LearningSession::open(config).unwrap_err();
        assert!(matches!(err, ContractError::ModelCorrupted { .. }), "got: {err}");
    }

    #[test]
    fn test_e2e_metrics_aggregation() {
        let dir = tempdir().unwrap();
        let config = write_config(
            dir.path(),
            "model.json",
            "quintic = true\ntarget_speed = true",
        );

        let mut aggregator = LearningMetricsAggregator::new();
        for _ in 0..2 {
            aggregator.update(&run_session(&config));
        }

        assert_eq!(aggregator.total_sessions, 2);
        assert_eq!(aggregator.updates.get(&LearnerKind::Quintic), Some(&2));
        assert_eq!(aggregator.updates.get(&LearnerKind::TargetSpeed), Some(&2));
        let output = aggregator.summary().to_string();
        assert!(output.contains("Sessions: 2"), "got: {output}");
    }
}
