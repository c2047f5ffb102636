//! 学习会话指标收集模块
//!
//! 通过 `metrics` 门面记录观测、学习器结果和参数值，
//! 并在内存中聚合多次会话的结果。

use std::collections::HashMap;

use contracts::{FitOutcome, LearnerKind, Observation, SessionReport};
use metrics::{counter, gauge, histogram};

/// 记录一条观测
pub fn record_observation(observation: &Observation) {
    counter!("driver_learning_observations_total").increment(1);

    let fields = [
        ("velocity", observation.velocity.is_some()),
        ("distance", observation.distance.is_some()),
        ("pose", observation.pose.is_some()),
        ("gaps", observation.gaps.is_some()),
    ];
    for (field, present) in fields {
        if present {
            counter!("driver_learning_observation_fields_total", "field" => field).increment(1);
        }
    }
}

/// 记录缓冲区深度
pub fn record_buffer_depth(buffer: &'static str, depth: usize) {
    gauge!("driver_learning_buffer_depth", "buffer" => buffer).set(depth as f64);
}

/// 记录单个学习器的运行结果
pub fn record_learner_outcome(learner: LearnerKind, outcome: &FitOutcome) {
    match outcome {
        FitOutcome::Updated { changes } => {
            counter!(
                "driver_learning_learner_runs_total",
                "learner" => learner.as_str(),
                "status" => "updated"
            )
            .increment(1);

            for change in changes {
                record_parameter_value(learner, change.field, change.blended);
                if change.previous != 0.0 {
                    let relative = (change.blended - change.previous).abs() / change.previous.abs();
                    histogram!(
                        "driver_learning_relative_change",
                        "learner" => learner.as_str()
                    )
                    .record(relative);
                }
            }
        }
        FitOutcome::Skipped { reason } => {
            counter!(
                "driver_learning_learner_runs_total",
                "learner" => learner.as_str(),
                "status" => "skipped",
                "reason" => reason.as_str()
            )
            .increment(1);
        }
    }
}

/// 记录参数当前值
pub fn record_parameter_value(learner: LearnerKind, field: &'static str, value: f64) {
    gauge!(
        "driver_learning_parameter",
        "parameter" => learner.parameter().as_str(),
        "field" => field
    )
    .set(value);
}

/// 记录写入的训练数据行
pub fn record_dataset_row(total_rows: usize) {
    counter!("driver_learning_dataset_rows_written_total").increment(1);
    gauge!("driver_learning_dataset_rows").set(total_rows as f64);
}

/// 记录整个会话报告
pub fn record_session_report(report: &SessionReport) {
    counter!("driver_learning_sessions_total").increment(1);
    for outcome in &report.outcomes {
        record_learner_outcome(outcome.learner, &outcome.outcome);
    }
}

/// 学习指标聚合器
///
/// 在内存中聚合多次会话的结果，便于统计和输出摘要。
#[derive(Debug, Clone, Default)]
pub struct LearningMetricsAggregator {
    /// 会话总数
    pub total_sessions: u64,

    /// 各学习器更新次数
    pub updates: HashMap<LearnerKind, u64>,

    /// 各学习器跳过次数 (按原因)
    pub skips: HashMap<(LearnerKind, &'static str), u64>,

    /// 写入的训练数据行数
    pub dataset_rows: u64,

    /// 相对变化量统计 (%)
    pub relative_change_stats: RunningStats,

    /// 各字段混合后取值统计
    pub field_stats: HashMap<&'static str, RunningStats>,
}

impl LearningMetricsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 合并一次会话报告
    pub fn update(&mut self, report: &SessionReport) {
        self.total_sessions += 1;
        self.dataset_rows += report.dataset_rows_written as u64;

        for outcome in &report.outcomes {
            match &outcome.outcome {
                FitOutcome::Updated { changes } => {
                    *self.updates.entry(outcome.learner).or_insert(0) += 1;
                    for change in changes {
                        self.field_stats
                            .entry(change.field)
                            .or_default()
                            .push(change.blended);
                        if change.previous != 0.0 {
                            self.relative_change_stats.push(
                                (change.blended - change.previous).abs() / change.previous.abs()
                                    * 100.0,
                            );
                        }
                    }
                }
                FitOutcome::Skipped { reason } => {
                    *self
                        .skips
                        .entry((outcome.learner, reason.as_str()))
                        .or_insert(0) += 1;
                }
            }
        }
    }

    /// 生成摘要报告
    pub fn summary(&self) -> MetricsSummary {
        let total_updates: u64 = self.updates.values().sum();
        let total_skips: u64 = self.skips.values().sum();
        let runs = total_updates + total_skips;

        let mut skip_counts: Vec<(String, u64)> = self
            .skips
            .iter()
            .map(|((learner, reason), count)| (format!("{}/{}", learner.as_str(), reason), *count))
            .collect();
        skip_counts.sort();

        MetricsSummary {
            total_sessions: self.total_sessions,
            total_updates,
            total_skips,
            update_rate: if runs > 0 {
                total_updates as f64 / runs as f64 * 100.0
            } else {
                0.0
            },
            dataset_rows: self.dataset_rows,
            relative_change_pct: StatsSummary::from(&self.relative_change_stats),
            skip_counts,
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_sessions: u64,
    pub total_updates: u64,
    pub total_skips: u64,
    pub update_rate: f64,
    pub dataset_rows: u64,
    pub relative_change_pct: StatsSummary,
    /// `learner/reason` -> 次数，按键排序
    pub skip_counts: Vec<(String, u64)>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Learning Metrics Summary ===")?;
        writeln!(f, "Sessions: {}", self.total_sessions)?;
        writeln!(
            f,
            "Learner updates: {} ({:.2}%)",
            self.total_updates, self.update_rate
        )?;
        writeln!(f, "Learner skips: {}", self.total_skips)?;
        writeln!(f, "Dataset rows written: {}", self.dataset_rows)?;
        writeln!(f, "Relative change (%): {}", self.relative_change_pct)?;

        if !self.skip_counts.is_empty() {
            writeln!(f, "Skip reasons:")?;
            for (key, count) in &self.skip_counts {
                writeln!(f, "  {}: {}", key, count)?;
            }
        }

        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            self.m2 += delta * (value - self.mean);
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 样本方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{LearnerOutcome, ScalarChange, SkipReason};

    fn report() -> SessionReport {
        SessionReport {
            outcomes: vec![
                LearnerOutcome {
                    learner: LearnerKind::Sinusoid,
                    outcome: FitOutcome::skipped(SkipReason::SegmentTooShort { have: 4, need: 10 }),
                },
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
            ],
            dataset_rows_written: 1,
        }
    }

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(v);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_update() {
        let mut aggregator = LearningMetricsAggregator::new();
        aggregator.update(&report());
        aggregator.update(&report());

        assert_eq!(aggregator.total_sessions, 2);
        assert_eq!(aggregator.dataset_rows, 2);
        assert_eq!(aggregator.updates.get(&LearnerKind::SafeDistance), Some(&2));
        assert_eq!(
            aggregator
                .skips
                .get(&(LearnerKind::Sinusoid, "segment_too_short")),
            Some(&2)
        );
        assert!((aggregator.relative_change_stats.mean() - 10.0).abs() < 1e-10);
    }

    #[test]
    fn test_summary_display() {
        let mut aggregator = LearningMetricsAggregator::new();
        aggregator.update(&report());

        let output = format!("{}", aggregator.summary());
        assert!(output.contains("Sessions: 1"), "got: {output}");
        assert!(output.contains("50.00%"), "got: {output}");
        assert!(output.contains("sinusoid/segment_too_short: 1"), "got: {output}");
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        // No recorder installed: the facade discards everything
        record_session_report(&report());
        record_dataset_row(3);
        record_buffer_depth("distances", 12);
    }
}
