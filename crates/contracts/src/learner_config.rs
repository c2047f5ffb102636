//! Learner configuration contracts that can be shared across crates.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Default maximum fractional change per update
pub const DEFAULT_MAX_CHANGE_RATE: f64 = 0.1;

/// Per-step lateral delta (local frame) below which a sample belongs to a left lane change
pub const LANE_CHANGE_LATERAL_THRESHOLD: f64 = -0.02;

/// Learning session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct LearnerConfig {
    /// Persisted files
    #[serde(default)]
    pub storage: StorageConfig,

    /// Which learners run at session end
    #[serde(default)]
    pub enabled: EnabledLearners,

    /// Maximum fractional change of any parameter per session
    #[serde(default = "default_max_change_rate")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub max_change_rate: f64,

    /// Lane-change shape learning
    #[serde(default)]
    #[validate(nested)]
    pub trajectory: TrajectoryLearningConfig,

    /// Safe-distance estimation
    #[serde(default)]
    #[validate(nested)]
    pub safe_distance: SafeDistanceConfig,

    /// Target-speed estimation
    #[serde(default)]
    #[validate(nested)]
    pub target_speed: TargetSpeedConfig,
}

impl Default for LearnerConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            enabled: EnabledLearners::default(),
            max_change_rate: DEFAULT_MAX_CHANGE_RATE,
            trajectory: TrajectoryLearningConfig::default(),
            safe_distance: SafeDistanceConfig::default(),
            target_speed: TargetSpeedConfig::default(),
        }
    }
}

fn default_max_change_rate() -> f64 {
    DEFAULT_MAX_CHANGE_RATE
}

/// Storage locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Parameter model file (`.json` or `.bin`)
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,

    /// Lane-change training dataset (CSV, no header)
    #[serde(default = "default_dataset_path")]
    pub dataset_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            dataset_path: default_dataset_path(),
        }
    }
}

fn default_model_path() -> PathBuf {
    PathBuf::from("data/model.json")
}

fn default_dataset_path() -> PathBuf {
    PathBuf::from("data/GMM_train_data.csv")
}

/// Learners run by `end_session`
///
/// All disabled by default: each learner is opt-in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnabledLearners {
    #[serde(default)]
    pub sinusoid: bool,
    #[serde(default)]
    pub quintic: bool,
    #[serde(default)]
    pub safe_distance: bool,
    #[serde(default)]
    pub target_speed: bool,
}

impl EnabledLearners {
    /// Every learner enabled
    pub fn all() -> Self {
        Self {
            sinusoid: true,
            quintic: true,
            safe_distance: true,
            target_speed: true,
        }
    }

    pub fn any(&self) -> bool {
        self.sinusoid || self.quintic || self.safe_distance || self.target_speed
    }
}

/// Lane-change learning thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct TrajectoryLearningConfig {
    /// Per-step lateral delta threshold (negative = leftward)
    #[serde(default = "default_lateral_threshold")]
    pub lateral_threshold: f64,

    /// Minimum segment points before a fit is attempted
    #[serde(default = "default_min_segment_points")]
    #[validate(range(min = 2))]
    pub min_segment_points: usize,

    /// Minimum buffered samples for the quintic fitter
    #[serde(default = "default_quintic_min_samples")]
    #[validate(range(min = 2))]
    pub quintic_min_samples: usize,

    /// Minimum buffered samples for the sinusoidal fitter
    #[serde(default = "default_sinusoid_min_samples")]
    #[validate(range(min = 2))]
    pub sinusoid_min_samples: usize,

    /// Leading gap written when no vehicle is ahead in the target lane
    #[serde(default = "default_leading_gap_sentinel")]
    pub leading_gap_sentinel: f64,

    /// Following gap written when no vehicle is behind in the target lane
    #[serde(default = "default_following_gap_sentinel")]
    pub following_gap_sentinel: f64,
}

impl Default for TrajectoryLearningConfig {
    fn default() -> Self {
        Self {
            lateral_threshold: default_lateral_threshold(),
            min_segment_points: default_min_segment_points(),
            quintic_min_samples: default_quintic_min_samples(),
            sinusoid_min_samples: default_sinusoid_min_samples(),
            leading_gap_sentinel: default_leading_gap_sentinel(),
            following_gap_sentinel: default_following_gap_sentinel(),
        }
    }
}

fn default_lateral_threshold() -> f64 {
    LANE_CHANGE_LATERAL_THRESHOLD
}

fn default_min_segment_points() -> usize {
    10
}

fn default_quintic_min_samples() -> usize {
    50
}

fn default_sinusoid_min_samples() -> usize {
    30
}

fn default_leading_gap_sentinel() -> f64 {
    100.0
}

fn default_following_gap_sentinel() -> f64 {
    -100.0
}

/// Safe-distance estimator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct SafeDistanceConfig {
    /// Fraction of the smallest samples averaged
    #[serde(default = "default_percentile")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub percentile: f64,

    /// Selected sample count must exceed this value
    #[serde(default = "default_safe_distance_min_selected")]
    pub min_selected: usize,
}

impl Default for SafeDistanceConfig {
    fn default() -> Self {
        Self {
            percentile: default_percentile(),
            min_selected: default_safe_distance_min_selected(),
        }
    }
}

fn default_percentile() -> f64 {
    0.2
}

fn default_safe_distance_min_selected() -> usize {
    5
}

/// Target-speed estimator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct TargetSpeedConfig {
    /// Fraction of the largest speeds averaged
    #[serde(default = "default_percentile")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub percentile: f64,

    /// Selected sample count must exceed this value
    #[serde(default = "default_target_speed_min_selected")]
    pub min_selected: usize,

    /// |v_x| must exceed this (m/s) to count as driving
    #[serde(default = "default_min_longitudinal_speed")]
    #[validate(range(min = 0.0))]
    pub min_longitudinal_speed: f64,

    /// |v_x / v_y| must exceed this to count as driving straight
    #[serde(default = "default_min_straightness_ratio")]
    #[validate(range(min = 0.0))]
    pub min_straightness_ratio: f64,

    /// Conversion from m/s to the stored speed unit
    #[serde(default = "default_speed_scale")]
    pub speed_scale: f64,
}

impl Default for TargetSpeedConfig {
    fn default() -> Self {
        Self {
            percentile: default_percentile(),
            min_selected: default_target_speed_min_selected(),
            min_longitudinal_speed: default_min_longitudinal_speed(),
            min_straightness_ratio: default_min_straightness_ratio(),
            speed_scale: default_speed_scale(),
        }
    }
}

fn default_target_speed_min_selected() -> usize {
    10
}

fn default_min_longitudinal_speed() -> f64 {
    4.0
}

fn default_min_straightness_ratio() -> f64 {
    30.0
}

fn default_speed_scale() -> f64 {
    3.6
}
