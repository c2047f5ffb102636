//! # Learner
//!
//! 驾驶行为在线个性化学习。
//!
//! 负责：
//! - 按 tick 缓存观测 (速度、障碍距离、轨迹点)
//! - 变道片段提取 + 五次多项式 / 正弦轨迹拟合
//! - 安全距离与目标速度估计
//! - 限速混合后写回参数模型
//!
//! ## 使用示例
//!
//! ```ignore
//! use learner::{LearnerConfig, LearningSession};
//!
//! let mut config = LearnerConfig::default();
//! config.enabled.safe_distance = true;
//!
//! let mut session = LearningSession::open(config)?;
//!
//! // Every tick
//! session.record(&observation);
//!
//! // Session boundary
//! let report = session.end_session()?;
//! let safe_distance = session.parameters().safe_distance();
//! ```

mod blend;
mod buffer;
mod estimators;
mod quintic;
mod segment;
mod session;
mod sinusoid;

// Re-exports
pub use blend::{blend, blend_field};
pub use buffer::{BufferStats, SampleBuffers, TrackSample};
pub use contracts::{EnabledLearners, LearnerConfig, LearnerKind, Observation, SessionReport};
pub use estimators::{
    estimate_safe_distance, estimate_target_speed, straight_driving_speed, SafeDistanceEstimator,
    TargetSpeedEstimator,
};
pub use quintic::{
    boundary_matrix, solve_quintic, AxisBoundary, QuinticLearner, QuinticTrajectory,
    TrajectoryPoint,
};
pub use segment::{extract_lane_change, LaneChangeSegment};
pub use session::{learner_for, Learner, LearningContext, LearningSession, LEARNER_ORDER};
pub use sinusoid::{SinusoidLearner, SinusoidalTrajectory};
