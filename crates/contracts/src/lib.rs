//! # Contracts
//!
//! Frozen interface contracts shared by every crate of the personalization engine:
//! observation records fed by the driving loop, the persisted parameter model,
//! learner configuration and the per-session learning report.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Units
//! - Positions and distances in meters, CARLA world frame
//! - Yaw in degrees (as reported by CARLA transforms)
//! - Pose timestamps in milliseconds, converted to seconds by the learners
//! - Target speed in km/h, velocity samples in m/s

mod error;
mod learner_config;
mod model;
mod observation;
mod report;

pub use error::*;
pub use learner_config::*;
pub use model::*;
pub use observation::*;
pub use report::*;
