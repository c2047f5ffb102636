//! Observation - 驾驶循环输入
//!
//! 每个仿真 tick 由外部协作者产生的观测记录，字段均可缺省。

use serde::{Deserialize, Serialize};

/// CARLA actor handle type
pub type ActorId = u32;

/// 单个 tick 的观测记录
///
/// 缺省字段直接跳过，不会在缓冲区中插入占位值。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// 自车速度 (m/s)
    #[serde(default)]
    pub velocity: Option<Vector3>,

    /// 与前方障碍物的距离 (米)
    #[serde(default)]
    pub distance: Option<f64>,

    /// 轨迹点
    #[serde(default)]
    pub pose: Option<PoseSample>,

    /// 各车道最近车辆间距快照
    #[serde(default)]
    pub gaps: Option<GapSnapshot>,
}

impl Observation {
    /// 空观测
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_velocity(mut self, velocity: Vector3) -> Self {
        self.velocity = Some(velocity);
        self
    }

    pub fn with_distance(mut self, distance: f64) -> Self {
        self.distance = Some(distance);
        self
    }

    pub fn with_pose(mut self, pose: PoseSample) -> Self {
        self.pose = Some(pose);
        self
    }

    pub fn with_gaps(mut self, gaps: GapSnapshot) -> Self {
        self.gaps = Some(gaps);
        self
    }

    /// 是否没有任何字段
    pub fn is_empty(&self) -> bool {
        self.velocity.is_none()
            && self.distance.is_none()
            && self.pose.is_none()
            && self.gaps.is_none()
    }
}

/// 轨迹点 (世界坐标系)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseSample {
    pub x: f64,
    pub y: f64,
    pub z: f64,

    /// 航向角 (度)
    pub yaw: f64,

    /// 时间戳 (毫秒)
    pub timestamp_ms: f64,
}

impl PoseSample {
    pub fn new(x: f64, y: f64, z: f64, yaw: f64, timestamp_ms: f64) -> Self {
        Self {
            x,
            y,
            z,
            yaw,
            timestamp_ms,
        }
    }
}

/// 间距读数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GapReading {
    /// 与最近车辆的距离 (米)
    pub distance: f64,

    /// 被检测车辆 (可选，用于诊断)
    #[serde(default)]
    pub actor_id: Option<ActorId>,
}

impl GapReading {
    pub fn new(distance: f64) -> Self {
        Self {
            distance,
            actor_id: None,
        }
    }
}

/// 间距快照 ("radar")
///
/// 每个槽位要么是一个读数，要么为空 (该车道附近无车辆)。
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GapSnapshot {
    #[serde(default)]
    pub front: Option<GapReading>,

    #[serde(default)]
    pub front_left: Option<GapReading>,

    #[serde(default)]
    pub rear_left: Option<GapReading>,

    #[serde(default)]
    pub front_right: Option<GapReading>,

    #[serde(default)]
    pub rear_right: Option<GapReading>,
}

/// 3D 向量
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}
