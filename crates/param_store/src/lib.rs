//! # Param Store
//!
//! 持久化模块。
//!
//! 负责：
//! - 个性化参数模型的加载 / 默认值初始化 / 原子保存
//! - 变道训练数据集 (GMM 输入) 的追加写入

mod dataset;
mod format;
mod fs;
mod store;

pub use contracts::{ParameterKey, ParameterModel, ParameterValue, PersistedModel};
pub use dataset::{DatasetRow, LaneChangeDataset, DATASET_COLUMNS};
pub use format::ModelFormat;
pub use store::ParameterStore;
