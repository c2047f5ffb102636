//! 配置校验模块
//!
//! 校验规则：
//! - 字段范围 (validator derive 规则)
//! - lateral_threshold < 0 (只识别向左变道)
//! - 哨兵值与换算系数为有限值
//! - 模型文件扩展名受支持，且与数据集路径不同

use ::validator::Validate;
use contracts::{ContractError, LearnerConfig};

/// 支持的模型文件扩展名
const MODEL_EXTENSIONS: [&str; 2] = ["json", "bin"];

/// 校验 LearnerConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &LearnerConfig) -> Result<(), ContractError> {
    validate_ranges(config)?;
    validate_trajectory(config)?;
    validate_target_speed(config)?;
    validate_storage(config)?;
    Ok(())
}

/// 校验字段范围
fn validate_ranges(config: &LearnerConfig) -> Result<(), ContractError> {
    config
        .validate()
        .map_err(|e| ContractError::config_validation("learner", e.to_string()))
}

/// 校验变道学习配置
fn validate_trajectory(config: &LearnerConfig) -> Result<(), ContractError> {
    let trajectory = &config.trajectory;

    if !(trajectory.lateral_threshold < 0.0) {
        return Err(ContractError::config_validation(
            "trajectory.lateral_threshold",
            format!(
                "lateral_threshold must be < 0 (leftward motion), got {}",
                trajectory.lateral_threshold
            ),
        ));
    }

    for (field, value) in [
        ("trajectory.leading_gap_sentinel", trajectory.leading_gap_sentinel),
        ("trajectory.following_gap_sentinel", trajectory.following_gap_sentinel),
    ] {
        if !value.is_finite() {
            return Err(ContractError::config_validation(
                field,
                format!("sentinel must be finite, got {value}"),
            ));
        }
    }

    Ok(())
}

/// 校验目标速度配置
fn validate_target_speed(config: &LearnerConfig) -> Result<(), ContractError> {
    let scale = config.target_speed.speed_scale;
    if !(scale.is_finite() && scale > 0.0) {
        return Err(ContractError::config_validation(
            "target_speed.speed_scale",
            format!("speed_scale must be > 0, got {scale}"),
        ));
    }
    Ok(())
}

/// 校验存储路径
fn validate_storage(config: &LearnerConfig) -> Result<(), ContractError> {
    let storage = &config.storage;

    let ext = storage
        .model_path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);
    match ext {
        Some(ext) if MODEL_EXTENSIONS.contains(&ext.as_str()) => {}
        _ => {
            return Err(ContractError::config_validation(
                "storage.model_path",
                format!(
                    "unsupported model file '{}', expected .json or .bin",
                    storage.model_path.display()
                ),
            ));
        }
    }

    if storage.dataset_path.as_os_str().is_empty() {
        return Err(ContractError::config_validation(
            "storage.dataset_path",
            "dataset_path cannot be empty",
        ));
    }

    if storage.model_path == storage.dataset_path {
        return Err(ContractError::config_validation(
            "storage.dataset_path",
            "dataset_path must differ from model_path",
        ));
    }

    Ok(())
}
