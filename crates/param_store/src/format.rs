//! 模型文件格式
//!
//! 版本化封装 `{ schema_version, model }`：
//! - `.json`：字段名显式，便于人工检查 (默认)
//! - `.bin`：bincode 紧凑编码，前 4 字节为 schema_version (小端)
//!
//! 先读取 schema_version 再解码模型，版本不符时给出确定的错误而不是含糊的解码失败。

use std::path::Path;

use contracts::{ContractError, PersistedModel, MODEL_SCHEMA_VERSION};
use serde::Deserialize;

/// 模型文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    /// JSON 格式 (推荐)
    Json,
    /// bincode 二进制格式
    Bincode,
}

/// 仅用于读取版本号
#[derive(Deserialize)]
struct VersionProbe {
    schema_version: u32,
}

impl ModelFormat {
    /// 从文件扩展名推断格式
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "bin" => Some(Self::Bincode),
            _ => None,
        }
    }

    /// 从模型路径推断格式
    pub fn from_path(path: &Path) -> Result<Self, ContractError> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
            .ok_or_else(|| {
                ContractError::config_validation(
                    "storage.model_path",
                    format!(
                        "unsupported model file '{}', expected .json or .bin",
                        path.display()
                    ),
                )
            })
    }

    /// 编码
    pub fn encode(&self, persisted: &PersistedModel) -> Result<Vec<u8>, ContractError> {
        match self {
            ModelFormat::Json => serde_json::to_vec_pretty(persisted).map_err(|e| {
                ContractError::ModelSerialize {
                    message: format!("JSON serialize error: {e}"),
                }
            }),
            ModelFormat::Bincode => {
                bincode::serialize(persisted).map_err(|e| ContractError::ModelSerialize {
                    message: format!("bincode serialize error: {e}"),
                })
            }
        }
    }

    /// 解码并校验版本
    pub fn decode(&self, path: &Path, bytes: &[u8]) -> Result<PersistedModel, ContractError> {
        let version = self.probe_version(path, bytes)?;
        if version != MODEL_SCHEMA_VERSION {
            return Err(ContractError::UnsupportedSchemaVersion {
                path: path.to_path_buf(),
                found: version,
                supported: MODEL_SCHEMA_VERSION,
            });
        }

        match self {
            ModelFormat::Json => serde_json::from_slice(bytes)
                .map_err(|e| ContractError::model_corrupted(path, e)),
            ModelFormat::Bincode => {
                let persisted: PersistedModel = bincode::deserialize(bytes)
                    .map_err(|e| ContractError::model_corrupted(path, e))?;
                let expected_len = bincode::serialized_size(&persisted)
                    .map_err(|e| ContractError::model_corrupted(path, e))?;
                if expected_len != bytes.len() as u64 {
                    return Err(ContractError::ModelCorrupted {
                        path: path.to_path_buf(),
                        message: format!(
                            "trailing data: {} bytes, expected {expected_len}",
                            bytes.len()
                        ),
                        source: None,
                    });
                }
                Ok(persisted)
            }
        }
    }

    fn probe_version(&self, path: &Path, bytes: &[u8]) -> Result<u32, ContractError> {
        match self {
            ModelFormat::Json => serde_json::from_slice::<VersionProbe>(bytes)
                .map(|probe| probe.schema_version)
                .map_err(|e| ContractError::model_corrupted(path, e)),
            ModelFormat::Bincode => {
                let header: [u8; 4] = bytes
                    .get(..4)
                    .and_then(|h| h.try_into().ok())
                    .ok_or_else(|| ContractError::ModelCorrupted {
                        path: path.to_path_buf(),
                        message: format!("file too short: {} bytes", bytes.len()),
                        source: None,
                    })?;
                Ok(u32::from_le_bytes(header))
            }
        }
    }
}
