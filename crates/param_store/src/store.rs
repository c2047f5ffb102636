//! ParameterStore - persisted personalization model

use std::path::{Path, PathBuf};

use contracts::{
    ContractError, ParameterKey, ParameterModel, ParameterValue, PersistedModel, PolyParam,
    SinParam,
};
use tracing::{debug, info, instrument};

use crate::format::ModelFormat;
use crate::fs::write_atomic;

/// Parameter store
///
/// Holds the in-memory `ParameterModel` and the path it is persisted to.
/// The model is created with defaults on first access and only ever
/// overwritten afterwards.
#[derive(Debug, Clone)]
pub struct ParameterStore {
    path: PathBuf,
    format: ModelFormat,
    model: ParameterModel,
}

impl ParameterStore {
    /// Load the model at `path`, creating and persisting defaults if absent
    ///
    /// # Errors
    /// - Unsupported file extension
    /// - Persisted file exists but is corrupted or of another schema version
    /// - IO failure
    #[instrument(name = "param_store_load", skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ContractError> {
        let path = path.as_ref().to_path_buf();
        let format = ModelFormat::from_path(&path)?;

        if !path.exists() {
            info!("No persisted model, writing defaults");
            let defaults = PersistedModel::current(ParameterModel::default());
            write_atomic(&path, &format.encode(&defaults)?)?;
        }

        let model = Self::read_model(&path, format)?;
        debug!(?model, "Model loaded");

        Ok(Self {
            path,
            format,
            model,
        })
    }

    /// Re-read the persisted copy, discarding unsaved changes
    pub fn reload(&mut self) -> Result<(), ContractError> {
        self.model = Self::read_model(&self.path, self.format)?;
        Ok(())
    }

    /// Persist the whole in-memory model, replacing the file atomically
    #[instrument(name = "param_store_save", skip(self), fields(path = %self.path.display()))]
    pub fn save(&self) -> Result<(), ContractError> {
        let persisted = PersistedModel::current(self.model.clone());
        write_atomic(&self.path, &self.format.encode(&persisted)?)?;
        debug!("Model saved");
        Ok(())
    }

    /// Look up a parameter by its string key
    ///
    /// # Errors
    /// `UnknownParameter` if `key` is not one of
    /// `safe_distance`, `target_speed`, `poly_param`, `sin_param`.
    pub fn get(&self, key: &str) -> Result<ParameterValue, ContractError> {
        let key: ParameterKey = key.parse()?;
        Ok(self.model.get(key))
    }

    pub fn model(&self) -> &ParameterModel {
        &self.model
    }

    pub fn safe_distance(&self) -> f64 {
        self.model.safe_distance
    }

    pub fn target_speed(&self) -> f64 {
        self.model.target_speed
    }

    pub fn poly_param(&self) -> &PolyParam {
        &self.model.poly_param
    }

    pub fn sin_param(&self) -> &SinParam {
        &self.model.sin_param
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> ModelFormat {
        self.format
    }

    pub fn set_safe_distance(&mut self, value: f64) -> Result<(), ContractError> {
        check_finite(ParameterKey::SafeDistance, "safe_distance", value)?;
        self.model.safe_distance = value;
        Ok(())
    }

    pub fn set_target_speed(&mut self, value: f64) -> Result<(), ContractError> {
        check_finite(ParameterKey::TargetSpeed, "target_speed", value)?;
        self.model.target_speed = value;
        Ok(())
    }

    pub fn set_poly_param(&mut self, param: PolyParam) -> Result<(), ContractError> {
        let key = ParameterKey::PolyParam;
        check_shape(key, param.dt, param.lon_dis, param.lat_dis)?;
        for c in param.lon_param.iter().chain(param.lat_param.iter()) {
            check_finite(key, "coefficient", *c)?;
        }
        self.model.poly_param = param;
        Ok(())
    }

    pub fn set_sin_param(&mut self, param: SinParam) -> Result<(), ContractError> {
        check_shape(ParameterKey::SinParam, param.dt, param.lon_dis, param.lat_dis)?;
        self.model.sin_param = param;
        Ok(())
    }

    fn read_model(path: &Path, format: ModelFormat) -> Result<ParameterModel, ContractError> {
        let bytes = std::fs::read(path)?;
        Ok(format.decode(path, &bytes)?.model)
    }
}

fn check_finite(key: ParameterKey, field: &str, value: f64) -> Result<(), ContractError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ContractError::invalid_parameter(
            key.as_str(),
            format!("{field} must be finite, got {value}"),
        ))
    }
}

fn check_shape(key: ParameterKey, dt: f64, lon_dis: f64, lat_dis: f64) -> Result<(), ContractError> {
    check_finite(key, "lon_dis", lon_dis)?;
    check_finite(key, "lat_dis", lat_dis)?;
    check_finite(key, "dt", dt)?;
    if dt <= 0.0 {
        return Err(ContractError::invalid_parameter(
            key.as_str(),
            format!("dt must be > 0, got {dt}"),
        ));
    }
    Ok(())
}
