//! ParameterModel - Parameter Store contents
//!
//! The personalized behavior parameters consumed by the path planner, plus
//! the versioned envelope they are persisted in.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ContractError;

/// Schema version written by this build
pub const MODEL_SCHEMA_VERSION: u32 = 1;

/// Number of coefficients of a quintic polynomial
pub const QUINTIC_COEFFS: usize = 6;

/// Personalized driving-behavior parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterModel {
    /// Safe following distance (meters)
    pub safe_distance: f64,

    /// Cruising speed (km/h)
    pub target_speed: f64,

    /// Quintic lane-change shape
    pub poly_param: PolyParam,

    /// Sinusoidal lane-change shape
    pub sin_param: SinParam,
}

impl Default for ParameterModel {
    fn default() -> Self {
        Self {
            safe_distance: 10.0,
            target_speed: 28.0,
            poly_param: PolyParam::default(),
            sin_param: SinParam::default(),
        }
    }
}

impl ParameterModel {
    /// Look up a parameter by key
    pub fn get(&self, key: ParameterKey) -> ParameterValue {
        match key {
            ParameterKey::SafeDistance => ParameterValue::Scalar(self.safe_distance),
            ParameterKey::TargetSpeed => ParameterValue::Scalar(self.target_speed),
            ParameterKey::PolyParam => ParameterValue::Poly(self.poly_param.clone()),
            ParameterKey::SinParam => ParameterValue::Sin(self.sin_param.clone()),
        }
    }
}

/// Quintic lane-change trajectory parameters
///
/// `lon_param` / `lat_param` are the coefficients `a0..a5` of
/// `p(t) = a0 + a1 t + a2 t² + a3 t³ + a4 t⁴ + a5 t⁵` for `t ∈ [0, dt]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolyParam {
    pub lon_dis: f64,
    pub lat_dis: f64,
    pub dt: f64,
    pub lon_param: [f64; QUINTIC_COEFFS],
    pub lat_param: [f64; QUINTIC_COEFFS],
}

impl Default for PolyParam {
    fn default() -> Self {
        Self {
            lon_dis: 30.0,
            lat_dis: -3.5,
            dt: 4.0,
            lon_param: [0.0, 7.0, 0.0, 0.3125, -0.1172, 0.0117],
            lat_param: [0.0, 0.0, 0.0, -0.5469, 0.2051, -0.0205],
        }
    }
}

/// Sinusoidal lane-change trajectory parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SinParam {
    pub lon_dis: f64,
    pub lat_dis: f64,
    pub dt: f64,
}

impl Default for SinParam {
    fn default() -> Self {
        Self {
            lon_dis: 30.0,
            lat_dis: -3.5,
            dt: 4.0,
        }
    }
}

/// On-disk envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PersistedModel {
    pub schema_version: u32,
    pub model: ParameterModel,
}

impl PersistedModel {
    pub fn current(model: ParameterModel) -> Self {
        Self {
            schema_version: MODEL_SCHEMA_VERSION,
            model,
        }
    }
}

/// Parameter query key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKey {
    SafeDistance,
    TargetSpeed,
    PolyParam,
    SinParam,
}

impl ParameterKey {
    pub const ALL: [ParameterKey; 4] = [
        ParameterKey::SafeDistance,
        ParameterKey::TargetSpeed,
        ParameterKey::PolyParam,
        ParameterKey::SinParam,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterKey::SafeDistance => "safe_distance",
            ParameterKey::TargetSpeed => "target_speed",
            ParameterKey::PolyParam => "poly_param",
            ParameterKey::SinParam => "sin_param",
        }
    }
}

impl fmt::Display for ParameterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParameterKey {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| ContractError::unknown_parameter(s))
    }
}

/// Parameter query result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Scalar(f64),
    Poly(PolyParam),
    Sin(SinParam),
}

impl ParameterValue {
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            ParameterValue::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_poly(&self) -> Option<&PolyParam> {
        match self {
            ParameterValue::Poly(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_sin(&self) -> Option<&SinParam> {
        match self {
            ParameterValue::Sin(p) => Some(p),
            _ => None,
        }
    }
}
