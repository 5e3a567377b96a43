//! Model performance payload.
//!
//! The backend returns a large document; only `model_status` is consumed
//! here. Every field inside it is read independently so that a single
//! missing or mistyped value never hides the others.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::Result;

/// Largest integer an `f64` represents exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Top-level response of the model performance endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    /// Current model status, absent when the backend has none to report.
    #[serde(default, deserialize_with = "object_or_none")]
    pub model_status: Option<ModelStatus>,
}

impl PerformanceReport {
    /// Parse a response body.
    ///
    /// Fails when the body is not JSON or its top level is not an object.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(body)?;
        if !value.is_object() {
            return Err(serde_json::Error::custom("expected a JSON object at the top level").into());
        }
        Ok(serde_json::from_value(value)?)
    }
}

/// Snapshot of the deployed model, rebuilt on every fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelStatus {
    /// Prediction accuracy in percent.
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    /// Number of samples the model was trained on.
    #[serde(default, deserialize_with = "lenient_i64", skip_serializing_if = "Option::is_none")]
    pub training_samples: Option<i64>,
    /// Average fuel savings in percent.
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub avg_fuel_savings: Option<f64>,
    /// Mean prediction latency in milliseconds.
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub prediction_time_ms: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub health_status: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

impl ModelStatus {
    /// Names of the rendered fields that are absent or unusable.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.accuracy.is_none() {
            missing.push("accuracy");
        }
        if self.training_samples.is_none() {
            missing.push("training_samples");
        }
        if self.avg_fuel_savings.is_none() {
            missing.push("avg_fuel_savings");
        }
        if self.prediction_time_ms.is_none() {
            missing.push("prediction_time_ms");
        }
        missing
    }

    /// Whether all four rendered fields are present.
    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }
}

fn object_or_none<'de, D>(deserializer: D) -> std::result::Result<Option<ModelStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(value @ Value::Object(_)) => serde_json::from_value(value)
            .map(Some)
            .map_err(D::Error::custom),
        _ => Ok(None),
    }
}

fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(|v| v.as_f64()))
}

fn lenient_i64<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| {
        v.as_i64().or_else(|| {
            v.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER)
                .map(|f| f as i64)
        })
    }))
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::String(s) => Some(s),
        _ => None,
    }))
}
