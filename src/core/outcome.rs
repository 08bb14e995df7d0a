//! Submission outcome and its durable record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

use crate::core::identity::RunId;
use crate::core::payload::SubmissionPayload;

/// Which remote call failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallStage {
    /// `GET /ipo/health`
    Probe,
    /// `POST /ipo/predict-immediately`
    Predict,
}

impl fmt::Display for CallStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallStage::Probe => write!(f, "health check"),
            CallStage::Predict => write!(f, "prediction request"),
        }
    }
}

/// Why a submission degraded to an offline outcome
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SubmissionError {
    #[error("{stage} failed: {message}")]
    Connectivity { stage: CallStage, message: String },

    #[error("{stage} timed out after {seconds}s")]
    Timeout { stage: CallStage, seconds: u64 },

    #[error("{stage} returned HTTP {status}: {body}")]
    Status {
        stage: CallStage,
        status: u16,
        body: String,
    },

    #[error("Unexpected response from prediction service: {0}")]
    MalformedResponse(String),
}

impl SubmissionError {
    /// Stable tag persisted alongside the message
    pub fn kind(&self) -> &'static str {
        match self {
            SubmissionError::Connectivity { .. } => "connectivity",
            SubmissionError::Timeout { .. } => "timeout",
            SubmissionError::Status { .. } => "http_status",
            SubmissionError::MalformedResponse(_) => "malformed_response",
        }
    }
}

/// Price and status block of a prediction response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionBlock {
    #[serde(rename = "$id", default)]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub predicted_offer_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub predicted_close_day1: Option<f64>,
    #[serde(default)]
    pub prediction_status: Option<String>,
    #[serde(default)]
    pub model_used: Option<String>,
    #[serde(rename = "industryFF12", default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub exchange: Option<String>,
}

/// Risk block of a prediction response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAnalysisBlock {
    #[serde(rename = "$id", default)]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub risk_score: Option<f64>,
    #[serde(default)]
    pub analysis_status: Option<String>,
    #[serde(default)]
    pub additional_info: Option<String>,
}

/// User block of a prediction response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserBlock {
    #[serde(rename = "$id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub registration_number: Option<String>,
}

/// One entry of the prediction history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    #[serde(default)]
    pub prediction_type: Option<String>,
    #[serde(default)]
    pub predicted_value: Option<Value>,
    #[serde(default)]
    pub model_version: Option<String>,
}

/// Typed view of the service response. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResponse {
    #[serde(default)]
    pub user: Option<UserBlock>,
    pub prediction: PredictionBlock,
    #[serde(default)]
    pub risk_analysis: Option<RiskAnalysisBlock>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub prediction_history: Vec<HistoryEntry>,
}

impl PredictionResponse {
    /// Interpret a raw response body
    pub fn from_value(raw: &Value) -> Result<Self, SubmissionError> {
        if !raw.is_object() {
            return Err(SubmissionError::MalformedResponse(
                "response body is not a JSON object".to_string(),
            ));
        }
        serde_json::from_value(raw.clone())
            .map_err(|e| SubmissionError::MalformedResponse(e.to_string()))
    }

    /// Whether either price prediction is present
    pub fn has_predictions(&self) -> bool {
        self.prediction.predicted_offer_price.is_some()
            || self.prediction.predicted_close_day1.is_some()
    }
}

/// The result of one submission attempt
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    Succeeded {
        run_id: RunId,
        payload: SubmissionPayload,
        raw: Value,
        response: PredictionResponse,
        submitted_at: DateTime<Utc>,
    },
    Failed {
        run_id: RunId,
        payload: SubmissionPayload,
        error: SubmissionError,
        submitted_at: DateTime<Utc>,
    },
}

impl SubmissionOutcome {
    /// The payload that was (or would have been) sent
    pub fn payload(&self) -> &SubmissionPayload {
        match self {
            SubmissionOutcome::Succeeded { payload, .. } => payload,
            SubmissionOutcome::Failed { payload, .. } => payload,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SubmissionOutcome::Succeeded { .. })
    }

    /// Build the durable record for this outcome
    pub fn to_record(&self, generation: u64) -> OutcomeRecord {
        match self {
            SubmissionOutcome::Succeeded {
                run_id,
                payload,
                raw,
                response,
                submitted_at,
            } => OutcomeRecord {
                run_id: Some(run_id.clone()),
                generation,
                submission_data: payload.clone(),
                backend_response: Some(raw.clone()),
                has_predictions: Some(response.has_predictions()),
                error: None,
                error_kind: None,
                offline: None,
                submitted_at: *submitted_at,
            },
            SubmissionOutcome::Failed {
                run_id,
                payload,
                error,
                submitted_at,
            } => OutcomeRecord {
                run_id: Some(run_id.clone()),
                generation,
                submission_data: payload.clone(),
                backend_response: None,
                has_predictions: None,
                error: Some(error.to_string()),
                error_kind: Some(error.kind().to_string()),
                offline: Some(true),
                submitted_at: *submitted_at,
            },
        }
    }
}

/// The single durable record of the latest wizard run.
///
/// Successful runs carry `backendResponse` and `hasPredictions`; failed runs
/// carry `error` and `offline: true`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<RunId>,
    #[serde(default)]
    pub generation: u64,
    pub submission_data: SubmissionPayload,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend_response: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_predictions: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offline: Option<bool>,
    pub submitted_at: DateTime<Utc>,
}

impl OutcomeRecord {
    /// Whether this record holds a backend response
    pub fn is_online(&self) -> bool {
        self.backend_response.is_some() && self.offline != Some(true)
    }
}

/// Accept numbers, numeric strings and null
fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<HistoryEntry>, D::Error> {
    Ok(Option::<Vec<HistoryEntry>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::wizard::AccumulatedData;
    use serde_json::json;

    fn payload() -> SubmissionPayload {
        SubmissionPayload::from_accumulated_in_year(&AccumulatedData::new(), 2024)
    }

    #[test]
    fn test_response_minimal_prediction() {
        let raw = json!({
            "prediction": {
                "predictedOfferPrice": 12.5,
                "predictedCloseDay1": 14.0,
                "predictionStatus": "completed"
            }
        });
        let response = PredictionResponse::from_value(&raw).unwrap();
        assert_eq!(response.prediction.predicted_offer_price, Some(12.5));
        assert_eq!(response.prediction.predicted_close_day1, Some(14.0));
        assert!(response.has_predictions());
        assert!(response.risk_analysis.is_none());
        assert!(response.prediction_history.is_empty());
    }

    #[test]
    fn test_response_full_shape() {
        let raw = json!({
            "user": {"$id": "u1", "companyName": "Acme", "email": "a@acme.com"},
            "prediction": {
                "$id": "p1",
                "predictedOfferPrice": "18.25",
                "predictedCloseDay1": null,
                "predictionStatus": "processing",
                "modelUsed": "ensemble",
                "industryFF12": "Technology",
                "exchange": "NASDAQ"
            },
            "riskAnalysis": {"$id": "r1", "riskScore": 42.6, "analysisStatus": "completed"},
            "predictionHistory": [
                {"predictionType": "offer_price", "predictedValue": 18.25, "modelVersion": "v2"}
            ],
            "extra": true
        });
        let response = PredictionResponse::from_value(&raw).unwrap();
        assert_eq!(response.user.unwrap().id.as_deref(), Some("u1"));
        assert_eq!(response.prediction.predicted_offer_price, Some(18.25));
        assert_eq!(response.prediction.predicted_close_day1, None);
        assert_eq!(response.prediction.industry.as_deref(), Some("Technology"));
        assert_eq!(response.risk_analysis.unwrap().risk_score, Some(42.6));
        assert_eq!(response.prediction_history.len(), 1);
    }

    #[test]
    fn test_response_without_prediction_is_malformed() {
        let err = PredictionResponse::from_value(&json!({"user": {}})).unwrap_err();
        assert_eq!(err.kind(), "malformed_response");
        let err = PredictionResponse::from_value(&json!([1, 2])).unwrap_err();
        assert_eq!(err.kind(), "malformed_response");
    }

    #[test]
    fn test_failed_record_shape() {
        let outcome = SubmissionOutcome::Failed {
            run_id: RunId::new(),
            payload: payload(),
            error: SubmissionError::Connectivity {
                stage: CallStage::Probe,
                message: "connection refused".to_string(),
            },
            submitted_at: Utc::now(),
        };
        let record = outcome.to_record(3);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["offline"], true);
        assert_eq!(json["errorKind"], "connectivity");
        assert_eq!(json["generation"], 3);
        assert!(json["error"].as_str().unwrap().contains("health check failed"));
        assert!(json.get("backendResponse").is_none());
        assert!(json["submissionData"].is_object());
        assert!(!record.is_online());
    }

    #[test]
    fn test_succeeded_record_shape() {
        let raw = json!({"prediction": {"predictionStatus": "processing"}});
        let outcome = SubmissionOutcome::Succeeded {
            run_id: RunId::new(),
            payload: payload(),
            response: PredictionResponse::from_value(&raw).unwrap(),
            raw: raw.clone(),
            submitted_at: Utc::now(),
        };
        let record = outcome.to_record(1);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["backendResponse"], raw);
        assert_eq!(json["hasPredictions"], false);
        assert!(json.get("offline").is_none());
        assert!(record.is_online());
    }

    #[test]
    fn test_record_reads_legacy_shape() {
        let json = json!({
            "submissionData": serde_json::to_value(payload()).unwrap(),
            "error": "Failed to fetch",
            "submittedAt": "2024-05-01T10:00:00Z",
            "offline": true
        });
        let record: OutcomeRecord = serde_json::from_value(json).unwrap();
        assert_eq!(record.generation, 0);
        assert!(record.run_id.is_none());
        assert_eq!(record.error.as_deref(), Some("Failed to fetch"));
    }
}
