//! Result view model - the always-renderable shape of the latest outcome
//!
//! Every stored state (nothing, an offline failure, a pending prediction or
//! a finished one) maps to a fully populated `ResultViewModel`. Nothing in
//! here can fail; unreadable input degrades to a placeholder view.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

use crate::core::outcome::{
    HistoryEntry, OutcomeRecord, PredictionBlock, PredictionResponse, RiskAnalysisBlock, UserBlock,
};
use crate::core::payload::SubmissionPayload;
use crate::core::store::OutcomeStore;

/// Company name used when neither the submission nor the service has one
pub const FALLBACK_COMPANY: &str = "Your Company";

pub const NO_DATA: &str = "No Data";
pub const OFFLINE_MODE: &str = "Offline Mode";
pub const DEMO_DATA: &str = "Demo Data";
pub const PROCESSING: &str = "Processing...";
pub const ANALYZING: &str = "Analyzing...";

/// A number or the text shown in its place
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Reading<T> {
    Value(T),
    Placeholder(String),
}

impl<T: Copy> Reading<T> {
    pub fn placeholder(text: &str) -> Self {
        Reading::Placeholder(text.to_string())
    }
}

impl fmt::Display for Reading<f64> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::Value(v) => write!(f, "{}", format_amount(*v)),
            Reading::Placeholder(text) => write!(f, "{}", text),
        }
    }
}

impl fmt::Display for Reading<u8> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::Value(v) => write!(f, "{}", v),
            Reading::Placeholder(text) => write!(f, "{}", text),
        }
    }
}

/// Render a price without a trailing `.0`
pub fn format_amount(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{}", value)
    }
}

/// Qualitative risk band of a 0-100 score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskBand {
    Low,
    Moderate,
    High,
}

impl RiskBand {
    /// `<30` low, `[30,70)` moderate, `>=70` high
    pub fn from_score(score: f64) -> Self {
        if score < 30.0 {
            RiskBand::Low
        } else if score < 70.0 {
            RiskBand::Moderate
        } else {
            RiskBand::High
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskBand::Low => "Low Risk",
            RiskBand::Moderate => "Moderate Risk",
            RiskBand::High => "High Risk",
        }
    }
}

impl fmt::Display for RiskBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Which row of the policy table produced the view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    /// Nothing has been submitted yet
    NoRecord,
    /// The last submission never reached the service
    Offline,
    /// The service accepted the submission but has no prices yet
    Processing,
    /// Prices are available
    Complete,
}

impl ResultStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultStatus::NoRecord => "no_record",
            ResultStatus::Offline => "offline",
            ResultStatus::Processing => "processing",
            ResultStatus::Complete => "complete",
        }
    }
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fixed risk factors and recommendations shown with a view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Advisory {
    pub risk_factors: &'static [&'static str],
    pub recommendations: &'static [&'static str],
}

pub const NO_RECORD_ADVICE: Advisory = Advisory {
    risk_factors: &["No submission data found"],
    recommendations: &["Please submit the form first"],
};

pub const OFFLINE_ADVICE: Advisory = Advisory {
    risk_factors: &[
        "Backend connection failed",
        "Using demonstration data only",
        "Please check backend connection",
    ],
    recommendations: &[
        "Restart the backend server",
        "Check API connection",
        "Try submitting the form again",
    ],
};

pub const PENDING_ADVICE: Advisory = Advisory {
    risk_factors: &[
        "IPO market conditions analysis pending",
        "Sector-specific risk assessment in progress",
        "Competitive analysis being evaluated",
    ],
    recommendations: &[
        "Monitor AI prediction completion",
        "Review risk analysis results when available",
        "Consider market timing for IPO launch",
    ],
};

pub const COMPLETED_ADVICE: Advisory = Advisory {
    risk_factors: &[
        "Predictions reflect market conditions at submission time",
        "Sector volatility can move the first-day close",
        "Model estimates carry statistical uncertainty",
    ],
    recommendations: &[
        "Review the predicted offer price with your underwriters",
        "Compare the day 1 close estimate against sector peers",
        "Consider market timing for IPO launch",
    ],
};

pub const SERVICE_FAILURE_ADVICE: Advisory = Advisory {
    risk_factors: &[
        "AI prediction service reported a failure",
        "Predictions for this submission are unavailable",
    ],
    recommendations: &[
        "Try submitting the form again",
        "Check the prediction service logs",
    ],
};

/// Identifiers and statuses reported by the service, for diagnostic display
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserBlock>,
    pub prediction: PredictionBlock,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_analysis: Option<RiskAnalysisBlock>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub prediction_history: Vec<HistoryEntry>,
}

/// Display-ready view of the latest outcome
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultViewModel {
    pub status: ResultStatus,
    pub company_name: String,
    pub offer_price: Reading<f64>,
    pub day1_close: Reading<f64>,
    pub risk_score: Reading<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_band: Option<RiskBand>,
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prediction_status: Option<String>,
    pub risk_factors: Vec<String>,
    pub recommendations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<Diagnostics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    /// Submitted values; kept out of serialized views because of the password
    #[serde(skip)]
    pub submission: Option<SubmissionPayload>,
}

impl ResultViewModel {
    /// Read the store and build the view. Store failures show as no record.
    pub fn load(store: &dyn OutcomeStore) -> Self {
        match store.load() {
            Ok(record) => Self::from_record(record.as_ref()),
            Err(e) => {
                warn!(error = %e, "stored outcome unreadable; showing empty results");
                Self::from_record(None)
            }
        }
    }

    /// Build the view for a stored record, or its absence
    pub fn from_record(record: Option<&OutcomeRecord>) -> Self {
        let Some(record) = record else {
            return Self::no_record();
        };

        let Some(raw) = record.backend_response.as_ref().filter(|_| record.offline != Some(true))
        else {
            return Self::offline(record, record.error.clone());
        };

        match PredictionResponse::from_value(raw) {
            Ok(response) => Self::connected(record, response),
            Err(e) => {
                warn!(error = %e, "stored backend response has an unexpected shape");
                Self::offline(record, Some(e.to_string()))
            }
        }
    }

    fn no_record() -> Self {
        debug!("no stored outcome");
        Self {
            status: ResultStatus::NoRecord,
            company_name: FALLBACK_COMPANY.to_string(),
            offer_price: Reading::placeholder(NO_DATA),
            day1_close: Reading::placeholder(NO_DATA),
            risk_score: Reading::placeholder(NO_DATA),
            risk_band: None,
            connected: false,
            prediction_status: None,
            risk_factors: owned(NO_RECORD_ADVICE.risk_factors),
            recommendations: owned(NO_RECORD_ADVICE.recommendations),
            diagnostics: None,
            error: None,
            error_kind: None,
            submitted_at: None,
            submission: None,
        }
    }

    fn offline(record: &OutcomeRecord, error: Option<String>) -> Self {
        Self {
            status: ResultStatus::Offline,
            company_name: company_name(&record.submission_data, None),
            offer_price: Reading::placeholder(OFFLINE_MODE),
            day1_close: Reading::placeholder(OFFLINE_MODE),
            risk_score: Reading::placeholder(DEMO_DATA),
            risk_band: None,
            connected: false,
            prediction_status: None,
            risk_factors: owned(OFFLINE_ADVICE.risk_factors),
            recommendations: owned(OFFLINE_ADVICE.recommendations),
            diagnostics: None,
            error,
            error_kind: record.error_kind.clone(),
            submitted_at: Some(record.submitted_at),
            submission: Some(record.submission_data.clone()),
        }
    }

    fn connected(record: &OutcomeRecord, response: PredictionResponse) -> Self {
        let prediction = &response.prediction;
        let status = if response.has_predictions() {
            ResultStatus::Complete
        } else {
            ResultStatus::Processing
        };

        let price = |value: Option<f64>| match value {
            Some(v) => Reading::Value(v),
            None => Reading::placeholder(PROCESSING),
        };

        let score = response
            .risk_analysis
            .as_ref()
            .and_then(|r| r.risk_score)
            .filter(|s| s.is_finite());
        let (risk_score, risk_band) = match score {
            Some(s) => {
                let rounded = s.round().clamp(0.0, 100.0);
                (Reading::Value(rounded as u8), Some(RiskBand::from_score(rounded)))
            }
            None => (Reading::placeholder(ANALYZING), None),
        };

        let advice = advisory_for(status, prediction.prediction_status.as_deref());

        Self {
            status,
            company_name: company_name(&record.submission_data, response.user.as_ref()),
            offer_price: price(prediction.predicted_offer_price),
            day1_close: price(prediction.predicted_close_day1),
            risk_score,
            risk_band,
            connected: true,
            prediction_status: prediction.prediction_status.clone(),
            risk_factors: owned(advice.risk_factors),
            recommendations: owned(advice.recommendations),
            error: None,
            error_kind: None,
            submitted_at: Some(record.submitted_at),
            submission: Some(record.submission_data.clone()),
            diagnostics: Some(Diagnostics {
                user: response.user,
                prediction: response.prediction,
                risk_analysis: response.risk_analysis,
                prediction_history: response.prediction_history,
            }),
        }
    }

    /// `"12.5% (Low Risk)"`-style text, or the placeholder
    pub fn risk_text(&self) -> String {
        match (&self.risk_score, self.risk_band) {
            (Reading::Value(v), Some(band)) => format!("{}% ({})", v, band),
            (reading, _) => reading.to_string(),
        }
    }
}

/// Advisory lists for a connected view
pub fn advisory_for(status: ResultStatus, prediction_status: Option<&str>) -> Advisory {
    match status {
        ResultStatus::NoRecord => NO_RECORD_ADVICE,
        ResultStatus::Offline => OFFLINE_ADVICE,
        _ if prediction_status.is_some_and(|s| s.eq_ignore_ascii_case("failed")) => {
            SERVICE_FAILURE_ADVICE
        }
        ResultStatus::Complete => COMPLETED_ADVICE,
        ResultStatus::Processing => PENDING_ADVICE,
    }
}

fn company_name(submission: &SubmissionPayload, user: Option<&UserBlock>) -> String {
    let submitted = submission.company_name.trim();
    if !submitted.is_empty() {
        return submitted.to_string();
    }
    user.and_then(|u| u.company_name.as_deref())
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(FALLBACK_COMPANY)
        .to_string()
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
