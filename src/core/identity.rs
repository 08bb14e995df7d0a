//! Step and field identity for the intake wizard
//!
//! Steps and fields are closed enumerations so that the schema, the
//! accumulated answers and the wire payload cannot drift apart by typo or
//! by array position.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use ulid::Ulid;

/// The pages of the wizard, in presentation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepId {
    /// Company registration and account credentials
    Registration,
    /// Financial and IPO questionnaire
    PredictionData,
    /// Optional free-text risk notes
    RiskAnalysis,
}

impl StepId {
    /// Get the slug used on the command line and in answer files
    pub fn as_str(&self) -> &'static str {
        match self {
            StepId::Registration => "registration",
            StepId::PredictionData => "prediction-data",
            StepId::RiskAnalysis => "risk-analysis",
        }
    }

    /// All steps in presentation order
    pub fn all() -> &'static [StepId] {
        &[
            StepId::Registration,
            StepId::PredictionData,
            StepId::RiskAnalysis,
        ]
    }

    /// Zero-based position of this step
    pub fn index(&self) -> usize {
        match self {
            StepId::Registration => 0,
            StepId::PredictionData => 1,
            StepId::RiskAnalysis => 2,
        }
    }

    /// The step following this one, or `None` on the final step
    pub fn next(&self) -> Option<StepId> {
        Self::all().get(self.index() + 1).copied()
    }

    /// The step preceding this one, or `None` on the first step
    pub fn previous(&self) -> Option<StepId> {
        self.index().checked_sub(1).map(|i| Self::all()[i])
    }

    /// The first step of the wizard
    pub fn first() -> StepId {
        StepId::Registration
    }

    /// Whether this is the last step of the wizard
    pub fn is_final(&self) -> bool {
        self.next().is_none()
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StepId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "registration" | "1" => Ok(StepId::Registration),
            "prediction-data" | "prediction" | "2" => Ok(StepId::PredictionData),
            "risk-analysis" | "risk" | "3" => Ok(StepId::RiskAnalysis),
            _ => Err(IdParseError::InvalidStep(s.to_string())),
        }
    }
}

/// Every field the wizard collects, named as it appears on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FieldKey {
    // Registration
    #[serde(rename = "companyName")]
    CompanyName,
    #[serde(rename = "registrationNumber")]
    RegistrationNumber,
    #[serde(rename = "email")]
    Email,
    #[serde(rename = "password")]
    Password,

    // Prediction data: selects
    #[serde(rename = "industryFF12")]
    Industry,
    #[serde(rename = "exchange")]
    Exchange,
    #[serde(rename = "highTech")]
    HighTech,
    #[serde(rename = "egc")]
    EmergingGrowth,
    #[serde(rename = "vc")]
    VentureBacked,
    #[serde(rename = "pe")]
    PrivateEquityBacked,
    #[serde(rename = "prominence")]
    VcProminence,

    // Prediction data: bounded integers
    #[serde(rename = "age")]
    FirmAge,
    #[serde(rename = "year")]
    IssueYear,
    #[serde(rename = "nUnderwriters")]
    UnderwriterCount,
    #[serde(rename = "nVCs")]
    VcCount,
    #[serde(rename = "nExecutives")]
    ExecutiveCount,
    #[serde(rename = "nPatents")]
    PatentCount,

    // Prediction data: free numeric
    #[serde(rename = "sharesOfferedPerc")]
    SharesOfferedPerc,
    #[serde(rename = "investmentReceived")]
    InvestmentReceived,
    #[serde(rename = "amountOnProspectus")]
    AmountOnProspectus,
    #[serde(rename = "commonEquity")]
    CommonEquity,
    #[serde(rename = "sp2weeksBefore")]
    Sp2WeeksBefore,
    #[serde(rename = "blueSky")]
    BlueSky,
    #[serde(rename = "managementFee")]
    ManagementFee,
    #[serde(rename = "bookValue")]
    BookValue,
    #[serde(rename = "totalAssets")]
    TotalAssets,
    #[serde(rename = "totalRevenue")]
    TotalRevenue,
    #[serde(rename = "netIncome")]
    NetIncome,
    #[serde(rename = "roa")]
    ReturnOnAssets,
    #[serde(rename = "leverage")]
    Leverage,
    #[serde(rename = "priorFinancing")]
    PriorFinancing,
    #[serde(rename = "reputationLeadMax")]
    ReputationLeadMax,
    #[serde(rename = "reputationAvg")]
    ReputationAvg,
    #[serde(rename = "ipoSize")]
    IpoSize,

    // Risk analysis
    #[serde(rename = "additionalInfo")]
    AdditionalInfo,
    #[serde(rename = "uploadPdf")]
    UploadPdf,
}

impl FieldKey {
    /// Get the wire name of the field
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKey::CompanyName => "companyName",
            FieldKey::RegistrationNumber => "registrationNumber",
            FieldKey::Email => "email",
            FieldKey::Password => "password",
            FieldKey::Industry => "industryFF12",
            FieldKey::Exchange => "exchange",
            FieldKey::HighTech => "highTech",
            FieldKey::EmergingGrowth => "egc",
            FieldKey::VentureBacked => "vc",
            FieldKey::PrivateEquityBacked => "pe",
            FieldKey::VcProminence => "prominence",
            FieldKey::FirmAge => "age",
            FieldKey::IssueYear => "year",
            FieldKey::UnderwriterCount => "nUnderwriters",
            FieldKey::VcCount => "nVCs",
            FieldKey::ExecutiveCount => "nExecutives",
            FieldKey::PatentCount => "nPatents",
            FieldKey::SharesOfferedPerc => "sharesOfferedPerc",
            FieldKey::InvestmentReceived => "investmentReceived",
            FieldKey::AmountOnProspectus => "amountOnProspectus",
            FieldKey::CommonEquity => "commonEquity",
            FieldKey::Sp2WeeksBefore => "sp2weeksBefore",
            FieldKey::BlueSky => "blueSky",
            FieldKey::ManagementFee => "managementFee",
            FieldKey::BookValue => "bookValue",
            FieldKey::TotalAssets => "totalAssets",
            FieldKey::TotalRevenue => "totalRevenue",
            FieldKey::NetIncome => "netIncome",
            FieldKey::ReturnOnAssets => "roa",
            FieldKey::Leverage => "leverage",
            FieldKey::PriorFinancing => "priorFinancing",
            FieldKey::ReputationLeadMax => "reputationLeadMax",
            FieldKey::ReputationAvg => "reputationAvg",
            FieldKey::IpoSize => "ipoSize",
            FieldKey::AdditionalInfo => "additionalInfo",
            FieldKey::UploadPdf => "uploadPdf",
        }
    }

    /// Get all fields in wire order
    pub fn all() -> &'static [FieldKey] {
        &[
            FieldKey::CompanyName,
            FieldKey::RegistrationNumber,
            FieldKey::Email,
            FieldKey::Password,
            FieldKey::Industry,
            FieldKey::Exchange,
            FieldKey::HighTech,
            FieldKey::EmergingGrowth,
            FieldKey::VentureBacked,
            FieldKey::PrivateEquityBacked,
            FieldKey::VcProminence,
            FieldKey::FirmAge,
            FieldKey::IssueYear,
            FieldKey::UnderwriterCount,
            FieldKey::VcCount,
            FieldKey::ExecutiveCount,
            FieldKey::PatentCount,
            FieldKey::SharesOfferedPerc,
            FieldKey::InvestmentReceived,
            FieldKey::AmountOnProspectus,
            FieldKey::CommonEquity,
            FieldKey::Sp2WeeksBefore,
            FieldKey::BlueSky,
            FieldKey::ManagementFee,
            FieldKey::BookValue,
            FieldKey::TotalAssets,
            FieldKey::TotalRevenue,
            FieldKey::NetIncome,
            FieldKey::ReturnOnAssets,
            FieldKey::Leverage,
            FieldKey::PriorFinancing,
            FieldKey::ReputationLeadMax,
            FieldKey::ReputationAvg,
            FieldKey::IpoSize,
            FieldKey::AdditionalInfo,
            FieldKey::UploadPdf,
        ]
    }

    /// Whether the field holds a credential that must never be echoed
    pub fn is_secret(&self) -> bool {
        matches!(self, FieldKey::Password)
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FieldKey {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldKey::all()
            .iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| IdParseError::InvalidField(s.to_string()))
    }
}

/// Identifier of one submission attempt, e.g. `SUB-01HC2JB7SMQX7RS1Y0GFKBHPTD`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunId(Ulid);

impl RunId {
    const PREFIX: &'static str = "SUB";

    /// Create a fresh run identifier
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", Self::PREFIX, self.0)
    }
}

impl FromStr for RunId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (prefix, ulid_str) = s
            .split_once('-')
            .ok_or_else(|| IdParseError::InvalidRunId(s.to_string()))?;
        if !prefix.eq_ignore_ascii_case(Self::PREFIX) {
            return Err(IdParseError::InvalidRunId(s.to_string()));
        }
        let ulid = Ulid::from_string(ulid_str)
            .map_err(|_| IdParseError::InvalidRunId(s.to_string()))?;
        Ok(Self(ulid))
    }
}

impl Serialize for RunId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for RunId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors when parsing step, field or run identifiers
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdParseError {
    #[error("Unknown wizard step: {0} (expected registration, prediction-data or risk-analysis)")]
    InvalidStep(String),

    #[error("Unknown field: {0}")]
    InvalidField(String),

    #[error("Invalid submission id: {0}")]
    InvalidRunId(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_navigation() {
        assert_eq!(StepId::first(), StepId::Registration);
        assert_eq!(StepId::Registration.next(), Some(StepId::PredictionData));
        assert_eq!(StepId::RiskAnalysis.next(), None);
        assert_eq!(StepId::Registration.previous(), None);
        assert_eq!(StepId::RiskAnalysis.previous(), Some(StepId::PredictionData));
        assert!(StepId::RiskAnalysis.is_final());
        assert!(!StepId::PredictionData.is_final());
    }

    #[test]
    fn test_step_index_matches_order() {
        for (i, step) in StepId::all().iter().enumerate() {
            assert_eq!(step.index(), i);
        }
    }

    #[test]
    fn test_step_from_str() {
        assert_eq!("registration".parse::<StepId>().unwrap(), StepId::Registration);
        assert_eq!("prediction_data".parse::<StepId>().unwrap(), StepId::PredictionData);
        assert_eq!("Risk".parse::<StepId>().unwrap(), StepId::RiskAnalysis);
        assert!("payment".parse::<StepId>().is_err());
    }

    #[test]
    fn test_field_key_count_and_uniqueness() {
        let all = FieldKey::all();
        assert_eq!(all.len(), 36);
        let names: std::collections::HashSet<_> = all.iter().map(|k| k.as_str()).collect();
        assert_eq!(names.len(), all.len());
    }

    #[test]
    fn test_field_key_serde_matches_as_str() {
        for key in FieldKey::all() {
            let json = serde_json::to_string(key).unwrap();
            assert_eq!(json, format!("\"{}\"", key.as_str()));
        }
    }

    #[test]
    fn test_field_key_from_str() {
        assert_eq!("industryFF12".parse::<FieldKey>().unwrap(), FieldKey::Industry);
        assert_eq!("nvcs".parse::<FieldKey>().unwrap(), FieldKey::VcCount);
        assert!("companyname2".parse::<FieldKey>().is_err());
    }

    #[test]
    fn test_run_id_roundtrip() {
        let id = RunId::new();
        let s = id.to_string();
        assert!(s.starts_with("SUB-"));
        let parsed: RunId = s.parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_run_id_rejects_bad_prefix() {
        assert!("REQ-01HC2JB7SMQX7RS1Y0GFKBHPTD".parse::<RunId>().is_err());
        assert!("SUB".parse::<RunId>().is_err());
    }
}
