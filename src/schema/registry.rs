//! Field schema registry - the declarative rules for every wizard step

use serde::Serialize;

use crate::core::identity::{FieldKey, StepId};

/// Industry classifications accepted for `industryFF12`
pub const INDUSTRY_OPTIONS: &[&str] = &[
    "Technology",
    "Healthcare",
    "Finance",
    "Consumer Goods",
    "Energy",
    "Telecommunications",
    "Utilities",
    "Real Estate",
    "Materials",
    "Industrials",
    "Consumer Services",
    "Other",
];

/// Listing venues accepted for `exchange`
pub const EXCHANGE_OPTIONS: &[&str] = &["AMEX", "NASDAQ", "NYSE"];

/// Values accepted for the true/false indicator selects
pub const INDICATOR_OPTIONS: &[&str] = &["true", "false"];

/// Format constraints for text fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextFormat {
    Email,
}

/// The kind of value a field holds, with its constraints
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    /// Single-line text with a minimum length and optional format
    Text {
        min_length: usize,
        format: Option<TextFormat>,
        secret: bool,
    },
    /// Integer within a closed range
    Integer { min: i64, max: i64 },
    /// Unbounded numeric quantity (may be negative)
    Decimal,
    /// One of a fixed set of values
    Choice { options: &'static [&'static str] },
    /// Checkbox
    Flag,
    /// Multi-line free text
    FreeText,
}

/// Declarative definition of one field
#[derive(Debug, Clone, Serialize)]
pub struct FieldSpec {
    pub key: FieldKey,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldSpec {
    const fn new(key: FieldKey, label: &'static str, kind: FieldKind, required: bool) -> Self {
        Self {
            key,
            label,
            kind,
            required,
        }
    }

    const fn text(key: FieldKey, label: &'static str, min_length: usize) -> Self {
        Self::new(
            key,
            label,
            FieldKind::Text {
                min_length,
                format: None,
                secret: false,
            },
            true,
        )
    }

    const fn integer(key: FieldKey, label: &'static str, min: i64, max: i64) -> Self {
        Self::new(key, label, FieldKind::Integer { min, max }, true)
    }

    const fn decimal(key: FieldKey, label: &'static str) -> Self {
        Self::new(key, label, FieldKind::Decimal, true)
    }

    const fn choice(key: FieldKey, label: &'static str, options: &'static [&'static str]) -> Self {
        Self::new(key, label, FieldKind::Choice { options }, true)
    }

    /// Short description of the accepted values, used in prompts and listings
    pub fn constraint_summary(&self) -> String {
        match &self.kind {
            FieldKind::Text {
                min_length, format, ..
            } => match format {
                Some(TextFormat::Email) => "e-mail address".to_string(),
                None => format!("text, min {} chars", min_length),
            },
            FieldKind::Integer { min, max } => format!("integer {}-{}", min, max),
            FieldKind::Decimal => "number".to_string(),
            FieldKind::Choice { options } => options.join(" | "),
            FieldKind::Flag => "yes/no".to_string(),
            FieldKind::FreeText => "free text".to_string(),
        }
    }
}

/// One page of the wizard
#[derive(Debug, Clone, Serialize)]
pub struct StepDefinition {
    pub id: StepId,
    pub title: &'static str,
    pub description: &'static str,
    pub fields: &'static [FieldSpec],
}

const REGISTRATION_FIELDS: &[FieldSpec] = &[
    FieldSpec::text(FieldKey::CompanyName, "Company Name", 2),
    FieldSpec::text(FieldKey::RegistrationNumber, "Registration Number", 2),
    FieldSpec::new(
        FieldKey::Email,
        "Email Address",
        FieldKind::Text {
            min_length: 1,
            format: Some(TextFormat::Email),
            secret: false,
        },
        true,
    ),
    FieldSpec::new(
        FieldKey::Password,
        "Password",
        FieldKind::Text {
            min_length: 8,
            format: None,
            secret: true,
        },
        true,
    ),
];

const PREDICTION_FIELDS: &[FieldSpec] = &[
    FieldSpec::choice(FieldKey::Industry, "Industry Classification", INDUSTRY_OPTIONS),
    FieldSpec::choice(FieldKey::Exchange, "Exchange where shares will be listed on", EXCHANGE_OPTIONS),
    FieldSpec::choice(FieldKey::HighTech, "High tech firm indicator", INDICATOR_OPTIONS),
    FieldSpec::choice(FieldKey::EmergingGrowth, "Emerging Growth Company indicator", INDICATOR_OPTIONS),
    FieldSpec::choice(FieldKey::VentureBacked, "Venture capital backing indicator", INDICATOR_OPTIONS),
    FieldSpec::choice(FieldKey::PrivateEquityBacked, "Private equity backing indicator", INDICATOR_OPTIONS),
    FieldSpec::choice(FieldKey::VcProminence, "VC prominence", INDICATOR_OPTIONS),
    FieldSpec::integer(FieldKey::FirmAge, "Firm age", 0, 200),
    FieldSpec::integer(FieldKey::IssueYear, "Issue year", 1900, 2100),
    FieldSpec::integer(FieldKey::UnderwriterCount, "Count of underwriters", 0, 100),
    FieldSpec::decimal(FieldKey::SharesOfferedPerc, "Shares offered as % of shares outstanding after offer"),
    FieldSpec::decimal(FieldKey::InvestmentReceived, "Total known amount invested in company ($000)"),
    FieldSpec::decimal(FieldKey::AmountOnProspectus, "Total amount on prospectus (USD, Global)"),
    FieldSpec::decimal(FieldKey::CommonEquity, "Tangible Common Equity Ratio Before Offer"),
    FieldSpec::decimal(FieldKey::Sp2WeeksBefore, "S&P 500 average 2 weeks before offer date"),
    FieldSpec::decimal(FieldKey::BlueSky, "Blue sky expenses"),
    FieldSpec::decimal(FieldKey::ManagementFee, "Total management fee"),
    FieldSpec::decimal(FieldKey::BookValue, "Book value"),
    FieldSpec::decimal(FieldKey::TotalAssets, "Total assets"),
    FieldSpec::decimal(FieldKey::TotalRevenue, "Total revenue"),
    FieldSpec::decimal(FieldKey::NetIncome, "Net income"),
    FieldSpec::decimal(FieldKey::ReturnOnAssets, "Return on assets"),
    FieldSpec::decimal(FieldKey::Leverage, "Leverage"),
    FieldSpec::integer(FieldKey::VcCount, "Count of VC firms backing IPO firm", 0, 100),
    FieldSpec::integer(FieldKey::ExecutiveCount, "Count of executives", 0, 1000),
    FieldSpec::decimal(FieldKey::PriorFinancing, "Prior financing received"),
    FieldSpec::decimal(FieldKey::ReputationLeadMax, "Lead underwriter reputation (max if more than one)"),
    FieldSpec::decimal(FieldKey::ReputationAvg, "Average reputation of all underwriters"),
    FieldSpec::integer(FieldKey::PatentCount, "Count of patents granted at time of IPO", 0, 10000),
    FieldSpec::decimal(FieldKey::IpoSize, "IPO size in USD"),
];

const RISK_FIELDS: &[FieldSpec] = &[
    FieldSpec::new(
        FieldKey::AdditionalInfo,
        "Additional Information for Risk Analysis",
        FieldKind::FreeText,
        false,
    ),
    FieldSpec::new(FieldKey::UploadPdf, "Upload PDF Documents", FieldKind::Flag, false),
];

const STEPS: &[StepDefinition] = &[
    StepDefinition {
        id: StepId::Registration,
        title: "Company Registration",
        description: "Create your account and register your company",
        fields: REGISTRATION_FIELDS,
    },
    StepDefinition {
        id: StepId::PredictionData,
        title: "Prediction Data",
        description: "Enter financial and IPO-related information",
        fields: PREDICTION_FIELDS,
    },
    StepDefinition {
        id: StepId::RiskAnalysis,
        title: "Risk Analysis",
        description: "Additional information for risk assessment",
        fields: RISK_FIELDS,
    },
];

/// Lookup of step definitions and field specs
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaRegistry;

impl SchemaRegistry {
    pub fn new() -> Self {
        Self
    }

    /// Get the definition of a step
    pub fn step(&self, id: StepId) -> &'static StepDefinition {
        &STEPS[id.index()]
    }

    /// Get the ordered field specs of a step
    pub fn fields(&self, id: StepId) -> &'static [FieldSpec] {
        self.step(id).fields
    }

    /// All step definitions in order
    pub fn steps(&self) -> &'static [StepDefinition] {
        STEPS
    }

    /// Find the spec for a field and the step that owns it
    pub fn field(&self, key: FieldKey) -> Option<(StepId, &'static FieldSpec)> {
        STEPS.iter().find_map(|step| {
            step.fields
                .iter()
                .find(|f| f.key == key)
                .map(|f| (step.id, f))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_steps_are_in_identity_order() {
        let registry = SchemaRegistry::new();
        for step in StepId::all() {
            assert_eq!(registry.step(*step).id, *step);
        }
    }

    #[test]
    fn test_every_field_belongs_to_exactly_one_step() {
        let registry = SchemaRegistry::new();
        let mut owners: HashMap<FieldKey, usize> = HashMap::new();
        for step in registry.steps() {
            for field in step.fields {
                *owners.entry(field.key).or_default() += 1;
            }
        }
        for key in FieldKey::all() {
            assert_eq!(owners.get(key), Some(&1), "{} should have exactly one owner", key);
        }
        assert_eq!(owners.len(), FieldKey::all().len());
    }

    #[test]
    fn test_integer_bounds() {
        let registry = SchemaRegistry::new();
        let bounds = |key| match registry.field(key).unwrap().1.kind {
            FieldKind::Integer { min, max } => (min, max),
            other => panic!("{:?} is not an integer field", other),
        };
        assert_eq!(bounds(FieldKey::FirmAge), (0, 200));
        assert_eq!(bounds(FieldKey::IssueYear), (1900, 2100));
        assert_eq!(bounds(FieldKey::UnderwriterCount), (0, 100));
        assert_eq!(bounds(FieldKey::VcCount), (0, 100));
        assert_eq!(bounds(FieldKey::ExecutiveCount), (0, 1000));
        assert_eq!(bounds(FieldKey::PatentCount), (0, 10000));
    }

    #[test]
    fn test_final_step_fields_are_optional() {
        let registry = SchemaRegistry::new();
        assert!(registry
            .fields(StepId::RiskAnalysis)
            .iter()
            .all(|f| !f.required));
    }

    #[test]
    fn test_constraint_summary() {
        let registry = SchemaRegistry::new();
        let (_, age) = registry.field(FieldKey::FirmAge).unwrap();
        assert_eq!(age.constraint_summary(), "integer 0-200");
        let (_, exchange) = registry.field(FieldKey::Exchange).unwrap();
        assert_eq!(exchange.constraint_summary(), "AMEX | NASDAQ | NYSE");
    }
}
