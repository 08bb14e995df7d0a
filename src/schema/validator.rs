//! Step validation with field-level error reporting
//!
//! Every field of the active step is checked independently and all
//! violations are reported together, so the user can fix a page in one pass.

use miette::Diagnostic;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::debug;

use crate::core::identity::{FieldKey, StepId};
use crate::schema::registry::{FieldKind, FieldSpec, SchemaRegistry, TextFormat};

/// Raw or normalized values keyed by field
pub type StepValues = BTreeMap<FieldKey, String>;

/// Validation failure for one wizard step
#[derive(Debug, Error, Diagnostic)]
#[error("{title} is incomplete: {summary}")]
#[diagnostic(
    code(ipo_intake::schema::step_invalid),
    help("Correct the listed fields and try the step again")
)]
pub struct StepValidationError {
    step: StepId,
    title: String,
    summary: String,

    #[related]
    violations: Vec<FieldViolation>,
}

/// A single field that failed its rule
#[derive(Debug, Clone, Error, Diagnostic)]
#[error("{label}: {message}")]
pub struct FieldViolation {
    pub field: FieldKey,
    pub label: &'static str,
    pub message: String,

    #[help]
    help: Option<String>,
}

impl FieldViolation {
    pub fn new(spec: &FieldSpec, message: String, help: Option<String>) -> Self {
        Self {
            field: spec.key,
            label: spec.label,
            message,
            help,
        }
    }
}

impl StepValidationError {
    pub fn new(step: StepId, title: &str, violations: Vec<FieldViolation>) -> Self {
        let count = violations.len();
        let summary = if count == 1 {
            "1 error".to_string()
        } else {
            format!("{} errors", count)
        };
        Self {
            step,
            title: title.to_string(),
            summary,
            violations,
        }
    }

    /// The step that failed
    pub fn step(&self) -> StepId {
        self.step
    }

    /// Get the number of violations
    pub fn violation_count(&self) -> usize {
        self.violations.len()
    }

    /// The individual violations in field order
    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    /// Field name to message mapping
    pub fn field_errors(&self) -> BTreeMap<FieldKey, String> {
        self.violations
            .iter()
            .map(|v| (v.field, v.message.clone()))
            .collect()
    }
}

/// Validates the active step against the schema registry
#[derive(Debug, Clone, Copy, Default)]
pub struct StepValidator {
    registry: SchemaRegistry,
}

impl StepValidator {
    pub fn new(registry: SchemaRegistry) -> Self {
        Self { registry }
    }

    /// Validate the raw values for one step.
    ///
    /// Values for fields outside the step are ignored. On success the
    /// returned map holds a normalized value for every field of the step.
    pub fn validate(&self, step: StepId, raw: &StepValues) -> Result<StepValues, StepValidationError> {
        let definition = self.registry.step(step);
        let mut normalized = StepValues::new();
        let mut violations = Vec::new();

        for spec in definition.fields {
            let value = raw.get(&spec.key).map(String::as_str).unwrap_or("");
            match check_field(spec, value) {
                Ok(v) => {
                    normalized.insert(spec.key, v);
                }
                Err(violation) => violations.push(violation),
            }
        }

        if violations.is_empty() {
            debug!(step = %step, fields = normalized.len(), "step validated");
            Ok(normalized)
        } else {
            debug!(step = %step, errors = violations.len(), "step rejected");
            Err(StepValidationError::new(step, definition.title, violations))
        }
    }
}

/// Check one field and produce its normalized value
fn check_field(spec: &FieldSpec, raw: &str) -> Result<String, FieldViolation> {
    match &spec.kind {
        FieldKind::Text {
            min_length,
            format,
            secret,
        } => {
            // Secrets are taken verbatim
            let value = if *secret { raw } else { raw.trim() };
            if value.is_empty() {
                if spec.required {
                    return Err(required(spec));
                }
                return Ok(String::new());
            }
            if value.chars().count() < *min_length {
                return Err(FieldViolation::new(
                    spec,
                    format!("must be at least {} characters", min_length),
                    None,
                ));
            }
            if let Some(TextFormat::Email) = format {
                if !is_email(value) {
                    return Err(FieldViolation::new(
                        spec,
                        "invalid email address".to_string(),
                        Some("Use the form name@example.com".to_string()),
                    ));
                }
            }
            Ok(value.to_string())
        }

        FieldKind::Integer { min, max } => {
            let value = raw.trim();
            let out_of_range = || {
                FieldViolation::new(
                    spec,
                    format!("must be a whole number between {} and {}", min, max),
                    None,
                )
            };
            if value.is_empty() {
                return Err(out_of_range());
            }
            let parsed: i64 = value.parse().map_err(|_| out_of_range())?;
            if parsed < *min || parsed > *max {
                return Err(out_of_range());
            }
            Ok(parsed.to_string())
        }

        FieldKind::Decimal => {
            let value = raw.trim();
            if value.is_empty() && spec.required {
                return Err(required(spec));
            }
            Ok(value.to_string())
        }

        FieldKind::Choice { options } => {
            let value = raw.trim();
            if value.is_empty() {
                if spec.required {
                    return Err(required(spec));
                }
                return Ok(String::new());
            }
            options
                .iter()
                .find(|o| o.eq_ignore_ascii_case(value))
                .map(|o| o.to_string())
                .ok_or_else(|| {
                    FieldViolation::new(
                        spec,
                        format!("'{}' is not an accepted value", value),
                        Some(format!("Valid values: {}", options.join(", "))),
                    )
                })
        }

        FieldKind::Flag => Ok(parse_flag(raw).unwrap_or(false).to_string()),

        FieldKind::FreeText => Ok(raw.trim().to_string()),
    }
}

fn required(spec: &FieldSpec) -> FieldViolation {
    FieldViolation::new(spec, "is required".to_string(), None)
}

/// Interpret a checkbox value; `None` if it is not recognizable
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Some(true),
        "false" | "no" | "0" | "off" | "" => Some(false),
        _ => None,
    }
}

fn is_email(value: &str) -> bool {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| {
            Regex::new(r"^[A-Za-z0-9._%+'\-]+@[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?)*\.[A-Za-z]{2,}$").ok()
        })
        .as_ref()
        .map(|re| re.is_match(value))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> StepValidator {
        StepValidator::new(SchemaRegistry::new())
    }

    fn values(pairs: &[(FieldKey, &str)]) -> StepValues {
        pairs.iter().map(|(k, v)| (*k, v.to_string())).collect()
    }

    fn valid_registration() -> StepValues {
        values(&[
            (FieldKey::CompanyName, "Acme"),
            (FieldKey::RegistrationNumber, "RC-1234"),
            (FieldKey::Email, "ceo@acme.com"),
            (FieldKey::Password, "hunter2hunter2"),
        ])
    }

    fn valid_prediction() -> StepValues {
        let mut v = StepValues::new();
        for spec in SchemaRegistry::new().fields(StepId::PredictionData) {
            let value = match spec.kind {
                FieldKind::Integer { min, .. } => min.to_string(),
                FieldKind::Choice { options } => options[0].to_string(),
                _ => "1.5".to_string(),
            };
            v.insert(spec.key, value);
        }
        v
    }

    #[test]
    fn test_valid_registration() {
        let result = validator().validate(StepId::Registration, &valid_registration());
        let normalized = result.expect("registration should validate");
        assert_eq!(normalized.get(&FieldKey::CompanyName).unwrap(), "Acme");
        assert_eq!(normalized.len(), 4);
    }

    #[test]
    fn test_integer_bounds_accept_limits_and_reject_outside() {
        let registry = SchemaRegistry::new();
        for spec in registry.fields(StepId::PredictionData) {
            let FieldKind::Integer { min, max } = spec.kind else {
                continue;
            };
            for (value, ok) in [(min, true), (max, true), (min - 1, false), (max + 1, false)] {
                let mut input = valid_prediction();
                input.insert(spec.key, value.to_string());
                let result = validator().validate(StepId::PredictionData, &input);
                match (ok, result) {
                    (true, Ok(_)) => {}
                    (false, Err(e)) => {
                        let errors = e.field_errors();
                        assert_eq!(errors.len(), 1);
                        assert!(errors.contains_key(&spec.key));
                    }
                    (expected, other) => panic!(
                        "{} = {} expected ok={} got {:?}",
                        spec.key, value, expected, other
                    ),
                }
            }
        }
    }

    #[test]
    fn test_integer_rejects_non_numeric() {
        let mut input = valid_prediction();
        input.insert(FieldKey::FirmAge, "ten".to_string());
        let err = validator()
            .validate(StepId::PredictionData, &input)
            .unwrap_err();
        assert!(err.field_errors()[&FieldKey::FirmAge].contains("between 0 and 200"));
    }

    #[test]
    fn test_integer_normalized() {
        let mut input = valid_prediction();
        input.insert(FieldKey::FirmAge, " 007 ".to_string());
        let normalized = validator()
            .validate(StepId::PredictionData, &input)
            .unwrap();
        assert_eq!(normalized[&FieldKey::FirmAge], "7");
    }

    #[test]
    fn test_decimal_accepts_negative_and_rejects_empty() {
        let mut input = valid_prediction();
        input.insert(FieldKey::NetIncome, "-1250000.75".to_string());
        assert!(validator().validate(StepId::PredictionData, &input).is_ok());

        input.insert(FieldKey::NetIncome, "   ".to_string());
        let err = validator()
            .validate(StepId::PredictionData, &input)
            .unwrap_err();
        assert_eq!(err.field_errors()[&FieldKey::NetIncome], "is required");
    }

    #[test]
    fn test_choice_membership() {
        let mut input = valid_prediction();
        input.insert(FieldKey::Exchange, "LSE".to_string());
        let err = validator()
            .validate(StepId::PredictionData, &input)
            .unwrap_err();
        assert!(err.field_errors().contains_key(&FieldKey::Exchange));

        input.insert(FieldKey::Exchange, "nasdaq".to_string());
        let normalized = validator()
            .validate(StepId::PredictionData, &input)
            .unwrap();
        assert_eq!(normalized[&FieldKey::Exchange], "NASDAQ");
    }

    #[test]
    fn test_all_errors_reported_together() {
        let input = values(&[
            (FieldKey::CompanyName, ""),
            (FieldKey::RegistrationNumber, "X"),
            (FieldKey::Email, "not-an-email"),
            (FieldKey::Password, "short"),
        ]);
        let err = validator()
            .validate(StepId::Registration, &input)
            .unwrap_err();
        assert_eq!(err.violation_count(), 4);
        assert_eq!(err.step(), StepId::Registration);
    }

    #[test]
    fn test_missing_keys_treated_as_empty() {
        let err = validator()
            .validate(StepId::Registration, &StepValues::new())
            .unwrap_err();
        assert_eq!(err.violation_count(), 4);
    }

    #[test]
    fn test_each_required_field_empty_reports_only_that_field() {
        let registry = SchemaRegistry::new();
        for (step, base) in [
            (StepId::Registration, valid_registration()),
            (StepId::PredictionData, valid_prediction()),
        ] {
            for spec in registry.fields(step).iter().filter(|f| f.required) {
                let mut input = base.clone();
                input.insert(spec.key, String::new());
                let err = validator().validate(step, &input).unwrap_err();
                let errors = err.field_errors();
                assert_eq!(errors.len(), 1, "{} should be the only error", spec.key);
                assert!(errors.contains_key(&spec.key));
            }
        }
    }

    #[test]
    fn test_email_format() {
        assert!(is_email("a.b+c@example.co.uk"));
        assert!(!is_email("a@b"));
        assert!(!is_email("@example.com"));
        assert!(!is_email("a b@example.com"));
    }

    #[test]
    fn test_optional_step_never_fails() {
        let input = values(&[
            (FieldKey::AdditionalInfo, ""),
            (FieldKey::UploadPdf, "maybe"),
        ]);
        let normalized = validator()
            .validate(StepId::RiskAnalysis, &input)
            .unwrap();
        assert_eq!(normalized[&FieldKey::UploadPdf], "false");
        assert_eq!(normalized[&FieldKey::AdditionalInfo], "");
    }

    #[test]
    fn test_flag_parsing() {
        assert_eq!(parse_flag("Yes"), Some(true));
        assert_eq!(parse_flag("on"), Some(true));
        assert_eq!(parse_flag(""), Some(false));
        assert_eq!(parse_flag("perhaps"), None);
        assert_eq!(parse_flag("y"), None);
        assert_eq!(parse_flag("n"), None);
    }

    #[test]
    fn test_fields_outside_step_ignored() {
        let mut input = valid_registration();
        input.insert(FieldKey::FirmAge, "999".to_string());
        let normalized = validator()
            .validate(StepId::Registration, &input)
            .unwrap();
        assert!(!normalized.contains_key(&FieldKey::FirmAge));
    }
}
