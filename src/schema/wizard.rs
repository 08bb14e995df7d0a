//! Interactive terminal driver for the intake wizard
//!
//! Prompts for one step at a time and feeds the answers to a
//! `WizardController`. All gating (validation, skip, back) is left to the
//! controller; this module only collects input and shows its verdicts.

use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Password, Select};
use miette::{IntoDiagnostic, Result};
use std::collections::BTreeMap;

use crate::core::identity::{FieldKey, StepId};
use crate::core::wizard::{AccumulatedData, Transition, WizardController, WizardError};
use crate::schema::registry::{FieldKind, FieldSpec, SchemaRegistry};
use crate::schema::validator::{parse_flag, StepValidationError, StepValues};

/// What the user chose to do after filling a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepAction {
    Next,
    Back,
    Skip,
    Cancel,
}

impl StepAction {
    fn label(&self, step: StepId) -> &'static str {
        match self {
            StepAction::Next if step.is_final() => "Submit",
            StepAction::Next => "Next",
            StepAction::Back => "Back",
            StepAction::Skip => "Skip and submit",
            StepAction::Cancel => "Cancel",
        }
    }
}

/// Actions offered for the controller's current state
pub fn available_actions(controller: &WizardController) -> Vec<StepAction> {
    let mut actions = vec![StepAction::Next];
    if controller.can_go_back() {
        actions.push(StepAction::Back);
    }
    if controller.can_skip() {
        actions.push(StepAction::Skip);
    }
    actions.push(StepAction::Cancel);
    actions
}

/// Terminal wizard over dialoguer prompts
pub struct PromptWizard {
    registry: SchemaRegistry,
    theme: ColorfulTheme,
}

impl PromptWizard {
    pub fn new(registry: SchemaRegistry) -> Self {
        Self {
            registry,
            theme: ColorfulTheme::default(),
        }
    }

    /// Drive the controller until the answers are handed off.
    ///
    /// Returns `None` if the user cancels.
    pub fn run(&self, controller: &mut WizardController) -> Result<Option<AccumulatedData>> {
        // Raw input of a step that failed validation, shown again on retry
        let mut pending: Option<StepValues> = None;
        let mut errors: BTreeMap<FieldKey, String> = BTreeMap::new();

        while let Some(step) = controller.current_step() {
            self.print_header(step);

            let prefill = pending.take().unwrap_or_else(|| controller.prefill());
            let input = self.prompt_step(step, &prefill, &errors)?;
            errors.clear();

            let action = self.choose_action(controller, step)?;
            let transition = match action {
                StepAction::Next => controller.next(&input),
                StepAction::Back => controller.back(&input),
                StepAction::Skip => controller.skip(&input),
                StepAction::Cancel => {
                    println!("{} Registration cancelled", style("!").yellow());
                    return Ok(None);
                }
            };

            match transition {
                Ok(Transition::Submit(data)) => return Ok(Some(data)),
                Ok(Transition::Moved(_)) | Ok(Transition::Stayed(_)) => {}
                Err(WizardError::Invalid(e)) => {
                    self.print_violations(&e);
                    errors = e.field_errors();
                    pending = Some(input);
                }
                Err(e) => return Err(miette::miette!("{}", e)),
            }
        }

        Ok(None)
    }

    fn print_header(&self, step: StepId) {
        let def = self.registry.step(step);
        println!();
        println!(
            "{} Step {} of {}: {}",
            style("◆").cyan(),
            step.index() + 1,
            StepId::all().len(),
            style(def.title).bold()
        );
        println!("  {}", style(def.description).dim());
        println!("{}", style("─".repeat(50)).dim());
    }

    fn print_violations(&self, err: &StepValidationError) {
        println!();
        println!(
            "{} {} field(s) need attention:",
            style("✗").red(),
            err.violation_count()
        );
        for v in err.violations() {
            println!("  {} {}", style(v.label).cyan(), style(&v.message).red());
        }
    }

    fn prompt_step(
        &self,
        step: StepId,
        prefill: &StepValues,
        errors: &BTreeMap<FieldKey, String>,
    ) -> Result<StepValues> {
        let mut values = StepValues::new();
        for spec in self.registry.fields(step) {
            let current = prefill.get(&spec.key).map(String::as_str);
            let error = errors.get(&spec.key).map(String::as_str);
            let value = self.prompt_field(spec, current, error)?;
            values.insert(spec.key, value);
        }
        Ok(values)
    }

    /// Prompt for one field. Values are returned raw; the controller validates.
    fn prompt_field(&self, spec: &FieldSpec, current: Option<&str>, error: Option<&str>) -> Result<String> {
        let prompt = format_prompt(spec, error);

        match spec.kind {
            FieldKind::Text { secret: true, .. } => {
                let prompt = if current.is_some_and(|c| !c.is_empty()) {
                    format!("{} {}", prompt, style("(leave empty to keep)").dim())
                } else {
                    prompt
                };
                let value = Password::with_theme(&self.theme)
                    .with_prompt(prompt)
                    .allow_empty_password(true)
                    .interact()
                    .into_diagnostic()?;
                match current {
                    Some(c) if value.is_empty() => Ok(c.to_string()),
                    _ => Ok(value),
                }
            }

            FieldKind::Choice { options } => {
                let default_idx = current
                    .and_then(|c| options.iter().position(|o| o.eq_ignore_ascii_case(c)))
                    .unwrap_or(0);
                let selection = Select::with_theme(&self.theme)
                    .with_prompt(prompt)
                    .items(options)
                    .default(default_idx)
                    .interact()
                    .into_diagnostic()?;
                Ok(options[selection].to_string())
            }

            FieldKind::Flag => {
                let default = current.and_then(parse_flag).unwrap_or(false);
                let value = Confirm::with_theme(&self.theme)
                    .with_prompt(prompt)
                    .default(default)
                    .interact()
                    .into_diagnostic()?;
                Ok(value.to_string())
            }

            FieldKind::Text { .. } | FieldKind::Integer { .. } | FieldKind::Decimal | FieldKind::FreeText => {
                let mut input = Input::<String>::with_theme(&self.theme)
                    .with_prompt(prompt)
                    .allow_empty(true);
                if let Some(c) = current.filter(|c| !c.is_empty()) {
                    input = input.default(c.to_string());
                }
                input.interact_text().into_diagnostic()
            }
        }
    }

    fn choose_action(&self, controller: &WizardController, step: StepId) -> Result<StepAction> {
        let actions = available_actions(controller);
        let labels: Vec<&str> = actions.iter().map(|a| a.label(step)).collect();
        let selection = Select::with_theme(&self.theme)
            .with_prompt("Continue")
            .items(&labels)
            .default(0)
            .interact()
            .into_diagnostic()?;
        Ok(actions[selection])
    }
}

impl Default for PromptWizard {
    fn default() -> Self {
        Self::new(SchemaRegistry::default())
    }
}

/// Label plus constraint hint, and the last error if any
fn format_prompt(spec: &FieldSpec, error: Option<&str>) -> String {
    let mut prompt = spec.label.to_string();
    if !spec.required {
        prompt.push_str(" (optional)");
    }
    let summary = spec.constraint_summary();
    if !summary.is_empty() {
        prompt = format!("{} {}", prompt, style(format!("[{}]", summary)).dim());
    }
    if let Some(err) = error {
        prompt = format!("{} {}", prompt, style(err).red());
    }
    prompt
}
