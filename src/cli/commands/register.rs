//! `ipo-intake register` command - run the wizard and submit
//!
//! Answers come from interactive prompts or, for scripting, from a YAML or
//! JSON file keyed by field name. Either way they pass through the same
//! wizard controller, so validation and skip rules are identical.

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::cli::helpers::{load_config, open_store};
use crate::cli::output::print_view;
use crate::cli::GlobalOpts;
use crate::core::client::HttpPredictionClient;
use crate::core::identity::FieldKey;
use crate::core::orchestrator::{failure_reason, SubmissionOrchestrator, WriteStatus};
use crate::core::results::ResultViewModel;
use crate::core::wizard::{AccumulatedData, Transition, WizardController, WizardError};
use crate::schema::registry::SchemaRegistry;
use crate::schema::validator::StepValues;
use crate::schema::wizard::PromptWizard;

#[derive(clap::Args, Debug)]
pub struct RegisterArgs {
    /// Read answers from a YAML or JSON file instead of prompting
    #[arg(long, short = 'a')]
    pub answers: Option<PathBuf>,

    /// Skip validation of the final (risk analysis) step
    #[arg(long)]
    pub skip_final: bool,

    /// Prediction service base URL
    #[arg(long)]
    pub service_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

pub fn run(args: RegisterArgs, global: &GlobalOpts) -> Result<()> {
    let mut config = load_config(global);
    if let Some(url) = args.service_url {
        config.service_url = Some(url);
    }
    if let Some(secs) = args.timeout {
        if secs == 0 {
            return Err(miette::miette!("--timeout must be at least 1 second"));
        }
        config.timeout_secs = Some(secs);
    }

    let registry = SchemaRegistry::default();
    let mut controller = WizardController::new(registry);

    let data = match &args.answers {
        Some(path) => {
            let answers = load_answers(path)?;
            drive_batch(&mut controller, &registry, &answers, args.skip_final)?
        }
        None => {
            if !console::Term::stdout().is_term() {
                return Err(miette::miette!(
                    "No terminal available for prompts; pass --answers <file>"
                ));
            }
            match PromptWizard::new(registry).run(&mut controller)? {
                Some(data) => data,
                None => return Ok(()),
            }
        }
    };

    let store = Arc::new(open_store(&config)?);
    let client = HttpPredictionClient::new(config.service_url(), config.timeout()).into_diagnostic()?;
    let orchestrator = SubmissionOrchestrator::new(Box::new(client), store);

    if !global.quiet {
        eprintln!(
            "{} Submitting to {} (timeout {}s)",
            style("→").cyan(),
            config.service_url(),
            config.timeout().as_secs()
        );
    }

    let report = orchestrator.submit(&data);
    match &report.write {
        WriteStatus::Persisted => debug!(generation = report.generation, "outcome stored"),
        WriteStatus::Superseded { latest } => eprintln!(
            "{} A newer submission (#{}) replaced this one; results were not saved",
            style("!").yellow(),
            latest
        ),
        WriteStatus::Failed(reason) => eprintln!(
            "{} Results could not be saved: {}",
            style("!").yellow(),
            reason
        ),
    }
    if let Some(err) = failure_reason(&report.outcome) {
        if !global.quiet {
            eprintln!(
                "{} Prediction service unavailable ({}); showing offline results",
                style("!").yellow(),
                err
            );
        }
    }

    let view = ResultViewModel::from_record(Some(&report.outcome.to_record(report.generation)));
    print_view(&view, global.format, global.verbose)
}

/// Feed file answers through the controller, step by step
fn drive_batch(
    controller: &mut WizardController,
    registry: &SchemaRegistry,
    answers: &AccumulatedData,
    skip_final: bool,
) -> Result<AccumulatedData> {
    while let Some(step) = controller.current_step() {
        let input: StepValues = registry
            .fields(step)
            .iter()
            .filter_map(|f| answers.get(&f.key).map(|v| (f.key, v.clone())))
            .collect();

        let transition = if step.is_final() && skip_final {
            controller.skip(&input)
        } else {
            controller.next(&input)
        };

        match transition {
            Ok(Transition::Submit(data)) => return Ok(data),
            Ok(_) => {}
            Err(WizardError::Invalid(e)) => return Err(miette::Report::new(e)),
            Err(e) => return Err(miette::miette!("{}", e)),
        }
    }
    Err(miette::miette!("The wizard has already been submitted"))
}

/// Read an answers file keyed by wire field name
pub fn load_answers(path: &Path) -> Result<AccumulatedData> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| miette::miette!("Cannot read answers file {}: {}", path.display(), e))?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let raw: serde_json::Map<String, serde_json::Value> = if is_json {
        serde_json::from_str(&contents).into_diagnostic()?
    } else {
        serde_yml::from_str(&contents).into_diagnostic()?
    };

    let mut answers = AccumulatedData::new();
    for (name, value) in raw {
        let key: FieldKey = name
            .parse()
            .map_err(|e| miette::miette!("{} in {}", e, path.display()))?;
        let text = match value {
            serde_json::Value::Null => String::new(),
            serde_json::Value::String(s) => s,
            serde_json::Value::Bool(b) => b.to_string(),
            serde_json::Value::Number(n) => n.to_string(),
            other => {
                return Err(miette::miette!(
                    "Field '{}' must be a single value, found {}",
                    name,
                    other
                ))
            }
        };
        answers.insert(key, text);
    }
    Ok(answers)
}
