//! Schema introspection
//!
//! Lists the wizard steps and the fields each one collects, with the rules
//! applied to them. Useful when preparing an answers file for `register`.

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::truncate_str;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::identity::StepId;
use crate::schema::registry::SchemaRegistry;

#[derive(Subcommand, Debug)]
pub enum SchemaCommands {
    /// List all wizard steps
    List,

    /// Show the fields of one step
    Show(ShowArgs),
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Step name or number (registration, prediction-data, risk-analysis, 1-3)
    pub step: String,
}

pub fn run(cmd: SchemaCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        SchemaCommands::List => list_steps(global),
        SchemaCommands::Show(args) => show_step(args, global),
    }
}

fn list_steps(global: &GlobalOpts) -> Result<()> {
    let registry = SchemaRegistry::default();

    match global.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(registry.steps()).into_diagnostic()?
            );
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(registry.steps()).into_diagnostic()?);
        }
        OutputFormat::Auto | OutputFormat::Text => {
            let mut builder = Builder::default();
            builder.push_record(["#", "STEP", "TITLE", "FIELDS", "DESCRIPTION"]);
            for def in registry.steps() {
                builder.push_record([
                    (def.id.index() + 1).to_string(),
                    def.id.as_str().to_string(),
                    def.title.to_string(),
                    def.fields.len().to_string(),
                    def.description.to_string(),
                ]);
            }
            println!("{}", builder.build().with(Style::sharp()));
            if !global.quiet {
                println!(
                    "\n{}",
                    style("Use 'ipo-intake schema show <step>' for field details").dim()
                );
            }
        }
    }
    Ok(())
}

fn show_step(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let step: StepId = args.step.parse().map_err(|e| {
        let names: Vec<&str> = StepId::all().iter().map(|s| s.as_str()).collect();
        miette::miette!("{} (expected one of: {})", e, names.join(", "))
    })?;
    let registry = SchemaRegistry::default();
    let def = registry.step(step);

    match global.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(def).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(def).into_diagnostic()?);
        }
        OutputFormat::Auto | OutputFormat::Text => {
            println!("{}", style(def.title).bold());
            println!("{}", def.description);
            println!();

            let mut builder = Builder::default();
            builder.push_record(["KEY", "LABEL", "REQ", "ACCEPTS"]);
            for field in def.fields {
                builder.push_record([
                    field.key.as_str().to_string(),
                    field.label.to_string(),
                    if field.required { "yes" } else { "" }.to_string(),
                    truncate_str(&field.constraint_summary(), 60),
                ]);
            }
            println!("{}", builder.build().with(Style::sharp()));
        }
    }
    Ok(())
}
