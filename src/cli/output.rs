//! Rendering of result views for the terminal and for machines

use console::style;
use miette::{IntoDiagnostic, Result};
use tabled::{builder::Builder, settings::Style};

use crate::cli::OutputFormat;
use crate::core::report::price_text;
use crate::core::results::{ResultStatus, ResultViewModel};

/// Print a result view in the requested format
pub fn print_view(view: &ResultViewModel, format: OutputFormat, verbose: bool) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(view).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(view).into_diagnostic()?);
        }
        OutputFormat::Auto | OutputFormat::Text => print!("{}", render_text(view, verbose)),
    }
    Ok(())
}

/// Human-readable rendering of a view
pub fn render_text(view: &ResultViewModel, verbose: bool) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "{} {} {}\n",
        style("◆").cyan(),
        style("IPO Prediction Results").bold(),
        style(format!("({})", view.company_name)).dim()
    ));
    let connection = if view.connected {
        style("connected").green()
    } else {
        style("offline").yellow()
    };
    out.push_str(&format!("  Status: {} / {}\n", view.status, connection));
    if let Some(at) = view.submitted_at {
        out.push_str(&format!(
            "  Submitted: {}\n",
            at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
    }
    out.push('\n');

    let mut builder = Builder::default();
    builder.push_record(["Prediction", "Value"]);
    builder.push_record(["Offer Price".to_string(), price_text(&view.offer_price)]);
    builder.push_record(["Day 1 Close".to_string(), price_text(&view.day1_close)]);
    builder.push_record(["Risk Level".to_string(), view.risk_text()]);
    out.push_str(&builder.build().with(Style::rounded()).to_string());
    out.push_str("\n\n");

    push_list(&mut out, "Risk Factors", &view.risk_factors);
    push_list(&mut out, "Recommendations", &view.recommendations);

    if view.status == ResultStatus::Offline {
        if let Some(err) = &view.error {
            out.push_str(&format!("{} {}\n", style("Last error:").red(), err));
        }
    }

    if verbose {
        if let Some(diag) = &view.diagnostics {
            out.push_str(&format!("{}\n", style("Service diagnostics").bold()));
            let p = &diag.prediction;
            push_field(&mut out, "prediction id", p.id.as_deref());
            push_field(&mut out, "prediction status", p.prediction_status.as_deref());
            push_field(&mut out, "model", p.model_used.as_deref());
            push_field(&mut out, "industry", p.industry.as_deref());
            push_field(&mut out, "exchange", p.exchange.as_deref());
            if let Some(user) = &diag.user {
                push_field(&mut out, "user id", user.id.as_deref());
            }
            if let Some(risk) = &diag.risk_analysis {
                push_field(&mut out, "risk analysis id", risk.id.as_deref());
                push_field(&mut out, "analysis status", risk.analysis_status.as_deref());
                push_field(&mut out, "additional info", risk.additional_info.as_deref());
            }
            if !diag.prediction_history.is_empty() {
                out.push_str(&format!(
                    "  {:<18} {} entries\n",
                    "history",
                    diag.prediction_history.len()
                ));
            }
        }
    }

    out
}

fn push_list(out: &mut String, title: &str, items: &[String]) {
    out.push_str(&format!("{}\n", style(title).bold()));
    for (i, item) in items.iter().enumerate() {
        out.push_str(&format!("  {}. {}\n", i + 1, item));
    }
    out.push('\n');
}

fn push_field(out: &mut String, name: &str, value: Option<&str>) {
    if let Some(v) = value {
        out.push_str(&format!("  {:<18} {}\n", name, v));
    }
}
