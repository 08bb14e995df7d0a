//! Report export and share summary
//!
//! Both documents are rendered from a `ResultViewModel` through the embedded
//! Tera templates. Neither ever contains the password.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::core::results::{Reading, ResultViewModel};
use crate::schema::template::{TemplateError, TemplateGenerator, REPORT_TEMPLATE, SHARE_TEMPLATE};

/// Company name used in file names when none was submitted
pub const FILENAME_FALLBACK: &str = "Company";

/// Errors raised while exporting a report or share summary
#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("Failed to write report to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Serialize)]
struct DataLine {
    key: &'static str,
    value: String,
}

/// `<company>_IPO_Report_<YYYY-MM-DD>.txt`
pub fn report_filename(view: &ResultViewModel, date: NaiveDate) -> String {
    let company = view
        .submission
        .as_ref()
        .map(|s| s.company_name.trim())
        .filter(|n| !n.is_empty())
        .unwrap_or(FILENAME_FALLBACK);
    format!(
        "{}_IPO_Report_{}.txt",
        sanitize_filename(company),
        date.format("%Y-%m-%d")
    )
}

fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// `$12.5` for a price, the placeholder text otherwise
pub fn price_text(reading: &Reading<f64>) -> String {
    match reading {
        Reading::Value(_) => format!("${}", reading),
        Reading::Placeholder(text) => text.clone(),
    }
}

fn share_risk_text(view: &ResultViewModel) -> String {
    match &view.risk_score {
        Reading::Value(v) => format!("{}%", v),
        Reading::Placeholder(text) => text.clone(),
    }
}

/// Render the plain-text report
pub fn render_report(
    generator: &TemplateGenerator,
    view: &ResultViewModel,
    generated: NaiveDate,
) -> Result<String, ExportError> {
    let company_data: Vec<DataLine> = view
        .submission
        .as_ref()
        .map(|s| {
            s.public_fields()
                .into_iter()
                .map(|(key, value)| DataLine {
                    key: key.as_str(),
                    value,
                })
                .collect()
        })
        .unwrap_or_default();

    let mut context = tera::Context::new();
    context.insert("company", &view.company_name);
    context.insert("generated", &generated.format("%Y-%m-%d").to_string());
    context.insert("offer_price", &price_text(&view.offer_price));
    context.insert("day1_close", &price_text(&view.day1_close));
    context.insert("risk_level", &view.risk_text());
    context.insert("risk_factors", &view.risk_factors);
    context.insert("recommendations", &view.recommendations);
    context.insert("company_data", &company_data);
    context.insert("year", &generated.year());

    let rendered = generator.render(REPORT_TEMPLATE, &context)?;
    Ok(format!("{}\n", rendered.trim()))
}

/// Render the three-line share summary: title, results line, link
pub fn share_summary(
    generator: &TemplateGenerator,
    view: &ResultViewModel,
    url: &str,
) -> Result<String, ExportError> {
    let mut context = tera::Context::new();
    context.insert("company", &view.company_name);
    context.insert("offer_price", &price_text(&view.offer_price));
    context.insert("day1_close", &price_text(&view.day1_close));
    context.insert("risk_level", &share_risk_text(view));
    context.insert("url", url);

    let rendered = generator.render(SHARE_TEMPLATE, &context)?;
    Ok(format!("{}\n", rendered.trim()))
}

/// Write the report into `dest`. A directory receives the standard file name.
pub fn export_report(
    generator: &TemplateGenerator,
    view: &ResultViewModel,
    dest: &Path,
    generated: NaiveDate,
) -> Result<PathBuf, ExportError> {
    let content = render_report(generator, view, generated)?;
    let path = if dest.is_dir() {
        dest.join(report_filename(view, generated))
    } else {
        dest.to_path_buf()
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|source| ExportError::Io {
                path: path.clone(),
                source,
            })?;
        }
    }
    std::fs::write(&path, content).map_err(|source| ExportError::Io {
        path: path.clone(),
        source,
    })?;

    info!(path = %path.display(), "report exported");
    Ok(path)
}
