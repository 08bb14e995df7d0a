//! `ipo-intake report` command - export the plain-text report

use chrono::Local;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

use crate::cli::helpers::{display_path, load_config, open_store, write_output};
use crate::cli::GlobalOpts;
use crate::core::report::{export_report, render_report};
use crate::core::results::ResultViewModel;
use crate::schema::template::TemplateGenerator;

#[derive(clap::Args, Debug)]
pub struct ReportArgs {
    /// Destination file or directory (default: configured report_dir)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Print the report instead of writing a file
    #[arg(long, conflicts_with = "output")]
    pub stdout: bool,
}

pub fn run(args: ReportArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);
    let store = open_store(&config)?;
    let view = ResultViewModel::load(&store);
    let generator = TemplateGenerator::new().into_diagnostic()?;
    let today = Local::now().date_naive();

    if args.stdout {
        let content = render_report(&generator, &view, today).into_diagnostic()?;
        return write_output(&content, None, global.quiet);
    }

    let dest = args.output.unwrap_or_else(|| config.report_dir());
    let path = export_report(&generator, &view, &dest, today).into_diagnostic()?;

    if global.quiet {
        println!("{}", path.display());
    } else {
        println!(
            "{} Report written to {}",
            style("✓").green(),
            style(display_path(&path).display()).cyan()
        );
    }
    Ok(())
}
