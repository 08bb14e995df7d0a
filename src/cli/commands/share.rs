//! `ipo-intake share` command - three-line summary of the latest results
//!
//! The terminal has no share sheet or clipboard, so the summary is printed
//! (or written to a file) for the user to paste wherever they like.

use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

use crate::cli::helpers::{load_config, open_store, write_output};
use crate::cli::GlobalOpts;
use crate::core::report::share_summary;
use crate::core::results::ResultViewModel;
use crate::schema::template::TemplateGenerator;

#[derive(clap::Args, Debug)]
pub struct ShareArgs {
    /// Link for the third line (default: configured results_url)
    #[arg(long)]
    pub url: Option<String>,

    /// Write the summary to a file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

pub fn run(args: ShareArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);
    let store = open_store(&config)?;
    let view = ResultViewModel::load(&store);
    let generator = TemplateGenerator::new().into_diagnostic()?;

    let url = args.url.as_deref().unwrap_or(config.results_url());
    let text = share_summary(&generator, &view, url).into_diagnostic()?;
    write_output(&text, args.output.as_deref(), global.quiet)
}
