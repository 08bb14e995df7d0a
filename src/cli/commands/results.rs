//! `ipo-intake results` command - show the latest outcome

use miette::Result;

use crate::cli::helpers::{load_config, open_store};
use crate::cli::output::print_view;
use crate::cli::GlobalOpts;
use crate::core::results::ResultViewModel;

#[derive(clap::Args, Debug)]
pub struct ResultsArgs {
    /// Include service identifiers and statuses
    #[arg(long)]
    pub diagnostics: bool,
}

pub fn run(args: ResultsArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);
    let store = open_store(&config)?;
    let view = ResultViewModel::load(&store);
    print_view(&view, global.format, args.diagnostics || global.verbose)
}
