//! `ipo-intake reset` command - forget the latest outcome

use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm};
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{load_config, open_store};
use crate::cli::GlobalOpts;
use crate::core::store::OutcomeStore;

#[derive(clap::Args, Debug)]
pub struct ResetArgs {
    /// Do not ask for confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,
}

pub fn run(args: ResetArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);
    let store = open_store(&config)?;

    if !args.yes && console::Term::stdout().is_term() {
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("Delete the stored submission outcome?")
            .default(false)
            .interact()
            .into_diagnostic()?;
        if !confirmed {
            return Ok(());
        }
    }

    store.clear().into_diagnostic()?;
    if !global.quiet {
        println!(
            "{} Cleared {}",
            style("✓").green(),
            style(store.path().display()).cyan()
        );
    }
    Ok(())
}
