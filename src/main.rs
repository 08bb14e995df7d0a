use clap::Parser;
use miette::Result;
use ipo_intake::cli::{Cli, Commands, GlobalOpts};
use tracing_subscriber::EnvFilter;

/// Environment variable holding a tracing filter directive
const LOG_ENV: &str = "IPO_INTAKE_LOG";

fn init_logging(global: &GlobalOpts) {
    let fallback = if global.verbose {
        "ipo_intake=debug"
    } else if global.quiet {
        "error"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));

    // Logs go to stderr so that stdout stays pipeable
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    // Without this, piping to `head`, `grep -q`, etc. causes a panic on broken pipe.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;
    init_logging(&global);

    match cli.command {
        Commands::Register(args) => ipo_intake::cli::commands::register::run(args, &global),
        Commands::Results(args) => ipo_intake::cli::commands::results::run(args, &global),
        Commands::Report(args) => ipo_intake::cli::commands::report::run(args, &global),
        Commands::Share(args) => ipo_intake::cli::commands::share::run(args, &global),
        Commands::Reset(args) => ipo_intake::cli::commands::reset::run(args, &global),
        Commands::Schema(cmd) => ipo_intake::cli::commands::schema::run(cmd, &global),
        Commands::Config(cmd) => ipo_intake::cli::commands::config::run(cmd, &global),
        Commands::Completions(args) => ipo_intake::cli::commands::completions::run(args),
    }
}
