use anyhow::Result;
use clap::Parser;
use minidbg::cli::{commands, Cli, Commands};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();
    let verbosity = cli.verbosity();

    // Initialize logging with verbosity-aware level
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::default()
                        .add_directive(verbosity.to_log_level().into())
                }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::InjectDemo(args) => {
            commands::inject_demo(args)?;
        }
        Commands::TraceDemo(args) => {
            commands::trace_demo(args)?;
        }
        Commands::Disasm(args) => {
            commands::disasm(args)?;
        }
    }

    Ok(())
}
