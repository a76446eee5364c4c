//! Command-line surface: argument parsing and verbosity plumbing.

pub mod commands;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::filter::LevelFilter;

#[derive(Debug, Parser)]
#[command(
    name = "minidbg",
    version,
    about = "Bytecode injection and trace-driven debugging for a miniature stack VM"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Silence all logs except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::Trace,
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    Trace,
}

impl Verbosity {
    pub fn to_log_level(self) -> LevelFilter {
        match self {
            Verbosity::Quiet => LevelFilter::ERROR,
            Verbosity::Normal => LevelFilter::WARN,
            Verbosity::Verbose => LevelFilter::INFO,
            Verbosity::Trace => LevelFilter::DEBUG,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run foo(42), splice a stack-printing hook into it, run it again
    InjectDemo(InjectDemoArgs),
    /// Install the interactive trace callback and run the sample driver
    TraceDemo(TraceDemoArgs),
    /// Print a sample unit's instruction listing
    Disasm(DisasmArgs),
}

#[derive(Debug, Args)]
pub struct InjectDemoArgs {
    /// Source line of foo to instrument
    #[arg(long, default_value_t = 2)]
    pub line: u32,
}

#[derive(Debug, Args)]
pub struct TraceDemoArgs {}

#[derive(Debug, Args)]
pub struct DisasmArgs {
    /// Which sample unit to disassemble (foo, main)
    #[arg(long)]
    pub sample: String,

    /// Emit the listing as JSON
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn verbosity_flags_map_to_levels() {
        let cli = Cli::parse_from(["minidbg", "-vv", "trace-demo"]);
        assert_eq!(cli.verbosity(), Verbosity::Trace);
        assert_eq!(cli.verbosity().to_log_level(), LevelFilter::DEBUG);

        let cli = Cli::parse_from(["minidbg", "-q", "trace-demo"]);
        assert_eq!(cli.verbosity(), Verbosity::Quiet);
    }
}
