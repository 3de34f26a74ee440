use anyhow::Result;
use clap::Parser;
use webaudit::cli::{Cli, Commands};
use webaudit::commands::{handle_analyze, init_config, AnalyzeConfig};
use webaudit::observability::{init_logging, install_panic_hook};

fn main() -> Result<()> {
    let cli = Cli::parse();
    install_panic_hook();

    match cli.command {
        Commands::Analyze {
            path,
            output,
            config,
            pretty,
            verbosity,
        } => {
            init_logging(verbosity);
            handle_analyze(AnalyzeConfig {
                path,
                output,
                config,
                pretty,
            })
        }
        Commands::Init { force } => {
            init_logging(0);
            init_config(force)
        }
    }
}
