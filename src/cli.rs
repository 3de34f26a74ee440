use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "webaudit")]
#[command(about = "Static risk and quality analyzer for JavaScript and TypeScript projects", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze a project directory or a single file
    Analyze {
        /// Path to analyze
        path: PathBuf,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Configuration file (defaults to the nearest .webaudit.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Pretty-print the JSON report
        #[arg(long)]
        pretty: bool,

        /// Increase log verbosity (-v: info, -vv: debug)
        #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
        verbosity: u8,
    },

    /// Write a .webaudit.toml with every default value
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_analyze_flags() {
        let cli = Cli::try_parse_from(["webaudit", "analyze", "src", "--pretty", "-vv", "-o", "out.json"]).unwrap();
        match cli.command {
            Commands::Analyze {
                path,
                output,
                config,
                pretty,
                verbosity,
            } => {
                assert_eq!(path, PathBuf::from("src"));
                assert_eq!(output, Some(PathBuf::from("out.json")));
                assert!(config.is_none());
                assert!(pretty);
                assert_eq!(verbosity, 2);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_path_is_required() {
        assert!(Cli::try_parse_from(["webaudit", "analyze"]).is_err());
    }
}
