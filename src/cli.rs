//! Command-line interface definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Collects SVG icons into sprites and generates the modules that describe
/// them.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Configuration file (default: iconsprite.toml, .yaml, .yml or .json in
    /// the working directory)
    #[arg(short = 'C', long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Output directory, overriding `out_dir` from the configuration
    #[arg(short, long, global = true, value_hint = clap::ValueHint::DirPath)]
    pub out: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Write every sprite and the generated modules once
    #[command(visible_alias = "b")]
    Build {
        /// Inline every symbol, use dev server sprite URLs and annotate
        /// sprites with their source files
        #[arg(long)]
        dev: bool,
    },

    /// Build in dev mode, then rebuild whenever icons change
    #[command(visible_alias = "w")]
    Watch,
}

impl Command {
    pub fn dev(&self) -> bool {
        match self {
            Self::Build { dev } => *dev,
            Self::Watch => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(&["iconsprite", "build"], Command::Build { dev: false }, None, None)]
    #[case(&["iconsprite", "b", "--dev", "--out", "dist"], Command::Build { dev: true }, None, Some("dist"))]
    #[case(&["iconsprite", "-C", "icons.yaml", "watch"], Command::Watch, Some("icons.yaml"), None)]
    #[case(&["iconsprite", "w", "-o", "gen"], Command::Watch, None, Some("gen"))]
    fn test_parse(
        #[case] args: &[&str],
        #[case] command: Command,
        #[case] config: Option<&str>,
        #[case] out: Option<&str>,
    ) {
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.command, command);
        assert_eq!(cli.config, config.map(PathBuf::from));
        assert_eq!(cli.out, out.map(PathBuf::from));
    }

    #[test]
    fn watch_is_always_dev() {
        assert!(Command::Watch.dev());
        assert!(!Command::Build { dev: false }.dev());
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
