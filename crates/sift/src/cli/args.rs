//! Clap argument definitions for the `sift` CLI.

use clap::{ArgAction, Args, Parser, Subcommand};

/// Parses a parser stack depth, which must be at least 1.
fn parse_depth(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err(String::from("depth must be at least 1")),
        Ok(depth) => Ok(depth),
        Err(e) => Err(e.to_string()),
    }
}

/// Top-level CLI options.
#[derive(Parser)]
#[command(name = "sift")]
#[command(about = "Parse and inspect sift search queries")]
#[command(version)]
pub struct Cli {
    /// Log verbosity (-v for debug, -vv for trace)
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Arguments for `sift parse`.
#[derive(Args, Debug, Clone)]
pub struct ParseCommand {
    /// Query to parse
    #[arg(allow_hyphen_values = true)]
    pub query: String,

    /// Fail on field names missing from the configured fields
    #[arg(long)]
    pub strict: bool,

    /// Maximum parser stack depth [default: 100]
    #[arg(long, value_parser = parse_depth)]
    pub max_depth: Option<usize>,

    /// Ignore the configured fields; field modifiers leave masks untouched
    #[arg(long)]
    pub no_schema: bool,

    /// Print the query in canonical syntax instead of as a tree
    #[arg(long)]
    pub canonical: bool,
}

/// Arguments for `sift tokens`.
#[derive(Args, Debug, Clone)]
pub struct TokensCommand {
    /// Query to tokenize
    #[arg(allow_hyphen_values = true)]
    pub query: String,
}

/// Arguments for `sift init`.
#[derive(Args, Debug, Clone)]
pub struct InitCommand {
    /// Create global ~/.sift.toml instead
    #[arg(long)]
    pub global: bool,

    /// Overwrite existing configuration file
    #[arg(long)]
    pub force: bool,
}

/// Supported `sift` subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Parse a query and print its tree
    Parse(ParseCommand),

    /// Print the tokens of a query
    Tokens(TokensCommand),

    /// Initialize sift configuration in current directory
    Init(InitCommand),

    /// Validate configuration and diagnose issues
    Check,

    /// Show effective configuration
    Config,
}

impl Commands {
    /// Subcommand name, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Parse(_) => "parse",
            Self::Tokens(_) => "tokens",
            Self::Init(_) => "init",
            Self::Check => "check",
            Self::Config => "config",
        }
    }

    /// Whether the command reads the merged configuration before running.
    ///
    /// `init` must work when an existing file is broken, `tokens` never looks at it, and
    /// `check` loads it itself so it can report load failures.
    pub fn needs_config(&self) -> bool {
        matches!(self, Self::Parse(_) | Self::Config)
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_accepts_leading_hyphen_query() {
        let cli = Cli::try_parse_from(["sift", "parse", "-deprecated", "--strict"]).unwrap();
        match cli.command {
            Commands::Parse(cmd) => {
                assert_eq!(cmd.query, "-deprecated");
                assert!(cmd.strict);
            }
            _ => panic!("expected parse command"),
        }
    }

    #[test]
    fn max_depth_must_be_positive() {
        assert!(Cli::try_parse_from(["sift", "parse", "a", "--max-depth", "0"]).is_err());
        let cli = Cli::try_parse_from(["sift", "parse", "a", "--max-depth", "7"]).unwrap();
        match cli.command {
            Commands::Parse(cmd) => assert_eq!(cmd.max_depth, Some(7)),
            _ => panic!("expected parse command"),
        }
    }

    #[test]
    fn verbosity_counts() {
        let cli = Cli::try_parse_from(["sift", "-vv", "check"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.command.name(), "check");
        assert!(!cli.command.needs_config());
    }

    #[test]
    fn max_depth_help_mentions_default() {
        let cmd = Cli::command();
        let help = cmd
            .get_subcommands()
            .find(|c| c.get_name() == "parse")
            .and_then(|c| c.get_arguments().find(|a| a.get_id() == "max_depth"))
            .and_then(|a| a.get_help().map(|h| h.to_string()))
            .unwrap_or_default();
        assert!(
            help.contains(&format!("[default: {}]", sift_query::DEFAULT_MAX_DEPTH)),
            "parse --max-depth help should contain the default: {help}"
        );
    }
}
