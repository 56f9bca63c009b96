//! Command-line interface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::platform::Platform;

#[derive(Parser, Debug)]
#[command(
    name = "promptlab",
    about = "Check, score, and optimize prompts for AI chat platforms",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open the interactive workbench (default)
    Tui,
    /// Check a prompt for words likely to trigger a refusal
    Check(PromptArgs),
    /// Score a prompt's quality
    Score(PromptArgs),
    /// Estimate tokens and cost
    Tokens {
        #[command(flatten)]
        prompt: PromptArgs,
        /// Requests per day for the monthly projection
        #[arg(long, short = 'r')]
        requests_per_day: Option<u32>,
    },
    /// Ask the backend to analyze a prompt
    Analyze(PromptArgs),
    /// Ask the backend to optimize a prompt
    Optimize(PromptArgs),
    /// List prompt templates
    Templates {
        /// Only show this platform's templates
        #[arg(long, short, value_enum)]
        platform: Option<Platform>,
    },
    /// Show the effective configuration and any problems with it
    Config,
}

#[derive(Args, Debug, Clone)]
pub struct PromptArgs {
    /// File containing the prompt (reads stdin if omitted)
    pub file: Option<PathBuf>,
    /// Prompt text, instead of a file or stdin
    #[arg(long, short, conflicts_with = "file")]
    pub text: Option<String>,
    /// Target platform (defaults to the configured one)
    #[arg(long, short, value_enum)]
    pub platform: Option<Platform>,
}
