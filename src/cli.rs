use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use crate::engine::DEFAULT_THRESHOLD;

#[derive(Debug, Parser)]
#[command(
    name = "faqmatch",
    about = "Answer questions from a flat-file FAQ knowledge base"
)]
pub struct Cli {
    /// Directory containing the FAQ .txt files
    #[arg(long, global = true)]
    pub faq_dir: Option<PathBuf>,

    /// Override the XDG data directory (analytics database)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Increase log verbosity (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Answer a question from the knowledge base
    Ask(AskArgs),
    /// List knowledge base files and their Q&A counts
    List(ListArgs),
    /// Show interaction analytics
    Stats(StatsArgs),
    /// Start MCP server for AI agent integration
    Mcp(McpArgs),
    /// Generate shell completions
    #[command(hide = true)]
    Completions(CompletionsArgs),
}

// -- Ask --

#[derive(Debug, Parser)]
pub struct AskArgs {
    /// The question to answer
    pub query: String,

    /// Minimum relevance score required to accept a match
    #[arg(short = 't', long, default_value_t = DEFAULT_THRESHOLD)]
    pub threshold: f64,

    /// Output the full result as JSON
    #[arg(long)]
    pub json: bool,
}

// -- List --

#[derive(Debug, Parser)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// -- Stats --

#[derive(Debug, Parser)]
pub struct StatsArgs {
    /// Number of recent interactions to show
    #[arg(short = 'n', long, default_value = "5")]
    pub recent: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// -- Mcp --

#[derive(Debug, Parser)]
pub struct McpArgs {
    /// Minimum relevance score required to accept a match
    #[arg(short = 't', long, default_value_t = DEFAULT_THRESHOLD)]
    pub threshold: f64,
}

// -- Completions --

#[derive(Debug, Parser)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

impl CompletionsArgs {
    /// Generate shell completions and print to stdout.
    pub fn generate(&self) {
        let mut cmd = Cli::command();
        clap_complete::generate(self.shell, &mut cmd, "faqmatch", &mut std::io::stdout());
    }
}
