//! CLI argument definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// lintbridge - run an ESLint-compatible engine over files and editor buffers
#[derive(Parser)]
#[command(name = "lintbridge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Engine executable (overrides the settings file)
    #[arg(short, long, global = true)]
    pub engine: Option<PathBuf>,

    /// Engine configuration file, passed as `--config`
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Settings file (default: .lintbridge.json in the current directory)
    #[arg(short, long, global = true)]
    pub settings: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Lint a file
    Lint {
        /// File to lint (with --stdin, the name the content is linted as)
        file: PathBuf,

        /// Syntax of the content (default: inferred from the extension)
        #[arg(long)]
        syntax: Option<String>,

        /// Read the content from stdin
        #[arg(long)]
        stdin: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Cancel the lint after this many seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
    },

    /// Apply the engine's fixes to a file on disk
    Fix {
        /// File to fix
        file: PathBuf,
    },

    /// Start the LSP server
    Lsp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
