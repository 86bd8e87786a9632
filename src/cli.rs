use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::io::Read;
use std::path::{Path, PathBuf};

/// stepscript - run JSON scripts of shell commands and file writes
#[derive(Parser)]
#[command(name = "stepscript")]
#[command(about = "Run a JSON script of shell commands and file writes, step by step")]
#[command(version)]
pub struct Cli {
    /// Log engine activity (info level) to stderr. RUST_LOG overrides this.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Execute a script
    Run {
        /// Path to the JSON script, or `-` for stdin
        script: PathBuf,
        /// Directory to run in (defaults to the current directory)
        #[arg(short, long)]
        dir: Option<PathBuf>,
        /// Print the execution report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the description and plan of a script without running it
    Plan {
        /// Path to the JSON script, or `-` for stdin
        script: PathBuf,
    },
    /// Validate a script
    Validate {
        /// Path to the JSON script, or `-` for stdin
        script: PathBuf,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        <Self as clap::Parser>::parse()
    }
}

/// Load a script file (or stdin for `-`) as JSON.
pub fn load_script(path: &Path) -> Result<Value> {
    let content = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read script from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read script from {:?}", path))?
    };

    serde_json::from_str(&content).context("Failed to parse script JSON")
}
