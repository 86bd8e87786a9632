//! stepscript - main entry point

use anyhow::Result;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use stepscript::cli::{self, Cli, Commands};
use stepscript::{process_guard, Script};

/// Initialize logging to stderr. RUST_LOG overrides the default level.
fn init_logger(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse_args();
    init_logger(cli.verbose);

    // Running foreground commands are torn down if we are interrupted
    if let Err(e) = process_guard::init_signal_handlers() {
        warn!("Failed to initialize signal handlers: {}", e);
    }
    debug!("Signal handlers initialized");

    match cli.command {
        Commands::Run { script, dir, json } => {
            let value = cli::load_script(&script)?;
            let script = match dir {
                Some(dir) => Script::in_dir(&value, dir)?,
                None => Script::new(&value)?,
            };
            info!(
                steps = script.steps().len(),
                dir = %script.context().original_dir().display(),
                "running script"
            );

            let report = script.execute();
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for entry in &report.results {
                    println!("[{} {}] {}", entry.step, entry.kind, entry.result);
                }
                if let Some(err) = &report.error {
                    eprintln!("✗ {}", err);
                }
            }

            if !report.is_success() {
                error!("Script stopped after {} result(s)", report.results.len());
                std::process::exit(1);
            }
        }
        Commands::Plan { script } => {
            let value = cli::load_script(&script)?;
            let script = Script::new(&value)?;
            if !script.description().is_empty() {
                println!("Description:");
                for line in script.description() {
                    println!("  {}", line);
                }
            }
            println!("Plan:");
            for (index, line) in script.plan().iter().enumerate() {
                println!("  {}. {}", index + 1, line);
            }
        }
        Commands::Validate { script } => {
            let value = cli::load_script(&script)?;
            match stepscript::script::validate(&value) {
                Ok(steps) => println!("✓ Script is valid ({} steps)", steps.len()),
                Err(e) => {
                    eprintln!("✗ {}", e);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
