//! stepscript library
//!
//! Runs declarative scripts: an ordered list of steps, each either a shell
//! command chain or a file write, executed one after another with a tracked
//! working directory. The run stops at the first failure and reports what
//! completed before it.

pub mod cli;
pub mod command;
pub mod context;
pub mod error;
pub mod executor;
pub mod process_guard;
pub mod script;
pub mod spawner;
pub mod step;

// Re-export main types for convenience
pub use context::ExecutionContext;
pub use error::{Result, StepScriptError};
pub use executor::ExecutionReport;
pub use script::Script;
pub use spawner::{ProcessSpawner, SpawnRequest, SystemSpawner};
pub use step::{FileData, FileSpec, Step, StepAction, StepKind, StepResult};
