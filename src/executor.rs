//! Step dispatcher.
//!
//! Steps run strictly in order. The first failure is recorded and nothing
//! after it runs; results gathered so far are kept in the report.

use crate::command::CommandRunner;
use crate::context::ExecutionContext;
use crate::error::{Result, StepScriptError};
use crate::spawner::ProcessSpawner;
use crate::step::{FileSpec, Step, StepAction, StepResult};
use serde::{Serialize, Serializer};
use std::fs;
use tracing::{debug, error, info};

/// Outcome of one script run.
#[derive(Debug, Serialize)]
pub struct ExecutionReport {
    pub results: Vec<StepResult>,
    /// The failure that stopped the run, if any.
    #[serde(serialize_with = "serialize_error")]
    pub error: Option<StepScriptError>,
}

impl ExecutionReport {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

fn serialize_error<S: Serializer>(
    error: &Option<StepScriptError>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match error {
        Some(err) => serializer.serialize_some(&err.to_string()),
        None => serializer.serialize_none(),
    }
}

/// Dispatch every step against `context`, stopping at the first failure.
pub fn execute_steps<S: ProcessSpawner>(
    steps: &[Step],
    context: &mut ExecutionContext,
    spawner: &S,
) -> ExecutionReport {
    let mut results = Vec::new();

    for (index, step) in steps.iter().enumerate() {
        let number = index + 1;
        let outcome = match &step.action {
            StepAction::Command(raw) => {
                debug!(step = number, cmd = %raw, "dispatching command step");
                CommandRunner::new(spawner, context)
                    .run_chain(raw)
                    .map(|lines| (!lines.is_empty()).then(|| lines.join("\n")))
            }
            StepAction::File(spec) => {
                debug!(step = number, name = %spec.name, "dispatching file step");
                write_file(context, spec).map(Some)
            }
            StepAction::Empty => Ok(None),
        };

        match outcome {
            Ok(Some(result)) => {
                if let Some(kind) = step.kind() {
                    results.push(StepResult {
                        step: number,
                        kind,
                        result,
                    });
                }
            }
            Ok(None) => {}
            Err(err) => {
                error!(step = number, error = %err, "step failed, stopping script");
                return ExecutionReport {
                    results,
                    error: Some(err),
                };
            }
        }
    }

    info!(results = results.len(), "script completed");
    ExecutionReport {
        results,
        error: None,
    }
}

/// Write a file step, resolved against the original directory.
fn write_file(context: &ExecutionContext, spec: &FileSpec) -> Result<String> {
    let path = context.resolve_file(&spec.name);
    fs::write(&path, spec.data.as_bytes()).map_err(|source| StepScriptError::FileWrite {
        path: path.clone(),
        source,
    })?;
    info!(path = %path.display(), bytes = spec.data.as_bytes().len(), "file written");
    Ok(format!("File {} created successfully.", path.display()))
}
