//! Script construction: validation and plan building.
//!
//! A [`Script`] is built once from JSON (or from typed [`Step`]s), validated
//! and planned at construction, then consumed by [`Script::execute`].

use crate::context::ExecutionContext;
use crate::error::{Result, StepScriptError};
use crate::executor::{self, ExecutionReport};
use crate::spawner::{ProcessSpawner, SystemSpawner};
use crate::step::{Step, StepAction};
use serde_json::Value;
use std::path::PathBuf;
use tracing::debug;

/// A validated, planned script bound to a base directory.
#[derive(Debug)]
pub struct Script<S: ProcessSpawner = SystemSpawner> {
    steps: Vec<Step>,
    description: Vec<String>,
    plan: Vec<String>,
    context: ExecutionContext,
    spawner: S,
}

impl Script<SystemSpawner> {
    /// Build from a JSON value, running in the process's current directory.
    pub fn new(script: &Value) -> Result<Self> {
        let steps = validate(script)?;
        let base_dir = std::env::current_dir()?;
        Ok(Self::from_steps(steps, base_dir))
    }

    /// Build from a JSON value, running in `base_dir`.
    pub fn in_dir(script: &Value, base_dir: impl Into<PathBuf>) -> Result<Self> {
        let steps = validate(script)?;
        Ok(Self::from_steps(steps, base_dir))
    }

    /// Parse script text and build it, running in `base_dir`.
    pub fn parse(text: &str, base_dir: impl Into<PathBuf>) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::in_dir(&value, base_dir)
    }

    /// Build from already-typed steps. Nothing to validate.
    pub fn from_steps(steps: Vec<Step>, base_dir: impl Into<PathBuf>) -> Self {
        let (description, plan) = build_plan(&steps);
        let context = ExecutionContext::new(base_dir);
        debug!(
            steps = steps.len(),
            base_dir = %context.original_dir().display(),
            "script constructed"
        );
        Self {
            steps,
            description,
            plan,
            context,
            spawner: SystemSpawner,
        }
    }
}

impl<S: ProcessSpawner> Script<S> {
    /// Swap the process spawner, e.g. for a recording one in tests.
    pub fn with_spawner<T: ProcessSpawner>(self, spawner: T) -> Script<T> {
        Script {
            steps: self.steps,
            description: self.description,
            plan: self.plan,
            context: self.context,
            spawner,
        }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Comments of all steps, in order.
    pub fn description(&self) -> &[String] {
        &self.description
    }

    /// One action summary per command or file step, in order.
    pub fn plan(&self) -> &[String] {
        &self.plan
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    /// Run every step. A script runs exactly once.
    pub fn execute(mut self) -> ExecutionReport {
        executor::execute_steps(&self.steps, &mut self.context, &self.spawner)
    }
}

/// Check the script shape and turn each object into a [`Step`].
pub fn validate(script: &Value) -> Result<Vec<Step>> {
    let entries = script
        .as_array()
        .ok_or_else(|| StepScriptError::validation("Script must be an array of objects."))?;

    // Shape first, so the first malformed element is the one reported
    let mut objects = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        match entry.as_object() {
            Some(object) => objects.push(object),
            None => {
                return Err(StepScriptError::validation(format!(
                    "Step {} is not a valid object.",
                    index + 1
                )));
            }
        }
    }

    objects
        .into_iter()
        .enumerate()
        .map(|(index, object)| Step::from_object(index + 1, object))
        .collect()
}

/// Derive the description (comments) and plan (action summaries).
pub fn build_plan(steps: &[Step]) -> (Vec<String>, Vec<String>) {
    let mut description = Vec::new();
    let mut plan = Vec::new();
    for step in steps {
        if let Some(comment) = &step.comment {
            description.push(comment.clone());
        }
        match &step.action {
            StepAction::Command(raw) => plan.push(format!("Execute command: {}", raw)),
            StepAction::File(spec) => plan.push(format!("Create file: {}", spec.name)),
            StepAction::Empty => {}
        }
    }
    (description, plan)
}
