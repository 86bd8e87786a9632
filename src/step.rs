//! Script step types.
//!
//! A script is a JSON array of objects. Each object becomes a [`Step`] whose
//! [`StepAction`] is a closed set: run a command chain, write a file, or do
//! nothing. Field-level checks live here; the array/object shape check lives
//! in [`crate::script`].

use crate::error::{Result, StepScriptError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};

/// One entry of the input script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// Informational text, only used by the plan builder.
    pub comment: Option<String>,
    pub action: StepAction,
}

/// What a step does when dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepAction {
    /// One or more shell invocations joined by `&&`.
    Command(String),
    /// A file to create or overwrite.
    File(FileSpec),
    /// Neither `cmd` nor `file`; produces no result entry.
    Empty,
}

/// Target and content of a file step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSpec {
    pub name: String,
    pub data: FileData,
}

/// File content: a JSON string or a JSON array of bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FileData {
    Text(String),
    Bytes(Vec<u8>),
}

impl FileData {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            FileData::Text(text) => text.as_bytes(),
            FileData::Bytes(bytes) => bytes,
        }
    }
}

impl From<&str> for FileData {
    fn from(text: &str) -> Self {
        FileData::Text(text.to_string())
    }
}

impl Step {
    pub fn command(raw: impl Into<String>) -> Self {
        Self {
            comment: None,
            action: StepAction::Command(raw.into()),
        }
    }

    pub fn file(name: impl Into<String>, data: impl Into<FileData>) -> Self {
        Self {
            comment: None,
            action: StepAction::File(FileSpec {
                name: name.into(),
                data: data.into(),
            }),
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Build a step from one JSON object.
    ///
    /// `number` is the 1-based position used in error messages. Falsy
    /// values (`null`, `false`, `0`, `""`) count as absent, scalar comments
    /// are stringified, and `cmd` takes precedence over `file`.
    pub fn from_object(number: usize, object: &Map<String, Value>) -> Result<Self> {
        let comment = match object.get("comment") {
            None => None,
            Some(value) if is_falsy(value) => None,
            Some(Value::String(text)) => Some(text.clone()),
            Some(value @ (Value::Number(_) | Value::Bool(_))) => Some(value.to_string()),
            Some(_) => {
                return Err(StepScriptError::validation(format!(
                    "Step {} has a non-scalar comment.",
                    number
                )));
            }
        };

        let cmd = match object.get("cmd") {
            None => None,
            Some(value) if is_falsy(value) => None,
            Some(Value::String(raw)) => Some(raw.clone()),
            Some(_) => {
                return Err(StepScriptError::validation(format!(
                    "Step {} has a non-string cmd.",
                    number
                )));
            }
        };

        let action = if let Some(raw) = cmd {
            StepAction::Command(raw)
        } else {
            match object.get("file") {
                None => StepAction::Empty,
                Some(file) if is_falsy(file) => StepAction::Empty,
                Some(file) => {
                    let spec = FileSpec::deserialize(file).map_err(|e| {
                        StepScriptError::validation(format!(
                            "Step {} has an invalid file: {}",
                            number, e
                        ))
                    })?;
                    StepAction::File(spec)
                }
            }
        };

        Ok(Self { comment, action })
    }

    /// Kind of result this step produces, or `None` for an empty step.
    pub fn kind(&self) -> Option<StepKind> {
        match self.action {
            StepAction::Command(_) => Some(StepKind::Cmd),
            StepAction::File(_) => Some(StepKind::File),
            StepAction::Empty => None,
        }
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(text) => text.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// The `type` tag of a result entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StepKind {
    Cmd,
    File,
}

/// One entry of the execution trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResult {
    /// 1-based index of the step that produced this entry.
    pub step: usize,
    #[serde(rename = "type")]
    pub kind: StepKind,
    pub result: String,
}
