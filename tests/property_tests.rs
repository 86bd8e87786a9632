//! Property-Based Tests for stepscript
//!
//! Uses proptest for invariants of the chain splitter, the sub-command
//! classifier, directory tracking and the result count of a run. Process
//! spawning is replaced by an in-memory spawner so the properties stay fast.

use proptest::prelude::*;
use serde_json::{json, Value};
use std::io;
use stepscript::command::{split_chain, SubCommand};
use stepscript::{ExecutionContext, ProcessSpawner, Script, SpawnRequest};

/// Succeeds on everything except the literal command `false`
struct InMemorySpawner;

impl ProcessSpawner for InMemorySpawner {
    fn run_foreground(&self, request: &SpawnRequest<'_>) -> io::Result<Option<i32>> {
        Ok(Some(if request.program == "false" { 1 } else { 0 }))
    }

    fn launch_detached(&self, _request: &SpawnRequest<'_>) -> io::Result<()> {
        Ok(())
    }
}

// =============================================================================
// Chain splitting and classification
// =============================================================================

fn word_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_.-]{0,8}"
}

proptest! {
    /// Splitting yields exactly one piece per `&&`, all trimmed
    #[test]
    fn split_chain_piece_count(words in prop::collection::vec(word_strategy(), 1..6)) {
        let raw = words.join(" && ");
        let pieces = split_chain(&raw);
        prop_assert_eq!(pieces.len(), words.len());
        for (piece, word) in pieces.iter().zip(&words) {
            prop_assert_eq!(*piece, word.as_str());
        }
    }

    /// Classification never panics on arbitrary input
    #[test]
    fn parse_never_panics(text in ".{0,40}") {
        let _ = SubCommand::parse(text.trim());
    }

    /// Foreground args are exactly the whitespace-separated words after the program
    #[test]
    fn foreground_args_are_whitespace_words(
        program in word_strategy(),
        args in prop::collection::vec(word_strategy(), 0..5),
    ) {
        prop_assume!(program != "cd");
        let line = std::iter::once(program.clone()).chain(args.clone()).collect::<Vec<_>>().join("  ");
        match SubCommand::parse(&line) {
            SubCommand::Foreground { program: p, args: a } => {
                prop_assert_eq!(p, program.as_str());
                prop_assert_eq!(a, args);
            }
            other => prop_assert!(false, "unexpected {:?}", other),
        }
    }

    /// A trailing `&` always means background
    #[test]
    fn trailing_ampersand_is_background(program in word_strategy()) {
        prop_assume!(program != "cd");
        let line = format!("{} &", program);
        let is_background = matches!(SubCommand::parse(&line), SubCommand::Background { .. });
        prop_assert!(is_background);
    }
}

// =============================================================================
// Directory tracking
// =============================================================================

proptest! {
    /// `cd` into a child and back out returns to the start
    #[test]
    fn cd_down_and_up_round_trips(name in "[a-z]{1,8}") {
        let mut ctx = ExecutionContext::new("/tmp/base");
        prop_assert!(ctx.change_dir(&name).is_some());
        prop_assert!(ctx.change_dir("..").is_some());
        prop_assert_eq!(ctx.working_dir(), std::path::Path::new("/tmp/base"));
    }

    /// File resolution never depends on the live working directory
    #[test]
    fn file_resolution_ignores_cd(dirs in prop::collection::vec("[a-z]{1,6}", 0..4), file in "[a-z]{1,6}\\.txt") {
        let mut ctx = ExecutionContext::new("/tmp/base");
        let before = ctx.resolve_file(&file);
        for dir in &dirs {
            ctx.change_dir(dir);
        }
        prop_assert_eq!(ctx.resolve_file(&file), before);
    }
}

// =============================================================================
// Result count invariants
// =============================================================================

fn step_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        word_strategy().prop_map(|w| json!({"cmd": format!("echo {}", w)})),
        Just(json!({"cmd": "cd ."})),
        Just(json!({"cmd": "false"})),
        Just(json!({"comment": "nothing to do"})),
        word_strategy().prop_map(|w| json!({"cmd": format!("cd {}", w)})),
    ]
}

proptest! {
    /// Entries never exceed the number of command or file steps, and halt at `false`
    #[test]
    fn result_count_bounded(steps in prop::collection::vec(step_strategy(), 0..12)) {
        let actionable = steps
            .iter()
            .filter(|s| s.get("cmd").is_some() || s.get("file").is_some())
            .count();
        let first_failure = steps.iter().position(|s| s["cmd"] == "false");

        let script = Script::in_dir(&Value::Array(steps.clone()), "/tmp/base")
            .unwrap()
            .with_spawner(InMemorySpawner);
        let report = script.execute();

        prop_assert!(report.results.len() <= actionable);
        prop_assert_eq!(report.error.is_some(), first_failure.is_some());
        if let Some(failed) = first_failure {
            prop_assert!(report.results.iter().all(|r| r.step <= failed));
        }
        let silent = steps.iter().filter(|s| s["cmd"] == "cd .").count();
        if first_failure.is_none() {
            prop_assert_eq!(report.results.len(), actionable - silent);
        }
    }
}
