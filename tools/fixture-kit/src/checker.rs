//! Replays fixtures against the subject and compares what comes back.

use crate::config::SubjectConfig;
use crate::errors::{CheckError, FixtureError};
use crate::fixture::{Fixture, FixtureCollection};
use crate::fsm::CheckProgress;
use crate::logging::RunLog;
use crate::runtime::Runtime;
use crate::subject::{comparable_output, parse_subject_args, subject_request};
use crate::types::{CheckMode, FixtureState};
use serde_json::json;
use std::path::Path;

pub struct CheckContext<'a> {
    pub runtime: &'a Runtime,
    pub subject: &'a SubjectConfig,
    pub working_dir: &'a Path,
    pub log: &'a RunLog,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureFailure {
    pub index: usize,
    pub input: String,
    pub reached: FixtureState,
    pub error: CheckError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub mode: CheckMode,
    pub total: usize,
    pub passed: usize,
    pub failures: Vec<FixtureFailure>,
}

impl CheckReport {
    pub fn succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// Fixtures never attempted because a fail-fast run stopped early.
    pub fn skipped(&self) -> usize {
        self.total - self.passed - self.failures.len()
    }
}

/// Runs one fixture to `Passed`. Checking failures come back as
/// `FixtureError::Check` with `progress` left in the state that failed;
/// any other error means the subject could not be run at all.
pub fn check_fixture(
    ctx: &CheckContext<'_>,
    fixture: &Fixture,
    progress: &mut CheckProgress,
) -> Result<(), FixtureError> {
    if fixture.output.is_empty() {
        return Err(CheckError::EmptyExpected {
            input: fixture.input.clone(),
        }
        .into());
    }

    let request = subject_request(ctx.subject, ctx.working_dir, &fixture.input);
    let output = ctx.runtime.process_runner.run(request)?;
    progress.transition(FixtureState::Invoked)?;

    let args = parse_subject_args(&output)?;
    progress.transition(FixtureState::Parsed)?;

    let actual = comparable_output(&args);
    progress.transition(FixtureState::Compared)?;
    if actual != fixture.output.as_slice() {
        return Err(CheckError::Mismatch {
            input: fixture.input.clone(),
            expected: fixture.output.clone(),
            actual: actual.to_vec(),
        }
        .into());
    }
    progress.transition(FixtureState::Passed)?;

    let terminal = ctx.runtime.terminal.as_ref();
    terminal.write_diagnostic(&format!("> {}\n", fixture.input))?;
    for line in &fixture.output {
        terminal.write_diagnostic(&format!("< {line}\n"))?;
    }
    Ok(())
}

pub fn check_collection(
    ctx: &CheckContext<'_>,
    collection: &FixtureCollection,
    mode: CheckMode,
) -> Result<CheckReport, FixtureError> {
    let mut report = CheckReport {
        mode,
        total: collection.len(),
        passed: 0,
        failures: Vec::new(),
    };
    ctx.log.info(
        "check_started",
        json!({"fixtures": report.total, "mode": mode.as_str()}),
    )?;

    for (index, fixture) in collection.iter().enumerate() {
        let mut progress = CheckProgress::default();
        let started = ctx.runtime.clock.now();
        match check_fixture(ctx, fixture, &mut progress) {
            Ok(()) => {
                report.passed += 1;
                let duration_ms = ctx
                    .runtime
                    .clock
                    .now()
                    .duration_since(started)
                    .map(|elapsed| elapsed.as_millis() as u64)
                    .unwrap_or(0);
                ctx.log.info(
                    "fixture_passed",
                    json!({"index": index, "input": fixture.input, "duration_ms": duration_ms}),
                )?;
            }
            Err(FixtureError::Check(error)) => {
                let reached = progress.fail(error.to_string())?;
                let message = progress.failure_reason.as_deref().unwrap_or_default();
                ctx.runtime.terminal.write_diagnostic(message)?;
                ctx.log.error(
                    "fixture_failed",
                    json!({
                        "index": index,
                        "input": fixture.input,
                        "state": reached.as_str(),
                        "message": message,
                    }),
                )?;
                report.failures.push(FixtureFailure {
                    index,
                    input: fixture.input.clone(),
                    reached,
                    error,
                });
                if mode == CheckMode::FailFast {
                    break;
                }
            }
            Err(other) => return Err(other),
        }
    }

    if mode == CheckMode::Collect && !report.succeeded() {
        ctx.runtime.terminal.write_diagnostic(&format!(
            "{} of {} fixtures failed\n",
            report.failures.len(),
            report.total
        ))?;
    }

    ctx.log.info(
        "check_finished",
        json!({
            "mode": report.mode.as_str(),
            "passed": report.passed,
            "failed": report.failures.len(),
            "skipped": report.skipped(),
        }),
    )?;
    Ok(report)
}
