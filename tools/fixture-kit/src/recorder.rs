use crate::errors::FixtureError;
use crate::fixture::Fixture;
use crate::fixture_store::{load_collection, save_collection};
use crate::logging::RunLog;
use crate::runtime::{Runtime, Terminal};
use crate::types::RunScope;
use serde_json::json;

pub const INPUT_PROMPT: &str = "> ";
pub const OUTPUT_PROMPT: &str = "< ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordOutcome {
    /// Index of the appended fixture, if one was recorded.
    pub added: Option<usize>,
    pub total: usize,
}

/// Reads lines until a blank one or end of input.
pub fn read_block(terminal: &dyn Terminal, prompt: &str) -> Result<Vec<String>, FixtureError> {
    let mut lines = Vec::new();
    while let Some(line) = terminal.read_line(prompt)? {
        if line.is_empty() {
            break;
        }
        lines.push(line);
    }
    Ok(lines)
}

/// Asks for an input block and, if one was given, its output lines.
pub fn prompt_fixture(terminal: &dyn Terminal) -> Result<Option<Fixture>, FixtureError> {
    terminal.write_line("input:")?;
    let input = read_block(terminal, INPUT_PROMPT)?.join("\n");
    if input.is_empty() {
        return Ok(None);
    }

    terminal.write_line("output: ")?;
    let output = read_block(terminal, OUTPUT_PROMPT)?;
    Ok(Some(Fixture::new(input, output)))
}

pub fn record_fixture(
    runtime: &Runtime,
    scope: &RunScope,
    log: &RunLog,
) -> Result<RecordOutcome, FixtureError> {
    let fs = runtime.file_system.as_ref();
    let terminal = runtime.terminal.as_ref();
    let mut collection = load_collection(fs, &scope.yaml_path)?;

    let added = match prompt_fixture(terminal)? {
        Some(fixture) => {
            if fixture.output.is_empty() {
                terminal.write_diagnostic(
                    "No output recorded, this fixture will fail checking until it has some.\n",
                )?;
                log.warn("fixture_without_output", json!({"input": fixture.input}))?;
            }
            log.info(
                "fixture_recorded",
                json!({
                    "index": collection.len(),
                    "input": fixture.input,
                    "output_lines": fixture.output.len(),
                }),
            )?;
            Some(collection.push(fixture))
        }
        None => {
            terminal.write_diagnostic("No input, just cleaning up files...\n")?;
            log.info("record_skipped", json!({"fixtures": collection.len()}))?;
            None
        }
    };

    save_collection(fs, &collection, &scope.yaml_path, &scope.json_path)?;
    log.info(
        "collection_written",
        json!({
            "fixtures": collection.len(),
            "yaml_path": scope.yaml_path.display().to_string(),
            "json_path": scope.json_path.display().to_string(),
        }),
    )?;

    Ok(RecordOutcome {
        added,
        total: collection.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture_store::parse_yaml;
    use crate::runtime::{FakeClock, FakeFileSystem, FakeProcessRunner, FakeTerminal};
    use std::path::PathBuf;
    use std::sync::Arc;

    fn scope() -> RunScope {
        RunScope {
            working_dir: PathBuf::from("/work"),
            yaml_path: PathBuf::from("/work/tests.yaml"),
            json_path: PathBuf::from("/work/tests.json"),
            log_path: None,
        }
    }

    fn runtime(fs: &FakeFileSystem, terminal: &FakeTerminal) -> Runtime {
        Runtime {
            clock: Arc::new(FakeClock::default()),
            file_system: Arc::new(fs.clone()),
            process_runner: Arc::new(FakeProcessRunner::default()),
            terminal: Arc::new(terminal.clone()),
        }
    }

    #[test]
    fn input_lines_are_joined_and_output_lines_kept_in_order() {
        let terminal = FakeTerminal::with_input(["echo a", "  b", "", "a", "b", ""]);
        let fixture = prompt_fixture(&terminal).expect("prompt").expect("fixture");

        assert_eq!(fixture.input, "echo a\n  b");
        assert_eq!(fixture.output, vec!["a", "b"]);
        assert_eq!(terminal.written_lines(), vec!["input:", "output: "]);
        assert_eq!(terminal.prompts(), vec!["> ", "> ", "> ", "< ", "< ", "< "]);
    }

    #[test]
    fn end_of_input_closes_a_block() {
        let terminal = FakeTerminal::with_input(["foo", "", "bar"]);
        let fixture = prompt_fixture(&terminal).expect("prompt").expect("fixture");
        assert_eq!(fixture.output, vec!["bar"]);
    }

    #[test]
    fn blank_first_input_skips_the_output_prompt() {
        let terminal = FakeTerminal::with_input([""]);
        assert_eq!(prompt_fixture(&terminal).expect("prompt"), None);
        assert_eq!(terminal.written_lines(), vec!["input:"]);
    }

    #[test]
    fn recording_appends_and_writes_both_files() {
        let fs = FakeFileSystem::with_file("/work/tests.yaml", "tests:\n- input: a\n  output: b\n");
        let terminal = FakeTerminal::with_input(["foo", "", "bar", ""]);

        let outcome =
            record_fixture(&runtime(&fs, &terminal), &scope(), &RunLog::disabled()).expect("record");

        assert_eq!(outcome, RecordOutcome { added: Some(1), total: 2 });
        let yaml = fs.file("/work/tests.yaml").expect("yaml written");
        let collection = parse_yaml(&yaml).expect("parse");
        assert_eq!(collection.as_slice()[1], Fixture::new("foo", vec!["bar".to_string()]));
        assert!(yaml.contains("output: bar"));

        let json: serde_json::Value =
            serde_json::from_str(&fs.file("/work/tests.json").expect("json written")).expect("json");
        assert_eq!(json["tests"][1]["input"], "foo");
        assert_eq!(json["tests"][1]["output"], "bar");
    }

    #[test]
    fn blank_input_still_rewrites_files_without_adding() {
        let original = "tests:\n- input: a\n  output:\n  - b\n  - c\n";
        let fs = FakeFileSystem::with_file("/work/tests.yaml", original);
        let terminal = FakeTerminal::with_input([""]);

        let outcome =
            record_fixture(&runtime(&fs, &terminal), &scope(), &RunLog::disabled()).expect("record");

        assert_eq!(outcome, RecordOutcome { added: None, total: 1 });
        let rewritten = fs.file("/work/tests.yaml").expect("yaml");
        assert_eq!(
            parse_yaml(&rewritten).expect("reparse"),
            parse_yaml(original).expect("original")
        );
        assert!(fs.file("/work/tests.json").is_some());
        assert_eq!(
            terminal.diagnostic_text(),
            "No input, just cleaning up files...\n"
        );
    }

    #[test]
    fn two_recordings_keep_insertion_order() {
        let fs = FakeFileSystem::with_file("/work/tests.yaml", "tests: []\n");
        for (input, output) in [("first", "1"), ("second", "2")] {
            let terminal = FakeTerminal::with_input([input, "", output, ""]);
            record_fixture(&runtime(&fs, &terminal), &scope(), &RunLog::disabled())
                .expect("record");
        }

        let collection = parse_yaml(&fs.file("/work/tests.yaml").expect("yaml")).expect("parse");
        let inputs = collection
            .iter()
            .map(|fixture| fixture.input.as_str())
            .collect::<Vec<_>>();
        assert_eq!(inputs, vec!["first", "second"]);
    }

    #[test]
    fn fixture_without_output_is_kept_with_a_warning() {
        let fs = FakeFileSystem::with_file("/work/tests.yaml", "tests: []\n");
        let terminal = FakeTerminal::with_input(["foo", "", ""]);

        record_fixture(&runtime(&fs, &terminal), &scope(), &RunLog::disabled()).expect("record");

        assert!(terminal.diagnostic_text().contains("No output recorded"));
        assert!(fs.file("/work/tests.yaml").expect("yaml").contains("output: []"));
    }

    #[test]
    fn missing_fixture_file_aborts_before_prompting() {
        let fs = FakeFileSystem::default();
        let terminal = FakeTerminal::with_input(["foo", ""]);

        let err = record_fixture(&runtime(&fs, &terminal), &scope(), &RunLog::disabled())
            .expect_err("missing file");
        assert!(matches!(err, FixtureError::Io(_)));
        assert!(terminal.prompts().is_empty());
        assert!(fs.file("/work/tests.json").is_none());
    }
}
