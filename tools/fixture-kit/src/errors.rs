use thiserror::Error;

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("io error: {0}")]
    Io(String),
    #[error("config parse error: {0}")]
    ConfigParse(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("cli error: {0}")]
    Cli(String),
    #[error("process error: {0}")]
    Process(String),
    #[error("fixture parse error: {0}")]
    FixtureParse(String),
    #[error("fixture encode error: {0}")]
    FixtureEncode(String),
    #[error("illegal state transition: {0}")]
    IllegalTransition(String),
    #[error("{0}")]
    Check(#[from] CheckError),
}

/// Raised while checking a single fixture. Messages end with a newline so
/// they can be written to stderr as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckError {
    #[error("JSON error decoding: {stdout}\nstderr: {stderr}\n")]
    Decode { stdout: String, stderr: String },
    #[error("Invalid JSON output: {stdout}\nstderr: {stderr}\n")]
    InvalidOutput { stdout: String, stderr: String },
    #[error("No expected output recorded for input: {input}\n")]
    EmptyExpected { input: String },
    #[error("Mismatch output for input: {input}\nexpected: {expected:?}\nactual: {actual:?}\n")]
    Mismatch {
        input: String,
        expected: Vec<String>,
        actual: Vec<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::{CheckError, FixtureError};

    #[test]
    fn mismatch_message_lists_both_sequences() {
        let err = CheckError::Mismatch {
            input: "foo".to_string(),
            expected: vec!["bar".to_string()],
            actual: vec!["baz".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Mismatch output for input: foo\nexpected: [\"bar\"]\nactual: [\"baz\"]\n"
        );
    }

    #[test]
    fn check_error_converts_without_extra_prefix() {
        let err: FixtureError = CheckError::EmptyExpected {
            input: "foo".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "No expected output recorded for input: foo\n");
    }
}
