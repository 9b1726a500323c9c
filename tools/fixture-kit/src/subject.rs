use crate::config::SubjectConfig;
use crate::errors::CheckError;
use crate::runtime::{ProcessOutput, ProcessRequest};
use serde_json::Value;
use std::path::Path;

/// Builds `<shell> -c "<command> <input>"`. The input is handed to the shell
/// unquoted, so the subject sees it after word splitting.
pub fn subject_request(subject: &SubjectConfig, working_dir: &Path, input: &str) -> ProcessRequest {
    ProcessRequest {
        program: subject.shell.clone(),
        args: vec!["-c".to_string(), format!("{} {input}", subject.command)],
        cwd: Some(working_dir.to_path_buf()),
    }
}

/// Extracts `args` from the subject's JSON stdout.
pub fn parse_subject_args(output: &ProcessOutput) -> Result<Vec<String>, CheckError> {
    let document: Value = serde_json::from_str(&output.stdout).map_err(|_| CheckError::Decode {
        stdout: output.stdout.clone(),
        stderr: output.stderr.clone(),
    })?;

    let invalid = || CheckError::InvalidOutput {
        stdout: output.stdout.clone(),
        stderr: output.stderr.clone(),
    };

    let args = document
        .get("args")
        .and_then(Value::as_array)
        .filter(|args| !args.is_empty())
        .ok_or_else(invalid)?;

    args.iter()
        .map(|arg| arg.as_str().map(str::to_string).ok_or_else(invalid))
        .collect()
}

/// The subject echoes its invocation first; only what follows is compared.
pub fn comparable_output(args: &[String]) -> &[String] {
    args.get(1..).unwrap_or_default()
}
