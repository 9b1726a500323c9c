pub mod checker;
pub mod config;
pub mod errors;
pub mod fixture;
pub mod fixture_store;
pub mod fsm;
pub mod log_retention;
pub mod logging;
pub mod recorder;
pub mod runtime;
pub mod subject;
pub mod types;

use checker::{check_collection, CheckContext};
use clap::{error::ErrorKind, Parser, ValueEnum};
use config::{load_config, CliOverrides};
use errors::FixtureError;
use fixture_store::load_collection;
use logging::RunLog;
use recorder::record_fixture;
use runtime::Runtime;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use types::CheckMode;

#[derive(Debug, Clone, Parser)]
#[command(name = "maketest")]
#[command(about = "Record one fixture interactively and rewrite the fixture files")]
pub struct RecordCli {
    /// TOML config file
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Directory relative paths are resolved against
    #[arg(long)]
    pub working_dir: Option<PathBuf>,
    /// Primary YAML fixture file [default: tests.yaml]
    #[arg(long)]
    pub fixtures: Option<PathBuf>,
    /// JSON export written alongside the YAML file [default: tests.json]
    #[arg(long = "json")]
    pub json_path: Option<PathBuf>,
    /// Append JSONL run events to this file
    #[arg(long)]
    pub log: Option<PathBuf>,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "checktests")]
#[command(about = "Replay every fixture against the test subject and compare its output")]
pub struct CheckCli {
    /// TOML config file
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Directory relative paths are resolved against; the subject runs here
    #[arg(long)]
    pub working_dir: Option<PathBuf>,
    /// Primary YAML fixture file [default: tests.yaml]
    #[arg(long)]
    pub fixtures: Option<PathBuf>,
    /// Command the fixture input is appended to [default: ./test.py]
    #[arg(long)]
    pub subject: Option<String>,
    /// Shell that runs the subject command [default: /bin/bash]
    #[arg(long)]
    pub shell: Option<String>,
    /// Stop at the first failure or check every fixture [default: fail-fast]
    #[arg(long, value_enum)]
    pub mode: Option<CliCheckMode>,
    /// Append JSONL run events to this file
    #[arg(long)]
    pub log: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CliCheckMode {
    FailFast,
    Collect,
}

impl From<CliCheckMode> for CheckMode {
    fn from(value: CliCheckMode) -> Self {
        match value {
            CliCheckMode::FailFast => CheckMode::FailFast,
            CliCheckMode::Collect => CheckMode::Collect,
        }
    }
}

impl From<&RecordCli> for CliOverrides {
    fn from(cli: &RecordCli) -> Self {
        Self {
            config_path: cli.config.clone(),
            working_dir: cli.working_dir.clone(),
            yaml_path: cli.fixtures.clone(),
            json_path: cli.json_path.clone(),
            log_path: cli.log.clone(),
            ..Self::default()
        }
    }
}

impl From<&CheckCli> for CliOverrides {
    fn from(cli: &CheckCli) -> Self {
        Self {
            config_path: cli.config.clone(),
            working_dir: cli.working_dir.clone(),
            yaml_path: cli.fixtures.clone(),
            log_path: cli.log.clone(),
            subject_command: cli.subject.clone(),
            shell: cli.shell.clone(),
            check_mode: cli.mode.map(Into::into),
            ..Self::default()
        }
    }
}

pub fn run_record() -> Result<i32, FixtureError> {
    let args = std::env::args_os().collect::<Vec<_>>();
    let cwd = std::env::current_dir().map_err(|e| FixtureError::Io(e.to_string()))?;
    run_record_with_runtime(&args, &cwd, &Runtime::production())
}

pub fn run_check() -> Result<i32, FixtureError> {
    let args = std::env::args_os().collect::<Vec<_>>();
    let cwd = std::env::current_dir().map_err(|e| FixtureError::Io(e.to_string()))?;
    run_check_with_runtime(&args, &cwd, &Runtime::production())
}

pub fn run_record_with_runtime(
    args: &[OsString],
    cwd: &Path,
    runtime: &Runtime,
) -> Result<i32, FixtureError> {
    let Some(cli) = parse_cli::<RecordCli>(args, runtime)? else {
        return Ok(0);
    };

    let (cfg, scope) = load_config(
        &CliOverrides::from(&cli),
        cwd,
        runtime.file_system.as_ref(),
    )?;
    let log = RunLog::from_path(scope.log_path.as_deref(), cfg.log.budget_bytes);

    record_fixture(runtime, &scope, &log)?;
    Ok(0)
}

pub fn run_check_with_runtime(
    args: &[OsString],
    cwd: &Path,
    runtime: &Runtime,
) -> Result<i32, FixtureError> {
    let Some(cli) = parse_cli::<CheckCli>(args, runtime)? else {
        return Ok(0);
    };

    let (cfg, scope) = load_config(
        &CliOverrides::from(&cli),
        cwd,
        runtime.file_system.as_ref(),
    )?;
    let log = RunLog::from_path(scope.log_path.as_deref(), cfg.log.budget_bytes);
    let collection = load_collection(runtime.file_system.as_ref(), &scope.yaml_path)?;

    let ctx = CheckContext {
        runtime,
        subject: &cfg.subject,
        working_dir: &scope.working_dir,
        log: &log,
    };
    let report = check_collection(&ctx, &collection, cfg.check.mode)?;
    Ok(if report.succeeded() { 0 } else { 1 })
}

/// `Ok(None)` means help or version was printed and the tool should exit 0.
fn parse_cli<C: Parser>(args: &[OsString], runtime: &Runtime) -> Result<Option<C>, FixtureError> {
    match C::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(error) => match error.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                runtime.terminal.write_line(error.to_string().trim_end())?;
                Ok(None)
            }
            _ => Err(FixtureError::Cli(error.to_string())),
        },
    }
}
