use crate::errors::FixtureError;
use crate::logging::DEFAULT_DISK_BUDGET_BYTES;
use crate::runtime::FileSystem;
use crate::types::{CheckMode, RunScope};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_YAML_PATH: &str = "tests.yaml";
pub const DEFAULT_JSON_PATH: &str = "tests.json";
pub const DEFAULT_SHELL: &str = "/bin/bash";
pub const DEFAULT_SUBJECT_COMMAND: &str = "./test.py";

#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_path: Option<PathBuf>,
    pub working_dir: Option<PathBuf>,
    pub yaml_path: Option<PathBuf>,
    pub json_path: Option<PathBuf>,
    pub log_path: Option<PathBuf>,
    pub subject_command: Option<String>,
    pub shell: Option<String>,
    pub check_mode: Option<CheckMode>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    pub fixtures: FixturesConfig,
    pub subject: SubjectConfig,
    pub check: CheckConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FixturesConfig {
    pub yaml_path: PathBuf,
    pub json_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubjectConfig {
    pub shell: String,
    pub command: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckConfig {
    pub mode: CheckMode,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogConfig {
    pub path: Option<PathBuf>,
    pub budget_bytes: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            fixtures: FixturesConfig {
                yaml_path: PathBuf::from(DEFAULT_YAML_PATH),
                json_path: PathBuf::from(DEFAULT_JSON_PATH),
            },
            subject: SubjectConfig {
                shell: DEFAULT_SHELL.to_string(),
                command: DEFAULT_SUBJECT_COMMAND.to_string(),
            },
            check: CheckConfig {
                mode: CheckMode::FailFast,
            },
            log: LogConfig {
                path: None,
                budget_bytes: DEFAULT_DISK_BUDGET_BYTES,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct PartialAppConfig {
    fixtures: Option<PartialFixturesConfig>,
    subject: Option<PartialSubjectConfig>,
    check: Option<PartialCheckConfig>,
    log: Option<PartialLogConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct PartialFixturesConfig {
    yaml_path: Option<PathBuf>,
    json_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct PartialSubjectConfig {
    shell: Option<String>,
    command: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct PartialCheckConfig {
    mode: Option<CheckMode>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct PartialLogConfig {
    path: Option<PathBuf>,
    budget_bytes: Option<u64>,
}

pub fn load_config(
    overrides: &CliOverrides,
    process_cwd: &Path,
    fs: &dyn FileSystem,
) -> Result<(AppConfig, RunScope), FixtureError> {
    let mut cfg = AppConfig::default();

    if let Some(path) = &overrides.config_path {
        let path = absolutize_path(process_cwd, path);
        let file_contents = fs.read_to_string(&path)?;
        let partial: PartialAppConfig = toml::from_str(&file_contents)
            .map_err(|e| FixtureError::ConfigParse(e.to_string()))?;
        merge_partial_config(&mut cfg, partial);
    }

    apply_cli_overrides(&mut cfg, overrides);
    validate_config(&cfg)?;

    let scope = resolve_scope(process_cwd, &cfg, overrides);
    validate_scope(&scope)?;
    Ok((cfg, scope))
}

fn merge_partial_config(cfg: &mut AppConfig, partial: PartialAppConfig) {
    if let Some(fixtures) = partial.fixtures {
        if let Some(value) = fixtures.yaml_path {
            cfg.fixtures.yaml_path = value;
        }
        if let Some(value) = fixtures.json_path {
            cfg.fixtures.json_path = value;
        }
    }

    if let Some(subject) = partial.subject {
        if let Some(value) = subject.shell {
            cfg.subject.shell = value;
        }
        if let Some(value) = subject.command {
            cfg.subject.command = value;
        }
    }

    if let Some(check) = partial.check {
        if let Some(value) = check.mode {
            cfg.check.mode = value;
        }
    }

    if let Some(log) = partial.log {
        if let Some(value) = log.path {
            cfg.log.path = Some(value);
        }
        if let Some(value) = log.budget_bytes {
            cfg.log.budget_bytes = value;
        }
    }
}

fn apply_cli_overrides(cfg: &mut AppConfig, overrides: &CliOverrides) {
    if let Some(path) = &overrides.yaml_path {
        cfg.fixtures.yaml_path = path.clone();
    }
    if let Some(path) = &overrides.json_path {
        cfg.fixtures.json_path = path.clone();
    }
    if let Some(path) = &overrides.log_path {
        cfg.log.path = Some(path.clone());
    }
    if let Some(command) = &overrides.subject_command {
        cfg.subject.command = command.clone();
    }
    if let Some(shell) = &overrides.shell {
        cfg.subject.shell = shell.clone();
    }
    if let Some(mode) = overrides.check_mode {
        cfg.check.mode = mode;
    }
}

pub fn resolve_scope(process_cwd: &Path, cfg: &AppConfig, overrides: &CliOverrides) -> RunScope {
    let working_dir = match &overrides.working_dir {
        Some(path) => absolutize_path(process_cwd, path),
        None => process_cwd.to_path_buf(),
    };

    RunScope {
        yaml_path: absolutize_path(&working_dir, &cfg.fixtures.yaml_path),
        json_path: absolutize_path(&working_dir, &cfg.fixtures.json_path),
        log_path: cfg
            .log
            .path
            .as_ref()
            .map(|path| absolutize_path(&working_dir, path)),
        working_dir,
    }
}

fn absolutize_path(base: &Path, value: &Path) -> PathBuf {
    if value.is_absolute() {
        value.to_path_buf()
    } else {
        base.join(value)
    }
}

fn validate_config(cfg: &AppConfig) -> Result<(), FixtureError> {
    if cfg.subject.shell.trim().is_empty() {
        return Err(FixtureError::InvalidConfig(
            "subject.shell must not be empty".to_string(),
        ));
    }

    if cfg.subject.command.trim().is_empty() {
        return Err(FixtureError::InvalidConfig(
            "subject.command must not be empty".to_string(),
        ));
    }

    if cfg.fixtures.yaml_path.as_os_str().is_empty() || cfg.fixtures.json_path.as_os_str().is_empty()
    {
        return Err(FixtureError::InvalidConfig(
            "fixtures.yaml_path and fixtures.json_path must not be empty".to_string(),
        ));
    }

    if cfg.log.budget_bytes == 0 {
        return Err(FixtureError::InvalidConfig(
            "log.budget_bytes must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

/// Compares resolved paths, so `tests.yaml` and `./tests.yaml` count as the same file.
fn validate_scope(scope: &RunScope) -> Result<(), FixtureError> {
    if scope.yaml_path == scope.json_path {
        return Err(FixtureError::InvalidConfig(format!(
            "fixtures.yaml_path and fixtures.json_path must differ (both resolve to {})",
            scope.yaml_path.display()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::FakeFileSystem;

    #[test]
    fn defaults_match_the_historical_file_names() {
        let fs = FakeFileSystem::default();
        let (cfg, scope) =
            load_config(&CliOverrides::default(), Path::new("/work"), &fs).expect("defaults");

        assert_eq!(cfg.subject.shell, "/bin/bash");
        assert_eq!(cfg.subject.command, "./test.py");
        assert_eq!(cfg.check.mode, CheckMode::FailFast);
        assert_eq!(scope.working_dir, PathBuf::from("/work"));
        assert_eq!(scope.yaml_path, PathBuf::from("/work/tests.yaml"));
        assert_eq!(scope.json_path, PathBuf::from("/work/tests.json"));
        assert_eq!(scope.log_path, None);
    }

    #[test]
    fn file_values_merge_and_cli_flags_win() {
        let fs = FakeFileSystem::with_file(
            "/work/fixtures.toml",
            r#"
[fixtures]
yaml_path = "data/cases.yaml"

[subject]
command = "./subject.sh"

[check]
mode = "collect"

[log]
path = "logs/run.jsonl"
"#,
        );
        let overrides = CliOverrides {
            config_path: Some(PathBuf::from("fixtures.toml")),
            subject_command: Some("./other.sh".to_string()),
            ..CliOverrides::default()
        };

        let (cfg, scope) = load_config(&overrides, Path::new("/work"), &fs).expect("load");
        assert_eq!(cfg.subject.command, "./other.sh");
        assert_eq!(cfg.subject.shell, "/bin/bash");
        assert_eq!(cfg.check.mode, CheckMode::Collect);
        assert_eq!(scope.yaml_path, PathBuf::from("/work/data/cases.yaml"));
        assert_eq!(scope.json_path, PathBuf::from("/work/tests.json"));
        assert_eq!(scope.log_path, Some(PathBuf::from("/work/logs/run.jsonl")));
    }

    #[test]
    fn working_dir_override_rebases_relative_paths() {
        let fs = FakeFileSystem::default();
        let overrides = CliOverrides {
            working_dir: Some(PathBuf::from("fixtures")),
            json_path: Some(PathBuf::from("/abs/tests.json")),
            check_mode: Some(CheckMode::Collect),
            ..CliOverrides::default()
        };
        let (cfg, scope) = load_config(&overrides, Path::new("/work"), &fs).expect("load");
        assert_eq!(cfg.check.mode, CheckMode::Collect);
        assert_eq!(scope.working_dir, PathBuf::from("/work/fixtures"));
        assert_eq!(scope.yaml_path, PathBuf::from("/work/fixtures/tests.yaml"));
        assert_eq!(scope.json_path, PathBuf::from("/abs/tests.json"));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let fs = FakeFileSystem::with_file("/c.toml", "[subject]\ncommand = \"  \"\n");
        let overrides = CliOverrides {
            config_path: Some(PathBuf::from("/c.toml")),
            ..CliOverrides::default()
        };
        let err = load_config(&overrides, Path::new("/"), &fs).expect_err("empty command");
        assert!(matches!(err, FixtureError::InvalidConfig(message) if message.contains("subject.command")));

        let overrides = CliOverrides {
            json_path: Some(PathBuf::from("tests.yaml")),
            ..CliOverrides::default()
        };
        let err = load_config(&overrides, Path::new("/"), &fs).expect_err("same paths");
        assert!(matches!(err, FixtureError::InvalidConfig(message) if message.contains("must differ")));
    }

    #[test]
    fn paths_that_resolve_to_the_same_file_are_rejected() {
        let fs = FakeFileSystem::default();
        let overrides = CliOverrides {
            yaml_path: Some(PathBuf::from("tests.yaml")),
            json_path: Some(PathBuf::from("./tests.yaml")),
            ..CliOverrides::default()
        };
        let err = load_config(&overrides, Path::new("/work"), &fs).expect_err("same file");
        assert!(matches!(
            err,
            FixtureError::InvalidConfig(message)
                if message.contains("must differ") && message.contains("/work/tests.yaml")
        ));

        let overrides = CliOverrides {
            working_dir: Some(PathBuf::from("/work")),
            json_path: Some(PathBuf::from("/work/tests.yaml")),
            ..CliOverrides::default()
        };
        let err = load_config(&overrides, Path::new("/"), &fs).expect_err("absolute json path");
        assert!(matches!(err, FixtureError::InvalidConfig(message) if message.contains("must differ")));
    }

    #[test]
    fn cli_mode_switches_a_collect_config_back_to_fail_fast() {
        let fs = FakeFileSystem::with_file("/work/fixtures.toml", "[check]\nmode = \"collect\"\n");
        let overrides = CliOverrides {
            config_path: Some(PathBuf::from("fixtures.toml")),
            check_mode: Some(CheckMode::FailFast),
            ..CliOverrides::default()
        };
        let (cfg, _) = load_config(&overrides, Path::new("/work"), &fs).expect("load");
        assert_eq!(cfg.check.mode, CheckMode::FailFast);

        let overrides = CliOverrides {
            config_path: Some(PathBuf::from("fixtures.toml")),
            ..CliOverrides::default()
        };
        let (cfg, _) = load_config(&overrides, Path::new("/work"), &fs).expect("load");
        assert_eq!(cfg.check.mode, CheckMode::Collect);
    }

    #[test]
    fn unknown_keys_and_missing_files_fail() {
        let fs = FakeFileSystem::with_file("/c.toml", "[subject]\nprogram = \"x\"\n");
        let overrides = CliOverrides {
            config_path: Some(PathBuf::from("/c.toml")),
            ..CliOverrides::default()
        };
        let err = load_config(&overrides, Path::new("/"), &fs).expect_err("unknown key");
        assert!(matches!(err, FixtureError::ConfigParse(_)));

        let overrides = CliOverrides {
            config_path: Some(PathBuf::from("/missing.toml")),
            ..CliOverrides::default()
        };
        let err = load_config(&overrides, Path::new("/"), &fs).expect_err("missing");
        assert!(matches!(err, FixtureError::Io(_)));
    }
}
