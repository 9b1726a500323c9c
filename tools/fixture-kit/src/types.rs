use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckMode {
    #[default]
    FailFast,
    Collect,
}

impl CheckMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FailFast => "fail_fast",
            Self::Collect => "collect",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FixtureState {
    Pending,
    Invoked,
    Parsed,
    Compared,
    Passed,
    Failed,
}

impl FixtureState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Invoked => "invoked",
            Self::Parsed => "parsed",
            Self::Compared => "compared",
            Self::Passed => "passed",
            Self::Failed => "failed",
        }
    }
}

/// Absolute locations every run works against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunScope {
    pub working_dir: PathBuf,
    pub yaml_path: PathBuf,
    pub json_path: PathBuf,
    pub log_path: Option<PathBuf>,
}
