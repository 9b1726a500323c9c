//! Reading and writing the fixture files.
//!
//! On disk `output` is either a single string or a list of strings. The
//! domain model only knows the list form; this module is the one place that
//! converts between the two.

use crate::errors::FixtureError;
use crate::fixture::{Fixture, FixtureCollection};
use crate::runtime::FileSystem;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Serialize, Deserialize)]
struct FixtureDocument {
    tests: Vec<FixtureRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct FixtureRecord {
    input: String,
    output: OutputShape,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged, expecting = "output to be a string or a list of strings")]
enum OutputShape {
    Line(String),
    Lines(Vec<String>),
}

impl OutputShape {
    fn from_lines(lines: &[String]) -> Self {
        match lines {
            [line] => Self::Line(line.clone()),
            _ => Self::Lines(lines.to_vec()),
        }
    }

    fn into_lines(self) -> Vec<String> {
        match self {
            Self::Line(line) => vec![line],
            Self::Lines(lines) => lines,
        }
    }
}

impl FixtureDocument {
    fn from_collection(collection: &FixtureCollection) -> Self {
        Self {
            tests: collection
                .iter()
                .map(|fixture| FixtureRecord {
                    input: fixture.input.clone(),
                    output: OutputShape::from_lines(&fixture.output),
                })
                .collect(),
        }
    }

    fn into_collection(self) -> FixtureCollection {
        FixtureCollection::new(
            self.tests
                .into_iter()
                .map(|record| Fixture::new(record.input, record.output.into_lines()))
                .collect(),
        )
    }
}

pub fn parse_yaml(text: &str) -> Result<FixtureCollection, FixtureError> {
    let document: FixtureDocument =
        serde_yaml::from_str(text).map_err(|e| FixtureError::FixtureParse(e.to_string()))?;
    Ok(document.into_collection())
}

pub fn render_yaml(collection: &FixtureCollection) -> Result<String, FixtureError> {
    serde_yaml::to_string(&FixtureDocument::from_collection(collection))
        .map_err(|e| FixtureError::FixtureEncode(e.to_string()))
}

pub fn render_json(collection: &FixtureCollection) -> Result<String, FixtureError> {
    let mut rendered = serde_json::to_string_pretty(&FixtureDocument::from_collection(collection))
        .map_err(|e| FixtureError::FixtureEncode(e.to_string()))?;
    rendered.push('\n');
    Ok(rendered)
}

pub fn load_collection(fs: &dyn FileSystem, path: &Path) -> Result<FixtureCollection, FixtureError> {
    parse_yaml(&fs.read_to_string(path)?).map_err(|e| match e {
        FixtureError::FixtureParse(message) => {
            FixtureError::FixtureParse(format!("{}: {message}", path.display()))
        }
        other => other,
    })
}

/// Rewrites both files from `collection`, creating parent directories first.
pub fn save_collection(
    fs: &dyn FileSystem,
    collection: &FixtureCollection,
    yaml_path: &Path,
    json_path: &Path,
) -> Result<(), FixtureError> {
    let yaml = render_yaml(collection)?;
    let json = render_json(collection)?;
    for path in [yaml_path, json_path] {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs.create_dir_all(parent)?;
            }
        }
    }
    fs.write_string(yaml_path, &yaml)?;
    fs.write_string(json_path, &json)
}
