use std::fmt;
use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use serde_json::{Map, Number, Value};

use crate::error::PipelineError;
use crate::fs_util;

/// Written by the seed stage; operators are expected to replace it with the real site.
pub const ACTIVE_SITE_PLACEHOLDER: &str = "1,2,3";

/// A scalar ActSeek parameter. Numbers keep their JSON spelling so `2` and
/// `2.0` reach the command line unchanged; booleans render as `True`/`False`.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigScalar {
    Number(Number),
    Text(String),
    Bool(bool),
}

impl ConfigScalar {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(number) => Some(ConfigScalar::Number(number.clone())),
            Value::String(text) => Some(ConfigScalar::Text(text.clone())),
            Value::Bool(flag) => Some(ConfigScalar::Bool(*flag)),
            _ => None,
        }
    }
}

impl fmt::Display for ConfigScalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigScalar::Number(value) => write!(f, "{value}"),
            ConfigScalar::Text(value) => write!(f, "{value}"),
            ConfigScalar::Bool(true) => write!(f, "True"),
            ConfigScalar::Bool(false) => write!(f, "False"),
        }
    }
}

impl From<&str> for ConfigScalar {
    fn from(value: &str) -> Self {
        ConfigScalar::Text(value.to_string())
    }
}

impl From<i64> for ConfigScalar {
    fn from(value: i64) -> Self {
        ConfigScalar::Number(value.into())
    }
}

/// Typed view of the recognized `config.json` keys. Absent and `null`
/// keys are `None`; presence is checked where a value is needed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub seed_protein_file: Option<String>,
    pub active_site: Option<ConfigScalar>,
    pub selected_active: Option<ConfigScalar>,
    pub aa_grouping: Option<Map<String, Value>>,
    pub random_seed: Option<ConfigScalar>,
    pub threshold: Option<ConfigScalar>,
    pub threshold_combinations: Option<ConfigScalar>,
    pub aa_surrounding: Option<ConfigScalar>,
    pub aa_surrounding_threshold: Option<ConfigScalar>,
    pub threshold_others: Option<ConfigScalar>,
    pub iterations: Option<ConfigScalar>,
    pub first_in_file: Option<ConfigScalar>,
    pub max_protein: Option<ConfigScalar>,
    pub protein_file: Option<String>,
    pub alphafold_proteins_path: Option<String>,
    pub path_results: Option<String>,
    pub delete_protein_files: bool,
    pub kv_finder: bool,
    pub custom: bool,
}

impl Config {
    pub fn from_map(values: &Map<String, Value>) -> Result<Self, PipelineError> {
        Ok(Self {
            seed_protein_file: text_field(values, "seed_protein_file")?,
            active_site: scalar_field(values, "active_site")?,
            selected_active: scalar_field(values, "selected_active")?,
            aa_grouping: mapping_field(values, "aa_grouping")?,
            random_seed: scalar_field(values, "random_seed")?,
            threshold: scalar_field(values, "threshold")?,
            threshold_combinations: scalar_field(values, "threshold_combinations")?,
            aa_surrounding: scalar_field(values, "aa_surrounding")?,
            aa_surrounding_threshold: scalar_field(values, "aa_surrounding_threshold")?,
            threshold_others: scalar_field(values, "threshold_others")?,
            iterations: scalar_field(values, "iterations")?,
            first_in_file: scalar_field(values, "first_in_file")?,
            max_protein: scalar_field(values, "max_protein")?,
            protein_file: text_field(values, "protein_file")?,
            alphafold_proteins_path: text_field(values, "alphafold_proteins_path")?,
            path_results: text_field(values, "path_results")?,
            delete_protein_files: toggle_field(values, "delete_protein_files"),
            kv_finder: toggle_field(values, "KVFinder"),
            custom: toggle_field(values, "custom"),
        })
    }

    /// Seed structure path; absent or empty is fatal for the batch stage.
    pub fn validate_seed(&self) -> Result<Utf8PathBuf, PipelineError> {
        match self.seed_protein_file.as_deref().map(str::trim) {
            Some(path) if !path.is_empty() => Ok(Utf8PathBuf::from(path)),
            _ => Err(PipelineError::ConfigFieldMissing("seed_protein_file")),
        }
    }
}

/// The shared ActSeek `config.json`. The raw JSON object is kept as
/// loaded, key order and `null`s included, and is what gets saved back.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigDocument {
    values: Map<String, Value>,
    settings: Config,
}

impl ConfigDocument {
    pub fn from_map(values: Map<String, Value>) -> Result<Self, PipelineError> {
        let settings = Config::from_map(&values)?;
        Ok(Self { values, settings })
    }

    pub fn settings(&self) -> &Config {
        &self.settings
    }

    pub fn into_settings(self) -> Config {
        self.settings
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Points the config at a new seed. Only `seed_protein_file` and
    /// `active_site` change; `active_site` is reset to the placeholder on
    /// every call, even when it already held a real site.
    pub fn apply_seed(&mut self, seed_path: &Utf8Path) {
        self.values.insert(
            "seed_protein_file".to_string(),
            Value::String(seed_path.to_string()),
        );
        self.values.insert(
            "active_site".to_string(),
            Value::String(ACTIVE_SITE_PLACEHOLDER.to_string()),
        );
        self.settings.seed_protein_file = Some(seed_path.to_string());
        self.settings.active_site = Some(ConfigScalar::from(ACTIVE_SITE_PLACEHOLDER));
    }
}

pub struct ConfigStore;

impl ConfigStore {
    pub fn load(path: &Utf8Path) -> Result<ConfigDocument, PipelineError> {
        if !path.as_std_path().exists() {
            return Err(PipelineError::ConfigMissing(path.to_owned()));
        }
        let content = fs::read_to_string(path.as_std_path())
            .map_err(|_| PipelineError::ConfigRead(path.to_owned()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<ConfigDocument, PipelineError> {
        let value: Value = serde_json::from_str(content)
            .map_err(|err| PipelineError::ConfigParse(err.to_string()))?;
        match value {
            Value::Object(values) => ConfigDocument::from_map(values),
            other => Err(PipelineError::ConfigParse(format!(
                "expected a JSON object, found {}",
                json_kind(&other)
            ))),
        }
    }

    /// Replaces the whole file with the document pretty-printed at four spaces.
    pub fn save(document: &ConfigDocument, path: &Utf8Path) -> Result<(), PipelineError> {
        let content = Self::to_pretty_json(document)?;
        fs_util::write_atomic(path, &content)
    }

    pub fn to_pretty_json(document: &ConfigDocument) -> Result<Vec<u8>, PipelineError> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        serde::Serialize::serialize(&document.values, &mut serializer)
            .map_err(|err| PipelineError::ConfigEncode(err.to_string()))?;
        Ok(buf)
    }
}

fn present<'a>(values: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    values.get(key).filter(|value| !value.is_null())
}

fn scalar_field(
    values: &Map<String, Value>,
    key: &'static str,
) -> Result<Option<ConfigScalar>, PipelineError> {
    present(values, key)
        .map(|value| {
            ConfigScalar::from_value(value).ok_or_else(|| PipelineError::ConfigFieldType {
                key,
                expected: "a number, string or boolean",
                found: json_kind(value),
            })
        })
        .transpose()
}

fn text_field(
    values: &Map<String, Value>,
    key: &'static str,
) -> Result<Option<String>, PipelineError> {
    present(values, key)
        .map(|value| match value {
            Value::String(text) => Ok(text.clone()),
            other => Err(PipelineError::ConfigFieldType {
                key,
                expected: "a string",
                found: json_kind(other),
            }),
        })
        .transpose()
}

fn mapping_field(
    values: &Map<String, Value>,
    key: &'static str,
) -> Result<Option<Map<String, Value>>, PipelineError> {
    present(values, key)
        .map(|value| match value {
            Value::Object(mapping) => Ok(mapping.clone()),
            other => Err(PipelineError::ConfigFieldType {
                key,
                expected: "an object",
                found: json_kind(other),
            }),
        })
        .transpose()
}

// Off when absent, null, false, zero or empty.
fn toggle_field(values: &Map<String, Value>, key: &str) -> bool {
    match values.get(key) {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(number)) => number.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(text)) => !text.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(mapping)) => !mapping.is_empty(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
