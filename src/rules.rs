//! Rule documents: decoding into a typed [`RuleSet`] and lazy pattern compilation.
//!
//! A rule document is YAML with the top-level keys `SpecificProcess`,
//! `IssuesGeneralFields`, `Issues`, `Priority` and `ImportantEvents`. Every key
//! is optional. Issue entries are decoded key by key so that one malformed entry
//! only produces a [`RuleWarning`] instead of rejecting the whole document.

use crate::error::IngestError;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueMode {
    Flat,
    Group,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRule {
    pub name: String,
    pub mode: IssueMode,
    /// The flat `regex` or the `grouping` pattern, depending on `mode`.
    pub pattern: Option<String>,
    pub processes: BTreeMap<String, String>,
    pub additional_fields: BTreeMap<String, String>,
}

impl IssueRule {
    pub fn flat(name: &str, pattern: &str) -> Self {
        Self {
            name: name.to_string(),
            mode: IssueMode::Flat,
            pattern: Some(pattern.to_string()),
            processes: BTreeMap::new(),
            additional_fields: BTreeMap::new(),
        }
    }

    pub fn grouped(name: &str, pattern: &str) -> Self {
        Self { mode: IssueMode::Group, ..Self::flat(name, pattern) }
    }

    pub fn with_process(mut self, name: &str, pattern: &str) -> Self {
        self.processes.insert(name.to_string(), pattern.to_string());
        self
    }

    pub fn with_field(mut self, name: &str, pattern: &str) -> Self {
        self.additional_fields.insert(name.to_string(), pattern.to_string());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GeneralFields {
    #[serde(rename = "Number", default)]
    pub number: Option<String>,
    #[serde(rename = "Details", default)]
    pub details: Option<String>,
    #[serde(rename = "Timestamp", default)]
    pub timestamp: Option<String>,
    #[serde(rename = "LogLevel", default)]
    pub log_level: Option<String>,
    #[serde(rename = "OtherFields", default, deserialize_with = "null_as_default")]
    pub other_fields: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleWarning {
    pub issue: String,
    pub message: String,
}

impl fmt::Display for RuleWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "issue '{}': {}", self.issue, self.message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    pub processes: BTreeMap<String, String>,
    pub general: GeneralFields,
    pub issues: BTreeMap<String, IssueRule>,
    pub priority: BTreeMap<String, i64>,
    pub important_events: BTreeMap<String, String>,
    pub warnings: Vec<RuleWarning>,
}

#[derive(Debug, Default, Deserialize)]
struct RuleDocument {
    #[serde(rename = "SpecificProcess", default, deserialize_with = "null_as_default")]
    specific_process: BTreeMap<String, String>,
    #[serde(rename = "IssuesGeneralFields", default, deserialize_with = "null_as_default")]
    general: GeneralFields,
    #[serde(rename = "Issues", default, deserialize_with = "null_as_default")]
    issues: BTreeMap<String, Value>,
    #[serde(rename = "Priority", default, deserialize_with = "null_as_default")]
    priority: BTreeMap<String, i64>,
    #[serde(rename = "ImportantEvents", default, deserialize_with = "null_as_default")]
    important_events: BTreeMap<String, String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl RuleSet {
    pub fn from_yaml(text: &str, source_name: &str) -> Result<Self, IngestError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let doc: RuleDocument = serde_yaml::from_str(text).map_err(|e| IngestError::decode(source_name, e))?;
        let mut warnings = Vec::new();
        let issues = doc
            .issues
            .iter()
            .map(|(name, value)| (name.clone(), decode_issue(name, value, &mut warnings)))
            .collect();
        for w in &warnings {
            tracing::warn!(source = source_name, issue = %w.issue, "{}", w.message);
        }
        Ok(Self {
            processes: doc.specific_process,
            general: doc.general,
            issues,
            priority: doc.priority,
            important_events: doc.important_events,
            warnings,
        })
    }

    pub fn priority_of(&self, issue: &str) -> i64 {
        self.priority.get(issue).copied().unwrap_or(0)
    }
}

fn decode_issue(name: &str, value: &Value, warnings: &mut Vec<RuleWarning>) -> IssueRule {
    let mut warn = |message: String| warnings.push(RuleWarning { issue: name.to_string(), message });
    let mut regex = None;
    let mut grouping = None;
    let mut mode = None;
    let mut processes = BTreeMap::new();
    let mut additional_fields = BTreeMap::new();

    match value {
        Value::Mapping(map) => {
            for (k, v) in map {
                let Some(key) = k.as_str() else {
                    warn(format!("ignoring non-string key {k:?}"));
                    continue;
                };
                match (key, v) {
                    ("regex", Value::String(s)) => regex = Some(s.clone()),
                    ("grouping", Value::String(s)) => grouping = Some(s.clone()),
                    ("detailing_mode", Value::String(s)) => mode = Some(s.clone()),
                    ("specific_process", Value::Mapping(m)) => processes = string_map(key, m, &mut warn),
                    ("additional_fields", Value::Mapping(m)) => additional_fields = string_map(key, m, &mut warn),
                    (_, Value::Null) => {}
                    ("regex" | "grouping" | "detailing_mode", _) => warn(format!("'{key}' must be a string")),
                    ("specific_process" | "additional_fields", _) => warn(format!("'{key}' must be a mapping")),
                    _ => warn(format!("ignoring unknown key '{key}'")),
                }
            }
        }
        Value::Null => warn("empty issue definition".to_string()),
        _ => warn("issue definition must be a mapping".to_string()),
    }

    let mode = if mode.as_deref() == Some("group") { IssueMode::Group } else { IssueMode::Flat };
    let pattern = match mode {
        IssueMode::Group => grouping,
        IssueMode::Flat => regex,
    };
    if pattern.is_none() {
        let key = if mode == IssueMode::Group { "grouping" } else { "regex" };
        warn(format!("missing '{key}' pattern, issue will not match anything"));
    }
    IssueRule { name: name.to_string(), mode, pattern, processes, additional_fields }
}

fn string_map(section: &str, map: &Mapping, warn: &mut impl FnMut(String)) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for (k, v) in map {
        match (k.as_str(), v.as_str()) {
            (Some(k), Some(v)) => {
                out.insert(k.to_string(), v.to_string());
            }
            _ => warn(format!("ignoring non-string entry in '{section}'")),
        }
    }
    out
}

/// Compiles `pattern`, logging and returning `None` when it is invalid.
///
/// Patterns are built in multi-line mode so `^` and `$` anchor at line
/// boundaries of a log. Callers treat `None` as "this field is absent" and
/// carry on with the rest of the analysis.
pub fn compile(pattern: &str, context: &str) -> Option<Regex> {
    match RegexBuilder::new(pattern).multi_line(true).build() {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::debug!(context, pattern, error = %e, "skipping pattern that does not compile");
            None
        }
    }
}

/// Compiles an optional pattern; a missing pattern is absent as well.
pub fn compile_opt(pattern: Option<&str>, context: &str) -> Option<Regex> {
    pattern.and_then(|p| compile(p, context))
}
