//! Per-platform log-level extraction rules.
//!
//! ```yaml
//! LogLevels:
//!   android: [Error, Warning, Info]
//! LevelLetter:
//!   android: { Error: E, Warning: W, Info: I }
//! LevelRegex:
//!   android: { Start: "(?m)^.*\\s", End: "\\s.*$" }
//! ```

use crate::error::IngestError;
use crate::rules;
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlatformLevels {
    #[serde(rename = "LogLevels", default)]
    pub log_levels: BTreeMap<String, Vec<String>>,
    #[serde(rename = "LevelLetter", default)]
    pub level_letter: BTreeMap<String, BTreeMap<String, String>>,
    #[serde(rename = "LevelRegex", default)]
    pub level_regex: BTreeMap<String, BTreeMap<String, String>>,
}

impl PlatformLevels {
    pub fn from_yaml(text: &str, source_name: &str) -> Result<Self, IngestError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|e| IngestError::decode(source_name, e))
    }

    pub fn levels(&self, platform: &str) -> &[String] {
        self.log_levels.get(platform).map(Vec::as_slice).unwrap_or(&[])
    }

    /// `Start + letter + End` for a level, when the platform defines all three.
    pub fn level_pattern(&self, platform: &str, level: &str) -> Option<String> {
        let letter = self.level_letter.get(platform)?.get(level)?;
        let bounds = self.level_regex.get(platform)?;
        let start = bounds.get("Start").map(String::as_str).unwrap_or("");
        let end = bounds.get("End").map(String::as_str).unwrap_or("");
        Some(format!("{start}{letter}{end}"))
    }

    /// Raw-log matches of a level joined by newlines.
    pub fn level_lines(&self, platform: &str, level: &str, raw: &str) -> Option<String> {
        let pattern = self.level_pattern(platform, level)?;
        let re = rules::compile(&pattern, level)?;
        let lines: Vec<&str> = re.find_iter(raw).map(|m| m.as_str()).collect();
        Some(lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"
LogLevels:
  android: [Error, Warning]
LevelLetter:
  android:
    Error: E
    Warning: W
  broken:
    Error: "("
LevelRegex:
  android:
    Start: "^.*\\s"
    End: "\\s.*$"
  broken:
    Start: ""
"#;

    #[test]
    fn builds_level_pattern_and_filters_lines() {
        let p = PlatformLevels::from_yaml(DOC, "platforms.yml").unwrap();
        assert_eq!(p.levels("android"), ["Error".to_string(), "Warning".to_string()]);
        assert!(p.levels("ios").is_empty());
        assert_eq!(p.level_pattern("android", "Error").as_deref(), Some("^.*\\sE\\s.*$"));
        let raw = "10:00 E disk full\n10:01 I ok\n10:02 E again\n";
        assert_eq!(p.level_lines("android", "Error", raw).as_deref(), Some("10:00 E disk full\n10:02 E again"));
    }

    #[test]
    fn unknown_or_invalid_levels_yield_nothing() {
        let p = PlatformLevels::from_yaml(DOC, "platforms.yml").unwrap();
        assert!(p.level_pattern("android", "Debug").is_none());
        assert!(p.level_pattern("ios", "Error").is_none());
        assert!(p.level_lines("broken", "Error", "x").is_none());
    }
}
