use crate::rules::{self, GeneralFields, IssueRule};
use itertools::Itertools;
use regex::Regex;
use std::collections::BTreeMap;

pub const FIXED_HEADER: [&str; 5] = ["Issue", "Number", "Details", "Timestamp", "LogLevel"];

pub type IssueSummary = BTreeMap<String, String>; // field name -> rendered value

/// `"<N> :  <matches joined by \n>"` for every match of `re` in `content`.
pub fn render_field(re: &Regex, content: &str) -> String {
    let matches: Vec<&str> = re.find_iter(content).map(|m| m.as_str()).collect();
    format!("{} :  {}", matches.len(), matches.iter().join("\n"))
}

/// Count prefix of a rendered field.
pub fn field_count(rendered: &str) -> Option<usize> {
    rendered.split_once(" :  ").and_then(|(n, _)| n.parse().ok())
}

/// Matched segments of a rendered field.
pub fn field_values(rendered: &str) -> Vec<&str> {
    match rendered.split_once(" :  ") {
        Some((_, "")) | None => Vec::new(),
        Some((_, rest)) => rest.split('\n').collect(),
    }
}

pub fn first_match(re: &Regex, text: &str) -> Option<String> {
    re.find(text).map(|m| m.as_str().to_string())
}

/// First capture group of the first match. A group that did not take part in
/// the match yields an empty string; a pattern without groups yields nothing.
pub fn first_capture(re: &Regex, text: &str) -> Option<String> {
    if re.captures_len() < 2 {
        return None;
    }
    let caps = re.captures(text)?;
    Some(caps.get(1).map(|m| m.as_str().to_string()).unwrap_or_default())
}

/// General field patterns compiled once per analysis and shared by every issue.
#[derive(Debug, Clone, Default)]
pub struct FieldPatterns {
    pub timestamp: Option<Regex>,
    pub log_level: Option<Regex>,
    pub other: Vec<(String, Regex)>,
}

impl FieldPatterns {
    pub fn compile(general: &GeneralFields) -> Self {
        Self {
            timestamp: rules::compile_opt(general.timestamp.as_deref(), "Timestamp"),
            log_level: rules::compile_opt(general.log_level.as_deref(), "LogLevel"),
            other: compile_named(&general.other_fields),
        }
    }

    /// Fills Timestamp, LogLevel, general fields and the issue's own fields.
    ///
    /// Returns the names of the issue-specific fields that were rendered.
    pub fn fill(
        &self,
        summary: &mut IssueSummary,
        issue: &IssueRule,
        content: &str,
        level_line: &str,
        timestamp_line: &str,
    ) -> Vec<String> {
        if let Some(ts) = self.timestamp.as_ref().and_then(|re| first_match(re, timestamp_line)) {
            summary.insert("Timestamp".into(), ts);
        }
        if let Some(level) = self.log_level.as_ref().and_then(|re| first_capture(re, level_line)) {
            summary.insert("LogLevel".into(), level);
        }
        for (name, re) in &self.other {
            summary.insert(name.clone(), render_field(re, content));
        }
        let mut rendered = Vec::new();
        for (name, re) in compile_named(&issue.additional_fields) {
            summary.insert(name.clone(), render_field(&re, content));
            rendered.push(name);
        }
        rendered
    }
}

fn compile_named(patterns: &BTreeMap<String, String>) -> Vec<(String, Regex)> {
    patterns
        .iter()
        .filter_map(|(name, pattern)| rules::compile(pattern, name).map(|re| (name.clone(), re)))
        .collect()
}

/// Report header: the fixed columns, then every general field and every
/// rendered issue field, each once.
pub fn header<'a>(general: &'a GeneralFields, issue_fields: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut extra: Vec<&str> = general.other_fields.keys().map(String::as_str).collect();
    let mut specific: Vec<&str> = issue_fields.into_iter().collect();
    specific.sort_unstable();
    extra.extend(specific);
    FIXED_HEADER
        .iter()
        .copied()
        .chain(extra.into_iter().filter(|f| !FIXED_HEADER.contains(f)))
        .unique()
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_count_and_joined_matches() {
        let re = Regex::new(r"pid=\d+").unwrap();
        let out = render_field(&re, "a pid=1\nb pid=22\nc");
        assert_eq!(out, "2 :  pid=1\npid=22");
        assert_eq!(field_count(&out), Some(2));
        assert_eq!(field_values(&out), vec!["pid=1", "pid=22"]);
    }

    #[test]
    fn renders_zero_matches() {
        let re = Regex::new("nope").unwrap();
        let out = render_field(&re, "abc");
        assert_eq!(out, "0 :  ");
        assert_eq!(field_count(&out), Some(0));
        assert!(field_values(&out).is_empty());
    }

    #[test]
    fn first_capture_needs_a_group() {
        let with_group = Regex::new(r"\s([EWI])\s").unwrap();
        assert_eq!(first_capture(&with_group, "12:00 E boom").as_deref(), Some("E"));
        let no_group = Regex::new(r"\s[EWI]\s").unwrap();
        assert!(first_capture(&no_group, "12:00 E boom").is_none());
        let optional = Regex::new(r"lvl=(\w)?").unwrap();
        assert_eq!(first_capture(&optional, "lvl=").as_deref(), Some(""));
    }

    #[test]
    fn header_lists_each_field_once() {
        let mut general = GeneralFields::default();
        general.other_fields.insert("Pid".into(), "x".into());
        general.other_fields.insert("Host".into(), "x".into());
        let h = header(&general, ["Score", "Pid", "Timestamp", "Score"]);
        assert_eq!(h, vec!["Issue", "Number", "Details", "Timestamp", "LogLevel", "Host", "Pid", "Score"]);
    }

    #[test]
    fn fill_skips_invalid_patterns() {
        let general = GeneralFields {
            timestamp: Some(r"\d{2}:\d{2}".into()),
            log_level: Some("([".into()),
            other_fields: [("Bad".to_string(), "(".to_string()), ("Pid".to_string(), r"pid=\d".to_string())].into(),
            ..Default::default()
        };
        let patterns = FieldPatterns::compile(&general);
        assert!(patterns.log_level.is_none());
        let issue = IssueRule::flat("I", "x").with_field("Code", r"code=\d").with_field("Broken", "[");
        let mut summary = IssueSummary::new();
        let rendered = patterns.fill(&mut summary, &issue, "10:00 pid=1 code=7", "10:00", "11:30 later");
        assert_eq!(summary["Timestamp"], "11:30");
        assert!(!summary.contains_key("LogLevel"));
        assert!(!summary.contains_key("Bad"));
        assert!(!summary.contains_key("Broken"));
        assert_eq!(summary["Pid"], "1 :  pid=1");
        assert_eq!(summary["Code"], "1 :  code=7");
        assert_eq!(rendered, vec!["Code"]);
    }
}
