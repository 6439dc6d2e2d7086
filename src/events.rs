//! Correlation of "important event" patterns with raw-log line numbers.
//!
//! Every line is tested against every event pattern, so repeated line texts
//! each keep their own index. When more than one event matches the same line
//! the event whose name sorts first wins.

use crate::rules;
use rayon::prelude::*;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct EventMap {
    pub events: BTreeMap<usize, String>, // line index -> event name
    pub line_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct EventLine {
    pub line: usize,
    pub event: String,
    pub text: String,
}

impl EventMap {
    pub fn get(&self, line: usize) -> Option<&str> {
        self.events.get(&line).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Event lines in ascending order with their raw text.
    pub fn event_lines(&self, lines: &[&str]) -> Vec<EventLine> {
        self.events
            .iter()
            .filter_map(|(&line, event)| {
                lines.get(line).map(|text| EventLine { line, event: event.clone(), text: text.to_string() })
            })
            .collect()
    }
}

/// Splits a raw log into lines; a trailing newline yields a final empty line.
pub fn log_lines(raw: &str) -> Vec<&str> {
    raw.split('\n').collect()
}

pub fn correlate(raw: &str, events: &BTreeMap<String, String>) -> EventMap {
    let lines = log_lines(raw);
    let compiled: Vec<(&str, Regex)> = events
        .iter()
        .filter_map(|(name, pattern)| rules::compile(pattern, name).map(|re| (name.as_str(), re)))
        .collect();
    if compiled.is_empty() {
        return EventMap { events: BTreeMap::new(), line_count: lines.len() };
    }

    let found: BTreeMap<usize, String> = lines
        .par_iter()
        .enumerate()
        .filter_map(|(i, line)| {
            compiled
                .iter()
                .find(|(_, re)| re.is_match(line))
                .map(|(name, _)| (i, name.to_string()))
        })
        .collect();
    tracing::debug!(events = found.len(), lines = lines.len(), "correlated important events");
    EventMap { events: found, line_count: lines.len() }
}
