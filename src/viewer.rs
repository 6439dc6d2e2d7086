//! Detail-view reconstruction for the interactive viewer.
//!
//! A view is an alternating sequence of context blocks (runs of ordinary lines
//! joined by newlines) and single highlighted lines. The viewer renders a
//! bounded first view and fetches later ranges with [`window`] or
//! [`line_range`] as the user scrolls.

use crate::events::EventMap;
use crate::grouping::{self, GroupedIssue};
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "Kind", rename_all_fields = "PascalCase")]
pub enum Segment {
    Context {
        start: usize,
        end: usize,
        text: String,
    },
    Highlight {
        line: usize,
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DetailView {
    pub segments: Vec<Segment>,
    pub line_count: usize,
    /// First line not covered when reconstruction stopped at its bound.
    pub next_line: Option<usize>,
}

/// Decides which lines a view highlights.
pub trait HighlightSource {
    fn matches(&self, index: usize, line: &str) -> bool;

    fn label(&self, _index: usize) -> Option<&str> {
        None
    }
}

/// Flat issues highlight every line whose text is in the highlight set.
impl HighlightSource for BTreeSet<String> {
    fn matches(&self, _index: usize, line: &str) -> bool {
        self.contains(line)
    }
}

impl HighlightSource for EventMap {
    fn matches(&self, index: usize, _line: &str) -> bool {
        self.events.contains_key(&index)
    }

    fn label(&self, index: usize) -> Option<&str> {
        self.get(index)
    }
}

/// Highlights raw lines that produce one of a grouped issue's detail tuples.
///
/// Grouping ran over process corpora, so each line is first cut down with
/// the issue's process patterns; a line is tested whole only when the issue
/// references no process.
pub struct GroupedHighlights<'a> {
    pub pattern: &'a Regex,
    pub processes: &'a [Regex],
    pub issue: &'a GroupedIssue,
}

impl GroupedHighlights<'_> {
    fn produces_tuple(&self, text: &str) -> bool {
        match grouping::split_captures(self.pattern, text) {
            Some((key, tuple)) => self.issue.contains(&key, &tuple),
            None => false,
        }
    }
}

impl HighlightSource for GroupedHighlights<'_> {
    fn matches(&self, _index: usize, line: &str) -> bool {
        if self.processes.is_empty() {
            return self.produces_tuple(line);
        }
        self.processes
            .iter()
            .any(|process| process.find_iter(line).any(|m| self.produces_tuple(m.as_str())))
    }
}

/// Reconstructs the whole log, stopping after `bound` highlighted lines.
pub fn reconstruct(lines: &[&str], source: &impl HighlightSource, bound: Option<usize>) -> DetailView {
    let (segments, next_line) = segment(lines, 0, lines.len(), source, bound);
    DetailView { segments, line_count: lines.len(), next_line }
}

/// Segments of the inclusive range `[start, end]`, clipped to the log.
pub fn window(lines: &[&str], start: usize, end: usize, events: &EventMap) -> Vec<Segment> {
    match clip(lines.len(), start, end) {
        Some((from, to)) => segment(lines, from, to, events, None).0,
        None => Vec::new(),
    }
}

/// Raw text of the inclusive range `[start, end]`, clipped to the log.
pub fn line_range(lines: &[&str], start: usize, end: usize) -> Option<String> {
    clip(lines.len(), start, end).map(|(from, to)| lines[from..to].join("\n"))
}

// half-open [from, to)
fn clip(len: usize, start: usize, end: usize) -> Option<(usize, usize)> {
    if start > end || start >= len {
        return None;
    }
    Some((start, end.saturating_add(1).min(len)))
}

fn segment(
    lines: &[&str],
    from: usize,
    to: usize,
    source: &impl HighlightSource,
    bound: Option<usize>,
) -> (Vec<Segment>, Option<usize>) {
    let mut segments = Vec::new();
    let mut context_start: Option<usize> = None;
    let mut highlighted = 0usize;
    let mut next_line = None;

    for i in from..to {
        if bound.is_some_and(|b| highlighted >= b) {
            next_line = Some(i);
            break;
        }
        let line = lines[i];
        if source.matches(i, line) {
            if let Some(start) = context_start.take() {
                segments.push(context(lines, start, i));
            }
            segments.push(Segment::Highlight {
                line: i,
                text: line.to_string(),
                label: source.label(i).map(str::to_string),
            });
            highlighted += 1;
        } else if context_start.is_none() {
            context_start = Some(i);
        }
    }
    if let Some(start) = context_start {
        let stop = next_line.unwrap_or(to);
        segments.push(context(lines, start, stop));
    }
    (segments, next_line)
}

fn context(lines: &[&str], start: usize, stop: usize) -> Segment {
    Segment::Context { start, end: stop - 1, text: lines[start..stop].join("\n") }
}
