use crate::rules::{self, RuleSet};
use once_cell::sync::OnceCell;
use rayon::prelude::*;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};

/// All non-overlapping matches of `re` in `text`, joined by newlines.
pub fn corpus(re: &Regex, text: &str) -> (usize, String) {
    let matches: Vec<&str> = re.find_iter(text).map(|m| m.as_str()).collect();
    (matches.len(), matches.join("\n"))
}

/// Computes the named process corpora of `raw`, one task per process.
///
/// Only processes with more than one match are kept.
pub fn extract_corpora(raw: &str, processes: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    processes
        .par_iter()
        .filter_map(|(name, pattern)| {
            let re = rules::compile(pattern, name)?;
            let (count, text) = corpus(&re, raw);
            (count > 1).then(|| (name.clone(), text))
        })
        .collect()
}

/// Corpora computed on demand for processes an issue references but that were
/// not materialized up front.
///
/// Slots are allocated before the issue tasks start, so the table itself is
/// never resized; each slot is filled at most once even when several issues
/// reach it at the same time.
pub struct OnDemandCorpora<'a> {
    raw: &'a str,
    slots: HashMap<(String, String), OnceCell<Option<String>>>,
}

impl<'a> OnDemandCorpora<'a> {
    pub fn new(raw: &'a str, rules: &RuleSet, materialized: &BTreeMap<String, String>) -> Self {
        let mut slots = HashMap::new();
        for issue in rules.issues.values() {
            for (name, pattern) in &issue.processes {
                if !materialized.contains_key(name) {
                    slots.entry((name.clone(), pattern.clone())).or_insert_with(OnceCell::new);
                }
            }
        }
        Self { raw, slots }
    }

    /// The on-demand corpus for `name`, or `None` when its pattern does not compile.
    pub fn get(&self, name: &str, pattern: &str) -> Option<&str> {
        let key = (name.to_string(), pattern.to_string());
        match self.slots.get(&key) {
            Some(cell) => cell.get_or_init(|| self.compute(name, pattern)).as_deref(),
            None => None,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn compute(&self, name: &str, pattern: &str) -> Option<String> {
        let re = rules::compile(pattern, name)?;
        tracing::debug!(process = name, "computing process corpus on demand");
        Some(corpus(&re, self.raw).1)
    }
}

/// Builds the content an issue is classified against: one block per referenced
/// process, each followed by a newline. Empty corpora contribute nothing.
pub fn issue_content(
    processes: &BTreeMap<String, String>,
    materialized: &BTreeMap<String, String>,
    on_demand: &OnDemandCorpora<'_>,
) -> String {
    let mut content = String::new();
    for (name, pattern) in processes {
        let block = match materialized.get(name) {
            Some(text) => text.as_str(),
            None => match on_demand.get(name, pattern) {
                Some(text) => text,
                None => continue,
            },
        };
        if block.is_empty() {
            continue;
        }
        content.push_str(block);
        content.push('\n');
    }
    content
}
