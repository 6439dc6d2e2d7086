use ahash::AHashMap;
use regex::{Captures, Regex};
use serde::Serialize;
use std::collections::BTreeMap;

/// Grouped occurrences of one issue.
///
/// `group_content[key][i]` is a distinct detail tuple and `group_count[key][i]`
/// the number of lines that produced it. Tuples keep first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GroupedIssue {
    pub group_names: Vec<String>,
    pub group_content: BTreeMap<String, Vec<Vec<String>>>,
    pub group_count: BTreeMap<String, Vec<usize>>,
}

impl GroupedIssue {
    pub fn total(&self) -> usize {
        self.group_count.values().flatten().sum()
    }

    pub fn contains(&self, key: &str, tuple: &[String]) -> bool {
        self.group_content
            .get(key)
            .map(|tuples| tuples.iter().any(|t| t.as_slice() == tuple))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone)]
pub struct Grouping<'c> {
    pub issue: GroupedIssue,
    /// The last line of the content that produced a group entry.
    pub last_match: Option<&'c str>,
}

/// Key and detail tuple of a line, when the pattern matches with at least two
/// capture groups. Groups that did not participate become empty strings.
pub fn split_captures(re: &Regex, line: &str) -> Option<(String, Vec<String>)> {
    if re.captures_len() < 3 {
        return None;
    }
    let caps = re.captures(line)?;
    let key = capture_text(&caps, 1);
    let tuple = (2..caps.len()).map(|i| capture_text(&caps, i)).collect();
    Some((key, tuple))
}

fn capture_text(caps: &Captures<'_>, i: usize) -> String {
    caps.get(i).map(|m| m.as_str().to_string()).unwrap_or_default()
}

pub fn group_lines<'c>(re: &Regex, content: &'c str) -> Grouping<'c> {
    let group_names = re.capture_names().map(|n| n.unwrap_or("").to_string()).collect();
    let mut group_content: BTreeMap<String, Vec<Vec<String>>> = BTreeMap::new();
    let mut group_count: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    // key -> tuple -> position in group_content[key]
    let mut index: AHashMap<String, AHashMap<Vec<String>, usize>> = AHashMap::new();
    let mut last_match = None;

    for line in content.split('\n') {
        let Some((key, tuple)) = split_captures(re, line) else { continue };
        last_match = Some(line);
        let positions = index.entry(key.clone()).or_default();
        match positions.get(&tuple) {
            Some(&pos) => {
                if let Some(count) = group_count.get_mut(&key).and_then(|c| c.get_mut(pos)) {
                    *count += 1;
                }
            }
            None => {
                let tuples = group_content.entry(key.clone()).or_default();
                positions.insert(tuple.clone(), tuples.len());
                tuples.push(tuple);
                group_count.entry(key).or_default().push(1);
            }
        }
    }

    Grouping { issue: GroupedIssue { group_names, group_content, group_count }, last_match }
}
