use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FlatIssue {
    /// Every match in content order, duplicates included.
    pub matches: Vec<String>,
    /// Distinct match texts the detail view highlights.
    pub highlights: BTreeSet<String>,
}

impl FlatIssue {
    pub fn total(&self) -> usize {
        self.matches.len()
    }

    pub fn joined(&self) -> String {
        self.matches.join("\n")
    }

    pub fn first(&self) -> Option<&str> {
        self.matches.first().map(String::as_str)
    }

    pub fn last(&self) -> Option<&str> {
        self.matches.last().map(String::as_str)
    }
}

pub fn filter(re: &Regex, content: &str) -> FlatIssue {
    let matches: Vec<String> = re.find_iter(content).map(|m| m.as_str().to_string()).collect();
    let highlights = matches.iter().cloned().collect();
    FlatIssue { matches, highlights }
}
