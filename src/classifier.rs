//! Issue classification: one task per issue over its assembled content, then
//! report assembly.

use crate::events::{self, EventMap};
use crate::fields::{self, FieldPatterns, IssueSummary};
use crate::flat::{self, FlatIssue};
use crate::grouping::{self, GroupedIssue};
use crate::ingest::RawLog;
use crate::priority;
use crate::process::{self, OnDemandCorpora};
use crate::rules::{self, IssueMode, IssueRule, RuleSet, RuleWarning};
use crate::viewer::{self, DetailView, GroupedHighlights};
use rayon::prelude::*;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Report {
    pub file_name: String,
    pub raw_log: String,
    pub process_corpora: BTreeMap<String, String>,
    pub header: Vec<String>,
    pub ordered_issues: Vec<String>,
    pub issues: BTreeMap<String, IssueSummary>,
    pub platform: Option<String>,
}

/// Everything produced by one analysis request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Analysis {
    pub report: Report,
    pub grouped: BTreeMap<String, GroupedIssue>,
    pub flat: BTreeMap<String, FlatIssue>,
    pub warnings: Vec<RuleWarning>,
}

#[derive(Debug)]
enum Detail {
    Grouped(GroupedIssue),
    Flat(FlatIssue),
    Unusable,
}

#[derive(Debug)]
struct Outcome {
    name: String,
    summary: IssueSummary,
    detail: Detail,
    rendered_fields: Vec<String>,
}

pub fn analyze(log: &RawLog, rules: &RuleSet) -> Analysis {
    let raw = log.content.as_str();
    let corpora = process::extract_corpora(raw, &rules.processes);
    let on_demand = OnDemandCorpora::new(raw, rules, &corpora);
    let patterns = FieldPatterns::compile(&rules.general);

    let outcomes: Vec<Outcome> = rules
        .issues
        .par_iter()
        .map(|(name, issue)| {
            let content = process::issue_content(&issue.processes, &corpora, &on_demand);
            classify(name, issue, &content, &patterns)
        })
        .collect();

    let mut issues = BTreeMap::new();
    let mut grouped = BTreeMap::new();
    let mut flat = BTreeMap::new();
    let mut rendered: Vec<String> = Vec::new();
    for outcome in outcomes {
        rendered.extend(outcome.rendered_fields);
        match outcome.detail {
            Detail::Grouped(g) => {
                grouped.insert(outcome.name.clone(), g);
            }
            Detail::Flat(f) => {
                flat.insert(outcome.name.clone(), f);
            }
            Detail::Unusable => {}
        }
        issues.insert(outcome.name, outcome.summary);
    }

    let header = fields::header(&rules.general, rendered.iter().map(String::as_str));
    let ordered_issues = priority::order_issues(rules.issues.keys().map(String::as_str), &rules.priority);
    tracing::info!(
        file = %log.file_name,
        issues = issues.len(),
        grouped = grouped.len(),
        flat = flat.len(),
        corpora = corpora.len(),
        on_demand = on_demand.len(),
        "analysis complete"
    );

    Analysis {
        report: Report {
            file_name: log.file_name.clone(),
            raw_log: log.content.clone(),
            process_corpora: corpora,
            header,
            ordered_issues,
            issues,
            platform: log.platform.clone(),
        },
        grouped,
        flat,
        warnings: rules.warnings.clone(),
    }
}

fn classify(name: &str, issue: &IssueRule, content: &str, patterns: &FieldPatterns) -> Outcome {
    let mut summary = IssueSummary::new();
    let mut rendered_fields = Vec::new();
    let Some(re) = rules::compile_opt(issue.pattern.as_deref(), name) else {
        return Outcome { name: name.to_string(), summary, detail: Detail::Unusable, rendered_fields };
    };

    let detail = match issue.mode {
        IssueMode::Group => {
            summary.insert("Details".into(), "grouped".into());
            let grouping = if content.is_empty() {
                grouping::Grouping { issue: GroupedIssue::default(), last_match: None }
            } else {
                grouping::group_lines(&re, content)
            };
            summary.insert("Number".into(), grouping.issue.total().to_string());
            if let Some(line) = grouping.last_match {
                rendered_fields = patterns.fill(&mut summary, issue, content, line, line);
            }
            Detail::Grouped(grouping.issue)
        }
        IssueMode::Flat => {
            summary.insert("Details".into(), "flat".into());
            let found = if content.is_empty() { FlatIssue::default() } else { flat::filter(&re, content) };
            summary.insert("Number".into(), found.total().to_string());
            if let (Some(first), Some(last)) = (found.first(), found.last()) {
                rendered_fields = patterns.fill(&mut summary, issue, &found.joined(), first, last);
            }
            Detail::Flat(found)
        }
    };
    Outcome { name: name.to_string(), summary, detail, rendered_fields }
}

impl Analysis {
    pub fn lines(&self) -> Vec<&str> {
        events::log_lines(&self.report.raw_log)
    }

    pub fn events(&self, rules: &RuleSet) -> EventMap {
        events::correlate(&self.report.raw_log, &rules.important_events)
    }

    /// Detail view of one issue over the raw log.
    ///
    /// Flat issues stop after `Number` highlights; grouped issues highlight
    /// every line that produced one of their tuples.
    pub fn detail_view(&self, rules: &RuleSet, issue: &str) -> Option<DetailView> {
        let lines = self.lines();
        if let Some(found) = self.flat.get(issue) {
            return Some(viewer::reconstruct(&lines, &found.highlights, Some(found.total())));
        }
        let grouped = self.grouped.get(issue)?;
        let rule = rules.issues.get(issue)?;
        let re = rules::compile_opt(rule.pattern.as_deref(), issue)?;
        let processes: Vec<Regex> =
            rule.processes.iter().filter_map(|(name, pattern)| rules::compile(pattern, name)).collect();
        let source = GroupedHighlights { pattern: &re, processes: &processes, issue: grouped };
        Some(viewer::reconstruct(&lines, &source, None))
    }
}
