use flate2::write::GzEncoder;
use flate2::Compression;
use logsift::error::IngestError;
use logsift::ingest::{analyze_sources, load_platforms, LogFile, RuleFile, RuleText};
use std::io::Write;

const RULES: &str = r#"
SpecificProcess:
  radio: "^.*radio:.*$"
Issues:
  SignalLost:
    detailing_mode: group
    grouping: "radio: (\\w+) lost signal on band (\\d+)"
    specific_process:
      radio: "^.*radio:.*$"
ImportantEvents:
  Airplane: "airplane mode"
"#;

const LOG: &str = "\
08:00:00 I radio: modem up
08:00:01 E radio: lte lost signal on band 7
08:00:02 I system: airplane mode on
08:00:03 E radio: lte lost signal on band 7
08:00:04 E radio: nr lost signal on band 78
";

fn gzip(text: &str) -> Vec<u8> {
    let mut enc = GzEncoder::new(Vec::new(), Compression::default());
    enc.write_all(text.as_bytes()).unwrap();
    enc.finish().unwrap()
}

#[test]
fn analyzes_gzip_log_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("bugreport.txt.gz");
    let rules_path = dir.path().join("rules.yml");
    std::fs::write(&log_path, gzip(LOG)).unwrap();
    std::fs::write(&rules_path, RULES).unwrap();

    let log = LogFile::new(&log_path).with_platform(Some("android".into()));
    let (analysis, rules) = analyze_sources(&log, &RuleFile::new(&rules_path)).unwrap();
    let report = &analysis.report;
    assert_eq!(report.file_name, "bugreport.txt.gz");
    assert_eq!(report.raw_log, LOG);
    assert_eq!(report.issues["SignalLost"]["Number"], "3");
    let grouped = &analysis.grouped["SignalLost"];
    assert_eq!(grouped.group_content["lte"], vec![vec!["7".to_string()]]);
    assert_eq!(grouped.group_count["lte"], vec![2]);
    assert_eq!(grouped.group_content["nr"], vec![vec!["78".to_string()]]);

    let events = analysis.events(&rules);
    assert_eq!(events.get(2), Some("Airplane"));
    assert_eq!(events.line_count, 6);
}

#[test]
fn grouped_detail_view_highlights_contributing_lines() {
    let log = logsift::ingest::RawLog::new("mem.txt", LOG);
    let (analysis, rules) = analyze_sources(&log, &RuleText::new("inline", RULES)).unwrap();
    let view = analysis.detail_view(&rules, "SignalLost").unwrap();
    let highlighted: Vec<usize> = view
        .segments
        .iter()
        .filter_map(|s| match s {
            logsift::viewer::Segment::Highlight { line, .. } => Some(*line),
            _ => None,
        })
        .collect();
    assert_eq!(highlighted, vec![1, 3, 4]);
    assert_eq!(view.next_line, None);
}

#[test]
fn unsupported_extension_yields_no_report() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("bugreport.zip");
    std::fs::write(&log_path, LOG).unwrap();
    let err = analyze_sources(&LogFile::new(&log_path), &RuleText::new("inline", RULES)).unwrap_err();
    assert!(matches!(err, IngestError::InvalidFormat(ref name) if name == "bugreport.zip"));
    assert!(err.to_string().contains("unsupported log format"));
}

#[test]
fn broken_rule_document_yields_no_report() {
    let log = logsift::ingest::RawLog::new("mem.txt", LOG);
    let err = analyze_sources(&log, &RuleText::new("inline", "Issues: [1, 2")).unwrap_err();
    assert!(matches!(err, IngestError::Decode { .. }));
}

#[test]
fn platform_levels_filter_raw_log() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("platforms.yml");
    std::fs::write(
        &path,
        "LogLevels:\n  android: [Error, Info]\nLevelLetter:\n  android:\n    Error: E\n    Info: I\nLevelRegex:\n  android:\n    Start: \"^.*\\\\s\"\n    End: \"\\\\s.*$\"\n",
    )
    .unwrap();
    let platforms = load_platforms(&path).unwrap();
    assert_eq!(platforms.levels("android"), ["Error".to_string(), "Info".to_string()]);
    let errors = platforms.level_lines("android", "Error", LOG).unwrap();
    assert_eq!(errors.lines().count(), 3);
    assert!(errors.lines().all(|l| l.contains(" E ")));
}
