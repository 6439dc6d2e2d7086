use crate::classifier::{self, Analysis};
use crate::error::IngestError;
use crate::platform::PlatformLevels;
use crate::rules::RuleSet;
use flate2::read::GzDecoder;
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLog {
    pub file_name: String,
    pub content: String,
    pub platform: Option<String>,
}

impl RawLog {
    pub fn new(file_name: &str, content: &str) -> Self {
        Self { file_name: file_name.to_string(), content: content.to_string(), platform: None }
    }

    pub fn with_platform(mut self, platform: &str) -> Self {
        self.platform = Some(platform.to_string());
        self
    }
}

pub trait RawLogProvider {
    fn fetch(&self) -> Result<RawLog, IngestError>;
}

pub trait RuleSetProvider {
    fn rules(&self) -> Result<RuleSet, IngestError>;
}

impl RawLogProvider for RawLog {
    fn fetch(&self) -> Result<RawLog, IngestError> {
        Ok(self.clone())
    }
}

/// A log file on disk: `.txt`/`.log` read as text, `.gz` decompressed first.
#[derive(Debug, Clone)]
pub struct LogFile {
    pub path: PathBuf,
    pub platform: Option<String>,
}

impl LogFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), platform: None }
    }

    pub fn with_platform(mut self, platform: Option<String>) -> Self {
        self.platform = platform;
        self
    }
}

impl RawLogProvider for LogFile {
    fn fetch(&self) -> Result<RawLog, IngestError> {
        let shown = self.path.display().to_string();
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| shown.clone());
        let bytes = std::fs::read(&self.path).map_err(|e| IngestError::io(&shown, e))?;
        let bytes = match extension(&self.path).as_deref() {
            Some("gz") => {
                let mut out = Vec::new();
                GzDecoder::new(bytes.as_slice()).read_to_end(&mut out).map_err(|e| IngestError::io(&shown, e))?;
                out
            }
            Some("txt") | Some("log") => bytes,
            _ => return Err(IngestError::InvalidFormat(file_name)),
        };
        let content = String::from_utf8(bytes).map_err(|_| IngestError::NotUtf8(shown.clone()))?;
        tracing::debug!(file = %shown, bytes = content.len(), "loaded raw log");
        Ok(RawLog { file_name, content, platform: self.platform.clone() })
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension().map(|e| e.to_string_lossy().to_ascii_lowercase())
}

/// A YAML rule document on disk.
#[derive(Debug, Clone)]
pub struct RuleFile {
    pub path: PathBuf,
}

impl RuleFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RuleSetProvider for RuleFile {
    fn rules(&self) -> Result<RuleSet, IngestError> {
        let shown = self.path.display().to_string();
        let text = std::fs::read_to_string(&self.path).map_err(|e| IngestError::io(&shown, e))?;
        RuleSet::from_yaml(&text, &shown)
    }
}

/// A YAML rule document held in memory.
#[derive(Debug, Clone)]
pub struct RuleText {
    pub name: String,
    pub yaml: String,
}

impl RuleText {
    pub fn new(name: &str, yaml: &str) -> Self {
        Self { name: name.to_string(), yaml: yaml.to_string() }
    }
}

impl RuleSetProvider for RuleText {
    fn rules(&self) -> Result<RuleSet, IngestError> {
        RuleSet::from_yaml(&self.yaml, &self.name)
    }
}

/// Reads a platform level document from disk.
pub fn load_platforms(path: &Path) -> Result<PlatformLevels, IngestError> {
    let shown = path.display().to_string();
    let text = std::fs::read_to_string(path).map_err(|e| IngestError::io(&shown, e))?;
    PlatformLevels::from_yaml(&text, &shown)
}

/// Fetches the log and the rule set, then analyzes them.
pub fn analyze_sources(
    log: &impl RawLogProvider,
    rules: &impl RuleSetProvider,
) -> Result<(Analysis, RuleSet), IngestError> {
    let log = log.fetch()?;
    let rules = rules.rules()?;
    let analysis = classifier::analyze(&log, &rules);
    Ok((analysis, rules))
}
