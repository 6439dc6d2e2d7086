use anyhow::{bail, Context};
use clap::Parser;
use logsift::ingest::{self, LogFile, RuleFile};
use logsift::viewer;
use std::path::PathBuf;
use std::sync::Once;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

fn init_parallelism(threads: Option<usize>) {
    static START: Once = Once::new();
    START.call_once(|| {
        let n = threads.filter(|&n| n > 0).unwrap_or_else(num_cpus::get);
        let _ = rayon::ThreadPoolBuilder::new().num_threads(n).build_global();
    });
}

fn init_tracing(format: &str) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(env_filter);
    match format {
        "json" => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
            .map_err(|e| anyhow::anyhow!("failed to initialize JSON tracing subscriber: {}", e)),
        "text" => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
            .map_err(|e| anyhow::anyhow!("failed to initialize text tracing subscriber: {}", e)),
        other => bail!("unknown log format '{}', expected 'text' or 'json'", other),
    }
}

#[derive(Parser, Debug)]
#[command(name = "logsift", version, about = "Rule-driven log issue classifier")]
struct Cli {
    /// Log file to analyze (.txt, .log or .gz)
    input: PathBuf,

    /// YAML rule document
    #[arg(long = "rules")]
    rules: PathBuf,

    /// Platform identifier used for level extraction
    #[arg(long = "platform")]
    platform: Option<String>,

    /// YAML platform level document (LogLevels, LevelLetter, LevelRegex)
    #[arg(long = "platform-config")]
    platform_config: Option<PathBuf>,

    /// Print only a specific view: report | events | details | window | range | levels
    #[arg(long = "only")]
    only: Option<String>,

    /// Issue name (when --only details)
    #[arg(long = "issue")]
    issue: Option<String>,

    // Line bounds, inclusive (when --only window | range)
    #[arg(long = "start", default_value_t = 0)] start: usize,
    #[arg(long = "end")] end: Option<usize>,

    /// Log level name (when --only levels); omit to list the platform's levels
    #[arg(long = "level")]
    level: Option<String>,

    /// Worker threads (defaults to the number of CPUs)
    #[arg(long = "threads")]
    threads: Option<usize>,

    /// Diagnostic log format on stderr: text | json
    #[arg(long = "log-format", default_value = "text")]
    log_format: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_format)?;
    init_parallelism(cli.threads);

    let log = LogFile::new(&cli.input).with_platform(cli.platform.clone());
    let rules = RuleFile::new(&cli.rules);
    let (analysis, rules) = ingest::analyze_sources(&log, &rules)
        .with_context(|| format!("analyzing {}", cli.input.display()))?;
    let lines = analysis.lines();
    let end = cli.end.unwrap_or_else(|| lines.len().saturating_sub(1));

    match cli.only.as_deref() {
        None => println!("{}", serde_json::to_string_pretty(&analysis)?),
        Some("report") => println!("{}", serde_json::to_string_pretty(&analysis.report)?),
        Some("events") => {
            let events = analysis.events(&rules);
            let out = serde_json::json!({
                "EventMap": &events,
                "EventLines": events.event_lines(&lines),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Some("details") => {
            let Some(issue) = cli.issue.as_deref() else { bail!("--only details requires --issue") };
            let Some(view) = analysis.detail_view(&rules, issue) else {
                bail!("no detail view for issue '{}'", issue)
            };
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        Some("window") => {
            let events = analysis.events(&rules);
            let segments = viewer::window(&lines, cli.start, end, &events);
            println!("{}", serde_json::to_string_pretty(&segments)?);
        }
        Some("range") => {
            let text = viewer::line_range(&lines, cli.start, end);
            let out = serde_json::json!({ "Start": cli.start, "End": end, "Text": text });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Some("levels") => {
            let Some(platform) = cli.platform.as_deref() else { bail!("--only levels requires --platform") };
            let Some(path) = cli.platform_config.as_deref() else {
                bail!("--only levels requires --platform-config")
            };
            let platforms = ingest::load_platforms(path)?;
            let out = match cli.level.as_deref() {
                Some(level) => serde_json::json!({
                    "Level": level,
                    "Lines": platforms.level_lines(platform, level, &analysis.report.raw_log),
                }),
                None => serde_json::json!({ "Levels": platforms.levels(platform) }),
            };
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Some(other) => bail!("unknown view '{}', expected report | events | details | window | range | levels", other),
    }
    Ok(())
}
