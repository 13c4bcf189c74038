//! Colorful console output for logic tree builds.
//!
//! Provides a custom `tracing` layer that formats engine events with colors.
//!
//! ## Log Levels
//!
//! - **INFO**: Build start and end with tree size
//! - **DEBUG**: Branching levels, scanned source models, skipped branchsets
//! - **TRACE**: Individual realizations

use num_format::{Locale, ToFormattedString};
use owo_colors::OwoColorize;
use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::Instant;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

static INIT: OnceLock<()> = OnceLock::new();
static EPOCH: OnceLock<Instant> = OnceLock::new();
static BUILD_START_NANOS: AtomicU64 = AtomicU64::new(0);

/// Package version for banner display.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Target prefix of the events this layer formats.
const ENGINE_TARGET: &str = "logictree_engine";

/// Initializes the console output.
///
/// Safe to call multiple times - only the first call has effect.
/// Prints the banner and sets up tracing. `RUST_LOG` overrides the default
/// `logictree_engine=info` filter.
pub fn init() {
    INIT.get_or_init(|| {
        print_banner();

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("{ENGINE_TARGET}=info")));

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(LogicTreeConsoleLayer)
            .try_init();
    });
}

// Marks the start of a build for elapsed time tracking.
fn mark_build_start() {
    let epoch = EPOCH.get_or_init(Instant::now);
    let nanos = epoch.elapsed().as_nanos() as u64;
    BUILD_START_NANOS.store(nanos, Ordering::Relaxed);
}

// Returns elapsed time since the last build start.
fn elapsed_secs() -> f64 {
    let Some(epoch) = EPOCH.get() else {
        return 0.0;
    };
    let start_nanos = BUILD_START_NANOS.load(Ordering::Relaxed);
    let now_nanos = epoch.elapsed().as_nanos() as u64;
    now_nanos.saturating_sub(start_nanos) as f64 / 1_000_000_000.0
}

fn print_banner() {
    let banner = r#"
 _                _      _
| |    ___   __ _(_) ___| |_ _ __ ___  ___
| |   / _ \ / _` | |/ __| __| '__/ _ \/ _ \
| |__| (_) | (_| | | (__| |_| | |  __/  __/
|_____\___/ \__, |_|\___|\__|_|  \___|\___|
            |___/
"#;

    let version_line = format!("          v{} - Hazard Logic Trees\n", VERSION);

    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{}", banner.bright_cyan());
    let _ = writeln!(stdout, "{}", version_line.bright_white().bold());
    let _ = stdout.flush();
}

/// A tracing layer that formats logic tree events with colors.
pub struct LogicTreeConsoleLayer;

impl<S: Subscriber> Layer<S> for LogicTreeConsoleLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if !metadata.target().starts_with(ENGINE_TARGET) {
            return;
        }

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let output = format_event(&visitor, *metadata.level());
        if !output.is_empty() {
            let _ = writeln!(io::stdout(), "{}", output);
        }
    }
}

#[derive(Default)]
struct EventVisitor {
    event: Option<String>,
    kind: Option<String>,
    filename: Option<String>,
    validate: Option<bool>,
    branchsets: Option<u64>,
    branches: Option<u64>,
    depth: Option<u64>,
    level: Option<String>,
    open_ends: Option<u64>,
    source_model: Option<String>,
    sources: Option<u64>,
    branchset: Option<String>,
    line: Option<u64>,
    mode: Option<String>,
    path: Option<String>,
}

impl EventVisitor {
    fn record_text(&mut self, field: &Field, value: String) {
        match field.name() {
            "event" => self.event = Some(value),
            "kind" => self.kind = Some(value),
            "filename" => self.filename = Some(value),
            "level" => self.level = Some(value),
            "source_model" => self.source_model = Some(value),
            "branchset" => self.branchset = Some(value),
            "mode" => self.mode = Some(value),
            "path" => self.path = Some(value),
            _ => {}
        }
    }
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let s = format!("{:?}", value);
        self.record_text(field, s.trim_matches('"').to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        match field.name() {
            "branchsets" => self.branchsets = Some(value),
            "branches" => self.branches = Some(value),
            "depth" => self.depth = Some(value),
            "open_ends" => self.open_ends = Some(value),
            "sources" => self.sources = Some(value),
            "line" => self.line = Some(value),
            _ => {}
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_u64(field, value as u64);
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        if field.name() == "validate" {
            self.validate = Some(value);
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.record_text(field, value.to_string());
    }
}

fn format_event(v: &EventVisitor, level: Level) -> String {
    let event = v.event.as_deref().unwrap_or("");

    match event {
        "build_start" => format_build_start(v),
        "build_end" => format_build_end(v),
        "branching_level" => format_branching_level(v),
        "source_model_scanned" => format_source_model_scanned(v),
        "branchset_skipped" => format_branchset_skipped(v),
        "realization" => format_realization(v, level),
        _ => String::new(),
    }
}

fn format_elapsed() -> String {
    format!("{:>7.3}s", elapsed_secs())
        .bright_black()
        .to_string()
}

fn count(n: u64) -> String {
    n.to_formatted_string(&Locale::en)
}

fn format_build_start(v: &EventVisitor) -> String {
    mark_build_start();
    let kind = v.kind.as_deref().unwrap_or("logic");
    let filename = v.filename.as_deref().unwrap_or("?");

    let mut output = format!(
        "{} {} Building {} tree │ {}",
        format_elapsed(),
        "▶".bright_green().bold(),
        kind.white().bold(),
        filename.bright_yellow()
    );
    if v.validate == Some(false) {
        output.push_str(&format!(" │ {}", "validation off".yellow()));
    }
    output
}

fn format_build_end(v: &EventVisitor) -> String {
    let kind = v.kind.as_deref().unwrap_or("logic");

    format!(
        "{} {} Built {} tree │ {} branchsets │ {} branches │ depth {}",
        format_elapsed(),
        "■".bright_cyan().bold(),
        kind.white().bold(),
        count(v.branchsets.unwrap_or(0)).bright_yellow(),
        count(v.branches.unwrap_or(0)).bright_yellow(),
        count(v.depth.unwrap_or(0)).bright_magenta()
    )
}

fn format_branching_level(v: &EventVisitor) -> String {
    let level = v.level.as_deref().unwrap_or("?");

    format!(
        "{} {} Level {} │ {} open ends",
        format_elapsed(),
        "◆".bright_blue(),
        level.white().bold(),
        count(v.open_ends.unwrap_or(0)).bright_magenta()
    )
}

fn format_source_model_scanned(v: &EventVisitor) -> String {
    let source_model = v.source_model.as_deref().unwrap_or("?");

    format!(
        "{} {} Scanned {} │ {} sources",
        format_elapsed(),
        "⚡".bright_cyan(),
        source_model.white(),
        count(v.sources.unwrap_or(0)).bright_yellow()
    )
}

fn format_branchset_skipped(v: &EventVisitor) -> String {
    let branchset = v.branchset.as_deref().unwrap_or("?");

    let mut output = format!(
        "{} {} Skipped branchset {}",
        format_elapsed(),
        "↷".yellow(),
        branchset.white()
    );
    if let Some(line) = v.line {
        output.push_str(&format!(" │ line {}", line));
    }
    output
}

fn format_realization(v: &EventVisitor, level: Level) -> String {
    if level != Level::TRACE {
        return String::new();
    }

    let mode = v.mode.as_deref().unwrap_or("enumerate");
    let path = v.path.as_deref().unwrap_or("");
    let icon = if mode == "sample" {
        "◇".bright_magenta().to_string()
    } else {
        "✓".bright_green().to_string()
    };

    format!(
        "{} {} {:<9} │ {}",
        format_elapsed(),
        icon,
        mode.bright_black(),
        path.bright_black()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn visitor(event: &str) -> EventVisitor {
        EventVisitor {
            event: Some(event.to_string()),
            ..EventVisitor::default()
        }
    }

    #[test]
    fn test_build_end_counts_are_grouped() {
        let v = EventVisitor {
            kind: Some("gmpe".to_string()),
            branchsets: Some(12),
            branches: Some(1_234),
            depth: Some(3),
            ..visitor("build_end")
        };
        let output = format_event(&v, Level::INFO);
        assert!(output.contains("gmpe"));
        assert!(output.contains("1,234"));
        assert!(output.contains("branchsets"));
    }

    #[test]
    fn test_build_start_mentions_disabled_validation() {
        let v = EventVisitor {
            filename: Some("lt.xml".to_string()),
            validate: Some(false),
            ..visitor("build_start")
        };
        let output = format_event(&v, Level::INFO);
        assert!(output.contains("lt.xml"));
        assert!(output.contains("validation off"));
    }

    #[test]
    fn test_realization_only_at_trace() {
        let v = EventVisitor {
            mode: Some("sample".to_string()),
            path: Some("b1,b3".to_string()),
            ..visitor("realization")
        };
        assert!(format_event(&v, Level::DEBUG).is_empty());
        assert!(format_event(&v, Level::TRACE).contains("b1,b3"));
    }

    #[test]
    fn test_skipped_branchset_line() {
        let v = EventVisitor {
            branchset: Some("bs4".to_string()),
            line: Some(17),
            ..visitor("branchset_skipped")
        };
        let output = format_event(&v, Level::DEBUG);
        assert!(output.contains("bs4"));
        assert!(output.contains("line 17"));
    }

    #[test]
    fn test_unknown_event_is_silent() {
        assert!(format_event(&visitor("other"), Level::INFO).is_empty());
        assert!(format_event(&EventVisitor::default(), Level::INFO).is_empty());
    }
}
