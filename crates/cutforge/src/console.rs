//! Colorful console output for learning progress.
//!
//! Provides a `tracing` layer that formats `cutforge_learn` events with colors.
//! Enabled with the `console` feature.

use std::io::{self, Write};
use std::sync::OnceLock;

use num_format::{Locale, ToFormattedString};
use owo_colors::OwoColorize;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

static INIT: OnceLock<()> = OnceLock::new();

/// Initializes console output.
///
/// Safe to call multiple times - only the first call has effect. Honors
/// `RUST_LOG` and defaults to `cutforge_learn=info`.
pub fn init() {
    INIT.get_or_init(|| {
        print_banner();

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("cutforge_learn=info"));

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(LearnConsoleLayer)
            .try_init();
    });
}

fn print_banner() {
    let line = format!(
        "cutforge v{} - learned lazy constraints and cuts",
        env!("CARGO_PKG_VERSION")
    );
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{}", line.bright_cyan().bold());
    let _ = stdout.flush();
}

/// A tracing layer that formats learning events with colors.
pub struct LearnConsoleLayer;

impl<S: Subscriber> Layer<S> for LearnConsoleLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if !metadata.target().starts_with("cutforge_learn") {
            return;
        }

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let output = format_learn_event(*metadata.level(), &visitor);
        if !output.is_empty() {
            let _ = writeln!(io::stdout(), "{}", output);
        }
    }
}

#[derive(Default)]
struct EventVisitor {
    message: Option<String>,
    event: Option<String>,
    attr: Option<String>,
    cid: Option<String>,
    categories: Option<u64>,
    known_violations: Option<u64>,
    duration_ms: Option<u64>,
    count: Option<u64>,
    samples: Option<u64>,
    features: Option<u64>,
    targets: Option<u64>,
}

impl EventVisitor {
    fn set_text(&mut self, field: &Field, value: String) {
        match field.name() {
            "message" => self.message = Some(value),
            "event" => self.event = Some(value),
            "attr" => self.attr = Some(value),
            "cid" => self.cid = Some(value),
            _ => {}
        }
    }
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let s = format!("{:?}", value);
        self.set_text(field, s.trim_matches('"').to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        match field.name() {
            "categories" => self.categories = Some(value),
            "known_violations" => self.known_violations = Some(value),
            "duration_ms" => self.duration_ms = Some(value),
            "count" => self.count = Some(value),
            "samples" => self.samples = Some(value),
            "features" => self.features = Some(value),
            "targets" => self.targets = Some(value),
            _ => {}
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_u64(field, value.max(0) as u64);
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.set_text(field, value.to_string());
    }
}

fn format_learn_event(level: Level, v: &EventVisitor) -> String {
    match v.event.as_deref() {
        Some("fit_start") => format_fit_start(v),
        Some("fit_end") => format_fit_end(v),
        Some("enforce_ahead") => format_enforce(v),
        Some("memorizing_fit") => format_memorizing_fit(v),
        Some("violation_metadata_conflict") => format!(
            "{} {} {} metadata of {} differs between samples, keeping the latest",
            timestamp().bright_black(),
            "WARN".yellow(),
            "[Fit]".bright_cyan(),
            v.cid.as_deref().unwrap_or("?").white().bold()
        ),
        Some(_) => String::new(),
        None if level <= Level::INFO => match v.message.as_deref() {
            Some(msg) => format!(
                "{} {} {} {}",
                timestamp().bright_black(),
                level_label(level),
                "[Learn]".bright_cyan(),
                msg
            ),
            None => String::new(),
        },
        None => String::new(),
    }
}

fn level_label(level: Level) -> String {
    match level {
        Level::ERROR => "ERROR".bright_red().to_string(),
        Level::WARN => "WARN".yellow().to_string(),
        _ => "INFO".bright_green().to_string(),
    }
}

fn format_fit_start(v: &EventVisitor) -> String {
    format!(
        "{} {} {} {} fitting ({}) categories over ({}) known constraints",
        timestamp().bright_black(),
        "INFO".bright_green(),
        "[Fit]".bright_cyan(),
        v.attr.as_deref().unwrap_or("?").white().bold(),
        count(v.categories).bright_yellow(),
        count(v.known_violations).bright_yellow()
    )
}

fn format_fit_end(v: &EventVisitor) -> String {
    format!(
        "{} {} {} {} fitted ({}) categories: time spent ({})",
        timestamp().bright_black(),
        "INFO".bright_green(),
        "[Fit]".bright_cyan(),
        v.attr.as_deref().unwrap_or("?").white().bold(),
        count(v.categories).bright_yellow(),
        format_duration_ms(v.duration_ms.unwrap_or(0)).yellow()
    )
}

fn format_enforce(v: &EventVisitor) -> String {
    format!(
        "{} {} {} {} enforcing ({}) constraints ahead of time",
        timestamp().bright_black(),
        "INFO".bright_green(),
        "[Predict]".bright_cyan(),
        v.attr.as_deref().unwrap_or("?").white().bold(),
        count(v.count).bright_magenta().bold()
    )
}

fn format_memorizing_fit(v: &EventVisitor) -> String {
    format!(
        "{} {} {} dataset has ({}) samples, ({}) features and ({}) targets",
        timestamp().bright_black(),
        "INFO".bright_green(),
        "[Memorize]".bright_cyan(),
        count(v.samples).bright_yellow(),
        count(v.features).bright_yellow(),
        count(v.targets).bright_yellow()
    )
}

fn count(value: Option<u64>) -> String {
    value.unwrap_or(0).to_formatted_string(&Locale::en)
}

fn timestamp() -> String {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| {
            let secs = d.as_secs() % 100000;
            let millis = d.subsec_millis();
            format!("{:5}.{:03}", secs, millis)
        })
        .unwrap_or_else(|_| "    0.000".to_string())
}

fn format_duration_ms(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.2}s", ms as f64 / 1000.0)
    } else {
        format!("{}m {}s", ms / 60_000, (ms % 60_000) / 1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_formatting() {
        assert_eq!(format_duration_ms(250), "250ms");
        assert_eq!(format_duration_ms(1500), "1.50s");
        assert_eq!(format_duration_ms(125_000), "2m 5s");
    }

    #[test]
    fn test_fit_end_line() {
        let visitor = EventVisitor {
            event: Some("fit_end".to_string()),
            attr: Some("mip_constr_lazy_enforced".to_string()),
            categories: Some(12_345),
            duration_ms: Some(42),
            ..EventVisitor::default()
        };
        let line = format_learn_event(Level::INFO, &visitor);
        assert!(line.contains("mip_constr_lazy_enforced"));
        assert!(line.contains("12,345"));
        assert!(line.contains("42ms"));
    }

    #[test]
    fn test_plain_message_and_unknown_event() {
        let message = EventVisitor {
            message: Some("Classifiers not fitted. Skipping.".to_string()),
            ..EventVisitor::default()
        };
        assert!(format_learn_event(Level::INFO, &message).contains("Classifiers not fitted"));
        assert!(format_learn_event(Level::DEBUG, &message).is_empty());

        let other = EventVisitor {
            event: Some("fit_category".to_string()),
            ..EventVisitor::default()
        };
        assert!(format_learn_event(Level::DEBUG, &other).is_empty());
    }
}
