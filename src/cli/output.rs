//! Output formatting for CLI commands
//!
//! Provides utilities for formatting command output in human-readable
//! form. Supports colored output (respects NO_COLOR env var).

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Color scheme for CLI output
pub mod colors {
    use colored::{ColoredString, Colorize};

    /// Style for labels/headers
    pub fn label(s: &str) -> ColoredString {
        s.bold()
    }

    /// Style for breadcrumbs and section titles
    pub fn title(s: &str) -> ColoredString {
        s.cyan()
    }

    /// Style for URLs
    pub fn link(s: &str) -> ColoredString {
        s.blue().underline()
    }

    /// Style for file paths
    pub fn file_path(s: &str) -> ColoredString {
        s.blue()
    }

    /// Style for numbers/counts
    pub fn number(s: &str) -> ColoredString {
        s.yellow()
    }

    /// Style for success messages
    pub fn success(s: &str) -> ColoredString {
        s.green()
    }

    /// Style for warning messages
    pub fn warning(s: &str) -> ColoredString {
        s.yellow()
    }

    /// Style for error messages
    pub fn error(s: &str) -> ColoredString {
        s.red().bold()
    }

    /// Style for dim/secondary text
    pub fn dim(s: &str) -> ColoredString {
        s.dimmed()
    }

    /// Style for rank numbers
    pub fn rank(s: &str) -> ColoredString {
        s.green().bold()
    }
}

/// Cut `line` to at most `width` characters, marking the cut with "..."
pub fn truncate_chars(line: &str, width: usize) -> String {
    if line.chars().count() <= width {
        return line.to_string();
    }
    let kept: String = line.chars().take(width.saturating_sub(3)).collect();
    format!("{kept}...")
}

/// Elapsed time as "250ms", "2.00s" or "1m 5.5s"
pub fn format_elapsed(elapsed: Duration) -> String {
    let ms = elapsed.as_millis();
    if ms < 1000 {
        return format!("{ms}ms");
    }

    let secs = elapsed.as_secs_f64();
    if secs < 60.0 {
        format!("{secs:.2}s")
    } else {
        let mins = elapsed.as_secs() / 60;
        format!("{mins}m {:.1}s", secs - (mins * 60) as f64)
    }
}

pub fn format_elapsed_colored(elapsed: Duration) -> String {
    format!("{}", colors::number(&format_elapsed(elapsed)))
}

/// Age of `timestamp` relative to `now` ("just now", "5m ago",
/// "3h ago", "8d ago")
pub fn format_age_at(timestamp: &DateTime<Utc>, now: DateTime<Utc>) -> String {
    let age = now.signed_duration_since(*timestamp);
    if age.num_seconds() < 0 {
        return "in the future".to_string();
    }

    match (age.num_days(), age.num_hours(), age.num_minutes()) {
        (d, _, _) if d > 0 => format!("{d}d ago"),
        (_, h, _) if h > 0 => format!("{h}h ago"),
        (_, _, m) if m > 0 => format!("{m}m ago"),
        _ => "just now".to_string(),
    }
}

pub fn format_age(timestamp: &DateTime<Utc>) -> String {
    format_age_at(timestamp, Utc::now())
}

/// Age with the absolute timestamp dimmed alongside
pub fn format_age_colored(timestamp: &DateTime<Utc>) -> String {
    format!(
        "{} {}",
        format_age(timestamp),
        colors::dim(&format!("({})", timestamp.format("%Y-%m-%d %H:%M UTC")))
    )
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{}", colors::success(message));
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("{}: {}", colors::warning("Warning"), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{}: {}", colors::error("Error"), message);
}
