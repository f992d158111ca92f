//! Plain-text formatting shared by the subcommands. Coloring happens at the
//! call site.

use chrono::{DateTime, Utc};
use feedlens_core::model::FeedbackItem;

pub const PROCESSING: &str = "processing";

/// Sentiment bucket used for coloring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Positive,
    Neutral,
    Negative,
}

pub fn tone(score: f64) -> Tone {
    if score > 0.1 {
        Tone::Positive
    } else if score < -0.1 {
        Tone::Negative
    } else {
        Tone::Neutral
    }
}

/// `+0.50`, `-0.25`, `+0.00`
pub fn signed_score(score: f64) -> String {
    format!("{score:+.2}")
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {unit}")
    } else {
        format!("{n} {unit}s")
    }
}

pub fn relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - then).num_minutes();
    if minutes < 1 {
        "Just now".to_string()
    } else if minutes < 60 {
        format!("{} ago", plural(minutes, "minute"))
    } else if minutes < 24 * 60 {
        format!("{} ago", plural(minutes / 60, "hour"))
    } else {
        then.format("%Y-%m-%d %H:%M").to_string()
    }
}

pub fn sentiment_cell(item: &FeedbackItem) -> String {
    item.sentiment_score
        .map(signed_score)
        .unwrap_or_else(|| PROCESSING.to_string())
}

pub fn priority_cell(item: &FeedbackItem) -> String {
    item.priority_level
        .map(|level| level.to_string())
        .unwrap_or_else(|| PROCESSING.to_string())
}

pub fn themes_cell(item: &FeedbackItem) -> String {
    if item.themes.is_empty() {
        "-".to_string()
    } else {
        item.themes.join(", ")
    }
}

pub fn showing(shown: usize, total: usize) -> String {
    format!("Showing {shown} of {total}")
}

/// Cut `s` to at most `max` characters, marking the cut with `...`.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}
