use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::feedback::{null_as_empty, wire_time};

/// One of the most positive or most negative pieces of feedback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentHighlight {
    pub feedback: String,
    pub sentiment_score: f64,
    #[serde(default, deserialize_with = "wire_time::deserialize_option")]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeCount {
    pub theme: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub recommendation: String,
    pub priority: String,
}

/// Aggregate analytics over every scored feedback item. Always replaced as a
/// whole, never merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsightsSnapshot {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub top_positive: Vec<SentimentHighlight>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub top_negative: Vec<SentimentHighlight>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub themes: Vec<ThemeCount>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub recommendations: Vec<Recommendation>,
}

impl InsightsSnapshot {
    pub fn is_empty(&self) -> bool {
        self.top_positive.is_empty()
            && self.top_negative.is_empty()
            && self.themes.is_empty()
            && self.recommendations.is_empty()
    }
}
