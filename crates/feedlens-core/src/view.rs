//! Derived list views over the feedback collection: filter by theme, sort by
//! an enrichment field, cut to a page. Everything here is a pure function of
//! its inputs.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::model::FeedbackItem;

pub const DEFAULT_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    SentimentScore,
    PriorityScore,
    #[default]
    PriorityLevel,
}

impl SortKey {
    pub const ALL: [SortKey; 3] = [
        Self::SentimentScore,
        Self::PriorityScore,
        Self::PriorityLevel,
    ];

    /// Direction a key starts in when first selected.
    pub fn default_direction(self) -> SortDirection {
        match self {
            Self::SentimentScore => SortDirection::Ascending,
            Self::PriorityScore | Self::PriorityLevel => SortDirection::Descending,
        }
    }

    /// Numeric sort value of `item` under this key, `None` when the item has
    /// no score yet. An absent priority level ranks as 0.
    fn value(self, item: &FeedbackItem) -> Option<f64> {
        match self {
            Self::SentimentScore => item.sentiment_score,
            Self::PriorityScore => item.priority_score,
            Self::PriorityLevel => Some(f64::from(item.priority_level.map_or(0, |l| l.rank()))),
        }
    }

    /// Unscored items go after scored ones in either direction. Other keys
    /// treat a missing value as the lowest one.
    fn missing_last(self) -> bool {
        matches!(self, Self::SentimentScore)
    }
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SentimentScore => write!(f, "sentiment_score"),
            Self::PriorityScore => write!(f, "priority_score"),
            Self::PriorityLevel => write!(f, "priority_level"),
        }
    }
}

impl std::str::FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "sentiment_score" | "sentiment" => Ok(Self::SentimentScore),
            "priority_score" => Ok(Self::PriorityScore),
            "priority_level" | "priority" => Ok(Self::PriorityLevel),
            _ => Err(format!("unknown sort key: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

impl std::fmt::Display for SortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ascending => write!(f, "asc"),
            Self::Descending => write!(f, "desc"),
        }
    }
}

impl std::str::FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Ascending),
            "desc" | "descending" => Ok(Self::Descending),
            _ => Err(format!("unknown sort direction: {s}")),
        }
    }
}

/// The consumer's current sort/filter selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewOptions {
    pub filter_text: String,
    pub sort_key: SortKey,
    pub direction: SortDirection,
    pub limit: usize,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self::for_key(SortKey::default())
    }
}

impl ViewOptions {
    /// Options sorted by `key` in its default direction, no filter.
    pub fn for_key(key: SortKey) -> Self {
        Self {
            filter_text: String::new(),
            sort_key: key,
            direction: key.default_direction(),
            limit: DEFAULT_LIMIT,
        }
    }

    pub fn with_filter(mut self, filter_text: impl Into<String>) -> Self {
        self.filter_text = filter_text.into();
        self
    }

    pub fn with_direction(mut self, direction: SortDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Header-click semantics: the current key flips direction, a new key
    /// starts in its default direction.
    pub fn select_sort_key(&mut self, key: SortKey) {
        if key == self.sort_key {
            self.direction = self.direction.toggled();
        } else {
            self.sort_key = key;
            self.direction = key.default_direction();
        }
    }

    /// Trimmed, lowercased filter, or `None` when no filter is active.
    fn needle(&self) -> Option<String> {
        let trimmed = self.filter_text.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_lowercase())
    }
}

/// Result of [`project`]: the visible page plus how many items matched the
/// filter before the limit was applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection<'a> {
    pub items: Vec<&'a FeedbackItem>,
    pub filtered_total: usize,
}

impl Projection<'_> {
    pub fn shown(&self) -> usize {
        self.items.len()
    }

    pub fn is_truncated(&self) -> bool {
        self.items.len() < self.filtered_total
    }
}

/// `true` when some theme of `item` contains the (already lowercased) needle.
fn matches_theme(item: &FeedbackItem, needle: &str) -> bool {
    item.themes
        .iter()
        .any(|theme| theme.to_lowercase().contains(needle))
}

/// Compare two items under `key`.
fn compare(a: &FeedbackItem, b: &FeedbackItem, key: SortKey, direction: SortDirection) -> Ordering {
    let (x, y) = (key.value(a), key.value(b));
    if key.missing_last() {
        match (x, y) {
            (Some(_), None) => return Ordering::Less,
            (None, Some(_)) => return Ordering::Greater,
            _ => {}
        }
    }
    let ascending = match (x, y) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    };
    match direction {
        SortDirection::Ascending => ascending,
        SortDirection::Descending => ascending.reverse(),
    }
}

/// Filter, sort and truncate `items` for display.
///
/// The sort is stable, so items that compare equal keep their collection
/// order and repeated calls on the same input give the same output.
pub fn project<'a>(items: &'a [FeedbackItem], options: &ViewOptions) -> Projection<'a> {
    let mut selected: Vec<&FeedbackItem> = match options.needle() {
        Some(needle) => items
            .iter()
            .filter(|item| matches_theme(item, &needle))
            .collect(),
        None => items.iter().collect(),
    };

    selected.sort_by(|a, b| compare(a, b, options.sort_key, options.direction));

    let filtered_total = selected.len();
    selected.truncate(options.limit);

    Projection {
        items: selected,
        filtered_total,
    }
}
