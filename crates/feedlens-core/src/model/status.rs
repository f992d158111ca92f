use serde::{Deserialize, Serialize};

/// The unit of granularity for loading and error tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Feedback,
    Insights,
    Submitting,
}

impl Category {
    pub const ALL: [Category; 3] = [Self::Feedback, Self::Insights, Self::Submitting];
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Feedback => write!(f, "feedback"),
            Self::Insights => write!(f, "insights"),
            Self::Submitting => write!(f, "submitting"),
        }
    }
}

/// In-flight flag plus the last error of one operation category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationStatus {
    pub in_flight: bool,
    pub error: Option<String>,
}

impl OperationStatus {
    pub(crate) fn begin(&mut self) {
        self.in_flight = true;
        self.error = None;
    }

    pub(crate) fn finish(&mut self, error: Option<String>) {
        self.in_flight = false;
        self.error = error;
    }
}

/// The three per-category statuses, kept side by side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusBoard {
    pub feedback: OperationStatus,
    pub insights: OperationStatus,
    pub submitting: OperationStatus,
}

impl StatusBoard {
    pub fn get(&self, category: Category) -> &OperationStatus {
        match category {
            Category::Feedback => &self.feedback,
            Category::Insights => &self.insights,
            Category::Submitting => &self.submitting,
        }
    }

    pub(crate) fn get_mut(&mut self, category: Category) -> &mut OperationStatus {
        match category {
            Category::Feedback => &mut self.feedback,
            Category::Insights => &mut self.insights,
            Category::Submitting => &mut self.submitting,
        }
    }

    pub fn any_in_flight(&self) -> bool {
        Category::ALL.iter().any(|c| self.get(*c).in_flight)
    }
}
