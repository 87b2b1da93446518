use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ledger::{ActivityCategory, ActivityLog, EntryMode};

/// A proposed log entry derived from a free-text description.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActivitySuggestion {
    pub description: String,
    pub points: i64,
    #[serde(default)]
    pub category: Option<ActivityCategory>,
}

impl ActivitySuggestion {
    /// Turns the suggestion into an entry, forcing the sign to match `mode`.
    /// `None` when the suggested points cannot carry that sign.
    pub fn into_entry(self, child_id: Uuid, mode: EntryMode) -> Option<ActivityLog> {
        ActivityLog::with_mode(child_id, self.description, self.points, mode, self.category)
    }
}

pub trait ActivitySuggester {
    /// Returns `None` when nothing sensible can be suggested.
    fn suggest(&self, text: &str) -> Option<ActivitySuggestion>;
}

/// Suggests from previously logged entries with a similar description.
#[derive(Debug, Clone, Default)]
pub struct PastEntrySuggester {
    entries: Vec<ActivityLog>,
}

impl PastEntrySuggester {
    const MIN_SIMILARITY: f64 = 0.6;

    pub fn new(entries: impl IntoIterator<Item = ActivityLog>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }
}

impl ActivitySuggester for PastEntrySuggester {
    fn suggest(&self, text: &str) -> Option<ActivitySuggestion> {
        let wanted = text.trim().to_lowercase();
        if wanted.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .filter(|entry| entry.category != ActivityCategory::Investment)
            .map(|entry| {
                let score =
                    strsim::normalized_levenshtein(&wanted, &entry.description.to_lowercase());
                (score, entry)
            })
            .filter(|(score, _)| *score >= Self::MIN_SIMILARITY)
            .max_by(|a, b| {
                a.0.total_cmp(&b.0)
                    .then(a.1.timestamp.cmp(&b.1.timestamp))
            })
            .map(|(_, entry)| ActivitySuggestion {
                description: entry.description.clone(),
                points: entry.points.saturating_abs(),
                category: Some(entry.category),
            })
    }
}
