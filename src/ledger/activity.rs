use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum ActivityCategory {
    #[default]
    Chore,
    Behavior,
    Redemption,
    Investment,
    Other,
}

impl ActivityCategory {
    pub const ALL: [ActivityCategory; 5] = [
        ActivityCategory::Chore,
        ActivityCategory::Behavior,
        ActivityCategory::Redemption,
        ActivityCategory::Investment,
        ActivityCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityCategory::Chore => "chore",
            ActivityCategory::Behavior => "behavior",
            ActivityCategory::Redemption => "redemption",
            ActivityCategory::Investment => "investment",
            ActivityCategory::Other => "other",
        }
    }
}

impl fmt::Display for ActivityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityCategory {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        ActivityCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == normalized)
            .ok_or_else(|| format!("unknown category `{}`", value))
    }
}

/// Whether an entry adds points or spends them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryMode {
    Earn,
    Redeem,
}

impl EntryMode {
    /// Infers the mode of an existing entry from the sign of its points.
    pub fn of(points: i64) -> Self {
        if points >= 0 {
            EntryMode::Earn
        } else {
            EntryMode::Redeem
        }
    }

    /// Applies the mode's polarity to a magnitude. `None` for `i64::MIN`,
    /// which has no positive counterpart.
    pub fn signed(&self, points: i64) -> Option<i64> {
        let magnitude = points.checked_abs()?;
        Some(match self {
            EntryMode::Earn => magnitude,
            EntryMode::Redeem => -magnitude,
        })
    }

    pub fn default_category(&self) -> ActivityCategory {
        match self {
            EntryMode::Earn => ActivityCategory::Chore,
            EntryMode::Redeem => ActivityCategory::Redemption,
        }
    }
}

/// A single point-changing event. Positive points are earned, negative are spent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLog {
    pub id: Uuid,
    pub child_id: Uuid,
    pub description: String,
    pub points: i64,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub category: ActivityCategory,
}

impl ActivityLog {
    pub fn new(
        child_id: Uuid,
        description: impl Into<String>,
        points: i64,
        category: ActivityCategory,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            child_id,
            description: description.into(),
            points,
            timestamp: Utc::now(),
            category,
        }
    }

    /// Builds an entry whose sign follows `mode`, or `None` when `points`
    /// cannot be signed.
    pub fn with_mode(
        child_id: Uuid,
        description: impl Into<String>,
        points: i64,
        mode: EntryMode,
        category: Option<ActivityCategory>,
    ) -> Option<Self> {
        Some(Self::new(
            child_id,
            description,
            mode.signed(points)?,
            category.unwrap_or_else(|| mode.default_category()),
        ))
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn mode(&self) -> EntryMode {
        EntryMode::of(self.points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn redeem_mode_always_stores_negative_points() {
        let child = Uuid::new_v4();
        let entry =
            ActivityLog::with_mode(child, "Ice cream", 15, EntryMode::Redeem, None).unwrap();
        assert_eq!(entry.points, -15);
        assert_eq!(entry.category, ActivityCategory::Redemption);

        let entry =
            ActivityLog::with_mode(child, "Ice cream", -15, EntryMode::Redeem, None).unwrap();
        assert_eq!(entry.points, -15);
    }

    #[test]
    fn smallest_integer_has_no_signed_magnitude() {
        assert_eq!(EntryMode::Redeem.signed(i64::MIN), None);
        assert_eq!(EntryMode::Earn.signed(i64::MIN), None);
        assert_eq!(EntryMode::Redeem.signed(i64::MAX), Some(-i64::MAX));
        assert!(
            ActivityLog::with_mode(Uuid::new_v4(), "Toy", i64::MIN, EntryMode::Redeem, None)
                .is_none()
        );
    }

    #[test]
    fn earn_mode_defaults_to_chore() {
        let entry =
            ActivityLog::with_mode(Uuid::new_v4(), "Dishes", -5, EntryMode::Earn, None).unwrap();
        assert_eq!(entry.points, 5);
        assert_eq!(entry.category, ActivityCategory::Chore);
        assert_eq!(entry.mode(), EntryMode::Earn);
    }

    #[test]
    fn timestamp_serializes_as_epoch_millis() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let entry = ActivityLog::new(Uuid::new_v4(), "Reading", 10, ActivityCategory::Behavior)
            .at(at);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["timestamp"], at.timestamp_millis());
        assert_eq!(json["category"], "behavior");
        assert!(json.get("childId").is_some());
    }

    #[test]
    fn category_parses_case_insensitively() {
        assert_eq!(
            "Behavior".parse::<ActivityCategory>().unwrap(),
            ActivityCategory::Behavior
        );
        assert!("snacks".parse::<ActivityCategory>().is_err());
    }
}
