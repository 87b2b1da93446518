use serde::{Deserialize, Serialize};
use uuid::Uuid;

const DEFAULT_AVATAR_BASE: &str = "https://api.dicebear.com/7.x/fun-emoji/svg?seed=";
const POINTS_PER_LEVEL: i64 = 100;

/// A child profile whose `total_points` caches the sum of its activity log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Child {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default)]
    pub total_points: i64,
}

impl Child {
    /// Creates a child with a zero balance and a generated avatar.
    pub fn new(name: impl Into<String>) -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            name: name.into(),
            avatar_url: default_avatar(&id.simple().to_string()),
            total_points: 0,
        }
    }

    pub fn with_avatar(mut self, avatar_url: impl Into<String>) -> Self {
        self.avatar_url = avatar_url.into();
        self
    }

    /// Badge level: one level per hundred points, starting at 1.
    pub fn level(&self) -> i64 {
        if self.total_points <= 0 {
            1
        } else {
            self.total_points / POINTS_PER_LEVEL + 1
        }
    }

    /// Whether the level badge is worth displaying.
    pub fn shows_level(&self) -> bool {
        self.total_points >= POINTS_PER_LEVEL
    }
}

pub fn default_avatar(seed: &str) -> String {
    format!("{DEFAULT_AVATAR_BASE}{seed}")
}
