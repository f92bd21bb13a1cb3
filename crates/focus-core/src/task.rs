use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::datetime::{created_at_serde, to_stored_precision};

/// A single focus item.
///
/// Field names are camelCase on disk: `{id, text, completed, createdAt}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,

    pub text: String,

    pub completed: bool,

    #[serde(with = "created_at_serde")]
    pub created_at: DateTime<Utc>,
}

impl Task {
    pub fn new(text: String, now: DateTime<Utc>) -> Self {
        Self {
            id: new_task_id(),
            text,
            completed: false,
            created_at: to_stored_precision(now),
        }
    }

    pub fn is_pending(&self) -> bool {
        !self.completed
    }

    pub fn short_id(&self) -> &str {
        self.id.get(..8).unwrap_or(&self.id)
    }
}

pub fn new_task_id() -> String {
    Uuid::new_v4().to_string()
}
