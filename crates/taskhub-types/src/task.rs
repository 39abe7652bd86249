//! The task entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status assigned when a create request omits one.
pub const DEFAULT_STATUS: &str = "Pending";

/// A single tracked task.
///
/// The id is assigned by the store and immutable after creation; name and
/// status are replaced wholesale on update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub name: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}
