// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
mod validation;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub use validation::{is_valid_date, is_valid_hex_color, ValidationError, MAX_CATEGORY_NAME_LEN};

/// Color given to a category when the client does not pick one.
pub const DEFAULT_CATEGORY_COLOR: &str = "#6366f1";

/// Urgency of a task, stored and serialized in lowercase.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

#[allow(clippy::doc_overindented_list_items)]
/// Represents a task within the system.
///
/// Derivation attributes (derive):
/// - `Serialize`, `Deserialize`: Allows conversion to/from JSON (camelCase keys).
/// - `Debug`: Enables displaying the structure for debugging.
/// - `Clone`: Allows creating copies of the object.
/// - `sqlx::FromRow`: Allows `sqlx` to create a `Task` instance directly
///    from a database result row.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[sqlx(rename = "id")]
    pub id: String,

    #[sqlx(rename = "text")]
    pub text: String,

    #[sqlx(rename = "completed")]
    pub completed: bool,

    // Kept as a plain `YYYY-MM-DD` string: it is a bucket key, not a
    // calendar value, and must compare byte for byte.
    #[sqlx(rename = "date")]
    pub date: String,

    #[sqlx(rename = "priority")]
    pub priority: Priority,

    #[sqlx(rename = "category_id")]
    pub category_id: Option<String>,

    #[sqlx(rename = "order")]
    pub order: i32,

    #[sqlx(rename = "created_at")]
    pub created_at: DateTime<Utc>,
}

/// Represents a named, colored tag that tasks may point to.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

/// Structure used to receive task creation data from the API.
/// Server-generated fields (`id`, `createdAt`) are not part of it, so a
/// client can never choose them.
///
/// `text` and `date` default to empty strings when missing so that the
/// request reaches validation and is answered with a readable 400.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskPayload {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub order: i32,
}

/// Partial update of a task. Every field is optional; absent fields keep
/// their stored value.
///
/// `category_id` is doubly optional: `None` leaves the reference alone,
/// `Some(None)` (JSON `null`) detaches the task from its category.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub category_id: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i32>,
}

impl UpdateTaskPayload {
    /// Returns the patch that only flips the completion flag.
    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Self::default()
        }
    }

    /// Applies the supplied fields onto `task`, leaving the rest untouched.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(text) = &self.text {
            task.text = text.clone();
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
        if let Some(date) = &self.date {
            task.date = date.clone();
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(category_id) = &self.category_id {
            task.category_id = category_id.clone();
        }
        if let Some(order) = self.order {
            task.order = order;
        }
    }
}

/// Structure used to receive category creation data from the API.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryPayload {
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_category_color")]
    pub color: String,
}

impl Default for CreateCategoryPayload {
    fn default() -> Self {
        Self {
            name: String::new(),
            color: default_category_color(),
        }
    }
}

/// Partial update of a category.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl UpdateCategoryPayload {
    pub fn apply_to(&self, category: &mut Category) {
        if let Some(name) = &self.name {
            category.name = name.clone();
        }
        if let Some(color) = &self.color {
            category.color = color.clone();
        }
    }
}

/// Completion counts for a single day, as shown next to the calendar.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DaySummary {
    pub date: String,
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
}

impl DaySummary {
    pub fn from_tasks(date: &str, tasks: &[Task]) -> Self {
        let completed = tasks.iter().filter(|t| t.completed).count();
        Self {
            date: date.to_string(),
            total: tasks.len(),
            completed,
            pending: tasks.len() - completed,
        }
    }
}

fn default_category_color() -> String {
    DEFAULT_CATEGORY_COLOR.to_string()
}

// Distinguishes a missing field (outer `None`) from an explicit `null`.
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
