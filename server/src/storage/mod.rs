// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! Task and category persistence.
//!
//! [`Storage`] is the single contract the HTTP layer talks to. Two backends
//! implement it: [`MemStorage`] (volatile, used by tests and quick runs) and
//! [`SqliteStorage`] (durable). "Not found" is an ordinary outcome
//! (`Ok(None)` / `Ok(false)`); `Err` always means the store itself failed.

mod memory;
mod sqlite;

use std::cmp::Ordering;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use common::{
    Category, CreateCategoryPayload, CreateTaskPayload, Task, UpdateCategoryPayload,
    UpdateTaskPayload,
};

pub use memory::MemStorage;
pub use sqlite::SqliteStorage;

/// Storage handle shared between the router and its handlers.
pub type SharedStorage = Arc<dyn Storage>;

#[async_trait]
pub trait Storage: Send + Sync {
    /// Tasks whose `date` equals `date`, ordered by `(order, created_at)`.
    async fn get_tasks_by_date(&self, date: &str) -> Result<Vec<Task>>;

    async fn get_task(&self, id: &str) -> Result<Option<Task>>;

    /// Inserts a task with a fresh id and the current time as `created_at`.
    async fn create_task(&self, payload: CreateTaskPayload) -> Result<Task>;

    /// Applies the supplied fields. `None` if no task has this id.
    async fn update_task(&self, id: &str, patch: UpdateTaskPayload) -> Result<Option<Task>>;

    /// Returns whether a task was actually removed.
    async fn delete_task(&self, id: &str) -> Result<bool>;

    /// Every task, ordered by `(date, order, created_at)`.
    async fn get_all_tasks(&self) -> Result<Vec<Task>>;

    /// Distinct dates that hold at least one task, ascending.
    async fn get_task_dates(&self) -> Result<Vec<String>>;

    /// Every category, ordered by name.
    async fn get_all_categories(&self) -> Result<Vec<Category>>;

    async fn get_category(&self, id: &str) -> Result<Option<Category>>;

    async fn create_category(&self, payload: CreateCategoryPayload) -> Result<Category>;

    async fn update_category(
        &self,
        id: &str,
        patch: UpdateCategoryPayload,
    ) -> Result<Option<Category>>;

    /// Removes the category and clears `category_id` on tasks that pointed to it.
    async fn delete_category(&self, id: &str) -> Result<bool>;
}

/// Global listing order: `(date, order, created_at)` ascending.
pub(crate) fn task_order(a: &Task, b: &Task) -> Ordering {
    a.date
        .cmp(&b.date)
        .then(a.order.cmp(&b.order))
        .then(a.created_at.cmp(&b.created_at))
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
