// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::collections::{BTreeSet, HashMap};

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use common::{
    Category, CreateCategoryPayload, CreateTaskPayload, Task, UpdateCategoryPayload,
    UpdateTaskPayload,
};
use parking_lot::RwLock;
use tracing::debug;

use super::{new_id, task_order, Storage};

/// Volatile backend: everything lives in two maps and is lost on restart.
///
/// Listings are sorted on read so callers see the same order as with the
/// durable backend.
#[derive(Default)]
pub struct MemStorage {
    tasks: RwLock<HashMap<String, Task>>,
    categories: RwLock<HashMap<String, Category>>,
}

impl MemStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemStorage {
    async fn get_tasks_by_date(&self, date: &str) -> Result<Vec<Task>> {
        let mut tasks: Vec<Task> = self
            .tasks
            .read()
            .values()
            .filter(|task| task.date == date)
            .cloned()
            .collect();
        tasks.sort_by(task_order);
        Ok(tasks)
    }

    async fn get_task(&self, id: &str) -> Result<Option<Task>> {
        Ok(self.tasks.read().get(id).cloned())
    }

    async fn create_task(&self, payload: CreateTaskPayload) -> Result<Task> {
        let task = Task {
            id: new_id(),
            text: payload.text,
            completed: payload.completed,
            date: payload.date,
            priority: payload.priority,
            category_id: payload.category_id,
            order: payload.order,
            created_at: Utc::now(),
        };
        debug!("Storing task {} in memory for {}", task.id, task.date);

        self.tasks.write().insert(task.id.clone(), task.clone());
        Ok(task)
    }

    async fn update_task(&self, id: &str, patch: UpdateTaskPayload) -> Result<Option<Task>> {
        let mut tasks = self.tasks.write();
        let updated = tasks.get_mut(id).map(|task| {
            patch.apply_to(task);
            task.clone()
        });
        Ok(updated)
    }

    async fn delete_task(&self, id: &str) -> Result<bool> {
        Ok(self.tasks.write().remove(id).is_some())
    }

    async fn get_all_tasks(&self) -> Result<Vec<Task>> {
        let mut tasks: Vec<Task> = self.tasks.read().values().cloned().collect();
        tasks.sort_by(task_order);
        Ok(tasks)
    }

    async fn get_task_dates(&self) -> Result<Vec<String>> {
        let dates: BTreeSet<String> = self
            .tasks
            .read()
            .values()
            .map(|task| task.date.clone())
            .collect();
        Ok(dates.into_iter().collect())
    }

    async fn get_all_categories(&self) -> Result<Vec<Category>> {
        let mut categories: Vec<Category> = self.categories.read().values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn get_category(&self, id: &str) -> Result<Option<Category>> {
        Ok(self.categories.read().get(id).cloned())
    }

    async fn create_category(&self, payload: CreateCategoryPayload) -> Result<Category> {
        let category = Category {
            id: new_id(),
            name: payload.name,
            color: payload.color,
            created_at: Utc::now(),
        };
        self.categories
            .write()
            .insert(category.id.clone(), category.clone());
        Ok(category)
    }

    async fn update_category(
        &self,
        id: &str,
        patch: UpdateCategoryPayload,
    ) -> Result<Option<Category>> {
        let mut categories = self.categories.write();
        let updated = categories.get_mut(id).map(|category| {
            patch.apply_to(category);
            category.clone()
        });
        Ok(updated)
    }

    async fn delete_category(&self, id: &str) -> Result<bool> {
        // Lock order: categories, then tasks.
        let mut categories = self.categories.write();
        if categories.remove(id).is_none() {
            return Ok(false);
        }
        let mut tasks = self.tasks.write();
        for task in tasks.values_mut() {
            if task.category_id.as_deref() == Some(id) {
                task.category_id = None;
            }
        }
        Ok(true)
    }
}
