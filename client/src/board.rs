// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::collections::BTreeSet;

use common::{
    Category, CreateCategoryPayload, CreateTaskPayload, DaySummary, Task, UpdateCategoryPayload,
    UpdateTaskPayload,
};
use tracing::debug;

use crate::api::ApiClient;
use crate::cache::{QueryCache, QueryKey, QueryState};
use crate::error::Result;
use crate::mutation::Mutation;

/// One day's tasks, split the way the task list shows them.
#[derive(Debug, Clone, PartialEq)]
pub struct DayTasks {
    pub incomplete: Vec<Task>,
    pub completed: Vec<Task>,
}

impl From<Vec<Task>> for DayTasks {
    fn from(tasks: Vec<Task>) -> Self {
        let (completed, incomplete) = tasks.into_iter().partition(|task| task.completed);
        Self {
            incomplete,
            completed,
        }
    }
}

/// What the calendar sidebar shows: today's counts and which days have tasks.
#[derive(Debug, Clone, PartialEq)]
pub struct SidebarStats {
    pub today: DaySummary,
    pub dates_with_tasks: BTreeSet<String>,
}

impl SidebarStats {
    fn from_tasks(today: &str, tasks: &[Task]) -> Self {
        let todays: Vec<Task> = tasks
            .iter()
            .filter(|task| task.date == today)
            .cloned()
            .collect();
        Self {
            today: DaySummary::from_tasks(today, &todays),
            dates_with_tasks: tasks.iter().map(|task| task.date.clone()).collect(),
        }
    }
}

/// Data layer behind the task list and sidebar: reads go through the query
/// cache, writes go through one [`Mutation`] per kind of control.
pub struct TaskBoard {
    api: ApiClient,
    cache: QueryCache,
    add: Mutation,
    update: Mutation,
    delete: Mutation,
    category_write: Mutation,
    category_delete: Mutation,
}

impl TaskBoard {
    pub fn new(api: ApiClient) -> Self {
        let cache = QueryCache::new();
        let tasks = || vec![QueryKey::all_tasks()];
        Self {
            add: Mutation::new("task creation", cache.clone(), tasks()),
            update: Mutation::new("task update", cache.clone(), tasks()),
            delete: Mutation::new("task deletion", cache.clone(), tasks()),
            category_write: Mutation::new(
                "category change",
                cache.clone(),
                vec![QueryKey::categories()],
            ),
            // Deleting a category detaches its tasks, so both families go stale.
            category_delete: Mutation::new(
                "category deletion",
                cache.clone(),
                vec![QueryKey::categories(), QueryKey::all_tasks()],
            ),
            api,
            cache,
        }
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub async fn all_tasks(&self) -> QueryState<Vec<Task>> {
        self.cache
            .fetch(QueryKey::all_tasks(), || self.api.list_tasks(None))
            .await
    }

    pub async fn tasks_for_date(&self, date: &str) -> QueryState<DayTasks> {
        self.cache
            .fetch(QueryKey::tasks_for_date(date), || {
                self.api.list_tasks(Some(date))
            })
            .await
            .map(DayTasks::from)
    }

    pub async fn sidebar(&self, today: &str) -> QueryState<SidebarStats> {
        self.all_tasks()
            .await
            .map(|tasks| SidebarStats::from_tasks(today, &tasks))
    }

    pub async fn categories(&self) -> QueryState<Vec<Category>> {
        self.cache
            .fetch(QueryKey::categories(), || self.api.list_categories())
            .await
    }

    /// Adds a task from raw input. Blank input is ignored and returns
    /// `Ok(None)` without a request.
    pub async fn add_task(&self, input: &str, date: &str) -> Result<Option<Task>> {
        let text = input.trim();
        if text.is_empty() {
            debug!("Ignoring blank task input");
            return Ok(None);
        }
        let payload = CreateTaskPayload {
            text: text.to_string(),
            date: date.to_string(),
            ..CreateTaskPayload::default()
        };
        self.add
            .run(self.api.create_task(&payload))
            .await
            .map(Some)
    }

    /// Flips completion. `Ok(None)` when the task no longer exists.
    pub async fn toggle_task(&self, task: &Task) -> Result<Option<Task>> {
        let patch = UpdateTaskPayload::completed(!task.completed);
        self.edit_task(&task.id, &patch).await
    }

    pub async fn edit_task(&self, id: &str, patch: &UpdateTaskPayload) -> Result<Option<Task>> {
        self.update.run(self.api.update_task(id, patch)).await
    }

    pub async fn delete_task(&self, id: &str) -> Result<bool> {
        self.delete.run(self.api.delete_task(id)).await
    }

    pub async fn add_category(&self, payload: &CreateCategoryPayload) -> Result<Category> {
        self.category_write
            .run(self.api.create_category(payload))
            .await
    }

    pub async fn edit_category(
        &self,
        id: &str,
        patch: &UpdateCategoryPayload,
    ) -> Result<Option<Category>> {
        self.category_write
            .run(self.api.update_category(id, patch))
            .await
    }

    pub async fn delete_category(&self, id: &str) -> Result<bool> {
        self.category_delete
            .run(self.api.delete_category(id))
            .await
    }

    pub fn is_adding(&self) -> bool {
        self.add.is_pending()
    }

    pub fn is_updating(&self) -> bool {
        self.update.is_pending()
    }

    pub fn is_deleting(&self) -> bool {
        self.delete.is_pending()
    }

    pub fn is_changing_categories(&self) -> bool {
        self.category_write.is_pending() || self.category_delete.is_pending()
    }
}
