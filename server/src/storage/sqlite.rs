// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use common::{
    Category, CreateCategoryPayload, CreateTaskPayload, Task, UpdateCategoryPayload,
    UpdateTaskPayload,
};
use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};
use tracing::{debug, info};

use super::{new_id, Storage};

const CREATE_CATEGORIES_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS categories (
        id TEXT PRIMARY KEY NOT NULL,
        name TEXT NOT NULL,
        color TEXT NOT NULL DEFAULT '#6366f1',
        created_at TIMESTAMP NOT NULL
    );
"#;

// `category_id` carries no FOREIGN KEY constraint: a task may reference a
// category id that does not exist.
const CREATE_TASKS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS tasks (
        id TEXT PRIMARY KEY NOT NULL,
        text TEXT NOT NULL,
        completed BOOLEAN NOT NULL DEFAULT 0,
        date TEXT NOT NULL,
        priority TEXT NOT NULL DEFAULT 'medium',
        category_id TEXT NULL,
        "order" INTEGER NOT NULL DEFAULT 0,
        created_at TIMESTAMP NOT NULL
    );
"#;

const CREATE_TASKS_DATE_INDEX: &str =
    r#"CREATE INDEX IF NOT EXISTS idx_tasks_date ON tasks (date, "order", created_at);"#;

// File path part of an `sqlite:` URL, or `None` for in-memory databases.
fn database_file(database_url: &str) -> Option<&Path> {
    let rest = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or(rest);
    if path.is_empty() || path == ":memory:" {
        return None;
    }
    Some(Path::new(path))
}

/// Durable backend over an SQLite connection pool.
#[derive(Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Opens the database at `database_url`, creating the file if it does
    /// not exist, and makes sure both tables are present.
    pub async fn connect(database_url: &str) -> Result<Self> {
        if let Some(parent) = database_file(database_url).and_then(|path| path.parent()) {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .context(format!("Failed to create directory {}", parent.display()))?;
            }
        }

        if !Sqlite::database_exists(database_url).await.unwrap_or(false) {
            info!("Creating database {}", database_url);
            Sqlite::create_database(database_url)
                .await
                .context("Failed to create database")?;
        } else {
            info!("Database already exists.");
        }

        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;

        Self::from_pool(pool).await
    }

    /// Wraps an existing pool and ensures the schema exists.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::query(CREATE_CATEGORIES_TABLE)
            .execute(&pool)
            .await
            .context("Failed to create 'categories' table")?;
        sqlx::query(CREATE_TASKS_TABLE)
            .execute(&pool)
            .await
            .context("Failed to create 'tasks' table")?;
        sqlx::query(CREATE_TASKS_DATE_INDEX)
            .execute(&pool)
            .await
            .context("Failed to create 'tasks' date index")?;

        info!("'tasks' and 'categories' tables are ready.");

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn get_tasks_by_date(&self, date: &str) -> Result<Vec<Task>> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"SELECT * FROM tasks WHERE date = ? ORDER BY "order" ASC, created_at ASC;"#,
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await
        .context(format!("Failed to retrieve tasks for {date} from DB"))?;

        Ok(tasks)
    }

    async fn get_task(&self, id: &str) -> Result<Option<Task>> {
        let task = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = ?;")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context(format!("Failed to retrieve task with ID: {id}"))?;

        Ok(task)
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

        debug!(
            "Insert values: id={}, text={}, date={}, priority={:?}, category_id={:?}, order={}",
            task.id, task.text, task.date, task.priority, task.category_id, task.order
        );

        sqlx::query(
            r#"INSERT INTO tasks (id, text, completed, date, priority, category_id, "order", created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&task.id)
        .bind(&task.text)
        .bind(task.completed)
        .bind(&task.date)
        .bind(task.priority)
        .bind(&task.category_id)
        .bind(task.order)
        .bind(task.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to insert task into DB")?;

        Ok(task)
    }

    async fn update_task(&self, id: &str, patch: UpdateTaskPayload) -> Result<Option<Task>> {
        debug!("Patching task {} with {:?}", id, patch);

        // Unsupplied fields bind as NULL and COALESCE keeps the stored value.
        // `category_id` needs its own flag since NULL is a legal new value.
        let (set_category, category_id) = match patch.category_id {
            Some(category_id) => (true, category_id),
            None => (false, None),
        };

        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks SET
                text = COALESCE(?, text),
                completed = COALESCE(?, completed),
                date = COALESCE(?, date),
                priority = COALESCE(?, priority),
                category_id = CASE WHEN ? THEN ? ELSE category_id END,
                "order" = COALESCE(?, "order")
            WHERE id = ?
            RETURNING *;
            "#,
        )
        .bind(patch.text)
        .bind(patch.completed)
        .bind(patch.date)
        .bind(patch.priority)
        .bind(set_category)
        .bind(category_id)
        .bind(patch.order)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context(format!("Failed to update task with ID: {id}"))?;

        Ok(task)
    }

    async fn delete_task(&self, id: &str) -> Result<bool> {
        debug!("Attempting to delete task with ID: {}", id);
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context(format!("Failed to delete task with ID: {id}"))?;

        let rows_affected = result.rows_affected();
        info!("Deleted {} rows for task ID: {}", rows_affected, id);

        Ok(rows_affected > 0)
    }

    async fn get_all_tasks(&self) -> Result<Vec<Task>> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"SELECT * FROM tasks ORDER BY date ASC, "order" ASC, created_at ASC;"#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to retrieve tasks from DB")?;

        Ok(tasks)
    }

    async fn get_task_dates(&self) -> Result<Vec<String>> {
        let dates =
            sqlx::query_scalar::<_, String>("SELECT DISTINCT date FROM tasks ORDER BY date ASC;")
                .fetch_all(&self.pool)
                .await
                .context("Failed to retrieve task dates from DB")?;

        Ok(dates)
    }

    async fn get_all_categories(&self) -> Result<Vec<Category>> {
        let categories =
            sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY name ASC;")
                .fetch_all(&self.pool)
                .await
                .context("Failed to retrieve categories from DB")?;

        Ok(categories)
    }

    async fn get_category(&self, id: &str) -> Result<Option<Category>> {
        let category = sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = ?;")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context(format!("Failed to retrieve category with ID: {id}"))?;

        Ok(category)
    }

    async fn create_category(&self, payload: CreateCategoryPayload) -> Result<Category> {
        let category = Category {
            id: new_id(),
            name: payload.name,
            color: payload.color,
            created_at: Utc::now(),
        };

        debug!(
            "Insert values: id={}, name={}, color={}",
            category.id, category.name, category.color
        );

        sqlx::query("INSERT INTO categories (id, name, color, created_at) VALUES (?, ?, ?, ?)")
            .bind(&category.id)
            .bind(&category.name)
            .bind(&category.color)
            .bind(category.created_at)
            .execute(&self.pool)
            .await
            .context("Failed to insert category into DB")?;

        Ok(category)
    }

    async fn update_category(
        &self,
        id: &str,
        patch: UpdateCategoryPayload,
    ) -> Result<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories SET
                name = COALESCE(?, name),
                color = COALESCE(?, color)
            WHERE id = ?
            RETURNING *;
            "#,
        )
        .bind(patch.name)
        .bind(patch.color)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context(format!("Failed to update category with ID: {id}"))?;

        Ok(category)
    }

    async fn delete_category(&self, id: &str) -> Result<bool> {
        debug!("Attempting to delete category with ID: {}", id);
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to start category deletion")?;

        let removed = sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context(format!("Failed to delete category with ID: {id}"))?
            .rows_affected()
            > 0;

        if removed {
            let detached = sqlx::query("UPDATE tasks SET category_id = NULL WHERE category_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await
                .context(format!("Failed to detach tasks from category ID: {id}"))?
                .rows_affected();
            info!("Detached {} tasks from deleted category {}", detached, id);
        }

        tx.commit()
            .await
            .context("Failed to commit category deletion")?;

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::contract;
    use sqlx::sqlite::SqlitePoolOptions;

    /// Helper function to set up an in-memory SQLite database for testing.
    /// A single connection keeps every query on the same in-memory database.
    async fn setup_test_db() -> SqliteStorage {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        SqliteStorage::from_pool(pool).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_applies_defaults() {
        contract::create_applies_defaults(&setup_test_db().await).await;
    }

    #[tokio::test]
    async fn test_ids_unique_and_timestamps_monotonic() {
        contract::ids_unique_and_timestamps_monotonic(&setup_test_db().await).await;
    }

    #[tokio::test]
    async fn test_by_date_returns_exact_bucket() {
        contract::by_date_returns_exact_bucket(&setup_test_db().await).await;
    }

    #[tokio::test]
    async fn test_update_changes_only_supplied_fields() {
        contract::update_changes_only_supplied_fields(&setup_test_db().await).await;
    }

    #[tokio::test]
    async fn test_update_can_detach_category() {
        contract::update_can_detach_category(&setup_test_db().await).await;
    }

    #[tokio::test]
    async fn test_update_moves_task_between_days() {
        contract::update_moves_task_between_days(&setup_test_db().await).await;
    }

    #[tokio::test]
    async fn test_update_unknown_is_none() {
        contract::update_unknown_is_none(&setup_test_db().await).await;
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        contract::delete_is_idempotent(&setup_test_db().await).await;
    }

    #[tokio::test]
    async fn test_ordering_by_date_order_created() {
        contract::ordering_by_date_order_created(&setup_test_db().await).await;
    }

    #[tokio::test]
    async fn test_task_dates_are_distinct() {
        contract::task_dates_are_distinct(&setup_test_db().await).await;
    }

    #[tokio::test]
    async fn test_categories_crud() {
        contract::categories_crud(&setup_test_db().await).await;
    }

    #[tokio::test]
    async fn test_deleting_category_clears_references() {
        contract::deleting_category_clears_references(&setup_test_db().await).await;
    }

    #[tokio::test]
    async fn test_priority_stored_as_lowercase_text() {
        let store = setup_test_db().await;
        let mut payload = contract::task("Urgent one", "2024-01-15");
        payload.priority = common::Priority::Urgent;
        let created = store.create_task(payload).await.unwrap();

        let raw: String = sqlx::query_scalar("SELECT priority FROM tasks WHERE id = ?")
            .bind(&created.id)
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(raw, "urgent");
    }

    #[test]
    fn test_database_file_from_url() {
        assert_eq!(
            database_file("sqlite://database/sqlite.db"),
            Some(Path::new("database/sqlite.db"))
        );
        assert_eq!(
            database_file("sqlite:///tmp/tasks.db?mode=rwc"),
            Some(Path::new("/tmp/tasks.db"))
        );
        assert_eq!(database_file("sqlite::memory:"), None);
    }

    #[tokio::test]
    async fn test_data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!(
            "sqlite://{}",
            dir.path().join("nested").join("tasks.db").display()
        );

        let created = {
            let store = SqliteStorage::connect(&url).await.unwrap();
            let created = store
                .create_task(contract::task("Persist me", "2024-01-15"))
                .await
                .unwrap();
            store.pool().close().await;
            created
        };

        let reopened = SqliteStorage::connect(&url).await.unwrap();
        let tasks = reopened.get_tasks_by_date("2024-01-15").await.unwrap();
        assert_eq!(tasks, vec![created]);
    }
}
