// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use crate::storage::SharedStorage;
use axum::{
    extract::{rejection::JsonRejection, FromRequest, Json, Path, Query, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::{
    is_valid_date, Category, CreateCategoryPayload, CreateTaskPayload, DaySummary, Task,
    UpdateCategoryPayload, UpdateTaskPayload, ValidationError,
};
use serde::Deserialize;
use tracing::{debug, error, info};

/// Query string accepted by `GET /api/tasks`.
#[derive(Deserialize, Debug, Default)]
pub struct TaskListQuery {
    pub date: Option<String>,
}

/// Query string accepted by `GET /api/tasks/summary`.
#[derive(Deserialize, Debug)]
pub struct SummaryQuery {
    pub date: String,
}

/// JSON request body whose rejections (bad syntax, unknown enum values,
/// wrong field types) answer with the same 400 `{"error": ...}` body as
/// validation failures.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

fn check_date_param(date: &str) -> Result<(), AppError> {
    if is_valid_date(date) {
        Ok(())
    } else {
        Err(ValidationError::MalformedDate(date.to_string()).into())
    }
}

/// Handler for listing tasks, either all of them or a single day's bucket.
pub async fn list_tasks(
    State(storage): State<SharedStorage>,
    Query(query): Query<TaskListQuery>,
) -> Result<Json<Vec<Task>>, AppError> {
    let tasks = match query.date {
        Some(date) => {
            check_date_param(&date)?;
            storage.get_tasks_by_date(&date).await?
        }
        None => storage.get_all_tasks().await?,
    };
    info!("Successfully retrieved {} tasks.", tasks.len());
    Ok(Json(tasks))
}

/// Handler for the dates that currently hold tasks.
pub async fn list_task_dates(
    State(storage): State<SharedStorage>,
) -> Result<Json<Vec<String>>, AppError> {
    let dates = storage.get_task_dates().await?;
    Ok(Json(dates))
}

/// Handler for the completed/pending counts of one day.
pub async fn day_summary(
    State(storage): State<SharedStorage>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<DaySummary>, AppError> {
    check_date_param(&query.date)?;
    let tasks = storage.get_tasks_by_date(&query.date).await?;
    Ok(Json(DaySummary::from_tasks(&query.date, &tasks)))
}

pub async fn get_task(
    State(storage): State<SharedStorage>,
    Path(task_id): Path<String>,
) -> Result<Json<Task>, AppError> {
    match storage.get_task(&task_id).await? {
        Some(task) => Ok(Json(task)),
        None => Err(AppError::not_found("Task", &task_id)),
    }
}

/// Handler for creating a new task.
pub async fn create_task(
    State(storage): State<SharedStorage>,
    JsonBody(payload): JsonBody<CreateTaskPayload>,
) -> Result<(StatusCode, Json<Task>), AppError> {
    debug!("Received request to create task for date: {}", payload.date);

    let payload = payload.validate()?;
    let new_task = storage.create_task(payload).await?;

    info!("Task created successfully with ID: {}", new_task.id);

    // Return a 201 Created status with the new task as JSON.
    Ok((StatusCode::CREATED, Json(new_task)))
}

/// Handler for patching a task. Unknown fields in the body (including `id`
/// and `createdAt`) are ignored.
pub async fn update_task(
    State(storage): State<SharedStorage>,
    Path(task_id): Path<String>,
    JsonBody(patch): JsonBody<UpdateTaskPayload>,
) -> Result<Json<Task>, AppError> {
    debug!("Received patch for task {}: {:?}", task_id, patch);

    let patch = patch.validate()?;
    match storage.update_task(&task_id, patch).await? {
        Some(task) => {
            info!("Task with ID {} updated successfully.", task_id);
            Ok(Json(task))
        }
        None => Err(AppError::not_found("Task", &task_id)),
    }
}

/// Handler for deleting a task by ID.
pub async fn delete_task(
    State(storage): State<SharedStorage>,
    Path(task_id): Path<String>,
) -> Result<StatusCode, AppError> {
    debug!("Attempting to delete task with ID: {}", task_id);

    if storage.delete_task(&task_id).await? {
        info!("Task with ID {} deleted successfully.", task_id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Task", &task_id))
    }
}

pub async fn list_categories(
    State(storage): State<SharedStorage>,
) -> Result<Json<Vec<Category>>, AppError> {
    let categories = storage.get_all_categories().await?;
    info!("Successfully retrieved {} categories.", categories.len());
    Ok(Json(categories))
}

pub async fn get_category(
    State(storage): State<SharedStorage>,
    Path(category_id): Path<String>,
) -> Result<Json<Category>, AppError> {
    match storage.get_category(&category_id).await? {
        Some(category) => Ok(Json(category)),
        None => Err(AppError::not_found("Category", &category_id)),
    }
}

pub async fn create_category(
    State(storage): State<SharedStorage>,
    JsonBody(payload): JsonBody<CreateCategoryPayload>,
) -> Result<(StatusCode, Json<Category>), AppError> {
    debug!("Received request to create category: {}", payload.name);

    let payload = payload.validate()?;
    let category = storage.create_category(payload).await?;

    info!("Category created successfully with ID: {}", category.id);
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update_category(
    State(storage): State<SharedStorage>,
    Path(category_id): Path<String>,
    JsonBody(patch): JsonBody<UpdateCategoryPayload>,
) -> Result<Json<Category>, AppError> {
    let patch = patch.validate()?;
    match storage.update_category(&category_id, patch).await? {
        Some(category) => Ok(Json(category)),
        None => Err(AppError::not_found("Category", &category_id)),
    }
}

/// Handler for deleting a category. Tasks that referenced it are detached.
pub async fn delete_category(
    State(storage): State<SharedStorage>,
    Path(category_id): Path<String>,
) -> Result<StatusCode, AppError> {
    if storage.delete_category(&category_id).await? {
        info!("Category with ID {} deleted successfully.", category_id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Category", &category_id))
    }
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

// --- Custom Error Handling ---

/// Our custom error type for the application.
#[derive(Debug)]
pub struct AppError {
    code: StatusCode,
    message: String,
}

impl AppError {
    fn new(code: StatusCode, message: &str) -> Self {
        Self {
            code,
            message: message.to_string(),
        }
    }

    fn not_found(kind: &str, id: &str) -> Self {
        error!("{} with ID {} not found.", kind, id);
        Self::new(
            StatusCode::NOT_FOUND,
            &format!("{kind} with ID {id} not found."),
        )
    }
}

/// Client mistakes become a 400 carrying the validation message.
impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        error!("Validation failed: {}", err);
        Self::new(StatusCode::BAD_REQUEST, &err.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        error!("Rejected request body: {}", rejection.body_text());
        Self::new(StatusCode::BAD_REQUEST, &rejection.body_text())
    }
}

/// Allows converting an `anyhow::Error` (coming from the storage layer)
/// into our `AppError`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        // Log the internal error for debugging.
        tracing::error!("Internal server error: {:?}", err);
        Self {
            code: StatusCode::INTERNAL_SERVER_ERROR,
            message: "An internal error occurred.".to_string(),
        }
    }
}

/// Allows Axum to convert our `AppError` into an HTTP `Response`.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(
            "Responding with error: status_code={}, message={}",
            self.code.as_u16(),
            self.message
        );
        (
            self.code,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemStorage, Storage};
    use async_trait::async_trait;
    use std::sync::Arc;

    fn memory_state() -> State<SharedStorage> {
        State(Arc::new(MemStorage::new()))
    }

    // Helper to create a payload for tests
    fn create_test_payload(text: &str, date: &str) -> JsonBody<CreateTaskPayload> {
        JsonBody(CreateTaskPayload {
            text: text.to_string(),
            date: date.to_string(),
            ..CreateTaskPayload::default()
        })
    }

    /// A backend whose every call fails, standing in for an unreachable database.
    struct BrokenStorage;

    #[async_trait]
    impl Storage for BrokenStorage {
        async fn get_tasks_by_date(&self, _: &str) -> anyhow::Result<Vec<Task>> {
            anyhow::bail!("database is locked")
        }
        async fn get_task(&self, _: &str) -> anyhow::Result<Option<Task>> {
            anyhow::bail!("database is locked")
        }
        async fn create_task(&self, _: CreateTaskPayload) -> anyhow::Result<Task> {
            anyhow::bail!("database is locked")
        }
        async fn update_task(&self, _: &str, _: UpdateTaskPayload) -> anyhow::Result<Option<Task>> {
            anyhow::bail!("database is locked")
        }
        async fn delete_task(&self, _: &str) -> anyhow::Result<bool> {
            anyhow::bail!("database is locked")
        }
        async fn get_all_tasks(&self) -> anyhow::Result<Vec<Task>> {
            anyhow::bail!("database is locked")
        }
        async fn get_task_dates(&self) -> anyhow::Result<Vec<String>> {
            anyhow::bail!("database is locked")
        }
        async fn get_all_categories(&self) -> anyhow::Result<Vec<Category>> {
            anyhow::bail!("database is locked")
        }
        async fn get_category(&self, _: &str) -> anyhow::Result<Option<Category>> {
            anyhow::bail!("database is locked")
        }
        async fn create_category(&self, _: CreateCategoryPayload) -> anyhow::Result<Category> {
            anyhow::bail!("database is locked")
        }
        async fn update_category(
            &self,
            _: &str,
            _: UpdateCategoryPayload,
        ) -> anyhow::Result<Option<Category>> {
            anyhow::bail!("database is locked")
        }
        async fn delete_category(&self, _: &str) -> anyhow::Result<bool> {
            anyhow::bail!("database is locked")
        }
    }

    #[tokio::test]
    async fn test_create_task_validation_empty_text() {
        // Arrange
        let payload = create_test_payload("   ", "2024-01-15");

        // Act
        let result = create_task(memory_state(), payload).await;

        // Assert
        let err = result.unwrap_err();
        assert_eq!(err.code, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Task text cannot be empty.");
    }

    #[tokio::test]
    async fn test_create_task_validation_malformed_date() {
        let payload = create_test_payload("Valid text", "15/01/2024");

        let result = create_task(memory_state(), payload).await;

        let err = result.unwrap_err();
        assert_eq!(err.code, StatusCode::BAD_REQUEST);
        assert!(err.message.contains("expected YYYY-MM-DD"));
    }

    #[tokio::test]
    async fn test_create_task_trims_text() {
        let payload = create_test_payload("  Write spec ", "2024-01-15");

        let (status, Json(task)) = create_task(memory_state(), payload).await.unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(task.text, "Write spec");
    }

    #[tokio::test]
    async fn test_update_unknown_task_is_not_found() {
        let result = update_task(
            memory_state(),
            Path("nope".to_string()),
            JsonBody(UpdateTaskPayload::completed(true)),
        )
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.code, StatusCode::NOT_FOUND);
        assert_eq!(err.message, "Task with ID nope not found.");
    }

    #[tokio::test]
    async fn test_list_tasks_rejects_malformed_date() {
        let query = Query(TaskListQuery {
            date: Some("2024-1-5".to_string()),
        });

        let err = list_tasks(memory_state(), query).await.unwrap_err();
        assert_eq!(err.code, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_store_failure_is_internal_error() {
        let state: State<SharedStorage> = State(Arc::new(BrokenStorage));

        let err = list_tasks(state, Query(TaskListQuery::default()))
            .await
            .unwrap_err();

        assert_eq!(err.code, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "An internal error occurred.");
    }

    #[tokio::test]
    async fn test_create_category_rejects_bad_color() {
        let payload = JsonBody(CreateCategoryPayload {
            name: "Work".to_string(),
            color: "blue".to_string(),
        });

        let err = create_category(memory_state(), payload).await.unwrap_err();
        assert_eq!(err.code, StatusCode::BAD_REQUEST);
    }
}
