// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use crate::handlers;
use crate::storage::SharedStorage;
use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

/// Creates and configures the application router over the given storage.
pub fn create_router(storage: SharedStorage) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        // `GET /api/tasks[?date=YYYY-MM-DD]` and `POST /api/tasks`
        .route(
            "/api/tasks",
            get(handlers::list_tasks).post(handlers::create_task),
        )
        // Static segments take precedence over `{id}` below.
        .route("/api/tasks/dates", get(handlers::list_task_dates))
        .route("/api/tasks/summary", get(handlers::day_summary))
        .route(
            "/api/tasks/{id}",
            get(handlers::get_task)
                .patch(handlers::update_task)
                .delete(handlers::delete_task),
        )
        .route(
            "/api/categories",
            get(handlers::list_categories).post(handlers::create_category),
        )
        .route(
            "/api/categories/{id}",
            get(handlers::get_category)
                .patch(handlers::update_category)
                .delete(handlers::delete_category),
        )
        .layer(TraceLayer::new_for_http())
        // Adds the storage handle to the application state
        .with_state(storage)
}
