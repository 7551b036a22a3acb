// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! Typed calls against the REST surface.
//!
//! A 404 is returned as `Ok(None)` / `Ok(false)` so callers branch on it
//! the same way they branch on the storage layer's results.

use common::{
    Category, CreateCategoryPayload, CreateTaskPayload, DaySummary, Task, UpdateCategoryPayload,
    UpdateTaskPayload,
};
use reqwest::{Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use tracing::debug;

use crate::error::{ClientError, Result};

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    /// `base_url` is the server origin, e.g. `http://localhost:3000`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, http }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn list_tasks(&self, date: Option<&str>) -> Result<Vec<Task>> {
        let mut request = self.http.get(self.url("/api/tasks"));
        if let Some(date) = date {
            request = request.query(&[("date", date)]);
        }
        json(request.send().await?).await
    }

    pub async fn get_task(&self, id: &str) -> Result<Option<Task>> {
        let response = self.http.get(self.url(&format!("/api/tasks/{id}"))).send().await?;
        optional_json(response).await
    }

    pub async fn task_dates(&self) -> Result<Vec<String>> {
        json(self.http.get(self.url("/api/tasks/dates")).send().await?).await
    }

    pub async fn day_summary(&self, date: &str) -> Result<DaySummary> {
        let response = self
            .http
            .get(self.url("/api/tasks/summary"))
            .query(&[("date", date)])
            .send()
            .await?;
        json(response).await
    }

    pub async fn create_task(&self, payload: &CreateTaskPayload) -> Result<Task> {
        debug!("POST /api/tasks for {}", payload.date);
        json(self.http.post(self.url("/api/tasks")).json(payload).send().await?).await
    }

    pub async fn update_task(&self, id: &str, patch: &UpdateTaskPayload) -> Result<Option<Task>> {
        debug!("PATCH /api/tasks/{}", id);
        let response = self
            .http
            .patch(self.url(&format!("/api/tasks/{id}")))
            .json(patch)
            .send()
            .await?;
        optional_json(response).await
    }

    pub async fn delete_task(&self, id: &str) -> Result<bool> {
        debug!("DELETE /api/tasks/{}", id);
        let response = self.http.delete(self.url(&format!("/api/tasks/{id}"))).send().await?;
        deleted(response).await
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        json(self.http.get(self.url("/api/categories")).send().await?).await
    }

    pub async fn create_category(&self, payload: &CreateCategoryPayload) -> Result<Category> {
        json(self.http.post(self.url("/api/categories")).json(payload).send().await?).await
    }

    pub async fn update_category(
        &self,
        id: &str,
        patch: &UpdateCategoryPayload,
    ) -> Result<Option<Category>> {
        let response = self
            .http
            .patch(self.url(&format!("/api/categories/{id}")))
            .json(patch)
            .send()
            .await?;
        optional_json(response).await
    }

    pub async fn delete_category(&self, id: &str) -> Result<bool> {
        let response = self
            .http
            .delete(self.url(&format!("/api/categories/{id}")))
            .send()
            .await?;
        deleted(response).await
    }
}

async fn api_error(response: Response) -> ClientError {
    let status = response.status();
    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("Unexpected response")
            .to_string(),
    };
    ClientError::Api {
        status: status.as_u16(),
        message,
    }
}

async fn json<T: DeserializeOwned>(response: Response) -> Result<T> {
    if !response.status().is_success() {
        return Err(api_error(response).await);
    }
    Ok(response.json::<T>().await?)
}

async fn optional_json<T: DeserializeOwned>(response: Response) -> Result<Option<T>> {
    if response.status() == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    json(response).await.map(Some)
}

async fn deleted(response: Response) -> Result<bool> {
    match response.status() {
        StatusCode::NOT_FOUND => Ok(false),
        status if status.is_success() => Ok(true),
        _ => Err(api_error(response).await),
    }
}
