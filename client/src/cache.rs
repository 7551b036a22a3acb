// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! Query cache.
//!
//! Each query key maps to the last fetched result and its state. Writes go
//! through [`crate::Mutation`], which marks affected keys stale instead of
//! patching cached data; the next read of a stale key goes back to the server.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::error::Result;

/// Cache lookup identity: an ordered list of segments such as
/// `["/api/tasks", "2024-01-15"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn all_tasks() -> Self {
        Self::new(["/api/tasks"])
    }

    pub fn tasks_for_date(date: &str) -> Self {
        Self::new(["/api/tasks", date])
    }

    pub fn categories() -> Self {
        Self::new(["/api/categories"])
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// True when `prefix` equals the leading segments of this key.
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

/// What a view renders for one query: a skeleton, a message, or content.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryState<T> {
    Loading,
    Error(String),
    Success(T),
}

impl<T> QueryState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, QueryState::Loading)
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            QueryState::Success(data) => Some(data),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> QueryState<U> {
        match self {
            QueryState::Loading => QueryState::Loading,
            QueryState::Error(message) => QueryState::Error(message),
            QueryState::Success(data) => QueryState::Success(f(data)),
        }
    }
}

type Data = Arc<dyn Any + Send + Sync>;

struct Entry {
    state: QueryState<Data>,
    stale: bool,
    // Bumped by every invalidation; a fetch that started under an older
    // generation stores its result as stale.
    generation: u64,
}

/// Shared, cloneable handle to the cache.
#[derive(Clone, Default)]
pub struct QueryCache {
    entries: Arc<RwLock<HashMap<QueryKey, Entry>>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached data for `key` when it is fresh, otherwise runs
    /// `fetcher` and records its outcome. The key reads as `Loading` while
    /// the fetch is in flight.
    pub async fn fetch<T, F, Fut>(&self, key: QueryKey, fetcher: F) -> QueryState<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(data) = self.fresh::<T>(&key) {
            debug!("Cache hit for {:?}", key.segments());
            return QueryState::Success(data);
        }

        debug!("Fetching {:?}", key.segments());
        let generation = self.begin(&key);

        match fetcher().await {
            Ok(data) => {
                self.finish(
                    &key,
                    generation,
                    QueryState::Success(Arc::new(data.clone()) as Data),
                );
                QueryState::Success(data)
            }
            Err(err) => {
                let message = err.to_string();
                self.finish(&key, generation, QueryState::Error(message.clone()));
                QueryState::Error(message)
            }
        }
    }

    /// Current state of `key` without fetching. `None` if it was never
    /// requested or holds data of another type.
    pub fn state<T>(&self, key: &QueryKey) -> Option<QueryState<T>>
    where
        T: Clone + Send + Sync + 'static,
    {
        let entries = self.entries.read();
        let entry = entries.get(key)?;
        match &entry.state {
            QueryState::Loading => Some(QueryState::Loading),
            QueryState::Error(message) => Some(QueryState::Error(message.clone())),
            QueryState::Success(data) => data
                .downcast_ref::<T>()
                .map(|data| QueryState::Success(data.clone())),
        }
    }

    pub fn is_stale(&self, key: &QueryKey) -> bool {
        self.entries.read().get(key).is_none_or(|entry| entry.stale)
    }

    /// Marks every key that starts with `prefix` stale. Returns how many
    /// entries were affected.
    pub fn invalidate(&self, prefix: &QueryKey) -> usize {
        let mut entries = self.entries.write();
        let mut count = 0;
        for (key, entry) in entries.iter_mut() {
            if key.starts_with(prefix) {
                entry.stale = true;
                entry.generation += 1;
                count += 1;
            }
        }
        debug!("Invalidated {} queries under {:?}", count, prefix.segments());
        count
    }

    fn fresh<T>(&self, key: &QueryKey) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let entries = self.entries.read();
        let entry = entries.get(key)?;
        if entry.stale {
            return None;
        }
        match &entry.state {
            QueryState::Success(data) => data.downcast_ref::<T>().cloned(),
            _ => None,
        }
    }

    // Marks `key` as loading and returns the generation the fetch runs under.
    fn begin(&self, key: &QueryKey) -> u64 {
        let mut entries = self.entries.write();
        let entry = entries.entry(key.clone()).or_insert(Entry {
            state: QueryState::Loading,
            stale: true,
            generation: 0,
        });
        entry.state = QueryState::Loading;
        entry.stale = true;
        entry.generation
    }

    fn finish(&self, key: &QueryKey, generation: u64, state: QueryState<Data>) {
        let mut entries = self.entries.write();
        let current = entries.get(key).map_or(generation, |entry| entry.generation);
        let invalidated = current != generation;
        if invalidated {
            debug!("{:?} was invalidated while fetching", key.segments());
        }
        // Errors stay stale so the next read retries.
        let stale = invalidated || matches!(state, QueryState::Error(_));
        entries.insert(
            key.clone(),
            Entry {
                state,
                stale,
                generation: current,
            },
        );
    }
}
