// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::future::Future;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::cache::{QueryCache, QueryKey};
use crate::error::{ClientError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationStatus {
    Idle,
    Pending,
    Error(String),
    Success,
}

/// Tracks one kind of write (add, toggle, delete...). At most one run is in
/// flight at a time; a successful run invalidates the keys it was built with.
pub struct Mutation {
    name: &'static str,
    cache: QueryCache,
    invalidates: Vec<QueryKey>,
    status: Mutex<MutationStatus>,
}

// Resets a run that was dropped before finishing, so the control does not
// stay disabled forever.
struct PendingGuard<'a> {
    status: &'a Mutex<MutationStatus>,
    finished: bool,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            *self.status.lock() = MutationStatus::Idle;
        }
    }
}

impl Mutation {
    pub fn new(name: &'static str, cache: QueryCache, invalidates: Vec<QueryKey>) -> Self {
        Self {
            name,
            cache,
            invalidates,
            status: Mutex::new(MutationStatus::Idle),
        }
    }

    pub fn status(&self) -> MutationStatus {
        self.status.lock().clone()
    }

    /// Whether the triggering control should be disabled.
    pub fn is_pending(&self) -> bool {
        *self.status.lock() == MutationStatus::Pending
    }

    /// Runs `request` unless another run is pending, in which case it is
    /// refused with [`ClientError::MutationPending`] and never started.
    pub async fn run<T, Fut>(&self, request: Fut) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        {
            let mut status = self.status.lock();
            if *status == MutationStatus::Pending {
                debug!("Refusing {}: already pending", self.name);
                return Err(ClientError::MutationPending(self.name));
            }
            *status = MutationStatus::Pending;
        }
        let mut guard = PendingGuard {
            status: &self.status,
            finished: false,
        };

        let result = request.await;

        match &result {
            Ok(_) => {
                for key in &self.invalidates {
                    self.cache.invalidate(key);
                }
                *self.status.lock() = MutationStatus::Success;
            }
            Err(err) => {
                warn!("{} failed: {}", self.name, err);
                *self.status.lock() = MutationStatus::Error(err.to_string());
            }
        }
        guard.finished = true;

        result
    }
}
