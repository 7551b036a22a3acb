// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! Client side of the daily tasks API: typed HTTP calls, a query cache
//! with loading/error/success states, and mutation tracking that invalidates
//! cached queries after every successful write.
mod api;
mod board;
mod cache;
mod error;
mod mutation;

pub use api::ApiClient;
pub use board::{DayTasks, SidebarStats, TaskBoard};
pub use cache::{QueryCache, QueryKey, QueryState};
pub use error::{ClientError, Result};
pub use mutation::{Mutation, MutationStatus};
