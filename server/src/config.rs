// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing::info;

use crate::storage::{MemStorage, SharedStorage, SqliteStorage};

const DEFAULT_DB_URL: &str = "sqlite://database/sqlite.db";

/// Which storage backend the process runs on.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    /// Volatile, lost on restart.
    Memory,
    /// SQLite file at `--database-url`.
    Sqlite,
}

/// Server settings, read from flags or the environment.
#[derive(Parser, Debug, Clone)]
#[command(name = "daily-tasks-server", version, about = "Daily tasks REST server")]
pub struct Config {
    #[arg(long, env = "STORAGE_BACKEND", value_enum, default_value_t = Backend::Sqlite)]
    pub storage: Backend,

    #[arg(long, env = "DATABASE_URL", default_value = DEFAULT_DB_URL)]
    pub database_url: String,

    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,
}

impl Config {
    /// Builds the backend chosen at start. This is the only place a
    /// concrete storage type is named.
    pub async fn build_storage(&self) -> Result<SharedStorage> {
        match self.storage {
            Backend::Memory => {
                info!("Using the in-memory storage backend.");
                Ok(Arc::new(MemStorage::new()))
            }
            Backend::Sqlite => {
                info!("Using the SQLite storage backend at {}", self.database_url);
                Ok(Arc::new(SqliteStorage::connect(&self.database_url).await?))
            }
        }
    }
}
