// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IFC-Index Store - Transactional index persistence and quantity aggregation
//!
//! An [`IndexStore`] is an explicit handle over a SQLite connection pool.
//! Create it once at startup and pass it to whoever writes or queries
//! indexes.
//!
//! # Example
//!
//! ```ignore
//! use ifc_index_store::{GroupBy, IndexStore, StoreConfig, SummaryRequest};
//!
//! let store = IndexStore::connect(&StoreConfig::new("sqlite://index.db")).await?;
//! let counts = store.replace_index("model-1", "project-1", &index).await?;
//!
//! let request = SummaryRequest::new("model-1", "project-1").with_group_by(GroupBy::Storey);
//! for row in store.quantity_summary(&request).await? {
//!     println!("{} {} {} = {}", row.group, row.quantity_type, row.name, row.value);
//! }
//! ```
//!
//! The store does not serialize writers: two concurrent `replace_index`
//! calls for the same model must be ordered by the caller.

mod config;
mod error;
mod query;
pub mod reconcile;
mod schema;
mod writer;

pub use config::{StoreConfig, DEFAULT_BATCH_ROWS};
pub use error::{Result, StoreError};
pub use query::{GroupBy, QuantitySummaryRow, SummaryRequest, UNKNOWN_GROUP};

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Handle over the index database
#[derive(Clone, Debug)]
pub struct IndexStore {
    pool: SqlitePool,
    batch_rows: usize,
}

impl IndexStore {
    /// Open (creating if missing) the database and ensure the schema
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&config.database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        log::info!(
            "Connected to index database {} ({} connections)",
            config.database_url,
            config.max_connections
        );

        Self::with_pool(pool, config.batch_rows).await
    }

    /// Wrap an existing pool, ensuring the schema
    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        Self::with_pool(pool, DEFAULT_BATCH_ROWS).await
    }

    async fn with_pool(pool: SqlitePool, batch_rows: usize) -> Result<Self> {
        schema::ensure_schema(&pool).await?;
        Ok(Self {
            pool,
            batch_rows: batch_rows.max(1),
        })
    }

    /// The underlying pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close every pooled connection
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
