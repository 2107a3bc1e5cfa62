// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Store configuration

/// Rows per multi-row INSERT statement
pub const DEFAULT_BATCH_ROWS: usize = 500;

/// Connection settings for an [`IndexStore`](crate::IndexStore)
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// SQLite URL, e.g. `sqlite://ifc-index.db`
    pub database_url: String,
    /// Pool size
    pub max_connections: u32,
    /// Rows per INSERT statement, further capped by the bind parameter limit
    pub batch_rows: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://ifc-index.db".to_string(),
            max_connections: 5,
            batch_rows: DEFAULT_BATCH_ROWS,
        }
    }
}

impl StoreConfig {
    /// Create a config for a database URL with default settings
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }

    /// Set the pool size
    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections.max(1);
        self
    }

    /// Set the rows per INSERT statement
    pub fn with_batch_rows(mut self, batch_rows: usize) -> Self {
        self.batch_rows = batch_rows.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_clamps_to_one() {
        let config = StoreConfig::new("sqlite::memory:")
            .with_max_connections(0)
            .with_batch_rows(0);
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.max_connections, 1);
        assert_eq!(config.batch_rows, 1);
    }

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.batch_rows, DEFAULT_BATCH_ROWS);
        assert_eq!(config.max_connections, 5);
    }
}
