// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for indexing requests

use ifc_index_model::ParseError;
use ifc_index_store::StoreError;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for indexing requests
pub type Result<T> = std::result::Result<T, IndexError>;

/// Why an indexing or summary request failed
///
/// Every variant leaves the previously stored index untouched.
#[derive(Error, Debug)]
pub enum IndexError {
    /// The model buffer could not be opened
    #[error("Failed to open model: {0}")]
    Parse(#[from] ParseError),

    /// The write or query failed and was rolled back
    #[error("Index store error: {0}")]
    Store(#[from] StoreError),

    /// The blocking parse task panicked or was cancelled
    #[error("Indexing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Indexing timed out after {0:?}")]
    Timeout(Duration),
}
