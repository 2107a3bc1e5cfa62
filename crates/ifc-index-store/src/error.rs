// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the index store

use ifc_index_model::UnknownVariant;
use thiserror::Error;

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors raised while writing or querying a model index
///
/// A failed write has already rolled back when this error is returned.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid group by {0:?}, expected type, storey or space")]
    InvalidGroupBy(String),

    #[error("Invalid stored value: {0}")]
    InvalidValue(#[from] UnknownVariant),

    #[error("Invalid express id: {0}")]
    InvalidExpressId(i64),
}
