// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-model write serialization

use rustc_hash::FxHashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type ModelKey = (String, String);

/// One async mutex per `(model_id, project_id)`
///
/// Entries nobody holds are pruned on the next acquisition.
#[derive(Debug, Default)]
pub struct ModelLocks {
    locks: Mutex<FxHashMap<ModelKey, Arc<AsyncMutex<()>>>>,
}

impl ModelLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to one model's index
    pub async fn lock(&self, model_id: &str, project_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks
                .entry((model_id.to_string(), project_id.to_string()))
                .or_default()
                .clone()
        };
        lock.lock_owned().await
    }

    /// Number of tracked models
    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
