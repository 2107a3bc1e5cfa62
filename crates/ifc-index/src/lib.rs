// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IFC-Index - Quantity indexing service
//!
//! Ties the parser and the store together: a model buffer is opened and
//! extracted on the blocking pool, then written as one atomic replace.
//! Reindexing of the same `(model_id, project_id)` is serialized.
//!
//! # Example
//!
//! ```ignore
//! use ifc_index::{Indexer, IndexStore, StoreConfig, SummaryRequest};
//! use std::sync::Arc;
//!
//! let store = Arc::new(IndexStore::connect(&StoreConfig::default()).await?);
//! let indexer = Indexer::new(store);
//! let counts = indexer.index_model(std::fs::read("model.ifc")?, "model-1", "project-1").await?;
//! let rows = indexer.quantity_summary(&SummaryRequest::new("model-1", "project-1")).await?;
//! ```

mod error;
mod locks;

pub use error::{IndexError, Result};
pub use locks::ModelLocks;

pub use ifc_index_model::{ExtractedIndex, IndexCounts, QuantitySource, QuantityType};
pub use ifc_index_parser::{ContainmentPolicy, ExtractOptions, StepParser, DEFAULT_TAKEOFF_PSET};
pub use ifc_index_store::reconcile::prefer_declared;
pub use ifc_index_store::{
    GroupBy, IndexStore, QuantitySummaryRow, StoreConfig, StoreError, SummaryRequest,
    DEFAULT_BATCH_ROWS,
};

use ifc_index_model::IfcParser;
use ifc_index_parser::extract_index;
use std::sync::Arc;
use std::time::Duration;

/// Indexing service over a shared store
#[derive(Debug)]
pub struct Indexer {
    store: Arc<IndexStore>,
    parser: StepParser,
    options: ExtractOptions,
    locks: ModelLocks,
}

impl Indexer {
    pub fn new(store: Arc<IndexStore>) -> Self {
        Self {
            store,
            parser: StepParser::new(),
            options: ExtractOptions::default(),
            locks: ModelLocks::new(),
        }
    }

    /// Set the extraction options used for every model
    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    pub fn store(&self) -> &Arc<IndexStore> {
        &self.store
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Parse a model buffer into index rows without storing them
    pub async fn extract(&self, buffer: Vec<u8>) -> Result<ExtractedIndex> {
        let parser = self.parser;
        let options = self.options.clone();

        let index = tokio::task::spawn_blocking(move || -> Result<ExtractedIndex> {
            let model = parser.open(&buffer)?;
            let metadata = model.metadata();
            log::debug!(
                "Opened {} ({} entities, schema {:?})",
                metadata.file_name.as_deref().unwrap_or("unnamed model"),
                model.resolver().entity_count(),
                metadata.schema_version
            );
            Ok(extract_index(model.as_ref(), &options))
        })
        .await??;

        Ok(index)
    }

    /// Replace the stored index of one model with the contents of `buffer`
    ///
    /// Returns the number of element, quantity and property rows written.
    /// On failure nothing is committed and the previous index stays valid.
    pub async fn index_model(
        &self,
        buffer: Vec<u8>,
        model_id: &str,
        project_id: &str,
    ) -> Result<IndexCounts> {
        let _guard = self.locks.lock(model_id, project_id).await;
        log::debug!("Indexing model {} (project {})", model_id, project_id);

        let index = self.extract(buffer).await?;
        if index.is_empty() {
            log::warn!("Model {} produced no index rows", model_id);
        }

        Ok(self.store.replace_index(model_id, project_id, &index).await?)
    }

    /// [`index_model`](Self::index_model) bounded by a deadline
    ///
    /// On expiry the in-flight transaction is dropped uncommitted. A parse
    /// already running on the blocking pool finishes in the background and
    /// its result is discarded.
    pub async fn index_model_with_timeout(
        &self,
        buffer: Vec<u8>,
        model_id: &str,
        project_id: &str,
        timeout: Duration,
    ) -> Result<IndexCounts> {
        match tokio::time::timeout(timeout, self.index_model(buffer, model_id, project_id)).await {
            Ok(result) => result,
            Err(_) => {
                log::warn!("Indexing model {} timed out after {:?}", model_id, timeout);
                Err(IndexError::Timeout(timeout))
            }
        }
    }

    pub async fn quantity_summary(&self, request: &SummaryRequest) -> Result<Vec<QuantitySummaryRow>> {
        Ok(self.store.quantity_summary(request).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const WALL_IFC: &str = r#"ISO-10303-21;
HEADER;
FILE_NAME('wall.ifc','2024-05-01T10:00:00',(''),(''),'','Modeller','');
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#1=IFCPROJECT('proj',$,'Project',$,$,$,$,$,#2);
#2=IFCUNITASSIGNMENT((#3));
#3=IFCSIUNIT(*,.AREAUNIT.,$,.SQUARE_METRE.);
#10=IFCBUILDINGSTOREY('st1',$,'L1',$,$,$,$,$,.ELEMENT.,0.);
#20=IFCWALL('wall-1',$,'Wall A',$,$,$,$,$,$);
#30=IFCRELCONTAINEDINSPATIALSTRUCTURE('c1',$,$,$,(#20),#10);
#40=IFCQUANTITYAREA('NetSideArea',$,$,5.,$);
#41=IFCELEMENTQUANTITY('q1',$,'Qto_WallBaseQuantities',$,$,(#40));
#50=IFCRELDEFINESBYPROPERTIES('r1',$,$,$,(#20),#41);
ENDSEC;
END-ISO-10303-21;
"#;

    async fn indexer() -> (TempDir, Indexer) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("index.db").display());
        let store = IndexStore::connect(&StoreConfig::new(url)).await.unwrap();
        (dir, Indexer::new(Arc::new(store)))
    }

    #[tokio::test]
    async fn test_index_model_counts() {
        let (_dir, indexer) = indexer().await;
        let counts = indexer
            .index_model(WALL_IFC.as_bytes().to_vec(), "m", "p")
            .await
            .unwrap();
        assert_eq!(
            counts,
            IndexCounts {
                objects: 1,
                quantities: 1,
                psets: 0
            }
        );
    }

    #[tokio::test]
    async fn test_invalid_buffer_is_rejected() {
        let (_dir, indexer) = indexer().await;
        let result = indexer.index_model(b"not a model".to_vec(), "m", "p").await;
        assert!(matches!(result, Err(IndexError::Parse(_))));
    }

    #[tokio::test]
    async fn test_timeout_while_waiting_commits_nothing() {
        let (_dir, indexer) = indexer().await;
        let held = indexer.locks.lock("m", "p").await;

        let result = indexer
            .index_model_with_timeout(
                WALL_IFC.as_bytes().to_vec(),
                "m",
                "p",
                Duration::from_millis(50),
            )
            .await;
        assert!(matches!(result, Err(IndexError::Timeout(_))));
        assert!(indexer.store().load_index("m", "p").await.unwrap().is_empty());

        drop(held);
        let counts = indexer
            .index_model_with_timeout(WALL_IFC.as_bytes().to_vec(), "m", "p", Duration::from_secs(30))
            .await
            .unwrap();
        assert_eq!(counts.objects, 1);
    }

    #[tokio::test]
    async fn test_concurrent_reindex_does_not_duplicate() {
        let (_dir, indexer) = indexer().await;
        let buffer = WALL_IFC.as_bytes().to_vec();

        let (a, b) = tokio::join!(
            indexer.index_model(buffer.clone(), "m", "p"),
            indexer.index_model(buffer.clone(), "m", "p"),
        );
        assert_eq!(a.unwrap(), b.unwrap());

        let stored = indexer.store().load_index("m", "p").await.unwrap();
        assert_eq!(stored.elements.len(), 1);
        assert_eq!(stored.quantities.len(), 1);
    }
}
