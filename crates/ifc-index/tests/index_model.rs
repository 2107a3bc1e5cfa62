// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use ifc_index::{
    prefer_declared, ContainmentPolicy, ExtractOptions, GroupBy, IndexCounts, IndexError,
    IndexStore, Indexer, QuantitySource, QuantityType, StoreConfig, SummaryRequest,
};
use std::sync::Arc;
use tempfile::TempDir;

const TWO_STOREYS: &[u8] = include_bytes!("fixtures/two_storeys.ifc");

async fn indexer() -> (TempDir, Indexer) {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("index.db").display());
    let store = IndexStore::connect(&StoreConfig::new(url).with_batch_rows(3))
        .await
        .unwrap();
    (dir, Indexer::new(Arc::new(store)))
}

#[tokio::test]
async fn test_index_reports_counts() {
    let (_dir, indexer) = indexer().await;
    let counts = indexer
        .index_model(TWO_STOREYS.to_vec(), "model-1", "project-1")
        .await
        .unwrap();

    assert_eq!(
        counts,
        IndexCounts {
            objects: 4,
            quantities: 5,
            psets: 2
        }
    );
}

#[tokio::test]
async fn test_reindex_is_idempotent() {
    let (_dir, indexer) = indexer().await;

    indexer
        .index_model(TWO_STOREYS.to_vec(), "model-1", "project-1")
        .await
        .unwrap();
    let first = indexer.store().load_index("model-1", "project-1").await.unwrap();

    indexer
        .index_model(TWO_STOREYS.to_vec(), "model-1", "project-1")
        .await
        .unwrap();
    let second = indexer.store().load_index("model-1", "project-1").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(second, indexer.extract(TWO_STOREYS.to_vec()).await.unwrap());
}

#[tokio::test]
async fn test_summary_by_storey() {
    let (_dir, indexer) = indexer().await;
    indexer
        .index_model(TWO_STOREYS.to_vec(), "model-1", "project-1")
        .await
        .unwrap();

    let request = SummaryRequest::new("model-1", "project-1").with_group_by(GroupBy::Storey);
    let rows = indexer.quantity_summary(&request).await.unwrap();

    let summary: Vec<_> = rows
        .iter()
        .map(|r| (r.group.as_str(), r.quantity_type, r.name.as_str(), r.source, r.value))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("Level 1", QuantityType::Area, "NetSideArea", QuantitySource::IfcQto, 12.5),
            ("Level 1", QuantityType::Area, "NetSideArea", QuantitySource::PsetQto, 5.2),
            ("Level 2", QuantityType::Volume, "NetVolume", QuantitySource::IfcQto, 2.5),
            ("Unknown", QuantityType::Length, "Length", QuantitySource::IfcQto, 3000.0),
        ]
    );

    // Explicit units win over the project default, no conversion applied
    assert_eq!(rows[0].unit.as_deref(), Some("m²"));
    assert_eq!(rows[2].unit.as_deref(), Some("m³"));
    assert_eq!(rows[3].unit.as_deref(), Some("mm"));

    let reconciled = prefer_declared(rows);
    assert_eq!(reconciled.len(), 3);
}

#[tokio::test]
async fn test_summary_as_json() {
    let (_dir, indexer) = indexer().await;
    indexer
        .index_model(TWO_STOREYS.to_vec(), "model-1", "project-1")
        .await
        .unwrap();

    let request = SummaryRequest::new("model-1", "project-1")
        .with_filter_type("IfcSlab")
        .with_quantity_types([QuantityType::Volume]);
    let rows = indexer.quantity_summary(&request).await.unwrap();

    let json = serde_json::to_value(&rows).unwrap();
    assert_eq!(
        json,
        serde_json::json!([{
            "group": "IfcSlab",
            "quantityType": "VOLUME",
            "name": "NetVolume",
            "source": "ifc_qto",
            "unit": "m³",
            "value": 2.5
        }])
    );
}

#[tokio::test]
async fn test_failed_reindex_keeps_previous_index() {
    let (_dir, indexer) = indexer().await;
    indexer
        .index_model(TWO_STOREYS.to_vec(), "model-1", "project-1")
        .await
        .unwrap();
    let before = indexer.store().load_index("model-1", "project-1").await.unwrap();

    let result = indexer
        .index_model(b"HEADER;ENDSEC;".to_vec(), "model-1", "project-1")
        .await;
    assert!(matches!(result, Err(IndexError::Parse(_))));

    let after = indexer.store().load_index("model-1", "project-1").await.unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_takeoff_set_is_configurable() {
    let (_dir, indexer) = indexer().await;
    let indexer = Indexer::new(Arc::clone(indexer.store())).with_options(
        ExtractOptions::new()
            .with_containment(ContainmentPolicy::FirstWins)
            .with_takeoff_pset("Pset_CostTakeOff"),
    );

    let counts = indexer
        .index_model(TWO_STOREYS.to_vec(), "model-1", "project-1")
        .await
        .unwrap();
    assert_eq!(counts.quantities, 4);
    assert_eq!(counts.psets, 2);
}
