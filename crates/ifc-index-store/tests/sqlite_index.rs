// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use ifc_index_model::{
    ElementRecord, ExtractedIndex, IndexCounts, PropertyRecord, QuantityRecord, QuantitySource,
    QuantityType,
};
use ifc_index_store::reconcile::prefer_declared;
use ifc_index_store::{GroupBy, IndexStore, StoreConfig, StoreError, SummaryRequest, UNKNOWN_GROUP};
use tempfile::TempDir;

async fn open_store(batch_rows: usize) -> (TempDir, IndexStore) {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("index.db").display());
    let config = StoreConfig::new(url)
        .with_max_connections(2)
        .with_batch_rows(batch_rows);
    let store = IndexStore::connect(&config).await.unwrap();
    (dir, store)
}

fn element(global_id: &str, express_id: u32, ifc_type: &str, storey: Option<&str>) -> ElementRecord {
    ElementRecord {
        global_id: global_id.to_string(),
        express_id,
        ifc_type: ifc_type.to_string(),
        name: Some(format!("{} {}", ifc_type, express_id)),
        storey: storey.map(str::to_string),
        space: None,
    }
}

fn quantity(
    global_id: &str,
    name: &str,
    value: f64,
    quantity_type: QuantityType,
    source: QuantitySource,
) -> QuantityRecord {
    let (qto_set, method) = match source {
        QuantitySource::PsetQto => ("Pset_QuantityTakeOff", "pset_numeric_value"),
        _ => ("Qto_Base", "ifc_element_quantity"),
    };
    QuantityRecord {
        global_id: global_id.to_string(),
        qto_set: Some(qto_set.to_string()),
        name: name.to_string(),
        value,
        unit: Some(match quantity_type {
            QuantityType::Area => "m²".to_string(),
            QuantityType::Volume => "m³".to_string(),
            _ => "m".to_string(),
        }),
        source,
        method: Some(method.to_string()),
        quantity_type,
    }
}

fn property(global_id: &str, pset: &str, name: &str, value: Option<&str>) -> PropertyRecord {
    PropertyRecord {
        global_id: global_id.to_string(),
        pset_name: pset.to_string(),
        prop_name: name.to_string(),
        value: value.map(str::to_string),
        unit: None,
    }
}

/// Two walls on L1, a slab without a storey
fn sample_index() -> ExtractedIndex {
    ExtractedIndex {
        elements: vec![
            element("wall-1", 10, "IfcWall", Some("L1")),
            element("wall-2", 11, "IfcWall", Some("L1")),
            element("slab-1", 20, "IfcSlab", None),
        ],
        properties: vec![
            property("wall-1", "Pset_WallCommon", "IsExternal", Some("TRUE")),
            property("wall-1", "Pset_QuantityTakeOff", "NetSideArea", Some("5.2")),
            property("wall-2", "Pset_WallCommon", "FireRating", None),
        ],
        quantities: vec![
            quantity("wall-1", "NetSideArea", 5.0, QuantityType::Area, QuantitySource::IfcQto),
            quantity("wall-1", "NetSideArea", 5.2, QuantityType::Area, QuantitySource::PsetQto),
            quantity("wall-2", "NetSideArea", 7.5, QuantityType::Area, QuantitySource::IfcQto),
            quantity("wall-1", "Length", 4.0, QuantityType::Length, QuantitySource::IfcQto),
            quantity("slab-1", "NetVolume", 3.0, QuantityType::Volume, QuantitySource::IfcQto),
            quantity("slab-1", "Count", 1.0, QuantityType::Count, QuantitySource::IfcQto),
        ],
    }
}

#[tokio::test]
async fn test_replace_and_load_round_trip() {
    let (_dir, store) = open_store(500).await;
    let index = sample_index();

    let counts = store.replace_index("model-1", "project-1", &index).await.unwrap();
    assert_eq!(
        counts,
        IndexCounts {
            objects: 3,
            quantities: 6,
            psets: 3
        }
    );

    let loaded = store.load_index("model-1", "project-1").await.unwrap();
    assert_eq!(loaded, index);
}

#[tokio::test]
async fn test_replace_is_idempotent() {
    let (_dir, store) = open_store(500).await;
    let index = sample_index();

    store.replace_index("model-1", "project-1", &index).await.unwrap();
    let first = store.load_index("model-1", "project-1").await.unwrap();
    store.replace_index("model-1", "project-1", &index).await.unwrap();
    let second = store.load_index("model-1", "project-1").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(second.quantities.len(), 6);
}

#[tokio::test]
async fn test_replace_discards_previous_rows() {
    let (_dir, store) = open_store(500).await;
    store
        .replace_index("model-1", "project-1", &sample_index())
        .await
        .unwrap();

    let smaller = ExtractedIndex {
        elements: vec![element("door-1", 30, "IfcDoor", Some("L2"))],
        properties: Vec::new(),
        quantities: vec![quantity("door-1", "Area", 2.1, QuantityType::Area, QuantitySource::IfcQto)],
    };
    store.replace_index("model-1", "project-1", &smaller).await.unwrap();

    assert_eq!(store.load_index("model-1", "project-1").await.unwrap(), smaller);
}

#[tokio::test]
async fn test_duplicate_element_rolls_back() {
    let (_dir, store) = open_store(500).await;
    let original = sample_index();
    store.replace_index("model-1", "project-1", &original).await.unwrap();

    let mut broken = sample_index();
    broken.elements.push(element("wall-1", 99, "IfcWall", Some("L2")));
    let result = store.replace_index("model-1", "project-1", &broken).await;
    assert!(matches!(result, Err(StoreError::Database(_))));

    assert_eq!(store.load_index("model-1", "project-1").await.unwrap(), original);
}

#[tokio::test]
async fn test_failed_quantity_insert_keeps_prior_index() {
    let (_dir, store) = open_store(500).await;
    let original = sample_index();
    store.replace_index("model-1", "project-1", &original).await.unwrap();

    // SQLite binds NaN as NULL, which the value column rejects
    let mut broken = sample_index();
    broken.quantities[3].value = f64::NAN;
    assert!(store.replace_index("model-1", "project-1", &broken).await.is_err());

    assert_eq!(store.load_index("model-1", "project-1").await.unwrap(), original);
}

#[tokio::test]
async fn test_failed_first_run_leaves_nothing() {
    let (_dir, store) = open_store(500).await;

    let mut broken = sample_index();
    broken.quantities[0].value = f64::NAN;
    assert!(store.replace_index("model-1", "project-1", &broken).await.is_err());

    assert!(store.load_index("model-1", "project-1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_summary_by_type_keeps_sources_apart() {
    let (_dir, store) = open_store(500).await;
    store
        .replace_index("model-1", "project-1", &sample_index())
        .await
        .unwrap();

    let rows = store
        .quantity_summary(&SummaryRequest::new("model-1", "project-1"))
        .await
        .unwrap();

    let summary: Vec<_> = rows
        .iter()
        .map(|r| (r.group.as_str(), r.quantity_type, r.name.as_str(), r.source, r.value))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("IfcSlab", QuantityType::Volume, "NetVolume", QuantitySource::IfcQto, 3.0),
            ("IfcWall", QuantityType::Area, "NetSideArea", QuantitySource::IfcQto, 12.5),
            ("IfcWall", QuantityType::Area, "NetSideArea", QuantitySource::PsetQto, 5.2),
            ("IfcWall", QuantityType::Length, "Length", QuantitySource::IfcQto, 4.0),
        ]
    );
    assert_eq!(rows[1].unit.as_deref(), Some("m²"));

    let reconciled = prefer_declared(rows);
    assert_eq!(reconciled.len(), 3);
    assert!(reconciled.iter().all(|r| r.source == QuantitySource::IfcQto));
}

#[tokio::test]
async fn test_summary_by_storey_uses_unknown_label() {
    let (_dir, store) = open_store(500).await;
    store
        .replace_index("model-1", "project-1", &sample_index())
        .await
        .unwrap();

    let request = SummaryRequest::new("model-1", "project-1")
        .with_group_by(GroupBy::Storey)
        .with_quantity_types([QuantityType::Volume, QuantityType::Count]);
    let rows = store.quantity_summary(&request).await.unwrap();

    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.group == UNKNOWN_GROUP));
    assert_eq!(rows[0].quantity_type, QuantityType::Count);
    assert_eq!(rows[1].quantity_type, QuantityType::Volume);
}

#[tokio::test]
async fn test_summary_filters() {
    let (_dir, store) = open_store(500).await;
    store
        .replace_index("model-1", "project-1", &sample_index())
        .await
        .unwrap();

    let request = SummaryRequest::new("model-1", "project-1")
        .with_group_by(GroupBy::Storey)
        .with_filter_type("IfcWall")
        .with_filter_name("NetSideArea");
    let rows = store.quantity_summary(&request).await.unwrap();

    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.group == "L1" && r.name == "NetSideArea"));
    assert_eq!(rows[0].value, 12.5);

    let none = store
        .quantity_summary(&request.clone().with_filter_type("IfcDoor"))
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn test_space_grouping_of_unplaced_elements() {
    let (_dir, store) = open_store(500).await;
    store
        .replace_index("model-1", "project-1", &sample_index())
        .await
        .unwrap();

    let request = SummaryRequest::new("model-1", "project-1")
        .with_group_by("space".parse().unwrap())
        .with_filter_name("Length");
    let rows = store.quantity_summary(&request).await.unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].group, UNKNOWN_GROUP);
    assert_eq!(rows[0].value, 4.0);
}

#[tokio::test]
async fn test_models_and_projects_are_isolated() {
    let (_dir, store) = open_store(500).await;
    store
        .replace_index("model-1", "project-1", &sample_index())
        .await
        .unwrap();
    store
        .replace_index("model-2", "project-1", &sample_index())
        .await
        .unwrap();

    let rows = store
        .quantity_summary(&SummaryRequest::new("model-1", "project-1").with_filter_name("NetSideArea"))
        .await
        .unwrap();
    assert_eq!(rows[0].value, 12.5);

    let other_project = store
        .quantity_summary(&SummaryRequest::new("model-1", "project-2"))
        .await
        .unwrap();
    assert!(other_project.is_empty());

    store.delete_index("model-2", "project-1").await.unwrap();
    assert!(store.load_index("model-2", "project-1").await.unwrap().is_empty());
    assert_eq!(
        store.load_index("model-1", "project-1").await.unwrap(),
        sample_index()
    );
}

#[tokio::test]
async fn test_small_batches_write_every_row() {
    let (_dir, store) = open_store(2).await;

    let elements: Vec<_> = (0..25)
        .map(|i| element(&format!("wall-{}", i), i, "IfcWall", Some("L1")))
        .collect();
    let quantities: Vec<_> = (0..25)
        .map(|i| {
            quantity(
                &format!("wall-{}", i),
                "NetSideArea",
                1.5,
                QuantityType::Area,
                QuantitySource::IfcQto,
            )
        })
        .collect();
    let index = ExtractedIndex {
        elements,
        properties: Vec::new(),
        quantities,
    };

    let counts = store.replace_index("model-1", "project-1", &index).await.unwrap();
    assert_eq!(counts.objects, 25);
    assert_eq!(store.load_index("model-1", "project-1").await.unwrap(), index);

    let rows = store
        .quantity_summary(&SummaryRequest::new("model-1", "project-1"))
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert!((rows[0].value - 37.5).abs() < 1e-9);
}

#[tokio::test]
async fn test_reconnect_sees_committed_index() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("index.db").display());

    let store = IndexStore::connect(&StoreConfig::new(url.clone())).await.unwrap();
    store
        .replace_index("model-1", "project-1", &sample_index())
        .await
        .unwrap();
    store.close().await;

    let reopened = IndexStore::connect(&StoreConfig::new(url)).await.unwrap();
    assert_eq!(
        reopened.load_index("model-1", "project-1").await.unwrap(),
        sample_index()
    );
}
