// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Index writer and read-back
//!
//! A model's index is replaced inside one transaction: the rows scoped to
//! `(model_id, project_id)` are deleted from all three tables, then the new
//! rows are inserted with bounded multi-row INSERTs. Dropping the transaction
//! on any error rolls everything back.

use crate::{IndexStore, Result, StoreError};
use ifc_index_model::{ElementRecord, ExtractedIndex, IndexCounts, PropertyRecord, QuantityRecord};
use sqlx::{QueryBuilder, Sqlite, Transaction};

/// SQLite's default bound parameter limit (3.32+)
const SQLITE_MAX_VARIABLES: usize = 32_766;

const ELEMENT_COLUMNS: usize = 8;
const PROPERTY_COLUMNS: usize = 7;
const QUANTITY_COLUMNS: usize = 10;

/// Rows per statement for a table of `columns` columns
fn batch_size(batch_rows: usize, columns: usize) -> usize {
    batch_rows.clamp(1, SQLITE_MAX_VARIABLES / columns)
}

impl IndexStore {
    /// Atomically replace the stored index of one model
    ///
    /// On error the previously stored index, if any, is left untouched.
    pub async fn replace_index(
        &self,
        model_id: &str,
        project_id: &str,
        index: &ExtractedIndex,
    ) -> Result<IndexCounts> {
        let mut tx = self.pool.begin().await?;

        self.delete_index_tx(model_id, project_id, &mut tx).await?;
        self.insert_elements_tx(model_id, project_id, &index.elements, &mut tx)
            .await?;
        self.insert_properties_tx(model_id, project_id, &index.properties, &mut tx)
            .await?;
        self.insert_quantities_tx(model_id, project_id, &index.quantities, &mut tx)
            .await?;

        tx.commit().await?;

        let counts = index.counts();
        log::info!(
            "Indexed model {} (project {}): {} objects, {} quantities, {} psets",
            model_id,
            project_id,
            counts.objects,
            counts.quantities,
            counts.psets
        );
        Ok(counts)
    }

    /// Remove every stored row of one model
    pub async fn delete_index(&self, model_id: &str, project_id: &str) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        self.delete_index_tx(model_id, project_id, &mut tx).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn delete_index_tx(
        &self,
        model_id: &str,
        project_id: &str,
        tx: &mut Transaction<'_, Sqlite>,
    ) -> Result<()> {
        for table in ["ifc_quantities", "ifc_properties", "ifc_elements"] {
            let sql = format!("DELETE FROM {} WHERE model_id = ? AND project_id = ?", table);
            let result = sqlx::query(&sql)
                .bind(model_id)
                .bind(project_id)
                .execute(&mut **tx)
                .await?;
            log::debug!("Deleted {} rows from {}", result.rows_affected(), table);
        }
        Ok(())
    }

    async fn insert_elements_tx(
        &self,
        model_id: &str,
        project_id: &str,
        elements: &[ElementRecord],
        tx: &mut Transaction<'_, Sqlite>,
    ) -> Result<()> {
        for chunk in elements.chunks(batch_size(self.batch_rows, ELEMENT_COLUMNS)) {
            let mut query_builder = QueryBuilder::<Sqlite>::new(
                "INSERT INTO ifc_elements (model_id, project_id, global_id, express_id, ifc_type, name, storey, space) ",
            );
            query_builder.push_values(chunk, |mut b, element| {
                b.push_bind(model_id)
                    .push_bind(project_id)
                    .push_bind(element.global_id.as_str())
                    .push_bind(i64::from(element.express_id))
                    .push_bind(element.ifc_type.as_str())
                    .push_bind(element.name.as_deref())
                    .push_bind(element.storey.as_deref())
                    .push_bind(element.space.as_deref());
            });
            query_builder.build().execute(&mut **tx).await?;
        }
        Ok(())
    }

    async fn insert_properties_tx(
        &self,
        model_id: &str,
        project_id: &str,
        properties: &[PropertyRecord],
        tx: &mut Transaction<'_, Sqlite>,
    ) -> Result<()> {
        for chunk in properties.chunks(batch_size(self.batch_rows, PROPERTY_COLUMNS)) {
            let mut query_builder = QueryBuilder::<Sqlite>::new(
                "INSERT INTO ifc_properties (model_id, project_id, global_id, pset_name, prop_name, value, unit) ",
            );
            query_builder.push_values(chunk, |mut b, property| {
                b.push_bind(model_id)
                    .push_bind(project_id)
                    .push_bind(property.global_id.as_str())
                    .push_bind(property.pset_name.as_str())
                    .push_bind(property.prop_name.as_str())
                    .push_bind(property.value.as_deref())
                    .push_bind(property.unit.as_deref());
            });
            query_builder.build().execute(&mut **tx).await?;
        }
        Ok(())
    }

    async fn insert_quantities_tx(
        &self,
        model_id: &str,
        project_id: &str,
        quantities: &[QuantityRecord],
        tx: &mut Transaction<'_, Sqlite>,
    ) -> Result<()> {
        for chunk in quantities.chunks(batch_size(self.batch_rows, QUANTITY_COLUMNS)) {
            let mut query_builder = QueryBuilder::<Sqlite>::new(
                "INSERT INTO ifc_quantities (model_id, project_id, global_id, qto_set, name, value, unit, source, method, quantity_type) ",
            );
            query_builder.push_values(chunk, |mut b, quantity| {
                b.push_bind(model_id)
                    .push_bind(project_id)
                    .push_bind(quantity.global_id.as_str())
                    .push_bind(quantity.qto_set.as_deref())
                    .push_bind(quantity.name.as_str())
                    .push_bind(quantity.value)
                    .push_bind(quantity.unit.as_deref())
                    .push_bind(quantity.source.as_str())
                    .push_bind(quantity.method.as_deref())
                    .push_bind(quantity.quantity_type.as_str());
            });
            query_builder.build().execute(&mut **tx).await?;
        }
        Ok(())
    }

    /// Read a model's stored index back, in insertion order
    pub async fn load_index(&self, model_id: &str, project_id: &str) -> Result<ExtractedIndex> {
        let elements = sqlx::query_as::<_, ElementRow>(
            "SELECT global_id, express_id, ifc_type, name, storey, space FROM ifc_elements \
             WHERE model_id = ? AND project_id = ? ORDER BY rowid",
        )
        .bind(model_id)
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(ElementRecord::try_from)
        .collect::<Result<Vec<_>>>()?;

        let properties = sqlx::query_as::<_, PropertyRow>(
            "SELECT global_id, pset_name, prop_name, value, unit FROM ifc_properties \
             WHERE model_id = ? AND project_id = ? ORDER BY id",
        )
        .bind(model_id)
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(PropertyRecord::from)
        .collect();

        let quantities = sqlx::query_as::<_, QuantityRow>(
            "SELECT global_id, qto_set, name, value, unit, source, method, quantity_type \
             FROM ifc_quantities WHERE model_id = ? AND project_id = ? ORDER BY id",
        )
        .bind(model_id)
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(QuantityRecord::try_from)
        .collect::<Result<Vec<_>>>()?;

        Ok(ExtractedIndex {
            elements,
            properties,
            quantities,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ElementRow {
    global_id: String,
    express_id: i64,
    ifc_type: String,
    name: Option<String>,
    storey: Option<String>,
    space: Option<String>,
}

impl TryFrom<ElementRow> for ElementRecord {
    type Error = StoreError;

    fn try_from(row: ElementRow) -> Result<Self> {
        Ok(ElementRecord {
            global_id: row.global_id,
            express_id: u32::try_from(row.express_id)
                .map_err(|_| StoreError::InvalidExpressId(row.express_id))?,
            ifc_type: row.ifc_type,
            name: row.name,
            storey: row.storey,
            space: row.space,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PropertyRow {
    global_id: String,
    pset_name: String,
    prop_name: String,
    value: Option<String>,
    unit: Option<String>,
}

impl From<PropertyRow> for PropertyRecord {
    fn from(row: PropertyRow) -> Self {
        PropertyRecord {
            global_id: row.global_id,
            pset_name: row.pset_name,
            prop_name: row.prop_name,
            value: row.value,
            unit: row.unit,
        }
    }
}

#[derive(sqlx::FromRow)]
struct QuantityRow {
    global_id: String,
    qto_set: Option<String>,
    name: String,
    value: f64,
    unit: Option<String>,
    source: String,
    method: Option<String>,
    quantity_type: String,
}

impl TryFrom<QuantityRow> for QuantityRecord {
    type Error = StoreError;

    fn try_from(row: QuantityRow) -> Result<Self> {
        Ok(QuantityRecord {
            global_id: row.global_id,
            qto_set: row.qto_set,
            name: row.name,
            value: row.value,
            unit: row.unit,
            source: row.source.parse()?,
            method: row.method,
            quantity_type: row.quantity_type.parse()?,
        })
    }
}
