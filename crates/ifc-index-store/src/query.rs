// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Quantity summaries

use crate::{IndexStore, Result, StoreError};
use ifc_index_model::{QuantitySource, QuantityType};
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Row, Sqlite};
use std::fmt;
use std::str::FromStr;

/// Label of rows whose element has no value in the grouping column
pub const UNKNOWN_GROUP: &str = "Unknown";

/// Element attribute a summary is grouped by
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    #[default]
    Type,
    Storey,
    Space,
}

impl GroupBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupBy::Type => "type",
            GroupBy::Storey => "storey",
            GroupBy::Space => "space",
        }
    }

    /// Column of `ifc_elements` holding the group label
    fn column(&self) -> &'static str {
        match self {
            GroupBy::Type => "ifc_type",
            GroupBy::Storey => "storey",
            GroupBy::Space => "space",
        }
    }
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupBy {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "type" => Ok(GroupBy::Type),
            "storey" => Ok(GroupBy::Storey),
            "space" => Ok(GroupBy::Space),
            _ => Err(StoreError::InvalidGroupBy(s.to_string())),
        }
    }
}

/// A quantity summary request
#[derive(Clone, Debug, PartialEq)]
pub struct SummaryRequest {
    pub model_id: String,
    pub project_id: String,
    pub group_by: GroupBy,
    /// Requested quantity types; empty means AREA, LENGTH and VOLUME
    pub quantity_types: Vec<QuantityType>,
    /// Exact element type, e.g. `IfcWall`
    pub filter_type: Option<String>,
    /// Exact quantity name, e.g. `NetSideArea`
    pub filter_name: Option<String>,
}

impl SummaryRequest {
    /// Summary of one model grouped by element type
    pub fn new(model_id: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            project_id: project_id.into(),
            group_by: GroupBy::default(),
            quantity_types: Vec::new(),
            filter_type: None,
            filter_name: None,
        }
    }

    pub fn with_group_by(mut self, group_by: GroupBy) -> Self {
        self.group_by = group_by;
        self
    }

    pub fn with_quantity_types(mut self, types: impl IntoIterator<Item = QuantityType>) -> Self {
        self.quantity_types = types.into_iter().collect();
        self
    }

    pub fn with_filter_type(mut self, ifc_type: impl Into<String>) -> Self {
        self.filter_type = Some(ifc_type.into());
        self
    }

    pub fn with_filter_name(mut self, name: impl Into<String>) -> Self {
        self.filter_name = Some(name.into());
        self
    }

    /// The quantity types actually queried, deduplicated
    pub fn effective_quantity_types(&self) -> Vec<QuantityType> {
        if self.quantity_types.is_empty() {
            return QuantityType::DEFAULT_SUMMARY.to_vec();
        }
        let mut types = Vec::with_capacity(self.quantity_types.len());
        for t in &self.quantity_types {
            if !types.contains(t) {
                types.push(*t);
            }
        }
        types
    }
}

/// One summed quantity of one group
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantitySummaryRow {
    pub group: String,
    pub quantity_type: QuantityType,
    pub name: String,
    pub source: QuantitySource,
    pub unit: Option<String>,
    pub value: f64,
}

impl IndexStore {
    /// Sum a model's quantities per group, quantity type, name, source and unit
    ///
    /// Quantities from different sources are never merged; see
    /// [`prefer_declared`](crate::reconcile::prefer_declared) for an explicit
    /// reconciliation pass.
    pub async fn quantity_summary(&self, request: &SummaryRequest) -> Result<Vec<QuantitySummaryRow>> {
        let quantity_types = request.effective_quantity_types();

        let mut query_builder = QueryBuilder::<Sqlite>::new("SELECT COALESCE(NULLIF(e.");
        query_builder
            .push(request.group_by.column())
            .push(", ''), '")
            .push(UNKNOWN_GROUP)
            .push(
                "') AS group_label, q.quantity_type, q.name, q.source, q.unit, \
                 CAST(SUM(q.value) AS REAL) AS total \
                 FROM ifc_quantities q \
                 JOIN ifc_elements e \
                   ON e.model_id = q.model_id \
                  AND e.project_id = q.project_id \
                  AND e.global_id = q.global_id \
                 WHERE q.model_id = ",
            )
            .push_bind(request.model_id.as_str())
            .push(" AND q.project_id = ")
            .push_bind(request.project_id.as_str())
            .push(" AND q.quantity_type IN (");

        let mut separated = query_builder.separated(", ");
        for quantity_type in &quantity_types {
            separated.push_bind(quantity_type.as_str());
        }
        separated.push_unseparated(")");

        if let Some(ifc_type) = &request.filter_type {
            query_builder.push(" AND e.ifc_type = ").push_bind(ifc_type.as_str());
        }
        if let Some(name) = &request.filter_name {
            query_builder.push(" AND q.name = ").push_bind(name.as_str());
        }

        query_builder.push(
            " GROUP BY group_label, q.quantity_type, q.name, q.source, q.unit \
             ORDER BY group_label, q.quantity_type, q.name, q.source, q.unit",
        );

        let rows = query_builder.build().fetch_all(&self.pool).await?;

        let summary = rows
            .into_iter()
            .map(|row| -> Result<QuantitySummaryRow> {
                Ok(QuantitySummaryRow {
                    group: row.try_get("group_label")?,
                    quantity_type: row.try_get::<String, _>("quantity_type")?.parse()?,
                    name: row.try_get("name")?,
                    source: row.try_get::<String, _>("source")?.parse()?,
                    unit: row.try_get("unit")?,
                    value: row.try_get("total")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        log::debug!(
            "Quantity summary for model {} by {}: {} rows",
            request.model_id,
            request.group_by,
            summary.len()
        );

        Ok(summary)
    }
}
