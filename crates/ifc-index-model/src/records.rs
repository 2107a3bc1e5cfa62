// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Rows produced by one indexing run
//!
//! Records carry no model or project id; the writer scopes them when they are
//! persisted, so the same extraction can be stored under any key.

use crate::{QuantitySource, QuantityType};
use serde::{Deserialize, Serialize};

/// One building element
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementRecord {
    /// IFC GlobalId, unique within the model
    pub global_id: String,
    /// Model-local numeric handle (#123 -> 123)
    pub express_id: u32,
    /// Canonical IFC class name, e.g. `IfcWall`
    pub ifc_type: String,
    pub name: Option<String>,
    /// Name of the containing storey
    pub storey: Option<String>,
    /// Name of the containing space
    pub space: Option<String>,
}

/// One property of one property set attached to one element
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyRecord {
    pub global_id: String,
    pub pset_name: String,
    pub prop_name: String,
    /// String-serialized value; absent for `$`
    pub value: Option<String>,
    pub unit: Option<String>,
}

/// One quantity occurrence attached to one element
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantityRecord {
    pub global_id: String,
    /// Name of the owning quantity collection or take-off set
    pub qto_set: Option<String>,
    pub name: String,
    pub value: f64,
    pub unit: Option<String>,
    pub source: QuantitySource,
    /// Extraction method tag
    pub method: Option<String>,
    pub quantity_type: QuantityType,
}

/// The three row sets of one model's index
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedIndex {
    pub elements: Vec<ElementRecord>,
    pub properties: Vec<PropertyRecord>,
    pub quantities: Vec<QuantityRecord>,
}

impl ExtractedIndex {
    /// Check if no rows were produced
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty() && self.properties.is_empty() && self.quantities.is_empty()
    }

    /// Row counts in the shape reported to callers
    pub fn counts(&self) -> IndexCounts {
        IndexCounts {
            objects: self.elements.len(),
            quantities: self.quantities.len(),
            psets: self.properties.len(),
        }
    }
}

/// Number of rows written by one indexing run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexCounts {
    /// Element rows
    pub objects: usize,
    /// Quantity rows
    pub quantities: usize,
    /// Property rows
    pub psets: usize,
}
