// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Quantity classification and property definition variants

use crate::{DecodedEntity, IfcType, UnknownVariant};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Quantity classification stored with every quantity row
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuantityType {
    /// Area measurement (IfcQuantityArea)
    Area,
    /// Linear measurement (IfcQuantityLength)
    Length,
    /// Volume measurement (IfcQuantityVolume)
    Volume,
    /// Count (IfcQuantityCount)
    Count,
    /// Weight/mass measurement (IfcQuantityWeight)
    Weight,
    /// Anything a heuristic could not place
    Other,
}

impl QuantityType {
    /// Types summarized when a request names none
    pub const DEFAULT_SUMMARY: [QuantityType; 3] =
        [QuantityType::Area, QuantityType::Length, QuantityType::Volume];

    /// Stored representation, e.g. `AREA`
    pub fn as_str(&self) -> &'static str {
        match self {
            QuantityType::Area => "AREA",
            QuantityType::Length => "LENGTH",
            QuantityType::Volume => "VOLUME",
            QuantityType::Count => "COUNT",
            QuantityType::Weight => "WEIGHT",
            QuantityType::Other => "OTHER",
        }
    }

    /// Classify a take-off property by its name.
    ///
    /// Case-insensitive substring match, checked in the order
    /// area, length, volume, count. Everything else is `Other`.
    pub fn from_property_name(name: &str) -> Self {
        let lower = name.to_lowercase();
        if lower.contains("area") {
            QuantityType::Area
        } else if lower.contains("length") {
            QuantityType::Length
        } else if lower.contains("volume") {
            QuantityType::Volume
        } else if lower.contains("count") {
            QuantityType::Count
        } else {
            QuantityType::Other
        }
    }
}

impl fmt::Display for QuantityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuantityType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AREA" => Ok(QuantityType::Area),
            "LENGTH" => Ok(QuantityType::Length),
            "VOLUME" => Ok(QuantityType::Volume),
            "COUNT" => Ok(QuantityType::Count),
            "WEIGHT" => Ok(QuantityType::Weight),
            "OTHER" => Ok(QuantityType::Other),
            _ => Err(UnknownVariant::new("quantity type", s)),
        }
    }
}

/// Where a quantity row came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantitySource {
    /// Declared in an engineering quantity collection (IfcElementQuantity)
    IfcQto,
    /// Parsed from the reserved take-off property set
    PsetQto,
    /// Derived value; reserved, never produced by extraction
    Calculated,
}

impl QuantitySource {
    /// Stored representation, e.g. `ifc_qto`
    pub fn as_str(&self) -> &'static str {
        match self {
            QuantitySource::IfcQto => "ifc_qto",
            QuantitySource::PsetQto => "pset_qto",
            QuantitySource::Calculated => "calculated",
        }
    }
}

impl fmt::Display for QuantitySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuantitySource {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ifc_qto" => Ok(QuantitySource::IfcQto),
            "pset_qto" => Ok(QuantitySource::PsetQto),
            "calculated" => Ok(QuantitySource::Calculated),
            _ => Err(UnknownVariant::new("quantity source", s)),
        }
    }
}

/// The definition a "defines by properties" relationship points at,
/// resolved once per relationship.
#[derive(Clone, Debug)]
pub enum PropertyDefinition {
    /// IfcElementQuantity
    QuantityCollection(Arc<DecodedEntity>),
    /// IfcPropertySet
    PropertySet(Arc<DecodedEntity>),
    /// Anything else (type objects, definition sets, ...)
    Other(IfcType),
}

impl PropertyDefinition {
    /// Classify a resolved property definition line
    pub fn classify(entity: Arc<DecodedEntity>) -> Self {
        match entity.ifc_type {
            IfcType::IfcElementQuantity => PropertyDefinition::QuantityCollection(entity),
            IfcType::IfcPropertySet => PropertyDefinition::PropertySet(entity),
            _ => PropertyDefinition::Other(entity.ifc_type.clone()),
        }
    }
}

/// Default unit labels declared by the project's unit assignment
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProjectUnits {
    pub length: Option<String>,
    pub area: Option<String>,
    pub volume: Option<String>,
    pub weight: Option<String>,
}

impl ProjectUnits {
    /// Declared unit label for a quantity type, if the project has one
    pub fn for_quantity(&self, quantity_type: QuantityType) -> Option<&str> {
        match quantity_type {
            QuantityType::Length => self.length.as_deref(),
            QuantityType::Area => self.area.as_deref(),
            QuantityType::Volume => self.volume.as_deref(),
            QuantityType::Weight => self.weight.as_deref(),
            QuantityType::Count | QuantityType::Other => None,
        }
    }
}
