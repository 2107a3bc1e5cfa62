// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Property and quantity line readers

use crate::units::resolve_unit_label;
use ifc_index_model::{
    AttributeValue, DecodedEntity, EntityResolver, IfcType, ProjectUnits, PropertyRecord,
    QuantityRecord, QuantitySource, QuantityType,
};

/// Method tag of quantities read from an IFCELEMENTQUANTITY
pub const METHOD_ELEMENT_QUANTITY: &str = "ifc_element_quantity";

/// Method tag of quantities parsed from a take-off property value
pub const METHOD_PSET_NUMERIC: &str = "pset_numeric_value";

/// One property line, not yet attached to an element
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyLine {
    pub name: String,
    pub value: Option<String>,
    pub unit: Option<String>,
}

/// One classified quantity line, not yet attached to an element
#[derive(Clone, Debug, PartialEq)]
pub struct QuantityLine {
    pub name: String,
    pub value: f64,
    pub unit: Option<String>,
    pub quantity_type: QuantityType,
}

/// The five value fields a quantity line can populate
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct QuantityFields {
    pub area: Option<f64>,
    pub length: Option<f64>,
    pub volume: Option<f64>,
    pub count: Option<f64>,
    pub weight: Option<f64>,
}

impl QuantityFields {
    /// Read the value fields of an IfcQuantity* line
    ///
    /// IFCQUANTITYAREA(Name, Description, Unit, AreaValue, Formula); the
    /// value sits at index 3 for every simple quantity. Time and complex
    /// quantities populate nothing.
    pub fn from_entity(quantity: &DecodedEntity) -> Self {
        let value = quantity.get_float(3);
        let mut fields = Self::default();
        match quantity.ifc_type {
            IfcType::IfcQuantityArea => fields.area = value,
            IfcType::IfcQuantityLength => fields.length = value,
            IfcType::IfcQuantityVolume => fields.volume = value,
            IfcType::IfcQuantityCount => fields.count = value,
            IfcType::IfcQuantityWeight => fields.weight = value,
            _ => {}
        }
        fields
    }

    /// The quantity type and value, when exactly one finite field is set
    pub fn classify(&self) -> Option<(QuantityType, f64)> {
        let populated = [
            (QuantityType::Area, self.area),
            (QuantityType::Length, self.length),
            (QuantityType::Volume, self.volume),
            (QuantityType::Count, self.count),
            (QuantityType::Weight, self.weight),
        ];

        let mut found = populated
            .into_iter()
            .filter_map(|(quantity_type, value)| Some((quantity_type, value?)));

        let first = found.next()?;
        if found.next().is_some() || !first.1.is_finite() {
            return None;
        }
        Some(first)
    }
}

/// Read one quantity line of an IFCELEMENTQUANTITY
///
/// The unit is the line's own unit, else the project default for its type.
pub fn read_quantity(
    resolver: &dyn EntityResolver,
    units: &ProjectUnits,
    quantity: &DecodedEntity,
) -> Option<QuantityLine> {
    let name = quantity.get_non_empty_string(0)?.to_string();
    let (quantity_type, value) = QuantityFields::from_entity(quantity).classify()?;

    let unit = quantity
        .get(2)
        .and_then(|attr| resolve_unit_label(resolver, attr))
        .or_else(|| units.for_quantity(quantity_type).map(str::to_string));

    Some(QuantityLine {
        name,
        value,
        unit,
        quantity_type,
    })
}

/// Read one property line of an IFCPROPERTYSET
pub fn read_property(resolver: &dyn EntityResolver, property: &DecodedEntity) -> Option<PropertyLine> {
    let name = property.get_non_empty_string(0)?.to_string();

    let (value, unit_attr) = match property.ifc_type {
        // (Name, Description, NominalValue, Unit)
        IfcType::IfcPropertySingleValue => (property.get(2).and_then(format_value), property.get(3)),
        // (Name, Description, EnumerationValues, EnumerationReference)
        IfcType::IfcPropertyEnumeratedValue => (property.get(2).and_then(format_value), None),
        // (Name, Description, ListValues, Unit)
        IfcType::IfcPropertyListValue => (property.get(2).and_then(format_value), property.get(3)),
        // (Name, Description, UpperBoundValue, LowerBoundValue, Unit, ...)
        IfcType::IfcPropertyBoundedValue => {
            let upper = property.get(2).and_then(format_value);
            let lower = property.get(3).and_then(format_value);
            let value = match (lower, upper) {
                (Some(l), Some(u)) => Some(format!("{} - {}", l, u)),
                (Some(l), None) => Some(format!(">= {}", l)),
                (None, Some(u)) => Some(format!("<= {}", u)),
                (None, None) => None,
            };
            (value, property.get(4))
        }
        _ => return None,
    };

    let unit = unit_attr.and_then(|attr| resolve_unit_label(resolver, attr));

    Some(PropertyLine { name, value, unit })
}

/// Serialize an attribute value for the property table
///
/// Returns `None` for `$`, `*` and references.
pub fn format_value(attr: &AttributeValue) -> Option<String> {
    match attr {
        AttributeValue::String(s) => Some(s.clone()),
        AttributeValue::Integer(i) => Some(i.to_string()),
        AttributeValue::Float(f) => Some(f.to_string()),
        AttributeValue::Enum(e) => Some(format_enum(e)),
        AttributeValue::TypedValue(_, args) => args.first().and_then(format_value),
        AttributeValue::List(items) => {
            let parts: Vec<String> = items.iter().filter_map(format_value).collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        AttributeValue::Null | AttributeValue::Derived | AttributeValue::EntityRef(_) => None,
    }
}

/// Booleans and logicals are written out; other enumerations stay as is
fn format_enum(value: &str) -> String {
    match value {
        "T" => "TRUE".to_string(),
        "F" => "FALSE".to_string(),
        "U" => "UNKNOWN".to_string(),
        other => other.to_string(),
    }
}

/// Turn a take-off property into a quantity row
///
/// Only properties of the reserved take-off set qualify, and only when their
/// value parses as a finite number. The property row is kept either way, so a
/// qualifying property ends up in both tables.
pub fn extract_takeoff_quantity_if_applicable(
    takeoff_pset: &str,
    property: &PropertyRecord,
) -> Option<QuantityRecord> {
    if property.pset_name != takeoff_pset {
        return None;
    }

    let raw = property.value.as_deref()?.trim();
    let value: f64 = lexical_core::parse(raw.as_bytes()).ok()?;
    if !value.is_finite() {
        return None;
    }

    Some(QuantityRecord {
        global_id: property.global_id.clone(),
        qto_set: Some(property.pset_name.clone()),
        name: property.prop_name.clone(),
        value,
        unit: property.unit.clone(),
        source: QuantitySource::PsetQto,
        method: Some(METHOD_PSET_NUMERIC.to_string()),
        quantity_type: QuantityType::from_property_name(&property.prop_name),
    })
}
