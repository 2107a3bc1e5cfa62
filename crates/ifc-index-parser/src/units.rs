// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Unit labels declared by IFC files
//!
//! Only labels are read; values are never converted between units.

use ifc_index_model::{AttributeValue, DecodedEntity, EntityResolver, IfcType, ProjectUnits};

/// Read the project's default units
///
/// Finds IFCPROJECT and walks its IFCUNITASSIGNMENT. Returns empty units if
/// the file declares none.
pub fn extract_project_units(resolver: &dyn EntityResolver) -> ProjectUnits {
    let mut units = ProjectUnits::default();

    let Some(project) = resolver.entities_by_type(&IfcType::IfcProject).into_iter().next() else {
        return units;
    };

    // IFCPROJECT has UnitsInContext at index 8
    let Some(assignment) = project.get_ref(8).and_then(|id| resolver.get(id)) else {
        return units;
    };

    // IFCUNITASSIGNMENT has Units list at index 0
    for unit in resolver.resolve_ref_list(assignment.get(0).unwrap_or(&AttributeValue::Null)) {
        let Some(label) = unit_label(&unit) else {
            continue;
        };

        // Unit type at index 1 for both SI and conversion based units
        let slot = match unit.get_enum(1) {
            Some("LENGTHUNIT") => &mut units.length,
            Some("AREAUNIT") => &mut units.area,
            Some("VOLUMEUNIT") => &mut units.volume,
            Some("MASSUNIT") => &mut units.weight,
            _ => continue,
        };

        // First declaration of a unit type wins
        if slot.is_none() {
            *slot = Some(label);
        }
    }

    units
}

/// Resolve a unit reference attribute to a readable label
pub fn resolve_unit_label(resolver: &dyn EntityResolver, attr: &AttributeValue) -> Option<String> {
    let unit = resolver.resolve_ref(attr)?;
    unit_label(&unit)
}

/// Readable label for a unit entity
///
/// IFCSIUNIT(*, UnitType, Prefix, Name)
/// IFCCONVERSIONBASEDUNIT(Dimensions, UnitType, Name, ConversionFactor)
pub fn unit_label(unit: &DecodedEntity) -> Option<String> {
    match unit.ifc_type {
        IfcType::IfcSIUnit => {
            let prefix = match unit.get_enum(2).unwrap_or("") {
                "KILO" => "k",
                "HECTO" => "h",
                "DECI" => "d",
                "CENTI" => "c",
                "MILLI" => "m",
                "MICRO" => "µ",
                _ => "",
            };
            let name = unit.get_enum(3)?;
            let symbol = match name {
                "METRE" => "m",
                "SQUARE_METRE" => "m²",
                "CUBIC_METRE" => "m³",
                "GRAM" => "g",
                "SECOND" => "s",
                "KELVIN" => "K",
                "AMPERE" => "A",
                "RADIAN" => "rad",
                "NEWTON" => "N",
                "PASCAL" => "Pa",
                "WATT" => "W",
                _ => name,
            };
            Some(format!("{}{}", prefix, symbol))
        }
        IfcType::IfcConversionBasedUnit => unit.get_non_empty_string(2).map(str::to_string),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ifc_index_model::EntityId;

    fn si_unit(unit_type: &str, prefix: Option<&str>, name: &str) -> DecodedEntity {
        DecodedEntity {
            id: EntityId(1),
            ifc_type: IfcType::IfcSIUnit,
            attributes: vec![
                AttributeValue::Derived,
                AttributeValue::Enum(unit_type.to_string()),
                prefix.map_or(AttributeValue::Null, |p| AttributeValue::Enum(p.to_string())),
                AttributeValue::Enum(name.to_string()),
            ],
        }
    }

    #[test]
    fn test_si_unit_labels() {
        assert_eq!(unit_label(&si_unit("LENGTHUNIT", Some("MILLI"), "METRE")).as_deref(), Some("mm"));
        assert_eq!(unit_label(&si_unit("AREAUNIT", None, "SQUARE_METRE")).as_deref(), Some("m²"));
        assert_eq!(unit_label(&si_unit("MASSUNIT", Some("KILO"), "GRAM")).as_deref(), Some("kg"));
    }

    #[test]
    fn test_conversion_based_unit_label() {
        let unit = DecodedEntity {
            id: EntityId(2),
            ifc_type: IfcType::IfcConversionBasedUnit,
            attributes: vec![
                AttributeValue::EntityRef(EntityId(3)),
                AttributeValue::Enum("LENGTHUNIT".to_string()),
                AttributeValue::String("FOOT".to_string()),
                AttributeValue::EntityRef(EntityId(4)),
            ],
        };
        assert_eq!(unit_label(&unit).as_deref(), Some("FOOT"));
    }

    #[test]
    fn test_other_entities_have_no_label() {
        let wall = DecodedEntity {
            id: EntityId(5),
            ifc_type: IfcType::IfcWall,
            attributes: vec![],
        };
        assert_eq!(unit_label(&wall), None);
    }
}
