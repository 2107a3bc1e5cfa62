// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core types for IFC data representation
//!
//! This module defines the fundamental types used throughout the indexing system.

use rustc_hash::FxHashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Type-safe entity identifier
///
/// Wraps the raw IFC entity ID (e.g., #123 becomes EntityId(123))
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, PartialOrd, Ord)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u32> for EntityId {
    fn from(id: u32) -> Self {
        EntityId(id)
    }
}

impl From<EntityId> for u32 {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

/// Declares the closed set of IFC classes the indexer distinguishes.
///
/// Each variant's name is its canonical IFC spelling, which is also the type
/// name written to the index. Classes listed under `elements` are the
/// physical elements that get an element row.
macro_rules! ifc_types {
    (
        elements { $($element:ident),* $(,)? }
        others { $($other:ident),* $(,)? }
    ) => {
        /// IFC entity type enumeration
        ///
        /// Covers the classes the indexer reads. Other types are captured with
        /// their upper-cased name from the file.
        #[derive(Clone, PartialEq, Eq, Hash, Debug)]
        pub enum IfcType {
            $($element,)*
            $($other,)*
            /// Unknown type - stores the upper-cased type name
            Unknown(String),
        }

        impl IfcType {
            fn all_known() -> Vec<IfcType> {
                vec![$(IfcType::$element,)* $(IfcType::$other,)*]
            }

            /// Canonical type name, e.g. `IfcWallStandardCase`
            pub fn name(&self) -> &str {
                match self {
                    $(IfcType::$element => stringify!($element),)*
                    $(IfcType::$other => stringify!($other),)*
                    IfcType::Unknown(s) => s,
                }
            }

            /// Check if this type is a physical element that belongs in the index
            ///
            /// Spatial structure, openings and virtual elements are not.
            pub fn is_building_element(&self) -> bool {
                matches!(self, $(IfcType::$element)|*)
            }
        }
    };
}

ifc_types! {
    elements {
        // Building elements
        IfcWall,
        IfcWallStandardCase,
        IfcWallElementedCase,
        IfcCurtainWall,
        IfcSlab,
        IfcSlabStandardCase,
        IfcSlabElementedCase,
        IfcRoof,
        IfcBeam,
        IfcBeamStandardCase,
        IfcColumn,
        IfcColumnStandardCase,
        IfcDoor,
        IfcDoorStandardCase,
        IfcWindow,
        IfcWindowStandardCase,
        IfcStair,
        IfcStairFlight,
        IfcRamp,
        IfcRampFlight,
        IfcRailing,
        IfcCovering,
        IfcPlate,
        IfcPlateStandardCase,
        IfcMember,
        IfcMemberStandardCase,
        IfcFooting,
        IfcPile,
        IfcChimney,
        IfcShadingDevice,
        IfcBuildingElementProxy,
        IfcElementAssembly,
        IfcCivilElement,
        IfcGeographicElement,

        // Element components
        IfcBuildingElementPart,
        IfcReinforcingBar,
        IfcReinforcingMesh,
        IfcTendon,
        IfcTendonAnchor,
        IfcDiscreteAccessory,
        IfcFastener,
        IfcMechanicalFastener,
        IfcVibrationIsolator,

        // Furnishing and transport
        IfcFurnishingElement,
        IfcFurniture,
        IfcSystemFurnitureElement,
        IfcTransportElement,

        // Distribution elements
        IfcDistributionElement,
        IfcDistributionFlowElement,
        IfcDistributionChamberElement,
        IfcDistributionControlElement,

        // Control elements
        IfcActuator,
        IfcAlarm,
        IfcController,
        IfcFlowInstrument,
        IfcProtectiveDeviceTrippingUnit,
        IfcSensor,
        IfcUnitaryControlElement,

        // Energy conversion devices
        IfcEnergyConversionDevice,
        IfcAirToAirHeatRecovery,
        IfcBoiler,
        IfcBurner,
        IfcChiller,
        IfcCoil,
        IfcCondenser,
        IfcCooledBeam,
        IfcCoolingTower,
        IfcElectricGenerator,
        IfcElectricMotor,
        IfcEngine,
        IfcEvaporativeCooler,
        IfcEvaporator,
        IfcHeatExchanger,
        IfcHumidifier,
        IfcMotorConnection,
        IfcSolarDevice,
        IfcTransformer,
        IfcTubeBundle,
        IfcUnitaryEquipment,

        // Flow controllers
        IfcFlowController,
        IfcAirTerminalBox,
        IfcDamper,
        IfcElectricDistributionBoard,
        IfcElectricTimeControl,
        IfcFlowMeter,
        IfcProtectiveDevice,
        IfcSwitchingDevice,
        IfcValve,

        // Flow fittings
        IfcFlowFitting,
        IfcCableCarrierFitting,
        IfcCableFitting,
        IfcDuctFitting,
        IfcJunctionBox,
        IfcPipeFitting,

        // Flow moving devices
        IfcFlowMovingDevice,
        IfcCompressor,
        IfcFan,
        IfcPump,

        // Flow segments
        IfcFlowSegment,
        IfcCableCarrierSegment,
        IfcCableSegment,
        IfcDuctSegment,
        IfcPipeSegment,

        // Flow storage devices
        IfcFlowStorageDevice,
        IfcElectricFlowStorageDevice,
        IfcTank,

        // Flow terminals
        IfcFlowTerminal,
        IfcAirTerminal,
        IfcAudioVisualAppliance,
        IfcCommunicationsAppliance,
        IfcElectricAppliance,
        IfcFireSuppressionTerminal,
        IfcLamp,
        IfcLightFixture,
        IfcMedicalDevice,
        IfcOutlet,
        IfcSanitaryTerminal,
        IfcSpaceHeater,
        IfcStackTerminal,
        IfcWasteTerminal,

        // Flow treatment devices
        IfcFlowTreatmentDevice,
        IfcDuctSilencer,
        IfcFilter,
        IfcInterceptor,
    }
    others {
        // Spatial structure
        IfcProject,
        IfcSite,
        IfcBuilding,
        IfcBuildingStorey,
        IfcSpace,

        // Openings and non-physical elements
        IfcOpeningElement,
        IfcOpeningStandardCase,
        IfcVirtualElement,

        // Relationships
        IfcRelContainedInSpatialStructure,
        IfcRelAggregates,
        IfcRelDefinesByProperties,
        IfcRelDefinesByType,

        // Properties
        IfcPropertySet,
        IfcPropertySingleValue,
        IfcPropertyEnumeratedValue,
        IfcPropertyBoundedValue,
        IfcPropertyListValue,
        IfcComplexProperty,

        // Quantities
        IfcElementQuantity,
        IfcQuantityLength,
        IfcQuantityArea,
        IfcQuantityVolume,
        IfcQuantityCount,
        IfcQuantityWeight,
        IfcQuantityTime,
        IfcPhysicalComplexQuantity,

        // Units
        IfcUnitAssignment,
        IfcSIUnit,
        IfcConversionBasedUnit,
        IfcDerivedUnit,
        IfcMonetaryUnit,
    }
}

fn known_types() -> &'static FxHashMap<String, IfcType> {
    static TABLE: OnceLock<FxHashMap<String, IfcType>> = OnceLock::new();
    TABLE.get_or_init(|| {
        IfcType::all_known()
            .into_iter()
            .map(|t| (t.name().to_ascii_uppercase(), t))
            .collect()
    })
}

impl FromStr for IfcType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl IfcType {
    /// Parse a type name string into an IfcType (case-insensitive)
    pub fn parse(s: &str) -> Self {
        let upper = s.to_ascii_uppercase();
        match known_types().get(&upper) {
            Some(known) => known.clone(),
            None => IfcType::Unknown(upper),
        }
    }

    /// Check if this type is a spatial structure element
    pub fn is_spatial(&self) -> bool {
        matches!(
            self,
            IfcType::IfcProject
                | IfcType::IfcSite
                | IfcType::IfcBuilding
                | IfcType::IfcBuildingStorey
                | IfcType::IfcSpace
        )
    }
}

impl Default for IfcType {
    fn default() -> Self {
        IfcType::Unknown(String::new())
    }
}

impl fmt::Display for IfcType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Decoded attribute value
///
/// Represents any value that can appear in an IFC entity's attribute list.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum AttributeValue {
    /// Null value ($)
    #[default]
    Null,
    /// Derived value (*)
    Derived,
    /// Entity reference (#123)
    EntityRef(EntityId),
    /// Integer value
    Integer(i64),
    /// Floating point value
    Float(f64),
    /// String value, STEP escapes already decoded
    String(String),
    /// Enumeration value (.VALUE.)
    Enum(String),
    /// List of values
    List(Vec<AttributeValue>),
    /// Typed value like IFCLABEL('text')
    TypedValue(String, Vec<AttributeValue>),
}

impl AttributeValue {
    /// Try to get as entity reference
    pub fn as_entity_ref(&self) -> Option<EntityId> {
        match self {
            AttributeValue::EntityRef(id) => Some(*id),
            _ => None,
        }
    }

    /// Try to get as string
    pub fn as_string(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            AttributeValue::TypedValue(_, args) if !args.is_empty() => args[0].as_string(),
            _ => None,
        }
    }

    /// Try to get as float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            AttributeValue::Float(f) => Some(*f),
            AttributeValue::Integer(i) => Some(*i as f64),
            AttributeValue::TypedValue(_, args) if !args.is_empty() => args[0].as_float(),
            _ => None,
        }
    }

    /// Try to get as enum string
    pub fn as_enum(&self) -> Option<&str> {
        match self {
            AttributeValue::Enum(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as list
    pub fn as_list(&self) -> Option<&[AttributeValue]> {
        match self {
            AttributeValue::List(list) => Some(list),
            _ => None,
        }
    }

    /// Check if this is a null value
    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }
}

/// Decoded IFC entity
///
/// Represents a fully decoded IFC entity with its ID, type, and attribute values.
#[derive(Clone, Debug)]
pub struct DecodedEntity {
    /// Entity ID
    pub id: EntityId,
    /// Entity type
    pub ifc_type: IfcType,
    /// Attribute values in order
    pub attributes: Vec<AttributeValue>,
}

impl DecodedEntity {
    /// Get attribute at index
    pub fn get(&self, index: usize) -> Option<&AttributeValue> {
        self.attributes.get(index)
    }

    /// Get entity reference at index
    pub fn get_ref(&self, index: usize) -> Option<EntityId> {
        self.get(index).and_then(|v| v.as_entity_ref())
    }

    /// Get string at index
    pub fn get_string(&self, index: usize) -> Option<&str> {
        self.get(index).and_then(|v| v.as_string())
    }

    /// Get a string at index, treating the empty string as absent
    pub fn get_non_empty_string(&self, index: usize) -> Option<&str> {
        self.get_string(index).filter(|s| !s.trim().is_empty())
    }

    /// Get float at index
    pub fn get_float(&self, index: usize) -> Option<f64> {
        self.get(index).and_then(|v| v.as_float())
    }

    /// Get list at index
    pub fn get_list(&self, index: usize) -> Option<&[AttributeValue]> {
        self.get(index).and_then(|v| v.as_list())
    }

    /// Get enum string at index
    pub fn get_enum(&self, index: usize) -> Option<&str> {
        self.get(index).and_then(|v| v.as_enum())
    }

    /// Get list of entity references at index
    pub fn get_refs(&self, index: usize) -> Option<Vec<EntityId>> {
        self.get_list(index)
            .map(|list| list.iter().filter_map(|v| v.as_entity_ref()).collect())
    }
}

/// Model metadata extracted from the IFC header
#[derive(Clone, Debug, Default)]
pub struct ModelMetadata {
    /// IFC schema version (e.g., "IFC2X3", "IFC4", "IFC4X3")
    pub schema_version: String,
    /// File name from header
    pub file_name: Option<String>,
    /// Timestamp
    pub timestamp: Option<String>,
    /// Originating system (CAD application)
    pub originating_system: Option<String>,
}
