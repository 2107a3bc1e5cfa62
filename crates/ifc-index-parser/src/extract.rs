// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Element, property and quantity extraction
//!
//! One pass over the building elements produces the element rows; one pass
//! over IFCRELDEFINESBYPROPERTIES produces the property and quantity rows.
//! Lines that cannot be resolved are skipped and counted, never fatal.

use crate::properties::{
    extract_takeoff_quantity_if_applicable, read_property, read_quantity, METHOD_ELEMENT_QUANTITY,
};
use crate::spatial::{ContainmentPolicy, SpatialIndex};
use ifc_index_model::{
    DecodedEntity, ElementRecord, EntityId, EntityResolver, EntityResolverExt, ExtractedIndex,
    IfcModel, IfcType, ProjectUnits, PropertyDefinition, PropertyRecord, QuantityRecord,
    QuantitySource,
};
use rustc_hash::{FxHashMap, FxHashSet};

/// Name of the property set whose numeric values are also quantities
pub const DEFAULT_TAKEOFF_PSET: &str = "Pset_QuantityTakeOff";

/// Extraction options
#[derive(Clone, Debug)]
pub struct ExtractOptions {
    /// Tie-break for elements contained twice
    pub containment: ContainmentPolicy,
    /// Reserved take-off property set name
    pub takeoff_pset: String,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            containment: ContainmentPolicy::default(),
            takeoff_pset: DEFAULT_TAKEOFF_PSET.to_string(),
        }
    }
}

impl ExtractOptions {
    /// Create options with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the containment policy
    pub fn with_containment(mut self, policy: ContainmentPolicy) -> Self {
        self.containment = policy;
        self
    }

    /// Set the reserved take-off property set name
    pub fn with_takeoff_pset(mut self, name: impl Into<String>) -> Self {
        self.takeoff_pset = name.into();
        self
    }
}

/// Extract the three row sets of a model's index
pub fn extract_index(model: &dyn IfcModel, options: &ExtractOptions) -> ExtractedIndex {
    let resolver = model.resolver();
    let spatial = SpatialIndex::build(resolver, options.containment);

    let mut extractor = Extractor {
        resolver,
        units: model.units(),
        options,
        global_ids: FxHashMap::default(),
        skipped: 0,
    };

    let mut index = ExtractedIndex {
        elements: extractor.elements(&spatial),
        ..Default::default()
    };
    extractor.relationships(&mut index);

    log::debug!(
        "Extracted {} elements, {} properties, {} quantities ({} lines skipped)",
        index.elements.len(),
        index.properties.len(),
        index.quantities.len(),
        extractor.skipped
    );

    index
}

struct Extractor<'a> {
    resolver: &'a dyn EntityResolver,
    units: &'a ProjectUnits,
    options: &'a ExtractOptions,
    /// Related object -> GlobalId, resolved once
    global_ids: FxHashMap<EntityId, Option<String>>,
    skipped: usize,
}

impl<'a> Extractor<'a> {
    /// Element pass
    fn elements(&mut self, spatial: &SpatialIndex) -> Vec<ElementRecord> {
        let mut elements = Vec::new();
        let mut seen = FxHashSet::default();

        for id in self.resolver.ids_matching(&IfcType::is_building_element) {
            let Some(entity) = self.resolver.get(id) else {
                self.skipped += 1;
                continue;
            };

            let Some(global_id) = entity.get_non_empty_string(0) else {
                self.skipped += 1;
                continue;
            };

            if !seen.insert(global_id.to_string()) {
                log::warn!("Duplicate GlobalId {} on {}, keeping the first element", global_id, id);
                self.skipped += 1;
                continue;
            }

            elements.push(ElementRecord {
                global_id: global_id.to_string(),
                express_id: id.0,
                ifc_type: entity.ifc_type.name().to_string(),
                name: entity.get_non_empty_string(2).map(str::to_string),
                storey: spatial.storey(id).map(str::to_string),
                space: spatial.space(id).map(str::to_string),
            });
        }

        elements
    }

    /// Relationship pass
    fn relationships(&mut self, index: &mut ExtractedIndex) {
        for rel in self.resolver.entities_by_type(&IfcType::IfcRelDefinesByProperties) {
            // RelatedObjects at index 4, RelatingPropertyDefinition at index 5
            let Some(definition) = rel.get_ref(5).and_then(|id| self.resolver.get(id)) else {
                self.skipped += 1;
                continue;
            };

            let related = self.related_global_ids(&rel);
            if related.is_empty() {
                continue;
            }

            match PropertyDefinition::classify(definition) {
                PropertyDefinition::QuantityCollection(qset) => {
                    self.quantity_collection(&qset, &related, &mut index.quantities)
                }
                PropertyDefinition::PropertySet(pset) => self.property_set(&pset, &related, index),
                PropertyDefinition::Other(ifc_type) => {
                    log::trace!("Ignoring property definition {} of {}", ifc_type, rel.id);
                }
            }
        }
    }

    /// GlobalIds of a relationship's related objects; unresolvable ones are skipped
    fn related_global_ids(&mut self, rel: &DecodedEntity) -> Vec<String> {
        let mut ids = Vec::new();
        for object in rel.get_refs(4).unwrap_or_default() {
            let resolver = self.resolver;
            let global_id = self
                .global_ids
                .entry(object)
                .or_insert_with(|| resolver.global_id(object));
            match global_id {
                Some(global_id) => ids.push(global_id.clone()),
                None => self.skipped += 1,
            }
        }
        ids
    }

    /// IFCELEMENTQUANTITY(GlobalId, OwnerHistory, Name, Description, MethodOfMeasurement, Quantities)
    fn quantity_collection(
        &mut self,
        qset: &DecodedEntity,
        related: &[String],
        out: &mut Vec<QuantityRecord>,
    ) {
        let qto_set = qset.get_non_empty_string(2).map(str::to_string);

        let refs = qset.get_refs(5).unwrap_or_default();
        let mut lines = Vec::with_capacity(refs.len());
        for id in refs {
            match self
                .resolver
                .get(id)
                .and_then(|q| read_quantity(self.resolver, self.units, &q))
            {
                Some(line) => lines.push(line),
                None => self.skipped += 1,
            }
        }

        for global_id in related {
            for line in &lines {
                out.push(QuantityRecord {
                    global_id: global_id.clone(),
                    qto_set: qto_set.clone(),
                    name: line.name.clone(),
                    value: line.value,
                    unit: line.unit.clone(),
                    source: QuantitySource::IfcQto,
                    method: Some(METHOD_ELEMENT_QUANTITY.to_string()),
                    quantity_type: line.quantity_type,
                });
            }
        }
    }

    /// IFCPROPERTYSET(GlobalId, OwnerHistory, Name, Description, HasProperties)
    fn property_set(&mut self, pset: &DecodedEntity, related: &[String], index: &mut ExtractedIndex) {
        let Some(pset_name) = pset.get_non_empty_string(2) else {
            self.skipped += 1;
            return;
        };

        let refs = pset.get_refs(4).unwrap_or_default();
        let mut lines = Vec::with_capacity(refs.len());
        for id in refs {
            match self.resolver.get(id).and_then(|p| read_property(self.resolver, &p)) {
                Some(line) => lines.push(line),
                None => self.skipped += 1,
            }
        }

        for global_id in related {
            for line in &lines {
                let property = PropertyRecord {
                    global_id: global_id.clone(),
                    pset_name: pset_name.to_string(),
                    prop_name: line.name.clone(),
                    value: line.value.clone(),
                    unit: line.unit.clone(),
                };

                if let Some(quantity) =
                    extract_takeoff_quantity_if_applicable(&self.options.takeoff_pset, &property)
                {
                    index.quantities.push(quantity);
                }
                index.properties.push(property);
            }
        }
    }
}
