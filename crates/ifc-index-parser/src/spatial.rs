// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Spatial containment resolution
//!
//! Maps every contained element to the name of its storey and its space by
//! walking IFCRELCONTAINEDINSPATIALSTRUCTURE once.

use ifc_index_model::{EntityId, EntityResolver, IfcType, UnknownVariant};
use rustc_hash::FxHashMap;
use std::fmt;
use std::str::FromStr;

/// Which containment relationship wins when an element is contained twice
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ContainmentPolicy {
    /// Keep the first relationship in file order
    FirstWins,
    /// Overwrite with every later relationship
    #[default]
    LastWins,
}

impl ContainmentPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainmentPolicy::FirstWins => "first-wins",
            ContainmentPolicy::LastWins => "last-wins",
        }
    }
}

impl fmt::Display for ContainmentPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContainmentPolicy {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "first-wins" | "first" => Ok(ContainmentPolicy::FirstWins),
            "last-wins" | "last" => Ok(ContainmentPolicy::LastWins),
            _ => Err(UnknownVariant::new("containment policy", s)),
        }
    }
}

/// Element handle -> storey / space name
#[derive(Clone, Debug, Default)]
pub struct SpatialIndex {
    storeys: FxHashMap<EntityId, String>,
    spaces: FxHashMap<EntityId, String>,
}

impl SpatialIndex {
    /// Resolve containment for the whole model
    pub fn build(resolver: &dyn EntityResolver, policy: ContainmentPolicy) -> Self {
        let storey_names = named_structures(resolver, &IfcType::IfcBuildingStorey);
        let space_names = named_structures(resolver, &IfcType::IfcSpace);

        let mut index = Self::default();

        for rel in resolver.entities_by_type(&IfcType::IfcRelContainedInSpatialStructure) {
            // RelatedElements at index 4, RelatingStructure at index 5
            let Some(structure) = rel.get_ref(5) else {
                continue;
            };

            let (target, name) = if let Some(name) = storey_names.get(&structure) {
                (&mut index.storeys, name)
            } else if let Some(name) = space_names.get(&structure) {
                (&mut index.spaces, name)
            } else {
                // Sites, buildings, unnamed structures
                continue;
            };

            for element in rel.get_refs(4).unwrap_or_default() {
                match policy {
                    ContainmentPolicy::LastWins => {
                        target.insert(element, name.clone());
                    }
                    ContainmentPolicy::FirstWins => {
                        target.entry(element).or_insert_with(|| name.clone());
                    }
                }
            }
        }

        log::debug!(
            "Spatial containment: {} storeys, {} spaces, {} elements in storeys, {} in spaces",
            storey_names.len(),
            space_names.len(),
            index.storeys.len(),
            index.spaces.len()
        );

        index
    }

    /// Name of the storey containing an element
    pub fn storey(&self, element: EntityId) -> Option<&str> {
        self.storeys.get(&element).map(String::as_str)
    }

    /// Name of the space containing an element
    pub fn space(&self, element: EntityId) -> Option<&str> {
        self.spaces.get(&element).map(String::as_str)
    }
}

/// Structures of one type that carry a non-empty name (attribute 2)
fn named_structures(resolver: &dyn EntityResolver, ifc_type: &IfcType) -> FxHashMap<EntityId, String> {
    resolver
        .entities_by_type(ifc_type)
        .into_iter()
        .filter_map(|s| Some((s.id, s.get_non_empty_string(2)?.to_string())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ResolverImpl;

    const TEST_IFC: &str = r#"ISO-10303-21;
HEADER;
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#1=IFCBUILDINGSTOREY('s1',$,'L1',$,$,$,$,$,.ELEMENT.,0.);
#2=IFCBUILDINGSTOREY('s2',$,'L2',$,$,$,$,$,.ELEMENT.,3000.);
#3=IFCBUILDINGSTOREY('s3',$,'',$,$,$,$,$,.ELEMENT.,6000.);
#4=IFCSPACE('sp1',$,'Kitchen',$,$,$,$,$,.ELEMENT.,.INTERNAL.,$);
#5=IFCBUILDING('b1',$,'Building',$,$,$,$,$,.ELEMENT.,$,$,$);
#10=IFCWALL('w1',$,'Wall',$,$,$,$,$,$);
#11=IFCSLAB('sl1',$,'Slab',$,$,$,$,$,$);
#12=IFCDOOR('d1',$,'Door',$,$,$,$,$,$,$,$,$,$);
#13=IFCBEAM('b1',$,'Beam',$,$,$,$,$,$);
#20=IFCRELCONTAINEDINSPATIALSTRUCTURE('r1',$,$,$,(#10,#11),#1);
#21=IFCRELCONTAINEDINSPATIALSTRUCTURE('r2',$,$,$,(#11),#2);
#22=IFCRELCONTAINEDINSPATIALSTRUCTURE('r3',$,$,$,(#12),#4);
#23=IFCRELCONTAINEDINSPATIALSTRUCTURE('r4',$,$,$,(#13),#3);
#24=IFCRELCONTAINEDINSPATIALSTRUCTURE('r5',$,$,$,(#13),#5);
ENDSEC;
END-ISO-10303-21;
"#;

    fn build(policy: ContainmentPolicy) -> SpatialIndex {
        let resolver = ResolverImpl::new(TEST_IFC.to_string());
        SpatialIndex::build(&resolver, policy)
    }

    #[test]
    fn test_last_wins() {
        let index = build(ContainmentPolicy::LastWins);
        assert_eq!(index.storey(EntityId(10)), Some("L1"));
        assert_eq!(index.storey(EntityId(11)), Some("L2"));
    }

    #[test]
    fn test_first_wins() {
        let index = build(ContainmentPolicy::FirstWins);
        assert_eq!(index.storey(EntityId(11)), Some("L1"));
    }

    #[test]
    fn test_space_containment() {
        let index = build(ContainmentPolicy::default());
        assert_eq!(index.space(EntityId(12)), Some("Kitchen"));
        assert_eq!(index.storey(EntityId(12)), None);
    }

    #[test]
    fn test_unnamed_or_non_storey_structure_is_absent() {
        let index = build(ContainmentPolicy::default());
        assert_eq!(index.storey(EntityId(13)), None);
        assert_eq!(index.space(EntityId(13)), None);
        assert_eq!(index.storey(EntityId(99)), None);
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("first-wins".parse::<ContainmentPolicy>().unwrap(), ContainmentPolicy::FirstWins);
        assert_eq!("LAST_WINS".parse::<ContainmentPolicy>().unwrap(), ContainmentPolicy::LastWins);
        assert!("middle".parse::<ContainmentPolicy>().is_err());
    }
}
