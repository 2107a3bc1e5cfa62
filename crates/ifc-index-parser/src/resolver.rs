// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! EntityResolver trait implementation

use crate::scanner::{EntityIndex, EntityScanner};
use crate::tokenizer::parse_entity_at;
use ifc_index_model::{DecodedEntity, EntityId, EntityResolver, IfcType, ParseError, Result};
use rustc_hash::FxHashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, RwLock};

/// Thread-safe entity resolver implementation
pub struct ResolverImpl {
    /// Raw IFC content (owned for thread safety)
    content: String,
    /// Entity ID -> (start, end) byte offsets
    index: EntityIndex,
    /// Decoded entity cache (thread-safe)
    cache: RwLock<FxHashMap<u32, Arc<DecodedEntity>>>,
    /// Type -> entity IDs index, file order
    type_index: FxHashMap<IfcType, Vec<EntityId>>,
}

impl ResolverImpl {
    /// Scan content once, building both the offset and the type index
    pub fn new(content: String) -> Self {
        let mut index = EntityIndex::default();
        let mut type_index: FxHashMap<IfcType, Vec<EntityId>> = FxHashMap::default();

        let mut scanner = EntityScanner::new(&content);
        while let Some((id, type_name, start, end)) = scanner.next_entity() {
            // A repeated id keeps its first definition in both indexes
            if let Entry::Vacant(slot) = index.entry(id) {
                slot.insert((start, end));
                type_index
                    .entry(IfcType::parse(type_name))
                    .or_default()
                    .push(EntityId(id));
            } else {
                log::debug!("Ignoring repeated definition of #{}", id);
            }
        }

        Self {
            content,
            index,
            cache: RwLock::new(FxHashMap::default()),
            type_index,
        }
    }

    /// Get raw content
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Decode an entity, reporting why it could not be decoded
    pub fn try_get(&self, id: EntityId) -> Result<Arc<DecodedEntity>> {
        if let Ok(cache) = self.cache.read() {
            if let Some(cached) = cache.get(&id.0) {
                return Ok(Arc::clone(cached));
            }
        }

        let (start, end) = self
            .index
            .get(&id.0)
            .ok_or(ParseError::EntityNotFound(id))?;

        let entity =
            parse_entity_at(&self.content, *start, *end).map_err(|e| ParseError::entity_parse(id, e))?;
        let arc = Arc::new(entity);

        if let Ok(mut cache) = self.cache.write() {
            cache.insert(id.0, Arc::clone(&arc));
        }

        Ok(arc)
    }

    /// Decode and cache an entity
    fn decode_and_cache(&self, id: EntityId) -> Option<Arc<DecodedEntity>> {
        match self.try_get(id) {
            Ok(entity) => Some(entity),
            Err(ParseError::EntityNotFound(_)) => None,
            Err(e) => {
                log::trace!("{}", e);
                None
            }
        }
    }
}

impl EntityResolver for ResolverImpl {
    fn get(&self, id: EntityId) -> Option<Arc<DecodedEntity>> {
        self.decode_and_cache(id)
    }

    fn entities_by_type(&self, ifc_type: &IfcType) -> Vec<Arc<DecodedEntity>> {
        self.type_index
            .get(ifc_type)
            .map(|ids| ids.iter().filter_map(|id| self.get(*id)).collect())
            .unwrap_or_default()
    }

    fn ids_matching(&self, predicate: &dyn Fn(&IfcType) -> bool) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self
            .type_index
            .iter()
            .filter(|(ifc_type, _)| predicate(ifc_type))
            .flat_map(|(_, ids)| ids.iter().copied())
            .collect();
        ids.sort_unstable();
        ids
    }

    fn count_by_type(&self, ifc_type: &IfcType) -> usize {
        self.type_index.get(ifc_type).map(|v| v.len()).unwrap_or(0)
    }

    fn entity_count(&self) -> usize {
        self.index.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_IFC: &str = r#"ISO-10303-21;
HEADER;
FILE_SCHEMA(('IFC2X3'));
ENDSEC;
DATA;
#1=IFCPROJECT('guid',$,'Project',$,$,$,$,$,#2);
#2=IFCUNITASSIGNMENT((#3));
#3=IFCSIUNIT(*,.LENGTHUNIT.,.MILLI.,.METRE.);
#4=IFCWALL('guid2',$,'Wall 1',$,$,$,$,$);
#5=IFCSLAB('broken',$,,);
#6=IFCWALL('guid3',$,'Wall 2',$,$,$,$,$);
ENDSEC;
END-ISO-10303-21;
"#;

    fn resolver() -> ResolverImpl {
        ResolverImpl::new(TEST_IFC.to_string())
    }

    #[test]
    fn test_resolver_get() {
        let entity = resolver().get(EntityId(1)).unwrap();
        assert_eq!(entity.id, EntityId(1));
        assert_eq!(entity.ifc_type, IfcType::IfcProject);
    }

    #[test]
    fn test_entities_by_type_in_file_order() {
        let walls = resolver().entities_by_type(&IfcType::IfcWall);
        let ids: Vec<_> = walls.iter().map(|w| w.id).collect();
        assert_eq!(ids, vec![EntityId(4), EntityId(6)]);
    }

    #[test]
    fn test_malformed_line_is_unresolvable() {
        let resolver = resolver();
        assert!(resolver.get(EntityId(5)).is_none());
        assert!(matches!(
            resolver.try_get(EntityId(5)),
            Err(ParseError::EntityParse(EntityId(5), _))
        ));
        assert!(matches!(
            resolver.try_get(EntityId(99)),
            Err(ParseError::EntityNotFound(EntityId(99)))
        ));
        // Later lines still resolve
        assert!(resolver.get(EntityId(6)).is_some());
    }

    #[test]
    fn test_ids_matching_sorted() {
        let ids = resolver().ids_matching(&|t| t.is_building_element());
        assert_eq!(ids, vec![EntityId(4), EntityId(5), EntityId(6)]);
    }

    #[test]
    fn test_counts() {
        let resolver = resolver();
        assert_eq!(resolver.entity_count(), 6);
        assert_eq!(resolver.count_by_type(&IfcType::IfcWall), 2);
        assert_eq!(resolver.count_by_type(&IfcType::IfcDoor), 0);
    }

    #[test]
    fn test_repeated_id_keeps_first_definition() {
        let content = "DATA;\n#1=IFCWALL('first',$,'Wall',$,$,$,$,$);\n#1=IFCSLAB('second',$,'Slab',$,$,$,$,$,$);\nENDSEC;\n";
        let resolver = ResolverImpl::new(content.to_string());

        let entity = resolver.get(EntityId(1)).unwrap();
        assert_eq!(entity.ifc_type, IfcType::IfcWall);
        assert_eq!(entity.get_string(0), Some("first"));

        let walls = resolver.entities_by_type(&IfcType::IfcWall);
        assert_eq!(walls.len(), 1);
        assert_eq!(walls[0].ifc_type, IfcType::IfcWall);
        assert!(resolver.entities_by_type(&IfcType::IfcSlab).is_empty());
        assert_eq!(resolver.entity_count(), 1);
    }

    #[test]
    fn test_resolver_thread_safe() {
        use std::thread;

        let resolver = Arc::new(resolver());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let resolver = Arc::clone(&resolver);
                thread::spawn(move || {
                    for id in 1..=6 {
                        let _ = resolver.get(EntityId(id));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
    }
}
