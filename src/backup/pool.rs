// src/backup/pool.rs

//! Entity pool: typed id allocation and payload storage
//!
//! Ids are allocated per type, starting at 1 and never reused. 0 is kept
//! free because several payload fields use it to mean "no entity".

use super::entities::{Entity, EntityType, PoolEntity};
use crate::error::{Error, Result};
use std::collections::BTreeMap;

/// Store of every entity emitted by one conversion run
#[derive(Debug, Default)]
pub struct EntityPool {
    /// Slot `n` holds entity id `n + 1`; `None` until data is set
    slots: BTreeMap<EntityType, Vec<Option<Entity>>>,
}

impl EntityPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next id for `entity_type`
    pub fn new_entity(&mut self, entity_type: EntityType) -> u32 {
        let slots = self.slots.entry(entity_type).or_default();
        slots.push(None);
        slots.len() as u32
    }

    /// Store (or overwrite) the payload of an allocated id
    pub fn set_data(&mut self, id: u32, entity: Entity) -> Result<()> {
        let entity_type = entity.entity_type();
        let slot = self
            .slots
            .get_mut(&entity_type)
            .and_then(|slots| slots.get_mut((id as usize).wrapping_sub(1)))
            .ok_or_else(|| Error::UnallocatedEntity {
                entity_type: entity_type.to_string(),
                id,
            })?;
        *slot = Some(entity);
        Ok(())
    }

    /// Typed `set_data`
    pub fn set<T: PoolEntity>(&mut self, id: u32, record: T) -> Result<()> {
        self.set_data(id, record.into_entity())
    }

    pub fn get_entity(&self, entity_type: EntityType, id: u32) -> Option<&Entity> {
        if id == 0 {
            return None;
        }
        self.slots
            .get(&entity_type)?
            .get(id as usize - 1)?
            .as_ref()
    }

    /// Payloads of `entity_type` by ascending id; allocated ids without
    /// data are skipped
    pub fn get_entities(&self, entity_type: EntityType) -> Vec<&Entity> {
        self.slots
            .get(&entity_type)
            .map(|slots| slots.iter().flatten().collect())
            .unwrap_or_default()
    }

    pub fn get<T: PoolEntity>(&self, id: u32) -> Option<&T> {
        self.get_entity(T::TYPE, id).and_then(T::from_entity)
    }

    pub fn all<T: PoolEntity>(&self) -> Vec<&T> {
        self.get_entities(T::TYPE)
            .into_iter()
            .filter_map(T::from_entity)
            .collect()
    }

    /// Number of ids allocated for `entity_type`
    pub fn count(&self, entity_type: EntityType) -> usize {
        self.slots.get(&entity_type).map_or(0, Vec::len)
    }
}
