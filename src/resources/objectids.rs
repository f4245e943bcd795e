use bevy_ecs::prelude::{Entity, Resource};
use rustc_hash::FxHashMap;

use crate::components::worldobject::ObjectId;

/// Allocator and reverse lookup for [`ObjectId`]s.
#[derive(Resource, Debug, Default)]
pub struct ObjectIds {
    next: u32,
    live: FxHashMap<ObjectId, Entity>,
}

impl ObjectIds {
    pub fn allocate(&mut self, entity: Entity) -> ObjectId {
        let id = ObjectId(self.next);
        self.next += 1;
        self.live.insert(id, entity);
        id
    }

    /// Re-register an id read from a save game.
    pub fn restore(&mut self, id: ObjectId, entity: Entity) {
        self.next = self.next.max(id.0 + 1);
        self.live.insert(id, entity);
    }

    pub fn release(&mut self, id: ObjectId) {
        self.live.remove(&id);
    }

    pub fn entity(&self, id: ObjectId) -> Option<Entity> {
        self.live.get(&id).copied()
    }

    pub fn id_of(&self, entity: Entity) -> Option<ObjectId> {
        self.live
            .iter()
            .find_map(|(id, e)| (*e == entity).then_some(*id))
    }

    pub fn next_id(&self) -> u32 {
        self.next
    }

    pub fn clear(&mut self) {
        self.next = 0;
        self.live.clear();
    }
}
