//! Entity/component store.
//!
//! A thin layer over `hecs::World` that adds creation-order tracking, so
//! queries return entities in a stable order frame to frame, and the small
//! API the rest of the simulation (and the UI/renderer) is written against.

use std::collections::HashMap;

use hecs::{Component, DynamicBundle, Entity, NoSuchEntity, Query, Ref, RefMut};

/// The game world containing all entities
pub struct World {
    ecs: hecs::World,
    /// Creation sequence of every live entity
    order: HashMap<Entity, u64>,
    next_order: u64,
}

impl World {
    pub fn new() -> Self {
        Self {
            ecs: hecs::World::new(),
            order: HashMap::new(),
            next_order: 0,
        }
    }

    /// Create an entity with no components
    pub fn create(&mut self) -> Entity {
        self.spawn(())
    }

    /// Create an entity with an initial set of components
    pub fn spawn(&mut self, components: impl DynamicBundle) -> Entity {
        let entity = self.ecs.spawn(components);
        self.track(entity);
        entity
    }

    /// Recreate an entity under a specific id. Only used when restoring a
    /// snapshot; any live entity already using the id is replaced.
    pub(crate) fn create_at(&mut self, entity: Entity) {
        self.ecs.spawn_at(entity, ());
        self.track(entity);
    }

    fn track(&mut self, entity: Entity) {
        self.order.insert(entity, self.next_order);
        self.next_order += 1;
    }

    /// Destroy an entity and all of its components. Returns false if it was
    /// already gone. References held elsewhere simply stop resolving.
    pub fn destroy(&mut self, entity: Entity) -> bool {
        self.order.remove(&entity);
        self.ecs.despawn(entity).is_ok()
    }

    /// Authoritative liveness check for cached references
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.ecs.contains(entity)
    }

    /// Attach a component, replacing any existing one of the same type
    pub fn add_component<T: Component>(
        &mut self,
        entity: Entity,
        component: T,
    ) -> Result<(), NoSuchEntity> {
        self.ecs.insert_one(entity, component)
    }

    pub fn get<T: Component>(&self, entity: Entity) -> Option<Ref<'_, T>> {
        self.ecs.get::<&T>(entity).ok()
    }

    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Option<RefMut<'_, T>> {
        self.ecs.get::<&mut T>(entity).ok()
    }

    /// Clone a component out of the world
    pub fn cloned<T: Component + Clone>(&self, entity: Entity) -> Option<T> {
        self.get::<T>(entity).map(|c| (*c).clone())
    }

    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.ecs
            .entity(entity)
            .map(|e| e.has::<T>())
            .unwrap_or(false)
    }

    /// Detach a component, returning it if it was present
    pub fn remove<T: Component>(&mut self, entity: Entity) -> Option<T> {
        self.ecs.remove_one::<T>(entity).ok()
    }

    /// Entities matching `Q`, in creation order
    pub fn query<Q: Query>(&self) -> Vec<Entity> {
        let mut entities: Vec<Entity> = self.ecs.query::<Q>().iter().map(|(e, _)| e).collect();
        self.sort_by_creation(&mut entities);
        entities
    }

    /// All live entities, in creation order
    pub fn entities(&self) -> Vec<Entity> {
        let mut entities: Vec<Entity> = self.order.keys().copied().collect();
        self.sort_by_creation(&mut entities);
        entities
    }

    fn sort_by_creation(&self, entities: &mut [Entity]) {
        entities.sort_by_key(|e| self.order.get(e).copied().unwrap_or(u64::MAX));
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Direct read access to the underlying `hecs` world for bulk iteration
    pub fn ecs(&self) -> &hecs::World {
        &self.ecs
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
