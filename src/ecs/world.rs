//! World - owns every actor and structure and the order they update in

use ahash::AHashMap;
use glam::Vec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;

use crate::city::structures::Structures;
use crate::core::config::SimulationConfig;
use crate::core::error::{Result, SettlementError};
use crate::core::types::{ActorId, ResourceKind, StructureId, Tick};
use crate::entity::actor::Actor;
use crate::entity::orders::Order;

/// An entry in the update registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityRef {
    Actor(ActorId),
    Structure(StructureId),
}

/// The simulation world
#[derive(Debug)]
pub struct World {
    pub current_tick: Tick,
    /// Update order: entities run in the order they were added
    registry: Vec<EntityRef>,
    actors: BTreeMap<ActorId, Actor>,
    actor_names: AHashMap<String, ActorId>,
    pub structures: Structures,
    pub config: SimulationConfig,
    pub(crate) rng: ChaCha8Rng,
    next_actor: u64,
}

impl World {
    /// Create an empty world, rejecting an invalid config
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_config(config))
    }

    fn with_config(config: SimulationConfig) -> Self {
        Self {
            current_tick: 0,
            registry: Vec::new(),
            actors: BTreeMap::new(),
            actor_names: AHashMap::new(),
            structures: Structures::new(config.reservation_lifetime),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            next_actor: 0,
        }
    }

    pub fn spawn_actor(&mut self, name: impl Into<String>, position: Vec2) -> ActorId {
        let id = ActorId(self.next_actor);
        self.next_actor += 1;
        let actor = Actor::new(id, name, position, self.config.move_speed);
        self.actor_names.insert(actor.name.clone(), id);
        self.actors.insert(id, actor);
        self.registry.push(EntityRef::Actor(id));
        id
    }

    /// Remove an actor, canceling its order so no claim outlives it
    pub fn despawn_actor(&mut self, id: ActorId) -> Option<Actor> {
        let mut actor = self.actors.remove(&id)?;
        actor.clear_order(&mut self.structures);
        self.registry.retain(|entry| *entry != EntityRef::Actor(id));
        if self.actor_names.get(&actor.name) == Some(&id) {
            self.actor_names.remove(&actor.name);
        }
        Some(actor)
    }

    pub fn spawn_structure(&mut self, name: impl Into<String>, position: Vec2) -> StructureId {
        let id = self.structures.spawn(name, position);
        self.sync_spawned();
        id
    }

    pub fn spawn_warehouse(
        &mut self,
        name: impl Into<String>,
        position: Vec2,
        capacity: f32,
        accepted: impl IntoIterator<Item = ResourceKind>,
    ) -> Result<StructureId> {
        let id = self.structures.spawn_warehouse(name, position, capacity, accepted)?;
        self.sync_spawned();
        Ok(id)
    }

    pub fn spawn_reservoir(
        &mut self,
        name: impl Into<String>,
        position: Vec2,
        quantity: f32,
        resource: ResourceKind,
        regen_rate: f32,
        workspaces: &[Vec2],
    ) -> Result<StructureId> {
        let id = self
            .structures
            .spawn_reservoir(name, position, quantity, resource, regen_rate, workspaces)?;
        self.sync_spawned();
        Ok(id)
    }

    /// Remove a structure; claims on it become invalid
    pub fn despawn_structure(&mut self, id: StructureId) -> bool {
        self.registry.retain(|entry| *entry != EntityRef::Structure(id));
        self.structures.remove(id).is_some()
    }

    /// Register structures spawned since the last sync
    pub(crate) fn sync_spawned(&mut self) {
        for id in self.structures.drain_spawned() {
            self.registry.push(EntityRef::Structure(id));
        }
    }

    /// Forget structures already removed from storage
    pub(crate) fn forget_structures(&mut self, removed: &[StructureId]) {
        self.registry.retain(|entry| match entry {
            EntityRef::Structure(id) => !removed.contains(id),
            EntityRef::Actor(_) => true,
        });
    }

    pub fn set_order(&mut self, id: ActorId, order: Order) -> Result<()> {
        let actor = self
            .actors
            .get_mut(&id)
            .ok_or(SettlementError::ActorNotFound(id))?;
        actor.set_order(order, &mut self.structures);
        Ok(())
    }

    pub fn clear_order(&mut self, id: ActorId) -> Result<()> {
        let actor = self
            .actors
            .get_mut(&id)
            .ok_or(SettlementError::ActorNotFound(id))?;
        actor.clear_order(&mut self.structures);
        Ok(())
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(&id)
    }

    pub fn actor_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.get_mut(&id)
    }

    pub fn actor_by_name(&self, name: &str) -> Option<&Actor> {
        self.actor_names.get(name).and_then(|id| self.actors.get(id))
    }

    pub fn actors(&self) -> impl Iterator<Item = &Actor> {
        self.actors.values()
    }

    pub(crate) fn take_actor(&mut self, id: ActorId) -> Option<Actor> {
        self.actors.remove(&id)
    }

    pub(crate) fn restore_actor(&mut self, actor: Actor) {
        self.actors.insert(actor.id(), actor);
    }

    pub fn registry(&self) -> &[EntityRef] {
        &self.registry
    }

    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    pub fn structure_count(&self) -> usize {
        self.structures.len()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::with_config(SimulationConfig::default())
    }
}
