//! Structure registry and the claim surface used by tasks

use glam::Vec2;
use std::collections::BTreeMap;

use crate::city::store::ResourceStore;
use crate::city::structure::Structure;
use crate::core::error::Result;
use crate::core::types::{ResourceBundle, ResourceKind, StructureId};
use crate::reservation::{ClaimStatus, ResourceClaim, WorkspaceClaim, DEFAULT_GRANT_LIFETIME};

/// Storage for all structures, iterated in spawn order
#[derive(Debug, Clone)]
pub struct Structures {
    structures: BTreeMap<StructureId, Structure>,
    next_id: u64,
    grant_lifetime: u32,
    /// Spawned since the last drain; picked up by the world registry
    spawned: Vec<StructureId>,
}

impl Structures {
    pub fn new(grant_lifetime: u32) -> Self {
        Self {
            structures: BTreeMap::new(),
            next_id: 0,
            grant_lifetime,
            spawned: Vec::new(),
        }
    }

    /// Spawn a bare structure with no workspaces or store
    pub fn spawn(&mut self, name: impl Into<String>, position: Vec2) -> StructureId {
        let id = StructureId(self.next_id);
        self.next_id += 1;
        let mut structure = Structure::new(id, name, position);
        structure.set_grant_lifetime(self.grant_lifetime);
        self.structures.insert(id, structure);
        self.spawned.push(id);
        id
    }

    pub fn spawn_warehouse(
        &mut self,
        name: impl Into<String>,
        position: Vec2,
        capacity: f32,
        accepted: impl IntoIterator<Item = ResourceKind>,
    ) -> Result<StructureId> {
        let store = ResourceStore::warehouse(capacity, accepted)?;
        self.spawn_with_store(name, position, store)
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
        let store = ResourceStore::reservoir(quantity, resource, regen_rate)?;
        let id = self.spawn_with_store(name, position, store)?;
        if let Some(structure) = self.structures.get_mut(&id) {
            for offset in workspaces {
                structure.add_workspace(*offset);
            }
        }
        Ok(id)
    }

    /// Drop a decaying pile of `bundle` on the ground
    pub fn spawn_pile(&mut self, position: Vec2, bundle: ResourceBundle, decay_rate: f32) -> Result<StructureId> {
        let store = ResourceStore::dump(bundle, decay_rate)?;
        self.spawn_with_store(format!("{} pile", bundle.resource), position, store)
    }

    fn spawn_with_store(
        &mut self,
        name: impl Into<String>,
        position: Vec2,
        store: ResourceStore,
    ) -> Result<StructureId> {
        let id = self.spawn(name, position);
        if let Some(structure) = self.structures.get_mut(&id) {
            structure.set_store(store)?;
        }
        Ok(id)
    }

    pub fn get(&self, id: StructureId) -> Option<&Structure> {
        self.structures.get(&id)
    }

    pub fn get_mut(&mut self, id: StructureId) -> Option<&mut Structure> {
        self.structures.get_mut(&id)
    }

    pub fn remove(&mut self, id: StructureId) -> Option<Structure> {
        self.structures.remove(&id)
    }

    pub fn contains(&self, id: StructureId) -> bool {
        self.structures.contains_key(&id)
    }

    pub fn position(&self, id: StructureId) -> Option<Vec2> {
        self.structures.get(&id).map(|s| s.position)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Structure> {
        self.structures.values()
    }

    pub fn len(&self) -> usize {
        self.structures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.structures.is_empty()
    }

    pub fn drain_spawned(&mut self) -> Vec<StructureId> {
        std::mem::take(&mut self.spawned)
    }

    /// Remove piles that decayed away; returns their ids
    pub fn remove_spent(&mut self) -> Vec<StructureId> {
        let spent: Vec<StructureId> = self
            .structures
            .values()
            .filter(|s| s.is_spent())
            .map(|s| s.id())
            .collect();
        for id in &spent {
            self.structures.remove(id);
        }
        spent
    }

    /// Total actual content of `resource` across every store
    pub fn total_contents(&self, resource: Option<ResourceKind>) -> f32 {
        self.iter()
            .filter_map(|s| s.store())
            .map(|store| store.get_actual_contents(resource))
            .sum()
    }

    // === WORKSPACE CLAIMS ===

    /// Queue a workspace request; `None` if the structure does not exist
    pub fn reserve_workspace(&mut self, id: StructureId) -> Option<WorkspaceClaim> {
        let structure = self.structures.get_mut(&id)?;
        let reservation = structure.reserve_workspace();
        Some(WorkspaceClaim {
            structure: id,
            reservation,
        })
    }

    pub fn workspace_status(&self, claim: &WorkspaceClaim) -> ClaimStatus {
        self.structures
            .get(&claim.structure)
            .map(|s| s.workspace_status(claim.reservation))
            .unwrap_or(ClaimStatus::Invalid)
    }

    pub fn workspace_position(&self, claim: &WorkspaceClaim) -> Option<Vec2> {
        self.structures
            .get(&claim.structure)?
            .workspace_position(claim.reservation)
    }

    pub fn release_workspace(&mut self, claim: &WorkspaceClaim) {
        if let Some(structure) = self.structures.get_mut(&claim.structure) {
            structure.release_workspace(claim.reservation);
        }
    }

    // === RESOURCE CLAIMS ===

    pub fn resource_status(&self, claim: &ResourceClaim) -> ClaimStatus {
        self.structures
            .get(&claim.structure)
            .and_then(|s| s.store())
            .map(|store| store.reservation_status(claim.reservation))
            .unwrap_or(ClaimStatus::Invalid)
    }

    pub fn release_resource(&mut self, claim: &ResourceClaim) {
        if let Some(store) = self.store_mut(claim.structure) {
            store.release(claim.reservation);
        }
    }

    /// Deposit `quantity` of the claimed kind through a storage claim
    pub fn deposit_reserved(&mut self, claim: &ResourceClaim, quantity: f32) -> bool {
        self.store_mut(claim.structure)
            .is_some_and(|store| store.deposit_reserved(claim.reservation, claim.resource, quantity))
    }

    /// Take the content promised by a ready resource claim
    pub fn withdraw_reserved(&mut self, claim: &ResourceClaim) -> Option<ResourceBundle> {
        self.store_mut(claim.structure)?
            .withdraw_reserved(claim.reservation)
    }

    fn store_mut(&mut self, id: StructureId) -> Option<&mut ResourceStore> {
        self.structures.get_mut(&id)?.store_mut()
    }
}

impl Default for Structures {
    fn default() -> Self {
        Self::new(DEFAULT_GRANT_LIFETIME)
    }
}
