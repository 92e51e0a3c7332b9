//! Structures - stationary world entities with work slots and an optional store

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::city::store::{ResourceStore, StoreMode};
use crate::core::error::{Result, SettlementError};
use crate::core::types::{ReservationId, ResourceKind, StructureId};
use crate::reservation::{ClaimStatus, WorkspaceReservation, DEFAULT_GRANT_LIFETIME};

/// An exclusive physical work slot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workspace {
    /// Position relative to the owning structure
    offset: Vec2,
    reserved: bool,
}

impl Workspace {
    pub fn new(offset: Vec2) -> Self {
        Self {
            offset,
            reserved: false,
        }
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    pub fn is_reserved(&self) -> bool {
        self.reserved
    }

    /// Caller must hold a ready reservation for this slot
    pub fn reserve(&mut self) {
        self.reserved = true;
    }

    pub fn release(&mut self) {
        self.reserved = false;
    }
}

/// A stationary world entity
#[derive(Debug, Clone)]
pub struct Structure {
    id: StructureId,
    pub name: String,
    pub position: Vec2,
    workspaces: Vec<Workspace>,
    /// Pending workspace reservations, served front first
    queue: VecDeque<WorkspaceReservation>,
    /// Ready reservations still bound to a workspace
    tracked: Vec<WorkspaceReservation>,
    store: Option<ResourceStore>,
    grant_lifetime: u32,
    next_reservation: u64,
}

impl Structure {
    pub fn new(id: StructureId, name: impl Into<String>, position: Vec2) -> Self {
        Self {
            id,
            name: name.into(),
            position,
            workspaces: Vec::new(),
            queue: VecDeque::new(),
            tracked: Vec::new(),
            store: None,
            grant_lifetime: DEFAULT_GRANT_LIFETIME,
            next_reservation: 0,
        }
    }

    pub fn id(&self) -> StructureId {
        self.id
    }

    pub fn add_workspace(&mut self, offset: Vec2) -> usize {
        self.workspaces.push(Workspace::new(offset));
        self.workspaces.len() - 1
    }

    pub fn with_workspaces(mut self, offsets: impl IntoIterator<Item = Vec2>) -> Self {
        for offset in offsets {
            self.add_workspace(offset);
        }
        self
    }

    pub fn workspaces(&self) -> &[Workspace] {
        &self.workspaces
    }

    pub fn free_workspaces(&self) -> usize {
        self.workspaces.iter().filter(|w| !w.is_reserved()).count()
    }

    pub fn queued_reservations(&self) -> usize {
        self.queue.len()
    }

    pub fn tracked_reservations(&self) -> usize {
        self.tracked.len()
    }

    pub fn grant_lifetime(&self) -> u32 {
        self.grant_lifetime
    }

    /// Lifetime for reservations issued from now on, including by the store
    pub fn set_grant_lifetime(&mut self, lifetime: u32) {
        self.grant_lifetime = lifetime;
        if let Some(store) = &mut self.store {
            store.set_grant_lifetime(lifetime);
        }
    }

    // === STORAGE ===

    pub fn store(&self) -> Option<&ResourceStore> {
        self.store.as_ref()
    }

    pub fn store_mut(&mut self) -> Option<&mut ResourceStore> {
        self.store.as_mut()
    }

    pub fn store_mode(&self) -> Option<StoreMode> {
        self.store.as_ref().map(|s| s.mode())
    }

    /// Attach a store; a structure owns at most one
    pub fn set_store(&mut self, mut store: ResourceStore) -> Result<()> {
        if self.store.is_some() {
            return Err(SettlementError::StorageAlreadyAssigned(self.name.clone()));
        }
        store.set_grant_lifetime(self.grant_lifetime);
        self.store = Some(store);
        Ok(())
    }

    pub fn set_warehouse(
        &mut self,
        capacity: f32,
        accepted: impl IntoIterator<Item = ResourceKind>,
    ) -> Result<()> {
        self.set_store(ResourceStore::warehouse(capacity, accepted)?)
    }

    pub fn set_reservoir(&mut self, quantity: f32, resource: ResourceKind, regen_rate: f32) -> Result<()> {
        self.set_store(ResourceStore::reservoir(quantity, resource, regen_rate)?)
    }

    /// A ground pile that has decayed away and holds no claims
    pub fn is_spent(&self) -> bool {
        match &self.store {
            Some(store) => {
                store.mode() == StoreMode::Dump && store.is_empty() && store.outstanding_reservations() == 0
            }
            None => false,
        }
    }

    // === WORKSPACES ===

    /// Queue a request for a workspace; never rejected
    pub fn reserve_workspace(&mut self) -> ReservationId {
        let id = ReservationId(self.next_reservation);
        self.next_reservation += 1;
        self.queue.push_back(WorkspaceReservation::new(id));
        id
    }

    fn find_reservation(&self, id: ReservationId) -> Option<&WorkspaceReservation> {
        self.tracked
            .iter()
            .chain(self.queue.iter())
            .find(|r| r.id() == id)
    }

    pub fn workspace_status(&self, id: ReservationId) -> ClaimStatus {
        self.find_reservation(id)
            .map(|r| r.status())
            .unwrap_or(ClaimStatus::Invalid)
    }

    /// World position of the workspace bound to a ready reservation
    pub fn workspace_position(&self, id: ReservationId) -> Option<Vec2> {
        let reservation = self.find_reservation(id).filter(|r| r.is_ready())?;
        let workspace = self.workspaces.get(reservation.workspace()?)?;
        Some(self.position + workspace.offset())
    }

    /// Release a reservation; a bound workspace is freed at once
    pub fn release_workspace(&mut self, id: ReservationId) {
        if let Some(reservation) = self.tracked.iter_mut().find(|r| r.id() == id) {
            reservation.release(&mut self.workspaces);
        } else if let Some(reservation) = self.queue.iter_mut().find(|r| r.id() == id) {
            reservation.release(&mut self.workspaces);
        }
    }

    /// Advance one tick
    ///
    /// Ticks the store, expires tracked reservations, drops invalid requests
    /// at the queue front, then binds at most one queued request to a free
    /// workspace.
    pub fn update(&mut self) {
        if let Some(store) = &mut self.store {
            store.update();
        }

        for reservation in &mut self.tracked {
            if reservation.update(&mut self.workspaces) {
                tracing::debug!("Workspace reservation {:?} on '{}' expired", reservation.id(), self.name);
            }
        }
        self.tracked.retain(|r| r.is_valid());

        while self.queue.front().is_some_and(|r| !r.is_valid()) {
            self.queue.pop_front();
        }

        let Some(slot) = self.workspaces.iter().position(|w| !w.is_reserved()) else {
            return;
        };
        if let Some(mut reservation) = self.queue.pop_front() {
            if reservation.make_ready(slot, &mut self.workspaces, self.grant_lifetime) {
                tracing::debug!("Granted workspace {} on '{}' to {:?}", slot, self.name, reservation.id());
                self.tracked.push(reservation);
            } else {
                self.queue.push_front(reservation);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bush(workspaces: usize) -> Structure {
        Structure::new(StructureId(1), "Berry Bush", Vec2::new(10.0, 0.0))
            .with_workspaces((0..workspaces).map(|i| Vec2::new(i as f32, 1.0)))
    }

    #[test]
    fn test_reserve_workspace_starts_pending() {
        let mut s = bush(1);
        let id = s.reserve_workspace();
        assert_eq!(s.workspace_status(id), ClaimStatus::Pending);
        assert_eq!(s.queued_reservations(), 1);
        assert_eq!(s.free_workspaces(), 1);
    }

    #[test]
    fn test_update_promotes_one_per_tick() {
        let mut s = bush(3);
        let a = s.reserve_workspace();
        let b = s.reserve_workspace();
        let c = s.reserve_workspace();

        s.update();
        assert_eq!(s.workspace_status(a), ClaimStatus::Ready);
        assert_eq!(s.workspace_status(b), ClaimStatus::Pending);
        assert_eq!(s.workspace_status(c), ClaimStatus::Pending);

        s.update();
        assert_eq!(s.workspace_status(b), ClaimStatus::Ready);
        assert_eq!(s.workspace_status(c), ClaimStatus::Pending);

        s.update();
        assert_eq!(s.workspace_status(c), ClaimStatus::Ready);
        assert_eq!(s.free_workspaces(), 0);
    }

    #[test]
    fn test_contention_on_single_workspace() {
        let mut s = bush(1);
        let first = s.reserve_workspace();
        let second = s.reserve_workspace();

        for _ in 0..5 {
            s.update();
        }
        assert_eq!(s.workspace_status(first), ClaimStatus::Ready);
        assert_eq!(s.workspace_status(second), ClaimStatus::Pending);

        s.release_workspace(first);
        assert_eq!(s.free_workspaces(), 1);
        s.update();
        assert_eq!(s.workspace_status(second), ClaimStatus::Ready);
        assert_eq!(s.free_workspaces(), 0);
    }

    #[test]
    fn test_canceled_request_is_skipped() {
        let mut s = bush(1);
        let first = s.reserve_workspace();
        let second = s.reserve_workspace();
        s.release_workspace(first);
        s.update();
        assert_eq!(s.workspace_status(first), ClaimStatus::Invalid);
        assert_eq!(s.workspace_status(second), ClaimStatus::Ready);
    }

    #[test]
    fn test_workspace_position_for_ready_claim() {
        let mut s = bush(2);
        let id = s.reserve_workspace();
        assert_eq!(s.workspace_position(id), None);
        s.update();
        assert_eq!(s.workspace_position(id), Some(Vec2::new(10.0, 1.0)));
    }

    #[test]
    fn test_ready_reservation_expires_and_frees_slot() {
        let mut s = bush(1);
        s.set_grant_lifetime(5);
        let first = s.reserve_workspace();
        let second = s.reserve_workspace();
        s.update(); // first granted
        for _ in 0..5 {
            s.update();
        }
        assert_eq!(s.workspace_status(first), ClaimStatus::Invalid);
        assert_eq!(s.workspace_status(second), ClaimStatus::Ready);
    }

    #[test]
    fn test_zero_lifetime_grant_still_frees_slot() {
        let mut s = bush(1);
        s.set_grant_lifetime(0);
        let id = s.reserve_workspace();
        s.update();
        assert_eq!(s.workspace_status(id), ClaimStatus::Ready);
        assert_eq!(s.free_workspaces(), 0);
        for _ in 0..2 {
            s.update();
        }
        assert_eq!(s.workspace_status(id), ClaimStatus::Invalid);
        assert_eq!(s.free_workspaces(), 1);
        assert_eq!(s.tracked_reservations(), 0);
    }

    #[test]
    fn test_no_workspaces_never_grants() {
        let mut s = Structure::new(StructureId(2), "Shed", Vec2::ZERO);
        let id = s.reserve_workspace();
        for _ in 0..10 {
            s.update();
        }
        assert_eq!(s.workspace_status(id), ClaimStatus::Pending);
    }

    #[test]
    fn test_double_store_assignment_fails() {
        let mut s = bush(0);
        s.set_reservoir(5.0, ResourceKind::Berries, 0.1).unwrap();
        let err = s.set_warehouse(10.0, [ResourceKind::Wood]).unwrap_err();
        assert!(matches!(err, SettlementError::StorageAlreadyAssigned(_)));
        assert_eq!(s.store_mode(), Some(StoreMode::Reservoir));
    }

    #[test]
    fn test_update_ticks_store() {
        let mut s = bush(0);
        s.set_reservoir(5.0, ResourceKind::Berries, 0.5).unwrap();
        s.store_mut().unwrap().withdraw(ResourceKind::Berries, 5.0);
        s.update();
        s.update();
        let actual = s.store().unwrap().get_actual_contents(Some(ResourceKind::Berries));
        assert!((actual - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_unknown_reservation_is_invalid() {
        let mut s = bush(1);
        assert_eq!(s.workspace_status(ReservationId(99)), ClaimStatus::Invalid);
        s.release_workspace(ReservationId(99));
        assert_eq!(s.free_workspaces(), 1);
    }
}
