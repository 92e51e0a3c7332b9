//! Resource store - capacity-bounded container owned by a structure
//!
//! A store tracks three accounting levels per resource kind:
//! - **actual**: the raw stored amount
//! - **unclaimed**: actual minus ready reservations
//! - **available**: actual minus every outstanding reservation, ready or pending
//!
//! Space is accounted the same way against the storage reservations.
//! Capacity is shared by all kinds a store holds.

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SettlementError};
use crate::core::types::{ReservationId, ResourceBundle, ResourceKind, EPSILON};
use crate::reservation::{ClaimStatus, ResourceReservation, DEFAULT_GRANT_LIFETIME};

/// How a store participates in the economy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreMode {
    /// Accepts deposits for a fixed set of kinds; drop-off target for haulers
    Warehouse,
    /// Regenerating harvestable node
    Reservoir,
    /// Free-standing pile that decays away
    Dump,
}

/// A capacity-bounded container of typed quantities
#[derive(Debug, Clone)]
pub struct ResourceStore {
    mode: StoreMode,
    capacity: f32,
    accepted: AHashSet<ResourceKind>,
    contents: AHashMap<ResourceKind, f32>,
    /// Per-tick automatic change: positive regenerates, negative decays
    deltas: Vec<(ResourceKind, f32)>,
    storage_reservations: Vec<ResourceReservation>,
    resource_reservations: Vec<ResourceReservation>,
    grant_lifetime: u32,
    next_reservation: u64,
}

impl ResourceStore {
    /// Create an empty store
    ///
    /// A store with infinite capacity accepts every kind.
    pub fn new(
        mode: StoreMode,
        capacity: f32,
        accepted: impl IntoIterator<Item = ResourceKind>,
    ) -> Result<Self> {
        if capacity.is_nan() || capacity < 0.0 {
            return Err(SettlementError::InvalidCapacity(capacity));
        }
        Ok(Self {
            mode,
            capacity,
            accepted: accepted.into_iter().collect(),
            contents: AHashMap::new(),
            deltas: Vec::new(),
            storage_reservations: Vec::new(),
            resource_reservations: Vec::new(),
            grant_lifetime: DEFAULT_GRANT_LIFETIME,
            next_reservation: 0,
        })
    }

    pub fn warehouse(capacity: f32, accepted: impl IntoIterator<Item = ResourceKind>) -> Result<Self> {
        Self::new(StoreMode::Warehouse, capacity, accepted)
    }

    /// A full node of `quantity` that regrows by `regen_rate` per tick
    pub fn reservoir(quantity: f32, resource: ResourceKind, regen_rate: f32) -> Result<Self> {
        if regen_rate.is_nan() || regen_rate < 0.0 {
            return Err(SettlementError::InvalidRate {
                what: "regeneration",
                rate: regen_rate,
            });
        }
        let mut store = Self::new(StoreMode::Reservoir, quantity, [resource])?;
        store.contents.insert(resource, quantity);
        if regen_rate > 0.0 {
            store.deltas.push((resource, regen_rate));
        }
        Ok(store)
    }

    /// A pile holding `bundle` that loses `decay_rate` per tick
    pub fn dump(bundle: ResourceBundle, decay_rate: f32) -> Result<Self> {
        if decay_rate.is_nan() || decay_rate < 0.0 {
            return Err(SettlementError::InvalidRate {
                what: "decay",
                rate: decay_rate,
            });
        }
        let mut store = Self::new(StoreMode::Dump, bundle.quantity, [bundle.resource])?;
        store.contents.insert(bundle.resource, bundle.quantity);
        if decay_rate > 0.0 {
            store.deltas.push((bundle.resource, -decay_rate));
        }
        Ok(store)
    }

    /// Add an automatic per-tick change for `resource`
    pub fn with_delta(mut self, resource: ResourceKind, rate: f32) -> Self {
        self.deltas.push((resource, rate));
        self
    }

    pub fn with_grant_lifetime(mut self, lifetime: u32) -> Self {
        self.grant_lifetime = lifetime;
        self
    }

    pub fn set_grant_lifetime(&mut self, lifetime: u32) {
        self.grant_lifetime = lifetime;
    }

    pub fn mode(&self) -> StoreMode {
        self.mode
    }

    pub fn capacity(&self) -> f32 {
        self.capacity
    }

    /// Only finite stores restrict deposits to their accepted set
    pub fn accepts(&self, resource: ResourceKind) -> bool {
        self.capacity.is_infinite() || self.accepted.contains(&resource)
    }

    /// Net automatic change per tick for `resource`
    pub fn delta(&self, resource: ResourceKind) -> f32 {
        self.deltas
            .iter()
            .filter(|(kind, _)| *kind == resource)
            .map(|(_, rate)| *rate)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.get_actual_contents(None) <= EPSILON
    }

    /// Reservations (storage and resource) not yet purged
    pub fn outstanding_reservations(&self) -> usize {
        self.storage_reservations
            .iter()
            .chain(&self.resource_reservations)
            .filter(|r| r.is_valid())
            .count()
    }

    pub fn storage_reservations(&self) -> &[ResourceReservation] {
        &self.storage_reservations
    }

    pub fn resource_reservations(&self) -> &[ResourceReservation] {
        &self.resource_reservations
    }

    // === ACCOUNTING ===

    /// Raw stored amount; `None` sums every kind
    pub fn get_actual_contents(&self, resource: Option<ResourceKind>) -> f32 {
        match resource {
            Some(kind) => self.contents.get(&kind).copied().unwrap_or(0.0),
            None => self.contents.values().sum(),
        }
    }

    /// Actual content minus ready reservations
    pub fn get_unclaimed_contents(&self, resource: Option<ResourceKind>) -> f32 {
        (self.get_actual_contents(resource) - self.claimed_contents(resource, true)).max(0.0)
    }

    /// Actual content minus every outstanding reservation
    pub fn get_available_contents(&self, resource: Option<ResourceKind>) -> f32 {
        (self.get_actual_contents(resource) - self.claimed_contents(resource, false)).max(0.0)
    }

    /// Physically free space for `resource`; zero for kinds the store rejects
    pub fn get_actual_space(&self, resource: Option<ResourceKind>) -> f32 {
        if resource.is_some_and(|kind| !self.accepts(kind)) {
            return 0.0;
        }
        (self.capacity - self.get_actual_contents(None)).max(0.0)
    }

    /// Free space minus space promised to ready storage reservations
    pub fn get_unclaimed_space(&self, resource: Option<ResourceKind>) -> f32 {
        (self.get_actual_space(resource) - self.claimed_space(true)).max(0.0)
    }

    /// Free space minus every outstanding storage reservation
    pub fn get_available_space(&self, resource: Option<ResourceKind>) -> f32 {
        (self.get_actual_space(resource) - self.claimed_space(false)).max(0.0)
    }

    fn claimed_contents(&self, resource: Option<ResourceKind>, ready_only: bool) -> f32 {
        self.resource_reservations
            .iter()
            .filter(|r| r.is_valid() && (!ready_only || r.is_ready()))
            .filter(|r| resource.map_or(true, |kind| r.resource() == kind))
            .map(|r| r.quantity())
            .sum()
    }

    fn claimed_space(&self, ready_only: bool) -> f32 {
        self.storage_reservations
            .iter()
            .filter(|r| r.is_valid() && (!ready_only || r.is_ready()))
            .map(|r| r.quantity())
            .sum()
    }

    // === MUTATION ===

    /// Put `quantity` of `resource` into the store
    ///
    /// All-or-nothing: rejected without effect if the kind is not accepted or
    /// the quantity exceeds the space not promised to reservation holders.
    pub fn deposit(&mut self, resource: ResourceKind, quantity: f32) -> bool {
        if quantity.is_nan() || quantity < 0.0 || !self.accepts(resource) {
            return false;
        }
        if quantity > self.get_available_space(Some(resource)) + EPSILON {
            return false;
        }
        *self.contents.entry(resource).or_insert(0.0) += quantity;
        true
    }

    /// Remove up to `quantity`; `None` if nothing is stored
    pub fn withdraw(&mut self, resource: ResourceKind, quantity: f32) -> Option<ResourceBundle> {
        let actual = self.get_actual_contents(Some(resource));
        let taken = actual.min(quantity.max(0.0));
        if actual <= 0.0 || taken <= 0.0 {
            return None;
        }
        let remaining = actual - taken;
        if remaining <= EPSILON {
            self.contents.remove(&resource);
        } else {
            self.contents.insert(resource, remaining);
        }
        Some(ResourceBundle::new(resource, taken))
    }

    /// Claim space for an incoming deposit; granted at once or not at all
    pub fn reserve_storage(&mut self, resource: ResourceKind, quantity: f32) -> Option<ReservationId> {
        if !(quantity > 0.0) || quantity > self.get_available_space(Some(resource)) + EPSILON {
            return None;
        }
        let id = self.next_id();
        let mut reservation = ResourceReservation::new(id, resource, quantity);
        reservation.make_ready(self.grant_lifetime);
        self.storage_reservations.push(reservation);
        tracing::debug!("Granted storage reservation {:?} for {} {}", id, quantity, resource);
        Some(id)
    }

    /// Claim content for a later withdrawal
    ///
    /// Always issues a reservation: ready at once if unclaimed content covers
    /// it, otherwise pending until a later `update` can promote it.
    pub fn reserve_resources(&mut self, resource: ResourceKind, quantity: f32) -> ReservationId {
        let id = self.next_id();
        let mut reservation = ResourceReservation::new(id, resource, quantity);
        if self.get_unclaimed_contents(Some(resource)) + EPSILON >= quantity {
            reservation.make_ready(self.grant_lifetime);
            tracing::debug!("Granted resource reservation {:?} for {} {}", id, quantity, resource);
        } else {
            tracing::debug!("Queued resource reservation {:?} for {} {}", id, quantity, resource);
        }
        self.resource_reservations.push(reservation);
        id
    }

    pub fn reservation(&self, id: ReservationId) -> Option<&ResourceReservation> {
        self.storage_reservations
            .iter()
            .chain(&self.resource_reservations)
            .find(|r| r.id() == id)
    }

    pub fn reservation_status(&self, id: ReservationId) -> ClaimStatus {
        self.reservation(id)
            .map(|r| r.status())
            .unwrap_or(ClaimStatus::Invalid)
    }

    /// Invalidate a reservation; it no longer counts and is purged next update
    pub fn release(&mut self, id: ReservationId) {
        if let Some(reservation) = self
            .storage_reservations
            .iter_mut()
            .chain(self.resource_reservations.iter_mut())
            .find(|r| r.id() == id)
        {
            reservation.release();
        }
    }

    /// Deposit on behalf of the holder of storage reservation `id`
    ///
    /// The reservation is consumed so the space it promised becomes usable.
    /// If it has already lapsed this is a plain deposit.
    pub fn deposit_reserved(&mut self, id: ReservationId, resource: ResourceKind, quantity: f32) -> bool {
        let promised = self
            .storage_reservations
            .iter()
            .find(|r| r.id() == id && r.is_valid())
            .map(|r| r.quantity());

        let Some(promised) = promised else {
            return self.deposit(resource, quantity);
        };
        if !self.accepts(resource) || quantity > self.get_available_space(Some(resource)) + promised + EPSILON {
            return false;
        }
        self.release(id);
        self.deposit(resource, quantity)
    }

    /// Withdraw the quantity promised by ready resource reservation `id`
    pub fn withdraw_reserved(&mut self, id: ReservationId) -> Option<ResourceBundle> {
        let reservation = self
            .resource_reservations
            .iter_mut()
            .find(|r| r.id() == id && r.is_ready())?;
        let (resource, quantity) = (reservation.resource(), reservation.quantity());
        reservation.release();
        self.withdraw(resource, quantity)
    }

    /// Advance one tick: apply deltas, expire and purge reservations, then
    /// promote pending resource reservations whose content is now present
    pub fn update(&mut self) {
        let deltas = std::mem::take(&mut self.deltas);
        for &(resource, rate) in &deltas {
            if rate > 0.0 {
                let grown = rate.min(self.get_available_space(Some(resource)));
                if grown > 0.0 {
                    *self.contents.entry(resource).or_insert(0.0) += grown;
                }
            } else if rate < 0.0 {
                self.withdraw(resource, -rate);
            }
        }
        self.deltas = deltas;

        for reservation in self
            .storage_reservations
            .iter_mut()
            .chain(self.resource_reservations.iter_mut())
        {
            if reservation.update() {
                tracing::debug!("Reservation {:?} expired unclaimed", reservation.id());
            }
        }
        self.storage_reservations.retain(|r| r.is_valid());
        self.resource_reservations.retain(|r| r.is_valid());

        for i in 0..self.resource_reservations.len() {
            let reservation = &self.resource_reservations[i];
            if !reservation.is_pending() {
                continue;
            }
            let (resource, quantity) = (reservation.resource(), reservation.quantity());
            if self.get_unclaimed_contents(Some(resource)) + EPSILON >= quantity {
                self.resource_reservations[i].make_ready(self.grant_lifetime);
                tracing::debug!(
                    "Promoted resource reservation {:?} for {} {}",
                    self.resource_reservations[i].id(),
                    quantity,
                    resource
                );
            }
        }
    }

    fn next_id(&mut self) -> ReservationId {
        let id = ReservationId(self.next_reservation);
        self.next_reservation += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 0.001
    }

    #[test]
    fn test_warehouse_deposit_and_space() {
        let mut store = ResourceStore::warehouse(5.0, [ResourceKind::Wood]).unwrap();
        assert!(store.deposit(ResourceKind::Wood, 3.0));
        assert_eq!(store.get_actual_contents(Some(ResourceKind::Wood)), 3.0);
        assert_eq!(store.get_available_space(Some(ResourceKind::Wood)), 2.0);

        let id = store.reserve_storage(ResourceKind::Wood, 2.0).unwrap();
        assert_eq!(store.reservation_status(id), ClaimStatus::Ready);
        assert_eq!(store.get_available_space(Some(ResourceKind::Wood)), 0.0);
        assert_eq!(store.get_actual_space(Some(ResourceKind::Wood)), 2.0);

        // Space is promised to the reservation holder
        assert!(!store.deposit(ResourceKind::Wood, 1.0));
        assert_eq!(store.get_actual_contents(Some(ResourceKind::Wood)), 3.0);
    }

    #[test]
    fn test_warehouse_rejects_unaccepted_kind() {
        let mut store = ResourceStore::warehouse(10.0, [ResourceKind::Wood]).unwrap();
        assert!(!store.deposit(ResourceKind::Stone, 1.0));
        assert_eq!(store.get_available_space(Some(ResourceKind::Stone)), 0.0);
        assert!(store.reserve_storage(ResourceKind::Stone, 1.0).is_none());
    }

    #[test]
    fn test_infinite_open_warehouse_accepts_anything() {
        let mut store = ResourceStore::warehouse(f32::INFINITY, []).unwrap();
        assert!(store.deposit(ResourceKind::Ore, 1000.0));
        assert!(store.deposit(ResourceKind::Meat, 1.0));
        assert!(store.get_available_space(Some(ResourceKind::Fiber)).is_infinite());
    }

    #[test]
    fn test_infinite_warehouse_ignores_accepted_set() {
        let mut store = ResourceStore::warehouse(f32::INFINITY, [ResourceKind::Wood]).unwrap();
        assert!(store.accepts(ResourceKind::Stone));
        assert!(store.deposit(ResourceKind::Stone, 1.0));
        assert_eq!(store.get_actual_contents(Some(ResourceKind::Stone)), 1.0);
        assert!(store.reserve_storage(ResourceKind::Meat, 3.0).is_some());
    }

    #[test]
    fn test_capacity_is_shared_between_kinds() {
        let mut store = ResourceStore::warehouse(5.0, [ResourceKind::Wood, ResourceKind::Stone]).unwrap();
        assert!(store.deposit(ResourceKind::Wood, 4.0));
        assert!(!store.deposit(ResourceKind::Stone, 2.0));
        assert!(store.deposit(ResourceKind::Stone, 1.0));
        assert_eq!(store.get_actual_contents(None), 5.0);
    }

    #[test]
    fn test_withdraw_limits_to_actual() {
        let mut store = ResourceStore::warehouse(10.0, [ResourceKind::Wood]).unwrap();
        assert!(store.withdraw(ResourceKind::Wood, 1.0).is_none());
        store.deposit(ResourceKind::Wood, 2.0);
        let taken = store.withdraw(ResourceKind::Wood, 5.0).unwrap();
        assert_eq!(taken, ResourceBundle::new(ResourceKind::Wood, 2.0));
        assert!(store.withdraw(ResourceKind::Wood, 1.0).is_none());
    }

    #[test]
    fn test_reservoir_regenerates_to_capacity() {
        let mut store = ResourceStore::reservoir(5.0, ResourceKind::Stone, 0.1).unwrap();
        store.withdraw(ResourceKind::Stone, 5.0);
        assert_eq!(store.get_actual_contents(Some(ResourceKind::Stone)), 0.0);

        for _ in 0..10 {
            store.update();
        }
        assert!(approx(store.get_actual_contents(Some(ResourceKind::Stone)), 1.0));

        for _ in 0..100 {
            store.update();
        }
        assert!(approx(store.get_actual_contents(Some(ResourceKind::Stone)), 5.0));
    }

    #[test]
    fn test_dump_decays_away() {
        let mut store = ResourceStore::dump(ResourceBundle::new(ResourceKind::Berries, 1.0), 0.25).unwrap();
        assert_eq!(store.mode(), StoreMode::Dump);
        for _ in 0..3 {
            store.update();
        }
        assert!(approx(store.get_actual_contents(Some(ResourceKind::Berries)), 0.25));
        store.update();
        assert!(store.is_empty());
        store.update();
        assert!(store.is_empty());
    }

    #[test]
    fn test_pending_resource_reservation_promoted_after_deposit() {
        let mut store = ResourceStore::warehouse(10.0, [ResourceKind::Meat]).unwrap();
        store.deposit(ResourceKind::Meat, 1.0);

        let id = store.reserve_resources(ResourceKind::Meat, 2.0);
        assert_eq!(store.reservation_status(id), ClaimStatus::Pending);
        assert_eq!(store.get_available_contents(Some(ResourceKind::Meat)), 0.0);

        assert!(store.deposit(ResourceKind::Meat, 1.0));
        assert_eq!(store.reservation_status(id), ClaimStatus::Pending);
        store.update();
        assert_eq!(store.reservation_status(id), ClaimStatus::Ready);
        assert_eq!(store.get_unclaimed_contents(Some(ResourceKind::Meat)), 0.0);
    }

    #[test]
    fn test_promotion_never_overcommits() {
        let mut store = ResourceStore::warehouse(10.0, [ResourceKind::Meat]).unwrap();
        let a = store.reserve_resources(ResourceKind::Meat, 2.0);
        let b = store.reserve_resources(ResourceKind::Meat, 2.0);
        store.deposit(ResourceKind::Meat, 3.0);
        store.update();
        assert_eq!(store.reservation_status(a), ClaimStatus::Ready);
        assert_eq!(store.reservation_status(b), ClaimStatus::Pending);
    }

    #[test]
    fn test_promotion_is_content_driven() {
        let mut store = ResourceStore::warehouse(10.0, [ResourceKind::Meat]).unwrap();
        let big = store.reserve_resources(ResourceKind::Meat, 4.0);
        let small = store.reserve_resources(ResourceKind::Meat, 1.0);
        store.deposit(ResourceKind::Meat, 2.0);
        store.update();
        // The later, smaller request is served first
        assert_eq!(store.reservation_status(big), ClaimStatus::Pending);
        assert_eq!(store.reservation_status(small), ClaimStatus::Ready);
    }

    #[test]
    fn test_accounting_levels() {
        let mut store = ResourceStore::warehouse(20.0, [ResourceKind::Wood]).unwrap();
        store.deposit(ResourceKind::Wood, 10.0);
        store.reserve_resources(ResourceKind::Wood, 3.0); // ready
        store.reserve_resources(ResourceKind::Wood, 8.0); // pending, 7 unclaimed
        assert_eq!(store.get_actual_contents(Some(ResourceKind::Wood)), 10.0);
        assert_eq!(store.get_unclaimed_contents(Some(ResourceKind::Wood)), 7.0);
        assert_eq!(store.get_available_contents(Some(ResourceKind::Wood)), 0.0);
    }

    #[test]
    fn test_release_returns_space_and_purges() {
        let mut store = ResourceStore::warehouse(5.0, [ResourceKind::Wood]).unwrap();
        let id = store.reserve_storage(ResourceKind::Wood, 4.0).unwrap();
        assert_eq!(store.get_available_space(None), 1.0);
        store.release(id);
        store.release(id);
        assert_eq!(store.get_available_space(None), 5.0);
        assert_eq!(store.reservation_status(id), ClaimStatus::Invalid);
        store.update();
        assert!(store.reservation(id).is_none());
    }

    #[test]
    fn test_deposit_reserved_uses_promised_space() {
        let mut store = ResourceStore::warehouse(5.0, [ResourceKind::Wood]).unwrap();
        store.deposit(ResourceKind::Wood, 3.0);
        let id = store.reserve_storage(ResourceKind::Wood, 2.0).unwrap();
        assert!(store.deposit_reserved(id, ResourceKind::Wood, 2.0));
        assert_eq!(store.get_actual_contents(None), 5.0);
        assert_eq!(store.reservation_status(id), ClaimStatus::Invalid);
    }

    #[test]
    fn test_deposit_reserved_too_large_keeps_claim() {
        let mut store = ResourceStore::warehouse(5.0, [ResourceKind::Wood]).unwrap();
        store.deposit(ResourceKind::Wood, 3.0);
        let id = store.reserve_storage(ResourceKind::Wood, 2.0).unwrap();
        assert!(!store.deposit_reserved(id, ResourceKind::Wood, 3.0));
        assert_eq!(store.reservation_status(id), ClaimStatus::Ready);
    }

    #[test]
    fn test_withdraw_reserved_requires_ready() {
        let mut store = ResourceStore::warehouse(10.0, [ResourceKind::Stone]).unwrap();
        let pending = store.reserve_resources(ResourceKind::Stone, 2.0);
        assert!(store.withdraw_reserved(pending).is_none());

        store.deposit(ResourceKind::Stone, 2.0);
        store.update();
        let taken = store.withdraw_reserved(pending).unwrap();
        assert_eq!(taken.quantity, 2.0);
        assert_eq!(store.get_actual_contents(None), 0.0);
        assert_eq!(store.reservation_status(pending), ClaimStatus::Invalid);
    }

    #[test]
    fn test_storage_reservation_expires() {
        let mut store = ResourceStore::warehouse(5.0, [ResourceKind::Wood])
            .unwrap()
            .with_grant_lifetime(3);
        let id = store.reserve_storage(ResourceKind::Wood, 5.0).unwrap();
        store.update();
        store.update();
        assert_eq!(store.get_available_space(None), 0.0);
        store.update();
        assert_eq!(store.reservation_status(id), ClaimStatus::Invalid);
        assert_eq!(store.get_available_space(None), 5.0);
    }

    #[test]
    fn test_regeneration_respects_reserved_space() {
        let mut store = ResourceStore::reservoir(5.0, ResourceKind::Fiber, 1.0).unwrap();
        store.withdraw(ResourceKind::Fiber, 5.0);
        store.reserve_storage(ResourceKind::Fiber, 4.0).unwrap();
        for _ in 0..5 {
            store.update();
        }
        assert!(approx(store.get_actual_contents(None), 1.0));
    }

    #[test]
    fn test_invalid_construction() {
        assert!(matches!(
            ResourceStore::warehouse(-1.0, []),
            Err(SettlementError::InvalidCapacity(_))
        ));
        assert!(ResourceStore::warehouse(f32::NAN, []).is_err());
        assert!(matches!(
            ResourceStore::reservoir(5.0, ResourceKind::Wood, -0.5),
            Err(SettlementError::InvalidRate { .. })
        ));
        assert!(ResourceStore::dump(ResourceBundle::new(ResourceKind::Wood, 1.0), -1.0).is_err());
    }
}
