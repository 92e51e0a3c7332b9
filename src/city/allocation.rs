//! Allocators - match an actor's request to the nearest eligible store
//!
//! Every allocator follows the same policy:
//! 1. Collect structures whose store mode is eligible for the request
//! 2. Candidates can serve the full quantity
//! 3. Backups can serve part of it (or, for forage, will regrow)
//! 4. Both pools are ordered by straight-line distance, ties in spawn order
//! 5. The nearest candidate wins, else the nearest backup, else nothing

use glam::Vec2;
use ordered_float::OrderedFloat;

use crate::city::store::{ResourceStore, StoreMode};
use crate::city::structure::Structure;
use crate::city::structures::Structures;
use crate::core::types::{ResourceBundle, ResourceKind, StructureId, EPSILON};
use crate::reservation::ResourceClaim;

/// A structure picked by an allocator and the quantity it can serve
#[derive(Debug, Clone, Copy, PartialEq)]
struct Pick {
    structure: StructureId,
    distance: OrderedFloat<f32>,
    quantity: f32,
}

/// Scan `structures` for the nearest store able to serve `quantity`
///
/// `amount` measures what a store can offer; `is_backup` decides whether a
/// store that cannot serve the full quantity is still worth falling back to.
fn select_nearest(
    structures: &Structures,
    position: Vec2,
    quantity: f32,
    eligible: impl Fn(&Structure, &ResourceStore) -> bool,
    amount: impl Fn(&ResourceStore) -> f32,
    is_backup: impl Fn(&ResourceStore, f32) -> bool,
) -> Option<Pick> {
    let mut candidates = Vec::new();
    let mut backups = Vec::new();

    for structure in structures.iter() {
        let Some(store) = structure.store() else {
            continue;
        };
        if !eligible(structure, store) {
            continue;
        }
        let offered = amount(store);
        let distance = OrderedFloat(structure.position.distance(position));
        if offered + EPSILON >= quantity {
            candidates.push(Pick {
                structure: structure.id(),
                distance,
                quantity,
            });
        } else if is_backup(store, offered) {
            backups.push(Pick {
                structure: structure.id(),
                distance,
                quantity: offered,
            });
        }
    }

    candidates.sort_by_key(|p| p.distance);
    backups.sort_by_key(|p| p.distance);
    candidates.into_iter().next().or_else(|| backups.into_iter().next())
}

/// Reserve warehouse space for `request`, near `position`
///
/// A warehouse with only partial room yields a reservation for the room it has.
pub fn reserve_storage(structures: &mut Structures, position: Vec2, request: ResourceBundle) -> Option<ResourceClaim> {
    let resource = request.resource;
    let pick = select_nearest(
        structures,
        position,
        request.quantity,
        |_, store| store.mode() == StoreMode::Warehouse && store.accepts(resource),
        |store| store.get_available_space(Some(resource)),
        |_, offered| offered > EPSILON,
    )?;

    let store = structures.get_mut(pick.structure)?.store_mut()?;
    let reservation = store.reserve_storage(resource, pick.quantity)?;
    tracing::debug!(
        "Reserved {} {} of storage in {:?}",
        pick.quantity,
        resource,
        pick.structure
    );
    Some(ResourceClaim {
        structure: pick.structure,
        reservation,
        resource,
        quantity: pick.quantity,
    })
}

/// Whether actors can forage `resource` at `structure`
pub fn can_forage_at(structure: &Structure, resource: ResourceKind) -> bool {
    !structure.workspaces().is_empty()
        && structure
            .store()
            .is_some_and(|store| store.mode() == StoreMode::Reservoir && store.accepts(resource))
}

/// Find the nearest reservoir to forage `resource` from
///
/// Only reservoirs with at least one workspace qualify. A depleted node that
/// is still regrowing counts as a backup.
pub fn find_forage(structures: &Structures, position: Vec2, resource: ResourceKind, quantity: f32) -> Option<StructureId> {
    select_nearest(
        structures,
        position,
        quantity,
        |structure, _| can_forage_at(structure, resource),
        |store| store.get_available_contents(Some(resource)),
        |store, offered| offered > EPSILON || store.delta(resource) > 0.0,
    )
    .map(|pick| pick.structure)
}

/// Reserve stored `resource` for withdrawal from a warehouse or pile
///
/// A store holding only part of the quantity yields a partial reservation.
pub fn reserve_resource_in_storage(
    structures: &mut Structures,
    position: Vec2,
    resource: ResourceKind,
    quantity: f32,
) -> Option<ResourceClaim> {
    let pick = select_nearest(
        structures,
        position,
        quantity,
        |_, store| matches!(store.mode(), StoreMode::Warehouse | StoreMode::Dump),
        |store| store.get_available_contents(Some(resource)),
        |_, offered| offered > EPSILON,
    )?;

    let store = structures.get_mut(pick.structure)?.store_mut()?;
    let reservation = store.reserve_resources(resource, pick.quantity);
    tracing::debug!(
        "Reserved {} {} for withdrawal from {:?}",
        pick.quantity,
        resource,
        pick.structure
    );
    Some(ResourceClaim {
        structure: pick.structure,
        reservation,
        resource,
        quantity: pick.quantity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reservation::ClaimStatus;

    fn wood(quantity: f32) -> ResourceBundle {
        ResourceBundle::new(ResourceKind::Wood, quantity)
    }

    #[test]
    fn test_reserve_storage_prefers_nearest_full_fit() {
        let mut structures = Structures::default();
        let far = structures
            .spawn_warehouse("Far", Vec2::new(50.0, 0.0), 10.0, [ResourceKind::Wood])
            .unwrap();
        let near_small = structures
            .spawn_warehouse("Near", Vec2::new(5.0, 0.0), 2.0, [ResourceKind::Wood])
            .unwrap();

        let claim = reserve_storage(&mut structures, Vec2::ZERO, wood(5.0)).unwrap();
        assert_eq!(claim.structure, far);
        assert_eq!(claim.quantity, 5.0);
        assert_eq!(structures.resource_status(&claim), ClaimStatus::Ready);
        assert_ne!(claim.structure, near_small);
    }

    #[test]
    fn test_reserve_storage_falls_back_to_partial() {
        let mut structures = Structures::default();
        let a = structures
            .spawn_warehouse("A", Vec2::new(10.0, 0.0), 2.0, [ResourceKind::Wood])
            .unwrap();
        let b = structures
            .spawn_warehouse("B", Vec2::new(3.0, 0.0), 1.0, [ResourceKind::Wood])
            .unwrap();

        let claim = reserve_storage(&mut structures, Vec2::ZERO, wood(5.0)).unwrap();
        assert_eq!(claim.structure, b);
        assert_eq!(claim.quantity, 1.0);

        let claim = reserve_storage(&mut structures, Vec2::ZERO, wood(5.0)).unwrap();
        assert_eq!(claim.structure, a);
        assert_eq!(claim.quantity, 2.0);

        assert!(reserve_storage(&mut structures, Vec2::ZERO, wood(5.0)).is_none());
    }

    #[test]
    fn test_reserve_storage_skips_other_modes_and_kinds() {
        let mut structures = Structures::default();
        structures
            .spawn_reservoir("Forest", Vec2::ZERO, 10.0, ResourceKind::Wood, 0.1, &[Vec2::ZERO])
            .unwrap();
        structures
            .spawn_warehouse("Granary", Vec2::ZERO, 10.0, [ResourceKind::Berries])
            .unwrap();
        assert!(reserve_storage(&mut structures, Vec2::ZERO, wood(1.0)).is_none());
    }

    #[test]
    fn test_ties_resolve_in_spawn_order() {
        let mut structures = Structures::default();
        let first = structures
            .spawn_warehouse("First", Vec2::new(0.0, 4.0), 10.0, [ResourceKind::Wood])
            .unwrap();
        structures
            .spawn_warehouse("Second", Vec2::new(4.0, 0.0), 10.0, [ResourceKind::Wood])
            .unwrap();
        let claim = reserve_storage(&mut structures, Vec2::ZERO, wood(1.0)).unwrap();
        assert_eq!(claim.structure, first);
    }

    #[test]
    fn test_find_forage_nearest_with_content() {
        let mut structures = Structures::default();
        let near = structures
            .spawn_reservoir("Near", Vec2::new(2.0, 0.0), 1.0, ResourceKind::Berries, 0.0, &[Vec2::ZERO])
            .unwrap();
        let far = structures
            .spawn_reservoir("Far", Vec2::new(20.0, 0.0), 10.0, ResourceKind::Berries, 0.0, &[Vec2::ZERO])
            .unwrap();

        assert_eq!(find_forage(&structures, Vec2::ZERO, ResourceKind::Berries, 5.0), Some(far));
        assert_eq!(find_forage(&structures, Vec2::ZERO, ResourceKind::Berries, 1.0), Some(near));
    }

    #[test]
    fn test_find_forage_backs_up_to_regrowing_node() {
        let mut structures = Structures::default();
        let node = structures
            .spawn_reservoir("Bush", Vec2::ZERO, 5.0, ResourceKind::Berries, 0.1, &[Vec2::ZERO])
            .unwrap();
        let dead = structures
            .spawn_reservoir("Dead", Vec2::ZERO, 5.0, ResourceKind::Berries, 0.0, &[Vec2::ZERO])
            .unwrap();
        for id in [node, dead] {
            structures
                .get_mut(id)
                .unwrap()
                .store_mut()
                .unwrap()
                .withdraw(ResourceKind::Berries, 5.0);
        }
        assert_eq!(find_forage(&structures, Vec2::ZERO, ResourceKind::Berries, 5.0), Some(node));
    }

    #[test]
    fn test_find_forage_ignores_nodes_without_workspaces() {
        let mut structures = Structures::default();
        structures
            .spawn_reservoir("Fenced", Vec2::ZERO, 5.0, ResourceKind::Meat, 0.1, &[])
            .unwrap();
        assert_eq!(find_forage(&structures, Vec2::ZERO, ResourceKind::Meat, 1.0), None);
    }

    #[test]
    fn test_reserve_resource_in_storage_partial_backup() {
        let mut structures = Structures::default();
        let pile = structures
            .spawn_pile(Vec2::new(1.0, 0.0), ResourceBundle::new(ResourceKind::Stone, 1.5), 0.0)
            .unwrap();
        let claim = reserve_resource_in_storage(&mut structures, Vec2::ZERO, ResourceKind::Stone, 4.0).unwrap();
        assert_eq!(claim.structure, pile);
        assert_eq!(claim.quantity, 1.5);
        assert_eq!(structures.resource_status(&claim), ClaimStatus::Ready);

        // Everything in the pile is now spoken for
        assert!(reserve_resource_in_storage(&mut structures, Vec2::ZERO, ResourceKind::Stone, 1.0).is_none());

        let taken = structures.withdraw_reserved(&claim).unwrap();
        assert_eq!(taken.quantity, 1.5);
    }

    #[test]
    fn test_reserve_resource_in_storage_full_fit_is_ready() {
        let mut structures = Structures::default();
        let store = structures
            .spawn_warehouse("Store", Vec2::ZERO, 10.0, [ResourceKind::Ore])
            .unwrap();
        structures
            .get_mut(store)
            .unwrap()
            .store_mut()
            .unwrap()
            .deposit(ResourceKind::Ore, 6.0);

        let claim = reserve_resource_in_storage(&mut structures, Vec2::ZERO, ResourceKind::Ore, 4.0).unwrap();
        assert_eq!(claim.quantity, 4.0);
        assert_eq!(structures.resource_status(&claim), ClaimStatus::Ready);
        let available = structures
            .get(store)
            .unwrap()
            .store()
            .unwrap()
            .get_available_contents(Some(ResourceKind::Ore));
        assert!((available - 2.0).abs() < 0.001);
    }
}
