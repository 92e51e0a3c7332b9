//! Tasks - the atomic units of work an actor performs one tick at a time
//!
//! Each task makes bounded progress per step and flips its completed flag
//! exactly once. A canceled task releases whatever claim it was created
//! for or was waiting on.

use glam::Vec2;
use rand::Rng;

use crate::city::allocation::reserve_storage;
use crate::city::structures::Structures;
use crate::core::types::{ResourceKind, StructureId, EPSILON};
use crate::entity::actor::Actor;
use crate::reservation::{ClaimStatus, ResourceClaim, WorkspaceClaim};
use crate::simulation::context::TickContext;
use crate::simulation::events::SimulationEvent;

/// How close an actor must be to count as standing at a location
pub const ARRIVAL_RADIUS: f32 = 0.01;

/// Move `position` up to `speed` towards `destination`; true on arrival
pub fn step_towards(position: &mut Vec2, destination: Vec2, speed: f32) -> bool {
    let offset = destination - *position;
    let distance = offset.length();
    if distance <= speed {
        *position = destination;
        return true;
    }
    *position += offset / distance * speed;
    false
}

fn is_at(actor: &Actor, location: Option<Vec2>) -> bool {
    location.is_some_and(|l| l.distance(actor.position) <= ARRIVAL_RADIUS)
}

/// A unit of actor work
#[derive(Debug, Clone)]
pub enum Task {
    Seek(SeekTask),
    Wander(WanderTask),
    Forage(ForageTask),
    Dump(DumpTask),
    ReserveStorage(ReserveStorageTask),
    ReserveWorkspace(ReserveWorkspaceTask),
}

impl Task {
    pub fn step(&mut self, actor: &mut Actor, ctx: &mut TickContext) {
        match self {
            Task::Seek(task) => task.step(actor, ctx.structures),
            Task::Wander(task) => task.step(actor, ctx),
            Task::Forage(task) => task.step(actor, ctx),
            Task::Dump(task) => task.step(actor, ctx),
            Task::ReserveStorage(task) => task.step(actor, ctx),
            Task::ReserveWorkspace(task) => task.step(actor, ctx.structures),
        }
    }

    pub fn is_completed(&self) -> bool {
        match self {
            Task::Seek(task) => task.completed,
            Task::Wander(task) => task.completed,
            Task::Forage(task) => task.completed,
            Task::Dump(task) => task.completed,
            Task::ReserveStorage(task) => task.completed,
            Task::ReserveWorkspace(task) => task.completed,
        }
    }

    pub fn cancel(&mut self, actor: &mut Actor, structures: &mut Structures) {
        match self {
            Task::Seek(task) => task.cancel(actor, structures),
            Task::Wander(task) => task.completed = true,
            Task::Forage(task) => task.cancel(actor, structures),
            Task::Dump(task) => task.cancel(actor, structures),
            // Completes the tick it succeeds; the claim already belongs to the actor
            Task::ReserveStorage(task) => task.completed = true,
            Task::ReserveWorkspace(task) => task.cancel(actor, structures),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Task::Seek(task) => match task.target {
                SeekTarget::Point(_) => "seek",
                SeekTarget::Structure(_) => "seek-structure",
                SeekTarget::Workspace(_) => "seek-workspace",
                SeekTarget::Storage(_) => "seek-storage",
            },
            Task::Wander(_) => "wander",
            Task::Forage(_) => "forage",
            Task::Dump(_) => "dump",
            Task::ReserveStorage(_) => "reserve-storage",
            Task::ReserveWorkspace(_) => "reserve-workspace",
        }
    }
}

// === SEEK ===

/// Where a seek task is heading
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeekTarget {
    Point(Vec2),
    Structure(StructureId),
    /// The workspace bound to a ready claim
    Workspace(WorkspaceClaim),
    /// The structure holding a storage claim
    Storage(ResourceClaim),
}

/// Walk in a straight line to a target at the actor's move speed
#[derive(Debug, Clone)]
pub struct SeekTask {
    target: SeekTarget,
    completed: bool,
}

impl SeekTask {
    pub fn new(target: SeekTarget) -> Self {
        Self {
            target,
            completed: false,
        }
    }

    pub fn target(&self) -> SeekTarget {
        self.target
    }

    fn destination(&self, structures: &Structures) -> Option<Vec2> {
        match &self.target {
            SeekTarget::Point(point) => Some(*point),
            SeekTarget::Structure(id) => structures.position(*id),
            SeekTarget::Workspace(claim) => structures.workspace_position(claim),
            SeekTarget::Storage(claim) => match structures.resource_status(claim) {
                ClaimStatus::Invalid => None,
                _ => structures.position(claim.structure),
            },
        }
    }

    fn step(&mut self, actor: &mut Actor, structures: &Structures) {
        // Target vanished or claim lapsed: give up without arriving
        let Some(destination) = self.destination(structures) else {
            self.completed = true;
            return;
        };
        if step_towards(&mut actor.position, destination, actor.move_speed) {
            self.completed = true;
        }
    }

    fn cancel(&mut self, actor: &mut Actor, structures: &mut Structures) {
        match &self.target {
            SeekTarget::Workspace(claim) => {
                structures.release_workspace(claim);
                if actor.target_workspace == Some(*claim) {
                    actor.target_workspace = None;
                }
            }
            SeekTarget::Storage(claim) => {
                structures.release_resource(claim);
                let held = actor.storage_reservation.map(|h| (h.structure, h.reservation));
                if held == Some((claim.structure, claim.reservation)) {
                    actor.storage_reservation = None;
                }
            }
            SeekTarget::Point(_) | SeekTarget::Structure(_) => {}
        }
        self.completed = true;
    }
}

// === WANDER ===

/// Stroll to a random point near a centre
#[derive(Debug, Clone)]
pub struct WanderTask {
    center: Vec2,
    target: Option<Vec2>,
    completed: bool,
}

impl WanderTask {
    pub fn new(center: Vec2) -> Self {
        Self {
            center,
            target: None,
            completed: false,
        }
    }

    pub fn target(&self) -> Option<Vec2> {
        self.target
    }

    fn step(&mut self, actor: &mut Actor, ctx: &mut TickContext) {
        let radius = ctx.config.wander_radius;
        let center = self.center;
        let target = *self.target.get_or_insert_with(|| {
            // Degenerate radius: stay put
            if !(radius > 0.0) || !radius.is_finite() {
                return center;
            }
            Vec2::new(
                center.x + ctx.rng.gen_range(-radius..=radius),
                center.y + ctx.rng.gen_range(-radius..=radius),
            )
        });
        if step_towards(&mut actor.position, target, actor.move_speed) {
            self.completed = true;
        }
    }
}

// === FORAGE ===

/// Extract material from a reservoir while holding one of its workspaces
#[derive(Debug, Clone)]
pub struct ForageTask {
    claim: WorkspaceClaim,
    resource: ResourceKind,
    gathered: f32,
    completed: bool,
}

impl ForageTask {
    pub fn new(claim: WorkspaceClaim, resource: ResourceKind) -> Self {
        Self {
            claim,
            resource,
            gathered: 0.0,
            completed: false,
        }
    }

    pub fn gathered(&self) -> f32 {
        self.gathered
    }

    fn step(&mut self, actor: &mut Actor, ctx: &mut TickContext) {
        let standing = is_at(actor, ctx.structures.workspace_position(&self.claim));
        if ctx.structures.workspace_status(&self.claim) != ClaimStatus::Ready || !standing {
            self.finish(actor, ctx);
            return;
        }

        let room = ctx.config.carry_capacity - actor.carried(self.resource);
        if room <= EPSILON || actor.carrying.is_some_and(|c| c.resource != self.resource) {
            self.finish(actor, ctx);
            return;
        }

        let amount = ctx.config.forage_rate.min(room);
        let withdrawn = ctx
            .structures
            .get_mut(self.claim.structure)
            .and_then(|s| s.store_mut())
            .and_then(|store| store.withdraw(self.resource, amount));

        match withdrawn {
            Some(bundle) => {
                actor.load(bundle);
                self.gathered += bundle.quantity;
                if ctx.config.carry_capacity - actor.carried(self.resource) <= EPSILON {
                    self.finish(actor, ctx);
                }
            }
            // Dry node: leave with a partial load, or wait for regrowth empty-handed
            None if actor.carrying.is_some() => self.finish(actor, ctx),
            None => {}
        }
    }

    fn finish(&mut self, actor: &mut Actor, ctx: &mut TickContext) {
        ctx.structures.release_workspace(&self.claim);
        if actor.target_workspace == Some(self.claim) {
            actor.target_workspace = None;
        }
        if self.gathered > 0.0 {
            ctx.events.push(SimulationEvent::Foraged {
                tick: ctx.tick,
                actor: actor.id(),
                structure: self.claim.structure,
                resource: self.resource,
                quantity: self.gathered,
            });
        }
        self.completed = true;
    }

    fn cancel(&mut self, actor: &mut Actor, structures: &mut Structures) {
        structures.release_workspace(&self.claim);
        if actor.target_workspace == Some(self.claim) {
            actor.target_workspace = None;
        }
        self.completed = true;
    }
}

// === DUMP ===

/// Where carried goods are put down
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DumpTarget {
    /// Into the store holding this storage claim
    Storage(ResourceClaim),
    /// Onto the ground as a decaying pile
    Ground,
}

/// Put down the carried load
#[derive(Debug, Clone)]
pub struct DumpTask {
    target: DumpTarget,
    completed: bool,
}

impl DumpTask {
    pub fn new(target: DumpTarget) -> Self {
        Self {
            target,
            completed: false,
        }
    }

    fn step(&mut self, actor: &mut Actor, ctx: &mut TickContext) {
        match self.target {
            DumpTarget::Storage(claim) => self.dump_into_storage(claim, actor, ctx),
            DumpTarget::Ground => self.dump_on_ground(actor, ctx),
        }
        self.completed = true;
    }

    fn dump_into_storage(&mut self, claim: ResourceClaim, actor: &mut Actor, ctx: &mut TickContext) {
        actor.storage_reservation = None;
        let at_storage = is_at(actor, ctx.structures.position(claim.structure));
        let load = match actor.carrying {
            Some(load) if load.resource == claim.resource && at_storage => load,
            _ => {
                ctx.structures.release_resource(&claim);
                return;
            }
        };

        let quantity = load.quantity.min(claim.quantity);
        if ctx.structures.deposit_reserved(&claim, quantity) {
            actor.unload(quantity);
            ctx.events.push(SimulationEvent::Deposited {
                tick: ctx.tick,
                actor: actor.id(),
                structure: claim.structure,
                resource: load.resource,
                quantity,
            });
        } else {
            ctx.structures.release_resource(&claim);
        }
    }

    fn dump_on_ground(&mut self, actor: &mut Actor, ctx: &mut TickContext) {
        let Some(load) = actor.carrying.take() else {
            return;
        };
        match ctx
            .structures
            .spawn_pile(actor.position, load, ctx.config.pile_decay_rate)
        {
            Ok(pile) => {
                tracing::debug!("{} discarded {} {} on the ground", actor.name, load.quantity, load.resource);
                ctx.events.push(SimulationEvent::Discarded {
                    tick: ctx.tick,
                    actor: actor.id(),
                    pile,
                    resource: load.resource,
                    quantity: load.quantity,
                });
            }
            Err(e) => {
                tracing::warn!("{} could not discard its load: {}", actor.name, e);
                actor.carrying = Some(load);
            }
        }
    }

    fn cancel(&mut self, actor: &mut Actor, structures: &mut Structures) {
        if let DumpTarget::Storage(claim) = &self.target {
            structures.release_resource(claim);
            actor.storage_reservation = None;
        }
        self.completed = true;
    }
}

// === RESERVE STORAGE ===

/// Ask the storage allocator for room for the carried load
///
/// Retries every tick; gives up after `storage_patience` failed ticks.
#[derive(Debug, Clone, Default)]
pub struct ReserveStorageTask {
    attempts: u32,
    completed: bool,
}

impl ReserveStorageTask {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    fn step(&mut self, actor: &mut Actor, ctx: &mut TickContext) {
        let Some(load) = actor.carrying else {
            self.completed = true;
            return;
        };
        if let Some(claim) = reserve_storage(ctx.structures, actor.position, load) {
            actor.storage_reservation = Some(claim);
            self.completed = true;
            return;
        }
        self.attempts += 1;
        if self.attempts >= ctx.config.storage_patience {
            tracing::debug!("{} found no storage for {} {}", actor.name, load.quantity, load.resource);
            self.completed = true;
        }
    }
}

// === RESERVE WORKSPACE ===

/// Queue for a workspace on a structure and wait until it is granted
#[derive(Debug, Clone)]
pub struct ReserveWorkspaceTask {
    structure: StructureId,
    completed: bool,
}

impl ReserveWorkspaceTask {
    pub fn new(structure: StructureId) -> Self {
        Self {
            structure,
            completed: false,
        }
    }

    fn step(&mut self, actor: &mut Actor, structures: &mut Structures) {
        if let Some(claim) = actor.target_workspace {
            if claim.structure == self.structure {
                match structures.workspace_status(&claim) {
                    ClaimStatus::Ready => {
                        self.completed = true;
                        return;
                    }
                    ClaimStatus::Pending => return,
                    ClaimStatus::Invalid => {}
                }
            } else {
                structures.release_workspace(&claim);
            }
            actor.target_workspace = None;
        }

        match structures.reserve_workspace(self.structure) {
            Some(claim) => actor.target_workspace = Some(claim),
            None => self.completed = true,
        }
    }

    fn cancel(&mut self, actor: &mut Actor, structures: &mut Structures) {
        if let Some(claim) = actor.target_workspace.take() {
            structures.release_workspace(&claim);
        }
        self.completed = true;
    }
}
