//! Orders - long-running behaviors that hand out one task at a time
//!
//! An order is a small state machine. Each call to `get_task` runs the
//! current state, advances it, and returns the next task. A state that
//! cannot proceed redirects to an earlier state and tries again; a state
//! that must wait returns `None` and is retried next tick.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::city::allocation::{can_forage_at, find_forage};
use crate::city::structures::Structures;
use crate::core::types::{ResourceKind, StructureId};
use crate::entity::actor::Actor;
use crate::entity::tasks::{
    DumpTarget, DumpTask, ForageTask, ReserveStorageTask, ReserveWorkspaceTask, SeekTarget, SeekTask, Task,
    WanderTask,
};
use crate::reservation::ClaimStatus;
use crate::simulation::context::TickContext;

/// A behavior assigned to an actor
#[derive(Debug, Clone)]
pub enum Order {
    Move(MoveOrder),
    Forage(ForageOrder),
}

impl Order {
    /// Walk to `destination`, then mill about there
    pub fn move_to(destination: Vec2) -> Self {
        Order::Move(MoveOrder::new(destination))
    }

    /// Gather `resource` from the nearest suitable reservoir
    pub fn forage(resource: ResourceKind) -> Self {
        Order::Forage(ForageOrder::new(resource, None))
    }

    /// Gather `resource`, preferring `structure` while it can be foraged
    pub fn forage_at(resource: ResourceKind, structure: StructureId) -> Self {
        Order::Forage(ForageOrder::new(resource, Some(structure)))
    }

    pub fn get_task(&mut self, actor: &Actor, ctx: &mut TickContext) -> Option<Task> {
        match self {
            Order::Move(order) => Some(order.get_task()),
            Order::Forage(order) => order.get_task(actor, ctx),
        }
    }

    /// Cancel the actor's current task and release everything it holds
    pub fn cancel(&mut self, actor: &mut Actor, structures: &mut Structures) {
        if let Some(mut task) = actor.take_task() {
            task.cancel(actor, structures);
        }
        actor.release_claims(structures);
        tracing::debug!("{} dropped its {} order", actor.name, self.label());
    }

    pub fn label(&self) -> &'static str {
        match self {
            Order::Move(_) => "move",
            Order::Forage(_) => "forage",
        }
    }
}

// === MOVE ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveState {
    SeekDestination,
    Wander,
}

/// Seek a destination once, then wander around it indefinitely
#[derive(Debug, Clone)]
pub struct MoveOrder {
    destination: Vec2,
    state: MoveState,
}

impl MoveOrder {
    pub fn new(destination: Vec2) -> Self {
        Self {
            destination,
            state: MoveState::SeekDestination,
        }
    }

    pub fn destination(&self) -> Vec2 {
        self.destination
    }

    pub fn state(&self) -> MoveState {
        self.state
    }

    fn get_task(&mut self) -> Task {
        match self.state {
            MoveState::SeekDestination => {
                self.state = MoveState::Wander;
                Task::Seek(SeekTask::new(SeekTarget::Point(self.destination)))
            }
            MoveState::Wander => Task::Wander(WanderTask::new(self.destination)),
        }
    }
}

// === FORAGE ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForageState {
    SeekForageLocation,
    ReserveWorkspace,
    SeekWorkspace,
    DoForage,
    ReserveStorage,
    SeekStorage,
    DumpStorage,
}

impl ForageState {
    const COUNT: usize = 7;
}

/// Cycle between a reservoir and storage, hauling loads of one resource
#[derive(Debug, Clone)]
pub struct ForageOrder {
    resource: ResourceKind,
    preferred: Option<StructureId>,
    target: Option<StructureId>,
    state: ForageState,
}

impl ForageOrder {
    pub fn new(resource: ResourceKind, preferred: Option<StructureId>) -> Self {
        Self {
            resource,
            preferred,
            target: None,
            state: ForageState::SeekForageLocation,
        }
    }

    pub fn resource(&self) -> ResourceKind {
        self.resource
    }

    pub fn state(&self) -> ForageState {
        self.state
    }

    /// Reservoir chosen for the current trip
    pub fn target(&self) -> Option<StructureId> {
        self.target
    }

    fn get_task(&mut self, actor: &Actor, ctx: &mut TickContext) -> Option<Task> {
        // Every redirect moves to a state that returns or waits, so one pass
        // through all states is enough
        for _ in 0..ForageState::COUNT {
            match self.state {
                ForageState::SeekForageLocation => {
                    if actor.carrying.is_some() {
                        self.state = ForageState::ReserveStorage;
                        continue;
                    }
                    let resource = self.resource;
                    let preferred = self
                        .preferred
                        .filter(|id| ctx.structures.get(*id).is_some_and(|s| can_forage_at(s, resource)));
                    let target = match preferred {
                        Some(id) => id,
                        None => find_forage(ctx.structures, actor.position, self.resource, ctx.config.carry_capacity)?,
                    };
                    self.target = Some(target);
                    self.state = ForageState::ReserveWorkspace;
                    return Some(Task::Seek(SeekTask::new(SeekTarget::Structure(target))));
                }
                ForageState::ReserveWorkspace => {
                    let Some(target) = self.target.filter(|id| ctx.structures.contains(*id)) else {
                        self.state = ForageState::SeekForageLocation;
                        continue;
                    };
                    self.state = ForageState::SeekWorkspace;
                    return Some(Task::ReserveWorkspace(ReserveWorkspaceTask::new(target)));
                }
                ForageState::SeekWorkspace => match actor.target_workspace {
                    Some(claim) if ctx.structures.workspace_status(&claim) == ClaimStatus::Ready => {
                        self.state = ForageState::DoForage;
                        return Some(Task::Seek(SeekTask::new(SeekTarget::Workspace(claim))));
                    }
                    _ => self.state = ForageState::ReserveWorkspace,
                },
                ForageState::DoForage => match actor.target_workspace {
                    Some(claim) if ctx.structures.workspace_status(&claim) == ClaimStatus::Ready => {
                        self.state = ForageState::ReserveStorage;
                        return Some(Task::Forage(ForageTask::new(claim, self.resource)));
                    }
                    _ => self.state = ForageState::ReserveWorkspace,
                },
                ForageState::ReserveStorage => {
                    if actor.carrying.is_none() {
                        self.state = ForageState::SeekForageLocation;
                        continue;
                    }
                    self.state = ForageState::SeekStorage;
                    return Some(Task::ReserveStorage(ReserveStorageTask::new()));
                }
                ForageState::SeekStorage => match actor.storage_reservation {
                    Some(claim) if ctx.structures.resource_status(&claim) != ClaimStatus::Invalid => {
                        self.state = ForageState::DumpStorage;
                        return Some(Task::Seek(SeekTask::new(SeekTarget::Storage(claim))));
                    }
                    // Lapsed before we set off: ask again
                    Some(claim) => {
                        ctx.structures.release_resource(&claim);
                        self.state = ForageState::ReserveStorage;
                    }
                    // Storage gave up on us
                    None if actor.carrying.is_some() => {
                        self.state = ForageState::SeekForageLocation;
                        return Some(Task::Dump(DumpTask::new(DumpTarget::Ground)));
                    }
                    None => self.state = ForageState::SeekForageLocation,
                },
                ForageState::DumpStorage => match actor.storage_reservation {
                    Some(claim) => {
                        self.state = ForageState::SeekForageLocation;
                        return Some(Task::Dump(DumpTask::new(DumpTarget::Storage(claim))));
                    }
                    None => self.state = ForageState::ReserveStorage,
                },
            }
        }
        None
    }
}
