//! Actors - mobile agents that follow one order at a time

use glam::Vec2;

use crate::city::structures::Structures;
use crate::core::types::{ActorId, ResourceBundle, ResourceKind};
use crate::entity::orders::Order;
use crate::entity::tasks::Task;
use crate::reservation::{ResourceClaim, WorkspaceClaim};
use crate::simulation::context::TickContext;

/// A mobile agent
///
/// An actor holds at most one order and at most one task. When the task
/// finishes, the next one is derived from the order on the following update.
#[derive(Debug, Clone)]
pub struct Actor {
    id: ActorId,
    pub name: String,
    pub position: Vec2,
    /// Distance covered per tick
    pub move_speed: f32,
    task: Option<Task>,
    order: Option<Order>,
    pub carrying: Option<ResourceBundle>,
    /// Workspace claim held across the reserve, seek, and forage steps
    pub target_workspace: Option<WorkspaceClaim>,
    /// Storage claim held between reserving and dumping
    pub storage_reservation: Option<ResourceClaim>,
}

impl Actor {
    pub fn new(id: ActorId, name: impl Into<String>, position: Vec2, move_speed: f32) -> Self {
        Self {
            id,
            name: name.into(),
            position,
            move_speed,
            task: None,
            order: None,
            carrying: None,
            target_workspace: None,
            storage_reservation: None,
        }
    }

    pub fn id(&self) -> ActorId {
        self.id
    }

    pub fn task(&self) -> Option<&Task> {
        self.task.as_ref()
    }

    pub fn order(&self) -> Option<&Order> {
        self.order.as_ref()
    }

    pub fn is_idle(&self) -> bool {
        self.task.is_none() && self.order.is_none()
    }

    /// Replace the current order, canceling the old one first
    pub fn set_order(&mut self, order: Order, structures: &mut Structures) {
        self.clear_order(structures);
        tracing::debug!("{} takes a {} order", self.name, order.label());
        self.order = Some(order);
    }

    /// Cancel the current order and task, releasing every held claim
    pub fn clear_order(&mut self, structures: &mut Structures) {
        match self.order.take() {
            Some(mut order) => order.cancel(self, structures),
            None => {
                if let Some(mut task) = self.task.take() {
                    task.cancel(self, structures);
                }
                self.release_claims(structures);
            }
        }
    }

    pub(crate) fn take_task(&mut self) -> Option<Task> {
        self.task.take()
    }

    /// Release the workspace and storage claims this actor holds
    pub fn release_claims(&mut self, structures: &mut Structures) {
        if let Some(claim) = self.target_workspace.take() {
            structures.release_workspace(&claim);
        }
        if let Some(claim) = self.storage_reservation.take() {
            structures.release_resource(&claim);
        }
    }

    /// Advance one tick: derive a task from the order if idle, then step it
    pub fn update(&mut self, ctx: &mut TickContext) {
        if self.task.is_none() {
            if let Some(mut order) = self.order.take() {
                self.task = order.get_task(self, ctx);
                if let Some(task) = &self.task {
                    tracing::trace!("{} starts {}", self.name, task.label());
                }
                self.order = Some(order);
            }
        }

        if let Some(mut task) = self.task.take() {
            task.step(self, ctx);
            if !task.is_completed() {
                self.task = Some(task);
            }
        }
    }

    /// Quantity of `resource` currently carried
    pub fn carried(&self, resource: ResourceKind) -> f32 {
        self.carrying
            .filter(|load| load.resource == resource)
            .map_or(0.0, |load| load.quantity)
    }

    /// Add `bundle` to the load; false if already carrying another kind
    pub fn load(&mut self, bundle: ResourceBundle) -> bool {
        match &mut self.carrying {
            None => {
                self.carrying = Some(bundle);
                true
            }
            Some(load) if load.resource == bundle.resource => {
                load.quantity += bundle.quantity;
                true
            }
            Some(_) => false,
        }
    }

    /// Take up to `quantity` off the load
    pub fn unload(&mut self, quantity: f32) -> Option<ResourceBundle> {
        let load = self.carrying.as_mut()?;
        let taken = load.quantity.min(quantity);
        load.quantity -= taken;
        let resource = load.resource;
        if load.is_empty() {
            self.carrying = None;
        }
        Some(ResourceBundle::new(resource, taken))
    }
}
