//! Concrete reservation kinds: workspace slots, resource quantities, hunting targets

use crate::city::structure::Workspace;
use crate::core::types::{AnimalId, ReservationId, ResourceKind};
use crate::reservation::ticket::{ClaimStatus, Reservation};

/// Claim on one exclusive work slot of a structure
///
/// Once ready it is bound to a workspace index; releasing or expiring the
/// reservation also frees that workspace.
#[derive(Debug, Clone)]
pub struct WorkspaceReservation {
    id: ReservationId,
    workspace: Option<usize>,
    state: Reservation,
}

impl WorkspaceReservation {
    pub fn new(id: ReservationId) -> Self {
        Self {
            id,
            workspace: None,
            state: Reservation::new(),
        }
    }

    pub fn id(&self) -> ReservationId {
        self.id
    }

    /// Index of the bound workspace, if ready
    pub fn workspace(&self) -> Option<usize> {
        self.workspace
    }

    pub fn status(&self) -> ClaimStatus {
        self.state.status()
    }

    pub fn is_valid(&self) -> bool {
        self.state.is_valid()
    }

    pub fn is_ready(&self) -> bool {
        self.state.is_ready()
    }

    pub fn timer(&self) -> u32 {
        self.state.timer()
    }

    /// Bind to `slot` and grant the claim
    pub fn make_ready(&mut self, slot: usize, workspaces: &mut [Workspace], lifetime: u32) -> bool {
        let Some(workspace) = workspaces.get_mut(slot) else {
            return false;
        };
        if !self.state.make_ready(lifetime) {
            return false;
        }
        workspace.reserve();
        self.workspace = Some(slot);
        true
    }

    /// Invalidate and free the bound workspace
    pub fn release(&mut self, workspaces: &mut [Workspace]) {
        if self.state.release() {
            self.free_workspace(workspaces);
        }
    }

    /// Advance one tick; returns true if the claim expired on this tick
    pub fn update(&mut self, workspaces: &mut [Workspace]) -> bool {
        let expired = self.state.update();
        if expired {
            self.free_workspace(workspaces);
        }
        expired
    }

    fn free_workspace(&mut self, workspaces: &mut [Workspace]) {
        if let Some(workspace) = self.workspace.take().and_then(|slot| workspaces.get_mut(slot)) {
            workspace.release();
        }
    }
}

/// Claim on a quantity of material, or on space to put it, inside one store
#[derive(Debug, Clone)]
pub struct ResourceReservation {
    id: ReservationId,
    resource: ResourceKind,
    quantity: f32,
    state: Reservation,
}

impl ResourceReservation {
    pub fn new(id: ReservationId, resource: ResourceKind, quantity: f32) -> Self {
        Self {
            id,
            resource,
            quantity,
            state: Reservation::new(),
        }
    }

    pub fn id(&self) -> ReservationId {
        self.id
    }

    pub fn resource(&self) -> ResourceKind {
        self.resource
    }

    pub fn quantity(&self) -> f32 {
        self.quantity
    }

    pub fn status(&self) -> ClaimStatus {
        self.state.status()
    }

    pub fn is_valid(&self) -> bool {
        self.state.is_valid()
    }

    pub fn is_ready(&self) -> bool {
        self.state.is_ready()
    }

    pub fn is_pending(&self) -> bool {
        self.state.is_pending()
    }

    pub fn make_ready(&mut self, lifetime: u32) -> bool {
        self.state.make_ready(lifetime)
    }

    pub fn release(&mut self) {
        self.state.release();
    }

    pub fn update(&mut self) -> bool {
        self.state.update()
    }
}

/// Claim on an animal; references its target once ready
#[derive(Debug, Clone)]
pub struct HuntingReservation {
    id: ReservationId,
    target: Option<AnimalId>,
    state: Reservation,
}

impl HuntingReservation {
    pub fn new(id: ReservationId) -> Self {
        Self {
            id,
            target: None,
            state: Reservation::new(),
        }
    }

    pub fn id(&self) -> ReservationId {
        self.id
    }

    pub fn target(&self) -> Option<AnimalId> {
        self.target
    }

    pub fn status(&self) -> ClaimStatus {
        self.state.status()
    }

    pub fn make_ready(&mut self, target: AnimalId, lifetime: u32) -> bool {
        if !self.state.make_ready(lifetime) {
            return false;
        }
        self.target = Some(target);
        true
    }

    pub fn release(&mut self) {
        if self.state.release() {
            self.target = None;
        }
    }

    pub fn update(&mut self) -> bool {
        let expired = self.state.update();
        if expired {
            self.target = None;
        }
        expired
    }
}
