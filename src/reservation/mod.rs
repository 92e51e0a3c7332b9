//! Reservations - claim tickets on scarce resources
//!
//! Reservations are owned by the store or structure that issued them. Tasks
//! and actors only hold the copyable claim handles defined here and go
//! through the structure registry to query or release them.

pub mod kinds;
pub mod ticket;

use serde::{Deserialize, Serialize};

use crate::core::types::{ReservationId, ResourceKind, StructureId};

pub use kinds::{HuntingReservation, ResourceReservation, WorkspaceReservation};
pub use ticket::{ClaimStatus, Reservation};

/// Ticks a ready reservation survives unused
pub const DEFAULT_GRANT_LIFETIME: u32 = 2500;

/// Handle to a workspace reservation held by an actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkspaceClaim {
    pub structure: StructureId,
    pub reservation: ReservationId,
}

/// Handle to a storage-space or resource-content reservation held by an actor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceClaim {
    pub structure: StructureId,
    pub reservation: ReservationId,
    pub resource: ResourceKind,
    pub quantity: f32,
}
