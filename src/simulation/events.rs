use serde::{Deserialize, Serialize};

use crate::core::types::{ActorId, ResourceKind, StructureId, Tick};

/// Events that occurred during a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimulationEvent {
    /// An actor finished a load at a reservoir
    Foraged {
        tick: Tick,
        actor: ActorId,
        structure: StructureId,
        resource: ResourceKind,
        quantity: f32,
    },
    /// An actor dropped carried goods into storage
    Deposited {
        tick: Tick,
        actor: ActorId,
        structure: StructureId,
        resource: ResourceKind,
        quantity: f32,
    },
    /// An actor gave up on storage and left its load on the ground
    Discarded {
        tick: Tick,
        actor: ActorId,
        pile: StructureId,
        resource: ResourceKind,
        quantity: f32,
    },
    /// A ground pile decayed away
    PileSpent { tick: Tick, structure: StructureId },
}
