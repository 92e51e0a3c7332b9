//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};

/// Simulation tick counter (simulation time unit)
pub type Tick = u64;

/// Unique identifier for stationary world structures
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StructureId(pub u64);

/// Unique identifier for mobile agents
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActorId(pub u64);

/// Unique identifier for huntable animals
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AnimalId(pub u64);

/// Identifier of a reservation, unique within the store or structure that issued it
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReservationId(pub u64);

/// Kind of material a store can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Wood,
    Stone,
    Meat,
    Berries,
    Fiber,
    Ore,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 6] = [
        ResourceKind::Wood,
        ResourceKind::Stone,
        ResourceKind::Meat,
        ResourceKind::Berries,
        ResourceKind::Fiber,
        ResourceKind::Ore,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ResourceKind::Wood => "wood",
            ResourceKind::Stone => "stone",
            ResourceKind::Meat => "meat",
            ResourceKind::Berries => "berries",
            ResourceKind::Fiber => "fiber",
            ResourceKind::Ore => "ore",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed quantity of material, as carried by an actor or withdrawn from a store
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceBundle {
    pub resource: ResourceKind,
    pub quantity: f32,
}

impl ResourceBundle {
    pub fn new(resource: ResourceKind, quantity: f32) -> Self {
        Self { resource, quantity }
    }

    pub fn is_empty(&self) -> bool {
        self.quantity <= EPSILON
    }
}

/// Tolerance for quantity comparisons
pub const EPSILON: f32 = 1e-4;
