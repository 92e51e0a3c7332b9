//! JSON schema types for settlement layouts
//!
//! A layout lists the structures and actors a world starts with. Positions
//! are `[x, y]` pairs in world units.

use serde::{Deserialize, Serialize};

use crate::core::types::ResourceKind;

/// Root structure for layout JSON files
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LayoutFile {
    /// Schema version (currently 1)
    pub version: u32,
    #[serde(default)]
    pub metadata: Option<LayoutMetadata>,
    #[serde(default)]
    pub structures: Vec<StructureLayout>,
    #[serde(default)]
    pub actors: Vec<ActorLayout>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LayoutMetadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A structure placed in the world
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StructureLayout {
    /// Unique within the layout; actors refer to structures by name
    pub name: String,
    pub position: [f32; 2],
    /// Workspace offsets relative to `position`
    #[serde(default)]
    pub workspaces: Vec<[f32; 2]>,
    /// At most one entry is allowed
    #[serde(default)]
    pub stores: Vec<StoreLayout>,
}

/// A store attached to a structure
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreLayout {
    Warehouse {
        capacity: f32,
        accepts: Vec<ResourceKind>,
    },
    Reservoir {
        quantity: f32,
        resource: ResourceKind,
        #[serde(default)]
        regen: f32,
    },
}

/// An actor placed in the world
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ActorLayout {
    pub name: String,
    pub position: [f32; 2],
    #[serde(default)]
    pub order: Option<OrderLayout>,
}

/// The order an actor starts with
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OrderLayout {
    Forage {
        resource: ResourceKind,
        /// Name of a preferred reservoir
        #[serde(default)]
        at: Option<String>,
    },
    Move {
        destination: [f32; 2],
    },
}
