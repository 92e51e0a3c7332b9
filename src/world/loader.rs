//! Build a world from a JSON layout
//!
//! `LayoutLoader` turns a `LayoutFile` into a populated `World`: structures
//! first, in file order, then actors with their starting orders.

use ahash::AHashMap;
use glam::Vec2;
use std::path::Path;

use crate::city::allocation::can_forage_at;
use crate::city::store::ResourceStore;
use crate::core::config::SimulationConfig;
use crate::core::error::{Result, SettlementError};
use crate::core::types::StructureId;
use crate::ecs::world::World;
use crate::entity::orders::Order;
use crate::world::layout::{LayoutFile, OrderLayout, StoreLayout};

/// The layout the binary runs when no file is given
pub const DEMO_LAYOUT: &str = include_str!("../../data/demo_layout.json");

fn vec2(pair: [f32; 2]) -> Vec2 {
    Vec2::new(pair[0], pair[1])
}

/// Loader that converts layout files into worlds
pub struct LayoutLoader {
    config: SimulationConfig,
}

impl LayoutLoader {
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }

    pub fn load_from_json(&self, json: &str) -> Result<World> {
        let file: LayoutFile = serde_json::from_str(json)?;
        self.load_from_layout(&file)
    }

    pub fn load_from_file(&self, path: &Path) -> Result<World> {
        let content = std::fs::read_to_string(path)?;
        self.load_from_json(&content)
    }

    pub fn load_demo(&self) -> Result<World> {
        self.load_from_json(DEMO_LAYOUT)
    }

    pub fn load_from_layout(&self, file: &LayoutFile) -> Result<World> {
        if file.version != 1 {
            return Err(SettlementError::InvalidLayout(format!(
                "unsupported layout version {}",
                file.version
            )));
        }

        let mut world = World::new(self.config.clone())?;
        let mut by_name: AHashMap<&str, StructureId> = AHashMap::new();

        for layout in &file.structures {
            if by_name.contains_key(layout.name.as_str()) {
                return Err(SettlementError::InvalidLayout(format!(
                    "duplicate structure name '{}'",
                    layout.name
                )));
            }
            let id = world.spawn_structure(layout.name.clone(), vec2(layout.position));
            let structure = world
                .structures
                .get_mut(id)
                .ok_or(SettlementError::StructureNotFound(id))?;
            for offset in &layout.workspaces {
                structure.add_workspace(vec2(*offset));
            }
            for store in &layout.stores {
                structure.set_store(build_store(store)?)?;
            }
            by_name.insert(layout.name.as_str(), id);
        }

        for layout in &file.actors {
            let id = world.spawn_actor(layout.name.clone(), vec2(layout.position));
            let order = match &layout.order {
                None => continue,
                Some(OrderLayout::Move { destination }) => Order::move_to(vec2(*destination)),
                Some(OrderLayout::Forage { resource, at: None }) => Order::forage(*resource),
                Some(OrderLayout::Forage {
                    resource,
                    at: Some(name),
                }) => {
                    let structure = *by_name.get(name.as_str()).ok_or_else(|| {
                        SettlementError::InvalidLayout(format!(
                            "actor '{}' forages at unknown structure '{}'",
                            layout.name, name
                        ))
                    })?;
                    if !world
                        .structures
                        .get(structure)
                        .is_some_and(|s| can_forage_at(s, *resource))
                    {
                        return Err(SettlementError::InvalidLayout(format!(
                            "actor '{}' cannot forage {} at '{}'",
                            layout.name, resource, name
                        )));
                    }
                    Order::forage_at(*resource, structure)
                }
            };
            world.set_order(id, order)?;
        }

        tracing::info!(
            "Loaded layout with {} structures and {} actors",
            world.structure_count(),
            world.actor_count()
        );
        Ok(world)
    }
}

fn build_store(layout: &StoreLayout) -> Result<ResourceStore> {
    match layout {
        StoreLayout::Warehouse { capacity, accepts } => ResourceStore::warehouse(*capacity, accepts.iter().copied()),
        StoreLayout::Reservoir {
            quantity,
            resource,
            regen,
        } => ResourceStore::reservoir(*quantity, *resource, *regen),
    }
}
