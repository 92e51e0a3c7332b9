//! Tick system - advances the whole world one step
//!
//! Entities update in registry order: actors step their tasks, structures
//! tick their stores and workspace queues. Piles that decayed away are
//! removed at the end of the tick.

use crate::core::types::{ActorId, Tick};
use crate::ecs::world::{EntityRef, World};
use crate::simulation::context::TickContext;
use crate::simulation::events::SimulationEvent;

/// Run a single simulation tick
pub fn run_simulation_tick(world: &mut World) -> Vec<SimulationEvent> {
    let mut events = Vec::new();
    let tick = world.current_tick;

    // Entities registered during this tick first update on the next one
    let order: Vec<EntityRef> = world.registry().to_vec();
    for entry in order {
        match entry {
            EntityRef::Actor(id) => update_actor(world, id, tick, &mut events),
            EntityRef::Structure(id) => {
                if let Some(structure) = world.structures.get_mut(id) {
                    structure.update();
                }
            }
        }
    }

    remove_spent_piles(world, tick, &mut events);
    world.current_tick += 1;
    events
}

fn update_actor(world: &mut World, id: ActorId, tick: Tick, events: &mut Vec<SimulationEvent>) {
    let Some(mut actor) = world.take_actor(id) else {
        return;
    };
    let mut ctx = TickContext {
        tick,
        structures: &mut world.structures,
        config: &world.config,
        rng: &mut world.rng,
        events,
    };
    actor.update(&mut ctx);
    world.restore_actor(actor);
    world.sync_spawned();
}

fn remove_spent_piles(world: &mut World, tick: Tick, events: &mut Vec<SimulationEvent>) {
    let spent = world.structures.remove_spent();
    if spent.is_empty() {
        return;
    }
    for structure in &spent {
        tracing::debug!("Pile {:?} decayed away", structure);
        events.push(SimulationEvent::PileSpent {
            tick,
            structure: *structure,
        });
    }
    world.forget_structures(&spent);
}
