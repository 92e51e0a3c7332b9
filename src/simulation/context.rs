//! Per-tick context handed to actors, orders, and tasks

use rand_chacha::ChaCha8Rng;

use crate::city::structures::Structures;
use crate::core::config::SimulationConfig;
use crate::core::types::Tick;
use crate::simulation::events::SimulationEvent;

/// Mutable view of the world an actor may touch while it steps
pub struct TickContext<'a> {
    pub tick: Tick,
    pub structures: &'a mut Structures,
    pub config: &'a SimulationConfig,
    pub rng: &'a mut ChaCha8Rng,
    pub events: &'a mut Vec<SimulationEvent>,
}
