//! Simulation loop - per-tick context, events, and the tick driver

pub mod context;
pub mod events;
pub mod tick;

pub use context::TickContext;
pub use events::SimulationEvent;
pub use tick::run_simulation_tick;
