//! Simulation configuration with documented constants
//!
//! All tunable numbers for reservations, movement and foraging are
//! collected here. Values are in abstract simulation ticks and world units.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::error::{Result, SettlementError};
use crate::reservation::DEFAULT_GRANT_LIFETIME;

/// Configuration for the settlement simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    // === RESERVATIONS ===
    /// Ticks a granted reservation stays valid without being used
    ///
    /// A claim that is ready but never consumed is force-released after
    /// this many ticks, so an actor that wandered off cannot pin a
    /// workspace or storage space forever.
    pub reservation_lifetime: u32,

    // === MOVEMENT ===
    /// Distance covered per tick by newly spawned actors (world units)
    pub move_speed: f32,

    /// How far a wandering actor strays from its wander centre
    pub wander_radius: f32,

    // === FORAGING ===
    /// Maximum quantity an actor carries before heading to storage
    pub carry_capacity: f32,

    /// Quantity extracted from a reservoir per tick of foraging
    ///
    /// At 0.25 per tick a full load of 5.0 takes 20 ticks at the workspace.
    pub forage_rate: f32,

    /// Ticks an actor keeps asking for storage before discarding its load
    ///
    /// When every warehouse is full the load is dropped as a decaying pile
    /// so the forage loop keeps moving.
    pub storage_patience: u32,

    /// Quantity a discarded pile loses per tick
    pub pile_decay_rate: f32,

    // === DETERMINISM ===
    /// Seed for the world RNG (wander targets)
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            reservation_lifetime: DEFAULT_GRANT_LIFETIME,
            move_speed: 1.0,
            wander_radius: 4.0,
            carry_capacity: 5.0,
            forage_rate: 0.25,
            storage_patience: 300,
            pile_decay_rate: 0.01,
            seed: 42,
        }
    }
}

impl SimulationConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a config from a TOML file, filling missing keys with defaults
    pub fn load_from_toml(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_toml(&content)
    }

    /// Parse a config from a TOML string and validate it
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.reservation_lifetime == 0 {
            return Err(SettlementError::InvalidConfig(
                "reservation_lifetime must be at least one tick".into(),
            ));
        }

        if !(self.move_speed > 0.0) {
            return Err(SettlementError::InvalidConfig(format!(
                "move_speed ({}) must be positive",
                self.move_speed
            )));
        }

        if !(self.carry_capacity > 0.0) || !(self.forage_rate > 0.0) {
            return Err(SettlementError::InvalidConfig(
                "carry_capacity and forage_rate must be positive".into(),
            ));
        }

        if !(self.wander_radius >= 0.0) || !(self.pile_decay_rate >= 0.0) {
            return Err(SettlementError::InvalidConfig(
                "wander_radius and pile_decay_rate must not be negative".into(),
            ));
        }

        Ok(())
    }
}
