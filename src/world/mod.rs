//! Settlement layouts and loading them into a world

pub mod layout;
pub mod loader;

pub use layout::{ActorLayout, LayoutFile, OrderLayout, StoreLayout, StructureLayout};
pub use loader::{LayoutLoader, DEMO_LAYOUT};
