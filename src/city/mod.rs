//! City layer - structures, workspaces, stores, and allocation

pub mod allocation;
pub mod store;
pub mod structure;
pub mod structures;

pub use allocation::{can_forage_at, find_forage, reserve_resource_in_storage, reserve_storage};
pub use store::{ResourceStore, StoreMode};
pub use structure::{Structure, Workspace};
pub use structures::Structures;
