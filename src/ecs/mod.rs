pub mod world;

pub use world::{EntityRef, World};
