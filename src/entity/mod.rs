//! Mobile agents and the orders and tasks that drive them

pub mod actor;
pub mod orders;
pub mod tasks;

pub use actor::Actor;
pub use orders::{ForageOrder, ForageState, MoveOrder, MoveState, Order};
pub use tasks::{DumpTarget, SeekTarget, Task};
