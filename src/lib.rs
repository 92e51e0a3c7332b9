//! Homestead - settlement simulation core
//!
//! Workers follow orders, orders hand out tasks, and tasks compete for
//! scarce workspaces and storage through reservations.

pub mod city;
pub mod core;
pub mod ecs;
pub mod entity;
pub mod reservation;
pub mod simulation;
pub mod world;
