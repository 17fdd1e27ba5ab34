//! Core data structures shared by the engine, the persistence layer and hosts.

pub mod agent;
pub mod component;
pub mod vector;
