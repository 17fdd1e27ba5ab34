//! Reference host for the ecosteer steering engine.
//!
//! [`sim::World`] spawns herds from species profiles and advances them with
//! the engine's registries; the `ecosteer` binary drives it from the
//! command line.

pub mod sim;
