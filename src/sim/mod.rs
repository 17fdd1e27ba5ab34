//! Headless reference host.
//!
//! Owns agents, indexes them in a spatial hash every tick and answers the
//! engine's ports from that index.

mod host;
mod world;

pub use host::WorldHost;
pub use world::{SimAgent, SpeciesReport, World, WorldReport, JUVENILE_TICKS};
