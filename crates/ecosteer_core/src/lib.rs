//! # Ecosteer Core
//!
//! Steering-force composition and herd coordination for simulated animals.
//!
//! This crate contains the per-agent behavior logic, including:
//! - A registry of steering rules folded into one capped force per tick
//! - Built-in flocking, wander, pursuit, evasion and home-range rules
//! - Herd coordination: quorum gating, leader following, selfish-herd
//!   cohesion and separation
//! - Persisted dominance with lazy seeding and periodic decay
//! - A uniform grid for neighbor queries, metrics and structured logging
//!
//! ## Architecture
//!
//! The engine never owns agents. A host builds a [`context::BehaviorContext`]
//! per agent per tick, passing itself as the [`ports::Host`] that answers
//! neighbor queries, stores per-agent components and reports the clock.
//! Each agent owns a [`registry::BehaviorRegistry`]; registries of different
//! agents share nothing, so hosts may evaluate them in parallel.
//!
//! ## Example
//!
//! ```
//! use ecosteer_core::config::{EngineConfig, SpeciesProfile};
//! use ecosteer_core::context::BehaviorContext;
//! use ecosteer_core::ports::MemoryHost;
//! use ecosteer_core::registry::BehaviorRegistry;
//! use ecosteer_core::rules::RuleSeed;
//! use ecosteer_data::{AgentView, Uuid};
//!
//! let me = AgentView { id: Uuid::from_u128(1), ..Default::default() };
//! let host = MemoryHost::with_agents(vec![me.clone()]);
//! let profile = SpeciesProfile::herbivore("sheep");
//! let mut registry = BehaviorRegistry::from_profile(
//!     &profile,
//!     &EngineConfig::default(),
//!     &RuleSeed::new(me.id, me.position),
//! )
//! .unwrap();
//!
//! let ctx = BehaviorContext::new(&me, &[], &host);
//! let force = registry.calculate(&ctx, &profile.weights);
//! assert!(force.magnitude() <= me.max_force + 1e-12);
//! ```

/// Engine and species configuration
pub mod config;
/// Per-tick input handed to every rule
pub mod context;
/// Registration errors
pub mod error;
/// Herd coordination
pub mod herd;
/// Behavior identifiers and categories
pub mod kind;
/// Counters and logging setup
pub mod metrics;
/// Host-facing traits and an in-memory host
pub mod ports;
/// Per-agent rule registry and force composition
pub mod registry;
/// The rule trait
pub mod rule;
/// Built-in rules and the profile-driven factory
pub mod rules;
/// Uniform grid for x/z neighbor queries
pub mod spatial_hash;
/// Seek, flee, arrive, pursue and evade primitives
pub mod steering;
/// Per-behavior weight table
pub mod weights;

pub use context::BehaviorContext;
pub use error::RegistryError;
pub use herd::{HerdBehavior, HerdStats};
pub use kind::{BehaviorCategory, BehaviorKind};
pub use metrics::{init_logging, EngineMetrics};
pub use ports::{Clock, ComponentStore, Host, MemoryHost, NeighborQuery};
pub use registry::BehaviorRegistry;
pub use rule::BehaviorRule;
pub use weights::WeightTable;
