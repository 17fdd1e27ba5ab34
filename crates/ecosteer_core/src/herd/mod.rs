//! Herd coordination: quorum-gated movement, leader following and
//! selfish-herd cohesion.
//!
//! [`HerdBehavior`] is the rule registered under `herd`; the other types are
//! its parts and can be used on their own.

mod behavior;
pub mod cohesion;
pub mod dominance;
pub mod leadership;
pub mod quorum;

pub use behavior::{region_group_id, HerdBehavior, HerdStats};
pub use cohesion::HerdCohesion;
pub use dominance::DominanceLedger;
pub use leadership::{LeaderCandidate, LeaderSelector};
pub use quorum::{quorum_ratio, QuorumGate};
