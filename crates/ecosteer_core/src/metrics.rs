//! Engine counters and logging setup.
//!
//! Counters are plain atomics so rayon workers can bump them without
//! contention.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// Shared counters for force composition and herd coordination.
#[derive(Debug)]
pub struct EngineMetrics {
    tick_count: AtomicU64,
    agent_count: AtomicU64,
    rules_evaluated: AtomicU64,
    rules_skipped: AtomicU64,
    quorum_denials: AtomicU64,
    leader_changes: AtomicU64,
    group_syncs: AtomicU64,
    start_time: Instant,
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tick_count: AtomicU64::new(0),
            agent_count: AtomicU64::new(0),
            rules_evaluated: AtomicU64::new(0),
            rules_skipped: AtomicU64::new(0),
            quorum_denials: AtomicU64::new(0),
            leader_changes: AtomicU64::new(0),
            group_syncs: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Records a completed host tick.
    pub fn record_tick(&self, duration: Duration, agents: usize) {
        let tick = self.tick_count.fetch_add(1, Ordering::Relaxed) + 1;
        self.agent_count.store(agents as u64, Ordering::Relaxed);

        if tick % 1000 == 0 {
            tracing::info!(
                tick = tick,
                agents = agents,
                rules_evaluated = self.rules_evaluated(),
                quorum_denials = self.quorum_denials(),
                duration_ms = duration.as_millis() as u64,
                "Steering tick"
            );
        }
    }

    pub fn record_rule_evaluated(&self) {
        self.rules_evaluated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rule_skipped(&self) {
        self.rules_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_quorum_denial(&self) {
        self.quorum_denials.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_leader_change(&self) {
        self.leader_changes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_group_sync(&self) {
        self.group_syncs.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.tick_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn agent_count(&self) -> u64 {
        self.agent_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn rules_evaluated(&self) -> u64 {
        self.rules_evaluated.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn rules_skipped(&self) -> u64 {
        self.rules_skipped.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn quorum_denials(&self) -> u64 {
        self.quorum_denials.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn leader_changes(&self) -> u64 {
        self.leader_changes.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn group_syncs(&self) -> u64 {
        self.group_syncs.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

/// Installs a global fmt subscriber filtered by `RUST_LOG`, defaulting to
/// `info`. Calling it twice is harmless.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing::subscriber::set_global_default(
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .finish(),
    )
    .ok();
}
