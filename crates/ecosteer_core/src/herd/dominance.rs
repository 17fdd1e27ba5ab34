use crate::config::EngineConfig;
use crate::ports::ComponentStore;
use ecosteer_data::{HerdComponent, Uuid};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Reads and writes persisted dominance through a [`ComponentStore`].
///
/// An agent without a stored component gets a seeded random dominance in
/// [0, 1) the first time anyone asks, and that value is written back so it
/// survives save and load. Dominance decays toward a floor at a fixed tick
/// interval but never below it, and never increases on its own.
#[derive(Debug, Clone, Copy)]
pub struct DominanceLedger {
    seed: u64,
    decay_interval: u64,
    decay_rate: f64,
    floor: f64,
}

impl DominanceLedger {
    #[must_use]
    pub fn new(engine: &EngineConfig) -> Self {
        Self {
            seed: engine.seed,
            decay_interval: engine.dominance_decay_interval_ticks.max(1),
            decay_rate: engine.dominance_decay_rate,
            floor: engine.dominance_floor,
        }
    }

    /// The value an agent starts with when nothing is stored.
    #[must_use]
    pub fn initial(&self, id: Uuid) -> f64 {
        let (hi, lo) = id.as_u64_pair();
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed ^ hi ^ lo.rotate_left(29));
        rng.gen::<f64>()
    }

    fn load_or_init<S: ComponentStore + ?Sized>(
        &self,
        store: &S,
        id: Uuid,
        tick: u64,
    ) -> HerdComponent {
        if let Some(component) = store.load(id) {
            return component;
        }
        let component = HerdComponent::with_dominance(self.initial(id), tick);
        store.store(id, component);
        component
    }

    pub fn dominance<S: ComponentStore + ?Sized>(&self, store: &S, id: Uuid, tick: u64) -> f64 {
        self.load_or_init(store, id, tick).dominance
    }

    /// Stores `value` clamped to [0, 1].
    pub fn set<S: ComponentStore + ?Sized>(&self, store: &S, id: Uuid, value: f64, tick: u64) {
        let mut component = self.load_or_init(store, id, tick);
        component.set_dominance(value);
        store.store(id, component);
    }

    /// Adds `amount` and returns the clamped result. Used by hosts when a
    /// contest is won.
    pub fn increase<S: ComponentStore + ?Sized>(
        &self,
        store: &S,
        id: Uuid,
        amount: f64,
        tick: u64,
    ) -> f64 {
        let mut component = self.load_or_init(store, id, tick);
        component.set_dominance(component.dominance + amount);
        store.store(id, component);
        component.dominance
    }

    pub fn decrease<S: ComponentStore + ?Sized>(
        &self,
        store: &S,
        id: Uuid,
        amount: f64,
        tick: u64,
    ) -> f64 {
        self.increase(store, id, -amount, tick)
    }

    /// Applies any decay that is due at `tick`. Returns whether the stored
    /// component was touched.
    pub fn apply_decay<S: ComponentStore + ?Sized>(&self, store: &S, id: Uuid, tick: u64) -> bool {
        let mut component = self.load_or_init(store, id, tick);
        if tick.saturating_sub(component.last_decay_tick) < self.decay_interval {
            return false;
        }
        if component.dominance > self.floor {
            let decayed = (component.dominance - self.decay_rate).max(self.floor);
            component.set_dominance(decayed);
        }
        component.last_decay_tick = tick;
        store.store(id, component);
        true
    }
}
