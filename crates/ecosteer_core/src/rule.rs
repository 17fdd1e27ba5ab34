use crate::context::BehaviorContext;
use ecosteer_data::Vec3;

/// A steering behavior: turns a context into a force.
///
/// Rules may keep state between ticks (a pursuit target, a wander angle,
/// a herd's membership cache), so evaluation takes `&mut self`. Each agent
/// owns its rules; nothing is shared between agents except through the
/// host. Implementations must tolerate an empty neighbor slice and must not
/// panic on degenerate geometry; returning [`Vec3::ZERO`] is always valid.
pub trait BehaviorRule: Send {
    fn calculate(&mut self, ctx: &BehaviorContext<'_>) -> Vec3;

    /// Drops any cached per-agent state.
    fn reset(&mut self) {}
}

/// Adapts a closure into a [`BehaviorRule`].
pub struct FnRule<F>(F);

impl<F> FnRule<F>
where
    F: FnMut(&BehaviorContext<'_>) -> Vec3 + Send,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> BehaviorRule for FnRule<F>
where
    F: FnMut(&BehaviorContext<'_>) -> Vec3 + Send,
{
    fn calculate(&mut self, ctx: &BehaviorContext<'_>) -> Vec3 {
        (self.0)(ctx)
    }
}

/// Always returns the same force. Handy for tests and scripted overrides.
#[derive(Debug, Clone, Copy)]
pub struct ConstantRule(pub Vec3);

impl BehaviorRule for ConstantRule {
    fn calculate(&mut self, _ctx: &BehaviorContext<'_>) -> Vec3 {
        self.0
    }
}
