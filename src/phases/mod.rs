use crate::context::ExploreContext;
use crate::events::Event;
use async_trait::async_trait;

mod launching;
mod running;
mod recovering;
mod done;

pub use launching::LaunchingPhase;
pub use running::RunningPhase;
pub use recovering::RecoveringPhase;
pub use done::DonePhase;

/// The contract every phase must fulfill.
///
/// # Implementing a Phase
///
/// 1. `handle()` performs the phase's work using only `ctx`.
/// 2. `handle()` MUST return an Event. It never panics.
/// 3. Device trouble, missing recovery paths and failed replay steps are
///    data, not errors: log them and return the normal Event.
/// 4. Never hold the ledger lock across an `.await` or a driver call.
/// 5. Always call `ctx.log()` at least once per handle() call.
///
#[async_trait]
pub trait PhaseHandler: Send + Sync {
    /// Must match the phase the handler is registered for.
    fn name(&self) -> &'static str;

    async fn handle(&self, ctx: &mut ExploreContext) -> Event;
}
