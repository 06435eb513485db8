use crate::context::ExploreContext;
use crate::events::Event;
use crate::phases::PhaseHandler;
use async_trait::async_trait;

pub struct DonePhase;

#[async_trait]
impl PhaseHandler for DonePhase {
    fn name(&self) -> &'static str { "Done" }

    async fn handle(&self, ctx: &mut ExploreContext) -> Event {
        let stats = ctx.stats();
        let summary = format!(
            "ticks={} actions={} states={} pages={} recoveries={}",
            ctx.tick, stats.action_count, stats.state_count, stats.page_count.len(), ctx.recoveries
        );
        tracing::info!(
            session    = %ctx.session_id,
            ticks      = ctx.tick,
            actions    = stats.action_count,
            states     = stats.state_count,
            recoveries = ctx.recoveries,
            "exploration finished"
        );
        ctx.log("Done", "SESSION_COMPLETE", &summary);
        Event::BudgetExhausted // never looked up, Done is terminal
    }
}
