use crate::context::ExploreContext;
use crate::events::Event;
use crate::phases::PhaseHandler;
use async_trait::async_trait;

pub struct LaunchingPhase;

#[async_trait]
impl PhaseHandler for LaunchingPhase {
    fn name(&self) -> &'static str { "Launching" }

    async fn handle(&self, ctx: &mut ExploreContext) -> Event {
        let app = ctx.config.app.clone();
        let ability = ctx.config.entry_ability.clone();

        // A failed launch is not fatal: the first perception is then out of
        // domain and the agent's only move is a restart.
        if let Err(e) = ctx.driver.launch(&app, &ability) {
            tracing::warn!(app = %app, error = %e, "launch failed");
            ctx.log("Launching", "LAUNCH_FAILED", &e.to_string());
        }
        tokio::time::sleep(ctx.config.restart_delay()).await;

        let raw = ctx.perceive();
        let (state, id) = ctx.canonicalize(raw);
        ctx.count_page(&state);
        ctx.ledger.lock().visit_state(&state);
        ctx.current = state;
        ctx.current_id = id;
        // The first Running tick learns from the launch state.
        ctx.resync_agent(None);

        let summary = format!("app={} state={} {}", app, id, ctx.current);
        ctx.log("Launching", "LAUNCHED", &summary);
        Event::Launched
    }
}
