use crate::action::Action;
use crate::context::ExploreContext;
use crate::events::Event;
use crate::ledger::TransitionRecord;
use crate::phases::PhaseHandler;
use async_trait::async_trait;
use rand::Rng;

/// Restarts the app and replays a learned route to an under-explored page.
///
/// Every failure here is soft: a missing target or route ends recovery early,
/// a replay step that fails is skipped, and the session resumes Running.
pub struct RecoveringPhase;

#[async_trait]
impl PhaseHandler for RecoveringPhase {
    fn name(&self) -> &'static str { "Recovering" }

    async fn handle(&self, ctx: &mut ExploreContext) -> Event {
        ctx.recoveries += 1;
        let why = format!(
            "recovery={} same_page={} no_new_state={}",
            ctx.recoveries, ctx.same_page_ticks, ctx.no_new_state_ticks
        );
        ctx.log("Recovering", "RECOVERY_START", &why);

        ctx.agent.reset_episode();
        let restart = ctx.restart_action();
        arrive(ctx, &restart).await;

        let by_visits = ctx.rng.gen_bool(0.5);
        let target = if by_visits {
            ctx.ledger.lock().least_visited_page()
        } else {
            ctx.ptg.richest_page()
        };
        let heuristic = if by_visits { "least_visited" } else { "richest" };

        match plan_route(ctx, target.as_deref()) {
            Ok(path) => {
                let target = target.unwrap_or_default();
                tracing::info!(target = %target, heuristic, steps = path.len(), "replaying recovery route");
                for (step, action) in path.iter().enumerate() {
                    if !arrive(ctx, action).await {
                        ctx.log("Recovering", "REPLAY_STEP_FAILED", &format!("step {} {}", step + 1, action));
                    }
                }
                let reached = ctx.current.page().unwrap_or("-").to_string();
                ctx.log(
                    "Recovering",
                    "RECOVERED",
                    &format!("target={} reached={} steps={}", target, reached, path.len()),
                );
            }
            Err(reason) => {
                tracing::info!(heuristic, reason = %reason, "recovery aborted");
                ctx.log("Recovering", "RECOVERY_ABORTED", &reason);
            }
        }

        ctx.same_page_ticks = 0;
        ctx.no_new_state_ticks = 0;
        Event::Recovered
    }
}

/// Chooses the route from the current state to `target`.
fn plan_route(ctx: &ExploreContext, target: Option<&str>) -> Result<Vec<Action>, String> {
    let target = target.ok_or_else(|| "no target page".to_string())?;
    if ctx.current.page() == Some(target) {
        return Err(format!("already on {}", target));
    }
    if !ctx.dfa.contains(&ctx.current) {
        return Err(format!("{} is not in the automaton", ctx.current_id));
    }
    ctx.dfa.shortest_path(&ctx.current, target)
        .ok_or_else(|| format!("no recorded route to {}", target))
}

/// Executes one action and moves the session onto the resulting state.
/// Returns `false` when the device rejected the action.
async fn arrive(ctx: &mut ExploreContext, action: &Action) -> bool {
    let from = ctx.current_id;
    let action_id = ctx.catalog.action_id(action);
    ctx.ledger.lock().action_count += 1;
    let executed = ctx.execute(action).await.is_some();

    let raw = ctx.perceive();
    let (state, id) = ctx.canonicalize(raw);
    ctx.count_page(&state);
    {
        let mut ledger = ctx.ledger.lock();
        ledger.visit_state(&state);
        ledger.log_transition(TransitionRecord { from, action: action_id, to: id });
    }
    ctx.current = state;
    ctx.current_id = id;
    ctx.resync_agent(Some(action));
    executed
}
