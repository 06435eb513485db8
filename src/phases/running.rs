use crate::agent::{ExploreView, Observation};
use crate::context::ExploreContext;
use crate::events::Event;
use crate::ledger::TransitionRecord;
use crate::phases::PhaseHandler;
use crate::state::WindowState;
use crate::types::StateId;
use async_trait::async_trait;

/// One exploration tick: decide, act, re-perceive, learn.
pub struct RunningPhase;

#[async_trait]
impl PhaseHandler for RunningPhase {
    fn name(&self) -> &'static str { "Running" }

    async fn handle(&self, ctx: &mut ExploreContext) -> Event {
        if ctx.is_exhausted() {
            let summary = format!("ticks={} elapsed={}s", ctx.tick, ctx.elapsed_secs());
            ctx.log("Running", "BUDGET_EXHAUSTED", &summary);
            return Event::BudgetExhausted;
        }
        ctx.tick += 1;

        let prev = ctx.current.clone();
        let prev_id = ctx.current_id;

        let chosen = {
            let view = ExploreView { ptg: &ctx.ptg, actions: &ctx.catalog.actions };
            ctx.agent.select_action(Observation::new(&prev, prev_id), &view)
        };
        let action = match chosen {
            Some(action) => action,
            None => {
                tracing::warn!(state = %prev_id, "agent chose nothing, restarting");
                ctx.restart_action()
            }
        };
        let action_id = ctx.catalog.action_id(&action);

        ctx.ledger.lock().action_count += 1;
        ctx.execute(&action).await;

        let raw = ctx.perceive();
        let (next, next_id) = ctx.canonicalize(raw);

        // Nothing observably changed.
        if ctx.config.emit_same_url && next.as_action_set().is_some() && next == prev {
            let ability = prev.as_action_set().map(|s| s.ability().to_string()).unwrap_or_default();
            let same = WindowState::same_url(ctx.config.app.clone(), ability);
            {
                let view = ExploreView { ptg: &ctx.ptg, actions: &ctx.catalog.actions };
                ctx.agent.update(&action, Observation::new(&same, StateId::SAME_URL), &view);
                ctx.agent.resync(Some(&action), Observation::new(&prev, prev_id), &view);
            }
            ctx.count_page(&prev);
            {
                let mut ledger = ctx.ledger.lock();
                ledger.visit_state(&prev);
                ledger.log_transition(TransitionRecord { from: prev_id, action: action_id, to: StateId::SAME_URL });
            }
            ctx.same_page_ticks += 1;
            ctx.no_new_state_ticks += 1;
            ctx.log("Running", "SAME_URL", &format!("{} on {}", action, prev_id));
            return verdict(ctx);
        }

        let same_page = matches!((prev.page(), next.page()), (Some(a), Some(b)) if a == b);
        if same_page {
            ctx.same_page_ticks += 1;
        } else {
            ctx.same_page_ticks = 0;
        }

        if let (Some(from), Some(to)) = (prev.page(), next.page()) {
            if ctx.ptg.record_edge(from, to, &action) {
                tracing::info!(from, to, component = action.location().unwrap_or(""), "new page edge");
            }
        }

        {
            let view = ExploreView { ptg: &ctx.ptg, actions: &ctx.catalog.actions };
            ctx.agent.update(&action, Observation::new(&next, next_id), &view);
        }

        ctx.count_page(&next);
        let is_new = {
            let mut ledger = ctx.ledger.lock();
            let is_new = ledger.visit_state(&next);
            ledger.log_transition(TransitionRecord { from: prev_id, action: action_id, to: next_id });
            is_new
        };

        if ctx.dfa.record(&prev, &action, &next) {
            tracing::debug!(from = %prev_id, to = %next_id, "automaton edge");
        }

        if is_new {
            ctx.no_new_state_ticks = 0;
        } else {
            ctx.no_new_state_ticks += 1;
        }

        let step = format!("{} {} -> {}{}", action, prev_id, next_id, if is_new { " (new)" } else { "" });
        ctx.current = next;
        ctx.current_id = next_id;
        ctx.log("Running", "STEP", &step);

        verdict(ctx)
    }
}

fn verdict(ctx: &mut ExploreContext) -> Event {
    if !ctx.config.recovery {
        return Event::Continue;
    }
    let limits = ctx.config.stagnation;
    if ctx.same_page_ticks >= limits.same_page_ticks || ctx.no_new_state_ticks >= limits.no_new_state_ticks {
        let why = format!("same_page={} no_new_state={}", ctx.same_page_ticks, ctx.no_new_state_ticks);
        tracing::info!(
            same_page_ticks    = ctx.same_page_ticks,
            no_new_state_ticks = ctx.no_new_state_ticks,
            "exploration stagnated"
        );
        ctx.log("Running", "STAGNATED", &why);
        return Event::Stagnated;
    }
    Event::Continue
}
