use std::collections::HashMap;
use std::sync::Arc;
use crate::context::ExploreContext;
use crate::error::ExploreError;
use crate::events::Event;
use crate::ledger::SharedLedger;
use crate::phases::PhaseHandler;
use crate::snapshot::{FinalReport, SnapshotStore};
use crate::trace::Trace;
use crate::transitions::TransitionTable;
use crate::types::Phase;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

pub struct Explorer {
    ctx:         ExploreContext,
    phase:       Phase,
    transitions: TransitionTable,
    handlers:    HashMap<Phase, Box<dyn PhaseHandler>>,
    store:       Arc<dyn SnapshotStore>,
}

impl Explorer {
    /// Creates a new explorer. Prefer using ExplorerBuilder for ergonomic construction.
    pub fn new(
        ctx:         ExploreContext,
        transitions: TransitionTable,
        handlers:    HashMap<Phase, Box<dyn PhaseHandler>>,
        store:       Arc<dyn SnapshotStore>,
    ) -> Self {
        Self {
            ctx,
            phase: Phase::Launching,
            transitions,
            handlers,
            store,
        }
    }

    /// Runs one session to completion.
    ///
    /// Starts the snapshot task, steps until `Done`, stops and joins the task,
    /// then persists and returns the final report.
    pub async fn run(&mut self) -> Result<FinalReport, ExploreError> {
        self.ctx.started = Instant::now();
        tracing::info!(
            session = %self.ctx.session_id,
            app     = %self.ctx.config.app,
            agent   = self.ctx.agent.name(),
            "exploration started"
        );

        let snapshots = spawn_snapshot_task(
            Arc::clone(&self.ctx.ledger),
            Arc::clone(&self.store),
            self.ctx.started,
            self.ctx.config.record_interval(),
        );

        let outcome = self.drive().await;

        let (stop, task) = snapshots;
        let _ = stop.send(true);
        if let Err(e) = task.await {
            tracing::warn!(error = %e, "snapshot task did not shut down cleanly");
        }
        outcome?;

        // The loop and the snapshot task are both quiet now.
        let stats = self.ctx.stats();
        self.store.save_stats(stats).await.map_err(ExploreError::Persistence)?;

        let report = self.final_report();
        self.store.save_final(report.clone()).await.map_err(ExploreError::Persistence)?;
        Ok(report)
    }

    async fn drive(&mut self) -> Result<(), ExploreError> {
        while !self.phase.is_terminal() {
            self.step().await?;
        }
        let handler = self.handlers.get(&self.phase)
            .ok_or(ExploreError::NoHandlerForPhase(self.phase))?;
        handler.handle(&mut self.ctx).await;
        Ok(())
    }

    /// Executes a single phase transition.
    pub async fn step(&mut self) -> Result<(), ExploreError> {
        let phase = self.phase;
        tracing::trace!(phase = %phase, tick = self.ctx.tick, "explorer step");

        let handler = self.handlers.get(&phase)
            .ok_or(ExploreError::NoHandlerForPhase(phase))?;

        let event: Event = handler.handle(&mut self.ctx).await;

        let next = self.transitions.get(&(phase, event))
            .copied()
            .ok_or(ExploreError::InvalidTransition { from: phase, event })?;

        if next != phase {
            tracing::info!(from = %phase, event = %event, to = %next, "transition");
        }
        self.ctx.log(phase.as_str(), "TRANSITION", &format!("{} -> {}", phase, next));

        self.phase = next;
        Ok(())
    }

    /// Assembles the session's final artifacts from the current tables.
    pub fn final_report(&self) -> FinalReport {
        let stats = self.ctx.stats();
        let (states, all_states) = {
            let ledger = self.ctx.ledger.lock();
            (ledger.state_summaries(), ledger.registry.all_states())
        };
        FinalReport {
            session_id: self.ctx.session_id.clone(),
            stats,
            ptg:        self.ctx.ptg.clone(),
            dfa:        self.ctx.dfa.dump(),
            states,
            all_states,
        }
    }

    /// Returns a reference to the full execution trace.
    pub fn trace(&self) -> &Trace {
        &self.ctx.trace
    }

    /// Returns the current phase (useful for inspection after run).
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn context(&self) -> &ExploreContext {
        &self.ctx
    }
}

/// Writes a stats snapshot every `period` until told to stop.
///
/// The ledger lock is held only while the snapshot is copied out.
fn spawn_snapshot_task(
    ledger:  SharedLedger,
    store:   Arc<dyn SnapshotStore>,
    started: Instant,
    period:  std::time::Duration,
) -> (watch::Sender<bool>, JoinHandle<()>) {
    let (stop_tx, mut stop_rx) = watch::channel(false);
    let task = tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(started + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let snapshot = ledger.lock().snapshot(started.elapsed().as_secs());
                    tracing::debug!(elapsed_secs = snapshot.elapsed_secs, states = snapshot.state_count, "stats snapshot");
                    if let Err(e) = store.save_stats(snapshot).await {
                        tracing::warn!(error = %e, "failed to save stats snapshot");
                    }
                }
                changed = stop_rx.changed() => {
                    if changed.is_err() || *stop_rx.borrow() {
                        break;
                    }
                }
            }
        }
    });
    (stop_tx, task)
}
