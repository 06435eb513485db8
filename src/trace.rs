use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One line of the session log, written by `ExploreContext::log`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEntry {
    pub tick:      usize,
    pub phase:     String,
    pub event:     String,
    pub data:      String,
    pub timestamp: DateTime<Utc>,
}

/// Append-only log of everything the explorer did during a session.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Trace {
    entries: Vec<TraceEntry>,
}

impl Trace {
    pub fn new() -> Self { Self::default() }

    pub fn record(&mut self, entry: TraceEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn with_event(&self, event: &str) -> Vec<&TraceEntry> {
        self.entries.iter().filter(|e| e.event == event).collect()
    }

    /// Number of `TRANSITION` entries for the phase change `from -> to`.
    pub fn count_transitions(&self, from: &str, to: &str) -> usize {
        self.with_event("TRANSITION")
            .into_iter()
            .filter(|e| e.data.split_once(" -> ") == Some((from, to)))
            .count()
    }

    /// How often each event label occurs, in label order.
    pub fn event_totals(&self) -> BTreeMap<&str, usize> {
        let mut totals = BTreeMap::new();
        for e in &self.entries {
            *totals.entry(e.event.as_str()).or_insert(0) += 1;
        }
        totals
    }

    /// Dumps the log and the per-event totals to stdout.
    pub fn print(&self) {
        println!("\n{:>5}  {:<11} {:<20} detail", "tick", "phase", "event");
        for e in &self.entries {
            let detail: String = e.data.chars().take(48).collect();
            println!("{:>5}  {:<11} {:<20} {}", e.tick, e.phase, e.event, detail);
        }
        println!();
        for (event, n) in self.event_totals() {
            println!("{:<20} {}", event, n);
        }
    }
}
