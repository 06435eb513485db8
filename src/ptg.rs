//! Page transition graph: page path -> edges `{component, target page}`.
//!
//! Seeded once from a static-analysis dump (optional) and extended at run
//! time whenever a Click is observed to change the page.

use crate::action::Action;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PtgEdge {
    /// Structural path of the triggering element.
    pub component:   String,
    #[serde(default = "default_edge_action")]
    pub action:      String,
    #[serde(rename = "targetPage", default)]
    pub target_page: String,
}

fn default_edge_action() -> String {
    "click".to_string()
}

impl PtgEdge {
    pub fn click(component: impl Into<String>, target_page: impl Into<String>) -> Self {
        Self {
            component:   component.into(),
            action:      default_edge_action(),
            target_page: target_page.into(),
        }
    }

    /// An edge counts toward degrees only if it names a different page.
    fn leads_away_from(&self, source: &str) -> bool {
        !self.target_page.is_empty() && self.target_page != source
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageTransitionGraph {
    edges: BTreeMap<String, Vec<PtgEdge>>,
}

impl PageTransitionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(raw: &str) -> Result<Self, String> {
        serde_json::from_str(raw).map_err(|e| format!("invalid page transition graph: {}", e))
    }

    /// Loads a static seed file. A missing file yields an empty graph.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!(path = %path.display(), "no static graph seed, starting empty");
            return Ok(Self::new());
        }
        let raw = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
        let graph = Self::from_json(&raw)?;
        tracing::info!(pages = graph.page_count(), edges = graph.edge_count(), "loaded static graph seed");
        Ok(graph)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&self.edges).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn add_edge(&mut self, source: impl Into<String>, edge: PtgEdge) {
        self.edges.entry(source.into()).or_default().push(edge);
    }

    /// Records a page change caused by `action`. Returns `true` if a new
    /// edge was appended.
    ///
    /// Only Clicks that move to a different page are recorded, and an edge
    /// with the same `(component, target)` is never duplicated. The target
    /// page always gets an entry, even when nothing is recorded.
    pub fn record_edge(&mut self, source: &str, target: &str, action: &Action) -> bool {
        self.edges.entry(target.to_string()).or_default();
        let component = match action.location() {
            Some(location) if source != target => location,
            _ => return false,
        };
        let edges = self.edges.entry(source.to_string()).or_default();
        if edges.iter().any(|e| e.component == component && e.target_page == target) {
            return false;
        }
        tracing::debug!(source, target, component, "page transition edge");
        edges.push(PtgEdge::click(component, target));
        true
    }

    pub fn edges_from(&self, page: &str) -> &[PtgEdge] {
        self.edges.get(page).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn contains_page(&self, page: &str) -> bool {
        self.edges.contains_key(page)
    }

    pub fn out_degree(&self, page: &str) -> usize {
        self.edges_from(page).iter().filter(|e| e.leads_away_from(page)).count()
    }

    pub fn in_degree(&self, page: &str) -> usize {
        self.edges.iter()
            .flat_map(|(source, edges)| edges.iter().filter(move |e| e.leads_away_from(source)))
            .filter(|e| e.target_page == page)
            .count()
    }

    /// Page with the highest out-degree; ties go to the lexicographically first.
    pub fn richest_page(&self) -> Option<String> {
        let mut best: Option<(&str, usize)> = None;
        for page in self.edges.keys() {
            let degree = self.out_degree(page);
            if degree == 0 {
                continue;
            }
            if best.map_or(true, |(_, d)| degree > d) {
                best = Some((page, degree));
            }
        }
        best.map(|(page, _)| page.to_string())
    }

    /// Every page reachable from `start`, `start` included.
    pub fn reachable_from(&self, start: &str) -> BTreeSet<String> {
        let mut seen = BTreeSet::new();
        let mut stack = vec![start.to_string()];
        while let Some(page) = stack.pop() {
            if !seen.insert(page.clone()) {
                continue;
            }
            for edge in self.edges_from(&page) {
                if edge.leads_away_from(&page) && !seen.contains(&edge.target_page) {
                    stack.push(edge.target_page.clone());
                }
            }
        }
        seen
    }

    pub fn pages(&self) -> impl Iterator<Item = &str> {
        self.edges.keys().map(|k| k.as_str())
    }

    pub fn page_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(|v| v.len()).sum()
    }
}
