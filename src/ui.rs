//! UI hierarchy snapshots as reported by a device driver.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One element of a UI hierarchy dump.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UiNode {
    #[serde(default)]
    pub attributes: HashMap<String, String>,
    #[serde(default)]
    pub children:   Vec<UiNode>,
}

/// Axis-aligned element bounds, parsed from `"[x1,y1][x2,y2]"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub left:   i32,
    pub top:    i32,
    pub right:  i32,
    pub bottom: i32,
}

impl Bounds {
    pub fn parse(raw: &str) -> Option<Self> {
        let numbers: Vec<i32> = raw
            .split(|c: char| c == '[' || c == ']' || c == ',')
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.trim().parse::<i32>())
            .collect::<Result<_, _>>()
            .ok()?;
        match numbers.as_slice() {
            [left, top, right, bottom] => Some(Self { left: *left, top: *top, right: *right, bottom: *bottom }),
            _ => None,
        }
    }

    pub fn center(&self) -> (i32, i32) {
        ((self.left + self.right) / 2, (self.top + self.bottom) / 2)
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.left && x <= self.right && y >= self.top && y <= self.bottom
    }
}

impl std::fmt::Display for Bounds {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "[{},{}][{},{}]", self.left, self.top, self.right, self.bottom)
    }
}

impl UiNode {
    pub fn new(node_type: impl Into<String>) -> Self {
        let mut attributes = HashMap::new();
        attributes.insert("type".to_string(), node_type.into());
        Self { attributes, children: Vec::new() }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_bounds(self, bounds: Bounds) -> Self {
        self.with_attr("bounds", bounds.to_string())
    }

    pub fn clickable(self, clickable: bool) -> Self {
        self.with_attr("clickable", if clickable { "true" } else { "false" })
    }

    pub fn with_child(mut self, child: UiNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(|s| s.as_str())
    }

    pub fn node_type(&self) -> &str {
        self.attr("type").unwrap_or("")
    }

    pub fn is_clickable(&self) -> bool {
        self.attr("clickable") == Some("true")
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.attr("bounds").and_then(Bounds::parse)
    }

    /// Resolves a structural path (`/Type[n]/Type[n]...`) produced by the
    /// click detector. `"/"` addresses the root itself.
    pub fn locate(&self, path: &str) -> Option<&UiNode> {
        let mut node = self;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            let (node_type, ordinal) = parse_segment(segment)?;
            node = node.children.iter()
                .filter(|c| c.node_type() == node_type)
                .nth(ordinal.checked_sub(1)?)?;
        }
        Some(node)
    }
}

fn parse_segment(segment: &str) -> Option<(&str, usize)> {
    let open = segment.find('[')?;
    let close = segment.rfind(']')?;
    if close <= open {
        return None;
    }
    let ordinal = segment[open + 1..close].parse().ok()?;
    Some((&segment[..open], ordinal))
}
