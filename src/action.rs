//! Moves the explorer can make.
//!
//! Actions are immutable value objects. Identity deliberately ignores
//! coordinates and element metadata: the same logical control clicked from
//! the same page is always the same action, even if the layout shifted.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// The page an action originates from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PageRef {
    pub ability: String,
    pub page:    String,
}

impl PageRef {
    pub fn new(ability: impl Into<String>, page: impl Into<String>) -> Self {
        Self { ability: ability.into(), page: page.into() }
    }
}

impl std::fmt::Display for PageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}/{}", self.ability, self.page)
    }
}

/// How a Click finds its element again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Locator {
    /// Structural path of the form `/Type[n]/Type[n]...`.
    XPath,
}

impl Locator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Locator::XPath => "xpath",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClickAction {
    pub locator:      Locator,
    pub location:     String,
    pub origin:       PageRef,
    /// Element type reported by the UI tree (e.g. `Button`, `TextInput`).
    pub element_type: String,
    pub x:            i32,
    pub y:            i32,
}

impl ClickAction {
    pub fn new(location: impl Into<String>, origin: PageRef) -> Self {
        Self {
            locator:      Locator::XPath,
            location:     location.into(),
            origin,
            element_type: String::new(),
            x:            0,
            y:            0,
        }
    }

    pub fn at(mut self, x: i32, y: i32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn with_element_type(mut self, element_type: impl Into<String>) -> Self {
        self.element_type = element_type.into();
        self
    }
}

impl PartialEq for ClickAction {
    fn eq(&self, other: &Self) -> bool {
        self.locator == other.locator
            && self.location == other.location
            && self.origin == other.origin
    }
}

impl Eq for ClickAction {}

impl Hash for ClickAction {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.locator.hash(state);
        self.location.hash(state);
        self.origin.hash(state);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Click(ClickAction),
    Back(PageRef),
    Restart { app: String, ability: String },
}

impl Action {
    pub fn click(location: impl Into<String>, ability: impl Into<String>, page: impl Into<String>) -> Self {
        Action::Click(ClickAction::new(location, PageRef::new(ability, page)))
    }

    pub fn back(ability: impl Into<String>, page: impl Into<String>) -> Self {
        Action::Back(PageRef::new(ability, page))
    }

    pub fn restart(app: impl Into<String>, ability: impl Into<String>) -> Self {
        Action::Restart { app: app.into(), ability: ability.into() }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Action::Back(_)        => "BackAction",
            Action::Click(_)       => "ClickAction",
            Action::Restart { .. } => "RestartAction",
        }
    }

    pub fn is_back(&self) -> bool {
        matches!(self, Action::Back(_))
    }

    pub fn is_click(&self) -> bool {
        matches!(self, Action::Click(_))
    }

    /// The structural path of a Click, `None` for every other kind.
    pub fn location(&self) -> Option<&str> {
        match self {
            Action::Click(c) => Some(c.location.as_str()),
            _                => None,
        }
    }

    pub fn origin(&self) -> Option<&PageRef> {
        match self {
            Action::Click(c) => Some(&c.origin),
            Action::Back(p)  => Some(p),
            Action::Restart { .. } => None,
        }
    }

    /// Stable digest over the identity fields. Unlike `Hash`, this is
    /// identical across processes, so orderings derived from it are reproducible.
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.kind().as_bytes());
        match self {
            Action::Click(c) => {
                for part in [c.locator.as_str(), c.location.as_str(), c.origin.ability.as_str(), c.origin.page.as_str()] {
                    hasher.update([0u8]);
                    hasher.update(part.as_bytes());
                }
            }
            Action::Back(p) => {
                for part in [&p.ability, &p.page] {
                    hasher.update([0u8]);
                    hasher.update(part.as_bytes());
                }
            }
            Action::Restart { app, ability } => {
                for part in [app, ability] {
                    hasher.update([0u8]);
                    hasher.update(part.as_bytes());
                }
            }
        }
        hasher.finalize().into()
    }

    fn identity_fields(&self) -> (&str, &str, &str) {
        match self {
            Action::Click(c)                 => (c.location.as_str(), c.origin.ability.as_str(), c.origin.page.as_str()),
            Action::Back(p)                  => ("", p.ability.as_str(), p.page.as_str()),
            Action::Restart { app, ability } => (app.as_str(), ability.as_str(), ""),
        }
    }
}

impl Ord for Action {
    fn cmp(&self, other: &Self) -> Ordering {
        self.kind().cmp(other.kind())
            .then_with(|| self.digest().cmp(&other.digest()))
            .then_with(|| self.identity_fields().cmp(&other.identity_fields()))
    }
}

impl PartialOrd for Action {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Action::Click(c) => write!(
                f, "ClickAction(locator={}, location={}, page={}, x={}, y={})",
                c.locator.as_str(), c.location, c.origin, c.x, c.y
            ),
            Action::Back(p) => write!(f, "BackAction(page={})", p),
            Action::Restart { app, ability } => write!(f, "RestartAction(app={}, ability={})", app, ability),
        }
    }
}
