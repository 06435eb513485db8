use crate::action::{Action, ClickAction, PageRef};
use crate::ui::UiNode;
use std::collections::HashMap;

/// Produces the actions currently available on a screen.
///
/// # Contract
/// - The returned list is ordered as discovered.
/// - It always ends with an implicit Back for the current page.
pub trait ActionDetector: Send + Sync {
    fn detect(&self, tree: &UiNode, ability: &str, page: &str) -> Vec<Action>;
}

/// Emits one Click per clickable element, located by structural path.
#[derive(Debug, Default, Clone, Copy)]
pub struct ClickActionDetector;

impl ClickActionDetector {
    fn walk(node: &UiNode, path: &str, origin: &PageRef, out: &mut Vec<Action>) {
        if node.is_clickable() {
            let (x, y) = node.bounds().map(|b| b.center()).unwrap_or((0, 0));
            out.push(Action::Click(
                ClickAction::new(path, origin.clone())
                    .at(x, y)
                    .with_element_type(node.node_type()),
            ));
        }
        let mut seen: HashMap<&str, usize> = HashMap::new();
        for child in &node.children {
            let child_type = child.node_type();
            // A nested window belongs to another surface; nothing past it is ours.
            if child_type == "WindowScene" {
                return;
            }
            let ordinal = seen.entry(child_type).or_insert(0);
            *ordinal += 1;
            let child_path = format!("{}/{}[{}]", path.trim_end_matches('/'), child_type, ordinal);
            Self::walk(child, &child_path, origin, out);
        }
    }
}

impl ActionDetector for ClickActionDetector {
    fn detect(&self, tree: &UiNode, ability: &str, page: &str) -> Vec<Action> {
        let origin = PageRef::new(ability, page);
        let mut actions = Vec::new();
        Self::walk(tree, "/", &origin, &mut actions);
        actions.push(Action::Back(origin));
        actions
    }
}
