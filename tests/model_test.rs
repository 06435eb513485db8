use std::collections::HashSet;
use uiexplore::{
    Action, ActionDetector, ActionId, ActionSetState, Bounds, Catalog, ClickAction,
    ClickActionDetector, PageRef, StateError, StateId, StateRegistry, UiNode, WindowState,
};

const ABILITY: &str = "EntryAbility";

fn clicks(page: &str, locations: &[&str]) -> WindowState {
    let mut actions: Vec<Action> = locations.iter()
        .map(|loc| Action::click(*loc, ABILITY, page))
        .collect();
    actions.push(Action::back(ABILITY, page));
    WindowState::action_set(actions, ABILITY, page).unwrap()
}

fn numbered(prefix: &str, n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("/Column[1]/{}[{}]", prefix, i)).collect()
}

fn refs(v: &[String]) -> Vec<&str> {
    v.iter().map(|s| s.as_str()).collect()
}

// ─────────────────────────────────────────────
// Action identity
// ─────────────────────────────────────────────

#[test]
fn test_click_identity_ignores_coordinates() {
    let origin = PageRef::new(ABILITY, "pages/Index");
    let a = Action::Click(ClickAction::new("/Column[1]/Button[1]", origin.clone()).at(10, 20));
    let b = Action::Click(
        ClickAction::new("/Column[1]/Button[1]", origin)
            .at(540, 1200)
            .with_element_type("Button"),
    );

    assert_eq!(a, b);
    let set: HashSet<Action> = [a, b].into_iter().collect();
    assert_eq!(set.len(), 1, "equal clicks must hash identically");
}

#[test]
fn test_click_identity_depends_on_origin_page() {
    let a = Action::click("/Column[1]/Button[1]", ABILITY, "pages/Index");
    let b = Action::click("/Column[1]/Button[1]", ABILITY, "pages/Detail");
    assert_ne!(a, b);
}

#[test]
fn test_back_and_restart_identity() {
    assert_eq!(Action::back(ABILITY, "pages/A"), Action::back(ABILITY, "pages/A"));
    assert_ne!(Action::back(ABILITY, "pages/A"), Action::back(ABILITY, "pages/B"));
    assert_eq!(Action::restart("com.x", ABILITY), Action::restart("com.x", ABILITY));
    assert!(Action::back(ABILITY, "pages/A").is_back());
    assert!(!Action::click("/x", ABILITY, "pages/A").is_back());
}

#[test]
fn test_action_digest_is_stable_and_ordering_total() {
    let a = Action::click("/Column[1]/Button[1]", ABILITY, "pages/A");
    let b = Action::click("/Column[1]/Button[1]", ABILITY, "pages/A");
    assert_eq!(a.digest(), b.digest());

    let mut actions = vec![
        Action::restart("com.x", ABILITY),
        Action::back(ABILITY, "pages/A"),
        a.clone(),
    ];
    actions.sort();
    let kinds: Vec<&str> = actions.iter().map(|a| a.kind()).collect();
    assert_eq!(kinds, vec!["BackAction", "ClickAction", "RestartAction"]);
}

// ─────────────────────────────────────────────
// States
// ─────────────────────────────────────────────

#[test]
fn test_state_equality_ignores_action_order() {
    let a = clicks("pages/A", &["/x[1]", "/x[2]"]);
    let b = WindowState::action_set(
        vec![
            Action::back(ABILITY, "pages/A"),
            Action::click("/x[2]", ABILITY, "pages/A"),
            Action::click("/x[1]", ABILITY, "pages/A"),
        ],
        ABILITY,
        "pages/A",
    ).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.cmp(&b), std::cmp::Ordering::Equal);
}

#[test]
fn test_empty_action_list_is_a_typed_condition() {
    let err = ActionSetState::new(vec![], ABILITY, "pages/Blank").unwrap_err();
    assert_eq!(err, StateError::NoActions { ability: ABILITY.into(), page: "pages/Blank".into() });
}

#[test]
fn test_similarity_requires_same_page() {
    let a = clicks("pages/A", &["/x[1]"]);
    let b = clicks("pages/B", &["/x[1]"]);
    assert_eq!(a.similarity(&b), 0.0);
    assert_eq!(a.similarity(&a), 1.0);
}

// ─────────────────────────────────────────────
// Canonicalization
// ─────────────────────────────────────────────

#[test]
fn test_pre_process_returns_the_earlier_state() {
    let base = numbered("Button", 9);
    let mut wider = base.clone();
    wider.push("/Column[1]/Image[1]".to_string());

    let first = clicks("pages/A", &refs(&base));   // 10 actions
    let second = clicks("pages/A", &refs(&wider)); // 11 actions, Jaccard 10/11

    let mut registry = StateRegistry::default();
    let canonical = registry.pre_process(first.clone());
    assert!(registry.visit(&canonical));

    let folded = registry.pre_process(second.clone());
    assert_eq!(folded, first, "the earlier state must win");
    assert_ne!(folded, second);
    assert_eq!(registry.cluster(&first), &[second]);
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.all_state_count(), 2);
}

#[test]
fn test_repeated_observations_join_the_cluster_once() {
    let base = numbered("Button", 9);
    let mut wider = base.clone();
    wider.push("/Column[1]/Image[1]".to_string());

    let first = clicks("pages/A", &refs(&base));
    let second = clicks("pages/A", &refs(&wider));

    let mut registry = StateRegistry::default();
    registry.visit(&first);
    for _ in 0..3 {
        assert_eq!(registry.pre_process(first.clone()), first);
        assert_eq!(registry.pre_process(second.clone()), first);
    }
    assert_eq!(registry.cluster(&first), &[second], "the representative is not its own member");
    assert_eq!(registry.all_state_count(), 2);
}

#[test]
fn test_pre_process_matches_through_cluster_members() {
    let base = numbered("Button", 9);
    let mut mid = base.clone();
    mid.extend(numbered("Image", 2));
    let mut far = mid.clone();
    far.extend(numbered("Text", 2));

    let first = clicks("pages/A", &refs(&base)); // 10
    let second = clicks("pages/A", &refs(&mid)); // 12, ~0.83 to first
    let third = clicks("pages/A", &refs(&far));  // 14, ~0.71 to first, ~0.86 to second

    assert!(first.similarity(&third) < 0.8);

    let mut registry = StateRegistry::default();
    registry.visit(&first);
    assert_eq!(registry.pre_process(second), first);
    assert_eq!(registry.pre_process(third), first, "near-duplicate of a cluster member folds in");
    assert_eq!(registry.cluster(&first).len(), 2);
}

#[test]
fn test_pre_process_first_match_wins() {
    let base = numbered("Button", 9);
    let mut one_more = base.clone();
    one_more.push("/Column[1]/Image[1]".to_string());
    let mut two_more = one_more.clone();
    two_more.push("/Column[1]/Image[2]".to_string());

    let first = clicks("pages/A", &refs(&base));
    let closer = clicks("pages/A", &refs(&one_more));
    let observed = clicks("pages/A", &refs(&two_more));
    assert!(observed.similarity(&closer) > observed.similarity(&first));

    let mut registry = StateRegistry::default();
    registry.visit(&first);
    registry.visit(&closer);
    assert_eq!(registry.pre_process(observed), first);
}

#[test]
fn test_dissimilar_and_reserved_states_pass_through() {
    let mut registry = StateRegistry::default();
    let a = clicks("pages/A", &["/x[1]", "/x[2]", "/x[3]"]);
    let b = clicks("pages/A", &["/y[1]"]);
    registry.visit(&a);
    assert_eq!(registry.pre_process(b.clone()), b);

    let ood = WindowState::out_of_domain("com.x", ABILITY);
    assert_eq!(registry.pre_process(ood.clone()), ood);
}

// ─────────────────────────────────────────────
// Abstraction & indexing
// ─────────────────────────────────────────────

#[test]
fn test_reserved_handles() {
    let restart = Action::restart("com.x", ABILITY);
    let mut catalog = Catalog::new(&restart);
    assert_eq!(catalog.actions.index_of(&restart), Some(ActionId(0)));

    assert_eq!(catalog.index_state(&WindowState::out_of_domain("com.x", ABILITY)), StateId::OUT_OF_DOMAIN);
    assert_eq!(catalog.index_state(&WindowState::same_url("com.x", ABILITY)), StateId::SAME_URL);
    assert_eq!(catalog.actions.len(), 1, "reserved states register nothing");

    let first = catalog.index_state(&clicks("pages/A", &["/x[1]"]));
    assert_eq!(first, StateId(2));
}

#[test]
fn test_abstraction_key_is_sorted_handle_set() {
    let restart = Action::restart("com.x", ABILITY);
    let mut catalog = Catalog::new(&restart);

    // Registered out of page order.
    let late = Action::click("/x[2]", ABILITY, "pages/A");
    assert_eq!(catalog.action_id(&late), ActionId(1));

    let state = clicks("pages/A", &["/x[1]", "/x[2]"]);
    let key = catalog.abstraction_key(&state);
    assert_eq!(key, "1,2,3");
}

#[test]
fn test_abstraction_registers_each_action_exactly_once() {
    let restart = Action::restart("com.x", ABILITY);
    let mut catalog = Catalog::new(&restart);
    let state = clicks("pages/A", &["/x[1]", "/x[2]"]);

    let (id, fresh) = catalog.index_state_checked(&state);
    assert!(fresh);
    assert_eq!(catalog.actions.len(), 4);

    let (again, fresh) = catalog.index_state_checked(&state);
    assert!(!fresh);
    assert_eq!(again, id);
    assert_eq!(catalog.actions.len(), 4, "second indexing must not grow the catalog");

    let overlapping = clicks("pages/A", &["/x[2]", "/x[3]"]);
    catalog.index_state(&overlapping);
    assert_eq!(catalog.actions.len(), 5, "only the unseen action is appended");
    assert_eq!(catalog.states.len(), 4);
}

// ─────────────────────────────────────────────
// Detector
// ─────────────────────────────────────────────

#[test]
fn test_click_detector_paths_and_trailing_back() {
    let tree = UiNode::new("root")
        .with_child(
            UiNode::new("Column")
                .with_child(UiNode::new("Button").clickable(true)
                    .with_bounds(Bounds { left: 0, top: 0, right: 100, bottom: 50 }))
                .with_child(UiNode::new("Text").clickable(false))
                .with_child(UiNode::new("Button").clickable(true)
                    .with_bounds(Bounds { left: 0, top: 100, right: 200, bottom: 150 })),
        )
        .with_child(
            UiNode::new("WindowScene")
                .with_child(UiNode::new("Button").clickable(true)),
        );

    let actions = ClickActionDetector.detect(&tree, ABILITY, "pages/A");
    let locations: Vec<Option<&str>> = actions.iter().map(|a| a.location()).collect();
    assert_eq!(locations, vec![Some("/Column[1]/Button[1]"), Some("/Column[1]/Button[2]"), None]);
    assert_eq!(actions.last(), Some(&Action::back(ABILITY, "pages/A")));

    match &actions[1] {
        Action::Click(click) => {
            assert_eq!((click.x, click.y), (100, 125));
            assert_eq!(click.element_type, "Button");
        }
        other => panic!("expected a click, got {}", other),
    }

    let resolved = tree.locate("/Column[1]/Button[2]").unwrap();
    assert_eq!(resolved.bounds().unwrap().center(), (100, 125));
    assert!(tree.locate("/Column[1]/Button[3]").is_none());
}
