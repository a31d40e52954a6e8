//! Keep-Alive Retention Tests
//!
//! Branches leaving a retaining lineage are deactivated and parked instead of
//! destroyed, and come back with their original instances.
//!
//! ## Scenarios Covered
//!
//! 1. Toggling between two branch kinds round-trips both instances
//! 2. Capacity overflow evicts the oldest parked branch
//! 3. Destroying a lineage owner tears its cache down
//! 4. Stale, replaced and excluded entries are destroyed
//! 5. Restores wake only what the next tree still uses

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{id, keep_alive, keep_alive_session, li, tab};
use serde_json::json;
use treeid_core::config::ResolverConfig;
use treeid_core::keep_alive::Discriminator;
use treeid_core::model::{Blueprint, LifecycleStage, Lineage, Node, NodeKind, OpaqueState, SlotName};
use treeid_core::plan::Diagnostic;
use treeid_core::{ActionKind, PlanAction, RetainComponents, Resolver, Session};

fn lineage(owner: u64) -> Lineage {
    Lineage::new(id(owner), SlotName::default())
}

#[test]
fn test_toggle_round_trip_restores_original_instances() {
    let mut session = keep_alive_session(None);

    // GIVEN KeepAlive[TabA] with host state on TabA
    session.render(keep_alive(vec![tab("TabA")])).unwrap();
    let tab_a = id(2);
    let state = OpaqueState::new(vec![1u8, 2, 3]);
    assert!(session.attach_state(tab_a, state.clone()));

    // WHEN switching to TabB
    let rendered = session.render(keep_alive(vec![tab("TabB")])).unwrap();

    // THEN TabA is deactivated with its subtree, not destroyed
    assert_eq!(rendered.plan.ids_of(ActionKind::Create), vec![id(4), id(5)]);
    assert_eq!(rendered.plan.ids_of(ActionKind::Deactivate), vec![tab_a, id(3)]);
    assert!(rendered.plan.ids_of(ActionKind::Destroy).is_empty());
    assert_eq!(
        session.instances().get(tab_a).unwrap().stage(),
        LifecycleStage::Deactivated
    );
    assert_eq!(session.instances().parked_len(), 1);
    assert_eq!(session.instances().bound_len(), 3);

    // WHEN switching back to TabA
    let rendered = session.render(keep_alive(vec![tab("TabA")])).unwrap();

    // THEN the original TabA comes back and TabB is parked in turn
    assert_eq!(rendered.plan.ids_of(ActionKind::Activate), vec![tab_a, id(3)]);
    assert_eq!(rendered.plan.ids_of(ActionKind::Deactivate), vec![id(4), id(5)]);
    assert!(rendered.plan.ids_of(ActionKind::Create).is_empty());
    assert!(rendered.plan.ids_of(ActionKind::Destroy).is_empty());
    assert!(matches!(
        rendered.plan.actions_of(ActionKind::Update).next(),
        Some(PlanAction::Update { instance, previous_index: None, props_changed: false, .. })
            if *instance == tab_a
    ));

    let restored = session.instances().get(tab_a).unwrap();
    assert_eq!(restored.stage(), LifecycleStage::Live);
    assert!(restored.state().same_as(&state));

    // AND a second toggle round-trips TabB the same way
    let rendered = session.render(keep_alive(vec![tab("TabB")])).unwrap();
    assert_eq!(rendered.plan.ids_of(ActionKind::Activate), vec![id(4), id(5)]);
    assert_eq!(rendered.plan.ids_of(ActionKind::Deactivate), vec![tab_a, id(3)]);
    assert_eq!(session.instances().len(), 5);
}

#[test]
fn test_removed_branch_restores_with_new_props() {
    let mut session = keep_alive_session(None);
    let panel = |value: i64| {
        Node::component(Blueprint::new("Panel")).with_props(json!({ "value": value }))
    };

    session.render(keep_alive(vec![panel(1)])).unwrap();
    session.render(keep_alive(vec![])).unwrap();
    let rendered = session.render(keep_alive(vec![panel(2)])).unwrap();

    assert_eq!(rendered.plan.ids_of(ActionKind::Activate), vec![id(2)]);
    assert!(matches!(
        &rendered.plan.actions[1],
        PlanAction::Update { props_changed: true, .. }
    ));
    assert_eq!(
        session.instances().get(id(2)).unwrap().props(),
        &json!({"value": 2})
    );
}

#[test]
fn test_restore_activates_only_matched_descendants() {
    let mut session = keep_alive_session(None);
    let list = |keys: &[&str]| {
        Node::intrinsic("ul").with_children(keys.iter().map(|k| li(k)).collect())
    };

    // GIVEN ul[li(a), li(b)] parked
    session.render(keep_alive(vec![list(&["a", "b"])])).unwrap();
    session.render(keep_alive(vec![])).unwrap();

    // WHEN it comes back without li(b)
    let rendered = session.render(keep_alive(vec![list(&["a"])])).unwrap();

    // THEN li(b) is destroyed without ever being activated
    assert_eq!(rendered.plan.ids_of(ActionKind::Activate), vec![id(2), id(3)]);
    assert_eq!(rendered.plan.ids_of(ActionKind::Destroy), vec![id(4)]);
    assert!(rendered.plan.ids_of(ActionKind::Deactivate).is_empty());
    assert_eq!(
        session.instances().get(id(3)).unwrap().stage(),
        LifecycleStage::Live
    );
    assert_eq!(session.instances().bound_len(), 3);
}

#[test]
fn test_kind_change_parks_after_the_list_is_matched() {
    let mut session = keep_alive_session(None);

    // GIVEN KeepAlive[ul[li(a)]]
    session
        .render(keep_alive(vec![Node::intrinsic("ul").with_children(vec![li("a")])]))
        .unwrap();

    // WHEN a div takes index 0 and a ul follows it
    let rendered = session
        .render(keep_alive(vec![
            Node::intrinsic("div"),
            Node::intrinsic("ul").with_children(vec![li("a")]),
        ]))
        .unwrap();

    // THEN the old ul is parked once, not parked and pulled back in the same pass
    assert_eq!(
        rendered.plan.ids_of(ActionKind::Create),
        vec![id(4), id(5), id(6)]
    );
    assert_eq!(rendered.plan.ids_of(ActionKind::Deactivate), vec![id(2), id(3)]);
    assert!(rendered.plan.ids_of(ActionKind::Activate).is_empty());
    assert!(rendered.plan.ids_of(ActionKind::Destroy).is_empty());
    assert_eq!(session.instances().parked_len(), 1);
}

#[test]
fn test_overflow_evicts_oldest_parked_branch() {
    let mut session = keep_alive_session(Some(1));

    // GIVEN A then B rendered, A parked
    session.render(keep_alive(vec![tab("A")])).unwrap();
    session.render(keep_alive(vec![tab("B")])).unwrap();

    // WHEN C is rendered, parking B into a full cache
    let rendered = session.render(keep_alive(vec![tab("C")])).unwrap();

    // THEN A, the oldest entry, is really destroyed
    assert_eq!(rendered.plan.ids_of(ActionKind::Destroy), vec![id(2), id(3)]);
    assert_eq!(
        rendered.plan.diagnostics,
        vec![Diagnostic::Evicted {
            owner: id(1),
            slot: SlotName::default(),
            instance: id(2),
        }]
    );
    let released: Vec<_> = rendered.released.iter().map(|i| i.id()).collect();
    assert_eq!(released, vec![id(2), id(3)]);

    // AND only B remains parked
    let cache = session.instances().cache(&lineage(1)).unwrap();
    assert_eq!(cache.len(), 1);
    let parked = cache
        .get(&Discriminator::Kind(NodeKind::Component(Blueprint::new("B"))))
        .unwrap();
    assert_eq!(parked.instance, id(4));
}

#[test]
fn test_zero_capacity_destroys_immediately() {
    let mut session = keep_alive_session(Some(0));
    session.render(keep_alive(vec![tab("A")])).unwrap();

    let rendered = session.render(keep_alive(vec![])).unwrap();

    assert_eq!(rendered.plan.ids_of(ActionKind::Deactivate), vec![id(2), id(3)]);
    assert_eq!(rendered.plan.ids_of(ActionKind::Destroy), vec![id(2), id(3)]);
    assert_eq!(session.instances().len(), 1);
    assert!(session.instances().cache(&lineage(1)).is_none());
}

#[test]
fn test_destroying_owner_tears_down_cache() {
    let mut session = keep_alive_session(None);
    let page = |children: Vec<Node>| Node::intrinsic("div").with_children(children);

    // GIVEN div[KeepAlive[B]] with A parked
    session.render(page(vec![keep_alive(vec![tab("A")])])).unwrap();
    session.render(page(vec![keep_alive(vec![tab("B")])])).unwrap();
    assert_eq!(session.instances().parked_len(), 1);

    // WHEN the KeepAlive itself goes away
    let rendered = session.render(page(vec![])).unwrap();

    // THEN its live subtree and every parked branch are destroyed, once each
    assert_eq!(
        rendered.plan.ids_of(ActionKind::Destroy),
        vec![id(2), id(5), id(6), id(3), id(4)]
    );
    assert_eq!(session.instances().len(), 1);
    assert_eq!(session.instances().parked_len(), 0);
}

#[test]
fn test_stale_keyed_entry_is_destroyed_on_kind_change() {
    let mut session = keep_alive_session(None);

    // GIVEN A(key=k) parked
    session
        .render(keep_alive(vec![tab("A").with_key("k")]))
        .unwrap();
    session.render(keep_alive(vec![])).unwrap();

    // WHEN key k returns as a different kind
    let rendered = session
        .render(keep_alive(vec![tab("B").with_key("k")]))
        .unwrap();

    // THEN the stale branch is destroyed and B created fresh
    assert_eq!(rendered.plan.ids_of(ActionKind::Destroy), vec![id(2), id(3)]);
    assert_eq!(rendered.plan.ids_of(ActionKind::Create), vec![id(4), id(5)]);
    assert!(rendered.plan.ids_of(ActionKind::Activate).is_empty());
}

#[test]
fn test_parking_same_discriminator_replaces_older_entry() {
    let mut session = keep_alive_session(None);
    session
        .render(keep_alive(vec![tab("A"), tab("A")]))
        .unwrap();

    let rendered = session.render(keep_alive(vec![])).unwrap();

    // The second A displaces the first under the shared kind discriminator
    assert_eq!(rendered.plan.ids_of(ActionKind::Destroy), vec![id(2), id(3)]);
    let cache = session.instances().cache(&lineage(1)).unwrap();
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.entries()[0].instance, id(4));
}

#[test]
fn test_excluded_kind_is_destroyed_not_parked() {
    let policy = RetainComponents::new(["KeepAlive"]).with_exclude("Heavy");
    let mut session =
        Session::new(Resolver::with_policy(ResolverConfig::default(), policy).unwrap());
    session
        .render(keep_alive(vec![tab("Heavy"), tab("Light")]))
        .unwrap();

    let rendered = session.render(keep_alive(vec![])).unwrap();

    assert_eq!(rendered.plan.ids_of(ActionKind::Destroy), vec![id(2), id(3)]);
    assert_eq!(rendered.plan.ids_of(ActionKind::Deactivate), vec![id(4), id(5)]);
}

#[test]
fn test_non_retaining_parent_destroys() {
    let mut session = keep_alive_session(None);
    let list = |children: Vec<Node>| Node::intrinsic("ul").with_children(children);

    session.render(list(vec![tab("A")])).unwrap();
    let rendered = session.render(list(vec![])).unwrap();

    assert_eq!(rendered.plan.ids_of(ActionKind::Destroy), vec![id(2), id(3)]);
    assert!(rendered.plan.ids_of(ActionKind::Deactivate).is_empty());
}

#[test]
fn test_config_driven_retention() {
    let config = ResolverConfig::from_toml_str(
        r#"
        [keep_alive]
        components = ["KeepAlive"]
        max_entries = 1
        "#,
    )
    .unwrap();
    let mut session = Session::new(Resolver::new(config).unwrap());

    session.render(keep_alive(vec![tab("A")])).unwrap();
    session.render(keep_alive(vec![tab("B")])).unwrap();
    let rendered = session.render(keep_alive(vec![tab("A")])).unwrap();

    assert_eq!(rendered.plan.ids_of(ActionKind::Activate), vec![id(2), id(3)]);
    assert_eq!(rendered.plan.ids_of(ActionKind::Deactivate), vec![id(4), id(5)]);
}

#[test]
fn test_unmount_releases_live_and_parked() {
    let mut session = keep_alive_session(None);
    session.render(keep_alive(vec![tab("A")])).unwrap();
    session.render(keep_alive(vec![tab("B")])).unwrap();

    let released = session.unmount();

    assert_eq!(released.len(), 5);
    assert!(released
        .iter()
        .all(|i| i.stage() == LifecycleStage::Destroyed));
    assert!(session.instances().is_empty());
    assert!(session.current().is_none());
}
