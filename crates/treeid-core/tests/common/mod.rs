use treeid_core::config::ResolverConfig;
use treeid_core::model::{Blueprint, InstanceId, Node, SlotName};
use treeid_core::{
    reconcile, ActionKind, InstanceMap, NoRetention, PassOutput, ReconciliationPlan,
    RetainComponents, Resolver, Session,
};

/// First render of `tree` into an empty map, no retention
#[allow(dead_code)]
pub fn mount(tree: &Node) -> PassOutput {
    reconcile(
        None,
        tree,
        &InstanceMap::new(),
        &NoRetention,
        &ResolverConfig::default(),
    )
    .unwrap()
}

/// Re-render `next` over the map produced for `previous`, no retention
#[allow(dead_code)]
pub fn rerender(previous: &Node, next: &Node, instances: &InstanceMap) -> PassOutput {
    reconcile(
        Some(previous),
        next,
        instances,
        &NoRetention,
        &ResolverConfig::default(),
    )
    .unwrap()
}

/// Session whose `KeepAlive` components retain their default slot
#[allow(dead_code)]
pub fn keep_alive_session(max_entries: Option<usize>) -> Session {
    let mut policy = RetainComponents::new(["KeepAlive"]);
    if let Some(max) = max_entries {
        policy = policy.with_max_entries(max);
    }
    Session::new(Resolver::with_policy(ResolverConfig::default(), policy).unwrap())
}

#[allow(dead_code)]
pub fn keep_alive(children: Vec<Node>) -> Node {
    Node::component(Blueprint::new("KeepAlive")).with_children(children)
}

/// A component node with a single text child
#[allow(dead_code)]
pub fn tab(name: &str) -> Node {
    Node::component(Blueprint::new(name)).with_children(vec![Node::text(name.to_lowercase())])
}

#[allow(dead_code)]
pub fn li(key: &str) -> Node {
    Node::intrinsic("li").with_key(key)
}

/// Follow default-slot child indices from the root
#[allow(dead_code)]
pub fn id_at(instances: &InstanceMap, path: &[usize]) -> InstanceId {
    let mut current = instances.root().unwrap().id();
    for &index in path {
        current = instances.get(current).unwrap().children(&SlotName::default())[index];
    }
    current
}

#[allow(dead_code)]
pub fn count(plan: &ReconciliationPlan, kind: ActionKind) -> usize {
    plan.actions_of(kind).count()
}

#[allow(dead_code)]
pub fn id(raw: u64) -> InstanceId {
    serde_json::from_value(serde_json::json!(raw)).unwrap()
}
