//! Resolver configuration loading

#![allow(clippy::unwrap_used, clippy::expect_used)]

use treeid_core::config::{ResolverConfig, DEFAULT_MAX_DEPTH, MAX_DEPTH_CEILING};
use treeid_core::model::{Blueprint, Node, NodeKind, SlotName};
use treeid_core::policy::{RetainComponents, RetentionPolicy};
use treeid_core::ResolveError;

#[test]
fn test_empty_document_uses_defaults() {
    let config = ResolverConfig::from_toml_str("").unwrap();
    assert_eq!(config, ResolverConfig::default());
    assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
    assert!(config.keep_alive.components.is_empty());
    assert_eq!(config.keep_alive.max_entries, None);
}

#[test]
fn test_full_document() {
    let config = ResolverConfig::from_toml_str(
        r#"
        max_depth = 32

        [keep_alive]
        components = ["KeepAlive", "TabView"]
        max_entries = 4
        include = ["Panel"]
        exclude = ["Video"]
        "#,
    )
    .unwrap();

    assert_eq!(config.max_depth, 32);
    assert_eq!(config.keep_alive.components, vec!["KeepAlive", "TabView"]);
    assert_eq!(config.keep_alive.max_entries, Some(4));
    assert_eq!(config.keep_alive.include, vec!["Panel"]);
    assert_eq!(config.keep_alive.exclude, vec!["Video"]);
}

#[test]
fn test_unknown_field_rejected() {
    let result = ResolverConfig::from_toml_str("max_dept = 3");
    assert!(matches!(result, Err(ResolveError::InvalidConfig { .. })));
}

#[test]
fn test_zero_depth_rejected() {
    let result = ResolverConfig::from_toml_str("max_depth = 0");
    assert!(matches!(result, Err(ResolveError::InvalidConfig { .. })));
}

#[test]
fn test_depth_above_ceiling_rejected() {
    let result = ResolverConfig::from_toml_str("max_depth = 1000000");
    assert!(matches!(result, Err(ResolveError::InvalidConfig { .. })));

    let at_ceiling = ResolverConfig::from_toml_str(&format!("max_depth = {}", MAX_DEPTH_CEILING));
    assert_eq!(at_ceiling.unwrap().max_depth, MAX_DEPTH_CEILING);
}

#[test]
fn test_blank_component_rejected() {
    let result = ResolverConfig::from_toml_str(
        r#"
        [keep_alive]
        components = ["  "]
        "#,
    );
    assert!(matches!(result, Err(ResolveError::InvalidConfig { .. })));
}

#[test]
fn test_policy_from_config_filters_kinds() {
    let config = ResolverConfig::from_toml_str(
        r#"
        [keep_alive]
        components = ["TabView"]
        max_entries = 2
        include = ["Panel", "Video"]
        exclude = ["Video"]
        "#,
    )
    .unwrap();
    let policy = RetainComponents::from_config(&config.keep_alive);

    let owner = Node::component(Blueprint::new("TabView"));
    let retention = policy.retention(&owner, &SlotName::default()).unwrap();
    assert_eq!(retention.max_entries, Some(2));
    assert!(retention.caches(&NodeKind::Component(Blueprint::new("Panel"))));
    assert!(!retention.caches(&NodeKind::Component(Blueprint::new("Video"))));
    assert!(!retention.caches(&NodeKind::Intrinsic("div".into())));

    let other = Node::component(Blueprint::new("Sidebar"));
    assert!(policy.retention(&other, &SlotName::default()).is_none());
}

#[test]
fn test_config_round_trips_through_toml() {
    let config = ResolverConfig::from_toml_str(
        r#"
        [keep_alive]
        components = ["KeepAlive"]
        "#,
    )
    .unwrap();
    let text = toml::to_string(&config).unwrap();
    assert_eq!(ResolverConfig::from_toml_str(&text).unwrap(), config);
}
