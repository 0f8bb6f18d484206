//! Entity hierarchy resolver tests

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

use anchorauth::{
    hierarchy_of, resolve_hierarchy, AnchorAuthError, Entity, EntityHierarchy, DATA_CONTENT_MODEL,
    LEVEL1_CONTENT_MODEL, LEVEL2_CONTENT_MODEL, MAX_HIERARCHY_DEPTH,
};

fn tree() -> HashMap<String, Entity> {
    [
        Entity::new("root", None, DATA_CONTENT_MODEL),
        Entity::new("L1", Some("root"), LEVEL1_CONTENT_MODEL),
        Entity::new("L2", Some("L1"), LEVEL2_CONTENT_MODEL),
        Entity::new("D", Some("L2"), DATA_CONTENT_MODEL),
        Entity::new("D2", Some("D"), DATA_CONTENT_MODEL),
        Entity::new("orphan", None, DATA_CONTENT_MODEL),
    ]
    .into_iter()
    .map(|e| (e.id.clone(), e))
    .collect()
}

fn ids(h: &EntityHierarchy) -> (Option<&str>, Option<&str>) {
    (h.level1_id.as_deref(), h.level2_id.as_deref())
}

#[test]
fn data_entity_resolves_nearest_anchors() {
    let t = tree();
    assert_eq!(ids(&resolve_hierarchy(&t, "D").unwrap()), (Some("L1"), Some("L2")));
    assert_eq!(ids(&resolve_hierarchy(&t, "D2").unwrap()), (Some("L1"), Some("L2")));
}

#[test]
fn structural_entities_anchor_themselves() {
    let t = tree();
    assert_eq!(ids(&resolve_hierarchy(&t, "L2").unwrap()), (Some("L1"), Some("L2")));
    // The nearest level1-or-level2 entity of a level1 entity is itself
    assert_eq!(ids(&resolve_hierarchy(&t, "L1").unwrap()), (Some("L1"), Some("L1")));
}

#[test]
fn entities_above_or_outside_the_branch_have_no_anchors() {
    let t = tree();
    assert_eq!(resolve_hierarchy(&t, "root").unwrap(), EntityHierarchy::default());
    assert_eq!(resolve_hierarchy(&t, "orphan").unwrap(), EntityHierarchy::default());
}

#[test]
fn level2_without_level1_ancestor() {
    let mut t = tree();
    t.insert("loose".into(), Entity::new("loose", Some("root"), LEVEL2_CONTENT_MODEL));
    t.insert("leaf".into(), Entity::new("leaf", Some("loose"), DATA_CONTENT_MODEL));
    assert_eq!(ids(&resolve_hierarchy(&t, "leaf").unwrap()), (None, Some("loose")));
}

#[test]
fn missing_entity_is_not_found() {
    let t = tree();
    assert!(matches!(resolve_hierarchy(&t, "nope"), Err(AnchorAuthError::NotFound(_))));
}

#[test]
fn missing_parent_is_not_found() {
    let t = tree();
    let dangling = Entity::new("x", Some("gone"), DATA_CONTENT_MODEL);
    assert!(matches!(hierarchy_of(&t, &dangling), Err(AnchorAuthError::NotFound(_))));
}

#[test]
fn hierarchy_of_skips_lookup_of_the_target() {
    // The target itself is not in the map; only its ancestors are
    let t = tree();
    let fresh = Entity::new("new", Some("L2"), DATA_CONTENT_MODEL);
    assert_eq!(ids(&hierarchy_of(&t, &fresh).unwrap()), (Some("L1"), Some("L2")));
}

#[test]
fn cycle_fails_with_storage_error() {
    let mut t: BTreeMap<String, Entity> = BTreeMap::new();
    t.insert("a".into(), Entity::new("a", Some("b"), DATA_CONTENT_MODEL));
    t.insert("b".into(), Entity::new("b", Some("a"), DATA_CONTENT_MODEL));
    assert!(matches!(resolve_hierarchy(&t, "a"), Err(AnchorAuthError::Storage(_))));
}

#[test]
fn chain_within_depth_limit_resolves() {
    let mut t: BTreeMap<String, Entity> = BTreeMap::new();
    t.insert("n0".into(), Entity::new("n0", None, LEVEL1_CONTENT_MODEL));
    for i in 1..MAX_HIERARCHY_DEPTH {
        let id = format!("n{}", i);
        let parent = format!("n{}", i - 1);
        t.insert(id.clone(), Entity::new(id, Some(parent.as_str()), DATA_CONTENT_MODEL));
    }
    let deepest = format!("n{}", MAX_HIERARCHY_DEPTH - 1);
    assert_eq!(ids(&resolve_hierarchy(&t, &deepest).unwrap()), (Some("n0"), Some("n0")));
}

#[test]
fn chain_beyond_depth_limit_fails() {
    let mut t: BTreeMap<String, Entity> = BTreeMap::new();
    t.insert("n0".into(), Entity::new("n0", None, LEVEL1_CONTENT_MODEL));
    for i in 1..=MAX_HIERARCHY_DEPTH {
        let id = format!("n{}", i);
        let parent = format!("n{}", i - 1);
        t.insert(id.clone(), Entity::new(id, Some(parent.as_str()), DATA_CONTENT_MODEL));
    }
    let deepest = format!("n{}", MAX_HIERARCHY_DEPTH);
    assert!(matches!(resolve_hierarchy(&t, &deepest), Err(AnchorAuthError::Storage(_))));
}

// ============================================================================
// Logging
// ============================================================================

/// Collects the message of every event
#[derive(Clone, Default)]
struct Messages(Arc<Mutex<Vec<String>>>);

struct MessageField(String);

impl Visit for MessageField {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{:?}", value);
        }
    }
}

impl<S: Subscriber> Layer<S> for Messages {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut message = MessageField(String::new());
        event.record(&mut message);
        self.0.lock().unwrap().push(message.0);
    }
}

#[test]
fn every_resolution_is_logged() {
    let t = tree();
    let messages = Messages::default();
    let subscriber = tracing_subscriber::registry().with(messages.clone());
    tracing::subscriber::with_default(subscriber, || {
        // Stops at L1 once both anchors are known
        resolve_hierarchy(&t, "D").unwrap();
        // Walks up to a root
        resolve_hierarchy(&t, "orphan").unwrap();
    });
    let logged = messages.0.lock().unwrap().iter().filter(|m| m.contains("resolved hierarchy")).count();
    assert_eq!(logged, 2);
}
