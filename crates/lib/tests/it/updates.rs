//! Local mutation tests
//!
//! Covers the draft-mutation path: scalar and container edits made through
//! `DocBinding::update`, how they land in the shared tree, and whether a
//! peer rebuilt from the encoded document sees the same state.

use serde_json::json;
use veneer::y_crdt::{Any, Map, Out, Transact};
use veneer::{DocBinding, Schema, TextPathSet, Value};

use crate::helpers::*;

/// Rebuilds a fresh binding from everything `binding` has encoded.
fn rebuild(binding: &DocBinding) -> DocBinding {
    let full = binding.encode_update().expect("document must encode");
    DocBinding::from_deltas(blog_schema(), TextPathSet::default(), [full])
        .expect("rebuild must succeed")
}

#[test]
fn test_scalar_updates_reach_the_snapshot() {
    let mut binding = blog_binding();
    binding
        .update(|draft| {
            draft.set("title", "release notes");
            draft.set("done", true);
            draft.set("stars", 4.5);
        })
        .expect("mutation must apply");

    let state = binding.state().expect("binding must be ready");
    assert_eq!(
        state.get("title").and_then(Value::as_str),
        Some("release notes")
    );
    assert_eq!(state.get("done").and_then(Value::as_bool), Some(true));
    assert_eq!(state.get("stars").and_then(Value::as_f64), Some(4.5));
}

#[test]
fn test_updates_persist_in_the_shared_tree() {
    let mut binding = blog_binding();
    binding
        .update(|draft| {
            draft.set("title", "kept");
            draft.set("tags", Value::from(json!(["a", "b"])));
        })
        .expect("mutation must apply");

    let rebuilt = rebuild(&binding);
    assert_eq!(
        rebuilt.state().expect("rebuilt must be ready"),
        binding.state().expect("binding must be ready")
    );
}

#[test]
fn test_container_edits_round_trip() {
    let mut binding = blog_binding();
    binding
        .update(|draft| {
            draft.set(
                "posts",
                Value::from(json!([
                    { "body": "first", "pinned": false },
                    { "body": "second", "pinned": true },
                ])),
            );
        })
        .expect("posts must seed");
    binding
        .update(|draft| {
            if let Some(posts) = draft.get_mut("posts") {
                posts.insert_at(1, Value::from(json!({ "body": "between", "pinned": false })));
                posts.remove_at(0);
            }
        })
        .expect("list edits must apply");

    let state = binding.state().expect("binding must be ready");
    let posts = state
        .get("posts")
        .and_then(Value::as_list)
        .expect("posts must be a list");
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].get("body").and_then(Value::as_str), Some("between"));
    assert_eq!(posts[1].get("body").and_then(Value::as_str), Some("second"));

    let rebuilt = rebuild(&binding);
    assert_eq!(rebuilt.state().expect("rebuilt must be ready"), state);
}

#[test]
fn test_list_elements_replace_in_place() {
    let mut binding = blog_binding();
    binding
        .update(|draft| {
            draft.set("tags", Value::from(json!(["old", "kept"])));
        })
        .expect("tags must seed");

    let mut peer = rebuild(&binding);
    binding
        .update(|draft| {
            if let Some(first) = draft.get_mut("tags").and_then(|tags| tags.get_index_mut(0)) {
                *first = "new".into();
            }
        })
        .expect("element replace must apply");

    let state = binding.state().expect("binding must be ready");
    let tags: Vec<&str> = state
        .get("tags")
        .and_then(Value::as_list)
        .expect("tags must be a list")
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert_eq!(tags, ["new", "kept"]);

    relay(&binding, &mut peer);
    assert_eq!(peer.state().expect("peer must be ready"), state);
}

#[test]
fn test_nested_mutation_through_paths() {
    let mut binding = blog_binding();
    binding
        .update(|draft| {
            draft.set(
                "posts",
                Value::from(json!([{ "body": "draft", "pinned": false }])),
            );
        })
        .expect("posts must seed");
    binding
        .update(|draft| {
            let path = ["posts".into(), 0.into(), "pinned".into()];
            if let Some(Value::Bool(pinned)) = draft.get_path_mut(&path) {
                *pinned = true;
            }
        })
        .expect("deep mutation must apply");

    let state = binding.state().expect("binding must be ready");
    let pinned = state
        .get_path(&["posts".into(), 0.into(), "pinned".into()])
        .and_then(Value::as_bool);
    assert_eq!(pinned, Some(true));
}

#[test]
fn test_plain_strings_stay_leaves() {
    let mut binding = blog_binding();
    binding
        .update(|draft| {
            draft.set("title", "plain");
        })
        .expect("mutation must apply");

    // With no text path registered, a string lands as an ordinary leaf
    let doc = binding.doc().expect("binding must be ready");
    let root = doc.get_or_insert_map(veneer::constants::ROOT);
    let txn = doc.transact();
    match root.get(&txn, "title") {
        Some(Out::Any(Any::String(content))) => assert_eq!(content.as_ref(), "plain"),
        other => panic!("title must stay a plain leaf, got {other:?}"),
    }
}

#[test]
fn test_touchless_mutations_change_nothing() {
    let mut binding = blog_binding();
    let log = StateLog::new();
    log.subscribe(&mut binding);

    binding.update(|_| {}).expect("empty mutation must succeed");
    binding
        .update(|draft| {
            draft.set("title", "untitled");
        })
        .expect("same-value mutation must succeed");

    assert!(log.is_empty(), "no-op mutations must not notify listeners");
    let state = binding.state().expect("binding must be ready");
    assert_eq!(state.get("title").and_then(Value::as_str), Some("untitled"));
}

#[test]
fn test_bigints_round_trip_exactly() {
    let schema = Schema::from_json(&json!({ "id": "bigint", "title": "string" }))
        .expect("schema must parse");
    let mut initial = Value::empty_map();
    initial.set("id", 9_007_199_254_740_993_i64);
    initial.set("title", "big");

    let binding = DocBinding::new(schema.clone(), TextPathSet::default(), initial)
        .expect("binding must seed");
    let full = binding.encode_update().expect("document must encode");
    let rebuilt = DocBinding::from_deltas(schema, TextPathSet::default(), [full])
        .expect("rebuild must succeed");

    assert_eq!(
        rebuilt
            .state()
            .expect("rebuilt must be ready")
            .get("id")
            .and_then(Value::as_i64),
        Some(9_007_199_254_740_993)
    );
}

#[test]
fn test_undeclared_keys_can_come_and_go() {
    let mut binding = blog_binding();
    binding
        .update(|draft| {
            draft.set("scratch", Value::from(json!({ "n": 1.0 })));
        })
        .expect("extra keys are tolerated");
    assert!(
        binding
            .state()
            .expect("binding must be ready")
            .get("scratch")
            .is_some()
    );

    binding
        .update(|draft| {
            draft.remove("scratch");
        })
        .expect("removal must apply");
    assert!(
        binding
            .state()
            .expect("binding must be ready")
            .get("scratch")
            .is_none()
    );

    let rebuilt = rebuild(&binding);
    assert!(
        rebuilt
            .state()
            .expect("rebuilt must be ready")
            .get("scratch")
            .is_none(),
        "the removal must have reached the shared tree"
    );
}

#[test]
fn test_list_truncation_shrinks_the_sequence() {
    let mut binding = blog_binding();
    binding
        .update(|draft| {
            draft.set("tags", Value::from(json!(["a", "b", "c"])));
        })
        .expect("tags must seed");
    binding
        .update(|draft| {
            if let Some(tags) = draft.get_mut("tags") {
                tags.truncate(1);
            }
        })
        .expect("truncation must apply");

    let state = binding.state().expect("binding must be ready");
    assert_eq!(
        state.get("tags").and_then(Value::as_list).map(<[Value]>::len),
        Some(1)
    );
    assert_eq!(
        state.get_path(&["tags".into(), 0.into()]).and_then(Value::as_str),
        Some("a")
    );

    let rebuilt = rebuild(&binding);
    assert_eq!(rebuilt.state().expect("rebuilt must be ready"), state);
}
