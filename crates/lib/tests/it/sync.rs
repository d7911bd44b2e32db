//! Delta exchange tests
//!
//! Bindings talk to each other exclusively through binary deltas: full
//! document encodes for bootstrap, state-vector-guided increments after
//! that. These tests cover convergence, idempotence, and wire hygiene.

use std::sync::Arc;

use serde_json::json;
use veneer::{DocBinding, Schema, TextPathSet, Value};

use crate::helpers::*;

fn blog_peer(source: &DocBinding) -> DocBinding {
    let full = source.encode_update().expect("document must encode");
    DocBinding::from_deltas(blog_schema(), TextPathSet::default(), [full])
        .expect("peer must bootstrap")
}

#[test]
fn test_bootstrap_from_full_update() {
    let mut a = blog_binding();
    a.update(|draft| {
        draft.set("title", "shared");
        draft.set("tags", Value::from(json!(["x"])));
    })
    .expect("mutation must apply");

    let b = blog_peer(&a);
    assert_eq!(
        b.state().expect("b must be ready"),
        a.state().expect("a must be ready")
    );
}

#[test]
fn test_incremental_deltas_flow_both_ways() {
    let mut a = blog_binding();
    let mut b = blog_peer(&a);

    a.update(|draft| {
        draft.set("title", "from a");
    })
    .expect("mutation must apply");
    relay(&a, &mut b);
    assert_eq!(
        b.state()
            .expect("b must be ready")
            .get("title")
            .and_then(Value::as_str),
        Some("from a")
    );

    b.update(|draft| {
        draft.set("stars", 2.0);
    })
    .expect("mutation must apply");
    relay(&b, &mut a);
    assert_eq!(
        a.state()
            .expect("a must be ready")
            .get("stars")
            .and_then(Value::as_f64),
        Some(2.0)
    );

    assert_eq!(
        a.state().expect("a must be ready"),
        b.state().expect("b must be ready")
    );
}

#[test]
fn test_concurrent_map_edits_converge() {
    let mut a = blog_binding();
    let mut b = blog_peer(&a);

    a.update(|draft| {
        draft.set("title", "concurrent");
    })
    .expect("mutation must apply");
    b.update(|draft| {
        draft.set("stars", 3.0);
    })
    .expect("mutation must apply");

    sync_pair(&mut a, &mut b);
    let state = a.state().expect("a must be ready");
    assert_eq!(state.get("title").and_then(Value::as_str), Some("concurrent"));
    assert_eq!(state.get("stars").and_then(Value::as_f64), Some(3.0));

    // the same edits relayed in the opposite order reach the same state
    let mut c = blog_binding();
    let mut d = blog_peer(&c);
    c.update(|draft| {
        draft.set("title", "concurrent");
    })
    .expect("mutation must apply");
    d.update(|draft| {
        draft.set("stars", 3.0);
    })
    .expect("mutation must apply");
    relay(&d, &mut c);
    relay(&c, &mut d);
    assert_eq!(c.state().expect("c must be ready"), state);
    assert_eq!(d.state().expect("d must be ready"), state);
}

#[test]
fn test_concurrent_list_pushes_keep_every_item() {
    let mut a = blog_binding();
    let mut b = blog_peer(&a);

    a.update(|draft| {
        if let Some(tags) = draft.get_mut("tags") {
            tags.push("from-a");
        }
    })
    .expect("mutation must apply");
    b.update(|draft| {
        if let Some(tags) = draft.get_mut("tags") {
            tags.push("from-b");
        }
    })
    .expect("mutation must apply");

    sync_pair(&mut a, &mut b);
    let state = a.state().expect("a must be ready");
    let tags: Vec<&str> = state
        .get("tags")
        .and_then(Value::as_list)
        .expect("tags must be a list")
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert_eq!(tags.len(), 2, "both concurrent inserts must survive");
    assert!(tags.contains(&"from-a"));
    assert!(tags.contains(&"from-b"));
}

#[test]
fn test_three_peers_reach_the_same_state() {
    let mut a = blog_binding();
    let mut b = blog_peer(&a);
    let mut c = blog_peer(&a);

    a.update(|draft| {
        draft.set("title", "by a");
    })
    .expect("mutation must apply");
    b.update(|draft| {
        draft.set("stars", 5.0);
    })
    .expect("mutation must apply");
    c.update(|draft| {
        if let Some(tags) = draft.get_mut("tags") {
            tags.push("by-c");
        }
    })
    .expect("mutation must apply");

    sync_pair(&mut a, &mut b);
    sync_pair(&mut b, &mut c);
    sync_pair(&mut a, &mut c);

    let state = a.state().expect("a must be ready");
    assert_eq!(state.get("title").and_then(Value::as_str), Some("by a"));
    assert_eq!(state.get("stars").and_then(Value::as_f64), Some(5.0));
    assert_eq!(
        state.get("tags").and_then(Value::as_list).map(<[Value]>::len),
        Some(1)
    );
    assert_eq!(
        b.state().expect("b must be ready"),
        c.state().expect("c must be ready")
    );
}

#[test]
fn test_replay_preserves_untouched_branches() {
    let mut a = blog_binding();
    a.update(|draft| {
        draft.set(
            "posts",
            Value::from(json!([{ "body": "deep", "pinned": false }])),
        );
    })
    .expect("posts must seed");
    let mut b = blog_peer(&a);

    let posts_arc = |binding: &DocBinding| match binding
        .state()
        .expect("binding must be ready")
        .get("posts")
    {
        Some(Value::List(items)) => Arc::clone(items),
        other => panic!("posts must be a list, got {other:?}"),
    };

    let before = posts_arc(&b);
    a.update(|draft| {
        draft.set("title", "only the title");
    })
    .expect("mutation must apply");
    relay(&a, &mut b);

    assert!(
        Arc::ptr_eq(&before, &posts_arc(&b)),
        "a title-only delta must leave the posts branch shared"
    );
    assert_eq!(
        b.state()
            .expect("b must be ready")
            .get("title")
            .and_then(Value::as_str),
        Some("only the title")
    );
}

#[test]
fn test_reapplied_deltas_are_noops() {
    let mut a = blog_binding();
    let mut b = blog_peer(&a);

    a.update(|draft| {
        draft.set("title", "once");
    })
    .expect("mutation must apply");
    let sv = b.state_vector().expect("state vector must encode");
    let delta = a.encode_update_since(&sv).expect("delta must encode");

    b.apply_remote_deltas([delta.clone()])
        .expect("first apply must succeed");
    let log = StateLog::new();
    log.subscribe(&mut b);
    b.apply_remote_deltas([delta])
        .expect("reapplying must be a no-op");

    assert!(log.is_empty(), "an already-integrated delta must not notify");
    assert_eq!(
        b.state()
            .expect("b must be ready")
            .get("title")
            .and_then(Value::as_str),
        Some("once")
    );
}

#[test]
fn test_empty_batches_are_noops() {
    let mut binding = blog_binding();
    let log = StateLog::new();
    log.subscribe(&mut binding);

    binding
        .apply_remote_deltas(Vec::<Vec<u8>>::new())
        .expect("an empty batch must succeed");
    assert!(log.is_empty());
}

#[test]
fn test_malformed_deltas_are_rejected() {
    let mut binding = blog_binding();
    let before = binding.state().expect("binding must be ready").clone();

    let err = binding
        .apply_remote_deltas([vec![0xFF_u8]])
        .expect_err("garbage must not decode");
    assert!(err.is_delta_error());

    assert_eq!(binding.state().expect("binding must stay usable"), &before);
    binding
        .update(|draft| {
            draft.set("title", "still alive");
        })
        .expect("binding must keep working");
}

#[test]
fn test_batches_with_a_malformed_delta_are_rejected_whole() {
    let mut a = blog_binding();
    let mut b = blog_peer(&a);

    a.update(|draft| {
        draft.set("title", "batched");
    })
    .expect("mutation must apply");
    let sv = b.state_vector().expect("b must encode");
    let delta = a.encode_update_since(&sv).expect("a must encode");

    let err = b
        .apply_remote_deltas([delta.clone(), vec![0xFF]])
        .expect_err("a batch containing garbage must not apply");
    assert!(err.is_delta_error());
    assert_eq!(
        b.state()
            .expect("b must be ready")
            .get("title")
            .and_then(Value::as_str),
        Some("untitled")
    );

    // The valid delta never reached the tree, so sending it again is a
    // real change and notifies
    let log = StateLog::new();
    log.subscribe(&mut b);
    b.apply_remote_deltas([delta])
        .expect("the valid delta alone must apply");
    assert_eq!(log.len(), 1);
    assert_eq!(
        b.state()
            .expect("b must be ready")
            .get("title")
            .and_then(Value::as_str),
        Some("batched")
    );
}

#[test]
fn test_malformed_state_vectors_are_rejected() {
    let binding = blog_binding();
    let err = binding
        .encode_update_since(&[0xFF])
        .expect_err("a truncated state vector must fail");
    assert!(err.is_delta_error());
}

#[test]
fn test_special_leaves_cross_the_wire() {
    let schema = Schema::from_json(&json!({
        "big": "bigint",
        "nothing": "null",
        "missing": "undefined",
        "note": "string",
    }))
    .expect("schema must parse");
    let mut initial = Value::empty_map();
    initial.set("big", -42_i64);
    initial.set("nothing", Value::Null);
    initial.set("missing", Value::Undefined);
    initial.set("note", "plain");

    let a = DocBinding::new(schema.clone(), TextPathSet::default(), initial)
        .expect("binding must seed");
    let full = a.encode_update().expect("document must encode");
    let b = DocBinding::from_deltas(schema, TextPathSet::default(), [full])
        .expect("peer must bootstrap");

    let state = b.state().expect("b must be ready");
    assert_eq!(state.get("big").and_then(Value::as_i64), Some(-42));
    assert!(state.get("nothing").is_some_and(Value::is_null));
    assert!(state.get("missing").is_some_and(Value::is_undefined));
    assert_eq!(state.get("note").and_then(Value::as_str), Some("plain"));
}
