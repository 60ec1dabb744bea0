//! End-to-end projection scenarios.

use mirror_state::{path, FieldMappings, MirrorOptions, PatchOp, ProxyManager, SourceHandler};
use proptest::prelude::*;
use serde_json::{json, Value};
use std::cell::RefCell;
use std::rc::Rc;

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        ".*".prop_map(Value::from),
    ]
}

proptest! {
    // A contract with rule `a -> a` and no transform reproduces any value.
    #[test]
    fn identity_round_trip(v in scalar()) {
        let handler = SourceHandler::new(
            json!({}),
            |_: &&str| Some(FieldMappings::new().pass("a")),
            ProxyManager::new(),
        );
        handler.create_mirror("k", MirrorOptions::new()).unwrap();

        handler.set_field("a", v.clone());

        prop_assert_eq!(handler.mirror(&"k").unwrap()["a"].clone(), v);
    }
}

#[test]
fn patch_fidelity() {
    let patches = Rc::new(RefCell::new(Vec::new()));
    let sink = patches.clone();

    let handler = SourceHandler::new(
        json!({}),
        |_: &&str| Some(FieldMappings::new().map("a", "b")),
        ProxyManager::new(),
    );
    handler
        .create_mirror(
            "k",
            MirrorOptions::new().patch_callback(move |op| sink.borrow_mut().push(op)),
        )
        .unwrap();

    handler.set_field("a", json!(5));

    assert_eq!(
        patches.borrow().as_slice(),
        [PatchOp::Set {
            path: path!("b"),
            value: json!(5),
        }]
    );
}

#[test]
fn deletion_fidelity() {
    let patches = Rc::new(RefCell::new(Vec::new()));
    let sink = patches.clone();

    let handler = SourceHandler::new(
        json!({"a": 1}),
        |_: &&str| Some(FieldMappings::new().map("a", "b")),
        ProxyManager::new(),
    );
    handler
        .create_mirror(
            "k",
            MirrorOptions::new().patch_callback(move |op| sink.borrow_mut().push(op)),
        )
        .unwrap();

    handler.delete_field("a");

    assert_eq!(patches.borrow().as_slice(), [PatchOp::delete(path!("b"))]);
    assert!(handler.mirror(&"k").unwrap().get("b").is_none());
}

#[test]
fn unmapped_field_is_a_silent_noop() {
    let patches = Rc::new(RefCell::new(Vec::new()));
    let sink = patches.clone();

    let handler = SourceHandler::new(
        json!({"a": 1}),
        |_: &&str| Some(FieldMappings::new().pass("a")),
        ProxyManager::new(),
    );
    handler
        .create_mirror(
            "k",
            MirrorOptions::new().patch_callback(move |op| sink.borrow_mut().push(op)),
        )
        .unwrap();
    let before = handler.mirror(&"k").unwrap();

    handler.set_field("z", json!(1));

    assert_eq!(handler.mirror(&"k").unwrap(), before);
    assert!(patches.borrow().is_empty());
}

#[test]
fn end_to_end_scenario() {
    let patches = Rc::new(RefCell::new(Vec::new()));
    let sink = patches.clone();

    let handler = SourceHandler::new(
        json!({"name": "a", "age": 1}),
        |_: &&str| {
            Some(
                FieldMappings::new()
                    .map("name", "displayName")
                    .map_with("age", "yearsOld", |v| json!(v.as_i64().unwrap_or(0) + 1)),
            )
        },
        ProxyManager::new(),
    );

    let mirror = handler
        .create_mirror(
            "k1",
            MirrorOptions::new().patch_callback(move |op| sink.borrow_mut().push(op)),
        )
        .unwrap();
    assert_eq!(mirror, json!({"displayName": "a", "yearsOld": 2}));
    assert!(patches.borrow().is_empty(), "initial population emits nothing");

    handler.set_field("age", json!(2));

    assert_eq!(handler.mirror(&"k1").unwrap()["yearsOld"], 3);
    assert_eq!(
        patches.borrow().as_slice(),
        [PatchOp::Set {
            path: path!("yearsOld"),
            value: json!(3),
        }]
    );
}

#[test]
fn nested_contract_projects_recursively() {
    let handler = SourceHandler::new(
        json!({"profile": {"first": "Ada", "last": "L", "ssn": "x"}}),
        |_: &&str| {
            Some(FieldMappings::new().map_nested(
                "profile",
                "who",
                FieldMappings::new().pass("first").map("last", "surname"),
            ))
        },
        ProxyManager::new(),
    );

    let mirror = handler.create_mirror("k", MirrorOptions::new()).unwrap();
    assert_eq!(mirror, json!({"who": {"first": "Ada", "surname": "L"}}));

    handler.set_field("profile", json!({"first": "Grace", "last": "H"}));
    assert_eq!(
        handler.mirror(&"k").unwrap(),
        json!({"who": {"first": "Grace", "surname": "H"}})
    );
}

#[test]
fn one_source_field_can_feed_many_mirror_paths() {
    let patches = Rc::new(RefCell::new(Vec::new()));
    let sink = patches.clone();

    let handler = SourceHandler::new(
        json!({}),
        |_: &&str| {
            Some(
                FieldMappings::new()
                    .pass("a")
                    .map_path("a", path!("meta", "copy")),
            )
        },
        ProxyManager::new(),
    );
    handler
        .create_mirror(
            "k",
            MirrorOptions::new().patch_callback(move |op| sink.borrow_mut().push(op)),
        )
        .unwrap();

    handler.set_field("a", json!(7));

    assert_eq!(
        handler.mirror(&"k").unwrap(),
        json!({"a": 7, "meta": {"copy": 7}})
    );
    // One patch per affected mirror path, in rule insertion order.
    assert_eq!(
        patches.borrow().as_slice(),
        [
            PatchOp::set(path!("a"), 7),
            PatchOp::set(path!("meta", "copy"), 7),
        ]
    );
}
