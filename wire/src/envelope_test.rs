use serde_json::json;

use super::*;

// =============================================================
// Parse
// =============================================================

#[test]
fn parse_full_value() {
    let env = parse_envelope(&json!({"v": ["a", "b"], "vEr": 3})).expect("full");
    assert_eq!(env, Envelope::Full { value: json!(["a", "b"]), version: 3 });
    assert_eq!(env.version(), Some(3));
}

#[test]
fn parse_full_null_value() {
    let env = parse_envelope(&json!({"v": null, "vEr": 1})).expect("full");
    assert_eq!(env, Envelope::Full { value: serde_json::Value::Null, version: 1 });
}

#[test]
fn parse_no_op() {
    assert_eq!(parse_envelope(&json!({"n": true})).expect("noop"), Envelope::NoOp);
    assert_eq!(Envelope::NoOp.version(), None);
}

#[test]
fn parse_array_ops_in_order() {
    let env = parse_envelope(&json!({
        "g": [
            {"op": [2, 2, 0], "d": ["testChanged"]},
            {"op": [1, 1, 2]},
            {"op": [0, 1, 1], "d": ["testNew1", "testNew2"]}
        ],
        "vEr": 1
    }))
    .expect("ops");
    let Envelope::ArrayOps { ops, version } = env else {
        panic!("expected array ops");
    };
    assert_eq!(version, 1);
    assert_eq!(ops.len(), 3);
    assert_eq!(ops[0].kind, OpKind::Changed);
    assert_eq!(ops[0].data, vec![json!("testChanged")]);
    assert_eq!(ops[1].kind, OpKind::Delete);
    assert!(ops[1].data.is_empty());
    assert_eq!(ops[2].kind, OpKind::Insert);
    assert_eq!(ops[2].span(), 2);
}

#[test]
fn parse_key_and_index_updates() {
    let env = parse_envelope(&json!({"u": [{"k": "name", "v": "KM"}, {"i": 2, "v": 5}], "vEr": 4})).expect("updates");
    let Envelope::Updates { updates, version } = env else {
        panic!("expected updates");
    };
    assert_eq!(version, 4);
    assert_eq!(updates[0].target, UpdateTarget::Key("name".into()));
    assert_eq!(updates[0].value, json!("KM"));
    assert_eq!(updates[1].target, UpdateTarget::Index(2));
}

#[test]
fn missing_version_defaults_to_zero() {
    let env = parse_envelope(&json!({"v": 1})).expect("full");
    assert_eq!(env.version(), Some(0));
}

#[test]
fn parse_rejects_non_object() {
    let err = parse_envelope(&json!([1, 2])).expect_err("not an envelope");
    assert!(matches!(err, WireError::MalformedEnvelope(_)));
}

#[test]
fn parse_rejects_object_without_envelope_keys() {
    let err = parse_envelope(&json!({"x": 1})).expect_err("no keys");
    assert!(matches!(err, WireError::MalformedEnvelope(_)));
}

#[test]
fn parse_rejects_unknown_opcode() {
    let err = parse_envelope(&json!({"g": [{"op": [0, 0, 9], "d": [1]}], "vEr": 1})).expect_err("opcode");
    assert!(matches!(err, WireError::UnknownOpcode(9)));
}

#[test]
fn parse_rejects_reversed_range() {
    let err = parse_envelope(&json!({"g": [{"op": [3, 1, 2]}], "vEr": 1})).expect_err("range");
    assert!(matches!(err, WireError::MalformedEnvelope(_)));
}

#[test]
fn parse_rejects_non_integer_version() {
    let err = parse_envelope(&json!({"v": 1, "vEr": "one"})).expect_err("version");
    assert!(matches!(err, WireError::MalformedEnvelope(_)));
}

// =============================================================
// Build
// =============================================================

#[test]
fn builders_produce_wire_shapes() {
    assert_eq!(full(json!([1]), 2), json!({"v": [1], "vEr": 2}));
    assert_eq!(no_op(), json!({"n": true}));
    assert!(is_no_op(&no_op()));
    let updates = vec![
        Update { target: UpdateTarget::Index(0), value: json!("test4") },
        Update { target: UpdateTarget::Key("k".into()), value: json!(null) },
    ];
    assert_eq!(
        granular(updates, 1),
        json!({"u": [{"i": 0, "v": "test4"}, {"k": "k", "v": null}], "vEr": 1})
    );
}

#[test]
fn array_ops_serialize_without_payload_for_delete() {
    let env = Envelope::ArrayOps {
        ops: vec![
            ArrayOp { start: 1, end: 1, kind: OpKind::Delete, data: vec![] },
            ArrayOp { start: 0, end: 0, kind: OpKind::Insert, data: vec![json!("x")] },
        ],
        version: 5,
    };
    assert_eq!(
        env.to_value(),
        json!({"g": [{"op": [1, 1, 2]}, {"op": [0, 0, 1], "d": ["x"]}], "vEr": 5})
    );
}

#[test]
fn is_envelope_detects_keys() {
    assert!(is_envelope(&json!({"v": 1})));
    assert!(is_envelope(&json!({"n": true})));
    assert!(!is_envelope(&json!({"name": "x"})));
    assert!(!is_envelope(&json!("v")));
}
