use serde_json::json;

use super::*;

// =============================================================
// Incoming events
// =============================================================

#[test]
fn snap_thresholds_accept_strings_and_numbers() {
    let msg = DesignerMessage::from_value(json!({"id": "snapThresholds", "value": {"alignment": "5", "distance": 8}}))
        .expect("thresholds");
    assert_eq!(msg, DesignerMessage::SnapThresholds { value: SnapThresholdValues { alignment: 5, distance: 8 } });
}

#[test]
fn lenient_int_follows_parse_int() {
    assert_eq!(parse_int_prefix(&json!("12px")), 12);
    assert_eq!(parse_int_prefix(&json!("-3")), -3);
    assert_eq!(parse_int_prefix(&json!(4.9)), 4);
    assert_eq!(parse_int_prefix(&json!("abc")), 0);
    assert_eq!(parse_int_prefix(&json!(null)), 0);
}

#[test]
fn get_snap_target_with_and_without_resizing() {
    let moving = DesignerMessage::from_value(json!({"id": "getSnapTarget", "p1": {"x": 10.0, "y": 20.0}})).expect("move");
    assert_eq!(moving, DesignerMessage::GetSnapTarget { p1: WirePoint { x: 10.0, y: 20.0 }, resizing: None });

    let resizing =
        DesignerMessage::from_value(json!({"id": "getSnapTarget", "p1": {"x": 1, "y": 2}, "resizing": "se"})).expect("resize");
    let DesignerMessage::GetSnapTarget { resizing, .. } = resizing else {
        panic!("expected getSnapTarget");
    };
    assert_eq!(resizing.as_deref(), Some("se"));
}

#[test]
fn unit_events_parse_by_id() {
    for (id, expected) in [
        ("destroyElement", DesignerMessage::DestroyElement),
        ("renderGhosts", DesignerMessage::RenderGhosts),
        ("redrawDecorators", DesignerMessage::RedrawDecorators),
        ("hideGhostContainer", DesignerMessage::HideGhostContainer),
        ("clearSnapCache", DesignerMessage::ClearSnapCache),
    ] {
        assert_eq!(DesignerMessage::from_value(json!({"id": id})).expect(id), expected);
    }
}

#[test]
fn create_element_carries_model_and_type() {
    let msg = DesignerMessage::from_value(json!({
        "id": "createElement",
        "name": "servoydefaultButton",
        "model": {"size": {"width": 80, "height": 30}},
        "type": "component",
        "attributes": null,
        "children": null
    }))
    .expect("create");
    let DesignerMessage::CreateElement { name, model, element_type, attributes, .. } = msg else {
        panic!("expected createElement");
    };
    assert_eq!(name, "servoydefaultButton");
    assert_eq!(model["size"]["width"], json!(80));
    assert_eq!(element_type.as_deref(), Some("component"));
    assert!(attributes.is_none());
}

#[test]
fn insert_dragged_component_uses_camel_case_keys() {
    let msg = DesignerMessage::from_value(json!({"id": "insertDraggedComponent", "dropTarget": "c1", "insertBefore": null}))
        .expect("insert");
    assert_eq!(
        msg,
        DesignerMessage::InsertDraggedComponent { drop_target: Some("c1".into()), insert_before: None }
    );
}

#[test]
fn unknown_id_is_rejected() {
    let err = DesignerMessage::from_value(json!({"id": "teleport"})).expect_err("unknown id");
    assert!(matches!(err, WireError::Json(_)));
}

// =============================================================
// Outgoing events
// =============================================================

#[test]
fn snap_reply_serializes_guides_and_targets() {
    let mut css_position = BTreeMap::new();
    css_position.insert("left".to_owned(), SnapTarget { uuid: "b1".into(), prop: None });
    let msg = DesignerMessage::Snap {
        properties: Some(SnapProperties {
            init_point: WirePoint { x: 98.0, y: 40.0 },
            top: 40.0,
            left: 100.0,
            width: None,
            height: None,
            css_position,
            guides: vec![Guide { x: 100.0, y: 10.0, width: 1.0, height: 60.0, style: GuideStyle::Snap }],
        }),
    };
    let value = msg.to_value().expect("serialize");
    assert_eq!(value["id"], json!("snap"));
    assert_eq!(value["properties"]["initPoint"], json!({"x": 98.0, "y": 40.0}));
    assert_eq!(value["properties"]["cssPosition"]["left"], json!({"uuid": "b1"}));
    assert_eq!(value["properties"]["guides"][0]["styleClass"], json!("snap"));
    assert!(value["properties"].get("width").is_none());
}

#[test]
fn snap_reply_without_properties_is_null() {
    let value = DesignerMessage::Snap { properties: None }.to_value().expect("serialize");
    assert_eq!(value, json!({"id": "snap", "properties": null}));
}
