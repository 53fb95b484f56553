//! Integration tests for frame-bound nodes driven by a `TransformHub`.

use std::f64::consts::FRAC_PI_2;
use std::rc::Rc;

use tfscene::*;

fn hub() -> Rc<TransformHub> {
    Rc::new(TransformHub::new())
}

fn dyn_source(hub: &Rc<TransformHub>) -> Rc<dyn FrameTransformSource> {
    Rc::clone(hub) as Rc<dyn FrameTransformSource>
}

fn approx_vec(a: DVec3, b: DVec3) -> bool {
    (a - b).length() < 1e-9
}

/// Same rotation, allowing for `q` and `-q`.
fn approx_quat(a: DQuat, b: DQuat) -> bool {
    1.0 - a.dot(b).abs() < 1e-12
}

#[test]
fn test_base_link_scenario() {
    let node = FrameBoundNode::new(FrameBoundNodeOptions::new("base_link")).unwrap();
    assert!(!node.is_visible());
    assert_eq!(node.position(), DVec3::ZERO);

    node.handle_transform(&Transform::from_translation(DVec3::new(5.0, 0.0, 0.0)));
    assert!(node.is_visible());
    assert_eq!(node.position(), DVec3::new(5.0, 0.0, 0.0));
}

#[test]
fn test_hidden_until_first_update() {
    let hub = hub();
    let node = FrameBoundNode::new(
        FrameBoundNodeOptions::new("odom").with_source(dyn_source(&hub)),
    )
    .unwrap();
    assert!(!node.is_visible());

    hub.publish("map", Transform::IDENTITY);
    assert!(!node.is_visible());

    hub.publish("odom", Transform::IDENTITY);
    assert!(node.is_visible());

    // Nothing turns it back off.
    for i in 0..5 {
        hub.publish("odom", Transform::from_translation(DVec3::splat(f64::from(i))));
        assert!(node.is_visible());
    }
}

#[test]
fn test_pose_mirrors_transformed_reference_pose() {
    let hub = hub();
    let reference = Pose::new(DVec3::new(1.0, 0.0, 0.0), DQuat::from_rotation_x(0.3));
    let node = FrameBoundNode::new(
        FrameBoundNodeOptions::new("arm")
            .with_pose(reference)
            .with_source(dyn_source(&hub)),
    )
    .unwrap();

    let tf = Transform::new(DVec3::new(0.0, 0.0, 2.0), DQuat::from_rotation_z(FRAC_PI_2));
    hub.publish("arm", tf);

    let expected = tf.apply_transform(&reference);
    assert!(approx_vec(node.position(), DVec3::new(0.0, 1.0, 2.0)));
    assert!(approx_vec(node.position(), expected.position));
    assert!(approx_quat(node.orientation(), expected.orientation));
    assert!(approx_vec(node.matrix_world().w_axis.truncate(), expected.position));
    assert_eq!(node.reference_pose(), reference);
}

#[test]
fn test_redelivering_earlier_transform_reproduces_earlier_pose() {
    let node = FrameBoundNode::new(
        FrameBoundNodeOptions::new("map").with_pose(Pose::from_position(DVec3::new(1.0, 2.0, 3.0))),
    )
    .unwrap();

    let first = Transform::new(DVec3::new(4.0, 0.0, 0.0), DQuat::from_rotation_y(0.7));
    let second = Transform::new(DVec3::new(-1.0, 3.0, 0.5), DQuat::from_rotation_z(1.1));

    node.handle_transform(&first);
    let after_first = node.pose();
    node.handle_transform(&second);
    assert_ne!(node.pose(), after_first);
    node.handle_transform(&first);
    assert_eq!(node.pose(), after_first);
}

#[test]
fn test_latest_delivered_wins() {
    let hub = hub();
    let node =
        FrameBoundNode::new(FrameBoundNodeOptions::new("map").with_source(dyn_source(&hub)))
            .unwrap();

    hub.publish("map", Transform::from_translation(DVec3::new(2.0, 0.0, 0.0)));
    hub.publish("map", Transform::from_translation(DVec3::new(1.0, 0.0, 0.0)));
    assert_eq!(node.position(), DVec3::new(1.0, 0.0, 0.0));
}

#[test]
fn test_rebind_moves_subscription() {
    let a = hub();
    let b = hub();
    let node =
        FrameBoundNode::new(FrameBoundNodeOptions::new("map").with_source(dyn_source(&a)))
            .unwrap();
    assert_eq!(a.subscriber_count("map"), 1);

    node.bind_source(Some(&dyn_source(&b)));
    assert_eq!(a.subscriber_count("map"), 0);
    assert_eq!(b.subscriber_count("map"), 1);
    assert!(b.is_subscribed("map", node.handler()));

    assert_eq!(a.publish("map", Transform::from_translation(DVec3::X)), 0);
    assert_eq!(node.position(), DVec3::ZERO);
    assert_eq!(b.publish("map", Transform::from_translation(DVec3::Y)), 1);
    assert_eq!(node.position(), DVec3::Y);
}

#[test]
fn test_rebind_same_source_keeps_single_registration() {
    let a = hub();
    let node =
        FrameBoundNode::new(FrameBoundNodeOptions::new("map").with_source(dyn_source(&a)))
            .unwrap();
    node.bind_source(Some(&dyn_source(&a)));
    assert_eq!(a.subscriber_count("map"), 1);
}

#[test]
fn test_bind_none_keeps_delivering() {
    let a = hub();
    let node =
        FrameBoundNode::new(FrameBoundNodeOptions::new("map").with_source(dyn_source(&a)))
            .unwrap();

    node.bind_source(None);
    assert!(node.is_bound());
    assert_eq!(a.subscriber_count("map"), 1);

    a.publish("map", Transform::from_translation(DVec3::Z));
    assert_eq!(node.position(), DVec3::Z);
}

#[test]
fn test_latched_transform_applied_on_bind() {
    let hub = hub();
    hub.publish("map", Transform::from_translation(DVec3::new(0.0, 0.0, 4.0)));

    let node = FrameBoundNode::new(FrameBoundNodeOptions::new("map")).unwrap();
    assert!(!node.is_visible());
    node.bind_source(Some(&dyn_source(&hub)));
    assert!(node.is_visible());
    assert_eq!(node.position(), DVec3::new(0.0, 0.0, 4.0));
}

#[test]
fn test_unbind_stops_updates() {
    let hub = hub();
    let node =
        FrameBoundNode::new(FrameBoundNodeOptions::new("map").with_source(dyn_source(&hub)))
            .unwrap();

    node.unbind_source().unwrap();
    assert_eq!(hub.subscriber_count("map"), 0);
    hub.publish("map", Transform::from_translation(DVec3::X));
    assert!(!node.is_visible());
    assert!(matches!(
        node.unbind_source(),
        Err(TfSceneError::NotSubscribed { .. })
    ));
}

#[test]
fn test_unbind_from_inside_delivery() {
    let hub = hub();
    let node =
        FrameBoundNode::new(FrameBoundNodeOptions::new("map").with_source(dyn_source(&hub)))
            .unwrap();

    // A watcher on the same frame detaches the node as soon as a transform
    // arrives; the node still sees that delivery but no later ones.
    let watched = node.clone();
    hub.subscribe(
        "map",
        TransformHandler::new(move |_| {
            if watched.is_bound() {
                watched.unbind_source().unwrap();
            }
        }),
    );

    hub.publish("map", Transform::from_translation(DVec3::X));
    assert!(!node.is_bound());
    assert_eq!(node.position(), DVec3::X);

    hub.publish("map", Transform::from_translation(DVec3::Y));
    assert_eq!(node.position(), DVec3::X);
}

#[test]
fn test_publish_inside_with_node_mut_is_applied_afterwards() {
    let hub = hub();
    let node =
        FrameBoundNode::new(FrameBoundNodeOptions::new("map").with_source(dyn_source(&hub)))
            .unwrap();

    node.with_node_mut(|n| {
        n.set_name("busy");
        hub.publish("map", Transform::from_translation(DVec3::new(3.0, 0.0, 0.0)));
        assert!(!n.is_visible());
    });

    assert!(node.is_visible());
    assert_eq!(node.position(), DVec3::new(3.0, 0.0, 0.0));
    assert_eq!(node.world_position(), DVec3::new(3.0, 0.0, 0.0));
}

#[test]
fn test_not_bound_after_hub_dropped() {
    let hub = hub();
    let node =
        FrameBoundNode::new(FrameBoundNodeOptions::new("map").with_source(dyn_source(&hub)))
            .unwrap();
    assert!(node.is_bound());

    drop(hub);
    assert!(!node.is_bound());
    assert!(matches!(
        node.unbind_source(),
        Err(TfSceneError::NotSubscribed { .. })
    ));
}

#[test]
fn test_frame_node_under_offset_parent() {
    let hub = hub();
    let node = FrameBoundNode::new(
        FrameBoundNodeOptions::new("base_link").with_source(dyn_source(&hub)),
    )
    .unwrap();

    let mut world = SceneNode::named("world");
    world.set_position(DVec3::new(0.0, 0.0, 10.0));
    world.set_quaternion(DQuat::from_rotation_z(FRAC_PI_2));
    world.add(node.clone());
    world.update_matrix_world(false);

    hub.publish("base_link", Transform::from_translation(DVec3::X));
    let expected = world.matrix_world() * DMat4::from_translation(DVec3::X);
    assert!(approx_vec(node.position(), DVec3::X));
    assert!(approx_vec(node.world_position(), DVec3::new(0.0, 1.0, 10.0)));
    assert!(node.matrix_world().abs_diff_eq(expected, 1e-12));
}

#[test]
fn test_nested_frame_nodes_roundtrip_through_json() {
    let hub = hub();
    let odom = FrameBoundNode::new(
        FrameBoundNodeOptions::new("odom").with_source(dyn_source(&hub)),
    )
    .unwrap();
    let base = FrameBoundNode::new(
        FrameBoundNodeOptions::new("base_link")
            .with_pose(Pose::from_position(DVec3::Y))
            .with_source(dyn_source(&hub)),
    )
    .unwrap();
    odom.add(base.clone());
    hub.publish("odom", Transform::from_translation(DVec3::X));
    hub.publish("base_link", Transform::IDENTITY);
    assert!(approx_vec(base.world_position(), DVec3::new(1.0, 1.0, 0.0)));

    let json = save_scene_json(&odom).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let nested = &value["object"]["children"][0];
    assert_eq!(nested["frameID"], "base_link");
    assert_eq!(nested["pose"]["position"]["y"], 1.0);

    let loaded = load_scene_json(&json).unwrap();
    let inner = loaded.frame_nodes();
    assert_eq!(inner.len(), 1);
    assert_eq!(inner[0].frame_id(), "base_link");

    let live = self::hub();
    loaded.bind_source(Some(&dyn_source(&live)));
    inner[0].bind_source(Some(&dyn_source(&live)));
    live.publish("odom", Transform::from_translation(DVec3::new(5.0, 0.0, 0.0)));
    live.publish("base_link", Transform::from_translation(DVec3::Z));
    assert!(approx_vec(inner[0].world_position(), DVec3::new(5.0, 1.0, 1.0)));
}

#[test]
fn test_dropped_node_leaves_inert_handler() {
    let hub = hub();
    let node =
        FrameBoundNode::new(FrameBoundNodeOptions::new("map").with_source(dyn_source(&hub)))
            .unwrap();
    drop(node);

    assert_eq!(hub.subscriber_count("map"), 1);
    assert_eq!(hub.publish("map", Transform::IDENTITY), 1);
}

#[test]
fn test_serialize_shape_regardless_of_binding() {
    let pose = Pose::from_position(DVec3::new(1.0, 2.0, 3.0));
    let expected = serde_json::json!({
        "position": {"x": 1.0, "y": 2.0, "z": 3.0},
        "orientation": {"x": 0.0, "y": 0.0, "z": 0.0, "w": 1.0},
    });

    let unbound = FrameBoundNode::new(FrameBoundNodeOptions::new("map").with_pose(pose)).unwrap();

    let hub = hub();
    let bound = FrameBoundNode::new(
        FrameBoundNodeOptions::new("map")
            .with_pose(pose)
            .with_source(dyn_source(&hub)),
    )
    .unwrap();
    hub.publish("map", Transform::from_translation(DVec3::new(9.0, 9.0, 9.0)));

    for node in [unbound, bound] {
        let json = serde_json::to_value(node.serialize()).unwrap();
        assert_eq!(json["object"]["frameID"], "map");
        assert_eq!(json["object"]["pose"], expected);
        assert_eq!(json["object"]["type"], FRAME_NODE_TYPE);
        assert_eq!(json["metadata"]["type"], "Object");
    }
}

#[test]
fn test_json_roundtrip_is_static() {
    let hub = hub();
    let node = FrameBoundNode::new(
        FrameBoundNodeOptions::new("camera")
            .with_name("front camera")
            .with_pose(Pose::from_position(DVec3::new(0.5, 0.0, 0.2)))
            .with_payload(SceneNode::named("frustum").with_node_type("Mesh"))
            .with_source(dyn_source(&hub)),
    )
    .unwrap();
    hub.publish("camera", Transform::IDENTITY);

    let json = save_scene_json(&node).unwrap();
    let loaded = load_scene_json(&json).unwrap();

    assert_eq!(loaded.frame_id(), "camera");
    assert_eq!(loaded.reference_pose(), node.reference_pose());
    assert!(!loaded.is_bound());
    assert!(loaded.is_visible());
    loaded.with_node(|n| {
        assert_eq!(n.name(), "front camera");
        assert_eq!(n.children().len(), 1);
        assert_eq!(n.children()[0].as_node().unwrap().name(), "frustum");
    });

    // Hydrate with a live source.
    let live = self::hub();
    loaded.bind_source(Some(&dyn_source(&live)));
    live.publish("camera", Transform::from_translation(DVec3::X));
    assert!(approx_vec(loaded.position(), DVec3::new(1.5, 0.0, 0.2)));
}

#[test]
fn test_load_rejects_plain_node() {
    let json = serde_json::to_string(&SceneNode::new().to_record()).unwrap();
    assert!(matches!(
        load_scene_json(&json),
        Err(TfSceneError::MissingField("frameID"))
    ));
    assert!(matches!(
        load_scene_json("{not json"),
        Err(TfSceneError::JsonError(_))
    ));
}

#[test]
fn test_init_logging_is_idempotent() {
    init_logging();
    init_logging();
}
