//! Frame-bound node demo.
//!
//! Binds a marker to a robot's `base_link` frame, places the robot in a world
//! scene, drives it with a few transforms, moves it to a second transform
//! source fed with wire messages, and prints the saved static scene.
//!
//! Run with: `RUST_LOG=debug cargo run --example frame_node_demo`

use std::f64::consts::FRAC_PI_4;
use std::rc::Rc;

use tfscene::*;

fn main() -> Result<()> {
    init_logging();

    let odometry = Rc::new(TransformHub::new());
    let marker = SceneNode::named("marker").with_node_type("Mesh");

    let node = FrameBoundNode::new(
        FrameBoundNodeOptions::new("base_link")
            .with_name("robot")
            .with_pose(Pose::from_position(DVec3::new(0.0, 0.0, 0.3)))
            .with_payload(marker)
            .with_source(odometry.clone() as Rc<dyn FrameTransformSource>),
    )?;
    println!("before any transform: visible={}", node.is_visible());

    let mut world = SceneNode::named("world");
    world.set_position(DVec3::new(10.0, 0.0, 0.0));
    world.add(node.clone());
    world.update_matrix_world(false);

    for step in 0..4 {
        let t = f64::from(step);
        let tf = Transform::new(
            DVec3::new(t * 0.5, 0.0, 0.0),
            DQuat::from_rotation_z(t * FRAC_PI_4),
        );
        odometry.publish("base_link", tf);
        println!(
            "step {step}: visible={} position={:?} world={:?}",
            node.is_visible(),
            node.position(),
            node.world_position()
        );
    }

    // Switch to a second source; the first one no longer reaches the node.
    let localization = Rc::new(TransformHub::new());
    node.bind_source(Some(&(localization.clone() as Rc<dyn FrameTransformSource>)));
    odometry.publish("base_link", Transform::from_translation(DVec3::splat(100.0)));
    let message: TransformMessage = serde_json::from_str(
        r#"{"translation":{"x":1,"y":2,"z":0},"rotation":{"x":0,"y":0,"z":0,"w":1}}"#,
    )?;
    localization.publish_message("base_link", message);
    println!("after rebind: position={:?}", node.position());

    node.unbind_source()?;

    println!("{}", save_scene_json(&node)?);
    Ok(())
}
