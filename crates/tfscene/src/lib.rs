//! tfscene-rs: keep 3D scene nodes in sync with named coordinate frames.
//!
//! A [`FrameBoundNode`] tracks one frame published by a transform-distribution
//! service. Each update is applied to the node's reference pose, the result
//! becomes the node's local transform, and the node becomes visible.
//!
//! # Quick Start
//!
//! ```
//! use std::rc::Rc;
//! use tfscene::*;
//!
//! fn main() -> Result<()> {
//!     init_logging();
//!
//!     let hub = Rc::new(TransformHub::new());
//!     let node = FrameBoundNode::new(
//!         FrameBoundNodeOptions::new("base_link")
//!             .with_source(hub.clone() as Rc<dyn FrameTransformSource>),
//!     )?;
//!     assert!(!node.is_visible());
//!
//!     hub.publish("base_link", Transform::from_translation(DVec3::new(5.0, 0.0, 0.0)));
//!     assert!(node.is_visible());
//!     assert_eq!(node.position(), DVec3::new(5.0, 0.0, 0.0));
//!
//!     node.unbind_source()?;
//!     Ok(())
//! }
//! ```
//!
//! # Static scenes
//!
//! [`save_scene_json`] writes a node, its frame id and its reference pose;
//! [`load_scene_json`] rebuilds it without a subscription. Bind a source with
//! [`FrameBoundNode::bind_source`] to bring a loaded scene back to life; nested
//! frame-bound nodes are reachable through [`FrameBoundNode::frame_nodes`].

#![allow(clippy::missing_errors_doc)]

// Re-export core types
pub use tfscene_core::{
    error::{Result, TfSceneError},
    hub::TransformHub,
    node::{LinkedNode, SceneChild, SceneNode},
    pose::{Pose, PoseRecord, QuaternionRecord, Transform, TransformMessage, Vector3Record},
    record::{ObjectRecord, RecordMetadata, SceneRecord},
    source::{FrameTransformSource, TransformHandler},
    DMat4, DQuat, DVec3,
};

// Re-export node types
pub use tfscene_nodes::{
    load_scene_child, FrameBoundNode, FrameBoundNodeOptions, VisibilityOverride, FRAME_NODE_TYPE,
};

/// Initializes `env_logger` from `RUST_LOG`.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging() {
    let _ = env_logger::try_init();
}

/// Serializes `node` to pretty-printed JSON.
pub fn save_scene_json(node: &FrameBoundNode) -> Result<String> {
    let json = serde_json::to_string_pretty(&node.serialize())?;
    log::debug!("saved scene for frame '{}'", node.frame_id());
    Ok(json)
}

/// Rebuilds an unsubscribed node from JSON written by [`save_scene_json`].
pub fn load_scene_json(json: &str) -> Result<FrameBoundNode> {
    let record: SceneRecord = serde_json::from_str(json)?;
    let node = FrameBoundNode::from_record(&record)?;
    log::debug!("loaded static scene for frame '{}'", node.frame_id());
    Ok(node)
}
