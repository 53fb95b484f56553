//! Scene node types for tfscene-rs.
//!
//! - [`FrameBoundNode`] - a scene node that follows a named coordinate frame

#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

pub mod frame_node;

pub use frame_node::{
    load_scene_child, FrameBoundNode, FrameBoundNodeOptions, VisibilityOverride, FRAME_NODE_TYPE,
};
