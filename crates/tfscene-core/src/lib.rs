//! Core abstractions for tfscene-rs.
//!
//! This crate provides the building blocks that frame-bound nodes sit on:
//! - [`Pose`] and [`Transform`] value types and their plain-data records
//! - [`SceneNode`], a generic scene-graph node with cached world matrices
//! - [`FrameTransformSource`], the seam to a transform-distribution service,
//!   and [`TransformHub`], an in-process implementation of it

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]

pub mod error;
pub mod hub;
pub mod node;
pub mod pose;
pub mod record;
pub mod source;

pub use error::{Result, TfSceneError};
pub use hub::TransformHub;
pub use node::{LinkedNode, SceneChild, SceneNode};
pub use pose::{Pose, PoseRecord, QuaternionRecord, Transform, TransformMessage, Vector3Record};
pub use record::{ObjectRecord, RecordMetadata, SceneRecord};
pub use source::{FrameTransformSource, TransformHandler};

// Re-export glam types for convenience
pub use glam::{DMat4, DQuat, DVec3};
