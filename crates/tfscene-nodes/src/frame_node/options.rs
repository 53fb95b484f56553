//! Construction options for frame-bound nodes.

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tfscene_core::{FrameTransformSource, Pose, SceneNode};

/// Initial visibility requested by the caller.
///
/// `Unset` resolves to hidden: a frame-bound node is not drawn until its first
/// transform arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityOverride {
    #[default]
    Unset,
    Visible,
    Hidden,
}

impl VisibilityOverride {
    /// Resolves the override to the visibility used at construction.
    #[must_use]
    pub fn resolve(self) -> bool {
        matches!(self, VisibilityOverride::Visible)
    }
}

impl From<Option<bool>> for VisibilityOverride {
    fn from(value: Option<bool>) -> Self {
        match value {
            None => VisibilityOverride::Unset,
            Some(true) => VisibilityOverride::Visible,
            Some(false) => VisibilityOverride::Hidden,
        }
    }
}

/// Options for [`FrameBoundNode::new`](super::FrameBoundNode::new).
#[derive(Clone)]
pub struct FrameBoundNodeOptions {
    /// Frame the node tracks. Must not be empty.
    pub frame_id: String,
    /// Pose of the node within `frame_id`.
    pub pose: Pose,
    /// Renderable attached as a child.
    pub payload: Option<SceneNode>,
    /// Initial visibility.
    pub visibility: VisibilityOverride,
    /// Source to subscribe to right away.
    pub source: Option<Rc<dyn FrameTransformSource>>,
    /// Node name written into records.
    pub name: String,
}

impl FrameBoundNodeOptions {
    /// Creates options for a node tracking `frame_id` at the identity pose.
    pub fn new(frame_id: impl Into<String>) -> Self {
        Self {
            frame_id: frame_id.into(),
            pose: Pose::IDENTITY,
            payload: None,
            visibility: VisibilityOverride::Unset,
            source: None,
            name: String::new(),
        }
    }

    /// Sets the reference pose.
    #[must_use]
    pub fn with_pose(mut self, pose: Pose) -> Self {
        self.pose = pose;
        self
    }

    /// Sets the renderable payload.
    #[must_use]
    pub fn with_payload(mut self, payload: SceneNode) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Sets the initial visibility override.
    #[must_use]
    pub fn with_visibility(mut self, visibility: VisibilityOverride) -> Self {
        self.visibility = visibility;
        self
    }

    /// Forces the initial visibility.
    #[must_use]
    pub fn with_visible(self, visible: bool) -> Self {
        self.with_visibility(Some(visible).into())
    }

    /// Sets the transform source to bind at construction.
    #[must_use]
    pub fn with_source(mut self, source: Rc<dyn FrameTransformSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Sets the node name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}
