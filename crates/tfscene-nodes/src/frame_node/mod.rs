//! Frame-bound scene node.
//!
//! A [`FrameBoundNode`] wraps a [`SceneNode`] and keeps its local transform in
//! sync with a named coordinate frame. Every transform delivered for that frame
//! is applied to the node's reference pose, and the result replaces the node's
//! local position and orientation. The node stays hidden until its first
//! transform arrives unless told otherwise at construction.
//!
//! A frame-bound node can itself be placed in a scene tree: it converts into a
//! linked [`SceneChild`], and its world matrix is then the parent's world
//! matrix times its frame-driven local transform.
//!
//! Dropping a node does not unsubscribe it. Call
//! [`unbind_source`](FrameBoundNode::unbind_source) before discarding a bound
//! node; a handler left behind only holds a weak reference and does nothing
//! once the node is gone.

mod options;

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use glam::{DMat4, DQuat, DVec3};
use tfscene_core::{
    FrameTransformSource, LinkedNode, ObjectRecord, Pose, Result, SceneChild, SceneNode,
    SceneRecord, TfSceneError, Transform, TransformHandler,
};
use uuid::Uuid;

pub use options::{FrameBoundNodeOptions, VisibilityOverride};

/// Type tag written into records for frame-bound nodes.
pub const FRAME_NODE_TYPE: &str = "SceneNode";

struct FrameNodeState {
    frame_id: String,
    reference_pose: Pose,
    node: SceneNode,
    source: Option<Weak<dyn FrameTransformSource>>,
}

impl FrameNodeState {
    fn apply_pose(&mut self, pose: &Pose, parent_world: Option<DMat4>) {
        self.node.set_position(pose.position);
        self.node.set_quaternion(pose.orientation);
        self.node.update_matrix_world_from(parent_world, true);
    }

    fn apply_transform(&mut self, transform: &Transform, parent_world: Option<DMat4>) {
        let transformed = transform.apply_transform(&self.reference_pose);
        self.apply_pose(&transformed, parent_world);
        self.node.set_visible(true);
        log::trace!(
            "frame '{}' moved to {:?}",
            self.frame_id,
            transformed.position
        );
    }
}

struct FrameNodeShared {
    uuid: Uuid,
    state: RefCell<FrameNodeState>,
    /// Latest transform delivered while `state` was borrowed.
    pending: Cell<Option<Transform>>,
    /// World matrix of the tree this node is linked under, if any.
    parent_world: Cell<Option<DMat4>>,
    /// World matrices need a refresh that could not run at the time.
    world_stale: Cell<bool>,
}

impl FrameNodeShared {
    fn deliver(&self, transform: &Transform) {
        if let Ok(mut state) = self.state.try_borrow_mut() {
            self.pending.set(None);
            state.apply_transform(transform, self.parent_world.get());
            self.world_stale.set(false);
        } else {
            log::trace!("node is borrowed; deferring transform");
            self.pending.set(Some(*transform));
        }
    }

    fn refresh_world(&self, parent_world: Option<DMat4>, force: bool) {
        let moved = self.parent_world.replace(parent_world) != parent_world;
        if let Ok(mut state) = self.state.try_borrow_mut() {
            state.node.update_matrix_world_from(parent_world, force || moved);
        } else {
            self.world_stale.set(true);
        }
    }

    /// Applies work deferred while the state was borrowed.
    fn settle(&self) {
        let Ok(mut state) = self.state.try_borrow_mut() else {
            return;
        };
        let parent_world = self.parent_world.get();
        if let Some(transform) = self.pending.take() {
            state.apply_transform(&transform, parent_world);
        } else if self.world_stale.get() {
            state.node.update_matrix_world_from(parent_world, true);
        }
        self.world_stale.set(false);
    }
}

/// A scene node that follows a named coordinate frame.
///
/// This is a cheap handle: clones refer to the same node and share one
/// subscription handler.
#[derive(Clone)]
pub struct FrameBoundNode {
    shared: Rc<FrameNodeShared>,
    handler: TransformHandler,
}

impl FrameBoundNode {
    /// Creates a node from `options`.
    ///
    /// The reference pose is applied to the local transform immediately. If a
    /// source is given the node subscribes to it before returning.
    pub fn new(options: FrameBoundNodeOptions) -> Result<Self> {
        let FrameBoundNodeOptions {
            frame_id,
            pose,
            payload,
            visibility,
            source,
            name,
        } = options;

        let mut node = SceneNode::named(name).with_node_type(FRAME_NODE_TYPE);
        if let Some(payload) = payload {
            node.add(payload);
        }

        let bound = Self::assemble(frame_id, pose, node, visibility.resolve())?;
        bound.bind_source(source.as_ref());
        Ok(bound)
    }

    /// Rebuilds an unsubscribed node from a serialized record.
    ///
    /// The node keeps the recorded id, name, visibility and children. Its local
    /// transform is reset to the recorded reference pose. Nested frame-bound
    /// children are rebuilt as frame-bound nodes too, also unsubscribed.
    pub fn from_record(record: &SceneRecord) -> Result<Self> {
        Self::from_object_record(&record.object)
    }

    /// Like [`from_record`](Self::from_record), without the metadata header.
    pub fn from_object_record(record: &ObjectRecord) -> Result<Self> {
        let frame_id = record
            .frame_id
            .clone()
            .ok_or(TfSceneError::MissingField("frameID"))?;
        let pose = record.pose.ok_or(TfSceneError::MissingField("pose"))?;

        let node = SceneNode::from_object_record_with(record, &mut load_scene_child)?;
        let visible = node.is_visible();
        Self::assemble(frame_id, pose.into(), node, visible)
    }

    fn assemble(frame_id: String, pose: Pose, node: SceneNode, visible: bool) -> Result<Self> {
        if frame_id.is_empty() {
            return Err(TfSceneError::EmptyFrameId);
        }

        let mut state = FrameNodeState {
            frame_id,
            reference_pose: pose,
            node,
            source: None,
        };
        state.apply_pose(&pose, None);
        state.node.set_visible(visible);

        let shared = Rc::new(FrameNodeShared {
            uuid: state.node.uuid(),
            state: RefCell::new(state),
            pending: Cell::new(None),
            parent_world: Cell::new(None),
            world_stale: Cell::new(false),
        });
        let weak = Rc::downgrade(&shared);
        let handler = TransformHandler::new(move |transform| {
            if let Some(shared) = weak.upgrade() {
                shared.deliver(transform);
            }
        });

        Ok(Self { shared, handler })
    }

    /// Subscribes to `source`, replacing any current subscription.
    ///
    /// Passing `None` is a no-op: the current subscription, if any, is kept.
    /// Use [`unbind_source`](Self::unbind_source) to detach.
    pub fn bind_source(&self, source: Option<&Rc<dyn FrameTransformSource>>) {
        let Some(source) = source else {
            log::debug!(
                "no source given for frame '{}'; keeping current binding",
                self.frame_id()
            );
            return;
        };

        if self.is_bound() {
            self.teardown();
        }

        let frame_id = {
            let mut state = self.shared.state.borrow_mut();
            state.source = Some(Rc::downgrade(source));
            state.frame_id.clone()
        };
        log::debug!("binding node to frame '{frame_id}'");
        // The source may deliver synchronously, so no borrow is held here.
        source.subscribe(&frame_id, self.handler.clone());
    }

    /// Deregisters the node's handler from its current source.
    ///
    /// Fails with [`TfSceneError::NotSubscribed`] when the node is not bound,
    /// including when its source has since been dropped.
    pub fn unbind_source(&self) -> Result<()> {
        if !self.is_bound() {
            let frame_id = {
                let mut state = self.shared.state.borrow_mut();
                state.source = None;
                state.frame_id.clone()
            };
            log::warn!("unbind requested for frame '{frame_id}' with no active subscription");
            return Err(TfSceneError::NotSubscribed { frame_id });
        }
        self.teardown();
        Ok(())
    }

    fn teardown(&self) {
        let (frame_id, source) = {
            let mut state = self.shared.state.borrow_mut();
            (state.frame_id.clone(), state.source.take())
        };

        if let Some(source) = source.as_ref().and_then(Weak::upgrade) {
            log::debug!("unbinding node from frame '{frame_id}'");
            source.unsubscribe(&frame_id, &self.handler);
        }
    }

    /// Returns whether the node is subscribed to a source that is still alive.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.shared
            .state
            .borrow()
            .source
            .as_ref()
            .is_some_and(|source| source.strong_count() > 0)
    }

    /// Returns the handler registered with transform sources.
    #[must_use]
    pub fn handler(&self) -> &TransformHandler {
        &self.handler
    }

    /// Applies one transform update, exactly as a source delivery would.
    ///
    /// An update arriving while the node is borrowed (for example from inside
    /// [`with_node_mut`](Self::with_node_mut)) is held back and applied as soon
    /// as the borrow ends. Only the latest held-back update is kept.
    pub fn handle_transform(&self, transform: &Transform) {
        self.shared.deliver(transform);
    }

    /// Overwrites the local transform with `pose` and refreshes world matrices.
    pub fn apply_pose(&self, pose: &Pose) {
        let parent_world = self.shared.parent_world.get();
        self.shared.state.borrow_mut().apply_pose(pose, parent_world);
    }

    /// Recomputes world matrices for this node and its subtree.
    pub fn update_matrix_world(&self, force: bool) {
        self.shared.refresh_world(self.shared.parent_world.get(), force);
    }

    /// Serializes the node, its frame id and its reference pose.
    ///
    /// The transform-source binding is not part of the record.
    #[must_use]
    pub fn serialize(&self) -> SceneRecord {
        let state = self.shared.state.borrow();
        let mut record = state.node.to_record();
        record.object.frame_id = Some(state.frame_id.clone());
        record.object.pose = Some(state.reference_pose.to_record());
        record
    }

    #[must_use]
    pub fn frame_id(&self) -> String {
        self.shared.state.borrow().frame_id.clone()
    }

    #[must_use]
    pub fn reference_pose(&self) -> Pose {
        self.shared.state.borrow().reference_pose
    }

    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.shared.uuid
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.shared.state.borrow().node.is_visible()
    }

    pub fn set_visible(&self, visible: bool) {
        self.shared.state.borrow_mut().node.set_visible(visible);
    }

    /// Local position.
    #[must_use]
    pub fn position(&self) -> DVec3 {
        self.shared.state.borrow().node.position()
    }

    /// Local orientation.
    #[must_use]
    pub fn orientation(&self) -> DQuat {
        self.shared.state.borrow().node.quaternion()
    }

    /// Local transform as a pose.
    #[must_use]
    pub fn pose(&self) -> Pose {
        let state = self.shared.state.borrow();
        Pose::new(state.node.position(), state.node.quaternion())
    }

    #[must_use]
    pub fn matrix_world(&self) -> DMat4 {
        self.shared.state.borrow().node.matrix_world()
    }

    /// World-space position from the cached world matrix.
    #[must_use]
    pub fn world_position(&self) -> DVec3 {
        self.shared.state.borrow().node.world_position()
    }

    /// Attaches `child` to the wrapped node.
    ///
    /// Frame-bound nodes are accepted as well as plain ones.
    pub fn add(&self, child: impl Into<SceneChild>) {
        let parent_world = self.shared.parent_world.get();
        let mut state = self.shared.state.borrow_mut();
        state.node.add(child);
        state.node.update_matrix_world_from(parent_world, false);
    }

    /// Returns every frame-bound node below this one, depth first.
    #[must_use]
    pub fn frame_nodes(&self) -> Vec<FrameBoundNode> {
        let mut found = Vec::new();
        self.with_node(|node| collect_frame_nodes(node, &mut found));
        found
    }

    /// Runs `f` with read access to the wrapped node.
    pub fn with_node<R>(&self, f: impl FnOnce(&SceneNode) -> R) -> R {
        let result = {
            let state = self.shared.state.borrow();
            f(&state.node)
        };
        self.shared.settle();
        result
    }

    /// Runs `f` with write access to the wrapped node.
    ///
    /// World matrices are refreshed once `f` returns, and any transform
    /// delivered while `f` ran is applied then.
    pub fn with_node_mut<R>(&self, f: impl FnOnce(&mut SceneNode) -> R) -> R {
        let result = {
            let mut state = self.shared.state.borrow_mut();
            f(&mut state.node)
        };
        self.shared.world_stale.set(true);
        self.shared.settle();
        result
    }
}

impl LinkedNode for FrameBoundNode {
    fn uuid(&self) -> Uuid {
        self.shared.uuid
    }

    fn update_matrix_world_from(&self, parent_world: Option<DMat4>, force: bool) {
        self.shared.refresh_world(parent_world, force);
    }

    fn to_object_record(&self) -> ObjectRecord {
        self.serialize().object
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl From<FrameBoundNode> for SceneChild {
    fn from(node: FrameBoundNode) -> Self {
        SceneChild::Linked(Rc::new(node))
    }
}

/// Rebuilds one child of a scene record.
///
/// Records carrying a frame id become unsubscribed [`FrameBoundNode`]s; all
/// others become plain nodes whose own children are loaded the same way.
pub fn load_scene_child(record: &ObjectRecord) -> Result<SceneChild> {
    if record.frame_id.is_some() {
        return Ok(FrameBoundNode::from_object_record(record)?.into());
    }
    Ok(SceneNode::from_object_record_with(record, &mut load_scene_child)?.into())
}

fn collect_frame_nodes(node: &SceneNode, found: &mut Vec<FrameBoundNode>) {
    for child in node.children() {
        match child {
            SceneChild::Node(node) => collect_frame_nodes(node, found),
            SceneChild::Linked(link) => {
                if let Some(frame_node) = link.as_any().downcast_ref::<FrameBoundNode>() {
                    found.push(frame_node.clone());
                    frame_node.with_node(|n| collect_frame_nodes(n, found));
                }
            }
        }
    }
}

impl fmt::Debug for FrameBoundNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Ok(state) = self.shared.state.try_borrow() else {
            return f
                .debug_struct("FrameBoundNode")
                .field("uuid", &self.shared.uuid)
                .finish_non_exhaustive();
        };
        f.debug_struct("FrameBoundNode")
            .field("frame_id", &state.frame_id)
            .field("reference_pose", &state.reference_pose)
            .field("visible", &state.node.is_visible())
            .field("bound", &state.source.is_some())
            .finish_non_exhaustive()
    }
}
