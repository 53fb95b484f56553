//! Generic scene-graph node.
//!
//! A [`SceneNode`] stores a local transform (position, orientation, scale)
//! together with cached local and world matrices. Matrices are recomputed
//! lazily by [`SceneNode::update_matrix_world`]; passing `force = true`
//! recomputes the whole subtree immediately.
//!
//! Children are either owned [`SceneNode`]s or [`LinkedNode`]s: handles to
//! nodes whose state lives elsewhere (such as nodes driven by a transform
//! source) but which still take their world matrix from this tree.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use glam::{DMat4, DQuat, DVec3};
use uuid::Uuid;

use crate::error::Result;
use crate::record::{ObjectRecord, RecordMetadata, SceneRecord};

/// Type tag written for plain nodes.
pub const OBJECT_NODE_TYPE: &str = "Object3D";

/// A node held by reference in a scene tree.
pub trait LinkedNode: fmt::Debug {
    /// Returns the node's id.
    fn uuid(&self) -> Uuid;

    /// Recomputes world matrices below `parent_world`.
    ///
    /// `None` means the node is a tree root.
    fn update_matrix_world_from(&self, parent_world: Option<DMat4>, force: bool);

    /// Serializes the node and its subtree.
    fn to_object_record(&self) -> ObjectRecord;

    /// Lets callers recover the concrete node type.
    fn as_any(&self) -> &dyn Any;
}

/// A child slot in a scene tree.
#[derive(Debug, Clone)]
pub enum SceneChild {
    /// A node owned by its parent.
    Node(SceneNode),
    /// A node shared with other owners.
    Linked(Rc<dyn LinkedNode>),
}

impl SceneChild {
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        match self {
            SceneChild::Node(node) => node.uuid(),
            SceneChild::Linked(link) => link.uuid(),
        }
    }

    /// Returns the owned node, if this child is one.
    #[must_use]
    pub fn as_node(&self) -> Option<&SceneNode> {
        match self {
            SceneChild::Node(node) => Some(node),
            SceneChild::Linked(_) => None,
        }
    }

    /// Serializes this child and its subtree.
    #[must_use]
    pub fn to_object_record(&self) -> ObjectRecord {
        match self {
            SceneChild::Node(node) => node.to_object_record(),
            SceneChild::Linked(link) => link.to_object_record(),
        }
    }

    fn update_matrix_world_from(&mut self, parent_world: DMat4, force: bool) {
        match self {
            SceneChild::Node(node) => node.update_matrix_world_from(Some(parent_world), force),
            SceneChild::Linked(link) => link.update_matrix_world_from(Some(parent_world), force),
        }
    }
}

impl From<SceneNode> for SceneChild {
    fn from(node: SceneNode) -> Self {
        SceneChild::Node(node)
    }
}

/// A node in a scene tree.
#[derive(Debug, Clone)]
pub struct SceneNode {
    uuid: Uuid,
    name: String,
    node_type: String,
    visible: bool,
    position: DVec3,
    quaternion: DQuat,
    scale: DVec3,
    matrix: DMat4,
    matrix_world: DMat4,
    /// Local matrix is stale relative to position/quaternion/scale.
    matrix_dirty: bool,
    /// World matrix is stale relative to the local matrix.
    world_dirty: bool,
    children: Vec<SceneChild>,
}

impl Default for SceneNode {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneNode {
    /// Creates an empty, visible node at the origin.
    pub fn new() -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: String::new(),
            node_type: OBJECT_NODE_TYPE.to_string(),
            visible: true,
            position: DVec3::ZERO,
            quaternion: DQuat::IDENTITY,
            scale: DVec3::ONE,
            matrix: DMat4::IDENTITY,
            matrix_world: DMat4::IDENTITY,
            matrix_dirty: false,
            world_dirty: true,
            children: Vec::new(),
        }
    }

    /// Creates an empty node with the given name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::new()
        }
    }

    /// Sets the type tag written into records.
    #[must_use]
    pub fn with_node_type(mut self, node_type: impl Into<String>) -> Self {
        self.node_type = node_type.into();
        self
    }

    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    #[must_use]
    pub fn node_type(&self) -> &str {
        &self.node_type
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Returns the local position.
    #[must_use]
    pub fn position(&self) -> DVec3 {
        self.position
    }

    /// Sets the local position. Matrices refresh on the next world update.
    pub fn set_position(&mut self, position: DVec3) {
        self.position = position;
        self.matrix_dirty = true;
    }

    /// Returns the local orientation.
    #[must_use]
    pub fn quaternion(&self) -> DQuat {
        self.quaternion
    }

    /// Sets the local orientation. Matrices refresh on the next world update.
    pub fn set_quaternion(&mut self, quaternion: DQuat) {
        self.quaternion = quaternion;
        self.matrix_dirty = true;
    }

    #[must_use]
    pub fn scale(&self) -> DVec3 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: DVec3) {
        self.scale = scale;
        self.matrix_dirty = true;
    }

    /// Returns the cached local matrix.
    #[must_use]
    pub fn matrix(&self) -> DMat4 {
        self.matrix
    }

    /// Returns the cached world matrix.
    ///
    /// This is only as fresh as the last [`update_matrix_world`](Self::update_matrix_world).
    #[must_use]
    pub fn matrix_world(&self) -> DMat4 {
        self.matrix_world
    }

    /// Returns the world-space position from the cached world matrix.
    #[must_use]
    pub fn world_position(&self) -> DVec3 {
        self.matrix_world.w_axis.truncate()
    }

    /// Recomposes the local matrix from position, orientation and scale.
    pub fn update_matrix(&mut self) {
        self.matrix =
            DMat4::from_scale_rotation_translation(self.scale, self.quaternion, self.position);
        self.matrix_dirty = false;
        self.world_dirty = true;
    }

    /// Recomputes world matrices for this node and its descendants.
    ///
    /// The node is treated as a tree root. Without `force`, subtrees whose
    /// matrices are already current are left alone; with `force`, every
    /// descendant is recomputed.
    pub fn update_matrix_world(&mut self, force: bool) {
        self.update_matrix_world_from(None, force);
    }

    /// Like [`update_matrix_world`](Self::update_matrix_world) for a node whose
    /// parent has world matrix `parent_world`.
    pub fn update_matrix_world_from(&mut self, parent_world: Option<DMat4>, mut force: bool) {
        if self.matrix_dirty {
            self.update_matrix();
        }

        if self.world_dirty || force {
            self.matrix_world = match parent_world {
                Some(parent) => parent * self.matrix,
                None => self.matrix,
            };
            self.world_dirty = false;
            force = true;
        }

        let world = self.matrix_world;
        for child in &mut self.children {
            child.update_matrix_world_from(world, force);
        }
    }

    /// Attaches `child` as the last child of this node.
    pub fn add(&mut self, child: impl Into<SceneChild>) {
        let mut child = child.into();
        if let SceneChild::Node(node) = &mut child {
            node.world_dirty = true;
        }
        self.children.push(child);
    }

    /// Detaches the direct child with the given id.
    ///
    /// A detached linked node becomes a root again.
    pub fn remove(&mut self, uuid: Uuid) -> Option<SceneChild> {
        let index = self.children.iter().position(|c| c.uuid() == uuid)?;
        let child = self.children.remove(index);
        if let SceneChild::Linked(link) = &child {
            link.update_matrix_world_from(None, true);
        }
        Some(child)
    }

    #[must_use]
    pub fn children(&self) -> &[SceneChild] {
        &self.children
    }

    /// Searches the owned part of this subtree (including this node) for `uuid`.
    ///
    /// Linked children are not descended into.
    #[must_use]
    pub fn find(&self, uuid: Uuid) -> Option<&SceneNode> {
        if self.uuid == uuid {
            return Some(self);
        }
        self.children
            .iter()
            .filter_map(SceneChild::as_node)
            .find_map(|c| c.find(uuid))
    }

    /// Serializes this subtree.
    #[must_use]
    pub fn to_record(&self) -> SceneRecord {
        SceneRecord {
            metadata: RecordMetadata::default(),
            object: self.to_object_record(),
        }
    }

    /// Serializes this subtree without the metadata header.
    #[must_use]
    pub fn to_object_record(&self) -> ObjectRecord {
        let matrix = if self.matrix_dirty {
            DMat4::from_scale_rotation_translation(self.scale, self.quaternion, self.position)
        } else {
            self.matrix
        };

        ObjectRecord {
            uuid: self.uuid,
            node_type: self.node_type.clone(),
            name: self.name.clone(),
            visible: self.visible,
            matrix: matrix.to_cols_array(),
            children: self
                .children
                .iter()
                .map(SceneChild::to_object_record)
                .collect(),
            frame_id: None,
            pose: None,
        }
    }

    /// Rebuilds a plain subtree from its record.
    ///
    /// Frame-binding fields are ignored; use
    /// [`from_object_record_with`](Self::from_object_record_with) to rebuild
    /// other node kinds.
    #[must_use]
    pub fn from_object_record(record: &ObjectRecord) -> Self {
        let mut node = Self::from_object_fields(record);
        for child in &record.children {
            node.add(Self::from_object_record(child));
        }
        node
    }

    /// Rebuilds this node from `record`, delegating each child to `load_child`.
    pub fn from_object_record_with(
        record: &ObjectRecord,
        load_child: &mut dyn FnMut(&ObjectRecord) -> Result<SceneChild>,
    ) -> Result<Self> {
        let mut node = Self::from_object_fields(record);
        for child in &record.children {
            node.add(load_child(child)?);
        }
        Ok(node)
    }

    fn from_object_fields(record: &ObjectRecord) -> Self {
        let matrix = DMat4::from_cols_array(&record.matrix);
        let (scale, quaternion, position) = matrix.to_scale_rotation_translation();

        Self {
            uuid: record.uuid,
            name: record.name.clone(),
            node_type: record.node_type.clone(),
            visible: record.visible,
            position,
            quaternion,
            scale,
            matrix,
            ..Self::new()
        }
    }
}
