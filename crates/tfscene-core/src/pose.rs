//! Pose and transform value types.
//!
//! A [`Pose`] places an object inside a coordinate frame; a [`Transform`] maps
//! poses from one frame into another. Both are plain `Copy` values: the only way
//! to change one is to replace it.

use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};

/// Position and orientation of an object relative to some frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    /// Position in the frame's units.
    pub position: DVec3,
    /// Orientation as a unit quaternion.
    pub orientation: DQuat,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    /// The pose at the frame origin with no rotation.
    pub const IDENTITY: Self = Self {
        position: DVec3::ZERO,
        orientation: DQuat::IDENTITY,
    };

    /// Creates a pose from a position and orientation.
    #[must_use]
    pub fn new(position: DVec3, orientation: DQuat) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Creates a pose at `position` with no rotation.
    #[must_use]
    pub fn from_position(position: DVec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    /// Returns a plain-data snapshot of this pose.
    #[must_use]
    pub fn to_record(&self) -> PoseRecord {
        PoseRecord::from(*self)
    }
}

/// A rigid mapping from one frame into another.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Translation component.
    pub translation: DVec3,
    /// Rotation component as a quaternion.
    pub rotation: DQuat,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    /// The transform that leaves every pose unchanged.
    pub const IDENTITY: Self = Self {
        translation: DVec3::ZERO,
        rotation: DQuat::IDENTITY,
    };

    /// Creates a transform from its components.
    #[must_use]
    pub fn new(translation: DVec3, rotation: DQuat) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    /// Creates a pure translation.
    #[must_use]
    pub fn from_translation(translation: DVec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    /// Creates a pure rotation.
    #[must_use]
    pub fn from_rotation(rotation: DQuat) -> Self {
        Self {
            rotation,
            ..Self::IDENTITY
        }
    }

    /// Maps `pose` through this transform.
    ///
    /// The pose is rotated first and then translated; its orientation is
    /// pre-multiplied by the rotation. The input is left untouched.
    #[must_use]
    pub fn apply_transform(&self, pose: &Pose) -> Pose {
        Pose {
            position: self.rotation * pose.position + self.translation,
            orientation: self.rotation * pose.orientation,
        }
    }
}

/// Plain-data `{x, y, z}` triple.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3Record {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl From<DVec3> for Vector3Record {
    fn from(v: DVec3) -> Self {
        Self {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

impl From<Vector3Record> for DVec3 {
    fn from(v: Vector3Record) -> Self {
        DVec3::new(v.x, v.y, v.z)
    }
}

/// Plain-data `{x, y, z, w}` quaternion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuaternionRecord {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Default for QuaternionRecord {
    fn default() -> Self {
        DQuat::IDENTITY.into()
    }
}

impl From<DQuat> for QuaternionRecord {
    fn from(q: DQuat) -> Self {
        Self {
            x: q.x,
            y: q.y,
            z: q.z,
            w: q.w,
        }
    }
}

impl From<QuaternionRecord> for DQuat {
    fn from(q: QuaternionRecord) -> Self {
        DQuat::from_xyzw(q.x, q.y, q.z, q.w)
    }
}

/// Plain-data snapshot of a [`Pose`], as written into scene records.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PoseRecord {
    pub position: Vector3Record,
    pub orientation: QuaternionRecord,
}

impl From<Pose> for PoseRecord {
    fn from(pose: Pose) -> Self {
        Self {
            position: pose.position.into(),
            orientation: pose.orientation.into(),
        }
    }
}

impl From<PoseRecord> for Pose {
    fn from(record: PoseRecord) -> Self {
        Pose::new(record.position.into(), record.orientation.into())
    }
}

/// A transform as delivered on the wire: `{translation, rotation}`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TransformMessage {
    pub translation: Vector3Record,
    pub rotation: QuaternionRecord,
}

impl From<TransformMessage> for Transform {
    fn from(msg: TransformMessage) -> Self {
        Transform::new(msg.translation.into(), msg.rotation.into())
    }
}
