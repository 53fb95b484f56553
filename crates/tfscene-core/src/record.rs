//! Serialized scene records.
//!
//! These are the durable form of a scene tree. A record carries only plain
//! data; runtime relationships such as transform subscriptions are never
//! written out.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pose::PoseRecord;

/// Version of the record layout written by [`RecordMetadata::default`].
pub const RECORD_FORMAT_VERSION: u32 = 1;

/// Header written alongside every serialized tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub version: u32,
    #[serde(rename = "type")]
    pub record_type: String,
    pub generator: String,
}

impl Default for RecordMetadata {
    fn default() -> Self {
        Self {
            version: RECORD_FORMAT_VERSION,
            record_type: "Object".to_string(),
            generator: concat!("tfscene ", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// A serialized scene tree: `{ metadata, object }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneRecord {
    pub metadata: RecordMetadata,
    pub object: ObjectRecord,
}

/// One serialized node and its subtree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRecord {
    pub uuid: Uuid,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub visible: bool,
    /// Local matrix, column-major.
    pub matrix: [f64; 16],
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ObjectRecord>,
    /// Frame the node tracks; only present on frame-bound nodes.
    #[serde(rename = "frameID", default, skip_serializing_if = "Option::is_none")]
    pub frame_id: Option<String>,
    /// Reference pose within `frame_id`; only present on frame-bound nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pose: Option<PoseRecord>,
}
