//! In-process transform distribution.
//!
//! [`TransformHub`] is a single-threaded [`FrameTransformSource`] that keeps the
//! latest transform for each frame and fans it out to subscribers. It latches:
//! a handler subscribing to a frame that already has a transform receives it
//! immediately.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::pose::{Transform, TransformMessage};
use crate::source::{FrameTransformSource, TransformHandler};

#[derive(Default)]
struct FrameEntry {
    latest: Option<Transform>,
    handlers: Vec<TransformHandler>,
}

/// Per-frame publish/subscribe registry.
#[derive(Default)]
pub struct TransformHub {
    frames: RefCell<HashMap<String, FrameEntry>>,
}

impl TransformHub {
    /// Creates an empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `transform` as the latest for `frame_id` and delivers it.
    ///
    /// Handlers run on a snapshot of the subscriber list, so they may
    /// subscribe or unsubscribe while the delivery is in progress. Returns the
    /// number of handlers invoked.
    pub fn publish(&self, frame_id: &str, transform: Transform) -> usize {
        let handlers = {
            let mut frames = self.frames.borrow_mut();
            let entry = frames.entry(frame_id.to_string()).or_default();
            entry.latest = Some(transform);
            entry.handlers.clone()
        };

        log::trace!(
            "delivering transform for '{frame_id}' to {} handler(s)",
            handlers.len()
        );
        for handler in &handlers {
            handler.call(&transform);
        }
        handlers.len()
    }

    /// Publishes a transform received in wire form.
    pub fn publish_message(&self, frame_id: &str, message: TransformMessage) -> usize {
        self.publish(frame_id, message.into())
    }

    /// Returns the latest transform published for `frame_id`.
    #[must_use]
    pub fn latest(&self, frame_id: &str) -> Option<Transform> {
        self.frames.borrow().get(frame_id).and_then(|e| e.latest)
    }

    /// Returns the number of handlers registered for `frame_id`.
    #[must_use]
    pub fn subscriber_count(&self, frame_id: &str) -> usize {
        self.frames
            .borrow()
            .get(frame_id)
            .map_or(0, |e| e.handlers.len())
    }

    /// Returns whether `handler` is registered for `frame_id`.
    #[must_use]
    pub fn is_subscribed(&self, frame_id: &str, handler: &TransformHandler) -> bool {
        self.frames
            .borrow()
            .get(frame_id)
            .is_some_and(|e| e.handlers.contains(handler))
    }

    /// Returns the ids of all frames the hub knows about, sorted.
    #[must_use]
    pub fn frames(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.frames.borrow().keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl FrameTransformSource for TransformHub {
    fn subscribe(&self, frame_id: &str, handler: TransformHandler) {
        let latched = {
            let mut frames = self.frames.borrow_mut();
            let entry = frames.entry(frame_id.to_string()).or_default();
            if entry.handlers.contains(&handler) {
                log::debug!("handler already subscribed to '{frame_id}'");
                return;
            }
            entry.handlers.push(handler.clone());
            entry.latest
        };

        log::debug!("subscribed handler to '{frame_id}'");
        if let Some(transform) = latched {
            handler.call(&transform);
        }
    }

    fn unsubscribe(&self, frame_id: &str, handler: &TransformHandler) {
        let mut frames = self.frames.borrow_mut();
        let Some(entry) = frames.get_mut(frame_id) else {
            return;
        };

        let before = entry.handlers.len();
        entry.handlers.retain(|h| h != handler);
        if entry.handlers.len() < before {
            log::debug!("unsubscribed handler from '{frame_id}'");
        }

        if entry.handlers.is_empty() && entry.latest.is_none() {
            frames.remove(frame_id);
        }
    }
}
