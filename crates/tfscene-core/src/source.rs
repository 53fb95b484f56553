//! The seam between scene nodes and a transform-distribution service.
//!
//! A [`FrameTransformSource`] delivers [`Transform`] updates for named frames to
//! registered [`TransformHandler`]s. Handlers are matched by identity, so the
//! same handler value must be passed to `subscribe` and `unsubscribe`.

use std::fmt;
use std::rc::Rc;

use crate::pose::Transform;

/// A callable that receives transform updates for one frame.
///
/// Cloning a handler yields the same identity; two handlers built from
/// separate closures are never equal, even if the closures are identical.
#[derive(Clone)]
pub struct TransformHandler(Rc<dyn Fn(&Transform)>);

impl TransformHandler {
    /// Wraps `f` in a new handler identity.
    pub fn new(f: impl Fn(&Transform) + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Invokes the handler.
    pub fn call(&self, transform: &Transform) {
        (self.0)(transform);
    }

    /// Returns whether both values refer to the same handler.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for TransformHandler {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl Eq for TransformHandler {}

impl fmt::Debug for TransformHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TransformHandler")
            .field(&Rc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}

/// A publish/subscribe service delivering per-frame transforms.
///
/// Delivery timing and ordering belong to the implementation. Implementations
/// must tolerate `unsubscribe` being called from inside a handler while a
/// delivery is in progress.
pub trait FrameTransformSource {
    /// Registers `handler` for updates to `frame_id`.
    fn subscribe(&self, frame_id: &str, handler: TransformHandler);

    /// Deregisters exactly `handler` from `frame_id`.
    fn unsubscribe(&self, frame_id: &str, handler: &TransformHandler);
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::Cell;

    #[test]
    fn test_clone_shares_identity() {
        let a = TransformHandler::new(|_| {});
        let b = a.clone();
        assert_eq!(a, b);
    }

    #[test]
    fn test_distinct_closures_differ() {
        let a = TransformHandler::new(|_| {});
        let b = TransformHandler::new(|_| {});
        assert_ne!(a, b);
    }

    #[test]
    fn test_call_invokes_closure() {
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let handler = TransformHandler::new(move |_| counter.set(counter.get() + 1));
        handler.call(&Transform::IDENTITY);
        handler.call(&Transform::IDENTITY);
        assert_eq!(hits.get(), 2);
    }
}
