//! Bounds on recursion, both while compiling plans and while running them.

use std::any::TypeId;

use fxhash::FxHashSet;

use crate::{Error, Result};

/// The object types whose plans are currently being compiled.
///
/// A type found here while compiling a nested field means the type graph is
/// recursive; the compiler then emits a runtime-dispatched codec for the
/// field instead of recursing.
#[derive(Debug, Default)]
pub struct CompilingSet {
    types: FxHashSet<TypeId>,
}

impl CompilingSet {
    /// Creates an empty set.
    pub fn new() -> Self { Self::default() }

    /// Marks `type_id` as being compiled. Returns `false` if it already was.
    pub fn insert(&mut self, type_id: TypeId) -> bool {
        self.types.insert(type_id)
    }

    /// Returns `true` if `type_id` is being compiled.
    pub fn contains(&self, type_id: TypeId) -> bool {
        self.types.contains(&type_id)
    }

    /// Marks `type_id` as done.
    pub fn remove(&mut self, type_id: TypeId) { self.types.remove(&type_id); }
}

/// Object nesting depth of a single encode or decode call.
///
/// The root value sits at depth zero; entering an object (including the
/// root object itself) adds one. A chain of `max` nested objects is
/// accepted, one more is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Depth {
    current: u16,
    max: u16,
}

impl Depth {
    /// Creates the depth of a root value under the bound `max`.
    #[must_use]
    pub const fn root(max: u16) -> Self { Self { current: 0, max } }

    /// Returns the current nesting level.
    #[must_use]
    pub const fn current(self) -> u16 { self.current }

    /// Returns the configured bound.
    #[must_use]
    pub const fn max(self) -> u16 { self.max }

    /// Descends into an object of type `type_name`.
    pub fn enter(self, type_name: &'static str) -> Result<Self> {
        if self.current >= self.max {
            return Err(Error::DepthExceeded { max_depth: self.max, type_name });
        }

        Ok(Self { current: self.current + 1, max: self.max })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn chain_of_max_objects_is_accepted() {
        let mut depth = Depth::root(16);
        for _ in 0..16 {
            depth = depth.enter("Node").unwrap();
        }

        assert_eq!(depth.current(), 16);
        assert_eq!(
            depth.enter("Node").unwrap_err().kind(),
            ErrorKind::DepthExceeded
        );
    }

    #[test]
    fn zero_bound_rejects_any_object() {
        let err = Depth::root(0).enter("Point").unwrap_err();

        assert!(matches!(err, Error::DepthExceeded {
            max_depth: 0,
            type_name: "Point",
        }));
    }

    #[test]
    fn compiling_set_tracks_membership() {
        let mut set = CompilingSet::new();
        let id = TypeId::of::<u32>();

        assert!(set.insert(id));
        assert!(!set.insert(id));
        assert!(set.contains(id));

        set.remove(id);
        assert!(!set.contains(id));
    }
}
