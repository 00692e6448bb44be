use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! dense_index {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name {
            /// The underlying raw integer index.
            inner: u32,
        }

        impl $name {
            /// Creates a new index from a raw integer.
            pub const fn new(id: u32) -> Self {
                Self { inner: id }
            }

            /// Returns the index as a usize for array access.
            pub const fn as_usize(self) -> usize {
                self.inner as usize
            }

            /// `id` as an index, or `None` if it does not fit in a `u32`.
            pub const fn checked(id: usize) -> Option<Self> {
                if id <= u32::MAX as usize {
                    Some(Self { inner: id as u32 })
                } else {
                    None
                }
            }

            /// True if `count` dense ids starting at zero are representable.
            pub const fn fits(count: usize) -> bool {
                count == 0 || Self::checked(count - 1).is_some()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.inner)
            }
        }

        /// # Panics
        ///
        /// Panics if `id` does not fit in a `u32`. Graphs reject sizes past
        /// that bound when built, so ids derived from one always fit.
        impl From<usize> for $name {
            #[inline]
            fn from(id: usize) -> Self {
                match Self::checked(id) {
                    Some(index) => index,
                    None => panic!("index {id} does not fit in u32"),
                }
            }
        }

        impl From<$name> for usize {
            #[inline]
            fn from(id: $name) -> Self {
                id.inner as Self
            }
        }

        impl From<$name> for u32 {
            #[inline]
            fn from(id: $name) -> Self {
                id.inner
            }
        }
    };
}

dense_index!(
    /// Dense vertex identifier in `[0, n)` of either the pattern or the target graph.
    ///
    /// Backed by a `u32`, so a graph holds at most 2^32 vertices.
    VertexId,
    "v"
);

dense_index!(
    /// Position in the matching machine's search order.
    ///
    /// States are bijective with pattern vertices; keeping them a distinct
    /// type stops a state index from being used where a vertex id is expected.
    StateId,
    "s"
);

dense_index!(
    /// Dense pattern edge identifier, assigned by walking every pattern
    /// vertex's out-adjacency in order. At most 2^32 edges per graph.
    EdgeId,
    "e"
);
