//! Index newtypes for active elements and face segments.
//!
//! Both are positions in vectors that are rebuilt whenever the mesh changes,
//! so they are only meaningful together with the mesh they came from.

use std::fmt;
use std::ops::{Index, IndexMut};

macro_rules! define_index {
    (
        $(#[$meta:meta])*
        $name:ident, $display_prefix:literal
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(transparent)]
        pub struct $name(usize);

        impl $name {
            #[inline]
            pub const fn new(index: usize) -> Self {
                Self(index)
            }

            /// Position in the owning vector.
            #[inline]
            pub const fn get(self) -> usize {
                self.0
            }

            /// All indices below `n`, in order.
            pub fn iter(n: usize) -> impl ExactSizeIterator<Item = $name> {
                (0..n).map($name)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $display_prefix, self.0)
            }
        }

        impl From<usize> for $name {
            #[inline]
            fn from(index: usize) -> Self {
                Self(index)
            }
        }

        impl From<$name> for usize {
            #[inline]
            fn from(idx: $name) -> usize {
                idx.0
            }
        }

        impl<T> Index<$name> for [T] {
            type Output = T;
            #[inline]
            fn index(&self, idx: $name) -> &T {
                &self[idx.0]
            }
        }

        impl<T> IndexMut<$name> for [T] {
            #[inline]
            fn index_mut(&mut self, idx: $name) -> &mut T {
                &mut self[idx.0]
            }
        }

        impl<T> Index<$name> for Vec<T> {
            type Output = T;
            #[inline]
            fn index(&self, idx: $name) -> &T {
                &self[idx.0]
            }
        }

        impl<T> IndexMut<$name> for Vec<T> {
            #[inline]
            fn index_mut(&mut self, idx: $name) -> &mut T {
                &mut self[idx.0]
            }
        }
    };
}

define_index!(
    /// Active element (leaf cell) of an [`AdaptiveMesh`](crate::mesh::AdaptiveMesh).
    ///
    /// ```
    /// use dg_euler::types::ElementIndex;
    ///
    /// let orders = vec![0, 1, 2];
    /// assert_eq!(orders[ElementIndex::new(2)], 2);
    /// ```
    ElementIndex,
    "E"
);

define_index!(
    /// Face segment of a [`FaceSet`](crate::mesh::FaceSet).
    FaceIndex,
    "F"
);
