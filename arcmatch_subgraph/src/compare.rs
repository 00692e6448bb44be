//! Attribute compatibility predicates.
//!
//! The engine calls a comparator with the pattern-side attribute first and
//! the target-side attribute second. Nothing assumes symmetry.

/// Decides whether a pattern attribute may be matched onto a target attribute.
pub trait AttributeComparator<A: ?Sized> {
    /// True if `pattern` is compatible with `target`.
    fn compatible(&self, pattern: &A, target: &A) -> bool;
}

/// Accepts every pair.
#[derive(Clone, Copy, Debug, Default)]
pub struct Wildcard;

impl<A: ?Sized> AttributeComparator<A> for Wildcard {
    #[inline]
    fn compatible(&self, _: &A, _: &A) -> bool {
        true
    }
}

/// Accepts pairs that compare equal.
#[derive(Clone, Copy, Debug, Default)]
pub struct Equal;

impl<A: PartialEq + ?Sized> AttributeComparator<A> for Equal {
    #[inline]
    fn compatible(&self, pattern: &A, target: &A) -> bool {
        pattern == target
    }
}

impl<A: ?Sized, F> AttributeComparator<A> for F
where
    F: Fn(&A, &A) -> bool,
{
    #[inline]
    fn compatible(&self, pattern: &A, target: &A) -> bool {
        self(pattern, target)
    }
}
