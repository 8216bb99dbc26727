/*! The `Bound<T>` sum type used everywhere a fixed point, wait-time
computation, or LP solve may fail to converge to a finite value.

Per the design notes this crate follows, non-convergence is represented
by an explicit `Bounded(n)` / `Unlimited` sum type rather than a
reserved sentinel integer (`UINT_MAX` in the original C++). Downstream
code must pattern-match (or use the combinators below), which rules out
the class of off-by-one bugs that come from comparing against a magic
constant.
*/

use std::cmp::Ordering;
use std::ops::Add;

use crate::time::Duration;

/// Either a finite bound of type `T`, or an explicit "does not
/// converge"/"cannot be proven" marker.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Bound<T> {
    /// A proven finite bound.
    Bounded(T),
    /// No finite bound could be established (non-convergent fixed
    /// point, or the LP solver reported infeasible/unbounded/numerical
    /// failure).
    Unlimited,
}

impl<T> Bound<T> {
    /// Construct a finite bound.
    pub fn of(value: T) -> Self {
        Bound::Bounded(value)
    }

    /// Is this a finite bound?
    pub fn is_bounded(&self) -> bool {
        matches!(self, Bound::Bounded(_))
    }

    /// Is this the `Unlimited` marker?
    pub fn is_unlimited(&self) -> bool {
        matches!(self, Bound::Unlimited)
    }

    /// Extract the finite value, or `None` if unlimited.
    pub fn finite(self) -> Option<T> {
        match self {
            Bound::Bounded(v) => Some(v),
            Bound::Unlimited => None,
        }
    }

    /// Map the finite value, passing `Unlimited` through unchanged.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Bound<U> {
        match self {
            Bound::Bounded(v) => Bound::Bounded(f(v)),
            Bound::Unlimited => Bound::Unlimited,
        }
    }

    /// Unwrap a finite bound, or fall back to a caller-supplied
    /// conservative value when unlimited. Useful at the very few call
    /// sites that must eventually produce a plain number (e.g., for
    /// display), but should not be used to silently launder
    /// `Unlimited` into an LP coefficient.
    pub fn unwrap_or(self, fallback: T) -> T {
        match self {
            Bound::Bounded(v) => v,
            Bound::Unlimited => fallback,
        }
    }
}

impl<T: Ord> Bound<T> {
    /// The maximum of two bounds; `Unlimited` dominates.
    pub fn max(self, other: Self) -> Self {
        match (self, other) {
            (Bound::Unlimited, _) | (_, Bound::Unlimited) => Bound::Unlimited,
            (Bound::Bounded(a), Bound::Bounded(b)) => Bound::Bounded(a.max(b)),
        }
    }
}

impl<T: Add<Output = T>> Add for Bound<T> {
    type Output = Bound<T>;

    /// `Unlimited` absorbs under addition: any amount of additional
    /// finite blocking added to an already-unbounded wait is still
    /// unbounded.
    fn add(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            (Bound::Bounded(a), Bound::Bounded(b)) => Bound::Bounded(a + b),
            _ => Bound::Unlimited,
        }
    }
}

impl<T: PartialOrd> PartialOrd for Bound<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Bound::Unlimited, Bound::Unlimited) => Some(Ordering::Equal),
            (Bound::Unlimited, _) => Some(Ordering::Greater),
            (_, Bound::Unlimited) => Some(Ordering::Less),
            (Bound::Bounded(a), Bound::Bounded(b)) => a.partial_cmp(b),
        }
    }
}

impl<T: Ord> Ord for Bound<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Bound::Unlimited, Bound::Unlimited) => Ordering::Equal,
            (Bound::Unlimited, _) => Ordering::Greater,
            (_, Bound::Unlimited) => Ordering::Less,
            (Bound::Bounded(a), Bound::Bounded(b)) => a.cmp(b),
        }
    }
}

impl<T> Default for Bound<T>
where
    T: Default,
{
    fn default() -> Self {
        Bound::Bounded(T::default())
    }
}

impl<T> From<crate::fixed_point::SearchResult> for Bound<T>
where
    T: From<Duration>,
{
    /// Collapse a fixed-point search result into a `Bound`, the
    /// standard conversion at the boundary between `fixed_point`'s
    /// `Result`-based API and the rest of this crate's `Bound`-based
    /// one (see SPEC_FULL.md, "Open questions").
    fn from(r: crate::fixed_point::SearchResult) -> Self {
        match r {
            Ok(d) => Bound::Bounded(T::from(d)),
            Err(_) => Bound::Unlimited,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlimited_absorbs_under_addition() {
        let a: Bound<u64> = Bound::Bounded(3);
        let b: Bound<u64> = Bound::Unlimited;
        assert_eq!(a + b, Bound::Unlimited);
    }

    #[test]
    fn unlimited_dominates_under_max() {
        let a: Bound<u64> = Bound::Bounded(100);
        let b: Bound<u64> = Bound::Unlimited;
        assert_eq!(a.max(b), Bound::Unlimited);
    }

    #[test]
    fn ordering_treats_unlimited_as_largest() {
        let a: Bound<u64> = Bound::Bounded(u64::MAX);
        let b: Bound<u64> = Bound::Unlimited;
        assert!(a < b);
    }
}
