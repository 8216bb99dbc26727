/*! Core time types shared by every analysis in this crate.

`Duration`, `Instant` and `Service` are all plain 64-bit magnitudes;
they are kept as distinct aliases purely for documentation purposes
(distinguishing "a length of time", "a point in time", and "an amount
of execution" at call sites). [`Offset`] is the one genuine newtype in
this module: it marks a point in time that is always expressed
relative to a conventional "time zero" and carries the
since/closed-since conversion helpers used throughout the busy-window
and demand-bound machinery.
*/

/// The underlying representation used for all time-like quantities.
pub type Time = u64;

// Syntactic sugar to give a hint as to whether a time value denotes an
// interval length, a specific point in time, or an amount of execution.
pub type Instant = Time;
pub type Duration = Time;
pub type Service = Time;

/// Convenience operations shared by [`Duration`], [`Instant`], and [`Service`].
///
/// These cannot be inherent methods because `Time` is just `u64`, so
/// this trait exists to give `Duration::zero()`-style call syntax
/// without reaching for free functions.
pub trait TimeExt: Sized + Copy {
    /// The additive identity.
    fn zero() -> Self;
    /// The smallest representable positive quantity.
    fn epsilon() -> Self;
    /// Synonym for [`TimeExt::zero`], used where "no service"/"no
    /// demand" reads more naturally than "zero".
    fn none() -> Self;
    /// Is this the additive identity?
    fn is_zero(&self) -> bool;
    /// The negation of [`TimeExt::is_zero`].
    fn is_non_zero(&self) -> bool {
        !self.is_zero()
    }
    /// Synonym for [`TimeExt::is_zero`].
    fn is_none(&self) -> bool {
        self.is_zero()
    }
    /// The (trivial) amount of service obtainable from an interval of
    /// the given length, i.e., the identity conversion between a
    /// duration and the service it may provide.
    fn in_interval(d: Duration) -> Self;
}

impl TimeExt for Time {
    fn zero() -> Self {
        0
    }
    fn epsilon() -> Self {
        1
    }
    fn none() -> Self {
        0
    }
    fn is_zero(&self) -> bool {
        *self == 0
    }
    fn in_interval(d: Duration) -> Self {
        d
    }
}

/// A point in time expressed as an offset relative to a fixed
/// "time zero" (e.g., the start of a busy window).
///
/// The two families of conversions, `since_time_zero` and
/// `closed_since_time_zero` (and their inverses `from_time_zero` /
/// `closed_from_time_zero`), exist because busy-window arguments are
/// conventionally expressed as half-open intervals `[0, A)`, whereas
/// some request-bound interfaces expect the length of the
/// corresponding *closed* interval `[0, A]`. Concretely, the latter is
/// always exactly one longer than the former:
///
/// `rb.service_needed(A.since_time_zero()) <= rb.service_needed(A.closed_since_time_zero())`
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Offset(Duration);

impl Offset {
    /// The length of the half-open interval `[0, self)`.
    pub fn since_time_zero(self) -> Duration {
        self.0
    }

    /// The length of the closed interval `[0, self]`.
    pub fn closed_since_time_zero(self) -> Duration {
        self.0 + Duration::epsilon()
    }

    /// Construct the offset `A` such that `A.since_time_zero() == d`.
    pub fn from_time_zero(d: Duration) -> Offset {
        Offset(d)
    }

    /// Construct the offset `A` such that `A.closed_since_time_zero() == d`.
    pub fn closed_from_time_zero(d: Duration) -> Offset {
        Offset(d.saturating_sub(Duration::epsilon()))
    }

    /// The length of the interval separating `self` from a later (or
    /// equal) offset `other`.
    pub fn distance_to(self, other: Offset) -> Duration {
        other.0.saturating_sub(self.0)
    }
}

impl From<Duration> for Offset {
    fn from(d: Duration) -> Self {
        Offset::from_time_zero(d)
    }
}

impl From<Offset> for Duration {
    fn from(a: Offset) -> Self {
        a.since_time_zero()
    }
}

impl std::ops::Add<Duration> for Offset {
    type Output = Offset;
    fn add(self, rhs: Duration) -> Offset {
        Offset(self.0 + rhs)
    }
}

impl std::ops::Sub<Duration> for Offset {
    type Output = Offset;
    fn sub(self, rhs: Duration) -> Offset {
        Offset(self.0 - rhs)
    }
}

impl std::ops::Sub<Offset> for Offset {
    type Output = Duration;
    fn sub(self, rhs: Offset) -> Duration {
        self.0 - rhs.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn since_and_closed_since_differ_by_one() {
        let a = Offset::from_time_zero(41);
        assert_eq!(a.since_time_zero(), 41);
        assert_eq!(a.closed_since_time_zero(), 42);
    }

    #[test]
    fn round_trips_through_closed_from_time_zero() {
        let d = 17;
        let a = Offset::closed_from_time_zero(d);
        assert_eq!(a.closed_since_time_zero(), d);
    }

    #[test]
    fn time_ext_basics() {
        assert!(Duration::zero().is_zero());
        assert!(Duration::epsilon().is_non_zero());
        assert_eq!(Duration::epsilon(), 1);
        assert!(Service::none().is_none());
    }
}
