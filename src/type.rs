use std::cmp::Ordering;
use std::fmt::Debug;
use std::ops::Add;

use geo_traits::CoordTrait;
use num_traits::{Bounded, Num, NumCast, ToPrimitive};

/// A trait for types that can be used for indexed coordinates.
///
/// This trait is sealed and cannot be implemented for external types. Squared distances are
/// computed exactly in [`IndexableNum::Distance`], a type wide enough that neither the
/// coordinate difference nor its square can overflow: `i64` for 8 and 16 bit integers, `i128`
/// for 32 bit integers and `f64` for floats.
pub trait IndexableNum:
    private::Sealed
    + Num
    + NumCast
    + ToPrimitive
    + PartialOrd
    + Copy
    + Debug
    + Send
    + Sync
    + Bounded
{
    /// The type squared distances are computed and compared in.
    type Distance: Copy
        + PartialOrd
        + Debug
        + Send
        + Sync
        + ToPrimitive
        + Add<Output = Self::Distance>;

    /// `(a - b)²`, widened to [`IndexableNum::Distance`] before subtracting.
    fn square_difference(a: Self, b: Self) -> Self::Distance;

    /// Returns `false` for values that break the total order, i.e. NaN.
    #[inline]
    fn is_orderable(self) -> bool {
        self.partial_cmp(&self).is_some()
    }
}

impl IndexableNum for i8 {
    type Distance = i64;

    #[inline]
    fn square_difference(a: Self, b: Self) -> i64 {
        let d = <i64 as From<_>>::from(a) - <i64 as From<_>>::from(b);
        d * d
    }
}

impl IndexableNum for u8 {
    type Distance = i64;

    #[inline]
    fn square_difference(a: Self, b: Self) -> i64 {
        let d = <i64 as From<_>>::from(a) - <i64 as From<_>>::from(b);
        d * d
    }
}

impl IndexableNum for i16 {
    type Distance = i64;

    #[inline]
    fn square_difference(a: Self, b: Self) -> i64 {
        let d = <i64 as From<_>>::from(a) - <i64 as From<_>>::from(b);
        d * d
    }
}

impl IndexableNum for u16 {
    type Distance = i64;

    #[inline]
    fn square_difference(a: Self, b: Self) -> i64 {
        let d = <i64 as From<_>>::from(a) - <i64 as From<_>>::from(b);
        d * d
    }
}

// a 32 bit difference squares to 64 bits, and the sum of two of those needs one more
impl IndexableNum for i32 {
    type Distance = i128;

    #[inline]
    fn square_difference(a: Self, b: Self) -> i128 {
        let d = <i128 as From<_>>::from(a) - <i128 as From<_>>::from(b);
        d * d
    }
}

impl IndexableNum for u32 {
    type Distance = i128;

    #[inline]
    fn square_difference(a: Self, b: Self) -> i128 {
        let d = <i128 as From<_>>::from(a) - <i128 as From<_>>::from(b);
        d * d
    }
}

impl IndexableNum for f32 {
    type Distance = f64;

    #[inline]
    fn square_difference(a: Self, b: Self) -> f64 {
        let d = <f64 as From<_>>::from(a) - <f64 as From<_>>::from(b);
        d * d
    }
}

impl IndexableNum for f64 {
    type Distance = f64;

    #[inline]
    fn square_difference(a: Self, b: Self) -> f64 {
        let d = a - b;
        d * d
    }
}

/// A single planar point.
///
/// Points are ordered lexicographically, first by `x` and then by `y`. See [`Coord::cmp_xy`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coord<N: IndexableNum> {
    x: N,
    y: N,
}

impl<N: IndexableNum> Coord<N> {
    /// Create a new coordinate.
    pub fn new(x: N, y: N) -> Self {
        Self { x, y }
    }

    /// The total order over points: by `x`, then by `y`.
    ///
    /// Points whose coordinates cannot be ordered (NaN) compare as equal; such points are
    /// rejected before they ever reach a tree.
    pub fn cmp_xy(&self, other: &Self) -> Ordering {
        cmp_num(self.x, other.x).then_with(|| cmp_num(self.y, other.y))
    }

    /// Returns `true` if both coordinates are totally ordered.
    pub fn is_orderable(&self) -> bool {
        self.x.is_orderable() && self.y.is_orderable()
    }
}

impl<N: IndexableNum> From<(N, N)> for Coord<N> {
    fn from((x, y): (N, N)) -> Self {
        Self::new(x, y)
    }
}

impl<N: IndexableNum> From<[N; 2]> for Coord<N> {
    fn from([x, y]: [N; 2]) -> Self {
        Self::new(x, y)
    }
}

impl<N: IndexableNum> CoordTrait for Coord<N> {
    type T = N;

    fn dim(&self) -> geo_traits::Dimensions {
        geo_traits::Dimensions::Xy
    }

    fn x(&self) -> Self::T {
        self.x
    }

    fn y(&self) -> Self::T {
        self.y
    }

    fn nth_or_panic(&self, n: usize) -> Self::T {
        match n {
            0 => self.x,
            1 => self.y,
            _ => panic!("Invalid index of coord"),
        }
    }
}

#[inline]
pub(crate) fn cmp_num<N: IndexableNum>(a: N, b: N) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

// https://rust-lang.github.io/api-guidelines/future-proofing.html#sealed-traits-protect-against-downstream-implementations-c-sealed
mod private {
    pub trait Sealed {}

    impl Sealed for i8 {}
    impl Sealed for u8 {}
    impl Sealed for i16 {}
    impl Sealed for u16 {}
    impl Sealed for i32 {}
    impl Sealed for u32 {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
}
