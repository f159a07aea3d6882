use std::fmt;

use crate::rule::{Bounds, Interval};

/// A compile-time integer constant.
///
/// Wherever a ranged operand is expected, `Int<N>` stands for the degenerate
/// range `[N, N]` in the other operand's representation. It is also the
/// amount of a fixed-point shift that moves the binary point.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Int<const N: i128>;

impl<const N: i128> Int<N> {
    pub const VALUE: i128 = N;
}

impl<const N: i128> Bounds for Int<N> {
    const SPAN: Interval = Interval::point(N);
}

impl<const N: i128> fmt::Debug for Int<N> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "int<{}>", N)
    }
}

/// `Int<N>` written as a value.
pub const fn int<const N: i128>() -> Int<N> {
    Int
}
