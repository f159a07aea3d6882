//! Build-time propagation of metadata through operators.
//!
//! Each operand type carries a zero-sized descriptor: an [`Exponent`] for
//! fixed-point values, a [`Bounds`] for ranged integers. The result of an
//! operator is described by `Binary<Op, A, B>` (or `Unary<Op, A, T>`), whose
//! associated constant is derived from the operands' constants by the rule
//! registered for `Op` in that family. Nothing here runs at runtime; a rule
//! that cannot be satisfied panics during const evaluation, which rejects the
//! program.

use std::cmp::Ordering;
use std::fmt;
use std::marker::PhantomData;

use crate::repr::Repr;
use crate::tri::Tri;

/// Operator tags.
pub mod op {
    pub enum Add {}
    pub enum Sub {}
    pub enum Mul {}
    pub enum Div {}
    pub enum Rem {}
    pub enum BitAnd {}
    pub enum BitOr {}
    pub enum BitXor {}
    pub enum Shl {}
    pub enum Shr {}
    pub enum Eq {}
    pub enum Lt {}
    pub enum Neg {}
    pub enum Not {}
}

/// Bounds metadata of a ranged integer.
pub trait Bounds {
    const SPAN: Interval;
}

/// Exponent metadata of a fixed-point value: the number of fractional bits.
pub trait Exponent {
    const FRAC: i32;
}

/// Tri-state verdict of a comparison rule.
pub trait Verdict {
    const OUTCOME: Tri;
}

pub struct Span<const LO: i128, const HI: i128>;

impl<const LO: i128, const HI: i128> Bounds for Span<LO, HI> {
    const SPAN: Interval = Interval::new(LO, HI);
}

/// The natural range of `T`.
pub struct Full<T>(PhantomData<T>);

impl<T: Repr> Bounds for Full<T> {
    const SPAN: Interval = Interval::new(T::LOWEST, T::HIGHEST);
}

/// The degenerate range at the low bound of `B`.
pub struct Lower<B>(PhantomData<B>);

impl<B: Bounds> Bounds for Lower<B> {
    const SPAN: Interval = Interval::point(B::SPAN.lo);
}

/// The degenerate range at the high bound of `B`.
pub struct Upper<B>(PhantomData<B>);

impl<B: Bounds> Bounds for Upper<B> {
    const SPAN: Interval = Interval::point(B::SPAN.hi);
}

pub struct Exp<const F: i32>;

impl<const F: i32> Exponent for Exp<F> {
    const FRAC: i32 = F;
}

/// Result metadata of `A <Op> B`.
pub struct Binary<Op, A, B>(PhantomData<(Op, A, B)>);

/// Result metadata of `<Op> A`, for a representation `T`.
pub struct Unary<Op, A, T>(PhantomData<(Op, A, T)>);

const fn checked(x: Option<i128>) -> i128 {
    match x {
        Some(x) => x,
        None => panic!("range bound overflows i128"),
    }
}

const fn min(a: i128, b: i128) -> i128 {
    if a < b {
        a
    } else {
        b
    }
}

const fn max(a: i128, b: i128) -> i128 {
    if a > b {
        a
    } else {
        b
    }
}

/// A closed interval `[lo, hi]` of integers.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Interval {
    pub lo: i128,
    pub hi: i128,
}

impl fmt::Debug for Interval {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}, {}]", self.lo, self.hi)
    }
}

impl Interval {
    pub const fn new(lo: i128, hi: i128) -> Interval {
        assert!(lo <= hi, "please fix your low and max values");
        Interval { lo, hi }
    }

    pub const fn point(value: i128) -> Interval {
        Interval { lo: value, hi: value }
    }

    pub const fn is_point(self) -> bool {
        self.lo == self.hi
    }

    /// The single value of a degenerate interval.
    pub const fn constant(self) -> i128 {
        assert!(self.is_point(), "expected a known constant");
        self.lo
    }

    pub const fn contains(self, value: i128) -> bool {
        self.lo <= value && value <= self.hi
    }

    pub const fn covers(self, other: Interval) -> bool {
        self.lo <= other.lo && other.hi <= self.hi
    }

    pub const fn excludes_zero(self) -> bool {
        self.hi < 0 || self.lo > 0
    }

    /// The member closest to `value`.
    pub const fn clamp(self, value: i128) -> i128 {
        max(self.lo, min(self.hi, value))
    }

    // Hull of four candidate extrema.
    const fn corners(a: i128, b: i128, c: i128, d: i128) -> Interval {
        Interval {
            lo: min(min(a, b), min(c, d)),
            hi: max(max(a, b), max(c, d)),
        }
    }

    // Smallest power of two `p` such that `[-p, p)` holds the interval.
    const fn reach(self) -> i128 {
        let mag = max(self.hi, -(self.lo + 1));
        if mag == 0 {
            1
        } else {
            1 << (128 - mag.leading_zeros())
        }
    }

    pub const fn sum(self, other: Interval) -> Interval {
        Interval {
            lo: checked(self.lo.checked_add(other.lo)),
            hi: checked(self.hi.checked_add(other.hi)),
        }
    }

    pub const fn difference(self, other: Interval) -> Interval {
        Interval {
            lo: checked(self.lo.checked_sub(other.hi)),
            hi: checked(self.hi.checked_sub(other.lo)),
        }
    }

    pub const fn product(self, other: Interval) -> Interval {
        Interval::corners(
            checked(self.lo.checked_mul(other.lo)),
            checked(self.lo.checked_mul(other.hi)),
            checked(self.hi.checked_mul(other.lo)),
            checked(self.hi.checked_mul(other.hi)),
        )
    }

    pub const fn quotient(self, other: Interval) -> Interval {
        assert!(other.excludes_zero(), "divisor range may not contain zero");
        Interval::corners(
            checked(self.lo.checked_div(other.lo)),
            checked(self.lo.checked_div(other.hi)),
            checked(self.hi.checked_div(other.lo)),
            checked(self.hi.checked_div(other.hi)),
        )
    }

    /// Truncating remainder: the sign follows the dividend.
    pub const fn remainder(self, other: Interval) -> Interval {
        assert!(other.excludes_zero(), "divisor range may not contain zero");
        let reach = if other.lo > 0 {
            other.hi - 1
        } else {
            checked(other.lo.checked_neg()) - 1
        };
        Interval {
            lo: if self.lo >= 0 { 0 } else { max(self.lo, -reach) },
            hi: if self.hi <= 0 { 0 } else { min(self.hi, reach) },
        }
    }

    pub const fn bit_and(self, other: Interval) -> Interval {
        match (self.lo >= 0, other.lo >= 0) {
            (true, true) => Interval::new(0, min(self.hi, other.hi)),
            (true, false) => Interval::new(0, self.hi),
            (false, true) => Interval::new(0, other.hi),
            (false, false) => {
                let p = max(self.reach(), other.reach());
                Interval::new(-p, p - 1)
            }
        }
    }

    pub const fn bit_or(self, other: Interval) -> Interval {
        let p = max(self.reach(), other.reach());
        if self.lo >= 0 && other.lo >= 0 {
            Interval::new(max(self.lo, other.lo), p - 1)
        } else {
            Interval::new(-p, p - 1)
        }
    }

    pub const fn bit_xor(self, other: Interval) -> Interval {
        let p = max(self.reach(), other.reach());
        if self.lo >= 0 && other.lo >= 0 {
            Interval::new(0, p - 1)
        } else {
            Interval::new(-p, p - 1)
        }
    }

    /// Shifts every value left by every amount in `amount`.
    pub const fn shift_left(self, amount: Interval) -> Interval {
        assert!(amount.lo >= 0, "shift amount may be negative");
        assert!(amount.hi < 127, "shift amount exceeds the metadata width");
        let (near, far) = (1i128 << amount.lo, 1i128 << amount.hi);
        Interval::corners(
            checked(self.lo.checked_mul(near)),
            checked(self.lo.checked_mul(far)),
            checked(self.hi.checked_mul(near)),
            checked(self.hi.checked_mul(far)),
        )
    }

    /// Arithmetic (flooring) shift of every value right by every amount in `amount`.
    pub const fn shift_right(self, amount: Interval) -> Interval {
        assert!(amount.lo >= 0, "shift amount may be negative");
        assert!(amount.hi < 127, "shift amount exceeds the metadata width");
        Interval::corners(
            self.lo >> amount.lo,
            self.lo >> amount.hi,
            self.hi >> amount.lo,
            self.hi >> amount.hi,
        )
    }

    pub const fn negated(self) -> Interval {
        Interval {
            lo: checked(self.hi.checked_neg()),
            hi: checked(self.lo.checked_neg()),
        }
    }

    /// Bitwise complement within a representation of the given signedness.
    pub const fn inverted(self, signed: bool, highest: i128) -> Interval {
        if signed {
            Interval {
                lo: -1 - self.hi,
                hi: -1 - self.lo,
            }
        } else {
            Interval {
                lo: highest - self.hi,
                hi: highest - self.lo,
            }
        }
    }

    pub const fn eq_outcome(self, other: Interval) -> Tri {
        Tri::from_flags(
            self.is_point() && other.is_point() && self.lo == other.lo,
            self.lo > other.hi || self.hi < other.lo,
        )
    }

    pub const fn lt_outcome(self, other: Interval) -> Tri {
        Tri::from_flags(self.hi < other.lo, self.lo >= other.hi)
    }
}

macro_rules! bounds_rules {
    ($($op:ident => $rule:ident;)+) => {
        $(
            impl<A: Bounds, B: Bounds> Bounds for Binary<op::$op, A, B> {
                const SPAN: Interval = A::SPAN.$rule(B::SPAN);
            }
        )+
    }
}

bounds_rules! {
    Add => sum;
    Sub => difference;
    Mul => product;
    Div => quotient;
    Rem => remainder;
    BitAnd => bit_and;
    BitOr => bit_or;
    BitXor => bit_xor;
    Shl => shift_left;
    Shr => shift_right;
}

impl<A: Bounds, T> Bounds for Unary<op::Neg, A, T> {
    const SPAN: Interval = A::SPAN.negated();
}

impl<A: Bounds, T: Repr> Bounds for Unary<op::Not, A, T> {
    const SPAN: Interval = A::SPAN.inverted(T::SIGNED, T::HIGHEST);
}

impl<A: Bounds, B: Bounds> Verdict for Binary<op::Eq, A, B> {
    const OUTCOME: Tri = A::SPAN.eq_outcome(B::SPAN);
}

impl<A: Bounds, B: Bounds> Verdict for Binary<op::Lt, A, B> {
    const OUTCOME: Tri = A::SPAN.lt_outcome(B::SPAN);
}

const fn max_frac(a: i32, b: i32) -> i32 {
    if a > b {
        a
    } else {
        b
    }
}

macro_rules! exponent_rules {
    ($($op:ident => |$a:ident, $b:ident| $frac:expr;)+) => {
        $(
            impl<A: Exponent, B: Exponent> Exponent for Binary<op::$op, A, B> {
                const FRAC: i32 = {
                    let ($a, $b) = (A::FRAC, B::FRAC);
                    $frac
                };
            }
        )+
    }
}

exponent_rules! {
    Add => |a, b| max_frac(a, b);
    Sub => |a, b| max_frac(a, b);
    Rem => |a, b| max_frac(a, b);
    BitAnd => |a, b| max_frac(a, b);
    BitOr => |a, b| max_frac(a, b);
    BitXor => |a, b| max_frac(a, b);
    Mul => |a, b| a + b;
    Div => |a, b| a - b;
}

// Shifting by a known amount moves the binary point instead of the bits. The
// amount is a degenerate range, the same descriptor ranged shifts consume.
const fn shift_amount(amount: Interval) -> i32 {
    let n = amount.constant();
    assert!(n > -64 && n < 64, "shift amount exceeds the exponent range");
    n as i32
}

impl<A: Exponent, B: Bounds> Exponent for Binary<op::Shl, A, B> {
    const FRAC: i32 = A::FRAC - shift_amount(B::SPAN);
}

impl<A: Exponent, B: Bounds> Exponent for Binary<op::Shr, A, B> {
    const FRAC: i32 = A::FRAC + shift_amount(B::SPAN);
}

impl<A: Exponent, T> Exponent for Unary<op::Neg, A, T> {
    const FRAC: i32 = A::FRAC;
}

impl<A: Exponent, T> Exponent for Unary<op::Not, A, T> {
    const FRAC: i32 = A::FRAC;
}

pub const fn eq_outcome<A: Bounds, B: Bounds>() -> Tri {
    A::SPAN.eq_outcome(B::SPAN)
}

pub const fn lt_outcome<A: Bounds, B: Bounds>() -> Tri {
    A::SPAN.lt_outcome(B::SPAN)
}

pub const fn ne_outcome<A: Bounds, B: Bounds>() -> Tri {
    eq_outcome::<A, B>().not()
}

pub const fn le_outcome<A: Bounds, B: Bounds>() -> Tri {
    eq_outcome::<A, B>().or(lt_outcome::<A, B>())
}

pub const fn gt_outcome<A: Bounds, B: Bounds>() -> Tri {
    le_outcome::<A, B>().not()
}

pub const fn ge_outcome<A: Bounds, B: Bounds>() -> Tri {
    lt_outcome::<A, B>().not()
}

/// Compares `a * 2^-fa` with `b * 2^-fb` exactly.
///
/// Both mantissas must fit 64 bits and both exponents must lie in `(-64, 64)`.
pub fn cmp_scaled(a: i128, fa: i32, b: i128, fb: i32) -> Ordering {
    if fa < fb {
        return cmp_scaled(b, fb, a, fa).reverse();
    }
    let d = (fa - fb) as u32;
    let q = a >> d;
    match q.cmp(&b) {
        // `a` had bits below the coarser scale.
        Ordering::Equal if a != q << d => Ordering::Greater,
        ord => ord,
    }
}

/// Multiplies `value` by `2^by`, truncating toward zero when `by` is negative.
pub fn scale(value: i128, by: i32) -> i128 {
    if by >= 0 {
        value << by as u32
    } else {
        value / (1i128 << by.unsigned_abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tri::*;
    use proptest::prelude::*;
    use static_assertions::const_assert_eq;

    const_assert_eq!(<Binary<op::Add, Exp<10>, Exp<8>>>::FRAC, 10);
    const_assert_eq!(<Binary<op::Sub, Exp<12>, Exp<6>>>::FRAC, 12);
    const_assert_eq!(<Binary<op::Mul, Exp<12>, Exp<6>>>::FRAC, 18);
    const_assert_eq!(<Binary<op::Div, Exp<12>, Exp<4>>>::FRAC, 8);
    const_assert_eq!(<Binary<op::Rem, Exp<12>, Exp<6>>>::FRAC, 12);
    const_assert_eq!(<Binary<op::BitOr, Exp<5>, Exp<13>>>::FRAC, 13);
    const_assert_eq!(<Binary<op::BitXor, Exp<-3>, Exp<-2>>>::FRAC, -2);
    const_assert_eq!(<Binary<op::Shl, Exp<8>, Span<2, 2>>>::FRAC, 6);
    const_assert_eq!(<Binary<op::Shr, Exp<8>, Span<2, 2>>>::FRAC, 10);

    const_assert_eq!(<Binary<op::Mul, Span<0, 10>, Span<5, 5>>>::SPAN.lo, 0);
    const_assert_eq!(<Binary<op::Mul, Span<0, 10>, Span<5, 5>>>::SPAN.hi, 50);

    fn iv(lo: i128, hi: i128) -> Interval {
        Interval::new(lo, hi)
    }

    #[test]
    fn monotone_rules() {
        assert_eq!(iv(1, 2).sum(iv(10, 20)), iv(11, 22));
        assert_eq!(iv(1, 2).difference(iv(10, 20)), iv(-19, -8));
    }

    #[test]
    fn product_searches_all_corners() {
        assert_eq!(iv(-3, 2).product(iv(-5, 4)), iv(-12, 15));
        assert_eq!(iv(0, 10).product(iv(5, 5)), iv(0, 50));
    }

    #[test]
    fn quotient_of_signed_ranges() {
        assert_eq!(iv(-7, 9).quotient(iv(2, 3)), iv(-3, 4));
        assert_eq!(iv(-7, 9).quotient(iv(-3, -2)), iv(-4, 3));
    }

    #[test]
    #[should_panic(expected = "divisor range may not contain zero")]
    fn quotient_rejects_straddling_divisor() {
        iv(-3, 4).quotient(iv(-2, 5));
    }

    #[test]
    #[should_panic(expected = "divisor range may not contain zero")]
    fn quotient_rejects_zero_endpoint() {
        iv(1, 4).quotient(iv(0, 5));
    }

    #[test]
    fn remainder_follows_dividend_sign() {
        assert_eq!(iv(-7, -3).remainder(iv(2, 2)), iv(-1, 0));
        assert_eq!(iv(3, 5).remainder(iv(10, 10)), iv(0, 5));
        assert_eq!(iv(-100, 100).remainder(iv(-8, -3)), iv(-7, 7));
    }

    #[test]
    fn shifts_by_ranges() {
        assert_eq!(iv(1, 3).shift_left(iv(0, 2)), iv(1, 12));
        assert_eq!(iv(-4, 3).shift_left(iv(1, 2)), iv(-16, 12));
        assert_eq!(iv(-16, 16).shift_right(iv(1, 3)), iv(-8, 8));
    }

    #[test]
    #[should_panic(expected = "shift amount may be negative")]
    fn negative_shift_amount_is_rejected() {
        iv(0, 1).shift_left(iv(-1, 1));
    }

    #[test]
    fn inverted_depends_on_signedness() {
        assert_eq!(iv(0, 10).inverted(true, 127), iv(-11, -1));
        assert_eq!(iv(0, 10).inverted(false, 255), iv(245, 255));
    }

    #[test]
    #[should_panic(expected = "please fix your low and max values")]
    fn malformed_interval() {
        iv(3, 2);
    }

    #[test]
    fn comparison_verdicts() {
        assert_eq!(lt_outcome::<Span<0, 4>, Span<5, 9>>(), AlwaysTrue);
        assert_eq!(lt_outcome::<Span<5, 9>, Span<0, 5>>(), AlwaysFalse);
        assert_eq!(lt_outcome::<Span<0, 5>, Span<5, 9>>(), DependsOnValue);
        assert_eq!(eq_outcome::<Span<3, 3>, Span<3, 3>>(), AlwaysTrue);
        assert_eq!(eq_outcome::<Span<0, 2>, Span<3, 3>>(), AlwaysFalse);
        assert_eq!(ne_outcome::<Span<0, 2>, Span<3, 3>>(), AlwaysTrue);
        assert_eq!(le_outcome::<Span<0, 4>, Span<4, 4>>(), DependsOnValue);
        assert_eq!(ge_outcome::<Span<5, 9>, Span<0, 5>>(), AlwaysTrue);
        assert_eq!(gt_outcome::<Span<0, 4>, Span<5, 9>>(), AlwaysFalse);
    }

    #[test]
    fn scaled_comparison_is_exact() {
        // 8.25 at 10 and 8 fractional bits.
        assert_eq!(cmp_scaled(8448, 10, 2112, 8), Ordering::Equal);
        assert_eq!(cmp_scaled(8449, 10, 2112, 8), Ordering::Greater);
        assert_eq!(cmp_scaled(-8449, 10, -2112, 8), Ordering::Less);
        assert_eq!(cmp_scaled(1, 63, 0, -63), Ordering::Greater);
        assert_eq!(cmp_scaled(-1, 63, 0, -63), Ordering::Less);
    }

    #[test]
    fn scale_truncates_toward_zero() {
        assert_eq!(scale(3, 2), 12);
        assert_eq!(scale(7, -1), 3);
        assert_eq!(scale(-7, -1), -3);
    }

    fn interval() -> impl Strategy<Value = Interval> {
        (-300i128..300, 0i128..300).prop_map(|(lo, width)| iv(lo, lo + width))
    }

    fn member(i: Interval) -> impl Strategy<Value = i128> {
        i.lo..=i.hi
    }

    fn sample() -> impl Strategy<Value = (Interval, i128, Interval, i128)> {
        (interval(), interval())
            .prop_flat_map(|(a, b)| (Just(a), member(a), Just(b), member(b)))
    }

    proptest! {
        #[test]
        fn arithmetic_bounds_are_sound((a, x, b, y) in sample()) {
            prop_assert!(a.sum(b).contains(x + y));
            prop_assert!(a.difference(b).contains(x - y));
            prop_assert!(a.product(b).contains(x * y));
            prop_assert!(a.bit_and(b).contains(x & y));
            prop_assert!(a.bit_or(b).contains(x | y));
            prop_assert!(a.bit_xor(b).contains(x ^ y));
            prop_assert!(a.negated().contains(-x));
            prop_assert!(a.inverted(true, 0).contains(!x));
            if b.excludes_zero() {
                prop_assert!(a.quotient(b).contains(x / y));
                prop_assert!(a.remainder(b).contains(x % y));
            }
        }

        #[test]
        fn shift_bounds_are_sound(a in interval(), lo in 0i128..6, width in 0i128..6, pick in 0.0f64..=1.0) {
            let amount = iv(lo, lo + width);
            let s = lo + (pick * width as f64) as i128;
            for x in [a.lo, a.hi, (a.lo + a.hi) / 2] {
                prop_assert!(a.shift_left(amount).contains(x << s));
                prop_assert!(a.shift_right(amount).contains(x >> s));
            }
        }

        #[test]
        fn verdicts_are_sound((a, x, b, y) in sample()) {
            match a.eq_outcome(b) {
                AlwaysTrue => prop_assert!(x == y),
                AlwaysFalse => prop_assert!(x != y),
                DependsOnValue => {}
            }
            match a.lt_outcome(b) {
                AlwaysTrue => prop_assert!(x < y),
                AlwaysFalse => prop_assert!(x >= y),
                DependsOnValue => {}
            }
        }

        #[test]
        fn scaled_comparison_matches_rationals(a in -5000i128..5000, fa in -8i32..8, b in -5000i128..5000, fb in -8i32..8) {
            // Bring both sides to 2^-16 where every operand is exact.
            let lhs = a << (16 - fa) as u32;
            let rhs = b << (16 - fb) as u32;
            prop_assert_eq!(cmp_scaled(a, fa, b, fb), lhs.cmp(&rhs));
        }
    }
}
