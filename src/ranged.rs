use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::ops;

use tracing::debug;

use crate::constant::Int;
use crate::error::{Error, Result};
use crate::repr::{Promote, Promoted, Repr};
use crate::rule::{self, op, Binary, Bounds, Full, Lower, Span, Unary, Upper};

/// An integer whose bounds are part of its type.
///
/// Construction does not validate the value: the caller asserts that it lies
/// in range, and every later operation reasons from that. Arithmetic derives
/// the result bounds at build time and rejects results that could overflow
/// the promoted representation, or divisors that could be zero.
///
/// ```
/// use fixrange::{int, Rg};
///
/// let a = Rg::<u8, 0, 10>::new(7);
/// let b = a * int::<5>();
/// assert_eq!((b.get(), b.lo(), b.hi()), (35, 0, 50));
/// ```
///
/// ```compile_fail
/// use fixrange::Rg;
///
/// let a = Rg::<i32, -3, 4>::new(2);
/// let b = Rg::<i32, -2, 5>::new(3);
/// let _ = a / b;
/// ```
///
/// ```compile_fail
/// use fixrange::Rg;
///
/// let a = Rg::<u8, 0, 200>::new(150);
/// let b = Rg::<u8, 0, 100>::new(100);
/// let _ = a + b;
/// ```
pub struct Ranged<T, B = Full<T>> {
    base: T,
    bounds: PhantomData<B>,
}

pub type Rg<T, const LO: i128, const HI: i128> = Ranged<T, Span<LO, HI>>;

/// A full-range value of `T`.
pub fn ranged<T: Repr>(x: T) -> Ranged<T> {
    Ranged::new(x)
}

impl<T: Copy, B> Clone for Ranged<T, B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Copy, B> Copy for Ranged<T, B> {}

// Shift amounts must stay below the width of the shifted representation.
fn shift_amount<T: Repr, B: Bounds>(n: i128) -> usize {
    const {
        assert!(
            B::SPAN.lo >= 0 && B::SPAN.hi < T::WIDTH as i128,
            "shift amount must lie in [0, WIDTH)"
        )
    };
    n as usize
}

impl<T: Repr, B: Bounds> Ranged<T, B> {
    pub const LO: i128 = B::SPAN.lo;
    pub const HI: i128 = B::SPAN.hi;

    /// The value of a degenerate range.
    pub const VALUE: i128 = B::SPAN.constant();

    #[inline]
    pub fn new(base: T) -> Self {
        const {
            assert!(
                <Full<T> as Bounds>::SPAN.covers(B::SPAN),
                "range exceeds the representation"
            )
        };
        Ranged {
            base,
            bounds: PhantomData,
        }
    }

    pub fn try_new(base: T) -> Result<Self> {
        let value = base.wide();
        if !B::SPAN.contains(value) {
            debug!(value, lo = Self::LO, hi = Self::HI, "rejected out-of-range value");
            return Err(Error::OutOfRange {
                value,
                lo: Self::LO,
                hi: Self::HI,
            });
        }
        Ok(Self::new(base))
    }

    pub fn from_ranged<U: Repr, A: Bounds>(x: Ranged<U, A>) -> Self {
        const {
            assert!(
                B::SPAN.covers(A::SPAN),
                "source range exceeds the target range"
            )
        };
        Self::new(x.cast())
    }

    pub fn constant() -> Self {
        Self::new(T::narrow(Self::VALUE))
    }

    pub fn lowest() -> Ranged<T, Lower<B>> {
        Ranged::new(T::narrow(Self::LO))
    }

    pub fn highest() -> Ranged<T, Upper<B>> {
        Ranged::new(T::narrow(Self::HI))
    }

    #[inline]
    pub fn get(self) -> T {
        self.base
    }

    pub fn lo(self) -> i128 {
        Self::LO
    }

    pub fn hi(self) -> i128 {
        Self::HI
    }

    pub fn to<U: Repr>(self) -> U {
        const {
            assert!(
                <Full<U> as Bounds>::SPAN.covers(B::SPAN),
                "range exceeds the target integer"
            )
        };
        self.cast()
    }

    /// Unary plus.
    pub fn pos(self) -> Self {
        self
    }

    pub fn checked_div<R>(self, rhs: R) -> Result<<Self as ops::Div<R>>::Output>
    where
        R: Bounded,
        Self: ops::Div<R>,
    {
        if rhs.value() == 0 {
            debug!(dividend = ?self, "rejected ranged division by zero");
            return Err(Error::DivisionByZero);
        }
        Ok(self / rhs)
    }

    pub fn checked_rem<R>(self, rhs: R) -> Result<<Self as ops::Rem<R>>::Output>
    where
        R: Bounded,
        Self: ops::Rem<R>,
    {
        if rhs.value() == 0 {
            debug!(dividend = ?self, "rejected ranged remainder by zero");
            return Err(Error::DivisionByZero);
        }
        Ok(self % rhs)
    }

    /// Adds one. The result must stay in range, like any unchecked construction.
    pub fn increment(&mut self) {
        let next = self.value() + 1;
        debug_assert!(B::SPAN.contains(next), "increment leaves the range");
        *self = Self::new(T::narrow(next));
    }

    /// Subtracts one. The result must stay in range, like any unchecked construction.
    pub fn decrement(&mut self) {
        let next = self.value() - 1;
        debug_assert!(B::SPAN.contains(next), "decrement leaves the range");
        *self = Self::new(T::narrow(next));
    }

    pub fn post_increment(&mut self) -> Self {
        let old = *self;
        self.increment();
        old
    }

    pub fn post_decrement(&mut self) -> Self {
        let old = *self;
        self.decrement();
        old
    }

    #[inline]
    fn cast<R: Repr>(self) -> R {
        R::narrow(self.base.wide())
    }
}

impl<T: Repr, B: Bounds> Default for Ranged<T, B> {
    fn default() -> Self {
        Self::new(T::narrow(B::SPAN.clamp(0)))
    }
}

impl<T: Repr, B: Bounds> fmt::Debug for Ranged<T, B> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?} in {:?}", self.base, B::SPAN)
    }
}

impl<T: Repr> From<T> for Ranged<T> {
    fn from(x: T) -> Self {
        Self::new(x)
    }
}

macro_rules! export {
    ($($int:ty),+) => {
        $(
            impl<T: Repr, B: Bounds> From<Ranged<T, B>> for $int {
                fn from(x: Ranged<T, B>) -> $int {
                    x.to()
                }
            }
        )+
    }
}

export!(u8, u16, u32, u64, i8, i16, i32, i64);

/// An operand whose bounds are known at build time: a ranged integer or an
/// `Int<N>`.
pub trait Bounded: Copy {
    type Bounds: Bounds;

    fn value(self) -> i128;
}

impl<T: Repr, B: Bounds> Bounded for Ranged<T, B> {
    type Bounds = B;

    #[inline]
    fn value(self) -> i128 {
        self.base.wide()
    }
}

impl<const N: i128> Bounded for Int<N> {
    type Bounds = Self;

    #[inline]
    fn value(self) -> i128 {
        N
    }
}

impl<T: Repr, A: Bounds, R: Bounded> PartialEq<R> for Ranged<T, A> {
    fn eq(&self, other: &R) -> bool {
        let outcome = const { rule::eq_outcome::<A, R::Bounds>() };
        outcome.resolve(|| self.value() == other.value())
    }

    fn ne(&self, other: &R) -> bool {
        let outcome = const { rule::ne_outcome::<A, R::Bounds>() };
        outcome.resolve(|| self.value() != other.value())
    }
}

impl<T: Repr, B: Bounds> Eq for Ranged<T, B> {}

impl<T: Repr, A: Bounds, R: Bounded> PartialOrd<R> for Ranged<T, A> {
    fn partial_cmp(&self, other: &R) -> Option<Ordering> {
        Some(if self.lt(other) {
            Ordering::Less
        } else if self.eq(other) {
            Ordering::Equal
        } else {
            Ordering::Greater
        })
    }

    fn lt(&self, other: &R) -> bool {
        let outcome = const { rule::lt_outcome::<A, R::Bounds>() };
        outcome.resolve(|| self.value() < other.value())
    }

    fn le(&self, other: &R) -> bool {
        let outcome = const { rule::le_outcome::<A, R::Bounds>() };
        outcome.resolve(|| self.value() <= other.value())
    }

    fn gt(&self, other: &R) -> bool {
        let outcome = const { rule::gt_outcome::<A, R::Bounds>() };
        outcome.resolve(|| self.value() > other.value())
    }

    fn ge(&self, other: &R) -> bool {
        let outcome = const { rule::ge_outcome::<A, R::Bounds>() };
        outcome.resolve(|| self.value() >= other.value())
    }
}

impl<T: Repr, B: Bounds> Ord for Ranged<T, B> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.base.cmp(&other.base)
    }
}

impl<T: Repr, B: Bounds> Hash for Ranged<T, B> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.base.hash(state)
    }
}

impl<U: Repr, B: Bounds, const N: i128> PartialEq<Ranged<U, B>> for Int<N> {
    fn eq(&self, other: &Ranged<U, B>) -> bool {
        other == self
    }
}

impl<U: Repr, B: Bounds, const N: i128> PartialOrd<Ranged<U, B>> for Int<N> {
    fn partial_cmp(&self, other: &Ranged<U, B>) -> Option<Ordering> {
        other.partial_cmp(self).map(Ordering::reverse)
    }

    fn lt(&self, other: &Ranged<U, B>) -> bool {
        other > self
    }

    fn le(&self, other: &Ranged<U, B>) -> bool {
        other >= self
    }

    fn gt(&self, other: &Ranged<U, B>) -> bool {
        other < self
    }

    fn ge(&self, other: &Ranged<U, B>) -> bool {
        other <= self
    }
}

// An `Int<N>` operand takes the representation of the ranged side.
macro_rules! ranged_ops {
    ($($trait:ident, $method:ident;)+) => {
        $(
            impl<T, U, A, B> ops::$trait<Ranged<U, B>> for Ranged<T, A>
            where
                T: Promote<U>,
                U: Repr,
                A: Bounds,
                B: Bounds,
            {
                type Output = Ranged<Promoted<T, U>, Binary<op::$trait, A, B>>;

                #[inline]
                fn $method(self, rhs: Ranged<U, B>) -> Self::Output {
                    // Exact in i128; the result bounds make the narrowing lossless.
                    let raw = ops::$trait::$method(self.value(), rhs.value());
                    Ranged::new(<Promoted<T, U>>::narrow(raw))
                }
            }

            impl<T, A, const N: i128> ops::$trait<Int<N>> for Ranged<T, A>
            where
                T: Promote<T>,
                A: Bounds,
            {
                type Output = Ranged<Promoted<T, T>, Binary<op::$trait, A, Int<N>>>;

                #[inline]
                fn $method(self, _: Int<N>) -> Self::Output {
                    ops::$trait::$method(self, Ranged::<T, Int<N>>::constant())
                }
            }

            impl<U, B, const N: i128> ops::$trait<Ranged<U, B>> for Int<N>
            where
                U: Promote<U>,
                B: Bounds,
            {
                type Output = Ranged<Promoted<U, U>, Binary<op::$trait, Int<N>, B>>;

                #[inline]
                fn $method(self, rhs: Ranged<U, B>) -> Self::Output {
                    ops::$trait::$method(Ranged::<U, Int<N>>::constant(), rhs)
                }
            }
        )+
    }
}

ranged_ops! {
    Add, add;
    Sub, sub;
    Mul, mul;
    Div, div;
    Rem, rem;
    BitAnd, bitand;
    BitOr, bitor;
    BitXor, bitxor;
}

// Shifts keep the representation of the shifted operand.
macro_rules! shift_ops {
    ($($trait:ident, $method:ident;)+) => {
        $(
            impl<T, U, A, B> ops::$trait<Ranged<U, B>> for Ranged<T, A>
            where
                T: Repr,
                U: Repr,
                A: Bounds,
                B: Bounds,
            {
                type Output = Ranged<T, Binary<op::$trait, A, B>>;

                #[inline]
                fn $method(self, amount: Ranged<U, B>) -> Self::Output {
                    let n = shift_amount::<T, B>(amount.value());
                    Ranged::new(ops::$trait::$method(self.base, n))
                }
            }

            impl<T, A, const N: i128> ops::$trait<Int<N>> for Ranged<T, A>
            where
                T: Repr,
                A: Bounds,
            {
                type Output = Ranged<T, Binary<op::$trait, A, Int<N>>>;

                #[inline]
                fn $method(self, _: Int<N>) -> Self::Output {
                    let n = shift_amount::<T, Int<N>>(N);
                    Ranged::new(ops::$trait::$method(self.base, n))
                }
            }

            impl<U, B, const N: i128> ops::$trait<Ranged<U, B>> for Int<N>
            where
                U: Repr,
                B: Bounds,
            {
                type Output = Ranged<U, Binary<op::$trait, Int<N>, B>>;

                #[inline]
                fn $method(self, amount: Ranged<U, B>) -> Self::Output {
                    ops::$trait::$method(Ranged::<U, Int<N>>::constant(), amount)
                }
            }
        )+
    }
}

shift_ops! {
    Shl, shl;
    Shr, shr;
}

impl<T: Repr + ops::Neg<Output = T>, B: Bounds> ops::Neg for Ranged<T, B> {
    type Output = Ranged<T, Unary<op::Neg, B, T>>;

    fn neg(self) -> Self::Output {
        Ranged::new(-self.base)
    }
}

impl<T: Repr, B: Bounds> ops::Not for Ranged<T, B> {
    type Output = Ranged<T, Unary<op::Not, B, T>>;

    fn not(self) -> Self::Output {
        Ranged::new(!self.base)
    }
}

macro_rules! compound_ops {
    ($($assign:ident, $assign_method:ident => $trait:ident, $method:ident;)+) => {
        $(
            impl<T, A, Rhs, R, B> ops::$assign<Rhs> for Ranged<T, A>
            where
                T: Repr,
                A: Bounds,
                R: Repr,
                B: Bounds,
                Ranged<T, A>: ops::$trait<Rhs, Output = Ranged<R, B>>,
            {
                #[inline]
                fn $assign_method(&mut self, rhs: Rhs) {
                    *self = Self::from_ranged(ops::$trait::$method(*self, rhs));
                }
            }
        )+
    }
}

compound_ops! {
    AddAssign, add_assign => Add, add;
    SubAssign, sub_assign => Sub, sub;
    MulAssign, mul_assign => Mul, mul;
    DivAssign, div_assign => Div, div;
    RemAssign, rem_assign => Rem, rem;
    BitAndAssign, bitand_assign => BitAnd, bitand;
    BitOrAssign, bitor_assign => BitOr, bitor;
    BitXorAssign, bitxor_assign => BitXor, bitxor;
    ShlAssign, shl_assign => Shl, shl;
    ShrAssign, shr_assign => Shr, shr;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constant::int;
    use static_assertions::{assert_type_eq_all, const_assert, const_assert_eq};

    type Out<L, R> = <L as ops::Mul<R>>::Output;

    const_assert_eq!(<Out<Rg<u8, 0, 10>, Rg<u8, 5, 5>>>::LO, 0);
    const_assert_eq!(<Out<Rg<u8, 0, 10>, Rg<u8, 5, 5>>>::HI, 50);
    const_assert_eq!(<<Rg<i16, -3, 4> as ops::Sub<Int<5>>>::Output>::LO, -8);
    const_assert_eq!(<<Rg<u32, 1, 3> as ops::Shl<Rg<u8, 2, 4>>>::Output>::HI, 48);
    const_assert_eq!(<<Rg<i8, -5, 7> as ops::Neg>::Output>::LO, -7);
    const_assert_eq!(<<Rg<u8, 0, 15> as ops::Not>::Output>::LO, 240);
    const_assert_eq!(Rg::<u16, 7, 7>::VALUE, 7);
    const_assert_eq!(Ranged::<i64, Int<-3>>::VALUE, -3);
    const_assert!(<Ranged<u8>>::HI == 255);

    assert_type_eq_all!(
        <Rg<u8, 0, 10> as ops::Add<Rg<i32, -1, 1>>>::Output,
        Ranged<i32, Binary<op::Add, Span<0, 10>, Span<-1, 1>>>
    );
    assert_type_eq_all!(
        <Rg<u16, 0, 10> as ops::Shr<Rg<u64, 0, 2>>>::Output,
        Ranged<u16, Binary<op::Shr, Span<0, 10>, Span<0, 2>>>
    );

    #[test]
    fn multiplication_widens_bounds() {
        let a = Rg::<u8, 0, 10>::new(10);
        let b = Rg::<u8, 5, 5>::constant();
        let c = a * b;
        assert_eq!(c.get(), 50u8);
        assert_eq!((c.lo(), c.hi()), (0, 50));
    }

    #[test]
    fn known_comparisons_skip_the_values() {
        // Out-of-contract bases: only the bounds decide.
        let a = Rg::<u8, 0, 4>::new(9);
        let b = Rg::<u8, 5, 9>::new(0);
        assert!(a < b);
        assert!(a <= b);
        assert!(a != b);
        assert!(!(a >= b));
        assert_eq!(rule::lt_outcome::<Span<0, 4>, Span<5, 9>>(), crate::tri::AlwaysTrue);
    }

    #[test]
    fn overlapping_comparisons_read_the_values() {
        let a = Rg::<i32, -5, 5>::new(2);
        let b = Rg::<u8, 0, 9>::new(2);
        assert!(a == b);
        assert!(a <= b);
        assert!(!(a < b));
        assert!(Rg::<i32, -5, 5>::new(-1) < b);
        assert_eq!(a.partial_cmp(&b), Some(Ordering::Equal));
    }

    #[test]
    fn constants_compare_on_either_side() {
        let a = Rg::<u8, 0, 9>::new(3);
        assert!(a == int::<3>());
        assert!(int::<3>() == a);
        assert!(a < int::<4>());
        assert!(int::<4>() > a);
        assert!(a != int::<300>());
        assert!(int::<-1>() < a);
    }

    #[test]
    fn arithmetic_with_constants() {
        let a = Rg::<i16, -3, 4>::new(4);
        let b = a - int::<5>();
        assert_eq!((b.get(), b.lo(), b.hi()), (-1, -8, -1));
        let c = int::<10>() - a;
        assert_eq!((c.get(), c.lo(), c.hi()), (6, 6, 13));
        let d = int::<1>() << Rg::<u32, 0, 3>::new(3);
        assert_eq!((d.get(), d.hi()), (8u32, 8));
        let e = a >> int::<1>();
        assert_eq!((e.get(), e.lo(), e.hi()), (2, -2, 2));
    }

    #[test]
    fn division_and_remainder() {
        let a = Rg::<i32, 0, 10>::new(6);
        let b = Rg::<i32, 2, 5>::new(4);
        let q = a / b;
        assert_eq!((q.get(), q.lo(), q.hi()), (1, 0, 5));
        let r = a % b;
        assert_eq!((r.get(), r.lo(), r.hi()), (2, 0, 4));
        assert_eq!(a.checked_div(Rg::<i32, 2, 5>::new(0)), Err(Error::DivisionByZero));
        assert_eq!(a.checked_rem(b).map(Ranged::get), Ok(2));
    }

    #[test]
    fn remainder_of_the_lowest_value_by_minus_one() {
        let r = Rg::<i8, -128, 0>::new(-128) % Rg::<i8, -1, -1>::constant();
        assert_eq!((r.get(), r.lo(), r.hi()), (0, 0, 0));
        let q = Rg::<i64, { i64::MIN as i128 }, 0>::new(i64::MIN) % int::<-1>();
        assert_eq!(q.get(), 0);
    }

    #[test]
    fn mixed_signedness_uses_exact_values() {
        let q = Rg::<i8, -1, 0>::new(-1) / Rg::<u8, 2, 2>::constant();
        assert_eq!((q.get(), q.lo(), q.hi()), (0u8, 0, 0));
        let s = Rg::<i8, -3, 0>::new(-3) + Rg::<u16, 5, 9>::new(9);
        assert_eq!((s.get(), s.lo(), s.hi()), (6u16, 2, 9));
    }

    #[test]
    fn bitwise_operators() {
        let a = Rg::<u8, 0, 12>::new(12);
        let b = Rg::<u8, 0, 10>::new(10);
        assert_eq!((a & b).get(), 8);
        assert_eq!((a | b).get(), 14);
        assert_eq!((a ^ b).get(), 6);
        let n = !Rg::<u8, 0, 15>::new(3);
        assert_eq!((n.get(), n.lo(), n.hi()), (252, 240, 255));
        let m = -Rg::<i8, -5, 7>::new(-5);
        assert_eq!((m.get(), m.lo(), m.hi()), (5, -7, 5));
    }

    #[test]
    fn conversions() {
        let a = Rg::<i64, 0, 200>::new(180);
        let b: u8 = a.to();
        assert_eq!(b, 180);
        assert_eq!(i16::from(a), 180);
        let c = Rg::<u8, 0, 255>::from_ranged(a);
        assert_eq!(c.get(), 180u8);
        assert_eq!(ranged(7u16).hi(), 65535);
        assert_eq!(Ranged::from(-2i8).lo(), -128);
    }

    #[test]
    fn checked_construction() {
        assert_eq!(Rg::<u8, 1, 6>::try_new(6).map(Ranged::get), Ok(6));
        assert_eq!(
            Rg::<u8, 1, 6>::try_new(7),
            Err(Error::OutOfRange {
                value: 7,
                lo: 1,
                hi: 6
            })
        );
    }

    #[test]
    fn default_is_nearest_to_zero() {
        assert_eq!(Rg::<i32, -5, 5>::default().get(), 0);
        assert_eq!(Rg::<u8, 3, 9>::default().get(), 3);
        assert_eq!(Rg::<i16, -9, -4>::default().get(), -4);
    }

    #[test]
    fn limits() {
        let lo = Rg::<i32, -4, 17>::lowest();
        let hi = Rg::<i32, -4, 17>::highest();
        assert_eq!((lo.get(), lo.lo(), lo.hi()), (-4, -4, -4));
        assert_eq!((hi.get(), hi.lo(), hi.hi()), (17, 17, 17));
        assert!(lo < hi);
    }

    #[test]
    fn compound_assignment_rebinds() {
        let mut acc = Rg::<u32, 0, 100>::new(10);
        acc += Rg::<u8, 0, 0>::new(0);
        acc -= Rg::<u32, 0, 0>::constant();
        acc >>= int::<1>();
        assert_eq!(acc.get(), 5);
        acc &= Rg::<u32, 0, 7>::new(6);
        assert_eq!(acc.get(), 4);
        acc %= Rg::<u32, 3, 3>::constant();
        assert_eq!(acc.get(), 1);
    }

    #[test]
    fn stepping() {
        let mut i = Rg::<i32, -2, 2>::new(0);
        i.increment();
        assert_eq!(i.post_increment().get(), 1);
        assert_eq!(i.get(), 2);
        i.decrement();
        i.decrement();
        i.decrement();
        assert_eq!(i.post_decrement().get(), -1);
        assert_eq!(i.get(), -2);
    }

    #[test]
    fn stepping_up_to_the_representation_limit() {
        let mut x = ranged(254u8);
        x.increment();
        assert_eq!(x.get(), 255);
        let mut y = Rg::<i8, -128, 127>::new(-127);
        assert_eq!(y.post_decrement().get(), -127);
        assert_eq!(y.get(), -128);
    }

    #[test]
    fn debug_shows_the_bounds() {
        assert_eq!(format!("{:?}", Rg::<i8, -3, 3>::new(2)), "2 in [-3, 3]");
    }
}
