use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::ops;

use num_traits::{AsPrimitive, Zero};
use tracing::debug;

use crate::constant::Int;
use crate::error::{Error, Result};
use crate::repr::{Promote, Promoted, Repr};
use crate::rule::{self, op, Binary, Exp, Exponent, Unary};

/// A binary fixed-point number: `mantissa * 2^-E::FRAC`.
///
/// The number of fractional bits is part of the type. Operators compute the
/// result's fractional bits and representation at build time; only the
/// mantissa exists at runtime.
///
/// ```
/// use fixrange::Fx;
///
/// let a = Fx::<u32, 4>::from_f64(4.75);
/// let b = Fx::<u32, 8>::from_f64(5.25);
/// let c = a * b;
/// assert_eq!(c.to_f64(), 24.9375);
/// assert_eq!(c, Fx::<u32, 10>::from_f64(24.9375));
/// ```
///
/// Narrowing exports must be spelled out with [`Fixed::truncate`]:
///
/// ```compile_fail
/// use fixrange::Fx;
///
/// let x = Fx::<u32, 0>::from_int(70_000u32);
/// let _: u16 = x.to_int();
/// ```
///
/// So are imports that could lose high bits:
///
/// ```compile_fail
/// use fixrange::Fx;
///
/// let _: Fx<u8, 4> = Fx::from(100u8);
/// ```
///
/// Operands of different signedness must be re-based to a common one first:
///
/// ```compile_fail
/// use fixrange::Fx;
///
/// let _ = Fx::<i8, 4>::from_f64(-0.5) + Fx::<u8, 4>::from_f64(0.25);
/// ```
pub struct Fixed<T, E> {
    mantissa: T,
    exp: PhantomData<E>,
}

pub type Fx<T, const F: i32> = Fixed<T, Exp<F>>;

impl<T: Copy, E> Clone for Fixed<T, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Copy, E> Copy for Fixed<T, E> {}

// Whether every value of `T` at `frac` fractional bits has an integer part
// representable in `I`.
const fn int_part_fits<T: Repr, I: Repr>(frac: i32) -> bool {
    let (lo, hi) = if frac >= 0 {
        let unit = 1i128 << frac;
        (T::LOWEST / unit, T::HIGHEST / unit)
    } else {
        let unit = 1i128 << -frac;
        match (T::LOWEST.checked_mul(unit), T::HIGHEST.checked_mul(unit)) {
            (Some(lo), Some(hi)) => (lo, hi),
            _ => return false,
        }
    };
    I::LOWEST <= lo && hi <= I::HIGHEST
}

// Whether every mantissa of `U`, shifted left by `shift`, fits `T`.
const fn rebase_fits<U: Repr, T: Repr>(shift: i32) -> bool {
    let unit = 1i128 << shift;
    match (U::LOWEST.checked_mul(unit), U::HIGHEST.checked_mul(unit)) {
        (Some(lo), Some(hi)) => T::LOWEST <= lo && hi <= T::HIGHEST,
        _ => false,
    }
}

// Whether every value of `I`, scaled to `frac` fractional bits, is a mantissa of `T`.
const fn int_fits<I: Repr, T: Repr>(frac: i32) -> bool {
    if frac >= 0 {
        return rebase_fits::<I, T>(frac);
    }
    let unit = 1i128 << -frac;
    T::LOWEST <= I::LOWEST / unit && I::HIGHEST / unit <= T::HIGHEST
}

// Flooring counterpart of `rule::scale`.
fn realign(value: i128, by: i32) -> i128 {
    if by >= 0 {
        value << by as u32
    } else {
        value >> by.unsigned_abs()
    }
}

impl<T: Repr, E: Exponent> Fixed<T, E> {
    pub const FRAC: i32 = E::FRAC;

    #[inline]
    pub fn from_raw(mantissa: T) -> Self {
        const { assert!(E::FRAC > -64 && E::FRAC < 64, "exponent must lie in (-64, 64)") };
        Fixed {
            mantissa,
            exp: PhantomData,
        }
    }

    #[inline]
    pub fn raw(self) -> T {
        self.mantissa
    }

    /// Scales `n` into the mantissa domain. Rejected at build time unless
    /// every `I` fits.
    pub fn from_int<I: Repr>(n: I) -> Self {
        const {
            assert!(
                int_fits::<I, T>(E::FRAC),
                "integer range exceeds the fixed-point range"
            )
        };
        Self::wrapping_from_int(n)
    }

    /// Like `from_int`, but excess high bits wrap.
    pub fn wrapping_from_int<I: Repr>(n: I) -> Self {
        Self::from_raw(T::narrow(rule::scale(n.wide(), E::FRAC)))
    }

    pub fn try_from_int<I: Repr>(n: I) -> Result<Self> {
        let scaled = match E::FRAC {
            f if f >= 0 => n.wide().checked_mul(1 << f),
            f => Some(rule::scale(n.wide(), f)),
        };
        match scaled {
            Some(m) if T::LOWEST <= m && m <= T::HIGHEST => Ok(Self::from_raw(T::narrow(m))),
            _ => {
                debug!(value = %n.wide(), frac = E::FRAC, "rejected out-of-range fixed-point import");
                Err(Error::OutOfRange {
                    value: scaled.unwrap_or(i128::MAX),
                    lo: T::LOWEST,
                    hi: T::HIGHEST,
                })
            }
        }
    }

    /// Truncates toward zero. Out-of-range inputs give an unspecified mantissa.
    pub fn from_f64(value: f64) -> Self {
        Self::from_raw(T::narrow((value * 2f64.powi(E::FRAC)) as i128))
    }

    pub fn from_f32(value: f32) -> Self {
        Self::from_f64(f64::from(value))
    }

    pub fn try_from_f64(value: f64) -> Result<Self> {
        if !value.is_finite() {
            debug!(value, "rejected non-finite fixed-point import");
            return Err(Error::NotFinite { value });
        }
        let scaled = (value * 2f64.powi(E::FRAC)).trunc();
        if scaled < T::LOWEST as f64 || scaled >= (T::HIGHEST + 1) as f64 {
            debug!(value, width = T::WIDTH, frac = E::FRAC, "rejected out-of-range fixed-point import");
            return Err(Error::Unrepresentable {
                value,
                width: T::WIDTH,
                frac: E::FRAC,
            });
        }
        Ok(Self::from_f64(value))
    }

    /// Re-bases `x` without losing fractional bits or range.
    pub fn from_fixed<U: Repr, F: Exponent>(x: Fixed<U, F>) -> Self {
        const {
            assert!(F::FRAC <= E::FRAC, "re-basing would drop fractional bits");
            assert!(
                rebase_fits::<U, T>(E::FRAC - F::FRAC),
                "re-basing would overflow the representation"
            );
        };
        Self::from_raw(T::narrow(x.mantissa.wide() << (E::FRAC - F::FRAC) as u32))
    }

    /// Re-bases `x`, flooring dropped fractional bits and wrapping excess high bits.
    pub fn rescale<U: Repr, F: Exponent>(x: Fixed<U, F>) -> Self {
        Self::from_raw(T::narrow(realign(x.mantissa.wide(), E::FRAC - F::FRAC)))
    }

    pub fn to_int<I: Repr>(self) -> I {
        const {
            assert!(
                int_part_fits::<T, I>(E::FRAC),
                "fixed-point range exceeds the target integer"
            )
        };
        self.truncate()
    }

    /// Unchecked narrowing export; the fraction truncates toward zero.
    pub fn truncate<I: Repr>(self) -> I {
        I::narrow(rule::scale(self.mantissa.wide(), -E::FRAC))
    }

    pub fn to_f64(self) -> f64 {
        <T as AsPrimitive<f64>>::as_(self.mantissa) * 2f64.powi(-E::FRAC)
    }

    pub fn to_f32(self) -> f32 {
        <T as AsPrimitive<f32>>::as_(self.mantissa) * 2f32.powi(-E::FRAC)
    }

    /// Unary plus.
    pub fn pos(self) -> Self {
        self
    }

    /// One unit of the represented value.
    pub fn one() -> Self {
        const {
            assert!(
                E::FRAC >= 0 && E::FRAC < T::WIDTH as i32 - T::SIGNED as i32,
                "1 is not representable at this exponent"
            )
        };
        Self::from_raw(T::one() << E::FRAC as usize)
    }

    pub fn increment(&mut self)
    where
        Self: ops::AddAssign,
    {
        *self += Self::one();
    }

    pub fn decrement(&mut self)
    where
        Self: ops::SubAssign,
    {
        *self -= Self::one();
    }

    pub fn post_increment(&mut self) -> Self
    where
        Self: ops::AddAssign,
    {
        let old = *self;
        self.increment();
        old
    }

    pub fn post_decrement(&mut self) -> Self
    where
        Self: ops::SubAssign,
    {
        let old = *self;
        self.decrement();
        old
    }

    pub fn checked_div<U: Repr, F: Exponent>(
        self,
        rhs: Fixed<U, F>,
    ) -> Result<<Self as ops::Div<Fixed<U, F>>>::Output>
    where
        Self: ops::Div<Fixed<U, F>>,
    {
        if rhs.mantissa.is_zero() {
            debug!(dividend = ?self, "rejected fixed-point division by zero");
            return Err(Error::DivisionByZero);
        }
        Ok(self / rhs)
    }

    pub fn checked_rem<U: Repr, F: Exponent>(
        self,
        rhs: Fixed<U, F>,
    ) -> Result<<Self as ops::Rem<Fixed<U, F>>>::Output>
    where
        Self: ops::Rem<Fixed<U, F>>,
    {
        if rhs.mantissa.is_zero() {
            debug!(dividend = ?self, "rejected fixed-point remainder by zero");
            return Err(Error::DivisionByZero);
        }
        Ok(self % rhs)
    }

    #[inline]
    fn cast<R: Repr>(self) -> R {
        R::narrow(self.mantissa.wide())
    }

    // The mantissa in `R` at `F` fractional bits.
    #[inline]
    fn align<R: Repr, F: Exponent>(self) -> R {
        const {
            assert!(
                F::FRAC >= E::FRAC && F::FRAC - E::FRAC < R::WIDTH as i32,
                "exponent alignment exceeds the representation width"
            )
        };
        self.cast::<R>() << (F::FRAC - E::FRAC) as usize
    }

    fn rebind<R: Repr, F: Exponent>(x: Fixed<R, F>) -> Self {
        const {
            assert!(F::FRAC == E::FRAC, "compound assignment would change the exponent");
            assert!(R::WIDTH <= T::WIDTH, "compound assignment would widen the representation");
        };
        Self::from_raw(x.cast::<T>())
    }
}

impl<T: Repr, E: Exponent> Default for Fixed<T, E> {
    fn default() -> Self {
        Self::from_raw(T::zero())
    }
}

impl<T: Repr, E: Exponent> fmt::Debug for Fixed<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}p{:+}", self.mantissa, -E::FRAC)
    }
}

impl<T: Repr, E: Exponent, I: Repr> From<I> for Fixed<T, E> {
    fn from(n: I) -> Self {
        Self::from_int(n)
    }
}

impl<T: Repr, E: Exponent> From<f64> for Fixed<T, E> {
    fn from(value: f64) -> Self {
        Self::from_f64(value)
    }
}

impl<T: Repr, E: Exponent> From<f32> for Fixed<T, E> {
    fn from(value: f32) -> Self {
        Self::from_f32(value)
    }
}

macro_rules! export {
    ($($int:ty),+) => {
        $(
            impl<T: Repr, E: Exponent> From<Fixed<T, E>> for $int {
                fn from(x: Fixed<T, E>) -> $int {
                    x.to_int()
                }
            }
        )+
    }
}

export!(u8, u16, u32, u64, i8, i16, i32, i64);

impl<T: Repr, E: Exponent> From<Fixed<T, E>> for f64 {
    fn from(x: Fixed<T, E>) -> f64 {
        x.to_f64()
    }
}

impl<T: Repr, E: Exponent> From<Fixed<T, E>> for f32 {
    fn from(x: Fixed<T, E>) -> f32 {
        x.to_f32()
    }
}

impl<T: Repr, U: Repr, EA: Exponent, EB: Exponent> PartialEq<Fixed<U, EB>> for Fixed<T, EA> {
    fn eq(&self, other: &Fixed<U, EB>) -> bool {
        self.partial_cmp(other) == Some(Ordering::Equal)
    }
}

impl<T: Repr, E: Exponent> Eq for Fixed<T, E> {}

impl<T: Repr, U: Repr, EA: Exponent, EB: Exponent> PartialOrd<Fixed<U, EB>> for Fixed<T, EA> {
    fn partial_cmp(&self, other: &Fixed<U, EB>) -> Option<Ordering> {
        Some(rule::cmp_scaled(
            self.mantissa.wide(),
            EA::FRAC,
            other.mantissa.wide(),
            EB::FRAC,
        ))
    }
}

impl<T: Repr, E: Exponent> Ord for Fixed<T, E> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.mantissa.cmp(&other.mantissa)
    }
}

impl<T: Repr, E: Exponent> Hash for Fixed<T, E> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.mantissa.hash(state)
    }
}

// Operators whose operands must share a scale first.
macro_rules! aligned_ops {
    ($($trait:ident, $method:ident;)+) => {
        $(
            impl<T, U, EA, EB> ops::$trait<Fixed<U, EB>> for Fixed<T, EA>
            where
                T: Promote<U>,
                U: Repr,
                EA: Exponent,
                EB: Exponent,
            {
                type Output = Fixed<Promoted<T, U>, Binary<op::$trait, EA, EB>>;

                #[inline]
                fn $method(self, rhs: Fixed<U, EB>) -> Self::Output {
                    const { assert!(T::SIGNED == U::SIGNED, "operands differ in signedness") };
                    let a = self.align::<Promoted<T, U>, Binary<op::$trait, EA, EB>>();
                    let b = rhs.align::<Promoted<T, U>, Binary<op::$trait, EA, EB>>();
                    Fixed::from_raw(ops::$trait::$method(a, b))
                }
            }
        )+
    }
}

aligned_ops! {
    Add, add;
    Sub, sub;
    Rem, rem;
    BitAnd, bitand;
    BitOr, bitor;
    BitXor, bitxor;
}

// Operators that combine the scales instead.
macro_rules! scaling_ops {
    ($($trait:ident, $method:ident;)+) => {
        $(
            impl<T, U, EA, EB> ops::$trait<Fixed<U, EB>> for Fixed<T, EA>
            where
                T: Promote<U>,
                U: Repr,
                EA: Exponent,
                EB: Exponent,
            {
                type Output = Fixed<Promoted<T, U>, Binary<op::$trait, EA, EB>>;

                #[inline]
                fn $method(self, rhs: Fixed<U, EB>) -> Self::Output {
                    const { assert!(T::SIGNED == U::SIGNED, "operands differ in signedness") };
                    let a = self.cast::<Promoted<T, U>>();
                    let b = rhs.cast::<Promoted<T, U>>();
                    Fixed::from_raw(ops::$trait::$method(a, b))
                }
            }
        )+
    }
}

scaling_ops! {
    Mul, mul;
    Div, div;
}

impl<T: Repr, E: Exponent, I: Repr> ops::Shl<I> for Fixed<T, E> {
    type Output = Self;

    fn shl(self, n: I) -> Self {
        Self::from_raw(self.mantissa << n.wide() as usize)
    }
}

impl<T: Repr, E: Exponent, I: Repr> ops::Shr<I> for Fixed<T, E> {
    type Output = Self;

    fn shr(self, n: I) -> Self {
        Self::from_raw(self.mantissa >> n.wide() as usize)
    }
}

impl<T: Repr, E: Exponent, const N: i128> ops::Shl<Int<N>> for Fixed<T, E> {
    type Output = Fixed<T, Binary<op::Shl, E, Int<N>>>;

    fn shl(self, _: Int<N>) -> Self::Output {
        Fixed::from_raw(self.mantissa)
    }
}

impl<T: Repr, E: Exponent, const N: i128> ops::Shr<Int<N>> for Fixed<T, E> {
    type Output = Fixed<T, Binary<op::Shr, E, Int<N>>>;

    fn shr(self, _: Int<N>) -> Self::Output {
        Fixed::from_raw(self.mantissa)
    }
}

impl<T: Repr + ops::Neg<Output = T>, E: Exponent> ops::Neg for Fixed<T, E> {
    type Output = Fixed<T, Unary<op::Neg, E, T>>;

    fn neg(self) -> Self::Output {
        Fixed::from_raw(-self.mantissa)
    }
}

impl<T: Repr, E: Exponent> ops::Not for Fixed<T, E> {
    type Output = Fixed<T, Unary<op::Not, E, T>>;

    fn not(self) -> Self::Output {
        Fixed::from_raw(!self.mantissa)
    }
}

macro_rules! compound_ops {
    ($($assign:ident, $assign_method:ident => $trait:ident, $method:ident;)+) => {
        $(
            impl<T, E, Rhs, R, F> ops::$assign<Rhs> for Fixed<T, E>
            where
                T: Repr,
                E: Exponent,
                R: Repr,
                F: Exponent,
                Fixed<T, E>: ops::$trait<Rhs, Output = Fixed<R, F>>,
            {
                #[inline]
                fn $assign_method(&mut self, rhs: Rhs) {
                    *self = Self::rebind(ops::$trait::$method(*self, rhs));
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
