use num_traits::{AsPrimitive, PrimInt};
use std::fmt;
use std::hash::Hash;

/// A primitive integer usable as the raw storage of a fixed-point mantissa
/// or a ranged base.
///
/// All metadata arithmetic happens in `i128`, which holds every value (and
/// every corner product) of the 8- to 64-bit types implemented here.
pub trait Repr: PrimInt + AsPrimitive<f64> + AsPrimitive<f32> + Default + Hash + fmt::Debug + 'static {
    const WIDTH: u32;
    const SIGNED: bool;
    const LOWEST: i128;
    const HIGHEST: i128;

    /// Lossless widening.
    fn wide(self) -> i128;

    /// Narrowing with the same wraparound as an `as` cast.
    fn narrow(x: i128) -> Self;
}

/// Picks the raw type of a binary operation between `Self` and `Rhs`.
pub trait Promote<Rhs: Repr>: Repr {
    type Output: Repr;
}

pub type Promoted<A, B> = <A as Promote<B>>::Output;

macro_rules! repr {
    ($($int:ty: $signed:expr;)+) => {
        $(
            impl Repr for $int {
                const WIDTH: u32 = <$int>::BITS;
                const SIGNED: bool = $signed;
                const LOWEST: i128 = <$int>::MIN as i128;
                const HIGHEST: i128 = <$int>::MAX as i128;

                #[inline]
                fn wide(self) -> i128 {
                    self as i128
                }

                #[inline]
                fn narrow(x: i128) -> Self {
                    x as $int
                }
            }
        )+
    }
}

repr! {
    u8: false;
    u16: false;
    u32: false;
    u64: false;
    i8: true;
    i16: true;
    i32: true;
    i64: true;
}

// Usual arithmetic conversions, minus the promotion of narrow types to `int`:
// equal rank prefers unsigned, a strictly wider signed type wins.
macro_rules! promote {
    ($($lhs:ty: [$($rhs:ty => $out:ty),+];)+) => {
        $($(
            impl Promote<$rhs> for $lhs {
                type Output = $out;
            }
        )+)+
    }
}

promote! {
    u8: [u8 => u8, u16 => u16, u32 => u32, u64 => u64, i8 => u8, i16 => i16, i32 => i32, i64 => i64];
    u16: [u8 => u16, u16 => u16, u32 => u32, u64 => u64, i8 => u16, i16 => u16, i32 => i32, i64 => i64];
    u32: [u8 => u32, u16 => u32, u32 => u32, u64 => u64, i8 => u32, i16 => u32, i32 => u32, i64 => i64];
    u64: [u8 => u64, u16 => u64, u32 => u64, u64 => u64, i8 => u64, i16 => u64, i32 => u64, i64 => u64];
    i8: [u8 => u8, u16 => u16, u32 => u32, u64 => u64, i8 => i8, i16 => i16, i32 => i32, i64 => i64];
    i16: [u8 => i16, u16 => u16, u32 => u32, u64 => u64, i8 => i16, i16 => i16, i32 => i32, i64 => i64];
    i32: [u8 => i32, u16 => i32, u32 => u32, u64 => u64, i8 => i32, i16 => i32, i32 => i32, i64 => i64];
    i64: [u8 => i64, u16 => i64, u32 => i64, u64 => u64, i8 => i64, i16 => i64, i32 => i64, i64 => i64];
}
