//! Fixed-point numbers and bounded-range integers whose exponent and bounds
//! live in the type.
//!
//! Operators compute the metadata of their result at build time. Operations
//! that could lose information the caller did not ask to lose (an overflowing
//! range, a divisor range containing zero, a narrowing export) are rejected
//! when the program is built, not when it runs.

pub mod constant;
pub mod error;
pub mod fixed;
pub mod ranged;
pub mod repr;
pub mod rule;
pub mod tri;

pub use crate::constant::{int, Int};
pub use crate::error::{Error, Result};
pub use crate::fixed::{Fixed, Fx};
pub use crate::ranged::{ranged, Bounded, Ranged, Rg};
pub use crate::repr::{Promote, Promoted, Repr};
pub use crate::rule::{eq_outcome, ge_outcome, gt_outcome, le_outcome, lt_outcome, ne_outcome};
pub use crate::tri::Tri;

#[test]
fn test() {
    let a = Fx::<u16, 8>::from_f64(1.25);
    let b = a + Fx::<u16, 8>::from_f64(0.25);
    assert_eq!(b.to_f64(), 1.5);
    let mut c = b + Fx::<u16, 4>::from_f64(0.125);
    assert_eq!(c.to_f64(), 1.625);
    assert_eq!(c.raw(), 416);
    c.decrement();
    assert_eq!(c.to_f64(), 0.625);

    let x = Fx::<u16, 8>::from_f64(2.5);
    let y = Fx::<u16, 8>::from_f64(0.125);
    let z = x * y;
    assert_eq!(z, Fx::<u16, 8>::from_f64(0.3125));
    assert_eq!(z.raw(), 20480);

    let pi = Fx::<u64, 32>::from_f64(3.141_592_653_589_793);
    assert_eq!(pi.raw(), 0x3_243F_6A88);
    assert_eq!(pi.to_int::<u64>(), 3);

    let r = Rg::<u8, 0, 10>::new(4) * Rg::<u8, 5, 5>::constant();
    assert_eq!((r.get(), r.lo(), r.hi()), (20, 0, 50));

    assert_eq!(eq_outcome::<rule::Span<0, 4>, rule::Span<5, 9>>(), tri::AlwaysFalse);
    assert!(Rg::<u8, 0, 4>::new(0) < Rg::<u8, 5, 9>::new(5));

    let p = Fx::<u32, 4>::from_f64(4.75) * Fx::<u32, 8>::from_f64(5.25);
    assert_eq!(p.raw(), 102144);
    assert_eq!(p, Fx::<u32, 10>::from_f64(24.9375));
}
