//! Runtime errors of the checked constructors and operations.

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum Error {
    #[error("value {value} lies outside the range [{lo}, {hi}]")]
    OutOfRange { value: i128, lo: i128, hi: i128 },

    #[error("floating-point value {value} is not finite")]
    NotFinite { value: f64 },

    #[error("floating-point value {value} does not fit a {width}-bit mantissa with {frac} fractional bits")]
    Unrepresentable { value: f64, width: u32, frac: i32 },

    #[error("division by zero")]
    DivisionByZero,
}

pub type Result<T> = std::result::Result<T, Error>;
