use std::fmt;
use std::ops::{BitAnd, BitOr, Not};

pub use self::Tri::*;

/// Outcome of a comparison as far as the operand bounds alone can tell.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub enum Tri {
    AlwaysTrue,
    AlwaysFalse,
    DependsOnValue,
}

impl fmt::Debug for Tri {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            AlwaysTrue => write!(f, "true"),
            AlwaysFalse => write!(f, "false"),
            DependsOnValue => write!(f, "?"),
        }
    }
}

impl Tri {
    pub const fn from_flags(always_true: bool, always_false: bool) -> Tri {
        match (always_true, always_false) {
            (true, true) => panic!("comparison cannot be both always true and always false"),
            (true, false) => AlwaysTrue,
            (false, true) => AlwaysFalse,
            (false, false) => DependsOnValue,
        }
    }

    pub const fn not(self) -> Tri {
        match self {
            AlwaysTrue => AlwaysFalse,
            AlwaysFalse => AlwaysTrue,
            DependsOnValue => DependsOnValue,
        }
    }

    pub const fn or(self, other: Tri) -> Tri {
        match (self, other) {
            (AlwaysTrue, _) | (_, AlwaysTrue) => AlwaysTrue,
            (AlwaysFalse, AlwaysFalse) => AlwaysFalse,
            _ => DependsOnValue,
        }
    }

    pub const fn and(self, other: Tri) -> Tri {
        self.not().or(other.not()).not()
    }

    pub const fn is_known(self) -> bool {
        !matches!(self, DependsOnValue)
    }

    /// Settles the comparison, consulting `raw` only when the bounds could not.
    #[inline]
    pub fn resolve<F: FnOnce() -> bool>(self, raw: F) -> bool {
        match self {
            AlwaysTrue => true,
            AlwaysFalse => false,
            DependsOnValue => raw(),
        }
    }
}

impl Not for Tri {
    type Output = Self;
    fn not(self) -> Self {
        Tri::not(self)
    }
}

impl BitOr for Tri {
    type Output = Self;
    fn bitor(self, other: Self) -> Self {
        self.or(other)
    }
}

impl BitAnd for Tri {
    type Output = Self;
    fn bitand(self, other: Self) -> Self {
        self.and(other)
    }
}
