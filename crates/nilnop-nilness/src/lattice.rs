//! Three-valued nilness domain.

use std::fmt;

/// What is known about whether a value is nil.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Nilness {
    /// Guaranteed not nil (allocation, make, after a `!= nil` check).
    NonNil,
    /// Nothing is known.
    Unknown,
    /// Guaranteed nil (nil literal, after an `== nil` check).
    Nil,
}

impl Nilness {
    /// Swap `Nil` and `NonNil`; `Unknown` stays `Unknown`.
    pub fn negate(self) -> Nilness {
        match self {
            Nilness::NonNil => Nilness::Nil,
            Nilness::Unknown => Nilness::Unknown,
            Nilness::Nil => Nilness::NonNil,
        }
    }

    pub fn is_known(self) -> bool {
        self != Nilness::Unknown
    }
}

impl fmt::Display for Nilness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Nilness::NonNil => write!(f, "non-nil"),
            Nilness::Unknown => write!(f, "unknown"),
            Nilness::Nil => write!(f, "nil"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negate() {
        assert_eq!(Nilness::Nil.negate(), Nilness::NonNil);
        assert_eq!(Nilness::NonNil.negate(), Nilness::Nil);
        assert_eq!(Nilness::Unknown.negate(), Nilness::Unknown);
    }

    #[test]
    fn test_negate_is_involution() {
        for n in [Nilness::Nil, Nilness::NonNil, Nilness::Unknown] {
            assert_eq!(n.negate().negate(), n);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(Nilness::NonNil.to_string(), "non-nil");
        assert_eq!(Nilness::Unknown.to_string(), "unknown");
        assert_eq!(Nilness::Nil.to_string(), "nil");
    }

    #[test]
    fn test_is_known() {
        assert!(Nilness::Nil.is_known());
        assert!(Nilness::NonNil.is_known());
        assert!(!Nilness::Unknown.is_known());
    }
}
