use makespan_collections::ToIndex;
use std::fmt::{Debug, Display, Error, Formatter};
use std::ops::Not;

/// A Boolean variable, identified by a 0-based index.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub struct BVar(u32);

impl BVar {
    pub fn new(id: u32) -> BVar {
        BVar(id)
    }

    pub fn true_lit(self) -> Lit {
        Lit::new(self, true)
    }
    pub fn false_lit(self) -> Lit {
        Lit::new(self, false)
    }
    pub fn lit(self, value: bool) -> Lit {
        Lit::new(self, value)
    }
}

impl ToIndex for BVar {
    fn to_index(self) -> usize {
        self.0 as usize
    }
    fn from_index(i: usize) -> Self {
        BVar(i as u32)
    }
}

impl Display for BVar {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        // 1-based, as in DIMACS
        write!(f, "{}", self.0 + 1)
    }
}

impl Debug for BVar {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        write!(f, "{}", self)
    }
}

/// A literal: a Boolean variable together with a polarity.
///
/// Encoded as `var * 2 + polarity` so that negation is a single bit flip and
/// literals can index dense arrays (e.g. watch lists).
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub struct Lit(u32);

impl Lit {
    /// Placeholder literal used to reserve a slot that is always overwritten
    /// before being read.
    pub(crate) const UNDEF: Lit = Lit(u32::MAX);

    pub fn new(var: BVar, value: bool) -> Lit {
        Lit(var.0 * 2 + value as u32)
    }

    pub fn variable(self) -> BVar {
        BVar(self.0 / 2)
    }

    pub fn is_positive(self) -> bool {
        self.0 & 1 == 1
    }

    pub fn is_negative(self) -> bool {
        !self.is_positive()
    }

    /// Parses a non-zero DIMACS-style signed integer.
    pub fn from_dimacs(i: i32) -> Lit {
        debug_assert_ne!(i, 0);
        Lit::new(BVar(i.unsigned_abs() - 1), i > 0)
    }
}

impl Not for Lit {
    type Output = Lit;

    fn not(self) -> Lit {
        Lit(self.0 ^ 1)
    }
}

impl ToIndex for Lit {
    fn to_index(self) -> usize {
        self.0 as usize
    }
    fn from_index(i: usize) -> Self {
        Lit(i as u32)
    }
}

impl Display for Lit {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        if self.is_negative() {
            write!(f, "-")?;
        }
        write!(f, "{}", self.variable())
    }
}

impl Debug for Lit {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        write!(f, "{}", self)
    }
}

/// Value of a variable in a partial assignment.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum BVal {
    Undef,
    True,
    False,
}

impl BVal {
    pub fn from_bool(v: bool) -> Self {
        if v {
            BVal::True
        } else {
            BVal::False
        }
    }

    pub fn as_bool(self) -> Option<bool> {
        match self {
            BVal::Undef => None,
            BVal::True => Some(true),
            BVal::False => Some(false),
        }
    }
}

impl Not for BVal {
    type Output = BVal;

    fn not(self) -> BVal {
        match self {
            BVal::Undef => BVal::Undef,
            BVal::True => BVal::False,
            BVal::False => BVal::True,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_encoding() {
        let v = BVar::new(3);
        let t = v.true_lit();
        let f = v.false_lit();
        assert_ne!(t, f);
        assert_eq!(t.variable(), v);
        assert_eq!(f.variable(), v);
        assert_eq!(!t, f);
        assert_eq!(!!t, t);
        assert!(t.is_positive());
        assert!(f.is_negative());
    }

    #[test]
    fn dimacs_round_trip() {
        assert_eq!(Lit::from_dimacs(1), BVar::new(0).true_lit());
        assert_eq!(Lit::from_dimacs(-4), BVar::new(3).false_lit());
        assert_eq!(format!("{}", Lit::from_dimacs(-4)), "-4");
    }
}
