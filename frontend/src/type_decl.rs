use std::fmt;

/// Types a symbol can carry, ordered by widening: `Char < Int < Real`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SymbolType {
    Char,
    Int,
    Real,
}

impl SymbolType {
    /// Decodes the tag stored in the payload of a `TypeP` node.
    pub fn from_tag(tag: i32) -> Option<Self> {
        match tag {
            0 => Some(SymbolType::Char),
            1 => Some(SymbolType::Int),
            2 => Some(SymbolType::Real),
            _ => None,
        }
    }

    pub fn tag(self) -> i32 {
        match self {
            SymbolType::Char => 0,
            SymbolType::Int => 1,
            SymbolType::Real => 2,
        }
    }

    pub fn widen(self, other: SymbolType) -> SymbolType {
        self.max(other)
    }

    /// A variable of type `self` accepts a value of type `assigned` without narrowing.
    pub fn can_hold(self, assigned: SymbolType) -> bool {
        self >= assigned
    }
}

impl fmt::Display for SymbolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolType::Char => write!(f, "CHARACTER"),
            SymbolType::Int => write!(f, "INTEGER"),
            SymbolType::Real => write!(f, "REAL"),
        }
    }
}
