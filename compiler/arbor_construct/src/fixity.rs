//! Operator shapes and precedence metadata.

use std::fmt;

/// Operator shape: where its operands sit and how equal-precedence runs group.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Fixity {
    /// `-x`: one operand, following the operator.
    #[default]
    Prefix,
    /// `x!`: one operand, preceding the operator.
    Postfix,
    /// `a - b - c` groups as `(a - b) - c`.
    InfixLeft,
    /// `a ^ b ^ c` groups as `a ^ (b ^ c)`.
    InfixRight,
    /// `a, b, c` collapses into one node holding every operand.
    InfixFlat,
}

impl Fixity {
    pub const ALL: [Fixity; 5] = [
        Fixity::Prefix,
        Fixity::Postfix,
        Fixity::InfixLeft,
        Fixity::InfixRight,
        Fixity::InfixFlat,
    ];

    /// Short name used by replay scripts.
    pub const fn name(self) -> &'static str {
        match self {
            Fixity::Prefix => "prefix",
            Fixity::Postfix => "postfix",
            Fixity::InfixLeft => "left",
            Fixity::InfixRight => "right",
            Fixity::InfixFlat => "flat",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|fixity| fixity.name() == name)
    }

    #[inline]
    pub const fn is_infix(self) -> bool {
        matches!(
            self,
            Fixity::InfixLeft | Fixity::InfixRight | Fixity::InfixFlat
        )
    }
}

impl fmt::Display for Fixity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fixity and precedence of one operator, as resolved by the builder.
///
/// Higher precedence binds tighter.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct OperatorInfo {
    pub fixity: Fixity,
    pub precedence: i32,
}

impl OperatorInfo {
    #[inline]
    pub const fn new(fixity: Fixity, precedence: i32) -> Self {
        OperatorInfo { fixity, precedence }
    }
}
