//! Construction errors.
//!
//! The engine does not recover from a bad action stream. Every malformed
//! action is reported as a [`ConstructError::ContractViolation`] carrying the
//! offending action, and the constructor refuses further work until reset.

use std::fmt;

use crate::action::Action;
use crate::node::NodeRole;

/// Which record pool a fault refers to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PoolKind {
    Node,
    Expression,
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolKind::Node => f.write_str("node"),
            PoolKind::Expression => f.write_str("expression"),
        }
    }
}

/// Error surfaced by [`Constructor`](crate::Constructor).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConstructError {
    /// A pool reached its live-record limit or ran out of handle space.
    #[error("{pool} pool exhausted at {limit} live records")]
    ResourceExhausted { pool: PoolKind, limit: usize },

    /// The action stream is malformed.
    #[error(
        "contract violation at `{action}` (depth {depth}, expression depth {expression_depth}): {violation}"
    )]
    ContractViolation {
        action: Action,
        depth: usize,
        expression_depth: usize,
        violation: Violation,
    },

    /// An earlier error aborted this parse.
    #[error("constructor aborted by an earlier error; reset it before reuse")]
    Poisoned,

    /// `finish` was called before every node and expression was closed.
    #[error("action stream ended with {depth} node(s) and {expression_depth} expression(s) still open")]
    Unbalanced {
        depth: usize,
        expression_depth: usize,
    },
}

/// The specific way an action broke the stream contract.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Violation {
    #[error("no expression is open")]
    NoOpenExpression,

    #[error("the root node cannot be closed")]
    RootPopped,

    #[error("expected {expected} node on top, found {found}")]
    WrongRole { expected: NodeRole, found: NodeRole },

    #[error("no {expected} node is open in the current expression")]
    NoOpenMember { expected: NodeRole },

    #[error("slot {slot} is outside the rule capacity of {capacity}")]
    SlotOutOfRange { slot: u16, capacity: usize },

    #[error("operator needs {needed} pending value(s), {available} available")]
    MissingOperands { needed: usize, available: usize },

    #[error("expression reduced to {remaining} values instead of one")]
    ExpressionNotReduced { remaining: usize },

    #[error("{open} node(s) above the expression owner are still open")]
    NestingMismatch { open: usize },

    #[error("rule slot used directly inside an expression; open an operand or operator first")]
    SlotInsideExpression,

    #[error("node owns an open expression and cannot be closed")]
    ExpressionOwnsNode,

    #[error("stale {0} handle")]
    StaleHandle(PoolKind),
}

/// Error from [`Action::pack`](crate::Action::pack) and
/// [`PackedAction::unpack`](crate::PackedAction::unpack).
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PackError {
    #[error("{field} index {value} does not fit in 14 bits")]
    FieldOverflow { field: &'static str, value: u16 },

    #[error("unknown action kind tag {0}")]
    UnknownKind(u8),
}

/// Internal failure of one action, before the action and depths are attached.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Fault {
    Violation(Violation),
    Exhausted { pool: PoolKind, limit: usize },
}

impl From<Violation> for Fault {
    fn from(violation: Violation) -> Self {
        Fault::Violation(violation)
    }
}

#[cfg(test)]
mod tests;
