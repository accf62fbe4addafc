use pretty_assertions::assert_eq;

use super::*;
use crate::action::Span;

#[test]
fn test_violation_message_names_action_and_depth() {
    let error = ConstructError::ContractViolation {
        action: Action::close_operand().with_span(Span::new(4, 5)),
        depth: 3,
        expression_depth: 1,
        violation: Violation::WrongRole {
            expected: NodeRole::Operand,
            found: NodeRole::Rule,
        },
    };

    assert_eq!(
        error.to_string(),
        "contract violation at `close_operand @4..5` (depth 3, expression depth 1): \
         expected operand node on top, found rule"
    );
}

#[test]
fn test_exhausted_message() {
    let error = ConstructError::ResourceExhausted {
        pool: PoolKind::Expression,
        limit: 2,
    };
    assert_eq!(error.to_string(), "expression pool exhausted at 2 live records");
}

#[test]
fn test_fault_from_violation() {
    assert_eq!(
        Fault::from(Violation::RootPopped),
        Fault::Violation(Violation::RootPopped)
    );
}
