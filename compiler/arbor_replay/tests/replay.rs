//! End-to-end replay tests.

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

use std::path::Path;

use arbor_construct::{ConstructError, NodeRole, Violation};
use arbor_replay::{load, replay, ReplayError, Script};
use pretty_assertions::assert_eq;

fn run(source: &str) -> Result<String, ReplayError> {
    replay(&Script::parse(source).expect("script parses"))
}

#[test]
fn replays_bundled_script() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("scripts/let_binding.replay");
    let script = load(&path).unwrap();
    assert_eq!(replay(&script).unwrap(), "slot 0: let(x, +(1, *(2, 3)))");
}

#[test]
fn renders_each_filled_root_slot() {
    let source = "\
name 4 item
open_slot 2 4
close_slot
token 0 a
token 0 b
";
    assert_eq!(run(source).unwrap(), "slot 0: b, a\nslot 2: item");
}

#[test]
fn flat_operators_replay_in_source_order() {
    let source = "\
op 1 flat 0 ,
open_expr 0
open_operand 0
token 0 c
close_operand
open_operator 1
close_operator
open_operand 0
token 0 b
close_operand
open_operator 1
close_operator
open_operand 0
token 0 a
close_operand
close_expr
";
    assert_eq!(run(source).unwrap(), "slot 0: ,(a, b, c)");
}

#[test]
fn empty_script_renders_nothing() {
    assert_eq!(run("# nothing\n").unwrap(), "");
}

#[test]
fn engine_errors_carry_the_script_line() {
    let source = "open_expr 0\nopen_operand 0 @3..4\nclose_operator\n";
    let Err(ReplayError::Action { line, source }) = run(source) else {
        panic!("replay should fail on line 3");
    };

    assert_eq!(line, 3);
    assert!(matches!(
        source,
        ConstructError::ContractViolation {
            violation: Violation::WrongRole {
                expected: NodeRole::Operator,
                found: NodeRole::Operand,
            },
            depth: 1,
            expression_depth: 1,
            ..
        }
    ));
}

#[test]
fn unbalanced_stream_fails_at_finish() {
    let error = run("open_slot 0 1\n").unwrap_err();
    assert_eq!(
        error.to_string(),
        "action stream ended with 1 node(s) and 0 expression(s) still open"
    );
}

#[test]
fn slot_declaration_limits_capacity() {
    let error = run("slots 1\ntoken 1 x\n").unwrap_err();
    assert_eq!(
        error.to_string(),
        "line 2: contract violation at `token slot=1` (depth 0, expression depth 0): \
         slot 1 is outside the rule capacity of 1"
    );
}

#[test]
fn missing_file_is_an_io_error() {
    let error = load(Path::new("/nonexistent/arbor/script.replay")).unwrap_err();
    assert!(matches!(error, ReplayError::Io { .. }));
}
