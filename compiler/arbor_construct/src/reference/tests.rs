use pretty_assertions::assert_eq;

use super::*;
use crate::action::ActionKind;

fn finish(builder: &mut ArenaBuilder, choice: u16, slots: &mut [Option<RefId>]) -> RefId {
    builder.finish_node(FinishNode {
        binding: 0,
        choice,
        next_sibling: None,
        slots,
        operand: None,
        left: None,
        right: None,
        span: Span::DUMMY,
    })
}

#[test]
fn test_table_lookups() {
    let table = OperatorTable::new()
        .with_operator(3, "-", Fixity::Prefix, 9)
        .with_name(4, "call");

    assert_eq!(table.info(3), Some(OperatorInfo::new(Fixity::Prefix, 9)));
    assert_eq!(table.info(4), None);
    assert_eq!(table.name(3), Some("-"));
    assert_eq!(table.name(4), Some("call"));
    assert_eq!(table.name(5), None);
}

#[test]
fn test_unknown_operator_gets_default_info() {
    let mut builder = ArenaBuilder::new(OperatorTable::new());
    assert_eq!(builder.operator_info(0, 42), OperatorInfo::default());
}

#[test]
fn test_tokens_come_from_queue_in_order() {
    let mut builder = ArenaBuilder::default().with_tokens(["x", "y"]);
    let y = builder.finish_token(None, Span::new(2, 3));
    let x = builder.finish_token(Some(y), Span::new(0, 1));
    let missing = builder.finish_token(None, Span::DUMMY);

    assert_eq!(builder.render(x), "x");
    assert_eq!(builder.render(y), "y");
    assert_eq!(builder.render(missing), "?");
    assert_eq!(builder.arena().get(x).span(), Span::new(0, 1));
    assert_eq!(builder.arena().siblings(Some(x)).collect::<Vec<_>>(), vec![x, y]);
}

#[test]
fn test_finish_node_trims_trailing_empty_slots() {
    let mut builder = ArenaBuilder::default().with_tokens(["a"]);
    let token = builder.finish_token(None, Span::DUMMY);
    let mut slots = [None, Some(token), None, None];
    let id = finish(&mut builder, 1, &mut slots);

    assert_eq!(slots, [None, None, None, None]);
    let RefNode::Node { slots, .. } = builder.arena().get(id) else {
        panic!("expected a rule node");
    };
    assert_eq!(slots, &vec![None, Some(token)]);
}

#[test]
fn test_render_rules() {
    let table = OperatorTable::new().with_name(1, "pair").with_name(2, "unit");
    let mut builder = ArenaBuilder::new(table).with_tokens(["a", "b"]);

    let b = builder.finish_token(None, Span::DUMMY);
    let a = builder.finish_token(Some(b), Span::DUMMY);
    let pair = finish(&mut builder, 1, &mut [Some(a)]);
    let unit = finish(&mut builder, 2, &mut []);
    let wrapper = finish(&mut builder, 7, &mut [Some(pair)]);
    let anonymous = finish(&mut builder, 8, &mut [Some(a)]);
    let empty = finish(&mut builder, 9, &mut []);

    assert_eq!(builder.render(pair), "pair(a, b)");
    assert_eq!(builder.render(unit), "unit");
    assert_eq!(builder.render(wrapper), "pair(a, b)");
    assert_eq!(builder.render(anonymous), "#8(a, b)");
    assert_eq!(builder.render(empty), "#9");
    assert_eq!(builder.render_chain(Some(a)), "a, b");
    assert_eq!(builder.render_chain(None), "");
}

#[test]
fn test_script_runs_right_to_left() {
    let script = ExprScript::new(2).operand(0, "a").operator(5).operand(0, "b");
    let actions = script.actions();

    let kinds: Vec<ActionKind> = actions.iter().map(|action| action.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ActionKind::OpenExpression,
            ActionKind::OpenOperand,
            ActionKind::TokenSlot,
            ActionKind::CloseOperand,
            ActionKind::OpenOperator,
            ActionKind::CloseOperator,
            ActionKind::OpenOperand,
            ActionKind::TokenSlot,
            ActionKind::CloseOperand,
            ActionKind::CloseExpression,
        ]
    );
    assert_eq!(actions[0], Action::open_expression(2));
    assert_eq!(actions[1].span, Span::new(2, 3));
    assert_eq!(actions[4], Action::open_operator(5).with_span(Span::new(1, 2)));
    assert_eq!(script.tokens(), vec!["b".to_string(), "a".to_string()]);
}
