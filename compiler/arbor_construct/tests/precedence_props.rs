//! Property tests for the expression reducer.
//!
//! Random operator sequences are reduced by the engine and by a textbook
//! precedence-climbing parser over the same source-order tokens; both must
//! produce the same grouping.

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

use arbor_construct::reference::{ArenaBuilder, ExprScript, OperatorTable};
use arbor_construct::{Constructor, Fixity};
use proptest::prelude::*;

/// Operators by index; choice is index + 1. Each binary precedence level has
/// a single associativity, and flat levels have a single operator.
///
/// An incoming operator reduces only what lies to its right, where a postfix
/// operator's operand has not arrived yet. Postfix operators therefore bind at
/// least as tightly as everything else.
const OPERATORS: [(&str, i32, Fixity); 12] = [
    (",", 0, Fixity::InfixFlat),
    ("+", 1, Fixity::InfixLeft),
    ("-", 1, Fixity::InfixLeft),
    ("*", 2, Fixity::InfixLeft),
    ("^", 3, Fixity::InfixRight),
    ("@", 3, Fixity::InfixRight),
    ("|", 4, Fixity::InfixFlat),
    ("neg", 2, Fixity::Prefix),
    ("not", -1, Fixity::Prefix),
    ("~", 5, Fixity::Prefix),
    ("!", 5, Fixity::Postfix),
    ("?", 5, Fixity::Postfix),
];

const INFIX: std::ops::Range<usize> = 0..7;
const PREFIX: std::ops::Range<usize> = 7..10;
const POSTFIX: std::ops::Range<usize> = 10..12;

fn choice(index: usize) -> u16 {
    u16::try_from(index + 1).unwrap()
}

fn table() -> OperatorTable {
    OPERATORS
        .iter()
        .enumerate()
        .fold(OperatorTable::new(), |table, (index, &(name, precedence, fixity))| {
            table.with_operator(choice(index), name, fixity, precedence)
        })
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Token {
    Atom(String),
    /// Index into [`OPERATORS`].
    Op(usize),
}

/// A source-order token list.
#[derive(Clone, Debug)]
struct Expr {
    tokens: Vec<Token>,
}

impl Expr {
    /// Whitespace-separated operator names and atoms.
    fn parse(source: &str) -> Self {
        let tokens = source
            .split_whitespace()
            .map(|word| match OPERATORS.iter().position(|&(name, ..)| name == word) {
                Some(op) => Token::Op(op),
                None => Token::Atom(word.to_owned()),
            })
            .collect();
        Expr { tokens }
    }
}

/// One operand with its prefix and postfix operators.
fn operand_strategy(index: usize) -> impl Strategy<Value = Vec<Token>> {
    (
        prop::collection::vec(PREFIX, 0..3),
        prop::collection::vec(POSTFIX, 0..3),
    )
        .prop_map(move |(prefixes, postfixes)| {
            prefixes
                .into_iter()
                .map(Token::Op)
                .chain(std::iter::once(Token::Atom(format!("v{index}"))))
                .chain(postfixes.into_iter().map(Token::Op))
                .collect()
        })
}

fn expr_strategy() -> impl Strategy<Value = Expr> {
    (1usize..8)
        .prop_flat_map(|count| {
            (
                (0..count).map(operand_strategy).collect::<Vec<_>>(),
                prop::collection::vec(INFIX, count - 1),
            )
        })
        .prop_map(|(operands, operators)| {
            let mut tokens = Vec::new();
            for (index, operand) in operands.into_iter().enumerate() {
                if index > 0 {
                    tokens.push(Token::Op(operators[index - 1]));
                }
                tokens.extend(operand);
            }
            Expr { tokens }
        })
}

/// Precedence climbing over the source-order token list.
struct Oracle<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl Oracle<'_> {
    fn peek_operator(&self) -> Option<usize> {
        match self.tokens.get(self.pos) {
            Some(Token::Op(op)) => Some(*op),
            _ => None,
        }
    }

    /// An atom, or a prefix operator applied to everything tighter than it.
    fn unary(&mut self) -> String {
        let tokens = self.tokens;
        let token = &tokens[self.pos];
        self.pos += 1;
        match token {
            Token::Atom(name) => name.clone(),
            Token::Op(op) => {
                let (name, precedence, _) = OPERATORS[*op];
                let operand = self.parse(precedence + 1);
                format!("{name}({operand})")
            }
        }
    }

    fn parse(&mut self, min: i32) -> String {
        let mut lhs = self.unary();
        while let Some(op) = self.peek_operator() {
            let (name, precedence, fixity) = OPERATORS[op];
            if precedence < min {
                break;
            }
            self.pos += 1;
            lhs = match fixity {
                Fixity::Postfix => format!("{name}({lhs})"),
                Fixity::InfixFlat => {
                    let mut items = vec![lhs, self.parse(precedence + 1)];
                    while self.peek_operator() == Some(op) {
                        self.pos += 1;
                        items.push(self.parse(precedence + 1));
                    }
                    format!("{name}({})", items.join(", "))
                }
                Fixity::InfixRight => {
                    let rhs = self.parse(precedence);
                    format!("{name}({lhs}, {rhs})")
                }
                Fixity::InfixLeft => {
                    let rhs = self.parse(precedence + 1);
                    format!("{name}({lhs}, {rhs})")
                }
                Fixity::Prefix => unreachable!("prefix operators only start operands"),
            };
        }
        lhs
    }
}

fn oracle(expr: &Expr) -> String {
    Oracle {
        tokens: &expr.tokens,
        pos: 0,
    }
    .parse(i32::MIN)
}

fn script(expr: &Expr) -> ExprScript {
    expr.tokens
        .iter()
        .fold(ExprScript::new(0), |script, token| match token {
            Token::Atom(name) => script.operand(0, name.clone()),
            Token::Op(op) => script.operator(choice(*op)),
        })
}

fn engine(expr: &Expr) -> (String, usize, usize) {
    let script = script(expr);
    let builder = ArenaBuilder::new(table()).with_tokens(script.tokens());
    let mut constructor = Constructor::new(builder, 0);
    constructor.apply_all(script.actions()).unwrap();
    let stats = constructor.stats();
    let (builder, slots) = constructor.finish().unwrap();
    (builder.render_chain(slots[0]), stats.nodes.live, stats.nodes.capacity)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn engine_matches_precedence_climbing(expr in expr_strategy()) {
        let (rendered, _, _) = engine(&expr);
        prop_assert_eq!(rendered, oracle(&expr));
    }

    #[test]
    fn reduction_is_deterministic(expr in expr_strategy()) {
        prop_assert_eq!(engine(&expr), engine(&expr));
    }

    #[test]
    fn records_are_released_and_bounded(expr in expr_strategy()) {
        let (_, live, capacity) = engine(&expr);
        prop_assert_eq!(live, 0);
        prop_assert!(capacity <= expr.tokens.len());
    }
}

#[test]
fn oracle_groups_textbook_cases() {
    let cases = [
        ("a + b * c ^ d", "+(a, *(b, ^(c, d)))"),
        ("neg a * b !", "*(neg(a), !(b))"),
        ("a * neg b + c", "+(*(a, neg(b)), c)"),
        ("not a , b", "not(,(a, b))"),
        ("a + not b * c", "+(a, not(*(b, c)))"),
        ("~ a ! ?", "?(!(~(a)))"),
        ("a | b ! | c", "|(a, !(b), c)"),
    ];
    for (source, expected) in cases {
        let expr = Expr::parse(source);
        assert_eq!(oracle(&expr), expected, "{source}");
        assert_eq!(engine(&expr).0, expected, "{source}");
    }
}
