//! Replay script parser.
//!
//! A script is line-oriented. Declarations set up the operator table and the
//! slot capacity; every other line is one action, written the way the engine
//! names it:
//!
//! ```text
//! # 1 + 2
//! op 1 left 1 +
//! open_expr 0
//! open_operand 0 @2..3
//! token 0 2
//! close_operand
//! open_operator 1 @1..2
//! close_operator
//! open_operand 0 @0..1
//! token 0 1
//! close_operand
//! close_expr
//! ```
//!
//! A word starting with `#` begins a comment. A trailing `@start..end` sets
//! the action's span.
//!
//! Token texts are single words. There is no escape, so a text cannot start
//! with `#` (it would begin a comment), and a text of the form `@start..end`
//! needs an explicit span after it: `token 0 @1..2 @5..6` reads the text
//! `@1..2` with span `5..6`.

use arbor_construct::reference::OperatorTable;
use arbor_construct::{Action, ActionKind, Fixity, OperatorInfo, Span};

use crate::error::ReplayError;

/// One action line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Step {
    /// 1-based source line.
    pub line: usize,
    pub action: Action,
    /// Text the builder receives for a `token` action.
    pub token: Option<String>,
}

/// A parsed script.
#[derive(Clone, Debug, Default)]
pub struct Script {
    pub table: OperatorTable,
    /// `slots` declaration, when present.
    pub slot_count: Option<usize>,
    pub steps: Vec<Step>,
}

impl Script {
    pub fn parse(source: &str) -> Result<Self, ReplayError> {
        let mut script = Script::default();
        for (index, text) in source.lines().enumerate() {
            let line = index + 1;
            let mut words: Vec<&str> = text
                .split_whitespace()
                .take_while(|word| !word.starts_with('#'))
                .collect();
            if words.is_empty() {
                continue;
            }

            let span = match words.last() {
                Some(word) if word.starts_with('@') && word.contains("..") => {
                    let span = parse_span(line, word)?;
                    words.pop();
                    Some(span)
                }
                _ => None,
            };
            let Some((&keyword, rest)) = words.split_first() else {
                return Err(ReplayError::script(line, "missing action"));
            };
            if span.is_some() && matches!(keyword, "op" | "name" | "slots") {
                return Err(ReplayError::script(line, "declarations take no span"));
            }
            let mut args = Args {
                line,
                words: rest.iter(),
            };

            match keyword {
                "op" => {
                    let choice = args.index("choice")?;
                    let fixity = args.word("fixity")?;
                    let fixity = Fixity::from_name(fixity).ok_or_else(|| {
                        ReplayError::script(line, format!("unknown fixity `{fixity}`"))
                    })?;
                    let precedence = args.number("precedence")?;
                    let name = args.word("operator name")?;
                    script
                        .table
                        .insert_operator(choice, name, OperatorInfo::new(fixity, precedence));
                }
                "name" => {
                    let choice = args.index("choice")?;
                    let label = args.word("label")?;
                    script.table.insert_name(choice, label);
                }
                "slots" => {
                    script.slot_count = Some(args.number("slot count")?);
                }
                _ => {
                    let kind = ActionKind::from_name(keyword).ok_or_else(|| {
                        ReplayError::script(line, format!("unknown action `{keyword}`"))
                    })?;
                    let slot = if kind.uses_slot() {
                        args.index("slot")?
                    } else {
                        0
                    };
                    let choice = if kind.uses_choice() {
                        args.index("choice")?
                    } else {
                        0
                    };
                    let token = if kind == ActionKind::TokenSlot {
                        Some(args.word("token text")?.to_owned())
                    } else {
                        None
                    };
                    let action = Action::new(kind, slot, choice);
                    script.steps.push(Step {
                        line,
                        action: span.map_or(action, |span| action.with_span(span)),
                        token,
                    });
                }
            }
            args.finish()?;
        }
        Ok(script)
    }
}

/// Remaining words of one line.
struct Args<'a, 'w> {
    line: usize,
    words: std::slice::Iter<'w, &'a str>,
}

impl<'a> Args<'a, '_> {
    fn word(&mut self, what: &str) -> Result<&'a str, ReplayError> {
        self.words
            .next()
            .copied()
            .ok_or_else(|| ReplayError::script(self.line, format!("missing {what}")))
    }

    fn number<T: std::str::FromStr>(&mut self, what: &str) -> Result<T, ReplayError> {
        let word = self.word(what)?;
        word.parse().map_err(|_| {
            ReplayError::script(self.line, format!("expected {what}, found `{word}`"))
        })
    }

    fn index(&mut self, what: &str) -> Result<u16, ReplayError> {
        self.number(what)
    }

    fn finish(mut self) -> Result<(), ReplayError> {
        match self.words.next() {
            Some(word) => Err(ReplayError::script(self.line, format!("unexpected `{word}`"))),
            None => Ok(()),
        }
    }
}

fn parse_span(line: usize, word: &str) -> Result<Span, ReplayError> {
    let invalid = || ReplayError::script(line, format!("invalid span `{word}`"));
    let (start, end) = word
        .strip_prefix('@')
        .and_then(|range| range.split_once(".."))
        .ok_or_else(invalid)?;
    let start: usize = start.parse().map_err(|_| invalid())?;
    let end: usize = end.parse().map_err(|_| invalid())?;
    if end < start {
        return Err(invalid());
    }
    Ok(Span::new(start, end))
}
