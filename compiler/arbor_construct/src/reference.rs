//! Reference tree builder.
//!
//! [`ArenaBuilder`] materializes every node into an owned [`TreeArena`],
//! taking operator metadata from an [`OperatorTable`] and token text from a
//! queue. Replay tooling and tests use it to look at what the engine built;
//! real front ends supply their own [`TreeBuilder`].
//!
//! [`ExprScript`] produces the action stream a recognizer would emit for a
//! flat, source-order list of operands and operators.

use std::collections::VecDeque;

use rustc_hash::FxHashMap;

use crate::action::{Action, Span};
use crate::builder::{FinishNode, TreeBuilder};
use crate::fixity::{Fixity, OperatorInfo};

/// Index of a node in a [`TreeArena`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RefId(u32);

impl RefId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A materialized node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RefNode {
    Node {
        choice: u16,
        binding: u32,
        /// Slot heads; trailing empty slots are trimmed.
        slots: Vec<Option<RefId>>,
        operand: Option<RefId>,
        left: Option<RefId>,
        right: Option<RefId>,
        next: Option<RefId>,
        span: Span,
    },
    Token {
        text: String,
        next: Option<RefId>,
        span: Span,
    },
}

impl RefNode {
    /// Next sibling in the chain this node heads.
    pub fn next(&self) -> Option<RefId> {
        match self {
            RefNode::Node { next, .. } | RefNode::Token { next, .. } => *next,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            RefNode::Node { span, .. } | RefNode::Token { span, .. } => *span,
        }
    }
}

/// Owned storage for materialized nodes.
#[derive(Clone, Debug, Default)]
pub struct TreeArena {
    nodes: Vec<RefNode>,
}

impl TreeArena {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self, node: RefNode) -> RefId {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "reference trees stay far below u32::MAX nodes"
        )]
        let id = RefId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// # Panics
    /// Panics if `id` came from another arena.
    #[inline]
    #[track_caller]
    pub fn get(&self, id: RefId) -> &RefNode {
        &self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Walk a sibling chain starting at `first`.
    pub fn siblings(&self, first: Option<RefId>) -> Siblings<'_> {
        Siblings {
            arena: self,
            next: first,
        }
    }
}

/// Iterator over a next-sibling chain.
pub struct Siblings<'a> {
    arena: &'a TreeArena,
    next: Option<RefId>,
}

impl Iterator for Siblings<'_> {
    type Item = RefId;

    fn next(&mut self) -> Option<RefId> {
        let id = self.next?;
        self.next = self.arena.get(id).next();
        Some(id)
    }
}

/// Operator metadata and display names, keyed by choice index.
#[derive(Clone, Debug, Default)]
pub struct OperatorTable {
    operators: FxHashMap<u16, OperatorInfo>,
    names: FxHashMap<u16, String>,
}

impl OperatorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an operator alternative.
    #[must_use]
    pub fn with_operator(
        mut self,
        choice: u16,
        name: impl Into<String>,
        fixity: Fixity,
        precedence: i32,
    ) -> Self {
        self.insert_operator(choice, name, OperatorInfo::new(fixity, precedence));
        self
    }

    /// Give a non-operator alternative a display name.
    #[must_use]
    pub fn with_name(mut self, choice: u16, name: impl Into<String>) -> Self {
        self.insert_name(choice, name);
        self
    }

    pub fn insert_operator(&mut self, choice: u16, name: impl Into<String>, info: OperatorInfo) {
        self.operators.insert(choice, info);
        self.names.insert(choice, name.into());
    }

    pub fn insert_name(&mut self, choice: u16, name: impl Into<String>) {
        self.names.insert(choice, name.into());
    }

    pub fn info(&self, choice: u16) -> Option<OperatorInfo> {
        self.operators.get(&choice).copied()
    }

    pub fn name(&self, choice: u16) -> Option<&str> {
        self.names.get(&choice).map(String::as_str)
    }
}

/// [`TreeBuilder`] that records everything into a [`TreeArena`].
///
/// Bindings are plain `u32`s inherited unchanged from the root.
#[derive(Clone, Debug, Default)]
pub struct ArenaBuilder {
    arena: TreeArena,
    table: OperatorTable,
    tokens: VecDeque<String>,
}

impl ArenaBuilder {
    pub fn new(table: OperatorTable) -> Self {
        ArenaBuilder {
            arena: TreeArena::new(),
            table,
            tokens: VecDeque::new(),
        }
    }

    /// Queue token texts in the order `TokenSlot` actions will consume them.
    #[must_use]
    pub fn with_tokens<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tokens.extend(tokens.into_iter().map(Into::into));
        self
    }

    pub fn push_token(&mut self, text: impl Into<String>) {
        self.tokens.push_back(text.into());
    }

    pub fn arena(&self) -> &TreeArena {
        &self.arena
    }

    pub fn table(&self) -> &OperatorTable {
        &self.table
    }

    pub fn into_arena(self) -> TreeArena {
        self.arena
    }

    /// Compact S-expression of the subtree at `id`.
    ///
    /// Tokens print their text. A node prints its table name followed by its
    /// children in parentheses: `left`, `right`, the `operand` chain, then
    /// each slot's chain in slot order. A node without a name and with exactly
    /// one child prints as that child, so operand wrappers disappear.
    pub fn render(&self, id: RefId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    /// Render every node of the chain starting at `first`, comma-separated.
    pub fn render_chain(&self, first: Option<RefId>) -> String {
        let mut out = String::new();
        self.write_list(&self.arena.siblings(first).collect::<Vec<_>>(), &mut out);
        out
    }

    /// Children in render order.
    pub fn children(&self, id: RefId) -> Vec<RefId> {
        let RefNode::Node {
            slots,
            operand,
            left,
            right,
            ..
        } = self.arena.get(id)
        else {
            return Vec::new();
        };
        let mut children: Vec<RefId> = left.iter().chain(right.iter()).copied().collect();
        children.extend(self.arena.siblings(*operand));
        for head in slots {
            children.extend(self.arena.siblings(*head));
        }
        children
    }

    fn write_node(&self, id: RefId, out: &mut String) {
        match self.arena.get(id) {
            RefNode::Token { text, .. } => out.push_str(text),
            RefNode::Node { choice, .. } => {
                let children = self.children(id);
                match (self.table.name(*choice), children.as_slice()) {
                    (Some(label), []) => out.push_str(label),
                    (Some(label), _) => {
                        out.push_str(label);
                        out.push('(');
                        self.write_list(&children, out);
                        out.push(')');
                    }
                    (None, [only]) => self.write_node(*only, out),
                    (None, _) => {
                        out.push('#');
                        out.push_str(&choice.to_string());
                        if !children.is_empty() {
                            out.push('(');
                            self.write_list(&children, out);
                            out.push(')');
                        }
                    }
                }
            }
        }
    }

    fn write_list(&self, ids: &[RefId], out: &mut String) {
        for (i, &id) in ids.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            self.write_node(id, out);
        }
    }
}

impl TreeBuilder for ArenaBuilder {
    type Node = RefId;
    type Binding = u32;

    fn finish_node(&mut self, node: FinishNode<'_, RefId, u32>) -> RefId {
        let mut slots: Vec<Option<RefId>> = node.slots.iter_mut().map(Option::take).collect();
        while slots.last() == Some(&None) {
            slots.pop();
        }
        self.arena.alloc(RefNode::Node {
            choice: node.choice,
            binding: node.binding,
            slots,
            operand: node.operand,
            left: node.left,
            right: node.right,
            next: node.next_sibling,
            span: node.span,
        })
    }

    fn finish_token(&mut self, next_sibling: Option<RefId>, span: Span) -> RefId {
        let text = self.tokens.pop_front().unwrap_or_else(|| {
            tracing::debug!(%span, "token queue empty");
            String::from("?")
        });
        self.arena.alloc(RefNode::Token {
            text,
            next: next_sibling,
            span,
        })
    }

    fn operator_info(&mut self, _binding: u32, choice: u16) -> OperatorInfo {
        self.table.info(choice).unwrap_or_default()
    }
}

#[derive(Clone, Debug)]
enum ScriptItem {
    Operand { choice: u16, text: String },
    Operator { choice: u16 },
}

/// Action stream for one expression written in source order.
///
/// Each operand becomes an operand node whose slot 0 holds a token; each
/// operator becomes an operator node. The generated stream runs right to
/// left, as a recognizer emits it. Item `i` gets the span `i..i + 1`.
#[derive(Clone, Debug, Default)]
pub struct ExprScript {
    slot: u16,
    items: Vec<ScriptItem>,
}

impl ExprScript {
    /// Script for an expression filling `slot` of the current top node.
    pub fn new(slot: u16) -> Self {
        ExprScript {
            slot,
            items: Vec::new(),
        }
    }

    #[must_use]
    pub fn operand(mut self, choice: u16, text: impl Into<String>) -> Self {
        self.items.push(ScriptItem::Operand {
            choice,
            text: text.into(),
        });
        self
    }

    #[must_use]
    pub fn operator(mut self, choice: u16) -> Self {
        self.items.push(ScriptItem::Operator { choice });
        self
    }

    pub fn actions(&self) -> Vec<Action> {
        let mut actions = Vec::with_capacity(self.items.len() * 3 + 2);
        actions.push(Action::open_expression(self.slot));
        for (index, item) in self.items.iter().enumerate().rev() {
            let span = Span::new(index, index + 1);
            match item {
                ScriptItem::Operand { choice, .. } => {
                    actions.push(Action::open_operand(*choice).with_span(span));
                    actions.push(Action::token(0).with_span(span));
                    actions.push(Action::close_operand());
                }
                ScriptItem::Operator { choice } => {
                    actions.push(Action::open_operator(*choice).with_span(span));
                    actions.push(Action::close_operator());
                }
            }
        }
        actions.push(Action::close_expression());
        actions
    }

    /// Operand texts in the order the stream consumes them.
    pub fn tokens(&self) -> Vec<String> {
        self.items
            .iter()
            .rev()
            .filter_map(|item| match item {
                ScriptItem::Operand { text, .. } => Some(text.clone()),
                ScriptItem::Operator { .. } => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests;
