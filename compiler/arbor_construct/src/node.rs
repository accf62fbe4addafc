//! Intermediate records: tree nodes and expression contexts.
//!
//! Both are pool-owned and short-lived. A tree node exists from the action
//! that opens it until the builder materializes it; an expression context
//! exists from `OpenExpression` until its single value has been stored.

use std::fmt;

use crate::action::Span;
use crate::fixity::OperatorInfo;
use crate::pool::{Handle, Recycle};

/// Which action family opened a node, and therefore which may close it.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum NodeRole {
    #[default]
    Rule,
    Operand,
    Operator,
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeRole::Rule => f.write_str("rule"),
            NodeRole::Operand => f.write_str("operand"),
            NodeRole::Operator => f.write_str("operator"),
        }
    }
}

pub(crate) type NodeId<N, B> = Handle<TreeNode<N, B>>;
pub(crate) type ExprId<N, B> = Handle<ExpressionContext<N, B>>;

/// A rule instance, operand or operator whose children are still arriving.
pub(crate) struct TreeNode<N, B> {
    /// Finished children by slot index; length is the configured slot count.
    pub slots: Vec<Option<N>>,
    pub operand: Option<N>,
    pub left: Option<N>,
    pub right: Option<N>,
    pub binding: B,
    /// Slot this node fills in its parent.
    pub slot_index: u16,
    pub choice_index: u16,
    pub role: NodeRole,
    /// Operators only.
    pub operator: OperatorInfo,
    pub span: Span,
}

impl<N, B: Default> TreeNode<N, B> {
    pub fn new(slot_count: usize) -> Self {
        TreeNode {
            slots: std::iter::repeat_with(|| None).take(slot_count).collect(),
            operand: None,
            left: None,
            right: None,
            binding: B::default(),
            slot_index: 0,
            choice_index: 0,
            role: NodeRole::Rule,
            operator: OperatorInfo::default(),
            span: Span::DUMMY,
        }
    }
}

impl<N, B: Default> Recycle for TreeNode<N, B> {
    fn recycle(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
        self.operand = None;
        self.left = None;
        self.right = None;
        self.binding = B::default();
        self.slot_index = 0;
        self.choice_index = 0;
        self.role = NodeRole::Rule;
        self.operator = OperatorInfo::default();
        self.span = Span::DUMMY;
    }
}

/// One in-progress operator-precedence parse.
pub(crate) struct ExpressionContext<N, B> {
    /// Pending operators; the last is the most recently seen.
    pub operators: Vec<NodeId<N, B>>,
    /// Pending values; the last is the most recently seen.
    pub values: Vec<NodeId<N, B>>,
    /// Enclosing expression, when this one is nested inside an operand or
    /// operator of another.
    pub parent: Option<ExprId<N, B>>,
    pub binding: B,
    /// Slot of the owner node this expression fills.
    pub slot_index: u16,
    /// Under-construction depth when the expression opened. The node at this
    /// depth owns the expression; operands and operators open directly above it.
    pub owner_depth: usize,
}

impl<N, B: Default> ExpressionContext<N, B> {
    pub fn new() -> Self {
        ExpressionContext {
            operators: Vec::new(),
            values: Vec::new(),
            parent: None,
            binding: B::default(),
            slot_index: 0,
            owner_depth: 0,
        }
    }
}

impl<N, B: Default> Recycle for ExpressionContext<N, B> {
    fn recycle(&mut self) {
        self.operators.clear();
        self.values.clear();
        self.parent = None;
        self.binding = B::default();
        self.slot_index = 0;
        self.owner_depth = 0;
    }
}
