//! Action interpreter.
//!
//! [`Constructor`] is the state of one parse. It keeps two stacks: the nodes
//! under construction (innermost last, above an implicit root) and the open
//! expression contexts (innermost current, linked to their parents). Each
//! [`Action`] mutates those stacks, pulls records from the pools, runs the
//! reducer when an operator or expression closes, and calls the
//! [`TreeBuilder`] whenever a node is complete.
//!
//! # Order of effects
//!
//! For every completion: children are resolved first, then the node is
//! materialized, then the result is linked into the parent's slot, and only
//! then is the record recycled.
//!
//! # Failure
//!
//! Every check that can reject an action runs before the builder sees any of
//! that action's data. The first error poisons the constructor.

mod reduce;


pub use reduce::should_reduce;

use crate::action::{Action, ActionKind};
use crate::builder::{FinishNode, TreeBuilder};
use crate::config::ConstructConfig;
use crate::error::{ConstructError, Fault, PoolKind, Violation};
use crate::fixity::{Fixity, OperatorInfo};
use crate::node::{ExprId, ExpressionContext, NodeId, NodeRole, TreeNode};
use crate::pool::{Pool, PoolStats, Recycle};

type Node<B> = TreeNode<<B as TreeBuilder>::Node, <B as TreeBuilder>::Binding>;
type NodeHandle<B> = NodeId<<B as TreeBuilder>::Node, <B as TreeBuilder>::Binding>;
type Expr<B> = ExpressionContext<<B as TreeBuilder>::Node, <B as TreeBuilder>::Binding>;
type ExprHandle<B> = ExprId<<B as TreeBuilder>::Node, <B as TreeBuilder>::Binding>;

/// Pool occupancy of a constructor.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ConstructStats {
    pub nodes: PoolStats,
    pub expressions: PoolStats,
}

/// Interpreter state for one parse.
///
/// Independent constructors share nothing and may run on separate threads.
pub struct Constructor<B: TreeBuilder> {
    builder: B,
    config: ConstructConfig,
    /// Receives the top-level slots. Never pooled, never closed.
    root: Node<B>,
    root_binding: B::Binding,
    nodes: Pool<Node<B>>,
    expressions: Pool<Expr<B>>,
    under_construction: Vec<NodeHandle<B>>,
    current_expression: Option<ExprHandle<B>>,
    expression_depth: usize,
    poisoned: bool,
}

impl<B: TreeBuilder> Constructor<B> {
    /// Create a constructor with the default configuration.
    pub fn new(builder: B, root_binding: B::Binding) -> Self {
        Self::with_config(builder, root_binding, ConstructConfig::default())
    }

    pub fn with_config(builder: B, root_binding: B::Binding, config: ConstructConfig) -> Self {
        let mut root = TreeNode::new(config.slot_count);
        root.binding = root_binding;
        Constructor {
            builder,
            config,
            root,
            root_binding,
            nodes: Pool::new(PoolKind::Node, config.node_capacity, config.max_live_nodes),
            expressions: Pool::new(
                PoolKind::Expression,
                config.expression_capacity,
                config.max_live_expressions,
            ),
            under_construction: Vec::with_capacity(config.node_capacity),
            current_expression: None,
            expression_depth: 0,
            poisoned: false,
        }
    }

    /// Apply one action.
    ///
    /// On error nothing further is accepted until [`Constructor::reset`].
    pub fn apply(&mut self, action: Action) -> Result<(), ConstructError> {
        if self.poisoned {
            return Err(ConstructError::Poisoned);
        }
        tracing::trace!(
            kind = %action.kind,
            slot = action.slot,
            choice = action.choice,
            depth = self.depth(),
            expression_depth = self.expression_depth,
            "apply"
        );

        let result = match action.kind {
            ActionKind::OpenSlot => self.open_slot(action),
            ActionKind::CloseSlot => self.close_slot(),
            ActionKind::TokenSlot => self.token_slot(action),
            ActionKind::OpenExpression => self.open_expression(action),
            ActionKind::CloseExpression => self.close_expression(),
            ActionKind::OpenOperand => self.open_member(action, NodeRole::Operand),
            ActionKind::OpenOperator => self.open_member(action, NodeRole::Operator),
            ActionKind::CloseOperand => self.close_operand(),
            ActionKind::CloseOperator => self.close_operator(),
        };
        result.map_err(|fault| self.abort(action, fault))
    }

    /// Apply actions in order, stopping at the first error.
    pub fn apply_all<I>(&mut self, actions: I) -> Result<(), ConstructError>
    where
        I: IntoIterator<Item = Action>,
    {
        actions.into_iter().try_for_each(|action| self.apply(action))
    }

    /// End the parse and hand back the builder with the root's slots.
    pub fn finish(mut self) -> Result<(B, Vec<Option<B::Node>>), ConstructError> {
        if self.poisoned {
            return Err(ConstructError::Poisoned);
        }
        if !self.under_construction.is_empty() || self.current_expression.is_some() {
            return Err(ConstructError::Unbalanced {
                depth: self.depth(),
                expression_depth: self.expression_depth,
            });
        }
        let slots = std::mem::take(&mut self.root.slots);
        Ok((self.builder, slots))
    }

    /// Abandon the current parse. Every live record returns to its pool, so
    /// the next parse starts with the capacity this one built up.
    pub fn reset(&mut self) {
        self.nodes.clear();
        self.expressions.clear();
        self.under_construction.clear();
        self.current_expression = None;
        self.expression_depth = 0;
        self.root.recycle();
        self.root.binding = self.root_binding;
        self.poisoned = false;
    }

    /// Open nodes above the root.
    #[inline]
    pub fn depth(&self) -> usize {
        self.under_construction.len()
    }

    /// Open expressions.
    #[inline]
    pub fn expression_depth(&self) -> usize {
        self.expression_depth
    }

    #[inline]
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    pub fn stats(&self) -> ConstructStats {
        ConstructStats {
            nodes: self.nodes.stats(),
            expressions: self.expressions.stats(),
        }
    }

    pub fn config(&self) -> &ConstructConfig {
        &self.config
    }

    pub fn builder(&self) -> &B {
        &self.builder
    }

    pub fn builder_mut(&mut self) -> &mut B {
        &mut self.builder
    }

    fn abort(&mut self, action: Action, fault: Fault) -> ConstructError {
        self.poisoned = true;
        let error = match fault {
            Fault::Exhausted { pool, limit } => ConstructError::ResourceExhausted { pool, limit },
            Fault::Violation(violation) => ConstructError::ContractViolation {
                action,
                depth: self.depth(),
                expression_depth: self.expression_depth,
                violation,
            },
        };
        tracing::warn!(%error, "construction aborted");
        error
    }

    // Rule-slot family

    fn open_slot(&mut self, action: Action) -> Result<(), Fault> {
        let slot = self.check_slot(action.slot)?;
        self.check_rule_position()?;

        let parent = self.top()?.binding;
        let binding = self.builder.resolve_binding(parent, action.slot);
        let id = self.alloc_node()?;
        let node = self.nodes.get_mut(id)?;
        node.role = NodeRole::Rule;
        node.slot_index = action.slot;
        node.choice_index = action.choice;
        node.binding = binding;
        node.span = action.span;
        self.under_construction.push(id);
        tracing::trace!(slot, choice = action.choice, "opened rule node");
        Ok(())
    }

    fn close_slot(&mut self) -> Result<(), Fault> {
        let Some(&id) = self.under_construction.last() else {
            return Err(Violation::RootPopped.into());
        };
        if self.owns_current_expression() {
            return Err(Violation::ExpressionOwnsNode.into());
        }
        let node = self.nodes.get(id)?;
        if node.role != NodeRole::Rule {
            return Err(Violation::WrongRole {
                expected: NodeRole::Rule,
                found: node.role,
            }
            .into());
        }
        let slot = usize::from(node.slot_index);

        self.under_construction.pop();
        self.store_node(slot, id)?;
        Ok(())
    }

    fn token_slot(&mut self, action: Action) -> Result<(), Fault> {
        let slot = self.check_slot(action.slot)?;
        self.check_rule_position()?;

        let prior = self.top_mut()?.slots[slot].take();
        let finished = self.builder.finish_token(prior, action.span);
        self.top_mut()?.slots[slot] = Some(finished);
        Ok(())
    }

    // Expression-slot family

    fn open_expression(&mut self, action: Action) -> Result<(), Fault> {
        self.check_slot(action.slot)?;
        self.check_rule_position()?;

        let owner_binding = self.top()?.binding;
        let binding = self.builder.resolve_binding(owner_binding, action.slot);
        let owner_depth = self.depth();
        let parent = self.current_expression;
        let id = self.expressions.alloc_with(ExpressionContext::new)?;
        let expr = self.expressions.get_mut(id)?;
        expr.parent = parent;
        expr.binding = binding;
        expr.slot_index = action.slot;
        expr.owner_depth = owner_depth;
        self.current_expression = Some(id);
        self.expression_depth += 1;
        Ok(())
    }

    fn close_expression(&mut self) -> Result<(), Fault> {
        let id = self.current_id()?;
        let open = self.depth().saturating_sub(self.expressions.get(id)?.owner_depth);
        if open != 0 {
            return Err(Violation::NestingMismatch { open }.into());
        }

        self.drain_plan(id)?.close_expression()?;

        let mut reductions = 0usize;
        while !self.expressions.get(id)?.operators.is_empty() {
            self.reduce(id)?;
            reductions += 1;
        }

        let expr = self.expressions.get_mut(id)?;
        let value = expr.values.pop();
        let slot = usize::from(expr.slot_index);
        let parent = expr.parent;

        if let Some(value) = value {
            self.store_node(slot, value)?;
        }
        self.expressions.free(id)?;
        self.current_expression = parent;
        self.expression_depth -= 1;
        tracing::debug!(reductions, slot, "closed expression");
        Ok(())
    }

    /// `OpenOperand` / `OpenOperator`.
    fn open_member(&mut self, action: Action, role: NodeRole) -> Result<(), Fault> {
        let expr_id = self.current_id()?;
        let expr = self.expressions.get(expr_id)?;
        let open = self.depth().saturating_sub(expr.owner_depth);
        if open != 0 {
            return Err(Violation::NestingMismatch { open }.into());
        }
        let binding = expr.binding;
        let operator = if role == NodeRole::Operator {
            self.builder.operator_info(binding, action.choice)
        } else {
            OperatorInfo::default()
        };

        let id = self.alloc_node()?;
        let node = self.nodes.get_mut(id)?;
        node.role = role;
        node.choice_index = action.choice;
        node.binding = binding;
        node.operator = operator;
        node.span = action.span;
        self.under_construction.push(id);
        Ok(())
    }

    fn close_operand(&mut self) -> Result<(), Fault> {
        let expr_id = self.current_id()?;
        let id = self.pop_member(expr_id, NodeRole::Operand)?;
        self.expressions.get_mut(expr_id)?.values.push(id);
        Ok(())
    }

    fn close_operator(&mut self) -> Result<(), Fault> {
        let expr_id = self.current_id()?;
        let id = self.pop_member(expr_id, NodeRole::Operator)?;
        let node = self.nodes.get(id)?;
        let (incoming, choice) = (node.operator, node.choice_index);
        self.drain_plan(expr_id)?.close_operator(incoming, choice)?;

        while self.should_reduce_into(expr_id, incoming)? {
            self.reduce(expr_id)?;
        }
        self.expressions.get_mut(expr_id)?.operators.push(id);

        // Everything this operator applies to has already been seen.
        if incoming.fixity == Fixity::Prefix {
            self.reduce(expr_id)?;
        }
        Ok(())
    }

    // Helpers

    /// Pop the top node, which must be an operand or operator of `expr_id`.
    fn pop_member(
        &mut self,
        expr_id: ExprHandle<B>,
        expected: NodeRole,
    ) -> Result<NodeHandle<B>, Violation> {
        let owner_depth = self.expressions.get(expr_id)?.owner_depth;
        if self.depth() <= owner_depth {
            return Err(Violation::NoOpenMember { expected });
        }
        let found = self.top()?.role;
        if found != expected {
            return Err(Violation::WrongRole { expected, found });
        }
        self.under_construction.pop().ok_or(Violation::RootPopped)
    }

    /// Materialize `id` into `slot` of the current top node, chaining in front
    /// of whatever the slot already holds.
    fn store_node(&mut self, slot: usize, id: NodeHandle<B>) -> Result<(), Violation> {
        let prior = self.top_mut()?.slots[slot].take();
        let finished = self.materialize(id, prior)?;
        self.top_mut()?.slots[slot] = Some(finished);
        Ok(())
    }

    /// Hand a completed node to the builder and recycle its record.
    fn materialize(
        &mut self,
        id: NodeHandle<B>,
        next_sibling: Option<B::Node>,
    ) -> Result<B::Node, Violation> {
        let node = self.nodes.get_mut(id)?;
        let finished = self.builder.finish_node(FinishNode {
            binding: node.binding,
            choice: node.choice_index,
            next_sibling,
            slots: &mut node.slots,
            operand: node.operand.take(),
            left: node.left.take(),
            right: node.right.take(),
            span: node.span,
        });
        self.nodes.free(id)?;
        Ok(finished)
    }

    fn alloc_node(&mut self) -> Result<NodeHandle<B>, Fault> {
        let slot_count = self.config.slot_count;
        self.nodes.alloc_with(|| TreeNode::new(slot_count))
    }

    fn top(&self) -> Result<&Node<B>, Violation> {
        match self.under_construction.last() {
            Some(&id) => self.nodes.get(id),
            None => Ok(&self.root),
        }
    }

    fn top_mut(&mut self) -> Result<&mut Node<B>, Violation> {
        match self.under_construction.last() {
            Some(&id) => self.nodes.get_mut(id),
            None => Ok(&mut self.root),
        }
    }

    fn current_id(&self) -> Result<ExprHandle<B>, Violation> {
        self.current_expression.ok_or(Violation::NoOpenExpression)
    }

    fn check_slot(&self, slot: u16) -> Result<usize, Violation> {
        let index = usize::from(slot);
        if index >= self.config.slot_count {
            return Err(Violation::SlotOutOfRange {
                slot,
                capacity: self.config.slot_count,
            });
        }
        Ok(index)
    }

    /// Rule slots go into the top node. While an expression is open that node
    /// must be one of its operands or operators (or something inside one),
    /// never the expression's owner.
    fn check_rule_position(&self) -> Result<(), Violation> {
        if self.owns_current_expression() {
            return Err(Violation::SlotInsideExpression);
        }
        Ok(())
    }

    /// Whether the top node owns the current expression.
    fn owns_current_expression(&self) -> bool {
        self.current_expression
            .and_then(|id| self.expressions.get(id).ok())
            .is_some_and(|expr| expr.owner_depth >= self.depth())
    }
}
