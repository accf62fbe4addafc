//! Materialization boundary.
//!
//! The engine never decides what a finished node looks like. Whenever a node
//! or token is complete it asks a [`TreeBuilder`] for an opaque handle, and it
//! asks the same builder for scope bindings and operator metadata. The
//! builder is the caller's context: it owns whatever arena, interner or
//! diagnostics sink the finished tree needs.

use crate::action::Span;
use crate::fixity::OperatorInfo;

/// Everything the engine knows about a completed node.
///
/// `slots` is lent for the duration of [`TreeBuilder::finish_node`]; take the
/// handles you keep; the rest are dropped when the record is recycled.
pub struct FinishNode<'a, N, B> {
    pub binding: B,
    pub choice: u16,
    /// Value previously stored in the slot this node is about to fill. Chains
    /// of repeated slots are built by linking each new node in front of it.
    pub next_sibling: Option<N>,
    pub slots: &'a mut [Option<N>],
    /// Unary operators and collapsed flat operators.
    pub operand: Option<N>,
    /// Binary operators.
    pub left: Option<N>,
    pub right: Option<N>,
    pub span: Span,
}

impl<N, B> FinishNode<'_, N, B> {
    /// Take the handle stored in `slot`, if any.
    pub fn take_slot(&mut self, slot: usize) -> Option<N> {
        self.slots.get_mut(slot).and_then(Option::take)
    }
}

/// Caller-supplied callbacks that materialize finished nodes.
///
/// Callbacks run synchronously inside [`Constructor::apply`](crate::Constructor::apply)
/// and cannot reach the constructor itself.
pub trait TreeBuilder {
    /// Finished-node handle. Only ever moved.
    type Node;

    /// Scope identifier threaded through slots and expressions.
    type Binding: Copy + Default;

    /// Materialize a completed rule, operand or operator node.
    fn finish_node(&mut self, node: FinishNode<'_, Self::Node, Self::Binding>) -> Self::Node;

    /// Materialize a terminal.
    fn finish_token(&mut self, next_sibling: Option<Self::Node>, span: Span) -> Self::Node;

    /// Binding for a child opened in `slot` of a node bound to `parent`.
    ///
    /// Grammars without scoping can keep the default, which inherits.
    fn resolve_binding(&mut self, parent: Self::Binding, slot: u16) -> Self::Binding {
        let _ = slot;
        parent
    }

    /// Fixity and precedence of operator alternative `choice`.
    fn operator_info(&mut self, binding: Self::Binding, choice: u16) -> OperatorInfo;
}

impl<T: TreeBuilder + ?Sized> TreeBuilder for &mut T {
    type Node = T::Node;
    type Binding = T::Binding;

    fn finish_node(&mut self, node: FinishNode<'_, Self::Node, Self::Binding>) -> Self::Node {
        (**self).finish_node(node)
    }

    fn finish_token(&mut self, next_sibling: Option<Self::Node>, span: Span) -> Self::Node {
        (**self).finish_token(next_sibling, span)
    }

    fn resolve_binding(&mut self, parent: Self::Binding, slot: u16) -> Self::Binding {
        (**self).resolve_binding(parent, slot)
    }

    fn operator_info(&mut self, binding: Self::Binding, choice: u16) -> OperatorInfo {
        (**self).operator_info(binding, choice)
    }
}
