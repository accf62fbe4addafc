//! Expression reducer.
//!
//! Operators and operands of an expression wait on two stacks until an
//! incoming operator, or the end of the expression, shows how they group.
//! Because streams run right to left, the top of the value stack is the
//! leftmost pending operand and the top of the operator stack is the leftmost
//! pending operator.
//!
//! Each [`Constructor::reduce`] removes at least one operator, so draining an
//! expression always terminates.
//!
//! Before an action reduces anything, [`DrainPlan`] replays the same
//! reductions on operand counts alone. A stream that would run short is
//! rejected while the builder has seen none of the action's data.

use smallvec::SmallVec;

use super::{Constructor, ExprHandle, NodeHandle};
use crate::builder::TreeBuilder;
use crate::error::Violation;
use crate::fixity::{Fixity, OperatorInfo};

/// Whether `top` must be combined before `incoming` is pushed.
///
/// Lower incoming precedence always reduces. On a tie the *incoming*
/// operator's associativity decides: a right-associative incoming operator
/// lets the operator to its right finish first.
pub fn should_reduce(incoming: OperatorInfo, top: Option<OperatorInfo>) -> bool {
    let Some(top) = top else {
        return false;
    };
    incoming.precedence < top.precedence
        || (incoming.precedence == top.precedence && incoming.fixity == Fixity::InfixRight)
}

/// An operator waiting on the stack, as far as grouping is concerned.
#[derive(Copy, Clone, Debug)]
struct Pending {
    info: OperatorInfo,
    choice: u16,
}

/// Operand-count model of one expression's stacks.
#[derive(Debug)]
pub(super) struct DrainPlan {
    values: usize,
    operators: SmallVec<[Pending; 8]>,
}

impl DrainPlan {
    /// The reductions `close_operator` runs for `incoming`.
    pub(super) fn close_operator(
        mut self,
        incoming: OperatorInfo,
        choice: u16,
    ) -> Result<(), Violation> {
        while should_reduce(incoming, self.operators.last().map(|top| top.info)) {
            self.reduce()?;
        }
        self.operators.push(Pending { info: incoming, choice });
        if incoming.fixity == Fixity::Prefix {
            self.reduce()?;
        }
        Ok(())
    }

    /// The reductions `close_expression` runs, and the single value it must
    /// leave behind.
    pub(super) fn close_expression(mut self) -> Result<(), Violation> {
        while !self.operators.is_empty() {
            self.reduce()?;
        }
        if self.values > 1 {
            return Err(Violation::ExpressionNotReduced {
                remaining: self.values,
            });
        }
        Ok(())
    }

    fn reduce(&mut self) -> Result<(), Violation> {
        let Some(top) = self.operators.last().copied() else {
            return Ok(());
        };
        let (operators, needed) = match top.info.fixity {
            Fixity::InfixFlat => {
                let run = self
                    .operators
                    .iter()
                    .rev()
                    .take_while(|pending| pending.choice == top.choice)
                    .count();
                (run, run + 1)
            }
            Fixity::InfixLeft | Fixity::InfixRight => (1, 2),
            Fixity::Prefix | Fixity::Postfix => (1, 1),
        };
        if self.values < needed {
            return Err(Violation::MissingOperands {
                needed,
                available: self.values,
            });
        }
        self.operators.truncate(self.operators.len() - operators);
        self.values = self.values - needed + 1;
        Ok(())
    }
}

impl<B: TreeBuilder> Constructor<B> {
    /// Snapshot the counts of `expr_id` for a dry run of its reductions.
    pub(super) fn drain_plan(&self, expr_id: ExprHandle<B>) -> Result<DrainPlan, Violation> {
        let expr = self.expressions.get(expr_id)?;
        let operators = expr
            .operators
            .iter()
            .map(|&id| {
                let node = self.nodes.get(id)?;
                Ok(Pending {
                    info: node.operator,
                    choice: node.choice_index,
                })
            })
            .collect::<Result<_, Violation>>()?;
        Ok(DrainPlan {
            values: expr.values.len(),
            operators,
        })
    }

    pub(super) fn should_reduce_into(
        &self,
        expr_id: ExprHandle<B>,
        incoming: OperatorInfo,
    ) -> Result<bool, Violation> {
        let top = match self.expressions.get(expr_id)?.operators.last() {
            Some(&id) => Some(self.nodes.get(id)?.operator),
            None => None,
        };
        Ok(should_reduce(incoming, top))
    }

    /// Combine the top operator with the values it applies to. The operator
    /// node itself becomes the new value.
    pub(super) fn reduce(&mut self, expr_id: ExprHandle<B>) -> Result<(), Violation> {
        let Some(&op_id) = self.expressions.get(expr_id)?.operators.last() else {
            return Ok(());
        };
        let fixity = self.nodes.get(op_id)?.operator.fixity;
        match fixity {
            Fixity::InfixFlat => self.reduce_flat(expr_id, op_id),
            Fixity::InfixLeft | Fixity::InfixRight => self.reduce_binary(expr_id, op_id),
            Fixity::Prefix | Fixity::Postfix => self.reduce_unary(expr_id, op_id),
        }
    }

    fn reduce_unary(&mut self, expr_id: ExprHandle<B>, op_id: NodeHandle<B>) -> Result<(), Violation> {
        let expr = self.expressions.get_mut(expr_id)?;
        let Some(value) = expr.values.pop() else {
            return Err(Violation::MissingOperands {
                needed: 1,
                available: 0,
            });
        };
        expr.operators.pop();

        let prior = self.nodes.get_mut(op_id)?.operand.take();
        let operand = self.materialize(value, prior)?;
        self.nodes.get_mut(op_id)?.operand = Some(operand);
        self.expressions.get_mut(expr_id)?.values.push(op_id);
        tracing::debug!("reduced unary operator");
        Ok(())
    }

    fn reduce_binary(&mut self, expr_id: ExprHandle<B>, op_id: NodeHandle<B>) -> Result<(), Violation> {
        let expr = self.expressions.get_mut(expr_id)?;
        let available = expr.values.len();
        let [.., right, left] = expr.values.as_slice() else {
            return Err(Violation::MissingOperands {
                needed: 2,
                available,
            });
        };
        let (left, right) = (*left, *right);
        expr.values.truncate(available - 2);
        expr.operators.pop();

        let prior = self.nodes.get_mut(op_id)?.left.take();
        let left = self.materialize(left, prior)?;
        let prior = self.nodes.get_mut(op_id)?.right.take();
        let right = self.materialize(right, prior)?;

        let op = self.nodes.get_mut(op_id)?;
        op.left = Some(left);
        op.right = Some(right);
        self.expressions.get_mut(expr_id)?.values.push(op_id);
        tracing::debug!("reduced binary operator");
        Ok(())
    }

    /// Collapse a run of same-choice flat operators and the values between
    /// them into the leftmost operator, whose `operand` chain then lists the
    /// values in source order.
    fn reduce_flat(&mut self, expr_id: ExprHandle<B>, op_id: NodeHandle<B>) -> Result<(), Violation> {
        let choice = self.nodes.get(op_id)?.choice_index;
        let expr = self.expressions.get(expr_id)?;
        let mut run = 0usize;
        for &id in expr.operators.iter().rev() {
            if self.nodes.get(id)?.choice_index != choice {
                break;
            }
            run += 1;
        }
        let needed = run + 1;
        let available = expr.values.len();
        if available < needed {
            return Err(Violation::MissingOperands { needed, available });
        }

        let expr = self.expressions.get_mut(expr_id)?;
        let operator_base = expr.operators.len() - run;
        let absorbed: SmallVec<[NodeHandle<B>; 4]> = expr.operators.drain(operator_base..).collect();
        // Rightmost value first.
        let values: SmallVec<[NodeHandle<B>; 8]> = expr.values.drain(available - needed..).collect();

        // Linking each value in front of the previous result leaves the
        // leftmost value at the head of the chain.
        let mut chain = self.nodes.get_mut(op_id)?.operand.take();
        for value in values {
            chain = Some(self.materialize(value, chain)?);
        }

        // Only the leftmost operator's record survives; the others' slots are
        // dropped with them.
        for id in absorbed {
            if id != op_id {
                self.nodes.free(id)?;
            }
        }
        self.nodes.get_mut(op_id)?.operand = chain;
        self.expressions.get_mut(expr_id)?.values.push(op_id);
        tracing::debug!(operators = run, values = needed, "collapsed flat operator run");
        Ok(())
    }
}
