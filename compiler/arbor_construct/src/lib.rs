//! Arbor construction engine.
//!
//! Turns a flat stream of construction [`Action`]s into a finished tree. The
//! same engine backs both the grammar interpreter and the code the grammar
//! compiler generates, so it commits to nothing about the finished tree:
//! every node is materialized through a caller-supplied [`TreeBuilder`].
//!
//! - [`Constructor`]: the action interpreter and its two stacks
//! - [`should_reduce`] and the reducer: operator-precedence grouping for
//!   prefix, postfix, left-, right- and flat-infix operators
//! - a recycling pool for intermediate records, observable via
//!   [`ConstructStats`]
//! - [`reference`]: an owned-tree builder used by tooling and tests
//!
//! # Example
//!
//! ```
//! use arbor_construct::reference::{ArenaBuilder, ExprScript, OperatorTable};
//! use arbor_construct::{Constructor, Fixity};
//!
//! let table = OperatorTable::new()
//!     .with_operator(1, "+", Fixity::InfixLeft, 1)
//!     .with_operator(2, "*", Fixity::InfixLeft, 2);
//! let script = ExprScript::new(0)
//!     .operand(0, "1")
//!     .operator(1)
//!     .operand(0, "2")
//!     .operator(2)
//!     .operand(0, "3");
//!
//! let builder = ArenaBuilder::new(table).with_tokens(script.tokens());
//! let mut constructor = Constructor::new(builder, 0);
//! constructor.apply_all(script.actions()).unwrap();
//! let (builder, slots) = constructor.finish().unwrap();
//!
//! assert_eq!(builder.render_chain(slots[0]), "+(1, *(2, 3))");
//! ```

mod action;
mod builder;
mod config;
mod constructor;
mod error;
mod fixity;
mod node;
mod pool;
pub mod reference;

pub use action::{Action, ActionKind, PackedAction, Span, MAX_PACKED_INDEX};
pub use builder::{FinishNode, TreeBuilder};
pub use config::{ConstructConfig, DEFAULT_EXPRESSION_CAPACITY, DEFAULT_NODE_CAPACITY, MAX_SLOTS};
pub use constructor::{should_reduce, ConstructStats, Constructor};
pub use error::{ConstructError, PackError, PoolKind, Violation};
pub use fixity::{Fixity, OperatorInfo};
pub use node::NodeRole;
pub use pool::PoolStats;
