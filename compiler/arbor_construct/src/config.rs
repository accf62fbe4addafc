//! Constructor configuration.

/// Default slot capacity of every rule node.
///
/// Grammar analysis normally supplies the real value: the largest number of
/// slots any rule declares.
pub const MAX_SLOTS: usize = 8;

/// Node records pre-allocated by a fresh constructor.
pub const DEFAULT_NODE_CAPACITY: usize = 32;

/// Expression records pre-allocated by a fresh constructor.
pub const DEFAULT_EXPRESSION_CAPACITY: usize = 4;

/// Configuration for a [`Constructor`](crate::Constructor).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstructConfig {
    /// Slots per rule node. Slot indices at or above this are rejected.
    pub slot_count: usize,

    /// Initial node pool capacity.
    pub node_capacity: usize,

    /// Initial expression pool capacity.
    pub expression_capacity: usize,

    /// Live node records allowed at once; `None` means only the handle space
    /// bounds the pool.
    pub max_live_nodes: Option<usize>,

    /// Live expression records allowed at once.
    pub max_live_expressions: Option<usize>,
}

impl Default for ConstructConfig {
    fn default() -> Self {
        Self {
            slot_count: MAX_SLOTS,
            node_capacity: DEFAULT_NODE_CAPACITY,
            expression_capacity: DEFAULT_EXPRESSION_CAPACITY,
            max_live_nodes: None,
            max_live_expressions: None,
        }
    }
}

impl ConstructConfig {
    /// Create a config with the given slot capacity.
    pub fn with_slot_count(slot_count: usize) -> Self {
        Self {
            slot_count,
            ..Default::default()
        }
    }

    /// Create a config that caps both pools.
    pub fn with_limits(max_live_nodes: usize, max_live_expressions: usize) -> Self {
        Self {
            max_live_nodes: Some(max_live_nodes),
            max_live_expressions: Some(max_live_expressions),
            ..Default::default()
        }
    }
}
