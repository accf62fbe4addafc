//! Construction actions.
//!
//! An [`Action`] is one instruction of the stream a recognizer emits while it
//! unwinds a successful parse. Streams describe the input right to left: the
//! action that opens a node arrives at the node's end, and siblings, operands
//! and operators arrive last-in-source first.
//!
//! Generated parse tables store actions as [`PackedAction`] words.

use std::fmt;

use crate::error::PackError;

/// Opaque source offsets carried through the engine.
///
/// The engine never compares or adjusts locations; it only copies them from
/// the opening action into the node and hands them to the builder.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    /// Empty span at offset zero.
    pub const DUMMY: Span = Span { start: 0, end: 0 };

    #[inline]
    pub const fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// The nine action kinds, in tag order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ActionKind {
    /// Push a rule node that will fill `slot` of the current top node.
    OpenSlot = 0,
    /// Pop the top rule node and store it into its parent's slot.
    CloseSlot = 1,
    /// Materialize a terminal directly into `slot` of the top node.
    TokenSlot = 2,
    /// Start an operator-precedence parse for `slot` of the top node.
    OpenExpression = 3,
    /// Reduce the current expression and store its value.
    CloseExpression = 4,
    /// Push an operand candidate node.
    OpenOperand = 5,
    /// Push an operator candidate node.
    OpenOperator = 6,
    /// Move the top operand node onto the expression's value stack.
    CloseOperand = 7,
    /// Move the top operator node onto the expression's operator stack.
    CloseOperator = 8,
}

impl ActionKind {
    /// All kinds, indexed by tag.
    pub const ALL: [ActionKind; 9] = [
        ActionKind::OpenSlot,
        ActionKind::CloseSlot,
        ActionKind::TokenSlot,
        ActionKind::OpenExpression,
        ActionKind::CloseExpression,
        ActionKind::OpenOperand,
        ActionKind::OpenOperator,
        ActionKind::CloseOperand,
        ActionKind::CloseOperator,
    ];

    /// Snake-case name, as used in logs and replay scripts.
    pub const fn name(self) -> &'static str {
        match self {
            ActionKind::OpenSlot => "open_slot",
            ActionKind::CloseSlot => "close_slot",
            ActionKind::TokenSlot => "token",
            ActionKind::OpenExpression => "open_expr",
            ActionKind::CloseExpression => "close_expr",
            ActionKind::OpenOperand => "open_operand",
            ActionKind::OpenOperator => "open_operator",
            ActionKind::CloseOperand => "close_operand",
            ActionKind::CloseOperator => "close_operator",
        }
    }

    /// Inverse of [`ActionKind::name`].
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Look up a kind by its numeric tag.
    pub fn from_tag(tag: u8) -> Option<Self> {
        Self::ALL.get(usize::from(tag)).copied()
    }

    #[inline]
    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Whether the kind reads `Action::slot`.
    pub const fn uses_slot(self) -> bool {
        matches!(
            self,
            ActionKind::OpenSlot | ActionKind::TokenSlot | ActionKind::OpenExpression
        )
    }

    /// Whether the kind reads `Action::choice`.
    pub const fn uses_choice(self) -> bool {
        matches!(
            self,
            ActionKind::OpenSlot | ActionKind::OpenOperand | ActionKind::OpenOperator
        )
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One construction action.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Action {
    pub kind: ActionKind,
    /// Slot in the parent rule (slot-family kinds).
    pub slot: u16,
    /// Grammar alternative (`OpenSlot`, `OpenOperand`, `OpenOperator`).
    pub choice: u16,
    pub span: Span,
}

impl Action {
    #[inline]
    pub const fn new(kind: ActionKind, slot: u16, choice: u16) -> Self {
        Action {
            kind,
            slot,
            choice,
            span: Span::DUMMY,
        }
    }

    pub const fn open_slot(slot: u16, choice: u16) -> Self {
        Self::new(ActionKind::OpenSlot, slot, choice)
    }

    pub const fn close_slot() -> Self {
        Self::new(ActionKind::CloseSlot, 0, 0)
    }

    pub const fn token(slot: u16) -> Self {
        Self::new(ActionKind::TokenSlot, slot, 0)
    }

    pub const fn open_expression(slot: u16) -> Self {
        Self::new(ActionKind::OpenExpression, slot, 0)
    }

    pub const fn close_expression() -> Self {
        Self::new(ActionKind::CloseExpression, 0, 0)
    }

    pub const fn open_operand(choice: u16) -> Self {
        Self::new(ActionKind::OpenOperand, 0, choice)
    }

    pub const fn open_operator(choice: u16) -> Self {
        Self::new(ActionKind::OpenOperator, 0, choice)
    }

    pub const fn close_operand() -> Self {
        Self::new(ActionKind::CloseOperand, 0, 0)
    }

    pub const fn close_operator() -> Self {
        Self::new(ActionKind::CloseOperator, 0, 0)
    }

    /// Attach source offsets.
    #[must_use]
    pub const fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Encode into a table word. Fields the kind does not use are dropped.
    pub fn pack(&self) -> Result<PackedAction, PackError> {
        let slot = if self.kind.uses_slot() { self.slot } else { 0 };
        let choice = if self.kind.uses_choice() { self.choice } else { 0 };
        if slot > MAX_PACKED_INDEX {
            return Err(PackError::FieldOverflow {
                field: "slot",
                value: slot,
            });
        }
        if choice > MAX_PACKED_INDEX {
            return Err(PackError::FieldOverflow {
                field: "choice",
                value: choice,
            });
        }
        Ok(PackedAction(
            (u32::from(self.kind.tag()) << KIND_SHIFT)
                | (u32::from(slot) << SLOT_SHIFT)
                | u32::from(choice),
        ))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind.name())?;
        if self.kind.uses_slot() {
            write!(f, " slot={}", self.slot)?;
        }
        if self.kind.uses_choice() {
            write!(f, " choice={}", self.choice)?;
        }
        if self.span != Span::DUMMY {
            write!(f, " @{}", self.span)?;
        }
        Ok(())
    }
}

/// Largest slot or choice index a [`PackedAction`] can hold.
pub const MAX_PACKED_INDEX: u16 = (1 << 14) - 1;

const KIND_SHIFT: u32 = 28;
const SLOT_SHIFT: u32 = 14;
const FIELD_MASK: u32 = (1 << 14) - 1;

/// Compact action word: kind in bits 28..32, slot in bits 14..28, choice in
/// bits 0..14. Locations are not packed; tables keep them alongside.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct PackedAction(u32);

impl PackedAction {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        PackedAction(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Decode the kind tag.
    pub fn kind(self) -> Result<ActionKind, PackError> {
        // Four bits after the shift, so the cast is lossless.
        #[expect(clippy::cast_possible_truncation, reason = "tag is masked to 4 bits")]
        let tag = (self.0 >> KIND_SHIFT) as u8;
        ActionKind::from_tag(tag).ok_or(PackError::UnknownKind(tag))
    }

    /// Rebuild the action, attaching `span`.
    pub fn unpack(self, span: Span) -> Result<Action, PackError> {
        let kind = self.kind()?;
        #[expect(clippy::cast_possible_truncation, reason = "fields are masked to 14 bits")]
        let (slot, choice) = (
            ((self.0 >> SLOT_SHIFT) & FIELD_MASK) as u16,
            (self.0 & FIELD_MASK) as u16,
        );
        Ok(Action::new(kind, slot, choice).with_span(span))
    }
}
