//! Virtual keyboard: layout grid, press gating and error banner.
//!
//! A [`KeyboardLayout`] maps `(row, column)` positions to [`KeySlot`]s and
//! is immutable once built. The [`Keyboard`] widget turns presses into
//! [`KeyPress`] emissions unless it is disabled, and carries an optional
//! error message for the banner above the keys.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use thiserror::Error;
use tracing::{debug, trace};

use crate::types::{KeyPress, BACK_TOKEN};

/// Closure invoked by an action slot. Returning `Some` emits that press.
pub type KeyAction = Rc<dyn Fn() -> Option<KeyPress>>;

/// Receiver of emitted key presses.
pub type KeyPressHandler = Rc<dyn Fn(KeyPress)>;

/// Errors raised while building a keyboard layout.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// The layout has no rows or no columns.
    #[error("keyboard layout must have at least one row and one column")]
    EmptyLayout,

    /// A slot was placed outside the grid.
    #[error("slot ({row}, {column}) is outside the {rows}x{columns} layout")]
    SlotOutOfBounds {
        row: usize,
        column: usize,
        rows: usize,
        columns: usize,
    },

    /// A grid row does not match the width of the first row.
    #[error("layout row {row} has {found} slots, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
}

// =============================================================================
// Layout
// =============================================================================

/// Content of one keyboard position.
#[derive(Clone)]
pub enum KeySlot {
    /// Inert, rendered empty.
    Blank,
    /// Emits its value verbatim.
    Literal(String),
    /// Runs `action` instead of emitting a literal.
    Action { label: String, action: KeyAction },
}

impl KeySlot {
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal(value.into())
    }

    pub fn action(label: impl Into<String>, action: impl Fn() -> Option<KeyPress> + 'static) -> Self {
        Self::Action {
            label: label.into(),
            action: Rc::new(action),
        }
    }

    /// The backspace action slot.
    pub fn back() -> Self {
        Self::action(BACK_TOKEN, || Some(KeyPress::Back))
    }

    /// Text shown on the key; blank slots have none.
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Blank => None,
            Self::Literal(value) => Some(value),
            Self::Action { label, .. } => Some(label),
        }
    }

    /// Returns `true` for an empty grid cell.
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Blank)
    }

    /// Returns `true` for the backspace action slot.
    pub fn is_back(&self) -> bool {
        matches!(self, Self::Action { label, .. } if label == BACK_TOKEN)
    }
}

impl fmt::Debug for KeySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blank => f.write_str("Blank"),
            Self::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Self::Action { label, .. } => f.debug_struct("Action").field("label", label).finish(),
        }
    }
}

/// Fixed grid of key slots.
#[derive(Debug, Clone)]
pub struct KeyboardLayout {
    rows: usize,
    columns: usize,
    slots: BTreeMap<(usize, usize), KeySlot>,
}

impl KeyboardLayout {
    /// Starts a `rows x columns` layout with every slot blank.
    pub fn builder(rows: usize, columns: usize) -> LayoutBuilder {
        LayoutBuilder {
            rows,
            columns,
            slots: BTreeMap::new(),
        }
    }

    /// The phone-style numeric pad: `1-9` in three rows, then a blank,
    /// `0` and backspace.
    pub fn numeric() -> Self {
        let mut slots = BTreeMap::new();
        for digit in 1..=9usize {
            let index = digit - 1;
            slots.insert((index / 3, index % 3), KeySlot::literal(digit.to_string()));
        }
        slots.insert((3, 1), KeySlot::literal("0"));
        slots.insert((3, 2), KeySlot::back());
        Self {
            rows: 4,
            columns: 3,
            slots,
        }
    }

    /// Builds a layout from a rectangular grid. `None` cells are blank and
    /// the `"back"` token becomes the backspace action.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::EmptyLayout`] for an empty grid and
    /// [`LayoutError::RaggedRow`] when rows differ in width.
    pub fn from_grid(grid: &[Vec<Option<String>>]) -> Result<Self, LayoutError> {
        let rows = grid.len();
        let columns = grid.first().map_or(0, Vec::len);
        let mut builder = Self::builder(rows, columns);

        for (row, cells) in grid.iter().enumerate() {
            if cells.len() != columns {
                return Err(LayoutError::RaggedRow {
                    row,
                    expected: columns,
                    found: cells.len(),
                });
            }
            for (column, cell) in cells.iter().enumerate() {
                let slot = match cell.as_deref() {
                    None => continue,
                    Some(BACK_TOKEN) => KeySlot::back(),
                    Some(value) => KeySlot::literal(value),
                };
                builder = builder.slot(row, column, slot)?;
            }
        }
        builder.build()
    }

    /// Converts the layout back into the grid form used by configuration.
    /// Action slots other than backspace are written as their label.
    pub fn to_grid(&self) -> Vec<Vec<Option<String>>> {
        (0..self.rows)
            .map(|row| {
                (0..self.columns)
                    .map(|column| {
                        self.slot(row, column)
                            .and_then(KeySlot::label)
                            .map(str::to_owned)
                    })
                    .collect()
            })
            .collect()
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Slot at `(row, column)`; `None` outside the grid or for blanks.
    pub fn slot(&self, row: usize, column: usize) -> Option<&KeySlot> {
        self.slots
            .get(&(row, column))
            .filter(|slot| !slot.is_blank())
    }

    /// Non-blank slots in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), &KeySlot)> {
        self.slots
            .iter()
            .filter(|(_, slot)| !slot.is_blank())
            .map(|(pos, slot)| (*pos, slot))
    }

    /// First literal slot emitting `value`.
    pub fn position_of_literal(&self, value: &str) -> Option<(usize, usize)> {
        self.iter().find_map(|(pos, slot)| match slot {
            KeySlot::Literal(v) if v == value => Some(pos),
            _ => None,
        })
    }

    /// First backspace slot.
    pub fn position_of_back(&self) -> Option<(usize, usize)> {
        self.iter()
            .find_map(|(pos, slot)| slot.is_back().then_some(pos))
    }
}

impl Default for KeyboardLayout {
    fn default() -> Self {
        Self::numeric()
    }
}

/// Builder returned by [`KeyboardLayout::builder`].
#[derive(Debug)]
pub struct LayoutBuilder {
    rows: usize,
    columns: usize,
    slots: BTreeMap<(usize, usize), KeySlot>,
}

impl LayoutBuilder {
    /// Places `slot` at `(row, column)`, replacing any earlier slot there.
    pub fn slot(mut self, row: usize, column: usize, slot: KeySlot) -> Result<Self, LayoutError> {
        if row >= self.rows || column >= self.columns {
            return Err(LayoutError::SlotOutOfBounds {
                row,
                column,
                rows: self.rows,
                columns: self.columns,
            });
        }
        self.slots.insert((row, column), slot);
        Ok(self)
    }

    pub fn build(self) -> Result<KeyboardLayout, LayoutError> {
        if self.rows == 0 || self.columns == 0 {
            return Err(LayoutError::EmptyLayout);
        }
        Ok(KeyboardLayout {
            rows: self.rows,
            columns: self.columns,
            slots: self.slots,
        })
    }
}

// =============================================================================
// Keyboard widget
// =============================================================================

/// Result of a single press on the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressOutcome {
    /// A key press was delivered to the handler.
    Emitted,
    /// An action slot ran without emitting anything.
    Handled,
    /// Blank or out-of-range slot.
    Inert,
    /// The keyboard is disabled.
    Disabled,
}

#[derive(Debug, Default)]
struct KeyboardState {
    disabled: bool,
    error: Option<String>,
}

/// The keyboard widget.
pub struct Keyboard {
    layout: KeyboardLayout,
    on_key_press: KeyPressHandler,
    state: RefCell<KeyboardState>,
}

impl Keyboard {
    /// Creates an enabled keyboard delivering presses to `on_key_press`.
    pub fn new(layout: KeyboardLayout, on_key_press: KeyPressHandler) -> Rc<Self> {
        Rc::new(Self {
            layout,
            on_key_press,
            state: RefCell::new(KeyboardState::default()),
        })
    }

    pub fn layout(&self) -> &KeyboardLayout {
        &self.layout
    }

    /// Returns `true` while presses are rejected.
    pub fn is_disabled(&self) -> bool {
        self.state.borrow().disabled
    }

    /// Current error banner message.
    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    /// Presses the slot at `(row, column)`.
    pub fn press(&self, row: usize, column: usize) -> PressOutcome {
        if self.is_disabled() {
            trace!(row, column, "Press rejected; keyboard disabled");
            return PressOutcome::Disabled;
        }

        let press = match self.layout.slot(row, column) {
            None | Some(KeySlot::Blank) => {
                trace!(row, column, "Press on inert slot");
                return PressOutcome::Inert;
            }
            Some(KeySlot::Literal(value)) => Some(KeyPress::Symbol(value.clone())),
            Some(KeySlot::Action { action, .. }) => {
                let action = Rc::clone(action);
                action()
            }
        };

        match press {
            Some(press) => {
                trace!(row, column, back = press.is_back(), "Key press emitted");
                (self.on_key_press)(press);
                PressOutcome::Emitted
            }
            None => PressOutcome::Handled,
        }
    }

    /// Presses the first literal slot emitting `value`.
    pub fn press_symbol(&self, value: &str) -> PressOutcome {
        match self.layout.position_of_literal(value) {
            Some((row, column)) => self.press(row, column),
            None => PressOutcome::Inert,
        }
    }

    /// Presses the backspace slot, if the layout has one.
    pub fn press_back(&self) -> PressOutcome {
        match self.layout.position_of_back() {
            Some((row, column)) => self.press(row, column),
            None => PressOutcome::Inert,
        }
    }
}

impl crate::control::KeyboardControl for Keyboard {
    fn throw_error(&self, message: &str) {
        debug!("Keyboard error banner shown");
        self.state.borrow_mut().error = Some(message.to_owned());
    }

    fn clear_error(&self) {
        self.state.borrow_mut().error = None;
    }

    fn disable(&self) {
        debug!("Keyboard disabled");
        self.state.borrow_mut().disabled = true;
    }

    fn enable(&self) {
        debug!("Keyboard enabled");
        self.state.borrow_mut().disabled = false;
    }
}

impl fmt::Debug for Keyboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keyboard")
            .field("layout", &self.layout)
            .field("state", &self.state.borrow())
            .finish()
    }
}
