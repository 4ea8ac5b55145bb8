//! Widgets for the terminal PIN screen.
//!
//! - [`indicator`]: one glyph per PIN slot, shifted horizontally while shaking
//! - [`keyboard`]: the key grid and the error banner above it
//!
//! Widgets are stateless. They borrow what they draw from
//! [`AppState`](crate::tui::app::AppState) for a single frame.

pub mod indicator;
pub mod keyboard;

pub use indicator::{offset_columns, IndicatorWidget, LAYOUT_UNITS_PER_COLUMN};
pub use keyboard::{keyboard_size, ErrorBannerWidget, KeyboardWidget, KEY_GAP, KEY_HEIGHT, KEY_WIDTH};
