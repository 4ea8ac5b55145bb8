//! Terminal front-end for the PIN screen.
//!
//! The front-end is a thin shell around [`MountedScreen`](crate::mount::MountedScreen):
//!
//! - [`app`]: application state, demo verifier and the event loop
//! - [`ui`]: frame layout (header with tagline and indicator, footer with keyboard)
//! - [`terminal`]: raw mode and alternate screen handling with panic restore
//! - [`widgets`]: indicator and keyboard widgets
//!
//! # Usage
//!
//! ```ignore
//! use pinscreen::tui::{install_panic_hook, ui, AppState, Tui};
//!
//! install_panic_hook();
//! let mut tui = Tui::new()?;
//! tui.draw(|frame| ui::render(frame, &state))?;
//! ```

pub mod app;
pub mod terminal;
pub mod ui;
pub mod widgets;

pub use app::{AppState, EventHandler, Symbols, Theme, TuiEvent};
pub use terminal::{install_panic_hook, Tui};
