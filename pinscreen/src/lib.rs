//! Pinscreen - numeric PIN entry with a shaking indicator.
//!
//! A [`PinScreen`] collects key presses from a [`Keyboard`] into a bounded
//! buffer. Once the buffer is full the host's completion callback decides
//! whether the PIN is correct. A rejected PIN is reported back through
//! [`PinScreen::report_error`], which shakes the [`PinIndicator`], disables
//! the keyboard with a message and re-enables it once the shake settles.
//!
//! The screen talks to its widgets only through the control traits in
//! [`control`]. Widgets register weak handles; a call against a widget that
//! is not mounted is a no-op.
//!
//! # Modules
//!
//! - [`types`]: key presses, screen phases and settle outcomes
//! - [`buffer`]: the zeroizing PIN buffer
//! - [`animation`]: spring physics, keyframe interpolation and shake handles
//! - [`control`]: widget control traits, registration slots and haptics
//! - [`indicator`]: the pin indicator and its shake animation
//! - [`keyboard`]: keyboard layouts and the virtual keyboard
//! - [`screen`]: the PIN screen coordinator
//! - [`mount`]: wiring of screen, indicator and keyboard with mount/unmount
//! - [`config`]: configuration from file and environment
//! - [`error`]: error types
//! - [`tui`]: terminal front-end

pub mod animation;
pub mod buffer;
pub mod config;
pub mod control;
pub mod error;
pub mod indicator;
pub mod keyboard;
pub mod mount;
pub mod screen;
pub mod tui;
pub mod types;

pub use animation::{ShakeHandle, Spring, SpringConfig};
pub use buffer::{PinBuffer, DEFAULT_PIN_LENGTH};
pub use config::{Config, ConfigError};
pub use control::{ControlSlot, Haptics, KeyboardControl, NoHaptics, ShakeControl, TracingHaptics};
pub use error::{PinError, Result, TuiError};
pub use indicator::PinIndicator;
pub use keyboard::{Keyboard, KeyboardLayout, KeySlot, LayoutError, PressOutcome};
pub use mount::MountedScreen;
pub use screen::{PinScreen, ScreenCallbacks, ScreenOptions};
pub use types::{KeyPress, ResetPolicy, ScreenPhase, SettleOutcome};
