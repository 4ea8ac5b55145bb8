//! Composition of the three widgets into one mounted screen.
//!
//! [`MountedScreen`] plays the role of the view tree: it creates the
//! coordinator, mounts the indicator and keyboard, and registers their
//! control surfaces. Either child can be unmounted and remounted on its
//! own; dropping the tree unmounts both, cancelling any shake in flight.

use std::rc::{Rc, Weak};
use std::time::Duration;

use tracing::debug;

use crate::control::{Haptics, KeyboardControl, ShakeControl};
use crate::indicator::PinIndicator;
use crate::keyboard::{Keyboard, KeyboardLayout, PressOutcome};
use crate::screen::{PinScreen, ScreenCallbacks, ScreenOptions};

/// A coordinator with its indicator and keyboard mounted.
pub struct MountedScreen {
    screen: PinScreen,
    layout: KeyboardLayout,
    shake_vibration: bool,
    haptics: Rc<dyn Haptics>,
    indicator: Option<Rc<PinIndicator>>,
    keyboard: Option<Rc<Keyboard>>,
}

impl MountedScreen {
    /// Builds the coordinator and mounts both children.
    pub fn new(
        options: ScreenOptions,
        layout: KeyboardLayout,
        shake_vibration: bool,
        haptics: Rc<dyn Haptics>,
        callbacks: ScreenCallbacks,
    ) -> Self {
        let screen = PinScreen::new(options, Rc::clone(&haptics), callbacks);
        let mut mounted = Self {
            screen,
            layout,
            shake_vibration,
            haptics,
            indicator: None,
            keyboard: None,
        };
        mounted.mount_indicator();
        mounted.mount_keyboard();
        mounted
    }

    /// The coordinator.
    pub fn screen(&self) -> &PinScreen {
        &self.screen
    }

    /// The mounted indicator, if any.
    pub fn indicator(&self) -> Option<&Rc<PinIndicator>> {
        self.indicator.as_ref()
    }

    /// The mounted keyboard, if any.
    pub fn keyboard(&self) -> Option<&Rc<Keyboard>> {
        self.keyboard.as_ref()
    }

    pub fn layout(&self) -> &KeyboardLayout {
        &self.layout
    }

    /// Mounts a fresh indicator if none is mounted. A lockout whose shake
    /// was lost to an earlier unmount restarts on the new indicator.
    pub fn mount_indicator(&mut self) {
        if self.indicator.is_some() {
            return;
        }
        let indicator = PinIndicator::new(
            self.screen.max_length(),
            self.shake_vibration,
            Rc::clone(&self.haptics),
        );
        let weak: Weak<dyn ShakeControl> = Rc::downgrade(&indicator) as Weak<dyn ShakeControl>;
        self.screen.attach_indicator(Some(weak));
        self.indicator = Some(indicator);
        debug!("Indicator mounted");
        self.screen.resume_lockout();
    }

    /// Mounts a fresh keyboard if none is mounted. Its presses feed the
    /// coordinator through a weak handle. A keyboard mounted during a
    /// lockout starts disabled.
    pub fn mount_keyboard(&mut self) {
        if self.keyboard.is_some() {
            return;
        }
        let screen = self.screen.downgrade();
        let keyboard = Keyboard::new(
            self.layout.clone(),
            Rc::new(move |key| {
                if let Some(screen) = screen.upgrade() {
                    screen.on_key_press(key);
                }
            }),
        );
        if self.screen.is_locked() {
            keyboard.disable();
        }
        let weak: Weak<dyn KeyboardControl> = Rc::downgrade(&keyboard) as Weak<dyn KeyboardControl>;
        self.screen.attach_keyboard(Some(weak));
        self.keyboard = Some(keyboard);
        debug!("Keyboard mounted");
    }

    /// Unmounts the indicator, cancelling its shake. A lockout in flight
    /// stays until an indicator is mounted again.
    pub fn unmount_indicator(&mut self) {
        if let Some(indicator) = self.indicator.take() {
            indicator.unmount();
            self.screen.attach_indicator(None);
            debug!("Indicator unmounted");
        }
    }

    /// Unmounts the keyboard; presses become inert.
    pub fn unmount_keyboard(&mut self) {
        if self.keyboard.take().is_some() {
            self.screen.attach_keyboard(None);
            debug!("Keyboard unmounted");
        }
    }

    /// Advances animations by `dt`. Returns `true` while one is running.
    pub fn tick(&self, dt: Duration) -> bool {
        self.indicator
            .as_ref()
            .is_some_and(|indicator| indicator.tick(dt))
    }

    /// Current shake offset in layout units.
    pub fn offset(&self) -> f64 {
        self.indicator.as_ref().map_or(0.0, |indicator| indicator.offset())
    }

    /// Indicator slot fill states for the current buffer.
    pub fn slots(&self) -> Vec<bool> {
        let active = self.screen.len();
        self.indicator
            .as_ref()
            .map_or_else(Vec::new, |indicator| indicator.slots(active))
    }

    /// Presses the slot at `(row, column)`. Inert without a keyboard.
    pub fn press(&self, row: usize, column: usize) -> PressOutcome {
        self.keyboard
            .as_ref()
            .map_or(PressOutcome::Inert, |keyboard| keyboard.press(row, column))
    }

    pub fn press_symbol(&self, value: &str) -> PressOutcome {
        self.keyboard
            .as_ref()
            .map_or(PressOutcome::Inert, |keyboard| keyboard.press_symbol(value))
    }

    pub fn press_back(&self) -> PressOutcome {
        self.keyboard
            .as_ref()
            .map_or(PressOutcome::Inert, |keyboard| keyboard.press_back())
    }

    /// Returns `true` while a mounted keyboard is disabled.
    pub fn keyboard_disabled(&self) -> bool {
        self.keyboard
            .as_ref()
            .is_some_and(|keyboard| keyboard.is_disabled())
    }

    /// Error banner of the mounted keyboard.
    pub fn keyboard_error(&self) -> Option<String> {
        self.keyboard.as_ref().and_then(|keyboard| keyboard.error())
    }
}

impl Drop for MountedScreen {
    fn drop(&mut self) {
        self.unmount_indicator();
        self.unmount_keyboard();
    }
}

impl std::fmt::Debug for MountedScreen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MountedScreen")
            .field("screen", &self.screen)
            .field("indicator", &self.indicator)
            .field("keyboard", &self.keyboard)
            .finish()
    }
}
