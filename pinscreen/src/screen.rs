//! Screen coordinator: the PIN accumulation state machine.
//!
//! [`PinScreen`] owns the [`PinBuffer`] and drives the indicator and the
//! keyboard through their control surfaces. It is a cheap, clonable handle
//! around shared single-threaded state; widgets hold a [`WeakPinScreen`] so
//! the coordinator's lifetime stays with its owner.
//!
//! # Phases
//!
//! ```text
//!            symbol (len < max)          report_error
//!  Entering ───────────────────▶ Complete ───────────▶ Locked
//!     ▲  ◀─── back / clear ───────┘                      │
//!     └───────────────────── shake settles ──────────────┘
//! ```
//!
//! User callbacks never run while the coordinator's state is borrowed, so a
//! completion callback may call [`PinScreen::report_error`] directly.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::debug;
use zeroize::Zeroizing;

use crate::animation::ShakeHandle;
use crate::buffer::{PinBuffer, DEFAULT_PIN_LENGTH};
use crate::control::{ControlSlot, Haptics, KeyboardControl, ShakeControl, KEY_PRESS_PULSE};
use crate::types::{KeyPress, ResetPolicy, ScreenPhase, SettleOutcome};

/// Called with the full PIN once the last symbol is entered.
pub type PinCompleteCallback = Rc<dyn Fn(&PinScreen, &str)>;

/// Called once per lockout after the error shake settles.
pub type ErrorAcknowledgedCallback = Rc<dyn Fn()>;

/// Behavioral options for a [`PinScreen`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenOptions {
    /// Number of symbols that completes a PIN.
    pub max_length: usize,
    /// Pulse haptics on every key press.
    pub key_vibration: bool,
    /// Buffer handling when a lockout ends.
    pub reset_policy: ResetPolicy,
}

impl Default for ScreenOptions {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_PIN_LENGTH,
            key_vibration: true,
            reset_policy: ResetPolicy::default(),
        }
    }
}

/// Owner notifications.
#[derive(Clone, Default)]
pub struct ScreenCallbacks {
    /// Called with the full PIN each time the buffer fills.
    pub on_pin_complete: Option<PinCompleteCallback>,
    /// Called once per lockout, after its shake settles.
    pub on_error_acknowledged: Option<ErrorAcknowledgedCallback>,
}

impl ScreenCallbacks {
    pub fn on_pin_complete(mut self, f: impl Fn(&PinScreen, &str) + 'static) -> Self {
        self.on_pin_complete = Some(Rc::new(f));
        self
    }

    pub fn on_error_acknowledged(mut self, f: impl Fn() + 'static) -> Self {
        self.on_error_acknowledged = Some(Rc::new(f));
        self
    }
}

struct ScreenCore {
    buffer: PinBuffer,
    options: ScreenOptions,
    locked: bool,
    haptics: Rc<dyn Haptics>,
    callbacks: ScreenCallbacks,
    indicator: ControlSlot<dyn ShakeControl>,
    keyboard: ControlSlot<dyn KeyboardControl>,
}

/// The screen coordinator.
#[derive(Clone)]
pub struct PinScreen {
    core: Rc<RefCell<ScreenCore>>,
}

/// Non-owning reference to a [`PinScreen`].
#[derive(Clone)]
pub struct WeakPinScreen {
    core: Weak<RefCell<ScreenCore>>,
}

impl WeakPinScreen {
    /// Returns the screen if its owner still holds it.
    pub fn upgrade(&self) -> Option<PinScreen> {
        self.core.upgrade().map(|core| PinScreen { core })
    }
}

impl PinScreen {
    /// Creates a screen with an empty buffer and no widgets registered.
    pub fn new(options: ScreenOptions, haptics: Rc<dyn Haptics>, callbacks: ScreenCallbacks) -> Self {
        let buffer = PinBuffer::new(options.max_length);
        Self {
            core: Rc::new(RefCell::new(ScreenCore {
                buffer,
                options,
                locked: false,
                haptics,
                callbacks,
                indicator: ControlSlot::new("indicator"),
                keyboard: ControlSlot::new("keyboard"),
            })),
        }
    }

    /// Weak handle for widgets that call back into the screen.
    pub fn downgrade(&self) -> WeakPinScreen {
        WeakPinScreen {
            core: Rc::downgrade(&self.core),
        }
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Registers or clears the indicator control surface.
    pub fn attach_indicator(&self, indicator: Option<Weak<dyn ShakeControl>>) {
        self.core.borrow_mut().indicator.register(indicator);
    }

    /// Registers or clears the keyboard control surface.
    pub fn attach_keyboard(&self, keyboard: Option<Weak<dyn KeyboardControl>>) {
        self.core.borrow_mut().keyboard.register(keyboard);
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Current phase, derived from the lock flag and buffer length.
    pub fn phase(&self) -> ScreenPhase {
        let core = self.core.borrow();
        if core.locked {
            ScreenPhase::Locked
        } else if core.buffer.is_full() {
            ScreenPhase::Complete
        } else {
            ScreenPhase::Entering
        }
    }

    /// Number of entered symbols; also the indicator's active slot count.
    pub fn len(&self) -> usize {
        self.core.borrow().buffer.len()
    }

    /// Returns `true` when no symbol is entered.
    pub fn is_empty(&self) -> bool {
        self.core.borrow().buffer.is_empty()
    }

    /// Returns `true` between `report_error` and the end of its lockout.
    pub fn is_locked(&self) -> bool {
        self.core.borrow().locked
    }

    /// Number of symbols that completes a PIN.
    pub fn max_length(&self) -> usize {
        self.core.borrow().buffer.max_length()
    }

    /// Copy of the options the screen was built with.
    pub fn options(&self) -> ScreenOptions {
        self.core.borrow().options.clone()
    }

    /// Current buffer contents, wiped when the returned value is dropped.
    pub fn value(&self) -> Zeroizing<String> {
        self.core.borrow().buffer.value()
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Applies one key press from the keyboard.
    pub fn on_key_press(&self, key: KeyPress) {
        let (pulse, completed) = {
            let mut core = self.core.borrow_mut();
            let pulse = core.options.key_vibration.then(|| Rc::clone(&core.haptics));

            let completed = match key {
                KeyPress::Back => {
                    core.buffer.pop();
                    None
                }
                KeyPress::Symbol(symbol) => {
                    if core.buffer.push(&symbol) && core.buffer.is_full() {
                        Some((core.callbacks.on_pin_complete.clone(), core.buffer.value()))
                    } else {
                        None
                    }
                }
            };
            (pulse, completed)
        };

        if let Some(haptics) = pulse {
            haptics.pulse(KEY_PRESS_PULSE);
        }

        if let Some((callback, value)) = completed {
            debug!(length = value.chars().count(), "PIN entry complete");
            if let Some(callback) = callback {
                callback(self, &value);
            }
        }
    }

    /// Resynchronizes the buffer to an owner-supplied value (`None` empties
    /// it). Does not report completion.
    pub fn on_external_reset(&self, value: Option<&str>) {
        let mut core = self.core.borrow_mut();
        core.buffer.reset_from(value);
        debug!(length = core.buffer.len(), "PIN reset externally");
    }

    /// Signals a failed attempt: shake the indicator, show `message` on the
    /// keyboard and disable it until the shake settles.
    ///
    /// Without a registered indicator the lockout ends immediately. The
    /// returned handle resolves when the lockout's shake does.
    pub fn report_error(&self, message: &str) -> ShakeHandle {
        let (indicator, keyboard) = {
            let mut core = self.core.borrow_mut();
            core.locked = true;
            (core.indicator.get(), core.keyboard.get())
        };
        debug!("Error reported; locking keyboard");

        let handle = indicator.map(|indicator| self.shake_indicator(indicator));

        if let Some(keyboard) = keyboard {
            keyboard.throw_error(message);
            keyboard.disable();
        }

        match handle {
            Some(handle) if handle.outcome() != Some(SettleOutcome::Cancelled) => handle,
            _ => {
                debug!("No running indicator; ending lockout immediately");
                self.on_shake_complete();
                ShakeHandle::resolved(SettleOutcome::Settled)
            }
        }
    }

    /// Hides the keyboard's error banner. Lock state and buffer are kept.
    pub fn clear_error(&self) {
        let keyboard = self.core.borrow().keyboard.get();
        if let Some(keyboard) = keyboard {
            keyboard.clear_error();
        }
    }

    /// Empties the buffer regardless of lock state.
    pub fn clear_pin(&self) {
        self.core.borrow_mut().buffer.clear();
    }

    /// Ends a lockout: applies the reset policy, notifies the owner and
    /// re-enables the keyboard.
    ///
    /// The acknowledgement may re-enter the screen. A `report_error` from
    /// inside it starts a new lockout and the keyboard stays disabled; an
    /// `on_external_reset` from inside it is kept.
    pub fn on_shake_complete(&self) {
        let acknowledged = {
            let mut core = self.core.borrow_mut();
            core.locked = false;
            if core.options.reset_policy == ResetPolicy::ClearOnSettle {
                core.buffer.clear();
            }
            core.callbacks.on_error_acknowledged.clone()
        };
        debug!("Lockout ended");

        if let Some(acknowledged) = acknowledged {
            acknowledged();
        }

        let keyboard = {
            let core = self.core.borrow();
            if core.locked {
                debug!("Lockout restarted during acknowledgement");
                None
            } else {
                core.keyboard.get()
            }
        };
        if let Some(keyboard) = keyboard {
            keyboard.enable();
        }
    }

    /// Shakes a freshly registered indicator for a lockout whose shake was
    /// lost (the previous indicator was unmounted mid-shake).
    ///
    /// Returns `None` when the screen is not locked or no indicator is
    /// registered.
    pub fn resume_lockout(&self) -> Option<ShakeHandle> {
        let indicator = {
            let core = self.core.borrow();
            if !core.locked {
                return None;
            }
            core.indicator.get()
        }?;
        debug!("Resuming lockout shake");
        Some(self.shake_indicator(indicator))
    }

    fn shake_indicator(&self, indicator: Rc<dyn ShakeControl>) -> ShakeHandle {
        let screen = self.downgrade();
        indicator.shake(Some(Box::new(move || {
            if let Some(screen) = screen.upgrade() {
                screen.on_shake_complete();
            }
        })))
    }
}

impl fmt::Debug for PinScreen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.core.borrow();
        f.debug_struct("PinScreen")
            .field("buffer", &core.buffer)
            .field("locked", &core.locked)
            .field("options", &core.options)
            .field("indicator", &core.indicator)
            .field("keyboard", &core.keyboard)
            .finish()
    }
}
