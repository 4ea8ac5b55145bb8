//! Segmented pin indicator with shake feedback.
//!
//! The indicator renders `number_of_pins` slots, the first `active` of which
//! are filled. Its only transient state is the shake animation, driven by
//! [`PinIndicator::tick`] from the frame loop.
//!
//! A shake is restart-safe: calling [`ShakeControl::shake`] while a shake is
//! running resolves the running one as [`SettleOutcome::Superseded`] (its
//! callback is dropped unfired) and starts over from progress 0.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

use tracing::{debug, trace};

use crate::animation::{
    CancelShake, Keyframes, ShakeCompletion, ShakeHandle, Spring, SpringConfig, SHAKE_KEYFRAMES,
};
use crate::control::{Haptics, SettleCallback, ShakeControl, SHAKE_PULSE};
use crate::types::SettleOutcome;

struct ActiveShake {
    generation: u64,
    spring: Spring,
    on_settle: Option<SettleCallback>,
    completion: ShakeCompletion,
}

struct IndicatorState {
    progress: f64,
    generation: u64,
    active: Option<ActiveShake>,
    mounted: bool,
}

/// The pin indicator widget.
pub struct PinIndicator {
    number_of_pins: usize,
    vibration: bool,
    haptics: Rc<dyn Haptics>,
    spring: SpringConfig,
    keyframes: Keyframes<6>,
    state: RefCell<IndicatorState>,
    this: Weak<PinIndicator>,
}

impl PinIndicator {
    /// Creates a mounted indicator with the default spring and keyframes.
    pub fn new(number_of_pins: usize, vibration: bool, haptics: Rc<dyn Haptics>) -> Rc<Self> {
        Self::with_spring(number_of_pins, vibration, haptics, SpringConfig::default())
    }

    /// Creates a mounted indicator driven by a custom spring.
    pub fn with_spring(
        number_of_pins: usize,
        vibration: bool,
        haptics: Rc<dyn Haptics>,
        spring: SpringConfig,
    ) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            number_of_pins,
            vibration,
            haptics,
            spring,
            keyframes: SHAKE_KEYFRAMES,
            state: RefCell::new(IndicatorState {
                progress: 0.0,
                generation: 0,
                active: None,
                mounted: true,
            }),
            this: this.clone(),
        })
    }

    pub fn number_of_pins(&self) -> usize {
        self.number_of_pins
    }

    /// Slot fill states for `active` entered symbols.
    pub fn slots(&self, active: usize) -> Vec<bool> {
        (0..self.number_of_pins).map(|i| i < active).collect()
    }

    /// Current shake progress (0 at rest before any shake, 1 after one).
    pub fn progress(&self) -> f64 {
        self.state.borrow().progress
    }

    /// Current horizontal offset in layout units.
    pub fn offset(&self) -> f64 {
        self.keyframes.interpolate(self.progress())
    }

    /// Returns `true` while a shake is running.
    pub fn is_shaking(&self) -> bool {
        self.state.borrow().active.is_some()
    }

    /// Returns `false` once [`unmount`](Self::unmount) has run.
    pub fn is_mounted(&self) -> bool {
        self.state.borrow().mounted
    }

    /// Advances the running shake by `dt`. Returns `true` while a shake is
    /// still in flight after this step.
    ///
    /// When the shake comes to rest its handle resolves as
    /// [`SettleOutcome::Settled`] and its callback runs.
    pub fn tick(&self, dt: Duration) -> bool {
        let finished = {
            let mut state = self.state.borrow_mut();
            let Some(active) = state.active.as_mut() else {
                return false;
            };
            let progress = active.spring.advance(dt);
            let done = active.spring.is_done();
            state.progress = progress;
            trace!(progress, "Shake frame");
            if !done {
                return true;
            }
            state.active.take()
        };

        if let Some(shake) = finished {
            debug!(generation = shake.generation, "Shake settled");
            shake.completion.resolve(SettleOutcome::Settled);
            if let Some(on_settle) = shake.on_settle {
                on_settle();
            }
        }
        self.is_shaking()
    }

    /// Marks the indicator unmounted, cancelling any running shake. Later
    /// shakes resolve immediately as cancelled.
    pub fn unmount(&self) {
        let cancelled = {
            let mut state = self.state.borrow_mut();
            state.mounted = false;
            state.active.take()
        };
        if let Some(shake) = cancelled {
            debug!(generation = shake.generation, "Shake cancelled by unmount");
            shake.completion.resolve(SettleOutcome::Cancelled);
        }
    }

    fn canceller(&self) -> Weak<dyn CancelShake> {
        self.this.clone()
    }
}

impl ShakeControl for PinIndicator {
    fn shake(&self, on_settle: Option<SettleCallback>) -> ShakeHandle {
        if !self.is_mounted() {
            debug!("Shake requested on unmounted indicator");
            return ShakeHandle::resolved(SettleOutcome::Cancelled);
        }

        if self.vibration {
            self.haptics.pulse(SHAKE_PULSE);
        }

        let (handle, previous) = {
            let mut state = self.state.borrow_mut();
            state.generation += 1;
            let generation = state.generation;
            let (completion, handle) = ShakeHandle::pair(generation, Some(self.canceller()));
            state.progress = 0.0;
            let previous = state.active.replace(ActiveShake {
                generation,
                spring: Spring::new(self.spring, 0.0, 1.0),
                on_settle,
                completion,
            });
            debug!(generation, "Shake started");
            (handle, previous)
        };

        if let Some(previous) = previous {
            debug!(generation = previous.generation, "Shake superseded");
            previous.completion.resolve(SettleOutcome::Superseded);
        }
        handle
    }
}

impl CancelShake for PinIndicator {
    fn cancel_shake(&self, generation: u64) {
        let cancelled = {
            let mut state = self.state.borrow_mut();
            match state.active.as_ref() {
                Some(active) if active.generation == generation => {
                    state.progress = 1.0;
                    state.active.take()
                }
                _ => None,
            }
        };
        if let Some(shake) = cancelled {
            debug!(generation, "Shake cancelled");
            shake.completion.resolve(SettleOutcome::Cancelled);
        }
    }
}

impl fmt::Debug for PinIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("PinIndicator")
            .field("number_of_pins", &self.number_of_pins)
            .field("vibration", &self.vibration)
            .field("progress", &state.progress)
            .field("shaking", &state.active.is_some())
            .field("mounted", &state.mounted)
            .finish()
    }
}
