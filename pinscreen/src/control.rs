//! Control surfaces exchanged between widgets.
//!
//! Child widgets expose narrow imperative interfaces ([`ShakeControl`],
//! [`KeyboardControl`]) and register weak references to them with the
//! coordinator on mount. The coordinator keeps each registration in a
//! [`ControlSlot`]; calls against an empty or dropped slot do nothing.
//!
//! Haptic feedback is fire-and-forget through [`Haptics`].

use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

use tracing::{debug, trace};

use crate::animation::ShakeHandle;

/// Vibration length for a key press.
pub const KEY_PRESS_PULSE: Duration = Duration::from_millis(50);

/// Vibration length at the start of a shake.
pub const SHAKE_PULSE: Duration = Duration::from_millis(500);

/// Callback run once when a shake comes to rest.
pub type SettleCallback = Box<dyn FnOnce()>;

/// Imperative surface of the pin indicator.
pub trait ShakeControl {
    /// Restarts the shake animation. `on_settle` runs once the animation
    /// rests, unless a later shake or an unmount intervenes.
    fn shake(&self, on_settle: Option<SettleCallback>) -> ShakeHandle;
}

/// Imperative surface of the keyboard.
pub trait KeyboardControl {
    /// Shows `message` in the error banner.
    fn throw_error(&self, message: &str);
    /// Hides the error banner.
    fn clear_error(&self);
    /// Rejects all presses until [`enable`](KeyboardControl::enable).
    fn disable(&self);
    fn enable(&self);
}

/// Weak, optional registration of a child control surface.
pub struct ControlSlot<C: ?Sized> {
    target: Option<Weak<C>>,
    name: &'static str,
}

impl<C: ?Sized> ControlSlot<C> {
    /// Creates an empty slot. `name` is only used in log output.
    pub fn new(name: &'static str) -> Self {
        Self { target: None, name }
    }

    /// Registers (`Some`) or clears (`None`) the target.
    pub fn register(&mut self, target: Option<Weak<C>>) {
        debug!(
            slot = self.name,
            attached = target.is_some(),
            "Control surface registration changed"
        );
        self.target = target;
    }

    /// Returns the live target, if any.
    pub fn get(&self) -> Option<Rc<C>> {
        let target = self.target.as_ref().and_then(Weak::upgrade);
        if target.is_none() {
            trace!(slot = self.name, "Control surface absent; call skipped");
        }
        target
    }

    /// Returns `true` when a target is registered and still alive.
    pub fn is_attached(&self) -> bool {
        self.target
            .as_ref()
            .is_some_and(|weak| weak.strong_count() > 0)
    }
}

impl<C: ?Sized> fmt::Debug for ControlSlot<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlSlot")
            .field("name", &self.name)
            .field("attached", &self.is_attached())
            .finish()
    }
}

/// Haptic feedback collaborator. Implementations must not block.
pub trait Haptics {
    fn pulse(&self, duration: Duration);
}

/// Haptics that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHaptics;

impl Haptics for NoHaptics {
    fn pulse(&self, _duration: Duration) {}
}

/// Haptics that records each pulse as a tracing event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingHaptics;

impl Haptics for TracingHaptics {
    fn pulse(&self, duration: Duration) {
        debug!(duration_ms = duration.as_millis() as u64, "Haptic pulse");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Counter(Cell<u32>);

    impl KeyboardControl for Counter {
        fn throw_error(&self, _message: &str) {
            self.0.set(self.0.get() + 1);
        }
        fn clear_error(&self) {}
        fn disable(&self) {}
        fn enable(&self) {}
    }

    #[test]
    fn empty_slot_yields_nothing() {
        let slot: ControlSlot<dyn KeyboardControl> = ControlSlot::new("keyboard");
        assert!(slot.get().is_none());
        assert!(!slot.is_attached());
    }

    #[test]
    fn registered_slot_reaches_target() {
        let target = Rc::new(Counter(Cell::new(0)));
        let mut slot: ControlSlot<dyn KeyboardControl> = ControlSlot::new("keyboard");
        let weak: Weak<dyn KeyboardControl> = Rc::downgrade(&target) as Weak<dyn KeyboardControl>;
        slot.register(Some(weak));

        assert!(slot.is_attached());
        if let Some(keyboard) = slot.get() {
            keyboard.throw_error("nope");
        }
        assert_eq!(target.0.get(), 1);
    }

    #[test]
    fn dropped_target_reads_as_absent() {
        let mut slot: ControlSlot<dyn KeyboardControl> = ControlSlot::new("keyboard");
        {
            let target = Rc::new(Counter(Cell::new(0)));
            let weak: Weak<dyn KeyboardControl> =
                Rc::downgrade(&target) as Weak<dyn KeyboardControl>;
            slot.register(Some(weak));
        }
        assert!(!slot.is_attached());
        assert!(slot.get().is_none());
    }

    #[test]
    fn clearing_registration_detaches() {
        let target = Rc::new(Counter(Cell::new(0)));
        let mut slot: ControlSlot<dyn KeyboardControl> = ControlSlot::new("keyboard");
        let weak: Weak<dyn KeyboardControl> = Rc::downgrade(&target) as Weak<dyn KeyboardControl>;
        slot.register(Some(weak));
        slot.register(None);
        assert!(slot.get().is_none());
    }

    #[test]
    fn pulse_lengths() {
        assert_eq!(KEY_PRESS_PULSE.as_millis(), 50);
        assert_eq!(SHAKE_PULSE.as_millis(), 500);
        NoHaptics.pulse(KEY_PRESS_PULSE);
        TracingHaptics.pulse(SHAKE_PULSE);
    }
}
