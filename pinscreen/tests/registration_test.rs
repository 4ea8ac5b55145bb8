//! Integration tests for widget registration.
//!
//! The screen holds only weak handles to its widgets. Mounting, unmounting
//! and dropping widgets must never panic, and calls against widgets that are
//! gone are no-ops.

use std::cell::Cell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use pinscreen::control::{KeyboardControl, NoHaptics, ShakeControl};
use pinscreen::indicator::PinIndicator;
use pinscreen::keyboard::{Keyboard, KeyboardLayout, PressOutcome};
use pinscreen::mount::MountedScreen;
use pinscreen::screen::{PinScreen, ScreenCallbacks, ScreenOptions};
use pinscreen::types::{KeyPress, ScreenPhase, SettleOutcome};

const FRAME: Duration = Duration::from_millis(16);

fn counting_callbacks(acks: &Rc<Cell<u32>>) -> ScreenCallbacks {
    let acks = Rc::clone(acks);
    ScreenCallbacks::default().on_error_acknowledged(move || acks.set(acks.get() + 1))
}

fn mounted(acks: &Rc<Cell<u32>>) -> MountedScreen {
    MountedScreen::new(
        ScreenOptions::default(),
        KeyboardLayout::numeric(),
        false,
        Rc::new(NoHaptics),
        counting_callbacks(acks),
    )
}

#[test]
fn screen_without_widgets_accepts_every_call() {
    let acks = Rc::new(Cell::new(0));
    let screen = PinScreen::new(
        ScreenOptions::default(),
        Rc::new(NoHaptics),
        counting_callbacks(&acks),
    );

    screen.on_key_press(KeyPress::digit(1));
    screen.clear_error();
    let handle = screen.report_error("Wrong PIN");

    // No indicator: the lockout ends at once.
    assert_eq!(handle.outcome(), Some(SettleOutcome::Settled));
    assert_eq!(acks.get(), 1);
    assert_eq!(screen.phase(), ScreenPhase::Entering);
    assert!(screen.is_empty());
}

#[test]
fn unmount_indicator_during_shake_skips_settle_callback() {
    let acks = Rc::new(Cell::new(0));
    let mut mounted = mounted(&acks);

    let handle = mounted.screen().report_error("Wrong PIN");
    mounted.tick(FRAME);
    mounted.unmount_indicator();

    assert_eq!(handle.outcome(), Some(SettleOutcome::Cancelled));
    assert!(!mounted.tick(FRAME));
    assert_eq!(acks.get(), 0);
    assert!(mounted.screen().is_locked());

    // A later error with no indicator ends the lockout immediately.
    mounted.screen().report_error("Wrong PIN");
    assert_eq!(acks.get(), 1);
    assert!(!mounted.keyboard_disabled());
}

#[test]
fn remounting_indicator_ends_lockout_lost_to_unmount() {
    let acks = Rc::new(Cell::new(0));
    let mut mounted = mounted(&acks);

    mounted.screen().report_error("Wrong PIN");
    mounted.tick(FRAME);
    mounted.unmount_indicator();
    mounted.unmount_keyboard();
    mounted.mount_keyboard();
    assert_eq!(mounted.press_symbol("1"), PressOutcome::Disabled);

    mounted.mount_indicator();
    assert!(mounted.indicator().is_some_and(|indicator| indicator.is_shaking()));
    while mounted.tick(FRAME) {}

    assert_eq!(acks.get(), 1);
    assert!(!mounted.screen().is_locked());
    assert_eq!(mounted.press_symbol("1"), PressOutcome::Emitted);
}

#[test]
fn remounted_indicator_receives_new_shakes() {
    let acks = Rc::new(Cell::new(0));
    let mut mounted = mounted(&acks);

    mounted.unmount_indicator();
    assert!(mounted.indicator().is_none());
    assert!(mounted.slots().is_empty());
    mounted.mount_indicator();

    let handle = mounted.screen().report_error("Wrong PIN");
    assert_eq!(handle.outcome(), None);
    while mounted.tick(FRAME) {}
    assert_eq!(handle.outcome(), Some(SettleOutcome::Settled));
    assert_eq!(acks.get(), 1);
}

#[test]
fn unmounted_keyboard_makes_presses_inert() {
    let acks = Rc::new(Cell::new(0));
    let mut mounted = mounted(&acks);

    mounted.unmount_keyboard();
    assert_eq!(mounted.press_symbol("1"), PressOutcome::Inert);
    assert_eq!(mounted.keyboard_error(), None);

    mounted.screen().report_error("Wrong PIN");
    assert!(!mounted.keyboard_disabled());
    while mounted.tick(FRAME) {}
    assert_eq!(acks.get(), 1);

    mounted.mount_keyboard();
    assert_eq!(mounted.press_symbol("1"), PressOutcome::Emitted);
    assert_eq!(mounted.screen().len(), 1);
}

#[test]
fn dropped_widgets_are_treated_as_absent() {
    let acks = Rc::new(Cell::new(0));
    let screen = PinScreen::new(
        ScreenOptions::default(),
        Rc::new(NoHaptics),
        counting_callbacks(&acks),
    );

    {
        let indicator = PinIndicator::new(5, false, Rc::new(NoHaptics));
        let keyboard = Keyboard::new(KeyboardLayout::numeric(), Rc::new(|_: KeyPress| {}));
        screen.attach_indicator(Some(Rc::downgrade(&indicator) as Weak<dyn ShakeControl>));
        screen.attach_keyboard(Some(Rc::downgrade(&keyboard) as Weak<dyn KeyboardControl>));
    }

    let handle = screen.report_error("Wrong PIN");
    assert_eq!(handle.outcome(), Some(SettleOutcome::Settled));
    assert_eq!(acks.get(), 1);
}

#[test]
fn dropping_mounted_screen_cancels_running_shake() {
    let acks = Rc::new(Cell::new(0));
    let mounted = mounted(&acks);
    let handle = mounted.screen().report_error("Wrong PIN");
    drop(mounted);
    assert_eq!(handle.outcome(), Some(SettleOutcome::Cancelled));
    assert_eq!(acks.get(), 0);
}

#[test]
fn cancelled_handle_leaves_screen_locked() {
    let acks = Rc::new(Cell::new(0));
    let mounted = mounted(&acks);
    let handle = mounted.screen().report_error("Wrong PIN");

    handle.cancel();
    assert_eq!(handle.outcome(), Some(SettleOutcome::Cancelled));
    assert_eq!(mounted.indicator().map(|i| i.progress()), Some(1.0));
    assert!(mounted.keyboard_disabled());
    assert_eq!(acks.get(), 0);

    // The owner can end the lockout itself.
    mounted.screen().on_shake_complete();
    assert!(!mounted.keyboard_disabled());
    assert_eq!(acks.get(), 1);
}
