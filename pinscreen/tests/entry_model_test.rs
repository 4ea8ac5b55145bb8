//! Model-based property tests for PIN entry.
//!
//! Random sequences of presses, lockout settles and external resets are
//! applied both to a mounted screen and to a small reference model. After
//! every step the two must agree on buffer contents, lock state and the
//! completions the owner has seen.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use pinscreen::control::NoHaptics;
use pinscreen::keyboard::{KeyboardLayout, PressOutcome};
use pinscreen::mount::MountedScreen;
use pinscreen::screen::{ScreenCallbacks, ScreenOptions};
use pinscreen::types::{ResetPolicy, ScreenPhase};
use proptest::prelude::*;

const FRAME: Duration = Duration::from_millis(16);

/// PIN the owner accepts; every other complete PIN is rejected.
const ACCEPTED: &str = "1234";

#[derive(Debug, Clone)]
enum Operation {
    Digit(u8),
    Back,
    /// Run the indicator until any running shake settles.
    Settle,
    ExternalReset(Option<String>),
}

#[derive(Debug, Default)]
struct Model {
    buffer: Vec<char>,
    locked: bool,
    completions: Vec<String>,
}

impl Model {
    fn apply(&mut self, op: &Operation, max_length: usize, policy: ResetPolicy) -> PressOutcome {
        match op {
            Operation::Digit(d) => {
                if self.locked {
                    return PressOutcome::Disabled;
                }
                if self.buffer.len() < max_length {
                    self.buffer.push(char::from(b'0' + d));
                    if self.buffer.len() == max_length {
                        let pin: String = self.buffer.iter().collect();
                        self.locked = pin != ACCEPTED;
                        self.completions.push(pin);
                    }
                }
                PressOutcome::Emitted
            }
            Operation::Back => {
                if self.locked {
                    return PressOutcome::Disabled;
                }
                self.buffer.pop();
                PressOutcome::Emitted
            }
            Operation::Settle => {
                if self.locked {
                    self.locked = false;
                    if policy == ResetPolicy::ClearOnSettle {
                        self.buffer.clear();
                    }
                }
                PressOutcome::Handled
            }
            Operation::ExternalReset(value) => {
                self.buffer = value
                    .as_deref()
                    .unwrap_or_default()
                    .chars()
                    .take(max_length)
                    .collect();
                PressOutcome::Handled
            }
        }
    }

    fn phase(&self, max_length: usize) -> ScreenPhase {
        if self.locked {
            ScreenPhase::Locked
        } else if self.buffer.len() == max_length {
            ScreenPhase::Complete
        } else {
            ScreenPhase::Entering
        }
    }
}

struct Real {
    mounted: MountedScreen,
    completions: Rc<RefCell<Vec<String>>>,
}

impl Real {
    fn new(max_length: usize, policy: ResetPolicy) -> Self {
        let completions = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&completions);
        let callbacks = ScreenCallbacks::default().on_pin_complete(move |screen, pin| {
            seen.borrow_mut().push(pin.to_string());
            if pin != ACCEPTED {
                screen.report_error("Wrong PIN");
            }
        });
        let options = ScreenOptions {
            max_length,
            key_vibration: false,
            reset_policy: policy,
        };
        let mounted = MountedScreen::new(
            options,
            KeyboardLayout::numeric(),
            false,
            Rc::new(NoHaptics),
            callbacks,
        );
        Self {
            mounted,
            completions,
        }
    }

    fn apply(&self, op: &Operation) -> PressOutcome {
        match op {
            Operation::Digit(d) => self.mounted.press_symbol(&d.to_string()),
            Operation::Back => self.mounted.press_back(),
            Operation::Settle => {
                for _ in 0..500 {
                    if !self.mounted.tick(FRAME) {
                        break;
                    }
                }
                PressOutcome::Handled
            }
            Operation::ExternalReset(value) => {
                self.mounted.screen().on_external_reset(value.as_deref());
                PressOutcome::Handled
            }
        }
    }
}

fn operation_strategy() -> impl Strategy<Value = Operation> {
    prop_oneof![
        6 => (0u8..10).prop_map(Operation::Digit),
        2 => Just(Operation::Back),
        2 => Just(Operation::Settle),
        1 => proptest::option::of("[0-9]{0,8}").prop_map(Operation::ExternalReset),
    ]
}

fn policy_strategy() -> impl Strategy<Value = ResetPolicy> {
    prop_oneof![Just(ResetPolicy::ClearOnSettle), Just(ResetPolicy::Keep)]
}

proptest! {
    /// The mounted screen tracks the reference model step by step.
    #[test]
    fn screen_matches_model(
        max_length in 1usize..7,
        policy in policy_strategy(),
        ops in proptest::collection::vec(operation_strategy(), 0..80),
    ) {
        let real = Real::new(max_length, policy);
        let mut model = Model::default();

        for (i, op) in ops.iter().enumerate() {
            let expected = model.apply(op, max_length, policy);
            let actual = real.apply(op);
            prop_assert_eq!(actual, expected, "Outcome diverged at step {}: {:?}", i, op);

            let screen = real.mounted.screen();
            let value: String = model.buffer.iter().collect();
            let screen_value = screen.value();
            prop_assert_eq!(screen_value.as_str(), value.as_str(), "Buffer diverged at step {}", i);
            prop_assert!(screen.len() <= max_length);
            prop_assert_eq!(screen.phase(), model.phase(max_length));
            prop_assert_eq!(real.mounted.keyboard_disabled(), model.locked);
            prop_assert_eq!(&*real.completions.borrow(), &model.completions);
        }
    }

    /// Indicator slots always mirror the buffer length.
    #[test]
    fn slots_mirror_buffer(
        ops in proptest::collection::vec(operation_strategy(), 0..40),
    ) {
        let real = Real::new(5, ResetPolicy::ClearOnSettle);
        for op in &ops {
            real.apply(op);
            let slots = real.mounted.slots();
            prop_assert_eq!(slots.len(), 5);
            let active = slots.iter().take_while(|s| **s).count();
            prop_assert_eq!(active, real.mounted.screen().len());
            prop_assert!(slots[active..].iter().all(|s| !*s));
        }
    }
}
