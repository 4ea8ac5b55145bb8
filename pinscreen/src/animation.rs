//! Spring-driven shake animation primitives.
//!
//! The indicator's shake is modelled as a normalized progress value driven
//! from 0 to 1 by a damped harmonic oscillator, then mapped onto horizontal
//! offsets through a keyframe table.
//!
//! # Spring model
//!
//! [`Spring`] solves the oscillator analytically from elapsed time, so the
//! trajectory does not depend on how often it is sampled. Parameters follow
//! the familiar "origami" tension/friction scale; the default
//! (tension 40, friction 7) gives a slightly underdamped spring that settles
//! in a little under a second.
//!
//! # Completion
//!
//! Every shake produces a [`ShakeHandle`]. The handle resolves exactly once
//! with a [`SettleOutcome`] and can be awaited through [`ShakeHandle::settled`]
//! or polled synchronously with [`ShakeHandle::outcome`].

use std::cell::Cell;
use std::future::Future;
use std::pin::Pin;
use std::rc::{Rc, Weak};
use std::task::{Context, Poll};
use std::time::Duration;

use futures::channel::oneshot;

use crate::types::SettleOutcome;

/// Default spring tension.
pub const DEFAULT_TENSION: f64 = 40.0;

/// Default spring friction.
pub const DEFAULT_FRICTION: f64 = 7.0;

/// Default rest threshold for both displacement and speed.
pub const DEFAULT_REST_THRESHOLD: f64 = 0.001;

/// Progress stops for the shake keyframes.
pub const SHAKE_INPUTS: [f64; 6] = [0.0, 0.2, 0.4, 0.6, 0.8, 1.0];

/// Horizontal offsets (layout units) matching [`SHAKE_INPUTS`].
pub const SHAKE_OUTPUTS: [f64; 6] = [0.0, -20.0, 20.0, -20.0, 20.0, 0.0];

/// Keyframe table used by the pin indicator shake.
pub const SHAKE_KEYFRAMES: Keyframes<6> = Keyframes::new(SHAKE_INPUTS, SHAKE_OUTPUTS);

// =============================================================================
// Spring
// =============================================================================

/// Physical parameters of a damped spring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringConfig {
    /// Spring constant `k`.
    pub stiffness: f64,
    /// Damping coefficient `c`.
    pub damping: f64,
    pub mass: f64,
    /// The spring may rest once `|to - position|` is at or below this.
    pub rest_displacement_threshold: f64,
    /// The spring may rest once `|velocity|` is at or below this.
    pub rest_speed_threshold: f64,
}

impl SpringConfig {
    /// Builds a config from origami-style tension and friction values.
    ///
    /// # Example
    ///
    /// ```
    /// use pinscreen::animation::SpringConfig;
    ///
    /// let config = SpringConfig::from_tension_friction(40.0, 7.0);
    /// assert!((config.stiffness - 230.2).abs() < 1e-9);
    /// assert!((config.damping - 22.0).abs() < 1e-9);
    /// ```
    pub fn from_tension_friction(tension: f64, friction: f64) -> Self {
        Self {
            stiffness: (tension - 30.0) * 3.62 + 194.0,
            damping: (friction - 8.0) * 3.0 + 25.0,
            mass: 1.0,
            rest_displacement_threshold: DEFAULT_REST_THRESHOLD,
            rest_speed_threshold: DEFAULT_REST_THRESHOLD,
        }
    }

    /// Damping ratio of this spring (`< 1` oscillates).
    pub fn damping_ratio(&self) -> f64 {
        self.damping / (2.0 * (self.stiffness * self.mass).sqrt())
    }
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self::from_tension_friction(DEFAULT_TENSION, DEFAULT_FRICTION)
    }
}

/// A spring animation from one value to another.
#[derive(Debug, Clone)]
pub struct Spring {
    config: SpringConfig,
    from: f64,
    to: f64,
    initial_velocity: f64,
    elapsed: Duration,
    position: f64,
    velocity: f64,
    done: bool,
}

impl Spring {
    /// Creates a spring at rest at `from`, heading to `to`.
    pub fn new(config: SpringConfig, from: f64, to: f64) -> Self {
        Self {
            config,
            from,
            to,
            initial_velocity: 0.0,
            elapsed: Duration::ZERO,
            position: from,
            velocity: 0.0,
            done: false,
        }
    }

    /// Sets the starting velocity (units per second).
    pub fn with_initial_velocity(mut self, velocity: f64) -> Self {
        self.initial_velocity = velocity;
        self.velocity = velocity;
        self
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Returns `true` once the spring has come to rest at its target.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Advances the animation by `dt` and returns the new position.
    ///
    /// Once the spring rests, the position snaps to the target and further
    /// calls are no-ops.
    pub fn advance(&mut self, dt: Duration) -> f64 {
        if self.done {
            return self.position;
        }
        self.elapsed += dt;
        let (position, velocity) = self.sample(self.elapsed.as_secs_f64());
        self.position = position;
        self.velocity = velocity;

        let resting_speed = velocity.abs() <= self.config.rest_speed_threshold;
        let resting_displacement = self.config.stiffness == 0.0
            || (self.to - position).abs() <= self.config.rest_displacement_threshold;
        if resting_speed && resting_displacement {
            self.position = self.to;
            self.velocity = 0.0;
            self.done = true;
        }
        self.position
    }

    /// Evaluates position and velocity at `t` seconds after the start.
    pub fn sample(&self, t: f64) -> (f64, f64) {
        let SpringConfig {
            stiffness: k,
            damping: c,
            mass: m,
            ..
        } = self.config;

        let zeta = c / (2.0 * (k * m).sqrt());
        let omega0 = (k / m).sqrt();
        let x0 = self.to - self.from;
        let v0 = -self.initial_velocity;

        if zeta < 1.0 {
            let omega1 = omega0 * (1.0 - zeta * zeta).sqrt();
            let envelope = (-zeta * omega0 * t).exp();
            let a = (v0 + zeta * omega0 * x0) / omega1;
            let (sin, cos) = (omega1 * t).sin_cos();

            let position = self.to - envelope * (a * sin + x0 * cos);
            let velocity = zeta * omega0 * envelope * (sin * a + x0 * cos)
                - envelope * (cos * (v0 + zeta * omega0 * x0) - omega1 * x0 * sin);
            (position, velocity)
        } else {
            let envelope = (-omega0 * t).exp();
            let position = self.to - envelope * (x0 + (v0 + omega0 * x0) * t);
            let velocity = envelope * (v0 * (t * omega0 - 1.0) + t * x0 * omega0 * omega0);
            (position, velocity)
        }
    }
}

// =============================================================================
// Keyframes
// =============================================================================

/// Piecewise-linear mapping from progress to output, extended linearly
/// beyond the first and last stops.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframes<const N: usize> {
    inputs: [f64; N],
    outputs: [f64; N],
}

impl<const N: usize> Keyframes<N> {
    /// `inputs` must be strictly increasing and `N >= 2`.
    pub const fn new(inputs: [f64; N], outputs: [f64; N]) -> Self {
        assert!(N >= 2, "keyframes need at least two stops");
        Self { inputs, outputs }
    }

    pub fn inputs(&self) -> &[f64; N] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[f64; N] {
        &self.outputs
    }

    /// Maps `x` onto the output range.
    pub fn interpolate(&self, x: f64) -> f64 {
        let mut segment = 0;
        for i in 1..N - 1 {
            if self.inputs[i] >= x {
                break;
            }
            segment = i;
        }

        let (in_lo, in_hi) = (self.inputs[segment], self.inputs[segment + 1]);
        let (out_lo, out_hi) = (self.outputs[segment], self.outputs[segment + 1]);
        if in_hi == in_lo {
            return out_lo;
        }
        let ratio = (x - in_lo) / (in_hi - in_lo);
        out_lo + ratio * (out_hi - out_lo)
    }
}

// =============================================================================
// Shake handles
// =============================================================================

/// Something that can abort a running shake by generation.
pub trait CancelShake {
    fn cancel_shake(&self, generation: u64);
}

/// Producer half of a shake's completion; owned by the animating widget.
///
/// Dropping it unresolved resolves the handle as [`SettleOutcome::Cancelled`].
pub struct ShakeCompletion {
    outcome: Rc<Cell<Option<SettleOutcome>>>,
    sender: Option<oneshot::Sender<SettleOutcome>>,
}

impl ShakeCompletion {
    /// Resolves the shake. Only the first resolution is recorded.
    pub fn resolve(mut self, outcome: SettleOutcome) {
        self.finish(outcome);
    }

    fn finish(&mut self, outcome: SettleOutcome) {
        if self.outcome.get().is_none() {
            self.outcome.set(Some(outcome));
        }
        if let Some(sender) = self.sender.take() {
            // The receiver may already be gone; that is fine.
            let _ = sender.send(outcome);
        }
    }
}

impl std::fmt::Debug for ShakeCompletion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShakeCompletion")
            .field("outcome", &self.outcome.get())
            .finish()
    }
}

impl Drop for ShakeCompletion {
    fn drop(&mut self) {
        if self.sender.is_some() {
            self.finish(SettleOutcome::Cancelled);
        }
    }
}

/// Consumer half of a shake: observe or cancel it.
pub struct ShakeHandle {
    generation: u64,
    outcome: Rc<Cell<Option<SettleOutcome>>>,
    receiver: oneshot::Receiver<SettleOutcome>,
    canceller: Option<Weak<dyn CancelShake>>,
}

impl ShakeHandle {
    /// Creates a linked completion/handle pair.
    pub fn pair(
        generation: u64,
        canceller: Option<Weak<dyn CancelShake>>,
    ) -> (ShakeCompletion, ShakeHandle) {
        let outcome = Rc::new(Cell::new(None));
        let (sender, receiver) = oneshot::channel();
        (
            ShakeCompletion {
                outcome: Rc::clone(&outcome),
                sender: Some(sender),
            },
            ShakeHandle {
                generation,
                outcome,
                receiver,
                canceller,
            },
        )
    }

    /// A handle that is already resolved with `outcome`.
    pub fn resolved(outcome: SettleOutcome) -> Self {
        let (completion, handle) = Self::pair(0, None);
        completion.resolve(outcome);
        handle
    }

    /// Generation number of the shake this handle tracks.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns the outcome if the shake has resolved.
    pub fn outcome(&self) -> Option<SettleOutcome> {
        self.outcome.get()
    }

    /// Returns `true` once an outcome is recorded.
    pub fn is_resolved(&self) -> bool {
        self.outcome.get().is_some()
    }

    /// Aborts the shake if it is still the current one. The settle callback
    /// will not run and the handle resolves as `Cancelled`.
    pub fn cancel(&self) {
        if self.is_resolved() {
            return;
        }
        if let Some(target) = self.canceller.as_ref().and_then(Weak::upgrade) {
            target.cancel_shake(self.generation);
        }
    }

    /// Future resolving to the shake's outcome.
    pub fn settled(self) -> Settled {
        Settled {
            outcome: self.outcome,
            receiver: self.receiver,
        }
    }
}

impl std::fmt::Debug for ShakeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShakeHandle")
            .field("generation", &self.generation)
            .field("outcome", &self.outcome.get())
            .finish()
    }
}

/// Future returned by [`ShakeHandle::settled`].
pub struct Settled {
    outcome: Rc<Cell<Option<SettleOutcome>>>,
    receiver: oneshot::Receiver<SettleOutcome>,
}

impl Future for Settled {
    type Output = SettleOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(oneshot::Canceled)) => {
                Poll::Ready(self.outcome.get().unwrap_or(SettleOutcome::Cancelled))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
