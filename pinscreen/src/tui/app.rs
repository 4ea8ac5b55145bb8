//! Application state and event loop for the terminal PIN screen.
//!
//! [`AppState`] owns a [`MountedScreen`] plus the demo verifier that decides
//! whether a completed PIN is correct. [`EventHandler`] turns terminal input
//! and a fixed frame interval into [`TuiEvent`]s on an mpsc channel.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::style::{Color, Modifier, Style};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::config::Config;
use crate::control::Haptics;
use crate::error::{PinError, TuiError};
use crate::keyboard::PressOutcome;
use crate::mount::MountedScreen;
use crate::screen::ScreenCallbacks;

// =============================================================================
// Theme
// =============================================================================

/// Header background of the default theme.
pub const HEADER_BACKGROUND: Color = Color::Rgb(0xe2, 0xe2, 0xe2);

/// Footer background of the default theme.
pub const FOOTER_BACKGROUND: Color = Color::Rgb(0xff, 0xff, 0xff);

/// Error banner background of the default theme.
pub const ERROR_BACKGROUND: Color = Color::Rgb(0xda, 0x0f, 0x72);

/// Styles for every part of the screen.
///
/// # Example
///
/// ```
/// use pinscreen::tui::app::Theme;
///
/// let theme = Theme::from_env();
/// let mono = Theme::monochrome();
/// assert_eq!(mono.header.bg, None);
/// ```
#[derive(Debug, Clone)]
pub struct Theme {
    /// Header area behind the tagline and indicator.
    pub header: Style,
    pub tagline: Style,
    pub pin_active: Style,
    pub pin_inactive: Style,
    /// Footer area behind the keyboard.
    pub footer: Style,
    pub key: Style,
    /// Key under the selection cursor.
    pub key_selected: Style,
    /// Keys while the keyboard is disabled.
    pub key_disabled: Style,
    pub error_banner: Style,
    pub footer_text: Style,
    pub status_unlocked: Style,
    pub hint: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            header: Style::default().bg(HEADER_BACKGROUND).fg(Color::Black),
            tagline: Style::default()
                .bg(HEADER_BACKGROUND)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            pin_active: Style::default().bg(HEADER_BACKGROUND).fg(Color::Black),
            pin_inactive: Style::default().bg(HEADER_BACKGROUND).fg(Color::DarkGray),
            footer: Style::default().bg(FOOTER_BACKGROUND).fg(Color::Black),
            key: Style::default().bg(FOOTER_BACKGROUND).fg(Color::Black),
            key_selected: Style::default()
                .bg(Color::Black)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            key_disabled: Style::default().bg(FOOTER_BACKGROUND).fg(Color::Gray),
            error_banner: Style::default()
                .bg(ERROR_BACKGROUND)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            footer_text: Style::default().bg(FOOTER_BACKGROUND).fg(Color::DarkGray),
            status_unlocked: Style::default()
                .bg(HEADER_BACKGROUND)
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
            hint: Style::default().fg(Color::DarkGray),
        }
    }
}

impl Theme {
    /// Modifier-only theme for `NO_COLOR` terminals.
    #[must_use]
    pub fn monochrome() -> Self {
        Self {
            header: Style::default(),
            tagline: Style::default().add_modifier(Modifier::BOLD),
            pin_active: Style::default().add_modifier(Modifier::BOLD),
            pin_inactive: Style::default().add_modifier(Modifier::DIM),
            footer: Style::default(),
            key: Style::default(),
            key_selected: Style::default().add_modifier(Modifier::REVERSED),
            key_disabled: Style::default().add_modifier(Modifier::DIM),
            error_banner: Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            footer_text: Style::default().add_modifier(Modifier::DIM),
            status_unlocked: Style::default().add_modifier(Modifier::BOLD),
            hint: Style::default().add_modifier(Modifier::DIM),
        }
    }

    /// [`Theme::monochrome`] when `NO_COLOR` is set, otherwise the default.
    #[must_use]
    pub fn from_env() -> Self {
        if std::env::var("NO_COLOR").is_ok() {
            Self::monochrome()
        } else {
            Self::default()
        }
    }
}

// =============================================================================
// Symbols
// =============================================================================

/// Glyphs used by the widgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbols {
    pub pin_active: &'static str,
    pub pin_inactive: &'static str,
    /// Label drawn on the backspace key.
    pub back: &'static str,
    pub unlocked: &'static str,
    pub failure: &'static str,
}

pub const UNICODE_SYMBOLS: Symbols = Symbols {
    pin_active: "●",
    pin_inactive: "○",
    back: "⌫",
    unlocked: "✓",
    failure: "✗",
};

pub const ASCII_SYMBOLS: Symbols = Symbols {
    pin_active: "*",
    pin_inactive: "-",
    back: "<-",
    unlocked: "[+]",
    failure: "[x]",
};

impl Symbols {
    /// ASCII on the Linux console and VT100 terminals, unicode elsewhere.
    #[must_use]
    pub fn detect() -> Self {
        if std::env::var("TERM")
            .map(|t| t.contains("linux") || t.contains("vt100"))
            .unwrap_or(false)
        {
            ASCII_SYMBOLS
        } else {
            UNICODE_SYMBOLS
        }
    }
}

impl Default for Symbols {
    fn default() -> Self {
        Self::detect()
    }
}

// =============================================================================
// Application state
// =============================================================================

/// Outcome bookkeeping shared with the screen callbacks.
#[derive(Debug, Default)]
struct Session {
    failed_attempts: u32,
    unlocked: bool,
    /// Set when a lockout ends; the next key press hides the banner.
    banner_pending_clear: bool,
}

/// State of the interactive PIN screen.
pub struct AppState {
    pub mounted: MountedScreen,
    /// Keyboard cursor as `(row, column)`.
    pub selected: (usize, usize),
    pub tagline: String,
    pub footer: Option<String>,
    pub theme: Theme,
    pub symbols: Symbols,
    pub should_quit: bool,
    session: Rc<RefCell<Session>>,
}

impl AppState {
    /// Builds the screen from `config` with a verifier accepting
    /// [`Config::demo_pin`].
    ///
    /// # Errors
    ///
    /// Returns [`PinError::Layout`] if the configured layout is invalid.
    pub fn new(
        config: &Config,
        haptics: Rc<dyn Haptics>,
        theme: Theme,
        symbols: Symbols,
    ) -> Result<Self, PinError> {
        let layout = config.keyboard_layout()?;
        let session = Rc::new(RefCell::new(Session::default()));

        let expected = Zeroizing::new(config.demo_pin());
        let error_message = config.error_message.clone();
        let verdicts = Rc::clone(&session);
        let acknowledgements = Rc::clone(&session);
        let callbacks = ScreenCallbacks::default()
            .on_pin_complete(move |screen, pin| {
                if pin == expected.as_str() {
                    info!("PIN accepted");
                    verdicts.borrow_mut().unlocked = true;
                } else {
                    let attempts = {
                        let mut session = verdicts.borrow_mut();
                        session.failed_attempts += 1;
                        session.failed_attempts
                    };
                    info!(attempts, "PIN rejected");
                    screen.report_error(&error_message);
                }
            })
            .on_error_acknowledged(move || {
                acknowledgements.borrow_mut().banner_pending_clear = true;
            });

        let mounted = MountedScreen::new(
            config.screen_options(),
            layout,
            config.shake_vibration,
            haptics,
            callbacks,
        );

        Ok(Self {
            mounted,
            selected: (0, 0),
            tagline: config.tagline.clone(),
            footer: config.footer.clone(),
            theme,
            symbols,
            should_quit: false,
            session,
        })
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn is_unlocked(&self) -> bool {
        self.session.borrow().unlocked
    }

    pub fn failed_attempts(&self) -> u32 {
        self.session.borrow().failed_attempts
    }

    /// Applies one event from the [`EventHandler`].
    pub fn handle_event(&mut self, event: TuiEvent) {
        match event {
            TuiEvent::Tick(elapsed) => {
                self.mounted.tick(elapsed);
            }
            TuiEvent::Key(key) => {
                self.handle_key(key);
            }
            TuiEvent::Resize(_, _) => {}
        }
    }

    /// Maps a terminal key to a keyboard action. Returns the press outcome
    /// when the key reached the virtual keyboard.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<PressOutcome> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.quit();
            return None;
        }
        if key.code == KeyCode::Esc {
            self.quit();
            return None;
        }
        if self.is_unlocked() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Char('q')) {
                self.quit();
            }
            return None;
        }

        let outcome = match key.code {
            KeyCode::Char(c) => {
                let symbol = c.to_string();
                if self.mounted.layout().position_of_literal(&symbol).is_some() {
                    self.acknowledge_banner();
                    Some(self.mounted.press_symbol(&symbol))
                } else {
                    if c == 'q' {
                        self.quit();
                    }
                    None
                }
            }
            KeyCode::Backspace | KeyCode::Delete => {
                self.acknowledge_banner();
                Some(self.mounted.press_back())
            }
            KeyCode::Enter => {
                self.acknowledge_banner();
                let (row, column) = self.selected;
                Some(self.mounted.press(row, column))
            }
            KeyCode::Up => {
                self.move_selection(-1, 0);
                None
            }
            KeyCode::Down => {
                self.move_selection(1, 0);
                None
            }
            KeyCode::Left => {
                self.move_selection(0, -1);
                None
            }
            KeyCode::Right => {
                self.move_selection(0, 1);
                None
            }
            _ => None,
        };

        if let Some(outcome) = outcome {
            debug!(?outcome, "Key handled");
        }
        outcome
    }

    fn move_selection(&mut self, rows: isize, columns: isize) {
        let layout = self.mounted.layout();
        let (row, column) = self.selected;
        let clamp = |value: usize, delta: isize, len: usize| {
            value.saturating_add_signed(delta).min(len.saturating_sub(1))
        };
        self.selected = (
            clamp(row, rows, layout.rows()),
            clamp(column, columns, layout.columns()),
        );
    }

    /// Hides a stale error banner once the user starts typing again.
    fn acknowledge_banner(&self) {
        if self.mounted.keyboard_disabled() {
            return;
        }
        let pending = std::mem::take(&mut self.session.borrow_mut().banner_pending_clear);
        if pending {
            self.mounted.screen().clear_error();
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("mounted", &self.mounted)
            .field("selected", &self.selected)
            .field("should_quit", &self.should_quit)
            .field("session", &self.session.borrow())
            .finish()
    }
}

// =============================================================================
// Events
// =============================================================================

/// Events consumed by the application loop.
#[derive(Debug, Clone)]
pub enum TuiEvent {
    /// Frame tick carrying the time since the previous one.
    Tick(Duration),
    Key(KeyEvent),
    Resize(u16, u16),
}

/// How long one terminal poll waits for input.
const DEFAULT_POLL_TIMEOUT_MS: u64 = 10;

/// Produces frame ticks and terminal input until shut down.
#[derive(Debug)]
pub struct EventHandler {
    event_tx: mpsc::Sender<TuiEvent>,
    shutdown_rx: oneshot::Receiver<()>,
    tick_rate: Duration,
}

impl EventHandler {
    pub fn new(
        event_tx: mpsc::Sender<TuiEvent>,
        shutdown_rx: oneshot::Receiver<()>,
        tick_rate: Duration,
    ) -> Self {
        Self {
            event_tx,
            shutdown_rx,
            tick_rate,
        }
    }

    pub fn tick_rate(&self) -> Duration {
        self.tick_rate
    }

    /// Runs until the shutdown signal fires or the receiver is dropped.
    ///
    /// Terminal input is read on a blocking thread that forwards events
    /// straight into the channel, so no key press is lost when a tick wins
    /// the race. Ticks report real elapsed time so animations keep their
    /// speed when the loop falls behind.
    ///
    /// # Errors
    ///
    /// Returns [`TuiError::Event`] if the terminal polling thread panics.
    pub async fn run(mut self) -> Result<(), TuiError> {
        let stop = Arc::new(AtomicBool::new(false));
        let poller = {
            let stop = Arc::clone(&stop);
            let input_tx = self.event_tx.clone();
            tokio::task::spawn_blocking(move || {
                let timeout = Duration::from_millis(DEFAULT_POLL_TIMEOUT_MS);
                while !stop.load(Ordering::Relaxed) {
                    if let Some(event) = Self::poll_terminal_event(timeout) {
                        if input_tx.blocking_send(event).is_err() {
                            break;
                        }
                    }
                }
            })
        };

        let mut tick_interval = tokio::time::interval(self.tick_rate);
        tick_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut last_tick = tick_interval.tick().await;

        loop {
            tokio::select! {
                biased;

                _ = &mut self.shutdown_rx => {
                    debug!("EventHandler received shutdown signal");
                    break;
                }

                now = tick_interval.tick() => {
                    let elapsed = now.duration_since(last_tick);
                    last_tick = now;
                    if self.event_tx.send(TuiEvent::Tick(elapsed)).await.is_err() {
                        debug!("Event receiver dropped, exiting event loop");
                        break;
                    }
                }
            }
        }

        stop.store(true, Ordering::Relaxed);
        poller.await.map_err(Self::poller_failed)
    }

    fn poller_failed(join_error: tokio::task::JoinError) -> TuiError {
        tracing::error!("Terminal polling thread panicked: {}", join_error);
        TuiError::Event(format!("terminal polling thread failed: {join_error}"))
    }

    /// Blocking poll for one terminal event. Failures (no terminal) read as
    /// "no event" after waiting out the timeout.
    fn poll_terminal_event(timeout: Duration) -> Option<TuiEvent> {
        match event::poll(timeout) {
            Ok(true) => match event::read() {
                Ok(crossterm_event) => Self::convert_crossterm_event(crossterm_event),
                Err(e) => {
                    tracing::trace!("Failed to read terminal event: {}", e);
                    None
                }
            },
            Ok(false) => None,
            Err(e) => {
                tracing::trace!("Failed to poll terminal: {}", e);
                std::thread::sleep(timeout);
                None
            }
        }
    }

    fn convert_crossterm_event(event: CrosstermEvent) -> Option<TuiEvent> {
        match event {
            CrosstermEvent::Key(key_event) => Some(TuiEvent::Key(key_event)),
            CrosstermEvent::Resize(cols, rows) => Some(TuiEvent::Resize(cols, rows)),
            CrosstermEvent::Mouse(_)
            | CrosstermEvent::FocusGained
            | CrosstermEvent::FocusLost
            | CrosstermEvent::Paste(_) => None,
        }
    }
}
