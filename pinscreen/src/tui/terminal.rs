//! Raw-mode terminal guard for the PIN screen.
//!
//! [`Tui`] enters raw mode and the alternate screen on creation and leaves
//! both when dropped. [`install_panic_hook`] does the same from a panic so
//! the message lands on the normal screen.

use std::io::{self, Stdout};
use std::panic;

use crossterm::{
    cursor::{Hide, Show},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Frame, Terminal};

use crate::error::TuiError;

/// Best-effort terminal restoration. Errors are ignored.
fn leave_terminal() {
    let _ = execute!(io::stdout(), Show, LeaveAlternateScreen);
    let _ = disable_raw_mode();
}

/// Chains a panic hook that restores the terminal before the previous hook
/// prints the panic message. Call once, before [`Tui::new`].
pub fn install_panic_hook() {
    let previous_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        leave_terminal();
        previous_hook(panic_info);
    }));
}

/// Terminal in raw mode on the alternate screen.
pub struct Tui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    restored: bool,
}

impl Tui {
    /// Enables raw mode, enters the alternate screen and hides the cursor.
    ///
    /// # Errors
    ///
    /// Returns [`TuiError::TerminalInit`] if any step fails; steps already
    /// taken are undone first.
    pub fn new() -> Result<Self, TuiError> {
        enable_raw_mode().map_err(TuiError::TerminalInit)?;

        let mut stdout = io::stdout();
        if let Err(e) = execute!(stdout, EnterAlternateScreen, Hide) {
            let _ = disable_raw_mode();
            return Err(TuiError::TerminalInit(e));
        }

        let terminal = Terminal::new(CrosstermBackend::new(stdout)).map_err(|e| {
            leave_terminal();
            TuiError::TerminalInit(e)
        })?;

        Ok(Self {
            terminal,
            restored: false,
        })
    }

    /// Renders one frame.
    pub fn draw<F>(&mut self, f: F) -> Result<(), TuiError>
    where
        F: FnOnce(&mut Frame),
    {
        self.terminal.draw(f).map_err(TuiError::Render)?;
        Ok(())
    }

    /// Terminal size as `(columns, rows)`.
    pub fn size(&self) -> Result<(u16, u16), TuiError> {
        let size = self.terminal.size().map_err(TuiError::Render)?;
        Ok((size.width, size.height))
    }

    /// Restores the terminal now, reporting errors. Later drops are no-ops.
    pub fn restore(&mut self) -> Result<(), TuiError> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        execute!(io::stdout(), Show, LeaveAlternateScreen).map_err(TuiError::Render)?;
        disable_raw_mode().map_err(TuiError::Render)?;
        Ok(())
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        if !self.restored {
            leave_terminal();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Creating a Tui needs a real terminal; these tests cover what can run
    // headless.

    #[test]
    fn tui_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<Tui>();
    }

    #[test]
    fn panic_hook_can_be_installed_repeatedly() {
        install_panic_hook();
        install_panic_hook();
        let _ = panic::take_hook();
    }
}
