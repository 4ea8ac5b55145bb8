//! Pinscreen - terminal PIN entry demo.
//!
//! # Commands
//!
//! - `pinscreen run`: Show the PIN screen in the terminal
//! - `pinscreen layout`: Print the resolved configuration and keyboard grid
//!
//! # Environment Variables
//!
//! See the [`config`](pinscreen::config) module for available options.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use pinscreen::config::Config;
use pinscreen::control::TracingHaptics;
use pinscreen::keyboard::KeyboardLayout;
use pinscreen::tui::app::ASCII_SYMBOLS;
use pinscreen::tui::{install_panic_hook, ui, AppState, EventHandler, Symbols, Theme, Tui};
use pinscreen::types::ResetPolicy;

/// Capacity of the terminal event channel.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// How long the runtime waits for the input thread on exit.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

/// Pinscreen - numeric PIN entry with a shaking indicator.
#[derive(Parser, Debug)]
#[command(name = "pinscreen")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "\
ENVIRONMENT VARIABLES:
    PINSCREEN_PIN_LENGTH       PIN length (default: 5)
    PINSCREEN_KEY_VIBRATION    Haptic pulse on key press (default: true)
    PINSCREEN_SHAKE_VIBRATION  Haptic pulse on shake (default: true)
    PINSCREEN_RESET_POLICY     clear-on-settle or keep (default: clear-on-settle)
    PINSCREEN_TAGLINE          Header text
    PINSCREEN_FOOTER           Footer text
    PINSCREEN_EXPECTED_PIN     PIN the demo accepts (default: 12345 for length 5)
    PINSCREEN_ERROR_MESSAGE    Banner text for a wrong PIN
    PINSCREEN_TICK_RATE_MS     Animation frame interval (default: 16)
    PINSCREEN_LOG_FILE         Log file used while the screen is shown

EXAMPLES:
    # Four digit PIN that stays visible after a wrong attempt
    pinscreen run --length 4 --expected-pin 2468 --keep-pin-on-error

    # Show the keyboard grid a config file produces
    pinscreen layout --config ./pinscreen.json
")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// CLI subcommands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Show the PIN screen.
    Run {
        /// Config file (default: <config dir>/pinscreen/config.json).
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// PIN length.
        #[arg(short, long)]
        length: Option<usize>,

        /// PIN the demo accepts.
        #[arg(long)]
        expected_pin: Option<String>,

        /// Keep the entered digits after a wrong PIN.
        #[arg(long)]
        keep_pin_on_error: bool,

        /// Disable haptic pulses.
        #[arg(long)]
        no_vibration: bool,

        /// Use ASCII glyphs only.
        #[arg(long)]
        ascii: bool,

        /// Write logs to this file.
        #[arg(long)]
        log_file: Option<PathBuf>,
    },

    /// Print the resolved configuration and keyboard grid.
    Layout {
        /// Config file (default: <config dir>/pinscreen/config.json).
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            config,
            length,
            expected_pin,
            keep_pin_on_error,
            no_vibration,
            ascii,
            log_file,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(length) = length {
                config.pin_length = length;
            }
            if expected_pin.is_some() {
                config.expected_pin = expected_pin;
            }
            if keep_pin_on_error {
                config.reset_policy = ResetPolicy::Keep;
            }
            if no_vibration {
                config.key_vibration = false;
                config.shake_vibration = false;
            }
            if log_file.is_some() {
                config.log_file = log_file;
            }
            config.validate().context("Invalid command line options")?;

            init_file_logging(config.log_file.as_deref())?;

            let symbols = if ascii { ASCII_SYMBOLS } else { Symbols::detect() };

            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .context("Failed to create tokio runtime")?;
            let result = runtime.block_on(run_screen(config, symbols));
            runtime.shutdown_timeout(SHUTDOWN_TIMEOUT);
            result
        }
        Command::Layout { config } => {
            init_logging();
            let config = load_config(config.as_deref())?;
            print_layout(&config, &mut std::io::stdout().lock()).context("Failed to print layout")
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    Config::load(path).context("Failed to load configuration")
}

/// Logs to stderr for non-interactive commands.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Logs to `path` while the screen owns the terminal. Without a path no
/// subscriber is installed, since stderr output would corrupt the UI.
fn init_file_logging(path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

/// Runs the interactive screen until the user quits.
async fn run_screen(config: Config, symbols: Symbols) -> Result<()> {
    info!(
        pin_length = config.pin_length,
        reset_policy = %config.reset_policy,
        "Starting PIN screen"
    );

    let mut app = AppState::new(&config, Rc::new(TracingHaptics), Theme::from_env(), symbols)
        .context("Failed to build PIN screen")?;

    install_panic_hook();
    let mut tui = Tui::new().context("Failed to initialize terminal")?;

    let (event_tx, mut event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let handler = tokio::spawn(EventHandler::new(event_tx, shutdown_rx, config.tick_rate()).run());

    let result = async {
        tui.draw(|frame| ui::render(frame, &app))?;
        while !app.should_quit {
            let Some(event) = event_rx.recv().await else {
                warn!("Event stream ended unexpectedly");
                break;
            };
            app.handle_event(event);
            tui.draw(|frame| ui::render(frame, &app))?;
        }
        Ok::<_, anyhow::Error>(())
    }
    .await;

    let _ = shutdown_tx.send(());
    drop(event_rx);
    let restored = tui.restore().context("Failed to restore terminal");

    match handler.await {
        Ok(Err(e)) => warn!("Event handler error: {}", e),
        Err(e) => warn!("Event handler task failed: {}", e),
        Ok(Ok(())) => debug!("Event handler stopped"),
    }

    info!(
        unlocked = app.is_unlocked(),
        failed_attempts = app.failed_attempts(),
        "PIN screen closed"
    );
    result?;
    restored
}

/// Writes the redacted configuration and the keyboard grid to `out`.
fn print_layout(config: &Config, out: &mut impl Write) -> pinscreen::Result<()> {
    let layout = config.keyboard_layout()?;

    let mut redacted = config.clone();
    if redacted.expected_pin.is_some() {
        redacted.expected_pin = Some("*".repeat(config.pin_length));
    }
    let json = serde_json::to_string_pretty(&redacted)?;
    writeln!(out, "{json}")?;
    writeln!(out)?;

    for row in 0..layout.rows() {
        let cells: Vec<String> = (0..layout.columns())
            .map(|column| {
                let label = match layout.slot(row, column) {
                    Some(slot) if slot.is_back() => ASCII_SYMBOLS.back,
                    Some(slot) => slot.label().unwrap_or_default(),
                    None => "",
                };
                format!("[{label:^4}]")
            })
            .collect();
        writeln!(out, "{}", cells.join(" "))?;
    }
    debug!(
        rows = layout.rows(),
        columns = layout.columns(),
        blanks = blank_cells(&layout),
        "Printed layout"
    );
    Ok(())
}

/// Grid cells without a key.
fn blank_cells(layout: &KeyboardLayout) -> usize {
    (0..layout.rows())
        .flat_map(|row| (0..layout.columns()).map(move |column| (row, column)))
        .filter(|&(row, column)| layout.slot(row, column).is_none())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pinscreen::PinError;

    /// Writer whose every write fails.
    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_flags_parse() {
        let cli = Cli::try_parse_from([
            "pinscreen",
            "run",
            "--length",
            "4",
            "--expected-pin",
            "2468",
            "--keep-pin-on-error",
            "--ascii",
        ])
        .expect("valid arguments");
        match cli.command {
            Command::Run {
                length,
                expected_pin,
                keep_pin_on_error,
                ascii,
                no_vibration,
                ..
            } => {
                assert_eq!(length, Some(4));
                assert_eq!(expected_pin.as_deref(), Some("2468"));
                assert!(keep_pin_on_error);
                assert!(ascii);
                assert!(!no_vibration);
            }
            Command::Layout { .. } => panic!("expected run"),
        }
    }

    #[test]
    fn layout_takes_config_path() {
        let cli = Cli::try_parse_from(["pinscreen", "layout", "-c", "/tmp/pin.json"])
            .expect("valid arguments");
        assert!(matches!(
            cli.command,
            Command::Layout { config: Some(path) } if path == Path::new("/tmp/pin.json")
        ));
    }

    #[test]
    fn zero_length_is_rejected_by_validation() {
        let config = Config {
            pin_length: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn numeric_layout_has_one_blank() {
        assert_eq!(blank_cells(&KeyboardLayout::numeric()), 1);
    }

    #[test]
    fn grid_blanks_are_counted() {
        let layout = KeyboardLayout::from_grid(&[
            vec![None, Some("1".to_string()), None],
            vec![Some("back".to_string()), None, Some("2".to_string())],
        ])
        .expect("valid grid");
        assert_eq!(blank_cells(&layout), 3);
    }

    #[test]
    fn layout_prints_redacted_config_and_grid() {
        let config = Config {
            expected_pin: Some("24680".to_string()),
            ..Config::default()
        };
        let mut out = Vec::new();
        print_layout(&config, &mut out).expect("layout prints");

        let text = String::from_utf8(out).expect("utf-8 output");
        assert!(text.contains("*****"));
        assert!(!text.contains("24680"));
        assert_eq!(text.lines().filter(|line| line.starts_with('[')).count(), 4);
    }

    #[test]
    fn layout_write_failure_is_io_error() {
        let result = print_layout(&Config::default(), &mut BrokenPipe);
        assert!(matches!(result, Err(PinError::Io(_))));
    }

    #[test]
    fn invalid_layout_is_layout_error() {
        let config = Config {
            layout: Some(vec![vec![Some("1".to_string())], vec![]]),
            ..Config::default()
        };
        let result = print_layout(&config, &mut Vec::new());
        assert!(matches!(result, Err(PinError::Layout(_))));
    }
}
