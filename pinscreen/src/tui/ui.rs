//! Frame layout for the PIN screen.
//!
//! ```text
//! +--------------------------------+
//! |          tagline               |  header
//! |         * * - - -              |
//! |          status                |
//! +--------------------------------+
//! |        error banner            |  footer
//! |      [1] [2] [3]               |
//! |      ...                       |
//! |        footer text             |
//! |  hints                         |
//! +--------------------------------+
//! ```

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Paragraph},
    Frame,
};

use crate::tui::app::AppState;
use crate::tui::widgets::{
    keyboard_size, offset_columns, ErrorBannerWidget, IndicatorWidget, KeyboardWidget,
};

/// Rows used by the header: tagline, gap, indicator, gap, status.
pub const HEADER_HEIGHT: u16 = 7;

const HINTS: &str = "0-9 type  Backspace delete  arrows + Enter select  Esc quit";

/// Draws the whole screen for the current state.
pub fn render(frame: &mut Frame, state: &AppState) {
    let [header, footer] = Layout::vertical([Constraint::Length(HEADER_HEIGHT), Constraint::Min(0)])
        .areas(frame.area());

    render_header(frame, header, state);
    render_footer(frame, footer, state);
}

fn render_header(frame: &mut Frame, area: Rect, state: &AppState) {
    frame.render_widget(Block::default().style(state.theme.header), area);

    let [_, tagline, _, indicator, _, status, _] = Layout::vertical([Constraint::Length(1); 7])
        .areas(area);

    frame.render_widget(
        Paragraph::new(state.tagline.as_str())
            .style(state.theme.tagline)
            .alignment(Alignment::Center),
        tagline,
    );

    let slots = state.mounted.slots();
    frame.render_widget(
        IndicatorWidget::new(&slots, &state.theme, &state.symbols)
            .with_offset(offset_columns(state.mounted.offset())),
        indicator,
    );

    if let Some(line) = status_line(state) {
        frame.render_widget(Paragraph::new(line).alignment(Alignment::Center), status);
    }
}

fn status_line(state: &AppState) -> Option<Line<'static>> {
    if state.is_unlocked() {
        return Some(Line::from(Span::styled(
            format!("{} Unlocked, press Enter to exit", state.symbols.unlocked),
            state.theme.status_unlocked,
        )));
    }
    match state.failed_attempts() {
        0 => None,
        1 => Some(Line::from(Span::styled("1 failed attempt", state.theme.hint))),
        n => Some(Line::from(Span::styled(
            format!("{n} failed attempts"),
            state.theme.hint,
        ))),
    }
}

fn render_footer(frame: &mut Frame, area: Rect, state: &AppState) {
    frame.render_widget(Block::default().style(state.theme.footer), area);

    let layout = state.mounted.layout();
    let (_, keyboard_height) = keyboard_size(layout);
    let [banner, _, keyboard, footer_text, hints] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(keyboard_height),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(area);

    let error = state.mounted.keyboard_error();
    frame.render_widget(
        ErrorBannerWidget::new(error.as_deref(), &state.theme, &state.symbols),
        banner,
    );

    frame.render_widget(
        KeyboardWidget::new(layout, &state.theme, &state.symbols)
            .selected(Some(state.selected))
            .disabled(state.mounted.keyboard_disabled()),
        keyboard,
    );

    if let Some(text) = &state.footer {
        frame.render_widget(
            Paragraph::new(text.as_str())
                .style(state.theme.footer_text)
                .alignment(Alignment::Center),
            footer_text,
        );
    }

    frame.render_widget(
        Paragraph::new(HINTS).style(state.theme.hint),
        hints,
    );
}
