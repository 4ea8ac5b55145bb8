//! Keyboard widget: the layout grid plus an optional error banner.
//!
//! Keys are drawn as filled blocks `KEY_WIDTH` columns wide and
//! `KEY_HEIGHT` rows tall, with the label on the middle row. Blank slots
//! leave their cell empty. A disabled keyboard draws every key with the
//! disabled style but keeps the same geometry.

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    text::Line,
    widgets::{Paragraph, Widget},
};

use crate::keyboard::{KeySlot, KeyboardLayout};
use crate::tui::app::{Symbols, Theme};

/// Key width in columns.
pub const KEY_WIDTH: u16 = 7;

/// Key height in rows.
pub const KEY_HEIGHT: u16 = 3;

/// Gap between keys, in columns and rows.
pub const KEY_GAP: u16 = 1;

/// Size `(width, height)` a layout needs when fully drawn.
pub fn keyboard_size(layout: &KeyboardLayout) -> (u16, u16) {
    let span = |count: usize, size: u16| {
        let count = count as u16;
        count * size + count.saturating_sub(1) * KEY_GAP
    };
    (
        span(layout.columns(), KEY_WIDTH),
        span(layout.rows(), KEY_HEIGHT),
    )
}

/// Renders the key grid centered in its area.
#[derive(Debug)]
pub struct KeyboardWidget<'a> {
    layout: &'a KeyboardLayout,
    selected: Option<(usize, usize)>,
    disabled: bool,
    theme: &'a Theme,
    symbols: &'a Symbols,
}

impl<'a> KeyboardWidget<'a> {
    #[must_use]
    pub fn new(layout: &'a KeyboardLayout, theme: &'a Theme, symbols: &'a Symbols) -> Self {
        Self {
            layout,
            selected: None,
            disabled: false,
            theme,
            symbols,
        }
    }

    #[must_use]
    pub fn selected(mut self, selected: Option<(usize, usize)>) -> Self {
        self.selected = selected;
        self
    }

    #[must_use]
    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    fn label(&self, slot: &'a KeySlot) -> &'a str {
        if slot.is_back() {
            return self.symbols.back;
        }
        slot.label().unwrap_or_default()
    }
}

impl Widget for KeyboardWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let (width, height) = keyboard_size(self.layout);
        let origin_x = area.x + area.width.saturating_sub(width) / 2;
        let origin_y = area.y + area.height.saturating_sub(height) / 2;

        for ((row, column), slot) in self.layout.iter() {
            let key_area = Rect::new(
                origin_x + column as u16 * (KEY_WIDTH + KEY_GAP),
                origin_y + row as u16 * (KEY_HEIGHT + KEY_GAP),
                KEY_WIDTH,
                KEY_HEIGHT,
            )
            .intersection(area);
            if key_area.is_empty() {
                continue;
            }

            let style = if self.disabled {
                self.theme.key_disabled
            } else if self.selected == Some((row, column)) {
                self.theme.key_selected
            } else {
                self.theme.key
            };
            buf.set_style(key_area, style);

            let label_y = key_area.y + key_area.height / 2;
            Paragraph::new(Line::from(self.label(slot)))
                .style(style)
                .alignment(Alignment::Center)
                .render(Rect::new(key_area.x, label_y, key_area.width, 1), buf);
        }
    }
}

/// One-line error banner; renders nothing without a message.
#[derive(Debug)]
pub struct ErrorBannerWidget<'a> {
    message: Option<&'a str>,
    theme: &'a Theme,
    symbols: &'a Symbols,
}

impl<'a> ErrorBannerWidget<'a> {
    #[must_use]
    pub fn new(message: Option<&'a str>, theme: &'a Theme, symbols: &'a Symbols) -> Self {
        Self {
            message,
            theme,
            symbols,
        }
    }
}

impl Widget for ErrorBannerWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(message) = self.message else {
            return;
        };
        if area.width == 0 || area.height == 0 {
            return;
        }
        let line = format!("{} {}", self.symbols.failure, message);
        Paragraph::new(line)
            .style(self.theme.error_banner)
            .alignment(Alignment::Center)
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::app::ASCII_SYMBOLS;
    use ratatui::style::Style;

    fn content(buf: &Buffer) -> String {
        buf.content.iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn numeric_layout_size() {
        assert_eq!(keyboard_size(&KeyboardLayout::numeric()), (23, 15));
    }

    #[test]
    fn renders_every_label() {
        let theme = Theme::default();
        let layout = KeyboardLayout::numeric();
        let area = Rect::new(0, 0, 30, 16);
        let mut buf = Buffer::empty(area);
        KeyboardWidget::new(&layout, &theme, &ASCII_SYMBOLS).render(area, &mut buf);

        let text = content(&buf);
        for digit in 0..=9 {
            assert!(text.contains(&digit.to_string()), "missing {digit}");
        }
        assert!(text.contains("<-"));
    }

    #[test]
    fn selected_key_uses_selected_style() {
        let theme = Theme::monochrome();
        let layout = KeyboardLayout::numeric();
        let (width, height) = keyboard_size(&layout);
        let area = Rect::new(0, 0, width, height);
        let mut buf = Buffer::empty(area);
        KeyboardWidget::new(&layout, &theme, &ASCII_SYMBOLS)
            .selected(Some((0, 0)))
            .render(area, &mut buf);

        // Middle row of the first key carries the label "1".
        let cell = &buf[(KEY_WIDTH / 2, KEY_HEIGHT / 2)];
        assert_eq!(cell.symbol(), "1");
        assert_eq!(cell.style().add_modifier, theme.key_selected.add_modifier);
    }

    #[test]
    fn disabled_keyboard_uses_disabled_style() {
        let theme = Theme::monochrome();
        let layout = KeyboardLayout::numeric();
        let (width, height) = keyboard_size(&layout);
        let area = Rect::new(0, 0, width, height);
        let mut buf = Buffer::empty(area);
        KeyboardWidget::new(&layout, &theme, &ASCII_SYMBOLS)
            .selected(Some((0, 0)))
            .disabled(true)
            .render(area, &mut buf);

        let cell = &buf[(KEY_WIDTH / 2, KEY_HEIGHT / 2)];
        assert_eq!(cell.style().add_modifier, theme.key_disabled.add_modifier);
    }

    #[test]
    fn small_area_does_not_panic() {
        let theme = Theme::default();
        let layout = KeyboardLayout::numeric();
        let area = Rect::new(0, 0, 5, 2);
        let mut buf = Buffer::empty(area);
        KeyboardWidget::new(&layout, &theme, &ASCII_SYMBOLS).render(area, &mut buf);
    }

    #[test]
    fn banner_shows_message() {
        let theme = Theme::default();
        let area = Rect::new(0, 0, 20, 1);
        let mut buf = Buffer::empty(area);
        ErrorBannerWidget::new(Some("Wrong PIN"), &theme, &ASCII_SYMBOLS).render(area, &mut buf);
        assert!(content(&buf).contains("[x] Wrong PIN"));
    }

    #[test]
    fn banner_without_message_is_empty() {
        let theme = Theme::default();
        let area = Rect::new(0, 0, 20, 1);
        let mut buf = Buffer::empty(area);
        ErrorBannerWidget::new(None, &theme, &ASCII_SYMBOLS).render(area, &mut buf);
        assert_eq!(content(&buf).trim(), "");
        assert_eq!(buf[(0, 0)].style(), Style::default());
    }
}
