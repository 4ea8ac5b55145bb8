//! Pin indicator widget: one glyph per PIN slot, shifted by the shake.

use ratatui::{buffer::Buffer, layout::Rect, widgets::Widget};

use crate::tui::app::{Symbols, Theme};

/// Shake offset layout units per terminal column.
pub const LAYOUT_UNITS_PER_COLUMN: f64 = 5.0;

/// Converts a shake offset in layout units to whole terminal columns.
pub fn offset_columns(offset: f64) -> i16 {
    (offset / LAYOUT_UNITS_PER_COLUMN).round() as i16
}

/// Renders the indicator slots centered in its area.
#[derive(Debug)]
pub struct IndicatorWidget<'a> {
    slots: &'a [bool],
    offset: i16,
    theme: &'a Theme,
    symbols: &'a Symbols,
}

impl<'a> IndicatorWidget<'a> {
    #[must_use]
    pub fn new(slots: &'a [bool], theme: &'a Theme, symbols: &'a Symbols) -> Self {
        Self {
            slots,
            offset: 0,
            theme,
            symbols,
        }
    }

    /// Horizontal shift in columns; negative moves left.
    #[must_use]
    pub fn with_offset(mut self, offset: i16) -> Self {
        self.offset = offset;
        self
    }

    /// Width in columns: one glyph per slot with single-space gaps.
    pub fn display_width(&self) -> u16 {
        (self.slots.len() * 2).saturating_sub(1) as u16
    }
}

impl Widget for IndicatorWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 || self.slots.is_empty() {
            return;
        }

        let width = self.display_width().min(area.width);
        let centered = i32::from(area.x) + i32::from((area.width - width) / 2);
        let max_x = i32::from(area.x + area.width - width);
        let x = (centered + i32::from(self.offset)).clamp(i32::from(area.x), max_x) as u16;
        let y = area.y + area.height / 2;

        for (i, active) in self.slots.iter().enumerate() {
            let cell_x = x + (i as u16) * 2;
            if cell_x >= area.x + area.width {
                break;
            }
            let (glyph, style) = if *active {
                (self.symbols.pin_active, self.theme.pin_active)
            } else {
                (self.symbols.pin_inactive, self.theme.pin_inactive)
            };
            buf.set_string(cell_x, y, glyph, style);
        }
    }
}
