//! Lock screen rendering

pub mod layout;
pub mod theme;

use image::RgbImage;
use ml_lock_core::surface::{format_elapsed, SessionView};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::background::Backdrop;
pub use theme::Theme;

/// Mask glyph for typed characters
const MASK: char = '•';

/// Everything needed to draw one frame
pub struct LockScreen<'a> {
    pub view: &'a SessionView,
    pub backdrop: Option<&'a RgbImage>,
    pub entry_attached: bool,
    pub entry_focused: bool,
    pub theme: &'a Theme,
}

/// Draw the lock screen
pub fn draw(frame: &mut Frame, screen: &LockScreen) {
    let area = frame.area();
    let theme = screen.theme;

    match screen.backdrop {
        Some(pixels) => frame.render_widget(Backdrop::new(pixels), area),
        None => frame.render_widget(Block::default().style(theme.backdrop()), area),
    }

    let overlay = layout::overlay_rect(area);
    frame.render_widget(Clear, overlay);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border())
        .style(theme.text());
    let inner = block.inner(overlay);
    frame.render_widget(block, overlay);

    let (field, clock) = layout::overlay_rows(inner);

    if screen.entry_attached {
        let outline = Block::default()
            .borders(Borders::ALL)
            .border_style(theme.field_border())
            .style(theme.field());
        let text_area = outline.inner(field);
        frame.render_widget(outline, field);

        let (masked, cursor_col) =
            masked_window(screen.view.masked_len, screen.view.cursor, text_area.width);
        frame.render_widget(Paragraph::new(masked).style(theme.field()), text_area);

        if screen.entry_focused && text_area.width > 0 && text_area.height > 0 {
            frame.set_cursor_position((text_area.x + cursor_col, text_area.y));
        }
    } else {
        frame.render_widget(Block::default().style(theme.field_detached()), field);
    }

    let clock_text = Paragraph::new(format_elapsed(screen.view.elapsed))
        .style(theme.clock())
        .alignment(Alignment::Center);
    frame.render_widget(clock_text, clock);
}

/// Visible mask text and cursor column for a field `width` cells wide
///
/// Long entries scroll so the cursor stays visible.
pub fn masked_window(len: usize, cursor: usize, width: u16) -> (String, u16) {
    let width = usize::from(width);
    if width == 0 {
        return (String::new(), 0);
    }
    let cursor = cursor.min(len);
    // One cell is kept free for the cursor past the last character
    let scroll = (cursor + 1).saturating_sub(width);
    let visible = len.saturating_sub(scroll).min(width);
    let masked = std::iter::repeat(MASK).take(visible).collect();
    (masked, (cursor - scroll) as u16)
}
