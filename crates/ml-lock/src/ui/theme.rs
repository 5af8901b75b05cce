//! Visual theme and color palette

use ratatui::style::{Color, Modifier, Style};

/// Lock screen palette
pub struct Theme {
    // Backdrop behind the overlay when no image is available
    pub backdrop: Color,

    // Overlay box
    pub panel: Color,
    pub border: Color,

    // Entry field
    pub field: Color,
    pub field_outline: Color,

    // Text
    pub text_primary: Color,
    pub text_muted: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            backdrop: Color::Rgb(0, 0, 0),

            panel: Color::Rgb(0, 0, 0),
            border: Color::Rgb(51, 51, 51), // #333333

            field: Color::Rgb(42, 42, 42),         // #2A2A2A
            field_outline: Color::Rgb(58, 58, 58), // #3A3A3A

            text_primary: Color::Rgb(255, 255, 255),
            text_muted: Color::Rgb(117, 117, 117), // #757575
        }
    }
}

impl Theme {
    /// Get default text style
    pub fn text(&self) -> Style {
        Style::default().fg(self.text_primary).bg(self.panel)
    }

    /// Elapsed-time clock style
    pub fn clock(&self) -> Style {
        self.text().add_modifier(Modifier::BOLD)
    }

    /// Masked entry field style
    pub fn field(&self) -> Style {
        Style::default().fg(self.text_primary).bg(self.field)
    }

    /// Placeholder left behind while the entry field is detached
    pub fn field_detached(&self) -> Style {
        Style::default().fg(self.text_muted).bg(self.panel)
    }

    pub fn border(&self) -> Style {
        Style::default().fg(self.border).bg(self.panel)
    }

    pub fn field_border(&self) -> Style {
        Style::default().fg(self.field_outline).bg(self.panel)
    }

    pub fn backdrop(&self) -> Style {
        Style::default().bg(self.backdrop)
    }
}
