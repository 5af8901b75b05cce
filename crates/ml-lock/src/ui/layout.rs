//! Overlay geometry

use ratatui::layout::Rect;

/// Overlay box size in cells
pub const OVERLAY_WIDTH: u16 = 40;
pub const OVERLAY_HEIGHT: u16 = 6;

/// Entry field width in cells, outline included
pub const FIELD_WIDTH: u16 = 32;

/// Place the overlay horizontally centered with its middle at 90% of the
/// screen height, kept fully on screen
pub fn overlay_rect(area: Rect) -> Rect {
    let width = OVERLAY_WIDTH.min(area.width);
    let height = OVERLAY_HEIGHT.min(area.height);

    let x = area.x + (area.width - width) / 2;
    let middle = (u32::from(area.height) * 9 / 10) as u16;
    let top = middle
        .saturating_sub(height / 2)
        .min(area.height - height);

    Rect::new(x, area.y + top, width, height)
}

/// Split the overlay interior into the entry field box and the clock row
pub fn overlay_rows(inner: Rect) -> (Rect, Rect) {
    let width = FIELD_WIDTH.min(inner.width);
    let field = Rect::new(
        inner.x + (inner.width - width) / 2,
        inner.y,
        width,
        3.min(inner.height),
    );
    let clock_y = (inner.y + field.height).min(inner.bottom().saturating_sub(1));
    let clock = Rect::new(inner.x, clock_y, inner.width, inner.height.min(1));
    (field, clock)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlay_sits_low_and_centered() {
        let area = Rect::new(0, 0, 120, 40);
        let overlay = overlay_rect(area);
        assert_eq!(overlay.width, OVERLAY_WIDTH);
        assert_eq!(overlay.x, 40);
        assert_eq!(overlay.y, 33);
        assert!(overlay.bottom() <= area.bottom());
    }

    #[test]
    fn test_overlay_clamped_on_tiny_screens() {
        let area = Rect::new(0, 0, 20, 4);
        let overlay = overlay_rect(area);
        assert_eq!(overlay, Rect::new(0, 0, 20, 4));
    }

    #[test]
    fn test_rows_fit_inside() {
        let inner = Rect::new(41, 34, 38, 4);
        let (field, clock) = overlay_rows(inner);
        assert_eq!(field, Rect::new(44, 34, 32, 3));
        assert_eq!(clock, Rect::new(41, 37, 38, 1));
    }
}
