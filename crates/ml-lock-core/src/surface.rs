//! Lock surface abstraction
//!
//! The enforcement loop only talks to the visual surface through this
//! trait. The terminal front end implements it with crossterm; tests use a
//! scripted double.

use std::time::Duration;

/// Error from a surface operation
#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported by this surface: {0}")]
    Unsupported(&'static str),

    #[error("{0}")]
    Other(String),
}

/// Snapshot handed to the surface for drawing
///
/// Carries no secret material and no cooldown countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionView {
    /// Time since the session started
    pub elapsed: Duration,
    /// Number of characters in the entry field
    pub masked_len: usize,
    /// Cursor position inside the entry field
    pub cursor: usize,
}

/// Render an elapsed duration as HH:MM:SS
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Full-screen, input-exclusive surface
pub trait LockSurface {
    /// Take the exclusive input grab
    fn grab_input(&mut self) -> Result<(), SurfaceError>;

    /// Release the exclusive input grab
    fn release_input(&mut self) -> Result<(), SurfaceError>;

    /// Restack the surface above all others
    fn raise(&mut self) -> Result<(), SurfaceError>;

    /// Reassert always-on-top
    fn set_topmost(&mut self) -> Result<(), SurfaceError>;

    fn is_fullscreen(&self) -> bool;

    /// Re-request fullscreen attributes
    fn set_fullscreen(&mut self) -> Result<(), SurfaceError>;

    fn entry_focused(&self) -> bool;

    /// Force input focus onto the entry field
    fn focus_entry(&mut self) -> Result<(), SurfaceError>;

    fn entry_attached(&self) -> bool;

    /// Remove the entry control for the cooldown
    fn detach_entry(&mut self);

    /// Restore the entry control after the cooldown
    fn attach_entry(&mut self);

    /// External window identifier, if the environment exposes one
    fn window_id(&self) -> Option<String> {
        None
    }

    /// Record a size change made by the environment
    fn notice_resize(&mut self, width: u16, height: u16);

    /// Record a focus change made by the environment
    fn notice_focus(&mut self, gained: bool);

    /// Draw a frame
    fn present(&mut self, view: &SessionView) -> Result<(), SurfaceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::ZERO), "00:00:00");
        assert_eq!(format_elapsed(Duration::from_secs(59)), "00:00:59");
        assert_eq!(format_elapsed(Duration::from_secs(3661)), "01:01:01");
        assert_eq!(format_elapsed(Duration::from_millis(125_900)), "00:02:05");
    }
}
