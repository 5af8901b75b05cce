//! Terminal implementation of the lock surface
//!
//! The grab is raw mode on the alternate screen: line discipline signals
//! are off, so Ctrl+C and friends arrive as ordinary key events for the
//! gate to swallow. Raise, de-iconify and fullscreen use xterm window
//! manipulation sequences, which terminals are free to ignore.

use std::io::{self, Stdout, Write};

use crossterm::{
    cursor::{Hide, Show},
    event::{
        DisableBracketedPaste, DisableFocusChange, DisableMouseCapture, EnableFocusChange,
        EnableMouseCapture, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
        PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        self, disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use ml_lock_core::surface::{LockSurface, SessionView, SurfaceError};
use ratatui::prelude::*;
use tracing::debug;

use crate::background::Background;
use crate::ui::{self, LockScreen, Theme};

/// CSI 5 t: raise the window to the front of the stacking order
const RAISE: &str = "\x1b[5t";
/// CSI 1 t: de-iconify the window
const DEICONIFY: &str = "\x1b[1t";
/// CSI 10 ; 1 t: enter fullscreen
const FULLSCREEN: &str = "\x1b[10;1t";

/// Keyboard protocol flags pushed while locked
///
/// Disambiguation keeps Esc and Alt combinations apart. Printable keys
/// must still arrive as the text they produce, so keys are not reported
/// as escape codes: that mode sends the unshifted base key plus SHIFT.
pub fn keyboard_flags() -> KeyboardEnhancementFlags {
    KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
}

/// Put the terminal back into cooked mode on the main screen
///
/// Safe to call more than once and from a panic hook.
pub fn restore_terminal() -> io::Result<()> {
    let mut stdout = io::stdout();
    let _ = execute!(stdout, PopKeyboardEnhancementFlags);
    disable_raw_mode()?;
    execute!(
        stdout,
        DisableFocusChange,
        DisableMouseCapture,
        LeaveAlternateScreen,
        Show
    )
}

/// Full-screen lock surface drawn with ratatui on the controlling terminal
pub struct TerminalSurface {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    background: Option<Background>,
    theme: Theme,
    window_id: Option<String>,
    grabbed: bool,
    keyboard_enhanced: bool,
    /// Largest size seen; anything smaller means fullscreen was lost
    largest: (u16, u16),
    fullscreen: bool,
    window_focused: bool,
    entry_focused: bool,
    entry_attached: bool,
}

impl TerminalSurface {
    pub fn new(background: Option<Background>) -> io::Result<Self> {
        let terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
        let largest = terminal::size().unwrap_or((0, 0));
        Ok(Self {
            terminal,
            background,
            theme: Theme::default(),
            window_id: std::env::var("WINDOWID").ok().filter(|id| !id.is_empty()),
            grabbed: false,
            keyboard_enhanced: false,
            largest,
            fullscreen: false,
            window_focused: true,
            entry_focused: false,
            entry_attached: true,
        })
    }

    fn window_op(&mut self, sequence: &str) -> Result<(), SurfaceError> {
        let backend = self.terminal.backend_mut();
        backend.write_all(sequence.as_bytes())?;
        Write::flush(backend)?;
        Ok(())
    }
}

impl LockSurface for TerminalSurface {
    fn grab_input(&mut self) -> Result<(), SurfaceError> {
        enable_raw_mode()?;
        self.grabbed = true;
        execute!(
            self.terminal.backend_mut(),
            EnterAlternateScreen,
            EnableMouseCapture,
            EnableFocusChange,
            DisableBracketedPaste,
            Hide
        )?;

        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            execute!(
                self.terminal.backend_mut(),
                PushKeyboardEnhancementFlags(keyboard_flags())
            )?;
            self.keyboard_enhanced = true;
        }

        self.terminal.clear()?;
        debug!(
            "Terminal grabbed (keyboard enhancement: {})",
            self.keyboard_enhanced
        );
        Ok(())
    }

    fn release_input(&mut self) -> Result<(), SurfaceError> {
        if !self.grabbed {
            return Ok(());
        }
        self.grabbed = false;
        if self.keyboard_enhanced {
            let _ = execute!(self.terminal.backend_mut(), PopKeyboardEnhancementFlags);
            self.keyboard_enhanced = false;
        }
        disable_raw_mode()?;
        execute!(
            self.terminal.backend_mut(),
            DisableFocusChange,
            DisableMouseCapture,
            LeaveAlternateScreen,
            Show
        )?;
        Ok(())
    }

    fn raise(&mut self) -> Result<(), SurfaceError> {
        self.window_op(RAISE)
    }

    fn set_topmost(&mut self) -> Result<(), SurfaceError> {
        self.window_op(DEICONIFY)
    }

    fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    fn set_fullscreen(&mut self) -> Result<(), SurfaceError> {
        self.window_op(FULLSCREEN)?;
        self.fullscreen = true;
        Ok(())
    }

    fn entry_focused(&self) -> bool {
        self.entry_attached && self.entry_focused && self.window_focused
    }

    fn focus_entry(&mut self) -> Result<(), SurfaceError> {
        if !self.window_focused {
            self.window_op(RAISE)?;
        }
        self.entry_focused = true;
        Ok(())
    }

    fn entry_attached(&self) -> bool {
        self.entry_attached
    }

    fn detach_entry(&mut self) {
        self.entry_attached = false;
        self.entry_focused = false;
    }

    fn attach_entry(&mut self) {
        self.entry_attached = true;
    }

    fn window_id(&self) -> Option<String> {
        self.window_id.clone()
    }

    fn notice_resize(&mut self, width: u16, height: u16) {
        let (max_w, max_h) = self.largest;
        if width < max_w || height < max_h {
            debug!("Terminal shrank to {}x{}", width, height);
            self.fullscreen = false;
        }
        self.largest = (max_w.max(width), max_h.max(height));
    }

    fn notice_focus(&mut self, gained: bool) {
        self.window_focused = gained;
    }

    fn present(&mut self, view: &SessionView) -> Result<(), SurfaceError> {
        let size = self.terminal.size()?;
        let entry_focused = self.entry_focused();
        let backdrop = self
            .background
            .as_mut()
            .and_then(|background| background.pixels(size.width, size.height));
        let screen = LockScreen {
            view,
            backdrop,
            entry_attached: self.entry_attached,
            entry_focused,
            theme: &self.theme,
        };
        self.terminal.draw(|frame| ui::draw(frame, &screen))?;
        Ok(())
    }
}

impl Drop for TerminalSurface {
    fn drop(&mut self) {
        if self.grabbed {
            let _ = self.release_input();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_printable_keys_arrive_as_text() {
        let flags = keyboard_flags();
        assert!(flags.contains(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES));
        assert!(!flags.contains(KeyboardEnhancementFlags::REPORT_ALL_KEYS_AS_ESCAPE_CODES));
    }
}
