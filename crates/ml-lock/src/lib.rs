//! ml-lock - Full-screen, input-exclusive terminal lock screen
//!
//! Terminal front end for `ml-lock-core`: the crossterm/ratatui lock
//! surface, background images, the password initialization prompt and
//! logging setup.

pub mod background;
pub mod logging;
pub mod setup;
pub mod terminal;
pub mod ui;

pub use background::Background;
pub use terminal::TerminalSurface;
