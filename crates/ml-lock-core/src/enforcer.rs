//! Presentation enforcement
//!
//! The environment gives no notice when it restacks, resizes or defocuses
//! the lock surface, so each property is re-asserted on its own cadence.
//! Every run is idempotent and never fails: surface errors are counted,
//! logged and dropped.

use tracing::debug;

use crate::directives::{Environment, EnvironmentDirectives};
use crate::lockout::Phase;
use crate::surface::{LockSurface, SurfaceError};

/// Re-asserts topmost, fullscreen and focus on a surface
pub struct PresentationEnforcer<D> {
    environment: Environment,
    directives: D,
    swallowed: u64,
}

impl<D: EnvironmentDirectives> PresentationEnforcer<D> {
    pub fn new(environment: Environment, directives: D) -> Self {
        Self {
            environment,
            directives,
            swallowed: 0,
        }
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn directives(&self) -> &D {
        &self.directives
    }

    pub fn directives_mut(&mut self) -> &mut D {
        &mut self.directives
    }

    /// Number of surface failures dropped so far
    pub fn swallowed(&self) -> u64 {
        self.swallowed
    }

    /// One-shot hardening shortly after the surface is mapped
    pub async fn setup<S: LockSurface + ?Sized>(&mut self, surface: &mut S, phase: Phase) {
        match self.environment {
            Environment::Stacking => {
                self.pin(surface).await;
                let result = surface.raise();
                self.swallow("raise", result);
            }
            Environment::Composited => {
                let result = surface.set_fullscreen();
                self.swallow("set_fullscreen", result);
            }
        }
        self.enforce_focus(surface, phase);
    }

    /// Raise/topmost run
    ///
    /// Composited environments do not allow client restacking, so only the
    /// fullscreen request is repeated there.
    pub async fn reassert_stacking<S: LockSurface + ?Sized>(&mut self, surface: &mut S) {
        match self.environment {
            Environment::Composited => {
                let result = surface.set_fullscreen();
                self.swallow("set_fullscreen", result);
            }
            Environment::Stacking => {
                let result = surface.raise();
                self.swallow("raise", result);
                let result = surface.set_topmost();
                self.swallow("set_topmost", result);
                self.pin(surface).await;
            }
        }
    }

    /// Fullscreen double-check run
    pub fn check_fullscreen<S: LockSurface + ?Sized>(&mut self, surface: &mut S, phase: Phase) {
        if !surface.is_fullscreen() {
            debug!("Surface lost fullscreen, re-requesting");
            let result = surface.set_fullscreen();
            self.swallow("set_fullscreen", result);
        }
        if self.environment == Environment::Stacking {
            let result = surface.raise();
            self.swallow("raise", result);
        }
        self.enforce_focus(surface, phase);
    }

    /// Focus run: the entry field holds focus whenever input is accepted
    pub fn enforce_focus<S: LockSurface + ?Sized>(&mut self, surface: &mut S, phase: Phase) {
        if phase.is_accepting() && surface.entry_attached() && !surface.entry_focused() {
            let result = surface.focus_entry();
            self.swallow("focus_entry", result);
        }
    }

    async fn pin<S: LockSurface + ?Sized>(&mut self, surface: &mut S) {
        if let Some(window_id) = surface.window_id() {
            self.directives.pin_window(&window_id).await;
        }
    }

    fn swallow(&mut self, operation: &str, result: Result<(), SurfaceError>) {
        if let Err(e) = result {
            self.swallowed = self.swallowed.saturating_add(1);
            debug!("Enforcement {} failed (ignored): {}", operation, e);
        }
    }
}
