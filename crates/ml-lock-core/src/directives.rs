//! Advisory environment directives
//!
//! Best-effort requests to the desktop environment: pin the lock window
//! above everything, switch off the activity-overview hot corner and clear
//! workspace/application switching shortcuts. None of these are required
//! for the lock to hold. Every failure is logged at debug level and dropped.

use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

/// Kind of display environment the lock runs under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Compositor restricts client-side stacking; only fullscreen requests are made
    Composited,
    /// Classic stacking window manager; raise and topmost are reasserted
    Stacking,
}

impl Environment {
    /// Detect from the process environment
    pub fn detect() -> Self {
        Self::from_wayland_display(std::env::var_os("WAYLAND_DISPLAY").is_some())
    }

    fn from_wayland_display(present: bool) -> Self {
        if present {
            Environment::Composited
        } else {
            Environment::Stacking
        }
    }
}

/// Window-manager and desktop hardening requests
///
/// Awaited inline by the session loop, so directives never overlap and
/// a restore always follows the matching disable.
#[async_trait]
pub trait EnvironmentDirectives: Send {
    /// Ask for sticky, above and fullscreen treatment of a window
    async fn pin_window(&mut self, window_id: &str);

    /// Disable the overview key and hot corner
    async fn disable_overview(&mut self);

    /// Undo [`disable_overview`](Self::disable_overview)
    async fn restore_overview(&mut self);

    /// Clear workspace and application switching key bindings
    async fn disable_switching(&mut self);

    /// Undo [`disable_switching`](Self::disable_switching)
    async fn restore_switching(&mut self);
}

/// Directive failure, only ever logged
#[derive(Debug, thiserror::Error)]
pub enum DirectiveError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to wait for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}")]
    Failed { program: String, status: ExitStatus },

    #[error("{program} timed out after {timeout:?}")]
    TimedOut { program: String, timeout: Duration },
}

const KEYBINDINGS_SCHEMA: &str = "org.gnome.desktop.wm.keybindings";

const SWITCHING_KEYS: [&str; 4] = [
    "switch-to-workspace-up",
    "switch-to-workspace-down",
    "switch-applications",
    "switch-windows",
];

/// Directives backed by `wmctrl` and `gsettings`
#[derive(Debug, Clone)]
pub struct CommandDirectives {
    timeout: Duration,
}

impl CommandDirectives {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Run an external command with output discarded, bounded by the timeout
    ///
    /// A command still running at the deadline is killed.
    pub async fn run_bounded(&self, program: &str, args: &[&str]) -> Result<(), DirectiveError> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| DirectiveError::Spawn {
                program: program.to_string(),
                source,
            })?;

        match timeout(self.timeout, child.wait()).await {
            Ok(Ok(status)) if status.success() => Ok(()),
            Ok(Ok(status)) => Err(DirectiveError::Failed {
                program: program.to_string(),
                status,
            }),
            Ok(Err(source)) => Err(DirectiveError::Wait {
                program: program.to_string(),
                source,
            }),
            Err(_) => {
                let _ = child.kill().await;
                Err(DirectiveError::TimedOut {
                    program: program.to_string(),
                    timeout: self.timeout,
                })
            }
        }
    }

    async fn advise(&self, program: &str, args: &[&str]) {
        if let Err(e) = self.run_bounded(program, args).await {
            debug!("Advisory directive {} {:?} ignored: {}", program, args, e);
        }
    }
}

#[async_trait]
impl EnvironmentDirectives for CommandDirectives {
    async fn pin_window(&mut self, window_id: &str) {
        self.advise(
            "wmctrl",
            &["-i", "-r", window_id, "-b", "add,sticky,above,fullscreen"],
        )
        .await;
    }

    async fn disable_overview(&mut self) {
        self.advise("gsettings", &["set", "org.gnome.mutter", "overlay-key", ""]).await;
        self.advise(
            "gsettings",
            &["set", "org.gnome.desktop.interface", "enable-hot-corners", "false"],
        )
        .await;
    }

    async fn restore_overview(&mut self) {
        self.advise("gsettings", &["reset", "org.gnome.mutter", "overlay-key"]).await;
        self.advise(
            "gsettings",
            &["reset", "org.gnome.desktop.interface", "enable-hot-corners"],
        )
        .await;
    }

    async fn disable_switching(&mut self) {
        for key in SWITCHING_KEYS {
            self.advise("gsettings", &["set", KEYBINDINGS_SCHEMA, key, "[]"]).await;
        }
    }

    async fn restore_switching(&mut self) {
        for key in SWITCHING_KEYS {
            self.advise("gsettings", &["reset", KEYBINDINGS_SCHEMA, key]).await;
        }
    }
}
