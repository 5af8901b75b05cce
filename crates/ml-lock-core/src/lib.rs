//! ml-lock core - Lock-session state machine and enforcement loop
//!
//! This crate provides:
//! - Credential derivation, storage and constant-time verification
//! - The deny-by-default input gate
//! - Failed-attempt lockout with a fixed cooldown
//! - Presentation enforcement against a pluggable lock surface
//! - The session controller driving all of the above on one loop

pub mod config;
pub mod credential;
pub mod directives;
pub mod enforcer;
pub mod entry;
pub mod error;
pub mod gate;
pub mod lockout;
pub mod scheduler;
pub mod session;
pub mod store;
pub mod surface;

pub use config::LockConfig;
pub use credential::{CredentialReference, CredentialVerifier, Verifier};
pub use directives::{CommandDirectives, Environment, EnvironmentDirectives};
pub use enforcer::PresentationEnforcer;
pub use entry::EntryBuffer;
pub use error::{LockError, Result};
pub use gate::InputGate;
pub use lockout::{LockoutMachine, Phase};
pub use session::{SessionController, SessionEnd};
pub use store::CredentialStore;
pub use surface::{LockSurface, SessionView, SurfaceError};
