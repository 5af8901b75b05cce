//! Interactive password initialization (`--set-password`)

use std::io::{self, Write};

use anyhow::{Context, Result};
use ml_lock_core::{CredentialReference, CredentialStore};
use tracing::info;
use zeroize::Zeroizing;

/// Prompt on the controlling terminal with echo disabled
pub fn prompt_hidden(prompt: &str) -> io::Result<String> {
    rpassword::prompt_password(prompt)
}

/// Ask for a new password until both entries match, then store its digest
pub fn set_password(store: &CredentialStore) -> Result<()> {
    set_password_with(store, prompt_hidden, &mut io::stdout())
}

/// [`set_password`] with injectable prompt and output
pub fn set_password_with<P, W>(store: &CredentialStore, mut prompt: P, out: &mut W) -> Result<()>
where
    P: FnMut(&str) -> io::Result<String>,
    W: Write,
{
    loop {
        let password = Zeroizing::new(prompt("Enter new password: ").context("Failed to read password")?);
        let confirm = Zeroizing::new(prompt("Confirm password: ").context("Failed to read password")?);

        if *password == *confirm {
            store.save(&CredentialReference::derive(&password))?;
            info!("Stored new credential at {:?}", store.path());
            writeln!(out, "Password set successfully")?;
            return Ok(());
        }
        writeln!(out, "Passwords do not match. Try again.")?;
    }
}
