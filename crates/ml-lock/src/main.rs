//! ml-lock - Full-screen terminal lock screen
//!
//! Takes over the controlling terminal until the stored password is
//! entered. Run once with `--set-password` to create the credential.

use std::io;
use std::panic;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::EventStream;
use ml_lock::{
    logging::{self, LogTarget},
    setup, terminal, Background, TerminalSurface,
};
use ml_lock_core::{
    CommandDirectives, CredentialStore, CredentialVerifier, Environment, LockConfig,
    PresentationEnforcer, SessionController, SessionEnd,
};
use tokio::signal::unix::{signal, SignalKind};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Exit status after administrative termination (128 + SIGTERM)
const EXIT_TERMINATED: u8 = 143;

#[derive(Parser)]
#[command(name = "ml-lock")]
#[command(about = "Full-screen, input-exclusive terminal lock screen")]
#[command(version)]
struct Cli {
    /// Set the unlock password and exit
    #[arg(short = 'p', long)]
    set_password: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = if cli.set_password {
        run_set_password()
    } else {
        run_lock().await
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_set_password() -> Result<ExitCode> {
    logging::init(&LogTarget::Stderr)?;
    let store = CredentialStore::locate()?;
    setup::set_password(&store)?;
    Ok(ExitCode::SUCCESS)
}

async fn run_lock() -> Result<ExitCode> {
    // Refuse to lock without a usable credential, before touching the terminal
    let store = CredentialStore::locate()?;
    let reference = store.load()?;

    let config_result = LockConfig::try_load();
    let config = config_result.as_ref().cloned().unwrap_or_default();
    if let Err(e) = logging::init(&LogTarget::File(config.log_file.clone())) {
        eprintln!("Logging disabled: {:#}", e);
    }
    if let Err(e) = &config_result {
        warn!("Ignoring config file: {}", e);
    }

    install_panic_hook();
    swallow_signals()?;
    let mut terminate = signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
    let shutdown = async move {
        terminate.recv().await;
    };

    let environment = Environment::detect();
    let background = Background::load_random(&config.image_dir);
    let surface = TerminalSurface::new(background).context("Failed to open terminal")?;
    let enforcer = PresentationEnforcer::new(
        environment,
        CommandDirectives::new(config.directive_timeout()),
    );
    let mut controller = SessionController::new(
        surface,
        CredentialVerifier::new(reference),
        enforcer,
        config,
        Instant::now(),
    );

    let end = controller.run(EventStream::new(), shutdown).await?;
    Ok(match end {
        SessionEnd::Unlocked => {
            info!("Unlocked");
            ExitCode::SUCCESS
        }
        SessionEnd::Terminated => ExitCode::from(EXIT_TERMINATED),
    })
}

/// Restore the terminal before the default hook prints the panic
fn install_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = terminal::restore_terminal();
        original_hook(panic_info);
    }));
}

/// Keep interrupt, hangup and quit from ending the session
fn swallow_signals() -> io::Result<()> {
    for kind in [
        SignalKind::interrupt(),
        SignalKind::hangup(),
        SignalKind::quit(),
    ] {
        let mut stream = signal(kind)?;
        tokio::spawn(async move {
            while stream.recv().await.is_some() {
                debug!("Ignoring signal {:?} while locked", kind);
            }
        });
    }
    Ok(())
}
