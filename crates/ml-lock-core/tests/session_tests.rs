//! End-to-end lock session scenarios against an in-memory surface

use std::io;
use std::time::Duration;

use async_trait::async_trait;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use futures::channel::mpsc;
use ml_lock_core::{
    directives::EnvironmentDirectives,
    lockout::Phase,
    session::Flow,
    surface::{LockSurface, SessionView, SurfaceError},
    CredentialReference, CredentialStore, CredentialVerifier, Environment, LockConfig,
    LockError, PresentationEnforcer, SessionController, SessionEnd, Verifier,
};
use tokio::time::Instant;

#[derive(Debug, Default)]
struct MemorySurface {
    grabbed: bool,
    fullscreen: bool,
    focused: bool,
    detached: bool,
    frames: usize,
}

impl LockSurface for MemorySurface {
    fn grab_input(&mut self) -> Result<(), SurfaceError> {
        self.grabbed = true;
        Ok(())
    }

    fn release_input(&mut self) -> Result<(), SurfaceError> {
        self.grabbed = false;
        Ok(())
    }

    fn raise(&mut self) -> Result<(), SurfaceError> {
        Ok(())
    }

    fn set_topmost(&mut self) -> Result<(), SurfaceError> {
        Err(SurfaceError::Unsupported("topmost"))
    }

    fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    fn set_fullscreen(&mut self) -> Result<(), SurfaceError> {
        self.fullscreen = true;
        Ok(())
    }

    fn entry_focused(&self) -> bool {
        self.focused && !self.detached
    }

    fn focus_entry(&mut self) -> Result<(), SurfaceError> {
        self.focused = true;
        Ok(())
    }

    fn entry_attached(&self) -> bool {
        !self.detached
    }

    fn detach_entry(&mut self) {
        self.detached = true;
        self.focused = false;
    }

    fn attach_entry(&mut self) {
        self.detached = false;
    }

    fn notice_resize(&mut self, _width: u16, _height: u16) {
        self.fullscreen = false;
    }

    fn notice_focus(&mut self, gained: bool) {
        self.focused = gained;
    }

    fn present(&mut self, _view: &SessionView) -> Result<(), SurfaceError> {
        self.frames += 1;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct NoDirectives {
    restored: u32,
}

#[async_trait]
impl EnvironmentDirectives for NoDirectives {
    async fn pin_window(&mut self, _window_id: &str) {}
    async fn disable_overview(&mut self) {}
    async fn restore_overview(&mut self) {
        self.restored += 1;
    }
    async fn disable_switching(&mut self) {}
    async fn restore_switching(&mut self) {}
}

struct Plain(&'static str);

impl Verifier for Plain {
    fn verify(&self, candidate: &str) -> bool {
        candidate == self.0
    }
}

fn key(code: KeyCode) -> Event {
    Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

fn typed(text: &str) -> Vec<Event> {
    text.chars()
        .map(|c| key(KeyCode::Char(c)))
        .chain(std::iter::once(key(KeyCode::Enter)))
        .collect()
}

fn controller<V: Verifier>(
    verifier: V,
) -> SessionController<MemorySurface, V, NoDirectives> {
    SessionController::new(
        MemorySurface::default(),
        verifier,
        PresentationEnforcer::new(Environment::Stacking, NoDirectives::default()),
        LockConfig::default(),
        Instant::now(),
    )
}

#[tokio::test]
async fn test_wrong_then_right_with_stored_credential() {
    let dir = tempfile::tempdir().unwrap();
    let store = CredentialStore::at(dir.path().join("config.json"));
    store.save(&CredentialReference::derive("123")).unwrap();

    let verifier = CredentialVerifier::new(store.load().unwrap());
    let mut controller = controller(verifier);
    let start = Instant::now();
    controller.start(start).await.unwrap();

    for event in typed("124") {
        assert_eq!(controller.handle_event(&event, start), Flow::Continue);
    }
    assert_eq!(controller.session().phase(), Phase::Cooldown { remaining: 3 });
    assert!(controller.session().entry().is_empty());
    assert!(!controller.surface().entry_attached());

    // Three one-second ticks release the cooldown
    controller.run_due(start + Duration::from_secs(1)).await;
    controller.run_due(start + Duration::from_secs(2)).await;
    assert_eq!(controller.session().phase(), Phase::Cooldown { remaining: 1 });
    controller.run_due(start + Duration::from_secs(3)).await;
    assert_eq!(controller.session().phase(), Phase::Accepting);
    assert!(controller.surface().entry_focused());

    let at = start + Duration::from_secs(4);
    let flows: Vec<Flow> = typed("123")
        .iter()
        .map(|event| controller.handle_event(event, at))
        .collect();
    assert_eq!(flows.iter().filter(|f| **f == Flow::Complete).count(), 1);
    assert_eq!(flows.last(), Some(&Flow::Complete));
    assert_eq!(controller.session().lockout().failed_attempts(), 1);
}

#[test]
fn test_missing_store_refuses_to_lock() {
    let dir = tempfile::tempdir().unwrap();
    let store = CredentialStore::at(dir.path().join("config.json"));
    let err = LockError::from(store.load().unwrap_err());
    assert!(err.to_string().contains("No password set"));
}

#[tokio::test(start_paused = true)]
async fn test_run_unlocks_after_cooldown() {
    let (tx, rx) = mpsc::unbounded::<io::Result<Event>>();
    let mut controller = controller(Plain("123"));

    let driver = async move {
        for event in typed("124") {
            tx.unbounded_send(Ok(event)).unwrap();
        }
        // Typed during the cooldown and lost
        for event in typed("123") {
            tx.unbounded_send(Ok(event)).unwrap();
        }
        tokio::time::sleep(Duration::from_millis(3500)).await;
        for event in typed("123") {
            tx.unbounded_send(Ok(event)).unwrap();
        }
        tx
    };

    let (end, _tx) = tokio::join!(controller.run(rx, std::future::pending()), driver);

    assert_eq!(end.unwrap(), SessionEnd::Unlocked);
    assert_eq!(controller.session().lockout().failed_attempts(), 1);
    assert!(!controller.surface().grabbed);
    assert!(controller.surface().frames > 3);
}

#[tokio::test(start_paused = true)]
async fn test_run_terminates_on_shutdown() {
    let (_tx, rx) = mpsc::unbounded::<io::Result<Event>>();
    let mut controller = controller(Plain("123"));

    let shutdown = tokio::time::sleep(Duration::from_secs(10));
    let end = controller.run(rx, shutdown).await.unwrap();

    assert_eq!(end, SessionEnd::Terminated);
    assert!(!controller.surface().grabbed);
    assert_eq!(controller.enforcer().directives().restored, 1);
}

#[tokio::test(start_paused = true)]
async fn test_run_fails_when_input_closes() {
    let (tx, rx) = mpsc::unbounded::<io::Result<Event>>();
    drop(tx);
    let mut controller = controller(Plain("123"));

    let result = controller.run(rx, std::future::pending()).await;
    assert!(matches!(result, Err(LockError::InputClosed)));
    assert!(!controller.surface().grabbed);
}
