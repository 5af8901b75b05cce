//! Deny-by-default input classification
//!
//! Only three kinds of input are ever forwarded: printable characters,
//! the submit key and field-local editing keys. Everything else (escape,
//! window-manager accelerators, control and alt combinations, bare
//! modifiers, pointer activity, pastes) is swallowed.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::entry::EditKey;
use crate::lockout::Phase;

/// Classification tag for an input event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputClass {
    /// Text for the entry field
    Printable(char),
    /// The submit key
    Submit,
    /// Editing or navigation inside the entry field
    Edit(EditKey),
    /// Anything else
    Other,
}

/// What the session does with an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Append a character to the entry buffer
    Insert(char),
    /// Run the submit transition
    Submit,
    /// Apply an editing key to the entry buffer
    Edit(EditKey),
    /// Swallow the event
    Discard,
}

/// Modifiers that may accompany allowed keys
fn plain(modifiers: KeyModifiers) -> bool {
    modifiers.difference(KeyModifiers::SHIFT).is_empty()
}

/// Base-layer punctuation on a US layout
const UNSHIFTED_PUNCTUATION: &str = "`-=[]\\;',./";

/// Character a Shift-modified key stands for
///
/// Some keyboard protocols report the base key plus SHIFT rather than the
/// shifted text. Letters can be recovered; for digits and base-layer
/// punctuation the shifted glyph depends on the layout, so those are
/// refused instead of being typed as the wrong character.
fn shifted(c: char) -> Option<char> {
    if c.is_ascii_digit() || UNSHIFTED_PUNCTUATION.contains(c) {
        return None;
    }
    let mut upper = c.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(u), None) => Some(u),
        _ => Some(c),
    }
}

/// Classify a single event
pub fn classify(event: &Event) -> InputClass {
    let Event::Key(KeyEvent {
        code,
        modifiers,
        kind,
        ..
    }) = event
    else {
        return InputClass::Other;
    };

    if *kind == KeyEventKind::Release || !plain(*modifiers) {
        return InputClass::Other;
    }

    match code {
        KeyCode::Char(c) if !c.is_control() => {
            if modifiers.contains(KeyModifiers::SHIFT) {
                shifted(*c).map_or(InputClass::Other, InputClass::Printable)
            } else {
                InputClass::Printable(*c)
            }
        }
        KeyCode::Enter => InputClass::Submit,
        KeyCode::Backspace => InputClass::Edit(EditKey::Backspace),
        KeyCode::Delete => InputClass::Edit(EditKey::Delete),
        KeyCode::Left => InputClass::Edit(EditKey::Left),
        KeyCode::Right => InputClass::Edit(EditKey::Right),
        KeyCode::Home => InputClass::Edit(EditKey::Home),
        KeyCode::End => InputClass::Edit(EditKey::End),
        _ => InputClass::Other,
    }
}

/// Input gate, the sole consumer of input events while locked
#[derive(Debug, Default)]
pub struct InputGate {
    discarded: u64,
}

impl InputGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide what to do with an event in the given phase
    ///
    /// Submit is always intercepted; text and editing only reach the entry
    /// field while it accepts input.
    pub fn decide(&mut self, event: &Event, phase: Phase) -> GateDecision {
        let decision = match (classify(event), phase.is_accepting()) {
            (InputClass::Submit, _) => GateDecision::Submit,
            (InputClass::Printable(c), true) => GateDecision::Insert(c),
            (InputClass::Edit(key), true) => GateDecision::Edit(key),
            _ => GateDecision::Discard,
        };
        if decision == GateDecision::Discard {
            self.discarded = self.discarded.saturating_add(1);
        }
        decision
    }

    /// Number of events swallowed so far
    pub fn discarded(&self) -> u64 {
        self.discarded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};
    use rstest::rstest;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> Event {
        Event::Key(KeyEvent::new(code, modifiers))
    }

    fn click(button: MouseButton) -> Event {
        Event::Mouse(MouseEvent {
            kind: MouseEventKind::Down(button),
            column: 10,
            row: 5,
            modifiers: KeyModifiers::NONE,
        })
    }

    #[rstest]
    #[case(key(KeyCode::Char('a'), KeyModifiers::NONE), GateDecision::Insert('a'))]
    #[case(key(KeyCode::Char('A'), KeyModifiers::SHIFT), GateDecision::Insert('A'))]
    #[case(key(KeyCode::Char('a'), KeyModifiers::SHIFT), GateDecision::Insert('A'))]
    #[case(key(KeyCode::Char('é'), KeyModifiers::SHIFT), GateDecision::Insert('É'))]
    #[case(key(KeyCode::Char('!'), KeyModifiers::SHIFT), GateDecision::Insert('!'))]
    #[case(key(KeyCode::Char('!'), KeyModifiers::NONE), GateDecision::Insert('!'))]
    #[case(key(KeyCode::Char(' '), KeyModifiers::NONE), GateDecision::Insert(' '))]
    #[case(key(KeyCode::Char('ß'), KeyModifiers::NONE), GateDecision::Insert('ß'))]
    #[case(key(KeyCode::Enter, KeyModifiers::NONE), GateDecision::Submit)]
    #[case(key(KeyCode::Backspace, KeyModifiers::NONE), GateDecision::Edit(EditKey::Backspace))]
    #[case(key(KeyCode::Delete, KeyModifiers::NONE), GateDecision::Edit(EditKey::Delete))]
    #[case(key(KeyCode::Left, KeyModifiers::NONE), GateDecision::Edit(EditKey::Left))]
    #[case(key(KeyCode::Right, KeyModifiers::NONE), GateDecision::Edit(EditKey::Right))]
    #[case(key(KeyCode::Home, KeyModifiers::NONE), GateDecision::Edit(EditKey::Home))]
    #[case(key(KeyCode::End, KeyModifiers::NONE), GateDecision::Edit(EditKey::End))]
    fn test_allow_list_forwarded_while_accepting(#[case] event: Event, #[case] expected: GateDecision) {
        let mut gate = InputGate::new();
        assert_eq!(gate.decide(&event, Phase::Accepting), expected);
        assert_eq!(gate.discarded(), 0);
    }

    #[rstest]
    #[case(key(KeyCode::Esc, KeyModifiers::NONE))]
    #[case(key(KeyCode::Char('q'), KeyModifiers::CONTROL))]
    #[case(key(KeyCode::Char('w'), KeyModifiers::CONTROL))]
    #[case(key(KeyCode::Char('c'), KeyModifiers::CONTROL))]
    #[case(key(KeyCode::Char('z'), KeyModifiers::CONTROL))]
    #[case(key(KeyCode::F(4), KeyModifiers::ALT))]
    #[case(key(KeyCode::Tab, KeyModifiers::ALT))]
    #[case(key(KeyCode::Tab, KeyModifiers::NONE))]
    #[case(key(KeyCode::BackTab, KeyModifiers::SHIFT))]
    #[case(key(KeyCode::Char('d'), KeyModifiers::SUPER))]
    #[case(key(KeyCode::Right, KeyModifiers::CONTROL | KeyModifiers::ALT))]
    #[case(key(KeyCode::Delete, KeyModifiers::CONTROL | KeyModifiers::ALT))]
    #[case(key(KeyCode::Enter, KeyModifiers::CONTROL))]
    #[case(key(KeyCode::F(1), KeyModifiers::NONE))]
    #[case(key(KeyCode::Up, KeyModifiers::NONE))]
    #[case(key(KeyCode::Char('\u{7}'), KeyModifiers::NONE))]
    #[case(key(KeyCode::Char('1'), KeyModifiers::SHIFT))]
    #[case(key(KeyCode::Char(';'), KeyModifiers::SHIFT))]
    #[case(click(MouseButton::Left))]
    #[case(click(MouseButton::Middle))]
    #[case(click(MouseButton::Right))]
    #[case(Event::Paste("hunter2".to_string()))]
    fn test_escape_routes_discarded(#[case] event: Event) {
        let mut gate = InputGate::new();
        assert_eq!(gate.decide(&event, Phase::Accepting), GateDecision::Discard);
        assert_eq!(gate.discarded(), 1);
    }

    #[test]
    fn test_bare_modifier_keys_discarded() {
        use crossterm::event::ModifierKeyCode;

        let mut gate = InputGate::new();
        for code in [
            ModifierKeyCode::LeftAlt,
            ModifierKeyCode::RightAlt,
            ModifierKeyCode::LeftSuper,
            ModifierKeyCode::RightSuper,
        ] {
            let event = key(KeyCode::Modifier(code), KeyModifiers::NONE);
            assert_eq!(gate.decide(&event, Phase::Accepting), GateDecision::Discard);
        }
    }

    #[test]
    fn test_key_release_discarded() {
        let mut gate = InputGate::new();
        let event = Event::Key(KeyEvent::new_with_kind(
            KeyCode::Char('a'),
            KeyModifiers::NONE,
            KeyEventKind::Release,
        ));
        assert_eq!(gate.decide(&event, Phase::Accepting), GateDecision::Discard);
    }

    #[test]
    fn test_cooldown_only_passes_submit() {
        let mut gate = InputGate::new();
        let cooldown = Phase::Cooldown { remaining: 2 };

        assert_eq!(
            gate.decide(&key(KeyCode::Enter, KeyModifiers::NONE), cooldown),
            GateDecision::Submit
        );
        assert_eq!(
            gate.decide(&key(KeyCode::Char('a'), KeyModifiers::NONE), cooldown),
            GateDecision::Discard
        );
        assert_eq!(
            gate.decide(&key(KeyCode::Backspace, KeyModifiers::NONE), cooldown),
            GateDecision::Discard
        );
    }

    #[test]
    fn test_classify_tags() {
        assert_eq!(
            classify(&key(KeyCode::Char('x'), KeyModifiers::NONE)),
            InputClass::Printable('x')
        );
        assert_eq!(
            classify(&key(KeyCode::Enter, KeyModifiers::NONE)),
            InputClass::Submit
        );
        assert_eq!(classify(&Event::FocusLost), InputClass::Other);
        assert_eq!(classify(&Event::Resize(80, 24)), InputClass::Other);
    }
}
