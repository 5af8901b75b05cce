//! Secret entry buffer

use zeroize::Zeroizing;

/// Initial capacity, so typical secrets never reallocate and leave copies behind
const INITIAL_CAPACITY: usize = 128;

/// Field-local editing operations forwarded by the input gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKey {
    Backspace,
    Delete,
    Left,
    Right,
    Home,
    End,
}

/// Text typed into the password field
///
/// The contents are zeroized when cleared and on drop. Only the length and
/// cursor position are exposed for rendering.
pub struct EntryBuffer {
    text: Zeroizing<String>,
    /// Cursor position in chars
    cursor: usize,
}

impl Default for EntryBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl EntryBuffer {
    pub fn new() -> Self {
        Self {
            text: Zeroizing::new(String::with_capacity(INITIAL_CAPACITY)),
            cursor: 0,
        }
    }

    /// Insert a character at the cursor
    pub fn insert(&mut self, c: char) {
        self.reserve(c.len_utf8());
        let at = self.byte_offset(self.cursor);
        self.text.insert(at, c);
        self.cursor += 1;
    }

    /// Apply a field-local editing key
    pub fn edit(&mut self, key: EditKey) {
        match key {
            EditKey::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    let at = self.byte_offset(self.cursor);
                    self.text.remove(at);
                }
            }
            EditKey::Delete => {
                if self.cursor < self.len() {
                    let at = self.byte_offset(self.cursor);
                    self.text.remove(at);
                }
            }
            EditKey::Left => self.cursor = self.cursor.saturating_sub(1),
            EditKey::Right => self.cursor = (self.cursor + 1).min(self.len()),
            EditKey::Home => self.cursor = 0,
            EditKey::End => self.cursor = self.len(),
        }
    }

    /// Wipe the contents
    pub fn clear(&mut self) {
        // Wipes the full capacity, then truncates
        zeroize::Zeroize::zeroize(&mut *self.text);
        self.cursor = 0;
    }

    /// The secret, for the submit transition only
    pub fn secret(&self) -> &str {
        &self.text
    }

    /// Number of characters typed
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Grow into a fresh allocation so the old one is wiped, never left
    /// behind by a reallocation
    fn reserve(&mut self, additional: usize) {
        let needed = self.text.len() + additional;
        if needed <= self.text.capacity() {
            return;
        }
        let capacity = needed.max(self.text.capacity() * 2);
        let mut grown = Zeroizing::new(String::with_capacity(capacity));
        grown.push_str(&self.text);
        self.text = grown;
    }

    fn byte_offset(&self, char_index: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }
}

impl std::fmt::Debug for EntryBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryBuffer")
            .field("len", &self.len())
            .field("cursor", &self.cursor)
            .finish()
    }
}
