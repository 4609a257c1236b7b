use crossterm::event::KeyCode;

const CHAR_LIMIT: usize = 256;

/// Single-line text field with a cursor measured in chars.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextInput {
    value: String,
    cursor: usize,
}

impl TextInput {
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn reset(&mut self, value: impl Into<String>) {
        self.value = value.into().chars().take(CHAR_LIMIT).collect();
        self.cursor = self.len();
    }

    fn len(&self) -> usize {
        self.value.chars().count()
    }

    fn byte_offset(&self, char_index: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_index)
            .map(|(offset, _)| offset)
            .unwrap_or(self.value.len())
    }

    /// Apply an editing key. Returns false for keys that are not edits.
    pub fn edit(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char(c) if !c.is_control() => {
                if self.len() < CHAR_LIMIT {
                    let at = self.byte_offset(self.cursor);
                    self.value.insert(at, c);
                    self.cursor += 1;
                }
            }
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    let at = self.byte_offset(self.cursor);
                    self.value.remove(at);
                }
            }
            KeyCode::Delete => {
                if self.cursor < self.len() {
                    let at = self.byte_offset(self.cursor);
                    self.value.remove(at);
                }
            }
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(self.len()),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.len(),
            _ => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(text: &str) -> TextInput {
        let mut input = TextInput::default();
        for c in text.chars() {
            input.edit(KeyCode::Char(c));
        }
        input
    }

    #[test]
    fn test_typing_and_backspace() {
        let mut input = typed("demö");
        assert_eq!(input.value(), "demö");
        assert_eq!(input.cursor(), 4);

        input.edit(KeyCode::Backspace);
        assert_eq!(input.value(), "dem");
    }

    #[test]
    fn test_cursor_movement_edits_in_place() {
        let mut input = typed("ac");
        input.edit(KeyCode::Left);
        input.edit(KeyCode::Char('b'));
        assert_eq!(input.value(), "abc");

        input.edit(KeyCode::Home);
        input.edit(KeyCode::Delete);
        assert_eq!(input.value(), "bc");

        input.edit(KeyCode::Left);
        input.edit(KeyCode::Backspace);
        assert_eq!(input.value(), "bc");
        assert_eq!(input.cursor(), 0);

        input.edit(KeyCode::End);
        input.edit(KeyCode::Right);
        assert_eq!(input.cursor(), 2);
    }

    #[test]
    fn test_char_limit() {
        let mut input = TextInput::default();
        input.reset("x".repeat(CHAR_LIMIT + 10));
        assert_eq!(input.value().len(), CHAR_LIMIT);

        input.edit(KeyCode::Char('y'));
        assert!(!input.value().contains('y'));
    }

    #[test]
    fn test_non_edit_keys() {
        let mut input = typed("abc");
        assert!(!input.edit(KeyCode::Enter));
        assert!(!input.edit(KeyCode::Esc));
        assert_eq!(input.value(), "abc");
    }
}
