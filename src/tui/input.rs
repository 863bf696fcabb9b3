use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

// ── Text input with cursor ────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TextInput {
    pub value: String,
    pub cursor: usize, // byte position
}

impl TextInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(value: &str) -> Self {
        TextInput { value: value.to_string(), cursor: value.len() }
    }

    pub fn set(&mut self, value: &str) {
        self.value = value.to_string();
        self.cursor = self.value.len();
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    pub fn trimmed(&self) -> &str {
        self.value.trim()
    }

    pub fn is_blank(&self) -> bool {
        self.value.trim().is_empty()
    }

    pub fn insert_char(&mut self, c: char) {
        self.value.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    pub fn insert_str(&mut self, s: &str) {
        self.value.insert_str(self.cursor, s);
        self.cursor += s.len();
    }

    pub fn delete_char_before(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let prev = self.prev_boundary();
        self.value.remove(prev);
        self.cursor = prev;
    }

    pub fn delete_char_after(&mut self) {
        if self.cursor < self.value.len() {
            self.value.remove(self.cursor);
        }
    }

    fn prev_boundary(&self) -> usize {
        self.value[..self.cursor].char_indices().next_back().map(|(i, _)| i).unwrap_or(0)
    }

    pub fn move_left(&mut self) {
        self.cursor = self.prev_boundary();
    }

    pub fn move_right(&mut self) {
        if let Some(ch) = self.value[self.cursor..].chars().next() {
            self.cursor += ch.len_utf8();
        }
    }

    /// Start of the current line.
    pub fn move_home(&mut self) {
        self.cursor = self.line_start();
    }

    /// End of the current line.
    pub fn move_end(&mut self) {
        self.cursor = self.value[self.cursor..]
            .find('\n')
            .map(|i| self.cursor + i)
            .unwrap_or(self.value.len());
    }

    fn line_start(&self) -> usize {
        self.value[..self.cursor].rfind('\n').map(|i| i + 1).unwrap_or(0)
    }

    /// Column of the cursor within its line, in chars.
    pub fn cursor_col(&self) -> usize {
        self.value[self.line_start()..self.cursor].chars().count()
    }

    /// Zero-based line of the cursor.
    pub fn cursor_line(&self) -> usize {
        self.value[..self.cursor].matches('\n').count()
    }

    pub fn line_count(&self) -> usize {
        self.value.matches('\n').count() + 1
    }

    fn move_to_line(&mut self, line: usize, col: usize) {
        let mut start = 0;
        for _ in 0..line {
            match self.value[start..].find('\n') {
                Some(i) => start += i + 1,
                None => return,
            }
        }
        let end = self.value[start..].find('\n').map(|i| start + i).unwrap_or(self.value.len());
        self.cursor = self.value[start..end]
            .char_indices()
            .nth(col)
            .map(|(i, _)| start + i)
            .unwrap_or(end);
    }

    pub fn move_up(&mut self) {
        let line = self.cursor_line();
        if line > 0 {
            let col = self.cursor_col();
            self.move_to_line(line - 1, col);
        }
    }

    pub fn move_down(&mut self) {
        let line = self.cursor_line();
        if line + 1 < self.line_count() {
            let col = self.cursor_col();
            self.move_to_line(line + 1, col);
        }
    }

    /// Returns (text_before_cursor, cursor_char_or_space, text_after_cursor)
    pub fn split_at_cursor(&self) -> (&str, &str, &str) {
        let before = &self.value[..self.cursor];
        match self.value[self.cursor..].chars().next() {
            None => (before, " ", ""),
            Some('\n') => (before, " ", &self.value[self.cursor..]),
            Some(ch) => {
                let end = self.cursor + ch.len_utf8();
                (before, &self.value[self.cursor..end], &self.value[end..])
            }
        }
    }

    /// Value with every character replaced by `•`, for secrets.
    pub fn masked(&self) -> String {
        "•".repeat(self.value.chars().count())
    }
}

// ── Key handlers ──────────────────────────────────────────────────────────────

/// Single-line editing. Returns true when the key was consumed.
pub fn handle_text_input_key(input: &mut TextInput, key: KeyEvent) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return false;
    }
    match key.code {
        KeyCode::Char(c) => input.insert_char(c),
        KeyCode::Backspace => input.delete_char_before(),
        KeyCode::Delete => input.delete_char_after(),
        KeyCode::Left => input.move_left(),
        KeyCode::Right => input.move_right(),
        KeyCode::Home => input.move_home(),
        KeyCode::End => input.move_end(),
        _ => return false,
    }
    true
}

/// Multi-line editing: Enter inserts a newline, Up/Down move between lines.
pub fn handle_multiline_key(input: &mut TextInput, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Enter => input.insert_char('\n'),
        KeyCode::Up => input.move_up(),
        KeyCode::Down => input.move_down(),
        _ => return handle_text_input_key(input, key),
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertical_movement_keeps_column() {
        let mut input = TextInput::with_value("abcd\nxy\nlonger");
        input.move_up();
        assert_eq!(input.cursor_line(), 1);
        assert_eq!(input.cursor_col(), 2);
        input.move_up();
        assert_eq!(input.cursor_col(), 2);
        input.move_down();
        input.move_down();
        assert_eq!(input.cursor_line(), 2);
    }

    #[test]
    fn unicode_editing() {
        let mut input = TextInput::new();
        input.insert_str("héllo");
        input.move_left();
        input.delete_char_before();
        assert_eq!(input.value, "hélo");
    }
}
