/// Text of the focused block with a char-offset cursor.
///
/// List blocks edit one item per line, so line starts and ends are where
/// Home, End and word jumps stop. The buffer is a view: after each change the
/// app writes the text back through the editor and reloads it from there.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditBuffer {
    chars: Vec<char>,
    pub cursor: usize,
}

impl EditBuffer {
    /// Cursor at the end of `text`.
    pub fn new(text: &str) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let cursor = chars.len();
        Self { chars, cursor }
    }

    /// Cursor clamped to the text length.
    pub fn at(text: &str, offset: usize) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let cursor = offset.min(chars.len());
        Self { chars, cursor }
    }

    pub fn text(&self) -> String {
        self.chars.iter().collect()
    }

    /// Swaps in the editor's text, keeping the cursor where it still fits.
    pub fn reload(&mut self, text: &str) {
        *self = Self::at(text, self.cursor);
    }

    pub fn insert_char(&mut self, ch: char) {
        self.chars.insert(self.cursor, ch);
        self.cursor += 1;
    }

    pub fn delete_back(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            self.chars.remove(self.cursor);
        }
    }

    pub fn delete_forward(&mut self) {
        if self.cursor < self.chars.len() {
            self.chars.remove(self.cursor);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.chars.len());
    }

    pub fn move_line_start(&mut self) {
        self.cursor = self.line_start();
    }

    pub fn move_line_end(&mut self) {
        self.cursor = self.chars[self.cursor..]
            .iter()
            .position(|&c| c == '\n')
            .map_or(self.chars.len(), |i| self.cursor + i);
    }

    /// Back to the start of the previous word on this line. At a line start
    /// it steps onto the end of the line above.
    pub fn move_word_left(&mut self) {
        if self.cursor > 0 && self.chars[self.cursor - 1] == '\n' {
            self.cursor -= 1;
            return;
        }
        let start = self.line_start();
        while self.cursor > start && self.chars[self.cursor - 1].is_whitespace() {
            self.cursor -= 1;
        }
        while self.cursor > start && !self.chars[self.cursor - 1].is_whitespace() {
            self.cursor -= 1;
        }
    }

    /// Forward past the next word and its trailing spaces, stopping at the
    /// line end.
    pub fn move_word_right(&mut self) {
        let len = self.chars.len();
        if self.cursor < len && self.chars[self.cursor] == '\n' {
            self.cursor += 1;
            return;
        }
        while self.cursor < len && !self.chars[self.cursor].is_whitespace() {
            self.cursor += 1;
        }
        while self.cursor < len
            && self.chars[self.cursor] != '\n'
            && self.chars[self.cursor].is_whitespace()
        {
            self.cursor += 1;
        }
    }

    /// Line the cursor is on, which is the list item index in list blocks.
    pub fn line_index(&self) -> usize {
        self.chars[..self.cursor].iter().filter(|&&c| c == '\n').count()
    }

    /// Cursor as (line, column).
    pub fn line_column(&self) -> (usize, usize) {
        (self.line_index(), self.cursor - self.line_start())
    }

    fn line_start(&self) -> usize {
        self.chars[..self.cursor]
            .iter()
            .rposition(|&c| c == '\n')
            .map_or(0, |i| i + 1)
    }
}
