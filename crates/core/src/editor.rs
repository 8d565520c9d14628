//! The editing surface a command works against.

/// Zero-based line and character column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    pub line: usize,
    pub ch: usize,
}

impl Position {
    pub fn new(line: usize, ch: usize) -> Self {
        Self { line, ch }
    }

    /// Where the cursor ends up after inserting `text` at `self`.
    pub fn advance(self, text: &str) -> Position {
        match text.rfind('\n') {
            Some(last) => Position {
                line: self.line + text.matches('\n').count(),
                ch: text[last + 1..].chars().count(),
            },
            None => Position {
                line: self.line,
                ch: self.ch + text.chars().count(),
            },
        }
    }
}

pub trait Editor: Send {
    /// Currently selected text, empty when nothing is selected.
    fn selection(&self) -> String;

    fn cursor(&self) -> Position;

    fn set_cursor(&mut self, pos: Position);

    /// Clamp `pos` into the document.
    fn clip_pos(&self, pos: Position) -> Position;

    /// Insert `text` at `at`.
    fn replace_range(&mut self, text: &str, at: Position);
}

/// In-memory markdown note with a single selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextBuffer {
    content: String,
    anchor: Position,
    head: Position,
}

impl TextBuffer {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn into_content(self) -> String {
        self.content
    }

    pub fn line_count(&self) -> usize {
        self.content.split('\n').count()
    }

    pub fn line(&self, line: usize) -> Option<&str> {
        self.content.split('\n').nth(line)
    }

    /// Select from `anchor` to `head`; the cursor sits at `head`.
    pub fn select(&mut self, anchor: Position, head: Position) {
        self.anchor = self.clip_pos(anchor);
        self.head = self.clip_pos(head);
    }

    /// Select a whole line, cursor at its end. Returns `false` past the last line.
    pub fn select_line(&mut self, line: usize) -> bool {
        let Some(text) = self.line(line) else {
            return false;
        };
        let end = Position::new(line, text.chars().count());
        self.select(Position::new(line, 0), end);
        true
    }

    fn offset(&self, pos: Position) -> usize {
        let pos = self.clip_pos(pos);
        let mut offset = 0;
        for (index, line) in self.content.split('\n').enumerate() {
            if index == pos.line {
                return offset
                    + line
                        .char_indices()
                        .nth(pos.ch)
                        .map(|(i, _)| i)
                        .unwrap_or(line.len());
            }
            offset += line.len() + 1;
        }
        self.content.len()
    }
}

impl Editor for TextBuffer {
    fn selection(&self) -> String {
        let (from, to) = if self.anchor <= self.head {
            (self.anchor, self.head)
        } else {
            (self.head, self.anchor)
        };
        self.content[self.offset(from)..self.offset(to)].to_string()
    }

    fn cursor(&self) -> Position {
        self.head
    }

    fn set_cursor(&mut self, pos: Position) {
        let pos = self.clip_pos(pos);
        self.anchor = pos;
        self.head = pos;
    }

    fn clip_pos(&self, pos: Position) -> Position {
        let last = self.line_count() - 1;
        if pos.line > last {
            let len = self.line(last).map(|l| l.chars().count()).unwrap_or(0);
            return Position::new(last, len);
        }
        let len = self.line(pos.line).map(|l| l.chars().count()).unwrap_or(0);
        Position::new(pos.line, pos.ch.min(len))
    }

    fn replace_range(&mut self, text: &str, at: Position) {
        let offset = self.offset(at);
        self.content.insert_str(offset, text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_line() {
        let mut buffer = TextBuffer::new("# Notes\nhttps://example.com\nrest");
        assert!(buffer.select_line(1));
        assert_eq!(buffer.selection(), "https://example.com");
        assert_eq!(buffer.cursor(), Position::new(1, 19));
        assert!(!buffer.select_line(3));
    }

    #[test]
    fn test_reversed_selection() {
        let mut buffer = TextBuffer::new("hello world");
        buffer.select(Position::new(0, 11), Position::new(0, 6));
        assert_eq!(buffer.selection(), "world");
    }

    #[test]
    fn test_clip_pos() {
        let buffer = TextBuffer::new("ab\ncdé");
        assert_eq!(buffer.clip_pos(Position::new(0, 10)), Position::new(0, 2));
        assert_eq!(buffer.clip_pos(Position::new(5, 0)), Position::new(1, 3));
    }

    #[test]
    fn test_insert_at_start_of_line() {
        let mut buffer = TextBuffer::new("first\nsecond");
        buffer.replace_range("inserted ", Position::new(1, 0));
        assert_eq!(buffer.content(), "first\ninserted second");
    }

    #[test]
    fn test_insert_multibyte_column() {
        let mut buffer = TextBuffer::new("héllo");
        buffer.replace_range("X", Position::new(0, 2));
        assert_eq!(buffer.content(), "héXllo");
    }

    #[test]
    fn test_insert_past_end_appends() {
        let mut buffer = TextBuffer::new("only line");
        let at = buffer.clip_pos(Position::new(1, 0));
        buffer.replace_range("!", at);
        assert_eq!(buffer.content(), "only line!");
    }

    #[test]
    fn test_advance() {
        assert_eq!(Position::new(2, 0).advance("abc"), Position::new(2, 3));
        assert_eq!(
            Position::new(2, 0).advance("one\ntwo\nthree"),
            Position::new(4, 5)
        );
    }

    #[test]
    fn test_empty_buffer() {
        let mut buffer = TextBuffer::new("");
        assert_eq!(buffer.line_count(), 1);
        assert_eq!(buffer.selection(), "");
        buffer.replace_range("text", Position::new(3, 3));
        assert_eq!(buffer.content(), "text");
    }
}
