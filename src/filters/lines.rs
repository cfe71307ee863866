/// One physical line with its exact terminator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub content: String,
    /// `"\n"`, `"\r\n"`, `"\r"`, or empty for a last line without break
    pub terminator: &'static str,
    /// 1-based line number
    pub number: usize,
    /// Character offset of the line start in the decoded document
    pub char_offset: usize,
}

impl Line {
    /// Content plus terminator, as found
    pub fn raw(&self) -> String {
        format!("{}{}", self.content, self.terminator)
    }
}

/// Splits decoded text into lines, keeping each line's own terminator so
/// documents with mixed conventions are rebuilt as found
#[derive(Debug, Default)]
pub struct LineReader {
    text: String,
    pos: usize,
    number: usize,
    char_offset: usize,
}

impl LineReader {
    pub fn new(text: String) -> Self {
        Self {
            text,
            pos: 0,
            number: 0,
            char_offset: 0,
        }
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.text.len()
    }

    /// Number of the last line read
    pub fn line_number(&self) -> usize {
        self.number
    }

    pub fn next_line(&mut self) -> Option<Line> {
        if self.is_eof() {
            return None;
        }
        let rest = &self.text[self.pos..];
        let (end, terminator) = match rest.find(['\r', '\n']) {
            Some(i) if rest[i..].starts_with("\r\n") => (i, "\r\n"),
            Some(i) if rest.as_bytes()[i] == b'\r' => (i, "\r"),
            Some(i) => (i, "\n"),
            None => (rest.len(), ""),
        };
        let content = rest[..end].to_string();
        self.number += 1;
        let line = Line {
            number: self.number,
            char_offset: self.char_offset,
            terminator,
            content,
        };
        self.pos += end + terminator.len();
        self.char_offset += line.content.chars().count() + terminator.len();
        Some(line)
    }
}
