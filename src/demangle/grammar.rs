//! Core mangled-name cursor: length-prefixed identifiers, the
//! word-substitution back-reference table, and dotted-path assembly
//! (§4.J "Length-prefixed identifiers").

#[derive(Debug)]
pub struct MangledReader<'a> {
    bytes: &'a [u8],
    pos: usize,
    words: Vec<String>,
}

impl<'a> MangledReader<'a> {
    pub fn new(input: &'a str) -> Self {
        MangledReader {
            bytes: input.as_bytes(),
            pos: 0,
            words: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    pub fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    pub fn advance(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    pub fn eat(&mut self, c: u8) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub fn eat_str(&mut self, s: &str) -> bool {
        if self.bytes[self.pos..].starts_with(s.as_bytes()) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    pub fn truncate_words(&mut self, count: usize) {
        self.words.truncate(count);
    }

    pub fn remaining(&self) -> &'a str {
        std::str::from_utf8(&self.bytes[self.pos..]).unwrap_or("")
    }

    /// Reads one length-prefixed identifier, or resolves a `0<letter>`
    /// word-substitution back-reference. Newly read identifiers are pushed
    /// onto the back-reference table as they're read.
    pub fn read_identifier(&mut self) -> Option<String> {
        match self.peek() {
            Some(b'0') => {
                self.pos += 1;
                let letter = self.advance()?;
                if !letter.is_ascii_lowercase() {
                    return None;
                }
                let index = (letter - b'a') as usize;
                self.words.get(index).cloned()
            }
            Some(d) if d.is_ascii_digit() => {
                let start = self.pos;
                while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                    self.pos += 1;
                }
                let len: usize = std::str::from_utf8(&self.bytes[start..self.pos]).ok()?.parse().ok()?;
                if self.pos + len > self.bytes.len() {
                    return None;
                }
                let text = std::str::from_utf8(&self.bytes[self.pos..self.pos + len]).ok()?.to_string();
                self.pos += len;
                self.words.push(text.clone());
                Some(text)
            }
            _ => None,
        }
    }

    /// Reads consecutive length-prefixed identifiers into a `Module.Outer.Inner`
    /// dotted path, per §4.J.
    pub fn read_dotted_path(&mut self) -> Option<String> {
        let mut parts = Vec::new();
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            parts.push(self.read_identifier()?);
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("."))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_length_prefixed_identifier() {
        let mut r = MangledReader::new("5Hello");
        assert_eq!(r.read_identifier(), Some("Hello".to_string()));
        assert!(r.is_empty());
    }

    #[test]
    fn reads_dotted_path_across_identifiers() {
        let mut r = MangledReader::new("3Foo3Bar");
        assert_eq!(r.read_dotted_path(), Some("Foo.Bar".to_string()));
    }

    #[test]
    fn resolves_word_backreference() {
        let mut r = MangledReader::new("3Foo0a");
        assert_eq!(r.read_identifier(), Some("Foo".to_string()));
        assert_eq!(r.read_identifier(), Some("Foo".to_string()));
    }
}
