//! Very small hand-written cursor over C source text.
//!
//! The cursor does not tokenise C. It only knows how to step over the
//! things that may legally sit between two tokens of a macro call
//! (whitespace and comments) and over string literals, so that a
//! macro name mentioned inside one of those is never mistaken for a call.
//
//  Lexical items (informal):
//
//      Ident    ::= [A-Za-z_][A-Za-z0-9_]*
//      Trivia   ::= whitespace | '/*' .*? '*/' | '//' .*? '\n'
//      String   ::= '"' ( '\' . | [^"] )* '"'  |  '\'' ( '\' . | [^'] )* '\''
//
//  An unterminated comment or string runs to the end of the input.

#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    pub fn at(text: &'a str, pos: usize) -> Self {
        Self {
            text,
            pos: pos.min(text.len()),
        }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.text.len()
    }

    pub fn peek(&self) -> Option<u8> {
        self.peek_at(0)
    }

    fn peek_at(&self, n: usize) -> Option<u8> {
        self.text.as_bytes().get(self.pos + n).copied()
    }

    /// Byte right before the cursor, if any.
    pub fn prev(&self) -> Option<u8> {
        self.pos
            .checked_sub(1)
            .and_then(|p| self.text.as_bytes().get(p).copied())
    }

    pub fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    pub fn eat(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    /// Steps over one comment if the cursor sits on one.
    pub fn skip_comment(&mut self) -> bool {
        match (self.peek(), self.peek_at(1)) {
            (Some(b'/'), Some(b'*')) => {
                self.pos += 2;
                match self.text[self.pos..].find("*/") {
                    Some(end) => self.pos += end + 2,
                    None => self.pos = self.text.len(),
                }
                true
            }
            (Some(b'/'), Some(b'/')) => {
                self.pos += 2;
                match self.text[self.pos..].find('\n') {
                    Some(end) => self.pos += end + 1,
                    None => self.pos = self.text.len(),
                }
                true
            }
            _ => false,
        }
    }

    /// Skips any run of whitespace and comments.
    pub fn skip_trivia(&mut self) {
        loop {
            self.skip_whitespace();
            if !self.skip_comment() {
                break;
            }
        }
    }

    /// Steps over a string or character literal if the cursor sits on one.
    pub fn skip_string(&mut self) -> bool {
        let quote = match self.peek() {
            Some(q @ (b'"' | b'\'')) => q,
            _ => return false,
        };
        self.pos += 1;
        while let Some(b) = self.bump() {
            if b == b'\\' {
                self.bump();
            } else if b == quote || b == b'\n' {
                break;
            }
        }
        true
    }

    /// Reads a whole identifier starting at the cursor.
    pub fn read_ident(&mut self) -> Option<&'a str> {
        let start = self.pos;
        match self.peek() {
            Some(b) if is_ident_start(b) => self.pos += 1,
            _ => return None,
        }
        while let Some(b) = self.peek() {
            if is_ident_continue(b) {
                self.pos += 1;
            } else {
                break;
            }
        }
        Some(&self.text[start..self.pos])
    }
}

pub fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

pub fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

pub fn is_identifier(s: &str) -> bool {
    let mut bytes = s.bytes();
    matches!(bytes.next(), Some(b) if is_ident_start(b)) && bytes.all(is_ident_continue)
}

/// Removes comments from an argument and trims the result.
///
/// Runs of whitespace left behind by a removed comment collapse to a
/// single space so `a /* x */ | b` becomes `a | b`.
pub fn strip_comments(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut cursor = Cursor::new(raw);
    let mut pending_space = false;
    while !cursor.is_eof() {
        if cursor.skip_comment() {
            pending_space = true;
            continue;
        }
        let start = cursor.pos();
        if cursor.skip_string() {
            out.push_str(&raw[start..cursor.pos()]);
            continue;
        }
        let ch = match raw[start..].chars().next() {
            Some(ch) => ch,
            None => break,
        };
        cursor = Cursor::at(raw, start + ch.len_utf8());
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space && !out.is_empty() {
            out.push(' ');
        }
        pending_space = false;
        out.push(ch);
    }
    out
}

/// Parses a C integer literal: decimal or `0x` hex, optional sign and
/// optional `u`/`l` suffixes.
pub fn parse_int(token: &str) -> Option<i64> {
    let t = token.trim();
    let (negative, t) = match t.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, t.strip_prefix('+').unwrap_or(t)),
    };
    let t = t.trim_end_matches(['u', 'U', 'l', 'L']);
    let value = if let Some(hex) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()?
    } else if !t.is_empty() && t.bytes().all(|b| b.is_ascii_digit()) {
        t.parse::<i64>().ok()?
    } else {
        return None;
    };
    Some(if negative { -value } else { value })
}

/// Numeric field of an invocation: unparseable text reads as 0.
pub fn int_or_zero(token: &str) -> i32 {
    parse_int(token).map(|v| v as i32).unwrap_or(0)
}

/// Bitfield argument: negative literals wrap into the unsigned range.
pub fn u32_or_zero(token: &str) -> u32 {
    parse_int(token).map(|v| v as u32).unwrap_or(0)
}
