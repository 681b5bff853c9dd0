//! Extracts `<script>` elements from an HTML page.
//!
//! Only what a shader host page needs is understood: comments are skipped,
//! `<script ...>` start tags have their attributes read, and the element body
//! is taken verbatim up to the matching `</script>`. Everything else is
//! passed over.

use std::fmt;

/// A malformed script element or comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentError {
    pub message: String,
    /// 1-based line of the offending construct.
    pub line: usize,
}

impl DocumentError {
    fn new(msg: impl Into<String>, line: usize) -> Self {
        Self { message: msg.into(), line }
    }
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "document error at line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for DocumentError {}

/// One `<script>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ScriptElement {
    pub id: Option<String>,
    /// Value of `type`; empty when the attribute is absent.
    pub mime: String,
    pub text: String,
    /// Line of the start tag.
    pub line: usize,
}

pub(crate) fn parse_scripts(src: &str) -> Result<Vec<ScriptElement>, DocumentError> {
    Scanner::new(src).scripts()
}

// ── scanner ───────────────────────────────────────────────────────────────

struct Scanner<'s> {
    src: &'s str,
    pos: usize,
}

impl<'s> Scanner<'s> {
    fn new(src: &'s str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'s str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn line_at(&self, pos: usize) -> usize {
        self.src[..pos].bytes().filter(|&b| b == b'\n').count() + 1
    }

    fn starts_with_ci(&self, pat: &str) -> bool {
        self.rest()
            .get(..pat.len())
            .is_some_and(|s| s.eq_ignore_ascii_case(pat))
    }

    /// Finds `pat` (ASCII, case-insensitive) at or after the cursor.
    fn find_ci(&self, pat: &str) -> Option<usize> {
        let hay = self.rest().as_bytes();
        let pat = pat.as_bytes();
        hay.windows(pat.len())
            .position(|w| w.eq_ignore_ascii_case(pat))
            .map(|i| self.pos + i)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_ascii_whitespace() || c == '/') {
            self.advance();
        }
    }

    fn scripts(mut self) -> Result<Vec<ScriptElement>, DocumentError> {
        let mut out = Vec::new();
        while let Some(offset) = self.rest().find('<') {
            self.pos += offset;

            if self.rest().starts_with("<!--") {
                let start = self.pos;
                match self.rest()[4..].find("-->") {
                    Some(end) => self.pos += 4 + end + 3,
                    None => {
                        return Err(DocumentError::new(
                            "unterminated comment",
                            self.line_at(start),
                        ));
                    }
                }
                continue;
            }

            let is_script = self.starts_with_ci("<script")
                && matches!(
                    self.rest()[7..].chars().next(),
                    Some(c) if c.is_ascii_whitespace() || c == '>' || c == '/'
                );
            if is_script {
                out.push(self.script()?);
            } else {
                self.advance();
            }
        }
        Ok(out)
    }

    /// Parses one element; the cursor is on `<script`.
    fn script(&mut self) -> Result<ScriptElement, DocumentError> {
        let start = self.pos;
        let line = self.line_at(start);
        self.pos += "<script".len();

        let mut id = None;
        let mut mime = None;
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return Err(DocumentError::new("unterminated <script> tag", line)),
                Some('>') => {
                    self.advance();
                    break;
                }
                Some(_) => {}
            }
            let (name, value) = self.attribute()?;
            match name.as_str() {
                "id" if id.is_none() => id = Some(value),
                "type" if mime.is_none() => mime = Some(value),
                _ => {}
            }
        }

        let Some(end) = self.find_ci("</script") else {
            return Err(DocumentError::new("<script> element is never closed", line));
        };
        let text = self.src[self.pos..end].to_owned();
        self.pos = end;
        match self.rest().find('>') {
            Some(close) => self.pos += close + 1,
            None => {
                return Err(DocumentError::new(
                    "unterminated </script> tag",
                    self.line_at(end),
                ));
            }
        }

        Ok(ScriptElement {
            id,
            mime: mime.unwrap_or_default(),
            text,
            line,
        })
    }

    /// Reads `name`, `name=value`, `name="value"` or `name='value'`.
    /// Names are lowercased.
    fn attribute(&mut self) -> Result<(String, String), DocumentError> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if !c.is_ascii_whitespace() && !"=>/".contains(c)) {
            self.advance();
        }
        let name = self.src[start..self.pos].to_ascii_lowercase();
        if name.is_empty() {
            // A stray `=`.
            self.advance();
            return Ok((name, String::new()));
        }

        while matches!(self.peek(), Some(c) if c.is_ascii_whitespace()) {
            self.advance();
        }
        if self.peek() != Some('=') {
            return Ok((name, String::new()));
        }
        self.advance();
        while matches!(self.peek(), Some(c) if c.is_ascii_whitespace()) {
            self.advance();
        }

        let value = match self.peek() {
            Some(q @ ('"' | '\'')) => {
                let line = self.line_at(self.pos);
                self.advance();
                let Some(len) = self.rest().find(q) else {
                    return Err(DocumentError::new(
                        format!("unterminated value for attribute '{name}'"),
                        line,
                    ));
                };
                let value = self.rest()[..len].to_owned();
                self.pos += len + 1;
                value
            }
            _ => {
                let start = self.pos;
                while matches!(self.peek(), Some(c) if !c.is_ascii_whitespace() && c != '>') {
                    self.advance();
                }
                self.src[start..self.pos].to_owned()
            }
        };
        Ok((name, decode_entities(&value)))
    }
}

/// Replaces the character references an attribute value is likely to carry.
fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_owned();
    }
    s.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
