// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0

//! A minimal, allocation-free JSON5 tokenizer used to pre-scan configuration
//! documents before `json5`/`serde` do the actual value conversion.
//!
//! Produces a flat array of [`Token`]s with parent indices rather than a
//! tree, so the caller supplies the token budget up front and gets
//! [`Error::Overflow`] back with the token count actually needed, rather
//! than the parser allocating on the caller's behalf. Permits JSON5's usual
//! relaxations over JSON: unquoted identifier keys, single-quoted strings,
//! trailing commas, hex numbers, `Infinity`/`NaN`, and `//`/`/* */` comments.

/// The kind of value a [`Token`] spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `{ ... }`
    Object,
    /// `[ ... ]`
    Array,
    /// A number, int or float, possibly hex.
    Number,
    /// A quoted string or unquoted object key.
    String,
    /// `true`/`false`.
    Bool,
    /// `null`.
    Null,
}

/// One token: a byte span of the source plus its place in the token tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    /// What kind of value this token spans.
    pub kind: TokenKind,
    /// Start byte offset into the source, inclusive.
    pub start: usize,
    /// End byte offset into the source, exclusive.
    pub end: usize,
    /// Number of direct children (object: key-value pairs; array: elements).
    pub size: usize,
    /// Index of the enclosing token, or `None` at the document root.
    pub parent: Option<usize>,
}

const EMPTY_TOKEN: Token = Token {
    kind: TokenKind::Null,
    start: 0,
    end: 0,
    size: 0,
    parent: None,
};

/// Failure parsing a JSON5 document.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// Invalid character or syntax at `line`/`col`.
    #[error("invalid JSON5 syntax at line {line}, column {col}")]
    Invalid {
        /// 1-based source line.
        line: usize,
        /// 1-based source column.
        col: usize,
    },
    /// Source ended with an open object/array/string.
    #[error("incomplete JSON5 document")]
    Incomplete,
    /// The supplied token buffer was too small.
    ///
    /// `needed` is the total token count the caller should retry with.
    #[error("token buffer overflow, {needed} tokens required")]
    Overflow {
        /// Total number of tokens the document actually needs.
        needed: usize,
    },
}

/// Sink the tokens are written into. Keeps writing past the caller's buffer
/// (without indexing it) so an overflowing parse still reports the true
/// total token count, matching the upstream `OVERFLOW` contract.
struct Sink<'t> {
    tokens: &'t mut [Token],
    count: usize,
    overflowed: bool,
}

impl<'t> Sink<'t> {
    fn new(tokens: &'t mut [Token]) -> Self {
        Self { tokens, count: 0, overflowed: false }
    }

    fn push(&mut self, token: Token) -> usize {
        let index = self.count;
        if index < self.tokens.len() {
            self.tokens[index] = token;
        } else {
            self.overflowed = true;
        }
        self.count += 1;
        index
    }

    fn bump_size(&mut self, index: usize) {
        if let Some(t) = self.tokens.get_mut(index) {
            t.size += 1;
        }
    }

    fn finish(self) -> Result<usize, Error> {
        if self.overflowed {
            Err(Error::Overflow { needed: self.count })
        } else {
            Ok(self.count)
        }
    }
}

struct Scanner<'a> {
    src: &'a [u8],
    pos: usize,
    line: usize,
    line_start: usize,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Self { src: src.as_bytes(), pos: 0, line: 1, line_start: 0 }
    }

    fn col(&self) -> usize {
        self.pos - self.line_start + 1
    }

    fn err_invalid(&self) -> Error {
        Error::Invalid { line: self.line, col: self.col() }
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let c = self.peek()?;
        self.pos += 1;
        if c == b'\n' {
            self.line += 1;
            self.line_start = self.pos;
        }
        Some(c)
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(b' ' | b'\t' | b'\r' | b'\n') => {
                    self.bump();
                }
                Some(b'/') if self.src.get(self.pos + 1) == Some(&b'/') => {
                    while !matches!(self.peek(), None | Some(b'\n')) {
                        self.bump();
                    }
                }
                Some(b'/') if self.src.get(self.pos + 1) == Some(&b'*') => {
                    self.bump();
                    self.bump();
                    loop {
                        match self.peek() {
                            None => break,
                            Some(b'*') if self.src.get(self.pos + 1) == Some(&b'/') => {
                                self.bump();
                                self.bump();
                                break;
                            }
                            _ => {
                                self.bump();
                            }
                        }
                    }
                }
                _ => break,
            }
        }
    }

    /// Consume a quoted string, returning the span of its body (excluding quotes).
    fn scan_quoted(&mut self, quote: u8) -> Result<(usize, usize), Error> {
        self.bump();
        let body_start = self.pos;
        loop {
            match self.bump() {
                None => return Err(Error::Incomplete),
                Some(b'\\') => {
                    if self.bump().is_none() {
                        return Err(Error::Incomplete);
                    }
                }
                Some(c) if c == quote => return Ok((body_start, self.pos - 1)),
                Some(_) => {}
            }
        }
    }

    /// Consume an unquoted identifier or bare literal/number, stopping at the
    /// next structural character.
    fn scan_bare(&mut self) -> (usize, usize) {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_whitespace() || matches!(c, b',' | b':' | b']' | b'}' | b'{' | b'[') {
                break;
            }
            self.bump();
        }
        (start, self.pos)
    }
}

const MAX_DEPTH: usize = 64;

/// Tokenize `src` into `tokens`, returning the number of tokens written.
///
/// On [`Error::Overflow`], the `needed` field is the total token count the
/// caller should retry with.
pub fn parse(src: &str, tokens: &mut [Token]) -> Result<usize, Error> {
    let mut scanner = Scanner::new(src);
    let mut sink = Sink::new(tokens);
    scanner.skip_trivia();
    if scanner.peek().is_none() {
        return Err(Error::Incomplete);
    }
    parse_value(&mut scanner, &mut sink, None, 0)?;
    scanner.skip_trivia();
    sink.finish()
}

fn parse_value(
    scanner: &mut Scanner<'_>,
    sink: &mut Sink<'_>,
    parent: Option<usize>,
    depth: usize,
) -> Result<(), Error> {
    scanner.skip_trivia();
    let Some(c) = scanner.peek() else { return Err(Error::Incomplete) };

    match c {
        b'{' => parse_container(scanner, sink, parent, depth, b'}', TokenKind::Object),
        b'[' => parse_container(scanner, sink, parent, depth, b']', TokenKind::Array),
        b'"' | b'\'' => {
            let (start, end) = scanner.scan_quoted(c)?;
            sink.push(Token { kind: TokenKind::String, start, end, size: 0, parent });
            Ok(())
        }
        _ => {
            let (start, end) = scanner.scan_bare();
            if end <= start {
                return Err(scanner.err_invalid());
            }
            let text = std::str::from_utf8(&scanner.src[start..end]).map_err(|_| scanner.err_invalid())?;
            let kind = match text {
                "true" | "false" => TokenKind::Bool,
                "null" => TokenKind::Null,
                _ => TokenKind::Number,
            };
            sink.push(Token { kind, start, end, size: 0, parent });
            Ok(())
        }
    }
}

fn parse_container(
    scanner: &mut Scanner<'_>,
    sink: &mut Sink<'_>,
    parent: Option<usize>,
    depth: usize,
    close: u8,
    kind: TokenKind,
) -> Result<(), Error> {
    if depth >= MAX_DEPTH {
        return Err(scanner.err_invalid());
    }
    let start = scanner.pos;
    scanner.bump();
    let my_index = sink.push(Token { kind, start, end: start, size: 0, parent });

    loop {
        scanner.skip_trivia();
        match scanner.peek() {
            None => return Err(Error::Incomplete),
            Some(c) if c == close => {
                scanner.bump();
                if let Some(t) = sink.tokens.get_mut(my_index) {
                    t.end = scanner.pos;
                }
                return Ok(());
            }
            _ => {}
        }

        if kind == TokenKind::Object {
            let (ks, ke) = match scanner.peek() {
                Some(q @ (b'"' | b'\'')) => scanner.scan_quoted(q)?,
                Some(_) => scanner.scan_bare(),
                None => return Err(Error::Incomplete),
            };
            if ke <= ks {
                return Err(scanner.err_invalid());
            }
            sink.push(Token { kind: TokenKind::String, start: ks, end: ke, size: 0, parent: Some(my_index) });
            sink.bump_size(my_index);
            scanner.skip_trivia();
            if scanner.bump() != Some(b':') {
                return Err(scanner.err_invalid());
            }
            parse_value(scanner, sink, Some(my_index), depth + 1)?;
        } else {
            parse_value(scanner, sink, Some(my_index), depth + 1)?;
            sink.bump_size(my_index);
        }

        scanner.skip_trivia();
        match scanner.peek() {
            Some(b',') => {
                scanner.bump();
            }
            Some(c) if c == close => {}
            _ => return Err(scanner.err_invalid()),
        }
    }
}

/// Count how many tokens a document needs, for sizing a buffer before the
/// real parse. Returns 0 if the document itself is malformed.
pub fn required_tokens(src: &str) -> usize {
    let mut probe: Vec<Token> = Vec::new();
    match parse(src, &mut probe) {
        Err(Error::Overflow { needed }) => needed,
        Ok(n) => n,
        Err(_) => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buf(n: usize) -> Vec<Token> {
        vec![EMPTY_TOKEN; n]
    }

    #[test]
    fn flat_object_reports_key_value_tokens() {
        let src = r#"{foo: 1, 'bar': "baz"}"#;
        let mut tokens = buf(16);
        let n = parse(src, &mut tokens).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Object);
        assert_eq!(tokens[0].size, 2);
        assert_eq!(n, 5); // object + 2 keys + 2 values
        assert_eq!(tokens[1].kind, TokenKind::String);
        assert_eq!(&src[tokens[1].start..tokens[1].end], "foo");
        assert_eq!(tokens[2].kind, TokenKind::Number);
        assert_eq!(&src[tokens[2].start..tokens[2].end], "1");
        assert_eq!(tokens[4].kind, TokenKind::String);
        assert_eq!(&src[tokens[4].start..tokens[4].end], "baz");
    }

    #[test]
    fn overflow_reports_required_count() {
        let src = r#"{a: 1, b: 2, c: 3}"#;
        let mut tiny = buf(1);
        let err = parse(src, &mut tiny).unwrap_err();
        match err {
            Error::Overflow { needed } => assert_eq!(needed, required_tokens(src)),
            other => panic!("expected overflow, got {other:?}"),
        }
    }

    #[test]
    fn comments_and_trailing_comma_are_skipped() {
        let src = "{\n  // a comment\n  a: 1,\n  b: 2,\n}";
        let mut tokens = buf(16);
        let n = parse(src, &mut tokens).unwrap();
        assert_eq!(tokens[0].size, 2);
        assert_eq!(n, 5);
    }

    #[test]
    fn block_comment_inside_array_is_skipped() {
        let src = "[1, /* two */ 2, 3]";
        let mut tokens = buf(8);
        let n = parse(src, &mut tokens).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Array);
        assert_eq!(tokens[0].size, 3);
        assert_eq!(n, 4);
    }

    #[test]
    fn nested_array_of_objects_tracks_parents() {
        let src = r#"{items: [{id: 1}, {id: 2}]}"#;
        let mut tokens = buf(16);
        parse(src, &mut tokens).unwrap();
        // tokens[0]=root object, [1]=key "items", [2]=array, [3]=obj{id:1}'s
        // container, [4]=key "id", [5]=value 1, [6]=obj{id:2}, [7]=key, [8]=value
        assert_eq!(tokens[2].kind, TokenKind::Array);
        assert_eq!(tokens[2].parent, Some(0));
        assert_eq!(tokens[3].kind, TokenKind::Object);
        assert_eq!(tokens[3].parent, Some(2));
        assert_eq!(tokens[2].size, 2);
    }

    #[test]
    fn required_tokens_matches_actual_parse() {
        let src = r#"{a: [1, 2, 3], b: "x"}"#;
        let needed = required_tokens(src);
        let mut tokens = buf(needed);
        assert!(parse(src, &mut tokens).is_ok());
    }

    #[test]
    fn hex_and_signed_numbers_are_bare_tokens() {
        let src = "[0x1F, +1, -2.5, Infinity, NaN]";
        let mut tokens = buf(8);
        parse(src, &mut tokens).unwrap();
        for t in &tokens[1..6] {
            assert_eq!(t.kind, TokenKind::Number);
        }
    }
}
