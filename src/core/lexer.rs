//! A small Dart tokenizer.
//!
//! Only as much of the grammar as the rewrite engine needs: words, punctuation
//! and string literals. Comments and whitespace are skipped. String literals
//! understand both quote styles, raw (`r'...'`) and triple-quoted forms,
//! backslash escapes, and `${...}` interpolation with nested literals, so a
//! quote inside an escape or an interpolation never ends the literal early.

use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuoteStyle {
    Single,
    Double,
}

impl QuoteStyle {
    fn from_byte(b: u8) -> Option<Self> {
        match b {
            b'\'' => Some(QuoteStyle::Single),
            b'"' => Some(QuoteStyle::Double),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            QuoteStyle::Single => '\'',
            QuoteStyle::Double => '"',
        }
    }
}

/// A string literal token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrToken {
    pub quote: QuoteStyle,
    pub raw: bool,
    pub triple: bool,
    /// Contains an unescaped `$` (identifier or `${}` interpolation).
    pub interpolated: bool,
    /// Reached a newline or EOF before the closing quote.
    pub unterminated: bool,
    /// Byte range between the quotes.
    pub content: Range<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Word,
    Punct,
    Str(StrToken),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Range<usize>,
}

impl Token {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.span.clone()]
    }

    pub fn is_str(&self) -> bool {
        matches!(self.kind, TokenKind::Str(_))
    }
}

const TWO_CHAR_PUNCT: &[&[u8; 2]] = &[b"=>", b"==", b"!=", b"<=", b">=", b"??", b"?.", b".."];

pub struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
        }
    }

    fn skip_trivia(&mut self) {
        while self.pos < self.bytes.len() {
            let b = self.bytes[self.pos];
            if b.is_ascii_whitespace() {
                self.pos += 1;
            } else if self.bytes[self.pos..].starts_with(b"//") {
                match self.bytes[self.pos..].iter().position(|&c| c == b'\n') {
                    Some(n) => self.pos += n + 1,
                    None => self.pos = self.bytes.len(),
                }
            } else if self.bytes[self.pos..].starts_with(b"/*") {
                self.pos = skip_block_comment(self.bytes, self.pos);
            } else {
                break;
            }
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.skip_trivia();
        let start = self.pos;
        let b = *self.bytes.get(start)?;

        if QuoteStyle::from_byte(b).is_some() {
            let (tok, end) = scan_string(self.bytes, start, start, false);
            self.pos = end;
            return Some(Token {
                kind: TokenKind::Str(tok),
                span: start..end,
            });
        }

        if b == b'r'
            && let Some(&q) = self.bytes.get(start + 1)
            && QuoteStyle::from_byte(q).is_some()
        {
            let (tok, end) = scan_string(self.bytes, start, start + 1, true);
            self.pos = end;
            return Some(Token {
                kind: TokenKind::Str(tok),
                span: start..end,
            });
        }

        if is_word_byte(b) {
            let len = self.bytes[start..]
                .iter()
                .take_while(|&&c| is_word_byte(c))
                .count();
            self.pos = start + len;
            return Some(Token {
                kind: TokenKind::Word,
                span: start..self.pos,
            });
        }

        let two = self.bytes.get(start..start + 2);
        let len = if two.is_some_and(|t| TWO_CHAR_PUNCT.iter().any(|p| p.as_slice() == t)) {
            2
        } else {
            // Whole UTF-8 character for stray non-ASCII input
            self.source[start..].chars().next().map_or(1, char::len_utf8)
        };
        self.pos = start + len;
        Some(Token {
            kind: TokenKind::Punct,
            span: start..self.pos,
        })
    }
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

/// Skip a (possibly nested) block comment starting at `start`. Returns the end offset.
fn skip_block_comment(bytes: &[u8], start: usize) -> usize {
    let mut depth = 0;
    let mut i = start;
    while i < bytes.len() {
        if bytes[i..].starts_with(b"/*") {
            depth += 1;
            i += 2;
        } else if bytes[i..].starts_with(b"*/") {
            depth -= 1;
            i += 2;
            if depth == 0 {
                return i;
            }
        } else {
            i += 1;
        }
    }
    bytes.len()
}

/// Scan a string literal whose opening quote is at `quote_pos`.
///
/// `start` is where the token begins (the `r` prefix for raw strings).
/// Returns the token and the offset just past it.
fn scan_string(bytes: &[u8], start: usize, quote_pos: usize, raw: bool) -> (StrToken, usize) {
    debug_assert!(start <= quote_pos);
    let q = bytes[quote_pos];
    let quote = QuoteStyle::from_byte(q).unwrap_or(QuoteStyle::Single);
    let triple = bytes.len() >= quote_pos + 3 && bytes[quote_pos..quote_pos + 3] == [q, q, q];
    let content_start = quote_pos + if triple { 3 } else { 1 };

    let mut interpolated = false;
    let mut i = content_start;
    while i < bytes.len() {
        let b = bytes[i];
        if triple {
            if bytes[i..].starts_with(&[q, q, q]) {
                let tok = StrToken {
                    quote,
                    raw,
                    triple,
                    interpolated,
                    unterminated: false,
                    content: content_start..i,
                };
                return (tok, i + 3);
            }
        } else if b == q {
            let tok = StrToken {
                quote,
                raw,
                triple,
                interpolated,
                unterminated: false,
                content: content_start..i,
            };
            return (tok, i + 1);
        } else if b == b'\n' {
            let tok = StrToken {
                quote,
                raw,
                triple,
                interpolated,
                unterminated: true,
                content: content_start..i,
            };
            return (tok, i);
        }

        if !raw && b == b'\\' {
            i += 2;
        } else if !raw && b == b'$' {
            interpolated = true;
            if bytes.get(i + 1) == Some(&b'{') {
                i = skip_interpolation(bytes, i + 2);
            } else {
                i += 1;
            }
        } else {
            i += 1;
        }
    }

    let end = bytes.len();
    let tok = StrToken {
        quote,
        raw,
        triple,
        interpolated,
        unterminated: true,
        content: content_start.min(end)..end,
    };
    (tok, end)
}

/// Skip the body of `${ ... }` starting just after the `{`. Returns the offset past the `}`.
fn skip_interpolation(bytes: &[u8], mut i: usize) -> usize {
    let mut depth = 1;
    while i < bytes.len() {
        let b = bytes[i];
        if QuoteStyle::from_byte(b).is_some() {
            let raw = i > 0 && bytes[i - 1] == b'r';
            let (_, end) = scan_string(bytes, if raw { i - 1 } else { i }, i, raw);
            i = end;
            continue;
        }
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return i + 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    bytes.len()
}

/// Decode the escapes of a non-raw literal's content.
///
/// Unknown escapes keep the escaped character, matching Dart. `\u` and `\x`
/// sequences are decoded when well formed and kept verbatim otherwise.
pub fn unescape(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('v') => out.push('\u{b}'),
            Some('x') => {
                let hex: String = chars.clone().take(2).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(ch) if hex.len() == 2 => {
                        out.push(ch);
                        chars.nth(1);
                    }
                    _ => out.push_str("\\x"),
                }
            }
            Some('u') => {
                let decoded = if chars.peek() == Some(&'{') {
                    let body: String = chars.clone().skip(1).take_while(|&c| c != '}').collect();
                    u32::from_str_radix(&body, 16)
                        .ok()
                        .and_then(char::from_u32)
                        .map(|ch| (ch, body.len() + 2))
                } else {
                    let hex: String = chars.clone().take(4).collect();
                    (hex.len() == 4)
                        .then(|| u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32))
                        .flatten()
                        .map(|ch| (ch, 4))
                };
                match decoded {
                    Some((ch, consumed)) => {
                        out.push(ch);
                        for _ in 0..consumed {
                            chars.next();
                        }
                    }
                    None => out.push_str("\\u"),
                }
            }
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
