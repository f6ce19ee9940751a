//! Literal extraction.
//!
//! Walks a source unit once, yielding every string literal together with its
//! location, decoded value, quote style and context classification. Literals
//! that already sit in the fallback position of a lookup expression are not
//! yielded at all, which keeps repeated runs from wrapping them twice.

use std::{iter::Peekable, ops::Range, sync::LazyLock};

use regex::Regex;

use crate::{
    core::{
        classify::{ScopeTracker, SiteContext},
        lexer::{Lexer, QuoteStyle, Token, TokenKind, unescape},
    },
    utils::{build_line_index, floor_char_boundary, offset_to_line},
};

/// How far back from a literal to look for an enclosing lookup expression.
const LOOKBACK_BYTES: usize = 100;

/// `<Class>.of(context)?.key ?? ` immediately before a literal.
static LOOKUP_PREFIX_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\w+)\.of\(\s*context\s*\)\s*[?!]?\.\s*\w+\s*\?\?\s*\(?\s*$").unwrap()
});

static URL_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^https?://").unwrap());
static NUMBER_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+$").unwrap());
static PHONE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\d\s\-\+\(\)]+$").unwrap());
static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap()
});
static TEMPLATE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\$\{.*\}$").unwrap());
static CONSTANT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z_][A-Z0-9_]*$").unwrap());
static IDENTIFIER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-zA-Z0-9]*$").unwrap());

/// Why a literal is not a rewrite candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Interpolated,
    TripleQuoted,
    Unterminated,
    Directive,
    /// Part of an implicit concatenation of adjacent literals.
    Adjacent,
    TooShort,
    Url,
    Number,
    Phone,
    Email,
    Template,
    Constant,
    Identifier,
}

impl SkipReason {
    /// Structural reasons make a rewrite unsafe regardless of where the
    /// suggestion came from; the rest are text heuristics.
    pub fn is_structural(self) -> bool {
        matches!(
            self,
            SkipReason::Interpolated
                | SkipReason::TripleQuoted
                | SkipReason::Unterminated
                | SkipReason::Directive
                | SkipReason::Adjacent
        )
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SkipReason::Interpolated => "interpolated",
            SkipReason::TripleQuoted => "triple-quoted",
            SkipReason::Unterminated => "unterminated",
            SkipReason::Directive => "directive",
            SkipReason::Adjacent => "adjacent",
            SkipReason::TooShort => "too short",
            SkipReason::Url => "url",
            SkipReason::Number => "number",
            SkipReason::Phone => "phone number",
            SkipReason::Email => "email",
            SkipReason::Template => "template",
            SkipReason::Constant => "constant name",
            SkipReason::Identifier => "identifier",
        };
        write!(f, "{}", s)
    }
}

/// Text heuristics for strings that are not user-facing.
pub fn heuristic_skip(text: &str) -> Option<SkipReason> {
    let text = text.trim();
    if text.chars().count() < 2 {
        return Some(SkipReason::TooShort);
    }
    let checks: [(&Regex, SkipReason); 7] = [
        (&*URL_REGEX, SkipReason::Url),
        (&*NUMBER_REGEX, SkipReason::Number),
        (&*PHONE_REGEX, SkipReason::Phone),
        (&*EMAIL_REGEX, SkipReason::Email),
        (&*TEMPLATE_REGEX, SkipReason::Template),
        (&*CONSTANT_REGEX, SkipReason::Constant),
        (&*IDENTIFIER_REGEX, SkipReason::Identifier),
    ];
    checks
        .into_iter()
        .find(|(re, _)| re.is_match(text))
        .map(|(_, reason)| reason)
}

/// A string literal found in a source unit.
#[derive(Debug, Clone)]
pub struct LiteralSpan {
    /// Byte range of the whole literal, quotes and raw prefix included.
    pub range: Range<usize>,
    /// Decoded value (raw literals are taken verbatim).
    pub value: String,
    pub quote: QuoteStyle,
    pub raw: bool,
    /// 1-based line.
    pub line: usize,
    /// 1-based column, in characters.
    pub column: usize,
    pub context: SiteContext,
    /// The literal is an operand of a tighter-binding operator, so a lookup
    /// expression replacing it must be parenthesized.
    pub needs_parens: bool,
    pub skip: Option<SkipReason>,
}

impl LiteralSpan {
    pub fn is_candidate(&self) -> bool {
        self.skip.is_none()
    }

    /// Whether the literal may be rewritten at all.
    pub fn is_rewritable(&self) -> bool {
        !self.skip.is_some_and(SkipReason::is_structural)
    }
}

pub struct Extractor<'a> {
    source: &'a str,
    lookup_class: &'a str,
    line_index: Vec<usize>,
}

impl<'a> Extractor<'a> {
    pub fn new(source: &'a str, lookup_class: &'a str) -> Self {
        Self {
            source,
            lookup_class,
            line_index: build_line_index(source),
        }
    }

    /// Every literal of the unit, in source order.
    ///
    /// The walk is lazy and starts over on each call.
    pub fn literals(&self) -> Literals<'_> {
        Literals {
            extractor: self,
            lexer: Lexer::new(self.source).peekable(),
            tracker: ScopeTracker::new(self.source),
            prev: None,
        }
    }

    /// Literals that pass every structural and text check.
    pub fn candidates(&self) -> impl Iterator<Item = LiteralSpan> + '_ {
        self.literals().filter(LiteralSpan::is_candidate)
    }

    fn already_localized(&self, start: usize) -> bool {
        let from = floor_char_boundary(self.source, start.saturating_sub(LOOKBACK_BYTES));
        let window = &self.source[from..start];
        LOOKUP_PREFIX_REGEX
            .captures(window)
            .is_some_and(|caps| &caps[1] == self.lookup_class)
    }

    fn column(&self, line: usize, offset: usize) -> usize {
        let line_start = self.line_index[line - 1];
        self.source[line_start..offset].chars().count() + 1
    }
}

pub struct Literals<'e> {
    extractor: &'e Extractor<'e>,
    lexer: Peekable<Lexer<'e>>,
    tracker: ScopeTracker<'e>,
    prev: Option<Token>,
}

impl Literals<'_> {
    fn prev_allows_bare(&self, source: &str) -> bool {
        match &self.prev {
            None => true,
            Some(tok) => match tok.kind {
                TokenKind::Punct => matches!(
                    tok.text(source),
                    "(" | "[" | "{" | "," | ":" | "=" | "=>" | "?" | "??"
                ),
                TokenKind::Word => matches!(tok.text(source), "return" | "yield"),
                TokenKind::Str(_) => false,
            },
        }
    }

    fn next_allows_bare(next: Option<&Token>, source: &str) -> bool {
        match next {
            None => true,
            Some(tok) => {
                matches!(tok.kind, TokenKind::Punct)
                    && matches!(tok.text(source), ")" | "]" | "}" | "," | ";" | ":")
            }
        }
    }
}

impl Iterator for Literals<'_> {
    type Item = LiteralSpan;

    fn next(&mut self) -> Option<LiteralSpan> {
        let source = self.extractor.source;
        loop {
            let token = self.lexer.next()?;
            let TokenKind::Str(lit) = &token.kind else {
                self.tracker.feed(&token);
                self.prev = Some(token);
                continue;
            };

            let context = self.tracker.classify_next();
            let prev_bare = self.prev_allows_bare(source);
            let prev_str = self.prev.as_ref().is_some_and(Token::is_str);
            let next = self.lexer.peek();
            let adjacent = prev_str || next.is_some_and(Token::is_str);
            let needs_parens = !(prev_bare && Self::next_allows_bare(next, source));

            let content = &source[lit.content.clone()];
            let value = if lit.raw {
                content.to_string()
            } else {
                unescape(content)
            };

            let skip = if lit.interpolated {
                Some(SkipReason::Interpolated)
            } else if lit.triple {
                Some(SkipReason::TripleQuoted)
            } else if lit.unterminated {
                Some(SkipReason::Unterminated)
            } else if context.directive {
                Some(SkipReason::Directive)
            } else if adjacent {
                Some(SkipReason::Adjacent)
            } else {
                heuristic_skip(&value)
            };

            let localized = self.extractor.already_localized(token.span.start);
            let line = offset_to_line(&self.extractor.line_index, token.span.start);
            let span = LiteralSpan {
                range: token.span.clone(),
                value,
                quote: lit.quote,
                raw: lit.raw,
                line,
                column: self.extractor.column(line, token.span.start),
                context,
                needs_parens,
                skip,
            };

            self.tracker.feed(&token);
            self.prev = Some(token);

            if !localized {
                return Some(span);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::core::classify::ContextKind;

    fn literals(source: &str) -> Vec<LiteralSpan> {
        Extractor::new(source, "AppLocalizations").literals().collect()
    }

    #[test]
    fn test_escaped_quote_stays_inside_literal() {
        let source = r#"Widget b(BuildContext context) => Text('Don\'t go', key: k);"#;
        let spans = literals(source);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].value, "Don't go");
        assert_eq!(&source[spans[0].range.clone()], r"'Don\'t go'");
        assert!(spans[0].is_candidate());
    }

    #[test]
    fn test_location_and_context() {
        let source = "class A extends State<B> {\n  Widget build(BuildContext context) {\n    return Text(\"Save\");\n  }\n}\n";
        let spans = literals(source);
        assert_eq!(spans.len(), 1);
        let span = &spans[0];
        assert_eq!(span.line, 3);
        assert_eq!(span.column, 17);
        assert_eq!(span.quote, QuoteStyle::Double);
        assert_eq!(span.context.kind, ContextKind::Plain);
        assert!(!span.needs_parens);
    }

    #[test]
    fn test_already_localized_literal_is_not_yielded() {
        let source = "Widget b(BuildContext context) => Text(AppLocalizations.of(context)?.save ?? 'Save');";
        assert!(literals(source).is_empty());
    }

    #[test]
    fn test_lookup_of_other_class_is_not_treated_as_localized() {
        let source = "Widget b(BuildContext context) => Text(Other.of(context)?.save ?? 'Save');";
        assert_eq!(literals(source).len(), 1);
    }

    #[test]
    fn test_heuristic_skips() {
        assert_eq!(heuristic_skip("X"), Some(SkipReason::TooShort));
        assert_eq!(heuristic_skip("https://example.com"), Some(SkipReason::Url));
        assert_eq!(heuristic_skip("42"), Some(SkipReason::Number));
        assert_eq!(heuristic_skip("+1 (555) 123-4567"), Some(SkipReason::Phone));
        assert_eq!(heuristic_skip("me@example.com"), Some(SkipReason::Email));
        assert_eq!(heuristic_skip("${name}"), Some(SkipReason::Template));
        assert_eq!(heuristic_skip("API_KEY"), Some(SkipReason::Constant));
        assert_eq!(heuristic_skip("userName"), Some(SkipReason::Identifier));
        assert_eq!(heuristic_skip("Save changes"), None);
        assert_eq!(heuristic_skip("Save"), None);
    }

    #[test]
    fn test_structural_skips() {
        let source = r#"
import 'package:app/main.dart';
Widget b(BuildContext context) {
  print('Hello $name');
  print('''Multi
line''');
  print('Part one' 'Part two');
}
"#;
        let reasons: Vec<_> = literals(source).iter().map(|s| s.skip).collect();
        assert_eq!(
            reasons,
            vec![
                Some(SkipReason::Directive),
                Some(SkipReason::Interpolated),
                Some(SkipReason::TripleQuoted),
                Some(SkipReason::Adjacent),
                Some(SkipReason::Adjacent),
            ]
        );
    }

    #[test]
    fn test_needs_parens_for_member_access_and_operators() {
        let source = "Widget b(BuildContext context) { final a = 'Hello world'.length; final c = 'Hi there' + x; return 'Done now'; }";
        let parens: Vec<_> = literals(source)
            .iter()
            .map(|s| (s.value.clone(), s.needs_parens))
            .collect();
        assert_eq!(
            parens,
            vec![
                ("Hello world".to_string(), true),
                ("Hi there".to_string(), true),
                ("Done now".to_string(), false),
            ]
        );
    }

    #[test]
    fn test_raw_literal_value_is_verbatim() {
        let source = r"Widget b(BuildContext context) => Text(r'C:\temp\new');";
        let spans = literals(source);
        assert!(spans[0].raw);
        assert_eq!(spans[0].value, r"C:\temp\new");
    }

    #[test]
    fn test_literals_restart() {
        let source = "Widget b(BuildContext context) => Text('Save file');";
        let extractor = Extractor::new(source, "AppLocalizations");
        assert_eq!(extractor.literals().count(), 1);
        assert_eq!(extractor.candidates().count(), 1);
    }
}
