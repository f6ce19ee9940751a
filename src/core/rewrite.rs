//! The Rewriter: turns matched literals into lookup expressions.
//!
//! All edits for a unit are collected first and applied in one pass over the
//! original text, so the output never depends on the order sites were found
//! in and the caller writes the file exactly once.

use std::{collections::BTreeSet, ops::Range, path::Path};

use tracing::debug;

use crate::core::{
    classify::{ConstSource, ContextKind, Strategy, strategy},
    extractor::LiteralSpan,
    lexer::{Lexer, TokenKind},
    matcher::Suggestion,
};

/// A literal paired with the key it will be looked up by.
#[derive(Debug, Clone)]
pub struct RewriteSite {
    pub literal: LiteralSpan,
    pub key: String,
}

/// Pair every rewritable literal with the first suggestion carrying its text.
pub fn match_sites(
    literals: impl IntoIterator<Item = LiteralSpan>,
    suggestions: &[&Suggestion],
) -> Vec<RewriteSite> {
    literals
        .into_iter()
        .filter(LiteralSpan::is_rewritable)
        .filter_map(|literal| {
            let suggestion = suggestions.iter().find(|s| s.value == literal.value)?;
            Some(RewriteSite {
                key: suggestion.key.clone(),
                literal,
            })
        })
        .collect()
}

/// A site left for manual follow-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeferredSite {
    pub line: usize,
    pub column: usize,
    pub key: String,
    pub value: String,
    pub kind: ContextKind,
    /// Text of the line holding the literal, for reports.
    pub source_line: String,
}

/// Result of rewriting one unit.
#[derive(Debug, Clone, Default)]
pub struct FileRewrite {
    pub content: String,
    /// Literals replaced by a lookup expression.
    pub changed: usize,
    /// `const` keywords removed or turned into `final`.
    pub const_dropped: usize,
    pub deferred: Vec<DeferredSite>,
    pub import_added: bool,
    /// Keys of the literals that were actually replaced.
    pub applied_keys: BTreeSet<String>,
}

impl FileRewrite {
    pub fn is_modified(&self, original: &str) -> bool {
        self.content != original
    }
}

#[derive(Debug, Clone, Copy)]
enum Directive {
    Import,
    Library,
    Other,
}

#[derive(Debug, Clone)]
struct Edit {
    range: Range<usize>,
    text: String,
}

pub struct Rewriter<'a> {
    pub lookup_class: &'a str,
    /// Module path relative to the source root, e.g. `l10n/app_localizations.dart`.
    pub import_path: &'a str,
    /// Marker text for deferred sites; `None` disables annotation.
    pub defer_marker: Option<&'a str>,
    pub drop_const: bool,
}

impl Rewriter<'_> {
    fn lookup_expression(&self, key: &str, literal_source: &str, parens: bool) -> String {
        let expr = format!(
            "{}.of(context)?.{} ?? {}",
            self.lookup_class, key, literal_source
        );
        if parens { format!("({})", expr) } else { expr }
    }

    /// Rewrite `source` at `sites`. `depth` is the number of directories
    /// between the source root and the unit.
    pub fn rewrite(&self, source: &str, sites: &[RewriteSite], depth: usize) -> FileRewrite {
        let mut result = FileRewrite::default();
        let mut edits: Vec<Edit> = Vec::new();
        let mut dropped: BTreeSet<usize> = BTreeSet::new();
        // Line end offset -> keys deferred on that line
        let mut deferred_lines: Vec<(usize, Vec<String>)> = Vec::new();

        for site in sites {
            let literal = &site.literal;
            match strategy(&literal.context, self.drop_const) {
                Strategy::Lookup => {}
                Strategy::DropConst(_) => {
                    for source_kind in &literal.context.const_sources {
                        let (range, replacement) = match source_kind {
                            ConstSource::Expression(kw) => {
                                (kw.start..skip_whitespace(source, kw.end), String::new())
                            }
                            ConstSource::LocalDeclaration(kw) => (kw.clone(), "final".to_string()),
                            _ => continue,
                        };
                        if dropped.insert(range.start) {
                            edits.push(Edit {
                                range,
                                text: replacement,
                            });
                            result.const_dropped += 1;
                        }
                    }
                }
                Strategy::Defer(kind) => {
                    debug!(key = %site.key, line = literal.line, %kind, "deferred site");
                    result.deferred.push(DeferredSite {
                        line: literal.line,
                        column: literal.column,
                        key: site.key.clone(),
                        value: literal.value.clone(),
                        kind,
                        source_line: line_text(source, literal.range.start).to_string(),
                    });
                    let end = line_end(source, literal.range.end);
                    match deferred_lines.iter_mut().find(|(e, _)| *e == end) {
                        Some((_, keys)) => {
                            if !keys.contains(&site.key) {
                                keys.push(site.key.clone());
                            }
                        }
                        None => deferred_lines.push((end, vec![site.key.clone()])),
                    }
                    continue;
                }
            }

            let literal_source = &source[literal.range.clone()];
            edits.push(Edit {
                range: literal.range.clone(),
                text: self.lookup_expression(&site.key, literal_source, literal.needs_parens),
            });
            result.changed += 1;
            result.applied_keys.insert(site.key.clone());
        }

        if let Some(marker) = self.defer_marker {
            for (end, keys) in deferred_lines {
                let line_start = source[..end].rfind('\n').map_or(0, |i| i + 1);
                if source[line_start..end].contains(marker) {
                    continue;
                }
                edits.push(Edit {
                    range: end..end,
                    text: format!(" // {}: {}", marker, keys.join(", ")),
                });
            }
        }

        if result.changed > 0 {
            if let Some(edit) = self.import_edit(source, depth) {
                edits.push(edit);
                result.import_added = true;
            }
        }

        result.content = apply_edits(source, edits);
        result
    }

    /// The import line to insert, or `None` when the module is already imported.
    fn import_edit(&self, source: &str, depth: usize) -> Option<Edit> {
        let file_name = Path::new(self.import_path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.import_path.to_string());

        let mut last_import_end = None;
        let mut library_end = None;
        let mut first_token = None;
        let mut directive: Option<Directive> = None;

        for token in Lexer::new(source) {
            let text = token.text(source);
            first_token.get_or_insert(token.span.start);
            match (&token.kind, directive) {
                (TokenKind::Word, None) => {
                    directive = match text {
                        "import" => Some(Directive::Import),
                        "library" => Some(Directive::Library),
                        "export" | "part" => Some(Directive::Other),
                        _ => break,
                    }
                }
                (TokenKind::Punct, Some(kind)) if text == ";" => {
                    match kind {
                        Directive::Import => last_import_end = Some(token.span.end),
                        Directive::Library => library_end = Some(token.span.end),
                        Directive::Other => {}
                    }
                    directive = None;
                }
                (TokenKind::Str(lit), Some(Directive::Import)) => {
                    if source[lit.content.clone()].ends_with(&file_name) {
                        return None;
                    }
                }
                (_, Some(_)) => {}
                (_, None) => break,
            }
        }

        let line = format!("import '{}{}';", "../".repeat(depth), self.import_path);
        let edit = match last_import_end.or(library_end) {
            Some(end) => {
                let at = line_end(source, end);
                if at < source.len() {
                    Edit {
                        range: at + 1..at + 1,
                        text: format!("{}\n", line),
                    }
                } else {
                    Edit {
                        range: at..at,
                        text: format!("\n{}\n", line),
                    }
                }
            }
            None => {
                let at = first_token
                    .map(|start| source[..start].rfind('\n').map_or(0, |i| i + 1))
                    .unwrap_or(source.len());
                Edit {
                    range: at..at,
                    text: format!("{}\n\n", line),
                }
            }
        };
        Some(edit)
    }
}

/// Offset of the `\n` (or `\r\n`) ending the line containing `offset`, or EOF.
fn line_end(source: &str, offset: usize) -> usize {
    match source[offset..].find('\n') {
        Some(i) => {
            let end = offset + i;
            if end > 0 && source.as_bytes()[end - 1] == b'\r' {
                end - 1
            } else {
                end
            }
        }
        None => source.len(),
    }
}

/// The line containing `offset`, without its terminator.
pub fn line_text(source: &str, offset: usize) -> &str {
    let start = source[..offset].rfind('\n').map_or(0, |i| i + 1);
    &source[start..line_end(source, offset)]
}

fn skip_whitespace(source: &str, offset: usize) -> usize {
    offset
        + source[offset..]
            .bytes()
            .take_while(|b| b.is_ascii_whitespace())
            .count()
}

fn apply_edits(source: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by_key(|e| (e.range.start, e.range.end));
    let mut out = String::with_capacity(source.len() + edits.len() * 48);
    let mut cursor = 0;
    for edit in edits {
        if edit.range.start < cursor {
            continue;
        }
        out.push_str(&source[cursor..edit.range.start]);
        out.push_str(&edit.text);
        cursor = edit.range.end;
    }
    out.push_str(&source[cursor..]);
    out
}
