//! Context-safety classification of rewrite sites.
//!
//! A lookup expression reads the ambient `BuildContext`, so it is only legal
//! where code runs with one in scope. [`ScopeTracker`] follows the token
//! stream and answers, for the literal about to be consumed, which syntactic
//! context it sits in and which `const` qualifiers make it a compile-time
//! constant. [`strategy`] turns that answer into the rewrite decision, before
//! any text is written.

use std::ops::Range;

use crate::core::lexer::{Token, TokenKind};

/// Enclosing context of a rewrite site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ContextKind {
    /// Executable code with an ambient context; the lookup can go in directly.
    Plain,
    /// Inside a constant expression or declaration.
    CompileTimeConstant,
    /// Instance field initializer or constructor initializer list.
    FieldInitializer,
    /// `static` member, top-level declaration, or a function or method with
    /// no `context` in scope.
    StaticDeclaration,
}

impl std::fmt::Display for ContextKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContextKind::Plain => write!(f, "plain"),
            ContextKind::CompileTimeConstant => write!(f, "const"),
            ContextKind::FieldInitializer => write!(f, "field-initializer"),
            ContextKind::StaticDeclaration => write!(f, "static"),
        }
    }
}

/// Why a site is a compile-time constant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstSource {
    /// `const Foo(...)`, `const [...]`, `const <T>{...}`; the range is the keyword.
    Expression(Range<usize>),
    /// `const x = ...;` inside a function body; the range is the keyword.
    LocalDeclaration(Range<usize>),
    /// Class-level or top-level `const` declaration.
    Declaration,
    /// Default value of a parameter.
    ParameterDefault,
    /// `case` label of a switch statement or pattern of a switch expression.
    CaseLabel,
    /// Argument of a metadata annotation.
    Annotation,
}

impl ConstSource {
    /// The keyword that can be removed to make the site non-constant, if any.
    pub fn droppable_keyword(&self) -> Option<&Range<usize>> {
        match self {
            ConstSource::Expression(kw) | ConstSource::LocalDeclaration(kw) => Some(kw),
            _ => None,
        }
    }
}

/// Classification of one literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteContext {
    pub kind: ContextKind,
    /// Kind the site would have without its `const` qualifiers.
    pub base_kind: ContextKind,
    pub const_sources: Vec<ConstSource>,
    /// The literal is the URI of an `import`/`export`/`part`/`library` directive.
    pub directive: bool,
}

/// What the rewriter does with a site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// Replace the literal with the lookup expression.
    Lookup,
    /// Remove these `const` keywords, then replace the literal.
    DropConst(Vec<Range<usize>>),
    /// Leave the literal and record it for manual follow-up.
    Defer(ContextKind),
}

/// Decide how a site may be rewritten.
///
/// With `drop_const` set, a constant site is converted when every reason for
/// its constness is a removable `const` keyword and the site would otherwise
/// be plain. Every other non-plain site is deferred.
pub fn strategy(context: &SiteContext, drop_const: bool) -> Strategy {
    match context.kind {
        ContextKind::Plain => Strategy::Lookup,
        ContextKind::CompileTimeConstant => {
            if !drop_const || context.base_kind != ContextKind::Plain {
                return Strategy::Defer(context.kind);
            }
            let keywords: Option<Vec<Range<usize>>> = context
                .const_sources
                .iter()
                .map(|s| s.droppable_keyword().cloned())
                .collect();
            match keywords {
                Some(keywords) if !keywords.is_empty() => Strategy::DropConst(keywords),
                _ => Strategy::Defer(context.kind),
            }
        }
        kind => Strategy::Defer(kind),
    }
}

// ============================================================
// Scope tracking
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    TopLevel,
    /// Body of a class, mixin, extension or enum. `ambient` is true for
    /// `State` subclasses, whose members inherit `context`.
    Class { ambient: bool },
    /// Executable block. `ambient` is true when a `BuildContext` is reachable.
    Body { ambient: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokClass {
    Word,
    Punct,
    Str,
}

/// A token of the current statement, with the group depth it was seen at.
#[derive(Debug, Clone)]
struct StmtTok {
    class: TokClass,
    span: Range<usize>,
    depth: usize,
}

#[derive(Debug, Clone)]
struct Group {
    open: u8,
    const_keyword: Option<Range<usize>>,
    annotation: bool,
    /// Body of a switch expression: `switch (v) { pattern => value, ... }`.
    switch_arms: bool,
}

#[derive(Debug)]
struct Frame {
    kind: FrameKind,
    stmt: Vec<StmtTok>,
    groups: Vec<Group>,
}

impl Frame {
    fn new(kind: FrameKind) -> Self {
        Self {
            kind,
            stmt: Vec::new(),
            groups: Vec::new(),
        }
    }
}

/// Tracks braces, groups and statements over a token stream.
///
/// Feed every token in order with [`ScopeTracker::feed`]; call
/// [`ScopeTracker::classify_next`] for a string token before feeding it.
pub struct ScopeTracker<'a> {
    source: &'a str,
    frames: Vec<Frame>,
}

impl<'a> ScopeTracker<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            frames: vec![Frame::new(FrameKind::TopLevel)],
        }
    }

    fn frame(&self) -> &Frame {
        // The top-level frame is never popped
        &self.frames[self.frames.len() - 1]
    }

    fn frame_mut(&mut self) -> &mut Frame {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    fn text(&self, tok: &StmtTok) -> &'a str {
        &self.source[tok.span.clone()]
    }

    fn is_word(&self, tok: &StmtTok, word: &str) -> bool {
        tok.class == TokClass::Word && self.text(tok) == word
    }

    fn is_punct(&self, tok: &StmtTok, punct: &str) -> bool {
        tok.class == TokClass::Punct && self.text(tok) == punct
    }

    fn stmt_has_word(&self, word: &str) -> bool {
        self.frame().stmt.iter().any(|t| self.is_word(t, word))
    }

    /// Consume one token.
    pub fn feed(&mut self, token: &Token) {
        let class = match token.kind {
            TokenKind::Word => TokClass::Word,
            TokenKind::Punct => TokClass::Punct,
            TokenKind::Str(_) => TokClass::Str,
        };
        let text = token.text(self.source);

        if class == TokClass::Punct {
            match text {
                "(" | "[" => {
                    let group = self.open_group(text.as_bytes()[0]);
                    self.push(class, token.span.clone());
                    self.frame_mut().groups.push(group);
                    return;
                }
                "{" => {
                    self.open_brace(token.span.clone());
                    return;
                }
                ")" | "]" => {
                    self.close_group(text.as_bytes()[0]);
                    self.push(class, token.span.clone());
                    return;
                }
                "}" => {
                    self.close_brace(token.span.clone());
                    return;
                }
                ";" if self.frame().groups.is_empty() => {
                    self.frame_mut().stmt.clear();
                    return;
                }
                ":" if self.frame().groups.is_empty() && self.is_case_statement() => {
                    self.frame_mut().stmt.clear();
                    return;
                }
                _ => {}
            }
        }
        self.push(class, token.span.clone());
    }

    fn push(&mut self, class: TokClass, span: Range<usize>) {
        let depth = self.frame().groups.len();
        self.frame_mut().stmt.push(StmtTok { class, span, depth });
    }

    fn open_group(&self, open: u8) -> Group {
        Group {
            open,
            const_keyword: self.const_introducer(),
            annotation: self.annotation_introducer(),
            switch_arms: open == b'{' && self.switch_expression_head(),
        }
    }

    fn close_group(&mut self, close: u8) {
        let open = if close == b')' { b'(' } else { b'[' };
        let groups = &mut self.frame_mut().groups;
        if let Some(pos) = groups.iter().rposition(|g| g.open == open) {
            groups.truncate(pos);
        }
    }

    fn open_brace(&mut self, span: Range<usize>) {
        match self.brace_kind() {
            Some(kind) => {
                self.frames.push(Frame::new(kind));
            }
            None => {
                let group = self.open_group(b'{');
                self.push(TokClass::Punct, span);
                self.frame_mut().groups.push(group);
            }
        }
    }

    fn close_brace(&mut self, span: Range<usize>) {
        if let Some(pos) = self.frame().groups.iter().rposition(|g| g.open == b'{') {
            self.frame_mut().groups.truncate(pos);
            self.push(TokClass::Punct, span);
            return;
        }
        if self.frames.len() == 1 {
            return;
        }
        self.frames.pop();
        // A block at statement level ends the statement; a closure inside an
        // expression does not.
        if self.frame().groups.is_empty() {
            self.frame_mut().stmt.clear();
        } else {
            self.push(TokClass::Punct, span);
        }
    }

    /// Kind of frame a `{` opens, or `None` for a map/set literal or parameter group.
    fn brace_kind(&self) -> Option<FrameKind> {
        let frame = self.frame();
        let Some(prev) = frame.stmt.last() else {
            // Bare block
            return (frame.groups.is_empty() && !matches!(frame.kind, FrameKind::Class { .. }))
                .then(|| self.body_frame());
        };
        let prev_text = self.text(prev);

        if frame.groups.is_empty()
            && ["class", "mixin", "extension", "enum"]
                .iter()
                .any(|w| self.stmt_has_word(w))
        {
            return Some(FrameKind::Class {
                ambient: self.extends_state(),
            });
        }
        if self.switch_expression_head() {
            return None;
        }

        let opens_body = match prev.class {
            TokClass::Punct => prev_text == ")" || (prev_text == "*" && self.star_after_async()),
            TokClass::Word => {
                matches!(
                    prev_text,
                    "async" | "sync" | "else" | "try" | "finally" | "do"
                ) || (frame.groups.is_empty() && self.stmt_has_word("get"))
            }
            TokClass::Str => false,
        };
        opens_body.then(|| self.body_frame())
    }

    fn star_after_async(&self) -> bool {
        let stmt = &self.frame().stmt;
        stmt.len() >= 2 && {
            let before = &stmt[stmt.len() - 2];
            self.is_word(before, "async") || self.is_word(before, "sync")
        }
    }

    /// A body frame opened from the current position.
    fn body_frame(&self) -> FrameKind {
        let frame = self.frame();
        let names_context = self.stmt_has_word("context");
        let ambient = names_context
            || match frame.kind {
                FrameKind::Body { ambient } => ambient,
                FrameKind::Class { ambient } => ambient && !self.stmt_has_word("static"),
                FrameKind::TopLevel => false,
            };
        FrameKind::Body { ambient }
    }

    /// Class header naming a `State<...>` superclass or `on` type
    /// (`State`, `ConsumerState`, ...).
    fn extends_state(&self) -> bool {
        let stmt = &self.frame().stmt;
        stmt.windows(3).any(|w| {
            (self.is_word(&w[0], "extends") || self.is_word(&w[0], "on"))
                && w[1].class == TokClass::Word
                && self.text(&w[1]).ends_with("State")
                && self.is_punct(&w[2], "<")
        })
    }

    /// The statement ends in `switch (...)` used as an expression, so the
    /// next `{` opens its arms rather than a block.
    fn switch_expression_head(&self) -> bool {
        let stmt = &self.frame().stmt;
        let Some(close) = stmt.last() else {
            return false;
        };
        if !self.is_punct(close, ")") {
            return false;
        }
        let Some(open) = stmt[..stmt.len() - 1]
            .iter()
            .rposition(|t| t.depth == close.depth && self.is_punct(t, "("))
        else {
            return false;
        };
        if open == 0 || !self.is_word(&stmt[open - 1], "switch") {
            return false;
        }
        // A switch statement starts the statement or follows `if (...)`,
        // `else` or `do`.
        match open.checked_sub(2).map(|i| &stmt[i]) {
            None => false,
            Some(before) => {
                !(self.is_punct(before, ")")
                    || self.is_word(before, "else")
                    || self.is_word(before, "do"))
            }
        }
    }

    /// The next token sits in the pattern of an arm of the switch expression
    /// whose arms are the group at `index`: no `=>` yet since the last `,`.
    fn in_switch_pattern(&self, index: usize) -> bool {
        let depth = index + 1;
        for tok in self.frame().stmt.iter().rev() {
            if tok.depth < depth {
                return true;
            }
            if tok.depth == depth {
                if self.is_punct(tok, "=>") {
                    return false;
                }
                if self.is_punct(tok, ",") {
                    return true;
                }
            }
        }
        true
    }

    fn is_case_statement(&self) -> bool {
        self.frame()
            .stmt
            .first()
            .is_some_and(|t| self.is_word(t, "case") || self.is_word(t, "default"))
    }

    /// `const` keyword introducing a group about to be opened: `const Foo(`,
    /// `const prefix.Foo.named(`, `const [`, `const <T>[`.
    fn const_introducer(&self) -> Option<Range<usize>> {
        let stmt = &self.frame().stmt;
        let mut i = stmt.len();

        // Skip a type argument list: `<...>`
        if i > 0 && self.is_punct(&stmt[i - 1], ">") {
            let mut depth = 0usize;
            while i > 0 {
                i -= 1;
                let tok = &stmt[i];
                if self.is_punct(tok, ">") {
                    depth += 1;
                } else if self.is_punct(tok, "<") {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                } else if tok.class == TokClass::Punct
                    && !matches!(self.text(tok), "," | "?" | ".")
                {
                    return None;
                }
            }
            if depth != 0 {
                return None;
            }
        }

        // Walk back over a (possibly qualified) type name
        let mut expect_word = true;
        while i > 0 {
            let tok = &stmt[i - 1];
            if self.is_word(tok, "const") {
                return Some(tok.span.clone());
            }
            if expect_word && tok.class == TokClass::Word {
                expect_word = false;
            } else if !expect_word && self.is_punct(tok, ".") {
                expect_word = true;
            } else {
                return None;
            }
            i -= 1;
        }
        None
    }

    /// `@Name(` or `@prefix.Name(`.
    fn annotation_introducer(&self) -> bool {
        let stmt = &self.frame().stmt;
        let mut i = stmt.len();
        let mut expect_word = true;
        while i > 0 {
            let tok = &stmt[i - 1];
            if self.is_punct(tok, "@") {
                return !expect_word;
            }
            if expect_word && tok.class == TokClass::Word {
                expect_word = false;
            } else if !expect_word && self.is_punct(tok, ".") {
                expect_word = true;
            } else {
                return false;
            }
            i -= 1;
        }
        false
    }

    /// `const` modifier of a `const [Type] name = ...` declaration.
    fn declaration_const(&self) -> Option<Range<usize>> {
        let mut keyword = None;
        for tok in self.frame().stmt.iter().filter(|t| t.depth == 0) {
            match (tok.class, self.text(tok)) {
                (TokClass::Word, "const") => keyword = Some(tok.span.clone()),
                (TokClass::Punct, "=") => return keyword,
                (TokClass::Punct, "(" | "[" | "{" | "=>") => return None,
                _ => {}
            }
        }
        None
    }

    /// A `=>` at statement level that belongs to a member or function, not
    /// to a closure assigned by `=`.
    fn arrow_body(&self) -> bool {
        for tok in self.frame().stmt.iter().filter(|t| t.depth == 0) {
            if self.is_punct(tok, "=") {
                return false;
            }
            if self.is_punct(tok, "=>") {
                return true;
            }
        }
        false
    }

    fn parameter_default(&self) -> bool {
        let frame = self.frame();
        let in_parens = frame.groups.iter().any(|g| g.open == b'(');
        let after_assign = frame.stmt.last().is_some_and(|t| self.is_punct(t, "="));
        let for_loop = frame.stmt.first().is_some_and(|t| self.is_word(t, "for"));
        in_parens && after_assign && !for_loop
    }

    fn is_directive(&self) -> bool {
        matches!(self.frame().kind, FrameKind::TopLevel)
            && self.frame().stmt.first().is_some_and(|t| {
                t.class == TokClass::Word
                    && matches!(self.text(t), "import" | "export" | "part" | "library")
            })
    }

    /// Classify the literal that is the next token to be fed.
    pub fn classify_next(&self) -> SiteContext {
        let frame = self.frame();

        let mut const_sources = Vec::new();
        if self.is_case_statement() {
            const_sources.push(ConstSource::CaseLabel);
        }
        if let Some(keyword) = self.declaration_const() {
            const_sources.push(match frame.kind {
                FrameKind::Body { .. } => ConstSource::LocalDeclaration(keyword),
                _ => ConstSource::Declaration,
            });
        }
        for (index, group) in frame.groups.iter().enumerate() {
            if group.switch_arms && self.in_switch_pattern(index) {
                const_sources.push(ConstSource::CaseLabel);
            }
            if group.annotation {
                const_sources.push(ConstSource::Annotation);
            }
            if let Some(keyword) = &group.const_keyword {
                const_sources.push(ConstSource::Expression(keyword.clone()));
            }
        }
        if self.parameter_default() {
            const_sources.push(ConstSource::ParameterDefault);
        }

        let is_static = self.stmt_has_word("static");
        let base_kind = match frame.kind {
            FrameKind::Body { ambient: true } => ContextKind::Plain,
            FrameKind::Body { ambient: false } => ContextKind::StaticDeclaration,
            FrameKind::Class { ambient } if self.arrow_body() => {
                if (ambient && !is_static) || self.stmt_has_word("context") {
                    ContextKind::Plain
                } else {
                    ContextKind::StaticDeclaration
                }
            }
            FrameKind::Class { .. } if is_static => ContextKind::StaticDeclaration,
            FrameKind::Class { .. } => ContextKind::FieldInitializer,
            FrameKind::TopLevel if self.arrow_body() && self.stmt_has_word("context") => {
                ContextKind::Plain
            }
            FrameKind::TopLevel => ContextKind::StaticDeclaration,
        };

        let kind = if const_sources.is_empty() {
            base_kind
        } else {
            ContextKind::CompileTimeConstant
        };

        SiteContext {
            kind,
            base_kind,
            const_sources,
            directive: self.is_directive(),
        }
    }
}
