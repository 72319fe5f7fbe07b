//! Recursive-descent parser over [`lexer`](super::lexer) tokens.
//!
//! Declarations the generator cares about are parsed fully; everything else
//! (function bodies, initializer expressions, `#if` blocks) is skipped with
//! delimiter matching so that member boundaries stay exact.

use super::lexer::{tokenize, Span, Token, TokenKind};
use super::types::{PathSegment, TupleElement, TypeExpr};
use super::{
    AccessorBlock, Attribute, DeclKind, Member, Modifier, Pattern, PatternBinding, SourceFile,
    Specifier, TypeDecl, VariableDecl,
};
use crate::error::ParseError;

const MODIFIERS: &[&str] = &[
    "public", "private", "fileprivate", "internal", "open", "package", "final", "static",
    "override", "required", "convenience", "lazy", "weak", "unowned", "mutating",
    "nonmutating", "dynamic", "indirect", "optional", "nonisolated", "distributed", "prefix",
    "postfix", "infix", "consuming", "borrowing", "__consuming",
];

const DECL_KEYWORDS: &[&str] = &[
    "var", "let", "func", "init", "deinit", "subscript", "typealias", "associatedtype", "case",
    "class", "struct", "enum", "protocol", "actor", "extension", "import", "operator",
    "precedencegroup", "macro",
];

const ACCESSORS: &[&str] = &[
    "get", "set", "willSet", "didSet", "_read", "_modify", "read", "modify", "init",
    "unsafeAddress", "unsafeMutableAddress",
];

const TYPE_PREFIXES: &[&str] = &[
    "some", "any", "inout", "borrowing", "consuming", "isolated", "sending", "__owned",
    "__shared",
];

pub fn parse_source(src: &str) -> Result<SourceFile, ParseError> {
    let tokens = tokenize(src)?;
    let mut parser = Parser { tokens, pos: 0, src };
    let mut decls = Vec::new();
    while let Some(tok) = parser.peek() {
        match tok.kind {
            TokenKind::Semi => parser.pos += 1,
            TokenKind::RBrace | TokenKind::RParen | TokenKind::RBracket => {
                return Err(parser.unexpected("declaration"));
            }
            _ => {
                if let Member::Type(decl) = parser.parse_member()? {
                    decls.push(decl);
                }
            }
        }
    }
    Ok(SourceFile { decls })
}

struct Parser<'src> {
    tokens: Vec<Token<'src>>,
    pos: usize,
    src: &'src str,
}

impl<'src> Parser<'src> {
    // ————————————————————————————————————————————————————————————————————————
    // CURSOR
    // ————————————————————————————————————————————————————————————————————————

    fn peek(&self) -> Option<&Token<'src>> {
        self.tokens.get(self.pos)
    }

    fn peek_nth(&self, n: usize) -> Option<&Token<'src>> {
        self.tokens.get(self.pos + n)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek_kind() == Some(kind)
    }

    fn at_ident(&self, text: &str) -> bool {
        self.peek().is_some_and(|t| t.is_ident(text))
    }

    fn bump(&mut self) -> Option<Token<'src>> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn prev_end(&self) -> usize {
        self.pos.checked_sub(1).map_or(0, |i| self.tokens[i].span.end)
    }

    /// The next token touches the previous one (`T?` as opposed to `T ?`).
    fn next_is_adjacent(&self) -> bool {
        self.pos > 0 && self.peek().is_some_and(|t| t.span.start == self.prev_end())
    }

    fn eof_position(&self) -> (u32, u32) {
        let line = self.src.lines().count().max(1) as u32;
        let column = self.src.lines().last().map_or(0, |l| l.chars().count()) as u32 + 1;
        (line, column)
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match self.peek() {
            Some(tok) => ParseError::Unexpected {
                expected: expected.to_string(),
                found: format!("`{}`", tok.text),
                line: tok.span.line,
                column: tok.span.column,
            },
            None => {
                let (line, column) = self.eof_position();
                ParseError::UnexpectedEof { expected: expected.to_string(), line, column }
            }
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token<'src>, ParseError> {
        if self.at(kind) {
            Ok(self.bump().expect("peeked"))
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn expect_ident(&mut self, expected: &str) -> Result<Token<'src>, ParseError> {
        self.expect(TokenKind::Ident, expected)
    }

    fn starts_declaration(tok: &Token<'_>) -> bool {
        match tok.kind {
            TokenKind::At | TokenKind::Pound => true,
            TokenKind::Ident => DECL_KEYWORDS.contains(&tok.text) || MODIFIERS.contains(&tok.text),
            _ => false,
        }
    }

    // ————————————————————————————————————————————————————————————————————————
    // DECLARATIONS
    // ————————————————————————————————————————————————————————————————————————

    fn parse_member(&mut self) -> Result<Member, ParseError> {
        if self.at(TokenKind::Pound) {
            return self.skip_compiler_directive();
        }
        let attributes = self.parse_attributes()?;
        let modifiers = self.parse_modifiers();
        let Some(tok) = self.peek().cloned() else {
            return Err(self.unexpected("declaration"));
        };

        if tok.kind == TokenKind::Ident {
            if let Some(kind) = DeclKind::from_keyword(tok.text) {
                return self
                    .parse_type_decl(kind, attributes, modifiers)
                    .map(Member::Type);
            }
            let specifier = match tok.text {
                "var" => Some(Specifier::Var),
                "let" => Some(Specifier::Let),
                _ => None,
            };
            if let Some(specifier) = specifier {
                return self
                    .parse_variable(specifier, attributes, modifiers)
                    .map(Member::Variable);
            }
        }
        self.skip_declaration()
    }

    fn parse_attributes(&mut self) -> Result<Vec<Attribute>, ParseError> {
        let mut attributes = Vec::new();
        while self.at(TokenKind::At) {
            attributes.push(self.parse_attribute()?);
        }
        Ok(attributes)
    }

    fn parse_attribute(&mut self) -> Result<Attribute, ParseError> {
        let at = self.expect(TokenKind::At, "`@`")?;
        let mut name = self.expect_ident("attribute name")?.text.to_string();
        while self.at(TokenKind::Dot) && self.peek_nth(1).is_some_and(|t| t.kind == TokenKind::Ident) {
            self.pos += 1;
            name.push('.');
            name.push_str(self.bump().expect("peeked").text);
        }
        if self.at(TokenKind::LParen) && self.next_is_adjacent() {
            self.skip_balanced()?;
        }
        let end = self.prev_end();
        Ok(Attribute {
            name,
            span: Span { start: at.span.start, end, line: at.span.line, column: at.span.column },
        })
    }

    fn parse_modifiers(&mut self) -> Vec<Modifier> {
        let mut modifiers = Vec::new();
        while let Some(tok) = self.peek() {
            if tok.kind != TokenKind::Ident {
                break;
            }
            let is_modifier = if tok.text == "class" {
                // `class var`, `class func`, `class override func` ...
                self.peek_nth(1).is_some_and(|next| {
                    next.kind == TokenKind::Ident
                        && (matches!(next.text, "var" | "let" | "func" | "subscript" | "typealias")
                            || MODIFIERS.contains(&next.text))
                })
            } else {
                MODIFIERS.contains(&tok.text)
                    && self.peek_nth(1).is_some_and(|next| {
                        matches!(next.kind, TokenKind::Ident | TokenKind::At | TokenKind::LParen)
                    })
            };
            if !is_modifier {
                break;
            }
            let name = self.bump().expect("peeked").text.to_string();
            self.skip_modifier_detail();
            modifiers.push(Modifier { name });
        }
        modifiers
    }

    /// `(set)` in `private(set)`, `(unsafe)` in `unowned(unsafe)`.
    fn skip_modifier_detail(&mut self) {
        let is_detail = self.at(TokenKind::LParen)
            && self.peek_nth(1).is_some_and(|t| t.kind == TokenKind::Ident)
            && self.peek_nth(2).is_some_and(|t| t.kind == TokenKind::RParen);
        if is_detail {
            self.pos += 3;
        }
    }

    fn parse_type_decl(
        &mut self,
        kind: DeclKind,
        attributes: Vec<Attribute>,
        modifiers: Vec<Modifier>,
    ) -> Result<TypeDecl, ParseError> {
        let keyword = self.bump().expect("peeked").span;
        let name = if kind == DeclKind::Extension {
            self.parse_type()?.to_string()
        } else {
            self.expect_ident("type name")?.text.to_string()
        };

        if self.at(TokenKind::Lt) {
            self.skip_angle_brackets()?;
        }

        let mut inherited = Vec::new();
        if self.at(TokenKind::Colon) {
            self.pos += 1;
            loop {
                inherited.push(self.parse_type()?);
                if !self.at(TokenKind::Comma) {
                    break;
                }
                self.pos += 1;
            }
        }

        if self.at_ident("where") {
            while !self.at(TokenKind::LBrace) {
                match self.peek_kind() {
                    None => return Err(self.unexpected("`{`")),
                    Some(TokenKind::LParen | TokenKind::LBracket) => self.skip_balanced()?,
                    Some(_) => self.pos += 1,
                }
            }
        }

        let body_open = self.expect(TokenKind::LBrace, "`{`")?.span.start;
        let mut members = Vec::new();
        loop {
            match self.peek_kind() {
                None => return Err(self.unexpected("`}`")),
                Some(TokenKind::RBrace) => break,
                Some(TokenKind::Semi) => self.pos += 1,
                Some(_) => members.push(self.parse_member()?),
            }
        }
        let body_close = self.expect(TokenKind::RBrace, "`}`")?.span.start;

        Ok(TypeDecl {
            attributes,
            modifiers,
            kind,
            name,
            inherited,
            members,
            keyword,
            body_open,
            body_close,
        })
    }

    fn parse_variable(
        &mut self,
        specifier: Specifier,
        attributes: Vec<Attribute>,
        modifiers: Vec<Modifier>,
    ) -> Result<VariableDecl, ParseError> {
        let span = self.bump().expect("peeked").span;
        let mut bindings = Vec::new();
        loop {
            let binding_span = match self.peek() {
                Some(tok) => tok.span,
                None => return Err(self.unexpected("pattern")),
            };
            let pattern = self.parse_pattern()?;
            let type_annotation = if self.at(TokenKind::Colon) {
                self.pos += 1;
                Some(self.parse_type()?)
            } else {
                None
            };
            let has_initializer = self.at(TokenKind::Eq);
            if has_initializer {
                self.pos += 1;
                self.skip_expression()?;
            }
            let accessor_block = if self.at(TokenKind::LBrace) {
                Some(self.parse_accessor_block()?)
            } else {
                None
            };
            bindings.push(PatternBinding {
                pattern,
                type_annotation,
                has_initializer,
                accessor_block,
                span: binding_span,
            });
            if !self.at(TokenKind::Comma) {
                break;
            }
            self.pos += 1;
        }
        Ok(VariableDecl { attributes, modifiers, specifier, bindings, span })
    }

    fn parse_pattern(&mut self) -> Result<Pattern, ParseError> {
        match self.peek_kind() {
            Some(TokenKind::Ident) => {
                let tok = self.bump().expect("peeked");
                Ok(if tok.text == "_" {
                    Pattern::Wildcard
                } else {
                    Pattern::Identifier(tok.text.to_string())
                })
            }
            Some(TokenKind::LParen) => {
                self.pos += 1;
                let mut items = Vec::new();
                while !self.at(TokenKind::RParen) {
                    items.push(self.parse_pattern()?);
                    if self.at(TokenKind::Comma) {
                        self.pos += 1;
                    } else if !self.at(TokenKind::RParen) {
                        return Err(self.unexpected("`,` or `)`"));
                    }
                }
                self.pos += 1;
                Ok(Pattern::Tuple(items))
            }
            _ => Err(self.unexpected("pattern")),
        }
    }

    fn parse_accessor_block(&mut self) -> Result<AccessorBlock, ParseError> {
        let open = self.pos;
        let mut lookahead = open + 1;
        // accessors may carry attributes and `mutating`-style modifiers
        while let Some(tok) = self.tokens.get(lookahead) {
            match tok.kind {
                TokenKind::At => lookahead += 2,
                TokenKind::Ident if MODIFIERS.contains(&tok.text) => lookahead += 1,
                _ => break,
            }
        }
        let explicit = self
            .tokens
            .get(lookahead)
            .is_some_and(|t| t.kind == TokenKind::Ident && ACCESSORS.contains(&t.text));

        self.skip_balanced()?;
        if !explicit {
            return Ok(AccessorBlock::Getter);
        }

        let mut names = Vec::new();
        let mut depth = 0usize;
        for tok in &self.tokens[open..self.pos] {
            match tok.kind {
                TokenKind::LBrace | TokenKind::LParen | TokenKind::LBracket => depth += 1,
                TokenKind::RBrace | TokenKind::RParen | TokenKind::RBracket => {
                    depth = depth.saturating_sub(1)
                }
                TokenKind::Ident if depth == 1 && ACCESSORS.contains(&tok.text) => {
                    names.push(tok.text.to_string());
                }
                _ => {}
            }
        }
        Ok(AccessorBlock::Accessors(names))
    }

    // ————————————————————————————————————————————————————————————————————————
    // TYPES
    // ————————————————————————————————————————————————————————————————————————

    fn parse_type(&mut self) -> Result<TypeExpr, ParseError> {
        let first = self.parse_type_postfix()?;
        if !self.at(TokenKind::Amp) {
            return Ok(first);
        }
        let mut parts = vec![first];
        while self.at(TokenKind::Amp) {
            self.pos += 1;
            parts.push(self.parse_type_postfix()?);
        }
        Ok(TypeExpr::Composition(parts))
    }

    fn parse_type_postfix(&mut self) -> Result<TypeExpr, ParseError> {
        let mut ty = self.parse_type_primary()?;
        loop {
            match self.peek_kind() {
                Some(TokenKind::Question) if self.next_is_adjacent() => {
                    self.pos += 1;
                    ty = TypeExpr::Optional(Box::new(ty));
                }
                Some(TokenKind::Bang) if self.next_is_adjacent() => {
                    self.pos += 1;
                    ty = TypeExpr::ImplicitlyUnwrapped(Box::new(ty));
                }
                Some(TokenKind::Dot)
                    if matches!(ty, TypeExpr::Named(_))
                        && self.peek_nth(1).is_some_and(|t| t.kind == TokenKind::Ident) =>
                {
                    self.pos += 1;
                    let segment = self.parse_path_segment()?;
                    if let TypeExpr::Named(segments) = &mut ty {
                        segments.push(segment);
                    }
                }
                _ => return Ok(ty),
            }
        }
    }

    fn parse_type_primary(&mut self) -> Result<TypeExpr, ParseError> {
        match self.peek_kind() {
            Some(TokenKind::At) => {
                let mut attributes = Vec::new();
                while self.at(TokenKind::At) {
                    attributes.push(self.parse_attribute()?.name);
                }
                let inner = Box::new(self.parse_type_postfix()?);
                Ok(TypeExpr::Attributed { attributes, inner })
            }
            Some(TokenKind::Ident) => {
                let is_prefix = self.peek().is_some_and(|t| TYPE_PREFIXES.contains(&t.text))
                    && self.peek_nth(1).is_some_and(|next| {
                        matches!(
                            next.kind,
                            TokenKind::Ident | TokenKind::LParen | TokenKind::LBracket | TokenKind::At
                        )
                    });
                if is_prefix {
                    let keyword = self.bump().expect("peeked").text.to_string();
                    let inner = Box::new(self.parse_type_postfix()?);
                    return Ok(TypeExpr::Prefixed { keyword, inner });
                }
                Ok(TypeExpr::Named(vec![self.parse_path_segment()?]))
            }
            Some(TokenKind::LBracket) => {
                self.pos += 1;
                let element = self.parse_type()?;
                let ty = if self.at(TokenKind::Colon) {
                    self.pos += 1;
                    let value = self.parse_type()?;
                    TypeExpr::Dictionary(Box::new(element), Box::new(value))
                } else {
                    TypeExpr::Array(Box::new(element))
                };
                self.expect(TokenKind::RBracket, "`]`")?;
                Ok(ty)
            }
            Some(TokenKind::LParen) => self.parse_tuple_or_function(),
            _ => Err(self.unexpected("type")),
        }
    }

    fn parse_path_segment(&mut self) -> Result<PathSegment, ParseError> {
        let name = self.expect_ident("type name")?.text.to_string();
        let mut generic_args = Vec::new();
        if self.at(TokenKind::Lt) && self.next_is_adjacent() {
            self.pos += 1;
            loop {
                generic_args.push(self.parse_type()?);
                if self.at(TokenKind::Comma) {
                    self.pos += 1;
                } else {
                    break;
                }
            }
            self.expect(TokenKind::Gt, "`>`")?;
        }
        Ok(PathSegment { name, generic_args })
    }

    fn parse_tuple_or_function(&mut self) -> Result<TypeExpr, ParseError> {
        self.expect(TokenKind::LParen, "`(`")?;
        let mut elements = Vec::new();
        while !self.at(TokenKind::RParen) {
            let label = self.parse_tuple_label();
            let ty = self.parse_type()?;
            // variadic parameter in a function type
            while self.at(TokenKind::Dot) && self.next_is_adjacent() {
                self.pos += 1;
            }
            elements.push(TupleElement { label, ty });
            if self.at(TokenKind::Comma) {
                self.pos += 1;
            } else if !self.at(TokenKind::RParen) {
                return Err(self.unexpected("`,` or `)`"));
            }
        }
        self.pos += 1;

        let mut effects = Vec::new();
        while let Some(tok) = self.peek() {
            if !matches!(tok.text, "async" | "throws" | "rethrows") || tok.kind != TokenKind::Ident {
                break;
            }
            let mut effect = self.bump().expect("peeked").text.to_string();
            if self.at(TokenKind::LParen) && self.next_is_adjacent() {
                // typed throws: `throws(MyError)`
                self.pos += 1;
                let error = self.parse_type()?;
                self.expect(TokenKind::RParen, "`)`")?;
                effect = format!("{effect}({error})");
            }
            effects.push(effect);
        }

        if self.at(TokenKind::Arrow) {
            self.pos += 1;
            let result = Box::new(self.parse_type()?);
            return Ok(TypeExpr::Function { params: elements, effects, result });
        }
        if !effects.is_empty() {
            return Err(self.unexpected("`->`"));
        }
        Ok(TypeExpr::Tuple(elements))
    }

    /// `x:` or `_ x:` in front of a tuple element / parameter type.
    fn parse_tuple_label(&mut self) -> Option<String> {
        let is_ident = |tok: Option<&Token<'_>>| tok.is_some_and(|t| t.kind == TokenKind::Ident);
        let is_colon = |tok: Option<&Token<'_>>| tok.is_some_and(|t| t.kind == TokenKind::Colon);
        if is_ident(self.peek()) && is_colon(self.peek_nth(1)) {
            let label = self.bump().expect("peeked").text.to_string();
            self.pos += 1;
            return Some(label);
        }
        if is_ident(self.peek()) && is_ident(self.peek_nth(1)) && is_colon(self.peek_nth(2)) {
            let outer = self.bump().expect("peeked").text;
            let inner = self.bump().expect("peeked").text;
            self.pos += 1;
            return Some(format!("{outer} {inner}"));
        }
        None
    }

    // ————————————————————————————————————————————————————————————————————————
    // SKIPPING
    // ————————————————————————————————————————————————————————————————————————

    /// Consumes a `(...)`, `[...]` or `{...}` group including nested groups.
    fn skip_balanced(&mut self) -> Result<(), ParseError> {
        let mut stack: Vec<TokenKind> = Vec::new();
        loop {
            let Some(tok) = self.peek() else {
                let expected = match stack.last() {
                    Some(TokenKind::LParen) => "`)`",
                    Some(TokenKind::LBracket) => "`]`",
                    _ => "`}`",
                };
                return Err(self.unexpected(expected));
            };
            match tok.kind {
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => stack.push(tok.kind),
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                    let (open, expected) = match tok.kind {
                        TokenKind::RParen => (TokenKind::LParen, "`)`"),
                        TokenKind::RBracket => (TokenKind::LBracket, "`]`"),
                        _ => (TokenKind::LBrace, "`}`"),
                    };
                    if stack.pop() != Some(open) {
                        return Err(self.unexpected(expected));
                    }
                }
                _ => {}
            }
            self.pos += 1;
            if stack.is_empty() {
                return Ok(());
            }
        }
    }

    fn skip_angle_brackets(&mut self) -> Result<(), ParseError> {
        let mut depth = 0usize;
        loop {
            match self.peek_kind() {
                None => return Err(self.unexpected("`>`")),
                Some(TokenKind::Lt) => depth += 1,
                Some(TokenKind::Gt) => depth -= 1,
                Some(TokenKind::LParen | TokenKind::LBracket) => {
                    self.skip_balanced()?;
                    continue;
                }
                Some(_) => {}
            }
            self.pos += 1;
            if depth == 0 {
                return Ok(());
            }
        }
    }

    /// Generic arguments in expression position, e.g. `Dictionary<String, Int>()`.
    /// Only consumed when everything up to the closing `>` looks like a type.
    fn try_skip_generic_arguments(&mut self) -> bool {
        let mut depth = 0usize;
        let mut cursor = self.pos;
        while let Some(tok) = self.tokens.get(cursor) {
            match tok.kind {
                TokenKind::Lt => depth += 1,
                TokenKind::Gt => {
                    depth -= 1;
                    if depth == 0 {
                        self.pos = cursor + 1;
                        return true;
                    }
                }
                TokenKind::Ident
                | TokenKind::Comma
                | TokenKind::Dot
                | TokenKind::Colon
                | TokenKind::LBracket
                | TokenKind::RBracket
                | TokenKind::LParen
                | TokenKind::RParen
                | TokenKind::Question
                | TokenKind::Bang
                | TokenKind::Amp
                | TokenKind::Arrow => {}
                _ => return false,
            }
            cursor += 1;
        }
        false
    }

    /// `{ willSet ... }` / `{ didSet ... }` directly after an initializer.
    fn at_observer_block(&self) -> bool {
        let mut lookahead = self.pos + 1;
        while self.tokens.get(lookahead).is_some_and(|t| t.kind == TokenKind::At) {
            lookahead += 2;
        }
        self.tokens
            .get(lookahead)
            .is_some_and(|t| t.is_ident("willSet") || t.is_ident("didSet"))
    }

    fn skip_expression(&mut self) -> Result<(), ParseError> {
        let mut consumed = 0usize;
        while let Some(tok) = self.peek() {
            if consumed > 0 && tok.newline_before && Self::starts_declaration(tok) {
                break;
            }
            match tok.kind {
                TokenKind::Comma
                | TokenKind::Semi
                | TokenKind::RBrace
                | TokenKind::RParen
                | TokenKind::RBracket => break,
                TokenKind::LBrace if consumed > 0 && self.at_observer_block() => break,
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => self.skip_balanced()?,
                TokenKind::Lt if self.next_is_adjacent() => {
                    if !self.try_skip_generic_arguments() {
                        self.pos += 1;
                    }
                }
                _ => self.pos += 1,
            }
            consumed += 1;
        }
        Ok(())
    }

    /// Skips a declaration that isn't modeled (`func`, `init`, `case` ...).
    fn skip_declaration(&mut self) -> Result<Member, ParseError> {
        let Some(first) = self.peek().cloned() else {
            return Err(self.unexpected("declaration"));
        };
        let keyword = first.text.to_string();
        let mut consumed = 0usize;
        let mut after_block = false;
        while let Some(tok) = self.peek() {
            if consumed > 0 && (tok.newline_before || after_block) && Self::starts_declaration(tok) {
                break;
            }
            match tok.kind {
                TokenKind::RBrace => break,
                TokenKind::Semi => {
                    self.pos += 1;
                    break;
                }
                TokenKind::RParen | TokenKind::RBracket => {
                    return Err(self.unexpected("declaration"));
                }
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => {
                    after_block = tok.kind == TokenKind::LBrace;
                    self.skip_balanced()?;
                }
                _ => {
                    after_block = false;
                    self.pos += 1;
                }
            }
            consumed += 1;
        }
        Ok(Member::Other { keyword, span: first.span })
    }

    /// `#if ... #endif` blocks and freestanding `#directive(...)` lines.
    fn skip_compiler_directive(&mut self) -> Result<Member, ParseError> {
        let pound = self.expect(TokenKind::Pound, "`#`")?;
        let name = self.expect_ident("directive name")?.text.to_string();
        if name == "if" {
            let mut depth = 1usize;
            while depth > 0 {
                match self.peek_kind() {
                    None => return Err(self.unexpected("`#endif`")),
                    Some(TokenKind::Pound) => {
                        self.pos += 1;
                        if self.at_ident("if") {
                            depth += 1;
                        } else if self.at_ident("endif") {
                            depth -= 1;
                        }
                    }
                    Some(_) => self.pos += 1,
                }
            }
            self.pos += 1;
        } else if self.at(TokenKind::LParen) && self.next_is_adjacent() {
            self.skip_balanced()?;
        }
        Ok(Member::Other { keyword: format!("#{name}"), span: pound.span })
    }
}
