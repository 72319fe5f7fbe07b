//! Tokenizer for the subset of Swift that type declarations are made of.
//!
//! Comments and whitespace are dropped; string literals and numbers are kept
//! as opaque tokens because the parser only ever skips over expressions.

use crate::error::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    Number,
    StringLit,
    At,
    Pound,
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Lt,
    Gt,
    Colon,
    Comma,
    Semi,
    Dot,
    Question,
    Bang,
    Eq,
    Amp,
    Arrow,
    /// Any other operator character.
    Op,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Clone)]
pub struct Token<'src> {
    pub kind: TokenKind,
    pub text: &'src str,
    pub span: Span,
    /// A line break separates this token from the previous one.
    pub newline_before: bool,
}

impl Token<'_> {
    pub fn is_ident(&self, text: &str) -> bool {
        self.kind == TokenKind::Ident && self.text == text
    }
}

// ————————————————————————————————————————————————————————————————————————————
// SCANNER
// ————————————————————————————————————————————————————————————————————————————

pub fn tokenize(src: &str) -> Result<Vec<Token<'_>>, ParseError> {
    let mut lexer = Lexer { src, bytes: src.as_bytes(), pos: 0, line: 1, line_start: 0 };
    let mut tokens = Vec::new();
    let mut newline_before = false;
    loop {
        newline_before |= lexer.skip_trivia()?;
        if lexer.pos >= lexer.bytes.len() {
            return Ok(tokens);
        }
        let start = lexer.pos;
        let line = lexer.line;
        let column = lexer.column_of(start);
        let kind = lexer.scan_token()?;
        tokens.push(Token {
            kind,
            text: &src[start..lexer.pos],
            span: Span { start, end: lexer.pos, line, column },
            newline_before,
        });
        newline_before = false;
    }
}

struct Lexer<'src> {
    src: &'src str,
    bytes: &'src [u8],
    pos: usize,
    line: u32,
    line_start: usize,
}

impl<'src> Lexer<'src> {
    fn column_of(&self, offset: usize) -> u32 {
        self.src[self.line_start..offset].chars().count() as u32 + 1
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, n: usize) -> Option<u8> {
        self.bytes.get(self.pos + n).copied()
    }

    fn bump(&mut self) {
        if self.bytes[self.pos] == b'\n' {
            self.line += 1;
            self.line_start = self.pos + 1;
        }
        self.pos += 1;
    }

    fn bump_char(&mut self) {
        match self.src[self.pos..].chars().next() {
            Some(c) if c.len_utf8() > 1 => self.pos += c.len_utf8(),
            Some(_) => self.bump(),
            None => {}
        }
    }

    fn starts_with(&self, pat: &str) -> bool {
        self.src[self.pos..].starts_with(pat)
    }

    fn error_here(&self, make: impl FnOnce(u32, u32) -> ParseError) -> ParseError {
        make(self.line, self.column_of(self.pos))
    }

    /// Skips whitespace and comments; returns whether a newline was crossed.
    fn skip_trivia(&mut self) -> Result<bool, ParseError> {
        let mut crossed = false;
        while let Some(b) = self.peek() {
            match b {
                b'\n' => {
                    crossed = true;
                    self.bump();
                }
                b' ' | b'\t' | b'\r' => self.bump(),
                b'/' if self.peek_at(1) == Some(b'/') => {
                    while let Some(c) = self.peek() {
                        if c == b'\n' {
                            break;
                        }
                        self.bump_char();
                    }
                }
                b'/' if self.peek_at(1) == Some(b'*') => {
                    let (line, column) = (self.line, self.column_of(self.pos));
                    self.pos += 2;
                    let mut depth = 1usize;
                    while depth > 0 {
                        if self.pos >= self.bytes.len() {
                            return Err(ParseError::UnterminatedComment { line, column });
                        }
                        if self.starts_with("/*") {
                            depth += 1;
                            self.pos += 2;
                        } else if self.starts_with("*/") {
                            depth -= 1;
                            self.pos += 2;
                        } else {
                            if self.peek() == Some(b'\n') {
                                crossed = true;
                            }
                            self.bump_char();
                        }
                    }
                }
                _ => {
                    let c = self.src[self.pos..].chars().next();
                    match c {
                        Some(c) if c.is_whitespace() => {
                            if c == '\u{2028}' || c == '\u{2029}' {
                                crossed = true;
                            }
                            self.bump_char();
                        }
                        _ => break,
                    }
                }
            }
        }
        Ok(crossed)
    }

    fn scan_token(&mut self) -> Result<TokenKind, ParseError> {
        let Some(b) = self.peek() else {
            return Err(self.error_here(|line, column| ParseError::UnexpectedEof {
                expected: "token".into(),
                line,
                column,
            }));
        };
        let single = |lexer: &mut Self, kind| {
            lexer.bump();
            Ok(kind)
        };
        match b {
            b'{' => single(self, TokenKind::LBrace),
            b'}' => single(self, TokenKind::RBrace),
            b'(' => single(self, TokenKind::LParen),
            b')' => single(self, TokenKind::RParen),
            b'[' => single(self, TokenKind::LBracket),
            b']' => single(self, TokenKind::RBracket),
            b'<' => single(self, TokenKind::Lt),
            b'>' => single(self, TokenKind::Gt),
            b':' => single(self, TokenKind::Colon),
            b',' => single(self, TokenKind::Comma),
            b';' => single(self, TokenKind::Semi),
            b'.' => single(self, TokenKind::Dot),
            b'?' => single(self, TokenKind::Question),
            b'!' => single(self, TokenKind::Bang),
            b'=' => single(self, TokenKind::Eq),
            b'&' => single(self, TokenKind::Amp),
            b'@' => single(self, TokenKind::At),
            b'-' if self.peek_at(1) == Some(b'>') => {
                self.pos += 2;
                Ok(TokenKind::Arrow)
            }
            b'"' => {
                self.scan_string(0)?;
                Ok(TokenKind::StringLit)
            }
            b'#' => {
                let hashes = self.bytes[self.pos..].iter().take_while(|&&c| c == b'#').count();
                if self.peek_at(hashes) == Some(b'"') {
                    self.pos += hashes;
                    self.scan_string(hashes)?;
                    Ok(TokenKind::StringLit)
                } else {
                    single(self, TokenKind::Pound)
                }
            }
            b'`' => {
                let (line, column) = (self.line, self.column_of(self.pos));
                self.bump();
                while let Some(c) = self.peek() {
                    if c == b'`' {
                        self.bump();
                        return Ok(TokenKind::Ident);
                    }
                    if c == b'\n' {
                        break;
                    }
                    self.bump_char();
                }
                Err(ParseError::Unexpected {
                    expected: "closing '`'".into(),
                    found: "end of line".into(),
                    line,
                    column,
                })
            }
            b'0'..=b'9' => {
                self.scan_number();
                Ok(TokenKind::Number)
            }
            _ => {
                let c = self.src[self.pos..].chars().next().unwrap_or('\0');
                if c == '_' || c == '$' || c.is_alphabetic() {
                    self.bump_char();
                    while let Some(c) = self.src[self.pos..].chars().next() {
                        if c == '_' || c == '$' || c.is_alphanumeric() {
                            self.bump_char();
                        } else {
                            break;
                        }
                    }
                    Ok(TokenKind::Ident)
                } else {
                    self.bump_char();
                    Ok(TokenKind::Op)
                }
            }
        }
    }

    fn scan_number(&mut self) {
        while let Some(c) = self.peek() {
            let continues = c.is_ascii_alphanumeric()
                || c == b'_'
                || (c == b'.' && self.peek_at(1).is_some_and(|d| d.is_ascii_digit()));
            if !continues {
                break;
            }
            self.bump();
        }
    }

    /// Scans a string literal starting at the opening quote. `hashes` is the
    /// number of `#` delimiters already consumed for raw strings.
    fn scan_string(&mut self, hashes: usize) -> Result<(), ParseError> {
        let (line, column) = (self.line, self.column_of(self.pos));
        let multiline = self.starts_with("\"\"\"");
        let quote = if multiline { "\"\"\"" } else { "\"" };
        self.pos += quote.len();
        let closing = format!("{quote}{}", "#".repeat(hashes));
        let escape = format!("\\{}", "#".repeat(hashes));

        loop {
            if self.pos >= self.bytes.len() {
                return Err(ParseError::UnterminatedString { line, column });
            }
            if self.starts_with(&closing) {
                self.pos += closing.len();
                return Ok(());
            }
            if !multiline && self.peek() == Some(b'\n') {
                return Err(ParseError::UnterminatedString { line, column });
            }
            if self.starts_with(&escape) {
                self.pos += escape.len();
                if self.peek() == Some(b'(') {
                    self.bump();
                    self.skip_interpolation(line, column)?;
                } else if self.pos < self.bytes.len() {
                    self.bump_char();
                }
                continue;
            }
            self.bump_char();
        }
    }

    /// Skips `\( ... )` contents, which may contain nested strings.
    fn skip_interpolation(&mut self, line: u32, column: u32) -> Result<(), ParseError> {
        let mut depth = 1usize;
        while depth > 0 {
            match self.peek() {
                None => return Err(ParseError::UnterminatedString { line, column }),
                Some(b'(') => {
                    depth += 1;
                    self.bump();
                }
                Some(b')') => {
                    depth -= 1;
                    self.bump();
                }
                Some(b'"') => self.scan_string(0)?,
                Some(_) => self.bump_char(),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<(TokenKind, String)> {
        tokenize(src)
            .unwrap()
            .into_iter()
            .map(|t| (t.kind, t.text.to_string()))
            .collect()
    }

    #[test]
    fn comments_are_trivia_but_mark_newlines() {
        let toks = tokenize("let a /* x\n y */ let b // tail\nvar").unwrap();
        let texts: Vec<_> = toks.iter().map(|t| t.text).collect();
        assert_eq!(texts, vec!["let", "a", "let", "b", "var"]);
        assert!(!toks[1].newline_before);
        assert!(toks[2].newline_before, "newline inside block comment counts");
        assert!(toks[4].newline_before);
    }

    #[test]
    fn nested_block_comments() {
        let toks = tokenize("/* a /* b */ c */ x").unwrap();
        assert_eq!(toks.len(), 1);
        assert_eq!(toks[0].text, "x");
    }

    #[test]
    fn strings_with_interpolation_and_raw_delimiters() {
        let src = r##"a = "x \("y)" + f(1)) z" b = #"raw "quoted" \(no)"# c = """
        multi " line
        """ d"##;
        let toks = kinds(src);
        let strings: Vec<_> = toks.iter().filter(|(k, _)| *k == TokenKind::StringLit).collect();
        assert_eq!(strings.len(), 3);
        assert_eq!(toks.last().unwrap().1, "d");
    }

    #[test]
    fn punctuation_and_arrows() {
        let toks = kinds("[Int: String]? -> Array<Array<Int>>!");
        let k: Vec<_> = toks.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            k,
            vec![
                TokenKind::LBracket,
                TokenKind::Ident,
                TokenKind::Colon,
                TokenKind::Ident,
                TokenKind::RBracket,
                TokenKind::Question,
                TokenKind::Arrow,
                TokenKind::Ident,
                TokenKind::Lt,
                TokenKind::Ident,
                TokenKind::Lt,
                TokenKind::Ident,
                TokenKind::Gt,
                TokenKind::Gt,
                TokenKind::Bang,
            ]
        );
    }

    #[test]
    fn backtick_identifiers_keep_their_ticks() {
        let toks = kinds("let `default`: Int");
        assert_eq!(toks[1], (TokenKind::Ident, "`default`".to_string()));
    }

    #[test]
    fn numbers_with_fractions_and_separators() {
        let toks = kinds("1_000.5 0xFF x.0");
        assert_eq!(toks[0].1, "1_000.5");
        assert_eq!(toks[1].1, "0xFF");
        assert_eq!(toks[3].0, TokenKind::Dot);
    }

    #[test]
    fn spans_track_lines_and_columns() {
        let toks = tokenize("class A {\n    let x: Int\n}").unwrap();
        let x = toks.iter().find(|t| t.text == "x").unwrap();
        assert_eq!((x.span.line, x.span.column), (2, 9));
        assert_eq!(&"class A {\n    let x: Int\n}"[x.span.start..x.span.end], "x");
    }

    #[test]
    fn unterminated_string_reports_position() {
        let err = tokenize("let a = \"oops\nlet b").unwrap_err();
        assert!(matches!(err, ParseError::UnterminatedString { line: 1, column: 9 }));
    }

    #[test]
    fn unterminated_comment_is_an_error() {
        assert!(matches!(
            tokenize("/* never closed").unwrap_err(),
            ParseError::UnterminatedComment { line: 1, column: 1 }
        ));
    }
}
