use crate::token::{keyword_kind, Token, TokenKind};
use mica_ast::Span;

/// The lexer/tokenizer for Mica.
pub struct Lexer<'a> {
    source: &'a str,
    chars: std::str::CharIndices<'a>,
    current_pos: usize,
    current_char: Option<char>,
    file_id: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer from source code.
    pub fn new(source: &'a str) -> Self {
        Self::with_file_id(source, 0)
    }

    /// Creates a new lexer with a specific file ID.
    pub fn with_file_id(source: &'a str, file_id: usize) -> Self {
        let mut chars = source.char_indices();
        let current_char = chars.next().map(|(_, c)| c);
        Self {
            source,
            chars,
            current_pos: 0,
            current_char,
            file_id,
        }
    }

    /// Tokenizes the entire source code and returns all tokens.
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }

    /// Gets the next token from the source.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();

        let start = self.current_pos;

        match self.current_char {
            None => Token::new(
                TokenKind::Eof,
                Span::new(start, start, self.file_id),
                String::new(),
            ),
            Some(ch) => match ch {
                '"' | '\'' => self.read_string_literal(ch),
                '0'..='9' => self.read_number(),
                'a'..='z' | 'A'..='Z' | '_' => self.read_identifier_or_keyword(),
                '+' => self.single(TokenKind::Plus, "+"),
                '-' => self.single(TokenKind::Minus, "-"),
                '*' => self.single(TokenKind::Star, "*"),
                '/' => self.single(TokenKind::Slash, "/"),
                '=' => self.one_or_two('=', TokenKind::Eq, TokenKind::EqEq, "=", "=="),
                '!' => self.one_or_two('=', TokenKind::Bang, TokenKind::BangEq, "!", "!="),
                '<' => self.one_or_two('=', TokenKind::Lt, TokenKind::LtEq, "<", "<="),
                '>' => self.one_or_two('=', TokenKind::Gt, TokenKind::GtEq, ">", ">="),
                '&' => self.pair('&', TokenKind::AmpAmp, "&&"),
                '|' => self.pair('|', TokenKind::PipePipe, "||"),
                '(' => self.single(TokenKind::LParen, "("),
                ')' => self.single(TokenKind::RParen, ")"),
                '{' => self.single(TokenKind::LBrace, "{"),
                '}' => self.single(TokenKind::RBrace, "}"),
                '[' => self.single(TokenKind::LBracket, "["),
                ']' => self.single(TokenKind::RBracket, "]"),
                ';' => self.single(TokenKind::Semicolon, ";"),
                ',' => self.single(TokenKind::Comma, ","),
                '.' => self.single(TokenKind::Dot, "."),
                _ => {
                    self.advance();
                    Token::new(
                        TokenKind::Error,
                        Span::new(start, self.current_pos, self.file_id),
                        format!("Unexpected character: {}", ch),
                    )
                }
            },
        }
    }

    // Helper methods

    fn advance(&mut self) {
        if let Some((pos, ch)) = self.chars.next() {
            self.current_pos = pos;
            self.current_char = Some(ch);
        } else {
            self.current_pos = self.source.len();
            self.current_char = None;
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.clone().next().map(|(_, c)| c)
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(start, self.current_pos, self.file_id)
    }

    fn single(&mut self, kind: TokenKind, text: &str) -> Token {
        let start = self.current_pos;
        self.advance();
        Token::new(kind, self.span_from(start), text.to_string())
    }

    /// Reads a one-character operator, or a two-character one if the next
    /// char matches `second`.
    fn one_or_two(
        &mut self,
        second: char,
        one: TokenKind,
        two: TokenKind,
        one_text: &str,
        two_text: &str,
    ) -> Token {
        let start = self.current_pos;
        self.advance();
        if self.current_char == Some(second) {
            self.advance();
            Token::new(two, self.span_from(start), two_text.to_string())
        } else {
            Token::new(one, self.span_from(start), one_text.to_string())
        }
    }

    /// Reads a two-character operator whose halves are identical (&&, ||).
    fn pair(&mut self, second: char, kind: TokenKind, text: &str) -> Token {
        let start = self.current_pos;
        self.advance();
        if self.current_char == Some(second) {
            self.advance();
            Token::new(kind, self.span_from(start), text.to_string())
        } else {
            Token::new(
                TokenKind::Error,
                self.span_from(start),
                format!("Unexpected character: {}", second),
            )
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.current_char {
                Some(ch) if ch.is_whitespace() => self.advance(),
                Some('/') if self.peek() == Some('/') => {
                    while let Some(ch) = self.current_char {
                        if ch == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn read_string_literal(&mut self, quote: char) -> Token {
        let start = self.current_pos;
        self.advance();

        let mut value = String::new();
        loop {
            match self.current_char {
                None | Some('\n') => {
                    return Token::new(
                        TokenKind::Error,
                        self.span_from(start),
                        "Unterminated string literal".to_string(),
                    );
                }
                Some(ch) if ch == quote => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    match self.current_char {
                        Some('n') => value.push('\n'),
                        Some('t') => value.push('\t'),
                        Some('\\') => value.push('\\'),
                        Some(ch) if ch == quote => value.push(ch),
                        Some(ch) => value.push(ch),
                        None => continue,
                    }
                    self.advance();
                }
                Some(ch) => {
                    value.push(ch);
                    self.advance();
                }
            }
        }

        Token::new(TokenKind::StringLiteral, self.span_from(start), value)
    }

    fn read_number(&mut self) -> Token {
        let start = self.current_pos;
        while let Some(ch) = self.current_char {
            if ch.is_ascii_digit() {
                self.advance();
            } else {
                break;
            }
        }
        // Fractional part; a lone trailing dot belongs to the next token.
        if self.current_char == Some('.') && self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            while let Some(ch) = self.current_char {
                if ch.is_ascii_digit() {
                    self.advance();
                } else {
                    break;
                }
            }
        }

        let text = &self.source[start..self.current_pos];
        Token::new(
            TokenKind::NumberLiteral,
            self.span_from(start),
            text.to_string(),
        )
    }

    fn read_identifier_or_keyword(&mut self) -> Token {
        let start = self.current_pos;
        while let Some(ch) = self.current_char {
            if ch.is_alphanumeric() || ch == '_' {
                self.advance();
            } else {
                break;
            }
        }

        let text = &self.source[start..self.current_pos];
        let kind = keyword_kind(text).unwrap_or(TokenKind::Identifier);
        Token::new(kind, self.span_from(start), text.to_string())
    }
}
