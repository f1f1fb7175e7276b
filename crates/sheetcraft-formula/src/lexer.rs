//! Formula tokenizer
//!
//! Turns formula text (without its leading `=`) into a flat token list. The
//! tokenizer never looks at a function registry: any word followed by `(` is an
//! identifier.

use crate::error::{SyntaxError, SyntaxErrorKind};
use sheetcraft_core::CellAddress;

/// Token types
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    Number(f64),
    String(String),
    Boolean(bool),

    // References
    CellRef(CellAddress),
    RangeRef(CellAddress, CellAddress),

    /// Function name or bare identifier, upper-cased
    Ident(String),

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Ampersand,
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    Colon,
    Comma,

    // Delimiters
    LeftParen,
    RightParen,
}

impl Token {
    /// Short description used in error messages
    pub fn describe(&self) -> String {
        match self {
            Token::Number(n) => format!("number {}", n),
            Token::String(s) => format!("text \"{}\"", s),
            Token::Boolean(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
            Token::CellRef(a) => format!("reference {}", a),
            Token::RangeRef(a, b) => format!("range {}:{}", a, b),
            Token::Ident(name) => format!("name {}", name),
            Token::Plus => "'+'".into(),
            Token::Minus => "'-'".into(),
            Token::Star => "'*'".into(),
            Token::Slash => "'/'".into(),
            Token::Caret => "'^'".into(),
            Token::Ampersand => "'&'".into(),
            Token::Equal => "'='".into(),
            Token::NotEqual => "'<>'".into(),
            Token::LessThan => "'<'".into(),
            Token::LessEqual => "'<='".into(),
            Token::GreaterThan => "'>'".into(),
            Token::GreaterEqual => "'>='".into(),
            Token::Colon => "':'".into(),
            Token::Comma => "','".into(),
            Token::LeftParen => "'('".into(),
            Token::RightParen => "')'".into(),
        }
    }
}

/// A token with the byte offset where it starts
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub position: usize,
}

/// Tokenize formula text whose leading `=` has already been stripped
///
/// # Example
/// ```rust
/// use sheetcraft_formula::lexer::{tokenize, Token};
///
/// let tokens = tokenize("SUM(A1:B2)").unwrap();
/// assert_eq!(tokens[0].token, Token::Ident("SUM".into()));
/// assert!(matches!(tokens[2].token, Token::RangeRef(..)));
/// ```
pub fn tokenize(input: &str) -> Result<Vec<SpannedToken>, SyntaxError> {
    Lexer::new(input).run()
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    tokens: Vec<SpannedToken>,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<SpannedToken>, SyntaxError> {
        loop {
            self.skip_whitespace();
            let Some(c) = self.peek_char() else {
                break;
            };
            let start = self.pos;
            let token = self.scan_token(c)?;
            self.tokens.push(SpannedToken {
                token,
                position: start,
            });
        }
        Ok(self.tokens)
    }

    fn scan_token(&mut self, c: char) -> Result<Token, SyntaxError> {
        let single = match c {
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '*' => Some(Token::Star),
            '/' => Some(Token::Slash),
            '^' => Some(Token::Caret),
            '&' => Some(Token::Ampersand),
            '=' => Some(Token::Equal),
            ':' => Some(Token::Colon),
            ',' => Some(Token::Comma),
            '(' => Some(Token::LeftParen),
            ')' => Some(Token::RightParen),
            _ => None,
        };
        if let Some(token) = single {
            self.advance();
            return Ok(token);
        }

        match c {
            '<' => {
                self.advance();
                Ok(match self.peek_char() {
                    Some('=') => {
                        self.advance();
                        Token::LessEqual
                    }
                    Some('>') => {
                        self.advance();
                        Token::NotEqual
                    }
                    _ => Token::LessThan,
                })
            }
            '>' => {
                self.advance();
                if self.peek_char() == Some('=') {
                    self.advance();
                    Ok(Token::GreaterEqual)
                } else {
                    Ok(Token::GreaterThan)
                }
            }
            '"' => self.scan_string(),
            c if c.is_ascii_digit() => Ok(self.scan_number()),
            '.' if self.peek_char_at(1).is_some_and(|c| c.is_ascii_digit()) => {
                Ok(self.scan_number())
            }
            c if c.is_ascii_alphabetic() || c == '_' || c == '$' => self.scan_word(),
            other => Err(SyntaxError::new(
                SyntaxErrorKind::UnknownCharacter,
                self.pos,
                format!("unknown character '{}'", other),
            )),
        }
    }

    fn scan_string(&mut self) -> Result<Token, SyntaxError> {
        let start = self.pos;
        self.advance(); // Skip opening quote

        let mut s = String::new();
        loop {
            match self.peek_char() {
                Some('"') => {
                    // A doubled quote is an escaped quote
                    if self.peek_char_at(1) == Some('"') {
                        s.push('"');
                        self.advance();
                        self.advance();
                    } else {
                        self.advance();
                        return Ok(Token::String(s));
                    }
                }
                Some(c) => {
                    s.push(c);
                    self.advance();
                }
                None => {
                    return Err(SyntaxError::new(
                        SyntaxErrorKind::UnterminatedString,
                        start,
                        "unterminated string literal",
                    ))
                }
            }
        }
    }

    fn scan_number(&mut self) -> Token {
        let start = self.pos;

        // Integer part
        while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }

        // Decimal part
        if self.peek_char() == Some('.') {
            self.advance();
            while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        // Exponent part, only when digits follow
        if self.peek_char().is_some_and(|c| c == 'e' || c == 'E') {
            let signed = self.peek_char_at(1).is_some_and(|c| c == '+' || c == '-');
            let digit_at = if signed { 2 } else { 1 };
            if self.peek_char_at(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                for _ in 0..digit_at {
                    self.advance();
                }
                while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                    self.advance();
                }
            }
        }

        let num_str = &self.input[start..self.pos];
        Token::Number(num_str.parse().unwrap_or(f64::INFINITY))
    }

    /// Identifier, boolean, cell reference or range reference
    fn scan_word(&mut self) -> Result<Token, SyntaxError> {
        let start = self.pos;
        let text = self.take_word();
        let followed_by_paren = self.next_non_whitespace() == Some('(');

        if !followed_by_paren {
            if text.eq_ignore_ascii_case("TRUE") {
                return Ok(Token::Boolean(true));
            }
            if text.eq_ignore_ascii_case("FALSE") {
                return Ok(Token::Boolean(false));
            }
            if let Some(start_addr) = parse_cell_reference(text) {
                return Ok(self.maybe_range(start_addr));
            }
        }

        if text.contains('$') {
            let offset = text.find('$').unwrap_or(0);
            return Err(SyntaxError::new(
                SyntaxErrorKind::UnknownCharacter,
                start + offset,
                format!("'$' is only allowed in cell references, found '{}'", text),
            ));
        }

        Ok(Token::Ident(text.to_uppercase()))
    }

    /// Join `A1:B2` into one range token when the second half is a reference too
    fn maybe_range(&mut self, start_addr: CellAddress) -> Token {
        if self.peek_char() != Some(':') {
            return Token::CellRef(start_addr);
        }

        let saved = self.pos;
        self.advance(); // ':'
        let word = self.take_word();
        if let Some(end_addr) = parse_cell_reference(word) {
            if self.next_non_whitespace() != Some('(') {
                return Token::RangeRef(start_addr, end_addr);
            }
        }

        self.pos = saved;
        Token::CellRef(start_addr)
    }

    fn take_word(&mut self) -> &'a str {
        let start = self.pos;
        while self
            .peek_char()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$' || c == '.')
        {
            self.advance();
        }
        let input = self.input;
        &input[start..self.pos]
    }

    // === Helper methods ===

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn next_non_whitespace(&self) -> Option<char> {
        self.input[self.pos..].chars().find(|c| !c.is_whitespace())
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().is_some_and(|c| c.is_whitespace()) {
            self.advance();
        }
    }
}

/// Parse `[$]letters[$]digits` into an address, or `None` if the word has another shape
fn parse_cell_reference(text: &str) -> Option<CellAddress> {
    let bytes = text.as_bytes();
    let mut i = 0;

    if bytes.get(i) == Some(&b'$') {
        i += 1;
    }
    let letter_start = i;
    while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
        i += 1;
    }
    if i == letter_start {
        return None;
    }
    if bytes.get(i) == Some(&b'$') {
        i += 1;
    }
    let digit_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i == digit_start || i != bytes.len() {
        return None;
    }

    // Shape matched; row 0 still fails and makes the word an identifier
    CellAddress::parse(text).ok()
}
