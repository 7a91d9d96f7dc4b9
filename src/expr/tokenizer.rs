//! Formula Tokenizer
//!
//! Splits formula text into tokens, tracking the byte offset of each one
//! so parse errors can point at the offending input.

use super::error::ParseError;

// == Token ==
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    /// String literal with `""` escapes already collapsed
    Text(String),
    Identifier(String),
    LeftParen,
    RightParen,
    Comma,
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Ampersand,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

impl Token {
    /// Short human readable form used in error messages.
    pub fn describe(&self) -> String {
        match self {
            Token::Number(n) => format!("number {}", n),
            Token::Text(s) => format!("string \"{}\"", s),
            Token::Identifier(name) => format!("identifier '{}'", name),
            Token::LeftParen => "'('".to_string(),
            Token::RightParen => "')'".to_string(),
            Token::Comma => "','".to_string(),
            Token::Plus => "'+'".to_string(),
            Token::Minus => "'-'".to_string(),
            Token::Star => "'*'".to_string(),
            Token::Slash => "'/'".to_string(),
            Token::Caret => "'^'".to_string(),
            Token::Ampersand => "'&'".to_string(),
            Token::Equal => "'='".to_string(),
            Token::NotEqual => "'<>'".to_string(),
            Token::Less => "'<'".to_string(),
            Token::LessEqual => "'<='".to_string(),
            Token::Greater => "'>'".to_string(),
            Token::GreaterEqual => "'>='".to_string(),
        }
    }
}

/// A token together with the byte offset where it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub position: usize,
}

// == Tokenizer ==
pub struct Tokenizer<'input> {
    input: &'input str,
    pos: usize,
}

impl<'input> Tokenizer<'input> {
    pub fn new(input: &'input str) -> Self {
        Self { input, pos: 0 }
    }

    /// Byte offset one past the last character, used for "unexpected end" errors.
    pub fn end_position(&self) -> usize {
        self.input.len()
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.input[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            if !c.is_whitespace() {
                break;
            }
            self.bump();
        }
    }

    // == Next Token ==
    /// Returns the next token, or `None` at end of input.
    pub fn next_token(&mut self) -> Result<Option<Spanned>, ParseError> {
        self.skip_whitespace();
        let start = self.pos;
        let c = match self.bump() {
            Some(c) => c,
            None => return Ok(None),
        };

        let token = match c {
            '(' => Token::LeftParen,
            ')' => Token::RightParen,
            ',' => Token::Comma,
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '^' => Token::Caret,
            '&' => Token::Ampersand,
            '=' => Token::Equal,
            '<' => match self.peek_char() {
                Some('=') => {
                    self.bump();
                    Token::LessEqual
                }
                Some('>') => {
                    self.bump();
                    Token::NotEqual
                }
                _ => Token::Less,
            },
            '>' => {
                if self.peek_char() == Some('=') {
                    self.bump();
                    Token::GreaterEqual
                } else {
                    Token::Greater
                }
            }
            '"' => self.read_string(start)?,
            c if c.is_ascii_digit() => self.read_number(start)?,
            '.' if self.peek_char().is_some_and(|d| d.is_ascii_digit()) => {
                self.read_number(start)?
            }
            c if c.is_alphabetic() || c == '_' => self.read_identifier(start),
            other => {
                return Err(ParseError::new(
                    format!("unexpected character '{}'", other),
                    start,
                ))
            }
        };

        Ok(Some(Spanned {
            token,
            position: start,
        }))
    }

    fn read_string(&mut self, start: usize) -> Result<Token, ParseError> {
        let mut text = String::new();
        loop {
            match self.bump() {
                Some('"') => {
                    // "" inside a literal is an escaped quote
                    if self.peek_char() == Some('"') {
                        self.bump();
                        text.push('"');
                    } else {
                        return Ok(Token::Text(text));
                    }
                }
                Some(c) => text.push(c),
                None => return Err(ParseError::new("unterminated string literal", start)),
            }
        }
    }

    fn read_number(&mut self, start: usize) -> Result<Token, ParseError> {
        while self.peek_char().is_some_and(|c| c.is_ascii_digit() || c == '.') {
            self.bump();
        }
        if matches!(self.peek_char(), Some('e' | 'E')) {
            let exponent_follows = match self.peek_second() {
                Some(c) if c.is_ascii_digit() => true,
                Some('+' | '-') => true,
                _ => false,
            };
            if exponent_follows {
                self.bump();
                if matches!(self.peek_char(), Some('+' | '-')) {
                    self.bump();
                }
                while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                    self.bump();
                }
            }
        }

        let literal = &self.input[start..self.pos];
        literal
            .parse::<f64>()
            .map(Token::Number)
            .map_err(|_| ParseError::new(format!("invalid number '{}'", literal), start))
    }

    fn read_identifier(&mut self, start: usize) -> Token {
        while self
            .peek_char()
            .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '.')
        {
            self.bump();
        }
        Token::Identifier(self.input[start..self.pos].to_string())
    }
}
