use crate::ast::FieldType;
use crate::error::AllocError;
use crate::utils::unescape_quotes;
use log::trace;
use std::fmt;

/// Represents the different kinds of tokens that the lexer can produce.
/// Each token is a meaningful unit of the MCFG/2 syntax.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum TokenType {
    // == Special Tokens ==
    /// Terminates every token stream.
    Unassigned,

    // == Structure ==
    /// The `sector` keyword.
    Sector,
    /// The `section` keyword.
    Section,
    /// The `end` keyword.
    End,

    // == Punctuation ==
    /// A single quote opening or closing a string literal.
    Quote,
    /// Comma: `,` (separates list literals)
    Comma,

    /// Any word that is not a keyword or literal. Used for sector, section
    /// and field names.
    Unknown(String),

    // == Type Keywords ==
    Str,
    List,
    Bool,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,

    // == Literals ==
    /// A number literal, kept as its raw text until the declared type is known.
    Number(String),
    /// `true` or `false`.
    Boolean(bool),
    /// The unescaped content of a string literal.
    String(String),
}

impl TokenType {
    /// The field type declared by a type keyword, `None` for every other token.
    pub fn field_type(&self) -> Option<FieldType> {
        match self {
            TokenType::Str => Some(FieldType::String),
            TokenType::List => Some(FieldType::List),
            TokenType::Bool => Some(FieldType::Bool),
            TokenType::I8 => Some(FieldType::I8),
            TokenType::U8 => Some(FieldType::U8),
            TokenType::I16 => Some(FieldType::I16),
            TokenType::U16 => Some(FieldType::U16),
            TokenType::I32 => Some(FieldType::I32),
            TokenType::U32 => Some(FieldType::U32),
            _ => None,
        }
    }

    /// Whether this token is a literal of any kind (including the quote that
    /// opens a string literal).
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            TokenType::Number(_) | TokenType::Boolean(_) | TokenType::String(_) | TokenType::Quote
        )
    }

    fn keyword(word: &str) -> Option<TokenType> {
        let ttype = match word {
            "sector" => TokenType::Sector,
            "section" => TokenType::Section,
            "end" => TokenType::End,
            "str" => TokenType::Str,
            "list" => TokenType::List,
            "bool" => TokenType::Bool,
            "i8" => TokenType::I8,
            "u8" => TokenType::U8,
            "i16" => TokenType::I16,
            "u16" => TokenType::U16,
            "i32" => TokenType::I32,
            "u32" => TokenType::U32,
            _ => return None,
        };
        Some(ttype)
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenType::Unassigned => write!(f, "end of input"),
            TokenType::Sector => write!(f, "`sector`"),
            TokenType::Section => write!(f, "`section`"),
            TokenType::End => write!(f, "`end`"),
            TokenType::Quote => write!(f, "a quote"),
            TokenType::Comma => write!(f, "a comma"),
            TokenType::Unknown(word) => write!(f, "name `{word}`"),
            TokenType::Number(text) => write!(f, "number literal `{text}`"),
            TokenType::Boolean(value) => write!(f, "boolean literal `{value}`"),
            TokenType::String(_) => write!(f, "string literal"),
            keyword => match keyword.field_type() {
                Some(field_type) => write!(f, "type keyword `{field_type}`"),
                None => write!(f, "{keyword:?}"),
            },
        }
    }
}

/// The lines a token (or an error) pertains to.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub struct LineSpan {
    /// 1-based line on which the span starts.
    pub starting_line: usize,
    /// Number of lines covered, at least 1 for anything lexed.
    pub line_count: usize,
}

impl LineSpan {
    pub fn new(starting_line: usize, line_count: usize) -> Self {
        LineSpan {
            starting_line,
            line_count,
        }
    }

    pub fn single(line: usize) -> Self {
        LineSpan::new(line, 1)
    }

    /// The last line covered by this span.
    pub fn ending_line(&self) -> usize {
        self.starting_line + self.line_count.max(1) - 1
    }
}

impl fmt::Display for LineSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line_count > 1 {
            write!(f, "lines {}-{}", self.starting_line, self.ending_line())
        } else {
            write!(f, "line {}", self.starting_line)
        }
    }
}

/// A token with its type, line span and byte position in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub ttype: TokenType,
    pub linespan: LineSpan,
    pub pos_start: usize,
    pub pos_end: usize,
}

impl Token {
    pub fn new(ttype: TokenType, linespan: LineSpan, pos_start: usize, pos_end: usize) -> Token {
        Token {
            ttype,
            linespan,
            pos_start,
            pos_end,
        }
    }

    /// The textual value carried by names and literals.
    pub fn value(&self) -> Option<&str> {
        match &self.ttype {
            TokenType::Unknown(s) | TokenType::Number(s) | TokenType::String(s) => Some(s),
            TokenType::Boolean(true) => Some("true"),
            TokenType::Boolean(false) => Some("false"),
            _ => None,
        }
    }
}

pub struct Lexer<'a> {
    input: &'a str,
    position: usize,
    line: usize,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            position: 0,
            line: 1,
            tokens: Vec::new(),
        }
    }

    /// Tokenizes the whole input. The returned stream always ends with a
    /// [`TokenType::Unassigned`] token; the only possible failure is running
    /// out of memory.
    pub fn lex(mut self) -> Result<Vec<Token>, AllocError> {
        // Rough guess of one token per four bytes keeps regrowth rare.
        self.tokens.try_reserve(self.input.len() / 4 + 1)?;

        while let Some(c) = self.peek() {
            match c {
                ';' => self.skip_comment(),
                '\n' => {
                    self.advance();
                    self.line += 1;
                }
                ',' => {
                    let start = self.position;
                    self.advance();
                    self.push(TokenType::Comma, LineSpan::single(self.line), start)?;
                }
                '\'' => self.read_string()?,
                c if c.is_whitespace() => {
                    self.advance();
                }
                c if c.is_ascii_digit()
                    || (c == '-' && self.peek_nth(1).is_some_and(|c| c.is_ascii_digit())) =>
                {
                    self.read_number()?
                }
                _ => self.read_word()?,
            }
        }

        let end = self.input.len();
        self.push(TokenType::Unassigned, LineSpan::single(self.line), end)?;
        trace!("lexed {} tokens over {} lines", self.tokens.len(), self.line);
        Ok(self.tokens)
    }

    fn push(
        &mut self,
        ttype: TokenType,
        linespan: LineSpan,
        start: usize,
    ) -> Result<(), AllocError> {
        self.tokens.try_reserve(1)?;
        self.tokens.push(Token::new(ttype, linespan, start, self.position));
        Ok(())
    }

    fn rest(&self) -> &'a str {
        &self.input[self.position..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.position += c.len_utf8();
        Some(c)
    }

    fn skip_comment(&mut self) {
        match self.rest().find('\n') {
            Some(offset) => self.position += offset,
            None => self.position = self.input.len(),
        }
    }

    /// Emits `Quote String Quote`. Two consecutive quotes inside the literal
    /// stand for one quote and do not close it. An unclosed string runs to
    /// the end of input and gets no closing quote token.
    fn read_string(&mut self) -> Result<(), AllocError> {
        let open = self.position;
        self.advance();
        self.push(TokenType::Quote, LineSpan::single(self.line), open)?;

        let content_start = self.position;
        let bytes = self.input.as_bytes();
        let mut cursor = content_start;
        let mut closing = None;
        while let Some(offset) = self.input[cursor..].find('\'') {
            let quote = cursor + offset;
            if bytes.get(quote + 1) == Some(&b'\'') {
                cursor = quote + 2;
            } else {
                closing = Some(quote);
                break;
            }
        }

        let content_end = closing.unwrap_or(self.input.len());
        let raw = &self.input[content_start..content_end];
        let newlines = raw.matches('\n').count();
        let value = unescape_quotes(raw).into_owned();

        self.position = content_end;
        self.push(
            TokenType::String(value),
            LineSpan::new(self.line, newlines + 1),
            content_start,
        )?;
        self.line += newlines;

        if closing.is_some() {
            let start = self.position;
            self.advance();
            self.push(TokenType::Quote, LineSpan::single(self.line), start)?;
        }
        Ok(())
    }

    fn read_number(&mut self) -> Result<(), AllocError> {
        let start = self.position;
        if self.peek() == Some('-') {
            self.advance();
        }
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        let text = self.input[start..self.position].to_string();
        self.push(TokenType::Number(text), LineSpan::single(self.line), start)
    }

    /// Reads a run of non-whitespace, non-special characters and decides
    /// whether it is a keyword, a boolean literal or a plain name.
    fn read_word(&mut self) -> Result<(), AllocError> {
        let start = self.position;
        while let Some(c) = self.peek() {
            if c.is_whitespace() || is_special(c) {
                break;
            }
            self.advance();
        }
        let input = self.input;
        let word = &input[start..self.position];
        let next = self.peek();
        let at_boundary = next.map_or(true, char::is_whitespace);

        let ttype = match word {
            "true" | "false" if at_boundary || next == Some(',') => {
                TokenType::Boolean(word == "true")
            }
            _ => match TokenType::keyword(word) {
                Some(keyword) if at_boundary => keyword,
                _ => TokenType::Unknown(word.to_string()),
            },
        };
        self.push(ttype, LineSpan::single(self.line), start)
    }
}

fn is_special(c: char) -> bool {
    matches!(c, ',' | '\'' | ';')
}

/// Convenience wrapper around [`Lexer::lex`].
pub fn lex(input: &str) -> Result<Vec<Token>, AllocError> {
    Lexer::new(input).lex()
}

/// Whether `text` would lex back as a single name token, i.e. whether it can
/// be written unquoted as a sector, section or field name.
pub fn is_name(text: &str) -> bool {
    match lex(text) {
        Ok(tokens) => match tokens.as_slice() {
            [name, end] => {
                name.ttype == TokenType::Unknown(text.to_string())
                    && end.ttype == TokenType::Unassigned
            }
            _ => false,
        },
        Err(_) => false,
    }
}
