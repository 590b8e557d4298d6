use crate::ast::*;
use crate::error::{McfgError, ParserError};
use crate::lexer::{Lexer, Token, TokenType};
use crate::literal::{self, LiteralErrorKind};
use log::debug;
use miette::{NamedSource, SourceSpan};
use std::sync::Arc;

/// Knobs for [`Parser`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Accept input that ends while a sector or section is still open
    /// (default: false)
    pub allow_unterminated: bool,
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow_unterminated(mut self, allow: bool) -> Self {
        self.allow_unterminated = allow;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    InSector,
    InSection,
}

impl State {
    fn context(self) -> &'static str {
        match self {
            State::Idle => "at the top level",
            State::InSector => "directly inside a sector",
            State::InSection => "inside a section",
        }
    }
}

/// A sector or section that has been opened but not yet closed by `end`.
#[derive(Debug)]
struct OpenBlock {
    kind: &'static str,
    name: String,
    token: usize,
}

/// A state-machine parser turning an MCFG/2 token stream into a [`Document`].
///
/// The cursor never moves past the trailing `Unassigned` token, so
/// `current_token` always has something to return.
#[derive(Debug)]
pub struct Parser {
    source: Arc<NamedSource<String>>,
    tokens: Vec<Token>,
    position: usize,
    state: State,
    open: Vec<OpenBlock>,
    options: ParseOptions,
}

impl Parser {
    pub fn new(source_text: &str) -> Result<Self, McfgError> {
        Self::new_with_name(source_text, "source.mcfg".to_string())
    }

    pub fn new_with_name(source_text: &str, name: String) -> Result<Self, McfgError> {
        let source = Arc::new(NamedSource::new(name, source_text.to_string()));
        let tokens = Lexer::new(source_text).lex()?;

        Ok(Self {
            source,
            tokens,
            position: 0,
            state: State::Idle,
            open: Vec::new(),
            options: ParseOptions::default(),
        })
    }

    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    // === Main Parsing Methods ===

    /// Parses the whole token stream. On failure nothing of the partially
    /// built document is returned.
    pub fn parse_document(&mut self) -> Result<Document, McfgError> {
        self.position = 0;
        self.state = State::Idle;
        self.open.clear();

        let mut doc = Document::new();
        loop {
            let token = self.current_token().clone();
            match &token.ttype {
                TokenType::Unassigned => break,
                TokenType::Sector => self.parse_sector(&mut doc)?,
                TokenType::Section => self.parse_section(&mut doc)?,
                TokenType::End => self.parse_end()?,
                TokenType::Quote | TokenType::Comma => self.advance(),
                ttype if ttype.field_type().is_some() => self.parse_field(&mut doc)?,
                _ => {
                    return self.err_unexpected("`sector`, `section`, `end` or a field declaration")
                }
            }
        }

        if let Some(block) = self.open.last() {
            if !self.options.allow_unterminated {
                let token = self.token_at(block.token);
                return Err(ParserError::Unterminated {
                    src: self.src(),
                    span: span_of(token),
                    linespan: token.linespan,
                    kind: block.kind,
                    name: block.name.clone(),
                }
                .into());
            }
            debug!("{} `{}` left open at end of input", block.kind, block.name);
        }

        debug!(
            "parsed {} sectors and {} tokens from {}",
            doc.sectors().len(),
            self.tokens.len(),
            self.source.name()
        );
        Ok(doc)
    }

    /// `sector <name>`
    fn parse_sector(&mut self, doc: &mut Document) -> Result<(), McfgError> {
        let keyword = self.position;
        if self.state != State::Idle {
            return self.err_structure();
        }
        self.advance();
        let (name, name_token) = self.expect_name("a sector name")?;

        if doc.add_sector(name.clone()).is_err() {
            let token = self.token_at(name_token);
            return Err(ParserError::DuplicateSector {
                src: self.src(),
                span: span_of(token),
                linespan: token.linespan,
                name,
            }
            .into());
        }

        self.state = State::InSector;
        self.open.push(OpenBlock {
            kind: "sector",
            name,
            token: keyword,
        });
        Ok(())
    }

    /// `section <name>`
    fn parse_section(&mut self, doc: &mut Document) -> Result<(), McfgError> {
        let keyword = self.position;
        if self.state != State::InSector {
            return self.err_structure();
        }
        self.advance();
        let (name, name_token) = self.expect_name("a section name")?;

        let added = doc
            .last_sector_mut()
            .map(|sector| sector.add_section(name.clone()).is_ok());
        match added {
            Some(true) => {}
            Some(false) => {
                let token = self.token_at(name_token);
                return Err(ParserError::DuplicateSection {
                    src: self.src(),
                    span: span_of(token),
                    linespan: token.linespan,
                    name,
                }
                .into());
            }
            None => return self.err_structure_at(keyword),
        }

        self.state = State::InSection;
        self.open.push(OpenBlock {
            kind: "section",
            name,
            token: keyword,
        });
        Ok(())
    }

    /// `end` closes the innermost open block.
    fn parse_end(&mut self) -> Result<(), McfgError> {
        self.state = match self.state {
            State::Idle => {
                let token = self.current_token();
                return Err(ParserError::EndInNowhere {
                    src: self.src(),
                    span: span_of(token),
                    linespan: token.linespan,
                }
                .into());
            }
            State::InSector => State::Idle,
            State::InSection => State::InSector,
        };
        self.open.pop();
        self.advance();
        Ok(())
    }

    /// `<type> <name> <literal>` or `list <type> <name> <literal> {, <literal>}`
    fn parse_field(&mut self, doc: &mut Document) -> Result<(), McfgError> {
        if self.state != State::InSection {
            return self.err_structure();
        }
        let field_type = match self.current_token().ttype.field_type() {
            Some(field_type) => field_type,
            None => return self.err_unexpected("a type keyword"),
        };
        self.advance();

        let (name, name_token, value) = if field_type == FieldType::List {
            let element_type = match self.current_token().ttype.field_type() {
                Some(FieldType::List) | None => {
                    return self.err_invalid_type(self.position, "a list element type".to_string())
                }
                Some(element_type) => element_type,
            };
            self.advance();
            let (name, name_token) = self.expect_name("a field name")?;

            let mut list = List::new(element_type);
            loop {
                let item_token = self.position;
                let item = self.read_literal(element_type)?;
                if list.push(item).is_err() {
                    return self.err_invalid_type(item_token, format!("`{element_type}`"));
                }
                if !self.match_token(TokenType::Comma) {
                    break;
                }
            }
            (name, name_token, FieldValue::List(list))
        } else {
            let (name, name_token) = self.expect_name("a field name")?;
            let value = self.read_literal(field_type)?;
            (name, name_token, value)
        };

        let section = match doc.last_section_mut() {
            Some(section) => section,
            None => return self.err_structure(),
        };
        if section.add_field(Field::new(name.clone(), value)).is_err() {
            let token = self.token_at(name_token);
            return Err(ParserError::DuplicateField {
                src: self.src(),
                span: span_of(token),
                linespan: token.linespan,
                name,
            }
            .into());
        }
        Ok(())
    }

    fn read_literal(&mut self, field_type: FieldType) -> Result<FieldValue, McfgError> {
        let err = match literal::read_literal(field_type, &self.tokens[self.position..]) {
            Ok((value, consumed)) => {
                for _ in 0..consumed {
                    self.advance();
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        let index = self.position + err.offset;
        let token = self.token_at(index);
        let error = match err.kind {
            LiteralErrorKind::Syntax { expected } => ParserError::UnexpectedToken {
                src: self.src(),
                span: span_of(token),
                linespan: token.linespan,
                expected: expected.to_string(),
                found: token.ttype.to_string(),
            },
            LiteralErrorKind::TypeMismatch { expected } => ParserError::InvalidType {
                src: self.src(),
                span: span_of(token),
                linespan: token.linespan,
                expected: expected.to_string(),
                found: token.ttype.to_string(),
            },
            LiteralErrorKind::OutOfBounds { value, min, max } => ParserError::IntegerOutOfBounds {
                src: self.src(),
                span: span_of(token),
                linespan: token.linespan,
                value,
                field_type,
                min,
                max,
            },
        };
        Err(error.into())
    }

    // === Helper Methods ===

    fn current_token(&self) -> &Token {
        self.token_at(self.position)
    }

    fn token_at(&self, index: usize) -> &Token {
        // The stream always ends with the Unassigned sentinel.
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[index.min(last)]
    }

    fn advance(&mut self) {
        if self.position + 1 < self.tokens.len() {
            self.position += 1;
        }
    }

    fn match_token(&mut self, ttype: TokenType) -> bool {
        if self.check(ttype) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn check(&self, ttype: TokenType) -> bool {
        std::mem::discriminant(&self.current_token().ttype) == std::mem::discriminant(&ttype)
    }

    /// Consumes a name token, returning its text and token index.
    fn expect_name(&mut self, expected: &str) -> Result<(String, usize), McfgError> {
        let index = self.position;
        match &self.current_token().ttype {
            TokenType::Unknown(name) => {
                let name = name.clone();
                self.advance();
                Ok((name, index))
            }
            _ => self.err_unexpected(expected),
        }
    }

    fn src(&self) -> NamedSource<String> {
        (*self.source).clone()
    }

    fn err_unexpected<T>(&self, expected: &str) -> Result<T, McfgError> {
        let token = self.current_token();
        Err(ParserError::UnexpectedToken {
            src: self.src(),
            span: span_of(token),
            linespan: token.linespan,
            expected: expected.to_string(),
            found: token.ttype.to_string(),
        }
        .into())
    }

    fn err_structure<T>(&self) -> Result<T, McfgError> {
        self.err_structure_at(self.position)
    }

    fn err_structure_at<T>(&self, index: usize) -> Result<T, McfgError> {
        let token = self.token_at(index);
        Err(ParserError::Structure {
            src: self.src(),
            span: span_of(token),
            linespan: token.linespan,
            keyword: token.ttype.to_string(),
            context: self.state.context(),
        }
        .into())
    }

    fn err_invalid_type<T>(&self, index: usize, expected: String) -> Result<T, McfgError> {
        let token = self.token_at(index);
        Err(ParserError::InvalidType {
            src: self.src(),
            span: span_of(token),
            linespan: token.linespan,
            expected,
            found: token.ttype.to_string(),
        }
        .into())
    }
}

fn span_of(token: &Token) -> SourceSpan {
    (token.pos_start, token.pos_end - token.pos_start).into()
}
