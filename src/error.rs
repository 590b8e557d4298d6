use crate::ast::FieldType;
use crate::lexer::LineSpan;
use miette::{Diagnostic, NamedSource, SourceSpan};
use std::collections::TryReserveError;
use std::sync::Arc;
use thiserror::Error;

/// Coarse classification of every error this crate can report.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ErrorKind {
    Syntax,
    Structure,
    Duplicate,
    Type,
    Range,
    Resolution,
    Resource,
}

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum McfgError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parser(#[from] ParserError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Serialize(#[from] SerializeError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    OutOfMemory(#[from] AllocError),

    #[error("OS error while accessing `{path}`: {source}")]
    #[diagnostic(code(mcfg::os_error))]
    Io {
        path: String,
        #[source]
        source: Arc<std::io::Error>,
    },

    #[error("`{character}` cannot be written to `{path}` byte for byte")]
    #[diagnostic(
        code(mcfg::unencodable),
        help("The file was not UTF-8 when read; only characters up to U+00FF fit.")
    )]
    Unencodable { path: String, character: char },
}

impl McfgError {
    pub(crate) fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        McfgError::Io {
            path: path.into(),
            source: Arc::new(source),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            McfgError::Parser(err) => err.kind(),
            McfgError::Format(err) => err.kind(),
            McfgError::Serialize(SerializeError::EmptyList { .. }) => ErrorKind::Structure,
            McfgError::Serialize(SerializeError::InvalidName { .. }) => ErrorKind::Syntax,
            McfgError::Serialize(SerializeError::OutOfMemory(_)) => ErrorKind::Resource,
            McfgError::Path(_) => ErrorKind::Resolution,
            McfgError::OutOfMemory(_) | McfgError::Io { .. } | McfgError::Unencodable { .. } => {
                ErrorKind::Resource
            }
        }
    }

    /// The lines of the source an error points at, when it came from parsing.
    pub fn linespan(&self) -> Option<LineSpan> {
        match self {
            McfgError::Parser(err) => Some(err.linespan()),
            _ => None,
        }
    }

    /// The raw OS error code behind an [`McfgError::Io`].
    pub fn os_error_code(&self) -> Option<i32> {
        match self {
            McfgError::Io { source, .. } => source.raw_os_error(),
            _ => None,
        }
    }
}

/// A buffer could not grow.
#[derive(Error, Debug, Diagnostic, Clone, Copy, PartialEq, Eq)]
#[error("a memory (re)allocation failed")]
#[diagnostic(code(mcfg::out_of_memory))]
pub struct AllocError;

impl From<TryReserveError> for AllocError {
    fn from(_: TryReserveError) -> Self {
        AllocError
    }
}

/// Errors raised by the document construction API.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum DocumentError {
    #[error("duplicate sector `{0}`")]
    #[diagnostic(code(document::duplicate_sector))]
    DuplicateSector(String),

    #[error("duplicate section `{0}`")]
    #[diagnostic(code(document::duplicate_section))]
    DuplicateSection(String),

    #[error("duplicate field `{0}`")]
    #[diagnostic(code(document::duplicate_field))]
    DuplicateField(String),

    #[error("duplicate dynamic field `{0}`")]
    #[diagnostic(code(document::duplicate_dynfield))]
    DuplicateDynfield(String),

    #[error("list of `{expected}` cannot hold a `{found}` item")]
    #[diagnostic(code(document::list_type_mismatch))]
    ListTypeMismatch {
        expected: FieldType,
        found: FieldType,
    },
}

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum ParserError {
    #[error("syntax error on {linespan}: expected {expected}, found {found}")]
    #[diagnostic(
        code(parser::syntax_error),
        help("The parser found a token it did not expect in this position.")
    )]
    UnexpectedToken {
        #[source_code]
        src: NamedSource<String>,
        #[label("expected {expected}")]
        span: SourceSpan,
        linespan: LineSpan,
        expected: String,
        found: String,
    },

    #[error("invalid structure on {linespan}: {keyword} is not allowed {context}")]
    #[diagnostic(
        code(parser::structure_error),
        help("Sectors live at the top level, sections inside sectors and fields inside sections.")
    )]
    Structure {
        #[source_code]
        src: NamedSource<String>,
        #[label("not allowed here")]
        span: SourceSpan,
        linespan: LineSpan,
        keyword: String,
        context: &'static str,
    },

    #[error("usage of `end` in nowhere on {linespan}")]
    #[diagnostic(
        code(parser::end_in_nowhere),
        help("There is no open sector or section for this `end` to close.")
    )]
    EndInNowhere {
        #[source_code]
        src: NamedSource<String>,
        #[label("nothing to close")]
        span: SourceSpan,
        linespan: LineSpan,
    },

    #[error("duplicate sector `{name}` on {linespan}")]
    #[diagnostic(code(parser::duplicate_sector))]
    DuplicateSector {
        #[source_code]
        src: NamedSource<String>,
        #[label("a sector with this name already exists")]
        span: SourceSpan,
        linespan: LineSpan,
        name: String,
    },

    #[error("duplicate section `{name}` on {linespan}")]
    #[diagnostic(code(parser::duplicate_section))]
    DuplicateSection {
        #[source_code]
        src: NamedSource<String>,
        #[label("this sector already has a section with this name")]
        span: SourceSpan,
        linespan: LineSpan,
        name: String,
    },

    #[error("duplicate field `{name}` on {linespan}")]
    #[diagnostic(code(parser::duplicate_field))]
    DuplicateField {
        #[source_code]
        src: NamedSource<String>,
        #[label("this section already has a field with this name")]
        span: SourceSpan,
        linespan: LineSpan,
        name: String,
    },

    #[error("invalid datatype on {linespan}: expected {expected}, found {found}")]
    #[diagnostic(code(parser::invalid_type))]
    InvalidType {
        #[source_code]
        src: NamedSource<String>,
        #[label("expected {expected}")]
        span: SourceSpan,
        linespan: LineSpan,
        expected: String,
        found: String,
    },

    #[error("integer value `{value}` is out of bounds for `{field_type}` on {linespan}")]
    #[diagnostic(
        code(parser::integer_out_of_bounds),
        help("`{field_type}` values must lie between {min} and {max}.")
    )]
    IntegerOutOfBounds {
        #[source_code]
        src: NamedSource<String>,
        #[label("out of bounds")]
        span: SourceSpan,
        linespan: LineSpan,
        value: String,
        field_type: FieldType,
        min: i64,
        max: i64,
    },

    #[error("{kind} `{name}` opened on {linespan} is never closed")]
    #[diagnostic(
        code(parser::unterminated),
        help("Close every sector and section with `end`.")
    )]
    Unterminated {
        #[source_code]
        src: NamedSource<String>,
        #[label("opened here")]
        span: SourceSpan,
        linespan: LineSpan,
        kind: &'static str,
        name: String,
    },
}

impl ParserError {
    pub fn linespan(&self) -> LineSpan {
        match self {
            ParserError::UnexpectedToken { linespan, .. }
            | ParserError::Structure { linespan, .. }
            | ParserError::EndInNowhere { linespan, .. }
            | ParserError::DuplicateSector { linespan, .. }
            | ParserError::DuplicateSection { linespan, .. }
            | ParserError::DuplicateField { linespan, .. }
            | ParserError::InvalidType { linespan, .. }
            | ParserError::IntegerOutOfBounds { linespan, .. }
            | ParserError::Unterminated { linespan, .. } => *linespan,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ParserError::UnexpectedToken { .. } => ErrorKind::Syntax,
            ParserError::Structure { .. }
            | ParserError::EndInNowhere { .. }
            | ParserError::Unterminated { .. } => ErrorKind::Structure,
            ParserError::DuplicateSector { .. }
            | ParserError::DuplicateSection { .. }
            | ParserError::DuplicateField { .. } => ErrorKind::Duplicate,
            ParserError::InvalidType { .. } => ErrorKind::Type,
            ParserError::IntegerOutOfBounds { .. } => ErrorKind::Range,
        }
    }
}

/// Errors from expanding `$(path)` embeds.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("field `{name}` is of type `{found}`, only `str` fields can be formatted")]
    #[diagnostic(code(format::invalid_type))]
    InvalidType { name: String, found: FieldType },

    #[error("circular embed detected: {cycle}")]
    #[diagnostic(
        code(format::circular_embed),
        help("A field ends up embedding itself. Break the chain of `$(...)` references.")
    )]
    CircularEmbed { cycle: String },

    #[error("embeds are nested deeper than {max_depth} levels")]
    #[diagnostic(code(format::recursion_limit))]
    RecursionLimit { max_depth: usize },

    #[error(transparent)]
    #[diagnostic(transparent)]
    OutOfMemory(#[from] AllocError),
}

impl FormatError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FormatError::InvalidType { .. } => ErrorKind::Type,
            FormatError::CircularEmbed { .. } | FormatError::RecursionLimit { .. } => {
                ErrorKind::Resolution
            }
            FormatError::OutOfMemory(_) => ErrorKind::Resource,
        }
    }
}

impl From<TryReserveError> for FormatError {
    fn from(err: TryReserveError) -> Self {
        FormatError::OutOfMemory(err.into())
    }
}

#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum SerializeError {
    #[error("list `{path}` is empty and cannot be written")]
    #[diagnostic(
        code(serialize::empty_list),
        help("A list field needs at least one item to be expressible in MCFG/2.")
    )]
    EmptyList { path: String },

    #[error("`{name}` cannot be written as a name")]
    #[diagnostic(
        code(serialize::invalid_name),
        help("A name is one word, not a keyword, free of quotes, commas and `;`.")
    )]
    InvalidName { name: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    OutOfMemory(#[from] AllocError),
}

impl From<TryReserveError> for SerializeError {
    fn from(err: TryReserveError) -> Self {
        SerializeError::OutOfMemory(err.into())
    }
}

#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("empty path")]
    #[diagnostic(code(path::empty))]
    Empty,

    #[error("path `{path}` has {count} components, at most 3 are allowed")]
    #[diagnostic(
        code(path::too_many_components),
        help("Paths address `sector/section/field`.")
    )]
    TooManyComponents { path: String, count: usize },

    #[error("no field at `{path}`")]
    #[diagnostic(code(path::not_found))]
    NotFound { path: String },
}
