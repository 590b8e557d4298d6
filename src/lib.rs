pub mod api;
pub mod ast;
pub mod embed;
pub mod error;
pub mod export;
pub mod lexer;
pub mod literal;
pub mod parser;
pub mod path;
pub mod serializer;
pub mod utils;

pub use api::{
    parse_bytes, parse_bytes_with, parse_file, parse_file_with, parse_str, parse_str_with,
    read_whole_file, write_whole_file, McfgFile,
};
pub use ast::{Document, Field, FieldType, FieldValue, List, Section, Sector};
pub use embed::{format_embeds, format_field_embeds, FormatOptions, UNRESOLVED_PLACEHOLDER};
pub use error::{ErrorKind, McfgError};
pub use parser::{ParseOptions, Parser};
pub use path::Path;
pub use serializer::{serialize, Indent, SerializeOptions};
pub use utils::SourceEncoding;
