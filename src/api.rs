use crate::ast::Document;
use crate::embed::{format_field_embeds_with, FormatOptions};
use crate::error::{McfgError, PathError};
use crate::export::{to_value, Value};
use crate::parser::{ParseOptions, Parser};
use crate::path::Path;
use crate::serializer::{serialize, SerializeOptions};
use crate::utils::{decode_source, encode_source, SourceEncoding};
use log::debug;
use serde::{Serialize, Serializer};
use std::fs;

/// A successfully parsed MCFG/2 file together with the name it was
/// parsed under. Provides embedding, re-serialization and data export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct McfgFile {
    pub document: Document,
    pub file_name: String,
    /// How the source bytes were read; [`McfgFile::write_to`] writes them
    /// back the same way.
    pub encoding: SourceEncoding,
}

impl Serialize for McfgFile {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let value = self.to_value();
        value.serialize(serializer)
    }
}

impl McfgFile {
    /// The document's data as a generic, serializable `Value`.
    #[must_use]
    pub fn to_value(&self) -> Value {
        to_value(&self.document)
    }

    /// The document's data as a pretty-printed JSON string.
    ///
    /// # Errors
    /// Returns a `serde_json::Error` if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self)
    }

    /// The document's data as a YAML string.
    ///
    /// # Errors
    /// Returns a `serde_yaml::Error` if serialization fails.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&self)
    }

    /// Re-emits the document as canonical MCFG/2 source.
    pub fn serialize(&self, options: &SerializeOptions) -> Result<String, McfgError> {
        Ok(serialize(&self.document, options)?)
    }

    /// Expands the embeds of the string field at `path`. Relative paths,
    /// both `path` and those of the embeds, are resolved against
    /// `relativity`. With an empty `relativity`, `path` must be absolute and
    /// the embeds resolve relative to the field's own section.
    ///
    /// # Errors
    /// Fails if either path is malformed, no field lives at `path`, the
    /// field is not a string, or expansion runs into a cycle.
    pub fn format_field(&self, path: &str, relativity: &str) -> Result<String, McfgError> {
        self.format_field_with(path, relativity, &FormatOptions::default())
    }

    pub fn format_field_with(
        &self,
        path: &str,
        relativity: &str,
        options: &FormatOptions,
    ) -> Result<String, McfgError> {
        let explicit = !relativity.is_empty();
        let mut relativity = if explicit {
            Path::parse(relativity)?
        } else {
            Path::default()
        };
        let target = Path::parse(path)?.with_relativity(&relativity);
        let field = target
            .resolve(&self.document)
            .ok_or_else(|| PathError::NotFound {
                path: target.to_string(),
            })?;
        if !explicit {
            relativity = Path {
                field: None,
                ..target
            };
        }
        Ok(format_field_embeds_with(
            field,
            &self.document,
            &relativity,
            options,
        )?)
    }

    /// Serializes the document and writes it to `path` in the encoding it
    /// was read with.
    pub fn write_to(
        &self,
        path: impl AsRef<std::path::Path>,
        options: &SerializeOptions,
    ) -> Result<(), McfgError> {
        let path = path.as_ref();
        let text = self.serialize(options)?;
        let bytes = match encode_source(&text, self.encoding) {
            Ok(bytes) => bytes,
            Err(character) => {
                return Err(McfgError::Unencodable {
                    path: path.display().to_string(),
                    character,
                })
            }
        };
        write_whole_file(path, &bytes)
    }
}

/// Parses MCFG/2 source held in memory.
///
/// # Arguments
///
/// * `source` - The MCFG/2 source code as a string.
/// * `file_name` - The name used for error reporting.
///
/// # Errors
///
/// Returns a `McfgError` if the source cannot be parsed.
pub fn parse_str(source: &str, file_name: &str) -> Result<McfgFile, McfgError> {
    parse_str_with(source, file_name, ParseOptions::default())
}

pub fn parse_str_with(
    source: &str,
    file_name: &str,
    options: ParseOptions,
) -> Result<McfgFile, McfgError> {
    let mut parser = Parser::new_with_name(source, file_name.to_string())?.with_options(options);
    let document = parser.parse_document()?;
    Ok(McfgFile {
        document,
        file_name: file_name.to_string(),
        encoding: SourceEncoding::Utf8,
    })
}

/// Parses raw file contents. Input that is not valid UTF-8 is read byte
/// for byte, so string contents keep their exact bytes.
pub fn parse_bytes(bytes: &[u8], file_name: &str) -> Result<McfgFile, McfgError> {
    parse_bytes_with(bytes, file_name, ParseOptions::default())
}

pub fn parse_bytes_with(
    bytes: &[u8],
    file_name: &str,
    options: ParseOptions,
) -> Result<McfgFile, McfgError> {
    let (source, encoding) = decode_source(bytes);
    if encoding == SourceEncoding::Latin1 {
        debug!("{file_name} is not valid UTF-8, reading it byte for byte");
    }
    let mut file = parse_str_with(&source, file_name, options)?;
    file.encoding = encoding;
    Ok(file)
}

/// Reads and parses the file at `path`.
pub fn parse_file(path: impl AsRef<std::path::Path>) -> Result<McfgFile, McfgError> {
    parse_file_with(path, ParseOptions::default())
}

pub fn parse_file_with(
    path: impl AsRef<std::path::Path>,
    options: ParseOptions,
) -> Result<McfgFile, McfgError> {
    let path = path.as_ref();
    let bytes = read_whole_file(path)?;
    parse_bytes_with(&bytes, &path.display().to_string(), options)
}

/// Reads the whole file at `path` into memory.
pub fn read_whole_file(path: impl AsRef<std::path::Path>) -> Result<Vec<u8>, McfgError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|err| McfgError::io(path.display().to_string(), err))?;
    debug!("read {} bytes from {}", bytes.len(), path.display());
    Ok(bytes)
}

/// Writes `bytes` to `path`, replacing any existing file.
pub fn write_whole_file(path: impl AsRef<std::path::Path>, bytes: &[u8]) -> Result<(), McfgError> {
    let path = path.as_ref();
    fs::write(path, bytes).map_err(|err| McfgError::io(path.display().to_string(), err))?;
    debug!("wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}
