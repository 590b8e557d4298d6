//! Canonical MCFG/2 output.
//!
//! Parsing the output of [`serialize`] yields a document equal to the one
//! that was serialized, whatever the indentation options.

use crate::ast::{Document, Field, FieldValue, List};
use crate::error::SerializeError;
use crate::lexer::is_name;
use crate::utils::escape_quotes;
use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indent {
    Spaces,
    Tabs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerializeOptions {
    /// Indentation character (default: spaces)
    pub indent: Indent,
    /// Indentation characters per nesting level (default: 2)
    pub indent_width: usize,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            indent: Indent::Spaces,
            indent_width: 2,
        }
    }
}

impl SerializeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// One tab per nesting level.
    pub fn tabs() -> Self {
        Self {
            indent: Indent::Tabs,
            indent_width: 1,
        }
    }

    pub fn indent(mut self, indent: Indent) -> Self {
        self.indent = indent;
        self
    }

    pub fn indent_width(mut self, width: usize) -> Self {
        self.indent_width = width;
        self
    }
}

/// Line-oriented output buffer that tracks the current nesting depth.
struct McfgWriter {
    out: String,
    depth: usize,
    indent_unit: &'static str,
    indent_width: usize,
}

impl McfgWriter {
    fn with_options(options: &SerializeOptions) -> Self {
        let indent_unit = match options.indent {
            Indent::Spaces => " ",
            Indent::Tabs => "\t",
        };
        Self {
            out: String::new(),
            depth: 0,
            indent_unit,
            indent_width: options.indent_width,
        }
    }

    fn write_str(&mut self, s: &str) -> Result<(), SerializeError> {
        self.out.try_reserve(s.len())?;
        self.out.push_str(s);
        Ok(())
    }

    fn write_indent(&mut self) -> Result<(), SerializeError> {
        for _ in 0..self.depth * self.indent_width {
            self.write_str(self.indent_unit)?;
        }
        Ok(())
    }

    fn newline(&mut self) -> Result<(), SerializeError> {
        self.write_str("\n")
    }

    /// `<keyword> <name>` on its own line, then one level deeper.
    fn begin_block(&mut self, keyword: &str, name: &str) -> Result<(), SerializeError> {
        self.write_indent()?;
        self.write_str(keyword)?;
        self.write_str(" ")?;
        self.write_str(name)?;
        self.newline()?;
        self.depth += 1;
        Ok(())
    }

    fn end_block(&mut self) -> Result<(), SerializeError> {
        self.depth = self.depth.saturating_sub(1);
        self.write_indent()?;
        self.write_str("end")?;
        self.newline()
    }

    fn write_field(&mut self, path: &str, field: &Field) -> Result<(), SerializeError> {
        self.write_indent()?;
        if let FieldValue::List(list) = &field.value {
            if list.is_empty() {
                return Err(SerializeError::EmptyList {
                    path: path.to_string(),
                });
            }
            self.write_str("list ")?;
            self.write_str(list.element_type().keyword())?;
            self.write_str(" ")?;
            self.write_str(&field.name)?;
            self.write_str(" ")?;
            self.write_list(list)?;
        } else {
            self.write_str(field.field_type().keyword())?;
            self.write_str(" ")?;
            self.write_str(&field.name)?;
            self.write_str(" ")?;
            self.write_literal(&field.value)?;
        }
        self.newline()
    }

    fn write_list(&mut self, list: &List) -> Result<(), SerializeError> {
        for (ix, item) in list.items().iter().enumerate() {
            if ix > 0 {
                self.write_str(", ")?;
            }
            self.write_literal(&item.value)?;
        }
        Ok(())
    }

    fn write_literal(&mut self, value: &FieldValue) -> Result<(), SerializeError> {
        match value {
            FieldValue::String(s) => {
                self.write_str("'")?;
                self.write_str(&escape_quotes(s))?;
                self.write_str("'")
            }
            FieldValue::List(list) => self.write_list(list),
            scalar => self.write_str(&scalar.to_string()),
        }
    }

    fn finish(self) -> String {
        self.out
    }
}

fn check_name(name: &str) -> Result<(), SerializeError> {
    if is_name(name) {
        Ok(())
    } else {
        Err(SerializeError::InvalidName {
            name: name.to_string(),
        })
    }
}

/// Writes `doc` as MCFG/2 source text. Dynfields have no textual form and
/// are left out.
pub fn serialize(doc: &Document, options: &SerializeOptions) -> Result<String, SerializeError> {
    let mut writer = McfgWriter::with_options(options);

    for (ix, sector) in doc.sectors().iter().enumerate() {
        check_name(&sector.name)?;
        if ix > 0 {
            writer.newline()?;
        }
        writer.begin_block("sector", &sector.name)?;
        for section in sector.sections() {
            check_name(&section.name)?;
            writer.begin_block("section", &section.name)?;
            for field in section.fields() {
                check_name(&field.name)?;
                let path = format!("/{}/{}/{}", sector.name, section.name, field.name);
                writer.write_field(&path, field)?;
            }
            writer.end_block()?;
        }
        writer.end_block()?;
    }

    let out = writer.finish();
    debug!("serialized {} sectors into {} bytes", doc.sectors().len(), out.len());
    Ok(out)
}
