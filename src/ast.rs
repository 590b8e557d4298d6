use crate::error::DocumentError;
use std::fmt;

/// The data type of a field, as declared by its type keyword.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum FieldType {
    String,
    List,
    Bool,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
}

impl FieldType {
    /// The keyword used to declare this type in source text.
    pub fn keyword(self) -> &'static str {
        match self {
            FieldType::String => "str",
            FieldType::List => "list",
            FieldType::Bool => "bool",
            FieldType::I8 => "i8",
            FieldType::U8 => "u8",
            FieldType::I16 => "i16",
            FieldType::U16 => "u16",
            FieldType::I32 => "i32",
            FieldType::U32 => "u32",
        }
    }

    /// Byte width of fixed-size types. `None` for strings and lists.
    pub fn width(self) -> Option<usize> {
        match self {
            FieldType::Bool | FieldType::I8 | FieldType::U8 => Some(1),
            FieldType::I16 | FieldType::U16 => Some(2),
            FieldType::I32 | FieldType::U32 => Some(4),
            FieldType::String | FieldType::List => None,
        }
    }

    /// Inclusive value range of the integer types.
    pub fn integer_range(self) -> Option<(i64, i64)> {
        let range = match self {
            FieldType::I8 => (i8::MIN.into(), i8::MAX.into()),
            FieldType::U8 => (u8::MIN.into(), u8::MAX.into()),
            FieldType::I16 => (i16::MIN.into(), i16::MAX.into()),
            FieldType::U16 => (u16::MIN.into(), u16::MAX.into()),
            FieldType::I32 => (i32::MIN.into(), i32::MAX.into()),
            FieldType::U32 => (u32::MIN.into(), u32::MAX.into()),
            _ => return None,
        };
        Some(range)
    }

    pub fn is_integer(self) -> bool {
        self.integer_range().is_some()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Typed field data, one variant per [`FieldType`].
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum FieldValue {
    String(String),
    List(List),
    Bool(bool),
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
}

impl FieldValue {
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldValue::String(_) => FieldType::String,
            FieldValue::List(_) => FieldType::List,
            FieldValue::Bool(_) => FieldType::Bool,
            FieldValue::I8(_) => FieldType::I8,
            FieldValue::U8(_) => FieldType::U8,
            FieldValue::I16(_) => FieldType::I16,
            FieldValue::U16(_) => FieldType::U16,
            FieldValue::I32(_) => FieldType::I32,
            FieldValue::U32(_) => FieldType::U32,
        }
    }

    /// Integer payload widened to `i64`, `None` for non-integer values.
    pub fn as_int(&self) -> Option<i64> {
        match *self {
            FieldValue::I8(n) => Some(n.into()),
            FieldValue::U8(n) => Some(n.into()),
            FieldValue::I16(n) => Some(n.into()),
            FieldValue::U16(n) => Some(n.into()),
            FieldValue::I32(n) => Some(n.into()),
            FieldValue::U32(n) => Some(n.into()),
            _ => None,
        }
    }

    /// Stored size in bytes: the type width for scalars, text length plus
    /// the terminator for strings, and the sum of all items for lists.
    pub fn size(&self) -> usize {
        match self {
            FieldValue::String(s) => s.len() + 1,
            FieldValue::List(list) => list.items().iter().map(Field::size).sum(),
            scalar => scalar.field_type().width().unwrap_or_default(),
        }
    }
}

/// Strings are written raw, numbers in decimal, booleans as `true`/`false`
/// and lists as their items joined by `", "`.
impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => f.write_str(s),
            FieldValue::List(list) => {
                for (i, item) in list.items().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item.value)?;
                }
                Ok(())
            }
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::I8(n) => write!(f, "{n}"),
            FieldValue::U8(n) => write!(f, "{n}"),
            FieldValue::I16(n) => write!(f, "{n}"),
            FieldValue::U16(n) => write!(f, "{n}"),
            FieldValue::I32(n) => write!(f, "{n}"),
            FieldValue::U32(n) => write!(f, "{n}"),
        }
    }
}

/// An ordered sequence of anonymous fields sharing one element type.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct List {
    element_type: FieldType,
    items: Vec<Field>,
}

impl List {
    pub fn new(element_type: FieldType) -> Self {
        List {
            element_type,
            items: Vec::new(),
        }
    }

    pub fn element_type(&self) -> FieldType {
        self.element_type
    }

    pub fn items(&self) -> &[Field] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Appends a value, naming it after its 1-based position.
    pub fn push(&mut self, value: FieldValue) -> Result<(), DocumentError> {
        let found = value.field_type();
        if found != self.element_type || found == FieldType::List {
            return Err(DocumentError::ListTypeMismatch {
                expected: self.element_type,
                found,
            });
        }
        let name = (self.items.len() + 1).to_string();
        self.items.push(Field::new(name, value));
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Field {
    pub name: String,
    pub value: FieldValue,
}

impl Field {
    pub fn new(name: impl Into<String>, value: FieldValue) -> Self {
        Field {
            name: name.into(),
            value,
        }
    }

    pub fn field_type(&self) -> FieldType {
        self.value.field_type()
    }

    pub fn size(&self) -> usize {
        self.value.size()
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&List> {
        match &self.value {
            FieldValue::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.value {
            FieldValue::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_i8(&self) -> Option<i8> {
        match self.value {
            FieldValue::I8(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_u8(&self) -> Option<u8> {
        match self.value {
            FieldValue::U8(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_i16(&self) -> Option<i16> {
        match self.value {
            FieldValue::I16(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_u16(&self) -> Option<u16> {
        match self.value {
            FieldValue::U16(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self.value {
            FieldValue::I32(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self.value {
            FieldValue::U32(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        self.value.as_int()
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Section {
    pub name: String,
    fields: Vec<Field>,
}

impl Section {
    pub fn new(name: impl Into<String>) -> Self {
        Section {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn add_field(&mut self, field: Field) -> Result<&mut Field, DocumentError> {
        if self.field(&field.name).is_some() {
            return Err(DocumentError::DuplicateField(field.name));
        }
        let ix = self.fields.len();
        self.fields.push(field);
        Ok(&mut self.fields[ix])
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Sector {
    pub name: String,
    sections: Vec<Section>,
}

impl Sector {
    pub fn new(name: impl Into<String>) -> Self {
        Sector {
            name: name.into(),
            sections: Vec::new(),
        }
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn section_mut(&mut self, name: &str) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| s.name == name)
    }

    pub fn add_section(&mut self, name: impl Into<String>) -> Result<&mut Section, DocumentError> {
        let name = name.into();
        if self.section(&name).is_some() {
            return Err(DocumentError::DuplicateSection(name));
        }
        let ix = self.sections.len();
        self.sections.push(Section::new(name));
        Ok(&mut self.sections[ix])
    }
}

/// A parsed MCFG/2 file: sectors in declaration order plus the separate
/// dynamic-field namespace.
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct Document {
    sectors: Vec<Sector>,
    dynfields: Vec<Field>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sectors(&self) -> &[Sector] {
        &self.sectors
    }

    pub fn sector(&self, name: &str) -> Option<&Sector> {
        self.sectors.iter().find(|s| s.name == name)
    }

    pub fn sector_mut(&mut self, name: &str) -> Option<&mut Sector> {
        self.sectors.iter_mut().find(|s| s.name == name)
    }

    pub fn add_sector(&mut self, name: impl Into<String>) -> Result<&mut Sector, DocumentError> {
        let name = name.into();
        if self.sector(&name).is_some() {
            return Err(DocumentError::DuplicateSector(name));
        }
        let ix = self.sectors.len();
        self.sectors.push(Sector::new(name));
        Ok(&mut self.sectors[ix])
    }

    pub fn dynfields(&self) -> &[Field] {
        &self.dynfields
    }

    pub fn dynfield(&self, name: &str) -> Option<&Field> {
        self.dynfields.iter().find(|f| f.name == name)
    }

    pub fn add_dynfield(&mut self, field: Field) -> Result<&mut Field, DocumentError> {
        if self.dynfield(&field.name).is_some() {
            return Err(DocumentError::DuplicateDynfield(field.name));
        }
        let ix = self.dynfields.len();
        self.dynfields.push(field);
        Ok(&mut self.dynfields[ix])
    }

    /// Looks up `sector/section/field` by name.
    pub fn field(&self, sector: &str, section: &str, field: &str) -> Option<&Field> {
        self.sector(sector)?.section(section)?.field(field)
    }

    pub(crate) fn last_sector_mut(&mut self) -> Option<&mut Sector> {
        self.sectors.last_mut()
    }

    pub(crate) fn last_section_mut(&mut self) -> Option<&mut Section> {
        self.sectors.last_mut()?.sections.last_mut()
    }
}
