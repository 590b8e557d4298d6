//! Addressing of fields as `sector/section/field`, `/sector/section/field`
//! or `%dynfield%`.

use crate::ast::{Document, Field};
use crate::error::PathError;
use std::fmt;
use std::str::FromStr;

const SEPARATOR: char = '/';

/// A parsed field address. Components a relative path leaves out are filled
/// from a relativity path before lookup, see [`Path::with_relativity`].
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct Path {
    pub absolute: bool,
    pub dynfield: bool,
    pub sector: Option<String>,
    pub section: Option<String>,
    pub field: Option<String>,
}

impl Path {
    /// Parses a path. Empty components (`a//b`, a trailing `/`) are skipped.
    pub fn parse(text: &str) -> Result<Path, PathError> {
        let absolute = text.starts_with(SEPARATOR);
        let components: Vec<&str> = text.split(SEPARATOR).filter(|c| !c.is_empty()).collect();

        let mut path = Path {
            absolute,
            ..Path::default()
        };
        if components.is_empty() {
            return Err(PathError::Empty);
        }
        if components.len() > 3 {
            return Err(PathError::TooManyComponents {
                path: text.to_string(),
                count: components.len(),
            });
        }

        if absolute {
            path.sector = components.first().map(|s| s.to_string());
            path.section = components.get(1).map(|s| s.to_string());
            path.field = components.get(2).map(|s| s.to_string());
            return Ok(path);
        }

        match components.as_slice() {
            [] => return Err(PathError::Empty),
            [field] => match field.strip_prefix('%').and_then(|f| f.strip_suffix('%')) {
                Some(name) => {
                    path.dynfield = true;
                    path.field = Some(name.to_string());
                }
                None => path.field = Some(field.to_string()),
            },
            [section, field] => {
                path.section = Some(section.to_string());
                path.field = Some(field.to_string());
            }
            [.., sector, section, field] => {
                path.sector = Some(sector.to_string());
                path.section = Some(section.to_string());
                path.field = Some(field.to_string());
            }
        }
        Ok(path)
    }

    /// Fills every component this path leaves out from `relativity`.
    ///
    /// Taking the sector from the relativity path makes the result absolute.
    /// A relative path that already names its sector stays relative and
    /// will not resolve.
    pub fn with_relativity(&self, relativity: &Path) -> Path {
        let mut path = self.clone();
        if path.dynfield {
            return path;
        }
        if path.sector.is_none() {
            if let Some(sector) = &relativity.sector {
                path.sector = Some(sector.clone());
                path.absolute = true;
            }
        }
        if path.section.is_none() {
            path.section = relativity.section.clone();
        }
        if path.field.is_none() {
            path.field = relativity.field.clone();
        }
        path
    }

    /// Looks the path up in `doc`. Only dynfield paths and fully specified
    /// absolute paths can resolve; anything missing yields `None`.
    pub fn resolve<'d>(&self, doc: &'d Document) -> Option<&'d Field> {
        if self.dynfield {
            return doc.dynfield(self.field.as_deref()?);
        }
        if !self.absolute {
            return None;
        }
        doc.field(
            self.sector.as_deref()?,
            self.section.as_deref()?,
            self.field.as_deref()?,
        )
    }

    /// Shorthand for `self.with_relativity(relativity).resolve(doc)`.
    pub fn resolve_relative<'d>(&self, doc: &'d Document, relativity: &Path) -> Option<&'d Field> {
        self.with_relativity(relativity).resolve(doc)
    }
}

impl FromStr for Path {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Path::parse(s)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dynfield {
            return write!(f, "%{}%", self.field.as_deref().unwrap_or_default());
        }
        if self.absolute {
            write!(f, "{SEPARATOR}")?;
        }
        let components = [&self.sector, &self.section, &self.field];
        let mut first = true;
        for component in components.into_iter().flatten() {
            if !first {
                write!(f, "{SEPARATOR}")?;
            }
            f.write_str(component)?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::FieldValue;

    fn doc() -> Document {
        let mut doc = Document::new();
        doc.add_sector("net")
            .unwrap()
            .add_section("server")
            .unwrap()
            .add_field(Field::new("port", FieldValue::U16(80)))
            .unwrap();
        doc.add_dynfield(Field::new("home", FieldValue::String("/home".into())))
            .unwrap();
        doc
    }

    fn some(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    #[test]
    fn test_parse_absolute() {
        let path = Path::parse("/net/server/port").unwrap();
        assert!(path.absolute);
        assert_eq!(path.sector, some("net"));
        assert_eq!(path.section, some("server"));
        assert_eq!(path.field, some("port"));

        let path = Path::parse("/net").unwrap();
        assert_eq!(path.sector, some("net"));
        assert_eq!(path.section, None);
        assert_eq!(path.field, None);
    }

    #[test]
    fn test_parse_relative() {
        let path = Path::parse("port").unwrap();
        assert!(!path.absolute);
        assert_eq!(path.field, some("port"));
        assert_eq!(path.section, None);

        let path = Path::parse("server/port").unwrap();
        assert_eq!(path.section, some("server"));
        assert_eq!(path.field, some("port"));

        let path = Path::parse("net/server/port").unwrap();
        assert!(!path.absolute);
        assert_eq!(path.sector, some("net"));
    }

    #[test]
    fn test_parse_dynfield() {
        let path = Path::parse("%home%").unwrap();
        assert!(path.dynfield);
        assert_eq!(path.field, some("home"));

        let path = Path::parse("%half").unwrap();
        assert!(!path.dynfield);
        assert_eq!(path.field, some("%half"));
    }

    #[test]
    fn test_empty_components_are_skipped() {
        let path = Path::parse("//net//server/port/").unwrap();
        assert!(path.absolute);
        assert_eq!(path.field, some("port"));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Path::parse(""), Err(PathError::Empty));
        assert_eq!(Path::parse("/"), Err(PathError::Empty));
        assert!(matches!(
            Path::parse("a/b/c/d"),
            Err(PathError::TooManyComponents { count: 4, .. })
        ));
    }

    #[test]
    fn test_display_round_trips() {
        for text in ["/net/server/port", "server/port", "port", "%home%", "/net"] {
            assert_eq!(Path::parse(text).unwrap().to_string(), text);
        }
    }

    #[test]
    fn test_resolve() {
        let doc = doc();
        let rel: Path = "/net/server".parse().unwrap();

        let port = Path::parse("/net/server/port").unwrap().resolve(&doc);
        assert_eq!(port.and_then(Field::as_u16), Some(80));

        let port = Path::parse("port").unwrap().resolve_relative(&doc, &rel);
        assert_eq!(port.and_then(Field::as_u16), Some(80));

        let port = Path::parse("server/port").unwrap().resolve_relative(&doc, &rel);
        assert!(port.is_some());

        let home = Path::parse("%home%").unwrap().resolve_relative(&doc, &rel);
        assert_eq!(home.and_then(Field::as_str), Some("/home"));
    }

    #[test]
    fn test_resolve_failures() {
        let doc = doc();
        let rel: Path = "/net/server".parse().unwrap();

        // Relative without a relativity sector never becomes absolute.
        assert!(Path::parse("port").unwrap().resolve(&doc).is_none());
        // A relative path naming its own sector stays relative.
        assert!(Path::parse("net/server/port")
            .unwrap()
            .resolve_relative(&doc, &rel)
            .is_none());
        assert!(Path::parse("/net/server").unwrap().resolve(&doc).is_none());
        assert!(Path::parse("/no/such/field").unwrap().resolve(&doc).is_none());
        assert!(Path::parse("%port%").unwrap().resolve(&doc).is_none());
    }

    #[test]
    fn test_absolute_path_takes_missing_parts_from_relativity() {
        let doc = doc();
        let rel = Path::parse("/other/server/port").unwrap();
        let path = Path::parse("/net").unwrap().with_relativity(&rel);
        assert_eq!(path.to_string(), "/net/server/port");
        assert!(path.resolve(&doc).is_some());
    }
}
