//! Conversion of literal tokens into typed, range-checked field values.

use crate::ast::{FieldType, FieldValue};
use crate::lexer::{Token, TokenType};

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum LiteralErrorKind {
    /// The tokens do not form a literal at all.
    Syntax { expected: &'static str },
    /// A literal was found, but of the wrong kind for the declared type.
    TypeMismatch { expected: &'static str },
    /// An integer literal outside the declared type's range.
    OutOfBounds { value: String, min: i64, max: i64 },
}

/// A failed literal conversion. `offset` is the index of the offending
/// token relative to the first token handed to [`read_literal`].
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct LiteralError {
    pub offset: usize,
    pub kind: LiteralErrorKind,
}

impl LiteralError {
    fn at(offset: usize, kind: LiteralErrorKind) -> Self {
        LiteralError { offset, kind }
    }
}

/// Reads one literal of `field_type` from the front of `tokens`.
///
/// Returns the value and the number of tokens consumed: three for a string
/// (`Quote String Quote`), one for everything else.
pub fn read_literal(
    field_type: FieldType,
    tokens: &[Token],
) -> Result<(FieldValue, usize), LiteralError> {
    let ttype = |offset: usize| tokens.get(offset).map(|t| &t.ttype);

    match field_type {
        FieldType::String => {
            if ttype(0) != Some(&TokenType::Quote) {
                return Err(LiteralError::at(
                    0,
                    LiteralErrorKind::Syntax {
                        expected: "a quoted string literal",
                    },
                ));
            }
            let value = match ttype(1) {
                Some(TokenType::String(s)) => s.clone(),
                _ => {
                    return Err(LiteralError::at(
                        1,
                        LiteralErrorKind::Syntax {
                            expected: "a string literal",
                        },
                    ))
                }
            };
            if ttype(2) != Some(&TokenType::Quote) {
                return Err(LiteralError::at(
                    2,
                    LiteralErrorKind::Syntax {
                        expected: "a closing quote",
                    },
                ));
            }
            Ok((FieldValue::String(value), 3))
        }
        FieldType::Bool => match ttype(0) {
            Some(TokenType::Boolean(b)) => Ok((FieldValue::Bool(*b), 1)),
            other => Err(mismatch_or_syntax(other, "a boolean literal")),
        },
        FieldType::List => Err(LiteralError::at(
            0,
            LiteralErrorKind::TypeMismatch {
                expected: "a scalar element type",
            },
        )),
        integer => match ttype(0) {
            Some(TokenType::Number(text)) => parse_integer(integer, text)
                .map(|value| (value, 1))
                .map_err(|kind| LiteralError::at(0, kind)),
            other => Err(mismatch_or_syntax(other, "a number literal")),
        },
    }
}

fn mismatch_or_syntax(found: Option<&TokenType>, expected: &'static str) -> LiteralError {
    match found {
        Some(ttype) if ttype.is_literal() => {
            LiteralError::at(0, LiteralErrorKind::TypeMismatch { expected })
        }
        _ => LiteralError::at(0, LiteralErrorKind::Syntax { expected }),
    }
}

/// Parses base-10 `text` as a value of the integer type `field_type`.
/// Values outside the type's range are rejected, never clamped or wrapped.
pub fn parse_integer(field_type: FieldType, text: &str) -> Result<FieldValue, LiteralErrorKind> {
    let Some((min, max)) = field_type.integer_range() else {
        return Err(LiteralErrorKind::TypeMismatch {
            expected: "an integer type",
        });
    };
    let out_of_bounds = || LiteralErrorKind::OutOfBounds {
        value: text.to_string(),
        min,
        max,
    };

    // Every lexed number literal is `-?[0-9]+`, so a failed i64 parse can
    // only mean the value is too large.
    let value: i64 = text.parse().map_err(|_| out_of_bounds())?;
    if value < min || value > max {
        return Err(out_of_bounds());
    }

    // The range check above makes every narrowing below lossless.
    let value = match field_type {
        FieldType::I8 => FieldValue::I8(value as i8),
        FieldType::U8 => FieldValue::U8(value as u8),
        FieldType::I16 => FieldValue::I16(value as i16),
        FieldType::U16 => FieldValue::U16(value as u16),
        FieldType::I32 => FieldValue::I32(value as i32),
        _ => FieldValue::U32(value as u32),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    fn read(field_type: FieldType, source: &str) -> Result<(FieldValue, usize), LiteralError> {
        let tokens = lex(source).unwrap();
        read_literal(field_type, &tokens)
    }

    #[test]
    fn test_integer_bounds() {
        assert_eq!(parse_integer(FieldType::U8, "255"), Ok(FieldValue::U8(255)));
        assert_eq!(parse_integer(FieldType::I8, "-128"), Ok(FieldValue::I8(-128)));
        assert_eq!(
            parse_integer(FieldType::U8, "256"),
            Err(LiteralErrorKind::OutOfBounds {
                value: "256".into(),
                min: 0,
                max: 255
            })
        );
        assert!(parse_integer(FieldType::I8, "-129").is_err());
        assert!(parse_integer(FieldType::U16, "-1").is_err());
        assert_eq!(
            parse_integer(FieldType::U32, "4294967295"),
            Ok(FieldValue::U32(u32::MAX))
        );
        assert_eq!(
            parse_integer(FieldType::I32, "-2147483648"),
            Ok(FieldValue::I32(i32::MIN))
        );
    }

    #[test]
    fn test_huge_numbers_are_out_of_bounds() {
        assert!(matches!(
            parse_integer(FieldType::U32, "99999999999999999999999"),
            Err(LiteralErrorKind::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_string_literal() {
        assert_eq!(
            read(FieldType::String, "'a b'"),
            Ok((FieldValue::String("a b".into()), 3))
        );
    }

    #[test]
    fn test_unterminated_string_literal() {
        let err = read(FieldType::String, "'open").unwrap_err();
        assert_eq!(err.offset, 2);
        assert!(matches!(err.kind, LiteralErrorKind::Syntax { .. }));
    }

    #[test]
    fn test_bool_literal() {
        assert_eq!(read(FieldType::Bool, "false"), Ok((FieldValue::Bool(false), 1)));
    }

    #[test]
    fn test_type_mismatch() {
        let err = read(FieldType::Bool, "1").unwrap_err();
        assert!(matches!(err.kind, LiteralErrorKind::TypeMismatch { .. }));

        let err = read(FieldType::U8, "'1'").unwrap_err();
        assert!(matches!(err.kind, LiteralErrorKind::TypeMismatch { .. }));
    }

    #[test]
    fn test_missing_literal_is_syntax_error() {
        let err = read(FieldType::U8, "end").unwrap_err();
        assert!(matches!(err.kind, LiteralErrorKind::Syntax { .. }));

        let err = read(FieldType::String, "name").unwrap_err();
        assert_eq!(err.offset, 0);
        assert!(matches!(err.kind, LiteralErrorKind::Syntax { .. }));
    }
}
