// Parser error path tests
// These systematically walk the unhappy paths of the structural parser

use mcfg_core::error::{McfgError, ParserError};
use mcfg_core::{parse_str, parse_str_with, ErrorKind, ParseOptions};

fn kind_of(source: &str) -> ErrorKind {
    match parse_str(source, "test.mcfg") {
        Ok(_) => panic!("Should fail to parse: {source:?}"),
        Err(err) => err.kind(),
    }
}

#[test]
fn test_parser_error_missing_sector_name() {
    assert_eq!(kind_of("sector"), ErrorKind::Syntax);
}

#[test]
fn test_parser_error_keyword_as_name() {
    assert_eq!(kind_of("sector end"), ErrorKind::Syntax);
    assert_eq!(kind_of("sector a\nsection u8\nend\nend"), ErrorKind::Syntax);
}

#[test]
fn test_parser_error_missing_literal() {
    assert_eq!(kind_of("sector a\nsection b\nu8 x\nend\nend"), ErrorKind::Syntax);
}

#[test]
fn test_parser_error_missing_literal_at_eof() {
    assert_eq!(kind_of("sector a\nsection b\nu8 x"), ErrorKind::Syntax);
}

#[test]
fn test_parser_error_empty_list() {
    assert_eq!(kind_of("sector a\nsection b\nlist u8 x\nend\nend"), ErrorKind::Syntax);
}

#[test]
fn test_parser_error_trailing_list_comma() {
    assert_eq!(kind_of("sector a\nsection b\nlist u8 x 1,\nend\nend"), ErrorKind::Syntax);
}

#[test]
fn test_parser_error_nested_list() {
    assert_eq!(kind_of("sector a\nsection b\nlist list x 1\nend\nend"), ErrorKind::Type);
}

#[test]
fn test_parser_error_mixed_list() {
    assert_eq!(kind_of("sector a\nsection b\nlist u8 x 1, 'two'\nend\nend"), ErrorKind::Type);
}

#[test]
fn test_parser_error_string_for_bool() {
    assert_eq!(kind_of("sector a\nsection b\nbool x 'true'\nend\nend"), ErrorKind::Type);
}

#[test]
fn test_parser_error_bool_for_integer() {
    assert_eq!(kind_of("sector a\nsection b\nu32 x false\nend\nend"), ErrorKind::Type);
}

#[test]
fn test_parser_error_out_of_range() {
    assert_eq!(kind_of("sector a\nsection b\nu8 x 256\nend\nend"), ErrorKind::Range);
    assert_eq!(kind_of("sector a\nsection b\nu8 x -1\nend\nend"), ErrorKind::Range);
    assert_eq!(kind_of("sector a\nsection b\ni16 x 32768\nend\nend"), ErrorKind::Range);
    assert_eq!(
        kind_of("sector a\nsection b\nu32 x 99999999999999999999999\nend\nend"),
        ErrorKind::Range
    );
}

#[test]
fn test_parser_error_nested_sector() {
    assert_eq!(kind_of("sector a\nsector b\nend\nend"), ErrorKind::Structure);
}

#[test]
fn test_parser_error_nested_section() {
    assert_eq!(kind_of("sector a\nsection b\nsection c\nend\nend\nend"), ErrorKind::Structure);
}

#[test]
fn test_parser_error_extra_end() {
    let result = parse_str("sector a\nend\nend", "test.mcfg");
    assert!(matches!(
        result,
        Err(McfgError::Parser(ParserError::EndInNowhere { .. }))
    ));
}

#[test]
fn test_parser_error_unterminated_section() {
    let result = parse_str("sector a\nsection b\nu8 x 1\nend", "test.mcfg");
    match result {
        Err(McfgError::Parser(ParserError::Unterminated { kind, name, .. })) => {
            assert_eq!(kind, "sector");
            assert_eq!(name, "a");
        }
        other => panic!("Expected an unterminated sector, got {other:?}"),
    }

    let result = parse_str("sector a\nsection b\nu8 x 1", "test.mcfg");
    match result {
        Err(McfgError::Parser(ParserError::Unterminated { kind, name, .. })) => {
            assert_eq!(kind, "section");
            assert_eq!(name, "b");
        }
        other => panic!("Expected an unterminated section, got {other:?}"),
    }
}

#[test]
fn test_unterminated_blocks_can_be_allowed() {
    let options = ParseOptions::new().allow_unterminated(true);
    let file = parse_str_with("sector a\nsection b\nu8 x 1", "test.mcfg", options).unwrap();
    assert_eq!(file.document.field("a", "b", "x").unwrap().as_u8(), Some(1));
}

#[test]
fn test_parser_error_unterminated_string() {
    assert_eq!(kind_of("sector a\nsection b\nstr x 'open\nend\nend"), ErrorKind::Syntax);
}

#[test]
fn test_parser_error_bare_literal() {
    assert_eq!(kind_of("sector a\nsection b\n42\nend\nend"), ErrorKind::Syntax);
    assert_eq!(kind_of("true"), ErrorKind::Syntax);
}

#[test]
fn test_first_error_wins() {
    let source = "sector a\nsection b\nu8 x 300\nu8 x 1\nend\nend";
    assert_eq!(kind_of(source), ErrorKind::Range);
}
