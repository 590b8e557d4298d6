//! Expansion of `$(path)` embeds inside string fields.
//!
//! A backslash copies the following character literally, so `\$(x)` comes
//! out as `$(x)`. Embeds whose path does not resolve are replaced by
//! [`UNRESOLVED_PLACEHOLDER`] instead of failing the whole call.

use crate::ast::{Document, Field, FieldValue};
use crate::error::FormatError;
use crate::path::Path;
use log::{debug, warn};
use std::borrow::Cow;
use std::str::CharIndices;

/// Inserted in place of an embed whose path does not resolve.
pub const UNRESOLVED_PLACEHOLDER: &str = "(nullptr)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatOptions {
    /// How many string or list fields may be expanded inside one another
    /// (default: 32)
    pub max_depth: usize,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self { max_depth: 32 }
    }
}

impl FormatOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum EmbedKind<'s> {
    /// `$(path)`, carrying the path text with escapes already removed.
    Field(Cow<'s, str>),
    /// A backslash, dropped from the output.
    Escape,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Embed<'s> {
    start: usize,
    /// One past the last byte of the embed.
    end: usize,
    kind: EmbedKind<'s>,
}

/// Reads the body of an embed whose `(` sits right before `chars`. Returns
/// the path text and the byte index one past the closing `)`, or `None`
/// when no unescaped `)` follows.
fn read_embed_body<'s>(
    input: &'s str,
    mut chars: CharIndices<'s>,
) -> Option<(Cow<'s, str>, usize)> {
    let body = chars.offset();
    let mut owned: Option<String> = None;

    while let Some((ix, c)) = chars.next() {
        match c {
            ')' => {
                let text = match owned {
                    Some(text) => Cow::Owned(text),
                    None => Cow::Borrowed(&input[body..ix]),
                };
                return Some((text, ix + 1));
            }
            '\\' => {
                let text = owned.get_or_insert_with(|| input[body..ix].to_string());
                if let Some((_, escaped)) = chars.next() {
                    text.push(escaped);
                }
            }
            c => {
                if let Some(text) = owned.as_mut() {
                    text.push(c);
                }
            }
        }
    }
    None
}

fn extract_embeds(input: &str) -> Result<Vec<Embed<'_>>, FormatError> {
    let mut embeds = Vec::new();
    let mut chars = input.char_indices();

    while let Some((ix, c)) = chars.next() {
        let embed = match c {
            '\\' => {
                chars.next();
                Embed {
                    start: ix,
                    end: ix + 1,
                    kind: EmbedKind::Escape,
                }
            }
            '$' if input[ix + 1..].starts_with('(') => {
                let mut body = chars.clone();
                body.next();
                let Some((text, end)) = read_embed_body(input, body) else {
                    continue;
                };
                while chars.offset() < end {
                    chars.next();
                }
                Embed {
                    start: ix,
                    end,
                    kind: EmbedKind::Field(text),
                }
            }
            _ => continue,
        };
        embeds.try_reserve(1)?;
        embeds.push(embed);
    }
    Ok(embeds)
}

fn push_str(out: &mut String, s: &str) -> Result<(), FormatError> {
    out.try_reserve(s.len())?;
    out.push_str(s);
    Ok(())
}

struct Formatter<'a> {
    doc: &'a Document,
    relativity: &'a Path,
    options: &'a FormatOptions,
    // Fields currently under expansion, to detect embed cycles
    resolving_stack: Vec<String>,
}

impl<'a> Formatter<'a> {
    fn format(&mut self, input: &str) -> Result<String, FormatError> {
        let embeds = extract_embeds(input)?;
        let mut out = String::new();
        out.try_reserve(input.len())?;
        let mut copied = 0;

        for (ix, embed) in embeds.iter().enumerate() {
            let segment_start = out.len();
            push_str(&mut out, &input[copied..embed.start])?;
            copied = embed.end;

            let EmbedKind::Field(text) = &embed.kind else {
                continue;
            };
            let resolved = Path::parse(text).ok().and_then(|path| {
                let path = path.with_relativity(self.relativity);
                path.resolve(self.doc).map(|field| (path, field))
            });
            let Some((path, field)) = resolved else {
                warn!("embed `$({text})` does not resolve, inserting {UNRESOLVED_PLACEHOLDER}");
                push_str(&mut out, UNRESOLVED_PLACEHOLDER)?;
                continue;
            };

            match &field.value {
                FieldValue::String(raw) => {
                    let expanded = self.format_nested(&path, raw)?;
                    push_str(&mut out, &expanded)?;
                }
                FieldValue::List(list) => {
                    // The prefix is the run of non-whitespace right before the
                    // embed, the postfix the run right after it. Both are
                    // repeated around every item.
                    let prefix_start = out[segment_start..]
                        .char_indices()
                        .rev()
                        .find(|(_, c)| c.is_whitespace())
                        .map_or(segment_start, |(i, c)| segment_start + i + c.len_utf8());
                    let prefix = out[prefix_start..].to_string();
                    out.truncate(prefix_start);

                    let limit = embeds.get(ix + 1).map_or(input.len(), |next| next.start);
                    let postfix_end = input[embed.end..limit]
                        .find(char::is_whitespace)
                        .map_or(limit, |offset| embed.end + offset);
                    let postfix = &input[embed.end..postfix_end];
                    copied = postfix_end;

                    self.enter(&path)?;
                    for item in list.items() {
                        push_str(&mut out, &prefix)?;
                        match &item.value {
                            FieldValue::String(raw) => {
                                let expanded = self.format(raw)?;
                                push_str(&mut out, &expanded)?;
                            }
                            scalar => push_str(&mut out, &scalar.to_string())?,
                        }
                        push_str(&mut out, postfix)?;
                    }
                    self.resolving_stack.pop();
                }
                scalar => push_str(&mut out, &scalar.to_string())?,
            }
        }

        push_str(&mut out, &input[copied..])?;
        Ok(out)
    }

    fn format_nested(&mut self, path: &Path, raw: &str) -> Result<String, FormatError> {
        self.enter(path)?;
        let expanded = self.format(raw)?;
        self.resolving_stack.pop();
        Ok(expanded)
    }

    fn enter(&mut self, path: &Path) -> Result<(), FormatError> {
        let key = path.to_string();
        if let Some(start) = self.resolving_stack.iter().position(|p| *p == key) {
            let cycle = self.resolving_stack[start..].join(" -> ");
            return Err(FormatError::CircularEmbed {
                cycle: format!("{cycle} -> {key}"),
            });
        }
        if self.resolving_stack.len() >= self.options.max_depth {
            return Err(FormatError::RecursionLimit {
                max_depth: self.options.max_depth,
            });
        }
        self.resolving_stack.try_reserve(1)?;
        self.resolving_stack.push(key);
        Ok(())
    }
}

/// Expands every embed in `raw`, resolving relative paths against
/// `relativity`.
pub fn format_embeds(raw: &str, doc: &Document, relativity: &Path) -> Result<String, FormatError> {
    format_embeds_with(raw, doc, relativity, &FormatOptions::default())
}

pub fn format_embeds_with(
    raw: &str,
    doc: &Document,
    relativity: &Path,
    options: &FormatOptions,
) -> Result<String, FormatError> {
    let mut formatter = Formatter {
        doc,
        relativity,
        options,
        resolving_stack: Vec::new(),
    };
    let out = formatter.format(raw)?;
    debug!("expanded {} bytes of embeds into {} bytes", raw.len(), out.len());
    Ok(out)
}

/// Expands the embeds of a string field. Any other field type is an error.
pub fn format_field_embeds(
    field: &Field,
    doc: &Document,
    relativity: &Path,
) -> Result<String, FormatError> {
    format_field_embeds_with(field, doc, relativity, &FormatOptions::default())
}

pub fn format_field_embeds_with(
    field: &Field,
    doc: &Document,
    relativity: &Path,
    options: &FormatOptions,
) -> Result<String, FormatError> {
    match field.as_str() {
        Some(raw) => format_embeds_with(raw, doc, relativity, options),
        None => Err(FormatError::InvalidType {
            name: field.name.clone(),
            found: field.field_type(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    const SOURCE: &str = "\
sector embedding_test
  section sect1
    str foo 'bar'
    u16 someu16 1337
    str local 'local $(foo)'
    list str names 'a', 'b', 'c'
    list u8 nums 1, 2
    list str nested 'x$(foo)', 'y'
    i8 neg -5
    bool flag true
  end
end
sector loops
  section s
    str me '$(me)'
    str ping 'ping $(pong)'
    str pong 'pong $(ping)'
    list str items 'i', '$(items)'
  end
end
";

    fn doc() -> Document {
        Parser::new(SOURCE).unwrap().parse_document().unwrap()
    }

    fn fmt(raw: &str) -> Result<String, FormatError> {
        let rel = Path::parse("/embedding_test/sect1").unwrap();
        format_embeds(raw, &doc(), &rel)
    }

    #[test]
    fn test_scalar_embeds() {
        assert_eq!(
            fmt("$(foo) and $(/embedding_test/sect1/someu16)").unwrap(),
            "bar and 1337"
        );
        assert_eq!(fmt("$(neg)/$(flag)").unwrap(), "-5/true");
    }

    #[test]
    fn test_no_embeds() {
        assert_eq!(fmt("plain text").unwrap(), "plain text");
        assert_eq!(fmt("").unwrap(), "");
    }

    #[test]
    fn test_string_embeds_are_expanded_recursively() {
        assert_eq!(fmt("[$(local)]").unwrap(), "[local bar]");
    }

    #[test]
    fn test_list_embeds() {
        assert_eq!(fmt("<$(names)>").unwrap(), "<a><b><c>");
        assert_eq!(fmt("x <$(names)> y").unwrap(), "x <a><b><c> y");
        assert_eq!(fmt("$(nums)").unwrap(), "12");
        assert_eq!(fmt("n=$(nums);").unwrap(), "n=1;n=2;");
    }

    #[test]
    fn test_list_prefix_stops_at_neighbouring_embeds() {
        assert_eq!(fmt("$(foo)<$(names)>$(foo)").unwrap(), "bar<a><b><c>bar");
    }

    #[test]
    fn test_list_string_items_are_expanded() {
        assert_eq!(fmt("($(nested))").unwrap(), "(xbar)(y)");
    }

    #[test]
    fn test_unresolved_embeds() {
        assert_eq!(fmt("$(/no/such/field)").unwrap(), UNRESOLVED_PLACEHOLDER);
        assert_eq!(fmt("a $(missing) b").unwrap(), "a (nullptr) b");
        assert_eq!(fmt("$(a/b/c/d)").unwrap(), UNRESOLVED_PLACEHOLDER);
        assert_eq!(fmt("$()").unwrap(), UNRESOLVED_PLACEHOLDER);
    }

    #[test]
    fn test_escapes() {
        assert_eq!(fmt("\\$(x)").unwrap(), "$(x)");
        assert_eq!(fmt("a\\\\b").unwrap(), "a\\b");
        assert_eq!(fmt("trailing\\").unwrap(), "trailing");
    }

    #[test]
    fn test_escaped_paren_stays_in_the_path() {
        let mut doc = Document::new();
        doc.add_sector("s")
            .unwrap()
            .add_section("t")
            .unwrap()
            .add_field(Field::new("x)y", FieldValue::String("hit".into())))
            .unwrap();
        let rel = Path::parse("/s/t").unwrap();

        assert_eq!(format_embeds("$(x\\)y)", &doc, &rel).unwrap(), "hit");
        assert_eq!(format_embeds("[$(x\\)y)]", &doc, &rel).unwrap(), "[hit]");
        assert_eq!(format_embeds("$(x\\)", &doc, &rel).unwrap(), "$(x)");
    }

    #[test]
    fn test_extract_unescapes_path_text() {
        let embeds = extract_embeds("$(a\\)b) $(c)").unwrap();
        assert_eq!(embeds.len(), 2);
        assert_eq!(embeds[0].end, 7);
        assert_eq!(embeds[0].kind, EmbedKind::Field(Cow::Owned("a)b".into())));
        assert_eq!(embeds[1].kind, EmbedKind::Field(Cow::Borrowed("c")));
    }

    #[test]
    fn test_unmatched_embed_syntax_is_literal() {
        assert_eq!(fmt("costs $5 (maybe)").unwrap(), "costs $5 (maybe)");
        assert_eq!(fmt("$(foo").unwrap(), "$(foo");
        assert_eq!(fmt("$ (foo)").unwrap(), "$ (foo)");
    }

    #[test]
    fn test_non_ascii_text_is_kept() {
        assert_eq!(fmt("ü $(foo) ä").unwrap(), "ü bar ä");
    }

    #[test]
    fn test_cycles_are_detected() {
        let doc = doc();
        let rel = Path::parse("/loops/s").unwrap();

        let err = format_embeds("$(me)", &doc, &rel).unwrap_err();
        assert_eq!(
            err,
            FormatError::CircularEmbed {
                cycle: "/loops/s/me -> /loops/s/me".into()
            }
        );

        let err = format_embeds("$(ping)", &doc, &rel).unwrap_err();
        assert!(matches!(err, FormatError::CircularEmbed { .. }));

        let err = format_embeds("$(items)", &doc, &rel).unwrap_err();
        assert!(matches!(err, FormatError::CircularEmbed { .. }));
    }

    #[test]
    fn test_recursion_limit() {
        let doc = doc();
        let rel = Path::parse("/embedding_test/sect1").unwrap();
        let options = FormatOptions::new().max_depth(1);

        assert_eq!(
            format_embeds_with("$(foo)", &doc, &rel, &options).unwrap(),
            "bar"
        );
        assert_eq!(
            format_embeds_with("$(local)", &doc, &rel, &options).unwrap_err(),
            FormatError::RecursionLimit { max_depth: 1 }
        );
    }

    #[test]
    fn test_field_embeds() {
        let doc = doc();
        let rel = Path::parse("/embedding_test/sect1").unwrap();

        let local = doc.field("embedding_test", "sect1", "local").unwrap();
        assert_eq!(format_field_embeds(local, &doc, &rel).unwrap(), "local bar");

        let number = doc.field("embedding_test", "sect1", "someu16").unwrap();
        assert!(matches!(
            format_field_embeds(number, &doc, &rel),
            Err(FormatError::InvalidType { .. })
        ));
    }

    #[test]
    fn test_dynfield_embeds() {
        let mut doc = doc();
        doc.add_dynfield(Field::new("user", FieldValue::String("marie".into())))
            .unwrap();
        let rel = Path::default();
        assert_eq!(format_embeds("hi $(%user%)", &doc, &rel).unwrap(), "hi marie");
    }

    #[test]
    fn test_extract_embeds() {
        let embeds = extract_embeds("a $(b) \\c").unwrap();
        assert_eq!(
            embeds,
            vec![
                Embed {
                    start: 2,
                    end: 6,
                    kind: EmbedKind::Field(Cow::Borrowed("b"))
                },
                Embed {
                    start: 7,
                    end: 8,
                    kind: EmbedKind::Escape
                },
            ]
        );
    }
}
