use std::borrow::Cow;

/// How the bytes of a source file were turned into text.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SourceEncoding {
    #[default]
    Utf8,
    /// The file was not valid UTF-8. Every byte was read as the code point
    /// of the same value, so string contents keep their exact bytes.
    Latin1,
}

/// Decodes file contents. Valid UTF-8 is borrowed as-is; anything else is
/// read byte for byte.
pub fn decode_source(bytes: &[u8]) -> (Cow<'_, str>, SourceEncoding) {
    match std::str::from_utf8(bytes) {
        Ok(text) => (Cow::Borrowed(text), SourceEncoding::Utf8),
        Err(_) => {
            let text = bytes.iter().map(|&b| char::from(b)).collect();
            (Cow::Owned(text), SourceEncoding::Latin1)
        }
    }
}

/// Inverse of [`decode_source`]. Fails with the first character that has
/// no single-byte form when `encoding` is [`SourceEncoding::Latin1`].
pub fn encode_source(text: &str, encoding: SourceEncoding) -> Result<Cow<'_, [u8]>, char> {
    match encoding {
        SourceEncoding::Utf8 => Ok(Cow::Borrowed(text.as_bytes())),
        SourceEncoding::Latin1 => text
            .chars()
            .map(|c| u8::try_from(c).map_err(|_| c))
            .collect::<Result<Vec<u8>, char>>()
            .map(Cow::Owned),
    }
}

/// Escapes a string for use inside a single-quoted literal by doubling
/// every `'`. Returns the content without the surrounding quotes.
pub fn escape_quotes(s: &str) -> Cow<'_, str> {
    if !s.contains('\'') {
        return Cow::Borrowed(s);
    }
    Cow::Owned(s.replace('\'', "''"))
}

/// Inverse of [`escape_quotes`]: collapses every `''` into a single `'`.
/// A lone quote is kept as-is.
pub fn unescape_quotes(s: &str) -> Cow<'_, str> {
    if !s.contains("''") {
        return Cow::Borrowed(s);
    }

    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        result.push(c);
        if c == '\'' && chars.peek() == Some(&'\'') {
            chars.next();
        }
    }
    Cow::Owned(result)
}
