//! Tokenizer for the `KEY="value"` / `KEY=value` ASCII header grammar.
//!
//! Product headers (MPH, SPH) and dataset descriptors are newline separated
//! runs of assignments, padded with spaces. Quoted values keep their padding
//! until trimmed; unquoted values end at the first whitespace and numeric ones
//! may carry a unit suffix such as `<bytes>`.

use crate::types::{AsarError, AsarResult};
use regex::Regex;

const FIELD_PATTERN: &str = r#"([A-Z][A-Z0-9_]*)=(?:"([^"]*)"|([^\s"]*))"#;

/// One `KEY=value` assignment and where it sits in the tokenized text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderField<'a> {
    pub key: &'a str,
    pub value: &'a str,
    /// Byte offset of the key inside the tokenized text
    pub offset: usize,
    pub quoted: bool,
}

/// Reusable compiled tokenizer
pub struct HeaderTokenizer {
    pattern: Regex,
}

impl HeaderTokenizer {
    pub fn new() -> AsarResult<Self> {
        let pattern = Regex::new(FIELD_PATTERN)
            .map_err(|e| AsarError::InvalidFormat(format!("Header grammar error: {}", e)))?;
        Ok(Self { pattern })
    }

    /// Split `text` into assignments in order of appearance
    pub fn tokenize<'a>(&self, text: &'a str) -> AsarResult<HeaderFields<'a>> {
        let mut fields = Vec::new();

        for caps in self.pattern.captures_iter(text) {
            let (Some(whole), Some(key)) = (caps.get(0), caps.get(1)) else {
                continue;
            };

            let field = match (caps.get(2), caps.get(3)) {
                (Some(quoted), _) => HeaderField {
                    key: key.as_str(),
                    value: quoted.as_str(),
                    offset: whole.start(),
                    quoted: true,
                },
                (None, Some(bare)) => {
                    if bare.as_str().is_empty() && text[whole.end()..].starts_with('"') {
                        return Err(AsarError::InvalidFormat(format!(
                            "Unterminated quoted value for {} at offset {}",
                            key.as_str(),
                            whole.start()
                        )));
                    }
                    HeaderField {
                        key: key.as_str(),
                        value: bare.as_str(),
                        offset: whole.start(),
                        quoted: false,
                    }
                }
                (None, None) => continue,
            };
            fields.push(field);
        }

        Ok(HeaderFields { fields })
    }

    /// Tokenize raw header bytes, which must be ASCII
    pub fn tokenize_bytes<'a>(&self, bytes: &'a [u8]) -> AsarResult<HeaderFields<'a>> {
        let text = ascii_str(bytes)?;
        self.tokenize(text)
    }
}

/// Decode a header segment as text
pub fn ascii_str(bytes: &[u8]) -> AsarResult<&str> {
    if !bytes.is_ascii() {
        return Err(AsarError::InvalidFormat(
            "Header segment contains non-ASCII bytes".to_string(),
        ));
    }
    std::str::from_utf8(bytes)
        .map_err(|e| AsarError::InvalidFormat(format!("Header segment is not text: {}", e)))
}

/// Parse a signed header integer, dropping any `<unit>` suffix
pub fn parse_integer(value: &str) -> Option<i64> {
    let number = match value.find('<') {
        Some(idx) => &value[..idx],
        None => value,
    };
    number.trim().parse::<i64>().ok()
}

/// Ordered assignments of one header segment
#[derive(Debug, Clone, Default)]
pub struct HeaderFields<'a> {
    fields: Vec<HeaderField<'a>>,
}

impl<'a> HeaderFields<'a> {
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HeaderField<'a>> {
        self.fields.iter()
    }

    /// First assignment of `key`
    pub fn get(&self, key: &str) -> Option<&HeaderField<'a>> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// Trimmed value of `key`; blank values read as absent
    pub fn text(&self, key: &str) -> Option<&'a str> {
        self.get(key)
            .map(|f| f.value.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn require_text(&self, key: &str, context: &str) -> AsarResult<&'a str> {
        self.text(key).ok_or_else(|| {
            AsarError::InvalidFormat(format!("{}: missing {} field", context, key))
        })
    }

    /// Integer value of `key`; present but unparsable values are errors
    pub fn integer(&self, key: &str) -> AsarResult<Option<i64>> {
        match self.get(key) {
            None => Ok(None),
            Some(field) => parse_integer(field.value).map(Some).ok_or_else(|| {
                AsarError::InvalidFormat(format!(
                    "Invalid integer for {} at offset {}: {:?}",
                    key, field.offset, field.value
                ))
            }),
        }
    }

    pub fn require_integer(&self, key: &str, context: &str) -> AsarResult<i64> {
        self.integer(key)?.ok_or_else(|| {
            AsarError::InvalidFormat(format!("{}: missing {} field", context, key))
        })
    }
}
