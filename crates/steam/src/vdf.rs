//! Text KeyValues (VDF) parser, as used by `loginusers.vdf` and the other
//! files in Steam's `config` directory.
//!
//! Supports quoted and bare tokens, `\\`-escapes in quoted strings, `//` line
//! comments and ignores `[$CONDITION]` tags.

use crate::SteamError;

/// A node in a KeyValues document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Value(String),
    Object(Vec<Entry>),
}

/// A key and the node it maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: String,
    pub node: Node,
}

impl Node {
    /// Returns the string value, if this is a leaf.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Value(v) => Some(v),
            Node::Object(_) => None,
        }
    }

    /// Returns the children, if this is an object.
    pub fn entries(&self) -> Option<&[Entry]> {
        match self {
            Node::Value(_) => None,
            Node::Object(entries) => Some(entries),
        }
    }

    /// Looks up a child by key. Keys compare case-insensitively.
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entries()?
            .iter()
            .find(|e| e.key.eq_ignore_ascii_case(key))
            .map(|e| &e.node)
    }

    /// Looks up a child's string value by key.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key)?.as_str()
    }
}

/// Parses a text VDF document into its root object.
pub fn parse_text_vdf(source: &str) -> Result<Node, SteamError> {
    parse_text_vdf_bytes(source.as_bytes())
}

/// Parses a text VDF document from raw bytes.
///
/// Steam does not guarantee UTF-8 in these files; invalid sequences inside
/// strings are replaced with U+FFFD.
pub fn parse_text_vdf_bytes(data: &[u8]) -> Result<Node, SteamError> {
    let (entries, _) = parse_object(data, 0, false)?;
    Ok(Node::Object(entries))
}

#[derive(Debug, PartialEq)]
enum Token {
    Str(String),
    Open,
    Close,
}

/// Parses entries until `}` (when `nested`) or end of input.
fn parse_object(data: &[u8], mut pos: usize, nested: bool) -> Result<(Vec<Entry>, usize), SteamError> {
    let mut entries = Vec::new();

    loop {
        let Some((token, new_pos)) = next_token(data, pos)? else {
            if nested {
                return Err(SteamError::Vdf("unexpected end of data inside object".into()));
            }
            return Ok((entries, pos));
        };
        pos = new_pos;

        let key = match token {
            Token::Str(key) => key,
            Token::Close if nested => return Ok((entries, pos)),
            Token::Close => {
                return Err(SteamError::Vdf(format!("unmatched '}}' at pos {pos}")));
            }
            Token::Open => {
                return Err(SteamError::Vdf(format!("object without a key at pos {pos}")));
            }
        };

        let node = match next_token(data, pos)? {
            Some((Token::Str(value), new_pos)) => {
                pos = new_pos;
                Node::Value(value)
            }
            Some((Token::Open, new_pos)) => {
                let (children, new_pos) = parse_object(data, new_pos, true)?;
                pos = new_pos;
                Node::Object(children)
            }
            _ => {
                return Err(SteamError::Vdf(format!("expected a value for key '{key}'")));
            }
        };
        entries.push(Entry { key, node });
    }
}

/// Reads the next token, skipping whitespace, comments and conditionals.
fn next_token(data: &[u8], mut pos: usize) -> Result<Option<(Token, usize)>, SteamError> {
    loop {
        while pos < data.len() && data[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if pos >= data.len() {
            return Ok(None);
        }

        match data[pos] {
            b'/' if data.get(pos + 1) == Some(&b'/') => {
                while pos < data.len() && data[pos] != b'\n' {
                    pos += 1;
                }
            }
            b'[' => {
                while pos < data.len() && data[pos] != b']' {
                    pos += 1;
                }
                pos += 1;
            }
            b'{' => return Ok(Some((Token::Open, pos + 1))),
            b'}' => return Ok(Some((Token::Close, pos + 1))),
            b'"' => {
                let (s, new_pos) = read_quoted(data, pos + 1)?;
                return Ok(Some((Token::Str(s), new_pos)));
            }
            _ => {
                let (s, new_pos) = read_bare(data, pos);
                return Ok(Some((Token::Str(s), new_pos)));
            }
        }
    }
}

/// Reads a quoted string whose opening quote precedes `pos`.
fn read_quoted(data: &[u8], pos: usize) -> Result<(String, usize), SteamError> {
    let start = pos;
    let mut out = Vec::new();
    let mut i = pos;
    while i < data.len() {
        match data[i] {
            b'"' => return Ok((String::from_utf8_lossy(&out).into_owned(), i + 1)),
            b'\\' if i + 1 < data.len() => {
                out.push(match data[i + 1] {
                    b'n' => b'\n',
                    b't' => b'\t',
                    other => other,
                });
                i += 2;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    Err(SteamError::Vdf(format!(
        "unterminated string starting at pos {start}"
    )))
}

/// Reads an unquoted token.
fn read_bare(data: &[u8], pos: usize) -> (String, usize) {
    let mut end = pos;
    while end < data.len()
        && !data[end].is_ascii_whitespace()
        && !matches!(data[end], b'{' | b'}' | b'"')
    {
        end += 1;
    }
    (String::from_utf8_lossy(&data[pos..end]).into_owned(), end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_flat_pairs() {
        let root = parse_text_vdf(r#""a" "1" "b" "two""#).unwrap();
        assert_eq!(root.get_str("a"), Some("1"));
        assert_eq!(root.get_str("B"), Some("two"));
    }

    #[test]
    fn parse_nested_objects() {
        let src = r#"
            "users"
            {
                "7656"
                {
                    "AccountName"   "gaben"
                }
            }
        "#;
        let root = parse_text_vdf(src).unwrap();
        let users = root.get("users").unwrap();
        let user = users.get("7656").unwrap();
        assert_eq!(user.get_str("accountname"), Some("gaben"));
    }

    #[test]
    fn comments_and_conditionals_are_skipped() {
        let src = "// header\n\"k\" \"v\" [$WIN32]\n// trailer";
        let root = parse_text_vdf(src).unwrap();
        assert_eq!(root.entries().unwrap().len(), 1);
        assert_eq!(root.get_str("k"), Some("v"));
    }

    #[test]
    fn bare_tokens() {
        let root = parse_text_vdf("key value\nobj { inner 1 }").unwrap();
        assert_eq!(root.get_str("key"), Some("value"));
        assert_eq!(root.get("obj").unwrap().get_str("inner"), Some("1"));
    }

    #[test]
    fn escapes_in_quoted_strings() {
        let root = parse_text_vdf(r#""path" "c:\\steam\\\"x\"""#).unwrap();
        assert_eq!(root.get_str("path"), Some(r#"c:\steam\"x""#));
    }

    #[test]
    fn empty_document() {
        let root = parse_text_vdf("  \n").unwrap();
        assert_eq!(root.entries().unwrap().len(), 0);
    }

    #[test]
    fn reject_unterminated_string() {
        assert!(parse_text_vdf(r#""key" "value"#).is_err());
    }

    #[test]
    fn reject_unclosed_object() {
        assert!(parse_text_vdf(r#""users" { "a" "b""#).is_err());
    }

    #[test]
    fn reject_unmatched_close() {
        assert!(parse_text_vdf(r#""a" "b" }"#).is_err());
    }

    #[test]
    fn reject_key_without_value() {
        assert!(parse_text_vdf(r#""lonely""#).is_err());
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let root = parse_text_vdf_bytes(b"\"name\" \"Jos\xE9\" \"next\" \"ok\"").unwrap();
        assert_eq!(root.get_str("name"), Some("Jos\u{FFFD}"));
        assert_eq!(root.get_str("next"), Some("ok"));
    }
}
