// Percent-encoding and URI character classes

use std::borrow::Cow;

/// Characters RFC 3986 reserves as delimiters.
pub const RESERVED: &str = ":/?#[]@!$&'()*+,;=";

pub fn is_unreserved(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~')
}

pub fn is_reserved(byte: u8) -> bool {
    RESERVED.as_bytes().contains(&byte)
}

/// Escape everything outside `A-Za-z0-9-_.~`.
pub fn encode(value: &str) -> Cow<'_, str> {
    urlencoding::encode(value)
}

/// Escape everything outside the unreserved and reserved sets.
pub fn encode_reserved(value: &str) -> Cow<'_, str> {
    if value.bytes().all(|b| is_unreserved(b) || is_reserved(b)) {
        return Cow::Borrowed(value);
    }

    let mut out = String::with_capacity(value.len() + 8);
    let mut buf = [0u8; 4];
    for ch in value.chars() {
        if ch.is_ascii() && is_reserved(ch as u8) {
            out.push(ch);
        } else {
            out.push_str(&urlencoding::encode(ch.encode_utf8(&mut buf)));
        }
    }
    Cow::Owned(out)
}

/// Decode `%XX` escapes. Fails if the decoded bytes are not UTF-8.
pub fn decode(raw: &str) -> Option<Cow<'_, str>> {
    urlencoding::decode(raw).ok()
}

/// Which characters a matched run may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    /// Unreserved characters and `%XX` escapes.
    Unreserved,
    /// `Unreserved` plus `,`, for list values inside operators.
    UnreservedList,
    /// Unreserved, reserved and `%XX` escapes.
    Reserved,
    /// Anything.
    Any,
}

impl CharClass {
    /// Length in bytes of the longest prefix of `input` made of this class.
    pub fn run_len(self, input: &str) -> usize {
        if self == CharClass::Any {
            return input.len();
        }

        let bytes = input.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            let b = bytes[i];
            if b == b'%' {
                if is_escape(bytes, i) {
                    i += 3;
                    continue;
                }
                break;
            }
            let allowed = match self {
                CharClass::Unreserved => is_unreserved(b),
                CharClass::UnreservedList => is_unreserved(b) || b == b',',
                CharClass::Reserved => is_unreserved(b) || is_reserved(b),
                CharClass::Any => true,
            };
            if !allowed {
                break;
            }
            i += 1;
        }
        i
    }
}

fn is_escape(bytes: &[u8], at: usize) -> bool {
    bytes.len() > at + 2 && bytes[at + 1].is_ascii_hexdigit() && bytes[at + 2].is_ascii_hexdigit()
}

/// Compare `literal` against `input` starting at `at`.
///
/// Case-sensitive, except for the hex digits of `%XX` escapes.
pub fn literal_at(input: &str, at: usize, literal: &str) -> bool {
    let hay = input.as_bytes();
    let lit = literal.as_bytes();
    if at + lit.len() > hay.len() {
        return false;
    }

    let mut hex_left = 0;
    for (i, &expected) in lit.iter().enumerate() {
        let actual = hay[at + i];
        let same = if hex_left > 0 {
            hex_left -= 1;
            actual.eq_ignore_ascii_case(&expected)
        } else {
            if expected == b'%' && is_escape(lit, i) {
                hex_left = 2;
            }
            actual == expected
        };
        if !same {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_unreserved_untouched() {
        assert_eq!(encode("AZaz09-_.~"), "AZaz09-_.~");
        assert_eq!(encode("/foo/bar"), "%2Ffoo%2Fbar");
        assert_eq!(encode("hello world"), "hello%20world");
    }

    #[test]
    fn test_encode_reserved_keeps_delimiters() {
        assert_eq!(encode_reserved("/foo/bar?x=1&y=2"), "/foo/bar?x=1&y=2");
        assert_eq!(encode_reserved("a b/c"), "a%20b/c");
        assert_eq!(encode_reserved("100%"), "100%25");
        assert_eq!(encode_reserved("caf\u{e9}"), "caf%C3%A9");
    }

    #[test]
    fn test_decode() {
        assert_eq!(decode("a%20b%2Fc").unwrap(), "a b/c");
        assert_eq!(decode("caf%c3%a9").unwrap(), "caf\u{e9}");
        assert!(decode("%FF").is_none());
    }

    #[test]
    fn test_run_len() {
        assert_eq!(CharClass::Unreserved.run_len("abc/def"), 3);
        assert_eq!(CharClass::Unreserved.run_len("a%20b;c"), 5);
        assert_eq!(CharClass::Unreserved.run_len("a%2"), 1);
        assert_eq!(CharClass::UnreservedList.run_len("a,b,c&d"), 5);
        assert_eq!(CharClass::Reserved.run_len("/a/b?c=d e"), 8);
        assert_eq!(CharClass::Any.run_len("a b\u{e9}"), 5);
    }

    #[test]
    fn test_literal_at_hex_case() {
        assert!(literal_at("/a%2Fb", 2, "%2F"));
        assert!(literal_at("/a%2fb", 2, "%2F"));
        assert!(!literal_at("/A", 0, "/a"));
        assert!(!literal_at("/a", 1, "ab"));
    }
}
