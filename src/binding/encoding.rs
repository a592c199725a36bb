//! Percent-encoding with per-operation skip sets.
//!
//! Some provider APIs require literal delimiters (`/`, `,`) inside path
//! segments or query values, so the characters a descriptor lists in its skip
//! set are restored after uniform encoding.

use std::borrow::Cow;

/// Percent-encode `value`, leaving the characters in `skip` literal.
pub fn encode_component<'a>(value: &'a str, skip: &[char]) -> Cow<'a, str> {
    let encoded = urlencoding::encode(value);
    if skip.is_empty() || !matches!(encoded, Cow::Owned(_)) {
        return encoded;
    }
    let mut out = encoded.into_owned();
    for c in skip {
        let mut buf = [0u8; 4];
        let literal = c.encode_utf8(&mut buf);
        let escaped = urlencoding::encode(literal);
        if escaped != *literal {
            out = out.replace(&*escaped, literal);
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_encoding() {
        assert_eq!(encode_component("a b/c,d", &[]), "a%20b%2Fc%2Cd");
        assert_eq!(encode_component("plain-value_1.0~", &[]), "plain-value_1.0~");
    }

    #[test]
    fn test_skip_set_keeps_delimiters() {
        assert_eq!(encode_component("a b/c,d", &['/', ',']), "a%20b/c,d");
        assert_eq!(encode_component("x/y", &[',']), "x%2Fy");
    }
}
