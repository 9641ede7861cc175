//! `@name` → `[~name]` rewriting.

use std::borrow::Cow;

/// Characters allowed in a user name after `@`. ASCII only.
fn is_mention_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

/// Rewrites every `@name` in `text` into the tracker's user reference
/// `[~name]`.
///
/// A mention is `@` followed by the longest run of ASCII letters, digits,
/// `-` and `_`; an `@` not followed by one of those is kept as-is. Text
/// without any `@` is returned borrowed.
///
/// The output never contains a rewritable mention, so applying this twice is
/// the same as applying it once.
pub fn rewrite_mentions(text: &str) -> Cow<'_, str> {
    if !text.contains('@') {
        return Cow::Borrowed(text);
    }

    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len() + 8);
    let mut copied = 0;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'@' && bytes.get(i + 1).is_some_and(|b| is_mention_byte(*b)) {
            let start = i + 1;
            let end = bytes[start..]
                .iter()
                .position(|b| !is_mention_byte(*b))
                .map_or(bytes.len(), |offset| start + offset);
            // `@` and the name bytes are ASCII, so these are char boundaries.
            out.push_str(&text[copied..i]);
            out.push_str("[~");
            out.push_str(&text[start..end]);
            out.push(']');
            copied = end;
            i = end;
        } else {
            i += 1;
        }
    }
    out.push_str(&text[copied..]);
    Cow::Owned(out)
}
