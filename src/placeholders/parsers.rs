//! Byte-level lookahead for the marker scanner. Each check answers whether a delimiter
//! that switches scanner state (comment open/close, dollar-quote open/close) starts at a
//! given offset, and never reads past the end of the input.

fn starts_with_at(bytes: &[u8], idx: usize, pattern: &[u8]) -> bool {
    bytes.get(idx..idx + pattern.len()) == Some(pattern)
}

pub(super) fn is_line_comment_start(bytes: &[u8], idx: usize) -> bool {
    starts_with_at(bytes, idx, b"--")
}

pub(super) fn is_block_comment_start(bytes: &[u8], idx: usize) -> bool {
    starts_with_at(bytes, idx, b"/*")
}

pub(super) fn is_block_comment_end(bytes: &[u8], idx: usize) -> bool {
    starts_with_at(bytes, idx, b"*/")
}

/// An opening `$tag$` at `start` (the tag may be empty). Returns the tag and the offset of
/// the `$` that closes the opener.
pub(super) fn try_start_dollar_quote(bytes: &[u8], start: usize) -> Option<(String, usize)> {
    let rest = bytes.get(start + 1..)?;
    // `$1` is a positional parameter, not a tag
    if rest.first().is_some_and(u8::is_ascii_digit) {
        return None;
    }
    let tag_len = rest
        .iter()
        .position(|b| !(b.is_ascii_alphanumeric() || *b == b'_'))?;
    if rest[tag_len] != b'$' {
        return None;
    }
    let tag = std::str::from_utf8(&rest[..tag_len]).ok()?;
    Some((tag.to_string(), start + 1 + tag_len))
}

/// Whether the closing `$tag$` for `tag` starts at `idx`.
pub(super) fn matches_tag(bytes: &[u8], idx: usize, tag: &str) -> bool {
    starts_with_at(bytes, idx, b"$")
        && starts_with_at(bytes, idx + 1, tag.as_bytes())
        && starts_with_at(bytes, idx + 1 + tag.len(), b"$")
}
