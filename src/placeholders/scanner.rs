use super::PlaceholderStyle;
use super::parsers::{
    is_block_comment_end, is_block_comment_start, is_line_comment_start, matches_tag,
    try_start_dollar_quote,
};

#[derive(Clone, Debug, PartialEq, Eq)]
enum State {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    LineComment,
    BlockComment(u32),
    DollarQuoted(String),
}

/// Byte offsets of the `?` markers in `sql` that sit outside string literals, quoted
/// identifiers and comments. Dollar-quoted bodies are skipped for Postgres only.
pub(super) fn marker_positions(sql: &str, style: PlaceholderStyle) -> Vec<usize> {
    let bytes = sql.as_bytes();
    let mut markers = Vec::new();
    visit_code(sql, style, |idx| {
        if bytes[idx] == b'?' {
            markers.push(idx);
        }
    });
    markers
}

/// Whether `keyword` occurs as a whole word (ASCII case-insensitive) outside literals,
/// quoted identifiers and comments.
pub(super) fn contains_keyword(sql: &str, style: PlaceholderStyle, keyword: &str) -> bool {
    let bytes = sql.as_bytes();
    let is_word = |b: u8| b.is_ascii_alphanumeric() || b == b'_';
    let mut found = false;
    visit_code(sql, style, |idx| {
        if found || !is_word(bytes[idx]) || (idx > 0 && is_word(bytes[idx - 1])) {
            return;
        }
        let end = bytes[idx..]
            .iter()
            .position(|b| !is_word(*b))
            .map_or(bytes.len(), |len| idx + len);
        found = bytes[idx..end].eq_ignore_ascii_case(keyword.as_bytes());
    });
    found
}

/// Call `visit` with the offset of every byte that is plain SQL: not inside a literal,
/// quoted identifier, comment or dollar-quoted body, and not one of their delimiters.
fn visit_code(sql: &str, style: PlaceholderStyle, mut visit: impl FnMut(usize)) {
    let bytes = sql.as_bytes();
    let mut state = State::Normal;
    let mut idx = 0;

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => match b {
                b'\'' => state = State::SingleQuoted,
                b'"' => state = State::DoubleQuoted,
                _ if is_line_comment_start(bytes, idx) => {
                    state = State::LineComment;
                    idx += 1;
                }
                _ if is_block_comment_start(bytes, idx) => {
                    state = State::BlockComment(1);
                    idx += 1;
                }
                b'$' if style == PlaceholderStyle::Postgres => {
                    if let Some((tag, close)) = try_start_dollar_quote(bytes, idx) {
                        state = State::DollarQuoted(tag);
                        idx = close;
                    } else {
                        visit(idx);
                    }
                }
                _ => visit(idx),
            },
            State::SingleQuoted => {
                if b == b'\'' {
                    if bytes.get(idx + 1) == Some(&b'\'') {
                        idx += 1; // escaped quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::DoubleQuoted => {
                if b == b'"' {
                    if bytes.get(idx + 1) == Some(&b'"') {
                        idx += 1;
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                if is_block_comment_start(bytes, idx) {
                    state = State::BlockComment(depth + 1);
                    idx += 1;
                } else if is_block_comment_end(bytes, idx) {
                    state = if depth == 1 {
                        State::Normal
                    } else {
                        State::BlockComment(depth - 1)
                    };
                    idx += 1;
                }
            }
            State::DollarQuoted(ref tag) => {
                if matches_tag(bytes, idx, tag) {
                    let tag_len = tag.len();
                    state = State::Normal;
                    idx += tag_len + 1;
                }
            }
        }
        idx += 1;
    }
}
