use crate::placeholders::{PlaceholderStyle, marker_positions};
use crate::types::RowValues;

/// A statement ready for execution: rendered SQL text plus its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryAndParams {
    pub query: String,
    pub params: Vec<RowValues>,
}

impl QueryAndParams {
    /// Wrap SQL that already uses the backend's placeholders.
    pub fn new(query: impl Into<String>, params: Vec<RowValues>) -> Self {
        Self {
            query: query.into(),
            params,
        }
    }
}

/// Accumulates SQL fragments and their bound values.
///
/// Fragments use bare `?` markers; the builder numbers them so the final text binds
/// positionally on the target backend:
/// ```rust
/// use sql_session::prelude::*;
///
/// let mut builder = StatementBuilder::new(PlaceholderStyle::Sqlite);
/// builder
///     .append("SELECT id FROM article")
///     .append_in("WHERE id IN (?)", [3, 5])
///     .append_with("AND title = ?", ["hello"]);
/// assert_eq!(
///     builder.text(),
///     "SELECT id FROM article\nWHERE id IN (?1, ?2)\nAND title = ?3\n"
/// );
/// assert_eq!(builder.params().len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct StatementBuilder {
    text: String,
    params: Vec<RowValues>,
    style: PlaceholderStyle,
}

impl StatementBuilder {
    #[must_use]
    pub fn new(style: PlaceholderStyle) -> Self {
        Self {
            text: String::new(),
            params: Vec::new(),
            style,
        }
    }

    /// Append a raw fragment followed by a newline. Markers stay literal.
    pub fn append(&mut self, fragment: &str) -> &mut Self {
        self.text.push_str(fragment);
        self.text.push('\n');
        self
    }

    /// Append a fragment, binding each `?` marker to the next value, left to right.
    ///
    /// Values without a marker are dropped; markers without a value stay literal.
    pub fn append_with<I, V>(&mut self, fragment: &str, params: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<RowValues>,
    {
        let mut values = params.into_iter().map(Into::into);
        let mut copied = 0;
        for pos in marker_positions(fragment, self.style) {
            let Some(value) = values.next() else {
                break;
            };
            self.text.push_str(&fragment[copied..pos]);
            self.bind(value);
            copied = pos + 1;
        }
        self.text.push_str(&fragment[copied..]);
        self.text.push('\n');

        let dropped = values.count();
        if dropped > 0 {
            tracing::debug!(dropped, fragment, "surplus parameters without a marker were ignored");
        }
        self
    }

    /// Append a fragment whose first `?` expands to one placeholder per value, e.g.
    /// `id IN (?)` with three values becomes `id IN (?1, ?2, ?3)`.
    ///
    /// Only the first marker is expanded. All values are recorded even when the fragment
    /// has no marker.
    pub fn append_in<I, V>(&mut self, fragment: &str, params: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<RowValues>,
    {
        let values: Vec<RowValues> = params.into_iter().map(Into::into).collect();
        match marker_positions(fragment, self.style).first() {
            Some(&pos) => {
                self.text.push_str(&fragment[..pos]);
                for (i, value) in values.into_iter().enumerate() {
                    if i > 0 {
                        self.text.push_str(", ");
                    }
                    self.bind(value);
                }
                self.text.push_str(&fragment[pos + 1..]);
            }
            None => {
                self.text.push_str(fragment);
                self.params.extend(values);
            }
        }
        self.text.push('\n');
        self
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn params(&self) -> &[RowValues] {
        &self.params
    }

    #[must_use]
    pub fn style(&self) -> PlaceholderStyle {
        self.style
    }

    #[must_use]
    pub fn build(self) -> QueryAndParams {
        QueryAndParams {
            query: self.text,
            params: self.params,
        }
    }

    fn bind(&mut self, value: RowValues) {
        self.params.push(value);
        self.style.render(self.params.len(), &mut self.text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params;

    fn sqlite() -> StatementBuilder {
        StatementBuilder::new(PlaceholderStyle::Sqlite)
    }

    #[test]
    fn append_keeps_text_verbatim() {
        let mut b = sqlite();
        b.append("SELECT * FROM t WHERE a = ?").append("  ORDER BY id  ");
        assert_eq!(b.text(), "SELECT * FROM t WHERE a = ?\n  ORDER BY id  \n");
        assert!(b.params().is_empty());
    }

    #[test]
    fn append_with_binds_left_to_right() {
        let mut b = sqlite();
        b.append("UPDATE article")
            .append_with("SET title = ?, body = ?", ["new title", "new body"])
            .append_with("WHERE id = ?", [7]);
        assert_eq!(
            b.text(),
            "UPDATE article\nSET title = ?1, body = ?2\nWHERE id = ?3\n"
        );
        assert_eq!(b.params(), params!["new title", "new body", 7].as_slice());
    }

    #[test]
    fn surplus_params_are_dropped() {
        let mut b = sqlite();
        b.append_with("WHERE id = ?", [1, 2, 3]);
        assert_eq!(b.text(), "WHERE id = ?1\n");
        assert_eq!(b.params(), [RowValues::Int(1)].as_slice());
    }

    #[test]
    fn surplus_markers_stay_literal() {
        let mut b = sqlite();
        b.append_with("a = ? AND b = ? AND c = ?", [1]);
        assert_eq!(b.text(), "a = ?1 AND b = ? AND c = ?\n");
        assert_eq!(b.params().len(), 1);
    }

    #[test]
    fn quoted_markers_do_not_consume_params() {
        let mut b = sqlite();
        b.append_with("WHERE title = 'why?' AND id = ?", [4]);
        assert_eq!(b.text(), "WHERE title = 'why?' AND id = ?1\n");
        assert_eq!(b.params(), [RowValues::Int(4)].as_slice());
    }

    #[test]
    fn append_in_expands_first_marker_only() {
        let mut b = sqlite();
        b.append_in("WHERE id IN (?) AND flag = ?", [1, 2, 3]);
        assert_eq!(b.text(), "WHERE id IN (?1, ?2, ?3) AND flag = ?\n");
        assert_eq!(b.params(), params![1, 2, 3].as_slice());
    }

    #[test]
    fn append_in_continues_numbering() {
        let mut b = StatementBuilder::new(PlaceholderStyle::Postgres);
        b.append_with("SELECT * FROM t WHERE a = ?", ["x"])
            .append_in("AND id IN (?)", [10, 20]);
        assert_eq!(
            b.text(),
            "SELECT * FROM t WHERE a = $1\nAND id IN ($2, $3)\n"
        );
    }

    #[test]
    fn append_in_without_marker_still_records_values() {
        let mut b = sqlite();
        b.append_in("ORDER BY id", [1, 2]);
        assert_eq!(b.text(), "ORDER BY id\n");
        assert_eq!(b.params().len(), 2);
    }

    #[test]
    fn build_hands_over_text_and_params() {
        let mut b = sqlite();
        b.append_with("DELETE FROM t WHERE id = ?", [9]);
        let stmt = b.build();
        assert_eq!(stmt.query, "DELETE FROM t WHERE id = ?1\n");
        assert_eq!(stmt.params, vec![RowValues::Int(9)]);
    }
}
