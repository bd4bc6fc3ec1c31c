//! Placeholder handling for the statement builder.
//!
//! Fragments are written with bare `?` markers. Each consumed marker is rendered as a
//! numbered placeholder in the backend's own style, so parameter `n` of a statement is
//! always `?n` on `SQLite` and `$n` on Postgres no matter which fragment added it.

mod parsers;
mod scanner;

use crate::types::DatabaseType;

/// Target placeholder style for rendered statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// PostgreSQL-style placeholders like `$1`.
    Postgres,
    /// SQLite-style placeholders like `?1`.
    Sqlite,
}

impl PlaceholderStyle {
    #[must_use]
    pub fn for_database(db_type: DatabaseType) -> Self {
        match db_type {
            #[cfg(feature = "sqlite")]
            DatabaseType::Sqlite => PlaceholderStyle::Sqlite,
            #[cfg(feature = "postgres")]
            DatabaseType::Postgres => PlaceholderStyle::Postgres,
        }
    }

    /// Append the placeholder for the 1-based parameter `position` to `out`.
    pub fn render(self, position: usize, out: &mut String) {
        out.push(match self {
            PlaceholderStyle::Postgres => '$',
            PlaceholderStyle::Sqlite => '?',
        });
        out.push_str(&position.to_string());
    }
}

/// Byte offsets of the `?` markers in `fragment`, skipping string literals, quoted
/// identifiers, comments and (for Postgres) dollar-quoted bodies.
#[must_use]
pub fn marker_positions(fragment: &str, style: PlaceholderStyle) -> Vec<usize> {
    scanner::marker_positions(fragment, style)
}

/// Whether `keyword` appears as a whole word in `sql` outside string literals, quoted
/// identifiers and comments, ignoring ASCII case.
#[must_use]
pub fn contains_keyword(sql: &str, style: PlaceholderStyle, keyword: &str) -> bool {
    scanner::contains_keyword(sql, style, keyword)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_bare_markers() {
        let sql = "UPDATE t SET a = ?, b = ? WHERE id = ?";
        assert_eq!(
            marker_positions(sql, PlaceholderStyle::Sqlite),
            vec![17, 24, 37]
        );
    }

    #[test]
    fn skips_inside_literals_and_comments() {
        let sql = "select 'why?', \"q?\" -- any?\n/* ? /* ? */ */ from t where a = ?";
        let found = marker_positions(sql, PlaceholderStyle::Sqlite);
        assert_eq!(found, vec![sql.len() - 1]);
    }

    #[test]
    fn escaped_quotes_stay_inside_literal() {
        let sql = "where note = 'it''s?' and id = ?";
        assert_eq!(
            marker_positions(sql, PlaceholderStyle::Sqlite),
            vec![sql.len() - 1]
        );
    }

    #[test]
    fn skips_dollar_quoted_blocks_for_postgres() {
        let sql = "$body$ select ? $body$ where a = ?";
        assert_eq!(
            marker_positions(sql, PlaceholderStyle::Postgres),
            vec![sql.len() - 1]
        );
        // `$1` is not a dollar-quote opener
        let sql = "where a = $1 and b = ?";
        assert_eq!(
            marker_positions(sql, PlaceholderStyle::Postgres),
            vec![sql.len() - 1]
        );
    }

    #[test]
    fn keyword_search_ignores_literals_comments_and_partial_words() {
        let pg = PlaceholderStyle::Postgres;
        assert!(contains_keyword("INSERT INTO t (a) VALUES ($1) returning id", pg, "RETURNING"));
        assert!(contains_keyword("insert into t values (1)\nRETURNING *;", pg, "RETURNING"));
        assert!(!contains_keyword("INSERT INTO t (a) VALUES ('returning')", pg, "RETURNING"));
        assert!(!contains_keyword("INSERT INTO t (\"returning\") VALUES (1)", pg, "RETURNING"));
        assert!(!contains_keyword("INSERT INTO t VALUES (1) -- returning id", pg, "RETURNING"));
        assert!(!contains_keyword("INSERT INTO t (returning_at) VALUES (1)", pg, "RETURNING"));
        assert!(!contains_keyword("INSERT INTO t VALUES ($x$ returning $x$)", pg, "RETURNING"));
    }

    #[test]
    fn renders_numbered_placeholders() {
        let mut out = String::new();
        PlaceholderStyle::Sqlite.render(3, &mut out);
        out.push(' ');
        PlaceholderStyle::Postgres.render(12, &mut out);
        assert_eq!(out, "?3 $12");
    }
}
