#![cfg(feature = "postgres")]

//! Runs against a live server when `SQL_SESSION_PG_HOST` is set, e.g.
//! `SQL_SESSION_PG_HOST=localhost SQL_SESSION_PG_USER=postgres SQL_SESSION_PG_PASSWORD=... \
//!  SQL_SESSION_PG_DBNAME=postgres cargo test --features postgres`.

use chrono::NaiveDateTime;
use sql_session::prelude::*;

fn postgres_options() -> Option<PostgresOptions> {
    let host = std::env::var("SQL_SESSION_PG_HOST").ok()?;
    let var = |name: &str, default: &str| std::env::var(name).unwrap_or_else(|_| default.into());
    let port = var("SQL_SESSION_PG_PORT", "5432").parse().ok()?;
    Some(
        PostgresOptions::builder(host, var("SQL_SESSION_PG_DBNAME", "postgres"))
            .port(port)
            .user(var("SQL_SESSION_PG_USER", "postgres"))
            .password(var("SQL_SESSION_PG_PASSWORD", ""))
            .finish(),
    )
}

sql_session::record! {
    #[derive(Debug, Default)]
    struct Note {
        id: i64,
        title: String,
        created: NaiveDateTime => "createdDate",
        pinned: bool,
    }
}

#[tokio::test]
async fn postgres_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let Some(opts) = postgres_options() else {
        eprintln!("SQL_SESSION_PG_HOST not set; skipping");
        return Ok(());
    };
    let db = Database::new(opts);
    let mut session = db.session();
    assert_eq!(session.database_type(), DatabaseType::Postgres);

    session
        .run(
            "DROP TABLE IF EXISTS sql_session_note;
             CREATE TABLE sql_session_note (
                 id BIGSERIAL PRIMARY KEY,
                 title TEXT NOT NULL,
                 \"createdDate\" TIMESTAMP NOT NULL DEFAULT now(),
                 pinned BOOLEAN NOT NULL DEFAULT false
             );",
        )
        .await?;

    let sql = session
        .gen_sql()
        .append("INSERT INTO sql_session_note (title, pinned)")
        .append_with("VALUES (?, ?)", params_for("first", true))
        .append("RETURNING id");
    assert!(sql.text().contains("VALUES ($1, $2)"));
    let first = sql.insert().await?;
    assert_eq!(first, 1);

    let without_returning = session
        .gen_sql()
        .append_with("INSERT INTO sql_session_note (title) VALUES (?)", ["second"])
        .insert()
        .await?;
    assert_eq!(without_returning, 2);

    session.start_transaction().await?;
    session
        .run_with(
            "UPDATE sql_session_note SET title = $1 WHERE id = $2",
            &[RowValues::Text("discarded".into()), RowValues::Int(1)],
        )
        .await?;
    session.rollback().await?;

    let notes: Vec<Note> = session
        .gen_sql()
        .append("SELECT id, title, \"createdDate\", pinned FROM sql_session_note")
        .append_in("WHERE id IN (?)", [1_i64, 2])
        .append("ORDER BY id")
        .select_rows_as()
        .await?;
    assert_eq!(notes.len(), 2);
    assert_eq!(notes[0].title, "first");
    assert!(notes[0].pinned);
    assert!(!notes[1].pinned);

    let pinned = session
        .gen_sql()
        .append("SELECT pinned FROM sql_session_note")
        .append_with("WHERE id = ?", [1_i64])
        .select_boolean()
        .await?;
    assert_eq!(pinned, Some(true));

    // SUM(bigint) and AVG come back as numeric
    let sum = session
        .gen_sql()
        .append("SELECT SUM(id) FROM sql_session_note")
        .select_long()
        .await?;
    assert_eq!(sum, 3);
    let avg = session
        .gen_sql()
        .append("SELECT AVG(id) FROM sql_session_note")
        .select_long()
        .await?;
    assert_eq!(avg, 1);
    let exact = session
        .gen_sql()
        .append("SELECT CAST(12345.678 AS numeric(10, 3))")
        .select_string()
        .await?;
    assert_eq!(exact.as_deref(), Some("12345.678"));

    session.run("DROP TABLE sql_session_note").await?;
    session.close().await?;
    Ok(())
}

fn params_for(title: &str, pinned: bool) -> Vec<RowValues> {
    vec![RowValues::from(title), RowValues::from(pinned)]
}
