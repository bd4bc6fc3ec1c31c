#![allow(dead_code)]

use chrono::NaiveDateTime;
use sql_session::params;
use sql_session::prelude::*;
use tempfile::tempdir;

sql_session::record! {
    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct Article {
        pub id: i64,
        pub title: String,
        pub body: String,
        pub created_date: NaiveDateTime => "createdDate",
        pub modified_date: NaiveDateTime => "modifiedDate",
        pub is_blind: bool => "isBlind",
    }
}

pub fn unique_db_path(prefix: &str) -> String {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join(format!("{prefix}.db"));
    // Leak the tempdir so the file outlives every session of the test.
    std::mem::forget(dir);
    path.to_string_lossy().into_owned()
}

pub fn file_database(prefix: &str) -> Database {
    Database::new(SqliteOptions::new(unique_db_path(prefix)))
}

/// Create the article table and insert `title 1..=6`; articles 1-3 are visible,
/// 4-6 are blinded.
pub async fn seed_articles(session: &mut Session) -> Result<(), SqlSessionError> {
    session
        .run(
            "DROP TABLE IF EXISTS article;
             CREATE TABLE article (
                 id INTEGER PRIMARY KEY AUTOINCREMENT,
                 createdDate TEXT NOT NULL,
                 modifiedDate TEXT NOT NULL,
                 title TEXT NOT NULL,
                 body TEXT NOT NULL,
                 isBlind INTEGER NOT NULL DEFAULT 0
             );",
        )
        .await?;
    for i in 1..=6 {
        session
            .gen_sql()
            .append("INSERT INTO article (createdDate, modifiedDate, title, body, isBlind)")
            .append_with(
                "VALUES (datetime('now'), datetime('now'), ?, ?, ?)",
                params![format!("title {i}"), format!("body {i}"), i > 3],
            )
            .insert()
            .await?;
    }
    Ok(())
}
