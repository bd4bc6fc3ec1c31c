#![cfg(feature = "sqlite")]

mod common;

use common::{file_database, seed_articles};
use sql_session::prelude::*;

async fn count_articles(session: &mut Session) -> Result<i64, SqlSessionError> {
    session
        .gen_sql()
        .append("SELECT COUNT(*) FROM article")
        .select_long()
        .await
}

async fn insert_article(session: &mut Session, title: &str) -> Result<i64, SqlSessionError> {
    session
        .gen_sql()
        .append("INSERT INTO article (createdDate, modifiedDate, title, body)")
        .append_with(
            "VALUES (datetime('now'), datetime('now'), ?, ?)",
            [title, "tx body"],
        )
        .insert()
        .await
}

#[tokio::test]
async fn rollback_discards_and_commit_publishes() -> Result<(), Box<dyn std::error::Error>> {
    let db = file_database("tx_visibility");
    let mut writer = db.session();
    let mut reader = db.session();
    seed_articles(&mut writer).await?;

    writer.start_transaction().await?;
    assert_eq!(writer.state(), SessionState::InTransaction);
    insert_article(&mut writer, "rolled back").await?;
    assert_eq!(count_articles(&mut writer).await?, 7);
    assert_eq!(count_articles(&mut reader).await?, 6);
    writer.rollback().await?;
    assert_eq!(writer.state(), SessionState::Autocommit);
    assert_eq!(count_articles(&mut writer).await?, 6);

    writer.start_transaction().await?;
    insert_article(&mut writer, "committed").await?;
    assert_eq!(count_articles(&mut reader).await?, 6);
    writer.commit().await?;
    assert_eq!(writer.state(), SessionState::Autocommit);
    assert_eq!(count_articles(&mut reader).await?, 7);

    writer.close().await?;
    reader.close().await?;
    Ok(())
}

#[tokio::test]
async fn demarcation_outside_a_transaction_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::new(SqliteOptions::new(":memory:"));
    let mut session = db.session();

    let err = session.commit().await.unwrap_err();
    assert!(matches!(err, SqlSessionError::ExecutionError(_)));
    let err = session.rollback().await.unwrap_err();
    assert!(matches!(err, SqlSessionError::ExecutionError(_)));
    assert_eq!(session.state(), SessionState::Unconnected);

    session.start_transaction().await?;
    let err = session.start_transaction().await.unwrap_err();
    assert!(matches!(err, SqlSessionError::ExecutionError(_)));
    assert_eq!(session.state(), SessionState::InTransaction);

    session.rollback().await?;
    let err = session.rollback().await.unwrap_err();
    assert!(matches!(err, SqlSessionError::ExecutionError(_)));
    assert_eq!(session.state(), SessionState::Autocommit);
    Ok(())
}

#[tokio::test]
async fn rejected_commit_rolls_back() -> Result<(), Box<dyn std::error::Error>> {
    let db = file_database("tx_commit_failure");
    let mut session = db.session();
    session
        .run(
            "CREATE TABLE parent (id INTEGER PRIMARY KEY);
             CREATE TABLE child (
                 id INTEGER PRIMARY KEY,
                 parent_id INTEGER NOT NULL
                     REFERENCES parent (id) DEFERRABLE INITIALLY DEFERRED
             );",
        )
        .await?;

    session.start_transaction().await?;
    session
        .gen_sql()
        .append_with("INSERT INTO child (id, parent_id) VALUES (?, ?)", [1, 99])
        .insert()
        .await?;
    let err = session.commit().await.unwrap_err();
    assert!(matches!(err, SqlSessionError::SqliteError(_)));
    assert_eq!(session.state(), SessionState::Autocommit);

    let children = session
        .gen_sql()
        .append("SELECT COUNT(*) FROM child")
        .select_long()
        .await?;
    assert_eq!(children, 0);

    // the connection is usable for a fresh transaction afterwards
    session.start_transaction().await?;
    session.run("INSERT INTO parent (id) VALUES (99)").await?;
    session
        .gen_sql()
        .append_with("INSERT INTO child (id, parent_id) VALUES (?, ?)", [1, 99])
        .insert()
        .await?;
    session.commit().await?;
    assert_eq!(
        session.gen_sql().append("SELECT COUNT(*) FROM child").select_long().await?,
        1
    );
    Ok(())
}

#[tokio::test]
async fn close_is_idempotent_and_reconnects_lazily() -> Result<(), Box<dyn std::error::Error>> {
    let db = file_database("close");
    let mut session = db.session();

    session.close().await?;
    assert_eq!(session.state(), SessionState::Unconnected);

    session.connect().await?;
    assert_eq!(session.state(), SessionState::Autocommit);
    seed_articles(&mut session).await?;
    session.close().await?;
    session.close().await?;
    assert_eq!(session.state(), SessionState::Unconnected);

    assert_eq!(count_articles(&mut session).await?, 6);
    assert_eq!(session.state(), SessionState::Autocommit);
    Ok(())
}

#[tokio::test]
async fn close_commits_an_open_transaction() -> Result<(), Box<dyn std::error::Error>> {
    let db = file_database("close_tx");
    let mut session = db.session();
    seed_articles(&mut session).await?;

    session.start_transaction().await?;
    insert_article(&mut session, "committed on close").await?;
    session.close().await?;
    assert_eq!(session.state(), SessionState::Unconnected);

    let mut other = db.session();
    assert_eq!(count_articles(&mut other).await?, 7);
    assert_eq!(count_articles(&mut session).await?, 7);
    Ok(())
}

#[tokio::test]
async fn close_rolls_back_when_the_final_commit_fails() -> Result<(), Box<dyn std::error::Error>> {
    let db = file_database("close_tx_failure");
    let mut session = db.session();
    session
        .run(
            "CREATE TABLE parent (id INTEGER PRIMARY KEY);
             CREATE TABLE child (
                 id INTEGER PRIMARY KEY,
                 parent_id INTEGER NOT NULL
                     REFERENCES parent (id) DEFERRABLE INITIALLY DEFERRED
             );",
        )
        .await?;

    session.start_transaction().await?;
    session.run("INSERT INTO child (id, parent_id) VALUES (1, 42)").await?;
    let err = session.close().await.unwrap_err();
    assert!(matches!(err, SqlSessionError::SqliteError(_)));
    assert_eq!(session.state(), SessionState::Unconnected);

    let mut other = db.session();
    let children = other
        .gen_sql()
        .append("SELECT COUNT(*) FROM child")
        .select_long()
        .await?;
    assert_eq!(children, 0);
    Ok(())
}

#[tokio::test]
async fn failed_rollback_still_restores_autocommit() -> Result<(), Box<dyn std::error::Error>> {
    let db = file_database("rollback_failure");
    let mut session = db.session();
    seed_articles(&mut session).await?;

    session.start_transaction().await?;
    // end the transaction behind the session's back so the driver rollback fails
    session.run("COMMIT").await?;
    let err = session.rollback().await.unwrap_err();
    assert!(matches!(err, SqlSessionError::SqliteError(_)));
    assert_eq!(session.state(), SessionState::Autocommit);

    insert_article(&mut session, "autocommitted").await?;
    let mut other = db.session();
    assert_eq!(count_articles(&mut other).await?, 7);
    Ok(())
}

#[tokio::test]
async fn failed_commit_and_rollback_still_restore_autocommit()
-> Result<(), Box<dyn std::error::Error>> {
    let db = file_database("commit_rollback_failure");
    let mut session = db.session();
    seed_articles(&mut session).await?;

    session.start_transaction().await?;
    session.run("COMMIT").await?;
    let err = session.commit().await.unwrap_err();
    assert!(matches!(err, SqlSessionError::SqliteError(_)));
    assert_eq!(session.state(), SessionState::Autocommit);

    insert_article(&mut session, "autocommitted").await?;
    let mut other = db.session();
    assert_eq!(count_articles(&mut other).await?, 7);

    // a fresh transaction works on the same connection
    session.start_transaction().await?;
    insert_article(&mut session, "second").await?;
    session.commit().await?;
    assert_eq!(count_articles(&mut other).await?, 8);
    Ok(())
}

#[tokio::test]
async fn dropped_session_releases_its_transaction() -> Result<(), Box<dyn std::error::Error>> {
    let db = file_database("drop_tx");
    let mut seed = db.session();
    seed_articles(&mut seed).await?;

    {
        let mut session = db.session();
        session.start_transaction().await?;
        insert_article(&mut session, "dropped").await?;
    }

    assert_eq!(count_articles(&mut seed).await?, 6);
    insert_article(&mut seed, "after drop").await?;
    assert_eq!(count_articles(&mut seed).await?, 7);
    Ok(())
}

#[tokio::test]
async fn sessions_run_concurrently_on_their_own_connections()
-> Result<(), Box<dyn std::error::Error>> {
    let db = file_database("concurrent");
    let mut seed = db.session();
    seed_articles(&mut seed).await?;
    seed.close().await?;

    let mut handles = Vec::new();
    for i in 0..4 {
        let db = db.clone();
        handles.push(tokio::spawn(async move {
            let mut session = db.session();
            session.start_transaction().await?;
            insert_article(&mut session, &format!("task {i}")).await?;
            session.commit().await?;
            session.close().await
        }));
    }
    for handle in handles {
        handle.await??;
    }

    let mut session = db.session();
    assert_eq!(count_articles(&mut session).await?, 10);
    Ok(())
}
