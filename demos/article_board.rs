//! A tiny article board on top of `sql-session`.
//!
//! ```bash
//! cargo run --example article_board -- --db-path board.db seed
//! cargo run --example article_board -- --db-path board.db --dev-mode list
//! cargo run --example article_board -- --db-path board.db add "hello" "first post"
//! cargo run --example article_board -- --db-path board.db blind 2 3
//! cargo run --example article_board -- --db-path board.db show 1
//! ```

use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use sql_session::prelude::*;

sql_session::record! {
    #[derive(Debug, Default)]
    struct Article {
        id: i64,
        title: String,
        body: String,
        created_date: NaiveDateTime => "createdDate",
        modified_date: NaiveDateTime => "modifiedDate",
        is_blind: bool => "isBlind",
    }
}

#[derive(Parser)]
#[command(name = "article-board", about = "Manage a small article table")]
struct BoardArgs {
    /// Backend to connect to
    #[arg(long, value_enum, default_value = "sqlite")]
    backend: DatabaseType,

    /// SQLite database file
    #[arg(long, default_value = "article_board.db")]
    db_path: String,

    /// JSON connection options (`{"backend": "postgres", "host": ...}`); overrides
    /// `--backend` and `--db-path`
    #[arg(long)]
    options_json: Option<String>,

    /// Log every statement with its parameters
    #[arg(long)]
    dev_mode: bool,

    #[command(subcommand)]
    command: BoardCommand,
}

#[derive(Subcommand)]
enum BoardCommand {
    /// Recreate the table with six sample articles
    Seed,
    /// List visible articles, newest first
    List {
        #[arg(long)]
        include_blind: bool,
    },
    /// Show one article
    Show { id: i64 },
    /// Add an article
    Add { title: String, body: String },
    /// Hide articles from the default listing
    Blind { ids: Vec<i64> },
}

fn connect_options(args: &BoardArgs) -> Result<ConnectOptions, Box<dyn std::error::Error>> {
    if let Some(json) = &args.options_json {
        return Ok(serde_json::from_str(json)?);
    }
    match args.backend {
        DatabaseType::Sqlite => Ok(SqliteOptions::new(args.db_path.clone()).into()),
        #[allow(unreachable_patterns)]
        other => Err(format!("{other:?} needs --options-json").into()),
    }
}

async fn seed(session: &mut Session) -> Result<(), SqlSessionError> {
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
    session.start_transaction().await?;
    for i in 1..=6 {
        let inserted = session
            .gen_sql()
            .append("INSERT INTO article (createdDate, modifiedDate, title, body, isBlind)")
            .append_with(
                "VALUES (datetime('now'), datetime('now'), ?, ?, ?)",
                sql_session::params![format!("title {i}"), format!("body {i}"), i > 3],
            )
            .insert()
            .await;
        if let Err(err) = inserted {
            session.rollback().await?;
            return Err(err);
        }
    }
    session.commit().await
}

fn print_article(article: &Article) {
    println!(
        "#{:<4} {:<24} {}{}  (created {}, modified {})",
        article.id,
        article.title,
        article.body,
        if article.is_blind { " [blind]" } else { "" },
        article.created_date,
        article.modified_date,
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = BoardArgs::parse();
    tracing_subscriber::fmt()
        .with_max_level(if args.dev_mode {
            tracing::Level::INFO
        } else {
            tracing::Level::WARN
        })
        .init();

    let db = Database::new(connect_options(&args)?).with_dev_mode(args.dev_mode);
    let mut session = db.session();

    match args.command {
        BoardCommand::Seed => {
            seed(&mut session).await?;
            println!("seeded 6 articles");
        }
        BoardCommand::List { include_blind } => {
            let mut sql = session
                .gen_sql()
                .append("SELECT * FROM article");
            if !include_blind {
                sql = sql.append_with("WHERE isBlind = ?", [false]);
            }
            let articles: Vec<Article> = sql.append("ORDER BY id DESC").select_rows_as().await?;
            articles.iter().for_each(print_article);
        }
        BoardCommand::Show { id } => {
            let article: Option<Article> = session
                .gen_sql()
                .append("SELECT * FROM article")
                .append_with("WHERE id = ?", [id])
                .select_row_as()
                .await?;
            match article {
                Some(article) => print_article(&article),
                None => println!("no article #{id}"),
            }
        }
        BoardCommand::Add { title, body } => {
            let id = session
                .gen_sql()
                .append("INSERT INTO article (createdDate, modifiedDate, title, body)")
                .append_with(
                    "VALUES (datetime('now'), datetime('now'), ?, ?)",
                    [title, body],
                )
                .insert()
                .await?;
            println!("added article #{id}");
        }
        BoardCommand::Blind { ids } => {
            let updated = session
                .gen_sql()
                .append("UPDATE article")
                .append_with("SET isBlind = ?, modifiedDate = datetime('now')", [true])
                .append_in("WHERE id IN (?)", ids)
                .update()
                .await?;
            println!("blinded {updated} article(s)");
        }
    }

    session.close().await?;
    Ok(())
}
