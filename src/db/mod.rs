pub mod migrations;
pub mod queries;

use std::sync::{Arc, Mutex};

use anyhow::Context;
use rusqlite::Connection;

pub type SharedConnection = Arc<Mutex<Connection>>;

pub fn init_db(path: &str) -> anyhow::Result<Connection> {
    let conn = Connection::open(path)
        .with_context(|| format!("failed to open database at {path}"))?;

    conn.execute_batch("PRAGMA journal_mode=WAL;")
        .context("failed to set database pragmas")?;

    let applied = migrations::run_migrations(&conn)?;
    tracing::debug!(path, applied, "database ready");

    Ok(conn)
}

pub fn init_shared(path: &str) -> anyhow::Result<SharedConnection> {
    Ok(Arc::new(Mutex::new(init_db(path)?)))
}
