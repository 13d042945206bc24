//! Embedded schema migrations.
//!
//! Scripts run in name order, each inside its own transaction, and are
//! recorded in `schema_migrations` so a script is never applied twice.

use chrono::Utc;
use rusqlite::OptionalExtension as _;

use crate::{Error, Result, encode::encode_dt};

/// `(name, sql)` pairs, sorted by name.
pub const MIGRATIONS: &[(&str, &str)] = &[
  ("0001_create_users", include_str!("../migrations/0001_create_users.sql")),
  (
    "0002_create_subscriptions",
    include_str!("../migrations/0002_create_subscriptions.sql"),
  ),
];

const BOOKKEEPING: &str = "
CREATE TABLE IF NOT EXISTS schema_migrations (
    name       TEXT PRIMARY KEY,
    applied_at TEXT NOT NULL
);
";

/// Apply every pending migration; returns the names applied by this call.
pub fn migrate(conn: &mut rusqlite::Connection) -> Result<Vec<&'static str>> {
  conn
    .execute_batch(BOOKKEEPING)
    .map_err(|source| Error::Migration { name: "schema_migrations", source })?;

  let mut applied = Vec::new();
  for &(name, sql) in MIGRATIONS {
    apply(conn, name, sql, &mut applied)
      .map_err(|source| Error::Migration { name, source })?;
  }
  Ok(applied)
}

fn apply(
  conn: &mut rusqlite::Connection,
  name: &'static str,
  sql: &str,
  applied: &mut Vec<&'static str>,
) -> rusqlite::Result<()> {
  let tx = conn.transaction()?;
  let done = tx
    .query_row(
      "SELECT 1 FROM schema_migrations WHERE name = ?1",
      rusqlite::params![name],
      |_| Ok(()),
    )
    .optional()?
    .is_some();
  if done {
    return Ok(());
  }

  tx.execute_batch(sql)?;
  tx.execute(
    "INSERT INTO schema_migrations (name, applied_at) VALUES (?1, ?2)",
    rusqlite::params![name, encode_dt(Utc::now())],
  )?;
  tx.commit()?;
  applied.push(name);
  Ok(())
}
