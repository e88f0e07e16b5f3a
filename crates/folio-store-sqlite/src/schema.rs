//! SQL schema and versioned migrations for the folio SQLite store.
//!
//! The schema version lives in `PRAGMA user_version`. Each [`Migration`] runs
//! at most once, inside its own transaction, when the stored version is below
//! its number. Additive column checks run on every start so databases created
//! by older deployments converge on the current column set.

use folio_core::entry::EntryKind;
use rusqlite::{Connection, Transaction};

/// Base tables; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
const BASE_TABLES: &str = "
CREATE TABLE IF NOT EXISTS projects (
    id            INTEGER PRIMARY KEY,
    slug          TEXT UNIQUE NOT NULL,
    title         TEXT NOT NULL,
    subtitle      TEXT,
    summary       TEXT,
    role          TEXT,
    timeframe     TEXT,
    tools         TEXT,
    tags          TEXT,
    hero_image    TEXT,
    body_markdown TEXT,
    published     INTEGER NOT NULL DEFAULT 0,
    created_at    TEXT NOT NULL,   -- RFC 3339 UTC; store-assigned
    updated_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS analytics_page_views (
    key        TEXT PRIMARY KEY,   -- 'home' | 'item:<slug>'
    type       TEXT NOT NULL,      -- 'home' | 'item'
    slug       TEXT,
    path       TEXT,
    count      INTEGER NOT NULL DEFAULT 0,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS analytics_outbound_clicks (
    key        TEXT PRIMARY KEY,   -- 'out:<slug>:<url>'
    slug       TEXT,
    url        TEXT NOT NULL,
    source     TEXT,
    count      INTEGER NOT NULL DEFAULT 0,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS analytics_nav_clicks (
    key        TEXT PRIMARY KEY,   -- 'nav:<section>'
    section    TEXT NOT NULL,
    href       TEXT,
    count      INTEGER NOT NULL DEFAULT 0,
    updated_at TEXT NOT NULL
);
";

const CATEGORY_TABLE: &str = "
CREATE TABLE IF NOT EXISTS other_topic_categories (
    key         TEXT PRIMARY KEY,
    label       TEXT NOT NULL,
    order_index INTEGER NOT NULL DEFAULT 0
);
";

/// Columns added after the base table shipped: `(table, column, definition)`.
const ADDED_COLUMNS: &[(&str, &str, &str)] = &[
  ("projects", "kind", "kind TEXT NOT NULL DEFAULT 'project'"),
  ("projects", "date", "date TEXT"),
  ("projects", "external_url", "external_url TEXT"),
  ("projects", "category", "category TEXT"),
];

// ─── Migrations ──────────────────────────────────────────────────────────────

/// One schema version step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Migration {
  /// Entries and the three counter tables.
  BaseTables,
  /// Mixed feed: `kind`, `date` and `external_url` columns.
  FeedColumns,
  /// Categories for "other" entries; legacy kinds are folded into `other`.
  OtherTopics,
}

impl Migration {
  pub const ALL: [Migration; 3] = [Self::BaseTables, Self::FeedColumns, Self::OtherTopics];

  pub const LATEST: i64 = Self::OtherTopics.version();

  pub const fn version(self) -> i64 {
    match self {
      Self::BaseTables => 1,
      Self::FeedColumns => 2,
      Self::OtherTopics => 3,
    }
  }

  fn apply(self, tx: &Transaction<'_>) -> rusqlite::Result<()> {
    match self {
      Self::BaseTables => tx.execute_batch(BASE_TABLES),
      Self::FeedColumns => {
        for column in ["kind", "date", "external_url"] {
          ensure_column_named(tx, "projects", column)?;
        }
        Ok(())
      }
      Self::OtherTopics => {
        ensure_column_named(tx, "projects", "category")?;
        tx.execute_batch(CATEGORY_TABLE)?;
        migrate_legacy_kinds(tx)?;
        Ok(())
      }
    }
  }
}

/// Bring the schema up to [`Migration::LATEST`]. Returns the steps applied.
pub fn migrate(conn: &mut Connection) -> rusqlite::Result<Vec<Migration>> {
  // `journal_mode` answers with a row, so it cannot go through `execute`.
  conn.query_row("PRAGMA journal_mode = WAL", [], |_| Ok(()))?;

  let current: i64 = conn.pragma_query_value(None, "user_version", |r| r.get(0))?;

  let mut applied = Vec::new();
  for step in Migration::ALL.into_iter().filter(|m| m.version() > current) {
    let tx = conn.transaction()?;
    step.apply(&tx)?;
    tx.pragma_update(None, "user_version", step.version())?;
    tx.commit()?;
    applied.push(step);
  }

  // Tables may predate versioning entirely; re-check every added column.
  for (table, column, _) in ADDED_COLUMNS {
    ensure_column_named(conn, table, column)?;
  }

  Ok(applied)
}

fn ensure_column_named(conn: &Connection, table: &str, column: &str) -> rusqlite::Result<()> {
  let definition = ADDED_COLUMNS
    .iter()
    .find(|(t, c, _)| *t == table && *c == column)
    .map(|(_, _, d)| *d)
    .ok_or_else(|| rusqlite::Error::InvalidColumnName(format!("{table}.{column}")))?;
  ensure_column(conn, table, column, definition)
}

/// Add `column` to `table` unless it already exists. Never destructive.
fn ensure_column(
  conn: &Connection,
  table: &str,
  column: &str,
  definition: &str,
) -> rusqlite::Result<()> {
  let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
  let exists = stmt
    .query_map([], |row| row.get::<_, String>(1))?
    .collect::<rusqlite::Result<Vec<_>>>()?
    .iter()
    .any(|name| name == column);

  if !exists {
    tracing::info!(table, column, "adding column");
    conn.execute_batch(&format!("ALTER TABLE {table} ADD COLUMN {definition};"))?;
  }
  Ok(())
}

/// Rewrite `writing`/`component`/`ux` entries as `other` with a derived
/// category, keeping any category an entry already had.
fn migrate_legacy_kinds(conn: &Connection) -> rusqlite::Result<usize> {
  let mut moved = 0;
  for legacy in [EntryKind::Writing, EntryKind::Component, EntryKind::Ux] {
    let Some(category) = legacy.legacy_category() else { continue };
    moved += conn.execute(
      "UPDATE projects
       SET kind = 'other', category = COALESCE(NULLIF(category, ''), ?2)
       WHERE kind = ?1",
      rusqlite::params![legacy.as_str(), category],
    )?;
  }
  if moved > 0 {
    tracing::info!(moved, "migrated legacy entry kinds to 'other'");
  }
  Ok(moved)
}
