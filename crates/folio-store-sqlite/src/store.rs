//! [`SqliteStore`], the SQLite implementation of [`ContentStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{OptionalExtension as _, types::Value};

use folio_core::{
  analytics::{
    CounterEvent, CounterRecord, CounterTable, DashboardStats, NavRow, OutboundRow, Report,
    TopItem,
  },
  category::Category,
  entry::{Entry, EntryInput},
  store::{ContentStore, EntryQuery, KindCount},
};

use crate::{
  Error, Result,
  encode::{
    ENTRY_COLUMNS, RawEntry, category_from_row, counter_table_name, decode_dt, decode_kind,
    encode_dt,
  },
  schema, seed,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A folio content store backed by a single SQLite file.
///
/// The inner connection is reference-counted; clones share it.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

/// Outcome of a write that can collide with the slug constraint.
enum Write<T> {
  Done(T),
  SlugTaken,
  Missing,
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(f, _)
      if f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
  )
}

fn select_entry_by_id(conn: &rusqlite::Connection, id: i64) -> rusqlite::Result<Option<RawEntry>> {
  conn
    .query_row(
      &format!("SELECT {ENTRY_COLUMNS} FROM projects WHERE id = ?1"),
      rusqlite::params![id],
      RawEntry::from_row,
    )
    .optional()
}

fn select_entry_by_slug(
  conn: &rusqlite::Connection,
  slug: &str,
) -> rusqlite::Result<Option<RawEntry>> {
  conn
    .query_row(
      &format!("SELECT {ENTRY_COLUMNS} FROM projects WHERE slug = ?1"),
      rusqlite::params![slug],
      RawEntry::from_row,
    )
    .optional()
}

impl SqliteStore {
  /// Open (or create) a store at `path`, migrate it, and seed it when empty.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.initialize(true).await?;
    Ok(store)
  }

  /// Open an in-memory store, seeded like a fresh file.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.initialize(true).await?;
    Ok(store)
  }

  /// Open an in-memory store with categories but no example entries;
  /// useful for testing.
  pub async fn open_in_memory_empty() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.initialize(false).await?;
    Ok(store)
  }

  /// Idempotent schema setup: migrations, additive columns, seeds.
  async fn initialize(&self, seed_examples: bool) -> Result<()> {
    let now = encode_dt(Utc::now());
    let (applied, seeded) = self
      .conn
      .call(move |conn| {
        let applied = schema::migrate(conn)?;
        seed::seed_categories(conn)?;
        let seeded = if seed_examples { seed::seed_entries(conn, &now)? } else { 0 };
        Ok((applied, seeded))
      })
      .await?;

    if !applied.is_empty() {
      tracing::info!(?applied, "applied schema migrations");
    }
    tracing::debug!(seeded, "store initialised");
    Ok(())
  }

  /// The schema version recorded in the database.
  pub async fn schema_version(&self) -> Result<i64> {
    Ok(
      self
        .conn
        .call(|conn| Ok(conn.pragma_query_value(None, "user_version", |r| r.get(0))?))
        .await?,
    )
  }

  /// Run a single-row mutation followed by a read-back of the entry.
  async fn mutate_entry(
    &self,
    id: i64,
    sql: &'static str,
    params: Vec<Value>,
  ) -> Result<Entry> {
    let raw = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(sql, rusqlite::params_from_iter(params.iter()))?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(select_entry_by_id(conn, id)?)
      })
      .await?;

    raw
      .ok_or(Error::Core(folio_core::Error::EntryNotFound(id)))?
      .into_entry()
  }
}

fn input_params(input: &EntryInput) -> Vec<Value> {
  vec![
    Value::Text(input.slug.clone()),
    Value::Text(input.title.clone()),
    Value::Text(input.subtitle.clone()),
    Value::Text(input.summary.clone()),
    Value::Text(input.role.clone()),
    Value::Text(input.timeframe.clone()),
    Value::Text(input.tools.clone()),
    Value::Text(input.tags.clone()),
    Value::Text(input.external_url.clone()),
    Value::Text(input.body_markdown.clone()),
    Value::Integer(i64::from(input.published)),
    Value::Text(input.kind.as_str().to_owned()),
    input.category.clone().map_or(Value::Null, Value::Text),
    input.date.clone().map_or(Value::Null, Value::Text),
  ]
}

/// Make `%`, `_` and `\` match literally under `LIKE .. ESCAPE '\'`.
fn escape_like(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  for c in text.chars() {
    if matches!(c, '%' | '_' | '\\') {
      out.push('\\');
    }
    out.push(c);
  }
  out
}

// ─── ContentStore impl ───────────────────────────────────────────────────────

impl ContentStore for SqliteStore {
  type Error = Error;

  // ── Entries: reads ────────────────────────────────────────────────────────

  async fn get_entry(&self, id: i64) -> Result<Option<Entry>> {
    let raw = self
      .conn
      .call(move |conn| Ok(select_entry_by_id(conn, id)?))
      .await?;
    raw.map(RawEntry::into_entry).transpose()
  }

  async fn get_entry_by_slug(&self, slug: &str) -> Result<Option<Entry>> {
    let slug = slug.to_owned();
    let raw = self
      .conn
      .call(move |conn| Ok(select_entry_by_slug(conn, &slug)?))
      .await?;
    raw.map(RawEntry::into_entry).transpose()
  }

  async fn list_entries(&self, query: &EntryQuery) -> Result<Vec<Entry>> {
    // Build WHERE clause dynamically.
    let mut conds: Vec<&'static str> = vec![];
    let mut params: Vec<Value> = vec![];

    if let Some(kind) = query.kind {
      conds.push("kind = ?");
      params.push(Value::Text(kind.as_str().to_owned()));
    }
    if let Some(category) = &query.category {
      conds.push("category = ?");
      params.push(Value::Text(category.clone()));
    }
    if let Some(text) = query.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
      conds.push("(title LIKE ? ESCAPE '\\' OR slug LIKE ? ESCAPE '\\')");
      let pattern = format!("%{}%", escape_like(text));
      params.push(Value::Text(pattern.clone()));
      params.push(Value::Text(pattern));
    }
    if let Some(published) = query.published {
      conds.push("published = ?");
      params.push(Value::Integer(i64::from(published)));
    }

    let where_clause = if conds.is_empty() {
      String::new()
    } else {
      format!("WHERE {}", conds.join(" AND "))
    };
    let limit = query.limit.map(|l| l as i64).unwrap_or(-1);
    params.push(Value::Integer(limit));

    let sql = format!(
      "SELECT {ENTRY_COLUMNS}
       FROM projects
       {where_clause}
       ORDER BY COALESCE(date, updated_at, created_at) DESC, id DESC
       LIMIT ?"
    );

    let raws: Vec<RawEntry> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params.iter()), RawEntry::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEntry::into_entry).collect()
  }

  // ── Entries: writes ───────────────────────────────────────────────────────

  async fn create_entry(&self, input: EntryInput) -> Result<Entry> {
    let slug = input.slug.clone();
    let mut params = input_params(&input);
    params.push(Value::Text(encode_dt(Utc::now())));

    let outcome = self
      .conn
      .call(move |conn| {
        let inserted = conn.execute(
          "INSERT INTO projects (
             slug, title, subtitle, summary, role, timeframe, tools, tags,
             external_url, body_markdown, published, kind, category, date,
             hero_image, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, '', ?15, ?15)",
          rusqlite::params_from_iter(params.iter()),
        );
        match inserted {
          Ok(_) => {
            let id = conn.last_insert_rowid();
            Ok(match select_entry_by_id(conn, id)? {
              Some(raw) => Write::Done(raw),
              None => Write::Missing,
            })
          }
          Err(e) if is_unique_violation(&e) => Ok(Write::SlugTaken),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    match outcome {
      Write::Done(raw) => raw.into_entry(),
      Write::SlugTaken => Err(folio_core::Error::SlugTaken(slug).into()),
      Write::Missing => Err(Error::ReadBack(slug)),
    }
  }

  async fn update_entry(&self, id: i64, input: EntryInput) -> Result<Entry> {
    let slug = input.slug.clone();
    let mut params = input_params(&input);
    params.push(Value::Text(encode_dt(Utc::now())));
    params.push(Value::Integer(id));

    let outcome = self
      .conn
      .call(move |conn| {
        let updated = conn.execute(
          "UPDATE projects SET
             slug = ?1, title = ?2, subtitle = ?3, summary = ?4, role = ?5,
             timeframe = ?6, tools = ?7, tags = ?8, external_url = ?9,
             body_markdown = ?10, published = ?11, kind = ?12, category = ?13,
             date = ?14, updated_at = ?15
           WHERE id = ?16",
          rusqlite::params_from_iter(params.iter()),
        );
        match updated {
          Ok(0) => Ok(Write::Missing),
          Ok(_) => Ok(match select_entry_by_id(conn, id)? {
            Some(raw) => Write::Done(raw),
            None => Write::Missing,
          }),
          Err(e) if is_unique_violation(&e) => Ok(Write::SlugTaken),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    match outcome {
      Write::Done(raw) => raw.into_entry(),
      Write::SlugTaken => Err(folio_core::Error::SlugTaken(slug).into()),
      Write::Missing => Err(folio_core::Error::EntryNotFound(id).into()),
    }
  }

  async fn upsert_entry(&self, input: EntryInput) -> Result<Entry> {
    let slug = input.slug.clone();
    let mut params = input_params(&input);
    params.push(Value::Text(encode_dt(Utc::now())));

    let raw = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO projects (
             slug, title, subtitle, summary, role, timeframe, tools, tags,
             external_url, body_markdown, published, kind, category, date,
             hero_image, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, '', ?15, ?15)
           ON CONFLICT(slug) DO UPDATE SET
             title = excluded.title, subtitle = excluded.subtitle,
             summary = excluded.summary, role = excluded.role,
             timeframe = excluded.timeframe, tools = excluded.tools,
             tags = excluded.tags, external_url = excluded.external_url,
             body_markdown = excluded.body_markdown, published = excluded.published,
             kind = excluded.kind, category = excluded.category, date = excluded.date,
             updated_at = excluded.updated_at",
          rusqlite::params_from_iter(params.iter()),
        )?;
        Ok(select_entry_by_slug(conn, &slug)?)
      })
      .await?;

    raw.ok_or(Error::ReadBack(input.slug))?.into_entry()
  }

  async fn set_published(&self, id: i64, published: bool) -> Result<Entry> {
    self
      .mutate_entry(
        id,
        "UPDATE projects SET published = ?1, updated_at = ?2 WHERE id = ?3",
        vec![
          Value::Integer(i64::from(published)),
          Value::Text(encode_dt(Utc::now())),
          Value::Integer(id),
        ],
      )
      .await
  }

  async fn toggle_published(&self, id: i64) -> Result<Entry> {
    self
      .mutate_entry(
        id,
        "UPDATE projects
         SET published = CASE WHEN published = 1 THEN 0 ELSE 1 END, updated_at = ?1
         WHERE id = ?2",
        vec![Value::Text(encode_dt(Utc::now())), Value::Integer(id)],
      )
      .await
  }

  async fn delete_entry(&self, id: i64) -> Result<bool> {
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM projects WHERE id = ?1", rusqlite::params![id])?)
      })
      .await?;
    Ok(deleted > 0)
  }

  async fn set_hero_image(&self, id: i64, url: Option<String>) -> Result<Entry> {
    self
      .mutate_entry(
        id,
        "UPDATE projects SET hero_image = ?1, updated_at = ?2 WHERE id = ?3",
        vec![
          Value::Text(url.unwrap_or_default()),
          Value::Text(encode_dt(Utc::now())),
          Value::Integer(id),
        ],
      )
      .await
  }

  // ── Categories ────────────────────────────────────────────────────────────

  async fn list_categories(&self) -> Result<Vec<Category>> {
    Ok(
      self
        .conn
        .call(|conn| {
          let mut stmt = conn.prepare(
            "SELECT key, label, order_index
             FROM other_topic_categories
             ORDER BY order_index ASC, label ASC",
          )?;
          let rows = stmt
            .query_map([], category_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          Ok(rows)
        })
        .await?,
    )
  }

  // ── Aggregates ────────────────────────────────────────────────────────────

  async fn entry_counts(&self) -> Result<Vec<KindCount>> {
    let rows: Vec<(String, i64, i64, i64)> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT kind,
                  SUM(CASE WHEN published = 1 THEN 1 ELSE 0 END),
                  SUM(CASE WHEN published = 0 THEN 1 ELSE 0 END),
                  COUNT(*)
           FROM projects
           GROUP BY kind
           ORDER BY kind",
        )?;
        let rows = stmt
          .query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    rows
      .into_iter()
      .map(|(kind, published, draft, total)| {
        Ok(KindCount { kind: decode_kind(&kind)?, published, draft, total })
      })
      .collect()
  }

  async fn category_counts(&self) -> Result<Vec<(Option<String>, i64)>> {
    Ok(
      self
        .conn
        .call(|conn| {
          let mut stmt = conn.prepare(
            "SELECT NULLIF(category, ''), COUNT(*)
             FROM projects
             WHERE published = 1 AND kind = 'other'
             GROUP BY NULLIF(category, '')",
          )?;
          let rows = stmt
            .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          Ok(rows)
        })
        .await?,
    )
  }

  // ── Counters ──────────────────────────────────────────────────────────────

  async fn increment_counter(&self, event: CounterEvent) -> Result<()> {
    let key = event.key();
    let now = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        // Context columns are written on first insert only.
        match event {
          CounterEvent::HomeView => conn.execute(
            "INSERT INTO analytics_page_views (key, type, slug, path, count, updated_at)
             VALUES (?1, 'home', NULL, '/', 1, ?2)
             ON CONFLICT(key) DO UPDATE SET
               count = count + 1, updated_at = excluded.updated_at",
            rusqlite::params![key, now],
          )?,
          CounterEvent::ItemView { slug, path } => conn.execute(
            "INSERT INTO analytics_page_views (key, type, slug, path, count, updated_at)
             VALUES (?1, 'item', ?2, ?3, 1, ?4)
             ON CONFLICT(key) DO UPDATE SET
               count = count + 1, updated_at = excluded.updated_at",
            rusqlite::params![key, slug, path, now],
          )?,
          CounterEvent::OutboundClick { slug, url, source } => conn.execute(
            "INSERT INTO analytics_outbound_clicks (key, slug, url, source, count, updated_at)
             VALUES (?1, ?2, ?3, ?4, 1, ?5)
             ON CONFLICT(key) DO UPDATE SET
               count = count + 1, updated_at = excluded.updated_at",
            rusqlite::params![key, slug, url, source, now],
          )?,
          CounterEvent::NavClick { section, href } => conn.execute(
            "INSERT INTO analytics_nav_clicks (key, section, href, count, updated_at)
             VALUES (?1, ?2, ?3, 1, ?4)
             ON CONFLICT(key) DO UPDATE SET
               count = count + 1, updated_at = excluded.updated_at",
            rusqlite::params![key, section, href, now],
          )?,
        };
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_counter(&self, table: CounterTable, key: &str) -> Result<Option<CounterRecord>> {
    let sql = format!(
      "SELECT key, count, updated_at FROM {} WHERE key = ?1",
      counter_table_name(table)
    );
    let key = key.to_owned();

    let raw: Option<(String, i64, String)> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![key], |r| {
              Ok((r.get(0)?, r.get(1)?, r.get(2)?))
            })
            .optional()?,
        )
      })
      .await?;

    raw
      .map(|(key, count, updated_at)| {
        Ok(CounterRecord { key, count, updated_at: decode_dt(&updated_at)? })
      })
      .transpose()
  }

  async fn dashboard_stats(&self) -> Result<DashboardStats> {
    Ok(
      self
        .conn
        .call(|conn| {
          let totals = read_totals(conn)?;
          let top_item = read_top_items(conn, 1)?.into_iter().next();
          Ok(DashboardStats {
            home_views: totals.home_views,
            item_views_total: totals.item_views_total,
            outbound_total: totals.outbound_total,
            top_item,
          })
        })
        .await?,
    )
  }

  async fn report(&self) -> Result<Report> {
    Ok(
      self
        .conn
        .call(|conn| {
          let totals = read_totals(conn)?;
          let top_items = read_top_items(conn, 10)?;

          let mut stmt = conn.prepare(
            "SELECT COALESCE(slug, ''), url, COALESCE(source, ''), count
             FROM analytics_outbound_clicks
             ORDER BY count DESC
             LIMIT 10",
          )?;
          let top_outbound = stmt
            .query_map([], |r| {
              Ok(OutboundRow {
                slug:   r.get(0)?,
                url:    r.get(1)?,
                source: r.get(2)?,
                count:  r.get(3)?,
              })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

          let mut stmt = conn.prepare(
            "SELECT section, COALESCE(href, ''), count
             FROM analytics_nav_clicks
             ORDER BY count DESC",
          )?;
          let nav_clicks = stmt
            .query_map([], |r| {
              Ok(NavRow { section: r.get(0)?, href: r.get(1)?, count: r.get(2)? })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

          Ok(Report {
            home_views: totals.home_views,
            item_views_total: totals.item_views_total,
            top_items,
            outbound_total: totals.outbound_total,
            top_outbound,
            nav_clicks,
          })
        })
        .await?,
    )
  }
}

// ─── Report helpers ──────────────────────────────────────────────────────────

struct Totals {
  home_views:       i64,
  item_views_total: i64,
  outbound_total:   i64,
}

fn read_totals(conn: &rusqlite::Connection) -> rusqlite::Result<Totals> {
  let home_views = conn
    .query_row("SELECT count FROM analytics_page_views WHERE key = 'home'", [], |r| {
      r.get(0)
    })
    .optional()?
    .unwrap_or(0);
  let item_views_total = conn.query_row(
    "SELECT COALESCE(SUM(count), 0) FROM analytics_page_views WHERE type = 'item'",
    [],
    |r| r.get(0),
  )?;
  let outbound_total = conn.query_row(
    "SELECT COALESCE(SUM(count), 0) FROM analytics_outbound_clicks",
    [],
    |r| r.get(0),
  )?;
  Ok(Totals { home_views, item_views_total, outbound_total })
}

fn read_top_items(conn: &rusqlite::Connection, limit: i64) -> rusqlite::Result<Vec<TopItem>> {
  let mut stmt = conn.prepare(
    "SELECT pv.slug, COALESCE(p.title, pv.slug), pv.count
     FROM analytics_page_views pv
     LEFT JOIN projects p ON p.slug = pv.slug
     WHERE pv.type = 'item'
     ORDER BY pv.count DESC, pv.key ASC
     LIMIT ?1",
  )?;
  stmt
    .query_map(rusqlite::params![limit], |r| {
      Ok(TopItem { slug: r.get(0)?, title: r.get(1)?, count: r.get(2)? })
    })?
    .collect()
}
