//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 UTC strings with a fixed microsecond
//! precision, so lexical order matches chronological order. Kinds are stored
//! as their lowercase names.

use chrono::{DateTime, SecondsFormat, Utc};
use folio_core::{
  analytics::CounterTable,
  category::Category,
  entry::{Entry, EntryKind},
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Micros, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── EntryKind ───────────────────────────────────────────────────────────────

pub fn decode_kind(s: &str) -> Result<EntryKind> {
  s.parse()
    .map_err(|_| folio_core::Error::UnknownKind(s.to_owned()).into())
}

// ─── CounterTable ────────────────────────────────────────────────────────────

pub fn counter_table_name(t: CounterTable) -> &'static str {
  match t {
    CounterTable::PageViews => "analytics_page_views",
    CounterTable::OutboundClicks => "analytics_outbound_clicks",
    CounterTable::NavClicks => "analytics_nav_clicks",
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawEntry::from_row`].
pub const ENTRY_COLUMNS: &str = "id, slug, title, subtitle, summary, role, timeframe, tools, \
                                 tags, hero_image, external_url, body_markdown, published, \
                                 kind, category, date, created_at, updated_at";

/// Raw values read directly from a `projects` row.
///
/// Text columns are nullable in databases created by older deployments.
pub struct RawEntry {
  pub id:            i64,
  pub slug:          String,
  pub title:         String,
  pub subtitle:      Option<String>,
  pub summary:       Option<String>,
  pub role:          Option<String>,
  pub timeframe:     Option<String>,
  pub tools:         Option<String>,
  pub tags:          Option<String>,
  pub hero_image:    Option<String>,
  pub external_url:  Option<String>,
  pub body_markdown: Option<String>,
  pub published:     i64,
  pub kind:          Option<String>,
  pub category:      Option<String>,
  pub date:          Option<String>,
  pub created_at:    String,
  pub updated_at:    String,
}

impl RawEntry {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      slug:          row.get(1)?,
      title:         row.get(2)?,
      subtitle:      row.get(3)?,
      summary:       row.get(4)?,
      role:          row.get(5)?,
      timeframe:     row.get(6)?,
      tools:         row.get(7)?,
      tags:          row.get(8)?,
      hero_image:    row.get(9)?,
      external_url:  row.get(10)?,
      body_markdown: row.get(11)?,
      published:     row.get(12)?,
      kind:          row.get(13)?,
      category:      row.get(14)?,
      date:          row.get(15)?,
      created_at:    row.get(16)?,
      updated_at:    row.get(17)?,
    })
  }

  pub fn into_entry(self) -> Result<Entry> {
    let kind = match self.kind.as_deref() {
      None | Some("") => EntryKind::Project,
      Some(k) => decode_kind(k)?,
    };

    Ok(Entry {
      id: self.id,
      slug: self.slug,
      title: self.title,
      subtitle: self.subtitle.unwrap_or_default(),
      summary: self.summary.unwrap_or_default(),
      role: self.role.unwrap_or_default(),
      timeframe: self.timeframe.unwrap_or_default(),
      tools: self.tools.unwrap_or_default(),
      tags: self.tags.unwrap_or_default(),
      hero_image: self.hero_image.unwrap_or_default(),
      external_url: self.external_url.unwrap_or_default(),
      body_markdown: self.body_markdown.unwrap_or_default(),
      published: self.published != 0,
      kind,
      category: self.category.filter(|c| !c.is_empty()),
      date: self.date.filter(|d| !d.is_empty()),
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

pub fn category_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Category> {
  Ok(Category {
    key:         row.get(0)?,
    label:       row.get(1)?,
    order_index: row.get(2)?,
  })
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn timestamps_sort_lexically() {
    let a = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
    let b = a + chrono::Duration::microseconds(1);
    assert!(encode_dt(a) < encode_dt(b));
    assert_eq!(decode_dt(&encode_dt(b)).unwrap(), b);
  }

  #[test]
  fn legacy_kinds_still_decode() {
    assert_eq!(decode_kind("ux").unwrap(), EntryKind::Ux);
    assert!(decode_kind("podcast").is_err());
  }
}
