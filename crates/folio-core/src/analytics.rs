//! Aggregate counters and the read models built from them.
//!
//! Counters are keyed by composite strings (`home`, `item:<slug>`,
//! `out:<slug>:<url>`, `nav:<section>`). A row is created on the first event
//! for a key and only its `count` and `updated_at` change afterwards: the
//! context columns keep the values from that first event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── Events ──────────────────────────────────────────────────────────────────

/// The three counter tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum CounterTable {
  PageViews,
  OutboundClicks,
  NavClicks,
}

/// One countable event, carrying its context fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CounterEvent {
  HomeView,
  ItemView { slug: String, path: String },
  OutboundClick { slug: String, url: String, source: String },
  NavClick { section: String, href: String },
}

impl CounterEvent {
  pub fn table(&self) -> CounterTable {
    match self {
      Self::HomeView | Self::ItemView { .. } => CounterTable::PageViews,
      Self::OutboundClick { .. } => CounterTable::OutboundClicks,
      Self::NavClick { .. } => CounterTable::NavClicks,
    }
  }

  pub fn key(&self) -> String {
    match self {
      Self::HomeView => "home".to_owned(),
      Self::ItemView { slug, .. } => item_key(slug),
      Self::OutboundClick { slug, url, .. } => format!("out:{slug}:{url}"),
      Self::NavClick { section, .. } => format!("nav:{section}"),
    }
  }
}

pub fn item_key(slug: &str) -> String { format!("item:{slug}") }

/// A single counter row, without its context columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterRecord {
  pub key:        String,
  pub count:      i64,
  pub updated_at: DateTime<Utc>,
}

// ─── Read models ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopItem {
  pub slug:  String,
  /// Entry title, or the slug when the entry no longer exists.
  pub title: String,
  pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundRow {
  pub slug:   String,
  pub url:    String,
  pub source: String,
  pub count:  i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavRow {
  pub section: String,
  pub href:    String,
  pub count:   i64,
}

/// Headline numbers for the admin list view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
  pub home_views:       i64,
  pub item_views_total: i64,
  pub outbound_total:   i64,
  pub top_item:         Option<TopItem>,
}

/// The full reporting view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
  pub home_views:       i64,
  pub item_views_total: i64,
  pub top_items:        Vec<TopItem>,
  pub outbound_total:   i64,
  pub top_outbound:     Vec<OutboundRow>,
  pub nav_clicks:       Vec<NavRow>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn keys_and_tables() {
    let out = CounterEvent::OutboundClick {
      slug:   "foo".into(),
      url:    "https://x.test".into(),
      source: "card".into(),
    };
    assert_eq!(out.key(), "out:foo:https://x.test");
    assert_eq!(out.table(), CounterTable::OutboundClicks);
    assert_eq!(CounterEvent::HomeView.key(), "home");
    assert_eq!(
      CounterEvent::NavClick { section: "work".into(), href: "#work".into() }.key(),
      "nav:work"
    );
    assert_eq!(CounterTable::PageViews.to_string(), "page_views");
  }
}
