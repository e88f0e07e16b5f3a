//! The `ContentStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `folio-store-sqlite`).
//! The web layer depends on this abstraction, not on any concrete backend.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::{
  analytics::{CounterEvent, CounterRecord, CounterTable, DashboardStats, Report},
  category::Category,
  entry::{Entry, EntryInput, EntryKind},
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Parameters for [`ContentStore::list_entries`].
///
/// Results are ordered by display date, falling back to `updated_at` then
/// `created_at`, newest first.
#[derive(Debug, Clone, Default)]
pub struct EntryQuery {
  /// `None` means every kind.
  pub kind:      Option<EntryKind>,
  /// Exact category key (only meaningful together with `Other`).
  pub category:  Option<String>,
  /// Case-insensitive substring match over title and slug.
  pub text:      Option<String>,
  pub published: Option<bool>,
  pub limit:     Option<usize>,
}

impl EntryQuery {
  /// Published entries of one kind.
  pub fn published(kind: EntryKind) -> Self {
    Self { kind: Some(kind), published: Some(true), ..Default::default() }
  }

  pub fn limit(mut self, limit: usize) -> Self {
    self.limit = Some(limit);
    self
  }
}

/// Published/draft/total counts for one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindCount {
  pub kind:      EntryKind,
  pub published: i64,
  pub draft:     i64,
  pub total:     i64,
}

/// Sum a set of per-kind counts into `(published, draft, total)`.
pub fn count_totals(counts: &[KindCount]) -> (i64, i64, i64) {
  counts.iter().fold((0, 0, 0), |(p, d, t), c| {
    (p + c.published, d + c.draft, t + c.total)
  })
}

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Backend errors expose the domain error they wrap, if any, so callers can
/// tell a rejected request apart from a storage fault.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn as_core(&self) -> Option<&crate::Error>;
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a folio content store backend.
///
/// The store sets `created_at` and `updated_at`; callers never supply them.
pub trait ContentStore: Send + Sync {
  type Error: StoreError;

  // ── Entries: reads ────────────────────────────────────────────────────

  /// Retrieve an entry by numeric id. Returns `None` if not found.
  fn get_entry(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Entry>, Self::Error>> + Send + '_;

  /// Retrieve an entry by slug. Returns `None` if not found.
  fn get_entry_by_slug<'a>(
    &'a self,
    slug: &'a str,
  ) -> impl Future<Output = Result<Option<Entry>, Self::Error>> + Send + 'a;

  fn list_entries<'a>(
    &'a self,
    query: &'a EntryQuery,
  ) -> impl Future<Output = Result<Vec<Entry>, Self::Error>> + Send + 'a;

  // ── Entries: writes ───────────────────────────────────────────────────

  /// Insert a new entry. Fails with [`Error::SlugTaken`](crate::Error) if the
  /// slug already exists; the existing row is left untouched.
  fn create_entry(
    &self,
    input: EntryInput,
  ) -> impl Future<Output = Result<Entry, Self::Error>> + Send + '_;

  /// Overwrite every input field of entry `id` (hero image excluded).
  ///
  /// Fails with `EntryNotFound` or, when renaming onto another entry's slug,
  /// `SlugTaken`.
  fn update_entry(
    &self,
    id: i64,
    input: EntryInput,
  ) -> impl Future<Output = Result<Entry, Self::Error>> + Send + '_;

  /// Insert when the slug is unknown, otherwise overwrite the entry with
  /// that slug.
  fn upsert_entry(
    &self,
    input: EntryInput,
  ) -> impl Future<Output = Result<Entry, Self::Error>> + Send + '_;

  fn set_published(
    &self,
    id: i64,
    published: bool,
  ) -> impl Future<Output = Result<Entry, Self::Error>> + Send + '_;

  /// Flip the published flag in place.
  fn toggle_published(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Entry, Self::Error>> + Send + '_;

  /// Remove the entry row. Returns `false` when nothing was deleted.
  ///
  /// Uploaded hero files are not touched; that is the caller's job.
  fn delete_entry(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Set (`Some`) or clear (`None`) the hero image URL.
  fn set_hero_image(
    &self,
    id: i64,
    url: Option<String>,
  ) -> impl Future<Output = Result<Entry, Self::Error>> + Send + '_;

  // ── Categories ────────────────────────────────────────────────────────

  /// All categories, ordered by `order_index` then label.
  fn list_categories(
    &self,
  ) -> impl Future<Output = Result<Vec<Category>, Self::Error>> + Send + '_;

  // ── Aggregates ────────────────────────────────────────────────────────

  fn entry_counts(
    &self,
  ) -> impl Future<Output = Result<Vec<KindCount>, Self::Error>> + Send + '_;

  /// Published `Other` entries per category key (`None` for uncategorised).
  fn category_counts(
    &self,
  ) -> impl Future<Output = Result<Vec<(Option<String>, i64)>, Self::Error>> + Send + '_;

  // ── Counters ──────────────────────────────────────────────────────────

  /// Create the counter row with `count = 1`, or bump an existing one.
  fn increment_counter(
    &self,
    event: CounterEvent,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_counter<'a>(
    &'a self,
    table: CounterTable,
    key: &'a str,
  ) -> impl Future<Output = Result<Option<CounterRecord>, Self::Error>> + Send + 'a;

  fn dashboard_stats(
    &self,
  ) -> impl Future<Output = Result<DashboardStats, Self::Error>> + Send + '_;

  fn report(&self) -> impl Future<Output = Result<Report, Self::Error>> + Send + '_;
}
