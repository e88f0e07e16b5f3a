//! Integration tests for `SqliteStore` against in-memory and temp-file
//! databases.

use std::time::Duration;

use folio_core::{
  analytics::{CounterEvent, CounterTable},
  entry::{EntryInput, EntryKind},
  store::{ContentStore, EntryQuery, StoreError as _, count_totals},
};

use crate::{Error, Migration, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory_empty()
    .await
    .expect("in-memory store")
}

fn input(slug: &str, kind: EntryKind) -> EntryInput {
  EntryInput::new(slug, format!("Title of {slug}"), kind)
}

async fn tick() { tokio::time::sleep(Duration::from_millis(2)).await; }

// ─── Initialisation ──────────────────────────────────────────────────────────

#[tokio::test]
async fn fresh_store_is_seeded() {
  let s = SqliteStore::open_in_memory().await.unwrap();

  let all = s.list_entries(&EntryQuery::default()).await.unwrap();
  assert_eq!(all.len(), 2);
  assert!(all.iter().all(|e| !e.published), "seeds are drafts");

  let drawer = s
    .get_entry_by_slug("building-a-drawer-component")
    .await
    .unwrap()
    .unwrap();
  assert_eq!(drawer.kind, EntryKind::Other);
  assert_eq!(drawer.category.as_deref(), Some("component"));

  let cats = s.list_categories().await.unwrap();
  let keys: Vec<_> = cats.iter().map(|c| c.key.as_str()).collect();
  assert_eq!(keys, ["writing", "component", "ux"]);

  assert_eq!(s.schema_version().await.unwrap(), Migration::LATEST);
}

#[tokio::test]
async fn reopening_a_file_is_idempotent() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("portfolio.sqlite");

  {
    let s = SqliteStore::open(&path).await.unwrap();
    s.create_entry(input("mine", EntryKind::Lab)).await.unwrap();
  }

  let s = SqliteStore::open(&path).await.unwrap();
  let all = s.list_entries(&EntryQuery::default()).await.unwrap();
  // Two seeds from the first open plus ours; no re-seeding.
  assert_eq!(all.len(), 3);
  assert_eq!(s.list_categories().await.unwrap().len(), 3);
}

#[tokio::test]
async fn legacy_database_is_migrated_once() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("legacy.sqlite");

  // A database as written before kinds and categories existed.
  {
    let conn = rusqlite::Connection::open(&path).unwrap();
    conn
      .execute_batch(
        "CREATE TABLE projects (
           id integer primary key, slug text unique not null, title text not null,
           subtitle text, summary text, role text, timeframe text, tools text, tags text,
           hero_image text, body_markdown text, published integer default 0,
           created_at text not null, updated_at text not null
         );
         ALTER TABLE projects ADD COLUMN kind text default 'project';
         INSERT INTO projects (slug, title, published, created_at, updated_at, kind)
           VALUES ('old-post', 'Old post', 1, '2023-01-01T00:00:00Z', '2023-01-01T00:00:00Z', 'writing');
         INSERT INTO projects (slug, title, published, created_at, updated_at, kind)
           VALUES ('old-ux', 'Old ux', 1, '2023-01-01T00:00:00Z', '2023-01-01T00:00:00Z', 'ux');",
      )
      .unwrap();
  }

  let s = SqliteStore::open(&path).await.unwrap();
  let post = s.get_entry_by_slug("old-post").await.unwrap().unwrap();
  assert_eq!(post.kind, EntryKind::Other);
  assert_eq!(post.category.as_deref(), Some("writing"));
  assert_eq!(post.subtitle, "", "NULL text columns decode as empty");

  let ux = s.get_entry_by_slug("old-ux").await.unwrap().unwrap();
  assert_eq!(ux.category.as_deref(), Some("ux"));

  // The author clears the category; a restart must not put it back.
  let mut cleared = EntryInput::new("old-post", "Old post", EntryKind::Other);
  cleared.published = true;
  s.update_entry(post.id, cleared).await.unwrap();
  drop(s);

  let s = SqliteStore::open(&path).await.unwrap();
  let post = s.get_entry_by_slug("old-post").await.unwrap().unwrap();
  assert_eq!(post.category, None);
}

// ─── Entries ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get() {
  let s = store().await;
  let created = s.create_entry(input("foo", EntryKind::Project)).await.unwrap();
  assert_eq!(created.slug, "foo");
  assert!(!created.published);
  assert_eq!(created.hero_image, "");

  let by_id = s.get_entry(created.id).await.unwrap().unwrap();
  assert_eq!(by_id, created);
  let by_slug = s.get_entry_by_slug("foo").await.unwrap().unwrap();
  assert_eq!(by_slug.id, created.id);

  assert!(s.get_entry(created.id + 100).await.unwrap().is_none());
  assert!(s.get_entry_by_slug("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_slug_is_rejected_without_touching_original() {
  let s = store().await;
  let original = s.create_entry(input("foo", EntryKind::Project)).await.unwrap();

  let mut dup = input("foo", EntryKind::Lab);
  dup.title = "Impostor".into();
  let err = s.create_entry(dup).await.unwrap_err();
  assert!(
    matches!(err.as_core(), Some(folio_core::Error::SlugTaken(slug)) if slug == "foo"),
    "got {err:?}"
  );

  let still = s.get_entry_by_slug("foo").await.unwrap().unwrap();
  assert_eq!(still, original);
}

#[tokio::test]
async fn update_overwrites_fields_and_detects_collisions() {
  let s = store().await;
  let a = s.create_entry(input("a", EntryKind::Project)).await.unwrap();
  s.create_entry(input("b", EntryKind::Project)).await.unwrap();
  tick().await;

  let mut changed = input("a2", EntryKind::Other);
  changed.category = Some("ux".into());
  changed.date = Some("2020-02-02".into());
  let updated = s.update_entry(a.id, changed).await.unwrap();
  assert_eq!(updated.slug, "a2");
  assert_eq!(updated.kind, EntryKind::Other);
  assert_eq!(updated.created_at, a.created_at);
  assert!(updated.updated_at > a.updated_at);

  let err = s.update_entry(a.id, input("b", EntryKind::Project)).await.unwrap_err();
  assert!(matches!(err, Error::Core(folio_core::Error::SlugTaken(_))));

  let err = s.update_entry(999, input("z", EntryKind::Project)).await.unwrap_err();
  assert!(matches!(err, Error::Core(folio_core::Error::EntryNotFound(999))));
}

#[tokio::test]
async fn upsert_inserts_then_updates_by_slug() {
  let s = store().await;
  let first = s.upsert_entry(input("foo", EntryKind::Project)).await.unwrap();
  s.set_hero_image(first.id, Some("/uploads/x.png".into())).await.unwrap();
  tick().await;

  let mut again = input("foo", EntryKind::Lab);
  again.title = "Renamed".into();
  let second = s.upsert_entry(again).await.unwrap();

  assert_eq!(second.id, first.id);
  assert_eq!(second.title, "Renamed");
  assert_eq!(second.kind, EntryKind::Lab);
  assert_eq!(second.hero_image, "/uploads/x.png", "hero survives upsert");
  assert!(second.updated_at > first.updated_at);
}

#[tokio::test]
async fn toggle_twice_restores_state_and_bumps_updated_at() {
  let s = store().await;
  let e = s.create_entry(input("foo", EntryKind::Project)).await.unwrap();
  tick().await;

  let once = s.toggle_published(e.id).await.unwrap();
  assert!(once.published);
  assert!(once.updated_at > e.updated_at);
  tick().await;

  let twice = s.toggle_published(e.id).await.unwrap();
  assert!(!twice.published);
  assert!(twice.updated_at > once.updated_at);

  let err = s.toggle_published(4242).await.unwrap_err();
  assert!(matches!(err, Error::Core(folio_core::Error::EntryNotFound(4242))));
}

#[tokio::test]
async fn set_published_and_hero_image() {
  let s = store().await;
  let e = s.create_entry(input("foo", EntryKind::Project)).await.unwrap();

  assert!(s.set_published(e.id, true).await.unwrap().published);
  assert!(s.set_published(e.id, true).await.unwrap().published);

  let with = s.set_hero_image(e.id, Some("/uploads/a.png".into())).await.unwrap();
  assert_eq!(with.hero_image, "/uploads/a.png");
  let without = s.set_hero_image(e.id, None).await.unwrap();
  assert_eq!(without.hero_image, "");
}

#[tokio::test]
async fn delete_removes_row() {
  let s = store().await;
  let e = s.create_entry(input("foo", EntryKind::Project)).await.unwrap();
  assert!(s.delete_entry(e.id).await.unwrap());
  assert!(!s.delete_entry(e.id).await.unwrap());
  assert!(s.get_entry(e.id).await.unwrap().is_none());
}

#[tokio::test]
async fn list_orders_by_date_with_timestamp_fallback() {
  let s = store().await;

  let mut old = input("dated-old", EntryKind::Project);
  old.date = Some("2001-01-01".into());
  s.create_entry(old).await.unwrap();

  let mut future = input("dated-future", EntryKind::Project);
  future.date = Some("2999-01-01".into());
  s.create_entry(future).await.unwrap();

  // No display date: sorts by its (current) timestamp.
  s.create_entry(input("undated", EntryKind::Project)).await.unwrap();

  let slugs: Vec<_> = s
    .list_entries(&EntryQuery::default())
    .await
    .unwrap()
    .into_iter()
    .map(|e| e.slug)
    .collect();
  assert_eq!(slugs, ["dated-future", "undated", "dated-old"]);
}

#[tokio::test]
async fn search_wildcards_match_literally() {
  let s = store().await;
  s.create_entry(EntryInput::new("plain", "Plain entry", EntryKind::Project)).await.unwrap();
  s.create_entry(EntryInput::new("discount", "Save 50% now", EntryKind::Project))
    .await
    .unwrap();
  s.create_entry(EntryInput::new("snake", "snake_case names", EntryKind::Lab)).await.unwrap();

  let search = |text: &str| EntryQuery { text: Some(text.into()), ..Default::default() };

  let underscore = s.list_entries(&search("_")).await.unwrap();
  assert_eq!(underscore.iter().map(|e| e.slug.as_str()).collect::<Vec<_>>(), ["snake"]);

  let percent = s.list_entries(&search("%")).await.unwrap();
  assert_eq!(percent.iter().map(|e| e.slug.as_str()).collect::<Vec<_>>(), ["discount"]);

  assert!(s.list_entries(&search("50_")).await.unwrap().is_empty());
}

#[tokio::test]
async fn list_filters() {
  let s = store().await;
  s.create_entry(input("alpha-project", EntryKind::Project)).await.unwrap();
  let lab = s.create_entry(input("beta-lab", EntryKind::Lab)).await.unwrap();
  s.set_published(lab.id, true).await.unwrap();
  let mut post = input("gamma-post", EntryKind::Other);
  post.category = Some("writing".into());
  s.create_entry(post).await.unwrap();

  let labs = s
    .list_entries(&EntryQuery { kind: Some(EntryKind::Lab), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(labs.len(), 1);

  let text = s
    .list_entries(&EntryQuery { text: Some("GAMMA".into()), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(text.len(), 1);
  assert_eq!(text[0].slug, "gamma-post");

  let published = s
    .list_entries(&EntryQuery { published: Some(true), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(published.len(), 1);

  let writing = s
    .list_entries(&EntryQuery {
      kind: Some(EntryKind::Other),
      category: Some("writing".into()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(writing.len(), 1);

  let limited = s.list_entries(&EntryQuery::default().limit(2)).await.unwrap();
  assert_eq!(limited.len(), 2);
}

#[tokio::test]
async fn counts_per_kind_and_category() {
  let s = store().await;
  let p = s.create_entry(input("p1", EntryKind::Project)).await.unwrap();
  s.set_published(p.id, true).await.unwrap();
  s.create_entry(input("p2", EntryKind::Project)).await.unwrap();
  let mut o = input("o1", EntryKind::Other);
  o.category = Some("ux".into());
  o.published = true;
  s.create_entry(o).await.unwrap();

  let counts = s.entry_counts().await.unwrap();
  let project = counts.iter().find(|c| c.kind == EntryKind::Project).unwrap();
  assert_eq!((project.published, project.draft, project.total), (1, 1, 2));
  assert_eq!(count_totals(&counts), (2, 1, 3));

  let cats = s.category_counts().await.unwrap();
  assert_eq!(cats, vec![(Some("ux".to_owned()), 1)]);
}

// ─── Counters ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn counter_counts_and_keeps_first_context() {
  let s = store().await;

  for source in ["first", "second", "third"] {
    s.increment_counter(CounterEvent::OutboundClick {
      slug:   "foo".into(),
      url:    "https://example.com".into(),
      source: source.into(),
    })
    .await
    .unwrap();
  }

  let rec = s
    .get_counter(CounterTable::OutboundClicks, "out:foo:https://example.com")
    .await
    .unwrap()
    .unwrap();
  assert_eq!(rec.count, 3);

  let report = s.report().await.unwrap();
  assert_eq!(report.outbound_total, 3);
  assert_eq!(report.top_outbound.len(), 1);
  assert_eq!(report.top_outbound[0].source, "first");
}

#[tokio::test]
async fn missing_counter_is_none() {
  let s = store().await;
  assert!(
    s.get_counter(CounterTable::PageViews, "item:nope")
      .await
      .unwrap()
      .is_none()
  );
}

#[tokio::test]
async fn dashboard_and_report_rollups() {
  let s = store().await;
  s.create_entry(input("foo", EntryKind::Project)).await.unwrap();

  s.increment_counter(CounterEvent::HomeView).await.unwrap();
  s.increment_counter(CounterEvent::HomeView).await.unwrap();
  for _ in 0..3 {
    s.increment_counter(CounterEvent::ItemView {
      slug: "foo".into(),
      path: "/project/foo".into(),
    })
    .await
    .unwrap();
  }
  s.increment_counter(CounterEvent::ItemView {
    slug: "deleted".into(),
    path: "/item/deleted".into(),
  })
  .await
  .unwrap();
  s.increment_counter(CounterEvent::NavClick { section: "work".into(), href: "#work".into() })
    .await
    .unwrap();

  let stats = s.dashboard_stats().await.unwrap();
  assert_eq!(stats.home_views, 2);
  assert_eq!(stats.item_views_total, 4);
  assert_eq!(stats.outbound_total, 0);
  let top = stats.top_item.unwrap();
  assert_eq!((top.slug.as_str(), top.title.as_str(), top.count), ("foo", "Title of foo", 3));

  let report = s.report().await.unwrap();
  assert_eq!(report.top_items.len(), 2);
  assert_eq!(report.top_items[1].title, "deleted", "falls back to slug");
  assert_eq!(report.nav_clicks.len(), 1);
  assert_eq!(report.nav_clicks[0].href, "#work");
}
