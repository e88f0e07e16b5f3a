//! Public site handlers, behind the optional viewer gate.

use axum::{
  Json,
  body::Bytes,
  extract::{Path, Query, State},
  http::HeaderMap,
  response::{Html, IntoResponse, Redirect, Response},
};
use folio_core::{
  analytics::CounterEvent,
  category::{self, Category},
  entry::{Entry, EntryKind},
  store::{ContentStore, EntryQuery},
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
  AppState,
  analytics::{self, EventBody},
  auth::has_site_access,
  error::Error,
  views::{
    self, PageMeta,
    site::{EntryPage, HomePage, Listed, Topic},
  },
};

/// Featured projects and labs shown on the home page.
const FEATURED: usize = 4;

const ALL_TOPICS: &str = "all";

/// Display label for an entry's section.
pub fn kind_label<'a>(entry: &Entry, categories: &'a [Category]) -> &'a str {
  match entry.kind {
    EntryKind::Lab => "Lab",
    EntryKind::Project => "Projects",
    _ => category::label_for(categories, entry.category.as_deref()),
  }
}

// ─── Home ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HomeParams {
  pub topic: String,
}

/// `GET /[?topic=<category>]`
pub async fn home<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<HomeParams>,
  headers: HeaderMap,
) -> Result<Response, Error>
where
  S: ContentStore + Clone + 'static,
{
  analytics::record(state.store.as_ref(), &headers, CounterEvent::HomeView).await;

  let store = &state.store;
  let categories = store.list_categories().await.map_err(Error::store)?;

  let requested = params.topic.trim().to_ascii_lowercase();
  let active = categories.iter().find(|c| c.key == requested).map(|c| c.key.clone());

  let items_query = EntryQuery {
    category: active.clone(),
    ..EntryQuery::published(EntryKind::Other)
  };
  let items = store.list_entries(&items_query).await.map_err(Error::store)?;
  let work = store
    .list_entries(&EntryQuery::published(EntryKind::Project).limit(FEATURED))
    .await
    .map_err(Error::store)?;
  let lab = store
    .list_entries(&EntryQuery::published(EntryKind::Lab).limit(FEATURED))
    .await
    .map_err(Error::store)?;

  let counts = store.category_counts().await.map_err(Error::store)?;
  let total = counts.iter().map(|(_, n)| n).sum();
  let mut topics = vec![Topic { key: ALL_TOPICS, label: "All", count: total }];
  topics.extend(categories.iter().map(|c| Topic {
    key:   &c.key,
    label: &c.label,
    count: counts
      .iter()
      .find(|(key, _)| key.as_deref() == Some(c.key.as_str()))
      .map_or(0, |(_, n)| *n),
  }));

  let listed: Vec<Listed<'_>> = items
    .iter()
    .map(|entry| Listed { entry, label: kind_label(entry, &categories) })
    .collect();

  let page = HomePage {
    meta:         home_meta(&state.config),
    active_topic: active.as_deref().unwrap_or(ALL_TOPICS),
    topics:       &topics,
    items:        &listed,
    work:         &work,
    lab:          &lab,
  };
  Ok(Html(views::site::home(&page)).into_response())
}

fn home_meta(config: &crate::ServerConfig) -> PageMeta {
  PageMeta {
    title:       views::SITE_NAME.to_owned(),
    description: "Case studies, lab experiments and notes.".to_owned(),
    canonical:   config.canonical("/"),
    image:       config.canonical(views::DEFAULT_IMAGE),
  }
}

// ─── Static pages ─────────────────────────────────────────────────────────────

/// `GET /about`
pub async fn about<S>(State(state): State<AppState<S>>) -> Html<String>
where
  S: ContentStore + Clone + 'static,
{
  let meta = PageMeta {
    title:       format!("About | {}", views::SITE_NAME),
    description: "Background, approach, and what I care about.".to_owned(),
    canonical:   state.config.canonical("/about"),
    image:       state.config.canonical(views::DEFAULT_IMAGE),
  };
  Html(views::site::about(&meta))
}

/// `GET /contact`
pub async fn contact<S>(State(state): State<AppState<S>>) -> Html<String>
where
  S: ContentStore + Clone + 'static,
{
  let meta = PageMeta {
    title:       format!("Contact | {}", views::SITE_NAME),
    description: "Get in touch.".to_owned(),
    canonical:   state.config.canonical("/contact"),
    image:       state.config.canonical(views::DEFAULT_IMAGE),
  };
  Html(views::site::contact(&meta))
}

// ─── Entry pages ──────────────────────────────────────────────────────────────

async fn published_entry<S>(state: &AppState<S>, slug: &str) -> Result<Entry, Error>
where
  S: ContentStore + Clone + 'static,
{
  state
    .store
    .get_entry_by_slug(slug)
    .await
    .map_err(Error::store)?
    .filter(|e| e.published)
    .ok_or(Error::NotFound)
}

async fn render_entry<S>(
  state: &AppState<S>,
  headers: &HeaderMap,
  entry: Entry,
) -> Result<Response, Error>
where
  S: ContentStore + Clone + 'static,
{
  let path = entry.path();
  analytics::record(
    state.store.as_ref(),
    headers,
    CounterEvent::ItemView { slug: entry.slug.clone(), path: path.clone() },
  )
  .await;

  let categories = state.store.list_categories().await.map_err(Error::store)?;
  let body_html = folio_markdown::render(&entry.body_markdown);
  let image = if entry.hero_image.is_empty() {
    views::DEFAULT_IMAGE
  } else {
    entry.hero_image.as_str()
  };

  let page = EntryPage {
    meta:      PageMeta {
      title:       format!("{} | {}", entry.title, views::SITE_NAME),
      description: entry.summary.clone(),
      canonical:   state.config.canonical(&path),
      image:       state.config.canonical(image),
    },
    entry:     &entry,
    label:     kind_label(&entry, &categories),
    body_html: &body_html,
  };
  Ok(Html(views::site::entry(&page)).into_response())
}

/// `GET /project/{slug}`: published projects and labs only.
pub async fn project<S>(
  State(state): State<AppState<S>>,
  Path(slug): Path<String>,
  headers: HeaderMap,
) -> Result<Response, Error>
where
  S: ContentStore + Clone + 'static,
{
  let entry = published_entry(&state, &slug).await?;
  if !entry.kind.has_project_page() {
    return Err(Error::NotFound);
  }
  render_entry(&state, &headers, entry).await
}

/// `GET /item/{slug}`: any published entry; projects and labs are sent to
/// their canonical `/project/` URL.
pub async fn item<S>(
  State(state): State<AppState<S>>,
  Path(slug): Path<String>,
  headers: HeaderMap,
) -> Result<Response, Error>
where
  S: ContentStore + Clone + 'static,
{
  let entry = published_entry(&state, &slug).await?;
  if entry.kind.has_project_page() {
    return Ok(Redirect::permanent(&entry.path()).into_response());
  }
  render_entry(&state, &headers, entry).await
}

// ─── Analytics intake ─────────────────────────────────────────────────────────

/// `POST /analytics/event`
///
/// Always answers `{"ok": true}`; bad bodies, unknown event types and
/// requests locked out by the viewer gate are dropped silently.
pub async fn analytics_event<S>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
  body: Bytes,
) -> Json<Value>
where
  S: ContentStore + Clone + 'static,
{
  if has_site_access(&state, &headers)
    && let Ok(body) = serde_json::from_slice::<EventBody>(&body)
    && let Some(event) = body.into_event()
  {
    analytics::record(state.store.as_ref(), &headers, event).await;
  }
  Json(json!({ "ok": true }))
}
