//! Admin CMS handlers. Every route here sits behind
//! [`require_admin`](crate::auth::require_admin).
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/admin` | `?kind=` and `?q=` filters |
//! | `GET`  | `/admin/reports` | |
//! | `GET`/`POST` | `/admin/new` | 400 with the form re-rendered on rejection |
//! | `GET`/`POST` | `/admin/edit/{id}` | 404 if not found |
//! | `POST` | `/admin/toggle-publish/{id}` | `redirect` form field |
//! | `POST` | `/admin/delete/{id}` | also removes a local hero file |
//! | `POST` | `/admin/upload-hero/{id}` | multipart field `hero` |
//! | `POST` | `/admin/remove-hero/{id}` | |
//! | `POST` | `/admin/markdown/preview` | `{"markdown": …}` → `{"ok": true, "html": …}` |

use axum::{
  Form, Json,
  extract::{Multipart, Path, Query, State},
  http::StatusCode,
  response::{Html, IntoResponse, Redirect, Response},
};
use folio_core::{
  entry::{EntryDraft, EntryKind},
  store::{ContentStore, EntryQuery, StoreError as _},
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
  AppState,
  auth::safe_next,
  error::Error,
  views::{self, admin::EditPage},
};

// ─── List & reports ───────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListParams {
  pub kind: String,
  pub q:    String,
}

/// `GET /admin[?kind=<kind>&q=<text>]`
pub async fn index<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Response, Error>
where
  S: ContentStore + Clone + 'static,
{
  let kind = EntryKind::from_filter(&params.kind);
  let q = params.q.trim();
  let query = EntryQuery {
    kind,
    text: (!q.is_empty()).then(|| q.to_owned()),
    ..Default::default()
  };

  let store = &state.store;
  let entries = store.list_entries(&query).await.map_err(Error::store)?;
  let counts = store.entry_counts().await.map_err(Error::store)?;
  let stats = store.dashboard_stats().await.map_err(Error::store)?;

  let page = views::admin::IndexPage { entries: &entries, kind, q, counts: &counts, stats: &stats };
  Ok(Html(views::admin::index(&page)).into_response())
}

/// `GET /admin/reports`
pub async fn reports<S>(State(state): State<AppState<S>>) -> Result<Response, Error>
where
  S: ContentStore + Clone + 'static,
{
  let report = state.store.report().await.map_err(Error::store)?;
  Ok(Html(views::admin::reports(&report)).into_response())
}

// ─── Create & update ──────────────────────────────────────────────────────────

async fn edit_page<S>(
  state: &AppState<S>,
  status: StatusCode,
  id: Option<i64>,
  draft: &EntryDraft,
  hero_image: &str,
  error: Option<&str>,
) -> Result<Response, Error>
where
  S: ContentStore + Clone + 'static,
{
  let categories = state.store.list_categories().await.map_err(Error::store)?;
  let page = EditPage { id, draft, hero_image, categories: &categories, error };
  Ok((status, Html(views::admin::edit(&page))).into_response())
}

/// `GET /admin/new`
pub async fn new_form<S>(State(state): State<AppState<S>>) -> Result<Response, Error>
where
  S: ContentStore + Clone + 'static,
{
  edit_page(&state, StatusCode::OK, None, &EntryDraft::default(), "", None).await
}

/// `POST /admin/new`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Form(draft): Form<EntryDraft>,
) -> Result<Response, Error>
where
  S: ContentStore + Clone + 'static,
{
  let input = match draft.validate() {
    Ok(input) => input,
    Err(e) => {
      return edit_page(&state, StatusCode::BAD_REQUEST, None, &draft, "", Some(&e.to_string()))
        .await;
    }
  };

  match state.store.create_entry(input).await {
    Ok(entry) => {
      tracing::info!(id = entry.id, slug = %entry.slug, "entry created");
      Ok(Redirect::to("/admin").into_response())
    }
    Err(e) => match e.as_core() {
      Some(rejected) => {
        let msg = rejected.to_string();
        edit_page(&state, StatusCode::BAD_REQUEST, None, &draft, "", Some(&msg)).await
      }
      None => Err(Error::store(e)),
    },
  }
}

/// `GET /admin/edit/{id}`
pub async fn edit_form<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<i64>,
) -> Result<Response, Error>
where
  S: ContentStore + Clone + 'static,
{
  let entry = state.store.get_entry(id).await.map_err(Error::store)?.ok_or(Error::NotFound)?;
  let draft = EntryDraft::from(&entry);
  edit_page(&state, StatusCode::OK, Some(id), &draft, &entry.hero_image, None).await
}

/// `POST /admin/edit/{id}`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<i64>,
  Form(draft): Form<EntryDraft>,
) -> Result<Response, Error>
where
  S: ContentStore + Clone + 'static,
{
  let existing =
    state.store.get_entry(id).await.map_err(Error::store)?.ok_or(Error::NotFound)?;
  let hero = existing.hero_image;

  let input = match draft.validate() {
    Ok(input) => input,
    Err(e) => {
      let msg = e.to_string();
      return edit_page(&state, StatusCode::BAD_REQUEST, Some(id), &draft, &hero, Some(&msg))
        .await;
    }
  };

  match state.store.update_entry(id, input).await {
    Ok(entry) => {
      tracing::info!(id, slug = %entry.slug, "entry updated");
      Ok(Redirect::to("/admin").into_response())
    }
    Err(e) => match e.as_core() {
      Some(folio_core::Error::EntryNotFound(_)) => Err(Error::NotFound),
      Some(rejected) => {
        let msg = rejected.to_string();
        edit_page(&state, StatusCode::BAD_REQUEST, Some(id), &draft, &hero, Some(&msg)).await
      }
      None => Err(Error::store(e)),
    },
  }
}

// ─── State changes ────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RedirectForm {
  pub redirect: Option<String>,
}

/// `POST /admin/toggle-publish/{id}`
pub async fn toggle_publish<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<i64>,
  Form(form): Form<RedirectForm>,
) -> Result<Response, Error>
where
  S: ContentStore + Clone + 'static,
{
  let entry = state.store.toggle_published(id).await.map_err(Error::store)?;
  tracing::info!(id, published = entry.published, "publish state toggled");
  let target = safe_next(form.redirect.as_deref(), "/admin");
  Ok(Redirect::to(&target).into_response())
}

/// `POST /admin/delete/{id}`
pub async fn delete<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<i64>,
) -> Result<Response, Error>
where
  S: ContentStore + Clone + 'static,
{
  let entry = state.store.get_entry(id).await.map_err(Error::store)?.ok_or(Error::NotFound)?;
  if entry.has_local_hero() {
    state.uploads.remove(&entry.hero_image).await;
  }
  state.store.delete_entry(id).await.map_err(Error::store)?;
  tracing::info!(id, slug = %entry.slug, "entry deleted");
  Ok(Redirect::to("/admin").into_response())
}

// ─── Hero image ───────────────────────────────────────────────────────────────

const HERO_FIELD: &str = "hero";

/// `POST /admin/upload-hero/{id}`
///
/// The new file is stored first; the previous local file is only removed
/// once the entry points at its replacement.
pub async fn upload_hero<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<i64>,
  mut multipart: Multipart,
) -> Result<Response, Error>
where
  S: ContentStore + Clone + 'static,
{
  let entry = state.store.get_entry(id).await.map_err(Error::store)?.ok_or(Error::NotFound)?;

  let mut upload = None;
  while let Some(field) =
    multipart.next_field().await.map_err(|e| Error::BadRequest(e.body_text()))?
  {
    if field.name() != Some(HERO_FIELD) {
      continue;
    }
    let mime = field.content_type().unwrap_or_default().to_owned();
    let bytes = field.bytes().await.map_err(|e| Error::BadRequest(e.body_text()))?;
    if !bytes.is_empty() {
      upload = Some((mime, bytes));
    }
    break;
  }
  let Some((mime, bytes)) = upload else {
    return Err(Error::BadRequest("No file".to_owned()));
  };

  let url = state.uploads.save(&mime, &bytes).await?;
  if let Err(e) = state.store.set_hero_image(id, Some(url.clone())).await {
    state.uploads.remove(&url).await;
    return Err(Error::store(e));
  }
  if entry.has_local_hero() {
    state.uploads.remove(&entry.hero_image).await;
  }

  Ok(Redirect::to(&format!("/admin/edit/{id}")).into_response())
}

/// `POST /admin/remove-hero/{id}`
pub async fn remove_hero<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<i64>,
) -> Result<Response, Error>
where
  S: ContentStore + Clone + 'static,
{
  let entry = state.store.get_entry(id).await.map_err(Error::store)?.ok_or(Error::NotFound)?;
  if entry.has_local_hero() {
    state.uploads.remove(&entry.hero_image).await;
  }
  state.store.set_hero_image(id, None).await.map_err(Error::store)?;
  Ok(Redirect::to(&format!("/admin/edit/{id}")).into_response())
}

// ─── Markdown preview ─────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PreviewBody {
  pub markdown: String,
}

/// `POST /admin/markdown/preview`
pub async fn markdown_preview(Json(body): Json<PreviewBody>) -> Json<Value> {
  let html = folio_markdown::render(&body.markdown);
  Json(json!({ "ok": true, "html": html }))
}
