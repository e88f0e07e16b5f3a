//! HTTP layer for folio.
//!
//! Exposes an axum [`Router`] serving the public portfolio site and the
//! password-gated admin CMS, backed by any [`ContentStore`].

pub mod analytics;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod session;
pub mod throttle;
pub mod uploads;
pub mod views;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  extract::DefaultBodyLimit,
  http::{HeaderValue, header},
  middleware,
  routing::{get, post},
};
use folio_core::store::ContentStore;
use serde::Deserialize;
use tower::Layer as _;
use tower_http::{services::ServeDir, set_header::SetResponseHeaderLayer};

use handlers::{admin, seo, site};
use session::SessionStore;
use throttle::{AttemptLimiter, MemoryLimiter};
use uploads::UploadDir;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and the
/// process environment.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "defaults::host")]
  pub host:                String,
  #[serde(default = "defaults::port")]
  pub port:                u16,
  /// Enables long-lived cache headers and secure cookies.
  #[serde(default)]
  pub production:          bool,
  /// Directory holding `portfolio.sqlite`.
  #[serde(default = "defaults::data_dir")]
  pub data_dir:            PathBuf,
  #[serde(default = "defaults::uploads_dir")]
  pub uploads_dir:         PathBuf,
  #[serde(default = "defaults::public_dir")]
  pub public_dir:          PathBuf,
  /// Public base URL, e.g. `https://example.com`. Required for the sitemap.
  #[serde(default)]
  pub site_url:            Option<String>,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  #[serde(default)]
  pub admin_password_hash: Option<String>,
  /// Enables the viewer gate when set and non-empty.
  #[serde(default)]
  pub site_password_hash:  Option<String>,
  #[serde(default = "defaults::session_secret")]
  pub session_secret:      String,
  #[serde(default)]
  pub cookie_secure:       bool,
  /// Take the client address from `X-Forwarded-For`.
  #[serde(default)]
  pub trust_proxy:         bool,
}

mod defaults {
  use std::path::PathBuf;

  pub const SESSION_SECRET: &str = "dev-secret-change-me";

  pub fn host() -> String { "0.0.0.0".to_owned() }
  pub fn port() -> u16 { 3020 }
  pub fn data_dir() -> PathBuf { PathBuf::from("data") }
  pub fn uploads_dir() -> PathBuf { PathBuf::from("uploads") }
  pub fn public_dir() -> PathBuf { PathBuf::from("public") }
  pub fn session_secret() -> String { SESSION_SECRET.to_owned() }
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:                defaults::host(),
      port:                defaults::port(),
      production:          false,
      data_dir:            defaults::data_dir(),
      uploads_dir:         defaults::uploads_dir(),
      public_dir:          defaults::public_dir(),
      site_url:            None,
      admin_password_hash: None,
      site_password_hash:  None,
      session_secret:      defaults::session_secret(),
      cookie_secure:       false,
      trust_proxy:         false,
    }
  }
}

impl ServerConfig {
  pub fn database_path(&self) -> PathBuf { self.data_dir.join("portfolio.sqlite") }

  pub fn admin_hash(&self) -> Option<&str> { non_blank(&self.admin_password_hash) }

  pub fn site_hash(&self) -> Option<&str> { non_blank(&self.site_password_hash) }

  /// Whether the public site sits behind the viewer password.
  pub fn site_gated(&self) -> bool { self.site_hash().is_some() }

  pub fn secure_cookies(&self) -> bool { self.cookie_secure || self.production }

  pub fn uses_default_secret(&self) -> bool { self.session_secret == defaults::SESSION_SECRET }

  /// `SITE_URL` without its trailing slash.
  pub fn base_url(&self) -> Option<&str> {
    non_blank(&self.site_url).map(|u| u.trim_end_matches('/'))
  }

  /// Absolute URL for `path` when a base URL is configured, else `path`.
  pub fn canonical(&self, path: &str) -> String {
    match self.base_url() {
      Some(base) => format!("{base}{path}"),
      None => path.to_owned(),
    }
  }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
  value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: ContentStore> {
  pub store:    Arc<S>,
  pub config:   Arc<ServerConfig>,
  pub sessions: Arc<SessionStore>,
  pub limiter:  Arc<dyn AttemptLimiter>,
  pub uploads:  Arc<UploadDir>,
}

impl<S: ContentStore> AppState<S> {
  /// State with an in-memory session table and attempt limiter.
  pub fn new(store: S, config: ServerConfig) -> Self {
    let sessions = SessionStore::new(&config.session_secret, config.secure_cookies());
    let uploads = UploadDir::new(&config.uploads_dir);
    Self {
      store:    Arc::new(store),
      config:   Arc::new(config),
      sessions: Arc::new(sessions),
      limiter:  Arc::new(MemoryLimiter::default()),
      uploads:  Arc::new(uploads),
    }
  }

  pub fn with_limiter(mut self, limiter: Arc<dyn AttemptLimiter>) -> Self {
    self.limiter = limiter;
    self
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Request bodies on the upload route may carry a full-size image plus the
/// multipart framing around it.
const UPLOAD_BODY_LIMIT: usize = uploads::MAX_UPLOAD_BYTES + 64 * 1024;

const DEV_CACHE: &str = "public, max-age=0";
const PUBLIC_CACHE: &str = "public, max-age=2592000";
const UPLOADS_CACHE: &str = "public, max-age=31536000, immutable";

/// Build the axum [`Router`] for the whole site.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: ContentStore + Clone + 'static,
{
  let admin_routes = Router::new()
    .route("/admin", get(admin::index::<S>))
    .route("/admin/reports", get(admin::reports::<S>))
    .route("/admin/new", get(admin::new_form::<S>).post(admin::create::<S>))
    .route("/admin/edit/{id}", get(admin::edit_form::<S>).post(admin::update::<S>))
    .route("/admin/toggle-publish/{id}", post(admin::toggle_publish::<S>))
    .route("/admin/delete/{id}", post(admin::delete::<S>))
    .route(
      "/admin/upload-hero/{id}",
      post(admin::upload_hero::<S>).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
    )
    .route("/admin/remove-hero/{id}", post(admin::remove_hero::<S>))
    .route("/admin/markdown/preview", post(admin::markdown_preview))
    .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_admin::<S>));

  let site_routes = Router::new()
    .route("/", get(site::home::<S>))
    .route("/about", get(site::about::<S>))
    .route("/contact", get(site::contact::<S>))
    .route("/project/{slug}", get(site::project::<S>))
    .route("/item/{slug}", get(site::item::<S>))
    .route_layer(middleware::from_fn_with_state(
      state.clone(),
      auth::require_site_access::<S>,
    ));

  let open_routes = Router::new()
    .route("/auth/login", get(auth::login_form).post(auth::login::<S>))
    .route("/auth/logout", post(auth::logout::<S>))
    .route("/auth/site-login", get(auth::site_login_form).post(auth::site_login::<S>))
    .route("/robots.txt", get(seo::robots::<S>))
    .route("/sitemap.xml", get(seo::sitemap::<S>))
    .route("/analytics/event", post(site::analytics_event::<S>));

  let config = &state.config;
  let (public_cache, uploads_cache) = if config.production {
    (PUBLIC_CACHE, UPLOADS_CACHE)
  } else {
    (DEV_CACHE, DEV_CACHE)
  };

  Router::new()
    .merge(admin_routes)
    .merge(site_routes)
    .merge(open_routes)
    .nest_service("/public", static_dir(config.public_dir.clone(), public_cache))
    .nest_service("/uploads", static_dir(config.uploads_dir.clone(), uploads_cache))
    .fallback(handlers::not_found)
    .with_state(state)
}

fn static_dir(
  root: PathBuf,
  cache_control: &'static str,
) -> tower_http::set_header::SetResponseHeader<ServeDir, HeaderValue> {
  SetResponseHeaderLayer::overriding(
    header::CACHE_CONTROL,
    HeaderValue::from_static(cache_control),
  )
  .layer(ServeDir::new(root))
}
