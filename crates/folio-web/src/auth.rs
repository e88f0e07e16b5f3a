//! The admin and viewer password gates.
//!
//! Both gates work the same way: an argon2 hash from configuration, a login
//! form that grants a session flag, a middleware that redirects to the form
//! when the flag is missing, and the shared [`AttemptLimiter`].
//!
//! [`AttemptLimiter`]: crate::throttle::AttemptLimiter

use std::{convert::Infallible, net::SocketAddr};

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
  Form,
  extract::{ConnectInfo, FromRequestParts, Query, Request, State},
  http::{HeaderMap, StatusCode, Uri, header, request::Parts},
  middleware::Next,
  response::{AppendHeaders, Html, IntoResponse, Redirect, Response},
};
use folio_core::store::ContentStore;
use serde::Deserialize;

use crate::{
  AppState,
  error::Error,
  session::Grant,
  throttle::Verdict,
  views,
};

// ─── Gates ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
  Admin,
  Site,
}

impl Gate {
  pub fn login_path(self) -> &'static str {
    match self {
      Gate::Admin => "/auth/login",
      Gate::Site => "/auth/site-login",
    }
  }

  /// Where to land after login when no usable `next` was given.
  pub fn fallback(self) -> &'static str {
    match self {
      Gate::Admin => "/admin",
      Gate::Site => "/",
    }
  }

  fn grant(self) -> Grant {
    match self {
      Gate::Admin => Grant::Admin,
      Gate::Site => Grant::SiteAccess,
    }
  }
}

/// Accept `next` only as a same-origin path that fits in a `Location` header.
pub fn safe_next(next: Option<&str>, fallback: &str) -> String {
  match next {
    Some(n)
      if n.starts_with('/')
        && !n.starts_with("//")
        && !n.starts_with("/\\")
        && !n.chars().any(|c| c.is_ascii_control()) =>
    {
      n.to_owned()
    }
    _ => fallback.to_owned(),
  }
}

fn login_redirect(gate: Gate, original: &Uri) -> Response {
  let next = original.path_and_query().map_or("/", |pq| pq.as_str());
  Redirect::to(&format!("{}?next={}", gate.login_path(), urlencoding::encode(next)))
    .into_response()
}

/// Guard for every `/admin` route.
pub async fn require_admin<S>(State(state): State<AppState<S>>, req: Request, next: Next) -> Response
where
  S: ContentStore + Clone + 'static,
{
  if state.sessions.grants(req.headers()).admin {
    return next.run(req).await;
  }
  login_redirect(Gate::Admin, req.uri())
}

/// Guard for the public pages; a no-op unless a viewer password is set.
pub async fn require_site_access<S>(
  State(state): State<AppState<S>>,
  req: Request,
  next: Next,
) -> Response
where
  S: ContentStore + Clone + 'static,
{
  if has_site_access(&state, req.headers()) {
    return next.run(req).await;
  }
  login_redirect(Gate::Site, req.uri())
}

pub fn has_site_access<S: ContentStore>(state: &AppState<S>, headers: &HeaderMap) -> bool {
  !state.config.site_gated() || state.sessions.grants(headers).site_access
}

// ─── Client address ──────────────────────────────────────────────────────────

/// The address login attempts are counted against.
///
/// With `trust_proxy` this is the last `X-Forwarded-For` entry (the one our
/// proxy appended); otherwise the socket peer, or `unknown`.
pub struct ClientAddr(pub String);

impl<S> FromRequestParts<AppState<S>> for ClientAddr
where
  S: ContentStore + Clone + 'static,
{
  type Rejection = Infallible;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    if state.config.trust_proxy
      && let Some(forwarded) = parts
        .headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.rsplit(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
      return Ok(ClientAddr(forwarded.to_owned()));
    }

    let peer = parts
      .extensions
      .get::<ConnectInfo<SocketAddr>>()
      .map(|ConnectInfo(addr)| addr.ip().to_string());
    Ok(ClientAddr(peer.unwrap_or_else(|| "unknown".to_owned())))
  }
}

// ─── Password check ──────────────────────────────────────────────────────────

/// Verify `password` against an argon2 PHC string off the async runtime.
///
/// `Ok(false)` is a wrong password; `Err` means the configured hash itself
/// is unusable.
pub async fn verify_password(password: String, phc: String) -> Result<bool, Error> {
  tokio::task::spawn_blocking(move || -> Result<bool, Error> {
    let parsed = PasswordHash::new(&phc)
      .map_err(|e| Error::Internal(format!("invalid password hash: {e}")))?;
    Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
  })
  .await
  .map_err(|e| Error::Internal(e.to_string()))?
}

// ─── Login handlers ──────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
  pub next: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
  pub password: String,
  pub next:     Option<String>,
}

fn form_page(gate: Gate, status: StatusCode, next: &str, error: Option<&str>) -> Response {
  (status, Html(views::login(gate, next, error))).into_response()
}

/// `GET /auth/login`
pub async fn login_form(Query(q): Query<NextQuery>) -> Response {
  let next = safe_next(q.next.as_deref(), Gate::Admin.fallback());
  form_page(Gate::Admin, StatusCode::OK, &next, None)
}

/// `GET /auth/site-login`
pub async fn site_login_form(Query(q): Query<NextQuery>) -> Response {
  let next = safe_next(q.next.as_deref(), Gate::Site.fallback());
  form_page(Gate::Site, StatusCode::OK, &next, None)
}

/// `POST /auth/login`
pub async fn login<S>(
  State(state): State<AppState<S>>,
  ClientAddr(addr): ClientAddr,
  headers: HeaderMap,
  Form(form): Form<LoginForm>,
) -> Response
where
  S: ContentStore + Clone + 'static,
{
  let hash = state.config.admin_hash().map(str::to_owned);
  attempt(&state, Gate::Admin, hash, &addr, &headers, form).await
}

/// `POST /auth/site-login`
pub async fn site_login<S>(
  State(state): State<AppState<S>>,
  ClientAddr(addr): ClientAddr,
  headers: HeaderMap,
  Form(form): Form<LoginForm>,
) -> Response
where
  S: ContentStore + Clone + 'static,
{
  let next = safe_next(form.next.as_deref(), Gate::Site.fallback());
  let Some(hash) = state.config.site_hash().map(str::to_owned) else {
    // Nothing to unlock.
    return Redirect::to(&next).into_response();
  };
  attempt(&state, Gate::Site, Some(hash), &addr, &headers, form).await
}

async fn attempt<S>(
  state: &AppState<S>,
  gate: Gate,
  hash: Option<String>,
  addr: &str,
  headers: &HeaderMap,
  form: LoginForm,
) -> Response
where
  S: ContentStore + Clone + 'static,
{
  let next = safe_next(form.next.as_deref(), gate.fallback());

  if state.limiter.check(addr) == Verdict::Locked {
    return form_page(
      gate,
      StatusCode::TOO_MANY_REQUESTS,
      &next,
      Some("Too many attempts. Try again later."),
    );
  }

  let Some(hash) = hash else {
    return form_page(
      gate,
      StatusCode::INTERNAL_SERVER_ERROR,
      &next,
      Some("Missing ADMIN_PASSWORD_HASH. Generate one with `folio --hash-password`."),
    );
  };

  match verify_password(form.password, hash).await {
    Ok(true) => {
      state.limiter.clear(addr);
      let cookie = state.sessions.grant(headers, gate.grant());
      tracing::info!(?gate, addr, "login succeeded");
      (AppendHeaders([(header::SET_COOKIE, cookie)]), Redirect::to(&next)).into_response()
    }
    Ok(false) => {
      state.limiter.record_failure(addr);
      form_page(gate, StatusCode::UNAUTHORIZED, &next, Some("Wrong password"))
    }
    Err(e) => {
      tracing::error!(?gate, error = %e, "password check failed");
      form_page(gate, StatusCode::INTERNAL_SERVER_ERROR, &next, Some(&e.to_string()))
    }
  }
}

/// `POST /auth/logout`
pub async fn logout<S>(State(state): State<AppState<S>>, headers: HeaderMap) -> Response
where
  S: ContentStore + Clone + 'static,
{
  let cookie = state.sessions.destroy(&headers);
  (AppendHeaders([(header::SET_COOKIE, cookie)]), Redirect::to("/")).into_response()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn next_must_be_same_origin() {
    assert_eq!(safe_next(Some("/admin/edit/3"), "/admin"), "/admin/edit/3");
    assert_eq!(safe_next(Some("/?topic=ux"), "/"), "/?topic=ux");
    assert_eq!(safe_next(Some("//evil.test"), "/admin"), "/admin");
    assert_eq!(safe_next(Some("/\\evil.test"), "/admin"), "/admin");
    assert_eq!(safe_next(Some("https://evil.test"), "/"), "/");
    assert_eq!(safe_next(Some(""), "/"), "/");
    assert_eq!(safe_next(None, "/admin"), "/admin");
    assert_eq!(safe_next(Some("/\nevil"), "/"), "/");
    assert_eq!(safe_next(Some("/admin\r\nSet-Cookie:x"), "/admin"), "/admin");
    assert_eq!(safe_next(Some("/a\tb"), "/"), "/");
  }

  #[test]
  fn login_redirect_keeps_path_and_query() {
    let uri: Uri = "/admin/reports?kind=lab".parse().unwrap();
    let res = login_redirect(Gate::Admin, &uri);
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(
      res.headers()[header::LOCATION],
      "/auth/login?next=%2Fadmin%2Freports%3Fkind%3Dlab"
    );
  }

  #[tokio::test]
  async fn verify_accepts_only_the_right_password() {
    use argon2::{PasswordHasher, password_hash::SaltString};
    use rand_core::OsRng;

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(b"hunter2", &salt)
      .unwrap()
      .to_string();

    assert!(verify_password("hunter2".into(), hash.clone()).await.unwrap());
    assert!(!verify_password("hunter3".into(), hash).await.unwrap());
    assert!(verify_password("x".into(), "not-a-phc".into()).await.is_err());
  }
}
