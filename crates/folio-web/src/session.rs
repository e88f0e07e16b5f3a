//! Server-side sessions.
//!
//! The session table lives in process memory; a restart logs everyone out.
//! The cookie carries `<token>.<signature>`, where the signature is a
//! SHA-256 over the session secret and the token, so a cookie minted under
//! a different secret is never looked up.

use std::{
  collections::HashMap,
  sync::{Mutex, PoisonError},
  time::{Duration, Instant},
};

use axum::http::{HeaderMap, header};
use rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};

pub const COOKIE_NAME: &str = "folio_sid";

/// Twelve hours.
pub const SESSION_TTL: Duration = Duration::from_secs(12 * 60 * 60);

/// What a session has been let into. The two gates are independent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Grants {
  pub admin:       bool,
  pub site_access: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grant {
  Admin,
  SiteAccess,
}

struct SessionEntry {
  grants:     Grants,
  expires_at: Instant,
}

pub struct SessionStore {
  secret:   String,
  secure:   bool,
  ttl:      Duration,
  sessions: Mutex<HashMap<String, SessionEntry>>,
}

impl SessionStore {
  pub fn new(secret: &str, secure: bool) -> Self {
    Self {
      secret: secret.to_owned(),
      secure,
      ttl: SESSION_TTL,
      sessions: Mutex::new(HashMap::new()),
    }
  }

  /// Grants held by the session the request's cookie names, if any.
  pub fn grants(&self, headers: &HeaderMap) -> Grants {
    let Some(token) = self.token_from(headers) else {
      return Grants::default();
    };
    let now = Instant::now();
    let sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
    sessions
      .get(&token)
      .filter(|s| s.expires_at > now)
      .map(|s| s.grants)
      .unwrap_or_default()
  }

  /// Add `grant` to the caller's session. The token is rotated on every
  /// grant; returns the `Set-Cookie` value for the new token.
  pub fn grant(&self, headers: &HeaderMap, grant: Grant) -> String {
    let now = Instant::now();
    let previous = self.token_from(headers);

    let mut token_bytes = [0u8; 32];
    OsRng.fill_bytes(&mut token_bytes);
    let token = hex::encode(token_bytes);

    let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
    sessions.retain(|_, s| s.expires_at > now);

    let mut grants = previous
      .and_then(|t| sessions.remove(&t))
      .map(|s| s.grants)
      .unwrap_or_default();
    match grant {
      Grant::Admin => grants.admin = true,
      Grant::SiteAccess => grants.site_access = true,
    }
    sessions.insert(token.clone(), SessionEntry { grants, expires_at: now + self.ttl });

    self.cookie(&token)
  }

  /// Drop the caller's session; returns a `Set-Cookie` value expiring the
  /// cookie.
  pub fn destroy(&self, headers: &HeaderMap) -> String {
    if let Some(token) = self.token_from(headers) {
      self
        .sessions
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .remove(&token);
    }
    format!("{COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0{}", self.secure_attr())
  }

  fn cookie(&self, token: &str) -> String {
    format!(
      "{COOKIE_NAME}={token}.{sig}; Path=/; HttpOnly; SameSite=Lax; Max-Age={age}{secure}",
      sig = self.sign(token),
      age = self.ttl.as_secs(),
      secure = self.secure_attr(),
    )
  }

  fn secure_attr(&self) -> &'static str { if self.secure { "; Secure" } else { "" } }

  fn sign(&self, token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(self.secret.as_bytes());
    hasher.update(b".");
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
  }

  /// The token from a correctly signed session cookie.
  fn token_from(&self, headers: &HeaderMap) -> Option<String> {
    headers
      .get_all(header::COOKIE)
      .iter()
      .filter_map(|v| v.to_str().ok())
      .flat_map(|v| v.split(';'))
      .filter_map(|pair| pair.trim().split_once('='))
      .filter(|(name, _)| *name == COOKIE_NAME)
      .filter_map(|(_, value)| value.split_once('.'))
      .find(|(token, sig)| !token.is_empty() && self.sign(token) == *sig)
      .map(|(token, _)| token.to_owned())
  }
}

#[cfg(test)]
mod tests {
  use axum::http::HeaderValue;

  use super::*;

  fn with_cookie(set_cookie: &str) -> HeaderMap {
    let pair = set_cookie.split(';').next().unwrap();
    let mut headers = HeaderMap::new();
    headers.insert(header::COOKIE, HeaderValue::from_str(pair).unwrap());
    headers
  }

  #[test]
  fn grant_then_read_back() {
    let store = SessionStore::new("s3cret", false);
    let cookie = store.grant(&HeaderMap::new(), Grant::Admin);
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(!cookie.contains("Secure"));

    let grants = store.grants(&with_cookie(&cookie));
    assert!(grants.admin);
    assert!(!grants.site_access);
  }

  #[test]
  fn grants_accumulate_across_rotation() {
    let store = SessionStore::new("s3cret", true);
    let first = store.grant(&HeaderMap::new(), Grant::SiteAccess);
    let second = store.grant(&with_cookie(&first), Grant::Admin);
    assert!(second.ends_with("; Secure"));

    // The old token is gone.
    assert_eq!(store.grants(&with_cookie(&first)), Grants::default());
    assert_eq!(
      store.grants(&with_cookie(&second)),
      Grants { admin: true, site_access: true }
    );
  }

  #[test]
  fn forged_signature_is_ignored() {
    let store = SessionStore::new("s3cret", false);
    let cookie = store.grant(&HeaderMap::new(), Grant::Admin);
    let token = cookie
      .trim_start_matches("folio_sid=")
      .split('.')
      .next()
      .unwrap();
    let forged = format!("folio_sid={token}.{}", "0".repeat(64));
    assert!(!store.grants(&with_cookie(&forged)).admin);

    let other = SessionStore::new("another", false);
    assert!(!other.grants(&with_cookie(&cookie)).admin);
  }

  #[test]
  fn destroy_logs_out() {
    let store = SessionStore::new("s3cret", false);
    let cookie = store.grant(&HeaderMap::new(), Grant::Admin);
    let headers = with_cookie(&cookie);
    let expired = store.destroy(&headers);
    assert!(expired.contains("Max-Age=0"));
    assert!(!store.grants(&headers).admin);
  }

  #[test]
  fn expired_sessions_grant_nothing() {
    let mut store = SessionStore::new("s3cret", false);
    store.ttl = Duration::ZERO;
    let cookie = store.grant(&HeaderMap::new(), Grant::Admin);
    assert!(!store.grants(&with_cookie(&cookie)).admin);
  }
}
