//! Best-effort view and click counting.
//!
//! Recording never fails a request: store errors are logged and dropped,
//! and requests that look like crawlers are not counted at all.

use axum::http::{HeaderMap, header};
use folio_core::{analytics::CounterEvent, store::ContentStore};
use serde::Deserialize;

/// Lowercase user-agent substrings that mark a request as automated.
const BOT_MARKERS: &[&str] = &["bot", "spider", "crawl", "slurp", "facebookexternalhit", "preview"];

pub fn is_probably_bot(headers: &HeaderMap) -> bool {
  let ua = headers
    .get(header::USER_AGENT)
    .and_then(|v| v.to_str().ok())
    .unwrap_or_default()
    .to_ascii_lowercase();
  BOT_MARKERS.iter().any(|m| ua.contains(m))
}

/// Count `event` unless the request comes from a bot.
pub async fn record<S: ContentStore>(store: &S, headers: &HeaderMap, event: CounterEvent) {
  if is_probably_bot(headers) {
    return;
  }
  let key = event.key();
  if let Err(e) = store.increment_counter(event).await {
    tracing::warn!(%key, error = %e, "failed to record analytics event");
  }
}

/// Body of `POST /analytics/event`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EventBody {
  #[serde(rename = "type")]
  pub kind:    String,
  pub slug:    Option<String>,
  pub url:     Option<String>,
  pub source:  Option<String>,
  pub section: Option<String>,
  pub href:    Option<String>,
}

impl EventBody {
  /// The counter this body describes. Unknown types and events missing their
  /// required field yield `None`.
  pub fn into_event(self) -> Option<CounterEvent> {
    match self.kind.as_str() {
      "outbound" => Some(CounterEvent::OutboundClick {
        url:    self.url.filter(|u| !u.is_empty())?,
        slug:   self.slug.unwrap_or_default(),
        source: self.source.unwrap_or_default(),
      }),
      "nav" => Some(CounterEvent::NavClick {
        section: self.section.filter(|s| !s.is_empty())?,
        href:    self.href.unwrap_or_default(),
      }),
      _ => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use axum::http::HeaderValue;

  use super::*;

  fn ua(value: &'static str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::USER_AGENT, HeaderValue::from_static(value));
    headers
  }

  #[test]
  fn bot_heuristic() {
    assert!(is_probably_bot(&ua("Mozilla/5.0 (compatible; Googlebot/2.1)")));
    assert!(is_probably_bot(&ua("Slackbot-LinkExpanding 1.0")));
    assert!(is_probably_bot(&ua("facebookexternalhit/1.1")));
    assert!(!is_probably_bot(&ua("Mozilla/5.0 (Macintosh) Safari/605.1.15")));
    assert!(!is_probably_bot(&HeaderMap::new()));
  }

  #[test]
  fn event_bodies() {
    let body: EventBody = serde_json::from_str(
      r#"{"type":"outbound","slug":"foo","url":"https://x.test","source":"card"}"#,
    )
    .unwrap();
    assert_eq!(
      body.into_event(),
      Some(CounterEvent::OutboundClick {
        slug:   "foo".into(),
        url:    "https://x.test".into(),
        source: "card".into(),
      })
    );

    let nav: EventBody = serde_json::from_str(r##"{"type":"nav","section":"work"}"##).unwrap();
    assert_eq!(nav.into_event().unwrap().key(), "nav:work");

    let no_url: EventBody = serde_json::from_str(r#"{"type":"outbound"}"#).unwrap();
    assert_eq!(no_url.into_event(), None);
    let unknown: EventBody = serde_json::from_str(r#"{"type":"scroll"}"#).unwrap();
    assert_eq!(unknown.into_event(), None);
  }
}
