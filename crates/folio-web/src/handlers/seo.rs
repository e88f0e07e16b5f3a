//! `robots.txt` and `sitemap.xml`.
//!
//! Neither is gated, but both hide the site when the viewer gate is on:
//! robots disallows everything and the sitemap is empty.

use std::io::{self, Cursor};

use axum::{
  extract::State,
  http::{StatusCode, header},
  response::{IntoResponse, Response},
};
use chrono::Utc;
use folio_core::store::{ContentStore, EntryQuery};
use quick_xml::{
  Writer,
  events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
};

use crate::{AppState, error::Error};

pub const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

const CONTENT_TYPE_XML: &str = "application/xml; charset=utf-8";
const CONTENT_TYPE_TEXT: &str = "text/plain; charset=utf-8";

/// `GET /robots.txt`
pub async fn robots<S>(State(state): State<AppState<S>>) -> Response
where
  S: ContentStore + Clone + 'static,
{
  let body = if state.config.site_gated() {
    "User-agent: *\nDisallow: /\n"
  } else {
    "User-agent: *\nAllow: /\nSitemap: /sitemap.xml\n"
  };
  ([(header::CONTENT_TYPE, CONTENT_TYPE_TEXT)], body).into_response()
}

/// One `<url>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapUrl {
  pub loc:     String,
  /// `YYYY-MM-DD`
  pub lastmod: String,
}

/// Serialise a `<urlset>` document.
pub fn write_sitemap(urls: &[SitemapUrl]) -> io::Result<Vec<u8>> {
  let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
  writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

  let mut urlset = BytesStart::new("urlset");
  urlset.push_attribute(("xmlns", SITEMAP_NS));
  writer.write_event(Event::Start(urlset))?;

  for url in urls {
    writer.write_event(Event::Start(BytesStart::new("url")))?;
    text_element(&mut writer, "loc", &url.loc)?;
    text_element(&mut writer, "lastmod", &url.lastmod)?;
    writer.write_event(Event::End(BytesEnd::new("url")))?;
  }

  writer.write_event(Event::End(BytesEnd::new("urlset")))?;
  Ok(writer.into_inner().into_inner())
}

fn text_element(w: &mut Writer<Cursor<Vec<u8>>>, tag: &str, text: &str) -> io::Result<()> {
  w.write_event(Event::Start(BytesStart::new(tag)))?;
  w.write_event(Event::Text(BytesText::new(text)))?;
  w.write_event(Event::End(BytesEnd::new(tag)))
}

fn xml_response(body: Vec<u8>) -> Response {
  ([(header::CONTENT_TYPE, CONTENT_TYPE_XML)], body).into_response()
}

/// `GET /sitemap.xml`
pub async fn sitemap<S>(State(state): State<AppState<S>>) -> Result<Response, Error>
where
  S: ContentStore + Clone + 'static,
{
  if state.config.site_gated() {
    return Ok(xml_response(write_sitemap(&[])?));
  }

  let Some(base) = state.config.base_url() else {
    let headers = [(header::CONTENT_TYPE, CONTENT_TYPE_TEXT)];
    return Ok((StatusCode::INTERNAL_SERVER_ERROR, headers, "Missing SITE_URL").into_response());
  };

  let published = EntryQuery { published: Some(true), ..Default::default() };
  let entries = state.store.list_entries(&published).await.map_err(Error::store)?;

  let today = Utc::now().format("%Y-%m-%d").to_string();
  let mut urls = vec![
    SitemapUrl { loc: format!("{base}/"), lastmod: today.clone() },
    SitemapUrl { loc: format!("{base}/about"), lastmod: today },
  ];
  urls.extend(entries.iter().map(|e| SitemapUrl {
    loc:     format!("{base}{}", e.path()),
    lastmod: e.updated_at.format("%Y-%m-%d").to_string(),
  }));

  Ok(xml_response(write_sitemap(&urls)?))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_urlset() {
    let xml = String::from_utf8(write_sitemap(&[]).unwrap()).unwrap();
    assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#), "{xml}");
    assert!(xml.contains(SITEMAP_NS));
    assert!(!xml.contains("<url>"));
  }

  #[test]
  fn locations_are_escaped() {
    let urls = [SitemapUrl {
      loc:     "https://example.test/item/a&b".into(),
      lastmod: "2025-01-02".into(),
    }];
    let xml = String::from_utf8(write_sitemap(&urls).unwrap()).unwrap();
    assert!(xml.contains("<loc>https://example.test/item/a&amp;b</loc>"), "{xml}");
    assert!(xml.contains("<lastmod>2025-01-02</lastmod>"), "{xml}");
  }
}
