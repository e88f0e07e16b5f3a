//! The HTML allow-list applied to every rendered body.

use std::{
  borrow::Cow,
  collections::{HashMap, HashSet},
};

use ammonia::Builder;

/// Tags allowed on top of ammonia's defaults: layout wrappers for richer
/// case-study boards plus a few inline content tags.
const EXTRA_TAGS: &[&str] = &[
  "div", "section", "span", "img", "h1", "h2", "h3", "h4", "h5", "h6", "figure",
  "figcaption", "hr", "s", "del", "ins", "kbd",
];

/// Allowed on any element.
const GENERIC_ATTRIBUTES: &[&str] = &["id", "class"];

const URL_SCHEMES: &[&str] = &["http", "https", "mailto"];

/// `target` and `rel` on links are always forced, so they are not listed here.
const LINK_ATTRIBUTES: &[&str] = &["href", "name"];

const IMAGE_ATTRIBUTES: &[&str] = &["src", "alt", "title", "loading", "decoding"];

pub fn sanitize(html: &str) -> String {
  let tag_attributes = HashMap::from([
    ("a", LINK_ATTRIBUTES.iter().copied().collect::<HashSet<_>>()),
    ("img", IMAGE_ATTRIBUTES.iter().copied().collect()),
  ]);

  let mut builder = Builder::default();
  builder
    .add_tags(EXTRA_TAGS)
    .tag_attributes(tag_attributes)
    .generic_attributes(GENERIC_ATTRIBUTES.iter().copied().collect())
    .url_schemes(URL_SCHEMES.iter().copied().collect())
    .link_rel(Some("noreferrer noopener"))
    .set_tag_attribute_value("a", "target", "_blank")
    .attribute_filter(|_element, attribute, value| {
      // Relative paths such as /uploads/... are fine, protocol-relative
      // URLs are not.
      if matches!(attribute, "href" | "src") && value.starts_with("//") {
        None
      } else {
        Some(Cow::Borrowed(value))
      }
    });

  builder.clean(html).to_string()
}

#[cfg(test)]
mod tests {
  use super::sanitize;

  #[test]
  fn protocol_relative_src_is_removed() {
    let out = sanitize(r#"<img src="//evil.test/x.png" alt="x">"#);
    assert!(!out.contains("evil.test"), "{out}");
    assert!(out.contains(r#"alt="x""#), "{out}");
  }

  #[test]
  fn style_attributes_are_removed() {
    let out = sanitize(r#"<div style="position:fixed">x</div>"#);
    assert_eq!(out, "<div>x</div>");
  }

  #[test]
  fn unknown_tags_are_unwrapped() {
    let out = sanitize("<marquee>hi</marquee>");
    assert_eq!(out, "hi");
  }

  #[test]
  fn iframes_are_removed() {
    let out = sanitize(r#"<iframe src="https://x.test"></iframe><p>ok</p>"#);
    assert!(!out.contains("iframe"), "{out}");
    assert!(out.contains("<p>ok</p>"), "{out}");
  }
}
