//! Markdown renderer for folio entries.
//!
//! Author markdown is converted to HTML, then passed through an allow-list
//! sanitizer so stored content can never inject script. Pure synchronous; no
//! HTTP or database dependencies.
//!
//! ```
//! let html = folio_markdown::render("![a cat](/uploads/cat.png)");
//! assert!(html.contains(r#"loading="lazy""#));
//! ```

mod images;
mod sanitize;

use pulldown_cmark::{Options, Parser, html};

/// Render `markdown` to sanitized HTML.
pub fn render(markdown: &str) -> String {
  let mut options = Options::empty();
  options.insert(Options::ENABLE_TABLES);
  options.insert(Options::ENABLE_STRIKETHROUGH);

  let mut raw = String::with_capacity(markdown.len() * 3 / 2);
  html::push_html(&mut raw, Parser::new_ext(markdown, options));

  let clean = sanitize::sanitize(&raw);
  images::apply_image_defaults(&clean)
}

#[cfg(test)]
mod tests {
  use super::render;

  #[test]
  fn basic_markdown() {
    let html = render("## Context\n\nSome *emphasis* and ~~strike~~.\n\n- one\n- two\n");
    assert!(html.contains("<h2>Context</h2>"), "{html}");
    assert!(html.contains("<em>emphasis</em>"), "{html}");
    assert!(html.contains("<del>strike</del>"), "{html}");
    assert!(html.contains("<li>one</li>"), "{html}");
  }

  #[test]
  fn script_is_stripped() {
    let html = render("Hello\n\n<script>alert('x')</script>\n\n<p onclick=\"evil()\">hi</p>");
    assert!(!html.contains("<script"), "{html}");
    assert!(!html.contains("alert("), "{html}");
    assert!(!html.contains("onclick"), "{html}");
    assert!(html.contains("Hello"), "{html}");
  }

  #[test]
  fn javascript_links_are_dropped() {
    let html = render("[click](javascript:alert(1))");
    assert!(!html.contains("javascript:"), "{html}");
  }

  #[test]
  fn markdown_image_keeps_src_alt_and_gets_defaults() {
    let html = render("![A diagram](/uploads/abc.png)");
    assert!(html.contains(r#"src="/uploads/abc.png""#), "{html}");
    assert!(html.contains(r#"alt="A diagram""#), "{html}");
    assert!(html.contains(r#"loading="lazy""#), "{html}");
    assert!(html.contains(r#"decoding="async""#), "{html}");
  }

  #[test]
  fn explicit_loading_attribute_is_kept() {
    let html = render(r#"<img src="https://cdn.test/a.png" alt="a" loading="eager">"#);
    assert!(html.contains(r#"loading="eager""#), "{html}");
    assert!(!html.contains(r#"loading="lazy""#), "{html}");
    assert!(html.contains(r#"decoding="async""#), "{html}");
  }

  #[test]
  fn links_open_in_new_tab() {
    let html = render("[site](https://example.com)");
    assert!(html.contains(r#"href="https://example.com""#), "{html}");
    assert!(html.contains(r#"target="_blank""#), "{html}");
    assert!(html.contains("noopener"), "{html}");
  }

  #[test]
  fn layout_wrappers_and_classes_survive() {
    let html = render("<section class=\"board\"><div id=\"x\"><kbd>K</kbd></div></section>");
    assert!(html.contains(r#"<section class="board">"#), "{html}");
    assert!(html.contains(r#"<div id="x">"#), "{html}");
    assert!(html.contains("<kbd>K</kbd>"), "{html}");
  }

  #[test]
  fn empty_input_renders_empty() {
    assert_eq!(render(""), "");
  }
}
