//! HTML rendering.
//!
//! Pages are plain functions from typed view data to `String`. Every piece of
//! text that did not come out of the markdown renderer goes through
//! [`escape`].

pub mod admin;
pub mod site;

use crate::auth::Gate;

pub const SITE_NAME: &str = "Portfolio";

/// Social preview image used when a page has none of its own.
pub const DEFAULT_IMAGE: &str = "/public/avatar.jpg";

/// Escape text for use in element content and double-quoted attributes.
pub fn escape(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  for c in text.chars() {
    match c {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#39;"),
      c => out.push(c),
    }
  }
  out
}

/// `<head>` metadata for public pages.
#[derive(Debug, Clone)]
pub struct PageMeta {
  pub title:       String,
  pub description: String,
  pub canonical:   String,
  pub image:       String,
}

impl PageMeta {
  fn bare(title: &str) -> Self {
    Self {
      title:       title.to_owned(),
      description: String::new(),
      canonical:   String::new(),
      image:       String::new(),
    }
  }
}

fn head(meta: &PageMeta) -> String {
  let mut out = format!(
    "<meta charset=\"utf-8\">\n<meta name=\"viewport\" content=\"width=device-width, \
     initial-scale=1\">\n<title>{}</title>\n",
    escape(&meta.title)
  );
  if !meta.description.is_empty() {
    out.push_str(&format!(
      "<meta name=\"description\" content=\"{}\">\n",
      escape(&meta.description)
    ));
  }
  if !meta.canonical.is_empty() {
    out.push_str(&format!("<link rel=\"canonical\" href=\"{}\">\n", escape(&meta.canonical)));
    out.push_str(&format!(
      "<meta property=\"og:url\" content=\"{}\">\n",
      escape(&meta.canonical)
    ));
  }
  out.push_str(&format!("<meta property=\"og:title\" content=\"{}\">\n", escape(&meta.title)));
  if !meta.image.is_empty() {
    out.push_str(&format!("<meta property=\"og:image\" content=\"{}\">\n", escape(&meta.image)));
  }
  out
}

/// Wrap a page body in the shared document shell.
pub fn layout(meta: &PageMeta, body_class: &str, body: &str) -> String {
  format!(
    "<!doctype html>\n<html lang=\"en\">\n<head>\n{head}</head>\n<body class=\"{class}\">\n\
     {body}\n</body>\n</html>\n",
    head = head(meta),
    class = escape(body_class),
  )
}

pub fn not_found() -> String {
  layout(
    &PageMeta::bare("Not found"),
    "page-error",
    "<main class=\"error\"><h1>404</h1><p>That page does not exist.</p>\
     <p><a href=\"/\">Back home</a></p></main>",
  )
}

pub fn server_error() -> String {
  layout(
    &PageMeta::bare("Something went wrong"),
    "page-error",
    "<main class=\"error\"><h1>500</h1><p>Something went wrong. Please try again.</p></main>",
  )
}

pub fn login(gate: Gate, next: &str, error: Option<&str>) -> String {
  let (title, intro) = match gate {
    Gate::Admin => ("Admin login", "Sign in to manage content."),
    Gate::Site => ("Private portfolio", "This portfolio is password protected."),
  };
  let error = error
    .map(|e| format!("<p class=\"form-error\" role=\"alert\">{}</p>", escape(e)))
    .unwrap_or_default();

  let body = format!(
    "<main class=\"login\">\n<h1>{title}</h1>\n<p>{intro}</p>\n{error}\n\
     <form method=\"post\" action=\"{action}\">\n\
     <input type=\"hidden\" name=\"next\" value=\"{next}\">\n\
     <label>Password <input type=\"password\" name=\"password\" autocomplete=\"current-password\" \
     autofocus required></label>\n\
     <button type=\"submit\">Sign in</button>\n</form>\n</main>",
    action = gate.login_path(),
    next = escape(next),
  );
  layout(&PageMeta::bare(title), "page-login", &body)
}
