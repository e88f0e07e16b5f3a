//! Public pages.
//!
//! Links that should be counted carry `data-analytics` markers naming the
//! event and its fields, in the shape `/analytics/event` accepts.

use folio_core::entry::Entry;

use super::{PageMeta, SITE_NAME, escape, layout};

/// One entry in the home page topic filter.
#[derive(Debug, Clone, Copy)]
pub struct Topic<'a> {
  pub key:   &'a str,
  pub label: &'a str,
  pub count: i64,
}

/// A listed entry with its resolved section label.
#[derive(Debug, Clone, Copy)]
pub struct Listed<'a> {
  pub entry: &'a Entry,
  pub label: &'a str,
}

pub struct HomePage<'a> {
  pub meta:         PageMeta,
  pub active_topic: &'a str,
  pub topics:       &'a [Topic<'a>],
  pub items:        &'a [Listed<'a>],
  pub work:         &'a [Entry],
  pub lab:          &'a [Entry],
}

pub struct EntryPage<'a> {
  pub meta:      PageMeta,
  pub entry:     &'a Entry,
  pub label:     &'a str,
  pub body_html: &'a str,
}

/// `(section, href, label)`
const NAV_LINKS: [(&str, &str, &str); 5] = [
  ("work", "/#work", "Work"),
  ("lab", "/#lab", "Lab"),
  ("topics", "/#topics", "Topics"),
  ("about", "/about", "About"),
  ("contact", "/contact", "Contact"),
];

fn nav() -> String {
  let mut out =
    format!("<header class=\"site-header\">\n<a class=\"brand\" href=\"/\">{SITE_NAME}</a>\n<nav>");
  for (section, href, label) in NAV_LINKS {
    out.push_str(&format!(
      "<a href=\"{href}\" data-analytics=\"nav\" data-section=\"{section}\">{label}</a>"
    ));
  }
  out.push_str("</nav>\n</header>\n");
  out
}

fn page(meta: &PageMeta, class: &str, main: &str) -> String {
  let body = format!("{}<main>\n{main}</main>", nav());
  layout(meta, class, &body)
}

fn outbound_link(entry: &Entry, source: &str) -> String {
  if entry.external_url.is_empty() {
    return String::new();
  }
  let url = escape(&entry.external_url);
  format!(
    "<a class=\"outbound\" href=\"{url}\" target=\"_blank\" rel=\"noreferrer noopener\" \
     data-analytics=\"outbound\" data-slug=\"{slug}\" data-url=\"{url}\" \
     data-source=\"{source}\">Visit</a>",
    slug = escape(&entry.slug),
  )
}

fn card(entry: &Entry, label: &str, source: &str) -> String {
  let image = if entry.hero_image.is_empty() {
    String::new()
  } else {
    format!(
      "<img src=\"{}\" alt=\"\" loading=\"lazy\" decoding=\"async\">",
      escape(&entry.hero_image)
    )
  };
  format!(
    "<article class=\"card\">\n<a href=\"{path}\">{image}<span class=\"card-label\">{label}</span>\
     <h3>{title}</h3><p>{summary}</p></a>{outbound}\n</article>\n",
    path = escape(&entry.path()),
    label = escape(label),
    title = escape(&entry.title),
    summary = escape(&entry.summary),
    outbound = outbound_link(entry, source),
  )
}

fn section(id: &str, heading: &str, cards: &str) -> String {
  format!("<section id=\"{id}\">\n<h2>{heading}</h2>\n<div class=\"cards\">\n{cards}</div>\n</section>\n")
}

pub fn home(p: &HomePage<'_>) -> String {
  let mut main = String::new();

  if !p.work.is_empty() {
    let cards: String = p.work.iter().map(|e| card(e, "Projects", "home-work")).collect();
    main.push_str(&section("work", "Selected work", &cards));
  }
  if !p.lab.is_empty() {
    let cards: String = p.lab.iter().map(|e| card(e, "Lab", "home-lab")).collect();
    main.push_str(&section("lab", "Lab", &cards));
  }

  main.push_str("<section id=\"topics\">\n<h2>Topics</h2>\n<nav class=\"topics\">");
  for t in p.topics {
    let current = if t.key == p.active_topic { " aria-current=\"page\"" } else { "" };
    main.push_str(&format!(
      "<a href=\"/?topic={key}#topics\"{current}>{label} <span class=\"count\">{count}</span></a>",
      key = escape(&urlencoding::encode(t.key)),
      label = escape(t.label),
      count = t.count,
    ));
  }
  main.push_str("</nav>\n");
  if p.items.is_empty() {
    main.push_str("<p class=\"empty\">Nothing here yet.</p>\n");
  } else {
    main.push_str("<div class=\"cards\">\n");
    for item in p.items {
      main.push_str(&card(item.entry, item.label, "home-topics"));
    }
    main.push_str("</div>\n");
  }
  main.push_str("</section>\n");

  page(&p.meta, "page-home", &main)
}

pub fn about(meta: &PageMeta) -> String {
  let main = "<article class=\"prose\">\n<h1>About</h1>\n<p>I design and build products, \
              from early research through shipped interfaces.</p>\n<p>This site collects case \
              studies, lab experiments and shorter notes.</p>\n</article>\n";
  page(meta, "page-about", main)
}

pub fn contact(meta: &PageMeta) -> String {
  let main = "<article class=\"prose\">\n<h1>Contact</h1>\n<p>The best way to reach me is by \
              email. I read everything, though replies can take a few days.</p>\n</article>\n";
  page(meta, "page-contact", main)
}

pub fn entry(p: &EntryPage<'_>) -> String {
  let e = p.entry;
  let mut facts = String::new();
  for (name, value) in
    [("Role", &e.role), ("Timeframe", &e.timeframe), ("Tools", &e.tools), ("Tags", &e.tags)]
  {
    if !value.is_empty() {
      facts.push_str(&format!("<dt>{name}</dt><dd>{}</dd>", escape(value)));
    }
  }
  if let Some(date) = &e.date {
    facts.push_str(&format!("<dt>Date</dt><dd><time>{}</time></dd>", escape(date)));
  }

  let hero = if e.hero_image.is_empty() {
    String::new()
  } else {
    format!(
      "<figure class=\"hero\"><img src=\"{}\" alt=\"\" decoding=\"async\"></figure>\n",
      escape(&e.hero_image)
    )
  };
  let subtitle = if e.subtitle.is_empty() {
    String::new()
  } else {
    format!("<p class=\"subtitle\">{}</p>\n", escape(&e.subtitle))
  };

  let main = format!(
    "<article class=\"entry\">\n<header>\n<p class=\"entry-label\">{label}</p>\n<h1>{title}</h1>\n\
     {subtitle}</header>\n{hero}<dl class=\"facts\">{facts}</dl>\n{outbound}\n\
     <div class=\"prose\">\n{body}\n</div>\n</article>\n",
    label = escape(p.label),
    title = escape(&e.title),
    outbound = outbound_link(e, "entry"),
    body = p.body_html,
  );
  page(&p.meta, "page-entry", &main)
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use folio_core::entry::EntryKind;

  use super::*;

  fn entry(slug: &str, kind: EntryKind) -> Entry {
    let now = Utc::now();
    Entry {
      id:            1,
      slug:          slug.into(),
      title:         "A <b>title</b>".into(),
      subtitle:      String::new(),
      summary:       "Summary".into(),
      role:          "Lead".into(),
      timeframe:     String::new(),
      tools:         String::new(),
      tags:          String::new(),
      hero_image:    String::new(),
      external_url:  "https://example.test/x?a=1&b=2".into(),
      body_markdown: String::new(),
      published:     true,
      kind,
      category:      None,
      date:          None,
      created_at:    now,
      updated_at:    now,
    }
  }

  fn meta() -> PageMeta {
    PageMeta {
      title:       "T".into(),
      description: String::new(),
      canonical:   String::new(),
      image:       String::new(),
    }
  }

  #[test]
  fn entry_page_escapes_fields_but_not_body() {
    let e = entry("foo", EntryKind::Other);
    let html = super::entry(&EntryPage {
      meta:      meta(),
      entry:     &e,
      label:     "Writing",
      body_html: "<p>rendered</p>",
    });
    assert!(html.contains("A &lt;b&gt;title&lt;/b&gt;"));
    assert!(html.contains("<p>rendered</p>"));
    assert!(html.contains("<dt>Role</dt><dd>Lead</dd>"));
    assert!(!html.contains("<dt>Tools</dt>"));
  }

  #[test]
  fn outbound_links_are_marked_for_tracking() {
    let e = entry("foo", EntryKind::Project);
    let html = outbound_link(&e, "entry");
    assert!(html.contains(r#"data-analytics="outbound""#));
    assert!(html.contains(r#"data-slug="foo""#));
    assert!(html.contains(r#"data-url="https://example.test/x?a=1&amp;b=2""#));
  }

  #[test]
  fn topic_links_mark_the_active_one() {
    let topics = [
      Topic { key: "all", label: "All", count: 3 },
      Topic { key: "ux", label: "UX", count: 1 },
    ];
    let html = home(&HomePage {
      meta:         meta(),
      active_topic: "ux",
      topics:       &topics,
      items:        &[],
      work:         &[],
      lab:          &[],
    });
    assert!(html.contains(r##"<a href="/?topic=ux#topics" aria-current="page">UX"##));
    assert!(html.contains(r##"<a href="/?topic=all#topics">All"##));
    assert!(html.contains("Nothing here yet."));
  }
}
