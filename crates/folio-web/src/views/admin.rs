//! Admin CMS pages.

use folio_core::{
  analytics::{DashboardStats, Report},
  category::Category,
  entry::{Entry, EntryDraft, EntryKind},
  store::{KindCount, count_totals},
};

use super::{PageMeta, escape, layout};

pub struct IndexPage<'a> {
  pub entries: &'a [Entry],
  pub kind:    Option<EntryKind>,
  pub q:       &'a str,
  pub counts:  &'a [KindCount],
  pub stats:   &'a DashboardStats,
}

pub struct EditPage<'a> {
  /// `None` when creating.
  pub id:         Option<i64>,
  pub draft:      &'a EntryDraft,
  pub hero_image: &'a str,
  pub categories: &'a [Category],
  pub error:      Option<&'a str>,
}

fn page(title: &str, main: &str) -> String {
  let meta = PageMeta::bare(&format!("{title} | Admin"));
  let body = format!(
    "<header class=\"admin-header\">\n<nav><a href=\"/admin\">Entries</a> \
     <a href=\"/admin/new\">New entry</a> <a href=\"/admin/reports\">Reports</a> \
     <a href=\"/\">View site</a></nav>\n\
     <form method=\"post\" action=\"/auth/logout\"><button type=\"submit\">Log out</button></form>\n\
     </header>\n<main class=\"admin\">\n{main}</main>"
  );
  layout(&meta, "page-admin", &body)
}

fn post_button(action: &str, label: &str, redirect: Option<&str>) -> String {
  let redirect = redirect
    .map(|r| format!("<input type=\"hidden\" name=\"redirect\" value=\"{}\">", escape(r)))
    .unwrap_or_default();
  format!(
    "<form method=\"post\" action=\"{}\" class=\"inline\">{redirect}<button type=\"submit\">{}</button></form>",
    escape(action),
    escape(label),
  )
}

// ─── Index ────────────────────────────────────────────────────────────────────

pub fn index(p: &IndexPage<'_>) -> String {
  let mut main = String::from("<h1>Entries</h1>\n");

  let s = p.stats;
  main.push_str(&format!(
    "<ul class=\"stats\"><li>Home views <strong>{}</strong></li>\
     <li>Item views <strong>{}</strong></li><li>Outbound clicks <strong>{}</strong></li>",
    s.home_views, s.item_views_total, s.outbound_total,
  ));
  if let Some(top) = &s.top_item {
    main.push_str(&format!(
      "<li>Top item <strong>{}</strong> ({})</li>",
      escape(&top.title),
      top.count
    ));
  }
  main.push_str("</ul>\n");

  let (published, draft, total) = count_totals(p.counts);
  main.push_str(
    "<table class=\"counts\"><thead><tr><th>Kind</th><th>Published</th><th>Draft</th>\
     <th>Total</th></tr></thead><tbody>",
  );
  for c in p.counts {
    main.push_str(&format!(
      "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
      c.kind, c.published, c.draft, c.total
    ));
  }
  main.push_str(&format!(
    "<tr class=\"total\"><td>All</td><td>{published}</td><td>{draft}</td><td>{total}</td></tr>\
     </tbody></table>\n"
  ));

  let current = p.kind.map_or("", EntryKind::as_str);
  main.push_str("<form method=\"get\" action=\"/admin\" class=\"filters\">\n<select name=\"kind\">");
  main.push_str(&option("", "All kinds", current));
  for kind in EntryKind::CURRENT {
    main.push_str(&option(kind.as_str(), kind.as_str(), current));
  }
  main.push_str(&format!(
    "</select>\n<input type=\"search\" name=\"q\" value=\"{}\" placeholder=\"Search\">\n\
     <button type=\"submit\">Filter</button>\n</form>\n",
    escape(p.q)
  ));

  if p.entries.is_empty() {
    main.push_str("<p class=\"empty\">No entries match.</p>\n");
    return page("Entries", &main);
  }

  let back = admin_list_url(p.kind, p.q);
  main.push_str(
    "<table class=\"entries\"><thead><tr><th>Title</th><th>Kind</th><th>Status</th>\
     <th>Updated</th><th></th></tr></thead><tbody>\n",
  );
  for e in p.entries {
    let (status, toggle) =
      if e.published { ("Published", "Unpublish") } else { ("Draft", "Publish") };
    main.push_str(&format!(
      "<tr><td><a href=\"/admin/edit/{id}\">{title}</a><br><code>{slug}</code></td>\
       <td>{kind}</td><td>{status}</td><td>{updated}</td><td>{view}{toggle}{delete}</td></tr>\n",
      id = e.id,
      title = escape(&e.title),
      slug = escape(&e.slug),
      kind = e.kind,
      updated = e.updated_at.format("%Y-%m-%d"),
      view = if e.published {
        format!("<a href=\"{}\">View</a>", escape(&e.path()))
      } else {
        String::new()
      },
      toggle = post_button(&format!("/admin/toggle-publish/{}", e.id), toggle, Some(&back)),
      delete = post_button(&format!("/admin/delete/{}", e.id), "Delete", None),
    ));
  }
  main.push_str("</tbody></table>\n");

  page("Entries", &main)
}

/// The list URL with its filters, so toggling returns to the same view.
fn admin_list_url(kind: Option<EntryKind>, q: &str) -> String {
  let mut params = Vec::new();
  if let Some(kind) = kind {
    params.push(format!("kind={kind}"));
  }
  if !q.is_empty() {
    params.push(format!("q={}", urlencoding::encode(q)));
  }
  if params.is_empty() {
    "/admin".to_owned()
  } else {
    format!("/admin?{}", params.join("&"))
  }
}

fn option(value: &str, label: &str, current: &str) -> String {
  let selected = if value == current { " selected" } else { "" };
  format!("<option value=\"{}\"{selected}>{}</option>", escape(value), escape(label))
}

// ─── Reports ──────────────────────────────────────────────────────────────────

pub fn reports(r: &Report) -> String {
  let mut main = format!(
    "<h1>Reports</h1>\n<ul class=\"stats\"><li>Home views <strong>{}</strong></li>\
     <li>Item views <strong>{}</strong></li><li>Outbound clicks <strong>{}</strong></li></ul>\n",
    r.home_views, r.item_views_total, r.outbound_total,
  );

  main.push_str("<h2>Top items</h2>\n");
  let rows: Vec<_> = r
    .top_items
    .iter()
    .map(|t| vec![escape(&t.title), escape(&t.slug), t.count.to_string()])
    .collect();
  main.push_str(&table(&["Title", "Slug", "Views"], &rows));

  main.push_str("<h2>Outbound clicks</h2>\n");
  let rows: Vec<_> = r
    .top_outbound
    .iter()
    .map(|o| vec![escape(&o.slug), escape(&o.url), escape(&o.source), o.count.to_string()])
    .collect();
  main.push_str(&table(&["Slug", "URL", "Source", "Clicks"], &rows));

  main.push_str("<h2>Navigation</h2>\n");
  let rows: Vec<_> = r
    .nav_clicks
    .iter()
    .map(|n| vec![escape(&n.section), escape(&n.href), n.count.to_string()])
    .collect();
  main.push_str(&table(&["Section", "Link", "Clicks"], &rows));

  page("Reports", &main)
}

/// Cells must already be escaped.
fn table(headings: &[&str], rows: &[Vec<String>]) -> String {
  if rows.is_empty() {
    return "<p class=\"empty\">No data yet.</p>\n".to_owned();
  }
  let mut out = String::from("<table><thead><tr>");
  for h in headings {
    out.push_str(&format!("<th>{h}</th>"));
  }
  out.push_str("</tr></thead><tbody>\n");
  for row in rows {
    out.push_str("<tr>");
    for cell in row {
      out.push_str(&format!("<td>{cell}</td>"));
    }
    out.push_str("</tr>\n");
  }
  out.push_str("</tbody></table>\n");
  out
}

// ─── Edit ─────────────────────────────────────────────────────────────────────

fn text_input(label: &str, name: &str, value: Option<&String>, extra: &str) -> String {
  format!(
    "<label>{label} <input type=\"text\" name=\"{name}\" value=\"{}\"{extra}></label>\n",
    escape(value.map_or("", String::as_str)),
  )
}

pub fn edit(p: &EditPage<'_>) -> String {
  let d = p.draft;
  let (title, action) = match p.id {
    Some(id) => ("Edit entry", format!("/admin/edit/{id}")),
    None => ("New entry", "/admin/new".to_owned()),
  };

  let mut main = format!("<h1>{title}</h1>\n");
  if let Some(error) = p.error {
    main.push_str(&format!("<p class=\"form-error\" role=\"alert\">{}</p>\n", escape(error)));
  }

  main.push_str(&format!("<form method=\"post\" action=\"{action}\" class=\"entry-form\">\n"));
  main.push_str(&text_input("Title", "title", d.title.as_ref(), " required"));
  main.push_str(&text_input("Slug", "slug", d.slug.as_ref(), " required"));

  let kind = d.kind.as_deref().unwrap_or(EntryKind::Project.as_str());
  main.push_str("<label>Kind <select name=\"kind\">");
  for k in EntryKind::CURRENT {
    main.push_str(&option(k.as_str(), k.as_str(), kind));
  }
  main.push_str("</select></label>\n");

  let category = d.category.as_deref().unwrap_or("");
  main.push_str("<label>Category <select name=\"category\">");
  main.push_str(&option("", "None", category));
  for c in p.categories {
    main.push_str(&option(&c.key, &c.label, category));
  }
  main.push_str("</select></label>\n");

  main.push_str(&text_input("Subtitle", "subtitle", d.subtitle.as_ref(), ""));
  main.push_str(&format!(
    "<label>Summary <textarea name=\"summary\" rows=\"3\">{}</textarea></label>\n",
    escape(d.summary.as_deref().unwrap_or(""))
  ));
  main.push_str(&text_input("Role", "role", d.role.as_ref(), ""));
  main.push_str(&text_input("Timeframe", "timeframe", d.timeframe.as_ref(), ""));
  main.push_str(&text_input("Tools", "tools", d.tools.as_ref(), ""));
  main.push_str(&text_input("Tags", "tags", d.tags.as_ref(), ""));
  main.push_str(&text_input("External URL", "external_url", d.external_url.as_ref(), ""));
  main.push_str(&format!(
    "<label>Date <input type=\"date\" name=\"date\" value=\"{}\"></label>\n",
    escape(d.date.as_deref().unwrap_or(""))
  ));
  main.push_str(&format!(
    "<label>Body <textarea name=\"body_markdown\" rows=\"20\" data-markdown-preview>{}</textarea>\
     </label>\n",
    escape(d.body_markdown.as_deref().unwrap_or(""))
  ));
  let checked = if d.published.is_some() { " checked" } else { "" };
  main.push_str(&format!(
    "<label><input type=\"checkbox\" name=\"published\" value=\"1\"{checked}> Published</label>\n\
     <button type=\"submit\">Save</button>\n</form>\n"
  ));

  if let Some(id) = p.id {
    main.push_str("<section class=\"hero-image\">\n<h2>Hero image</h2>\n");
    if p.hero_image.is_empty() {
      main.push_str("<p class=\"empty\">No hero image.</p>\n");
    } else {
      main.push_str(&format!(
        "<img src=\"{}\" alt=\"\" class=\"hero-preview\">\n",
        escape(p.hero_image)
      ));
      main.push_str(&post_button(&format!("/admin/remove-hero/{id}"), "Remove image", None));
    }
    main.push_str(&format!(
      "<form method=\"post\" action=\"/admin/upload-hero/{id}\" enctype=\"multipart/form-data\">\n\
       <input type=\"file\" name=\"hero\" accept=\"image/jpeg,image/png,image/webp,image/gif\" \
       required>\n<button type=\"submit\">Upload</button>\n</form>\n</section>\n"
    ));
  }

  page(title, &main)
}
