//! First-start content: default categories and two draft example entries.

use rusqlite::Connection;

/// `(key, label, order_index)`
pub const DEFAULT_CATEGORIES: &[(&str, &str, i64)] = &[
  ("writing", "Writing", 10),
  ("component", "Components", 20),
  ("ux", "UX", 30),
];

struct SeedEntry {
  slug:          &'static str,
  title:         &'static str,
  subtitle:      &'static str,
  summary:       &'static str,
  role:          &'static str,
  timeframe:     &'static str,
  tools:         &'static str,
  tags:          &'static str,
  body_markdown: &'static str,
  kind:          &'static str,
  category:      Option<&'static str>,
  date:          &'static str,
}

const EXAMPLES: &[SeedEntry] = &[
  SeedEntry {
    slug:          "design-system-overhaul",
    title:         "Design system & UI consistency overhaul",
    subtitle:      "Scaling a B2B HR platform with a component-first approach",
    summary:       "Built a reusable component library and patterns to improve \
                    consistency, accessibility, and speed of delivery.",
    role:          "UI/UX Designer (Product)",
    timeframe:     "2024",
    tools:         "Figma, Design tokens, Component library",
    tags:          "Design System, UI, Accessibility",
    body_markdown: "## Context\nA complex B2B platform had accumulated inconsistent, \
                    duplicated UI patterns.\n\n## What I did\n- Audited UI patterns \
                    and documented inconsistencies\n- Created core components \
                    (buttons, inputs, tables, modals)\n- Defined typography, spacing \
                    and interaction patterns\n\n## Outcome\n- Faster design to dev \
                    handoff\n- Cleaner UI and fewer edge-case bugs\n",
    kind:          "project",
    category:      None,
    date:          "2024-06-01",
  },
  SeedEntry {
    slug:          "building-a-drawer-component",
    title:         "Building a Drawer Component",
    subtitle:      "A reusable pattern for dense B2B workflows",
    summary:       "A practical breakdown of the UX decisions behind a robust drawer pattern.",
    role:          "",
    timeframe:     "",
    tools:         "",
    tags:          "Components, UX",
    body_markdown: "## Why drawers?\nDrawers keep context while editing details.\n\n\
                    ## Key decisions\n- Focus management\n- Escape/backdrop behaviour\n\
                    - Scroll handling\n",
    kind:          "other",
    category:      Some("component"),
    date:          "2025-12-01",
  },
];

/// Insert the default categories when the table is empty.
pub fn seed_categories(conn: &Connection) -> rusqlite::Result<usize> {
  let count: i64 =
    conn.query_row("SELECT COUNT(*) FROM other_topic_categories", [], |r| r.get(0))?;
  if count > 0 {
    return Ok(0);
  }

  let mut stmt = conn.prepare(
    "INSERT INTO other_topic_categories (key, label, order_index) VALUES (?1, ?2, ?3)",
  )?;
  for (key, label, order) in DEFAULT_CATEGORIES {
    stmt.execute(rusqlite::params![key, label, order])?;
  }
  tracing::info!(count = DEFAULT_CATEGORIES.len(), "seeded default categories");
  Ok(DEFAULT_CATEGORIES.len())
}

/// Insert the draft examples when there are no entries at all.
pub fn seed_entries(conn: &Connection, now: &str) -> rusqlite::Result<usize> {
  let count: i64 = conn.query_row("SELECT COUNT(*) FROM projects", [], |r| r.get(0))?;
  if count > 0 {
    return Ok(0);
  }

  let mut stmt = conn.prepare(
    "INSERT INTO projects (
       slug, title, subtitle, summary, role, timeframe, tools, tags,
       hero_image, external_url, body_markdown, published, kind, category, date,
       created_at, updated_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, '', '', ?9, 0, ?10, ?11, ?12, ?13, ?13)",
  )?;
  for e in EXAMPLES {
    stmt.execute(rusqlite::params![
      e.slug,
      e.title,
      e.subtitle,
      e.summary,
      e.role,
      e.timeframe,
      e.tools,
      e.tags,
      e.body_markdown,
      e.kind,
      e.category,
      e.date,
      now,
    ])?;
  }
  tracing::info!(count = EXAMPLES.len(), "seeded example entries");
  Ok(EXAMPLES.len())
}
