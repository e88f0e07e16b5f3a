//! Entries: the unit of content on the site.
//!
//! An entry is a project, a lab experiment, or an "other" post filed under a
//! [`Category`](crate::category::Category). Entries are created and edited
//! through [`EntryInput`], which is only ever produced by validating an
//! [`EntryDraft`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Kind ────────────────────────────────────────────────────────────────────

/// Which listing section an entry belongs to.
///
/// `Writing`, `Component` and `Ux` are legacy values from before "other"
/// posts carried a category. The store rewrites them to `Other` once; they
/// remain decodable so a hand-edited row never breaks a read.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum EntryKind {
  Project,
  Lab,
  Other,
  Writing,
  Component,
  Ux,
}

impl EntryKind {
  /// Kinds offered when authoring new content.
  pub const CURRENT: [EntryKind; 3] = [Self::Project, Self::Lab, Self::Other];

  pub fn as_str(self) -> &'static str { self.into() }

  /// Project and lab entries live under `/project/<slug>`; everything else
  /// under `/item/<slug>`.
  pub fn has_project_page(self) -> bool { matches!(self, Self::Project | Self::Lab) }

  /// The category a legacy kind is migrated to, if this is a legacy kind.
  pub fn legacy_category(self) -> Option<&'static str> {
    match self {
      Self::Writing => Some("writing"),
      Self::Component => Some("component"),
      Self::Ux => Some("ux"),
      Self::Project | Self::Lab | Self::Other => None,
    }
  }

  /// Public path of an entry of this kind.
  pub fn path_for(self, slug: &str) -> String {
    if self.has_project_page() {
      format!("/project/{slug}")
    } else {
      format!("/item/{slug}")
    }
  }

  /// Map the loose admin filter vocabulary onto a kind. `None` means "all";
  /// unknown values also fall back to "all".
  pub fn from_filter(raw: &str) -> Option<EntryKind> {
    match raw.trim().to_ascii_lowercase().as_str() {
      "project" | "projects" => Some(Self::Project),
      "lab" | "labs" => Some(Self::Lab),
      "other" | "writing" | "post" | "posts" | "component" | "components"
      | "ux" => Some(Self::Other),
      _ => None,
    }
  }
}

// ─── Entry ───────────────────────────────────────────────────────────────────

/// A persisted entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
  pub id:            i64,
  pub slug:          String,
  pub title:         String,
  pub subtitle:      String,
  pub summary:       String,
  pub role:          String,
  pub timeframe:     String,
  pub tools:         String,
  pub tags:          String,
  /// Relative URL of the hero image, or empty.
  pub hero_image:    String,
  pub external_url:  String,
  pub body_markdown: String,
  pub published:     bool,
  pub kind:          EntryKind,
  /// Only meaningful when `kind` is [`EntryKind::Other`].
  pub category:      Option<String>,
  /// Author-supplied display date, e.g. `2024-06-01`.
  pub date:          Option<String>,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
}

impl Entry {
  pub fn path(&self) -> String { self.kind.path_for(&self.slug) }

  pub fn has_local_hero(&self) -> bool { is_local_upload(&self.hero_image) }
}

/// Whether `url` points at a file this site stored itself.
pub fn is_local_upload(url: &str) -> bool { url.starts_with("/uploads/") }

// ─── Input ───────────────────────────────────────────────────────────────────

/// Raw, untrusted entry fields as submitted by the admin form.
///
/// Every field is optional; [`EntryDraft::validate`] applies the defaulting
/// rules and produces an [`EntryInput`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryDraft {
  pub slug:          Option<String>,
  pub title:         Option<String>,
  pub subtitle:      Option<String>,
  pub summary:       Option<String>,
  pub role:          Option<String>,
  pub timeframe:     Option<String>,
  pub tools:         Option<String>,
  pub tags:          Option<String>,
  pub external_url:  Option<String>,
  pub body_markdown: Option<String>,
  /// Checkbox field: present means checked.
  pub published:     Option<String>,
  pub kind:          Option<String>,
  pub category:      Option<String>,
  pub date:          Option<String>,
}

/// Validated fields for creating or overwriting an entry.
///
/// `hero_image` is deliberately absent: it is managed through uploads only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryInput {
  pub slug:          String,
  pub title:         String,
  pub subtitle:      String,
  pub summary:       String,
  pub role:          String,
  pub timeframe:     String,
  pub tools:         String,
  pub tags:          String,
  pub external_url:  String,
  pub body_markdown: String,
  pub published:     bool,
  pub kind:          EntryKind,
  pub category:      Option<String>,
  pub date:          Option<String>,
}

impl EntryInput {
  /// A draft-state input with every optional field empty.
  pub fn new(slug: impl Into<String>, title: impl Into<String>, kind: EntryKind) -> Self {
    Self {
      slug: slug.into(),
      title: title.into(),
      subtitle: String::new(),
      summary: String::new(),
      role: String::new(),
      timeframe: String::new(),
      tools: String::new(),
      tags: String::new(),
      external_url: String::new(),
      body_markdown: String::new(),
      published: false,
      kind,
      category: None,
      date: None,
    }
  }
}

impl From<&Entry> for EntryDraft {
  fn from(e: &Entry) -> Self {
    Self {
      slug:          Some(e.slug.clone()),
      title:         Some(e.title.clone()),
      subtitle:      Some(e.subtitle.clone()),
      summary:       Some(e.summary.clone()),
      role:          Some(e.role.clone()),
      timeframe:     Some(e.timeframe.clone()),
      tools:         Some(e.tools.clone()),
      tags:          Some(e.tags.clone()),
      external_url:  Some(e.external_url.clone()),
      body_markdown: Some(e.body_markdown.clone()),
      published:     e.published.then(|| "on".to_owned()),
      kind:          Some(e.kind.to_string()),
      category:      e.category.clone(),
      date:          e.date.clone(),
    }
  }
}

impl EntryDraft {
  /// Apply the per-field defaulting rules and reject unusable input.
  pub fn validate(&self) -> Result<EntryInput> {
    let slug = trimmed(&self.slug);
    if slug.is_empty() {
      return Err(Error::validation("slug", "is required"));
    }
    if let Some(bad) = slug
      .chars()
      .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
    {
      return Err(Error::validation(
        "slug",
        format!("may only contain letters, digits, '-' and '_' (found {bad:?})"),
      ));
    }

    let title = trimmed(&self.title);
    if title.is_empty() {
      return Err(Error::validation("title", "is required"));
    }

    let parsed = trimmed(&self.kind).parse().unwrap_or(EntryKind::Project);
    // Legacy kinds are accepted as `other` in their matching category.
    let (kind, legacy_category) = match parsed.legacy_category() {
      Some(category) => (EntryKind::Other, Some(category)),
      None => (parsed, None),
    };

    let category = match kind {
      EntryKind::Other => non_empty(&self.category)
        .map(|c| c.to_ascii_lowercase())
        .or_else(|| legacy_category.map(str::to_owned)),
      _ => None,
    };

    Ok(EntryInput {
      slug: slug.to_owned(),
      title: title.to_owned(),
      subtitle: text(&self.subtitle),
      summary: text(&self.summary),
      role: text(&self.role),
      timeframe: text(&self.timeframe),
      tools: text(&self.tools),
      tags: text(&self.tags),
      external_url: trimmed(&self.external_url).to_owned(),
      body_markdown: self.body_markdown.clone().unwrap_or_default(),
      published: checkbox(&self.published),
      kind,
      category,
      date: non_empty(&self.date),
    })
  }
}

fn trimmed(v: &Option<String>) -> &str { v.as_deref().map(str::trim).unwrap_or("") }

fn text(v: &Option<String>) -> String { trimmed(v).to_owned() }

fn non_empty(v: &Option<String>) -> Option<String> {
  Some(trimmed(v)).filter(|s| !s.is_empty()).map(str::to_owned)
}

fn checkbox(v: &Option<String>) -> bool {
  match v.as_deref().map(str::trim) {
    None => false,
    Some(s) => !matches!(s.to_ascii_lowercase().as_str(), "" | "0" | "false" | "off"),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn draft(slug: &str, title: &str) -> EntryDraft {
    EntryDraft {
      slug: Some(slug.into()),
      title: Some(title.into()),
      ..Default::default()
    }
  }

  #[test]
  fn defaults_fill_missing_fields() {
    let input = draft(" foo ", "Foo").validate().unwrap();
    assert_eq!(input.slug, "foo");
    assert_eq!(input.kind, EntryKind::Project);
    assert_eq!(input.subtitle, "");
    assert!(!input.published);
    assert_eq!(input.date, None);
    assert_eq!(input.category, None);
  }

  #[test]
  fn slug_and_title_are_required() {
    assert!(matches!(
      draft("", "Foo").validate(),
      Err(Error::Validation { field: "slug", .. })
    ));
    assert!(matches!(
      draft("foo", "  ").validate(),
      Err(Error::Validation { field: "title", .. })
    ));
  }

  #[test]
  fn slug_must_be_url_safe() {
    assert!(draft("foo bar", "Foo").validate().is_err());
    assert!(draft("../etc", "Foo").validate().is_err());
    assert!(draft("foo-bar_2", "Foo").validate().is_ok());
  }

  #[test]
  fn legacy_kinds_become_other() {
    let mut d = draft("foo", "Foo");
    d.kind = Some("UX".into());
    let input = d.validate().unwrap();
    assert_eq!(input.kind, EntryKind::Other);
    assert_eq!(input.category.as_deref(), Some("ux"));
  }

  #[test]
  fn category_only_kept_for_other_kind() {
    let mut d = draft("foo", "Foo");
    d.category = Some("Writing".into());
    assert_eq!(d.validate().unwrap().category, None);

    d.kind = Some("other".into());
    assert_eq!(d.validate().unwrap().category.as_deref(), Some("writing"));
  }

  #[test]
  fn checkbox_values() {
    let mut d = draft("foo", "Foo");
    for (raw, expected) in [("on", true), ("1", true), ("0", false), ("", false), ("off", false)] {
      d.published = Some(raw.into());
      assert_eq!(d.validate().unwrap().published, expected, "value {raw:?}");
    }
  }

  #[test]
  fn unknown_kind_defaults_to_project() {
    let mut d = draft("foo", "Foo");
    d.kind = Some("podcast".into());
    assert_eq!(d.validate().unwrap().kind, EntryKind::Project);
    d.kind = Some("LAB".into());
    assert_eq!(d.validate().unwrap().kind, EntryKind::Lab);
  }

  #[test]
  fn filter_vocabulary() {
    assert_eq!(EntryKind::from_filter("projects"), Some(EntryKind::Project));
    assert_eq!(EntryKind::from_filter("writing"), Some(EntryKind::Other));
    assert_eq!(EntryKind::from_filter("all"), None);
    assert_eq!(EntryKind::from_filter("nonsense"), None);
  }

  #[test]
  fn paths_depend_on_kind() {
    assert_eq!(EntryKind::Lab.path_for("x"), "/project/x");
    assert_eq!(EntryKind::Other.path_for("x"), "/item/x");
  }
}
