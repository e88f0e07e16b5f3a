//! Categories sub-classify entries of kind [`Other`](crate::entry::EntryKind::Other).
//!
//! The link from an entry to its category is by key only. An entry whose
//! category no longer exists is shown under [`FALLBACK_LABEL`].

use serde::{Deserialize, Serialize};

/// Label used for entries whose category key matches nothing.
pub const FALLBACK_LABEL: &str = "Other";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
  pub key:         String,
  pub label:       String,
  pub order_index: i64,
}

/// Resolve a category key to its display label.
pub fn label_for<'a>(categories: &'a [Category], key: Option<&str>) -> &'a str {
  key
    .and_then(|k| categories.iter().find(|c| c.key == k))
    .map(|c| c.label.as_str())
    .unwrap_or(FALLBACK_LABEL)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn orphaned_key_gets_fallback_label() {
    let cats = vec![Category { key: "ux".into(), label: "UX".into(), order_index: 1 }];
    assert_eq!(label_for(&cats, Some("ux")), "UX");
    assert_eq!(label_for(&cats, Some("gone")), FALLBACK_LABEL);
    assert_eq!(label_for(&cats, None), FALLBACK_LABEL);
  }
}
