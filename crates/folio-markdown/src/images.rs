//! Default `loading`/`decoding` attributes for images.
//!
//! Runs on sanitizer output, which is serialized HTML with every attribute
//! value double-quoted and `"` escaped inside values.

const DEFAULTS: &[(&str, &str)] = &[("loading", "lazy"), ("decoding", "async")];

pub fn apply_image_defaults(html: &str) -> String {
  let mut out = String::with_capacity(html.len() + 64);
  let mut rest = html;

  while let Some(start) = find_img(rest) {
    let (before, tag_and_after) = rest.split_at(start);
    out.push_str(before);

    let Some(end) = tag_end(tag_and_after) else {
      // Unterminated tag; leave the remainder untouched.
      out.push_str(tag_and_after);
      return out;
    };

    let tag = &tag_and_after[..end];
    let names = attribute_names(tag);
    let (body, closer) = match tag.strip_suffix('/') {
      Some(body) => (body.trim_end(), "/>"),
      None => (tag, ">"),
    };

    out.push_str(body);
    for (name, value) in DEFAULTS {
      if !names.iter().any(|n| n.eq_ignore_ascii_case(name)) {
        out.push_str(&format!(" {name}=\"{value}\""));
      }
    }
    out.push_str(closer);

    rest = &tag_and_after[end + 1..];
  }

  out.push_str(rest);
  out
}

/// Byte offset of the next `<img` tag opening.
fn find_img(s: &str) -> Option<usize> {
  let mut from = 0;
  while let Some(pos) = s[from..].find("<img") {
    let at = from + pos;
    match s.as_bytes().get(at + 4) {
      Some(b) if b.is_ascii_whitespace() || *b == b'>' || *b == b'/' => return Some(at),
      None => return None,
      _ => from = at + 4,
    }
  }
  None
}

/// Offset of the `>` closing the tag at the start of `s`, skipping quoted
/// attribute values.
fn tag_end(s: &str) -> Option<usize> {
  let mut quoted = false;
  for (i, b) in s.bytes().enumerate() {
    match b {
      b'"' => quoted = !quoted,
      b'>' if !quoted => return Some(i),
      _ => {}
    }
  }
  None
}

/// Attribute names of a tag without its closing `>`, e.g. `<img src="a" alt>`.
fn attribute_names(tag: &str) -> Vec<&str> {
  let mut names = Vec::new();
  let inner = tag.trim_start_matches("<img");
  let bytes = inner.as_bytes();
  let mut i = 0;

  while i < bytes.len() {
    match bytes[i] {
      b if b.is_ascii_whitespace() || b == b'/' => i += 1,
      b'"' => {
        // Skip a quoted value.
        i += 1;
        while i < bytes.len() && bytes[i] != b'"' {
          i += 1;
        }
        i += 1;
      }
      b'=' => i += 1,
      _ => {
        let start = i;
        while i < bytes.len()
          && !matches!(bytes[i], b'=' | b'"' | b'/')
          && !bytes[i].is_ascii_whitespace()
        {
          i += 1;
        }
        // Only names followed by `=`, whitespace or the end are attributes;
        // unquoted values never reach here after sanitizing.
        names.push(&inner[start..i]);
      }
    }
  }
  names
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn adds_missing_defaults() {
    assert_eq!(
      apply_image_defaults(r#"<p><img src="a.png" alt="a"></p>"#),
      r#"<p><img src="a.png" alt="a" loading="lazy" decoding="async"></p>"#
    );
  }

  #[test]
  fn keeps_existing_values() {
    assert_eq!(
      apply_image_defaults(r#"<img loading="eager" decoding="sync" src="a.png">"#),
      r#"<img loading="eager" decoding="sync" src="a.png">"#
    );
  }

  #[test]
  fn ignores_gt_inside_values_and_lookalike_tags() {
    let html = r#"<imgx>t</imgx><img alt="a > b" src="x">"#;
    assert_eq!(
      apply_image_defaults(html),
      r#"<imgx>t</imgx><img alt="a > b" src="x" loading="lazy" decoding="async">"#
    );
  }

  #[test]
  fn attribute_names_skip_values() {
    assert_eq!(
      attribute_names(r#"<img alt="loading=lazy" src="x""#),
      vec!["alt", "src"]
    );
  }

  #[test]
  fn handles_self_closing_form() {
    assert_eq!(
      apply_image_defaults(r#"<img src="a.png" />"#),
      r#"<img src="a.png" loading="lazy" decoding="async"/>"#
    );
  }
}
