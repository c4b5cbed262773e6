//! URL-safe identifiers derived from display names.

/// Fold `text` into a lowercase ASCII slug.
///
/// Accents are transliterated with [`deunicode`], quote characters are
/// dropped, and every other run of non-alphanumeric characters becomes a
/// single hyphen. The result never starts or ends with a hyphen.
pub fn slugify(text: &str) -> String {
  let ascii = deunicode::deunicode(text).to_lowercase();

  let mut slug = String::with_capacity(ascii.len());
  let mut pending_hyphen = false;
  for c in ascii.chars() {
    if c.is_ascii_alphanumeric() {
      if pending_hyphen && !slug.is_empty() {
        slug.push('-');
      }
      pending_hyphen = false;
      slug.push(c);
    } else if !matches!(c, '\'' | '"' | '`') {
      pending_hyphen = true;
    }
  }
  slug
}

/// The slug of a municipality: `slugify("{name}-{region}")`.
pub fn municipality_slug(name: &str, region: &str) -> String {
  slugify(&format!("{name}-{region}"))
}
