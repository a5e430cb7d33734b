//! Request path canonicalization.
//!
//! Paths are cleaned before route lookup: `.` and `..` segments are resolved
//! (their `%2e` spellings included) and empty segments collapse. A request
//! whose path changes under cleaning is redirected to the clean form and never
//! reaches an upstream, so a mount point cannot be left through `..`.

use std::borrow::Cow;

/// Segment made only of dots, counting `%2e` as a dot.
fn dot_count(segment: &str) -> Option<usize> {
    let mut dots = 0;
    let mut rest = segment;
    while !rest.is_empty() {
        if let Some(tail) = rest.strip_prefix('.') {
            rest = tail;
        } else if rest.len() >= 3 && rest.as_bytes()[..3].eq_ignore_ascii_case(b"%2e") {
            rest = &rest[3..];
        } else {
            return None;
        }
        dots += 1;
    }
    Some(dots)
}

/// Canonical form of `path`. Borrowed when `path` is already clean.
///
/// A trailing `/` is kept, except that the root stays `/`.
pub fn clean_path(path: &str) -> Cow<'_, str> {
    let mut segments: Vec<&str> = Vec::new();
    let mut changed = !path.starts_with('/');

    let mut parts = path.split('/');
    if path.starts_with('/') {
        parts.next();
    }
    let mut parts = parts.peekable();

    while let Some(segment) = parts.next() {
        let last = parts.peek().is_none();
        match dot_count(segment) {
            // a single trailing empty segment is the trailing slash
            Some(0) if last => {}
            Some(0) => changed = true,
            Some(1) => changed = true,
            Some(2) => {
                segments.pop();
                changed = true;
            }
            _ => segments.push(segment),
        }
    }

    if !changed {
        return Cow::Borrowed(path);
    }

    let mut cleaned = String::with_capacity(path.len());
    for segment in &segments {
        cleaned.push('/');
        cleaned.push_str(segment);
    }
    if cleaned.is_empty() || path.ends_with('/') {
        cleaned.push('/');
    }
    Cow::Owned(cleaned)
}
