//! Deterministic slug derivation for series names and tags.

/// Lowercase, hyphen-separated slug: non-alphanumeric runs collapse to a
/// single hyphen, leading/trailing hyphens are trimmed.
pub fn slugify(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_hyphen = true; // suppress a leading hyphen
    for ch in name.trim().chars() {
        let lower = ch.to_ascii_lowercase();
        if lower.is_ascii_alphanumeric() {
            out.push(lower);
            last_hyphen = false;
        } else if !last_hyphen {
            out.push('-');
            last_hyphen = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

/// Slug for a tag name; empty input falls back to `"tag"` so the mutation
/// payload never carries an empty slug.
pub fn tag_slug(name: &str) -> String {
    let slug = slugify(name);
    if slug.is_empty() {
        "tag".to_owned()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_basic() {
        assert_eq!(slugify("Rust Deep Dives"), "rust-deep-dives");
        assert_eq!(slugify("  Hello,   World!  "), "hello-world");
        assert_eq!(slugify("C++ & Rust"), "c-rust");
    }

    #[test]
    fn slugify_collapses_hyphen_runs() {
        assert_eq!(slugify("a -- b"), "a-b");
        assert_eq!(slugify("--edge--"), "edge");
    }

    #[test]
    fn empty_tag_gets_fallback() {
        assert_eq!(tag_slug("!!!"), "tag");
        assert_eq!(tag_slug("Web Dev"), "web-dev");
    }
}
