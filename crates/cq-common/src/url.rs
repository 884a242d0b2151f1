//! URL resolution for stylesheet-relative references.
//!
//! [URL Standard](https://url.spec.whatwg.org/)

/// Returns true if `href` needs no resolution against a base.
///
/// Absolute URLs (any `scheme:`), `data:` URLs and fragment-only references
/// (`#id`) are left alone.
#[must_use]
pub fn is_absolute_or_fragment(href: &str) -> bool {
    if href.starts_with('#') {
        return true;
    }
    // [URL Standard § 4.3](https://url.spec.whatwg.org/#url-parsing)
    // "An absolute-URL string is a URL-scheme string, followed by U+003A (:),
    // followed by a scheme-specific part."
    let Some((scheme, _)) = href.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Resolve a potentially relative URL against a base URL.
///
/// STEP 1: "If url is an absolute URL, return url."
///
/// STEP 2: "Otherwise, resolve url relative to base."
///
/// Handles protocol-relative (`//host/x`), origin-relative (`/x`) and
/// path-relative (`x`, `./x`, `../x`) references. `.` and `..` segments are
/// collapsed; `..` never climbs above the origin.
#[must_use]
pub fn resolve_url(href: &str, base_url: Option<&str>) -> String {
    // STEP 1
    if is_absolute_or_fragment(href) {
        return href.to_string();
    }

    // STEP 2
    let Some(base) = base_url else {
        return href.to_string();
    };

    if href.starts_with("//") {
        let scheme = base.split_once(':').map_or("http", |(s, _)| s);
        return format!("{scheme}:{href}");
    }

    let (origin, base_path) = split_origin(base);

    if href.starts_with('/') {
        return format!("{origin}{}", normalize_path(href));
    }

    // Drop query/fragment and the last segment of the base path.
    let base_path = base_path
        .split(['?', '#'])
        .next()
        .unwrap_or_default();
    let base_dir = base_path.rsplit_once('/').map_or("", |(dir, _)| dir);
    format!("{origin}{}", normalize_path(&format!("{base_dir}/{href}")))
}

/// Split `scheme://host` from the remainder of `url`.
fn split_origin(url: &str) -> (&str, &str) {
    let Some(scheme_end) = url.find("://") else {
        return ("", url);
    };
    let after_scheme = &url[scheme_end + 3..];
    after_scheme
        .find('/')
        .map_or((url, ""), |path_start| url.split_at(scheme_end + 3 + path_start))
}

/// Collapse `.` and `..` segments of an absolute path, keeping any query or fragment.
fn normalize_path(path: &str) -> String {
    let split_at = path.find(['?', '#']).unwrap_or(path.len());
    let (path, suffix) = path.split_at(split_at);

    let mut segments: Vec<&str> = Vec::new();
    let raw: Vec<&str> = path.split('/').skip(1).collect();
    for (i, segment) in raw.iter().enumerate() {
        let last = i + 1 == raw.len();
        match *segment {
            "." => {
                if last {
                    segments.push("");
                }
            }
            ".." => {
                let _ = segments.pop();
                if last {
                    segments.push("");
                }
            }
            s => segments.push(s),
        }
    }
    format!("/{}{suffix}", segments.join("/"))
}
