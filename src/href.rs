//! Location algebra
//!
//! Locations are opaque strings to the I/O port, but the graph needs to resolve
//! relative link hrefs against a document's location and to compute relative
//! hrefs when writing. Two shapes are understood: POSIX-style paths and URLs.
//! `file://` URLs are treated as local paths.

use url::Url;

fn parse_url(location: &str) -> Option<Url> {
    // Single-letter schemes are drive letters, not URLs.
    match Url::parse(location) {
        Ok(url) if url.scheme().len() > 1 => Some(url),
        _ => None,
    }
}

/// Local path form of a location, for plain paths and `file://` URLs.
fn local_path(location: &str) -> Option<String> {
    match parse_url(location) {
        Some(url) if url.scheme() == "file" => Some(normalize_path(url.path())),
        Some(_) => None,
        None => Some(normalize_path(location)),
    }
}

/// True if `location` is a URL.
pub fn is_url(location: &str) -> bool {
    parse_url(location).is_some()
}

/// True if `href` can be used without a base location.
pub fn is_absolute(href: &str) -> bool {
    is_url(href) || href.starts_with('/')
}

/// Collapse `.` and `..` segments and duplicate separators.
pub fn normalize_path(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match parts.last() {
                Some(last) if *last != ".." => {
                    parts.pop();
                }
                _ if absolute => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }
    let joined = parts.join("/");
    if absolute {
        format!("/{}", joined)
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

/// Directory part of a location, without trailing separator.
pub fn dirname(location: &str) -> String {
    if let Some(mut url) = parse_url(location) {
        url.set_query(None);
        url.set_fragment(None);
        return match url.join("./") {
            Ok(dir) => dir.as_str().trim_end_matches('/').to_string(),
            Err(_) => location.to_string(),
        };
    }
    match location.rfind('/') {
        Some(0) => "/".to_string(),
        Some(idx) => location[..idx].to_string(),
        None => String::new(),
    }
}

/// Append a relative segment to a directory location.
pub fn join(dir: &str, segment: &str) -> String {
    if dir.is_empty() {
        segment.to_string()
    } else if dir.ends_with('/') {
        format!("{}{}", dir, segment)
    } else {
        format!("{}/{}", dir, segment)
    }
}

/// Resolve `href` against the location of the document that contains it.
pub fn make_absolute(href: &str, base: &str) -> String {
    if let Some(url) = parse_url(href) {
        return url.to_string();
    }
    if let Some(base_url) = parse_url(base) {
        return match base_url.join(href) {
            Ok(joined) => joined.to_string(),
            Err(_) => href.to_string(),
        };
    }
    if href.starts_with('/') {
        return normalize_path(href);
    }
    normalize_path(&join(&dirname(base), href))
}

/// Express `href` relative to the directory of `base` when both share a tree.
///
/// Returns `href` unchanged when no relative form exists.
pub fn make_relative(href: &str, base: &str) -> String {
    if !same_tree(href, base) {
        return href.to_string();
    }
    if let (Some(target), Some(from)) = (local_path(href), local_path(base)) {
        // Relative paths share the working directory as an implicit root.
        if target.starts_with('/') == from.starts_with('/') {
            return relative_path(&target, &from).unwrap_or_else(|| href.to_string());
        }
        return href.to_string();
    }
    match (parse_url(href), parse_url(base)) {
        (Some(target), Some(from)) => match from.make_relative(&target) {
            Some(rel) if rel.starts_with("../") => rel,
            Some(rel) if !rel.is_empty() => format!("./{}", rel),
            _ => href.to_string(),
        },
        _ => href.to_string(),
    }
}

fn relative_path(target: &str, base: &str) -> Option<String> {
    let base_dir = dirname(base);
    let base_parts: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    let target_parts: Vec<&str> = target.split('/').filter(|s| !s.is_empty()).collect();
    let limit = base_parts.len().min(target_parts.len().saturating_sub(1));
    let common = base_parts
        .iter()
        .zip(target_parts.iter())
        .take(limit)
        .take_while(|(a, b)| a == b)
        .count();
    // `..` cannot be climbed back out of without knowing the working directory.
    if base_parts[common..].contains(&"..") {
        return None;
    }
    let ups = base_parts.len() - common;
    let rest = target_parts[common..].join("/");
    if ups == 0 {
        Some(format!("./{}", rest))
    } else {
        Some(format!("{}{}", "../".repeat(ups), rest))
    }
}

/// Both locations are local, or both are URLs on the same origin.
pub fn same_tree(a: &str, b: &str) -> bool {
    match (parse_url(a), parse_url(b)) {
        (None, None) => true,
        (Some(x), None) | (None, Some(x)) => x.scheme() == "file",
        (Some(x), Some(y)) => {
            if x.scheme() == "file" || y.scheme() == "file" {
                return x.scheme() == y.scheme();
            }
            x.scheme() == y.scheme()
                && x.host_str() == y.host_str()
                && x.port_or_known_default() == y.port_or_known_default()
        }
    }
}
