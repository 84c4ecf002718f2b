//! Path and identifier conventions shared by route building and dispatch.

use once_cell::sync::Lazy;
use regex::Regex;

static CAMEL_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new("([a-z0-9])([A-Z]+)").expect("static regex is valid"));

/// Converts `CamelCase` to `snake_case`.
///
/// Runs of capitals stay together (`getHTTPStatus` → `get_httpstatus`),
/// which keeps generated URLs stable for acronyms.
pub fn camel_to_snake(camel: &str) -> String {
    CAMEL_BOUNDARY.replace_all(camel, "${1}_${2}").to_lowercase()
}

/// Normalises a route path written in an annotation: backslashes become
/// slashes, repeated separators collapse and surrounding whitespace is
/// dropped. A leading `/` is preserved because it marks a rooted route.
pub fn normalize_route_path(raw: &str) -> String {
    let replaced = raw.trim().replace('\\', "/");
    let mut out = String::with_capacity(replaced.len());
    let mut last_slash = false;
    for ch in replaced.chars() {
        if ch == '/' {
            if last_slash {
                continue;
            }
            last_slash = true;
        } else {
            last_slash = false;
        }
        out.push(ch);
    }
    out
}

/// Joins a group prefix with a relative segment. An empty segment adds
/// nothing, so `join_paths("/", "")` stays `/`.
pub fn join_paths(prefix: &str, relative: &str) -> String {
    let relative = relative.trim_matches('/');
    if relative.is_empty() {
        return if prefix.is_empty() { "/".to_string() } else { prefix.to_string() };
    }
    let prefix = prefix.trim_end_matches('/');
    format!("{}/{}", prefix, relative)
}

/// Lexically cleans a slash separated path: `.` segments vanish and `..`
/// removes the previous segment. Leading `..` on a relative path are kept.
pub fn clean_path(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if rooted => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }
    let joined = parts.join("/");
    match (rooted, joined.is_empty()) {
        (true, _) => format!("/{}", joined),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// One segment of a route pattern, as the router matches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternSegment<'a> {
    Static(&'a str),
    /// `{name}`
    Param(&'a str),
    /// `{*name}`
    CatchAll(&'a str),
}

/// Splits an absolute route pattern into segments. Only whole-segment
/// `{name}` and `{*name}` are parameters; anything else is static text.
pub fn pattern_segments(path: &str) -> Vec<PatternSegment<'_>> {
    path.trim_start_matches('/')
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(inner) => match inner.strip_prefix('*') {
                Some(name) => PatternSegment::CatchAll(name),
                None => PatternSegment::Param(inner),
            },
            None => PatternSegment::Static(segment),
        })
        .collect()
}

/// Checks a route pattern against the router's syntax, so a bad annotation
/// becomes a diagnostic instead of a panic when the router is assembled.
pub fn validate_route_path(path: &str) -> Result<(), String> {
    if !path.starts_with('/') {
        return Err(format!("`{}` is not absolute", path));
    }
    let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
    let mut names: Vec<&str> = Vec::new();
    for (index, raw) in segments.iter().enumerate() {
        if let Some(rest) = raw.strip_prefix(':') {
            return Err(format!("segment `{}` uses `:param` syntax, write `{{{}}}`", raw, rest));
        }
        if let Some(rest) = raw.strip_prefix('*') {
            return Err(format!("segment `{}` uses `*param` syntax, write `{{*{}}}`", raw, rest));
        }
        if !raw.contains('{') && !raw.contains('}') {
            continue;
        }
        let name = match raw.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(inner) => inner,
            None => return Err(format!("segment `{}` mixes text and a parameter", raw)),
        };
        let (name, catch_all) = match name.strip_prefix('*') {
            Some(name) => (name, true),
            None => (name, false),
        };
        if name.is_empty() || name.contains(&['{', '}', '*'][..]) {
            return Err(format!("segment `{}` has an invalid parameter name", raw));
        }
        if catch_all && index + 1 != segments.len() {
            return Err(format!("catch-all `{}` must be the last segment", raw));
        }
        if names.contains(&name) {
            return Err(format!("parameter `{}` appears twice", name));
        }
        names.push(name);
    }
    Ok(())
}
