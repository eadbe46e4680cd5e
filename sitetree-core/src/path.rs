use percent_encoding::percent_decode_str;
use serde::Serialize;
use tracing::debug;
use url::{ParseError, Url};

// Bare paths are checked against this base before their path is sliced out.
const PATH_BASE: &str = "http://localhost/";

/// Hierarchy information derived from a URL's path component.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathInfo {
    pub segments: Vec<String>,
    pub depth: usize,
    pub slug: Option<String>,
    pub parent_slug: Option<String>,
    pub full_path: String,
}

impl PathInfo {
    pub fn is_top_level(&self) -> bool {
        self.depth <= 1 || self.parent_slug.is_none()
    }
}

/// Parse a URL or bare path into segments, depth, slug and parent slug.
///
/// Never fails: anything without a usable path has depth 0.
pub fn parse_url_path(url: &str) -> PathInfo {
    let Some(path) = extract_path(url) else {
        debug!("No path component in '{}'", url);
        return PathInfo::default();
    };

    let full_path = percent_decode_str(path).decode_utf8_lossy().into_owned();
    let segments: Vec<String> = path
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| percent_decode_str(s).decode_utf8_lossy().into_owned())
        .collect();

    let depth = segments.len();
    let slug = segments.last().cloned();
    let parent_slug = if depth > 1 {
        Some(segments[depth - 2].clone())
    } else {
        None
    };

    PathInfo {
        segments,
        depth,
        slug,
        parent_slug,
        full_path,
    }
}

// Slices the path out of the input as written. `Url` only decides whether the
// input is absolute, relative or malformed; its normalised path is not used.
fn extract_path(url: &str) -> Option<&str> {
    let url = url.trim();
    match Url::parse(url) {
        Ok(_) => {
            let (_scheme, rest) = url.split_once(':')?;
            Some(path_component(rest))
        }
        Err(ParseError::RelativeUrlWithoutBase) => {
            Url::parse(PATH_BASE).ok()?.join(url).ok()?;
            Some(path_component(url))
        }
        Err(_) => None,
    }
}

// Skips a `//authority` prefix and stops at the query or fragment.
fn path_component(rest: &str) -> &str {
    let rest = match rest.strip_prefix("//") {
        Some(after) => &after[after.find(['/', '?', '#']).unwrap_or(after.len())..],
        None => rest,
    };
    let end = rest.find(['?', '#']).unwrap_or(rest.len());
    &rest[..end]
}
