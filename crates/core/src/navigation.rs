//! Spoken page names and the routes they resolve to.
//!
//! Matching is exact after trimming and lowercasing. Order matters: it is the
//! order pages are listed in when a name is not recognised.

pub const ROOT_ROUTE: &str = "/";

const PAGES: &[(&str, &str)] = &[
    ("home", "/"),
    ("main", "/"),
    ("main page", "/"),
    ("start", "/"),
    ("beginning", "/"),
    ("about", "/about"),
    ("about page", "/about"),
    ("project", "/about"),
    ("information", "/about"),
    ("info", "/about"),
    ("features", "/features"),
    ("capabilities", "/features"),
    ("functions", "/features"),
    ("abilities", "/features"),
    ("settings", "/settings"),
    ("configuration", "/settings"),
    ("parameters", "/settings"),
    ("options", "/settings"),
    ("preferences", "/settings"),
    ("presentations", "/presentations"),
    ("presentation", "/presentations"),
    ("slides", "/presentations"),
    ("slide show", "/presentations"),
    ("project generator", "/project-generator"),
    ("generator", "/project-generator"),
];

/// How many names are offered back when a page is not found.
const SUGGESTION_LIMIT: usize = 8;

pub fn normalize(page: &str) -> String {
    page.trim().to_lowercase()
}

pub fn resolve(page: &str) -> Option<&'static str> {
    let key = normalize(page);
    PAGES.iter().find(|(name, _)| *name == key).map(|(_, route)| *route)
}

/// The first few known page names, for "page not found" replies.
pub fn available_pages() -> Vec<&'static str> {
    PAGES.iter().take(SUGGESTION_LIMIT).map(|(name, _)| *name).collect()
}

pub fn known_names() -> impl Iterator<Item = &'static str> {
    PAGES.iter().map(|(name, _)| *name)
}

/// Route of a single presentation.
pub fn presentation_route(id: &str) -> String {
    format!("/presentations/{id}")
}

/// The presentation id a route points at, if it is a presentation route.
pub fn presentation_id(route: &str) -> Option<&str> {
    route
        .strip_prefix("/presentations/")
        .map(|id| id.trim_end_matches('/'))
        .filter(|id| !id.is_empty() && !id.contains('/'))
}
