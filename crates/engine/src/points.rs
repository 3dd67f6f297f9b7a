//! Effort estimates embedded in task titles, e.g. `Fix login [5 pts]`.

use std::sync::OnceLock;

use regex::Regex;

fn title_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\[\s*(?P<points>\d+)\s*(?:pts?|points?)\s*\]")
            .expect("title points pattern is valid")
    })
}

/// Parse the first `[<n> pts]` marker in a title.
pub fn from_title(title: &str) -> Option<u32> {
    title_pattern()
        .captures(title)
        .and_then(|caps| caps.name("points"))
        .and_then(|m| m.as_str().parse().ok())
}
