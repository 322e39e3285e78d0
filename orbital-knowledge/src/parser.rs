use std::sync::LazyLock;

use regex::Regex;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@([\w-]+)").expect("regex"));
static LINK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[\[([^\]]+)\]\]").expect("regex"));

/// Tag names declared with `@name`, in order of first appearance, without
/// duplicates. Names are case-sensitive.
pub fn extract_tags(content: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for caps in TAG_RE.captures_iter(content) {
        let name = &caps[1];
        if !tags.iter().any(|t| t == name) {
            tags.push(name.to_string());
        }
    }
    tags
}

/// Link target titles declared with `[[Title]]`, trimmed, in document order.
///
/// Titles that are blank after trimming are dropped. No nesting: a title
/// ends at the first `]`.
pub fn extract_links(content: &str) -> Vec<String> {
    LINK_RE
        .captures_iter(content)
        .map(|caps| caps[1].trim().to_string())
        .filter(|title| !title.is_empty())
        .collect()
}
