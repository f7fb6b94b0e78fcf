// src/backup/content.rs

//! Static asset references in course HTML
//!
//! edX content points at assets with quoted `/static/<path>` URLs. Moodle
//! expects `@@PLUGINFILE@@/<path>` with each path segment percent-encoded,
//! resolved against the files registered for the owning area.

use regex::{Captures, Regex};
use std::sync::LazyLock;

static STATIC_REF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""/static/([^"]+)"|'/static/([^']+)'"#).unwrap());

static IFRAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"iframe\s+src=["']/static/([^"']+)["']"#).unwrap());

static SRC_HREF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"src=["']([^"']+)["']|href=["']([^"']+)["']"#).unwrap());

/// Placeholder Moodle substitutes with the file area URL on display
pub const PLUGINFILE: &str = "@@PLUGINFILE@@";

fn first_group(caps: &Captures<'_>) -> String {
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Paths of every quoted `/static/` reference, in order of appearance
pub fn static_refs(text: &str) -> Vec<String> {
    STATIC_REF_RE.captures_iter(text).map(|c| first_group(&c)).collect()
}

/// Rewrite quoted `/static/` references to `@@PLUGINFILE@@` URLs
///
/// The quotes around each reference are kept.
pub fn rewrite_static_refs(text: &str) -> String {
    STATIC_REF_RE
        .replace_all(text, |caps: &Captures<'_>| {
            let quote = if caps.get(1).is_some() { '"' } else { '\'' };
            format!("{quote}{}/{}{quote}", PLUGINFILE, encode_path(&first_group(caps)))
        })
        .into_owned()
}

/// Percent-encode each `/`-separated segment
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Static HTML documents embedded through an iframe
pub fn iframe_static_refs(text: &str) -> Vec<String> {
    IFRAME_RE
        .captures_iter(text)
        .map(|c| first_group(&c))
        .collect()
}

/// Every `src=` and `href=` target of an HTML document
pub fn src_refs(html: &str) -> Vec<String> {
    SRC_HREF_RE.captures_iter(html).map(|c| first_group(&c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HTML: &str = r#"<p><img src="/static/images/logo one.png"/> and <a href='/static/handout.pdf'>pdf</a> not /static/bare.png</p>"#;

    #[test]
    fn test_static_refs() {
        assert_eq!(static_refs(HTML), vec!["images/logo one.png", "handout.pdf"]);
        assert!(static_refs("<p>none</p>").is_empty());
    }

    #[test]
    fn test_rewrite_keeps_quotes_and_encodes() {
        let rewritten = rewrite_static_refs(HTML);
        assert!(rewritten.contains(r#"src="@@PLUGINFILE@@/images/logo%20one.png""#));
        assert!(rewritten.contains(r#"href='@@PLUGINFILE@@/handout.pdf'"#));
        assert!(rewritten.contains("not /static/bare.png"));
    }

    #[test]
    fn test_encode_path() {
        assert_eq!(encode_path("a b/c&d.png"), "a%20b/c%26d.png");
        assert_eq!(encode_path("plain-name_1.txt"), "plain-name_1.txt");
    }

    #[test]
    fn test_iframe_refs() {
        let html = r#"<iframe src="/static/sim/index.html" width="100"></iframe><iframe  src='/static/other.html'>"#;
        assert_eq!(iframe_static_refs(html), vec!["sim/index.html", "other.html"]);
    }

    #[test]
    fn test_src_refs() {
        let html = r#"<script src="app.js"></script><link href='style.css'><img src="img/a.png">"#;
        assert_eq!(src_refs(html), vec!["app.js", "style.css", "img/a.png"]);
    }
}
