use std::sync::OnceLock;

use regex::Regex;

use crate::plan::Citation;

fn markdown_link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\[([^\]\n]+)\]\((https?://[^\s)]+)\)").expect("valid markdown link regex")
    })
}

fn bare_url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"https?://[^\s)\]>"']+"#).expect("valid url regex"))
}

/// Collect sources referenced in model output, in order of first appearance.
///
/// Markdown links keep their label as title; bare URLs have none.
pub fn extract_citations(text: &str) -> Vec<Citation> {
    let mut found: Vec<(usize, Citation)> = Vec::new();

    for cap in markdown_link_re().captures_iter(text) {
        let (Some(whole), Some(title), Some(uri)) = (cap.get(0), cap.get(1), cap.get(2)) else {
            continue;
        };
        found.push((
            whole.start(),
            Citation::new(uri.as_str()).with_title(title.as_str().trim()),
        ));
    }

    for m in bare_url_re().find_iter(text) {
        let uri = m.as_str().trim_end_matches(['.', ',', ';', ':']);
        if !found.iter().any(|(_, c)| c.uri == uri) {
            found.push((m.start(), Citation::new(uri)));
        }
    }

    found.sort_by_key(|(pos, _)| *pos);

    let mut out: Vec<Citation> = Vec::with_capacity(found.len());
    for (_, citation) in found {
        if !out.iter().any(|c| c.uri == citation.uri) {
            out.push(citation);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_markdown_and_bare_urls() {
        let text = "See [Rust book](https://doc.rust-lang.org/book/) and https://crates.io/crates/tokio.";
        let citations = extract_citations(text);
        assert_eq!(
            citations,
            vec![
                Citation::new("https://doc.rust-lang.org/book/").with_title("Rust book"),
                Citation::new("https://crates.io/crates/tokio"),
            ]
        );
    }

    #[test]
    fn test_duplicates_collapsed() {
        let text = "https://a.example/x then again https://a.example/x";
        assert_eq!(extract_citations(text).len(), 1);
    }

    #[test]
    fn test_no_urls() {
        assert!(extract_citations("plain text").is_empty());
    }
}
