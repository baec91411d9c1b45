//! URL references cited in a unit's competencies/norms text

use std::sync::LazyLock;

use regex::Regex;

static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://[^\s\[\];]+").expect("URL pattern compiles"));

/// Every http(s) URL in `raw_norms`, in order of appearance, without
/// duplicates. Closing punctuation glued to the end of a URL is dropped.
pub fn document_urls(raw_norms: &str) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    for found in URL.find_iter(raw_norms) {
        let url = found.as_str().trim_end_matches([')', ',', ':', '.']);
        if !urls.iter().any(|u| u == url) {
            urls.push(url.to_string());
        }
    }
    urls
}
