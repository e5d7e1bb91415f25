//! Keyword highlighting for article summaries.

use html_escape::encode_safe_to_string;

const MARK_OPEN: &str = r#"<mark class="keyword">"#;
const MARK_CLOSE: &str = "</mark>";

/// Wrap every literal occurrence of a keyword in `text` with a `<mark>` tag.
///
/// Matching is case-sensitive. Where keywords overlap the longest one wins.
/// All text, keywords included, is HTML-escaped so the result can be
/// inserted as markup.
pub fn highlight(text: &str, keywords: &[String]) -> String {
    let mut keywords: Vec<&str> = keywords
        .iter()
        .map(|k| k.as_str())
        .filter(|k| !k.is_empty())
        .collect();
    keywords.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    keywords.dedup();

    let mut out = String::with_capacity(text.len());
    let mut plain_start = 0;
    let mut pos = 0;

    while pos < text.len() {
        let rest = &text[pos..];
        match keywords.iter().find(|k| rest.starts_with(**k)) {
            Some(keyword) => {
                encode_safe_to_string(&text[plain_start..pos], &mut out);
                out.push_str(MARK_OPEN);
                encode_safe_to_string(keyword, &mut out);
                out.push_str(MARK_CLOSE);
                pos += keyword.len();
                plain_start = pos;
            }
            None => {
                pos += rest.chars().next().map_or(1, char::len_utf8);
            }
        }
    }
    encode_safe_to_string(&text[plain_start..], &mut out);

    out
}
