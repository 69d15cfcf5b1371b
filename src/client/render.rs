use lazy_static::lazy_static;
use regex::Regex;

/// Characters of body text shown per post on the listing page.
pub const EXCERPT_CHARS: usize = 200;

/// Text content of an HTML fragment: tags dropped, entities decoded.
pub fn html_to_text(html: &str) -> String {
    lazy_static! {
        static ref TAG_RE: Regex = Regex::new(r"<[^>]*>").unwrap();
    }
    let stripped = TAG_RE.replace_all(html, "");
    html_escape::decode_html_entities(&stripped).into_owned()
}

/// Plain-text preview of a post body, cut on a char boundary with a trailing `...` when shortened.
pub fn excerpt(html: &str, max_chars: usize) -> String {
    let text = html_to_text(html);
    if text.chars().count() <= max_chars {
        return text;
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str("...");
    out
}
