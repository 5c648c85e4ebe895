//! Free-text cleanup: stray closing braces and highlight markup.
use once_cell::sync::Lazy;
use regex::Regex;

static DOUBLE_EQUALS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"==([^=\n]+?)==").expect("highlight pattern is valid"));

static MARK_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<mark\b[^>]*>(.*?)</mark>").expect("mark pattern is valid"));

static ORANGE_SPAN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<span\s+style="[^"]*background(?:-color)?\s*:\s*orange[^"]*"\s*>(.*?)</span>"#)
        .expect("orange span pattern is valid")
});

const HIGHLIGHT: &str = r#"<span class="highlight">$1</span>"#;

/// Removes `}` characters from the end of `text` while the text has more
/// closing than opening braces. Balanced text is only right-trimmed.
pub fn strip_trailing_braces(text: &str) -> &str {
    let opens = text.matches('{').count();
    let mut closes = text.matches('}').count();
    let mut out = text.trim_end();
    while closes > opens {
        match out.strip_suffix('}') {
            Some(rest) => {
                out = rest.trim_end();
                closes -= 1;
            }
            None => break,
        }
    }
    out
}

/// Rewrites highlight markup to `<span class="highlight">`.
pub fn apply_highlight(text: &str) -> String {
    let text = DOUBLE_EQUALS.replace_all(text, HIGHLIGHT);
    let text = MARK_TAG.replace_all(&text, HIGHLIGHT);
    ORANGE_SPAN.replace_all(&text, HIGHLIGHT).into_owned()
}
