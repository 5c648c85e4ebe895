//! Cloze marker normalization.
//!
//! Producers regularly emit `{c1::text}` with single braces, or a mix like
//! `{{c1::text}`. Every variant is rewritten to the canonical `{{c1::text}}`
//! form. The rewrite is idempotent: canonical markers are matched and
//! re-emitted unchanged.
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static CLOZE_BRACES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{?(c\d+::[^{}]*)\}\}?").expect("cloze brace pattern is valid")
});

static CLOZE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{c(\d+)::").expect("cloze marker pattern is valid"));

static CLOZE_PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\[CLOZE::([^\]]*)\]").expect("cloze placeholder pattern is valid")
});

/// Rewrites single- or mixed-brace cloze markers into `{{cN::...}}`.
pub fn normalize_cloze_braces(text: &str) -> String {
    CLOZE_BRACES.replace_all(text, "{{$1}}").into_owned()
}

/// `true` when `text` carries at least one canonical `{{cN::` marker.
pub fn has_cloze_markers(text: &str) -> bool {
    CLOZE_MARKER.is_match(text)
}

/// Highest cloze index used in `text`, or 0 when there are none.
pub fn max_cloze_index(text: &str) -> u32 {
    CLOZE_MARKER
        .captures_iter(text)
        .filter_map(|caps| caps[1].parse::<u32>().ok())
        .max()
        .unwrap_or(0)
}

/// Converts `[CLOZE::text]` placeholders into numbered cloze markers.
///
/// Numbering continues after the highest index already present, so
/// `"{{c1::a}} [CLOZE::b]"` becomes `"{{c1::a}} {{c2::b}}"`.
pub fn convert_cloze_placeholders(text: &str) -> String {
    let mut next = max_cloze_index(text);
    CLOZE_PLACEHOLDER
        .replace_all(text, |caps: &Captures<'_>| {
            next += 1;
            format!("{{{{c{next}::{}}}}}", caps[1].trim())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_braces_doubled() {
        assert_eq!(
            normalize_cloze_braces("The {c1::heart} pumps {c2::blood::fluid}."),
            "The {{c1::heart}} pumps {{c2::blood::fluid}}."
        );
    }

    #[test]
    fn mixed_braces_repaired() {
        assert_eq!(normalize_cloze_braces("{{c1::x} and {c2::y}}"), "{{c1::x}} and {{c2::y}}");
    }

    #[test]
    fn canonical_markers_untouched() {
        let text = "A {{c1::b}} c {{c12::d}}";
        assert_eq!(normalize_cloze_braces(text), text);
    }

    #[test]
    fn idempotent() {
        for text in ["{c1::x}", "{{c1::x}", "plain", "{c1::x}}}", "{ c1 }"] {
            let once = normalize_cloze_braces(text);
            assert_eq!(normalize_cloze_braces(&once), once, "input {text:?}");
        }
    }

    #[test]
    fn marker_detection() {
        assert!(has_cloze_markers("{{c3::x}}"));
        assert!(!has_cloze_markers("{c3::x}"));
        assert!(!has_cloze_markers("no markers"));
    }

    #[test]
    fn placeholders_numbered_after_existing() {
        assert_eq!(
            convert_cloze_placeholders("{{c2::a}} [CLOZE::b] [cloze:: c ]"),
            "{{c2::a}} {{c3::b}} {{c4::c}}"
        );
        assert_eq!(convert_cloze_placeholders("[CLOZE::x]"), "{{c1::x}}");
    }
}
