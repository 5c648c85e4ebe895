//! Clinical vignettes.
//!
//! A vignette is a case stem with answer choices, optionally followed by a
//! `Correct Answer:` section, plus a separate explanation. Rendering splits
//! the stem from the answer so the reviewer sees the case first and the
//! answer only on reveal.
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Literal marker that starts the revealable answer section.
pub const ANSWER_MARKER: &str = "Correct Answer:";

static CHOICE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+([A-H])[.)]\s+").expect("choice pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Vignette {
    pub clinical_case: String,
    #[serde(default)]
    pub explanation: String,
}

impl Vignette {
    pub fn is_empty(&self) -> bool {
        self.clinical_case.trim().is_empty() && self.explanation.trim().is_empty()
    }

    /// Splits the case at [`ANSWER_MARKER`]. The answer part excludes the
    /// marker itself.
    pub fn split_answer(&self) -> (&str, Option<&str>) {
        match self.clinical_case.split_once(ANSWER_MARKER) {
            Some((stem, answer)) => (stem.trim(), Some(answer.trim())),
            None => (self.clinical_case.trim(), None),
        }
    }

    /// HTML for the note's `Vignette` field.
    ///
    /// Answer choices (`A.`, `B)` ...) are moved onto their own lines.
    pub fn render_html(&self) -> String {
        if self.is_empty() {
            return String::new();
        }
        let (stem, answer) = self.split_answer();
        let mut html = String::from(r#"<div class="vignette">"#);
        html.push_str(&CHOICE.replace_all(stem, "<br>$1. "));
        if let Some(answer) = answer {
            html.push_str("<br><br><strong>");
            html.push_str(ANSWER_MARKER);
            html.push_str("</strong> ");
            html.push_str(answer);
        }
        let explanation = self.explanation.trim();
        if !explanation.is_empty() {
            html.push_str("<br><br><strong>Explanation:</strong> ");
            html.push_str(explanation);
        }
        html.push_str("</div>");
        html
    }
}
