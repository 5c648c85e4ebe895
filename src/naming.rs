//! Deck naming.
//!
//! An explicit name always wins. Otherwise the name is inferred from card
//! content: either the first non-system tag of the opening cards
//! (`lecture_tags`) or an ordered keyword table (`keywords`), falling back to
//! a generic default. The on-disk stem gets a timestamp and a short random
//! suffix so concurrent conversions never collide.

use canonical::NormalizedCard;
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ConfigLoadError;

/// Tags that describe the tool rather than the lecture.
const SYSTEM_TAGS: [&str; 5] = ["synapticrecall", "synaptic_recall", "medical", "flashcard", "anki"];

/// How many leading cards the `lecture_tags` strategy inspects.
const LECTURE_TAG_CARDS: usize = 5;

/// A resolved deck name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckName {
    /// Human-readable name.
    pub display: String,
    /// Filesystem-safe stem for the packaged deck.
    pub file_stem: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingStrategy {
    Keywords,
    LectureTags,
}

/// Maps content keywords to a short deck name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicRule {
    pub name: String,
    pub keywords: Vec<String>,
}

impl TopicRule {
    fn new(name: &str, keywords: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    pub default_name: String,
    pub strategy: NamingStrategy,
    /// Checked in order; the first rule with a matching keyword wins.
    pub topics: Vec<TopicRule>,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            default_name: "Medical_Flashcards".to_string(),
            strategy: NamingStrategy::Keywords,
            topics: default_topics(),
        }
    }
}

impl NamingConfig {
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        if safe_name(&self.default_name).is_empty() {
            return Err(ConfigLoadError::Validation(
                "naming.default_name must contain at least one letter or digit".into(),
            ));
        }
        if let Some(rule) = self.topics.iter().find(|r| r.keywords.is_empty()) {
            return Err(ConfigLoadError::Validation(format!(
                "naming.topics: rule `{}` has no keywords",
                rule.name
            )));
        }
        Ok(())
    }
}

fn default_topics() -> Vec<TopicRule> {
    vec![
        TopicRule::new("Cardiology", &["cardio", "heart"]),
        TopicRule::new("Neurology", &["neuro", "brain"]),
        TopicRule::new("Pulmonology", &["pulmon", "lung", "respir"]),
        TopicRule::new("Nephrology", &["renal", "kidney", "nephro"]),
        TopicRule::new("Gastroenterology", &["gastro", "liver", "hepat"]),
        TopicRule::new("Endocrinology", &["endocrin", "thyroid", "diabet"]),
        TopicRule::new("Pharmacology", &["pharm", "drug"]),
        TopicRule::new("Microbiology", &["microbio", "bacteria", "viral"]),
        TopicRule::new("Immunology", &["immun"]),
        TopicRule::new("Hematology", &["hemat", "anemia", "blood"]),
        TopicRule::new("Anatomy", &["anatom"]),
        TopicRule::new("Pathology", &["patho"]),
    ]
}

/// Resolves the deck name for a batch of cards.
///
/// `explicit` is a caller- or payload-supplied name; it is used when it
/// survives filtering to the safe character set. The file stem always carries
/// a `_<YYYYmmdd_HHMMSS>_<8 hex>` suffix.
pub fn name_deck(explicit: Option<&str>, cards: &[NormalizedCard], cfg: &NamingConfig) -> DeckName {
    let display = explicit
        .map(safe_name)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| infer_name(cards, cfg));

    let base = display.replace(' ', "_");
    let file_stem = stem_with_suffix(&base, Local::now().naive_local(), Uuid::new_v4());
    DeckName { display, file_stem }
}

fn infer_name(cards: &[NormalizedCard], cfg: &NamingConfig) -> String {
    let inferred = match cfg.strategy {
        NamingStrategy::LectureTags => lecture_tag(cards).or_else(|| topic_name(cards, &cfg.topics)),
        NamingStrategy::Keywords => topic_name(cards, &cfg.topics),
    };
    inferred.unwrap_or_else(|| safe_name(&cfg.default_name))
}

fn lecture_tag(cards: &[NormalizedCard]) -> Option<String> {
    cards
        .iter()
        .take(LECTURE_TAG_CARDS)
        .flat_map(|card| card.tags.iter())
        .filter(|tag| {
            let lower = tag.to_lowercase();
            !SYSTEM_TAGS.iter().any(|system| lower.contains(system))
        })
        .map(|tag| safe_name(&tag.replace("::", " ").replace('_', " ")))
        .find(|name| !name.is_empty())
}

fn topic_name(cards: &[NormalizedCard], topics: &[TopicRule]) -> Option<String> {
    let mut haystack = String::new();
    for card in cards {
        haystack.push_str(&card.front);
        haystack.push(' ');
        if let Some(back) = &card.back {
            haystack.push_str(back);
            haystack.push(' ');
        }
        for tag in &card.tags {
            haystack.push_str(tag);
            haystack.push(' ');
        }
    }
    let haystack = haystack.to_lowercase();

    topics
        .iter()
        .find(|rule| {
            rule.keywords
                .iter()
                .any(|kw| haystack.contains(&kw.to_lowercase()))
        })
        .map(|rule| safe_name(&rule.name))
        .filter(|name| !name.is_empty())
}

/// Keeps `[A-Za-z0-9 _-]`, collapses space runs, trims.
pub fn safe_name(name: &str) -> String {
    let filtered: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '_' | '-'))
        .collect();
    canonical::collapse_whitespace(&filtered)
}

fn stem_with_suffix(base: &str, at: NaiveDateTime, id: Uuid) -> String {
    let token = id.simple().to_string();
    format!("{base}_{}_{}", at.format("%Y%m%d_%H%M%S"), &token[..8])
}
