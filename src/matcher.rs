//! Maps free chat text to the single best-matching material name.
//!
//! Scoring is a hybrid of exact token hits, normalized Levenshtein similarity
//! over token windows, and character overlap. On top of the raw best match
//! sits a two-condition gate: a candidate is only accepted when its name
//! literally appears in the text, or the text carries an explicit trigger
//! keyword. Without the gate, chat that merely shares a character with some
//! material would be answered.

use std::{collections::HashSet, sync::Arc};

use serde::Serialize;
use strsim::normalized_levenshtein;

use crate::{
    tokenizer::{strip_punctuation, Tokenizer},
    vocabulary::Vocabulary,
};

/// Default trigger keyword ("material").
pub const DEFAULT_KEYWORD: &str = "材料";

/// Default minimum score a candidate needs to be returned at all.
pub const DEFAULT_MIN_SIMILARITY: f64 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct MatcherOptions {
    pub min_similarity: f64,
    pub keywords: Vec<String>,
}

impl Default for MatcherOptions {
    fn default() -> Self {
        Self {
            min_similarity: DEFAULT_MIN_SIMILARITY,
            keywords: vec![DEFAULT_KEYWORD.to_string()],
        }
    }
}

/// Outcome of [`Matcher::verify`] for text the matcher wants to handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    /// Best material name, if any cleared the similarity floor.
    pub name: Option<String>,
    /// Whether the text contained a trigger keyword.
    pub keyword: bool,
    /// 5 for keyword-triggered matches, 1 otherwise. Hosts with several
    /// handlers use it to pick the most specific one.
    pub priority: u8,
}

/// Immutable matcher over one vocabulary snapshot.
#[derive(Debug)]
pub struct Matcher {
    vocabulary: Arc<Vocabulary>,
    tokenizer: Tokenizer,
    options: MatcherOptions,
}

impl Matcher {
    pub fn new(vocabulary: Arc<Vocabulary>, options: MatcherOptions) -> Self {
        let tokenizer = Tokenizer::from_vocabulary(&vocabulary);
        Self {
            vocabulary,
            tokenizer,
            options,
        }
    }

    /// Like [`Matcher::new`], but segmenting with an externally loaded
    /// tokenizer (e.g. one read back from the dictionary file).
    pub fn with_tokenizer(
        vocabulary: Arc<Vocabulary>,
        tokenizer: Tokenizer,
        options: MatcherOptions,
    ) -> Self {
        Self {
            vocabulary,
            tokenizer,
            options,
        }
    }

    /// Best material name for `text`, or `None` when the text is not about a
    /// material.
    pub fn resolve(&self, text: &str) -> Option<String> {
        self.verify(text).and_then(|v| v.name)
    }

    /// Decide whether `text` is a material query and which name it targets.
    ///
    /// Returns `Some` with `name: None` when only the trigger keyword fired;
    /// the caller should then ask which material was meant.
    pub fn verify(&self, text: &str) -> Option<Verdict> {
        let keyword = self
            .options
            .keywords
            .iter()
            .any(|k| !k.is_empty() && text.contains(k.as_str()));

        let trimmed = text.trim();
        let exact = self.vocabulary.contains(trimmed);
        let name = if exact {
            Some(trimmed.to_string())
        } else {
            self.most_similar(&self.without_keywords(text))
        };

        if !keyword && !exact {
            if let Some(name) = &name {
                // Punctuation is ignored on both sides.
                if !strip_punctuation(text).contains(strip_punctuation(name).as_str()) {
                    tracing::debug!(%name, text, "best match not present in text, ignoring");
                    return None;
                }
            }
        }

        if name.is_some() || keyword {
            return Some(Verdict {
                name,
                keyword,
                priority: if keyword { 5 } else { 1 },
            });
        }

        None
    }

    /// Highest-scoring vocabulary name at or above the similarity floor,
    /// without the literal-presence gate. Used for follow-up replies where the
    /// user was explicitly asked for a material name.
    pub fn most_similar(&self, text: &str) -> Option<String> {
        let tokens = self.tokenizer.cut(text);
        if tokens.is_empty() {
            return None;
        }
        let text_chars: HashSet<char> = tokens.iter().flat_map(|t| t.chars()).collect();

        let mut best: Option<(&str, f64)> = None;
        for name in self.vocabulary.names() {
            let score = score(name, &tokens, &text_chars);
            if score < self.options.min_similarity {
                continue;
            }
            // Strictly greater keeps the earliest name on ties.
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((name, score));
            }
        }

        if let Some((name, score)) = best {
            tracing::debug!(name, score, "best material match");
        }
        best.map(|(name, _)| name.to_string())
    }

    fn without_keywords(&self, text: &str) -> String {
        self.options
            .keywords
            .iter()
            .filter(|k| !k.is_empty())
            .fold(text.to_string(), |acc, k| acc.replace(k.as_str(), ""))
    }
}

/// Similarity of `name` to the tokenized input, in `0.0..=1.0`.
fn score(name: &str, tokens: &[String], text_chars: &HashSet<char>) -> f64 {
    if tokens.iter().any(|t| t == name) {
        return 1.0;
    }

    let name_chars: HashSet<char> = name.chars().collect();
    if name_chars.is_empty() {
        return 0.0;
    }
    let overlap =
        name_chars.intersection(text_chars).count() as f64 / name_chars.len() as f64;
    if overlap == 0.0 {
        return 0.0;
    }

    (best_window_similarity(name, tokens) + overlap) / 2.0
}

/// Best normalized Levenshtein similarity between `name` and any run of
/// consecutive tokens whose length is within one char of the name's.
fn best_window_similarity(name: &str, tokens: &[String]) -> f64 {
    let target = name.chars().count();
    let mut best = 0.0_f64;

    for start in 0..tokens.len() {
        let mut window = String::new();
        let mut len = 0;
        for token in &tokens[start..] {
            window.push_str(token);
            len += token.chars().count();
            if len + 1 < target {
                continue;
            }
            if len > target + 1 {
                break;
            }
            best = best.max(normalized_levenshtein(name, &window));
        }
    }

    best
}
