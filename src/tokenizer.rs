//! Dictionary-driven segmentation of free text.
//!
//! Chat input has no word boundaries, so the tokenizer uses forward maximum
//! matching against the material dictionary: at every position the longest
//! dictionary word wins. Text outside the dictionary falls back to ASCII
//! alphanumeric runs and single CJK characters. Whitespace and punctuation
//! never appear in the output.

use std::{collections::HashSet, path::Path};

use crate::{
    error::SenseiError,
    vocabulary::{parse_dict, Vocabulary},
};

#[derive(Debug, Clone, Default)]
pub struct Tokenizer {
    words: HashSet<String>,
    /// Length in chars of the longest dictionary word.
    max_len: usize,
}

impl Tokenizer {
    pub fn from_vocabulary(vocabulary: &Vocabulary) -> Self {
        Self::from_words(vocabulary.names().iter().cloned())
    }

    /// Load a dictionary file written by [`Vocabulary::persist`]. Entries with
    /// a zero weight are ignored.
    pub fn from_dict(path: &Path) -> Result<Self, SenseiError> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_words(
            parse_dict(&content)
                .into_iter()
                .filter(|e| e.weight > 0)
                .map(|e| e.word),
        ))
    }

    fn from_words(words: impl IntoIterator<Item = String>) -> Self {
        let words: HashSet<String> = words.into_iter().filter(|w| !w.is_empty()).collect();
        let max_len = words.iter().map(|w| w.chars().count()).max().unwrap_or(0);
        Self { words, max_len }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    /// Split `text` into tokens.
    pub fn cut(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let mut tokens = Vec::new();
        let mut i = 0;

        while i < chars.len() {
            if let Some(len) = self.longest_word_at(&chars, i) {
                tokens.push(chars[i..i + len].iter().collect());
                i += len;
                continue;
            }

            let c = chars[i];
            if c.is_ascii_alphanumeric() {
                let start = i;
                while i < chars.len() && chars[i].is_ascii_alphanumeric() {
                    i += 1;
                }
                tokens.push(chars[start..i].iter().collect());
            } else {
                if is_word_char(c) {
                    tokens.push(c.to_string());
                }
                i += 1;
            }
        }

        tokens
    }

    fn longest_word_at(&self, chars: &[char], start: usize) -> Option<usize> {
        let longest = self.max_len.min(chars.len() - start);
        (1..=longest).rev().find(|&len| {
            let candidate: String = chars[start..start + len].iter().collect();
            self.words.contains(&candidate)
        })
    }
}

fn is_word_char(c: char) -> bool {
    !c.is_whitespace() && !is_punctuation(c)
}

/// ASCII and common full-width punctuation.
pub fn is_punctuation(c: char) -> bool {
    c.is_ascii_punctuation()
        || matches!(
            c,
            '，' | '。'
                | '！'
                | '？'
                | '、'
                | '；'
                | '：'
                | '“'
                | '”'
                | '‘'
                | '’'
                | '（'
                | '）'
                | '【'
                | '】'
                | '《'
                | '》'
                | '…'
                | '～'
                | '·'
                | '—'
        )
}

/// `text` with every punctuation character removed.
pub fn strip_punctuation(text: &str) -> String {
    text.chars().filter(|c| !is_punctuation(*c)).collect()
}
