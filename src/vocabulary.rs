//! The searchable set of material names and its on-disk dictionary form.
//!
//! A [`Vocabulary`] is an immutable snapshot. When the corpus changes a new
//! snapshot is built and swapped in; nothing mutates an existing one.
//!
//! The dictionary file is a word-frequency hint list, one `name weight tag`
//! line per material, so the tokenizer keeps multi-character product names in
//! one piece instead of splitting them into generic words.

use std::path::Path;

use crate::{error::SenseiError, gamedata::GameData};

/// Weight written for every material name in the dictionary file.
pub const DICT_WEIGHT: u32 = 500;

/// Part-of-speech tag written for every material name (noun).
pub const DICT_TAG: &str = "n";

/// One parsed line of the dictionary file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictEntry {
    pub word: String,
    pub weight: u32,
    pub tag: String,
}

/// Material names in corpus key order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    names: Vec<String>,
}

impl Vocabulary {
    /// Collect every display name from the corpus's name → id map.
    pub fn build(data: &GameData) -> Self {
        tracing::info!("building material vocabulary");
        Self::from_names(data.materials_map.keys().cloned())
    }

    pub fn from_names(names: impl IntoIterator<Item = String>) -> Self {
        Self {
            names: names.into_iter().filter(|n| !n.is_empty()).collect(),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Render the dictionary file contents.
    ///
    /// Names containing whitespace cannot be written as a single field and
    /// are left out of the file (they stay in the in-memory vocabulary).
    pub fn to_dict(&self) -> String {
        self.names
            .iter()
            .filter(|name| {
                let ok = !name.chars().any(char::is_whitespace);
                if !ok {
                    tracing::warn!(%name, "material name contains whitespace, not written to dict");
                }
                ok
            })
            .map(|name| format!("{name} {DICT_WEIGHT} {DICT_TAG}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Write the dictionary file, creating parent directories as needed.
    pub fn persist(&self, path: &Path) -> Result<(), SenseiError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_dict())?;
        tracing::info!(path = %path.display(), words = self.names.len(), "material dict written");
        Ok(())
    }

    /// Read a dictionary file back into a vocabulary, keeping file order.
    pub fn load_dict(path: &Path) -> Result<Self, SenseiError> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_names(
            parse_dict(&content).into_iter().map(|e| e.word),
        ))
    }
}

/// Parse dictionary lines. Blank lines are ignored; a line with a weight that
/// is not an integer is skipped. Weight and tag are optional, as in the
/// common user-dictionary format.
pub fn parse_dict(content: &str) -> Vec<DictEntry> {
    content
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let word = fields.next()?;
            let weight = match fields.next() {
                Some(w) => match w.parse() {
                    Ok(w) => w,
                    Err(_) => {
                        tracing::warn!(line, "malformed dict line, skipping");
                        return None;
                    }
                },
                None => DICT_WEIGHT,
            };
            let tag = fields.next().unwrap_or(DICT_TAG);
            Some(DictEntry {
                word: word.to_string(),
                weight,
                tag: tag.to_string(),
            })
        })
        .collect()
}
