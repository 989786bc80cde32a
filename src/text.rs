//! Text normalization and synonym expansion
//!
//! Every query is normalized before matching: NFD decomposition, combining
//! marks dropped, lowercased. Knowledge-base keywords go through the same
//! function so both sides compare accent- and case-insensitively.

use std::collections::HashMap;

use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::errors::CelineError;
use crate::Result;

/// Strip diacritics and lowercase.
///
/// Decomposes into base characters plus combining marks, discards the marks,
/// lowercases the rest. Empty input yields an empty string. Idempotent.
pub fn normalize(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Word count of a phrase after whitespace splitting
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Rewrites informal terms in a normalized query to their canonical form.
///
/// Replacement is whole-word (word-boundary delimited) and operates on
/// normalized text, so matching is case- and accent-insensitive. Overlapping
/// map keys are resolved in a single pass, longest key first.
pub struct SynonymExpander {
    pattern: Option<Regex>,
    canonical: HashMap<String, String>,
}

impl SynonymExpander {
    /// Build an expander from an informal-term -> canonical-term map.
    /// An empty map produces a no-op expander.
    pub fn new(map: &HashMap<String, String>) -> Result<Self> {
        if map.is_empty() {
            return Ok(Self {
                pattern: None,
                canonical: HashMap::new(),
            });
        }

        let mut canonical = HashMap::new();
        let mut keys: Vec<String> = Vec::with_capacity(map.len());
        for (informal, term) in map {
            let key = normalize(informal);
            if key.is_empty() {
                continue;
            }
            canonical.insert(key.clone(), normalize(term));
            keys.push(key);
        }

        // Longest key first so "vale refeicao" wins over "vale"; the regex
        // crate picks the first matching alternative
        keys.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        let alternatives = keys
            .iter()
            .map(|k| regex::escape(k))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = Regex::new(&format!(r"\b(?:{alternatives})\b"))
            .map_err(|e| CelineError::Config(format!("Invalid synonym pattern: {e}")))?;

        Ok(Self {
            pattern: Some(pattern),
            canonical,
        })
    }

    /// Expand known informal terms in an already-normalized query
    pub fn expand(&self, query: &str) -> String {
        match &self.pattern {
            None => query.to_string(),
            Some(pattern) => pattern
                .replace_all(query, |caps: &regex::Captures<'_>| {
                    self.canonical
                        .get(&caps[0])
                        .cloned()
                        .unwrap_or_else(|| caps[0].to_string())
                })
                .into_owned(),
        }
    }
}
