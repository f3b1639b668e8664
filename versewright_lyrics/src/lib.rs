// Shared lyric analysis crate for Versewright.
//
// Turns free-text lyrics into a `LyricStructure`: non-blank lines, each split
// into lowercase words with a vowel-count syllable estimate, a stress
// pattern, and a sentiment weight. The music crate consumes the structure to
// pick a key and to walk a melodic contour syllable by syllable.
//
// Architecture:
// - `types.rs`: `WordUnit`, `LineAnalysis`, `LyricStructure`, `LyricSummary`
// - `tables.rs`: built-in sentiment weights and stress overrides
// - `analysis.rs`: `LyricAnalyzer`, the line/word/syllable pass
// - `lib.rs` (this file): `Lexicon`, the lookup tables, loadable from JSON
//
// The lexicon is loaded via `Lexicon::from_json()` (JSON string in, typed
// struct out) or built from the embedded tables with `Lexicon::default()`.
// It is immutable once built; analyzers borrow it rather than copy it.

pub mod analysis;
pub mod tables;
pub mod types;

pub use analysis::LyricAnalyzer;
pub use types::{Complexity, LineAnalysis, LyricStructure, LyricSummary, Sentiment, WordUnit};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sentiment weights and stress overrides keyed by lowercase word.
///
/// `BTreeMap` keeps serialized output and iteration order stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Lexicon {
    pub emotion_weights: BTreeMap<String, f64>,
    pub stress_overrides: BTreeMap<String, Vec<bool>>,
}

impl Default for Lexicon {
    fn default() -> Self {
        Lexicon {
            emotion_weights: tables::EMOTION_WEIGHTS
                .iter()
                .map(|&(word, weight)| (word.to_string(), weight))
                .collect(),
            stress_overrides: tables::STRESS_OVERRIDES
                .iter()
                .map(|&(word, stress)| (word.to_string(), stress.to_vec()))
                .collect(),
        }
    }
}

impl Lexicon {
    /// Parse a lexicon from a JSON string. Omitted tables keep their
    /// built-in contents.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Sentiment weight for a lowercase word; unknown words weigh 0.0.
    pub fn emotion_weight(&self, word: &str) -> f64 {
        self.emotion_weights.get(word).copied().unwrap_or(0.0)
    }

    /// Explicit stress pattern for a known word. Empty patterns are ignored
    /// so every word keeps at least one syllable.
    pub fn stress_override(&self, word: &str) -> Option<&[bool]> {
        self.stress_overrides
            .get(word)
            .map(Vec::as_slice)
            .filter(|s| !s.is_empty())
    }
}
