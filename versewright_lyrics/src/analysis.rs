// Lyric structure analysis: lines → words → syllables, stress, sentiment.
//
// The analyzer is deliberately crude. Syllables are estimated by counting
// vowel letters (a, e, i, o, u), floored at one. Stress comes from the
// lexicon's override table when the word is known there, otherwise from the
// syllable count: one syllable is stressed, two are trochaic (stressed then
// unstressed), and longer words alternate starting stressed. Sentiment is a
// lexicon lookup, 0.0 for unknown words, averaged per line.
//
// Blank lines are dropped before analysis, so they neither produce a
// `LineAnalysis` nor consume a slot in the melody timeline. Words are
// lowercased and stripped of leading/trailing punctuation for lookup; a word
// that is empty after stripping (e.g. a lone "—") is dropped.
//
// Analysis is total: any input, including the empty string, yields a valid
// `LyricStructure`.

use crate::Lexicon;
use crate::types::{LineAnalysis, LyricStructure, WordUnit};

/// Borrows a `Lexicon` and analyzes lyric text against it.
#[derive(Debug, Clone, Copy)]
pub struct LyricAnalyzer<'a> {
    lexicon: &'a Lexicon,
}

impl<'a> LyricAnalyzer<'a> {
    pub fn new(lexicon: &'a Lexicon) -> Self {
        LyricAnalyzer { lexicon }
    }

    /// Analyze a full lyric text.
    pub fn analyze(&self, lyrics: &str) -> LyricStructure {
        let lines: Vec<LineAnalysis> = lyrics
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| self.analyze_line(line))
            .collect();

        let total_syllables = lines.iter().map(LineAnalysis::syllable_count).sum();

        LyricStructure {
            lines,
            total_syllables,
        }
    }

    /// Analyze one (already trimmed, non-blank) line.
    pub fn analyze_line(&self, line: &str) -> LineAnalysis {
        let words: Vec<WordUnit> = line
            .split_whitespace()
            .filter_map(normalize_word)
            .map(|word| self.analyze_word(word))
            .collect();

        let emotion_weight = if words.is_empty() {
            0.0
        } else {
            words.iter().map(|w| w.emotion_weight).sum::<f64>() / words.len() as f64
        };

        LineAnalysis {
            text: line.to_string(),
            words,
            emotion_weight,
        }
    }

    /// Analyze one normalized (lowercase, non-empty) word.
    pub fn analyze_word(&self, word: String) -> WordUnit {
        let stress = match self.lexicon.stress_override(&word) {
            Some(pattern) => pattern.to_vec(),
            None => default_stress(vowel_syllables(&word)),
        };
        let emotion_weight = self.lexicon.emotion_weight(&word);

        WordUnit {
            syllable_count: stress.len(),
            stress,
            emotion_weight,
            text: word,
        }
    }
}

/// Lowercase a raw token and strip non-alphanumeric characters from both
/// ends. Inner apostrophes survive ("i'm"). Returns `None` if nothing is left.
pub fn normalize_word(raw: &str) -> Option<String> {
    let trimmed = raw.trim_matches(|c: char| !c.is_alphanumeric());
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Count vowel letters, floored at one syllable.
pub fn vowel_syllables(word: &str) -> usize {
    let vowels = word
        .chars()
        .filter(|c| matches!(c.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u'))
        .count();
    vowels.max(1)
}

/// Stress pattern derived from syllable count alone.
pub fn default_stress(syllables: usize) -> Vec<bool> {
    match syllables {
        0 | 1 => vec![true],
        2 => vec![true, false],
        n => (0..n).map(|i| i % 2 == 0).collect(),
    }
}
