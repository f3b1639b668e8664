// Core lyric analysis types: words, lines, and the whole-text structure.
//
// These types are produced by `analysis.rs` and consumed by the music crate:
// `versewright_music::scale` reads the per-line emotion weights to pick a
// key, `versewright_music::contour` walks each line's words and stress
// patterns to place notes, and the finished `LyricStructure` is kept inside
// the `Melody` as a structural trace.
//
// The type hierarchy is:
// - `WordUnit`: one lowercase word with syllable count, stress, emotion
// - `LineAnalysis`: one non-blank lyric line and its mean emotion
// - `LyricStructure`: all lines in order plus the total syllable count
// - `LyricSummary`: coarse sentiment / complexity labels for metadata
//
// Values here are built once by the analyzer and never mutated afterwards.

use serde::{Deserialize, Serialize};

/// One lyric word with its syllable and stress breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordUnit {
    /// Lowercased word with edge punctuation removed.
    pub text: String,
    /// Always equal to `stress.len()` and never zero.
    pub syllable_count: usize,
    /// Per-syllable stress flags, `true` = stressed.
    pub stress: Vec<bool>,
    /// Signed sentiment weight; 0.0 for words missing from the lexicon.
    pub emotion_weight: f64,
}

impl WordUnit {
    pub fn is_monosyllabic(&self) -> bool {
        self.syllable_count == 1
    }
}

/// One non-blank lyric line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineAnalysis {
    /// The trimmed source line.
    pub text: String,
    pub words: Vec<WordUnit>,
    /// Arithmetic mean of the word weights, 0.0 for a line with no words.
    pub emotion_weight: f64,
}

impl LineAnalysis {
    pub fn syllable_count(&self) -> usize {
        self.words.iter().map(|w| w.syllable_count).sum()
    }
}

/// The analyzed lyric text: non-blank lines in source order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LyricStructure {
    pub lines: Vec<LineAnalysis>,
    pub total_syllables: usize,
}

impl LyricStructure {
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn word_count(&self) -> usize {
        self.lines.iter().map(|l| l.words.len()).sum()
    }

    /// Per-line emotion weights in line order.
    pub fn emotional_arc(&self) -> Vec<f64> {
        self.lines.iter().map(|l| l.emotion_weight).collect()
    }

    /// Mean of the line weights, 0.0 when there are no lines.
    pub fn average_emotion(&self) -> f64 {
        if self.lines.is_empty() {
            return 0.0;
        }
        self.lines.iter().map(|l| l.emotion_weight).sum::<f64>() / self.lines.len() as f64
    }

    /// Coarse sentiment and complexity labels for the whole text.
    ///
    /// Sentiment compares the number of positively and negatively weighted
    /// words; complexity buckets the word count (> 100 high, > 50 medium).
    pub fn summary(&self) -> LyricSummary {
        let words = self.lines.iter().flat_map(|l| l.words.iter());
        let (mut positive, mut negative) = (0usize, 0usize);
        for word in words {
            if word.emotion_weight > 0.0 {
                positive += 1;
            } else if word.emotion_weight < 0.0 {
                negative += 1;
            }
        }

        let sentiment = match positive.cmp(&negative) {
            std::cmp::Ordering::Greater => Sentiment::Positive,
            std::cmp::Ordering::Less => Sentiment::Negative,
            std::cmp::Ordering::Equal => Sentiment::Neutral,
        };

        let word_count = self.word_count();
        let complexity = if word_count > 100 {
            Complexity::High
        } else if word_count > 50 {
            Complexity::Medium
        } else {
            Complexity::Low
        };

        LyricSummary {
            word_count,
            line_count: self.line_count(),
            sentiment,
            complexity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Low,
    Medium,
    High,
}

/// Whole-text labels recorded in song metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LyricSummary {
    pub word_count: usize,
    pub line_count: usize,
    pub sentiment: Sentiment,
    pub complexity: Complexity,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str, weight: f64) -> WordUnit {
        WordUnit {
            text: text.to_string(),
            syllable_count: 1,
            stress: vec![true],
            emotion_weight: weight,
        }
    }

    fn line(words: Vec<WordUnit>, weight: f64) -> LineAnalysis {
        LineAnalysis {
            text: words
                .iter()
                .map(|w| w.text.as_str())
                .collect::<Vec<_>>()
                .join(" "),
            words,
            emotion_weight: weight,
        }
    }

    #[test]
    fn test_empty_structure_has_zero_average() {
        let structure = LyricStructure::default();
        assert_eq!(structure.average_emotion(), 0.0);
        assert!(structure.emotional_arc().is_empty());
        assert_eq!(structure.line_count(), 0);
    }

    #[test]
    fn test_average_emotion_is_mean_of_lines() {
        let structure = LyricStructure {
            lines: vec![line(vec![word("love", 0.9)], 0.9), line(vec![word("pain", -0.8)], -0.3)],
            total_syllables: 2,
        };
        assert!((structure.average_emotion() - 0.3).abs() < 1e-12);
        assert_eq!(structure.emotional_arc(), vec![0.9, -0.3]);
    }

    #[test]
    fn test_summary_sentiment() {
        let structure = LyricStructure {
            lines: vec![line(
                vec![word("love", 0.9), word("joy", 0.8), word("pain", -0.8), word("the", 0.0)],
                0.225,
            )],
            total_syllables: 4,
        };
        let summary = structure.summary();
        assert_eq!(summary.sentiment, Sentiment::Positive);
        assert_eq!(summary.word_count, 4);
        assert_eq!(summary.line_count, 1);
        assert_eq!(summary.complexity, Complexity::Low);
    }

    #[test]
    fn test_summary_complexity_buckets() {
        let many = |n: usize| LyricStructure {
            lines: vec![line((0..n).map(|_| word("la", 0.0)).collect(), 0.0)],
            total_syllables: n,
        };
        assert_eq!(many(50).summary().complexity, Complexity::Low);
        assert_eq!(many(51).summary().complexity, Complexity::Medium);
        assert_eq!(many(101).summary().complexity, Complexity::High);
        assert_eq!(many(10).summary().sentiment, Sentiment::Neutral);
    }

    #[test]
    fn test_sentiment_serde() {
        let json = serde_json::to_string(&Sentiment::Negative).unwrap();
        assert_eq!(json, "\"negative\"");
    }
}
