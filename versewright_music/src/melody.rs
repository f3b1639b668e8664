// Melody data model: notes, phrases, and the melody aggregate.
//
// A `Note` is one sung syllable: a MIDI pitch, a duration in beats, a
// velocity, the syllable it carries, and an absolute start time in beats.
// A `Phrase` is the run of notes for one lyric line. Notes within a phrase
// are contiguous (each starts where the previous one ends), so a phrase's
// span equals the sum of its note durations.
//
// `Melody` bundles the phrases with the feature profile, the chosen key,
// and the lyric structure that produced them. Its `total_duration` and
// `note_count` are derived from the phrases in `Melody::new()` and are only
// readable afterwards. Deserialization goes through `MelodyParts` and then
// `Melody::new()`, so serialized aggregates are ignored and recomputed.

use serde::{Deserialize, Serialize};
use std::fmt;
use versewright_lyrics::LyricStructure;

use crate::features::AudioFeatureProfile;
use crate::scale::KeyChoice;

/// The syllable a note carries: the word plus, for multi-syllable words, the
/// 0-based syllable index. Displays as `love` or `beautiful[1]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyllableLabel {
    pub word: String,
    pub index: Option<usize>,
}

impl SyllableLabel {
    pub fn new(word: &str, index: Option<usize>) -> Self {
        SyllableLabel {
            word: word.to_string(),
            index,
        }
    }
}

impl fmt::Display for SyllableLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(i) => write!(f, "{}[{}]", self.word, i),
            None => f.write_str(&self.word),
        }
    }
}

/// One sung event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// MIDI pitch number, always inside the song's key. Not clamped to
    /// 0..=127.
    pub pitch: i32,
    /// Beats, always positive.
    pub duration: f64,
    /// 40..=127.
    pub velocity: u8,
    pub syllable: SyllableLabel,
    /// Absolute start time in beats.
    pub timestamp: f64,
}

/// The notes for one lyric line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phrase {
    pub notes: Vec<Note>,
    pub start_time: f64,
    pub emotion_weight: f64,
    pub lyric_line: String,
}

impl Phrase {
    /// Sum of note durations; zero for a phrase without notes.
    pub fn span(&self) -> f64 {
        self.notes.iter().map(|n| n.duration).sum()
    }

    pub fn end_time(&self) -> f64 {
        self.start_time + self.span()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

/// The finished composition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "MelodyParts")]
pub struct Melody {
    phrases: Vec<Phrase>,
    features: AudioFeatureProfile,
    key: KeyChoice,
    structure: LyricStructure,
    total_duration: f64,
    note_count: usize,
}

/// The stored fields of a `Melody`, without its aggregates.
#[derive(Deserialize)]
struct MelodyParts {
    phrases: Vec<Phrase>,
    features: AudioFeatureProfile,
    key: KeyChoice,
    structure: LyricStructure,
}

impl From<MelodyParts> for Melody {
    fn from(parts: MelodyParts) -> Self {
        Melody::new(parts.phrases, parts.features, parts.key, parts.structure)
    }
}

impl Melody {
    pub fn new(phrases: Vec<Phrase>, features: AudioFeatureProfile, key: KeyChoice, structure: LyricStructure) -> Self {
        let total_duration = phrases.iter().map(Phrase::span).sum();
        let note_count = phrases.iter().map(|p| p.notes.len()).sum();
        Melody {
            phrases,
            features,
            key,
            structure,
            total_duration,
            note_count,
        }
    }

    pub fn phrases(&self) -> &[Phrase] {
        &self.phrases
    }

    pub fn features(&self) -> &AudioFeatureProfile {
        &self.features
    }

    pub fn key(&self) -> &KeyChoice {
        &self.key
    }

    pub fn structure(&self) -> &LyricStructure {
        &self.structure
    }

    /// Sum of all phrase spans, in beats.
    pub fn total_duration(&self) -> f64 {
        self.total_duration
    }

    pub fn note_count(&self) -> usize {
        self.note_count
    }

    /// All notes in time order.
    pub fn notes(&self) -> impl Iterator<Item = &Note> {
        self.phrases.iter().flat_map(|p| p.notes.iter())
    }

    /// Lowest and highest pitch, or None for a melody without notes.
    pub fn pitch_range(&self) -> Option<(i32, i32)> {
        self.notes().fold(None, |range, note| match range {
            None => Some((note.pitch, note.pitch)),
            Some((lo, hi)) => Some((lo.min(note.pitch), hi.max(note.pitch))),
        })
    }
}
