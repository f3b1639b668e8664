// Scales, keys, and key selection.
//
// A song is sung in one key: a root MIDI pitch plus a scale, where the scale
// is an ascending set of semitone offsets from the root (always containing
// 0). Every generated note is quantized into the key before it is emitted.
//
// This module provides:
// - `Scale`: the seven supported scales and their interval patterns
// - `ScaleChoice` / `KeyChoice`: the chosen scale and root, with pitch-class
//   membership and quantization
// - `KeySelector`: picks the key from the lyric emotion and an optional mood
// - `pitch_name`: sharp-spelled note names ("C#4") for key labels
//
// Quantization is octave-relative and non-circular: an out-of-scale offset
// moves to the scale member with the smallest absolute difference inside the
// same octave (ties go to the lower member), so an offset of 11 in a scale
// without 11 moves down, never up to the next octave's root.
//
// Used by contour.rs for note pitches and features.rs for the key label.

use serde::{Deserialize, Serialize};
use tracing::warn;
use versewright_lyrics::LyricStructure;
use versewright_prng::SongRng;

use crate::config::ComposerConfig;

/// Fallback root when a configured candidate list is empty (middle C).
const FALLBACK_ROOT: i32 = 60;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// The supported scales, each defined by its interval pattern from the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scale {
    /// Ionian: W W H W W W H
    Major,
    /// Natural minor (Aeolian)
    Minor,
    /// Natural minor with raised 6th
    Dorian,
    /// Major with lowered 7th
    Mixolydian,
    PentatonicMajor,
    PentatonicMinor,
    /// Minor pentatonic plus the flat fifth
    Blues,
}

impl Scale {
    pub const ALL: [Scale; 7] = [
        Scale::Major,
        Scale::Minor,
        Scale::Dorian,
        Scale::Mixolydian,
        Scale::PentatonicMajor,
        Scale::PentatonicMinor,
        Scale::Blues,
    ];

    /// Ascending semitone offsets from the root.
    pub fn intervals(self) -> &'static [u8] {
        match self {
            Scale::Major => &[0, 2, 4, 5, 7, 9, 11],
            Scale::Minor => &[0, 2, 3, 5, 7, 8, 10],
            Scale::Dorian => &[0, 2, 3, 5, 7, 9, 10],
            Scale::Mixolydian => &[0, 2, 4, 5, 7, 9, 10],
            Scale::PentatonicMajor => &[0, 2, 4, 7, 9],
            Scale::PentatonicMinor => &[0, 3, 5, 7, 10],
            Scale::Blues => &[0, 3, 5, 6, 7, 10],
        }
    }

    /// Snake-case name, as used in configuration tables and metadata.
    pub fn name(self) -> &'static str {
        match self {
            Scale::Major => "major",
            Scale::Minor => "minor",
            Scale::Dorian => "dorian",
            Scale::Mixolydian => "mixolydian",
            Scale::PentatonicMajor => "pentatonic_major",
            Scale::PentatonicMinor => "pentatonic_minor",
            Scale::Blues => "blues",
        }
    }
}

/// A scale together with its concrete offsets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleChoice {
    pub scale: Scale,
    pub offsets: Vec<u8>,
}

impl From<Scale> for ScaleChoice {
    fn from(scale: Scale) -> Self {
        ScaleChoice {
            scale,
            offsets: scale.intervals().to_vec(),
        }
    }
}

/// The tonal center of a song: a root MIDI pitch and a scale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyChoice {
    pub root: i32,
    pub scale: ScaleChoice,
}

impl KeyChoice {
    pub fn new(root: i32, scale: Scale) -> Self {
        KeyChoice {
            root,
            scale: scale.into(),
        }
    }

    /// Offset of `pitch` above the root, reduced to one octave.
    fn offset(&self, pitch: i32) -> u8 {
        // rem_euclid(12) is always in 0..12.
        (pitch - self.root).rem_euclid(12) as u8
    }

    /// Check whether a pitch belongs to this key.
    pub fn contains(&self, pitch: i32) -> bool {
        self.scale.offsets.contains(&self.offset(pitch))
    }

    /// Move a raw pitch into the key, keeping its octave relative to the root.
    pub fn quantize(&self, pitch: i32) -> i32 {
        let offset = self.offset(pitch);
        let octave = (pitch - self.root).div_euclid(12);

        let pc = if self.scale.offsets.contains(&offset) {
            offset
        } else {
            let mut best = offset;
            let mut best_distance = u8::MAX;
            for &candidate in &self.scale.offsets {
                let distance = candidate.abs_diff(offset);
                if distance < best_distance {
                    best = candidate;
                    best_distance = distance;
                }
            }
            best
        };

        self.root + i32::from(pc) + octave * 12
    }

    /// Sharp-spelled name of the root pitch, e.g. "C4".
    pub fn root_name(&self) -> String {
        pitch_name(self.root)
    }
}

/// Sharp-spelled note name with octave, MIDI 60 = "C4".
pub fn pitch_name(pitch: i32) -> String {
    let name = NOTE_NAMES[pitch.rem_euclid(12) as usize];
    let octave = pitch.div_euclid(12) - 1;
    format!("{name}{octave}")
}

/// Chooses the key for a lyric structure.
#[derive(Debug, Clone, Copy)]
pub struct KeySelector<'a> {
    config: &'a ComposerConfig,
}

impl<'a> KeySelector<'a> {
    pub fn new(config: &'a ComposerConfig) -> Self {
        KeySelector { config }
    }

    /// Scale for the given average emotion; a known mood label wins.
    pub fn scale_for(&self, average_emotion: f64, mood: Option<&str>) -> Scale {
        if let Some(profile) = mood.and_then(|m| self.config.mood(m)) {
            return profile.scale;
        }
        let threshold = self.config.keys.scale_threshold;
        if average_emotion > threshold {
            Scale::Major
        } else if average_emotion < -threshold {
            Scale::Minor
        } else {
            Scale::Dorian
        }
    }

    /// Candidate roots for the given average emotion.
    pub fn root_candidates(&self, average_emotion: f64) -> &'a [i32] {
        let keys = &self.config.keys;
        if average_emotion > keys.root_threshold {
            &keys.bright_roots
        } else if average_emotion < -keys.root_threshold {
            &keys.dark_roots
        } else {
            &keys.neutral_roots
        }
    }

    /// Pick scale and root. Draws exactly one value from `rng`.
    pub fn select(&self, structure: &LyricStructure, mood: Option<&str>, rng: &mut SongRng) -> KeyChoice {
        let average = structure.average_emotion();
        let scale = self.scale_for(average, mood);
        let root = match rng.choose(self.root_candidates(average)) {
            Some(&root) => root,
            None => {
                warn!(average, "empty root candidate list, falling back to middle C");
                FALLBACK_ROOT
            }
        };
        KeyChoice::new(root, scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use versewright_lyrics::{Lexicon, LyricAnalyzer};

    #[test]
    fn test_intervals_ascending_and_rooted() {
        for scale in Scale::ALL {
            let intervals = scale.intervals();
            assert_eq!(intervals[0], 0, "{scale:?} must contain the root");
            assert!(
                intervals.windows(2).all(|w| w[0] < w[1]),
                "{scale:?} intervals not strictly ascending"
            );
            assert!(intervals.iter().all(|&i| i < 12));
        }
    }

    #[test]
    fn test_scale_names_match_serde() {
        for scale in Scale::ALL {
            let json = serde_json::to_string(&scale).unwrap();
            assert_eq!(json, format!("\"{}\"", scale.name()));
        }
    }

    #[test]
    fn test_c_major_membership() {
        let key = KeyChoice::new(60, Scale::Major);
        assert!(key.contains(60)); // C
        assert!(key.contains(64)); // E
        assert!(key.contains(71)); // B
        assert!(!key.contains(61)); // C#
        assert!(!key.contains(66)); // F#
        assert!(key.contains(48)); // C an octave below
    }

    #[test]
    fn test_quantize_in_scale_unchanged() {
        let key = KeyChoice::new(60, Scale::Major);
        assert_eq!(key.quantize(72), 72);
        assert_eq!(key.quantize(59), 59);
    }

    #[test]
    fn test_quantize_ties_go_down() {
        let key = KeyChoice::new(60, Scale::Major);
        // C# is equidistant from C and D.
        assert_eq!(key.quantize(73), 72);
        // F# is equidistant from F and G.
        assert_eq!(key.quantize(66), 65);
        // Below the root: A# (offset 10, octave -1) between A and B.
        assert_eq!(key.quantize(58), 57);
    }

    #[test]
    fn test_quantize_is_not_circular() {
        // Pentatonic major lacks 11; the nearest member within the octave is
        // 9, not the next octave's root.
        let key = KeyChoice::new(60, Scale::PentatonicMajor);
        assert_eq!(key.quantize(71), 69);
    }

    #[test]
    fn test_quantize_always_lands_in_key() {
        for scale in Scale::ALL {
            for root in [57, 60, 61, 67] {
                let key = KeyChoice::new(root, scale);
                for pitch in 30..100 {
                    let q = key.quantize(pitch);
                    assert!(key.contains(q), "{scale:?} root {root}: {pitch} -> {q}");
                    assert!((q - pitch).abs() <= 11);
                }
            }
        }
    }

    #[test]
    fn test_pitch_name() {
        assert_eq!(pitch_name(60), "C4");
        assert_eq!(pitch_name(61), "C#4");
        assert_eq!(pitch_name(69), "A4");
        assert_eq!(pitch_name(57), "A3");
        assert_eq!(pitch_name(0), "C-1");
    }

    #[test]
    fn test_scale_for_emotion_thresholds() {
        let config = ComposerConfig::default();
        let selector = KeySelector::new(&config);
        assert_eq!(selector.scale_for(0.31, None), Scale::Major);
        assert_eq!(selector.scale_for(0.3, None), Scale::Dorian);
        assert_eq!(selector.scale_for(-0.3, None), Scale::Dorian);
        assert_eq!(selector.scale_for(-0.31, None), Scale::Minor);
    }

    #[test]
    fn test_mood_overrides_emotion() {
        let config = ComposerConfig::default();
        let selector = KeySelector::new(&config);
        assert_eq!(selector.scale_for(0.9, Some("sad")), Scale::Minor);
        assert_eq!(selector.scale_for(-0.9, Some("Happy")), Scale::Major);
        // Unknown mood falls through to the emotion rule.
        assert_eq!(selector.scale_for(0.9, Some("grumpy")), Scale::Major);
    }

    #[test]
    fn test_root_candidates() {
        let config = ComposerConfig::default();
        let selector = KeySelector::new(&config);
        assert_eq!(selector.root_candidates(0.6), &[60, 62, 64, 67]);
        assert_eq!(selector.root_candidates(-0.6), &[57, 59, 61, 65]);
        assert_eq!(selector.root_candidates(0.5), &[60, 62, 65, 67]);
    }

    #[test]
    fn test_select_is_deterministic_and_from_candidates() {
        let config = ComposerConfig::default();
        let lexicon = Lexicon::default();
        let structure = LyricAnalyzer::new(&lexicon).analyze("love joy love");
        let selector = KeySelector::new(&config);

        let a = selector.select(&structure, None, &mut SongRng::new(9));
        let b = selector.select(&structure, None, &mut SongRng::new(9));
        assert_eq!(a, b);
        assert_eq!(a.scale.scale, Scale::Major);
        assert!([60, 62, 64, 67].contains(&a.root), "root {}", a.root);
    }

    #[test]
    fn test_select_empty_lyrics_is_neutral() {
        let config = ComposerConfig::default();
        let selector = KeySelector::new(&config);
        let key = selector.select(&LyricStructure::default(), None, &mut SongRng::new(1));
        assert_eq!(key.scale.scale, Scale::Dorian);
        assert!([60, 62, 65, 67].contains(&key.root));
    }
}
