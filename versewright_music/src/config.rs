// Data-driven composer configuration.
//
// Every table and tunable constant the pipeline reads lives in
// `ComposerConfig`: the lyric lexicon, mood and genre tables, the feature
// baseline, key candidates, contour and vocal parameters, and the default
// voice. Stages never use magic numbers; they borrow the config.
//
// `ComposerConfig::default()` carries the built-in tables. A config can also
// be loaded from JSON with `ComposerConfig::from_json()`; every struct is
// `#[serde(default)]`, so a JSON document only needs the fields it changes.
// Note that a map field present in the JSON replaces the built-in map
// wholesale (a `genres` object with only "polka" drops "pop").
//
// Labels are looked up case-insensitively through `mood()` and `genre()`.
// `BTreeMap` keeps iteration and serialized output deterministic.
//
// See also: `scale.rs` (`KeySelector` reads `keys` and `moods`),
// `features.rs` (`FeatureBaseline`, `FeatureOverride`), `contour.rs`
// (`ContourParams`), `vocal.rs` (`VocalParams`), `song.rs` (genre
// resolution, tempo sampling).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use versewright_lyrics::Lexicon;

use crate::features::{FeatureBaseline, FeatureOverride};
use crate::scale::Scale;
use crate::voice::VoiceProfile;

// ---------------------------------------------------------------------------
// Mood and genre tables
// ---------------------------------------------------------------------------

/// How a mood label shapes key, tempo, and energy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodProfile {
    pub scale: Scale,
    /// Multiplies the sampled tempo; ignored when the caller fixes a tempo.
    pub tempo_multiplier: f64,
    /// Feature energy set by this mood.
    pub energy: f64,
}

impl MoodProfile {
    pub fn new(scale: Scale, tempo_multiplier: f64, energy: f64) -> Self {
        MoodProfile {
            scale,
            tempo_multiplier,
            energy,
        }
    }
}

/// Genre defaults: tempo range, section layout, vocal style, feature tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenreProfile {
    /// Inclusive-low, exclusive-high BPM range for a defaulted tempo.
    pub tempo_range: (u32, u32),
    pub sections: Vec<String>,
    pub vocal_style: String,
    pub features: FeatureOverride,
}

impl Default for GenreProfile {
    fn default() -> Self {
        GenreProfile::new((100, 140), &[], "clear_melodic", FeatureOverride::default())
    }
}

impl GenreProfile {
    pub fn new(tempo_range: (u32, u32), sections: &[&str], vocal_style: &str, features: FeatureOverride) -> Self {
        GenreProfile {
            tempo_range,
            sections: sections.iter().map(|s| s.to_string()).collect(),
            vocal_style: vocal_style.to_string(),
            features,
        }
    }

    pub fn pop() -> Self {
        GenreProfile::new(
            (100, 140),
            &["intro", "verse", "chorus", "verse", "chorus", "bridge", "chorus", "outro"],
            "clear_melodic",
            FeatureOverride {
                energy: Some(0.7),
                danceability: Some(0.8),
                acousticness: Some(0.2),
                ..FeatureOverride::default()
            },
        )
    }

    pub fn rock() -> Self {
        GenreProfile::new(
            (110, 160),
            &["intro", "verse", "chorus", "verse", "chorus", "solo", "chorus", "outro"],
            "powerful_raspy",
            FeatureOverride {
                energy: Some(0.9),
                danceability: Some(0.6),
                acousticness: Some(0.1),
                ..FeatureOverride::default()
            },
        )
    }

    pub fn electronic() -> Self {
        GenreProfile::new(
            (120, 140),
            &["intro", "buildup", "drop", "breakdown", "buildup", "drop", "outro"],
            "processed_synthetic",
            FeatureOverride {
                energy: Some(0.8),
                danceability: Some(0.9),
                acousticness: Some(0.05),
                ..FeatureOverride::default()
            },
        )
    }

    pub fn hip_hop() -> Self {
        GenreProfile::new(
            (85, 100),
            &["intro", "verse", "hook", "verse", "hook", "bridge", "hook", "outro"],
            "rhythmic_spoken",
            FeatureOverride {
                energy: Some(0.8),
                danceability: Some(0.8),
                ..FeatureOverride::default()
            },
        )
    }

    pub fn folk() -> Self {
        GenreProfile::new(
            (80, 110),
            &["intro", "verse", "chorus", "verse", "chorus", "outro"],
            "acoustic_warm",
            FeatureOverride {
                energy: Some(0.4),
                danceability: Some(0.3),
                acousticness: Some(0.8),
                ..FeatureOverride::default()
            },
        )
    }

    pub fn jazz() -> Self {
        GenreProfile::new(
            (90, 130),
            &["intro", "head", "solo", "solo", "head", "outro"],
            "smooth_expressive",
            FeatureOverride {
                energy: Some(0.6),
                acousticness: Some(0.7),
                ..FeatureOverride::default()
            },
        )
    }

    pub fn classical() -> Self {
        GenreProfile::new(
            (60, 100),
            &["exposition", "development", "recapitulation", "coda"],
            "operatic_legato",
            FeatureOverride {
                energy: Some(0.4),
                acousticness: Some(0.9),
                ..FeatureOverride::default()
            },
        )
    }
}

fn default_moods() -> BTreeMap<String, MoodProfile> {
    [
        ("happy", MoodProfile::new(Scale::Major, 1.1, 0.8)),
        ("sad", MoodProfile::new(Scale::Minor, 0.9, 0.4)),
        ("energetic", MoodProfile::new(Scale::Mixolydian, 1.2, 0.9)),
        ("calm", MoodProfile::new(Scale::PentatonicMajor, 0.8, 0.3)),
        ("mysterious", MoodProfile::new(Scale::Dorian, 0.95, 0.5)),
        ("uplifting", MoodProfile::new(Scale::Major, 1.05, 0.7)),
        ("nostalgic", MoodProfile::new(Scale::Dorian, 0.95, 0.5)),
        ("dreamy", MoodProfile::new(Scale::PentatonicMajor, 0.85, 0.4)),
        ("melancholy", MoodProfile::new(Scale::PentatonicMinor, 0.85, 0.35)),
        ("bluesy", MoodProfile::new(Scale::Blues, 0.95, 0.6)),
    ]
    .into_iter()
    .map(|(name, profile)| (name.to_string(), profile))
    .collect()
}

fn default_genres() -> BTreeMap<String, GenreProfile> {
    [
        ("pop", GenreProfile::pop()),
        ("rock", GenreProfile::rock()),
        ("electronic", GenreProfile::electronic()),
        ("hip_hop", GenreProfile::hip_hop()),
        ("folk", GenreProfile::folk()),
        ("jazz", GenreProfile::jazz()),
        ("classical", GenreProfile::classical()),
    ]
    .into_iter()
    .map(|(name, profile)| (name.to_string(), profile))
    .collect()
}

// ---------------------------------------------------------------------------
// Stage parameters
// ---------------------------------------------------------------------------

/// Root candidates and emotion thresholds for key selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyParams {
    /// Average emotion above this picks major, below its negation minor.
    pub scale_threshold: f64,
    /// Average emotion above this picks `bright_roots`, below its negation
    /// `dark_roots`.
    pub root_threshold: f64,
    pub bright_roots: Vec<i32>,
    pub dark_roots: Vec<i32>,
    pub neutral_roots: Vec<i32>,
}

impl Default for KeyParams {
    fn default() -> Self {
        KeyParams {
            scale_threshold: 0.3,
            root_threshold: 0.5,
            bright_roots: vec![60, 62, 64, 67],
            dark_roots: vec![57, 59, 61, 65],
            neutral_roots: vec![60, 62, 65, 67],
        }
    }
}

/// Melodic contour constants. Durations are in beats at `reference_tempo`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContourParams {
    /// Semitones above the root where the pitch cursor starts.
    pub start_offset: i32,
    /// Base cursor step for a stressed syllable.
    pub stressed_step: i32,
    /// Base cursor step for an unstressed syllable.
    pub unstressed_step: i32,
    /// Emotion multiplier for the stressed step (truncated toward zero).
    pub stressed_emotion_step: f64,
    /// Emotion multiplier for the unstressed step (truncated toward zero).
    pub unstressed_emotion_step: f64,
    /// Weights for a jitter of -1, 0, +1 semitones.
    pub jitter_weights: [u32; 3],
    pub reference_tempo: f64,
    pub stressed_beats: f64,
    /// Added to `stressed_beats` per unit of line emotion.
    pub stressed_emotion_beats: f64,
    pub unstressed_beats: f64,
    /// Floor on a note's duration, keeping it positive for extreme weights.
    pub min_duration: f64,
    pub stressed_velocity: i32,
    pub unstressed_velocity: i32,
    /// Velocity added per unit of |word emotion| (truncated).
    pub emotion_velocity: f64,
    pub min_velocity: u8,
    pub max_velocity: u8,
}

impl Default for ContourParams {
    fn default() -> Self {
        ContourParams {
            start_offset: 12,
            stressed_step: 2,
            unstressed_step: -1,
            stressed_emotion_step: 2.0,
            unstressed_emotion_step: 1.0,
            jitter_weights: [20, 60, 20],
            reference_tempo: 120.0,
            stressed_beats: 0.75,
            stressed_emotion_beats: 0.25,
            unstressed_beats: 0.5,
            min_duration: 0.01,
            stressed_velocity: 90,
            unstressed_velocity: 70,
            emotion_velocity: 20.0,
            min_velocity: 40,
            max_velocity: 127,
        }
    }
}

/// Vocal derivation constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VocalParams {
    /// Contour and dynamics samples per beat of note duration.
    pub samples_per_beat: f64,
    /// Standard deviation of the Gaussian pitch jitter, in Hz.
    pub pitch_jitter_hz: f64,
    /// MIDI pitch with frequency `reference_hz` (A4).
    pub reference_pitch: i32,
    pub reference_hz: f64,
    /// Fraction of a note's samples spent ramping up.
    pub attack_fraction: f64,
    /// Fraction of a note's samples after which the ramp down starts.
    pub release_start: f64,
    /// Fixed effect settings; vibrato depth and breath noise come from the
    /// voice profile.
    pub effects: BTreeMap<String, f64>,
    pub vibrato_rate: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub format: String,
}

impl Default for VocalParams {
    fn default() -> Self {
        VocalParams {
            samples_per_beat: 10.0,
            pitch_jitter_hz: 2.0,
            reference_pitch: 69,
            reference_hz: 440.0,
            attack_fraction: 0.1,
            release_start: 0.8,
            effects: [
                ("reverb", 0.3),
                ("chorus", 0.2),
                ("compression", 0.6),
                ("eq_low", 0.0),
                ("eq_mid", 0.1),
                ("eq_high", 0.2),
            ]
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect(),
            vibrato_rate: 5.0,
            sample_rate: 44_100,
            channels: 1,
            format: "wav".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposerConfig {
    pub lexicon: Lexicon,
    pub moods: BTreeMap<String, MoodProfile>,
    pub genres: BTreeMap<String, GenreProfile>,
    /// Genre whose tempo range, sections and vocal style stand in for an
    /// unknown genre.
    pub default_genre: String,
    pub baseline: FeatureBaseline,
    pub keys: KeyParams,
    pub contour: ContourParams,
    pub vocal: VocalParams,
    /// Voice used when the request carries no profile. Its articulation is
    /// replaced by the genre's vocal style.
    pub default_voice: VoiceProfile,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        ComposerConfig {
            lexicon: Lexicon::default(),
            moods: default_moods(),
            genres: default_genres(),
            default_genre: "pop".to_string(),
            baseline: FeatureBaseline::default(),
            keys: KeyParams::default(),
            contour: ContourParams::default(),
            vocal: VocalParams::default(),
            default_voice: VoiceProfile::default(),
        }
    }
}

/// Lowercase and trim a label for table lookup.
pub fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase()
}

impl ComposerConfig {
    /// Parse a config from JSON. Omitted fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn mood(&self, label: &str) -> Option<&MoodProfile> {
        self.moods.get(&normalize_label(label))
    }

    pub fn genre(&self, label: &str) -> Option<&GenreProfile> {
        self.genres.get(&normalize_label(label))
    }

    /// The genre profile, or the default genre's when the label is unknown.
    /// The flag is `true` when the fallback was used.
    pub fn genre_or_default(&self, label: &str) -> (GenreProfile, bool) {
        match self.genre(label) {
            Some(profile) => (profile.clone(), false),
            None => (
                self.genre(&self.default_genre).cloned().unwrap_or_default(),
                true,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tables() {
        let config = ComposerConfig::default();
        assert_eq!(config.moods.len(), 10);
        assert_eq!(config.genres.len(), 7);
        assert_eq!(config.mood("happy").unwrap().scale, Scale::Major);
        assert_eq!(config.mood("bluesy").unwrap().scale, Scale::Blues);
        assert_eq!(config.genre("pop").unwrap().tempo_range, (100, 140));
        assert_eq!(config.genre("electronic").unwrap().vocal_style, "processed_synthetic");
        assert!(config.genres.contains_key(&config.default_genre));
    }

    #[test]
    fn test_label_lookup_is_case_insensitive() {
        let config = ComposerConfig::default();
        assert!(config.mood("  Happy ").is_some());
        assert!(config.genre("ROCK").is_some());
        assert!(config.genre("polka").is_none());
    }

    #[test]
    fn test_genre_or_default() {
        let config = ComposerConfig::default();
        let (rock, fallback) = config.genre_or_default("rock");
        assert!(!fallback);
        assert_eq!(rock.vocal_style, "powerful_raspy");

        let (polka, fallback) = config.genre_or_default("polka");
        assert!(fallback);
        assert_eq!(polka, GenreProfile::pop());
    }

    #[test]
    fn test_every_genre_has_valid_tempo_range() {
        let config = ComposerConfig::default();
        for (name, genre) in &config.genres {
            let (lo, hi) = genre.tempo_range;
            assert!(lo > 0 && lo < hi, "{name}: {lo}..{hi}");
            assert!(!genre.sections.is_empty(), "{name} has no sections");
        }
    }

    #[test]
    fn test_from_json_partial() {
        let json = r#"{"default_genre": "rock", "contour": {"jitter_weights": [0, 1, 0]}}"#;
        let config = ComposerConfig::from_json(json).unwrap();
        assert_eq!(config.default_genre, "rock");
        assert_eq!(config.contour.jitter_weights, [0, 1, 0]);
        // Untouched fields keep their defaults.
        assert_eq!(config.contour.stressed_velocity, 90);
        assert_eq!(config.moods.len(), 10);
        assert_eq!(config.lexicon, Lexicon::default());
    }

    #[test]
    fn test_default_config_roundtrip() {
        let config = ComposerConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(ComposerConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_from_json_rejects_bad_types() {
        assert!(ComposerConfig::from_json(r#"{"moods": {"odd": {"scale": "lydian"}}}"#).is_err());
        assert!(ComposerConfig::from_json("42").is_err());
        assert!(ComposerConfig::from_json(r#""pop""#).is_err());
        assert!(ComposerConfig::from_json(r#"{"contour": {"min_velocity": 300}}"#).is_err());
    }
}
