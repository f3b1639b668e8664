// Audio feature profile synthesis.
//
// The feature profile is descriptive metadata attached to the melody: tempo,
// key label, time signature, and five continuous tags in [0, 1] (energy,
// valence, danceability, acousticness, instrumentalness). It does not feed
// back into note generation.
//
// Construction is default-then-override. The baseline comes from
// `FeatureBaseline` in the config; then an ordered list of `FeatureOverride`
// partial structs is merged field by field: the instrumental override (only
// for "no vocals" requests) first, the mood's second, the genre's last. Every override assigns absolute values, so applying the
// same list again leaves the profile unchanged. The five tags are clamped to
// [0, 1] after merging.

use serde::{Deserialize, Serialize};

use crate::config::ComposerConfig;
use crate::scale::KeyChoice;

/// Descriptive tags for the generated melody.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioFeatureProfile {
    /// Beats per minute, always positive.
    pub tempo: u32,
    /// Root pitch name, e.g. "D4".
    pub key: String,
    pub time_signature: String,
    pub energy: f64,
    pub valence: f64,
    pub danceability: f64,
    pub acousticness: f64,
    pub instrumentalness: f64,
}

impl AudioFeatureProfile {
    /// Merge overrides in order.
    pub fn apply_all(&mut self, overrides: &[FeatureOverride]) {
        for o in overrides {
            o.apply(self);
        }
        self.clamp();
    }

    fn clamp(&mut self) {
        for value in [
            &mut self.energy,
            &mut self.valence,
            &mut self.danceability,
            &mut self.acousticness,
            &mut self.instrumentalness,
        ] {
            *value = if value.is_finite() { (*value).clamp(0.0, 1.0) } else { 0.0 };
        }
    }
}

/// A partial profile: each present field overwrites the profile's value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub danceability: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acousticness: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instrumentalness: Option<f64>,
}

impl FeatureOverride {
    pub fn is_empty(&self) -> bool {
        *self == FeatureOverride::default()
    }

    pub fn apply(&self, profile: &mut AudioFeatureProfile) {
        let fields = [
            (self.energy, &mut profile.energy),
            (self.valence, &mut profile.valence),
            (self.danceability, &mut profile.danceability),
            (self.acousticness, &mut profile.acousticness),
            (self.instrumentalness, &mut profile.instrumentalness),
        ];
        for (value, slot) in fields {
            if let Some(v) = value {
                *slot = v;
            }
        }
    }
}

/// Baseline feature values before any override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureBaseline {
    pub time_signature: String,
    pub energy: f64,
    pub valence: f64,
    pub danceability: f64,
    pub acousticness: f64,
    pub instrumentalness: f64,
    /// Instrumentalness for songs requested without vocals.
    pub no_vocals_instrumentalness: f64,
    /// Mood energy above this yields `bright_valence`, otherwise
    /// `dark_valence`.
    pub valence_energy_threshold: f64,
    pub bright_valence: f64,
    pub dark_valence: f64,
}

impl Default for FeatureBaseline {
    fn default() -> Self {
        FeatureBaseline {
            time_signature: "4/4".to_string(),
            energy: 0.7,
            valence: 0.5,
            danceability: 0.6,
            acousticness: 0.3,
            instrumentalness: 0.1,
            no_vocals_instrumentalness: 0.8,
            valence_energy_threshold: 0.6,
            bright_valence: 0.8,
            dark_valence: 0.3,
        }
    }
}

/// Builds the feature profile from genre and mood tables.
#[derive(Debug, Clone, Copy)]
pub struct FeatureSynthesizer<'a> {
    config: &'a ComposerConfig,
}

impl<'a> FeatureSynthesizer<'a> {
    pub fn new(config: &'a ComposerConfig) -> Self {
        FeatureSynthesizer { config }
    }

    /// Baseline profile for a tempo and key, no overrides applied.
    pub fn baseline(&self, tempo: u32, key: &KeyChoice) -> AudioFeatureProfile {
        let b = &self.config.baseline;
        AudioFeatureProfile {
            tempo,
            key: key.root_name(),
            time_signature: b.time_signature.clone(),
            energy: b.energy,
            valence: b.valence,
            danceability: b.danceability,
            acousticness: b.acousticness,
            instrumentalness: b.instrumentalness,
        }
    }

    /// Ordered overrides: instrumental, then mood, then genre. Unknown labels
    /// contribute nothing.
    pub fn overrides(&self, genre: &str, mood: Option<&str>, instrumental: bool) -> Vec<FeatureOverride> {
        let mut overrides = Vec::with_capacity(3);
        if instrumental {
            overrides.push(FeatureOverride {
                instrumentalness: Some(self.config.baseline.no_vocals_instrumentalness),
                ..FeatureOverride::default()
            });
        }
        if let Some(profile) = mood.and_then(|m| self.config.mood(m)) {
            let b = &self.config.baseline;
            let valence = if profile.energy > b.valence_energy_threshold {
                b.bright_valence
            } else {
                b.dark_valence
            };
            overrides.push(FeatureOverride {
                energy: Some(profile.energy),
                valence: Some(valence),
                ..FeatureOverride::default()
            });
        }
        if let Some(profile) = self.config.genre(genre).filter(|p| !p.features.is_empty()) {
            overrides.push(profile.features.clone());
        }
        overrides
    }

    pub fn synthesize(
        &self,
        genre: &str,
        mood: Option<&str>,
        instrumental: bool,
        tempo: u32,
        key: &KeyChoice,
    ) -> AudioFeatureProfile {
        let mut profile = self.baseline(tempo, key);
        profile.apply_all(&self.overrides(genre, mood, instrumental));
        profile
    }
}
