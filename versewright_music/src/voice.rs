// Voice categories and the caller-facing voice profile.
//
// A `VoiceProfile` expresses vocal intent: which kind of voice sings, its
// MIDI pitch range, vibrato intensity, breath control, and an articulation
// label (usually the genre's vocal style). It shapes the effect settings and
// the `VocalTrack` descriptor produced by vocal.rs; it does not constrain
// the melody's pitches.
//
// Category labels arrive as free text. Unknown labels map to `MaleLead`
// rather than failing. The one non-category label, "no_vocals", marks an
// instrumental-leaning song and is checked with `is_no_vocals`. Each category carries static `VoiceTraits` (typical
// sung frequency range, formant shift, breathiness); only three categories
// have measured traits, the rest reuse the nearest of those.
//
// `VoiceProfile::normalized()` is the one validation point: an inverted
// pitch range is swapped (with a warning), anything else malformed is
// rejected with `ComposeError::InvalidVoiceProfile`.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ComposeError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceCategory {
    #[default]
    MaleLead,
    FemaleLead,
    Choir,
    Rap,
    Whisper,
    Powerful,
    Soft,
    Raspy,
    AutoTuned,
}

/// Voice label that marks a song as instrumental-leaning rather than naming a
/// category.
pub const NO_VOCALS_LABEL: &str = "no_vocals";

/// Check whether a free-text voice label is `NO_VOCALS_LABEL` ("No Vocals",
/// "no-vocals", ...).
pub fn is_no_vocals(label: &str) -> bool {
    label_key(label) == NO_VOCALS_LABEL
}

fn label_key(label: &str) -> String {
    label
        .trim()
        .chars()
        .map(|c| if c == '-' || c == ' ' { '_' } else { c.to_ascii_lowercase() })
        .collect()
}

/// Static acoustic traits of a voice category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoiceTraits {
    /// Typical sung fundamental range in Hz (low, high).
    pub hz_range: (f64, f64),
    pub formant_shift: f64,
    pub breathiness: f64,
}

const MALE_LEAD_TRAITS: VoiceTraits = VoiceTraits {
    hz_range: (80.0, 350.0),
    formant_shift: 0.0,
    breathiness: 0.2,
};

const FEMALE_LEAD_TRAITS: VoiceTraits = VoiceTraits {
    hz_range: (165.0, 700.0),
    formant_shift: 0.2,
    breathiness: 0.3,
};

const CHOIR_TRAITS: VoiceTraits = VoiceTraits {
    hz_range: (100.0, 500.0),
    formant_shift: 0.1,
    breathiness: 0.1,
};

impl VoiceCategory {
    pub const ALL: [VoiceCategory; 9] = [
        VoiceCategory::MaleLead,
        VoiceCategory::FemaleLead,
        VoiceCategory::Choir,
        VoiceCategory::Rap,
        VoiceCategory::Whisper,
        VoiceCategory::Powerful,
        VoiceCategory::Soft,
        VoiceCategory::Raspy,
        VoiceCategory::AutoTuned,
    ];

    /// Parse a free-text label ("Female Lead", "auto-tuned", ...). Unknown
    /// labels become `MaleLead`.
    pub fn from_label(label: &str) -> Self {
        let key = label_key(label);
        VoiceCategory::ALL
            .into_iter()
            .find(|c| c.label() == key)
            .unwrap_or_default()
    }

    pub fn label(self) -> &'static str {
        match self {
            VoiceCategory::MaleLead => "male_lead",
            VoiceCategory::FemaleLead => "female_lead",
            VoiceCategory::Choir => "choir",
            VoiceCategory::Rap => "rap",
            VoiceCategory::Whisper => "whisper",
            VoiceCategory::Powerful => "powerful",
            VoiceCategory::Soft => "soft",
            VoiceCategory::Raspy => "raspy",
            VoiceCategory::AutoTuned => "auto_tuned",
        }
    }

    pub fn traits(self) -> VoiceTraits {
        match self {
            VoiceCategory::MaleLead | VoiceCategory::Rap | VoiceCategory::Powerful | VoiceCategory::Raspy => {
                MALE_LEAD_TRAITS
            }
            VoiceCategory::FemaleLead | VoiceCategory::Whisper | VoiceCategory::Soft => FEMALE_LEAD_TRAITS,
            VoiceCategory::Choir | VoiceCategory::AutoTuned => CHOIR_TRAITS,
        }
    }
}

/// Caller-facing vocal intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceProfile {
    pub category: VoiceCategory,
    /// MIDI pitch range (low, high); low < high once normalized.
    pub pitch_range: (i32, i32),
    /// 0.0 to 1.0.
    pub vibrato_intensity: f64,
    /// 0.0 to 1.0; higher means less audible breath.
    pub breath_control: f64,
    pub articulation_style: String,
}

impl Default for VoiceProfile {
    fn default() -> Self {
        VoiceProfile {
            category: VoiceCategory::MaleLead,
            pitch_range: (60, 84),
            vibrato_intensity: 0.3,
            breath_control: 0.7,
            articulation_style: "clear_melodic".to_string(),
        }
    }
}

impl VoiceProfile {
    /// Validate the profile, swapping an inverted pitch range.
    pub fn normalized(mut self) -> Result<Self, ComposeError> {
        let (low, high) = self.pitch_range;
        if low == high {
            return Err(ComposeError::InvalidVoiceProfile(format!(
                "pitch range is empty ({low}..{high})"
            )));
        }
        if low > high {
            warn!(low, high, "inverted voice pitch range, swapping");
            self.pitch_range = (high, low);
        }
        for (name, value) in [
            ("vibrato_intensity", self.vibrato_intensity),
            ("breath_control", self.breath_control),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ComposeError::InvalidVoiceProfile(format!(
                    "{name} must be within 0.0..=1.0, got {value}"
                )));
            }
        }
        Ok(self)
    }
}
