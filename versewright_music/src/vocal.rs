// Vocal parameter derivation: phonemes, pitch contour, dynamics, effects.
//
// Turns a finished `Melody` into the parameters a downstream vocal
// synthesizer needs, time-aligned to the notes:
// - Phoneme events: each note's word is split into one pseudo-phoneme per
//   character, sharing the note's duration equally.
// - Pitch contour: the note's frequency (equal temperament around A4) with
//   Gaussian jitter, sampled `samples_per_beat` times per beat of duration.
// - Dynamics: a per-sample amplitude envelope (linear attack over the first
//   10%, sustain, linear release over the last 20%) scaled by velocity.
// - Effects: fixed settings plus vibrato depth and breath noise from the
//   voice profile.
// - `VocalTrack`: a closed descriptor of the render target (sample rate,
//   synthesis method, voice model, processing chain, summary stats).
//
// Derivation never fails on a well-formed melody. The only randomness is
// the pitch jitter, drawn from the generator the caller passes in.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use versewright_prng::SongRng;

use crate::config::{ComposerConfig, VocalParams};
use crate::melody::{Melody, Note};
use crate::voice::{VoiceCategory, VoiceProfile, VoiceTraits};

/// One timed speech unit within a note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhonemeEvent {
    pub phoneme: String,
    pub start_time: f64,
    pub duration: f64,
    pub pitch: i32,
    pub velocity: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SynthesisMethod {
    Parametric,
    /// Selected when the caller supplies a reference voice sample.
    NeuralVocoder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStage {
    PhonemeSynthesis,
    PitchModulation,
    DynamicControl,
    VocalEffects,
    Mastering,
}

impl ProcessingStage {
    pub const CHAIN: [ProcessingStage; 5] = [
        ProcessingStage::PhonemeSynthesis,
        ProcessingStage::PitchModulation,
        ProcessingStage::DynamicControl,
        ProcessingStage::VocalEffects,
        ProcessingStage::Mastering,
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackStats {
    pub phoneme_count: usize,
    /// (min, max) of the pitch contour in Hz; None when it is empty.
    pub pitch_range_hz: Option<(f64, f64)>,
    /// (min, max) of the dynamics envelope; None when it is empty.
    pub dynamic_range: Option<(f64, f64)>,
}

/// Descriptor of the vocal render target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocalTrack {
    pub sample_rate: u32,
    pub channels: u16,
    pub format: String,
    pub duration_beats: f64,
    pub synthesis: SynthesisMethod,
    pub voice_model: VoiceCategory,
    pub voice_traits: VoiceTraits,
    pub voice: VoiceProfile,
    pub user_voice_sample: Option<String>,
    pub processing_chain: Vec<ProcessingStage>,
    pub stats: TrackStats,
}

/// Vocal rendering parameters aligned to a melody.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocalRenderSpec {
    pub phonemes: Vec<PhonemeEvent>,
    /// Hz, one entry per sample.
    pub pitch_contour: Vec<f64>,
    /// Amplitude in [0, 1], one entry per sample.
    pub dynamics: Vec<f64>,
    pub effects: BTreeMap<String, f64>,
    pub track: VocalTrack,
}

#[derive(Debug, Clone, Copy)]
pub struct VocalDeriver<'a> {
    params: &'a VocalParams,
    default_voice: &'a VoiceProfile,
}

impl<'a> VocalDeriver<'a> {
    pub fn new(config: &'a ComposerConfig) -> Self {
        VocalDeriver {
            params: &config.vocal,
            default_voice: &config.default_voice,
        }
    }

    /// Derive the full render spec. A missing voice uses the configured
    /// default.
    pub fn derive(
        &self,
        melody: &Melody,
        voice: Option<&VoiceProfile>,
        user_voice_sample: Option<&str>,
        rng: &mut SongRng,
    ) -> VocalRenderSpec {
        let voice = voice.unwrap_or(self.default_voice);

        let phonemes: Vec<PhonemeEvent> = melody.notes().flat_map(|n| self.phonemes(n)).collect();
        let pitch_contour = self.pitch_contour(melody, rng);
        let dynamics = self.dynamics(melody);

        let track = VocalTrack {
            sample_rate: self.params.sample_rate,
            channels: self.params.channels,
            format: self.params.format.clone(),
            duration_beats: melody.total_duration(),
            synthesis: if user_voice_sample.is_some() {
                SynthesisMethod::NeuralVocoder
            } else {
                SynthesisMethod::Parametric
            },
            voice_model: voice.category,
            voice_traits: voice.category.traits(),
            voice: voice.clone(),
            user_voice_sample: user_voice_sample.map(str::to_string),
            processing_chain: ProcessingStage::CHAIN.to_vec(),
            stats: TrackStats {
                phoneme_count: phonemes.len(),
                pitch_range_hz: min_max(&pitch_contour),
                dynamic_range: min_max(&dynamics),
            },
        };

        VocalRenderSpec {
            phonemes,
            pitch_contour,
            dynamics,
            effects: self.effects(voice),
            track,
        }
    }

    /// One phoneme per character of the note's word, equal split.
    pub fn phonemes(&self, note: &Note) -> Vec<PhonemeEvent> {
        let symbols: Vec<char> = note.syllable.word.chars().collect();
        if symbols.is_empty() {
            return vec![PhonemeEvent {
                phoneme: String::new(),
                start_time: note.timestamp,
                duration: note.duration,
                pitch: note.pitch,
                velocity: note.velocity,
            }];
        }

        let share = note.duration / symbols.len() as f64;
        symbols
            .iter()
            .enumerate()
            .map(|(i, c)| PhonemeEvent {
                phoneme: c.to_string(),
                start_time: note.timestamp + share * i as f64,
                duration: share,
                pitch: note.pitch,
                velocity: note.velocity,
            })
            .collect()
    }

    /// Samples for a note of `duration` beats, at least one.
    pub fn sample_count(&self, duration: f64) -> usize {
        let n = (duration * self.params.samples_per_beat).floor();
        if n.is_finite() && n >= 1.0 { n as usize } else { 1 }
    }

    /// Equal-tempered frequency of a MIDI pitch.
    pub fn pitch_to_hz(&self, pitch: i32) -> f64 {
        let semitones = f64::from(pitch - self.params.reference_pitch);
        self.params.reference_hz * 2f64.powf(semitones / 12.0)
    }

    pub fn pitch_contour(&self, melody: &Melody, rng: &mut SongRng) -> Vec<f64> {
        let mut contour = Vec::new();
        for note in melody.notes() {
            let hz = self.pitch_to_hz(note.pitch);
            for _ in 0..self.sample_count(note.duration) {
                contour.push(hz + rng.next_gaussian(0.0, self.params.pitch_jitter_hz));
            }
        }
        contour
    }

    /// Envelope value for sample `i` of `n`, before velocity scaling.
    pub fn envelope(&self, i: usize, n: usize) -> f64 {
        let (i, n) = (i as f64, n as f64);
        let attack_end = n * self.params.attack_fraction;
        let release_from = n * self.params.release_start;
        if i < attack_end {
            i / attack_end
        } else if i > release_from {
            (n - i) / (n - release_from)
        } else {
            1.0
        }
    }

    pub fn dynamics(&self, melody: &Melody) -> Vec<f64> {
        let mut dynamics = Vec::new();
        for note in melody.notes() {
            let amplitude = f64::from(note.velocity) / 127.0;
            let n = self.sample_count(note.duration);
            dynamics.extend((0..n).map(|i| (amplitude * self.envelope(i, n)).clamp(0.0, 1.0)));
        }
        dynamics
    }

    pub fn effects(&self, voice: &VoiceProfile) -> BTreeMap<String, f64> {
        let mut effects = self.params.effects.clone();
        effects.insert("vibrato_rate".to_string(), self.params.vibrato_rate);
        effects.insert("vibrato_depth".to_string(), voice.vibrato_intensity);
        effects.insert("breath_noise".to_string(), 1.0 - voice.breath_control);
        effects
    }
}

fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    values.iter().fold(None, |range, &v| match range {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::AudioFeatureProfile;
    use crate::melody::{Phrase, SyllableLabel};
    use crate::scale::{KeyChoice, Scale};
    use versewright_lyrics::LyricStructure;

    fn note(word: &str, pitch: i32, duration: f64, velocity: u8, timestamp: f64) -> Note {
        Note {
            pitch,
            duration,
            velocity,
            syllable: SyllableLabel::new(word, None),
            timestamp,
        }
    }

    fn melody(notes: Vec<Note>) -> Melody {
        let phrase = Phrase {
            notes,
            start_time: 0.0,
            emotion_weight: 0.0,
            lyric_line: "test".to_string(),
        };
        let features = AudioFeatureProfile {
            tempo: 120,
            key: "C4".to_string(),
            time_signature: "4/4".to_string(),
            energy: 0.7,
            valence: 0.5,
            danceability: 0.6,
            acousticness: 0.3,
            instrumentalness: 0.1,
        };
        Melody::new(vec![phrase], features, KeyChoice::new(60, Scale::Major), LyricStructure::default())
    }

    #[test]
    fn test_phonemes_split_note_equally() {
        let config = ComposerConfig::default();
        let deriver = VocalDeriver::new(&config);
        let events = deriver.phonemes(&note("love", 64, 1.0, 90, 2.0));
        let symbols: Vec<&str> = events.iter().map(|e| e.phoneme.as_str()).collect();
        assert_eq!(symbols, vec!["l", "o", "v", "e"]);
        assert_eq!(events[0].start_time, 2.0);
        assert_eq!(events[2].start_time, 2.5);
        let total: f64 = events.iter().map(|e| e.duration).sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert!(events.iter().all(|e| e.pitch == 64 && e.velocity == 90));
    }

    #[test]
    fn test_empty_word_yields_one_phoneme() {
        let config = ComposerConfig::default();
        let events = VocalDeriver::new(&config).phonemes(&note("", 60, 0.5, 70, 0.0));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].duration, 0.5);
    }

    #[test]
    fn test_sample_count() {
        let config = ComposerConfig::default();
        let deriver = VocalDeriver::new(&config);
        assert_eq!(deriver.sample_count(1.0), 10);
        assert_eq!(deriver.sample_count(0.75), 7);
        assert_eq!(deriver.sample_count(0.05), 1);
        assert_eq!(deriver.sample_count(0.0), 1);
    }

    #[test]
    fn test_pitch_to_hz() {
        let config = ComposerConfig::default();
        let deriver = VocalDeriver::new(&config);
        assert_eq!(deriver.pitch_to_hz(69), 440.0);
        assert!((deriver.pitch_to_hz(81) - 880.0).abs() < 1e-9);
        assert!((deriver.pitch_to_hz(60) - 261.625_565).abs() < 1e-5);
    }

    #[test]
    fn test_envelope_shape() {
        let config = ComposerConfig::default();
        let deriver = VocalDeriver::new(&config);
        // n = 10: attack below 1.0, release above 8.0.
        assert_eq!(deriver.envelope(0, 10), 0.0);
        assert_eq!(deriver.envelope(1, 10), 1.0);
        assert_eq!(deriver.envelope(5, 10), 1.0);
        assert_eq!(deriver.envelope(8, 10), 1.0);
        assert!((deriver.envelope(9, 10) - 0.5).abs() < 1e-12);
        // n = 20: sample 1 is halfway up the ramp.
        assert!((deriver.envelope(1, 20) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_contour_and_dynamics_lengths() {
        let config = ComposerConfig::default();
        let deriver = VocalDeriver::new(&config);
        let m = melody(vec![note("hi", 69, 1.0, 127, 0.0), note("yo", 72, 0.25, 40, 1.0)]);
        let contour = deriver.pitch_contour(&m, &mut SongRng::new(1));
        let dynamics = deriver.dynamics(&m);
        assert_eq!(contour.len(), 12);
        assert_eq!(dynamics.len(), 12);
        assert!(dynamics.iter().all(|d| (0.0..=1.0).contains(d)));
        // Jitter stays near the note frequency.
        assert!(contour[..10].iter().all(|hz| (hz - 440.0).abs() < 20.0));
    }

    #[test]
    fn test_effects() {
        let config = ComposerConfig::default();
        let voice = VoiceProfile {
            vibrato_intensity: 0.6,
            breath_control: 0.9,
            ..VoiceProfile::default()
        };
        let effects = VocalDeriver::new(&config).effects(&voice);
        assert_eq!(effects["reverb"], 0.3);
        assert_eq!(effects["chorus"], 0.2);
        assert_eq!(effects["vibrato_rate"], 5.0);
        assert_eq!(effects["vibrato_depth"], 0.6);
        assert!((effects["breath_noise"] - 0.1).abs() < 1e-12);
        assert_eq!(effects["compression"], 0.6);
        assert_eq!(effects["eq_low"], 0.0);
        assert_eq!(effects["eq_mid"], 0.1);
        assert_eq!(effects["eq_high"], 0.2);
        assert_eq!(effects.len(), 9);
    }

    #[test]
    fn test_track_descriptor() {
        let config = ComposerConfig::default();
        let deriver = VocalDeriver::new(&config);
        let m = melody(vec![note("la", 67, 0.5, 80, 0.0)]);

        let spec = deriver.derive(&m, None, None, &mut SongRng::new(4));
        assert_eq!(spec.track.synthesis, SynthesisMethod::Parametric);
        assert_eq!(spec.track.voice_model, VoiceCategory::MaleLead);
        assert_eq!(spec.track.sample_rate, 44_100);
        assert_eq!(spec.track.channels, 1);
        assert_eq!(spec.track.format, "wav");
        assert_eq!(spec.track.duration_beats, 0.5);
        assert_eq!(spec.track.processing_chain, ProcessingStage::CHAIN.to_vec());
        assert_eq!(spec.track.stats.phoneme_count, 2);
        assert!(spec.track.stats.pitch_range_hz.is_some());

        let sampled = deriver.derive(&m, None, Some("voices/me.wav"), &mut SongRng::new(4));
        assert_eq!(sampled.track.synthesis, SynthesisMethod::NeuralVocoder);
        assert_eq!(sampled.track.user_voice_sample.as_deref(), Some("voices/me.wav"));
    }

    #[test]
    fn test_empty_melody_has_empty_spec() {
        let config = ComposerConfig::default();
        let spec = VocalDeriver::new(&config).derive(&melody(Vec::new()), None, None, &mut SongRng::new(0));
        assert!(spec.phonemes.is_empty());
        assert!(spec.pitch_contour.is_empty());
        assert!(spec.dynamics.is_empty());
        assert_eq!(spec.track.stats.pitch_range_hz, None);
        assert_eq!(spec.track.stats.dynamic_range, None);
        assert_eq!(spec.effects.len(), 9);
    }
}
