// Song assembly: request validation, stage sequencing, and packaging.
//
// `Composer` borrows a `ComposerConfig` and turns a `SongRequest` into a
// `Song` in one synchronous call:
//
//   validate request -> analyze lyrics -> resolve tempo -> select key
//     -> synthesize features -> generate contour -> derive vocals
//
// All randomness flows from one `SongRng` seeded per call. The seed comes
// from the request when given, otherwise from the wall clock; either way it
// is recorded in `Song::metadata["seed"]`, so replaying a request with that
// seed reproduces the melody and vocal parameters exactly. The song id and
// creation timestamp are the only outputs outside that guarantee.
//
// Validation runs before any stage. Every failure surfaces as a single
// `GenerationError` wrapping the cause; no partial song is returned.
//
// See also: `config.rs` for the tables, `error.rs` for the error types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use versewright_lyrics::LyricAnalyzer;
use versewright_prng::SongRng;

use crate::config::{ComposerConfig, GenreProfile, normalize_label};
use crate::contour::ContourGenerator;
use crate::error::{ComposeError, GenerationError};
use crate::features::FeatureSynthesizer;
use crate::melody::Melody;
use crate::scale::KeySelector;
use crate::vocal::{VocalDeriver, VocalRenderSpec};
use crate::voice::{VoiceCategory, VoiceProfile, is_no_vocals};

pub const DEFAULT_TITLE: &str = "Untitled Song";

/// Caller input for one generation call. Only `lyrics` is required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SongRequest {
    /// Used verbatim as the song id; generated when absent.
    pub id: Option<String>,
    pub title: Option<String>,
    pub lyrics: String,
    pub genre: Option<String>,
    pub mood: Option<String>,
    /// Beats per minute; sampled from the genre's range when absent.
    pub tempo: Option<u32>,
    /// Full voice profile; takes precedence over `voice_category`.
    pub voice: Option<VoiceProfile>,
    /// Category label for the default voice profile. "no_vocals" marks the
    /// song as instrumental-leaning instead.
    pub voice_category: Option<String>,
    /// Raise instrumentalness in the feature profile. Vocals are still
    /// derived.
    pub instrumental: bool,
    /// Ordered section names; the genre's layout when absent.
    pub sections: Option<Vec<String>>,
    pub seed: Option<u64>,
    /// Reference to a recording of the user's voice.
    pub user_voice_sample: Option<String>,
    /// Extra entries merged into `Song::metadata`.
    pub metadata: BTreeMap<String, Value>,
}

impl SongRequest {
    pub fn new(lyrics: &str) -> Self {
        SongRequest {
            lyrics: lyrics.to_string(),
            ..SongRequest::default()
        }
    }
}

/// One section of the song's timed layout, in beats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionSpan {
    pub section: String,
    pub start_time: f64,
    pub duration: f64,
    pub end_time: f64,
}

/// The generated song.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub id: String,
    pub title: String,
    pub lyrics: String,
    /// Normalized genre label as requested (it may be unknown to the config).
    pub genre: String,
    pub mood: Option<String>,
    pub tempo: u32,
    pub melody: Melody,
    pub vocals: VocalRenderSpec,
    pub created_at: DateTime<Utc>,
    pub metadata: BTreeMap<String, Value>,
}

/// Runs the full pipeline against a borrowed config.
#[derive(Debug, Clone, Copy)]
pub struct Composer<'a> {
    config: &'a ComposerConfig,
}

impl<'a> Composer<'a> {
    pub fn new(config: &'a ComposerConfig) -> Self {
        Composer { config }
    }

    pub fn compose(&self, request: &SongRequest) -> Result<Song, GenerationError> {
        self.try_compose(request).map_err(|source| {
            error!(error = %source, "song generation failed");
            GenerationError::from(source)
        })
    }

    fn try_compose(&self, request: &SongRequest) -> Result<Song, ComposeError> {
        let created_at = Utc::now();
        let seed = request.seed.unwrap_or_else(|| clock_seed(created_at));
        let title = request
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TITLE)
            .to_string();
        let genre = request
            .genre
            .as_deref()
            .map(normalize_label)
            .filter(|g| !g.is_empty())
            .unwrap_or_else(|| self.config.default_genre.clone());
        let mood = request
            .mood
            .as_deref()
            .map(normalize_label)
            .filter(|m| !m.is_empty());

        info!(%title, %genre, ?mood, seed, "starting song generation");

        let (genre_profile, fallback) = self.config.genre_or_default(&genre);
        if fallback {
            warn!(%genre, fallback = %self.config.default_genre, "unknown genre, using default genre tables");
        }
        let sections = resolve_sections(request.sections.as_deref(), &genre_profile)?;
        let voice = self.resolve_voice(request, &genre_profile)?;
        let instrumental = request.instrumental || request.voice_category.as_deref().is_some_and(is_no_vocals);

        let mut rng = SongRng::new(seed);
        let tempo = self.resolve_tempo(request.tempo, &genre_profile, mood.as_deref(), &mut rng)?;

        let structure = LyricAnalyzer::new(&self.config.lexicon).analyze(&request.lyrics);
        debug!(
            lines = structure.line_count(),
            syllables = structure.total_syllables,
            average_emotion = structure.average_emotion(),
            "lyrics analyzed"
        );

        let key = KeySelector::new(self.config).select(&structure, mood.as_deref(), &mut rng);
        debug!(root = key.root, scale = key.scale.scale.name(), tempo, "key selected");

        let features = FeatureSynthesizer::new(self.config).synthesize(
            &genre,
            mood.as_deref(),
            instrumental,
            tempo,
            &key,
        );
        debug!(?features, "features synthesized");

        let phrases = ContourGenerator::new(self.config).generate(&structure, &key, tempo, &mut rng);
        let summary = structure.summary();
        let melody = Melody::new(phrases, features, key, structure);
        debug!(
            phrases = melody.phrases().len(),
            notes = melody.note_count(),
            "melody generated"
        );

        let mut vocal_rng = rng.fork();
        let vocals = VocalDeriver::new(self.config).derive(
            &melody,
            Some(&voice),
            request.user_voice_sample.as_deref(),
            &mut vocal_rng,
        );
        debug!(
            phonemes = vocals.phonemes.len(),
            samples = vocals.pitch_contour.len(),
            "vocal parameters derived"
        );

        let mut metadata = request.metadata.clone();
        metadata.insert("seed".to_string(), Value::from(seed));
        metadata.insert("sections".to_string(), serde_json::to_value(&sections)?);
        metadata.insert(
            "song_structure".to_string(),
            serde_json::to_value(section_plan(&sections, melody.total_duration()))?,
        );
        metadata.insert("instrumental".to_string(), Value::from(instrumental));
        metadata.insert("key".to_string(), Value::from(melody.key().root_name()));
        metadata.insert("scale".to_string(), Value::from(melody.key().scale.scale.name()));
        metadata.insert("lyric_summary".to_string(), serde_json::to_value(summary)?);
        metadata.insert(
            "audio_path".to_string(),
            Value::from(format!("/generated/{}.wav", slugify(&title))),
        );
        metadata.insert("voice_category".to_string(), Value::from(voice.category.label()));

        let id = request
            .id
            .clone()
            .unwrap_or_else(|| format!("song_{}", Uuid::new_v4().simple()));

        info!(
            %id,
            notes = melody.note_count(),
            duration = melody.total_duration(),
            "song generated"
        );

        Ok(Song {
            id,
            title,
            lyrics: request.lyrics.clone(),
            genre,
            mood,
            tempo,
            melody,
            vocals,
            created_at,
            metadata,
        })
    }

    /// The requested tempo, or one sampled from the genre range and scaled
    /// by the mood's multiplier.
    fn resolve_tempo(
        &self,
        requested: Option<u32>,
        genre: &GenreProfile,
        mood: Option<&str>,
        rng: &mut SongRng,
    ) -> Result<u32, ComposeError> {
        match requested {
            Some(0) => Err(ComposeError::InvalidTempo(0)),
            Some(tempo) => Ok(tempo),
            None => {
                let (lo, hi) = genre.tempo_range;
                let sampled = if lo < hi { rng.range_u32(lo, hi) } else { lo };
                let multiplier = mood
                    .and_then(|m| self.config.mood(m))
                    .map_or(1.0, |p| p.tempo_multiplier);
                let scaled = (f64::from(sampled) * multiplier).round();
                // Float-to-int casts saturate; NaN becomes 0 and is floored below.
                Ok((scaled as u32).max(1))
            }
        }
    }

    fn resolve_voice(&self, request: &SongRequest, genre: &GenreProfile) -> Result<VoiceProfile, ComposeError> {
        match &request.voice {
            Some(voice) => voice.clone().normalized(),
            None => {
                let mut voice = self.config.default_voice.clone();
                if let Some(label) = &request.voice_category {
                    voice.category = VoiceCategory::from_label(label);
                }
                voice.articulation_style = genre.vocal_style.clone();
                voice.normalized()
            }
        }
    }
}

fn resolve_sections(requested: Option<&[String]>, genre: &GenreProfile) -> Result<Vec<String>, ComposeError> {
    let Some(sections) = requested else {
        return Ok(genre.sections.clone());
    };
    if let Some(pos) = sections.iter().position(|s| s.trim().is_empty()) {
        return Err(ComposeError::InvalidSections(format!("section {pos} has a blank name")));
    }
    Ok(sections.to_vec())
}

/// Lay the sections back to back over `total_beats`, each with an equal share.
pub fn section_plan(sections: &[String], total_beats: f64) -> Vec<SectionSpan> {
    if sections.is_empty() {
        return Vec::new();
    }
    let duration = total_beats / sections.len() as f64;
    sections
        .iter()
        .enumerate()
        .map(|(i, section)| {
            let start_time = duration * i as f64;
            SectionSpan {
                section: section.clone(),
                start_time,
                duration,
                end_time: start_time + duration,
            }
        })
        .collect()
}

fn clock_seed(now: DateTime<Utc>) -> u64 {
    now.timestamp_nanos_opt()
        .map_or_else(|| now.timestamp() as u64, |nanos| nanos as u64)
}

/// Lowercase ASCII slug for file names: runs of anything else become "_".
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('_') {
            slug.push('_');
        }
    }
    let slug = slug.trim_matches('_');
    if slug.is_empty() { "song".to_string() } else { slug.to_string() }
}
