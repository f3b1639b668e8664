// Test-only helpers for end-to-end pipeline tests.
//
// Wraps a real `ComposerConfig` and `Composer` (from `versewright_music`)
// behind a small API for running requests and checking the structural
// invariants every generated `Song` must satisfy: one phrase per non-blank
// lyric line, contiguous note timing, in-key pitches, bounded velocities,
// a section layout that tiles the melody, phoneme coverage of every note,
// and sample counts that match durations.
//
// The checks use the same code paths as production callers; nothing here
// reaches into private state.
//
// See also: `tests/full_pipeline.rs` for the scenarios.

use versewright_lyrics::{Lexicon, LyricAnalyzer};
use versewright_music::vocal::VocalDeriver;
use versewright_music::{Composer, ComposerConfig, GenerationError, SectionSpan, Song, SongRequest};

/// Absolute tolerance for floating-point timing comparisons.
pub const TIME_EPSILON: f64 = 1e-9;

/// A composer that owns its config.
pub struct TestComposer {
    pub config: ComposerConfig,
}

impl Default for TestComposer {
    fn default() -> Self {
        TestComposer::new(ComposerConfig::default())
    }
}

impl TestComposer {
    pub fn new(config: ComposerConfig) -> Self {
        TestComposer { config }
    }

    pub fn try_compose(&self, request: &SongRequest) -> Result<Song, GenerationError> {
        Composer::new(&self.config).compose(request)
    }

    /// Compose and check every invariant, panicking with context on failure.
    pub fn compose(&self, request: &SongRequest) -> Song {
        let song = self
            .try_compose(request)
            .unwrap_or_else(|e| panic!("composition failed for {:?}: {e}", request.lyrics));
        assert_song_invariants(&self.config, &song);
        song
    }

    /// A seeded request with the given lyrics.
    pub fn request(lyrics: &str, seed: u64) -> SongRequest {
        SongRequest {
            seed: Some(seed),
            ..SongRequest::new(lyrics)
        }
    }
}

/// Number of non-blank lines the analyzer will keep.
pub fn non_blank_lines(lyrics: &str) -> usize {
    lyrics.lines().filter(|l| !l.trim().is_empty()).count()
}

/// Check every structural invariant of a generated song.
pub fn assert_song_invariants(config: &ComposerConfig, song: &Song) {
    let melody = &song.melody;
    let key = melody.key();

    assert_eq!(
        melody.phrases().len(),
        non_blank_lines(&song.lyrics),
        "phrase count must equal non-blank line count"
    );
    assert!(song.tempo > 0, "tempo must be positive");
    assert_eq!(melody.features().tempo, song.tempo);
    assert!(key.scale.offsets.contains(&0), "scale must contain the root");

    let mut expected_start = 0.0;
    let mut total = 0.0;
    let mut notes = 0;
    for (i, phrase) in melody.phrases().iter().enumerate() {
        assert!(
            (phrase.start_time - expected_start).abs() < TIME_EPSILON,
            "phrase {i} starts at {} but previous phrases end at {expected_start}",
            phrase.start_time
        );
        let mut t = phrase.start_time;
        for note in &phrase.notes {
            assert!(note.duration > 0.0, "{} has non-positive duration", note.syllable);
            assert!(
                (40..=127).contains(&note.velocity),
                "{} has velocity {}",
                note.syllable,
                note.velocity
            );
            assert!(
                key.contains(note.pitch),
                "{} pitch {} outside key root {} {:?}",
                note.syllable,
                note.pitch,
                key.root,
                key.scale.scale
            );
            assert!(
                (note.timestamp - t).abs() < TIME_EPSILON,
                "{} starts at {} instead of {t}",
                note.syllable,
                note.timestamp
            );
            t += note.duration;
        }
        let span: f64 = phrase.notes.iter().map(|n| n.duration).sum();
        assert!((span - phrase.span()).abs() < TIME_EPSILON);
        expected_start = phrase.start_time + span;
        total += span;
        notes += phrase.notes.len();
    }
    assert_eq!(melody.note_count(), notes, "note count aggregate drifted");
    assert!(
        (melody.total_duration() - total).abs() < TIME_EPSILON,
        "total duration aggregate drifted"
    );

    assert_section_plan(song);
    assert_vocal_invariants(config, song);
}

/// Check that the timed section layout tiles the melody without gaps.
pub fn assert_section_plan(song: &Song) {
    let plan: Vec<SectionSpan> =
        serde_json::from_value(song.metadata["song_structure"].clone()).expect("song_structure is a section list");
    let names = song.metadata["sections"].as_array().map_or(0, Vec::len);
    assert_eq!(plan.len(), names, "one timed span per section name");
    let mut t = 0.0;
    for span in &plan {
        assert!((span.start_time - t).abs() < TIME_EPSILON, "{} starts at {}", span.section, span.start_time);
        assert!((span.end_time - span.start_time - span.duration).abs() < TIME_EPSILON);
        t = span.end_time;
    }
    if !plan.is_empty() {
        assert!((t - song.melody.total_duration()).abs() < TIME_EPSILON, "sections end at {t}");
    }
}

/// Check that the vocal spec covers the melody note by note.
pub fn assert_vocal_invariants(config: &ComposerConfig, song: &Song) {
    let vocals = &song.vocals;
    let deriver = VocalDeriver::new(config);

    let mut phonemes = vocals.phonemes.iter();
    for note in song.melody.notes() {
        let expected = note.syllable.word.chars().count().max(1);
        let events: Vec<_> = phonemes.by_ref().take(expected).collect();
        assert_eq!(events.len(), expected, "{} is missing phonemes", note.syllable);
        let covered: f64 = events.iter().map(|e| e.duration).sum();
        assert!(
            (covered - note.duration).abs() < TIME_EPSILON,
            "{} phonemes cover {covered} of {}",
            note.syllable,
            note.duration
        );
        assert!((events[0].start_time - note.timestamp).abs() < TIME_EPSILON);
        assert!(events.iter().all(|e| e.pitch == note.pitch && e.velocity == note.velocity));
    }
    assert!(phonemes.next().is_none(), "phonemes beyond the last note");

    let samples: usize = song.melody.notes().map(|n| deriver.sample_count(n.duration)).sum();
    assert_eq!(vocals.pitch_contour.len(), samples, "pitch contour sample count");
    assert_eq!(vocals.dynamics.len(), samples, "dynamics sample count");
    assert!(
        vocals.dynamics.iter().all(|d| (0.0..=1.0).contains(d)),
        "dynamics outside [0, 1]"
    );
    assert_eq!(vocals.track.stats.phoneme_count, vocals.phonemes.len());
    assert!((vocals.track.duration_beats - song.melody.total_duration()).abs() < TIME_EPSILON);
}

/// Analyze lyrics with the default lexicon.
pub fn analyze(lyrics: &str) -> versewright_lyrics::LyricStructure {
    LyricAnalyzer::new(&Lexicon::default()).analyze(lyrics)
}

/// Serialize a song to JSON and back.
pub fn json_roundtrip(song: &Song) -> Song {
    let json = serde_json::to_string(song).expect("serialize Song failed");
    serde_json::from_str(&json).expect("deserialize Song failed")
}
