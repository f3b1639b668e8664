// Versewright composition engine: lyrics in, melody and vocal parameters out.
//
// Given lyric text plus optional genre, mood, tempo, and voice settings, the
// engine produces a symbolic song description: pitched, timed notes grouped
// into one phrase per lyric line, descriptive audio-feature tags, and a
// time-aligned set of vocal rendering parameters (phoneme timing, pitch
// contour, dynamics envelope, effect settings). Nothing here produces sound;
// the output is meant for a downstream synthesizer.
//
// Pipeline (all driven by `song::Composer::compose()`):
// 1. `versewright_lyrics` analyzes the text into lines, words, syllables,
//    stress, and emotion weights.
// 2. `scale.rs` picks a key (root + scale) from the emotion and mood.
// 3. `features.rs` builds the feature profile from genre and mood tables.
// 4. `contour.rs` walks each line syllable by syllable, emitting in-key
//    notes (lines in parallel via rayon).
// 5. `vocal.rs` derives phonemes, pitch contour, dynamics, and effects.
// 6. `song.rs` validates the request, sequences the stages, and packages
//    the `Song`.
//
// Supporting modules:
// - `config.rs`: `ComposerConfig`, every table and tunable constant
// - `melody.rs`: `Note`, `Phrase`, `Melody`
// - `voice.rs`: `VoiceCategory`, `VoiceProfile`
// - `error.rs`: `ComposeError`, `GenerationError`
//
// **Determinism.** All randomness comes from a `versewright_prng::SongRng`
// seeded once per call. The same request with the same seed yields an
// identical melody and vocal spec, regardless of rayon's thread count.

pub mod config;
pub mod contour;
pub mod error;
pub mod features;
pub mod melody;
pub mod scale;
pub mod song;
pub mod vocal;
pub mod voice;

pub use config::ComposerConfig;
pub use error::{ComposeError, GenerationError};
pub use features::{AudioFeatureProfile, FeatureOverride};
pub use melody::{Melody, Note, Phrase, SyllableLabel};
pub use scale::{KeyChoice, Scale, ScaleChoice};
pub use song::{Composer, SectionSpan, Song, SongRequest};
pub use vocal::{PhonemeEvent, ProcessingStage, SynthesisMethod, VocalRenderSpec, VocalTrack};
pub use voice::{VoiceCategory, VoiceProfile};
