// Melodic contour generation: one phrase per lyric line, one note per
// syllable.
//
// Each line walks a pitch cursor that starts `start_offset` semitones above
// the key's root. Every syllable moves the cursor by a step that depends on
// stress (up for stressed, down for unstressed), the word's emotion weight
// (truncated toward zero), and a small random jitter of -1, 0 or +1
// semitones. The emitted pitch is the cursor quantized into the key; the
// cursor itself keeps its raw value, so successive quantizations never
// accumulate rounding.
//
// Durations are in beats: stressed syllables lengthen with the line's
// emotion, unstressed ones are fixed, and both scale by
// `reference_tempo / tempo`. Velocity is stress-based plus a bonus for
// emotionally loaded words, clamped to the configured range.
//
// Lines are independent, so they are generated in parallel with rayon. One
// seed is drawn from the caller's generator and each line gets its own
// `SongRng::substream(seed, line_index)`; the result is identical for any
// thread count. Notes are built with phrase-local timestamps and shifted by
// a prefix sum of phrase spans once all lines are done.

use rayon::prelude::*;
use versewright_lyrics::{LineAnalysis, LyricStructure};
use versewright_prng::SongRng;

use crate::config::{ComposerConfig, ContourParams};
use crate::melody::{Note, Phrase, SyllableLabel};
use crate::scale::KeyChoice;

#[derive(Debug, Clone, Copy)]
pub struct ContourGenerator<'a> {
    params: &'a ContourParams,
}

impl<'a> ContourGenerator<'a> {
    pub fn new(config: &'a ComposerConfig) -> Self {
        ContourGenerator {
            params: &config.contour,
        }
    }

    /// Generate one phrase per line with absolute start times. Draws exactly
    /// one value from `rng`.
    pub fn generate(&self, structure: &LyricStructure, key: &KeyChoice, tempo: u32, rng: &mut SongRng) -> Vec<Phrase> {
        let line_seed = rng.next_u64();

        let drafts: Vec<Vec<Note>> = structure
            .lines
            .par_iter()
            .enumerate()
            .map(|(index, line)| {
                let mut line_rng = SongRng::substream(line_seed, index as u64);
                self.line_notes(line, key, tempo, &mut line_rng)
            })
            .collect();

        let mut start_time = 0.0;
        structure
            .lines
            .iter()
            .zip(drafts)
            .map(|(line, notes)| {
                let offset = start_time;
                let notes: Vec<Note> = notes
                    .into_iter()
                    .map(|n| Note {
                        timestamp: offset + n.timestamp,
                        ..n
                    })
                    .collect();
                let phrase = Phrase {
                    notes,
                    start_time: offset,
                    emotion_weight: line.emotion_weight,
                    lyric_line: line.text.clone(),
                };
                start_time += phrase.span();
                phrase
            })
            .collect()
    }

    /// Notes for one line, timestamped from 0.
    pub fn line_notes(&self, line: &LineAnalysis, key: &KeyChoice, tempo: u32, rng: &mut SongRng) -> Vec<Note> {
        let p = self.params;
        let beat_scale = p.reference_tempo / f64::from(tempo.max(1));
        let min_duration = p.min_duration.max(f64::EPSILON);
        let (min_velocity, max_velocity) = (
            i32::from(p.min_velocity.min(p.max_velocity)),
            i32::from(p.min_velocity.max(p.max_velocity)),
        );

        let mut cursor = key.root.saturating_add(p.start_offset);
        let mut local_time = 0.0;
        let mut notes = Vec::with_capacity(line.syllable_count());

        for word in &line.words {
            let w = word.emotion_weight;
            for (i, &stressed) in word.stress.iter().enumerate() {
                let (step, emotion_step, beats, base_velocity) = if stressed {
                    (
                        p.stressed_step,
                        p.stressed_emotion_step,
                        p.stressed_beats + p.stressed_emotion_beats * line.emotion_weight,
                        p.stressed_velocity,
                    )
                } else {
                    (
                        p.unstressed_step,
                        p.unstressed_emotion_step,
                        p.unstressed_beats,
                        p.unstressed_velocity,
                    )
                };

                cursor = cursor
                    .saturating_add(step)
                    .saturating_add((w * emotion_step).trunc() as i32)
                    .saturating_add(self.jitter(rng));

                // The floor only catches lengths driven to zero or below.
                let scaled = beats * beat_scale;
                let duration = if scaled > 0.0 { scaled } else { min_duration };
                let velocity = base_velocity
                    .saturating_add((w.abs() * p.emotion_velocity).trunc() as i32)
                    .clamp(min_velocity, max_velocity);
                let index = if word.is_monosyllabic() { None } else { Some(i) };

                notes.push(Note {
                    pitch: key.quantize(cursor),
                    duration,
                    // Clamped into a u8 range above.
                    velocity: velocity as u8,
                    syllable: SyllableLabel::new(&word.text, index),
                    timestamp: local_time,
                });
                local_time += duration;
            }
        }
        notes
    }

    fn jitter(&self, rng: &mut SongRng) -> i32 {
        match rng.weighted_index(&self.params.jitter_weights) {
            Some(i) => i as i32 - 1,
            None => 0,
        }
    }
}
