// Built-in lexicon tables: sentiment weights and stress overrides.
//
// These constants seed `Lexicon::default()` in `lib.rs`. A caller that
// loads a lexicon from JSON replaces them wholesale; fields the JSON omits
// fall back to these tables through `#[serde(default)]`.
//
// Weights are signed sentiment scores, roughly in [-1, 1]. Stress patterns
// list one flag per syllable (`true` = stressed) and, when present, define
// the word's syllable count outright.

/// Positive, negative, and neutral/contextual sentiment weights.
pub const EMOTION_WEIGHTS: &[(&str, f64)] = &[
    // Positive
    ("love", 0.9),
    ("joy", 0.8),
    ("happy", 0.7),
    ("beautiful", 0.6),
    ("amazing", 0.7),
    ("wonderful", 0.8),
    ("perfect", 0.6),
    ("dream", 0.5),
    ("sunshine", 0.7),
    ("freedom", 0.6),
    ("hope", 0.5),
    ("smile", 0.6),
    // Negative
    ("sad", -0.7),
    ("pain", -0.8),
    ("hurt", -0.6),
    ("broken", -0.7),
    ("lonely", -0.6),
    ("dark", -0.5),
    ("tears", -0.6),
    ("goodbye", -0.5),
    ("lost", -0.6),
    ("empty", -0.7),
    ("cold", -0.4),
    ("fear", -0.6),
    // Neutral / contextual
    ("time", 0.0),
    ("day", 0.1),
    ("night", -0.2),
    ("way", 0.0),
    ("life", 0.2),
    ("world", 0.1),
    ("heart", 0.3),
    ("soul", 0.2),
];

const S: bool = true;
const U: bool = false;

/// Known words whose stress does not follow the syllable-count rule.
pub const STRESS_OVERRIDES: &[(&str, &[bool])] = &[
    ("beautiful", &[S, U, U]),
    ("amazing", &[U, S, U]),
    ("wonderful", &[S, U, U]),
    ("together", &[U, S, U]),
    ("forever", &[U, S, U]),
    ("remember", &[U, S, U]),
    ("believe", &[U, S]),
    ("freedom", &[S, U]),
    ("sunshine", &[S, U]),
];
