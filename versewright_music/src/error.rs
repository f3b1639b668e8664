// Error taxonomy for song generation.
//
// Most unusual input is not an error: unknown genres, moods and voice
// labels, empty lyrics, and a missing tempo all resolve to documented
// defaults inside the stages. What remains are structurally invalid caller
// inputs (`ComposeError`), detected while the request is validated.
//
// `Composer::compose` (see `song.rs`) surfaces exactly one error type,
// `GenerationError`, which wraps the original cause. Stages never return a
// partial song.

use thiserror::Error;

/// A structurally invalid request or a failed metadata conversion.
#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("invalid voice profile: {0}")]
    InvalidVoiceProfile(String),

    #[error("invalid tempo: {0} BPM (must be positive)")]
    InvalidTempo(u32),

    #[error("invalid section structure: {0}")]
    InvalidSections(String),

    #[error("failed to encode song metadata: {0}")]
    Metadata(#[from] serde_json::Error),
}

/// The single failure surfaced by a generation call.
#[derive(Debug, Error)]
#[error("failed to generate song: {source}")]
pub struct GenerationError {
    pub source: ComposeError,
}

impl From<ComposeError> for GenerationError {
    fn from(source: ComposeError) -> Self {
        GenerationError { source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_generation_error_wraps_cause() {
        let err = GenerationError::from(ComposeError::InvalidTempo(0));
        assert_eq!(
            err.to_string(),
            "failed to generate song: invalid tempo: 0 BPM (must be positive)"
        );
        let source = err.source().expect("cause should be exposed");
        assert_eq!(source.to_string(), "invalid tempo: 0 BPM (must be positive)");
    }

    #[test]
    fn test_metadata_error_converts() {
        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: ComposeError = json_err.into();
        assert!(matches!(err, ComposeError::Metadata(_)));
    }
}
