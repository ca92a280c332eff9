use thiserror::Error;

/// Terminal failure kinds for a synthesis job.
///
/// None of these are retried inside the core; retry is a caller decision.
/// A job that fails never delivers a partial archive.
#[derive(Debug, Error)]
pub enum JobError {
    /// Caller-side problem: missing reference audio, blank text, or text
    /// that segments to nothing. Raised before any model load or synthesis.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Model initialization failed. Surfaced to the triggering caller and
    /// to every waiter; a later call may retry the load.
    #[error("Model load failed: {0}")]
    Load(String),

    /// A specific chunk failed to synthesize. Remaining chunks are skipped
    /// and partial output is discarded.
    #[error("Synthesis failed for paragraph {paragraph_id} part {part_index}: {message}")]
    Synthesis {
        paragraph_id: u32,
        part_index: u32,
        message: String,
    },

    /// Archive construction failed after all chunks succeeded. Synthesized
    /// files are discarded rather than returned loose.
    #[error("Packaging failed: {0}")]
    Packaging(String),
}

impl JobError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        JobError::InvalidInput(msg.into())
    }
}
