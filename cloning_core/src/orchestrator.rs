use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tempfile::TempDir;
use tracing::{debug, info};

use crate::archive::{self, ARCHIVE_FILE_NAME};
use crate::error::JobError;
use crate::model::ModelCoordinator;
use crate::segment::{segment, TextChunk, DEFAULT_MAX_CHUNK_LEN};

/// One synthesis job's input.
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub text: String,
    /// Ordered reference recordings; every one is passed to the engine for
    /// every chunk. Must be non-empty.
    pub reference_audio: Vec<PathBuf>,
    pub language: String,
}

/// One rendered audio file and the chunk it came from.
#[derive(Debug, Clone, Serialize)]
pub struct OutputUnit {
    pub file_name: String,
    pub file_path: PathBuf,
    pub chunk: TextChunk,
}

/// A completed job: the packaged archive plus the ordered output list,
/// which callers use to render previews without re-opening the archive.
///
/// Dropping the result deletes the job's working directory, archive
/// included, so hold it for as long as the files are needed.
#[derive(Debug)]
pub struct PackagedResult {
    pub archive_path: PathBuf,
    pub outputs: Vec<OutputUnit>,
    _work_dir: TempDir,
}

/// Drives segmented text through the shared engine one chunk at a time.
///
/// Processing is strictly sequential per job, and the process-wide
/// synthesis permit is held for the whole job: the external engine is a
/// single shared resource that is not assumed thread-safe.
pub struct Orchestrator {
    coordinator: Arc<ModelCoordinator>,
    max_chunk_len: usize,
}

impl Orchestrator {
    pub fn new(coordinator: Arc<ModelCoordinator>) -> Self {
        Self {
            coordinator,
            max_chunk_len: DEFAULT_MAX_CHUNK_LEN,
        }
    }

    pub fn with_max_chunk_len(mut self, max_chunk_len: usize) -> Self {
        self.max_chunk_len = max_chunk_len;
        self
    }

    /// Run one job to completion, reporting progress in [0, 1] after each
    /// finished chunk.
    ///
    /// Fails fast with [`JobError::InvalidInput`] before any model load or
    /// synthesis when the reference list is empty, the text is blank, or
    /// segmentation yields nothing. On any later failure the remaining
    /// chunks are skipped and partial output is discarded.
    pub async fn run<F>(
        &self,
        request: JobRequest,
        mut on_progress: F,
    ) -> Result<PackagedResult, JobError>
    where
        F: FnMut(f32) + Send,
    {
        if request.reference_audio.is_empty() {
            return Err(JobError::invalid_input("no reference audio supplied"));
        }
        if request.text.trim().is_empty() {
            return Err(JobError::invalid_input("no text content provided"));
        }
        let chunks = segment(&request.text, self.max_chunk_len);
        if chunks.is_empty() {
            return Err(JobError::invalid_input(
                "text contains nothing to synthesize",
            ));
        }

        let handle = self.coordinator.ensure_ready().await?;

        let total_chunks = chunks.len();
        let work_dir = TempDir::new()
            .map_err(|e| JobError::Packaging(format!("failed to create working directory: {e}")))?;

        info!(
            total_chunks,
            references = request.reference_audio.len(),
            language = %request.language,
            "starting synthesis job"
        );

        // Held for the whole job: concurrent jobs queue, never interleave.
        let _permit = handle.acquire().await;

        let mut outputs: Vec<OutputUnit> = Vec::with_capacity(total_chunks);
        for (processed, chunk) in chunks.into_iter().enumerate() {
            let file_name = chunk.output_file_name();
            let file_path = work_dir.path().join(&file_name);

            handle
                .engine()
                .synthesize(
                    &chunk.text,
                    &request.reference_audio,
                    &file_path,
                    &request.language,
                )
                .await
                .map_err(|e| JobError::Synthesis {
                    paragraph_id: chunk.paragraph_id,
                    part_index: chunk.part_index,
                    message: format!("{e:#}"),
                })?;

            debug!(file = %file_name, "chunk synthesized");
            outputs.push(OutputUnit {
                file_name,
                file_path,
                chunk,
            });
            on_progress((processed + 1) as f32 / total_chunks as f32);
        }

        let archive_path = work_dir.path().join(ARCHIVE_FILE_NAME);
        archive::write_archive(&outputs, &archive_path)?;

        info!(files = outputs.len(), "synthesis job packaged");
        Ok(PackagedResult {
            archive_path,
            outputs,
            _work_dir: work_dir,
        })
    }
}
