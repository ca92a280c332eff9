//! Core pipeline for batch voice-cloning synthesis.
//!
//! The pipeline turns raw text plus reference voice recordings into a zip
//! archive of per-paragraph audio files. It is split into:
//!
//! - [`segment`] — deterministic text partitioning into paragraph chunks
//! - [`model`] — single-flight lifecycle coordination of the shared engine
//! - [`orchestrator`] — per-job synthesis driving, progress and packaging
//! - [`engine`] — the external synthesizer boundary
//! - [`archive`] — zip packaging of finished jobs
//!
//! The speech engine itself is a black box behind [`engine::SpeechEngine`];
//! nothing in this crate performs audio DSP.

pub mod archive;
pub mod engine;
pub mod error;
pub mod model;
pub mod orchestrator;
pub mod segment;

pub use engine::{EngineLoader, ProcessEngine, ProcessEngineLoader, SpeechEngine};
pub use error::JobError;
pub use model::{LoadStatus, ModelCoordinator, ModelHandle, ModelState};
pub use orchestrator::{JobRequest, Orchestrator, OutputUnit, PackagedResult};
pub use segment::{segment, TextChunk, DEFAULT_MAX_CHUNK_LEN};
