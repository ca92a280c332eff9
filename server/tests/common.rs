//! Common utilities for integration tests

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;

use cloning_core::{EngineLoader, SpeechEngine};
use server::{config::ServerConfig, router, AppState};

/// Stand-in engine: writes a placeholder instead of real audio and counts
/// its invocations.
pub struct MockEngine {
    pub calls: AtomicUsize,
}

#[async_trait]
impl SpeechEngine for MockEngine {
    async fn synthesize(
        &self,
        text: &str,
        _reference_audio: &[PathBuf],
        output_path: &Path,
        _language: &str,
    ) -> anyhow::Result<()> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        std::fs::write(output_path, format!("pcm:{text}"))?;
        Ok(())
    }
}

pub struct MockLoader {
    engine: Arc<MockEngine>,
}

#[async_trait]
impl EngineLoader for MockLoader {
    async fn load(&self) -> anyhow::Result<Arc<dyn SpeechEngine>> {
        Ok(self.engine.clone())
    }
}

/// Create a test app instance backed by the mock engine.
pub fn create_test_app() -> Router {
    create_test_app_with_engine().0
}

pub fn create_test_app_with_engine() -> (Router, Arc<MockEngine>) {
    let engine = Arc::new(MockEngine {
        calls: AtomicUsize::new(0),
    });
    let state = AppState::new(
        Arc::new(MockLoader {
            engine: engine.clone(),
        }),
        ServerConfig::default(),
    );
    (router(state), engine)
}

pub const BOUNDARY: &str = "integration-test-boundary";

/// Build a multipart/form-data body for `/process-voice` by hand.
pub fn multipart_body(
    text_content: Option<&str>,
    voice_mode: Option<&str>,
    speaker_file_count: usize,
) -> Vec<u8> {
    let mut body = Vec::new();
    let mut text_field = |name: &str, value: &str| {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    };
    if let Some(text) = text_content {
        text_field("text_content", text);
    }
    if let Some(mode) = voice_mode {
        text_field("voice_mode", mode);
    }
    for i in 0..speaker_file_count {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"speaker_files\"; filename=\"voice_{}.wav\"\r\n",
                i + 1
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: audio/wav\r\n\r\n");
        body.extend_from_slice(b"RIFFfake-reference-audio");
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}
