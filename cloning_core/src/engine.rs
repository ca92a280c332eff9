use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::Context;
use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

/// The external speech synthesizer boundary.
///
/// One call renders one chunk of text to an audio file at `output_path`,
/// cloning the voice from the supplied reference recordings. The engine is
/// slow (seconds per call) and is not assumed thread-safe; the orchestrator
/// serializes calls process-wide.
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    async fn synthesize(
        &self,
        text: &str,
        reference_audio: &[PathBuf],
        output_path: &Path,
        language: &str,
    ) -> anyhow::Result<()>;
}

/// Performs the slow, one-time initialization of a [`SpeechEngine`].
#[async_trait]
pub trait EngineLoader: Send + Sync + 'static {
    async fn load(&self) -> anyhow::Result<std::sync::Arc<dyn SpeechEngine>>;
}

/// Drives an external synthesizer command, one invocation per chunk.
///
/// The command receives `--text`, `--language` and `--output` arguments
/// plus one `--speaker-wav` per reference recording, and must write the
/// audio file at the output path before exiting zero.
pub struct ProcessEngine {
    program: PathBuf,
    base_args: Vec<String>,
}

impl ProcessEngine {
    pub fn new(program: impl Into<PathBuf>, base_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            base_args,
        }
    }
}

#[async_trait]
impl SpeechEngine for ProcessEngine {
    async fn synthesize(
        &self,
        text: &str,
        reference_audio: &[PathBuf],
        output_path: &Path,
        language: &str,
    ) -> anyhow::Result<()> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.base_args)
            .arg("--text")
            .arg(text)
            .arg("--language")
            .arg(language)
            .arg("--output")
            .arg(output_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for reference in reference_audio {
            cmd.arg("--speaker-wav").arg(reference);
        }

        debug!(program = %self.program.display(), output = %output_path.display(), "invoking synthesizer");
        let out = cmd
            .output()
            .await
            .with_context(|| format!("failed to run synthesizer {}", self.program.display()))?;

        if !out.status.success() {
            anyhow::bail!(
                "synthesizer exited with {}: {}",
                out.status,
                String::from_utf8_lossy(&out.stderr).trim()
            );
        }
        if !output_path.exists() {
            anyhow::bail!(
                "synthesizer reported success but wrote no file at {}",
                output_path.display()
            );
        }
        Ok(())
    }
}

/// Loads a [`ProcessEngine`] by running the command once with `--preload`,
/// which lets the external tool fetch and warm its model before the first
/// real synthesis call.
pub struct ProcessEngineLoader {
    program: PathBuf,
    base_args: Vec<String>,
}

impl ProcessEngineLoader {
    pub fn new(program: impl Into<PathBuf>, base_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            base_args,
        }
    }
}

#[async_trait]
impl EngineLoader for ProcessEngineLoader {
    async fn load(&self) -> anyhow::Result<std::sync::Arc<dyn SpeechEngine>> {
        let out = Command::new(&self.program)
            .args(&self.base_args)
            .arg("--preload")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .with_context(|| format!("failed to run synthesizer {}", self.program.display()))?;

        if !out.status.success() {
            anyhow::bail!(
                "synthesizer preload exited with {}: {}",
                out.status,
                String::from_utf8_lossy(&out.stderr).trim()
            );
        }

        Ok(std::sync::Arc::new(ProcessEngine::new(
            self.program.clone(),
            self.base_args.clone(),
        )))
    }
}
