use std::sync::{Arc, Mutex};

use tokio::sync::{watch, Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{error, info};

use crate::engine::{EngineLoader, SpeechEngine};
use crate::error::JobError;

/// Lifecycle states of the process-wide speech model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelState {
    Unloaded,
    Loading,
    Ready,
    Failed,
}

/// Non-blocking snapshot of the model lifecycle.
#[derive(Debug, Clone, Copy)]
pub struct LoadStatus {
    pub state: ModelState,
    pub is_ready: bool,
}

enum Slot {
    Unloaded,
    Loading,
    Ready(Arc<dyn SpeechEngine>),
    Failed(String),
}

/// Shared handle to the loaded engine.
///
/// Synthesis calls are serialized process-wide: [`ModelHandle::acquire`]
/// returns a permit that a job holds for its whole duration, so concurrent
/// jobs queue behind each other rather than interleaving chunks.
#[derive(Clone)]
pub struct ModelHandle {
    engine: Arc<dyn SpeechEngine>,
    synth_lock: Arc<AsyncMutex<()>>,
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle").finish_non_exhaustive()
    }
}

impl ModelHandle {
    pub fn engine(&self) -> &dyn SpeechEngine {
        self.engine.as_ref()
    }

    /// Take the process-wide synthesis permit.
    pub async fn acquire(&self) -> OwnedMutexGuard<()> {
        self.synth_lock.clone().lock_owned().await
    }
}

/// Slot plus its notification channel, shared with the detached load task.
struct Shared {
    slot: Mutex<Slot>,
    changed: watch::Sender<()>,
}

/// Single-flight coordinator for the expensive model load.
///
/// The first caller observing `Unloaded` claims the load, which runs in a
/// detached task; the claimant and all concurrent callers suspend on a
/// watch channel and are woken once per state transition. Because the
/// load outlives any one caller's future, a client disconnect or request
/// timeout cannot strand the slot in `Loading`. A failed load is surfaced
/// to everyone waiting, and a later `ensure_ready` call may retry.
pub struct ModelCoordinator {
    loader: Arc<dyn EngineLoader>,
    shared: Arc<Shared>,
    synth_lock: Arc<AsyncMutex<()>>,
}

enum Claim {
    Ready(Arc<dyn SpeechEngine>),
    Acquired,
    Wait,
}

impl ModelCoordinator {
    pub fn new(loader: Arc<dyn EngineLoader>) -> Self {
        let (changed, _) = watch::channel(());
        Self {
            loader,
            shared: Arc::new(Shared {
                slot: Mutex::new(Slot::Unloaded),
                changed,
            }),
            synth_lock: Arc::new(AsyncMutex::new(())),
        }
    }

    pub fn status(&self) -> LoadStatus {
        let slot = self.shared.slot.lock().unwrap();
        let state = match &*slot {
            Slot::Unloaded => ModelState::Unloaded,
            Slot::Loading => ModelState::Loading,
            Slot::Ready(_) => ModelState::Ready,
            Slot::Failed(_) => ModelState::Failed,
        };
        LoadStatus {
            state,
            is_ready: state == ModelState::Ready,
        }
    }

    /// Block until the model is ready, loading it if nobody has yet.
    pub async fn ensure_ready(&self) -> Result<ModelHandle, JobError> {
        // Subscribe before inspecting state so a transition between the
        // check and the wait cannot be missed.
        let mut rx = self.shared.changed.subscribe();
        loop {
            let claim = {
                let mut slot = self.shared.slot.lock().unwrap();
                match &*slot {
                    Slot::Ready(engine) => Claim::Ready(engine.clone()),
                    Slot::Loading => Claim::Wait,
                    Slot::Unloaded | Slot::Failed(_) => {
                        *slot = Slot::Loading;
                        Claim::Acquired
                    }
                }
            };

            match claim {
                Claim::Ready(engine) => return Ok(self.handle(engine)),
                Claim::Acquired => self.spawn_load(),
                Claim::Wait => {}
            }

            // Claimant and waiters alike park here until the load task
            // publishes a terminal state.
            if rx.changed().await.is_err() {
                return Err(JobError::Load("model coordinator shut down".into()));
            }
            let outcome = {
                let slot = self.shared.slot.lock().unwrap();
                match &*slot {
                    Slot::Ready(engine) => Some(Ok(engine.clone())),
                    Slot::Failed(message) => Some(Err(JobError::Load(message.clone()))),
                    // Still loading (or claimed again), wait some more.
                    _ => None,
                }
            };
            match outcome {
                Some(Ok(engine)) => return Ok(self.handle(engine)),
                Some(Err(e)) => return Err(e),
                None => continue,
            }
        }
    }

    /// Run the load detached from the claiming caller, so dropping that
    /// caller's future cannot leave the slot in `Loading` forever.
    fn spawn_load(&self) {
        let loader = self.loader.clone();
        let shared = self.shared.clone();
        let _ = shared.changed.send(());
        info!("loading speech model");
        tokio::spawn(async move {
            let next = match loader.load().await {
                Ok(engine) => {
                    info!("speech model ready");
                    Slot::Ready(engine)
                }
                Err(e) => {
                    let message = format!("{e:#}");
                    error!("speech model load failed: {message}");
                    Slot::Failed(message)
                }
            };
            *shared.slot.lock().unwrap() = next;
            let _ = shared.changed.send(());
        });
    }

    fn handle(&self, engine: Arc<dyn SpeechEngine>) -> ModelHandle {
        ModelHandle {
            engine,
            synth_lock: self.synth_lock.clone(),
        }
    }
}
