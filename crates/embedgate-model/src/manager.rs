//! Model resource lifecycle.
//!
//! The [`ResourceManager`] owns the published [`ModelHandle`] and serializes
//! reloads:
//! 1. A reload builds the replacement model off to the side; readers keep
//!    encoding on the published handle the whole time.
//! 2. The swap is a single pointer replace under a write lock held for the
//!    duration of an `Arc` clone.
//! 3. In-flight encodes finish on their clones of the old handle; the old
//!    model retires when the last clone drops.
//!
//! A failed reload leaves the published handle untouched, and only one reload
//! runs at a time; a second request is rejected, not queued.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::backend::{ModelBackend, ModelInstance};
use crate::errors::{ModelError, Result};
use crate::instruction::{RequestKind, pair_with_instruction};

/// A loaded model published to readers.
///
/// Handles are shared as `Arc<ModelHandle>`: a reload publishes a fresh
/// handle while in-flight encodes finish on their clones of the old one.
pub struct ModelHandle {
    id: Uuid,
    model_name: String,
    loaded_at: DateTime<Utc>,
    instance: Box<dyn ModelInstance>,
}

impl ModelHandle {
    fn new(model_name: String, instance: Box<dyn ModelInstance>) -> Self {
        Self {
            id: Uuid::now_v7(),
            model_name,
            loaded_at: Utc::now(),
            instance,
        }
    }

    /// Unique id of this load generation.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Model identifier this handle was loaded from.
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// When the model finished loading.
    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// Output embedding width.
    pub fn dimensions(&self) -> usize {
        self.instance.dimensions()
    }

    /// Encode a batch for one side of a retrieval pair.
    ///
    /// An empty batch returns an empty matrix without touching the model.
    pub fn encode(&self, kind: RequestKind, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let pairs = pair_with_instruction(kind, texts);
        self.instance.encode(&pairs)
    }
}

impl Drop for ModelHandle {
    fn drop(&mut self) {
        debug!(handle_id = %self.id, model = %self.model_name, "model handle retired");
    }
}

/// Summary of a completed reload.
#[derive(Clone, Debug)]
pub struct ReloadOutcome {
    /// Model identifier that was reloaded.
    pub model_name: String,
    /// Id of the newly published handle.
    pub handle_id: Uuid,
    /// Wall time the reload took.
    pub duration: Duration,
}

/// Resets the in-flight flag when a reload ends, on every exit path.
struct ReloadGuard<'a>(&'a AtomicBool);

impl Drop for ReloadGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Owns the live model and serializes reloads.
pub struct ResourceManager {
    model_name: String,
    backend: Arc<dyn ModelBackend>,
    current: RwLock<Arc<ModelHandle>>,
    reload_in_flight: AtomicBool,
}

impl ResourceManager {
    /// Load the model and publish the first handle.
    ///
    /// A load failure here is fatal: without a model the service has nothing
    /// to serve, so the error propagates to the caller.
    pub async fn initialize(
        model_name: impl Into<String>,
        backend: Arc<dyn ModelBackend>,
    ) -> Result<Arc<Self>> {
        let model_name = model_name.into();
        info!(model = %model_name, "loading embedding model");
        let handle = Self::load_handle(Arc::clone(&backend), model_name.clone()).await?;
        info!(
            model = %model_name,
            handle_id = %handle.id(),
            dimensions = handle.dimensions(),
            "embedding model ready"
        );
        Ok(Arc::new(Self {
            model_name,
            backend,
            current: RwLock::new(Arc::new(handle)),
            reload_in_flight: AtomicBool::new(false),
        }))
    }

    /// Model identifier this manager serves.
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// The currently published handle.
    pub async fn current(&self) -> Arc<ModelHandle> {
        Arc::clone(&*self.current.read().await)
    }

    /// Encode a batch on the current model.
    ///
    /// Inference runs on the blocking pool; the handle clone taken here keeps
    /// the model alive even if a reload swaps it out mid-call.
    pub async fn encode(&self, kind: RequestKind, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let handle = self.current().await;
        tokio::task::spawn_blocking(move || handle.encode(kind, &texts))
            .await
            .map_err(|e| ModelError::Task(e.to_string()))?
    }

    /// Replace the published model with a freshly loaded one.
    ///
    /// Builds the replacement before touching the published handle, so readers
    /// never wait on the load. On failure the old handle stays published and
    /// the error is returned. A reload that is already running makes this
    /// return [`ModelError::ReloadInFlight`] immediately; requests are not
    /// queued.
    pub async fn reload(&self) -> Result<ReloadOutcome> {
        if self
            .reload_in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ModelError::ReloadInFlight);
        }
        let _guard = ReloadGuard(&self.reload_in_flight);

        let started = Instant::now();
        info!(model = %self.model_name, "model reload started");

        match Self::load_handle(Arc::clone(&self.backend), self.model_name.clone()).await {
            Ok(handle) => {
                let new = Arc::new(handle);
                let handle_id = new.id();
                let previous = {
                    let mut current = self.current.write().await;
                    std::mem::replace(&mut *current, Arc::clone(&new))
                };
                // In-flight encodes still hold clones of `previous`; the old
                // model retires once the last one finishes.
                drop(previous);

                let duration = started.elapsed();
                metrics::counter!("embedgate_reloads_total", "outcome" => "success")
                    .increment(1);
                metrics::histogram!("embedgate_reload_duration_seconds")
                    .record(duration.as_secs_f64());
                info!(
                    handle_id = %handle_id,
                    duration_secs = duration.as_secs_f64(),
                    "model reload complete"
                );
                Ok(ReloadOutcome {
                    model_name: self.model_name.clone(),
                    handle_id,
                    duration,
                })
            }
            Err(e) => {
                metrics::counter!("embedgate_reloads_total", "outcome" => "failure")
                    .increment(1);
                warn!(error = %e, "model reload failed, keeping current model");
                Err(e)
            }
        }
    }

    /// Spawn the scheduled reload task.
    ///
    /// The first reload fires one full `interval` after the call, since the
    /// model just loaded and an immediate tick would be redundant. A failed tick
    /// keeps the current model and retries at the next one. Cancelling
    /// `shutdown` stops the task.
    pub fn spawn_scheduled_reload(
        self: &Arc<Self>,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        info!(interval_secs = interval.as_secs(), "scheduled model reload enabled");
        tokio::spawn(async move {
            let mut timer =
                tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    () = shutdown.cancelled() => {
                        debug!("scheduled reload task stopping");
                        break;
                    }
                    _ = timer.tick() => {
                        match manager.reload().await {
                            Ok(outcome) => {
                                info!(handle_id = %outcome.handle_id, "scheduled reload complete");
                            }
                            Err(e) => {
                                warn!(error = %e, "scheduled reload failed, retrying next tick");
                            }
                        }
                    }
                }
            }
        })
    }

    async fn load_handle(
        backend: Arc<dyn ModelBackend>,
        model_name: String,
    ) -> Result<ModelHandle> {
        tokio::task::spawn_blocking(move || -> Result<ModelHandle> {
            let instance = backend.load(&model_name)?;
            Ok(ModelHandle::new(model_name, instance))
        })
        .await
        .map_err(|e| ModelError::Task(e.to_string()))?
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
