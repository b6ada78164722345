//! Shared service state: the loaded model, readiness, and failure tracking.
//!
//! The model is installed once into a `OnceLock` and read by reference from
//! every handler. Readiness and the failure counter are atomics, so probes and
//! request handlers never contend on a lock.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use chrono::{DateTime, Utc};
use thiserror::Error;

use irisserve_ai::{InferenceError, ModelArtifact};

use crate::config::ServiceConfig;

/// Readiness flag. Starts not-ready.
#[derive(Debug, Default)]
pub struct Readiness {
    ready: AtomicBool,
}

impl Readiness {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    /// Returns whether the flag was previously set.
    pub fn mark_not_ready(&self) -> bool {
        self.ready.swap(false, Ordering::AcqRel)
    }
}

/// Counts consecutive inference failures; any success resets the count.
#[derive(Debug)]
pub struct InferenceHealth {
    consecutive_failures: AtomicU32,
    threshold: u32,
}

impl InferenceHealth {
    pub fn new(threshold: u32) -> Self {
        Self {
            consecutive_failures: AtomicU32::new(0),
            threshold,
        }
    }

    pub fn record_success(&self) {
        self.consecutive_failures.store(0, Ordering::Relaxed);
    }

    /// Returns `true` once the failure streak has reached the threshold.
    pub fn record_failure(&self) -> bool {
        let streak = self.consecutive_failures.fetch_add(1, Ordering::Relaxed).saturating_add(1);
        streak >= self.threshold
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures.load(Ordering::Relaxed)
    }
}

#[derive(Debug)]
pub struct LoadedModel {
    pub artifact: ModelArtifact,
    pub loaded_at: DateTime<Utc>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NotReadyReason {
    ModelNotLoaded,
    InferenceFailures,
}

impl NotReadyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotReadyReason::ModelNotLoaded => "model_not_loaded",
            NotReadyReason::InferenceFailures => "inference_failures",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InstallError {
    #[error("a model artifact is already installed")]
    AlreadyInstalled,
}

/// Application services shared by all handlers (behind an `Arc`).
#[derive(Debug)]
pub struct AppServices {
    model: OnceLock<LoadedModel>,
    readiness: Readiness,
    health: InferenceHealth,
    max_batch_size: usize,
}

impl AppServices {
    pub fn new(max_batch_size: usize, failure_threshold: u32) -> Self {
        Self {
            model: OnceLock::new(),
            readiness: Readiness::new(),
            health: InferenceHealth::new(failure_threshold),
            max_batch_size,
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(config.max_batch_size, config.inference_failure_threshold)
    }

    /// Install the artifact and flip readiness (the single `starting` →
    /// `serving` transition).
    pub fn install(&self, artifact: ModelArtifact) -> Result<(), InstallError> {
        self.model
            .set(LoadedModel {
                artifact,
                loaded_at: Utc::now(),
            })
            .map_err(|_| InstallError::AlreadyInstalled)?;

        // Published after the model so a ready reader always sees it.
        self.readiness.mark_ready();

        if let Some(loaded) = self.model.get() {
            tracing::info!(
                model = %loaded.artifact.metadata().name,
                version = %loaded.artifact.metadata().version,
                classifier = loaded.artifact.classifier_kind(),
                "model installed; service is ready"
            );
        }
        Ok(())
    }

    pub fn model(&self) -> Option<&ModelArtifact> {
        self.model.get().map(|m| &m.artifact)
    }

    pub fn loaded(&self) -> Option<&LoadedModel> {
        self.model.get()
    }

    pub fn readiness(&self) -> &Readiness {
        &self.readiness
    }

    pub fn not_ready_reason(&self) -> Option<NotReadyReason> {
        if self.readiness.is_ready() {
            None
        } else if self.model.get().is_none() {
            Some(NotReadyReason::ModelNotLoaded)
        } else {
            Some(NotReadyReason::InferenceFailures)
        }
    }

    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    pub fn record_success(&self) {
        self.health.record_success();
    }

    /// Log an inference failure and demote readiness if failures persist.
    ///
    /// Demotion is sticky: only a restart brings the pod back into rotation.
    pub fn record_inference_failure(&self, err: &InferenceError) {
        let demote = self.health.record_failure();
        tracing::error!(
            error = %err,
            consecutive_failures = self.health.consecutive_failures(),
            "inference failed"
        );

        if demote && self.readiness.mark_not_ready() {
            tracing::warn!(
                consecutive_failures = self.health.consecutive_failures(),
                "readiness demoted after repeated inference failures"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use irisserve_ai::{ModelMetadata, StandardScaler, LogisticRegression};

    fn artifact() -> ModelArtifact {
        ModelArtifact::from_parts(
            ModelMetadata {
                name: "uniform".to_string(),
                version: "0".to_string(),
            },
            StandardScaler::new([0.0; 4], [1.0; 4]).unwrap(),
            LogisticRegression::new([[0.0; 4]; 3], [0.0; 3]).unwrap(),
        )
    }

    fn failure() -> InferenceError {
        InferenceError::MalformedModel("boom".to_string())
    }

    #[test]
    fn starts_not_ready_without_a_model() {
        let services = AppServices::new(10, 3);

        assert!(!services.readiness().is_ready());
        assert!(services.model().is_none());
        assert_eq!(services.not_ready_reason(), Some(NotReadyReason::ModelNotLoaded));
    }

    #[test]
    fn install_makes_the_service_ready_once() {
        let services = AppServices::new(10, 3);

        services.install(artifact()).unwrap();
        assert!(services.readiness().is_ready());
        assert_eq!(services.not_ready_reason(), None);
        assert_eq!(services.model().unwrap().metadata().name, "uniform");

        assert_eq!(services.install(artifact()), Err(InstallError::AlreadyInstalled));
        assert!(services.readiness().is_ready());
    }

    #[test]
    fn persistent_failures_demote_readiness() {
        let services = AppServices::new(10, 3);
        services.install(artifact()).unwrap();

        services.record_inference_failure(&failure());
        services.record_inference_failure(&failure());
        assert!(services.readiness().is_ready());

        services.record_inference_failure(&failure());
        assert!(!services.readiness().is_ready());
        assert_eq!(services.not_ready_reason(), Some(NotReadyReason::InferenceFailures));
        assert!(services.model().is_some());
    }

    #[test]
    fn success_resets_the_failure_streak() {
        let services = AppServices::new(10, 2);
        services.install(artifact()).unwrap();

        services.record_inference_failure(&failure());
        services.record_success();
        services.record_inference_failure(&failure());

        assert!(services.readiness().is_ready());
    }

    #[test]
    fn demotion_is_sticky() {
        let services = AppServices::new(10, 1);
        services.install(artifact()).unwrap();

        services.record_inference_failure(&failure());
        services.record_success();

        assert!(!services.readiness().is_ready());
    }

    #[test]
    fn readers_observe_only_false_then_true() {
        let services = std::sync::Arc::new(AppServices::new(10, 3));

        std::thread::scope(|s| {
            let readers: Vec<_> = (0..4)
                .map(|_| {
                    let services = services.clone();
                    s.spawn(move || {
                        let mut seen_ready = false;
                        for _ in 0..10_000 {
                            let ready = services.readiness().is_ready();
                            assert!(!(seen_ready && !ready), "readiness went backwards");
                            if ready {
                                assert!(services.model().is_some());
                            }
                            seen_ready |= ready;
                        }
                    })
                })
                .collect();

            services.install(artifact()).unwrap();

            for r in readers {
                r.join().unwrap();
            }
        });

        assert!(services.readiness().is_ready());
    }
}
