#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Emergency priority classifier for civic complaints.
//!
//! Fuses a keyword scan over the complaint text with an optional image
//! classification pass into a `high`/`medium`/`low` priority. The image
//! model is loaded lazily through a [`vision::ModelProvider`] and shared
//! by every classification. Classification never fails: a missing model,
//! an undecodable image, an inference error or a slow visual pass all
//! degrade to the text-only score.

pub mod keywords;
pub mod providers;
pub mod scoring;
pub mod vision;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use grievance_complaint_models::ComplaintPriority;
use thiserror::Error;

use crate::keywords::KeywordTables;
use crate::vision::{ImageDecoder, ImageModel, ImageRef, ModelProvider};

/// Errors raised by the vision collaborators.
///
/// These never escape [`EmergencyPredictor::classify`]; they are logged
/// and the visual contribution is dropped.
#[derive(Debug, Error)]
pub enum PriorityError {
    /// The image model could not be loaded.
    #[error("Model load error: {message}")]
    ModelLoad {
        /// Description of what went wrong.
        message: String,
    },

    /// The image could not be read or decoded.
    #[error("Image decode error: {message}")]
    Decode {
        /// Description of what went wrong.
        message: String,
    },

    /// The model failed while classifying.
    #[error("Inference error: {message}")]
    Inference {
        /// Description of what went wrong.
        message: String,
    },

    /// Keyword tables could not be loaded.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of what went wrong.
        message: String,
    },
}

/// Runtime knobs for the classifier. Scoring policy itself is fixed, see
/// [`scoring`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifierConfig {
    /// Upper bound on decode + inference for one classification.
    pub visual_timeout: Duration,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            visual_timeout: Duration::from_secs(10),
        }
    }
}

/// Score breakdown for one classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorityAssessment {
    /// Points from the keyword scan.
    pub text_score: u32,
    /// Points from the image pass (0 or [`scoring::VISUAL_POINTS`]).
    pub visual_score: u32,
    /// Resulting priority.
    pub priority: ComplaintPriority,
}

impl PriorityAssessment {
    /// Sum of text and visual points.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.text_score + self.visual_score
    }
}

enum ModelState {
    Unloaded,
    Loading,
    Ready(Arc<dyn ImageModel>),
}

/// Resets `Loading` back to `Unloaded` if a load is abandoned mid-flight.
struct LoadGuard<'a> {
    state: &'a Mutex<ModelState>,
    armed: bool,
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if matches!(*state, ModelState::Loading) {
                *state = ModelState::Unloaded;
            }
        }
    }
}

/// Text + vision priority classifier with a lazily loaded, shared model.
pub struct EmergencyPredictor {
    tables: KeywordTables,
    config: ClassifierConfig,
    provider: Arc<dyn ModelProvider>,
    decoder: Arc<dyn ImageDecoder>,
    state: Mutex<ModelState>,
}

impl EmergencyPredictor {
    /// Creates a classifier with the embedded keyword tables and default
    /// config. The model is not loaded until [`Self::init`] runs.
    #[must_use]
    pub fn new(provider: Arc<dyn ModelProvider>, decoder: Arc<dyn ImageDecoder>) -> Self {
        Self {
            tables: KeywordTables::default(),
            config: ClassifierConfig::default(),
            provider,
            decoder,
            state: Mutex::new(ModelState::Unloaded),
        }
    }

    /// Replaces the keyword tables.
    #[must_use]
    pub fn with_tables(mut self, tables: KeywordTables) -> Self {
        self.tables = tables;
        self
    }

    /// Replaces the runtime config.
    #[must_use]
    pub fn with_config(mut self, config: ClassifierConfig) -> Self {
        self.config = config;
        self
    }

    /// The keyword tables in use.
    #[must_use]
    pub const fn tables(&self) -> &KeywordTables {
        &self.tables
    }

    fn lock_state(&self) -> MutexGuard<'_, ModelState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether the image model is loaded.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(*self.lock_state(), ModelState::Ready(_))
    }

    /// Whether a load is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(*self.lock_state(), ModelState::Loading)
    }

    fn model(&self) -> Option<Arc<dyn ImageModel>> {
        match &*self.lock_state() {
            ModelState::Ready(model) => Some(Arc::clone(model)),
            ModelState::Unloaded | ModelState::Loading => None,
        }
    }

    /// Loads the image model.
    ///
    /// A no-op if the model is already loaded or another load is in
    /// flight. A failed load is logged and leaves the classifier in
    /// text-only mode; nothing retries automatically.
    pub async fn init(&self) {
        {
            let mut state = self.lock_state();
            if matches!(*state, ModelState::Ready(_) | ModelState::Loading) {
                return;
            }
            *state = ModelState::Loading;
        }

        let mut guard = LoadGuard {
            state: &self.state,
            armed: true,
        };

        let result = self.provider.load().await;
        guard.armed = false;

        let mut state = self.lock_state();
        match result {
            Ok(model) => {
                log::info!("Image classification model loaded for emergency priority scoring");
                *state = ModelState::Ready(model);
            }
            Err(e) => {
                log::error!("Failed to load image classification model: {e}");
                *state = ModelState::Unloaded;
            }
        }
    }

    /// Starts [`Self::init`] on the runtime without waiting for it.
    pub fn spawn_init(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let this = Arc::clone(self);
        tokio::spawn(async move { this.init().await })
    }

    /// Classifies a complaint into a priority.
    pub async fn classify(
        &self,
        description: &str,
        category: &str,
        image: Option<&ImageRef>,
    ) -> ComplaintPriority {
        self.assess(description, category, image).await.priority
    }

    /// Classifies a complaint and returns the score breakdown.
    pub async fn assess(
        &self,
        description: &str,
        category: &str,
        image: Option<&ImageRef>,
    ) -> PriorityAssessment {
        let context = scoring::text_context(description, category);
        let text_score = scoring::text_score(&self.tables, &context);

        let visual_score = match (self.model(), image) {
            (Some(model), Some(image)) => self.visual_score(model, image, &context).await,
            _ => 0,
        };

        let assessment = PriorityAssessment {
            text_score,
            visual_score,
            priority: scoring::decide(text_score + visual_score),
        };

        log::debug!(
            "Priority evaluation complete: text={text_score} visual={visual_score} -> {}",
            assessment.priority
        );

        assessment
    }

    async fn visual_score(
        &self,
        model: Arc<dyn ImageModel>,
        image: &ImageRef,
        context: &str,
    ) -> u32 {
        let pass = async {
            let decoded = self.decoder.decode(image).await?;
            let mut predictions = model.classify(&decoded, scoring::TOP_K).await?;
            predictions.truncate(scoring::TOP_K);
            log::debug!("Image predictions: {predictions:?}");
            Ok::<_, PriorityError>(scoring::has_visual_evidence(
                &self.tables,
                &predictions,
                context,
            ))
        };

        match tokio::time::timeout(self.config.visual_timeout, pass).await {
            Ok(Ok(true)) => {
                log::info!("Image classification detected infrastructure hazard features");
                scoring::VISUAL_POINTS
            }
            Ok(Ok(false)) => 0,
            Ok(Err(e)) => {
                log::warn!("Image classification failed, falling back to text: {e}");
                0
            }
            Err(_) => {
                log::warn!(
                    "Image classification exceeded {:?}, falling back to text",
                    self.config.visual_timeout
                );
                0
            }
        }
    }
}
