//! Capability interfaces for the image side of classification.
//!
//! The classifier never talks to a concrete vision runtime. It receives a
//! [`ModelProvider`] that can load an [`ImageModel`], and an
//! [`ImageDecoder`] that turns an [`ImageRef`] into something the model
//! can classify.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::PriorityError;

/// A single label predicted by an image model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Class name as emitted by the model (e.g. "fire screen").
    #[serde(alias = "className")]
    pub label: String,
    /// Probability in `[0, 1]`.
    pub probability: f32,
}

impl Prediction {
    /// Convenience constructor.
    #[must_use]
    pub fn new(label: impl Into<String>, probability: f32) -> Self {
        Self {
            label: label.into(),
            probability,
        }
    }
}

/// A reference to image content that has not been decoded yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    /// A local file.
    Path(PathBuf),
    /// A URI (`file://` or a remote location).
    Uri(String),
    /// Raw bytes already in memory, e.g. an upload preview.
    Bytes(Vec<u8>),
}

/// Container format detected while decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG
    Png,
    /// JPEG
    Jpeg,
    /// GIF
    Gif,
    /// WebP
    WebP,
}

/// Image content ready to be classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    /// Detected container format.
    pub format: ImageFormat,
    /// Encoded bytes.
    pub data: Vec<u8>,
}

/// A loaded image classification model.
#[async_trait::async_trait]
pub trait ImageModel: Send + Sync {
    /// Classifies an image, returning at most `top_k` predictions ordered
    /// by descending probability.
    ///
    /// # Errors
    ///
    /// Returns [`PriorityError::Inference`] if inference fails.
    async fn classify(
        &self,
        image: &DecodedImage,
        top_k: usize,
    ) -> Result<Vec<Prediction>, PriorityError>;
}

/// Loads an [`ImageModel`].
#[async_trait::async_trait]
pub trait ModelProvider: Send + Sync {
    /// Loads the model. May be slow; called at most once at a time.
    ///
    /// # Errors
    ///
    /// Returns [`PriorityError::ModelLoad`] if the model is unavailable.
    async fn load(&self) -> Result<Arc<dyn ImageModel>, PriorityError>;
}

/// Turns an [`ImageRef`] into a [`DecodedImage`].
#[async_trait::async_trait]
pub trait ImageDecoder: Send + Sync {
    /// Decodes the referenced image.
    ///
    /// # Errors
    ///
    /// Returns [`PriorityError::Decode`] if the content cannot be read or
    /// is not a supported image.
    async fn decode(&self, image: &ImageRef) -> Result<DecodedImage, PriorityError>;
}
