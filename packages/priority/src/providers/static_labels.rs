//! Fixed-prediction image model backed by a JSON file.
//!
//! The file holds an array of `{"label": ..., "probability": ...}` objects
//! (`className` is accepted as an alias for `label`). Every image is
//! classified with the same predictions.

use std::path::PathBuf;
use std::sync::Arc;

use crate::PriorityError;
use crate::vision::{DecodedImage, ImageModel, ModelProvider, Prediction};

/// An [`ImageModel`] that returns the same predictions for every image.
#[derive(Debug, Clone)]
pub struct StaticLabelModel {
    predictions: Vec<Prediction>,
}

impl StaticLabelModel {
    /// Creates a model from a prediction list. Predictions are kept in
    /// descending probability order.
    #[must_use]
    pub fn new(mut predictions: Vec<Prediction>) -> Self {
        predictions.sort_by(|a, b| b.probability.total_cmp(&a.probability));
        Self { predictions }
    }
}

#[async_trait::async_trait]
impl ImageModel for StaticLabelModel {
    async fn classify(
        &self,
        _image: &DecodedImage,
        top_k: usize,
    ) -> Result<Vec<Prediction>, PriorityError> {
        Ok(self.predictions.iter().take(top_k).cloned().collect())
    }
}

/// Loads a [`StaticLabelModel`] from a JSON file.
#[derive(Debug, Clone)]
pub struct StaticLabelProvider {
    path: PathBuf,
}

impl StaticLabelProvider {
    /// Creates a provider reading predictions from `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl ModelProvider for StaticLabelProvider {
    async fn load(&self) -> Result<Arc<dyn ImageModel>, PriorityError> {
        let contents =
            tokio::fs::read_to_string(&self.path)
                .await
                .map_err(|e| PriorityError::ModelLoad {
                    message: format!("Failed to read {}: {e}", self.path.display()),
                })?;
        let predictions: Vec<Prediction> =
            serde_json::from_str(&contents).map_err(|e| PriorityError::ModelLoad {
                message: format!("Invalid predictions in {}: {e}", self.path.display()),
            })?;

        log::info!(
            "Loaded {} static predictions from {}",
            predictions.len(),
            self.path.display()
        );

        Ok(Arc::new(StaticLabelModel::new(predictions)))
    }
}

/// A provider that never has a model. Classification stays text-only.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoModelProvider;

#[async_trait::async_trait]
impl ModelProvider for NoModelProvider {
    async fn load(&self) -> Result<Arc<dyn ImageModel>, PriorityError> {
        Err(PriorityError::ModelLoad {
            message: "No image model configured".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::ImageFormat;

    fn image() -> DecodedImage {
        DecodedImage {
            format: ImageFormat::Png,
            data: Vec::new(),
        }
    }

    #[tokio::test]
    async fn returns_top_k_in_descending_order() {
        let model = StaticLabelModel::new(vec![
            Prediction::new("valley", 0.1),
            Prediction::new("fire screen", 0.6),
            Prediction::new("crane", 0.3),
        ]);
        let preds = model.classify(&image(), 2).await.unwrap();
        assert_eq!(
            preds.iter().map(|p| p.label.as_str()).collect::<Vec<_>>(),
            vec!["fire screen", "crane"]
        );
    }

    #[tokio::test]
    async fn loads_predictions_file() {
        let path = std::env::temp_dir().join("grievance_static_labels_test.json");
        std::fs::write(
            &path,
            r#"[{"className": "geyser", "probability": 0.7}, {"label": "dam", "probability": 0.2}]"#,
        )
        .unwrap();

        let model = StaticLabelProvider::new(path.clone()).load().await.unwrap();
        let preds = model.classify(&image(), 5).await.unwrap();
        assert_eq!(preds.len(), 2);
        assert_eq!(preds[0].label, "geyser");

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn missing_file_fails_to_load() {
        let result = StaticLabelProvider::new("/nonexistent/predictions.json")
            .load()
            .await;
        assert!(matches!(result, Err(PriorityError::ModelLoad { .. })));
    }

    #[tokio::test]
    async fn no_model_provider_always_fails() {
        assert!(NoModelProvider.load().await.is_err());
    }
}
