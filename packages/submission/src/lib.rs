#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Complaint submission pipeline.
//!
//! Runs the advisory duplicate check, classifies the complaint's priority
//! and persists it as `pending`. Only the final write can fail a
//! submission; a slow or failing duplicate check and any vision failure
//! degrade silently.

use std::sync::Arc;
use std::time::Duration;

use grievance_complaint_models::{Complaint, NewComplaint};
use grievance_dedup::DuplicateMatch;
use grievance_priority::vision::ImageRef;
use grievance_priority::{EmergencyPredictor, PriorityAssessment};
use grievance_store::{ComplaintStore, StoreError};
use thiserror::Error;

/// Errors surfaced to the submitter.
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// The complaint could not be persisted.
    #[error("Failed to save complaint: {0}")]
    Store(#[from] StoreError),
}

/// Result of a successful submission.
#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    /// The stored complaint.
    pub complaint: Complaint,
    /// Open complaint this one probably duplicates, shown as a notice.
    pub duplicate: Option<DuplicateMatch>,
    /// How the priority was reached.
    pub assessment: PriorityAssessment,
}

/// Files complaints.
pub struct SubmissionService {
    store: Arc<dyn ComplaintStore>,
    predictor: Arc<EmergencyPredictor>,
    duplicate_timeout: Duration,
}

impl SubmissionService {
    /// Default upper bound on the duplicate check.
    pub const DEFAULT_DUPLICATE_TIMEOUT: Duration = Duration::from_secs(5);

    /// Creates a service.
    #[must_use]
    pub fn new(store: Arc<dyn ComplaintStore>, predictor: Arc<EmergencyPredictor>) -> Self {
        Self {
            store,
            predictor,
            duplicate_timeout: Self::DEFAULT_DUPLICATE_TIMEOUT,
        }
    }

    /// Overrides the duplicate check timeout.
    #[must_use]
    pub fn with_duplicate_timeout(mut self, timeout: Duration) -> Self {
        self.duplicate_timeout = timeout;
        self
    }

    /// Submits a complaint.
    ///
    /// `image` is the photo to classify; when `None`, the complaint's
    /// `image_url` is used if present.
    ///
    /// # Errors
    ///
    /// Returns [`SubmissionError::Store`] if the complaint cannot be saved.
    pub async fn submit(
        &self,
        new: NewComplaint,
        image: Option<ImageRef>,
    ) -> Result<SubmissionOutcome, SubmissionError> {
        let duplicate = self.check_duplicate(&new).await;

        let image = image.or_else(|| new.image_url.clone().map(ImageRef::Uri));
        let assessment = self
            .predictor
            .assess(&new.description, new.category.as_ref(), image.as_ref())
            .await;

        let complaint = Complaint::from_submission(new, assessment.priority, chrono::Utc::now());
        let complaint = self.store.insert(complaint).await?;

        log::info!(
            "Filed {} complaint {} with {} priority",
            complaint.category,
            complaint.id,
            complaint.priority
        );

        Ok(SubmissionOutcome {
            complaint,
            duplicate,
            assessment,
        })
    }

    async fn check_duplicate(&self, new: &NewComplaint) -> Option<DuplicateMatch> {
        let check = grievance_dedup::find_duplicate(
            self.store.as_ref(),
            new.location.lat,
            new.location.lng,
            new.category,
        );

        tokio::time::timeout(self.duplicate_timeout, check)
            .await
            .unwrap_or_else(|_| {
                log::warn!(
                    "Duplicate check exceeded {:?}, continuing without it",
                    self.duplicate_timeout
                );
                None
            })
    }
}

#[cfg(test)]
mod tests {
    use grievance_complaint_models::{
        ComplaintCategory, ComplaintPriority, ComplaintStatus, Location,
    };
    use grievance_priority::providers::file::FileImageDecoder;
    use grievance_priority::providers::static_labels::{NoModelProvider, StaticLabelProvider};
    use grievance_store::MemoryStore;

    use super::*;

    fn predictor() -> Arc<EmergencyPredictor> {
        Arc::new(EmergencyPredictor::new(
            Arc::new(NoModelProvider),
            Arc::new(FileImageDecoder::new()),
        ))
    }

    fn new_complaint(category: ComplaintCategory, description: &str) -> NewComplaint {
        NewComplaint {
            user_id: Some("citizen-1".to_string()),
            category,
            description: description.to_string(),
            location: Location {
                lat: 28.6139,
                lng: 77.2090,
                address: "Connaught Place".to_string(),
            },
            image_url: None,
            video_url: None,
            media_urls: Vec::new(),
        }
    }

    /// Query path fails or hangs; writes go to an inner store.
    struct FlakyStore {
        inner: MemoryStore,
        hang: bool,
    }

    #[async_trait::async_trait]
    impl ComplaintStore for FlakyStore {
        async fn by_category_excluding_status(
            &self,
            _category: ComplaintCategory,
            _excluded: ComplaintStatus,
        ) -> Result<Vec<Complaint>, StoreError> {
            if self.hang {
                tokio::time::sleep(Duration::from_secs(30)).await;
            }
            Err(StoreError::Unavailable {
                message: "connection reset".to_string(),
            })
        }

        async fn insert(&self, complaint: Complaint) -> Result<Complaint, StoreError> {
            self.inner.insert(complaint).await
        }

        async fn get(&self, id: &str) -> Result<Option<Complaint>, StoreError> {
            self.inner.get(id).await
        }

        async fn update(&self, complaint: Complaint) -> Result<Complaint, StoreError> {
            self.inner.update(complaint).await
        }

        async fn delete(&self, id: &str) -> Result<(), StoreError> {
            self.inner.delete(id).await
        }

        async fn list(&self) -> Result<Vec<Complaint>, StoreError> {
            self.inner.list().await
        }
    }

    #[tokio::test]
    async fn stores_pending_complaint_with_computed_priority() {
        let store = Arc::new(MemoryStore::new());
        let service = SubmissionService::new(store.clone(), predictor());

        let outcome = service
            .submit(
                new_complaint(ComplaintCategory::WaterSupply, "Pipeline leak flooding the lane"),
                None,
            )
            .await
            .unwrap();

        assert_eq!(outcome.complaint.priority, ComplaintPriority::High);
        assert_eq!(outcome.complaint.status, ComplaintStatus::Pending);
        assert!(outcome.duplicate.is_none());
        assert_eq!(
            store.get(&outcome.complaint.id).await.unwrap(),
            Some(outcome.complaint)
        );
    }

    #[tokio::test]
    async fn second_nearby_submission_gets_notice() {
        let store = Arc::new(MemoryStore::new());
        let service = SubmissionService::new(store.clone(), predictor());

        let first = service
            .submit(new_complaint(ComplaintCategory::RoadPotholes, "deep pothole"), None)
            .await
            .unwrap();
        let second = service
            .submit(new_complaint(ComplaintCategory::RoadPotholes, "same pothole"), None)
            .await
            .unwrap();

        assert!(first.duplicate.is_none());
        assert_eq!(
            second.duplicate.map(|d| d.complaint_id),
            Some(first.complaint.id)
        );
        assert_eq!(store.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn failing_duplicate_query_does_not_block() {
        let store = Arc::new(FlakyStore {
            inner: MemoryStore::new(),
            hang: false,
        });
        let service = SubmissionService::new(store.clone(), predictor());

        let outcome = service
            .submit(new_complaint(ComplaintCategory::Drainage, "drain stuck"), None)
            .await
            .unwrap();

        assert!(outcome.duplicate.is_none());
        assert_eq!(outcome.complaint.priority, ComplaintPriority::Medium);
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn hanging_duplicate_query_is_abandoned() {
        let store = Arc::new(FlakyStore {
            inner: MemoryStore::new(),
            hang: true,
        });
        let service = SubmissionService::new(store.clone(), predictor())
            .with_duplicate_timeout(Duration::from_millis(20));

        let outcome = service
            .submit(new_complaint(ComplaintCategory::Sanitation, "public toilet dirty"), None)
            .await
            .unwrap();

        assert!(outcome.duplicate.is_none());
        assert_eq!(outcome.complaint.priority, ComplaintPriority::Low);
    }

    #[tokio::test]
    async fn undecodable_image_url_falls_back_to_text() {
        let path = std::env::temp_dir().join("grievance_submission_fire_predictions.json");
        std::fs::write(&path, r#"[{"label": "fire screen", "probability": 0.9}]"#).unwrap();

        let predictor = EmergencyPredictor::new(
            Arc::new(StaticLabelProvider::new(path.clone())),
            Arc::new(FileImageDecoder::new()),
        );
        predictor.init().await;
        assert!(predictor.is_ready());

        let store = Arc::new(MemoryStore::new());
        let service = SubmissionService::new(store, Arc::new(predictor));

        let mut new = new_complaint(ComplaintCategory::WasteManagement, "garbage heap");
        new.image_url = Some("https://cdn.example.com/evidence/1.jpg".to_string());

        let outcome = service.submit(new, None).await.unwrap();
        assert_eq!(outcome.assessment.text_score, 2);
        assert_eq!(outcome.assessment.visual_score, 0);
        assert_eq!(outcome.complaint.priority, ComplaintPriority::Medium);

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn decodable_image_adds_visual_points() {
        let dir = std::env::temp_dir();
        let predictions = dir.join("grievance_submission_wreck_predictions.json");
        let photo = dir.join("grievance_submission_wreck.png");
        std::fs::write(&predictions, r#"[{"className": "wreck", "probability": 0.6}]"#).unwrap();
        std::fs::write(&photo, [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]).unwrap();

        let predictor = EmergencyPredictor::new(
            Arc::new(StaticLabelProvider::new(predictions.clone())),
            Arc::new(FileImageDecoder::new()),
        );
        predictor.init().await;

        let service = SubmissionService::new(Arc::new(MemoryStore::new()), Arc::new(predictor));
        let outcome = service
            .submit(
                new_complaint(ComplaintCategory::RoadPotholes, "road caved in"),
                Some(ImageRef::Path(photo.clone())),
            )
            .await
            .unwrap();

        assert_eq!(outcome.assessment.visual_score, 3);
        assert_eq!(outcome.complaint.priority, ComplaintPriority::High);

        let _ = std::fs::remove_file(&predictions);
        let _ = std::fs::remove_file(&photo);
    }
}
