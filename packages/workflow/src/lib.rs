#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Worker and admin operations on filed complaints.
//!
//! The happy path is `pending -> in_progress` (admin assigns a worker),
//! `in_progress -> waiting_approval` (worker uploads completion proof),
//! then `waiting_approval -> resolved` (admin approves) or back to
//! `in_progress` (admin rejects the proof and reassigns).

use std::sync::Arc;

use grievance_complaint_models::{Complaint, ComplaintPriority, ComplaintStatus};
use grievance_store::{ComplaintStore, StoreError};
use thiserror::Error;

/// Errors that can occur during workflow operations.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// No complaint with the given id.
    #[error("Complaint not found: {id}")]
    NotFound {
        /// The missing id.
        id: String,
    },

    /// The action is not allowed from the complaint's current status.
    #[error("Cannot {action} complaint {id} while it is {status}")]
    InvalidTransition {
        /// Complaint id.
        id: String,
        /// Attempted action.
        action: &'static str,
        /// Current status.
        status: ComplaintStatus,
    },

    /// The store rejected the change.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Lifecycle operations backed by a [`ComplaintStore`].
pub struct Workflow {
    store: Arc<dyn ComplaintStore>,
}

impl Workflow {
    /// Creates a workflow over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn ComplaintStore>) -> Self {
        Self { store }
    }

    async fn load(&self, id: &str) -> Result<Complaint, WorkflowError> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| WorkflowError::NotFound { id: id.to_string() })
    }

    async fn save(&self, mut complaint: Complaint) -> Result<Complaint, WorkflowError> {
        complaint.updated_at = chrono::Utc::now();
        Ok(self.store.update(complaint).await?)
    }

    fn require(
        complaint: &Complaint,
        action: &'static str,
        allowed: &[ComplaintStatus],
    ) -> Result<(), WorkflowError> {
        if allowed.contains(&complaint.status) {
            Ok(())
        } else {
            Err(WorkflowError::InvalidTransition {
                id: complaint.id.clone(),
                action,
                status: complaint.status,
            })
        }
    }

    /// Assigns a worker and moves the complaint to `in_progress`.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::InvalidTransition`] if the complaint is
    /// already resolved.
    pub async fn assign_worker(&self, id: &str, worker_id: &str) -> Result<Complaint, WorkflowError> {
        let mut complaint = self.load(id).await?;
        Self::require(
            &complaint,
            "assign",
            &[
                ComplaintStatus::Pending,
                ComplaintStatus::InProgress,
                ComplaintStatus::WaitingApproval,
            ],
        )?;

        complaint.assigned_to = Some(worker_id.to_string());
        complaint.status = ComplaintStatus::InProgress;
        log::info!("Assigned complaint {id} to worker {worker_id}");
        self.save(complaint).await
    }

    /// Records the worker's completion photo and moves the complaint to
    /// `waiting_approval`.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::InvalidTransition`] unless the complaint is
    /// `in_progress`.
    pub async fn complete_task(
        &self,
        id: &str,
        completed_image_url: &str,
    ) -> Result<Complaint, WorkflowError> {
        let mut complaint = self.load(id).await?;
        Self::require(&complaint, "complete", &[ComplaintStatus::InProgress])?;

        complaint.completed_image_url = Some(completed_image_url.to_string());
        complaint.status = ComplaintStatus::WaitingApproval;
        log::info!("Complaint {id} submitted for approval");
        self.save(complaint).await
    }

    /// Accepts the completion proof and resolves the complaint.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::InvalidTransition`] unless the complaint is
    /// `waiting_approval`.
    pub async fn approve(&self, id: &str) -> Result<Complaint, WorkflowError> {
        let mut complaint = self.load(id).await?;
        Self::require(&complaint, "approve", &[ComplaintStatus::WaitingApproval])?;

        complaint.status = ComplaintStatus::Resolved;
        log::info!("Complaint {id} resolved");
        self.save(complaint).await
    }

    /// Rejects the completion proof, clearing it and sending the task back
    /// to the worker.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::InvalidTransition`] unless the complaint is
    /// `waiting_approval`.
    pub async fn reassign(&self, id: &str) -> Result<Complaint, WorkflowError> {
        let mut complaint = self.load(id).await?;
        Self::require(&complaint, "reassign", &[ComplaintStatus::WaitingApproval])?;

        complaint.status = ComplaintStatus::InProgress;
        complaint.completed_image_url = None;
        log::info!("Complaint {id} sent back to the worker");
        self.save(complaint).await
    }

    /// Overrides the classifier's priority.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] if the complaint is missing or the write
    /// fails.
    pub async fn override_priority(
        &self,
        id: &str,
        priority: ComplaintPriority,
    ) -> Result<Complaint, WorkflowError> {
        let mut complaint = self.load(id).await?;
        if complaint.priority != priority {
            log::info!(
                "Priority of complaint {id} changed {} -> {priority}",
                complaint.priority
            );
        }
        complaint.priority = priority;
        self.save(complaint).await
    }

    /// Sets the status directly.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] if the complaint is missing or the write
    /// fails.
    pub async fn update_status(
        &self,
        id: &str,
        status: ComplaintStatus,
    ) -> Result<Complaint, WorkflowError> {
        let mut complaint = self.load(id).await?;
        complaint.status = status;
        self.save(complaint).await
    }

    /// Removes a complaint.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::NotFound`] if the complaint is missing.
    pub async fn delete(&self, id: &str) -> Result<(), WorkflowError> {
        match self.store.delete(id).await {
            Ok(()) => {
                log::info!("Deleted complaint {id}");
                Ok(())
            }
            Err(StoreError::NotFound { id }) => Err(WorkflowError::NotFound { id }),
            Err(e) => Err(e.into()),
        }
    }
}
