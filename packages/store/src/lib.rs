#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Complaint persistence behind a capability trait.
//!
//! The portal persists complaints in a hosted relational store with
//! realtime push. Everything above this crate talks to
//! [`ComplaintStore`]; [`memory::MemoryStore`] implements it in-process
//! with a broadcast change feed and JSON snapshot persistence.

pub mod memory;

use grievance_complaint_models::{Complaint, ComplaintCategory, ComplaintStatus, Profile};
use serde::Serialize;
use thiserror::Error;

pub use memory::MemoryStore;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No complaint with the given id.
    #[error("Complaint not found: {id}")]
    NotFound {
        /// The missing id.
        id: String,
    },

    /// A complaint with the given id already exists.
    #[error("Complaint already exists: {id}")]
    Conflict {
        /// The duplicate id.
        id: String,
    },

    /// Snapshot file I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot JSON was malformed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The backing store could not be reached.
    #[error("Store unavailable: {message}")]
    Unavailable {
        /// Description of what went wrong.
        message: String,
    },
}

/// A change pushed to subscribers after a successful write.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ChangeEvent {
    /// A complaint was created.
    Inserted {
        /// The stored complaint.
        complaint: Complaint,
    },
    /// A complaint was modified.
    Updated {
        /// The complaint after the change.
        complaint: Complaint,
    },
    /// A complaint was removed.
    Deleted {
        /// Id of the removed complaint.
        id: String,
    },
}

/// Complaint persistence.
#[async_trait::async_trait]
pub trait ComplaintStore: Send + Sync {
    /// Complaints in `category` whose status is not `excluded`, oldest
    /// first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    async fn by_category_excluding_status(
        &self,
        category: ComplaintCategory,
        excluded: ComplaintStatus,
    ) -> Result<Vec<Complaint>, StoreError>;

    /// Stores a new complaint.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] if the id is taken, or another
    /// [`StoreError`] if the write fails.
    async fn insert(&self, complaint: Complaint) -> Result<Complaint, StoreError>;

    /// Fetches one complaint.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    async fn get(&self, id: &str) -> Result<Option<Complaint>, StoreError>;

    /// Replaces an existing complaint.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the id is unknown, or another
    /// [`StoreError`] if the write fails.
    async fn update(&self, complaint: Complaint) -> Result<Complaint, StoreError>;

    /// Removes a complaint.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the id is unknown, or another
    /// [`StoreError`] if the write fails.
    async fn delete(&self, id: &str) -> Result<(), StoreError>;

    /// All complaints, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    async fn list(&self) -> Result<Vec<Complaint>, StoreError>;
}

/// User profile lookup.
#[async_trait::async_trait]
pub trait ProfileStore: Send + Sync {
    /// All known profiles.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    async fn profiles(&self) -> Result<Vec<Profile>, StoreError>;

    /// Inserts or replaces a profile.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write fails.
    async fn upsert_profile(&self, profile: Profile) -> Result<(), StoreError>;
}
