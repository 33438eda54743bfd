#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Complaint types shared across the grievance portal.
//!
//! Defines the closed set of civic categories, the three-level priority
//! produced by the emergency classifier, the complaint lifecycle status,
//! and the complaint record itself. Wire names match the values the
//! portal stores (`water_supply`, `waiting_approval`, ...).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Civic complaint categories.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ComplaintCategory {
    /// Uncollected garbage, overflowing bins
    WasteManagement,
    /// Pipeline leaks, supply outages
    WaterSupply,
    /// Potholes and damaged roads
    RoadPotholes,
    /// Broken or dangling streetlights and poles
    Streetlight,
    /// Blocked drains and sewage overflow
    Drainage,
    /// Public sanitation and hygiene
    Sanitation,
}

impl ComplaintCategory {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::WasteManagement,
            Self::WaterSupply,
            Self::RoadPotholes,
            Self::Streetlight,
            Self::Drainage,
            Self::Sanitation,
        ]
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::WasteManagement => "Waste Management",
            Self::WaterSupply => "Water Supply",
            Self::RoadPotholes => "Road & Potholes",
            Self::Streetlight => "Streetlight",
            Self::Drainage => "Drainage",
            Self::Sanitation => "Sanitation",
        }
    }

    /// The municipal authority responsible for complaints in this category.
    #[must_use]
    pub const fn authority(self) -> &'static str {
        match self {
            Self::WasteManagement => "Waste Management Authority",
            Self::WaterSupply => "Water Supply Board",
            Self::RoadPotholes => "Public Works Department",
            Self::Streetlight => "Electricity Board",
            Self::Drainage => "Drainage & Sewage Dept",
            Self::Sanitation => "Sanitation Department",
        }
    }
}

/// Urgency level assigned to a complaint.
///
/// Ordered so that `Low < Medium < High`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ComplaintPriority {
    /// Minor issue
    Low,
    /// Needs attention
    Medium,
    /// Urgent or dangerous
    High,
}

impl ComplaintPriority {
    /// Returns all variants of this enum, most urgent first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::High, Self::Medium, Self::Low]
    }
}

/// Complaint lifecycle state.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ComplaintStatus {
    /// Filed, not yet assigned
    Pending,
    /// Assigned to a worker
    InProgress,
    /// Worker submitted completion proof, awaiting admin review
    WaitingApproval,
    /// Closed by an admin
    Resolved,
}

impl ComplaintStatus {
    /// Returns all variants of this enum in lifecycle order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Pending,
            Self::InProgress,
            Self::WaitingApproval,
            Self::Resolved,
        ]
    }

    /// Whether the complaint still needs work.
    #[must_use]
    pub const fn is_open(self) -> bool {
        !matches!(self, Self::Resolved)
    }
}

/// A geographic location in decimal degrees plus a display address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
    /// Human-readable address.
    pub address: String,
}

/// A complaint as submitted by a citizen, before it is classified and
/// stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewComplaint {
    /// Submitting user, `None` for anonymous submissions.
    pub user_id: Option<String>,
    /// Civic category.
    pub category: ComplaintCategory,
    /// Free-text description.
    pub description: String,
    /// Where the issue is.
    pub location: Location,
    /// Uploaded photo URL.
    pub image_url: Option<String>,
    /// Uploaded video URL.
    pub video_url: Option<String>,
    /// Additional uploaded photo URLs.
    #[serde(default)]
    pub media_urls: Vec<String>,
}

/// A stored complaint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Complaint {
    /// Unique identifier.
    pub id: String,
    /// Submitting user, `None` for anonymous submissions.
    pub user_id: Option<String>,
    /// Civic category.
    pub category: ComplaintCategory,
    /// Free-text description.
    pub description: String,
    /// Computed at submission, may be overridden by an admin.
    pub priority: ComplaintPriority,
    /// Lifecycle state.
    pub status: ComplaintStatus,
    /// Where the issue is.
    pub location: Location,
    /// Uploaded photo URL.
    pub image_url: Option<String>,
    /// Uploaded video URL.
    pub video_url: Option<String>,
    /// Additional uploaded photo URLs.
    #[serde(default)]
    pub media_urls: Vec<String>,
    /// Worker the task is assigned to.
    pub assigned_to: Option<String>,
    /// Completion photo uploaded by the worker.
    pub completed_image_url: Option<String>,
    /// When the complaint was filed.
    pub created_at: DateTime<Utc>,
    /// When the complaint was last modified.
    pub updated_at: DateTime<Utc>,
}

impl Complaint {
    /// Builds a pending complaint from a submission with a fresh id.
    #[must_use]
    pub fn from_submission(
        new: NewComplaint,
        priority: ComplaintPriority,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: new.user_id,
            category: new.category,
            description: new.description,
            priority,
            status: ComplaintStatus::Pending,
            location: new.location,
            image_url: new.image_url,
            video_url: new.video_url,
            media_urls: new.media_urls,
            assigned_to: None,
            completed_image_url: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Role of a portal user.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum UserRole {
    /// Files complaints
    Citizen,
    /// Resolves assigned tasks
    Worker,
    /// Approves, assigns and analyzes
    Admin,
}

/// Public profile of a portal user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// User identifier.
    pub id: String,
    /// Display name.
    pub full_name: String,
    /// Portal role.
    pub role: UserRole,
    /// Avatar image URL.
    pub avatar_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn submission() -> NewComplaint {
        NewComplaint {
            user_id: None,
            category: ComplaintCategory::WaterSupply,
            description: "pipe burst near school".to_string(),
            location: Location {
                lat: 12.97,
                lng: 77.59,
                address: "MG Road".to_string(),
            },
            image_url: None,
            video_url: None,
            media_urls: Vec::new(),
        }
    }

    #[test]
    fn wire_names_are_snake_case() {
        assert_eq!(ComplaintCategory::WaterSupply.to_string(), "water_supply");
        assert_eq!(ComplaintStatus::WaitingApproval.as_ref(), "waiting_approval");
        assert_eq!(
            ComplaintCategory::from_str("road_potholes").unwrap(),
            ComplaintCategory::RoadPotholes
        );
        assert_eq!(
            serde_json::to_string(&ComplaintPriority::High).unwrap(),
            "\"high\""
        );
    }

    #[test]
    fn priority_ordering() {
        assert!(ComplaintPriority::High > ComplaintPriority::Medium);
        assert!(ComplaintPriority::Medium > ComplaintPriority::Low);
    }

    #[test]
    fn only_resolved_is_closed() {
        for status in ComplaintStatus::all() {
            assert_eq!(status.is_open(), *status != ComplaintStatus::Resolved);
        }
    }

    #[test]
    fn every_category_has_an_authority() {
        for category in ComplaintCategory::all() {
            assert!(!category.authority().is_empty());
            assert!(!category.label().is_empty());
        }
    }

    #[test]
    fn from_submission_starts_pending() {
        let now = Utc::now();
        let complaint = Complaint::from_submission(submission(), ComplaintPriority::High, now);
        assert_eq!(complaint.status, ComplaintStatus::Pending);
        assert_eq!(complaint.priority, ComplaintPriority::High);
        assert!(complaint.assigned_to.is_none());
        assert_eq!(complaint.created_at, now);
        assert!(!complaint.id.is_empty());
    }
}
