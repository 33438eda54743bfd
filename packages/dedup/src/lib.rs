#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Near-duplicate detection for new complaints.
//!
//! A new complaint is a probable duplicate of an open complaint in the
//! same category when their raw `(lat, lng)` pairs are closer than
//! [`DUPLICATE_THRESHOLD_DEGREES`] in plain Euclidean distance. This is
//! not a geodesic distance: 0.001 degrees is about 100 m at the equator
//! and the east-west extent shrinks with latitude.
//!
//! Detection is advisory. A failed store query is logged and reported as
//! "no duplicate"; it never blocks a submission.

use grievance_complaint_models::{Complaint, ComplaintCategory, ComplaintStatus};
use grievance_store::ComplaintStore;

/// Maximum planar distance, in degrees, for two complaints to be
/// considered the same issue.
pub const DUPLICATE_THRESHOLD_DEGREES: f64 = 0.001;

/// An open complaint that a new submission probably duplicates.
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateMatch {
    /// Id of the existing complaint.
    pub complaint_id: String,
    /// Address of the existing complaint.
    pub address: String,
    /// Planar distance in degrees.
    pub distance: f64,
}

/// Euclidean distance between two `(lat, lng)` pairs in degree units.
#[must_use]
pub fn planar_distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    (lat1 - lat2).hypot(lng1 - lng2)
}

/// Returns the first candidate closer than the threshold to `(lat, lng)`.
#[must_use]
pub fn first_within_threshold(
    candidates: &[Complaint],
    lat: f64,
    lng: f64,
) -> Option<DuplicateMatch> {
    candidates.iter().find_map(|c| {
        let distance = planar_distance(lat, lng, c.location.lat, c.location.lng);
        (distance < DUPLICATE_THRESHOLD_DEGREES).then(|| DuplicateMatch {
            complaint_id: c.id.clone(),
            address: c.location.address.clone(),
            distance,
        })
    })
}

/// Looks for an unresolved complaint of the same category near
/// `(lat, lng)`.
///
/// Never fails: store errors are logged and treated as no match.
pub async fn find_duplicate(
    store: &dyn ComplaintStore,
    lat: f64,
    lng: f64,
    category: ComplaintCategory,
) -> Option<DuplicateMatch> {
    let candidates = match store
        .by_category_excluding_status(category, ComplaintStatus::Resolved)
        .await
    {
        Ok(candidates) => candidates,
        Err(e) => {
            log::warn!("Duplicate check skipped, could not query open {category} complaints: {e}");
            return None;
        }
    };

    let found = first_within_threshold(&candidates, lat, lng);
    if let Some(m) = &found {
        log::info!(
            "Possible duplicate of complaint {} at {} ({:.5} deg away)",
            m.complaint_id,
            m.address,
            m.distance
        );
    }
    found
}
