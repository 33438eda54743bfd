#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregate views over filed complaints.
//!
//! All functions are pure over a complaint slice so they work the same on
//! a store listing or a realtime-updated cache.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Datelike, Utc};
use grievance_complaint_models::{
    Complaint, ComplaintCategory, ComplaintPriority, ComplaintStatus, Profile,
};
use serde::Serialize;

/// Number of citizens shown on the leaderboard.
pub const LEADERBOARD_SIZE: usize = 10;

/// Display name for leaderboard entries without a profile.
pub const FALLBACK_DISPLAY_NAME: &str = "Civic Hero";

/// Counts for the admin dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    /// All complaints.
    pub total: usize,
    /// Per status, every status present.
    pub by_status: BTreeMap<ComplaintStatus, usize>,
    /// Per priority, every priority present.
    pub by_priority: BTreeMap<ComplaintPriority, usize>,
    /// Per category, every category present.
    pub by_category: BTreeMap<ComplaintCategory, usize>,
}

/// Computes dashboard counts. Zero buckets are included.
#[must_use]
pub fn dashboard(complaints: &[Complaint]) -> DashboardStats {
    let mut by_status: BTreeMap<_, _> = ComplaintStatus::all().iter().map(|s| (*s, 0)).collect();
    let mut by_priority: BTreeMap<_, _> =
        ComplaintPriority::all().iter().map(|p| (*p, 0)).collect();
    let mut by_category: BTreeMap<_, _> =
        ComplaintCategory::all().iter().map(|c| (*c, 0)).collect();

    for c in complaints {
        *by_status.entry(c.status).or_default() += 1;
        *by_priority.entry(c.priority).or_default() += 1;
        *by_category.entry(c.category).or_default() += 1;
    }

    DashboardStats {
        total: complaints.len(),
        by_status,
        by_priority,
        by_category,
    }
}

/// Complaints matching optional status and category filters.
#[must_use]
pub fn filter(
    complaints: &[Complaint],
    status: Option<ComplaintStatus>,
    category: Option<ComplaintCategory>,
) -> Vec<&Complaint> {
    complaints
        .iter()
        .filter(|c| status.is_none_or(|s| c.status == s))
        .filter(|c| category.is_none_or(|cat| c.category == cat))
        .collect()
}

/// High-priority pending complaints nobody has been assigned to.
#[must_use]
pub fn urgent_unassigned(complaints: &[Complaint]) -> Vec<&Complaint> {
    complaints
        .iter()
        .filter(|c| {
            c.priority == ComplaintPriority::High
                && c.assigned_to.is_none()
                && c.status == ComplaintStatus::Pending
        })
        .collect()
}

/// Alert text for admins, `None` when nothing is urgent.
#[must_use]
pub fn urgent_alert(complaints: &[Complaint]) -> Option<String> {
    match urgent_unassigned(complaints).len() {
        0 => None,
        1 => Some(
            "There is 1 unassigned HIGH PRIORITY emergency complaint. \
             Please assign workers immediately."
                .to_string(),
        ),
        n => Some(format!(
            "There are {n} unassigned HIGH PRIORITY emergency complaints. \
             Please assign workers immediately."
        )),
    }
}

/// A row on the public billboard of outstanding complaints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillboardEntry {
    /// Complaint id.
    pub id: String,
    /// Category.
    pub category: ComplaintCategory,
    /// Responsible authority.
    pub authority: &'static str,
    /// Description.
    pub description: String,
    /// Address.
    pub address: String,
    /// Assigned worker, if any.
    pub assigned_to: Option<String>,
    /// When filed.
    pub created_at: DateTime<Utc>,
    /// Days since filing, counting a started day as a full one.
    pub days_open: u64,
}

const SECONDS_PER_DAY: u64 = 86_400;

/// Days between `created_at` and `now`, rounded up.
#[must_use]
pub fn days_pending(created_at: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    let secs = now.timestamp() - created_at.timestamp();
    secs.unsigned_abs().div_ceil(SECONDS_PER_DAY)
}

/// Unresolved complaints, oldest first, attributed to their authority.
#[must_use]
pub fn billboard(complaints: &[Complaint], now: DateTime<Utc>) -> Vec<BillboardEntry> {
    let mut open: Vec<&Complaint> = complaints.iter().filter(|c| c.status.is_open()).collect();
    open.sort_by_key(|c| c.created_at);

    open.into_iter()
        .map(|c| BillboardEntry {
            id: c.id.clone(),
            category: c.category,
            authority: c.category.authority(),
            description: c.description.clone(),
            address: c.location.address.clone(),
            assigned_to: c.assigned_to.clone(),
            created_at: c.created_at,
            days_open: days_pending(c.created_at, now),
        })
        .collect()
}

/// A citizen's standing for the current quarter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    /// User id.
    pub user_id: String,
    /// Display name.
    pub full_name: String,
    /// Avatar URL.
    pub avatar_url: Option<String>,
    /// Complaints filed this quarter.
    pub count: usize,
}

/// Calendar quarter label for `now`, e.g. `Q3 2026`.
#[must_use]
pub fn quarter_label(now: DateTime<Utc>) -> String {
    format!("Q{} {}", now.month0() / 3 + 1, now.year())
}

fn same_quarter(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    a.year() == b.year() && a.month0() / 3 == b.month0() / 3
}

/// Top citizens by complaints filed in the quarter containing `now`.
///
/// Anonymous complaints are ignored. Ties are broken by user id.
#[must_use]
pub fn leaderboard(
    complaints: &[Complaint],
    profiles: &[Profile],
    now: DateTime<Utc>,
) -> Vec<LeaderboardEntry> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for c in complaints {
        if let Some(user_id) = c.user_id.as_deref()
            && same_quarter(c.created_at, now)
        {
            *counts.entry(user_id).or_default() += 1;
        }
    }

    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked.truncate(LEADERBOARD_SIZE);

    let profiles: HashMap<&str, &Profile> = profiles.iter().map(|p| (p.id.as_str(), p)).collect();

    ranked
        .into_iter()
        .map(|(user_id, count)| {
            let profile = profiles.get(user_id);
            LeaderboardEntry {
                user_id: user_id.to_string(),
                full_name: profile.map_or_else(
                    || FALLBACK_DISPLAY_NAME.to_string(),
                    |p| p.full_name.clone(),
                ),
                avatar_url: profile.and_then(|p| p.avatar_url.clone()),
                count,
            }
        })
        .collect()
}
