//! In-process store with a broadcast change feed.
//!
//! State can be loaded from and saved to a JSON snapshot so the CLI keeps
//! complaints between runs.

use std::collections::BTreeMap;
use std::path::Path;

use grievance_complaint_models::{Complaint, ComplaintCategory, ComplaintStatus, Profile};
use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, broadcast};

use crate::{ChangeEvent, ComplaintStore, ProfileStore, StoreError};

/// Buffered change events per subscriber before lagging.
const CHANGE_FEED_CAPACITY: usize = 256;

/// On-disk snapshot layout.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    complaints: Vec<Complaint>,
    #[serde(default)]
    profiles: Vec<Profile>,
}

/// In-memory [`ComplaintStore`] and [`ProfileStore`].
pub struct MemoryStore {
    complaints: RwLock<BTreeMap<String, Complaint>>,
    profiles: RwLock<BTreeMap<String, Profile>>,
    changes: broadcast::Sender<ChangeEvent>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Self {
            complaints: RwLock::new(BTreeMap::new()),
            profiles: RwLock::new(BTreeMap::new()),
            changes,
        }
    }

    /// Subscribes to changes made after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.changes.subscribe()
    }

    /// Loads a store from a JSON snapshot. A missing file yields an empty
    /// store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file exists but cannot be read or
    /// parsed.
    pub async fn load(path: &Path) -> Result<Self, StoreError> {
        let store = Self::new();

        let contents = match tokio::fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No snapshot at {}, starting empty", path.display());
                return Ok(store);
            }
            Err(e) => return Err(e.into()),
        };

        let snapshot: Snapshot = serde_json::from_str(&contents)?;
        log::debug!(
            "Loaded {} complaints and {} profiles from {}",
            snapshot.complaints.len(),
            snapshot.profiles.len(),
            path.display()
        );

        {
            let mut complaints = store.complaints.write().await;
            for complaint in snapshot.complaints {
                complaints.insert(complaint.id.clone(), complaint);
            }
        }
        {
            let mut profiles = store.profiles.write().await;
            for profile in snapshot.profiles {
                profiles.insert(profile.id.clone(), profile);
            }
        }

        Ok(store)
    }

    /// Writes the current state to a JSON snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if serialization or the write fails.
    pub async fn save(&self, path: &Path) -> Result<(), StoreError> {
        let snapshot = Snapshot {
            complaints: sorted(self.complaints.read().await.values().cloned().collect()),
            profiles: self.profiles.read().await.values().cloned().collect(),
        };
        let json = serde_json::to_string_pretty(&snapshot)?;
        tokio::fs::write(path, json).await?;
        log::debug!(
            "Saved {} complaints to {}",
            snapshot.complaints.len(),
            path.display()
        );
        Ok(())
    }

    fn publish(&self, event: ChangeEvent) {
        log::debug!("Store change: {event:?}");
        // No subscribers is not an error.
        let _ = self.changes.send(event);
    }
}

fn sorted(mut complaints: Vec<Complaint>) -> Vec<Complaint> {
    complaints.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    complaints
}

#[async_trait::async_trait]
impl ComplaintStore for MemoryStore {
    async fn by_category_excluding_status(
        &self,
        category: ComplaintCategory,
        excluded: ComplaintStatus,
    ) -> Result<Vec<Complaint>, StoreError> {
        let complaints = self.complaints.read().await;
        Ok(sorted(
            complaints
                .values()
                .filter(|c| c.category == category && c.status != excluded)
                .cloned()
                .collect(),
        ))
    }

    async fn insert(&self, complaint: Complaint) -> Result<Complaint, StoreError> {
        {
            let mut complaints = self.complaints.write().await;
            if complaints.contains_key(&complaint.id) {
                return Err(StoreError::Conflict { id: complaint.id });
            }
            complaints.insert(complaint.id.clone(), complaint.clone());
        }
        self.publish(ChangeEvent::Inserted {
            complaint: complaint.clone(),
        });
        Ok(complaint)
    }

    async fn get(&self, id: &str) -> Result<Option<Complaint>, StoreError> {
        Ok(self.complaints.read().await.get(id).cloned())
    }

    async fn update(&self, complaint: Complaint) -> Result<Complaint, StoreError> {
        {
            let mut complaints = self.complaints.write().await;
            let Some(existing) = complaints.get_mut(&complaint.id) else {
                return Err(StoreError::NotFound { id: complaint.id });
            };
            *existing = complaint.clone();
        }
        self.publish(ChangeEvent::Updated {
            complaint: complaint.clone(),
        });
        Ok(complaint)
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        if self.complaints.write().await.remove(id).is_none() {
            return Err(StoreError::NotFound { id: id.to_string() });
        }
        self.publish(ChangeEvent::Deleted { id: id.to_string() });
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Complaint>, StoreError> {
        Ok(sorted(self.complaints.read().await.values().cloned().collect()))
    }
}

#[async_trait::async_trait]
impl ProfileStore for MemoryStore {
    async fn profiles(&self) -> Result<Vec<Profile>, StoreError> {
        Ok(self.profiles.read().await.values().cloned().collect())
    }

    async fn upsert_profile(&self, profile: Profile) -> Result<(), StoreError> {
        self.profiles
            .write()
            .await
            .insert(profile.id.clone(), profile);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use grievance_complaint_models::{ComplaintPriority, Location, NewComplaint, UserRole};

    use super::*;

    fn complaint(category: ComplaintCategory, minutes_ago: i64) -> Complaint {
        Complaint::from_submission(
            NewComplaint {
                user_id: Some("u1".to_string()),
                category,
                description: "test".to_string(),
                location: Location {
                    lat: 1.0,
                    lng: 2.0,
                    address: "Main St".to_string(),
                },
                image_url: None,
                video_url: None,
                media_urls: Vec::new(),
            },
            ComplaintPriority::Low,
            Utc::now() - Duration::minutes(minutes_ago),
        )
    }

    #[tokio::test]
    async fn filters_by_category_and_status() {
        let store = MemoryStore::new();
        let open = store
            .insert(complaint(ComplaintCategory::Drainage, 10))
            .await
            .unwrap();
        let mut resolved = complaint(ComplaintCategory::Drainage, 5);
        resolved.status = ComplaintStatus::Resolved;
        store.insert(resolved).await.unwrap();
        store
            .insert(complaint(ComplaintCategory::Sanitation, 1))
            .await
            .unwrap();

        let found = store
            .by_category_excluding_status(ComplaintCategory::Drainage, ComplaintStatus::Resolved)
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, open.id);
    }

    #[tokio::test]
    async fn list_is_oldest_first() {
        let store = MemoryStore::new();
        let newer = store
            .insert(complaint(ComplaintCategory::Drainage, 1))
            .await
            .unwrap();
        let older = store
            .insert(complaint(ComplaintCategory::Drainage, 60))
            .await
            .unwrap();

        let ids: Vec<_> = store.list().await.unwrap().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![older.id, newer.id]);
    }

    #[tokio::test]
    async fn duplicate_insert_conflicts() {
        let store = MemoryStore::new();
        let c = complaint(ComplaintCategory::Drainage, 0);
        store.insert(c.clone()).await.unwrap();
        assert!(matches!(
            store.insert(c).await,
            Err(StoreError::Conflict { .. })
        ));
    }

    #[tokio::test]
    async fn update_and_delete_unknown_ids() {
        let store = MemoryStore::new();
        let c = complaint(ComplaintCategory::Drainage, 0);
        assert!(matches!(
            store.update(c.clone()).await,
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(
            store.delete(&c.id).await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn publishes_changes() {
        let store = MemoryStore::new();
        let mut rx = store.subscribe();

        let mut c = store
            .insert(complaint(ComplaintCategory::Streetlight, 0))
            .await
            .unwrap();
        c.status = ComplaintStatus::InProgress;
        store.update(c.clone()).await.unwrap();
        store.delete(&c.id).await.unwrap();

        assert!(matches!(rx.recv().await.unwrap(), ChangeEvent::Inserted { .. }));
        match rx.recv().await.unwrap() {
            ChangeEvent::Updated { complaint } => {
                assert_eq!(complaint.status, ComplaintStatus::InProgress);
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(
            rx.recv().await.unwrap(),
            ChangeEvent::Deleted { id: c.id.clone() }
        );
    }

    #[tokio::test]
    async fn snapshot_roundtrip() {
        let path = std::env::temp_dir().join("grievance_store_snapshot_test.json");
        let _ = std::fs::remove_file(&path);

        let store = MemoryStore::load(&path).await.unwrap();
        assert!(store.list().await.unwrap().is_empty());

        let c = store
            .insert(complaint(ComplaintCategory::WaterSupply, 0))
            .await
            .unwrap();
        store
            .upsert_profile(Profile {
                id: "u1".to_string(),
                full_name: "Asha".to_string(),
                role: UserRole::Citizen,
                avatar_url: None,
            })
            .await
            .unwrap();
        store.save(&path).await.unwrap();

        let reloaded = MemoryStore::load(&path).await.unwrap();
        assert_eq!(reloaded.get(&c.id).await.unwrap(), Some(c));
        assert_eq!(reloaded.profiles().await.unwrap().len(), 1);

        let _ = std::fs::remove_file(&path);
    }
}
