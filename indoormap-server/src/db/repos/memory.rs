//! In-memory store
//!
//! Implements both store traits over one mutex-guarded state. Writes that
//! touch more than one row run on a copy of the state which only replaces
//! the live one when every step succeeded, so a failed write is never
//! partially visible. Failure switches let tests exercise rollback paths.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{BuildingStore, DbError, IssueStore};
use crate::models::{
    Building, BuildingDoc, CategoryFilter, ImageUpload, Issue, IssueImage, IssuePatch, NewIssue,
};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    buildings: Vec<Building>,
    issues: BTreeMap<i32, Issue>,
    images: Vec<IssueImage>,
    categories: Vec<(i32, String)>,
    last_issue_id: i32,
    last_image_id: i32,
}

impl MemoryState {
    fn insert_issue(&mut self, issue: NewIssue) -> Issue {
        self.last_issue_id += 1;
        let row = Issue {
            issue_id: self.last_issue_id,
            avoid_polygon: issue.avoid_polygon,
            location: issue.location,
            latitude: issue.latitude,
            longitude: issue.longitude,
            description: issue.description,
            status: issue.status,
            datetime_open: issue.datetime_open,
            datetime_closed: issue.datetime_closed,
            datetime_permanent: issue.datetime_permanent,
            votes: issue.votes,
        };
        self.issues.insert(row.issue_id, row.clone());
        row
    }

    fn insert_image(&mut self, issue_id: i32, image: &ImageUpload) -> Result<(), DbError> {
        if !self.issues.contains_key(&issue_id) {
            return Err(DbError::Unavailable(format!(
                "issue {} does not exist for image",
                issue_id
            )));
        }
        self.last_image_id += 1;
        self.images.push(IssueImage {
            image_id: self.last_image_id,
            issue_id,
            image: image.to_base64(),
        });
        Ok(())
    }
}

/// In-memory implementation of [`BuildingStore`] and [`IssueStore`]
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    fail_writes: AtomicBool,
    fail_image_inserts: AtomicBool,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write fail before touching any row.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make the image insert of issue creation fail after the issue row
    /// was written inside the transaction.
    pub fn set_fail_image_inserts(&self, fail: bool) {
        self.fail_image_inserts.store(fail, Ordering::SeqCst);
    }

    /// Tag an issue with a category.
    pub async fn tag_issue(&self, issue_id: i32, category: &str) {
        self.state
            .lock()
            .await
            .categories
            .push((issue_id, category.to_owned()));
    }

    pub async fn issue_count(&self) -> usize {
        self.state.lock().await.issues.len()
    }

    pub async fn building_count(&self) -> usize {
        self.state.lock().await.buildings.len()
    }

    pub async fn images_for(&self, issue_id: i32) -> Vec<IssueImage> {
        self.state
            .lock()
            .await
            .images
            .iter()
            .filter(|img| img.issue_id == issue_id)
            .cloned()
            .collect()
    }

    /// Report the store as offline: pings and writes fail.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), DbError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DbError::Unavailable("store offline".into()));
        }
        Ok(())
    }

    fn check_writable(&self) -> Result<(), DbError> {
        self.check_available()?;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DbError::Unavailable("writes disabled".into()));
        }
        Ok(())
    }

    /// Run `body` on a copy of the state and publish it only on success.
    async fn transaction<T>(
        &self,
        operation: &'static str,
        body: impl FnOnce(&mut MemoryState) -> Result<T, DbError>,
    ) -> Result<T, DbError> {
        let mut state = self.state.lock().await;
        let mut working = state.clone();

        match body(&mut working) {
            Ok(value) => {
                *state = working;
                Ok(value)
            }
            Err(err) => {
                tracing::warn!(operation, error = %err, "rolling back transaction");
                Err(DbError::write_failed(operation, err))
            }
        }
    }
}

#[async_trait]
impl BuildingStore for MemoryStore {
    async fn ping(&self) -> Result<(), DbError> {
        self.check_available()
    }

    async fn list(&self) -> Result<Vec<Building>, DbError> {
        Ok(self.state.lock().await.buildings.clone())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Building>, DbError> {
        let state = self.state.lock().await;
        Ok(state.buildings.iter().find(|b| b.id == id).cloned())
    }

    async fn create(&self, doc: BuildingDoc) -> Result<Building, DbError> {
        self.check_writable()?;
        let building = Building {
            id: Uuid::new_v4(),
            doc,
        };
        self.state.lock().await.buildings.push(building.clone());
        Ok(building)
    }

    async fn create_many(&self, docs: Vec<BuildingDoc>) -> Result<Vec<Building>, DbError> {
        self.check_writable()?;
        self.transaction("insert buildings", |state| {
            let created: Vec<Building> = docs
                .into_iter()
                .map(|doc| Building {
                    id: Uuid::new_v4(),
                    doc,
                })
                .collect();
            state.buildings.extend(created.iter().cloned());
            Ok(created)
        })
        .await
    }

    async fn update(&self, id: Uuid, patch: BuildingDoc) -> Result<Option<Building>, DbError> {
        self.check_writable()?;
        let mut state = self.state.lock().await;
        Ok(state.buildings.iter_mut().find(|b| b.id == id).map(|b| {
            b.doc.merge(&patch);
            b.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Building>, DbError> {
        self.check_writable()?;
        let mut state = self.state.lock().await;
        let position = state.buildings.iter().position(|b| b.id == id);
        Ok(position.map(|i| state.buildings.remove(i)))
    }
}

#[async_trait]
impl IssueStore for MemoryStore {
    async fn ping(&self) -> Result<(), DbError> {
        self.check_available()
    }

    async fn list(&self) -> Result<Vec<Issue>, DbError> {
        Ok(self.state.lock().await.issues.values().cloned().collect())
    }

    async fn list_by_categories(&self, filter: &CategoryFilter) -> Result<Vec<Issue>, DbError> {
        let state = self.state.lock().await;
        Ok(state
            .categories
            .iter()
            .filter(|(_, category)| filter.contains(category))
            .filter_map(|(issue_id, _)| state.issues.get(issue_id).cloned())
            .collect())
    }

    async fn get(&self, id: i32) -> Result<Option<Issue>, DbError> {
        Ok(self.state.lock().await.issues.get(&id).cloned())
    }

    async fn create(&self, issue: NewIssue, image: Option<ImageUpload>) -> Result<Issue, DbError> {
        self.check_writable()?;
        let fail_image = self.fail_image_inserts.load(Ordering::SeqCst);

        self.transaction("create issue", |state| {
            let created = state.insert_issue(issue);
            if let Some(image) = &image {
                if fail_image {
                    return Err(DbError::Unavailable("image insert rejected".into()));
                }
                state.insert_image(created.issue_id, image)?;
            }
            Ok(created)
        })
        .await
    }

    async fn update(&self, id: i32, patch: &IssuePatch) -> Result<Option<Issue>, DbError> {
        self.check_writable()?;
        let mut state = self.state.lock().await;
        Ok(state.issues.get_mut(&id).map(|issue| {
            patch.apply_to(issue);
            issue.clone()
        }))
    }

    async fn delete(&self, id: i32) -> Result<Option<Issue>, DbError> {
        self.check_writable()?;
        self.transaction("delete issue", |state| {
            let removed = state.issues.remove(&id);
            if removed.is_some() {
                state.images.retain(|img| img.issue_id != id);
                state.categories.retain(|(issue_id, _)| *issue_id != id);
            }
            Ok(removed)
        })
        .await
    }
}
