//! In-memory Drive for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use sharesweep_common::{Error, FileId, Result};

use crate::model::{ActivityRecord, DriveFile, Permission};
use crate::provider::{ActivityLog, ActivityQuery, FilePermissions};

/// A call received by [`MemoryDrive`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriveCall {
    QueryActivity { page_size: u32, filter: String },
    ListPermissions(FileId),
    GetFile(FileId),
    DeletePermission { file_id: FileId, permission_id: String },
}

/// In-memory file entry.
#[derive(Debug, Clone)]
struct Entry {
    file: DriveFile,
    permissions: Vec<Permission>,
}

/// In-memory Drive implementing both API traits.
///
/// Records every call so tests can assert on exactly which requests an
/// audit issued. All state is lost on drop.
pub struct MemoryDrive {
    activities: RwLock<Vec<ActivityRecord>>,
    files: RwLock<HashMap<FileId, Entry>>,
    calls: RwLock<Vec<DriveCall>>,
    activity_failure: RwLock<Option<String>>,
}

impl MemoryDrive {
    /// Create an empty drive with no activity.
    pub fn new() -> Self {
        Self {
            activities: RwLock::new(Vec::new()),
            files: RwLock::new(HashMap::new()),
            calls: RwLock::new(Vec::new()),
            activity_failure: RwLock::new(None),
        }
    }

    /// Replace the activity feed.
    pub async fn set_activities(&self, activities: Vec<ActivityRecord>) {
        *self.activities.write().await = activities;
    }

    /// Add (or replace) a file with its permissions.
    pub async fn add_file(&self, id: FileId, name: &str, permissions: Vec<Permission>) {
        let file = DriveFile {
            id: id.as_str().to_string(),
            name: name.to_string(),
        };
        self.files
            .write()
            .await
            .insert(id, Entry { file, permissions });
    }

    /// Make every subsequent activity query fail with a network error.
    pub async fn fail_activity_queries(&self, message: &str) {
        *self.activity_failure.write().await = Some(message.to_string());
    }

    /// Current permissions on a file.
    pub async fn permissions(&self, id: &FileId) -> Option<Vec<Permission>> {
        self.files
            .read()
            .await
            .get(id)
            .map(|entry| entry.permissions.clone())
    }

    /// Every call received so far, in order.
    pub async fn calls(&self) -> Vec<DriveCall> {
        self.calls.read().await.clone()
    }

    /// Only the permission deletions received so far.
    pub async fn deletions(&self) -> Vec<(FileId, String)> {
        self.calls
            .read()
            .await
            .iter()
            .filter_map(|call| match call {
                DriveCall::DeletePermission {
                    file_id,
                    permission_id,
                } => Some((file_id.clone(), permission_id.clone())),
                _ => None,
            })
            .collect()
    }

    async fn record(&self, call: DriveCall) {
        self.calls.write().await.push(call);
    }
}

impl Default for MemoryDrive {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ActivityLog for MemoryDrive {
    async fn query_activity(&self, query: &ActivityQuery) -> Result<Vec<ActivityRecord>> {
        self.record(DriveCall::QueryActivity {
            page_size: query.page_size,
            filter: query.filter.clone(),
        })
        .await;

        if let Some(message) = self.activity_failure.read().await.as_ref() {
            return Err(Error::Network(message.clone()));
        }

        let activities = self.activities.read().await;
        Ok(activities
            .iter()
            .take(query.page_size as usize)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl FilePermissions for MemoryDrive {
    async fn list_permissions(&self, file_id: &FileId) -> Result<Vec<Permission>> {
        self.record(DriveCall::ListPermissions(file_id.clone())).await;

        self.permissions(file_id)
            .await
            .ok_or_else(|| Error::NotFound(format!("File not found: {}", file_id)))
    }

    async fn get_file(&self, file_id: &FileId) -> Result<DriveFile> {
        self.record(DriveCall::GetFile(file_id.clone())).await;

        self.files
            .read()
            .await
            .get(file_id)
            .map(|entry| entry.file.clone())
            .ok_or_else(|| Error::NotFound(format!("File not found: {}", file_id)))
    }

    async fn delete_permission(&self, file_id: &FileId, permission_id: &str) -> Result<()> {
        self.record(DriveCall::DeletePermission {
            file_id: file_id.clone(),
            permission_id: permission_id.to_string(),
        })
        .await;

        let mut files = self.files.write().await;
        let entry = files
            .get_mut(file_id)
            .ok_or_else(|| Error::NotFound(format!("File not found: {}", file_id)))?;

        let before = entry.permissions.len();
        entry.permissions.retain(|p| p.id != permission_id);

        if entry.permissions.len() == before {
            return Err(Error::NotFound(format!(
                "Permission {} not found on {}",
                permission_id, file_id
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PermissionKind;

    fn permission(id: &str, kind: PermissionKind) -> Permission {
        Permission {
            id: id.to_string(),
            kind,
            role: "reader".to_string(),
            domain: None,
            email_address: None,
        }
    }

    #[tokio::test]
    async fn test_delete_permission_removes_grant() {
        let drive = MemoryDrive::new();
        let id = FileId::new("f1").unwrap();
        drive
            .add_file(
                id.clone(),
                "a.txt",
                vec![
                    permission("u1", PermissionKind::User),
                    permission("anyoneWithLink", PermissionKind::Anyone),
                ],
            )
            .await;

        drive.delete_permission(&id, "anyoneWithLink").await.unwrap();

        let remaining = drive.permissions(&id).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, "u1");
        assert_eq!(
            drive.deletions().await,
            vec![(id, "anyoneWithLink".to_string())]
        );
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let drive = MemoryDrive::new();
        let id = FileId::new("nope").unwrap();

        let result = drive.get_file(&id).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
        assert_eq!(drive.calls().await, vec![DriveCall::GetFile(id)]);
    }

    #[tokio::test]
    async fn test_activity_query_respects_page_size() {
        let drive = MemoryDrive::new();
        drive
            .set_activities(vec![ActivityRecord::default(); 15])
            .await;

        let records = drive
            .query_activity(&ActivityQuery::since_millis(0, 10))
            .await
            .unwrap();
        assert_eq!(records.len(), 10);
    }

    #[tokio::test]
    async fn test_activity_failure() {
        let drive = MemoryDrive::new();
        drive.fail_activity_queries("boom").await;

        let result = drive
            .query_activity(&ActivityQuery::since_millis(0, 10))
            .await;
        assert!(matches!(result, Err(Error::Network(_))));
    }
}
