//! API traits the audit is written against.

use async_trait::async_trait;

use sharesweep_common::{FileId, Result};

use crate::model::{ActivityRecord, DriveFile, Permission};

/// Parameters of an activity log query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityQuery {
    /// Maximum number of activities to return.
    pub page_size: u32,
    /// Filter expression, e.g. `time > 1700000000000`.
    pub filter: String,
}

impl ActivityQuery {
    /// Query for activities strictly after the given epoch milliseconds.
    pub fn since_millis(millis: i64, page_size: u32) -> Self {
        Self {
            page_size,
            filter: format!("time > {}", millis),
        }
    }
}

/// Source of account activity records.
#[async_trait]
pub trait ActivityLog: Send + Sync {
    /// Run a single activity query.
    ///
    /// # Postconditions
    /// - Returns at most `query.page_size` records, in the order the log
    ///   reports them; an empty log yields an empty vector
    ///
    /// # Errors
    /// - Network/authentication errors
    async fn query_activity(&self, query: &ActivityQuery) -> Result<Vec<ActivityRecord>>;
}

/// File metadata and sharing operations.
///
/// Implementations must handle their own authentication.
#[async_trait]
pub trait FilePermissions: Send + Sync {
    /// List every permission on a file, in API order.
    ///
    /// # Errors
    /// - File not found
    /// - Network/authentication errors
    async fn list_permissions(&self, file_id: &FileId) -> Result<Vec<Permission>>;

    /// Get file metadata (name and MIME type).
    async fn get_file(&self, file_id: &FileId) -> Result<DriveFile>;

    /// Delete one permission from a file.
    ///
    /// # Errors
    /// - Permission or file not found
    /// - Caller not allowed to change sharing
    async fn delete_permission(&self, file_id: &FileId, permission_id: &str) -> Result<()>;
}
