//! Wire types for the Drive Activity v2 and Drive v3 APIs.
//!
//! Only the fields the audit reads are modelled; everything else in the
//! responses is ignored by serde.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Permission ID Google assigns to the "anyone with the link" grant.
pub const ANYONE_WITH_LINK: &str = "anyoneWithLink";

/// One entry of the activity feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    /// Action detail object; its single present key names the action kind.
    #[serde(default)]
    pub primary_action_detail: Map<String, Value>,
    /// Items the action was performed on.
    #[serde(default)]
    pub targets: Vec<Target>,
    /// When the action happened (absent for time-range activities).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl ActivityRecord {
    /// The first target, which the activity is primarily about.
    pub fn primary_target(&self) -> Option<&Target> {
        self.targets.first()
    }
}

/// Target of an activity: a drive item, a shared drive or a comment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drive_item: Option<DriveItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drive: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_comment: Option<Value>,
}

/// A file or folder referenced by an activity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveItem {
    /// Resource name, `items/<file id>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Present (possibly empty) when the item is a file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drive_file: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drive_folder: Option<Value>,
}

impl DriveItem {
    /// Check if the item carries a file-type descriptor.
    pub fn is_file(&self) -> bool {
        self.file.is_some() || self.drive_file.is_some()
    }

    /// Check if the item carries a folder-type descriptor.
    pub fn is_folder(&self) -> bool {
        self.folder.is_some() || self.drive_folder.is_some()
    }
}

/// Response body of `activity:query`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ActivityQueryResponse {
    #[serde(default)]
    pub activities: Vec<ActivityRecord>,
}

/// Grantee type of a permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionKind {
    User,
    Group,
    Domain,
    Anyone,
    #[serde(other)]
    Other,
}

/// One access grant on a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    /// Permission ID (`anyoneWithLink` for the public link grant).
    pub id: String,
    #[serde(rename = "type")]
    pub kind: PermissionKind,
    #[serde(default)]
    pub role: String,
    /// Domain name, set for domain grants.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
}

impl Permission {
    /// Check if this is the "anyone with the link" grant.
    pub fn is_anyone_with_link(&self) -> bool {
        self.id == ANYONE_WITH_LINK
    }
}

/// Response from listing permissions.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PermissionListResponse {
    #[serde(default)]
    pub permissions: Vec<Permission>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Google Drive file metadata from API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_record_from_api_json() {
        let json = r#"{
            "primaryActionDetail": {"create": {"new": {}}},
            "actors": [{"user": {"knownUser": {"personName": "people/1"}}}],
            "targets": [{
                "driveItem": {
                    "name": "items/ABC123",
                    "title": "report.pdf",
                    "file": {},
                    "mimeType": "application/pdf",
                    "owner": {"user": {"knownUser": {"isCurrentUser": true}}}
                }
            }],
            "timestamp": "2024-03-10T11:59:01.123Z"
        }"#;

        let record: ActivityRecord = serde_json::from_str(json).unwrap();
        assert!(record.primary_action_detail.contains_key("create"));
        let item = record.primary_target().unwrap().drive_item.as_ref().unwrap();
        assert_eq!(item.name.as_deref(), Some("items/ABC123"));
        assert!(item.is_file());
        assert!(record.timestamp.is_some());
    }

    #[test]
    fn test_folder_item_is_not_file() {
        let json = r#"{"name": "items/F1", "folder": {"type": "STANDARD_FOLDER"}}"#;
        let item: DriveItem = serde_json::from_str(json).unwrap();
        assert!(!item.is_file());
    }

    #[test]
    fn test_query_response_without_activities() {
        let response: ActivityQueryResponse = serde_json::from_str("{}").unwrap();
        assert!(response.activities.is_empty());
    }

    #[test]
    fn test_permission_kinds() {
        let json = r#"{"permissions": [
            {"id": "u1", "type": "user", "role": "reader", "emailAddress": "a@example.com"},
            {"id": "g1", "type": "group", "role": "writer"},
            {"id": "d1", "type": "domain", "role": "reader", "domain": "example.com"},
            {"id": "anyoneWithLink", "type": "anyone", "role": "reader"},
            {"id": "x", "type": "somethingNew", "role": "reader"}
        ]}"#;

        let list: PermissionListResponse = serde_json::from_str(json).unwrap();
        let kinds: Vec<_> = list.permissions.iter().map(|p| p.kind).collect();
        assert_eq!(
            kinds,
            vec![
                PermissionKind::User,
                PermissionKind::Group,
                PermissionKind::Domain,
                PermissionKind::Anyone,
                PermissionKind::Other,
            ]
        );
        assert_eq!(list.permissions[2].domain.as_deref(), Some("example.com"));
        assert!(list.permissions[3].is_anyone_with_link());
        assert!(list.next_page_token.is_none());
    }

    #[test]
    fn test_drive_folder_alias() {
        let item: DriveItem =
            serde_json::from_str(r#"{"name": "items/F2", "driveFolder": {}}"#).unwrap();
        assert!(item.is_folder());
        assert!(!item.is_file());
    }

    #[test]
    fn test_drive_file_ignores_extra_fields() {
        let file: DriveFile =
            serde_json::from_str(r#"{"id": "2", "name": "a.txt", "mimeType": "text/plain"}"#)
                .unwrap();
        assert_eq!(file.name, "a.txt");
    }
}
