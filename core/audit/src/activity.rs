//! Classification of raw activity records.

use serde_json::{Map, Value};
use std::fmt;

use sharesweep_common::FileId;
use sharesweep_drive::{ActivityRecord, Target};

/// Length of the resource-name prefix in front of a file ID (`items/`).
pub const ITEM_NAME_PREFIX_LEN: usize = 6;

/// Kind of action an activity record describes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Create,
    Edit,
    Move,
    Rename,
    Delete,
    Restore,
    /// Any other action the log reports (`permissionChange`, `comment`, ...).
    Other(String),
    /// The action detail carried no key.
    Unknown,
}

impl ActionKind {
    /// Parse the action from the key present in an action-detail object.
    pub fn from_detail(detail: &Map<String, Value>) -> Self {
        match detail.keys().next() {
            Some(key) => Self::from_key(key),
            None => Self::Unknown,
        }
    }

    fn from_key(key: &str) -> Self {
        match key {
            "create" => Self::Create,
            "edit" => Self::Edit,
            "move" => Self::Move,
            "rename" => Self::Rename,
            "delete" => Self::Delete,
            "restore" => Self::Restore,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Edit => write!(f, "edit"),
            Self::Move => write!(f, "move"),
            Self::Rename => write!(f, "rename"),
            Self::Delete => write!(f, "delete"),
            Self::Restore => write!(f, "restore"),
            Self::Other(name) => write!(f, "{}", name),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// File ID referenced by a target, if it names a drive item.
///
/// The ID is the item name with its fixed prefix stripped; a missing name
/// or nothing after the prefix yields `None`.
pub fn target_file_id(target: &Target) -> Option<FileId> {
    let name = target.drive_item.as_ref()?.name.as_deref()?;
    let (offset, _) = name.char_indices().nth(ITEM_NAME_PREFIX_LEN)?;
    FileId::new(&name[offset..]).ok()
}

/// An activity record with its action and file ID resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedActivity {
    pub action: ActionKind,
    pub file_id: Option<FileId>,
    pub record: ActivityRecord,
}

impl ClassifiedActivity {
    /// Classify a record using its primary (first) target.
    pub fn classify(record: ActivityRecord) -> Self {
        let action = ActionKind::from_detail(&record.primary_action_detail);
        let file_id = record.primary_target().and_then(target_file_id);

        Self {
            action,
            file_id,
            record,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sharesweep_drive::DriveItem;

    fn detail(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    fn item_target(name: Option<&str>) -> Target {
        Target {
            drive_item: Some(DriveItem {
                name: name.map(str::to_string),
                file: Some(json!({})),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_action_kinds() {
        let kind = |value| ActionKind::from_detail(&detail(value));

        assert_eq!(kind(json!({"create": {"new": {}}})), ActionKind::Create);
        assert_eq!(kind(json!({"edit": {}})), ActionKind::Edit);
        assert_eq!(kind(json!({"move": {}})), ActionKind::Move);
        assert_eq!(kind(json!({"rename": {}})), ActionKind::Rename);
        assert_eq!(kind(json!({"delete": {}})), ActionKind::Delete);
        assert_eq!(kind(json!({"restore": {}})), ActionKind::Restore);
        assert_eq!(
            ActionKind::from_detail(&detail(json!({"permissionChange": {}}))),
            ActionKind::Other("permissionChange".to_string())
        );
        assert_eq!(ActionKind::from_detail(&Map::new()), ActionKind::Unknown);
    }

    #[test]
    fn test_action_display() {
        assert_eq!(ActionKind::Create.to_string(), "create");
        assert_eq!(ActionKind::Other("comment".to_string()).to_string(), "comment");
    }

    #[test]
    fn test_target_file_id_strips_prefix() {
        let id = target_file_id(&item_target(Some("items/ABC123"))).unwrap();
        assert_eq!(id.as_str(), "ABC123");

        let id = target_file_id(&item_target(Some("files/ABC123"))).unwrap();
        assert_eq!(id.as_str(), "ABC123");
    }

    #[test]
    fn test_target_file_id_absent() {
        assert_eq!(target_file_id(&item_target(None)), None);
        assert_eq!(target_file_id(&item_target(Some("items/"))), None);
        assert_eq!(target_file_id(&item_target(Some("abc"))), None);

        let drive_target = Target {
            drive: Some(json!({"name": "drives/0A"})),
            ..Default::default()
        };
        assert_eq!(target_file_id(&drive_target), None);
    }

    #[test]
    fn test_classify_uses_first_target() {
        let record = ActivityRecord {
            primary_action_detail: detail(json!({"create": {}})),
            targets: vec![item_target(Some("items/first")), item_target(Some("items/second"))],
            timestamp: None,
        };

        let classified = ClassifiedActivity::classify(record);
        assert_eq!(classified.action, ActionKind::Create);
        assert_eq!(classified.file_id.unwrap().as_str(), "first");
    }

    #[test]
    fn test_classify_without_targets() {
        let record = ActivityRecord {
            primary_action_detail: detail(json!({"create": {}})),
            ..Default::default()
        };

        let classified = ClassifiedActivity::classify(record);
        assert_eq!(classified.action, ActionKind::Create);
        assert!(classified.file_id.is_none());
    }
}
