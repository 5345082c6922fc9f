//! Run-scoped index of file creations.

use std::collections::HashMap;
use tracing::debug;

use sharesweep_common::FileId;
use sharesweep_drive::ActivityRecord;

use crate::activity::{ActionKind, ClassifiedActivity};

/// Mapping from file ID to the creation activity that produced it.
///
/// Iterates in first-insertion order of each file ID. A later creation of
/// the same ID replaces the earlier record in place. Creations whose target
/// could not be resolved to a file ID are kept separately, in scan order,
/// instead of sharing one key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreationIndex {
    entries: Vec<(FileId, ActivityRecord)>,
    positions: HashMap<FileId, usize>,
    unresolved: Vec<ActivityRecord>,
}

impl CreationIndex {
    /// Build the index from one batch of activity records.
    ///
    /// Returns `None` for an empty batch: there is nothing to audit.
    pub fn build(activities: Vec<ActivityRecord>) -> Option<Self> {
        if activities.is_empty() {
            return None;
        }

        let mut index = Self::default();
        for record in activities {
            let activity = ClassifiedActivity::classify(record);
            if activity.action == ActionKind::Create {
                index.insert(activity.file_id, activity.record);
            } else {
                debug!("Ignoring {} activity", activity.action);
            }
        }

        Some(index)
    }

    fn insert(&mut self, file_id: Option<FileId>, record: ActivityRecord) {
        let Some(file_id) = file_id else {
            self.unresolved.push(record);
            return;
        };

        match self.positions.get(&file_id) {
            Some(&position) => self.entries[position].1 = record,
            None => {
                self.positions.insert(file_id.clone(), self.entries.len());
                self.entries.push((file_id, record));
            }
        }
    }

    /// Creation record for a file.
    pub fn get(&self, file_id: &FileId) -> Option<&ActivityRecord> {
        self.positions
            .get(file_id)
            .map(|&position| &self.entries[position].1)
    }

    /// Number of distinct file IDs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no creation was recorded at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.unresolved.is_empty()
    }

    /// Creations whose target had no resolvable file ID.
    pub fn unresolved(&self) -> &[ActivityRecord] {
        &self.unresolved
    }

    /// Resolved entries in index order, followed by unresolved ones.
    pub fn iter(&self) -> impl Iterator<Item = (Option<&FileId>, &ActivityRecord)> {
        self.entries
            .iter()
            .map(|(id, record)| (Some(id), record))
            .chain(self.unresolved.iter().map(|record| (None, record)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;
    use serde_json::{json, Map, Value};
    use sharesweep_drive::{DriveItem, Target};

    fn record(action: &str, name: Option<&str>) -> ActivityRecord {
        let mut detail = Map::new();
        detail.insert(action.to_string(), json!({}));
        ActivityRecord {
            primary_action_detail: detail,
            targets: vec![Target {
                drive_item: Some(DriveItem {
                    name: name.map(str::to_string),
                    file: Some(Value::Object(Map::new())),
                    ..Default::default()
                }),
                ..Default::default()
            }],
            timestamp: None,
        }
    }

    fn id(value: &str) -> FileId {
        FileId::new(value).unwrap()
    }

    #[test]
    fn test_empty_batch_is_none() {
        assert!(CreationIndex::build(Vec::new()).is_none());
    }

    #[test]
    fn test_single_creation() {
        let create = record("create", Some("files/ABC123"));
        let index = CreationIndex::build(vec![create.clone()]).unwrap();

        assert_eq!(index.len(), 1);
        assert_eq!(index.get(&id("ABC123")), Some(&create));
    }

    #[test]
    fn test_non_create_actions_are_dropped() {
        let index = CreationIndex::build(vec![
            record("edit", Some("items/A")),
            record("rename", Some("items/B")),
        ])
        .unwrap();

        assert!(index.is_empty());
        assert_eq!(index.iter().count(), 0);
    }

    #[test]
    fn test_later_creation_wins_but_keeps_position() {
        let mut first = record("create", Some("items/A"));
        first.timestamp = Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        let mut second = record("create", Some("items/A"));
        second.timestamp = Some(Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap());

        let index = CreationIndex::build(vec![
            first,
            record("create", Some("items/B")),
            second.clone(),
        ])
        .unwrap();

        let ids: Vec<_> = index.iter().filter_map(|(id, _)| id.cloned()).collect();
        assert_eq!(ids, vec![id("A"), id("B")]);
        assert_eq!(index.get(&id("A")), Some(&second));
    }

    #[test]
    fn test_unresolved_creations_do_not_collide() {
        let index = CreationIndex::build(vec![
            record("create", None),
            record("create", Some("items/")),
            record("create", Some("items/A")),
        ])
        .unwrap();

        assert_eq!(index.len(), 1);
        assert_eq!(index.unresolved().len(), 2);

        let keys: Vec<_> = index.iter().map(|(id, _)| id.cloned()).collect();
        assert_eq!(keys, vec![Some(id("A")), None, None]);
    }

    fn action_strategy() -> impl Strategy<Value = &'static str> {
        prop_oneof![
            Just("create"),
            Just("edit"),
            Just("move"),
            Just("rename"),
            Just("delete"),
            Just("restore"),
            Just("comment"),
        ]
    }

    proptest! {
        #[test]
        fn index_holds_only_creations(
            batch in prop::collection::vec((action_strategy(), "[a-c]{1,2}"), 1..20)
        ) {
            let records: Vec<_> = batch
                .iter()
                .map(|(action, name)| record(action, Some(&format!("items/{}", name))))
                .collect();
            let index = CreationIndex::build(records).unwrap();

            for (_, entry) in index.iter() {
                prop_assert!(entry.primary_action_detail.contains_key("create"));
            }

            let mut expected: Vec<&str> = Vec::new();
            for (action, name) in &batch {
                if *action == "create" && !expected.contains(&name.as_str()) {
                    expected.push(name);
                }
            }
            let ids: Vec<String> = index
                .iter()
                .filter_map(|(id, _)| id.map(|id| id.as_str().to_string()))
                .collect();
            prop_assert_eq!(ids, expected);
        }
    }
}
