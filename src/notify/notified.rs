use crate::notify::types::NotificationRecord;
use crate::retention::ExpirationStatus;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};

/// Files already covered by an alert this session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotifiedSet {
    records: BTreeMap<String, ExpirationStatus>,
}

/// Accepts the current record list and the older bare id list
#[derive(Deserialize)]
#[serde(untagged)]
enum Persisted {
    Records(Vec<NotificationRecord>),
    Ids(Vec<String>),
}

impl NotifiedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, file_id: &str) -> bool {
        self.records.contains_key(file_id)
    }

    pub fn status_of(&self, file_id: &str) -> Option<ExpirationStatus> {
        self.records.get(file_id).copied()
    }

    /// Insert, or escalate the stored status if `record` is more severe
    pub fn merge(&mut self, record: NotificationRecord) {
        self.records
            .entry(record.file_id)
            .and_modify(|status| {
                if record.last_notified_status > *status {
                    *status = record.last_notified_status;
                }
            })
            .or_insert(record.last_notified_status);
    }

    /// Drop ids not in `current`. Returns how many were removed.
    pub fn prune(&mut self, current: &HashSet<&str>) -> usize {
        let before = self.records.len();
        self.records.retain(|id, _| current.contains(id.as_str()));
        before - self.records.len()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn records(&self) -> Vec<NotificationRecord> {
        self.records
            .iter()
            .map(|(id, status)| NotificationRecord::new(id.clone(), *status))
            .collect()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.records())
    }

    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        let mut set = Self::new();
        match serde_json::from_str::<Persisted>(raw)? {
            Persisted::Records(records) => records.into_iter().for_each(|r| set.merge(r)),
            Persisted::Ids(ids) => ids
                .into_iter()
                .for_each(|id| set.merge(NotificationRecord::new(id, ExpirationStatus::Warning))),
        }
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_escalates_only() {
        let mut set = NotifiedSet::new();
        set.merge(NotificationRecord::new("a", ExpirationStatus::Warning));
        set.merge(NotificationRecord::new("a", ExpirationStatus::Critical));
        assert_eq!(set.status_of("a"), Some(ExpirationStatus::Critical));

        set.merge(NotificationRecord::new("a", ExpirationStatus::Warning));
        assert_eq!(set.status_of("a"), Some(ExpirationStatus::Critical));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_prune() {
        let mut set = NotifiedSet::new();
        for id in ["a", "b", "c"] {
            set.merge(NotificationRecord::new(id, ExpirationStatus::Warning));
        }

        let current: HashSet<&str> = ["b", "z"].into_iter().collect();
        assert_eq!(set.prune(&current), 2);
        assert_eq!(set.ids().collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn test_json_roundtrip_and_legacy() {
        let mut set = NotifiedSet::new();
        set.merge(NotificationRecord::new("a", ExpirationStatus::Critical));
        let json = set.to_json().unwrap();
        assert_eq!(NotifiedSet::from_json(&json).unwrap(), set);

        let legacy = NotifiedSet::from_json(r#"["x", "y"]"#).unwrap();
        assert!(legacy.contains("x"));
        assert_eq!(legacy.status_of("y"), Some(ExpirationStatus::Warning));

        assert!(NotifiedSet::from_json("{not json").is_err());
    }
}
