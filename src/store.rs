use std::cmp::Ordering;

use crate::models::Record;

/// The movements of the account currently open, in display order.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    caja: Option<String>,
    records: Vec<Record>,
}

impl RecordStore {
    pub fn new(caja: &str, records: Vec<Record>) -> Self {
        let mut store = Self {
            caja: Some(caja.to_string()),
            records: Vec::new(),
        };
        store.replace(records);
        store
    }

    /// Swap in a fresh record set for the same account.
    pub fn replace(&mut self, mut records: Vec<Record>) {
        sort_by_insertion_desc(&mut records);
        self.records = records;
    }

    pub fn caja(&self) -> Option<&str> {
        self.caja.as_deref()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.id == id)
    }
}

/// Most recent insertion first. Records without an insertion date go last;
/// ties keep the order the bridge returned.
pub fn sort_by_insertion_desc(records: &mut [Record]) {
    records.sort_by(|a, b| match (&a.insertion_date, &b.insertion_date) {
        (Some(x), Some(y)) => y.cmp(x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::record;

    fn stamped(id: &str, date: Option<&str>) -> Record {
        let mut r = record(id, "x", 1.0, false);
        r.insertion_date = date.map(str::to_string);
        r
    }

    #[test]
    fn test_sorts_most_recent_first() {
        let store = RecordStore::new(
            "200",
            vec![
                stamped("a", Some("2025-01-01T10:00:00Z")),
                stamped("b", Some("2025-03-01T10:00:00Z")),
                stamped("c", Some("2025-02-01T10:00:00Z")),
            ],
        );
        let ids: Vec<&str> = store.records().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_missing_dates_last_and_ties_stable() {
        let store = RecordStore::new(
            "200",
            vec![
                stamped("none1", None),
                stamped("t1", Some("2025-01-01")),
                stamped("none2", None),
                stamped("t2", Some("2025-01-01")),
            ],
        );
        let ids: Vec<&str> = store.records().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t2", "none1", "none2"]);
    }

    #[test]
    fn test_get_by_id() {
        let store = RecordStore::new("200", vec![stamped("a", None), stamped("b", None)]);
        assert_eq!(store.get("b").map(|r| r.id.as_str()), Some("b"));
        assert!(store.get("zzz").is_none());
        assert_eq!(store.caja(), Some("200"));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_default_is_empty() {
        let store = RecordStore::default();
        assert!(store.is_empty());
        assert_eq!(store.caja(), None);
    }
}
