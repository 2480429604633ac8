use std::collections::{BTreeMap, BTreeSet};

use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// A row type that can live in a [`Table`].
pub trait Row: Clone + Serialize + DeserializeOwned {
    fn id(&self) -> i64;

    /// Key of this row under the named index, `None` if the row is not indexed there.
    fn index_key(&self, index: &str) -> Option<String>;
}

/// Rows keyed by id plus declared secondary indexes.
///
/// Only the row data and the index names are serialized; lookup maps are
/// rebuilt with [`Table::rebuild_indexes`] after a load.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound = "R: Row")]
pub struct Table<R> {
    #[serde(default)]
    indexes: BTreeSet<String>,
    #[serde(default)]
    rows: BTreeMap<i64, R>,
    #[serde(skip)]
    lookups: BTreeMap<String, BTreeMap<String, BTreeSet<i64>>>,
}

impl<R> Default for Table<R> {
    fn default() -> Self {
        Self {
            indexes: BTreeSet::new(),
            rows: BTreeMap::new(),
            lookups: BTreeMap::new(),
        }
    }
}

impl<R: Row> Table<R> {
    /// Declares an index and builds it. Returns false if it already existed.
    pub fn create_index(&mut self, name: &str) -> bool {
        if self.has_index(name) {
            return false;
        }
        self.indexes.insert(name.to_string());
        self.build_index(name);
        true
    }

    pub fn has_index(&self, name: &str) -> bool {
        self.indexes.contains(name)
    }

    pub fn rebuild_indexes(&mut self) {
        self.lookups.clear();
        let names: Vec<String> = self.indexes.iter().cloned().collect();
        for name in names {
            self.build_index(&name);
        }
    }

    fn build_index(&mut self, name: &str) {
        let mut map: BTreeMap<String, BTreeSet<i64>> = BTreeMap::new();
        for row in self.rows.values() {
            if let Some(key) = row.index_key(name) {
                map.entry(key).or_default().insert(row.id());
            }
        }
        self.lookups.insert(name.to_string(), map);
    }

    /// max(id) + 1, or 1 for an empty table.
    pub fn next_id(&self) -> i64 {
        self.rows.keys().next_back().map(|id| id + 1).unwrap_or(1)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn get(&self, id: i64) -> Option<&R> {
        self.rows.get(&id)
    }

    /// Rows in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &R> {
        self.rows.values()
    }

    pub fn insert(&mut self, row: R) {
        let id = row.id();
        if let Some(old) = self.rows.remove(&id) {
            self.unindex(&old);
        }
        self.index(&row);
        self.rows.insert(id, row);
    }

    /// Applies `f` to the row with `id`, keeping indexes in step.
    pub fn update<T>(&mut self, id: i64, f: impl FnOnce(&mut R) -> T) -> Option<T> {
        let mut row = self.rows.remove(&id)?;
        self.unindex(&row);
        let out = f(&mut row);
        self.index(&row);
        self.rows.insert(row.id(), row);
        Some(out)
    }

    pub fn remove(&mut self, id: i64) -> Option<R> {
        let row = self.rows.remove(&id)?;
        self.unindex(&row);
        Some(row)
    }

    /// Rows whose key under `index` equals `key`, in id order.
    ///
    /// Falls back to a scan when the index was never declared.
    pub fn lookup(&self, index: &str, key: &str) -> Vec<&R> {
        match self.lookups.get(index) {
            Some(map) => map
                .get(key)
                .map(|ids| ids.iter().filter_map(|id| self.rows.get(id)).collect())
                .unwrap_or_default(),
            None => self
                .rows
                .values()
                .filter(|r| r.index_key(index).as_deref() == Some(key))
                .collect(),
        }
    }

    /// Removes every row matching `key` under `index` and returns them.
    pub fn remove_where(&mut self, index: &str, key: &str) -> Vec<R> {
        let ids: Vec<i64> = self.lookup(index, key).iter().map(|r| r.id()).collect();
        ids.into_iter().filter_map(|id| self.remove(id)).collect()
    }

    fn index(&mut self, row: &R) {
        for (name, map) in self.lookups.iter_mut() {
            if let Some(key) = row.index_key(name) {
                map.entry(key).or_default().insert(row.id());
            }
        }
    }

    fn unindex(&mut self, row: &R) {
        for (name, map) in self.lookups.iter_mut() {
            if let Some(key) = row.index_key(name) {
                if let Some(ids) = map.get_mut(&key) {
                    ids.remove(&row.id());
                    if ids.is_empty() {
                        map.remove(&key);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Item {
        id: i64,
        tag: String,
    }

    impl Row for Item {
        fn id(&self) -> i64 {
            self.id
        }
        fn index_key(&self, index: &str) -> Option<String> {
            match index {
                "by_tag" => Some(self.tag.clone()),
                _ => None,
            }
        }
    }

    fn item(id: i64, tag: &str) -> Item {
        Item { id, tag: tag.into() }
    }

    #[test]
    fn next_id_is_max_plus_one() {
        let mut t: Table<Item> = Table::default();
        assert_eq!(t.next_id(), 1);
        t.insert(item(1, "a"));
        t.insert(item(5, "b"));
        assert_eq!(t.next_id(), 6);
        t.remove(5);
        assert_eq!(t.next_id(), 2);
    }

    #[test]
    fn index_follows_updates_and_removals() {
        let mut t: Table<Item> = Table::default();
        assert!(t.create_index("by_tag"));
        assert!(!t.create_index("by_tag"));
        t.insert(item(1, "a"));
        t.insert(item(2, "a"));
        t.insert(item(3, "b"));
        assert_eq!(t.lookup("by_tag", "a").len(), 2);

        t.update(2, |r| r.tag = "b".into());
        assert_eq!(t.lookup("by_tag", "a").len(), 1);
        assert_eq!(t.lookup("by_tag", "b").len(), 2);

        let removed = t.remove_where("by_tag", "b");
        assert_eq!(removed.len(), 2);
        assert_eq!(t.len(), 1);
        assert!(t.lookup("by_tag", "b").is_empty());
    }

    #[test]
    fn create_index_covers_existing_rows() {
        let mut t: Table<Item> = Table::default();
        t.insert(item(1, "x"));
        t.create_index("by_tag");
        assert_eq!(t.lookup("by_tag", "x")[0].id, 1);
    }

    #[test]
    fn lookups_are_rebuilt_after_deserialize() {
        let mut t: Table<Item> = Table::default();
        t.create_index("by_tag");
        t.insert(item(1, "x"));
        let json = serde_json::to_string(&t).unwrap();

        let mut back: Table<Item> = serde_json::from_str(&json).unwrap();
        assert!(back.has_index("by_tag"));
        back.rebuild_indexes();
        assert_eq!(back.lookup("by_tag", "x").len(), 1);
    }
}
