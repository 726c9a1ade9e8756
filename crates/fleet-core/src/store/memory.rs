//! An in-memory [`Store`] used as a stand-in for the hub declarative store in
//! unit and property tests throughout this workspace.

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

use super::{Store, StoreError, Versioned};

#[derive(Debug)]
struct Entry<T> {
    value: T,
    resource_version: u64,
    labels: BTreeMap<String, String>,
}

/// A thread-safe, label-indexed, optimistically-versioned in-memory object
/// store. Cloning shares the underlying map, matching the `kube::Client`-like
/// handle semantics reconcilers expect from the real store.
#[derive(Debug)]
pub struct MemoryStore<T> {
    objects: Mutex<BTreeMap<String, Entry<T>>>,
}

impl<T> Default for MemoryStore<T> {
    fn default() -> Self {
        Self {
            objects: Mutex::new(BTreeMap::new()),
        }
    }
}

impl<T> MemoryStore<T> {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

impl<T: Clone> Store<T> for MemoryStore<T> {
    fn list_by_label(&self, key: &str, value: &str) -> Result<Vec<Versioned<T>>, StoreError> {
        let objects = self.objects.lock().expect("memory store mutex poisoned");
        Ok(objects
            .values()
            .filter(|entry| entry.labels.get(key).map(String::as_str) == Some(value))
            .map(|entry| Versioned {
                value: entry.value.clone(),
                resource_version: entry.resource_version,
            })
            .collect())
    }

    fn get(&self, name: &str) -> Result<Option<Versioned<T>>, StoreError> {
        let objects = self.objects.lock().expect("memory store mutex poisoned");
        Ok(objects.get(name).map(|entry| Versioned {
            value: entry.value.clone(),
            resource_version: entry.resource_version,
        }))
    }

    fn create(
        &self,
        name: &str,
        labels: BTreeMap<String, String>,
        value: T,
    ) -> Result<Versioned<T>, StoreError> {
        let mut objects = self.objects.lock().expect("memory store mutex poisoned");
        if objects.contains_key(name) {
            return Err(StoreError::Conflict {
                name: name.to_string(),
                expected: 0,
                actual: objects[name].resource_version,
            });
        }
        let entry = Entry {
            value,
            resource_version: 1,
            labels,
        };
        let versioned = Versioned {
            value: entry.value.clone(),
            resource_version: entry.resource_version,
        };
        objects.insert(name.to_string(), entry);
        Ok(versioned)
    }

    fn update(
        &self,
        name: &str,
        expected_version: u64,
        value: T,
    ) -> Result<Versioned<T>, StoreError> {
        let mut objects = self.objects.lock().expect("memory store mutex poisoned");
        let entry = objects.get_mut(name).ok_or_else(|| StoreError::NotFound {
            name: name.to_string(),
        })?;
        if entry.resource_version != expected_version {
            return Err(StoreError::Conflict {
                name: name.to_string(),
                expected: expected_version,
                actual: entry.resource_version,
            });
        }
        entry.value = value;
        entry.resource_version += 1;
        Ok(Versioned {
            value: entry.value.clone(),
            resource_version: entry.resource_version,
        })
    }

    fn delete(&self, name: &str, expected_version: u64) -> Result<(), StoreError> {
        let mut objects = self.objects.lock().expect("memory store mutex poisoned");
        let entry = objects.get(name).ok_or_else(|| StoreError::NotFound {
            name: name.to_string(),
        })?;
        if entry.resource_version != expected_version {
            return Err(StoreError::Conflict {
                name: name.to_string(),
                expected: expected_version,
                actual: entry.resource_version,
            });
        }
        objects.remove(name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_then_get_round_trips() {
        let store: Arc<MemoryStore<i32>> = MemoryStore::new();
        store.create("a", BTreeMap::new(), 1).unwrap();
        let got = store.get("a").unwrap().unwrap();
        assert_eq!(got.value, 1);
        assert_eq!(got.resource_version, 1);
    }

    #[test]
    fn create_twice_conflicts() {
        let store: Arc<MemoryStore<i32>> = MemoryStore::new();
        store.create("a", BTreeMap::new(), 1).unwrap();
        let err = store.create("a", BTreeMap::new(), 2).unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
    }

    #[test]
    fn update_with_stale_version_conflicts() {
        let store: Arc<MemoryStore<i32>> = MemoryStore::new();
        store.create("a", BTreeMap::new(), 1).unwrap();
        let err = store.update("a", 99, 2).unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
    }

    #[test]
    fn update_with_correct_version_bumps_resource_version() {
        let store: Arc<MemoryStore<i32>> = MemoryStore::new();
        store.create("a", BTreeMap::new(), 1).unwrap();
        let updated = store.update("a", 1, 2).unwrap();
        assert_eq!(updated.value, 2);
        assert_eq!(updated.resource_version, 2);
    }

    #[test]
    fn list_by_label_filters_on_exact_match() {
        let store: Arc<MemoryStore<i32>> = MemoryStore::new();
        store
            .create("a", BTreeMap::from([("crp".to_string(), "demo".to_string())]), 1)
            .unwrap();
        store
            .create("b", BTreeMap::from([("crp".to_string(), "other".to_string())]), 2)
            .unwrap();

        let matches = store.list_by_label("crp", "demo").unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].value, 1);
    }

    #[test]
    fn delete_removes_object() {
        let store: Arc<MemoryStore<i32>> = MemoryStore::new();
        store.create("a", BTreeMap::new(), 1).unwrap();
        store.delete("a", 1).unwrap();
        assert!(store.get("a").unwrap().is_none());
    }
}
