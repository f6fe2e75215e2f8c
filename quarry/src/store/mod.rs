//! In-memory containers of derived collection records.
//!
//! Both stores keep insertion order. `transform` is generic over the output
//! type, so narrowing a record's shape after code generation is a real
//! conversion the compiler checks, not an unchecked cast.

use crate::error::Result;
use crate::maybe_async::MaybeAsync;
use indexmap::IndexMap;
use serde::Serialize;
use std::path::PathBuf;

/// Read contract shared by every store. Reads may complete immediately (an
/// in-memory store) or later (a remote one), so callers should treat them as
/// awaitable.
pub trait CollectionStore: Send + Sync {
    type Item: Send;

    fn get(&self, id: &str) -> MaybeAsync<'_, Option<Self::Item>>;

    fn list(&self) -> MaybeAsync<'_, Vec<Self::Item>>;
}

/// A record derived from one file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileEntry<T> {
    /// Path relative to the collection directory, `/`-separated
    pub path: String,
    pub full_path: PathBuf,
    pub data: T,
}

impl<T: Serialize> FileEntry<T> {
    /// The record as one JSON object: data fields with `path` and `fullPath`
    /// merged over them. Non-object data is nested under `data`.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        let mut object = match serde_json::to_value(&self.data)? {
            serde_json::Value::Object(map) => map,
            serde_json::Value::Null => serde_json::Map::new(),
            other => {
                let mut map = serde_json::Map::new();
                map.insert("data".into(), other);
                map
            }
        };
        object.insert("path".into(), serde_json::Value::String(self.path.clone()));
        object.insert(
            "fullPath".into(),
            serde_json::Value::String(self.full_path.to_string_lossy().into_owned()),
        );
        Ok(serde_json::Value::Object(object))
    }
}

/// Store keyed by file path relative to the collection root.
#[derive(Debug, Clone, PartialEq)]
pub struct FileStore<T> {
    entries: IndexMap<String, FileEntry<T>>,
}

impl<T> FileStore<T> {
    pub fn new() -> Self {
        FileStore {
            entries: IndexMap::new(),
        }
    }

    /// Insert or replace the record for `path`, keeping its original
    /// position when replacing.
    pub fn insert(
        &mut self,
        path: impl Into<String>,
        full_path: impl Into<PathBuf>,
        data: T,
    ) -> Option<FileEntry<T>> {
        let path = path.into();
        let entry = FileEntry {
            path: path.clone(),
            full_path: full_path.into(),
            data,
        };
        self.entries.insert(path, entry)
    }

    pub fn remove(&mut self, path: &str) -> Option<FileEntry<T>> {
        self.entries.shift_remove(path)
    }

    pub fn entry(&self, path: &str) -> Option<&FileEntry<T>> {
        self.entries.get(path)
    }

    pub fn entries(&self) -> impl Iterator<Item = &FileEntry<T>> {
        self.entries.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rewrite every record's data. Keys, their order and path info are
    /// preserved exactly.
    pub fn transform<U, F>(self, mut f: F) -> FileStore<U>
    where
        F: FnMut(&str, T) -> U,
    {
        let entries = self
            .entries
            .into_iter()
            .map(|(id, entry)| {
                let data = f(&id, entry.data);
                let entry = FileEntry {
                    path: entry.path,
                    full_path: entry.full_path,
                    data,
                };
                (id, entry)
            })
            .collect();
        FileStore { entries }
    }

    /// Like [`FileStore::transform`], stopping at the first error.
    pub fn try_transform<U, F>(self, mut f: F) -> Result<FileStore<U>>
    where
        F: FnMut(&str, T) -> Result<U>,
    {
        let mut entries = IndexMap::with_capacity(self.entries.len());
        for (id, entry) in self.entries {
            let data = f(&id, entry.data)?;
            entries.insert(
                id,
                FileEntry {
                    path: entry.path,
                    full_path: entry.full_path,
                    data,
                },
            );
        }
        Ok(FileStore { entries })
    }
}

impl<T: Serialize> FileStore<T> {
    /// All records as a JSON object keyed by id.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        let mut object = serde_json::Map::new();
        for (id, entry) in &self.entries {
            object.insert(id.clone(), entry.to_json()?);
        }
        Ok(serde_json::Value::Object(object))
    }
}

impl<T> Default for FileStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + Sync> CollectionStore for FileStore<T> {
    type Item = FileEntry<T>;

    fn get(&self, id: &str) -> MaybeAsync<'_, Option<FileEntry<T>>> {
        MaybeAsync::Ready(self.entries.get(id).cloned())
    }

    fn list(&self) -> MaybeAsync<'_, Vec<FileEntry<T>>> {
        MaybeAsync::Ready(self.entries.values().cloned().collect())
    }
}

/// Store keyed by logical keys, for collections not backed by files.
#[derive(Debug, Clone, PartialEq)]
pub struct MapStore<T> {
    entries: IndexMap<String, T>,
}

impl<T> MapStore<T> {
    pub fn new() -> Self {
        MapStore {
            entries: IndexMap::new(),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: T) -> Option<T> {
        self.entries.insert(key.into(), value)
    }

    pub fn value(&self, key: &str) -> Option<&T> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn transform<U, F>(self, mut f: F) -> MapStore<U>
    where
        F: FnMut(&str, T) -> U,
    {
        let entries = self
            .entries
            .into_iter()
            .map(|(key, value)| {
                let value = f(&key, value);
                (key, value)
            })
            .collect();
        MapStore { entries }
    }
}

impl<T> Default for MapStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<(String, T)> for MapStore<T> {
    fn from_iter<I: IntoIterator<Item = (String, T)>>(iter: I) -> Self {
        MapStore {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<T: Clone + Send + Sync> CollectionStore for MapStore<T> {
    type Item = T;

    fn get(&self, id: &str) -> MaybeAsync<'_, Option<T>> {
        MaybeAsync::Ready(self.entries.get(id).cloned())
    }

    fn list(&self) -> MaybeAsync<'_, Vec<T>> {
        MaybeAsync::Ready(self.entries.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample() -> FileStore<serde_json::Value> {
        let mut store = FileStore::new();
        store.insert("b.md", "/docs/b.md", json!({ "title": "B" }));
        store.insert("a.md", "/docs/a.md", json!({ "title": "A" }));
        store.insert("sub/c.md", "/docs/sub/c.md", json!({ "title": "C" }));
        store
    }

    #[test]
    fn test_transform_preserves_keys_and_order() {
        let store = sample();
        let before: Vec<String> = store.ids().map(String::from).collect();

        let titles = store.transform(|_, data| data["title"].as_str().unwrap_or("").to_lowercase());
        let after: Vec<String> = titles.ids().map(String::from).collect();
        assert_eq!(before, after);
        assert_eq!(titles.len(), 3);

        let listed = titles.list().now().unwrap();
        let data: Vec<&str> = listed.iter().map(|e| e.data.as_str()).collect();
        assert_eq!(data, vec!["b", "a", "c"]);
        assert_eq!(listed[2].path, "sub/c.md");
    }

    #[test]
    fn test_try_transform_stops_on_error() {
        let result = sample().try_transform(|id, data| {
            if id == "a.md" {
                Err(crate::error::QuarryError::Other("bad".into()))
            } else {
                Ok(data)
            }
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_path_fields_win_when_merged() {
        let mut store = FileStore::new();
        store.insert("a.md", "/docs/a.md", json!({ "title": "A", "path": "spoofed" }));
        let value = store.entry("a.md").unwrap().to_json().unwrap();
        assert_eq!(
            value,
            json!({ "title": "A", "path": "a.md", "fullPath": "/docs/a.md" })
        );
    }

    #[test]
    fn test_reinsert_keeps_position() {
        let mut store = sample();
        store.insert("b.md", "/docs/b.md", json!({ "title": "B2" }));
        assert_eq!(store.ids().next(), Some("b.md"));
        assert_eq!(store.get("b.md").now().unwrap().unwrap().data["title"], "B2");
        assert!(store.remove("a.md").is_some());
        assert_eq!(store.ids().collect::<Vec<_>>(), vec!["b.md", "sub/c.md"]);
    }

    #[tokio::test]
    async fn test_map_store_reads_are_awaitable() {
        let store: MapStore<u32> = vec![("x".to_string(), 1), ("y".to_string(), 2)]
            .into_iter()
            .collect();
        assert_eq!(store.get("y").await, Some(2));
        let doubled = store.transform(|_, v| v * 2);
        assert_eq!(doubled.list().await, vec![2, 4]);
    }
}
