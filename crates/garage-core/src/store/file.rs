use std::fmt::Write as _;
use std::io::Write as _;
use std::path::PathBuf;

use tracing::debug;

use super::{KeyValueStore, StoreError};

/// Disk-backed store: one `<key>.json` file per key inside a directory.
///
/// Each write goes to its own uniquely named temporary file in the same
/// directory, which is then persisted over the target. Readers never see a
/// half-written value and concurrent writers to one key do not collide.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir.display().to_string(), e))?;
        debug!(dir = %dir.display(), "Opened file store");
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(file_name(key))
    }
}

/// Map a key to a file name. Bytes outside `[A-Za-z0-9_-]` become `%XX`.
fn file_name(key: &str) -> String {
    let mut name = String::with_capacity(key.len() + 5);
    for b in key.bytes() {
        if b.is_ascii_alphanumeric() || b == b'_' || b == b'-' {
            name.push(b as char);
        } else {
            let _ = write!(name, "%{:02X}", b);
        }
    }
    name.push_str(".json");
    name
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(key, e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);

        let mut temp_file =
            tempfile::NamedTempFile::new_in(&self.dir).map_err(|e| StoreError::io(key, e))?;
        temp_file
            .write_all(value.as_bytes())
            .map_err(|e| StoreError::io(key, e))?;

        // A failed persist drops the temp file, which deletes it
        temp_file
            .persist(&path)
            .map_err(|e| StoreError::io(key, e.error))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(key, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_escaping() {
        assert_eq!(file_name("vehicle_details_SW03PER"), "vehicle_details_SW03PER.json");
        assert_eq!(file_name("vehicle_image_AB 12/C"), "vehicle_image_AB%2012%2FC.json");
        assert_eq!(file_name("a.b"), "a%2Eb.json");
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();

        let store = FileStore::open(dir.path()).unwrap();
        store.set("garage_vehicles", r#"[{"id":1}]"#).unwrap();
        drop(store);

        let reopened = FileStore::open(dir.path()).unwrap();
        assert_eq!(
            reopened.get("garage_vehicles").unwrap().as_deref(),
            Some(r#"[{"id":1}]"#)
        );
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("garage_vehicles.json")]);
    }

    #[test]
    fn test_concurrent_writers_to_one_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = std::sync::Arc::new(FileStore::open(dir.path()).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|n| {
                let store = std::sync::Arc::clone(&store);
                std::thread::spawn(move || {
                    let value = n.to_string().repeat(200 * 1024);
                    (0..50)
                        .filter(|_| store.set("vehicle_details_SW03PER", &value).is_err())
                        .count()
                })
            })
            .collect();

        let failures: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(failures, 0);

        // Whatever landed last is one writer's value, never a mix
        let stored = store.get("vehicle_details_SW03PER").unwrap().unwrap();
        assert_eq!(stored.len(), 200 * 1024);
        let first = stored.chars().next().unwrap();
        assert!(stored.chars().all(|c| c == first));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_absent_and_removed_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("nested")).unwrap();

        assert_eq!(store.get("vehicle_image_ABC123").unwrap(), None);
        store.remove("vehicle_image_ABC123").unwrap();

        store.set("vehicle_image_ABC123", "{}").unwrap();
        store.remove("vehicle_image_ABC123").unwrap();
        assert_eq!(store.get("vehicle_image_ABC123").unwrap(), None);
    }

    #[test]
    fn test_keys_with_unsafe_characters_stay_distinct() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        store.set("vehicle_details_AB/12", "slash").unwrap();
        store.set("vehicle_details_AB%2F12", "literal").unwrap();

        assert_eq!(store.get("vehicle_details_AB/12").unwrap().as_deref(), Some("slash"));
        assert_eq!(store.get("vehicle_details_AB%2F12").unwrap().as_deref(), Some("literal"));
    }
}
