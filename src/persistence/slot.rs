use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;

use super::error::SlotError;

/// A named durable string slot, the storage model of the persisted fleet.
pub trait KeyValueSlot {
    /// Read the value stored under `key`, `None` if nothing was ever written.
    fn read(&self, key: &str) -> Result<Option<String>, SlotError>;

    /// Overwrite the value stored under `key`.
    fn write(&self, key: &str, value: &str) -> Result<(), SlotError>;
}

impl<S: KeyValueSlot + ?Sized> KeyValueSlot for Arc<S> {
    fn read(&self, key: &str) -> Result<Option<String>, SlotError> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<(), SlotError> {
        (**self).write(key, value)
    }
}

/// Stores each key as `<dir>/<key>.json`.
///
/// Writes go to a sibling temporary file which is then renamed over the target, so a crash never
/// leaves a half written slot behind.
#[derive(Debug, Clone)]
pub struct FileSlot {
    dir: PathBuf,
}

impl FileSlot {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueSlot for FileSlot {
    fn read(&self, key: &str) -> Result<Option<String>, SlotError> {
        let path = self.path(key);
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(SlotError::Read { path, source }),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), SlotError> {
        let path = self.path(key);
        let tmp = self.dir.join(format!("{key}.json.tmp"));

        fs::create_dir_all(&self.dir)
            .and_then(|()| fs::write(&tmp, value))
            .and_then(|()| fs::rename(&tmp, &path))
            .map_err(|source| SlotError::Write { path, source })
    }
}

/// In-process slot, for tests and runs that should not touch the disk.
///
/// An optional quota caps the total bytes held across all keys, like browser storage does.
#[derive(Debug, Default)]
pub struct MemorySlot {
    values: DashMap<String, String, ahash::RandomState>,
    quota: Option<usize>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota: usize) -> Self {
        Self {
            values: DashMap::default(),
            quota: Some(quota),
        }
    }

    fn used_except(&self, key: &str) -> usize {
        self.values
            .iter()
            .filter(|entry| entry.key() != key)
            .map(|entry| entry.value().len())
            .sum()
    }
}

impl KeyValueSlot for MemorySlot {
    fn read(&self, key: &str) -> Result<Option<String>, SlotError> {
        Ok(self.values.get(key).map(|value| value.clone()))
    }

    fn write(&self, key: &str, value: &str) -> Result<(), SlotError> {
        let over_quota = self
            .quota
            .filter(|&quota| self.used_except(key) + value.len() > quota);

        if let Some(quota) = over_quota {
            return Err(SlotError::Unavailable {
                key: key.to_owned(),
                reason: format!("quota of {quota} bytes exceeded"),
            });
        }

        self.values.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}
