//! File storage behind the host's file ops.
//!
//! The default store is in memory so tests never touch the real disk. A
//! disk-rooted store maps every script path under one directory.

use host_api::HostError;
use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Backing store for `read_file`/`write_file`/`remove_file`
#[derive(Debug, Clone)]
pub enum FileStore {
    /// Files held in a map keyed by normalized path
    Memory(HashMap<String, Vec<u8>>),
    /// Files kept under a real directory
    Disk(PathBuf),
}

impl Default for FileStore {
    fn default() -> Self {
        FileStore::Memory(HashMap::new())
    }
}

/// Strips leading separators and `.` segments; rejects `..`
fn normalize(path: &str) -> Result<String, HostError> {
    let mut parts = Vec::new();
    for component in Path::new(path).components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
            Component::ParentDir => {
                return Err(HostError::Io {
                    path: path.to_string(),
                    message: "path escapes the host root".to_string(),
                })
            }
        }
    }
    if parts.is_empty() {
        return Err(HostError::Io {
            path: path.to_string(),
            message: "empty path".to_string(),
        });
    }
    Ok(parts.join("/"))
}

impl FileStore {
    /// Creates a store rooted at a real directory
    pub fn disk(root: impl Into<PathBuf>) -> Self {
        FileStore::Disk(root.into())
    }

    /// Reads a whole file
    pub fn read(&self, path: &str) -> Result<Vec<u8>, HostError> {
        let key = normalize(path)?;
        match self {
            FileStore::Memory(files) => files
                .get(&key)
                .cloned()
                .ok_or_else(|| HostError::NotFound(path.to_string())),
            FileStore::Disk(root) => fs::read(root.join(&key)).map_err(|e| HostError::io(path, &e)),
        }
    }

    /// Writes a whole file, creating or replacing it
    pub fn write(&mut self, path: &str, contents: Vec<u8>) -> Result<(), HostError> {
        let key = normalize(path)?;
        match self {
            FileStore::Memory(files) => {
                files.insert(key, contents);
                Ok(())
            }
            FileStore::Disk(root) => {
                let target = root.join(&key);
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent).map_err(|e| HostError::io(path, &e))?;
                }
                fs::write(target, contents).map_err(|e| HostError::io(path, &e))
            }
        }
    }

    /// Removes a file
    pub fn remove(&mut self, path: &str) -> Result<(), HostError> {
        let key = normalize(path)?;
        match self {
            FileStore::Memory(files) => files
                .remove(&key)
                .map(|_| ())
                .ok_or_else(|| HostError::NotFound(path.to_string())),
            FileStore::Disk(root) => {
                fs::remove_file(root.join(&key)).map_err(|e| HostError::io(path, &e))
            }
        }
    }
}
