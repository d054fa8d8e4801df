//! A filesystem store.

use std::{
    collections::HashMap,
    fs::File,
    io::{Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use parking_lot::{Mutex, RwLock};
use thiserror::Error;
use walkdir::WalkDir;

use crate::{
    byte_range::{ByteRange, InvalidByteRangeError},
    storage::{
        Bytes, ListableStorageTraits, ReadableStorageTraits, StorageError, StoreKey,
        StoreKeyError, StoreKeys, StorePrefix, WritableStorageTraits,
    },
};

const TEMPORARY_FILE_INFIX: &str = ".partial.";

/// A synchronous file system store.
///
/// Each key is a file below the base path.
/// A [`set`](WritableStorageTraits::set) writes a temporary sibling file and renames it over the destination, so readers never observe a partially written value.
#[derive(Debug)]
pub struct FilesystemStore {
    base_path: PathBuf,
    readonly: bool,
    files: Mutex<HashMap<StoreKey, Arc<RwLock<()>>>>,
    temporary_counter: AtomicU64,
}

impl FilesystemStore {
    /// Create a new file system store at a given `base_path`.
    ///
    /// # Errors
    /// Returns a [`FilesystemStoreCreateError`] if `base_directory`:
    ///   - is not valid, or
    ///   - it points to an existing file rather than a directory.
    pub fn new<P: AsRef<Path>>(base_path: P) -> Result<Self, FilesystemStoreCreateError> {
        let base_path = base_path.as_ref().to_path_buf();
        if base_path.to_str().is_none() {
            return Err(FilesystemStoreCreateError::InvalidBasePath(base_path));
        }

        let readonly = if base_path.exists() {
            let md = std::fs::metadata(&base_path).map_err(FilesystemStoreCreateError::IOError)?;
            if !md.is_dir() {
                return Err(FilesystemStoreCreateError::InvalidBasePath(base_path));
            }
            md.permissions().readonly()
        } else {
            // the path does not exist, so try and create it. If this succeeds, the filesystem is not read only
            std::fs::create_dir_all(&base_path).map_err(FilesystemStoreCreateError::IOError)?;
            false
        };

        Ok(Self {
            base_path,
            readonly,
            files: Mutex::default(),
            temporary_counter: AtomicU64::new(0),
        })
    }

    /// Maps a [`StoreKey`] to a filesystem [`PathBuf`].
    #[must_use]
    pub fn key_to_fspath(&self, key: &StoreKey) -> PathBuf {
        let mut path = self.base_path.clone();
        path.push(key.as_str());
        path
    }

    /// Maps a filesystem [`PathBuf`] to a [`StoreKey`].
    fn fspath_to_key(&self, path: &Path) -> Result<StoreKey, StoreKeyError> {
        let path = pathdiff::diff_paths(path, &self.base_path)
            .ok_or_else(|| StoreKeyError::from(path.to_string_lossy().to_string()))?;
        let path_str = path.to_string_lossy().replace('\\', "/");
        StoreKey::new(path_str)
    }

    /// Maps a store [`StorePrefix`] to a filesystem [`PathBuf`].
    #[must_use]
    pub fn prefix_to_fs_path(&self, prefix: &StorePrefix) -> PathBuf {
        let mut path = self.base_path.clone();
        path.push(prefix.as_str());
        path
    }

    fn get_file_mutex(&self, key: &StoreKey) -> Arc<RwLock<()>> {
        self.files
            .lock()
            .entry(key.clone())
            .or_insert_with(|| Arc::new(RwLock::default()))
            .clone()
    }

    fn temporary_path(&self, key_path: &Path) -> PathBuf {
        let counter = self.temporary_counter.fetch_add(1, Ordering::Relaxed);
        let file_name = key_path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        key_path.with_file_name(format!(
            ".{file_name}{TEMPORARY_FILE_INFIX}{}.{counter}",
            std::process::id()
        ))
    }

    fn is_temporary_path(path: &Path) -> bool {
        path.file_name()
            .is_some_and(|name| name.to_string_lossy().contains(TEMPORARY_FILE_INFIX))
    }

    fn list_path(&self, path: &Path) -> StoreKeys {
        WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|v| v.path().is_file() && !Self::is_temporary_path(v.path()))
            .filter_map(|v| self.fspath_to_key(v.path()).ok())
            .collect()
    }
}

impl ReadableStorageTraits for FilesystemStore {
    fn get_partial_values_key(
        &self,
        key: &StoreKey,
        byte_ranges: &[ByteRange],
    ) -> Result<Option<Vec<Bytes>>, StorageError> {
        let file = self.get_file_mutex(key);
        let _lock = file.read();

        let mut file = match File::open(self.key_to_fspath(key)) {
            Ok(file) => file,
            Err(err) => {
                if err.kind() == std::io::ErrorKind::NotFound {
                    return Ok(None);
                }
                return Err(err.into());
            }
        };
        let size = file.metadata()?.len();

        let mut out = Vec::with_capacity(byte_ranges.len());
        for byte_range in byte_ranges {
            if !byte_range.is_valid(size) {
                return Err(InvalidByteRangeError::new(*byte_range, size).into());
            }
            let start = byte_range.start(size);
            let length = usize::try_from(byte_range.length(size))
                .map_err(|_| InvalidByteRangeError::new(*byte_range, size))?;
            file.seek(SeekFrom::Start(start))?;
            let mut buffer = vec![0; length];
            file.read_exact(&mut buffer)?;
            out.push(buffer);
        }

        Ok(Some(out))
    }

    fn size_key(&self, key: &StoreKey) -> Result<Option<u64>, StorageError> {
        let key_path = self.key_to_fspath(key);
        match std::fs::metadata(key_path) {
            Ok(metadata) => Ok(Some(metadata.len())),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

impl WritableStorageTraits for FilesystemStore {
    fn set(&self, key: &StoreKey, value: Bytes) -> Result<(), StorageError> {
        if self.readonly {
            return Err(StorageError::ReadOnly);
        }

        let key_path = self.key_to_fspath(key);
        if let Some(parent) = key_path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        // Write outside of the key lock, then swap in the new value
        let temporary_path = self.temporary_path(&key_path);
        let write_result = File::create(&temporary_path).and_then(|mut file| {
            file.write_all(&value)?;
            file.sync_data()
        });
        if let Err(err) = write_result {
            let _ = std::fs::remove_file(&temporary_path);
            return Err(err.into());
        }

        let file = self.get_file_mutex(key);
        let _lock = file.write();
        std::fs::rename(&temporary_path, &key_path).map_err(|err| {
            let _ = std::fs::remove_file(&temporary_path);
            StorageError::from(err)
        })
    }

    fn erase(&self, key: &StoreKey) -> Result<(), StorageError> {
        if self.readonly {
            return Err(StorageError::ReadOnly);
        }

        let file = self.get_file_mutex(key);
        let _lock = file.write();

        let key_path = self.key_to_fspath(key);
        match std::fs::remove_file(key_path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn erase_prefix(&self, prefix: &StorePrefix) -> Result<(), StorageError> {
        if self.readonly {
            return Err(StorageError::ReadOnly);
        }

        let _lock = self.files.lock(); // lock all operations

        let prefix_path = self.prefix_to_fs_path(prefix);
        match std::fs::remove_dir_all(prefix_path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

impl ListableStorageTraits for FilesystemStore {
    fn list(&self) -> Result<StoreKeys, StorageError> {
        Ok(self.list_path(&self.base_path))
    }

    fn list_prefix(&self, prefix: &StorePrefix) -> Result<StoreKeys, StorageError> {
        Ok(self.list_path(&self.prefix_to_fs_path(prefix)))
    }
}

/// A filesystem store creation error.
#[derive(Debug, Error)]
pub enum FilesystemStoreCreateError {
    /// An IO error.
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    /// The path is not valid on this system.
    #[error("base path {0} is not valid")]
    InvalidBasePath(PathBuf),
}
