//! Blob persistence for document content.
//!
//! The trait is synchronous: the SQLite backend calls it from inside its
//! transaction closure, which already runs on a dedicated thread. Callers on
//! the async runtime wrap reads in `spawn_blocking`.

use std::{
  fs,
  io::{self, Write as _},
  path::{Component, Path, PathBuf},
};

use tracing::debug;

/// Storage backend for raw document bytes, addressed by relative path.
pub trait BlobStore: Send + Sync + 'static {
  /// Write `data` at `path`, replacing any existing blob.
  fn write(&self, path: &str, data: &[u8]) -> io::Result<()>;

  fn read(&self, path: &str) -> io::Result<Vec<u8>>;

  /// Remove the blob at `path`. A blob that is already gone is not an error.
  fn delete(&self, path: &str) -> io::Result<()>;

  fn exists(&self, path: &str) -> io::Result<bool>;
}

/// Filesystem backend: every blob is a file directly under `root`.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
  root: PathBuf,
}

impl FsBlobStore {
  /// Use `root` as the blob directory, creating it if needed.
  pub fn open(root: impl Into<PathBuf>) -> io::Result<Self> {
    let root = root.into();
    fs::create_dir_all(&root)?;
    Ok(Self { root })
  }

  pub fn root(&self) -> &Path { &self.root }

  /// Resolve `path` under the root, refusing anything that could escape it.
  fn full_path(&self, path: &str) -> io::Result<PathBuf> {
    let rel = Path::new(path);
    let plain = !path.is_empty()
      && rel.components().all(|c| matches!(c, Component::Normal(_)));
    if !plain {
      return Err(io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("blob path {path:?} is not a plain relative path"),
      ));
    }
    Ok(self.root.join(rel))
  }
}

impl BlobStore for FsBlobStore {
  fn write(&self, path: &str, data: &[u8]) -> io::Result<()> {
    let full_path = self.full_path(path)?;
    debug!(blob = %path, size = data.len(), "blob: write");

    if let Some(parent) = full_path.parent() {
      fs::create_dir_all(parent)?;
    }

    // Write to a sibling temp file and rename, so readers never observe a
    // partially written blob.
    let mut temp_name = full_path.clone().into_os_string();
    temp_name.push(".tmp");
    let temp_path = PathBuf::from(temp_name);
    let mut file = fs::File::create(&temp_path)?;
    let written = file.write_all(data).and_then(|()| file.sync_all());
    drop(file);
    if let Err(e) = written {
      let _ = fs::remove_file(&temp_path);
      return Err(e);
    }
    fs::rename(&temp_path, &full_path)
  }

  fn read(&self, path: &str) -> io::Result<Vec<u8>> {
    let full_path = self.full_path(path)?;
    debug!(blob = %path, "blob: read");
    fs::read(full_path)
  }

  fn delete(&self, path: &str) -> io::Result<()> {
    let full_path = self.full_path(path)?;
    debug!(blob = %path, "blob: delete");
    match fs::remove_file(full_path) {
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
      other => other,
    }
  }

  fn exists(&self, path: &str) -> io::Result<bool> {
    self.full_path(path)?.try_exists()
  }
}
