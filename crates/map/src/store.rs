//! File-backed chunk sets.
//!
//! Layout of a chunk set directory:
//! ```text
//! master.json     - MasterDescriptor
//! chunk0.json     - Chunk 0
//! chunk1.json     - Chunk 1
//! ...
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tilechunk_common::ChunkId;

use crate::schema::{Chunk, MasterDescriptor, TileMap};

pub const MASTER_FILE: &str = "master.json";

/// File name of a chunk inside its chunk set directory.
pub fn chunk_file_name(id: ChunkId) -> String {
    format!("{id}.json")
}

/// Errors from reading or writing maps and chunk sets.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON error in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid map data in {}: {reason}", path.display())]
    InvalidMap { path: PathBuf, reason: String },
    #[error("{0} is not part of this chunk set")]
    UnknownChunk(ChunkId),
}

impl MapError {
    fn io(path: &Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Read and validate a source tile map.
pub fn read_tile_map(path: impl AsRef<Path>) -> Result<TileMap, MapError> {
    let path = path.as_ref();
    let map: TileMap = read_json(path)?;
    map.validate().map_err(|reason| MapError::InvalidMap {
        path: path.to_path_buf(),
        reason,
    })?;
    Ok(map)
}

/// A published chunk set on disk.
#[derive(Debug, Clone)]
pub struct ChunkStore {
    root: PathBuf,
    master: MasterDescriptor,
}

impl ChunkStore {
    /// Open an existing chunk set and validate its master descriptor.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, MapError> {
        let root = dir.as_ref().to_path_buf();
        let master_path = root.join(MASTER_FILE);
        let master: MasterDescriptor = read_json(&master_path)?;
        master.validate().map_err(|reason| MapError::InvalidMap {
            path: master_path,
            reason,
        })?;
        tracing::debug!(
            root = %root.display(),
            chunks = master.chunk_count(),
            "opened chunk set"
        );
        Ok(Self { root, master })
    }

    /// Write a complete chunk set to `dir`, replacing whatever was there.
    ///
    /// Files go to a staging directory beside `dir` first; the previous
    /// contents of `dir` are only swapped out once every file is written. On
    /// error the staging directory is removed and `dir` is left as it was.
    pub fn publish(
        dir: impl AsRef<Path>,
        master: &MasterDescriptor,
        chunks: &[Chunk],
    ) -> Result<Self, MapError> {
        let root = dir.as_ref().to_path_buf();
        let parent = match root.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent).map_err(MapError::io(&parent))?;

        let staging = tempfile::Builder::new()
            .prefix(".tilechunk-staging-")
            .tempdir_in(&parent)
            .map_err(MapError::io(&parent))?;

        write_json(&staging.path().join(MASTER_FILE), master)?;
        tracing::debug!("master file written");
        for chunk in chunks {
            write_json(&staging.path().join(chunk_file_name(chunk.id)), chunk)?;
        }

        let backup = if root.exists() {
            let backup = parent.join(format!(".tilechunk-old-{}", std::process::id()));
            if backup.exists() {
                fs::remove_dir_all(&backup).map_err(MapError::io(&backup))?;
            }
            fs::rename(&root, &backup).map_err(MapError::io(&root))?;
            tracing::info!(dir = %root.display(), "output directory cleared");
            Some(backup)
        } else {
            None
        };

        let staged = staging.keep();
        if let Err(source) = fs::rename(&staged, &root) {
            if let Some(backup) = &backup {
                restore_backup(backup, &root);
            }
            let _ = fs::remove_dir_all(&staged);
            return Err(MapError::Io { path: root, source });
        }

        if let Some(backup) = backup {
            if let Err(e) = fs::remove_dir_all(&backup) {
                tracing::warn!(path = %backup.display(), error = %e, "could not remove previous chunk set");
            }
        }

        Ok(Self {
            root,
            master: master.clone(),
        })
    }

    /// Load one chunk file.
    pub fn load_chunk(&self, id: ChunkId) -> Result<Chunk, MapError> {
        if id.0 >= self.master.chunk_count() {
            return Err(MapError::UnknownChunk(id));
        }
        let path = self.chunk_path(id);
        let chunk: Chunk = read_json(&path)?;
        if chunk.id != id {
            return Err(MapError::InvalidMap {
                path,
                reason: format!("file holds {} instead of {id}", chunk.id),
            });
        }
        Ok(chunk)
    }

    pub fn chunk_path(&self, id: ChunkId) -> PathBuf {
        self.root.join(chunk_file_name(id))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn master(&self) -> &MasterDescriptor {
        &self.master
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, MapError> {
    let data = fs::read(path).map_err(MapError::io(path))?;
    serde_json::from_slice(&data).map_err(|source| MapError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), MapError> {
    let bytes = serde_json::to_vec(value).map_err(|source| MapError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, bytes).map_err(MapError::io(path))
}

/// Move a previous chunk set back into place after a failed publish.
fn restore_backup(backup: &Path, root: &Path) -> bool {
    match fs::rename(backup, root) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(
                backup = %backup.display(),
                dir = %root.display(),
                error = %e,
                "could not restore previous chunk set"
            );
            false
        }
    }
}
