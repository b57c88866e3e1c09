//! Storage operations
//!
//! Implements every file and directory operation against the local filesystem.
//! Each operation resolves its paths through [`PathResolver`] before touching
//! the disk, and every returned [`FileStat`] is re-derived from a fresh query.

use futures::future::{join_all, try_join_all};
use log::{debug, error, info, warn};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncRead, AsyncWriteExt};

use crate::config::StorageConfig;
use crate::error::{StorageError, classify_io_error};
use crate::storage::filesystem::{file_type_of, stat_entry};
use crate::storage::principal::Principal;
use crate::storage::results::{FileStat, FileType};
use crate::storage::validation::{PathResolver, ResolvedPath};
use crate::transfer::file_ops::{FileReader, copy_stream};

/// Principal-scoped storage on the local filesystem.
///
/// There is no in-process locking: concurrent operations on the same path
/// interleave at every filesystem call and rely on the OS for atomicity.
#[derive(Debug, Clone)]
pub struct StorageEngine {
    config: StorageConfig,
    resolver: PathResolver,
}

impl StorageEngine {
    pub fn new(config: StorageConfig) -> Self {
        let resolver = PathResolver::new(&config.files_root());
        Self { config, resolver }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Resolve a principal-relative path, enforcing the sandbox
    pub fn resolve(&self, principal: &Principal, path: &str) -> Result<ResolvedPath, StorageError> {
        self.resolver.resolve(principal, &[path])
    }

    /// Create the principal's root directory if it does not exist yet
    pub async fn init_root(&self, principal: &Principal) -> Result<(), StorageError> {
        let root = self.resolver.principal_root(principal);
        if entry_exists(&root, "").await? {
            return Ok(());
        }

        fs::create_dir_all(&root)
            .await
            .map_err(|e| classify_io_error(e, ""))?;
        info!("Initialized storage root for {principal} ({})", root.display());
        Ok(())
    }

    /// Stat every immediate child of `dir`, in the order the OS reports them
    pub async fn list(&self, principal: &Principal, dir: &str) -> Result<Vec<FileStat>, StorageError> {
        let resolved = self.resolve(principal, dir)?;

        let metadata = fs::symlink_metadata(&resolved.absolute)
            .await
            .map_err(|e| classify_io_error(e, &resolved.relative))?;
        if file_type_of(&metadata) != FileType::Directory {
            return Err(StorageError::NotADirectory(resolved.relative));
        }

        let mut entries = fs::read_dir(&resolved.absolute)
            .await
            .map_err(|e| classify_io_error(e, &resolved.relative))?;

        let mut children = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| classify_io_error(e, &resolved.relative))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            let segments = [resolved.relative.as_str(), name.as_str()];
            children.push(self.resolver.resolve(principal, &segments)?);
        }

        let stats = try_join_all(children.iter().map(stat_entry)).await?;

        debug!(
            "Listed {principal}:/{} - {} entries",
            resolved.relative,
            stats.len()
        );
        Ok(stats)
    }

    pub async fn stat(&self, principal: &Principal, path: &str) -> Result<FileStat, StorageError> {
        let resolved = self.resolve(principal, path)?;
        stat_entry(&resolved).await
    }

    /// Existence check; absence is `Ok(false)`, only sandbox violations and
    /// unexpected OS errors fail
    pub async fn exists(&self, principal: &Principal, path: &str) -> Result<bool, StorageError> {
        let resolved = self.resolve(principal, path)?;
        entry_exists(&resolved.absolute, &resolved.relative).await
    }

    /// Create a directory. With `recursive`, missing parents are created and an
    /// existing directory is not an error.
    pub async fn mkdir(
        &self,
        principal: &Principal,
        dir: &str,
        recursive: bool,
    ) -> Result<FileStat, StorageError> {
        let resolved = self.resolve(principal, dir)?;

        let created = if recursive {
            fs::create_dir_all(&resolved.absolute).await
        } else {
            fs::create_dir(&resolved.absolute).await
        };
        created.map_err(|e| classify_io_error(e, &resolved.relative))?;

        info!("Created directory {principal}:/{}", resolved.relative);
        stat_entry(&resolved).await
    }

    /// Open a file for streaming download
    pub async fn read_file(&self, principal: &Principal, path: &str) -> Result<FileReader, StorageError> {
        let resolved = self.resolve(principal, path)?;

        let file = fs::File::open(&resolved.absolute)
            .await
            .map_err(|e| classify_io_error(e, &resolved.relative))?;
        let metadata = file
            .metadata()
            .await
            .map_err(|e| classify_io_error(e, &resolved.relative))?;

        if metadata.is_dir() {
            return Err(StorageError::Io {
                path: resolved.relative,
                source: io::Error::new(io::ErrorKind::IsADirectory, "cannot read a directory"),
            });
        }

        debug!(
            "Opened {principal}:/{} for reading ({} bytes)",
            resolved.relative,
            metadata.len()
        );
        Ok(FileReader::new(file, metadata.len()))
    }

    /// Create or truncate `path` and drain `source` into it.
    ///
    /// The destination handle is flushed, synced and closed before this returns,
    /// whether the copy succeeded or not.
    pub async fn write_file<R>(
        &self,
        principal: &Principal,
        path: &str,
        mut source: R,
    ) -> Result<FileStat, StorageError>
    where
        R: AsyncRead + Unpin,
    {
        let resolved = self.resolve(principal, path)?;

        let mut file = fs::File::create(&resolved.absolute)
            .await
            .map_err(|e| classify_io_error(e, &resolved.relative))?;

        let copied = copy_stream(&mut source, &mut file, self.config.buffer_size).await;

        let written = match copied {
            Ok(bytes) => file.sync_all().await.map(|()| bytes),
            Err(e) => {
                // Push out whatever was accepted so the handle closes cleanly
                if let Err(flush_err) = file.flush().await {
                    warn!(
                        "Failed to flush {principal}:/{} after aborted copy: {flush_err}",
                        resolved.relative
                    );
                }
                Err(e.into_io())
            }
        };
        drop(file);

        let bytes = written.map_err(|e| {
            error!("Failed to write {principal}:/{}: {e}", resolved.relative);
            StorageError::Io {
                path: resolved.relative.clone(),
                source: e,
            }
        })?;

        info!("Wrote {principal}:/{} ({bytes} bytes)", resolved.relative);
        stat_entry(&resolved).await
    }

    /// Delete an entry and return its metadata as it was just before removal.
    ///
    /// Without `recursive` only files and empty directories are removed.
    pub async fn delete_file(
        &self,
        principal: &Principal,
        path: &str,
        recursive: bool,
    ) -> Result<FileStat, StorageError> {
        let resolved = self.resolve(principal, path)?;
        if resolved.is_root() {
            return Err(StorageError::InvalidPath(path.to_string()));
        }

        let stat = stat_entry(&resolved).await?;

        let removed = match (stat.file_type, recursive) {
            (FileType::Directory, true) => fs::remove_dir_all(&resolved.absolute).await,
            (FileType::Directory, false) => fs::remove_dir(&resolved.absolute).await,
            (FileType::File | FileType::Unknown, _) => fs::remove_file(&resolved.absolute).await,
        };
        removed.map_err(|e| classify_io_error(e, &resolved.relative))?;

        info!(
            "Deleted {principal}:/{} (recursive: {recursive})",
            resolved.relative
        );
        Ok(stat)
    }

    /// Rename `src` to `dst`. An existing destination is never overwritten.
    pub async fn move_file(
        &self,
        principal: &Principal,
        src: &str,
        dst: &str,
    ) -> Result<FileStat, StorageError> {
        let from = self.resolve(principal, src)?;
        let to = self.resolve(principal, dst)?;
        self.rename(principal, &from, &to).await
    }

    /// Move every entry of `sources` into `dst_dir`, keeping base names.
    ///
    /// All moves are issued together and each one runs to completion; the first
    /// failure in input order is returned and earlier successes stay in place.
    pub async fn move_files<S>(
        &self,
        principal: &Principal,
        sources: &[S],
        dst_dir: &str,
    ) -> Result<Vec<FileStat>, StorageError>
    where
        S: AsRef<str>,
    {
        let moves = sources.iter().map(move |src| async move {
            let from = self.resolve(principal, src.as_ref())?;
            let to = self.resolver.resolve(principal, &[dst_dir, from.name()])?;
            self.rename(principal, &from, &to).await
        });

        let results = join_all(moves).await;
        let failed = results.iter().filter(|r| r.is_err()).count();
        if failed > 0 {
            warn!(
                "Moved {}/{} entries of {principal} into /{dst_dir}",
                results.len() - failed,
                results.len()
            );
        }
        results.into_iter().collect()
    }

    /// Host path of an entry, for trusted collaborators only
    pub fn get_absolute_path(&self, principal: &Principal, path: &str) -> Result<PathBuf, StorageError> {
        Ok(self.resolve(principal, path)?.absolute)
    }

    async fn rename(
        &self,
        principal: &Principal,
        from: &ResolvedPath,
        to: &ResolvedPath,
    ) -> Result<FileStat, StorageError> {
        if from.is_root() {
            return Err(StorageError::InvalidPath(from.relative.clone()));
        }

        if !entry_exists(&from.absolute, &from.relative).await? {
            return Err(StorageError::NotFound(from.relative.clone()));
        }
        // Checked before the rename; a concurrent writer can still slip in between.
        if entry_exists(&to.absolute, &to.relative).await? {
            return Err(StorageError::AlreadyExists(to.relative.clone()));
        }

        fs::rename(&from.absolute, &to.absolute)
            .await
            .map_err(|e| match e.kind() {
                // The source was just seen, so a missing path is on the destination side
                io::ErrorKind::NotFound | io::ErrorKind::NotADirectory => {
                    classify_io_error(e, &to.relative)
                }
                _ => classify_io_error(e, &from.relative),
            })?;

        info!(
            "Moved {principal}:/{} -> /{}",
            from.relative, to.relative
        );
        stat_entry(to).await
    }
}

async fn entry_exists(path: &Path, relative: &str) -> Result<bool, StorageError> {
    match fs::symlink_metadata(path).await {
        Ok(_) => Ok(true),
        Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory) => {
            Ok(false)
        }
        Err(e) => Err(classify_io_error(e, relative)),
    }
}
