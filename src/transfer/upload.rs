//! Upload adapter
//!
//! Streams an inbound upload into a freshly named file under the configured
//! upload directory and removes the partial file if the transfer is aborted
//! or the copy fails.

use log::{debug, info, warn};
use std::sync::Arc;
use tokio::io::AsyncRead;
use uuid::Uuid;

use crate::error::{ErrorKind, StorageError, UploadError};
use crate::storage::{FileStat, Principal, StorageEngine};
use crate::transfer::abort::AbortSignal;
use crate::transfer::results::{UploadDescriptor, UploadedFile};

/// Random on-disk name; never derived from the client-supplied filename
pub fn generate_filename() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Bridges one kind of inbound upload stream to a [`StorageEngine`]
#[derive(Debug, Clone)]
pub struct UploadAdapter {
    engine: Arc<StorageEngine>,
    upload_path: String,
}

impl UploadAdapter {
    /// Adapter writing into the engine's configured upload directory
    pub fn new(engine: Arc<StorageEngine>) -> Self {
        let upload_path = engine.config().upload_path.clone();
        Self {
            engine,
            upload_path,
        }
    }

    pub fn with_upload_path(engine: Arc<StorageEngine>, upload_path: impl Into<String>) -> Self {
        Self {
            engine,
            upload_path: upload_path.into(),
        }
    }

    pub fn upload_path(&self) -> &str {
        &self.upload_path
    }

    /// Store `stream` as a new file for `principal`.
    ///
    /// `abort` is watched for the whole transfer. If it fires first, the write
    /// is abandoned, the partial file is removed on a best-effort basis and
    /// [`UploadError::Aborted`] is returned. A failed copy is cleaned up the same
    /// way. Directory or write failures abort the upload without retry.
    pub async fn handle_file<R>(
        &self,
        principal: &Principal,
        descriptor: UploadDescriptor,
        stream: R,
        mut abort: AbortSignal,
    ) -> Result<UploadedFile, UploadError>
    where
        R: AsyncRead + Unpin,
    {
        if !self.engine.exists(principal, &self.upload_path).await? {
            self.engine.mkdir(principal, &self.upload_path, true).await?;
        }

        let filename = generate_filename();
        let target = format!("{}/{}", self.upload_path.trim_end_matches('/'), filename);
        debug!(
            "Receiving upload {:?} for {principal} into /{target}",
            descriptor.original_name
        );

        // The abort branch is polled first so a cancelled transfer never
        // reports success.
        let written = tokio::select! {
            biased;
            () = abort.aborted() => None,
            result = self.engine.write_file(principal, &target, stream) => Some(result),
        };

        let Some(written) = written else {
            warn!(
                "Upload {:?} for {principal} aborted, discarding /{target}",
                descriptor.original_name
            );
            self.discard(principal, &target).await;
            return Err(UploadError::Aborted(target));
        };

        let stat = match written {
            Ok(stat) => stat,
            Err(e) => {
                // Only a failed copy leaves bytes behind; earlier failures
                // happen before the file is created.
                if e.kind() == ErrorKind::IoFailure {
                    warn!(
                        "Upload {:?} for {principal} failed, discarding /{target}",
                        descriptor.original_name
                    );
                    self.discard(principal, &target).await;
                }
                return Err(e.into());
            }
        };
        info!(
            "Upload {:?} for {principal} completed: /{} ({} bytes)",
            descriptor.original_name,
            stat.fullpath,
            stat.size
        );

        Ok(UploadedFile {
            path: stat.fullpath,
            size: stat.size,
            mime_type: descriptor.mime_type,
            filename,
            encoding: descriptor.encoding,
            modify_time: stat.modify_time,
            original_name: descriptor.original_name,
        })
    }

    /// Remove a previously stored upload (non-recursive)
    pub async fn remove_file(
        &self,
        principal: &Principal,
        path: &str,
    ) -> Result<FileStat, StorageError> {
        self.engine.delete_file(principal, path, false).await
    }

    async fn discard(&self, principal: &Principal, target: &str) {
        match self.engine.delete_file(principal, target, false).await {
            Ok(_) => debug!("Removed partial upload /{target}"),
            // The write may not have created the file yet
            Err(StorageError::NotFound(_)) => debug!("No partial upload at /{target}"),
            Err(e) => warn!("Failed to remove partial upload /{target}: {e}"),
        }
    }
}
