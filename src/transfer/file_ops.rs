//! Module `file_ops`
//!
//! Streaming primitives used by the storage engine: a chunked copy from any
//! async byte source into a destination file, and the download handle
//! returned by `read_file`. Neither side ever buffers a whole file.

use log::debug;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt, ReadBuf};

/// Which side of a copy failed
#[derive(Debug)]
pub enum CopyError {
    Read(io::Error),
    Write(io::Error),
}

impl CopyError {
    pub fn into_io(self) -> io::Error {
        match self {
            CopyError::Read(e) | CopyError::Write(e) => e,
        }
    }
}

/// Drain `source` into `dest` in `buffer_size` chunks.
///
/// Returns the number of bytes copied. The destination is flushed on success;
/// on failure the caller still owns `dest` and is responsible for closing it.
pub async fn copy_stream<R>(
    source: &mut R,
    dest: &mut File,
    buffer_size: usize,
) -> Result<u64, CopyError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut buffer = vec![0u8; buffer_size.max(1)];
    let mut total_bytes = 0u64;

    loop {
        let n = match source.read(&mut buffer).await {
            Ok(0) => break, // EOF
            Ok(n) => n,
            Err(e) => {
                debug!("Read failure after {total_bytes} bytes");
                return Err(CopyError::Read(e));
            }
        };

        if let Err(e) = dest.write_all(&buffer[..n]).await {
            debug!("Write failure after {total_bytes} bytes");
            return Err(CopyError::Write(e));
        }

        total_bytes += n as u64;
    }

    dest.flush().await.map_err(CopyError::Write)?;
    debug!("Copied {total_bytes} bytes");
    Ok(total_bytes)
}

/// Single-pass download handle for one file.
///
/// Each `read_file` call opens a fresh handle, so reading again means asking
/// the engine for a new reader.
#[derive(Debug)]
pub struct FileReader {
    file: File,
    size: u64,
}

impl FileReader {
    pub(crate) fn new(file: File, size: u64) -> Self {
        Self { file, size }
    }

    /// Size of the file when it was opened
    pub fn size(&self) -> u64 {
        self.size
    }
}

impl AsyncRead for FileReader {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().file).poll_read(cx, buf)
    }
}
