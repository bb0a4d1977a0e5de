// SPDX-License-Identifier: MIT OR Apache-2.0
//! Copying a child's output streams.

use crate::error::HostError;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// Copy `reader` to `writer` until end of stream, flushing at the end.
/// Returns the number of bytes copied.
pub async fn copy_bytes<R, W>(mut reader: R, mut writer: W) -> Result<u64, HostError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let n = tokio::io::copy(&mut reader, &mut writer)
        .await
        .map_err(HostError::Copy)?;
    writer.flush().await.map_err(HostError::Copy)?;
    Ok(n)
}

/// Copy `reader` to `writer` line by line, flushing after every line so
/// output from a long-running child shows up promptly. Returns the number of
/// lines copied.
pub async fn copy_lines<R, W>(reader: R, mut writer: W) -> Result<u64, HostError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();
    let mut lines = 0;
    loop {
        line.clear();
        let n = reader
            .read_until(b'\n', &mut line)
            .await
            .map_err(HostError::Copy)?;
        if n == 0 {
            break;
        }
        trace!(target: "leash.copier", bytes = n, "copied line");
        writer.write_all(&line).await.map_err(HostError::Copy)?;
        writer.flush().await.map_err(HostError::Copy)?;
        lines += 1;
    }
    Ok(lines)
}

/// Spawn a task running [`copy_bytes`].
pub fn forward_bytes<R, W>(reader: R, writer: W) -> JoinHandle<Result<u64, HostError>>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let result = copy_bytes(reader, writer).await;
        if let Err(e) = &result {
            debug!(target: "leash.copier", error = %e, "stream copy stopped");
        }
        result
    })
}

/// Spawn a task running [`copy_lines`].
pub fn forward_lines<R, W>(reader: R, writer: W) -> JoinHandle<Result<u64, HostError>>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let result = copy_lines(reader, writer).await;
        if let Err(e) = &result {
            debug!(target: "leash.copier", error = %e, "stream copy stopped");
        }
        result
    })
}
