//! Chunk planning and positional reads.

use std::path::Path;

use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::api::ContentRange;
use crate::error::{Result, UploadError};

const MIB: u64 = 1024 * 1024;

/// Files up to this size use 2 MiB chunks.
pub const SMALL_FILE_SIZE: u64 = 100 * MIB;
/// Files up to this size use 4 MiB chunks.
pub const MEDIUM_FILE_SIZE: u64 = 500 * MIB;
/// Files up to this size use 8 MiB chunks; larger ones use 16 MiB.
pub const LARGE_FILE_SIZE: u64 = 1024 * MIB;

/// One byte range of the source file (`end` inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkTask {
    pub start: u64,
    pub end: u64,
}

#[allow(clippy::len_without_is_empty)]
impl ChunkTask {
    /// Bytes in the range; never zero.
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Range descriptor for a file of `total` bytes.
    pub fn content_range(&self, total: u64) -> ContentRange {
        ContentRange {
            start: self.start,
            end: self.end,
            total,
        }
    }
}

/// Chunk size for a file of `file_size` bytes.
pub fn select_chunk_size(file_size: u64) -> u64 {
    if file_size <= SMALL_FILE_SIZE {
        2 * MIB
    } else if file_size <= MEDIUM_FILE_SIZE {
        4 * MIB
    } else if file_size <= LARGE_FILE_SIZE {
        8 * MIB
    } else {
        16 * MIB
    }
}

/// Partition `[0, file_size)` into consecutive ranges of `chunk_size` bytes,
/// the last one possibly shorter. An empty file yields no tasks.
pub fn plan_chunks(file_size: u64, chunk_size: u64) -> Vec<ChunkTask> {
    let chunk_size = chunk_size.max(1);
    let count = file_size.div_ceil(chunk_size);

    (0..count)
        .map(|index| {
            let start = index * chunk_size;
            ChunkTask {
                start,
                end: (start + chunk_size - 1).min(file_size - 1),
            }
        })
        .collect()
}

/// Read exactly the bytes of `task` from `path`.
///
/// Every call opens its own handle, so concurrent reads at different offsets
/// never share a file cursor. Any failure, including a short read, becomes a
/// `ChunkUpload` error for the range.
pub async fn read_chunk(path: &Path, task: ChunkTask) -> Result<Vec<u8>> {
    let chunk_err = |message: String| UploadError::ChunkUpload {
        start: task.start,
        end: task.end,
        status: None,
        message,
    };

    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|e| chunk_err(format!("failed to open source: {}", e)))?;
    file.seek(std::io::SeekFrom::Start(task.start))
        .await
        .map_err(|e| chunk_err(format!("failed to seek: {}", e)))?;

    let mut buffer = vec![0u8; task.len() as usize];
    file.read_exact(&mut buffer)
        .await
        .map_err(|e| chunk_err(format!("read error: {}", e)))?;

    Ok(buffer)
}
