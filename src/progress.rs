//! Progress reporting for chunked uploads.

/// Progress information for an upload in flight.
#[derive(Debug, Clone)]
pub struct TransferProgress {
    /// Bytes accepted by the remote so far
    pub done: u64,
    /// Total bytes to transfer
    pub total: u64,
    /// Chunks accepted so far
    pub chunks_done: usize,
    /// Total chunk count
    pub chunks_total: usize,
    /// Name of the file being transferred
    pub filename: String,
}

impl TransferProgress {
    /// Create a new progress report.
    pub fn new(
        done: u64,
        total: u64,
        chunks_done: usize,
        chunks_total: usize,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            done,
            total,
            chunks_done,
            chunks_total,
            filename: filename.into(),
        }
    }

    /// Get progress as a percentage (0.0 to 100.0).
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.done as f64 / self.total as f64) * 100.0
    }

    /// Check if transfer is complete.
    pub fn is_complete(&self) -> bool {
        self.done >= self.total
    }
}

/// Type alias for progress callback function.
///
/// Chunks finish out of order, so `done` counts accepted bytes rather than a
/// file offset. The callback can return `false` to cancel the upload.
pub type ProgressCallback = Box<dyn FnMut(&TransferProgress) -> bool + Send>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent() {
        let progress = TransferProgress::new(50, 200, 1, 4, "file.bin");
        assert_eq!(progress.percent(), 25.0);
        assert!(!progress.is_complete());

        let empty = TransferProgress::new(0, 0, 0, 0, "empty");
        assert_eq!(empty.percent(), 0.0);
        assert!(empty.is_complete());
    }
}
