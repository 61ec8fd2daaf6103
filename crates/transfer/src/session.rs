//! Per-transfer session state.

use crate::TransferProgress;

/// Lifecycle of a transfer session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

/// Ephemeral state for one file transfer, from announcement to
/// acknowledgment.
///
/// Owned by the single execution path driving the role, so it needs no
/// locking. `transferred_bytes` only ever grows and never exceeds
/// `total_bytes`.
#[derive(Debug)]
pub struct TransferSession {
    file_name: String,
    total_bytes: u64,
    transferred_bytes: u64,
    status: TransferStatus,
}

impl TransferSession {
    pub fn new(file_name: impl Into<String>, total_bytes: u64) -> Self {
        Self {
            file_name: file_name.into(),
            total_bytes,
            transferred_bytes: 0,
            status: TransferStatus::Pending,
        }
    }

    pub fn start(&mut self) {
        self.status = TransferStatus::InProgress;
    }

    /// Records `bytes` more bytes moved through the loop.
    pub fn add_progress(&mut self, bytes: u64) {
        debug_assert!(self.transferred_bytes + bytes <= self.total_bytes);
        self.transferred_bytes += bytes;
    }

    pub fn complete(&mut self) {
        self.status = TransferStatus::Completed;
    }

    pub fn fail(&mut self) {
        self.status = TransferStatus::Failed;
    }

    pub fn progress(&self) -> TransferProgress {
        TransferProgress {
            transferred_bytes: self.transferred_bytes,
            total_bytes: self.total_bytes,
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn transferred_bytes(&self) -> u64 {
        self.transferred_bytes
    }

    pub fn remaining_bytes(&self) -> u64 {
        self.total_bytes - self.transferred_bytes
    }

    pub fn status(&self) -> TransferStatus {
        self.status
    }
}
