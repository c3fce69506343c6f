use std::collections::HashMap;

use log::trace;
use tokio::sync::OwnedMutexGuard;

use crate::repository::{FolderId, Suid, Uid};

/// Changes a job attempt wants to make to account state. Only merged when the
/// attempt succeeds.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct JobStateDelta {
    /// `None` forgets the server id of the message.
    pub server_id_map: HashMap<Suid, Option<Uid>>,
    pub move_map: HashMap<Suid, Suid>,
}

/// Exclusive access to a folder for the duration of a job step. Dropping it
/// lets the next waiter in.
#[derive(Debug)]
pub struct FolderLock {
    folder_id: FolderId,
    label: &'static str,
    /// Empty when the job already held the folder through an earlier lock.
    guard: Option<OwnedMutexGuard<()>>,
}

impl FolderLock {
    pub(super) fn new(
        folder_id: FolderId,
        label: &'static str,
        guard: Option<OwnedMutexGuard<()>>,
    ) -> Self {
        Self {
            folder_id,
            label,
            guard,
        }
    }

    pub fn folder_id(&self) -> &FolderId {
        &self.folder_id
    }
}

impl Drop for FolderLock {
    fn drop(&mut self) {
        if self.guard.is_some() {
            trace!("{}: releasing {}", self.label, self.folder_id);
        }
    }
}

/// Scratch state of a single job attempt.
#[derive(Debug, Default)]
pub struct JobContext {
    pub state_delta: JobStateDelta,
    held_locks: Vec<FolderLock>,
}

impl JobContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn held_locks(&self) -> &[FolderLock] {
        &self.held_locks
    }

    pub(super) fn holds(&self, folder_id: &FolderId) -> bool {
        self.held_locks
            .iter()
            .any(|lock| lock.guard.is_some() && &lock.folder_id == folder_id)
    }

    pub(super) fn push_lock(&mut self, lock: FolderLock) {
        self.held_locks.push(lock);
    }

    /// Lets go of the most recently acquired folder.
    pub(super) fn release_last_lock(&mut self) {
        self.held_locks.pop();
    }

    pub(super) fn release_all_locks(&mut self) {
        while self.held_locks.pop().is_some() {}
    }
}
