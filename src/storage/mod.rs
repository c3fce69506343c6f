//! Folder storage seam.
//!
//! The account only talks to cached messages through [`FolderStorage`]. How
//! headers and bodies are laid out on disk is up to the implementation; this
//! crate ships [`MemoryFolderStorage`] for tests and short lived runs.

mod memory;

use bytes::Bytes;
use jiff::Timestamp;
use thiserror::Error;

use crate::repository::{FolderId, FolderInfo, HeaderRecord, LocalId, MessageNamer, Suid};

pub use memory::MemoryFolderStorage;
pub use memory::MemoryStorageProvider;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("no message {0} in storage")]
    UnknownMessage(Suid),
    #[error("no body stored for message {0}")]
    MissingBody(Suid),
    #[error("message {0} does not belong to folder {1}")]
    ForeignMessage(Suid, FolderId),
    #[error("storage of folder {0} was already torn down")]
    Dead(FolderId),
}

/// Per folder cache of header and body records.
pub trait FolderStorage {
    fn folder_id(&self) -> &FolderId;

    /// Loads the headers of `namers`. Messages that are no longer cached are
    /// left out of the result.
    async fn get_message_headers(
        &self,
        namers: &[MessageNamer],
    ) -> Result<Vec<HeaderRecord>, StorageError>;

    async fn update_message_header(
        &self,
        date: Timestamp,
        id: LocalId,
        is_new: bool,
        header: &HeaderRecord,
    ) -> Result<(), StorageError>;

    async fn add_message_header(&self, header: &HeaderRecord) -> Result<(), StorageError>;

    async fn add_message_body(&self, header: &HeaderRecord, body: Bytes)
    -> Result<(), StorageError>;

    async fn delete_message_header_and_body(
        &self,
        header: &HeaderRecord,
    ) -> Result<(), StorageError>;

    async fn get_message_body(&self, suid: &Suid, date: Timestamp) -> Result<Bytes, StorageError>;

    /// Hands out a local id that was never used in this folder before.
    fn issue_new_header_id(&self) -> LocalId;

    /// Drops everything cached for the folder. Called once the folder
    /// disappeared from the server.
    fn you_are_dead_cleanup_after_yourself(&self);
}

/// Creates the storage backing a folder the account knows about.
pub trait StorageProvider {
    type Storage: FolderStorage;

    fn open(&self, info: &FolderInfo) -> Self::Storage;
}
