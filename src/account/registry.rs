use std::sync::Arc;

use tokio::sync::Mutex;

use crate::repository::{AccountMeta, FolderId, FolderInfo, FolderTable, FolderType};

/// A known folder together with its storage and its mutation lock.
#[derive(Debug)]
pub struct FolderEntry<S> {
    pub info: FolderInfo,
    pub storage: Arc<S>,
    pub mutex: Arc<Mutex<()>>,
}

/// Folders of one account, kept in the order they were learned.
#[derive(Debug)]
pub struct FolderRegistry<S> {
    meta: AccountMeta,
    entries: Vec<FolderEntry<S>>,
}

impl<S> FolderRegistry<S> {
    pub fn new(meta: AccountMeta) -> Self {
        Self {
            meta,
            entries: Vec::new(),
        }
    }

    pub fn issue_folder_id(&mut self, account: &str) -> FolderId {
        let id = FolderId::for_account(account, self.meta.next_folder_num);
        self.meta.next_folder_num += 1;
        id
    }

    pub fn insert(&mut self, info: FolderInfo, storage: S) {
        self.entries.push(FolderEntry {
            info,
            storage: Arc::new(storage),
            mutex: Arc::default(),
        });
    }

    pub fn remove(&mut self, folder_id: &FolderId) -> Option<FolderEntry<S>> {
        let index = self
            .entries
            .iter()
            .position(|entry| entry.info.id() == folder_id)?;
        Some(self.entries.remove(index))
    }

    pub fn get(&self, folder_id: &FolderId) -> Option<&FolderEntry<S>> {
        self.entries.iter().find(|entry| entry.info.id() == folder_id)
    }

    pub fn by_path(&self, path: &str) -> Option<&FolderEntry<S>> {
        self.entries
            .iter()
            .find(|entry| entry.info.meta.path() == path)
    }

    pub fn first_with_type(&self, folder_type: FolderType) -> Option<&FolderEntry<S>> {
        self.entries
            .iter()
            .find(|entry| entry.info.meta.folder_type() == folder_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FolderEntry<S>> {
        self.entries.iter()
    }

    pub fn table(&self) -> FolderTable {
        FolderTable {
            meta: self.meta.clone(),
            folders: self.entries.iter().map(|entry| entry.info.clone()).collect(),
        }
    }
}
