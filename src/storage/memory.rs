use std::{
    collections::{BTreeMap, HashMap},
    sync::atomic::{AtomicBool, AtomicU32, Ordering},
};

use bytes::Bytes;
use jiff::Timestamp;
use log::{debug, trace, warn};
use tokio::sync::Mutex;

use crate::{
    repository::{FolderId, FolderInfo, HeaderRecord, LocalId, MessageNamer, Suid},
    storage::{FolderStorage, StorageError, StorageProvider},
};

#[derive(Debug, Default)]
struct Messages {
    headers: BTreeMap<LocalId, HeaderRecord>,
    bodies: HashMap<LocalId, Bytes>,
}

/// Keeps a folder's headers and bodies in memory.
#[derive(Debug)]
pub struct MemoryFolderStorage {
    folder_id: FolderId,
    messages: Mutex<Messages>,
    next_id: AtomicU32,
    dead: AtomicBool,
}

impl MemoryFolderStorage {
    pub fn new(folder_id: FolderId) -> Self {
        Self {
            folder_id,
            messages: Mutex::default(),
            next_id: AtomicU32::new(0),
            dead: AtomicBool::new(false),
        }
    }

    /// Caches a message that was fetched from elsewhere.
    pub async fn store(&self, header: HeaderRecord, body: Bytes) -> Result<(), StorageError> {
        self.add_message_body(&header, body).await?;
        self.add_message_header(&header).await
    }

    pub async fn header(&self, id: LocalId) -> Option<HeaderRecord> {
        self.messages.lock().await.headers.get(&id).cloned()
    }

    pub async fn headers(&self) -> Vec<HeaderRecord> {
        self.messages.lock().await.headers.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.messages.lock().await.headers.len()
    }

    pub fn is_dead(&self) -> bool {
        self.dead.load(Ordering::Relaxed)
    }

    fn check_alive(&self) -> Result<(), StorageError> {
        if self.is_dead() {
            Err(StorageError::Dead(self.folder_id.clone()))
        } else {
            Ok(())
        }
    }

    fn check_owned(&self, suid: &Suid) -> Result<(), StorageError> {
        if suid.folder_id() == &self.folder_id {
            Ok(())
        } else {
            Err(StorageError::ForeignMessage(
                suid.clone(),
                self.folder_id.clone(),
            ))
        }
    }
}

impl FolderStorage for MemoryFolderStorage {
    fn folder_id(&self) -> &FolderId {
        &self.folder_id
    }

    async fn get_message_headers(
        &self,
        namers: &[MessageNamer],
    ) -> Result<Vec<HeaderRecord>, StorageError> {
        self.check_alive()?;
        let messages = self.messages.lock().await;
        let mut headers = Vec::with_capacity(namers.len());
        for namer in namers {
            self.check_owned(namer.suid())?;
            if let Some(header) = messages.headers.get(&namer.suid().id()) {
                headers.push(header.clone());
            } else {
                warn!("message {} is not cached anymore", namer.suid());
            }
        }
        Ok(headers)
    }

    async fn update_message_header(
        &self,
        _date: Timestamp,
        id: LocalId,
        is_new: bool,
        header: &HeaderRecord,
    ) -> Result<(), StorageError> {
        self.check_alive()?;
        self.check_owned(&header.suid)?;
        let mut messages = self.messages.lock().await;
        if !is_new && !messages.headers.contains_key(&id) {
            return Err(StorageError::UnknownMessage(header.suid.clone()));
        }
        trace!("updating header {} to {}", header.suid, header.flags);
        messages.headers.insert(id, header.clone());
        Ok(())
    }

    async fn add_message_header(&self, header: &HeaderRecord) -> Result<(), StorageError> {
        self.check_alive()?;
        self.check_owned(&header.suid)?;
        trace!("adding header {}", header.suid);
        self.messages
            .lock()
            .await
            .headers
            .insert(header.id, header.clone());
        // keep ids unique for records added with an id issued elsewhere
        self.next_id
            .fetch_max(u32::from(header.id) + 1, Ordering::Relaxed);
        Ok(())
    }

    async fn add_message_body(
        &self,
        header: &HeaderRecord,
        body: Bytes,
    ) -> Result<(), StorageError> {
        self.check_alive()?;
        self.check_owned(&header.suid)?;
        trace!("adding body of {}", header.suid);
        self.messages.lock().await.bodies.insert(header.id, body);
        Ok(())
    }

    async fn delete_message_header_and_body(
        &self,
        header: &HeaderRecord,
    ) -> Result<(), StorageError> {
        self.check_alive()?;
        self.check_owned(&header.suid)?;
        let mut messages = self.messages.lock().await;
        if messages.headers.remove(&header.id).is_none() {
            return Err(StorageError::UnknownMessage(header.suid.clone()));
        }
        messages.bodies.remove(&header.id);
        trace!("deleted {}", header.suid);
        Ok(())
    }

    async fn get_message_body(&self, suid: &Suid, _date: Timestamp) -> Result<Bytes, StorageError> {
        self.check_alive()?;
        self.check_owned(suid)?;
        self.messages
            .lock()
            .await
            .bodies
            .get(&suid.id())
            .cloned()
            .ok_or_else(|| StorageError::MissingBody(suid.clone()))
    }

    fn issue_new_header_id(&self) -> LocalId {
        LocalId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn you_are_dead_cleanup_after_yourself(&self) {
        debug!("dropping cached messages of dead folder {}", self.folder_id);
        self.dead.store(true, Ordering::Relaxed);
        if let Ok(mut messages) = self.messages.try_lock() {
            messages.headers.clear();
            messages.bodies.clear();
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MemoryStorageProvider;

impl StorageProvider for MemoryStorageProvider {
    type Storage = MemoryFolderStorage;

    fn open(&self, info: &FolderInfo) -> Self::Storage {
        MemoryFolderStorage::new(info.id().clone())
    }
}
