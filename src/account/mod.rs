//! An account owns the connection pool, the folder registry and the state
//! that outlives single jobs.

mod folder_sync;
mod registry;

use std::{collections::HashMap, sync::Arc};

use log::{debug, info};
use tokio::sync::{Mutex, MutexGuard};

use crate::{
    imap::{ConnectionPool, Connector},
    repository::{FolderId, FolderInfo, FolderMeta, FolderTable, FolderType, Suid, Uid},
    storage::{FolderStorage, StorageProvider},
};

pub use folder_sync::SyncError;
pub use registry::FolderEntry;
pub use registry::FolderRegistry;

#[derive(Debug, Clone, Copy, Default)]
pub struct AccountSettings {
    /// Whether the server keeps message ids stable when a message is moved.
    pub resilient_server_ids: bool,
}

/// State that survives single jobs until every outstanding job is done.
#[derive(Debug, Default)]
pub struct AccountState {
    pub suid_to_server_id: HashMap<Suid, Uid>,
}

pub struct Account<N: Connector, P: StorageProvider> {
    id: String,
    settings: AccountSettings,
    pool: ConnectionPool<N>,
    provider: P,
    folders: Mutex<FolderRegistry<P::Storage>>,
    state: Mutex<AccountState>,
    dead_folder_ids: Mutex<Vec<FolderId>>,
    essential_folder_requests: Mutex<Vec<FolderType>>,
}

impl<N: Connector, P: StorageProvider> Account<N, P> {
    pub fn new(
        id: impl Into<String>,
        settings: AccountSettings,
        connector: N,
        existing_conn: Option<N::Connection>,
        provider: P,
        table: FolderTable,
    ) -> Self {
        let id = id.into();
        let mut registry = FolderRegistry::new(table.meta);
        for info in table.folders {
            debug!("{id}: opening folder {} ({})", info.meta.path(), info.id());
            let storage = provider.open(&info);
            registry.insert(info, storage);
        }

        Self {
            id,
            settings,
            pool: ConnectionPool::new(connector, existing_conn),
            provider,
            folders: Mutex::new(registry),
            state: Mutex::default(),
            dead_folder_ids: Mutex::default(),
            essential_folder_requests: Mutex::default(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn settings(&self) -> AccountSettings {
        self.settings
    }

    pub fn pool(&self) -> &ConnectionPool<N> {
        &self.pool
    }

    pub async fn state(&self) -> MutexGuard<'_, AccountState> {
        self.state.lock().await
    }

    /// Storage and mutation lock of a folder.
    pub async fn folder(
        &self,
        folder_id: &FolderId,
    ) -> Option<(Arc<P::Storage>, Arc<Mutex<()>>)> {
        self.folders
            .lock()
            .await
            .get(folder_id)
            .map(|entry| (Arc::clone(&entry.storage), Arc::clone(&entry.mutex)))
    }

    pub async fn folders(&self) -> Vec<FolderMeta> {
        self.folders
            .lock()
            .await
            .iter()
            .map(|entry| entry.info.meta.clone())
            .collect()
    }

    pub async fn folder_table(&self) -> FolderTable {
        self.folders.lock().await.table()
    }

    pub async fn first_folder_with_type(&self, folder_type: FolderType) -> Option<FolderId> {
        self.folders
            .lock()
            .await
            .first_with_type(folder_type)
            .map(|entry| entry.info.id().clone())
    }

    /// Registers a folder the server reported and creates its storage.
    pub async fn learn_about_folder(
        &self,
        name: String,
        path: String,
        folder_type: FolderType,
    ) -> FolderId {
        let mut folders = self.folders.lock().await;
        let folder_id = folders.issue_folder_id(&self.id);
        info!("{}: learned about {folder_type} folder {path} as {folder_id}", self.id);
        let info = FolderInfo::new(FolderMeta::new(folder_id.clone(), name, path, folder_type));
        let storage = self.provider.open(&info);
        folders.insert(info, storage);
        folder_id
    }

    /// Forgets a folder that vanished from the server and tears down its
    /// storage.
    pub async fn retire_folder(&self, folder_id: &FolderId) {
        let Some(entry) = self.folders.lock().await.remove(folder_id) else {
            return;
        };
        info!(
            "{}: folder {} ({folder_id}) is gone",
            self.id,
            entry.info.meta.path()
        );
        entry.storage.you_are_dead_cleanup_after_yourself();
        self.dead_folder_ids.lock().await.push(folder_id.clone());
    }

    /// Ids of retired folders whose persisted state still has to be removed.
    pub async fn take_dead_folder_ids(&self) -> Vec<FolderId> {
        std::mem::take(&mut *self.dead_folder_ids.lock().await)
    }

    /// Asks for the creation of every essential folder the account lacks.
    pub async fn ensure_essential_folders(&self) {
        let folders = self.folders.lock().await;
        let mut requests = self.essential_folder_requests.lock().await;
        for folder_type in FolderType::ESSENTIAL {
            if folders.first_with_type(folder_type).is_none() && !requests.contains(&folder_type) {
                info!("{}: requesting creation of a {folder_type} folder", self.id);
                requests.push(folder_type);
            }
        }
    }

    pub async fn take_essential_folder_requests(&self) -> Vec<FolderType> {
        std::mem::take(&mut *self.essential_folder_requests.lock().await)
    }

    /// Forgets every server id remap once no job is outstanding anymore.
    pub async fn all_jobs_done(&self) {
        let mut state = self.state.lock().await;
        debug!(
            "{}: dropping {} server id remaps",
            self.id,
            state.suid_to_server_id.len()
        );
        state.suid_to_server_id.clear();
    }
}

#[cfg(test)]
mod tests {
    use assertables::*;
    use rstest::*;

    use super::*;
    use crate::fixtures::{TestAccount, account_with};

    #[fixture]
    fn account() -> TestAccount {
        account_with(&[("INBOX", FolderType::Inbox), ("Sent", FolderType::Sent)])
    }

    #[rstest]
    #[tokio::test]
    async fn test_persisted_folders_are_opened(account: TestAccount) {
        let folders = account.folders().await;
        assert_eq!(
            vec!["INBOX", "Sent"],
            folders.iter().map(FolderMeta::path).collect::<Vec<_>>()
        );
        let inbox = folders[0].id();
        assert_some!(account.folder(inbox).await);
    }

    #[rstest]
    #[tokio::test]
    async fn test_learned_folder_gets_next_id(account: TestAccount) {
        let id = account
            .learn_about_folder("Trash".to_string(), "Trash".to_string(), FolderType::Trash)
            .await;
        assert_eq!(FolderId::new("acct-1"), id);
        assert_eq!(Some(id), account.first_folder_with_type(FolderType::Trash).await);
        assert_eq!(3, account.folder_table().await.meta.next_folder_num);
    }

    #[rstest]
    #[tokio::test]
    async fn test_retired_folder_is_torn_down(account: TestAccount) {
        let sent = assert_some!(account.first_folder_with_type(FolderType::Sent).await);
        let (storage, _) = assert_some!(account.folder(&sent).await);
        account.retire_folder(&sent).await;

        assert!(storage.is_dead());
        assert_none!(account.folder(&sent).await);
        assert_eq!(vec![sent], account.take_dead_folder_ids().await);
        assert_is_empty!(account.take_dead_folder_ids().await);
    }

    #[rstest]
    #[tokio::test]
    async fn test_essential_folders_are_requested_once(account: TestAccount) {
        account.ensure_essential_folders().await;
        account.ensure_essential_folders().await;
        assert_eq!(
            vec![FolderType::Trash],
            account.take_essential_folder_requests().await
        );
    }

    #[rstest]
    #[tokio::test]
    async fn test_all_jobs_done_drops_remaps(account: TestAccount) {
        let folders = account.folders().await;
        let suid = Suid::new(folders[0].id().clone(), crate::repository::LocalId::new(0));
        account
            .state()
            .await
            .suid_to_server_id
            .insert(suid, assert_ok!(Uid::try_from(7)));
        account.all_jobs_done().await;
        assert_is_empty!(account.state().await.suid_to_server_id);
    }
}
