use bytes::Bytes;
use jiff::Timestamp;

use crate::{
    account::{Account, AccountSettings},
    imap::mock_connection::MockConnector,
    repository::{
        AccountMeta, FolderId, FolderInfo, FolderMeta, FolderTable, FolderType, HeaderRecord, Uid,
    },
    storage::{FolderStorage as _, MemoryStorageProvider},
};

pub type TestAccount = Account<MockConnector, MemoryStorageProvider>;

pub fn table(folders: &[(&str, FolderType)]) -> FolderTable {
    FolderTable {
        meta: AccountMeta {
            next_folder_num: folders.len() as u64,
        },
        folders: folders
            .iter()
            .enumerate()
            .map(|(number, (path, folder_type))| {
                FolderInfo::new(FolderMeta::new(
                    FolderId::for_account("acct", number as u64),
                    (*path).to_string(),
                    (*path).to_string(),
                    *folder_type,
                ))
            })
            .collect(),
    }
}

pub fn account_on(
    connector: MockConnector,
    settings: AccountSettings,
    folders: &[(&str, FolderType)],
) -> TestAccount {
    Account::new(
        "acct",
        settings,
        connector,
        None,
        MemoryStorageProvider,
        table(folders),
    )
}

pub fn account_with(folders: &[(&str, FolderType)]) -> TestAccount {
    account_on(MockConnector::default(), AccountSettings::default(), folders)
}

pub async fn folder_of(account: &TestAccount, path: &str) -> FolderId {
    account
        .folders()
        .await
        .into_iter()
        .find(|meta| meta.path() == path)
        .map(|meta| meta.id().clone())
        .expect("fixture folder should exist")
}

pub fn body_of(header: &HeaderRecord) -> Bytes {
    Bytes::from(format!("body of {}", header.suid))
}

/// Caches a message with the given server id and flags in the folder at
/// `path`.
pub async fn seed(
    account: &TestAccount,
    path: &str,
    srvid: Option<u32>,
    flags: &[&str],
) -> HeaderRecord {
    let folder_id = folder_of(account, path).await;
    let (storage, _) = account
        .folder(&folder_id)
        .await
        .expect("fixture folder should have storage");
    let mut header = HeaderRecord::new(
        folder_id,
        storage.issue_new_header_id(),
        Timestamp::from_second(1_700_000_000).expect("fixture date should be valid"),
    )
    .with_flags(flags.iter().collect());
    if let Some(srvid) = srvid {
        header = header.with_srvid(Uid::try_from(srvid).expect("fixture uid should be non zero"));
    }
    storage
        .store(header.clone(), body_of(&header))
        .await
        .expect("fixture message should be storable");
    header
}
