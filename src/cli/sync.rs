use std::{
    fs::{create_dir_all, read_to_string, write},
    io::ErrorKind,
    path::Path,
};

use anyhow::Context as _;
use log::{debug, info, warn};

use crate::{
    account::Account,
    config::{AuthConfig, Config},
    imap::ImapConnector,
    repository::FolderTable,
    storage::MemoryStorageProvider,
};

const FOLDER_TABLE: &str = "folders.toml";

/// Syncs the folder list of `account`, prints it and persists it in the
/// account's state directory.
pub fn sync_folders(config: &Config, account: &str) -> anyhow::Result<()> {
    let account_config = config.account(account)?;
    let AuthConfig::Plain(auth) = account_config.auth();
    let connector = ImapConnector::new(
        account_config.host().clone(),
        account_config.port(),
        auth.user().clone(),
        auth.password()?,
    );
    let state_dir = config.account_state_dir(account);
    let table = load_folder_table(&state_dir)?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_io()
        .build()
        .context("tokio runtime should be buildable")?;
    let table = rt.block_on(async {
        let account = Account::new(
            account,
            account_config.settings(),
            connector,
            None,
            MemoryStorageProvider,
            table,
        );
        account.sync_folder_list().await?;
        for folder_id in account.take_dead_folder_ids().await {
            debug!("dropping state of {folder_id}");
        }
        for meta in account.folders().await {
            println!("{}\t{}\t{}", meta.id(), meta.folder_type(), meta.path());
        }
        account.ensure_essential_folders().await;
        for folder_type in account.take_essential_folder_requests().await {
            warn!("{}: no {folder_type} folder on the server", account.id());
        }
        anyhow::Ok(account.folder_table().await)
    })?;

    save_folder_table(&state_dir, &table)?;
    info!("{account}: {} folders", table.folders.len());
    Ok(())
}

fn load_folder_table(state_dir: &Path) -> anyhow::Result<FolderTable> {
    let path = state_dir.join(FOLDER_TABLE);
    match read_to_string(&path) {
        Ok(contents) => toml::from_str(&contents)
            .with_context(|| format!("{} should be parsable", path.display())),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("no folder table at {}, starting fresh", path.display());
            Ok(FolderTable::default())
        }
        Err(e) => Err(e).with_context(|| format!("{} should be readable", path.display())),
    }
}

fn save_folder_table(state_dir: &Path, table: &FolderTable) -> anyhow::Result<()> {
    create_dir_all(state_dir)
        .with_context(|| format!("{} should be creatable", state_dir.display()))?;
    let path = state_dir.join(FOLDER_TABLE);
    write(&path, toml::to_string_pretty(table)?)
        .with_context(|| format!("{} should be writable", path.display()))
}

#[cfg(test)]
mod tests {
    use assertables::*;
    use rstest::*;

    use super::*;
    use crate::{fixtures::table, repository::FolderType};

    #[rstest]
    fn test_missing_table_starts_empty() {
        let dir = tempfile::tempdir().expect("temp dir should be creatable");
        let table = assert_ok!(load_folder_table(dir.path()));
        assert_eq!(FolderTable::default(), table);
    }

    #[rstest]
    fn test_saved_table_is_loaded_again() {
        let dir = tempfile::tempdir().expect("temp dir should be creatable");
        let state_dir = dir.path().join("acct");
        let saved = table(&[("INBOX", FolderType::Inbox), ("Lists", FolderType::Nomail)]);

        assert_ok!(save_folder_table(&state_dir, &saved));
        assert_eq!(saved, assert_ok!(load_folder_table(&state_dir)));
    }
}
