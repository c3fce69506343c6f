use std::collections::HashSet;

use enumflags2::BitFlags;
use log::{debug, trace};
use thiserror::Error;

use crate::{
    account::Account,
    imap::{ConnectionError, Connector, MailboxNode, PoolError, ProtocolConnection},
    repository::{FolderId, FolderType, MailboxAttribute},
    storage::StorageProvider,
};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error("could not list folders: {0}")]
    List(#[from] ConnectionError),
}

#[derive(Debug, PartialEq)]
struct ServerFolder {
    name: String,
    path: String,
    folder_type: FolderType,
}

impl<N: Connector, P: StorageProvider> Account<N, P> {
    /// Brings the folder registry in line with the server's folder list.
    /// New folders are learned, vanished ones retired, known ones left alone.
    pub async fn sync_folder_list(&self) -> Result<(), SyncError> {
        let mut conn = self.pool().demand(None, "sync_folder_list").await?;
        let boxes = conn.get_boxes().await;
        self.pool().release(conn).await;
        let boxes = boxes?;

        let mut server_folders = Vec::new();
        walk(&boxes.roots, "", &mut server_folders);

        let mut seen = HashSet::with_capacity(server_folders.len());
        for folder in server_folders {
            trace!("server has {} ({})", folder.path, folder.folder_type);
            let known = self.folders.lock().await.by_path(&folder.path).is_some();
            if !known {
                self.learn_about_folder(folder.name, folder.path.clone(), folder.folder_type)
                    .await;
            }
            seen.insert(folder.path);
        }

        let vanished: Vec<FolderId> = self
            .folders
            .lock()
            .await
            .iter()
            .filter(|entry| !seen.contains(entry.info.meta.path()))
            .map(|entry| entry.info.id().clone())
            .collect();
        for folder_id in &vanished {
            self.retire_folder(folder_id).await;
        }

        debug!(
            "{}: folder list synced, {} on server, {} retired",
            self.id(),
            seen.len(),
            vanished.len()
        );
        Ok(())
    }
}

fn walk(nodes: &[MailboxNode], prefix: &str, out: &mut Vec<ServerFolder>) {
    for node in nodes {
        let path = format!("{prefix}{}", node.name);
        let child_prefix = format!("{path}{}", node.delimiter.as_deref().unwrap_or_default());
        out.push(server_folder(node, path));
        walk(&node.children, &child_prefix, out);
    }
}

fn server_folder(node: &MailboxNode, path: String) -> ServerFolder {
    let folder_type = if node.is_selectable() {
        type_from_attributes(node.attributes)
            .or_else(|| type_from_path(&path))
            .unwrap_or(FolderType::Normal)
    } else {
        FolderType::Nomail
    };
    ServerFolder {
        name: node.name.clone(),
        path,
        folder_type,
    }
}

/// Special-use attributes in order of precedence.
fn type_from_attributes(attributes: BitFlags<MailboxAttribute>) -> Option<FolderType> {
    use MailboxAttribute as A;

    [
        (A::All | A::AllMail | A::Archive, FolderType::Archive),
        (BitFlags::from(A::Drafts), FolderType::Drafts),
        (A::Flagged | A::Starred, FolderType::Starred),
        (BitFlags::from(A::Inbox), FolderType::Inbox),
        (A::Junk | A::Spam, FolderType::Junk),
        (BitFlags::from(A::Sent), FolderType::Sent),
        (BitFlags::from(A::Trash), FolderType::Trash),
    ]
    .into_iter()
    .find(|(flags, _)| attributes.intersects(*flags))
    .map(|(_, folder_type)| folder_type)
}

fn type_from_path(path: &str) -> Option<FolderType> {
    match path.to_uppercase().as_str() {
        "DRAFT" | "DRAFTS" => Some(FolderType::Drafts),
        "INBOX" => Some(FolderType::Inbox),
        "JUNK" | "SPAM" => Some(FolderType::Junk),
        "SENT" => Some(FolderType::Sent),
        "TRASH" => Some(FolderType::Trash),
        _ => None,
    }
}
