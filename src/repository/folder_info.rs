use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::repository::FolderId;

/// Semantic role of a folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FolderType {
    Inbox,
    Drafts,
    Sent,
    Trash,
    Junk,
    Archive,
    Starred,
    Normal,
    /// Exists only as a container for other folders.
    Nomail,
}

impl FolderType {
    /// Folders the account wants to exist before it can process jobs.
    pub const ESSENTIAL: [FolderType; 2] = [FolderType::Trash, FolderType::Sent];
}

impl Display for FolderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FolderType::Inbox => "inbox",
            FolderType::Drafts => "drafts",
            FolderType::Sent => "sent",
            FolderType::Trash => "trash",
            FolderType::Junk => "junk",
            FolderType::Archive => "archive",
            FolderType::Starred => "starred",
            FolderType::Normal => "normal",
            FolderType::Nomail => "nomail",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderMeta {
    id: FolderId,
    name: String,
    path: String,
    #[serde(rename = "type")]
    folder_type: FolderType,
}

impl FolderMeta {
    pub fn new(id: FolderId, name: String, path: String, folder_type: FolderType) -> Self {
        Self {
            id,
            name,
            path,
            folder_type,
        }
    }

    pub fn id(&self) -> &FolderId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn folder_type(&self) -> FolderType {
        self.folder_type
    }
}

/// Block allocation counters private to the folder storage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderImpl {
    pub next_header_block: u32,
    pub next_body_block: u32,
}

/// Persisted state of one folder. Everything beyond `$meta` is owned by the
/// folder storage and only created or dropped here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderInfo {
    #[serde(rename = "$meta")]
    pub meta: FolderMeta,
    #[serde(rename = "$impl")]
    pub implementation: FolderImpl,
    #[serde(default)]
    pub accuracy: Vec<toml::Table>,
    #[serde(default)]
    pub header_blocks: Vec<toml::Table>,
    #[serde(default)]
    pub body_blocks: Vec<toml::Table>,
}

impl FolderInfo {
    pub fn new(meta: FolderMeta) -> Self {
        Self {
            meta,
            implementation: FolderImpl::default(),
            accuracy: Vec::new(),
            header_blocks: Vec::new(),
            body_blocks: Vec::new(),
        }
    }

    pub fn id(&self) -> &FolderId {
        self.meta.id()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountMeta {
    pub next_folder_num: u64,
}

/// Everything the account persists about its folders.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FolderTable {
    #[serde(rename = "$meta")]
    pub meta: AccountMeta,
    #[serde(default)]
    pub folders: Vec<FolderInfo>,
}
