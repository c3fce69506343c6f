mod flag;
mod folder_info;
mod header;
mod mailbox_attribute;
mod suid;
mod uid;

pub use flag::Flags;
pub use folder_info::AccountMeta;
pub use folder_info::FolderImpl;
pub use folder_info::FolderInfo;
pub use folder_info::FolderMeta;
pub use folder_info::FolderTable;
pub use folder_info::FolderType;
pub use header::HeaderRecord;
pub use header::MessageNamer;
pub use mailbox_attribute::MailboxAttribute;
pub use suid::FolderId;
pub use suid::LocalId;
pub use suid::MalformedSuidError;
pub use suid::Suid;
pub use uid::Uid;
