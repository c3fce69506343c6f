use jiff::Timestamp;

use crate::repository::{FolderId, Flags, LocalId, Suid, Uid};

/// Lightweight reference to a cached message.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageNamer {
    suid: Suid,
    date: Timestamp,
}

impl MessageNamer {
    pub fn new(suid: Suid, date: Timestamp) -> Self {
        Self { suid, date }
    }

    pub fn suid(&self) -> &Suid {
        &self.suid
    }

    pub fn date(&self) -> Timestamp {
        self.date
    }

    pub fn folder_id(&self) -> &FolderId {
        self.suid.folder_id()
    }
}

/// Cached metadata of a single message, owned by its folder's storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderRecord {
    pub id: LocalId,
    pub suid: Suid,
    pub srvid: Option<Uid>,
    pub date: Timestamp,
    pub flags: Flags,
}

impl HeaderRecord {
    pub fn new(folder_id: FolderId, id: LocalId, date: Timestamp) -> Self {
        Self {
            id,
            suid: Suid::new(folder_id, id),
            srvid: None,
            date,
            flags: Flags::default(),
        }
    }

    #[must_use]
    pub fn with_srvid(mut self, srvid: Uid) -> Self {
        self.srvid = Some(srvid);
        self
    }

    #[must_use]
    pub fn with_flags(mut self, flags: Flags) -> Self {
        self.flags = flags;
        self
    }

    pub fn namer(&self) -> MessageNamer {
        MessageNamer::new(self.suid.clone(), self.date)
    }

    /// Moves the record into `folder_id` under the new local `id`.
    pub fn relocate(&mut self, folder_id: FolderId, id: LocalId) {
        self.id = id;
        self.suid = Suid::new(folder_id, id);
    }
}

#[cfg(test)]
mod tests {
    use rstest::*;

    use super::*;

    #[rstest]
    fn test_new_header_is_scoped_to_folder() {
        let header = HeaderRecord::new(FolderId::new("a-1"), LocalId::new(3), Timestamp::UNIX_EPOCH);
        assert_eq!("a-1/3", header.suid.to_string());
        assert_eq!(None, header.srvid);
        assert!(header.flags.is_empty());
    }

    #[rstest]
    fn test_relocate_reissues_suid() {
        let mut header =
            HeaderRecord::new(FolderId::new("a-1"), LocalId::new(3), Timestamp::UNIX_EPOCH);
        header.relocate(FolderId::new("a-2"), LocalId::new(9));
        assert_eq!(LocalId::new(9), header.id);
        assert_eq!("a-2/9", header.suid.to_string());
    }

    #[rstest]
    fn test_namer_points_at_header() {
        let header = HeaderRecord::new(FolderId::new("a-1"), LocalId::new(3), Timestamp::UNIX_EPOCH);
        let namer = header.namer();
        assert_eq!(&header.suid, namer.suid());
        assert_eq!(header.date, namer.date());
        assert_eq!(&FolderId::new("a-1"), namer.folder_id());
    }
}
