use crate::repository::{FolderId, MessageNamer};

/// Messages of one folder, in the order they were given.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub folder_id: FolderId,
    pub messages: Vec<MessageNamer>,
}

/// Groups `namers` by the folder owning them. Partitions come out in the
/// order their folder was first seen.
pub fn partition_messages_by_folder_id(namers: &[MessageNamer]) -> Vec<Partition> {
    let mut partitions: Vec<Partition> = Vec::new();
    for namer in namers {
        match partitions
            .iter_mut()
            .find(|partition| &partition.folder_id == namer.folder_id())
        {
            Some(partition) => partition.messages.push(namer.clone()),
            None => partitions.push(Partition {
                folder_id: namer.folder_id().clone(),
                messages: vec![namer.clone()],
            }),
        }
    }
    partitions
}
