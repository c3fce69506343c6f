use futures::future::try_join_all;
use log::trace;

use crate::{
    account::Account,
    imap::Connector,
    jobs::{
        JobError,
        context::{JobContext, JobStateDelta},
        walker::{FolderHandler, FolderTargets},
    },
    repository::MessageNamer,
    storage::{FolderStorage, StorageProvider},
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModifyTagsJob {
    pub messages: Vec<MessageNamer>,
    pub add_tags: Vec<String>,
    pub remove_tags: Vec<String>,
}

struct TagChanges<'a> {
    add: &'a [String],
    remove: &'a [String],
}

impl<C, S: FolderStorage> FolderHandler<C, S> for TagChanges<'_> {
    async fn in_folder(
        &mut self,
        _conn: Option<&mut C>,
        storage: &S,
        targets: FolderTargets,
        _delta: &mut JobStateDelta,
    ) -> Result<(), JobError> {
        let FolderTargets::Headers(mut headers) = targets else {
            return Err(JobError::Unknown("tag changes need cached headers"));
        };
        for header in &mut headers {
            if !header.flags.apply(self.add, self.remove) {
                trace!("{} already tagged {}", header.suid, header.flags);
            }
        }

        // unchanged headers are written too
        try_join_all(
            headers
                .iter()
                .map(|header| storage.update_message_header(header.date, header.id, false, header)),
        )
        .await?;
        Ok(())
    }
}

impl<N: Connector, P: StorageProvider> Account<N, P> {
    pub async fn local_do_modtags(
        &self,
        ctx: &mut JobContext,
        job: &ModifyTagsJob,
    ) -> Result<(), JobError> {
        let mut changes = TagChanges {
            add: &job.add_tags,
            remove: &job.remove_tags,
        };
        self.partition_and_access_folders_sequentially(
            ctx,
            &job.messages,
            false,
            false,
            "local_do_modtags",
            &mut changes,
        )
        .await
    }

    /// Reverts [`Self::local_do_modtags`] by swapping added and removed tags.
    pub async fn local_undo_modtags(
        &self,
        ctx: &mut JobContext,
        job: &ModifyTagsJob,
    ) -> Result<(), JobError> {
        let mut changes = TagChanges {
            add: &job.remove_tags,
            remove: &job.add_tags,
        };
        self.partition_and_access_folders_sequentially(
            ctx,
            &job.messages,
            false,
            false,
            "local_undo_modtags",
            &mut changes,
        )
        .await
    }
}
