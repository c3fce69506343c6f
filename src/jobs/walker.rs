use std::sync::Arc;

use log::{debug, trace, warn};

use crate::{
    account::Account,
    imap::{Connector, Leased},
    jobs::{
        JobError,
        context::{FolderLock, JobContext, JobStateDelta},
        partition::partition_messages_by_folder_id,
    },
    repository::{FolderId, HeaderRecord, MessageNamer, Uid},
    storage::{FolderStorage, StorageProvider},
};

/// What a folder step operates on.
#[derive(Debug, Clone, PartialEq)]
pub enum FolderTargets {
    /// Server ids of the messages that have one.
    ServerIds(Vec<Uid>),
    /// Cached headers of the messages that are still cached.
    Headers(Vec<HeaderRecord>),
}

/// Work done inside one folder while the walker holds it.
pub trait FolderHandler<C, S> {
    async fn in_folder(
        &mut self,
        conn: Option<&mut C>,
        storage: &S,
        targets: FolderTargets,
        delta: &mut JobStateDelta,
    ) -> Result<(), JobError>;
}

impl<N: Connector, P: StorageProvider> Account<N, P> {
    /// Takes the folder's mutation lock, waiting for other jobs to let go, and
    /// optionally a connection bound to the folder. The lock stays in `ctx`
    /// until released by the walker or the job cleanup.
    pub async fn access_folder_for_mutation(
        &self,
        ctx: &mut JobContext,
        folder_id: &FolderId,
        need_conn: bool,
        label: &'static str,
    ) -> Result<(Option<Leased<N::Connection>>, Arc<P::Storage>), JobError> {
        let (storage, mutex) = self
            .folder(folder_id)
            .await
            .ok_or_else(|| JobError::NoSuchFolder(folder_id.clone()))?;

        let guard = if ctx.holds(folder_id) {
            trace!("{label}: already holding {folder_id}");
            None
        } else {
            trace!("{label}: locking {folder_id}");
            Some(mutex.lock_owned().await)
        };
        ctx.push_lock(FolderLock::new(folder_id.clone(), label, guard));

        let conn = if need_conn {
            Some(self.pool().demand(Some(folder_id), label).await?)
        } else {
            None
        };
        Ok((conn, storage))
    }

    /// Runs `handler` once per folder owning any of `namers`, one folder at a
    /// time. The previous folder is let go before the next one is entered;
    /// the last one stays held in `ctx`.
    pub async fn partition_and_access_folders_sequentially<H>(
        &self,
        ctx: &mut JobContext,
        namers: &[MessageNamer],
        need_conn: bool,
        reverse: bool,
        label: &'static str,
        handler: &mut H,
    ) -> Result<(), JobError>
    where
        H: FolderHandler<N::Connection, P::Storage>,
    {
        let mut partitions = partition_messages_by_folder_id(namers);
        if reverse {
            partitions.reverse();
        }
        debug!("{label}: {} messages in {} folders", namers.len(), partitions.len());

        for (index, partition) in partitions.into_iter().enumerate() {
            if index > 0 {
                ctx.release_last_lock();
            }
            let (conn, storage) = self
                .access_folder_for_mutation(ctx, &partition.folder_id, need_conn, label)
                .await?;

            if let Some(mut conn) = conn {
                let result = match self
                    .resolve_server_ids(storage.as_ref(), &partition.messages, label)
                    .await
                {
                    Ok(server_ids) => {
                        handler
                            .in_folder(
                                Some(&mut *conn),
                                storage.as_ref(),
                                FolderTargets::ServerIds(server_ids),
                                &mut ctx.state_delta,
                            )
                            .await
                    }
                    Err(e) => Err(e),
                };
                self.pool().release(conn).await;
                result?;
            } else {
                let headers = storage.get_message_headers(&partition.messages).await?;
                handler
                    .in_folder(
                        None,
                        storage.as_ref(),
                        FolderTargets::Headers(headers),
                        &mut ctx.state_delta,
                    )
                    .await?;
            }
        }
        Ok(())
    }

    /// Maps messages to server ids, preferring ids learned by earlier jobs
    /// over the cached headers. Messages without any are left out.
    async fn resolve_server_ids(
        &self,
        storage: &P::Storage,
        namers: &[MessageNamer],
        label: &str,
    ) -> Result<Vec<Uid>, JobError> {
        let mut resolved: Vec<Option<Uid>> = {
            let state = self.state().await;
            namers
                .iter()
                .map(|namer| state.suid_to_server_id.get(namer.suid()).copied())
                .collect()
        };

        let unresolved: Vec<MessageNamer> = namers
            .iter()
            .zip(&resolved)
            .filter(|(_, server_id)| server_id.is_none())
            .map(|(namer, _)| namer.clone())
            .collect();
        if !unresolved.is_empty() {
            let headers = storage.get_message_headers(&unresolved).await?;
            for (namer, server_id) in namers.iter().zip(resolved.iter_mut()) {
                if server_id.is_none() {
                    *server_id = headers
                        .iter()
                        .find(|header| &header.suid == namer.suid())
                        .and_then(|header| header.srvid);
                }
            }
        }

        Ok(namers
            .iter()
            .zip(resolved)
            .filter_map(|(namer, server_id)| {
                if server_id.is_none() {
                    warn!("{label}: message {} has no server id, skipping", namer.suid());
                }
                server_id
            })
            .collect())
    }
}
