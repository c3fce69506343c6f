use std::{collections::HashMap, sync::Arc};

use futures::future::try_join;
use log::{debug, trace, warn};

use crate::{
    account::Account,
    imap::Connector,
    jobs::{
        JobError,
        context::{JobContext, JobStateDelta},
        walker::{FolderHandler, FolderTargets},
    },
    repository::{FolderId, FolderType, MessageNamer, Suid, Uid},
    storage::{FolderStorage, StorageError, StorageProvider},
};

/// Where a moved message came from and where it ended up.
#[derive(Debug, Clone, PartialEq)]
pub struct Relocation {
    pub from: Suid,
    pub to: MessageNamer,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoveJob {
    pub messages: Vec<MessageNamer>,
    /// Unset for deletes, which always target the trash folder.
    pub target_folder: Option<FolderId>,
    /// Server ids the moved messages keep in their new folder, by old suid.
    pub guids: HashMap<Suid, Uid>,
    pub relocated: Vec<Relocation>,
}

impl MoveJob {
    pub fn new(messages: Vec<MessageNamer>) -> Self {
        Self {
            messages,
            ..Self::default()
        }
    }

    pub fn to(messages: Vec<MessageNamer>, target_folder: FolderId) -> Self {
        Self {
            messages,
            target_folder: Some(target_folder),
            ..Self::default()
        }
    }
}

enum Destinations<S> {
    Single(Arc<S>),
    /// By the suid a message currently has.
    PerMessage(HashMap<Suid, Arc<S>>),
}

impl<S> Destinations<S> {
    fn for_message(&self, suid: &Suid) -> Option<&S> {
        let storage = match self {
            Destinations::Single(storage) => Some(storage),
            Destinations::PerMessage(storages) => storages.get(suid),
        };
        storage.map(|storage| &**storage)
    }
}

struct Relocate<S> {
    destinations: Destinations<S>,
    resilient_server_ids: bool,
    label: &'static str,
    relocated: Vec<Relocation>,
    guids: HashMap<Suid, Uid>,
}

impl<S> Relocate<S> {
    fn new(destinations: Destinations<S>, resilient_server_ids: bool, label: &'static str) -> Self {
        Self {
            destinations,
            resilient_server_ids,
            label,
            relocated: Vec::new(),
            guids: HashMap::new(),
        }
    }
}

impl<C, S: FolderStorage> FolderHandler<C, S> for Relocate<S> {
    async fn in_folder(
        &mut self,
        _conn: Option<&mut C>,
        source: &S,
        targets: FolderTargets,
        delta: &mut JobStateDelta,
    ) -> Result<(), JobError> {
        let FolderTargets::Headers(headers) = targets else {
            return Err(JobError::Unknown("moves need cached headers"));
        };

        for mut header in headers {
            let Some(destination) = self.destinations.for_message(&header.suid) else {
                warn!("{}: no destination for {}, skipping", self.label, header.suid);
                continue;
            };

            let body = match source.get_message_body(&header.suid, header.date).await {
                Ok(body) => Some(body),
                Err(StorageError::MissingBody(suid)) => {
                    warn!("{}: {suid} has no cached body, moving its header alone", self.label);
                    None
                }
                Err(e) => return Err(e.into()),
            };
            source.delete_message_header_and_body(&header).await?;

            let from = header.suid.clone();
            header.relocate(
                destination.folder_id().clone(),
                destination.issue_new_header_id(),
            );
            if let Some(srvid) = header.srvid {
                delta.server_id_map.insert(from.clone(), Some(srvid));
                if self.resilient_server_ids {
                    self.guids.insert(from.clone(), srvid);
                } else {
                    header.srvid = None;
                }
            }
            trace!("{}: {from} is now {}", self.label, header.suid);
            delta.move_map.insert(from.clone(), header.suid.clone());
            self.relocated.push(Relocation {
                from,
                to: header.namer(),
            });

            match body {
                Some(body) => {
                    try_join(
                        destination.add_message_header(&header),
                        destination.add_message_body(&header, body),
                    )
                    .await?;
                }
                None => destination.add_message_header(&header).await?,
            }
        }
        Ok(())
    }
}

impl<N: Connector, P: StorageProvider> Account<N, P> {
    /// Moves the job's messages into its target folder. Every moved message
    /// gets a new identity there.
    pub async fn local_do_move(
        &self,
        ctx: &mut JobContext,
        job: &mut MoveJob,
    ) -> Result<(), JobError> {
        const LABEL: &str = "local_do_move";

        job.guids.clear();
        job.relocated.clear();
        let target = job
            .target_folder
            .clone()
            .ok_or(JobError::Unknown("move without target folder"))?;

        let (_, destination) = self
            .access_folder_for_mutation(ctx, &target, false, LABEL)
            .await?;
        let mut relocate = Relocate::new(
            Destinations::Single(destination),
            self.settings().resilient_server_ids,
            LABEL,
        );
        let result = self
            .partition_and_access_folders_sequentially(
                ctx,
                &job.messages,
                false,
                false,
                LABEL,
                &mut relocate,
            )
            .await;

        job.guids = relocate.guids;
        job.relocated = relocate.relocated;
        result
    }

    /// Moves every message relocated by [`Self::local_do_move`] back to the
    /// folder it came from.
    pub async fn local_undo_move(
        &self,
        ctx: &mut JobContext,
        job: &mut MoveJob,
    ) -> Result<(), JobError> {
        const LABEL: &str = "local_undo_move";

        if job.relocated.is_empty() {
            debug!("{LABEL}: nothing was moved");
            return Ok(());
        }

        let mut origins: Vec<&FolderId> = job
            .relocated
            .iter()
            .map(|relocation| relocation.from.folder_id())
            .collect();
        origins.sort();
        origins.dedup();
        let mut storages = HashMap::with_capacity(origins.len());
        for origin in origins {
            let (_, storage) = self
                .access_folder_for_mutation(ctx, origin, false, LABEL)
                .await?;
            storages.insert(origin.clone(), storage);
        }

        let per_message = job
            .relocated
            .iter()
            .filter_map(|relocation| {
                storages
                    .get(relocation.from.folder_id())
                    .map(|storage| (relocation.to.suid().clone(), Arc::clone(storage)))
            })
            .collect();
        let namers: Vec<MessageNamer> = job
            .relocated
            .iter()
            .map(|relocation| relocation.to.clone())
            .collect();

        let mut relocate = Relocate::new(
            Destinations::PerMessage(per_message),
            self.settings().resilient_server_ids,
            LABEL,
        );
        self.partition_and_access_folders_sequentially(
            ctx,
            &namers,
            false,
            false,
            LABEL,
            &mut relocate,
        )
        .await?;
        job.relocated.clear();
        Ok(())
    }

    /// Moves the job's messages into the trash folder. Without one the job is
    /// deferred until the account created it.
    pub async fn local_do_delete(
        &self,
        ctx: &mut JobContext,
        job: &mut MoveJob,
    ) -> Result<(), JobError> {
        let Some(trash) = self.first_folder_with_type(FolderType::Trash).await else {
            self.ensure_essential_folders().await;
            return Err(JobError::Defer("no trash folder"));
        };
        job.target_folder = Some(trash);
        self.local_do_move(ctx, job).await
    }

    pub async fn local_undo_delete(
        &self,
        ctx: &mut JobContext,
        job: &mut MoveJob,
    ) -> Result<(), JobError> {
        if self.first_folder_with_type(FolderType::Trash).await.is_none() {
            return Err(JobError::Unknown("no trash folder"));
        }
        self.local_undo_move(ctx, job).await
    }
}
