//! Offline mutation jobs.
//!
//! A job names messages that may be spread over many folders. Its targets are
//! partitioned by folder and processed one folder at a time while holding
//! that folder's lock. Everything a job attempt wants to change about account
//! state is collected in a [`JobContext`] and only merged by
//! [`Account::post_job_cleanup`] when the attempt succeeded.

mod context;
mod modtags;
mod moves;
mod partition;
mod walker;

use log::{debug, trace};
use thiserror::Error;

use crate::{
    account::Account,
    imap::{Connector, PoolError},
    repository::FolderId,
    storage::{StorageError, StorageProvider},
};

pub use context::FolderLock;
pub use context::JobContext;
pub use context::JobStateDelta;
pub use modtags::ModifyTagsJob;
pub use moves::MoveJob;
pub use moves::Relocation;
pub use partition::Partition;
pub use partition::partition_messages_by_folder_id;
pub use walker::FolderHandler;
pub use walker::FolderTargets;

#[derive(Debug, Error)]
pub enum JobError {
    /// A precondition is missing that will likely be fulfilled later.
    #[error("deferred: {0}")]
    Defer(&'static str),
    #[error("failed: {0}")]
    Unknown(&'static str),
    #[error("no folder {0}")]
    NoSuchFolder(FolderId),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Pool(#[from] PoolError),
}

impl JobError {
    /// Completion code reported to the job scheduler.
    pub fn code(&self) -> &'static str {
        match self {
            JobError::Defer(_) => "defer",
            _ => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MutationJob {
    ModifyTags(ModifyTagsJob),
    Move(MoveJob),
    /// A move into the trash folder.
    Delete(MoveJob),
}

impl<N: Connector, P: StorageProvider> Account<N, P> {
    /// Ends a job attempt. A passed attempt merges its server id changes into
    /// account state. Held folder locks are always released.
    pub async fn post_job_cleanup(&self, ctx: &mut JobContext, passed: bool) {
        if passed {
            let mut state = self.state().await;
            for (suid, server_id) in &ctx.state_delta.server_id_map {
                match server_id {
                    Some(server_id) => {
                        state.suid_to_server_id.insert(suid.clone(), *server_id);
                    }
                    None => {
                        state.suid_to_server_id.remove(suid);
                    }
                }
            }
        }
        trace!("releasing {} folder locks", ctx.held_locks().len());
        ctx.release_all_locks();
    }

    /// Applies `job` to the local cache, or reverts it with `undo`, and
    /// cleans up after the attempt. Returns what the attempt changed.
    pub async fn run_local_job(
        &self,
        job: &mut MutationJob,
        undo: bool,
    ) -> Result<JobStateDelta, JobError> {
        let mut ctx = JobContext::new();
        let result = match (job, undo) {
            (MutationJob::ModifyTags(job), false) => self.local_do_modtags(&mut ctx, job).await,
            (MutationJob::ModifyTags(job), true) => self.local_undo_modtags(&mut ctx, job).await,
            (MutationJob::Move(job), false) => self.local_do_move(&mut ctx, job).await,
            (MutationJob::Move(job), true) => self.local_undo_move(&mut ctx, job).await,
            (MutationJob::Delete(job), false) => self.local_do_delete(&mut ctx, job).await,
            (MutationJob::Delete(job), true) => self.local_undo_delete(&mut ctx, job).await,
        };
        self.post_job_cleanup(&mut ctx, result.is_ok()).await;

        match result {
            Ok(()) => Ok(std::mem::take(&mut ctx.state_delta)),
            Err(e) => {
                debug!("job ended with {}: {e}", e.code());
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use assertables::*;
    use rstest::*;

    use super::*;
    use crate::{
        fixtures::{TestAccount, account_with, seed},
        repository::{FolderType, Uid},
        storage::FolderStorage as _,
    };

    #[fixture]
    fn account() -> TestAccount {
        account_with(&[
            ("INBOX", FolderType::Inbox),
            ("Lists", FolderType::Normal),
            ("Trash", FolderType::Trash),
        ])
    }

    #[rstest]
    #[case(JobError::Defer("later"), "defer")]
    #[case(JobError::Unknown("broken"), "unknown")]
    #[case(JobError::NoSuchFolder(FolderId::new("acct-0")), "unknown")]
    fn test_error_codes(#[case] error: JobError, #[case] code: &str) {
        assert_eq!(code, error.code());
    }

    #[rstest]
    #[tokio::test]
    async fn test_failed_attempt_leaves_no_remaps(account: TestAccount) {
        let first = seed(&account, "INBOX", Some(11), &[]).await;
        let second = seed(&account, "Lists", Some(12), &[]).await;
        let trash = assert_some!(account.first_folder_with_type(FolderType::Trash).await);
        let (lists, _) = assert_some!(account.folder(second.suid.folder_id()).await);
        lists.you_are_dead_cleanup_after_yourself();
        let mut ctx = JobContext::new();
        let mut job = MoveJob::to(vec![first.namer(), second.namer()], trash);

        assert_matches!(
            account.local_do_move(&mut ctx, &mut job).await,
            Err(JobError::Storage(_))
        );
        assert_not_empty!(ctx.state_delta.server_id_map);
        account.post_job_cleanup(&mut ctx, false).await;

        assert_is_empty!(account.state().await.suid_to_server_id);
        assert_is_empty!(ctx.held_locks());
    }

    #[rstest]
    #[tokio::test]
    async fn test_passed_attempt_merges_remaps(account: TestAccount) {
        let header = seed(&account, "INBOX", Some(5), &[]).await;
        let forgotten = seed(&account, "INBOX", Some(6), &[]).await;
        account
            .state()
            .await
            .suid_to_server_id
            .insert(forgotten.suid.clone(), assert_ok!(Uid::try_from(6)));
        let mut ctx = JobContext::new();
        ctx.state_delta
            .server_id_map
            .insert(header.suid.clone(), header.srvid);
        ctx.state_delta.server_id_map.insert(forgotten.suid.clone(), None);

        account.post_job_cleanup(&mut ctx, true).await;

        let state = account.state().await;
        assert_eq!(Some(&assert_ok!(Uid::try_from(5))), state.suid_to_server_id.get(&header.suid));
        assert_none!(state.suid_to_server_id.get(&forgotten.suid));
    }

    #[rstest]
    #[tokio::test]
    async fn test_run_local_job_releases_locks_on_failure(account: TestAccount) {
        let header = seed(&account, "INBOX", None, &[]).await;
        let trash = assert_some!(account.first_folder_with_type(FolderType::Trash).await);
        let (inbox, inbox_lock) = assert_some!(account.folder(header.suid.folder_id()).await);
        inbox.you_are_dead_cleanup_after_yourself();
        let mut job = MutationJob::Move(MoveJob::to(vec![header.namer()], trash.clone()));

        assert_matches!(
            account.run_local_job(&mut job, false).await,
            Err(JobError::Storage(_))
        );
        let (_, trash_lock) = assert_some!(account.folder(&trash).await);
        assert_ok!(trash_lock.try_lock());
        assert_ok!(inbox_lock.try_lock());
    }

    #[rstest]
    #[tokio::test]
    async fn test_run_local_job_returns_delta(account: TestAccount) {
        let header = seed(&account, "INBOX", Some(9), &[]).await;
        let trash = assert_some!(account.first_folder_with_type(FolderType::Trash).await);
        let mut job = MutationJob::Delete(MoveJob::new(vec![header.namer()]));

        let delta = assert_ok!(account.run_local_job(&mut job, false).await);
        let moved_to = assert_some!(delta.move_map.get(&header.suid));
        assert_eq!(&trash, moved_to.folder_id());
        assert_eq!(
            Some(&assert_ok!(Uid::try_from(9))),
            account.state().await.suid_to_server_id.get(&header.suid)
        );
    }
}
