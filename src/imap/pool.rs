use std::{
    ops::{Deref, DerefMut},
    sync::atomic::{AtomicUsize, Ordering},
};

use log::{debug, trace, warn};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::{
    imap::connection::{ConnectionError, ConnectionEvent, Connector, ProtocolConnection},
    repository::FolderId,
};

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("could not open connection: {0}")]
    Connect(#[source] ConnectionError),
}

struct Lease<C> {
    id: usize,
    /// `None` while the connection is handed out.
    conn: Option<C>,
    folder_id: Option<FolderId>,
}

impl<C> Lease<C> {
    fn in_use(&self) -> bool {
        self.conn.is_none()
    }
}

/// Warns about a lease that never made it back to the pool.
#[derive(Debug)]
struct ReleaseCheck {
    id: usize,
    armed: bool,
}

impl Drop for ReleaseCheck {
    fn drop(&mut self) {
        if self.armed {
            warn!(
                "connection {} was dropped without release, its lease stays busy",
                self.id
            );
        }
    }
}

/// A connection borrowed from the pool. Give it back with
/// [`ConnectionPool::release`]; a dropped `Leased` keeps its lease marked
/// in use for the lifetime of the pool.
#[derive(Debug)]
pub struct Leased<C> {
    id: usize,
    folder_id: Option<FolderId>,
    conn: C,
    check: ReleaseCheck,
}

impl<C> Leased<C> {
    fn new(id: usize, folder_id: Option<FolderId>, conn: C) -> Self {
        Self {
            id,
            folder_id,
            conn,
            check: ReleaseCheck { id, armed: true },
        }
    }

    pub fn folder_id(&self) -> Option<&FolderId> {
        self.folder_id.as_ref()
    }
}

impl<C> Deref for Leased<C> {
    type Target = C;

    fn deref(&self) -> &Self::Target {
        &self.conn
    }
}

impl<C> DerefMut for Leased<C> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.conn
    }
}

/// Reuses authenticated connections of one account.
pub struct ConnectionPool<N: Connector> {
    connector: N,
    leases: Mutex<Vec<Lease<N::Connection>>>,
    next_id: AtomicUsize,
}

impl<N: Connector> ConnectionPool<N> {
    /// Creates a pool. An already authenticated `existing` connection is
    /// adopted as the first idle lease.
    pub fn new(connector: N, existing: Option<N::Connection>) -> Self {
        let leases = existing
            .map(|conn| {
                debug!("adopting existing connection 0");
                Lease {
                    id: 0,
                    conn: Some(conn),
                    folder_id: None,
                }
            })
            .into_iter()
            .collect::<Vec<_>>();
        Self {
            connector,
            next_id: AtomicUsize::new(leases.len()),
            leases: Mutex::new(leases),
        }
    }

    /// Hands out the first idle connection, bound to `folder_id`, or opens a
    /// new one. There is no upper bound on the number of connections.
    pub async fn demand(
        &self,
        folder_id: Option<&FolderId>,
        label: &str,
    ) -> Result<Leased<N::Connection>, PoolError> {
        let mut leases = self.leases.lock().await;
        leases.retain_mut(|lease| match lease.conn.as_mut() {
            Some(conn) => keep_after_events(lease.id, conn),
            None => true,
        });

        if let Some(folder_id) = folder_id {
            if leases
                .iter()
                .any(|lease| lease.in_use() && lease.folder_id.as_ref() == Some(folder_id))
            {
                warn!("{label}: folder {folder_id} already holds a connection");
            }
        }

        if let Some(lease) = leases.iter_mut().find(|lease| !lease.in_use()) {
            if let Some(conn) = lease.conn.take() {
                debug!("{label}: reusing connection {}", lease.id);
                lease.folder_id = folder_id.cloned();
                return Ok(Leased::new(lease.id, lease.folder_id.clone(), conn));
            }
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        leases.push(Lease {
            id,
            conn: None,
            folder_id: folder_id.cloned(),
        });
        drop(leases);

        debug!("{label}: opening connection {id}");
        let mut conn = self.connector.create();
        if let Err(e) = conn.connect().await {
            warn!("{label}: connection {id} failed: {e}");
            self.leases.lock().await.retain(|lease| lease.id != id);
            return Err(PoolError::Connect(e));
        }

        Ok(Leased::new(id, folder_id.cloned(), conn))
    }

    /// Returns a connection to the idle set, leaving its folder first.
    pub async fn release(&self, mut leased: Leased<N::Connection>) {
        leased.check.armed = false;
        if let Some(folder_id) = leased.folder_id.take() {
            trace!("closing folder {folder_id} on connection {}", leased.id);
            if let Err(e) = leased.conn.close_box().await {
                warn!("could not close {folder_id} on connection {}: {e}", leased.id);
            }
        }

        let keep = keep_after_events(leased.id, &mut leased.conn);
        let mut leases = self.leases.lock().await;
        if !keep {
            leases.retain(|lease| lease.id != leased.id);
            return;
        }
        match leases.iter_mut().find(|lease| lease.id == leased.id) {
            Some(lease) => {
                debug!("connection {} is idle", leased.id);
                lease.folder_id = None;
                lease.conn = Some(leased.conn);
            }
            None => warn!("released connection {} is not from this pool", leased.id),
        }
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.leases.lock().await.len()
    }

    #[cfg(test)]
    pub async fn idle(&self) -> usize {
        self.leases
            .lock()
            .await
            .iter()
            .filter(|lease| !lease.in_use())
            .count()
    }
}

/// Drains queued events. Returns whether the connection is still usable.
fn keep_after_events<C: ProtocolConnection>(id: usize, conn: &mut C) -> bool {
    let mut keep = true;
    while let Some(event) = conn.poll_event() {
        match event {
            ConnectionEvent::Close => {
                debug!("connection {id} was closed");
                keep = false;
            }
            ConnectionEvent::Error(e) => warn!("connection {id} reported: {e}"),
        }
    }
    keep
}
