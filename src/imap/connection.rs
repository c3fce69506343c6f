use std::io;

use thiserror::Error;
use tokio_native_tls::native_tls;

use crate::imap::{
    codec::CodecError,
    mailbox_tree::{MailboxNodeBuilderError, MailboxTree},
};

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("io error on connection: {0}")]
    Io(#[from] io::Error),
    #[error("tls error on connection: {0}")]
    Tls(#[from] native_tls::Error),
    #[error("{0}")]
    Codec(#[from] CodecError),
    #[error("server rejected command: {0}")]
    Rejected(String),
    #[error("protocol violation: {0}")]
    Protocol(String),
    #[error("unusable mailbox listing: {0}")]
    Listing(#[from] MailboxNodeBuilderError),
    #[error("connection is not established")]
    NotConnected,
    #[error("connection closed by server")]
    Closed,
}

/// Something that happened on a connection outside of a command round-trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    Close,
    Error(String),
}

/// A protocol connection as the account sees it.
pub trait ProtocolConnection {
    /// Opens the socket and authenticates with the stored credentials.
    async fn connect(&mut self) -> Result<(), ConnectionError>;

    /// Lists the server's folder hierarchy.
    async fn get_boxes(&mut self) -> Result<MailboxTree, ConnectionError>;

    /// Leaves the currently selected folder.
    async fn close_box(&mut self) -> Result<(), ConnectionError>;

    /// Returns the next queued event without waiting.
    fn poll_event(&mut self) -> Option<ConnectionEvent>;
}

/// Creates not yet connected connections for an account.
pub trait Connector {
    type Connection: ProtocolConnection;

    fn create(&self) -> Self::Connection;
}
