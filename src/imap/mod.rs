mod codec;
mod connection;
mod imap_connection;
mod mailbox_tree;
#[cfg(test)]
pub mod mock_connection;
mod pool;

pub use codec::CodecError;
pub use connection::ConnectionError;
pub use connection::ConnectionEvent;
pub use connection::Connector;
pub use connection::ProtocolConnection;
pub use imap_connection::ImapConnection;
pub use imap_connection::ImapConnector;
pub use mailbox_tree::ListEntry;
pub use mailbox_tree::MailboxNode;
pub use mailbox_tree::MailboxNodeBuilder;
pub use mailbox_tree::MailboxNodeBuilderError;
pub use mailbox_tree::MailboxTree;
pub use pool::ConnectionPool;
pub use pool::Leased;
pub use pool::PoolError;
