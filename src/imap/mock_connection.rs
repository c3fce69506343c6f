use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
};

use crate::imap::{
    connection::{ConnectionError, ConnectionEvent, Connector, ProtocolConnection},
    mailbox_tree::MailboxTree,
};

#[derive(Debug, Default)]
pub struct MockState {
    pub created: usize,
    pub connected: usize,
    pub fail_connect: bool,
    pub fail_list: bool,
    pub boxes: MailboxTree,
    pub listed: usize,
    pub closed_boxes: usize,
    events: HashMap<usize, VecDeque<ConnectionEvent>>,
}

/// Hands out scripted connections and counts what the pool does with them.
#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    state: Arc<Mutex<MockState>>,
}

impl MockConnector {
    pub fn with_boxes(boxes: MailboxTree) -> Self {
        let connector = Self::default();
        connector.state().boxes = boxes;
        connector
    }

    pub fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().expect("mock state should not be poisoned")
    }

    /// Queues `event` on the connection that was created as number `number`.
    pub fn emit(&self, number: usize, event: ConnectionEvent) {
        self.state()
            .events
            .entry(number)
            .or_default()
            .push_back(event);
    }
}

#[derive(Debug)]
pub struct MockConnection {
    pub number: usize,
    state: Arc<Mutex<MockState>>,
}

impl MockConnection {
    fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().expect("mock state should not be poisoned")
    }
}

impl Connector for MockConnector {
    type Connection = MockConnection;

    fn create(&self) -> Self::Connection {
        let mut state = self.state();
        let number = state.created;
        state.created += 1;
        MockConnection {
            number,
            state: Arc::clone(&self.state),
        }
    }
}

impl ProtocolConnection for MockConnection {
    async fn connect(&mut self) -> Result<(), ConnectionError> {
        let mut state = self.state();
        if state.fail_connect {
            return Err(ConnectionError::Rejected("LOGIN failed".to_string()));
        }
        state.connected += 1;
        Ok(())
    }

    async fn get_boxes(&mut self) -> Result<MailboxTree, ConnectionError> {
        let mut state = self.state();
        if state.fail_list {
            return Err(ConnectionError::Closed);
        }
        state.listed += 1;
        Ok(state.boxes.clone())
    }

    async fn close_box(&mut self) -> Result<(), ConnectionError> {
        self.state().closed_boxes += 1;
        Ok(())
    }

    fn poll_event(&mut self) -> Option<ConnectionEvent> {
        let number = self.number;
        self.state()
            .events
            .get_mut(&number)
            .and_then(VecDeque::pop_front)
    }
}
