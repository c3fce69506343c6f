use std::{borrow::Cow, collections::VecDeque, sync::Arc};

use futures::{SinkExt as _, StreamExt as _};
use imap_proto::{MailboxDatum, Response, Status};
use log::{debug, trace, warn};
use tokio::net::TcpStream;
use tokio_native_tls::{TlsConnector, TlsStream, native_tls};
use tokio_util::codec::Framed;

use crate::{
    imap::{
        codec::{Command, ImapCodec, ResponseData},
        connection::{ConnectionError, ConnectionEvent, Connector, ProtocolConnection},
        mailbox_tree::{ListEntry, MailboxTree},
    },
    repository::MailboxAttribute,
};

type ImapStream = Framed<TlsStream<TcpStream>, ImapCodec>;

#[derive(Debug)]
struct Credentials {
    host: String,
    port: u16,
    user: String,
    password: String,
}

/// Opens TLS connections to one IMAP server with plain LOGIN.
#[derive(Debug, Clone)]
pub struct ImapConnector {
    credentials: Arc<Credentials>,
}

impl ImapConnector {
    pub fn new(host: String, port: u16, user: String, password: String) -> Self {
        Self {
            credentials: Arc::new(Credentials {
                host,
                port,
                user,
                password,
            }),
        }
    }
}

impl Connector for ImapConnector {
    type Connection = ImapConnection;

    fn create(&self) -> Self::Connection {
        ImapConnection {
            credentials: Arc::clone(&self.credentials),
            stream: None,
            last_tag: 0,
            events: VecDeque::new(),
        }
    }
}

pub struct ImapConnection {
    credentials: Arc<Credentials>,
    stream: Option<ImapStream>,
    last_tag: u16,
    events: VecDeque<ConnectionEvent>,
}

impl ImapConnection {
    async fn command(&mut self, line: &str) -> Result<Vec<ResponseData>, ConnectionError> {
        let stream = self.stream.as_mut().ok_or(ConnectionError::NotConnected)?;
        self.last_tag = self.last_tag.wrapping_add(1);
        let tag = format!("{:04x}", self.last_tag);

        match round_trip(stream, &tag, line).await {
            Ok(untagged) => {
                if untagged.iter().any(|response| {
                    matches!(
                        response.parsed(),
                        Ok(Response::Data {
                            status: Status::Bye,
                            ..
                        })
                    )
                }) {
                    debug!("server said goodbye");
                    self.events.push_back(ConnectionEvent::Close);
                }
                Ok(untagged)
            }
            Err(ConnectionError::Closed) => {
                debug!("connection closed while waiting for {tag}");
                self.stream = None;
                self.events.push_back(ConnectionEvent::Close);
                Err(ConnectionError::Closed)
            }
            Err(e @ (ConnectionError::Codec(_) | ConnectionError::Io(_))) => {
                warn!("connection broke: {e}");
                self.stream = None;
                self.events.push_back(ConnectionEvent::Error(e.to_string()));
                self.events.push_back(ConnectionEvent::Close);
                Err(e)
            }
            Err(e) => Err(e),
        }
    }
}

async fn round_trip(
    stream: &mut ImapStream,
    tag: &str,
    line: &str,
) -> Result<Vec<ResponseData>, ConnectionError> {
    stream
        .send(Command {
            tag: tag.to_string(),
            line: line.to_string(),
        })
        .await?;

    let mut untagged = Vec::new();
    while let Some(response) = stream.next().await {
        let response = response?;
        trace!("response = {response:?}");
        match response.parsed()? {
            Response::Done {
                tag: done_tag,
                status,
                information,
                ..
            } if done_tag.0 == tag => {
                return match status {
                    Status::Ok => Ok(untagged),
                    _ => Err(ConnectionError::Rejected(
                        information.map(Cow::into_owned).unwrap_or_default(),
                    )),
                };
            }
            Response::Done { tag: other, .. } => {
                return Err(ConnectionError::Protocol(format!(
                    "got completion for {} while waiting for {tag}",
                    other.0
                )));
            }
            _ => {}
        }
        untagged.push(response);
    }

    Err(ConnectionError::Closed)
}

fn quoted(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

impl ProtocolConnection for ImapConnection {
    async fn connect(&mut self) -> Result<(), ConnectionError> {
        let credentials = Arc::clone(&self.credentials);
        let Credentials {
            host,
            port,
            user,
            password,
        } = credentials.as_ref();
        debug!("connecting to {host}:{port}");
        let tls = TlsConnector::from(native_tls::TlsConnector::new()?);
        let stream = TcpStream::connect((host.as_str(), *port)).await?;
        let stream = tls.connect(host, stream).await?;
        let mut stream = Framed::new(stream, ImapCodec);

        let greeting = stream.next().await.ok_or(ConnectionError::Closed)??;
        trace!("greeting = {greeting:?}");
        let preauthenticated = match greeting.parsed()? {
            Response::Data {
                status: Status::Ok, ..
            } => false,
            Response::Data {
                status: Status::PreAuth,
                ..
            } => true,
            other => {
                return Err(ConnectionError::Protocol(format!(
                    "unexpected greeting {other:?}"
                )));
            }
        };
        self.stream = Some(stream);

        if !preauthenticated {
            debug!("LOGIN <user> <password>");
            let login = format!("LOGIN {} {}", quoted(user), quoted(password));
            self.command(&login).await?;
        }
        Ok(())
    }

    async fn get_boxes(&mut self) -> Result<MailboxTree, ConnectionError> {
        debug!("LIST \"\" \"*\"");
        let responses = self.command("LIST \"\" \"*\"").await?;
        let mut entries = Vec::with_capacity(responses.len());
        for response in &responses {
            if let Response::MailboxData(MailboxDatum::List {
                name_attributes,
                delimiter,
                name,
            }) = response.parsed()?
            {
                entries.push(ListEntry {
                    name: name.into_owned(),
                    delimiter: delimiter.map(Cow::into_owned),
                    attributes: name_attributes
                        .iter()
                        .filter_map(MailboxAttribute::from_name_attribute)
                        .collect(),
                });
            }
        }
        Ok(MailboxTree::from_list(entries)?)
    }

    async fn close_box(&mut self) -> Result<(), ConnectionError> {
        debug!("CLOSE");
        self.command("CLOSE").await.map(|_| ())
    }

    fn poll_event(&mut self) -> Option<ConnectionEvent> {
        self.events.pop_front()
    }
}
