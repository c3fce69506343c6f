use std::io;

use bytes::{BufMut as _, Bytes, BytesMut};
use thiserror::Error;
use tokio_util::codec::{Decoder, Encoder};

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("io error while framing: {0}")]
    Io(#[from] io::Error),
    #[error("unparsable response: {0}")]
    Parse(String),
}

/// A complete response as received from the server.
#[derive(Debug, Clone)]
pub struct ResponseData {
    raw: Bytes,
}

impl ResponseData {
    pub fn parsed(&self) -> Result<imap_proto::Response<'_>, CodecError> {
        imap_proto::parser::parse_response(&self.raw)
            .map(|(_, response)| response)
            .map_err(|e| CodecError::Parse(e.to_string()))
    }
}

#[derive(Debug)]
pub struct Command {
    pub tag: String,
    pub line: String,
}

#[derive(Debug, Default)]
pub struct ImapCodec;

impl Decoder for ImapCodec {
    type Item = ResponseData;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }
        let consumed = match imap_proto::parser::parse_response(src) {
            Ok((rest, _)) => src.len() - rest.len(),
            Err(nom::Err::Incomplete(_)) => return Ok(None),
            Err(e) => return Err(CodecError::Parse(e.to_string())),
        };

        Ok(Some(ResponseData {
            raw: src.split_to(consumed).freeze(),
        }))
    }
}

impl Encoder<Command> for ImapCodec {
    type Error = CodecError;

    fn encode(&mut self, item: Command, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(item.tag.len() + item.line.len() + 3);
        dst.put_slice(item.tag.as_bytes());
        dst.put_u8(b' ');
        dst.put_slice(item.line.as_bytes());
        dst.put_slice(b"\r\n");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assertables::*;
    use rstest::*;

    use super::*;

    #[rstest]
    fn test_incomplete_response_waits_for_more() {
        let mut buffer = BytesMut::from(&b"* OK [CAPABILITY IMAP4rev1"[..]);
        assert_none!(assert_ok!(ImapCodec.decode(&mut buffer)));
        assert!(!buffer.is_empty());
    }

    #[rstest]
    fn test_complete_responses_are_split_off() {
        let mut buffer = BytesMut::from(&b"* OK ready\r\na1 OK done\r\n"[..]);
        let greeting = assert_some!(assert_ok!(ImapCodec.decode(&mut buffer)));
        assert_matches!(
            assert_ok!(greeting.parsed()),
            imap_proto::Response::Data {
                status: imap_proto::Status::Ok,
                ..
            }
        );
        let done = assert_some!(assert_ok!(ImapCodec.decode(&mut buffer)));
        assert_matches!(
            assert_ok!(done.parsed()),
            imap_proto::Response::Done {
                status: imap_proto::Status::Ok,
                ..
            }
        );
        assert!(buffer.is_empty());
    }

    #[rstest]
    fn test_list_response_is_parsed() {
        let mut buffer = BytesMut::from(&b"* LIST (\\HasNoChildren \\Trash) \"/\" Trash\r\n"[..]);
        let list = assert_some!(assert_ok!(ImapCodec.decode(&mut buffer)));
        assert_matches!(
            assert_ok!(list.parsed()),
            imap_proto::Response::MailboxData(imap_proto::MailboxDatum::List { .. })
        );
    }

    #[rstest]
    fn test_command_is_tagged_and_terminated() {
        let mut buffer = BytesMut::new();
        assert_ok!(ImapCodec.encode(
            Command {
                tag: "a0001".to_string(),
                line: "CLOSE".to_string(),
            },
            &mut buffer,
        ));
        assert_eq!(&b"a0001 CLOSE\r\n"[..], &buffer[..]);
    }
}
