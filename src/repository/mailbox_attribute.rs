use std::{fmt::Display, str::FromStr};

use enumflags2::bitflags;
use log::trace;
use thiserror::Error;

/// Mailbox name attributes reported by LIST.
///
/// Covers RFC 3501 and RFC 3348 attributes, RFC 6154 special-use attributes
/// and the XLIST spellings used by Gmail.
#[bitflags]
#[repr(u32)]
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub enum MailboxAttribute {
    NoSelect,
    NoInferiors,
    Marked,
    Unmarked,
    HasChildren,
    HasNoChildren,
    All,
    AllMail,
    Archive,
    Drafts,
    Flagged,
    Starred,
    Inbox,
    Junk,
    Spam,
    Sent,
    Trash,
    Important,
}

impl MailboxAttribute {
    /// Converts a parsed LIST attribute. Unknown extensions are skipped.
    pub fn from_name_attribute(attribute: &imap_proto::NameAttribute) -> Option<Self> {
        match attribute {
            imap_proto::NameAttribute::NoInferiors => Some(Self::NoInferiors),
            imap_proto::NameAttribute::NoSelect => Some(Self::NoSelect),
            imap_proto::NameAttribute::Marked => Some(Self::Marked),
            imap_proto::NameAttribute::Unmarked => Some(Self::Unmarked),
            imap_proto::NameAttribute::All => Some(Self::All),
            imap_proto::NameAttribute::Archive => Some(Self::Archive),
            imap_proto::NameAttribute::Drafts => Some(Self::Drafts),
            imap_proto::NameAttribute::Flagged => Some(Self::Flagged),
            imap_proto::NameAttribute::Junk => Some(Self::Junk),
            imap_proto::NameAttribute::Sent => Some(Self::Sent),
            imap_proto::NameAttribute::Trash => Some(Self::Trash),
            imap_proto::NameAttribute::Extension(extension) => extension.parse::<Self>().ok(),
            _ => None,
        }
    }
}

impl Display for MailboxAttribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MailboxAttribute::NoSelect => "Noselect",
            MailboxAttribute::NoInferiors => "Noinferiors",
            MailboxAttribute::Marked => "Marked",
            MailboxAttribute::Unmarked => "Unmarked",
            MailboxAttribute::HasChildren => "HasChildren",
            MailboxAttribute::HasNoChildren => "HasNoChildren",
            MailboxAttribute::All => "All",
            MailboxAttribute::AllMail => "AllMail",
            MailboxAttribute::Archive => "Archive",
            MailboxAttribute::Drafts => "Drafts",
            MailboxAttribute::Flagged => "Flagged",
            MailboxAttribute::Starred => "Starred",
            MailboxAttribute::Inbox => "Inbox",
            MailboxAttribute::Junk => "Junk",
            MailboxAttribute::Spam => "Spam",
            MailboxAttribute::Sent => "Sent",
            MailboxAttribute::Trash => "Trash",
            MailboxAttribute::Important => "Important",
        };
        write!(f, r"\{name}")
    }
}

#[derive(Error, Debug)]
#[error("unknown mailbox attribute {attribute}")]
pub struct UnknownMailboxAttributeError {
    attribute: String,
}

impl FromStr for MailboxAttribute {
    type Err = UnknownMailboxAttributeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let name = value.strip_prefix('\\').unwrap_or(value);
        match name.to_ascii_uppercase().as_str() {
            "NOSELECT" => Ok(Self::NoSelect),
            "NOINFERIORS" => Ok(Self::NoInferiors),
            "MARKED" => Ok(Self::Marked),
            "UNMARKED" => Ok(Self::Unmarked),
            "HASCHILDREN" => Ok(Self::HasChildren),
            "HASNOCHILDREN" => Ok(Self::HasNoChildren),
            "ALL" => Ok(Self::All),
            "ALLMAIL" => Ok(Self::AllMail),
            "ARCHIVE" => Ok(Self::Archive),
            "DRAFTS" => Ok(Self::Drafts),
            "FLAGGED" => Ok(Self::Flagged),
            "STARRED" => Ok(Self::Starred),
            "INBOX" => Ok(Self::Inbox),
            "JUNK" => Ok(Self::Junk),
            "SPAM" => Ok(Self::Spam),
            "SENT" => Ok(Self::Sent),
            "TRASH" => Ok(Self::Trash),
            "IMPORTANT" => Ok(Self::Important),
            _ => {
                trace!("encountered unhandled mailbox attribute {value}");
                Err(Self::Err {
                    attribute: value.to_string(),
                })
            }
        }
    }
}
