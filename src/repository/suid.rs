use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

const A64_ALPHABET: &[u8; 64] =
    b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FolderId(String);

impl FolderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Builds the id of the `number`th folder learned by `account`.
    pub fn for_account(account: &str, number: u64) -> Self {
        Self(format!("{account}-{}", encode_a64(number)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for FolderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Encodes `value` in an ASCII ordered base64 alphabet.
fn encode_a64(mut value: u64) -> String {
    let mut digits = Vec::new();
    loop {
        // the mask keeps the index below 64
        digits.push(A64_ALPHABET[(value & 0x3f) as usize]);
        value >>= 6;
        if value == 0 {
            break;
        }
    }
    digits.reverse();
    digits.into_iter().map(char::from).collect()
}

/// Folder scoped local message id handed out by the folder storage.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct LocalId(u32);

impl LocalId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

impl From<LocalId> for u32 {
    fn from(value: LocalId) -> Self {
        value.0
    }
}

impl Display for LocalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Stable local handle of a cached message: the owning folder plus the
/// folder scoped local id. Formatted as `folder/id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Suid {
    folder_id: FolderId,
    id: LocalId,
}

impl Suid {
    pub fn new(folder_id: FolderId, id: LocalId) -> Self {
        Self { folder_id, id }
    }

    pub fn folder_id(&self) -> &FolderId {
        &self.folder_id
    }

    pub fn id(&self) -> LocalId {
        self.id
    }
}

impl Display for Suid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.folder_id, self.id)
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("malformed suid {suid:?}")]
pub struct MalformedSuidError {
    suid: String,
}

impl FromStr for Suid {
    type Err = MalformedSuidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || MalformedSuidError {
            suid: s.to_string(),
        };
        let (folder_id, id) = s.rsplit_once('/').ok_or_else(malformed)?;
        if folder_id.is_empty() {
            return Err(malformed());
        }
        let id = id.parse::<u32>().map_err(|_| malformed())?;

        Ok(Self::new(FolderId::new(folder_id), LocalId(id)))
    }
}
