//! Document identifiers: 12 bytes rendered as 24 lowercase hex chars.
//!
//! Layout follows the usual document-store object id: 4-byte big-endian
//! seconds since the epoch, 5 random bytes fixed per process, and a
//! 3-byte counter.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::errors::QuillError;

/// Length of a rendered object id.
pub const OBJECT_ID_LEN: usize = 24;

static PROCESS_UNIQUE: OnceLock<[u8; 5]> = OnceLock::new();
static COUNTER: OnceLock<AtomicU32> = OnceLock::new();

/// True when `s` is exactly 24 hexadecimal characters.
pub fn is_object_id(s: &str) -> bool {
    s.len() == OBJECT_ID_LEN && s.bytes().all(|b| b.is_ascii_hexdigit())
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectId(String);

impl ObjectId {
    /// Generate a fresh id.
    pub fn new() -> Self {
        let secs = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as u32;

        let unique = PROCESS_UNIQUE.get_or_init(rand::random::<[u8; 5]>);
        let count = COUNTER
            .get_or_init(|| AtomicU32::new(rand::random::<u32>() & 0x00ff_ffff))
            .fetch_add(1, Ordering::Relaxed)
            & 0x00ff_ffff;

        let mut bytes = [0u8; 12];
        bytes[..4].copy_from_slice(&secs.to_be_bytes());
        bytes[4..9].copy_from_slice(unique);
        bytes[9..].copy_from_slice(&count.to_be_bytes()[1..]);

        let hex = bytes.iter().map(|b| format!("{b:02x}")).collect::<String>();
        Self(hex)
    }

    /// Parse a caller-supplied id, rejecting anything that is not 24 hex chars.
    pub fn parse(s: &str) -> Result<Self, QuillError> {
        if is_object_id(s) {
            Ok(Self(s.to_ascii_lowercase()))
        } else {
            Err(QuillError::bad_request(format!(
                "'{s}' is not a valid id (expected {OBJECT_ID_LEN} hex characters)"
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ObjectId {
    type Err = QuillError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ObjectId {
    type Error = QuillError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ObjectId> for String {
    fn from(id: ObjectId) -> Self {
        id.0
    }
}
