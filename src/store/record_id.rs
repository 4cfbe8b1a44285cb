use crate::error::StoreError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const RECORD_ID_BYTES: usize = 12;

/// Identifier assigned by the store on insert: 24 lowercase hex chars.
///
/// The first four bytes are the big-endian creation time in seconds, so
/// ids sort roughly by insertion time; the remaining eight are random.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(String);

impl RecordId {
    pub fn generate() -> Self {
        let mut bytes = [0_u8; RECORD_ID_BYTES];
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let secs = chrono::Utc::now().timestamp() as u32;
        bytes[..4].copy_from_slice(&secs.to_be_bytes());
        bytes[4..].copy_from_slice(&rand::random::<[u8; 8]>());
        Self(hex::encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for RecordId {
    type Err = StoreError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        let decoded = hex::decode(trimmed)
            .map_err(|e| StoreError::Query(format!("invalid record id {trimmed:?}: {e}")))?;
        if decoded.len() != RECORD_ID_BYTES {
            return Err(StoreError::Query(format!(
                "invalid record id {trimmed:?}: expected {} hex characters",
                RECORD_ID_BYTES * 2
            )));
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
