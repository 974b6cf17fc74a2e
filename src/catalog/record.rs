//! Catalog record types.

use chrono::Local;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::DEFAULT_CONTENT_TYPE;

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    /// Generated id (`yyyyMMdd_HHmmss_xxxxxxxx`).
    pub id: String,
    /// Original filename, also the name of the file on disk.
    pub name: String,
    /// Content type recorded at upload time.
    pub content_type: String,
    /// File size in bytes.
    pub size: u64,
}

impl Record {
    /// Build a record from its id and on-disk entry.
    pub fn from_entry(id: impl Into<String>, entry: StoredEntry) -> Self {
        Self {
            id: id.into(),
            name: entry.name,
            content_type: entry
                .content_type
                .filter(|t| !t.is_empty() && t != "null")
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
            size: entry.size,
        }
    }

    /// The on-disk entry for this record.
    pub fn to_entry(&self) -> StoredEntry {
        StoredEntry {
            name: self.name.clone(),
            content_type: Some(self.content_type.clone()),
            size: self.size,
        }
    }
}

/// Value stored under each id in the metadata file.
///
/// ```json
/// { "name": "book.pdf", "type": "application/pdf", "size": "1024" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEntry {
    /// Original filename.
    pub name: String,
    /// Content type; older files may carry `null` here.
    #[serde(rename = "type", default)]
    pub content_type: Option<String>,
    /// Size in bytes, written as a string.
    #[serde(with = "size_text")]
    pub size: u64,
}

/// Sizes are written as strings but older metadata files carry plain numbers.
mod size_text {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum SizeRepr {
        Text(String),
        Number(u64),
    }

    pub fn serialize<S: Serializer>(size: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&size.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        match SizeRepr::deserialize(deserializer)? {
            SizeRepr::Number(n) => Ok(n),
            SizeRepr::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| D::Error::custom(format!("invalid size: {s:?}"))),
        }
    }
}

/// Generate a new record id.
///
/// Format: local timestamp `yyyyMMdd_HHmmss`, an underscore, then the first
/// 8 hex characters of a random UUID.
pub fn generate_id() -> String {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let random = Uuid::new_v4().simple().to_string();
    format!("{}_{}", timestamp, &random[..8])
}
