//! Cloud backup file formats.
//!
//! The drive-file transport stores one data file holding a
//! [`CloudBackupEnvelope`] and a sibling metadata file holding a
//! [`BackupMetadata`]. Both are JSON documents whose field names are
//! shared with other client implementations and must not drift.

use crate::bundle::CollectionBundle;
use crate::collection::{CollectionName, Record};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Schema version written into every backup and metadata file.
pub const ENVELOPE_VERSION: &str = "1.0";

/// The whole-state backup document written to the cloud drive.
///
/// Created fresh on every push; the previous file is overwritten in
/// place, so no history is retained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudBackupEnvelope {
    /// Recipe records.
    #[serde(default)]
    pub recipes: Vec<Record>,
    /// Order records.
    #[serde(default)]
    pub orders: Vec<Record>,
    /// Customer records.
    #[serde(default)]
    pub customers: Vec<Record>,
    /// Ingredient records.
    #[serde(default)]
    pub ingredients: Vec<Record>,
    /// Inventory records.
    #[serde(default)]
    pub inventory: Vec<Record>,
    /// Category records.
    #[serde(default)]
    pub categories: Vec<Record>,
    /// When this backup was produced.
    #[serde(rename = "syncedAt")]
    pub synced_at: DateTime<Utc>,
    /// Schema version, currently [`ENVELOPE_VERSION`].
    pub version: String,
}

impl CloudBackupEnvelope {
    /// Builds an envelope from a bundle, stamping the given time.
    pub fn from_bundle(bundle: &CollectionBundle, synced_at: DateTime<Utc>) -> Self {
        let records_of = |name| bundle.records(name).to_vec();
        Self {
            recipes: records_of(CollectionName::Recipes),
            orders: records_of(CollectionName::Orders),
            customers: records_of(CollectionName::Customers),
            ingredients: records_of(CollectionName::Ingredients),
            inventory: records_of(CollectionName::Inventory),
            categories: records_of(CollectionName::Categories),
            synced_at,
            version: ENVELOPE_VERSION.to_string(),
        }
    }

    /// Unpacks the envelope into a bundle, dropping empty collections.
    pub fn into_bundle(self) -> CollectionBundle {
        let mut bundle = CollectionBundle::new();
        let pairs = [
            (CollectionName::Recipes, self.recipes),
            (CollectionName::Orders, self.orders),
            (CollectionName::Customers, self.customers),
            (CollectionName::Ingredients, self.ingredients),
            (CollectionName::Inventory, self.inventory),
            (CollectionName::Categories, self.categories),
        ];
        for (name, records) in pairs {
            if !records.is_empty() {
                bundle.insert(name, records);
            }
        }
        bundle
    }
}

/// The metadata document written next to the backup file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupMetadata {
    /// Timestamp of the last successful push.
    #[serde(rename = "lastSync")]
    pub last_sync: DateTime<Utc>,
    /// Schema version, currently [`ENVELOPE_VERSION`].
    pub version: String,
    /// Provider file id of the data file this metadata describes.
    #[serde(rename = "dataFileId")]
    pub data_file_id: String,
}
