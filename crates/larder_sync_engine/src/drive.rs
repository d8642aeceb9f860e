//! Cloud-drive-file transport.
//!
//! The stateful transport: a whole-state backup file (plus a companion
//! metadata file) lives inside an app folder on the user's cloud drive.
//! Data transfer is preceded by folder/file discovery:
//!
//! ```text
//! NoFolder → FolderResolved → NoFile → FileResolved
//! ```
//!
//! Resolved folder and file ids are cached in the local store's
//! reserved sync namespace so steady-state cycles skip the discovery
//! round-trips. Auth failure clears the cached connection state.

use crate::error::{SyncError, SyncResult};
use crate::http::{auth_checked, build_client, status_error};
use crate::local;
use crate::remote::RemoteStore;
use async_trait::async_trait;
use chrono::Utc;
use larder_model::{
    BackupMetadata, CloudBackupEnvelope, CollectionBundle, Credential, ENVELOPE_VERSION,
};
use larder_store::{LocalStore, SYNC_NAMESPACE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

const FOLDER_ID_KEY: &str = "drive_folder_id";
const DATA_FILE_ID_KEY: &str = "drive_data_file_id";
const METADATA_FILE_ID_KEY: &str = "drive_metadata_file_id";

/// Configuration for the drive transport.
#[derive(Debug, Clone)]
pub struct DriveConfig {
    /// Metadata/query API base.
    pub api_base: String,
    /// Content upload API base.
    pub upload_base: String,
    /// Name of the app folder on the drive.
    pub folder_name: String,
    /// Name of the whole-state backup file.
    pub data_file_name: String,
    /// Name of the companion metadata file.
    pub metadata_file_name: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl DriveConfig {
    /// Points both API bases at the same host. Used by tests and
    /// self-hosted providers.
    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        let base = base.into().trim_end_matches('/').to_string();
        self.api_base = base.clone();
        self.upload_base = base;
        self
    }

    /// Sets the app folder name.
    pub fn with_folder_name(mut self, name: impl Into<String>) -> Self {
        self.folder_name = name.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            api_base: "https://www.googleapis.com/drive/v3".to_string(),
            upload_base: "https://www.googleapis.com/upload/drive/v3".to_string(),
            folder_name: "Larder".to_string(),
            data_file_name: "larder-data.json".to_string(),
            metadata_file_name: "larder-metadata.json".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Serialize)]
struct CreateFile<'a> {
    name: &'a str,
    #[serde(rename = "mimeType", skip_serializing_if = "Option::is_none")]
    mime_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parents: Option<Vec<&'a str>>,
}

/// [`RemoteStore`] backed by a cloud-drive file.
///
/// Holds a reference to the local store for two reasons: the resolved
/// folder/file ids are cached there, and a push serializes the *whole*
/// local state. The backup file is full-state and overwritten in
/// place, so writing only the dirty collections would drop the rest
/// from the remote.
pub struct DriveRemote {
    http: reqwest::Client,
    config: DriveConfig,
    store: Arc<dyn LocalStore>,
}

impl DriveRemote {
    /// Creates a drive transport over the given store.
    pub fn new(config: DriveConfig, store: Arc<dyn LocalStore>) -> SyncResult<Self> {
        Ok(Self {
            http: build_client(config.timeout)?,
            config,
            store,
        })
    }

    fn cached(&self, key: &str) -> SyncResult<Option<String>> {
        Ok(self.store.get(SYNC_NAMESPACE, key)?)
    }

    fn cache(&self, key: &str, value: &str) -> SyncResult<()> {
        self.store.set(SYNC_NAMESPACE, key, value)?;
        Ok(())
    }

    fn clear_cached_ids(&self) {
        for key in [FOLDER_ID_KEY, DATA_FILE_ID_KEY, METADATA_FILE_ID_KEY] {
            if let Err(err) = self.store.remove(SYNC_NAMESPACE, key) {
                warn!(key, error = %err, "failed to clear cached drive id");
            }
        }
    }

    async fn search(&self, token: &str, query: &str) -> SyncResult<Option<String>> {
        let response = self
            .http
            .get(format!("{}/files", self.config.api_base))
            .bearer_auth(token)
            .query(&[("q", query), ("fields", "files(id,name)"), ("pageSize", "10")])
            .send()
            .await?;
        let response = auth_checked(response)?;
        if !response.status().is_success() {
            return Err(status_error("file search", response.status()));
        }
        let list: FileList = response
            .json()
            .await
            .map_err(|err| SyncError::MalformedData(err.to_string()))?;
        Ok(list.files.into_iter().next().map(|file| file.id))
    }

    async fn create(&self, token: &str, body: &CreateFile<'_>) -> SyncResult<String> {
        let response = self
            .http
            .post(format!("{}/files", self.config.api_base))
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;
        let response = auth_checked(response)?;
        if !response.status().is_success() {
            return Err(status_error("file create", response.status()));
        }
        let file: DriveFile = response
            .json()
            .await
            .map_err(|err| SyncError::MalformedData(err.to_string()))?;
        Ok(file.id)
    }

    fn folder_query(&self) -> String {
        format!(
            "name = '{}' and mimeType = '{}' and trashed = false",
            self.config.folder_name, FOLDER_MIME_TYPE
        )
    }

    fn file_query(&self, name: &str, folder_id: &str) -> String {
        format!("name = '{name}' and '{folder_id}' in parents and trashed = false")
    }

    /// Resolves the app folder without creating it. Soft-fails to
    /// `None` so a pull on a fresh account is not an error.
    async fn find_folder(&self, token: &str) -> SyncResult<Option<String>> {
        if let Some(id) = self.cached(FOLDER_ID_KEY)? {
            return Ok(Some(id));
        }
        let found = self.search(token, &self.folder_query()).await?;
        if let Some(ref id) = found {
            self.cache(FOLDER_ID_KEY, id)?;
        }
        Ok(found)
    }

    /// Resolves the app folder, creating it if absent. Idempotent:
    /// search by name first, create only on miss.
    async fn ensure_folder(&self, token: &str) -> SyncResult<String> {
        if let Some(id) = self.find_folder(token).await? {
            return Ok(id);
        }
        let id = self
            .create(
                token,
                &CreateFile {
                    name: &self.config.folder_name,
                    mime_type: Some(FOLDER_MIME_TYPE),
                    parents: None,
                },
            )
            .await?;
        info!(folder = %self.config.folder_name, "created backup folder");
        self.cache(FOLDER_ID_KEY, &id)?;
        Ok(id)
    }

    async fn find_file(
        &self,
        token: &str,
        folder_id: &str,
        name: &str,
        cache_key: &str,
    ) -> SyncResult<Option<String>> {
        if let Some(id) = self.cached(cache_key)? {
            return Ok(Some(id));
        }
        let found = self.search(token, &self.file_query(name, folder_id)).await?;
        if let Some(ref id) = found {
            self.cache(cache_key, id)?;
        }
        Ok(found)
    }

    async fn ensure_file(
        &self,
        token: &str,
        folder_id: &str,
        name: &str,
        cache_key: &str,
    ) -> SyncResult<String> {
        if let Some(id) = self.find_file(token, folder_id, name, cache_key).await? {
            return Ok(id);
        }
        let id = self
            .create(
                token,
                &CreateFile {
                    name,
                    mime_type: None,
                    parents: Some(vec![folder_id]),
                },
            )
            .await?;
        debug!(file = name, "created backup file");
        self.cache(cache_key, &id)?;
        Ok(id)
    }

    async fn upload_content(
        &self,
        token: &str,
        file_id: &str,
        cache_key: &str,
        body: String,
    ) -> SyncResult<()> {
        let response = self
            .http
            .patch(format!("{}/files/{}", self.config.upload_base, file_id))
            .bearer_auth(token)
            .query(&[("uploadType", "media")])
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;
        let response = auth_checked(response)?;
        if response.status() == StatusCode::NOT_FOUND {
            // The cached id points at a deleted file; the next push
            // re-resolves and recreates it.
            self.store.remove(SYNC_NAMESPACE, cache_key)?;
            return Err(SyncError::transport_retryable(
                "cached drive file is gone, will recreate on next push",
            ));
        }
        if !response.status().is_success() {
            return Err(status_error("file upload", response.status()));
        }
        Ok(())
    }

    async fn download(&self, token: &str, file_id: &str) -> SyncResult<Option<String>> {
        let response = self
            .http
            .get(format!("{}/files/{}", self.config.api_base, file_id))
            .bearer_auth(token)
            .query(&[("alt", "media")])
            .send()
            .await?;
        let response = auth_checked(response)?;
        if response.status() == StatusCode::NOT_FOUND {
            self.store.remove(SYNC_NAMESPACE, DATA_FILE_ID_KEY)?;
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(status_error("file download", response.status()));
        }
        Ok(Some(response.text().await.map_err(SyncError::from)?))
    }
}

#[async_trait]
impl RemoteStore for DriveRemote {
    async fn push(&self, credential: &Credential, bundle: &CollectionBundle) -> SyncResult<()> {
        let token = &credential.token;
        let folder_id = self.ensure_folder(token).await?;
        let data_file_id = self
            .ensure_file(
                token,
                &folder_id,
                &self.config.data_file_name,
                DATA_FILE_ID_KEY,
            )
            .await?;

        // The envelope is whole-state: every collection goes out on
        // every push, not just the dirty subset the engine handed us.
        let full_state = local::read_all(self.store.as_ref())?;
        let envelope = CloudBackupEnvelope::from_bundle(&full_state, Utc::now());
        debug!(
            dirty = bundle.len(),
            total = full_state.len(),
            "uploading backup envelope"
        );
        let body = serde_json::to_string(&envelope)
            .map_err(|err| SyncError::MalformedData(err.to_string()))?;
        self.upload_content(token, &data_file_id, DATA_FILE_ID_KEY, body)
            .await?;

        let metadata_file_id = self
            .ensure_file(
                token,
                &folder_id,
                &self.config.metadata_file_name,
                METADATA_FILE_ID_KEY,
            )
            .await?;
        let metadata = BackupMetadata {
            last_sync: envelope.synced_at,
            version: ENVELOPE_VERSION.to_string(),
            data_file_id,
        };
        let body = serde_json::to_string(&metadata)
            .map_err(|err| SyncError::MalformedData(err.to_string()))?;
        self.upload_content(token, &metadata_file_id, METADATA_FILE_ID_KEY, body)
            .await
    }

    async fn pull(&self, credential: &Credential) -> SyncResult<Option<CollectionBundle>> {
        let token = &credential.token;
        let Some(folder_id) = self.find_folder(token).await? else {
            debug!("no backup folder on the drive yet");
            return Ok(None);
        };
        let Some(file_id) = self
            .find_file(
                token,
                &folder_id,
                &self.config.data_file_name,
                DATA_FILE_ID_KEY,
            )
            .await?
        else {
            debug!("backup folder exists but holds no data file yet");
            return Ok(None);
        };
        let Some(raw) = self.download(token, &file_id).await? else {
            return Ok(None);
        };
        let envelope: CloudBackupEnvelope = serde_json::from_str(&raw)
            .map_err(|err| SyncError::MalformedData(err.to_string()))?;
        Ok(Some(envelope.into_bundle()))
    }

    async fn verify_credential(&self, credential: &Credential) -> SyncResult<()> {
        let response = self
            .http
            .get(format!("{}/about", self.config.api_base))
            .bearer_auth(&credential.token)
            .query(&[("fields", "user")])
            .send()
            .await?;
        match auth_checked(response) {
            Ok(response) => {
                if !response.status().is_success() {
                    return Err(status_error("credential verification", response.status()));
                }
                Ok(())
            }
            Err(err) => {
                // Disconnected: drop the cached connection state rather
                // than retrying against a dead token forever.
                warn!("drive credential rejected, clearing cached connection state");
                self.clear_cached_ids();
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_targets_drive_v3() {
        let config = DriveConfig::default();
        assert!(config.api_base.ends_with("/drive/v3"));
        assert!(config.upload_base.contains("/upload/"));
        assert_eq!(config.data_file_name, "larder-data.json");
    }

    #[test]
    fn with_base_points_both_endpoints_at_one_host() {
        let config = DriveConfig::default().with_base("http://localhost:9999/");
        assert_eq!(config.api_base, "http://localhost:9999");
        assert_eq!(config.upload_base, "http://localhost:9999");
    }

    #[test]
    fn queries_name_the_configured_files() {
        let config = DriveConfig::default().with_folder_name("Bakery");
        let store: Arc<dyn LocalStore> = Arc::new(larder_store::MemoryStore::new());
        let remote = DriveRemote::new(config, store).unwrap();

        assert_eq!(
            remote.folder_query(),
            "name = 'Bakery' and mimeType = 'application/vnd.google-apps.folder' and trashed = false"
        );
        assert_eq!(
            remote.file_query("larder-data.json", "folder-1"),
            "name = 'larder-data.json' and 'folder-1' in parents and trashed = false"
        );
    }
}
