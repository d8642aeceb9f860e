//! CLI command implementations.

pub mod cycle;
pub mod daemon;
pub mod import;
pub mod show;

use crate::{RemoteArgs, Transport};
use larder_model::{CollectionName, Credential};
use larder_store::{JsonFileStore, LocalStore, MutationLog};
use larder_sync_engine::{local, DriveConfig, DriveRemote, RemoteStore, RestRemote, SyncEngine};
use std::error::Error;
use std::path::Path;
use std::sync::Arc;

const DEFAULT_REST_URL: &str = "http://localhost:8080";

/// Everything a sync command needs, wired together.
pub(crate) struct CliEngine {
    pub store: Arc<JsonFileStore>,
    pub log: Arc<MutationLog>,
    pub engine: Arc<SyncEngine>,
}

pub(crate) fn build_engine(
    store_path: &Path,
    args: &RemoteArgs,
) -> Result<CliEngine, Box<dyn Error>> {
    let store = Arc::new(JsonFileStore::open(store_path)?);
    let log = Arc::new(MutationLog::new());
    let remote = build_remote(args, Arc::clone(&store) as Arc<dyn LocalStore>)?;
    let engine = Arc::new(SyncEngine::new(
        Arc::clone(&store) as Arc<dyn LocalStore>,
        remote,
        Arc::clone(&log),
    ));
    Ok(CliEngine { store, log, engine })
}

fn build_remote(
    args: &RemoteArgs,
    store: Arc<dyn LocalStore>,
) -> Result<Arc<dyn RemoteStore>, Box<dyn Error>> {
    Ok(match args.transport {
        Transport::Rest => {
            let base = args
                .url
                .clone()
                .unwrap_or_else(|| DEFAULT_REST_URL.to_string());
            Arc::new(RestRemote::new(base)?)
        }
        Transport::Drive => {
            let mut config = DriveConfig::default();
            if let Some(url) = &args.url {
                config = config.with_base(url);
            }
            Arc::new(DriveRemote::new(config, store)?)
        }
    })
}

pub(crate) fn credential_of(args: &RemoteArgs) -> Credential {
    Credential::new(&args.token, &args.email)
}

/// The mutation log is per-session; a fresh process treats every
/// non-empty collection as pending so a one-shot push transmits the
/// current state.
pub(crate) fn mark_all_pending(
    store: &dyn LocalStore,
    log: &MutationLog,
) -> Result<(), Box<dyn Error>> {
    for name in CollectionName::ALL {
        if !local::read_records(store, name)?.is_empty() {
            log.mark_dirty(name);
        }
    }
    Ok(())
}
