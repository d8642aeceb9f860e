//! `daemon` command: run the schedule coordinator until interrupted.

use super::{build_engine, credential_of, mark_all_pending};
use crate::RemoteArgs;
use larder_sync_engine::{ScheduleConfig, SyncScheduler};
use std::error::Error;
use std::path::Path;
use tokio::sync::watch;
use tracing::info;

pub async fn run(store_path: &Path, remote: &RemoteArgs) -> Result<(), Box<dyn Error>> {
    let cli = build_engine(store_path, remote)?;
    cli.engine.verify(&credential_of(remote)).await?;
    info!("credential verified against remote");

    // Fresh process: whatever is on disk counts as pending, so the
    // mount sync pushes the current state before the timers take over.
    mark_all_pending(cli.store.as_ref(), &cli.log)?;

    let (_credential_tx, credential_rx) = watch::channel(Some(credential_of(remote)));
    let (_connectivity_tx, connectivity_rx) = watch::channel(true);

    let scheduler = SyncScheduler::new(
        cli.engine,
        ScheduleConfig::default(),
        credential_rx,
        connectivity_rx,
    );
    let pulled = scheduler.pulled_feed();
    let mut pulled_rx = pulled.subscribe();
    tokio::spawn(async move {
        while let Some(bundle) = pulled_rx.recv().await {
            info!(
                collections = bundle.len(),
                records = bundle.record_count(),
                "remote changes applied locally"
            );
        }
    });

    let coordinator = tokio::spawn(scheduler.run());

    info!(store = %store_path.display(), "sync daemon running, press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    coordinator.abort();

    Ok(())
}
