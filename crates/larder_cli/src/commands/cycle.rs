//! One-shot `push` / `pull` / `sync` commands.

use super::{build_engine, credential_of, mark_all_pending};
use crate::RemoteArgs;
use larder_model::CollectionBundle;
use std::error::Error;
use std::path::Path;

pub async fn push(store_path: &Path, remote: &RemoteArgs) -> Result<(), Box<dyn Error>> {
    let cli = build_engine(store_path, remote)?;
    mark_all_pending(cli.store.as_ref(), &cli.log)?;

    let outcome = cli.engine.push(&credential_of(remote)).await?;
    if outcome.pushed {
        println!("Pushed local collections to the remote.");
    } else {
        println!("Nothing to push.");
    }
    Ok(())
}

pub async fn pull(store_path: &Path, remote: &RemoteArgs) -> Result<(), Box<dyn Error>> {
    let cli = build_engine(store_path, remote)?;

    match cli.engine.pull(&credential_of(remote)).await? {
        Some(bundle) => print_bundle(&bundle),
        None => println!("Remote has no backup yet."),
    }
    Ok(())
}

pub async fn sync(store_path: &Path, remote: &RemoteArgs) -> Result<(), Box<dyn Error>> {
    let cli = build_engine(store_path, remote)?;
    mark_all_pending(cli.store.as_ref(), &cli.log)?;

    let outcome = cli.engine.sync(&credential_of(remote)).await?;
    if outcome.pushed {
        println!("Pushed local collections to the remote.");
    } else {
        println!("Nothing to push.");
    }
    match outcome.pulled {
        Some(bundle) => print_bundle(&bundle),
        None => println!("Remote has no backup yet."),
    }
    Ok(())
}

fn print_bundle(bundle: &CollectionBundle) {
    println!("Merged state after pull:");
    for (name, records) in bundle.iter() {
        println!("  {name}: {} record(s)", records.len());
    }
}
