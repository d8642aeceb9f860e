//! `import` command: load records from a JSON file.

use larder_model::{CollectionName, Record};
use larder_store::JsonFileStore;
use larder_sync_engine::local;
use std::error::Error;
use std::fs;
use std::path::Path;

pub fn run(store_path: &Path, collection: &str, file: &Path) -> Result<(), Box<dyn Error>> {
    let name = CollectionName::parse(collection)
        .ok_or_else(|| format!("unknown collection: {collection}"))?;

    let raw = fs::read_to_string(file)?;
    let records: Vec<Record> = serde_json::from_str(&raw)?;

    let store = JsonFileStore::open(store_path)?;
    local::write_records(&store, name, &records)?;

    println!("Imported {} record(s) into {name}.", records.len());
    Ok(())
}
