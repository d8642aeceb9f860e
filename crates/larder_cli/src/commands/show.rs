//! `show` command: display local collection contents.

use larder_model::CollectionName;
use larder_store::JsonFileStore;
use larder_sync_engine::local;
use std::error::Error;
use std::path::Path;

pub fn run(
    store_path: &Path,
    collection: Option<&str>,
    print_records: bool,
) -> Result<(), Box<dyn Error>> {
    let store = JsonFileStore::open(store_path)?;

    let names: Vec<CollectionName> = match collection {
        Some(raw) => vec![CollectionName::parse(raw)
            .ok_or_else(|| format!("unknown collection: {raw}"))?],
        None => CollectionName::ALL.to_vec(),
    };

    for name in names {
        let records = local::read_records(&store, name)?;
        println!("{name}: {} record(s)", records.len());
        if print_records {
            for record in &records {
                println!("  {record}");
            }
        }
    }

    Ok(())
}
