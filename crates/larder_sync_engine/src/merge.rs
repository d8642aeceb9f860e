//! Conflict resolution between local and remote snapshots.
//!
//! Last-writer-wins at collection granularity, remote-authoritative:
//! whichever device pushed a collection to the remote most recently
//! becomes the truth for that whole collection on every device that
//! next pulls. There is no timestamp comparison and no record-level
//! merge. A local edit made concurrently with another device's push can
//! be discarded when this device later pulls; `sync()` runs push before
//! pull precisely so a device's own fresh edits survive its own pull.

use larder_model::Record;

/// Resolves one collection.
///
/// - remote non-empty → remote wins unconditionally
/// - remote empty, local non-empty → local (nothing to overwrite with)
/// - both empty → empty
pub fn merge_collection(remote: Vec<Record>, local: Vec<Record>) -> Vec<Record> {
    if remote.is_empty() {
        local
    } else {
        remote
    }
}
