//! FILENAME: core/engine/src/keys.rs
//! PURPOSE: Key-union discovery across a heterogeneous record batch.

use std::collections::HashSet;

use crate::record::Record;

/// Returns every distinct field-key present in any of `records`.
/// Linear in the total number of (record, key) pairs.
pub fn resolve_keys(records: &[Record]) -> HashSet<String> {
    let mut keys = HashSet::new();
    for record in records {
        for key in record.keys() {
            if !keys.contains(key) {
                keys.insert(key.to_string());
            }
        }
    }
    keys
}
