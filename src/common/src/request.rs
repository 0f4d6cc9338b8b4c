//! Removal-request loading.

use std::io;
use std::path::Path;

/// Read the entry identifiers to remove, one per line, no header.
///
/// Tab-separated lines contribute their first field. Blanks are dropped and
/// duplicates keep their first position, so the result seeds the worklist
/// directly.
pub fn load_removal_request(path: &Path) -> io::Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    let mut entries: Vec<String> = Vec::new();
    for line in content.lines() {
        let entry = line.split('\t').next().unwrap_or("").trim();
        if entry.is_empty() {
            continue;
        }
        if !entries.iter().any(|e| e == entry) {
            entries.push(entry.to_string());
        }
    }
    Ok(entries)
}
