//! Target-list loading: thin plumbing in front of the dispatcher.

use crate::config::types::Result;
use std::collections::HashSet;
use std::path::Path;

/// Read capture targets from the first column of a CSV file.
///
/// The first row is treated as a header, matching the tabular input format
/// the corpus tooling produces. Empty cells are skipped.
pub fn load_targets(path: &Path) -> Result<Vec<String>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut targets = Vec::new();
    for row in reader.records() {
        let row = row?;
        match row.get(0) {
            Some(cell) if !cell.trim().is_empty() => targets.push(cell.trim().to_string()),
            _ => {}
        }
    }
    Ok(targets)
}

/// Drop targets whose domain already appears in the manifest.
pub fn filter_completed(targets: Vec<String>, done: &HashSet<String>) -> Vec<String> {
    let before = targets.len();
    let remaining: Vec<String> = targets
        .into_iter()
        .filter(|target| !done.contains(target.as_str()))
        .collect();
    if remaining.len() < before {
        log::info!(
            "resume: skipping {} already-captured targets",
            before - remaining.len()
        );
    }
    remaining
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_targets_takes_first_column_after_header() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "domain,rank").unwrap();
        writeln!(file, "example.com,1").unwrap();
        writeln!(file, "example.org,2").unwrap();
        writeln!(file, ",3").unwrap();
        file.flush().unwrap();

        let targets = load_targets(file.path()).unwrap();
        assert_eq!(targets, vec!["example.com", "example.org"]);
    }

    #[test]
    fn test_load_targets_missing_file_is_an_error() {
        assert!(load_targets(Path::new("/nonexistent/targets.csv")).is_err());
    }

    #[test]
    fn test_filter_completed_drops_done_targets() {
        let done: HashSet<String> = ["b.test".to_string()].into_iter().collect();
        let remaining = filter_completed(
            vec!["a.test".to_string(), "b.test".to_string()],
            &done,
        );
        assert_eq!(remaining, vec!["a.test"]);
    }
}
