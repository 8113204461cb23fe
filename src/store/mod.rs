//! Serialized persistence of capture results.
//!
//! One coarse lock covers the whole multi-step write sequence (directory
//! creation, three payload files, manifest append), so concurrent workers can
//! never interleave artifacts or corrupt the manifest. Capture tasks are
//! latency-dominated; correctness of the corpus wins over write throughput.

pub mod record;

use crate::config::types::{CaptureError, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::DateTime;
use record::CaptureRecord;
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Manifest file name under the output root.
pub const MANIFEST_NAME: &str = "train_and_test.jsonl";

/// Paths written for one stored capture.
#[derive(Clone, Debug)]
pub struct StoredPaths {
    pub pcap: PathBuf,
    pub screenshot: PathBuf,
    pub webpage: PathBuf,
}

/// Append-only corpus writer shared by every worker.
pub struct ResultStore {
    root: PathBuf,
    lock: Mutex<()>,
}

impl ResultStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            lock: Mutex::new(()),
        }
    }

    /// Persist one successful capture and append its manifest line.
    ///
    /// Runs entirely under the store lock. The timestamp is parsed and both
    /// binary payloads are decoded before the first filesystem side effect,
    /// so a malformed record fails without leaving partial artifacts; the
    /// manifest line is the last step, so a record that made it into the
    /// manifest always has all three files on disk.
    pub fn store(&self, mut record: CaptureRecord) -> Result<StoredPaths> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        let timestamp = DateTime::parse_from_rfc3339(&record.timestamp)?;
        let stamp = timestamp.format("%Y-%m-%dT%H-%M-%S%.f%z").to_string();

        let screenshot = BASE64.decode(record.screenshot.as_bytes()).map_err(|err| {
            CaptureError::Store(format!("invalid screenshot encoding for {}: {err}", record.domain))
        })?;
        let pcap = BASE64.decode(record.pcap.as_bytes()).map_err(|err| {
            CaptureError::Store(format!("invalid pcap encoding for {}: {err}", record.domain))
        })?;

        let paths = StoredPaths {
            pcap: self.artifact_path("captures", &record.domain, &stamp, "pcap"),
            screenshot: self.artifact_path("screenshots", &record.domain, &stamp, "png"),
            webpage: self.artifact_path("webpages", &record.domain, &stamp, "html"),
        };
        for path in [&paths.pcap, &paths.screenshot, &paths.webpage] {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
        }

        fs::write(&paths.screenshot, &screenshot)?;
        fs::write(&paths.webpage, record.html.as_bytes())?;
        fs::write(&paths.pcap, &pcap)?;

        record.pcap = paths.pcap.display().to_string();
        record.screenshot = paths.screenshot.display().to_string();
        record.html = paths.webpage.display().to_string();

        let line = serde_json::to_string(&record)?;
        let mut manifest = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.manifest_path())?;
        writeln!(manifest, "{line}")?;

        Ok(paths)
    }

    /// Domains already present in the manifest, for resumed runs.
    ///
    /// Unparseable lines are skipped with a warning rather than failing the
    /// run; a missing manifest means nothing has been stored yet.
    pub fn stored_domains(&self) -> Result<HashSet<String>> {
        let file = match fs::File::open(self.manifest_path()) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(HashSet::new()),
            Err(err) => return Err(err.into()),
        };

        let mut domains = HashSet::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            match serde_json::from_str::<CaptureRecord>(&line) {
                Ok(record) => {
                    domains.insert(record.domain);
                }
                Err(err) => {
                    log::warn!("skipping unparseable manifest line {}: {}", index + 1, err);
                }
            }
        }
        Ok(domains)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_NAME)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn artifact_path(&self, kind: &str, domain: &str, stamp: &str, ext: &str) -> PathBuf {
        self.root.join(kind).join(domain).join(format!("{stamp}.{ext}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn sample_record(domain: &str, payload: &[u8]) -> CaptureRecord {
        CaptureRecord {
            success: true,
            domain: domain.to_string(),
            timestamp: "2026-08-28T12:34:56+00:00".to_string(),
            screenshot: BASE64.encode(payload),
            html: format!("<html>{domain}</html>"),
            pcap: BASE64.encode(payload),
        }
    }

    #[test]
    fn test_store_writes_artifacts_and_manifest_line() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path());

        let paths = store.store(sample_record("example.com", b"payload")).unwrap();

        assert_eq!(fs::read(&paths.screenshot).unwrap(), b"payload");
        assert_eq!(fs::read(&paths.pcap).unwrap(), b"payload");
        assert_eq!(
            fs::read_to_string(&paths.webpage).unwrap(),
            "<html>example.com</html>"
        );
        assert!(paths.pcap.starts_with(dir.path().join("captures/example.com")));
        assert!(paths
            .screenshot
            .starts_with(dir.path().join("screenshots/example.com")));
        assert!(paths.webpage.starts_with(dir.path().join("webpages/example.com")));

        let manifest = fs::read_to_string(store.manifest_path()).unwrap();
        let lines: Vec<&str> = manifest.lines().collect();
        assert_eq!(lines.len(), 1);
        let stored: CaptureRecord = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(stored.pcap, paths.pcap.display().to_string());
        assert_eq!(stored.screenshot, paths.screenshot.display().to_string());
        assert_eq!(stored.html, paths.webpage.display().to_string());
    }

    #[test]
    fn test_store_rejects_bad_timestamp_without_side_effects() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path());

        let mut record = sample_record("example.com", b"x");
        record.timestamp = "not-a-timestamp".to_string();
        assert!(store.store(record).is_err());

        assert!(!store.manifest_path().exists());
        assert!(!dir.path().join("captures").exists());
    }

    #[test]
    fn test_store_rejects_bad_base64_before_manifest_append() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path());

        let mut record = sample_record("example.com", b"x");
        record.pcap = "!!! not base64 !!!".to_string();
        assert!(store.store(record).is_err());
        assert!(!store.manifest_path().exists());
    }

    #[test]
    fn test_concurrent_stores_never_interleave() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(ResultStore::new(dir.path()));

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                // Distinct payload per writer so mixed-up writes would show.
                let payload = vec![i as u8; 32 * 1024];
                let record = sample_record(&format!("site-{i}.test"), &payload);
                store.store(record).unwrap()
            }));
        }
        let paths: Vec<StoredPaths> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        for (i, stored) in paths.iter().enumerate() {
            let expected = vec![i as u8; 32 * 1024];
            assert_eq!(fs::read(&stored.screenshot).unwrap(), expected);
            assert_eq!(fs::read(&stored.pcap).unwrap(), expected);
        }

        let manifest = fs::read_to_string(store.manifest_path()).unwrap();
        assert_eq!(manifest.lines().count(), 8);
        for line in manifest.lines() {
            let record: CaptureRecord = serde_json::from_str(line).unwrap();
            assert!(record.domain.starts_with("site-"));
        }
    }

    #[test]
    fn test_stored_domains_resumes_from_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path());

        assert!(store.stored_domains().unwrap().is_empty());

        store.store(sample_record("a.test", b"1")).unwrap();
        store.store(sample_record("b.test", b"2")).unwrap();

        let domains = store.stored_domains().unwrap();
        assert_eq!(domains.len(), 2);
        assert!(domains.contains("a.test"));
        assert!(domains.contains("b.test"));
    }
}
