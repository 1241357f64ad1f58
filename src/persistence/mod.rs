//! Append-only research log.
//!
//! Every saved block is a human-readable banner, a local timestamp and the
//! body verbatim. Existing content is never rewritten. File I/O is offloaded
//! via `spawn_blocking`, and a mutex keeps concurrent web requests from
//! interleaving blocks.

use chrono::Local;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// Banner line opening every saved block.
pub const BANNER: &str = "--- Research Output ---";

/// `strftime` pattern of the timestamp line.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Handle for appending research output to a text file.
#[derive(Debug, Clone)]
pub struct PersistenceSink {
    default_destination: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl PersistenceSink {
    pub fn new(default_destination: impl Into<PathBuf>) -> Self {
        Self {
            default_destination: default_destination.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Where `append(data, None)` writes.
    pub fn default_destination(&self) -> &Path {
        &self.default_destination
    }

    /// Append `data` as one timestamped block.
    ///
    /// Writes to `destination`, or the default file when `None`. The file is
    /// created if absent. Returns a confirmation naming the destination.
    pub async fn append(&self, data: &str, destination: Option<&Path>) -> io::Result<String> {
        let path = destination
            .unwrap_or(&self.default_destination)
            .to_path_buf();
        let block = format_block(data, &Local::now().format(TIMESTAMP_FORMAT).to_string());
        let lock = self.write_lock.clone();

        let written = path.clone();
        tokio::task::spawn_blocking(move || {
            let _guard = lock.blocking_lock();
            append_block(&written, &block)
        })
        .await
        .map_err(io::Error::other)??;

        info!("Saved research output to {}", path.display());
        Ok(format!("Saved to {}", path.display()))
    }
}

/// Render one log record.
pub fn format_block(data: &str, timestamp: &str) -> String {
    format!("\n\n{}\nTimestamp: {}\n\n{}\n", BANNER, timestamp, data)
}

fn append_block(path: &Path, block: &str) -> io::Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    file.write_all(block.as_bytes())?;
    file.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn timestamps(contents: &str) -> Vec<&str> {
        contents
            .lines()
            .filter_map(|l| l.strip_prefix("Timestamp: "))
            .collect()
    }

    #[test]
    fn block_layout() {
        let block = format_block("hello", "2024-05-01 10:20:30");
        assert_eq!(
            block,
            "\n\n--- Research Output ---\nTimestamp: 2024-05-01 10:20:30\n\nhello\n"
        );
    }

    #[tokio::test]
    async fn creates_missing_file_and_confirms_destination() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let sink = PersistenceSink::new(&path);
        assert_eq!(sink.default_destination(), path.as_path());

        let msg = sink.append("first finding", None).await.unwrap();
        assert!(msg.contains("out.txt"));

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains(BANNER));
        assert!(contents.contains("first finding"));
    }

    #[tokio::test]
    async fn n_appends_produce_n_ordered_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        std::fs::write(&path, "pre-existing notes\n").unwrap();
        let sink = PersistenceSink::new(&path);

        for body in ["alpha", "beta\nwith two lines", "gamma"] {
            sink.append(body, None).await.unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("pre-existing notes\n"));
        assert_eq!(contents.matches(BANNER).count(), 3);

        let a = contents.find("alpha").unwrap();
        let b = contents.find("beta\nwith two lines").unwrap();
        let c = contents.find("gamma").unwrap();
        assert!(a < b && b < c);

        let stamps = timestamps(&contents);
        assert_eq!(stamps.len(), 3);
        for stamp in stamps {
            NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).unwrap();
        }
    }

    #[tokio::test]
    async fn explicit_destination_overrides_default() {
        let dir = tempfile::tempdir().unwrap();
        let default = dir.path().join("default.txt");
        let other = dir.path().join("other.txt");
        let sink = PersistenceSink::new(&default);

        sink.append("elsewhere", Some(&other)).await.unwrap();

        assert!(!default.exists());
        assert!(std::fs::read_to_string(&other).unwrap().contains("elsewhere"));
    }

    #[tokio::test]
    async fn concurrent_appends_do_not_interleave() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shared.txt");
        let sink = PersistenceSink::new(&path);

        let mut handles = Vec::new();
        for i in 0..16 {
            let sink = sink.clone();
            handles.push(tokio::spawn(async move {
                sink.append(&format!("entry-{i}\n{}", "x".repeat(4096)), None)
                    .await
                    .unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.matches(BANNER).count(), 16);
        for block in contents.split(BANNER).skip(1) {
            let body: Vec<&str> = block.lines().collect();
            // "", "Timestamp: ..", "", "entry-N", "xxxx..", ""
            assert!(body[3].starts_with("entry-"));
            assert_eq!(body[4].len(), 4096);
        }
    }

    #[tokio::test]
    async fn unwritable_destination_propagates_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("out.txt");
        let sink = PersistenceSink::new(&path);

        assert!(sink.append("lost", None).await.is_err());
    }
}
