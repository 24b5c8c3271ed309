use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

/// Flat directory of generated images named `image_<unix_seconds>.jpg`.
///
/// Files are written in place (no temp file + rename), so a listing taken while a run is
/// writing may include an image whose bytes are not all on disk yet. Two images stored within
/// the same second share a name and the later one replaces the earlier.
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name for an image created at `timestamp` (unix seconds).
    pub fn file_name(timestamp: i64) -> String {
        format!("image_{}.jpg", timestamp)
    }

    /// Timestamp embedded in a conforming file name, `None` for anything else.
    pub fn parse_timestamp(name: &str) -> Option<i64> {
        let digits = name.strip_prefix("image_")?.strip_suffix(".jpg")?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }

    /// Write `bytes` as the image for `timestamp`, creating the directory if needed.
    pub async fn persist_at(&self, bytes: &[u8], timestamp: i64) -> io::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(Self::file_name(timestamp));
        tokio::fs::write(&path, bytes).await?;
        info!(path = %path.display(), bytes = bytes.len(), "stored image");
        Ok(path)
    }

    /// Write `bytes` stamped with the current time.
    pub async fn persist(&self, bytes: &[u8]) -> io::Result<PathBuf> {
        self.persist_at(bytes, chrono::Utc::now().timestamp()).await
    }

    /// Up to `limit` image file names, newest first. A missing directory lists as empty.
    pub async fn list_recent(&self, limit: usize) -> io::Result<Vec<String>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(dir = %self.dir.display(), "images directory does not exist yet");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        let mut images: Vec<(i64, String)> = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if let Some(ts) = Self::parse_timestamp(&name) {
                images.push((ts, name));
            }
        }

        images.sort_unstable_by(|a, b| b.cmp(a));
        Ok(images.into_iter().take(limit).map(|(_, name)| name).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_only_conforming_names() {
        assert_eq!(ImageStore::parse_timestamp("image_1700000000.jpg"), Some(1_700_000_000));
        assert_eq!(ImageStore::parse_timestamp("image_.jpg"), None);
        assert_eq!(ImageStore::parse_timestamp("image_12a.jpg"), None);
        assert_eq!(ImageStore::parse_timestamp("image_-5.jpg"), None);
        assert_eq!(ImageStore::parse_timestamp("photo_12.jpg"), None);
        assert_eq!(ImageStore::parse_timestamp("image_12.png"), None);
    }

    #[tokio::test]
    async fn persist_writes_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path().join("images"));

        let path = store.persist_at(b"jpeg-bytes", 1_700_000_123).await.unwrap();

        assert_eq!(path.file_name().unwrap(), "image_1700000123.jpg");
        assert_eq!(std::fs::read(&path).unwrap(), b"jpeg-bytes");
    }

    #[tokio::test]
    async fn same_second_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path());

        store.persist_at(b"first", 42).await.unwrap();
        let path = store.persist_at(b"second", 42).await.unwrap();

        assert_eq!(std::fs::read(path).unwrap(), b"second");
        assert_eq!(store.list_recent(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn partially_written_file_is_still_listed() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path());
        store.persist_at(b"complete", 100).await.unwrap();
        // A write still in flight looks like an empty or truncated file.
        std::fs::write(dir.path().join("image_200.jpg"), b"").unwrap();

        let recent = store.list_recent(10).await.unwrap();
        assert_eq!(recent, vec!["image_200.jpg", "image_100.jpg"]);
        assert_eq!(std::fs::metadata(dir.path().join("image_200.jpg")).unwrap().len(), 0);
    }

    #[tokio::test]
    async fn list_recent_is_newest_first_and_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path());
        for ts in [999, 1_000, 1_700_000_000, 5, 1_600_000_000] {
            store.persist_at(b"x", ts).await.unwrap();
        }
        std::fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();

        let recent = store.list_recent(3).await.unwrap();
        assert_eq!(
            recent,
            vec!["image_1700000000.jpg", "image_1600000000.jpg", "image_1000.jpg"]
        );

        let all = store.list_recent(100).await.unwrap();
        assert_eq!(all.len(), 5);
        let stamps: Vec<i64> = all.iter().filter_map(|n| ImageStore::parse_timestamp(n)).collect();
        assert!(stamps.windows(2).all(|w| w[0] > w[1]));
    }

    #[tokio::test]
    async fn missing_directory_lists_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path().join("absent"));
        assert!(store.list_recent(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn zero_limit_lists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path());
        store.persist_at(b"x", 1).await.unwrap();
        assert!(store.list_recent(0).await.unwrap().is_empty());
    }
}
