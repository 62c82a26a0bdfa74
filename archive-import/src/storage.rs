//! Media storage
//!
//! Attached item files live under the media root in dated upload folders:
//! `items/<YYYY>/<MM>/<DD>/<filename>`. Items record the path relative to
//! the media root. Stored files are never replaced: a name that is already
//! taken gets a numeric suffix instead.

use chrono::{DateTime, Utc};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Upload folder of item files, relative to the media root
pub const ITEMS_UPLOAD_DIR: &str = "items";

/// Filesystem storage for attached media files
#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
}

impl MediaStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of a stored file
    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    pub async fn exists(&self, relative: &str) -> bool {
        fs::try_exists(self.path(relative)).await.unwrap_or(false)
    }

    /// Store `bytes` under today's upload folder
    ///
    /// Returns the path relative to the media root.
    pub async fn save(&self, filename: &str, bytes: &[u8]) -> io::Result<String> {
        self.save_at(filename, bytes, Utc::now()).await
    }

    /// Store `bytes` under the upload folder of `when`
    pub async fn save_at(
        &self,
        filename: &str,
        bytes: &[u8],
        when: DateTime<Utc>,
    ) -> io::Result<String> {
        let name = Path::new(filename)
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("invalid file name: {:?}", filename),
                )
            })?;

        let folder = format!("{}/{}", ITEMS_UPLOAD_DIR, when.format("%Y/%m/%d"));
        fs::create_dir_all(self.root.join(&folder)).await?;

        let relative = self.available_name(&folder, name).await?;
        let full_path = self.root.join(&relative);
        debug!(path = %full_path.display(), size = bytes.len(), "media storage: write");

        // Temp file + rename so a partial write never appears under the final name
        let temp_path = full_path.with_extension("part");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(&temp_path, &full_path).await?;

        Ok(relative)
    }

    /// Delete a stored file; a file that is already gone is not an error
    pub async fn remove(&self, relative: &str) -> io::Result<()> {
        match fs::remove_file(self.path(relative)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn available_name(&self, folder: &str, name: &str) -> io::Result<String> {
        let candidate = format!("{}/{}", folder, name);
        if !fs::try_exists(self.root.join(&candidate)).await? {
            return Ok(candidate);
        }

        let path = Path::new(name);
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or(name);
        let ext = path.extension().and_then(|e| e.to_str());

        for n in 1.. {
            let alternative = match ext {
                Some(ext) => format!("{}/{}_{}.{}", folder, stem, n, ext),
                None => format!("{}/{}_{}", folder, stem, n),
            };
            if !fs::try_exists(self.root.join(&alternative)).await? {
                return Ok(alternative);
            }
        }

        unreachable!("unbounded suffix search")
    }
}
