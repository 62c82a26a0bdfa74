//! Import test fixture
//!
//! A temporary source tree, media root and in-memory archive database

use std::fs;
use std::path::{Path, PathBuf};

use archive_common::db::{collections, init_memory_database, items, Collection, Item};
use archive_import::{ImportLogger, ImportOptions, Importer, MediaStorage};
use sqlx::SqlitePool;
use tempfile::TempDir;
use tracing::dispatcher::DefaultGuard;

use super::audio_generator::{generate_test_wav, AudioConfig};
use super::log_capture::LogCapture;

pub struct ImportFixture {
    _temp_dir: TempDir,
    pub source: PathBuf,
    pub media: PathBuf,
    pub pool: SqlitePool,
    /// Journal lines emitted on this test's thread
    pub log: LogCapture,
    _log_guard: DefaultGuard,
}

impl ImportFixture {
    pub async fn new() -> Self {
        let log = LogCapture::new();
        let log_guard = log.install();

        // Default temp names start with ".tmp", which the hidden-directory guard rejects
        let temp_dir = tempfile::Builder::new()
            .prefix("archive-import-test")
            .tempdir()
            .unwrap();
        let source = temp_dir.path().join("source");
        let media = temp_dir.path().join("media");
        fs::create_dir_all(&source).unwrap();
        fs::create_dir_all(&media).unwrap();

        let pool = init_memory_database().await.unwrap();

        Self {
            _temp_dir: temp_dir,
            source,
            media,
            pool,
            log,
            _log_guard: log_guard,
        }
    }

    /// Create (if needed) and return a collection directory
    pub fn collection_dir(&self, name: &str) -> PathBuf {
        let dir = self.source.join(name);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Write a generated WAV file into a collection directory
    pub fn add_wav(&self, collection: &str, filename: &str) -> PathBuf {
        let path = self.collection_dir(collection).join(filename);
        generate_test_wav(&path, &AudioConfig::default()).unwrap()
    }

    /// Write arbitrary bytes into a collection directory
    pub fn add_file(&self, collection: &str, filename: &str, content: &[u8]) -> PathBuf {
        let path = self.collection_dir(collection).join(filename);
        fs::write(&path, content).unwrap();
        path
    }

    /// Write `<collection>.csv` with `old;new` rows
    pub fn add_manifest(&self, collection: &str, rows: &[(&str, &str)]) -> PathBuf {
        let content: String = rows
            .iter()
            .map(|(old, new)| format!("{};{}\n", old, new))
            .collect();
        self.add_file(collection, &format!("{}.csv", collection), content.as_bytes())
    }

    pub fn storage(&self) -> MediaStorage {
        MediaStorage::new(&self.media)
    }

    pub fn options(&self, pattern: &str) -> ImportOptions {
        ImportOptions::new(&self.source, pattern)
    }

    pub async fn importer(&self, pattern: &str) -> Importer {
        self.importer_with(self.options(pattern)).await
    }

    pub async fn importer_with(&self, options: ImportOptions) -> Importer {
        Importer::new(self.pool.clone(), self.storage(), options, ImportLogger::new())
            .await
            .unwrap()
    }

    pub async fn create_collection(&self, code: &str) -> Collection {
        collections::create(&self.pool, code).await.unwrap()
    }

    pub async fn collection(&self, code: &str) -> Option<Collection> {
        collections::find_by_code(&self.pool, code).await.unwrap()
    }

    pub async fn item(&self, code: &str) -> Option<Item> {
        items::find_by_code(&self.pool, code).await.unwrap()
    }

    pub async fn item_count(&self) -> i64 {
        items::count(&self.pool).await.unwrap()
    }

    pub async fn collection_count(&self) -> i64 {
        collections::count(&self.pool).await.unwrap()
    }

    /// Bytes of the file attached to an item
    pub fn stored_bytes(&self, item: &Item) -> Vec<u8> {
        let relative = item.file.as_deref().expect("item has no file");
        fs::read(self.media.join(relative)).unwrap()
    }

    pub fn stored_file_count(&self) -> usize {
        count_files(&self.media)
    }
}

fn count_files(dir: &Path) -> usize {
    fs::read_dir(dir)
        .unwrap()
        .map(|entry| {
            let path = entry.unwrap().path();
            if path.is_dir() {
                count_files(&path)
            } else {
                1
            }
        })
        .sum()
}
