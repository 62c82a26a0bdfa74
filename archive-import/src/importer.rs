//! WAV importer
//!
//! Walks the collection directories of a source tree and provisions the
//! archive in two passes:
//!
//! 1. **Collections**: every matching directory gets a collection record.
//!    A directory that ships a manifest must already have one; if it does
//!    not, the whole run stops with [`ImportError::ManifestWithoutCollection`].
//! 2. **Items**: without a manifest, each file `<code>.<ext>` is attached to
//!    the item `<code>` (created when absent). With a manifest, each
//!    `old_ref;new_ref` row attaches `<new_ref>.wav` to the item whose
//!    legacy code is `old_ref`, then renames that item to `new_ref`.
//!
//! Missing audio files, already attached items, unmatched legacy codes and
//! malformed manifest rows are written to the journal and skipped.

use std::fmt;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};

use archive_common::db::{collections, items, revisions, users, ElementType, Item, User};
use sqlx::SqlitePool;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{ImportError, ImportResult};
use crate::logger::ImportLogger;
use crate::manifest::{manifest_path, read_manifest, ManifestRow};
use crate::storage::MediaStorage;

/// Journal prefix of item-level lines
const ITEM_PREFIX: &str = "item";

/// Banner lines are cut to this many characters
const BANNER_WIDTH: usize = 70;

/// What to import and on whose behalf
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Directory whose subdirectories are collections
    pub source_dir: PathBuf,
    /// Substring a collection directory path must contain
    pub pattern: String,
    /// Account revisions are recorded against
    pub username: String,
    /// Replace files already attached to items
    pub overwrite: bool,
}

impl ImportOptions {
    pub fn new(source_dir: impl Into<PathBuf>, pattern: impl Into<String>) -> Self {
        Self {
            source_dir: source_dir.into(),
            pattern: pattern.into(),
            username: archive_common::db::init::ADMIN_USERNAME.to_string(),
            overwrite: false,
        }
    }
}

/// Result of attaching a file to an item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// File stored; path relative to the media root
    Written(String),
    /// Source file does not exist
    Missing,
    /// Item already has a file and overwrite is off
    AlreadyAttached,
}

/// Counters of one import run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub collections_created: usize,
    pub collections_found: usize,
    pub items_created: usize,
    pub items_found: usize,
    pub files_written: usize,
    pub files_missing: usize,
    pub files_already_attached: usize,
    pub items_renamed: usize,
    pub rename_conflicts: usize,
    pub collections_skipped: usize,
    pub unmatched_rows: usize,
    pub malformed_rows: usize,
}

impl ImportReport {
    /// Number of problems that were logged and skipped
    pub fn skipped(&self) -> usize {
        self.files_missing
            + self.files_already_attached
            + self.rename_conflicts
            + self.unmatched_rows
            + self.malformed_rows
            + self.collections_skipped
    }
}

impl fmt::Display for ImportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "collections: {} created, {} found; items: {} created, {} found, {} renamed; \
             files: {} written; skipped: {} missing, {} already attached, {} unmatched, \
             {} malformed, {} rename conflicts, {} unreadable collections",
            self.collections_created,
            self.collections_found,
            self.items_created,
            self.items_found,
            self.items_renamed,
            self.files_written,
            self.files_missing,
            self.files_already_attached,
            self.unmatched_rows,
            self.malformed_rows,
            self.rename_conflicts,
            self.collections_skipped,
        )
    }
}

/// A collection directory: its code and the path it was listed under
#[derive(Debug, Clone)]
struct CollectionDir {
    name: String,
    path: PathBuf,
}

/// Imports a source tree of collection directories into the archive
pub struct Importer {
    db: SqlitePool,
    storage: MediaStorage,
    logger: ImportLogger,
    source_dir: PathBuf,
    collections: Vec<CollectionDir>,
    pattern: String,
    user: User,
    overwrite: bool,
    report: ImportReport,
}

impl Importer {
    /// Resolve the acting user and list the collection directories
    pub async fn new(
        db: SqlitePool,
        storage: MediaStorage,
        options: ImportOptions,
        logger: ImportLogger,
    ) -> ImportResult<Self> {
        if !options.source_dir.is_dir() {
            return Err(ImportError::SourceNotFound(options.source_dir));
        }

        let user = users::find_by_username(&db, &options.username)
            .await?
            .ok_or_else(|| ImportError::UserNotFound(options.username.clone()))?;

        let mut report = ImportReport::default();
        let mut collections = Vec::new();
        for path in list_subdirectories(&options.source_dir)? {
            // Collection codes are text; a name that is not UTF-8 cannot become one
            match path.file_name().and_then(|n| n.to_str()) {
                Some(name) => collections.push(CollectionDir {
                    name: name.to_string(),
                    path,
                }),
                None => {
                    let prefix = path.to_string_lossy();
                    logger.error(&prefix, "collection directory name is not valid UTF-8, skipped");
                    report.collections_skipped += 1;
                }
            }
        }
        debug!(
            "{} collection directories in {}",
            collections.len(),
            options.source_dir.display()
        );

        Ok(Self {
            db,
            storage,
            logger,
            source_dir: options.source_dir,
            collections,
            pattern: options.pattern,
            user,
            overwrite: options.overwrite,
            report,
        })
    }

    /// Names of all collection directories, sorted
    pub fn collections(&self) -> Vec<&str> {
        self.collections.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn report(&self) -> &ImportReport {
        &self.report
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    /// Whether a collection takes part in this run
    ///
    /// The directory path must not contain `/.` (hidden directories) and must
    /// contain the pattern.
    pub fn matches(&self, name: &str) -> bool {
        let path = format!("{}{}{}", self.source_dir.display(), MAIN_SEPARATOR, name);
        !path.contains("/.") && path.contains(&self.pattern)
    }

    fn matching_collections(&self) -> Vec<CollectionDir> {
        self.collections
            .iter()
            .filter(|c| self.matches(&c.name))
            .cloned()
            .collect()
    }

    /// Run both passes
    pub async fn run(&mut self) -> ImportResult<ImportReport> {
        self.provision_collections().await?;
        self.provision_items().await?;
        Ok(self.report.clone())
    }

    /// Pass 1: make sure every matching directory has a collection
    pub async fn provision_collections(&mut self) -> ImportResult<()> {
        for CollectionDir { name, path: dir } in self.matching_collections() {
            let existing = collections::find_by_code(&self.db, &name).await?;
            let has_manifest = manifest_path(&dir, &name).is_file();

            match existing {
                None if has_manifest => {
                    let msg = format!("{} collection missing from the database, aborting", name);
                    self.logger.error(&name, &msg);
                    return Err(ImportError::ManifestWithoutCollection { collection: name });
                }
                None => {
                    let collection = collections::create(&self.db, &name).await?;
                    revisions::touch(&self.db, ElementType::Collection, collection.guid, self.user.guid)
                        .await?;
                    self.logger
                        .info(&name, "collection missing from the database, created");
                    self.report.collections_created += 1;
                }
                Some(_) => {
                    self.logger.info(&name, "collection present in the database");
                    self.report.collections_found += 1;
                }
            }
        }

        Ok(())
    }

    /// Pass 2: provision items and attach their files
    pub async fn provision_items(&mut self) -> ImportResult<()> {
        for CollectionDir { name, path: dir } in self.matching_collections() {
            let banner = format!("************************ {} ******************************", name);
            self.logger.info(&name, truncate(&banner, BANNER_WIDTH));

            let manifest = manifest_path(&dir, &name);
            if manifest.is_file() {
                self.import_manifest(&name, &dir, &manifest).await?;
            } else {
                self.import_directory(&name, &dir).await?;
            }
        }

        Ok(())
    }

    /// Attach every file of a manifest-less collection to the item named by its stem
    async fn import_directory(&mut self, name: &str, dir: &Path) -> ImportResult<()> {
        let msg = format!("{} no manifest in the collection", name);
        self.logger.info(name, truncate(&msg, BANNER_WIDTH));

        let (collection, created) = collections::get_or_create(&self.db, name).await?;
        if created {
            revisions::touch(&self.db, ElementType::Collection, collection.guid, self.user.guid)
                .await?;
            self.logger
                .info(&collection.code, "collection missing from the database, created");
            self.report.collections_created += 1;
        } else {
            self.logger
                .info(&collection.code, &format!("id = {}", collection.guid));
        }

        for (filename, path) in list_files(dir)? {
            let code = item_code(&filename);
            if code.is_empty() {
                debug!("Skipping {}: no item code", path.display());
                continue;
            }

            let (mut item, created) = items::get_or_create(&self.db, code, collection.guid).await?;
            if created {
                let msg = format!("{} : item missing from the database, created", item.code);
                self.logger.info(ITEM_PREFIX, &msg);
                self.report.items_created += 1;
            } else {
                let msg = format!("{} : id = {}", item.code, item.guid);
                self.logger.info(ITEM_PREFIX, &msg);
                self.report.items_found += 1;
            }

            self.write_file(&mut item, &path, self.overwrite).await?;
        }

        Ok(())
    }

    /// Attach and rename items listed in a collection manifest
    async fn import_manifest(&mut self, name: &str, dir: &Path, manifest: &Path) -> ImportResult<()> {
        for row in read_manifest(manifest)? {
            let (old_ref, new_ref) = match row {
                ManifestRow::Rename { old_ref, new_ref } => (old_ref, new_ref),
                ManifestRow::Malformed { line, reason } => {
                    let msg = format!("{}.csv line {} : {}", name, line, reason);
                    self.logger.error(ITEM_PREFIX, &msg);
                    self.report.malformed_rows += 1;
                    continue;
                }
            };

            let wav_file = dir.join(format!("{}.wav", new_ref));
            let Some(mut item) = items::find_by_old_code(&self.db, &old_ref).await? else {
                let msg = format!("{} : item missing from the database", old_ref);
                self.logger.error(ITEM_PREFIX, &msg);
                self.report.unmatched_rows += 1;
                continue;
            };

            let msg = format!("{} : id = {}", old_ref, item.guid);
            self.logger.info(ITEM_PREFIX, &msg);
            self.report.items_found += 1;

            self.write_file(&mut item, &wav_file, self.overwrite).await?;
            self.rename_item(&mut item, &new_ref).await?;
        }

        Ok(())
    }

    async fn rename_item(&mut self, item: &mut Item, new_code: &str) -> ImportResult<()> {
        if item.code == new_code {
            return Ok(());
        }

        match items::rename(&self.db, item.guid, new_code).await {
            Ok(()) => {
                let msg = format!("{} : code changed to {}", item.code, new_code);
                self.logger.info(ITEM_PREFIX, &msg);
                item.code = new_code.to_string();
                self.report.items_renamed += 1;
                Ok(())
            }
            Err(archive_common::Error::Database(e)) if is_unique_violation(&e) => {
                let msg = format!(
                    "{} : cannot change code to {}, already used by another item",
                    item.code, new_code
                );
                self.logger.error(ITEM_PREFIX, &msg);
                self.report.rename_conflicts += 1;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Attach `wav_file` to `item`
    ///
    /// The file is stored only when the item has none yet or `overwrite` is
    /// set. A missing source file or an existing attachment is logged and
    /// leaves the item untouched.
    pub async fn write_file(
        &mut self,
        item: &mut Item,
        wav_file: &Path,
        overwrite: bool,
    ) -> ImportResult<WriteOutcome> {
        let filename = wav_file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if !tokio::fs::try_exists(wav_file).await? {
            let msg = format!("{} : audio file {} missing from directory", item.code, filename);
            self.logger.error(ITEM_PREFIX, &msg);
            self.report.files_missing += 1;
            return Ok(WriteOutcome::Missing);
        }

        if item.has_file() && !overwrite {
            let msg = format!(
                "{} : file {} already registered in the database",
                item.code,
                item.file.as_deref().unwrap_or_default()
            );
            self.logger.error(ITEM_PREFIX, &msg);
            self.report.files_already_attached += 1;
            return Ok(WriteOutcome::AlreadyAttached);
        }

        let content = tokio::fs::read(wav_file).await?;
        let stored = self.storage.save(&filename, &content).await?;
        if let Err(e) = self.attach(item, &stored).await {
            // Leave no orphan under the media root
            if let Err(cleanup) = self.storage.remove(&stored).await {
                warn!("{} : could not remove {}: {}", item.code, stored, cleanup);
            }
            return Err(e);
        }
        item.file = Some(stored.clone());

        debug!("{} : {} bytes stored as {}", item.code, content.len(), stored);
        let msg = format!("{} : file {} stored", item.code, stored);
        self.logger.info(ITEM_PREFIX, &msg);
        self.report.files_written += 1;

        Ok(WriteOutcome::Written(stored))
    }

    async fn attach(&self, item: &Item, stored: &str) -> ImportResult<()> {
        items::set_file(&self.db, item.guid, stored).await?;
        revisions::touch(&self.db, ElementType::Item, item.guid, self.user.guid).await?;
        Ok(())
    }
}

/// Item code of a file name: everything before the first `.`
pub fn item_code(filename: &str) -> &str {
    filename.split('.').next().unwrap_or_default()
}

fn truncate(text: &str, width: usize) -> &str {
    match text.char_indices().nth(width) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

fn list_subdirectories(dir: &Path) -> ImportResult<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry?;
        if entry.file_type().is_dir() {
            dirs.push(entry.into_path());
        }
    }
    Ok(dirs)
}

fn list_files(dir: &Path) -> ImportResult<Vec<(String, PathBuf)>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry?;
        if entry.file_type().is_file() {
            let name = entry.file_name().to_string_lossy().into_owned();
            files.push((name, entry.into_path()));
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_code_stops_at_first_dot() {
        assert_eq!(item_code("X1.wav"), "X1");
        assert_eq!(item_code("CNRSMH_I_2010_001_001.orig.wav"), "CNRSMH_I_2010_001_001");
        assert_eq!(item_code("noext"), "noext");
        assert_eq!(item_code(".DS_Store"), "");
    }

    #[test]
    fn test_truncate_counts_characters() {
        assert_eq!(truncate("abcdef", 3), "abc");
        assert_eq!(truncate("ab", 3), "ab");
        assert_eq!(truncate("éèàù", 2), "éè");
    }

    #[test]
    fn test_report_skipped_sums_problems() {
        let report = ImportReport {
            files_missing: 1,
            files_already_attached: 2,
            unmatched_rows: 3,
            malformed_rows: 4,
            rename_conflicts: 5,
            files_written: 100,
            ..Default::default()
        };
        assert_eq!(report.skipped(), 15);
        assert!(report.to_string().contains("100 written"));
    }
}
